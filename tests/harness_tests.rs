#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use std::collections::BTreeMap;
use std::sync::Arc;

use flappy_evo::simulation::agent::{Controller, Network};
use flappy_evo::simulation::evolution::{GenomeId, Population};
use flappy_evo::simulation::harness::{Episode, Phase, Trainer, cohort};
use flappy_evo::simulation::params::Params;
use flappy_evo::simulation::sprites::SpriteSet;
use flappy_evo::simulation::state::SimulationState;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[derive(Debug)]
struct NeverFlap;

impl Network for NeverFlap {
    fn activate(&self, _inputs: &[f32; 3]) -> f32 {
        0.0
    }
}

/// Keeps the bird just above the lower pipe of the gap it is heading for.
#[derive(Debug)]
struct Hover;

impl Network for Hover {
    fn activate(&self, inputs: &[f32; 3]) -> f32 {
        let [bird_y, _upper_y, lower_y] = *inputs;
        if bird_y > lower_y - 50.0 { 1.0 } else { 0.0 }
    }
}

fn create_state(params: Params, seed: u64) -> SimulationState {
    SimulationState::new(params, Arc::new(SpriteSet::classic()), Some(seed))
}

#[test]
fn test_fitness_is_monotonic_and_freezes_at_death() {
    let params = Params {
        max_ticks: Some(1_500),
        ..Params::default()
    };
    let mut state = create_state(params.clone(), 21);
    let mut rng = ChaCha8Rng::seed_from_u64(21);
    let population = Population::new(
        &Params {
            population_size: 25,
            ..params
        },
        &mut rng,
    );
    let mut episode = Episode::begin(&mut state, 0, cohort(population.genomes()));

    let mut last: BTreeMap<GenomeId, f64> = BTreeMap::new();
    let mut frozen: BTreeMap<GenomeId, f64> = BTreeMap::new();
    while episode.tick(&mut state) == Phase::Running {
        let flying: Vec<GenomeId> = state
            .birds()
            .filter_map(|bird| episode.genome_of(bird.id))
            .collect();

        for genome in population.genomes() {
            let fitness = episode.fitness(genome.id).unwrap();
            if let Some(previous) = last.get(&genome.id) {
                assert!(fitness >= *previous);
            }
            if let Some(at_death) = frozen.get(&genome.id) {
                assert_eq!(fitness, *at_death, "{} changed after death", genome.id);
            } else if !flying.contains(&genome.id) {
                frozen.insert(genome.id, fitness);
            }
            last.insert(genome.id, fitness);
        }
    }
}

#[test]
fn test_deaths_do_not_shift_bindings() {
    let mut state = create_state(Params::default(), 8);
    // even genomes fall, odd genomes hover
    let members = (0..8).map(|i| {
        let controller = if i % 2 == 0 {
            Controller::neural(NeverFlap)
        } else {
            Controller::neural(Hover)
        };
        (GenomeId(i), controller)
    });
    let mut episode = Episode::begin(&mut state, 0, members);

    while state.alive() > 4 {
        assert_eq!(episode.tick(&mut state), Phase::Running);
    }

    assert_eq!(episode.flying(), 4);
    for bird in state.birds() {
        let genome = episode.genome_of(bird.id).unwrap();
        assert_eq!(genome.0 % 2, 1, "{} is steered by {}", bird.id, genome);
    }

    let fallen = episode.fitness(GenomeId(0)).unwrap();
    for i in [2, 4, 6] {
        assert_eq!(episode.fitness(GenomeId(i)), Some(fallen));
    }

    episode.tick(&mut state);
    for i in [1, 3, 5, 7] {
        assert!(episode.fitness(GenomeId(i)).unwrap() > fallen);
    }
}

#[test]
fn test_passing_a_pipe_earns_the_record_bonus() {
    let params = Params {
        max_ticks: Some(400),
        ..Params::default()
    };
    let mut state = create_state(params, 30);
    let mut episode = Episode::begin(&mut state, 0, [(GenomeId(0), Controller::neural(Hover))]);

    let mut previous = 0.0;
    let mut jumped = false;
    while episode.tick(&mut state) == Phase::Running && !jumped {
        let fitness = episode.fitness(GenomeId(0)).unwrap();
        jumped = fitness - previous > 1.0;
        previous = fitness;
    }

    let summary = episode.summary(&state);
    assert!(jumped);
    assert!(summary.record);
    assert!(summary.best_score >= 1);
    assert!(episode.running_fitness() >= 5.0);
}

#[test]
fn test_trainer_drives_population() {
    let params = Params {
        population_size: 12,
        max_ticks: Some(2_000),
        ..Params::default()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let mut trainer = Trainer::new(params.clone(), Arc::new(SpriteSet::classic()), Some(2));
    let mut population = Population::new(&params, &mut rng);

    let champion = population
        .run(&params, &mut rng, 3, |generation, genomes| {
            let summary = trainer.evaluate(generation, genomes);
            assert_eq!(summary.generation, generation);
        })
        .map(|genome| genome.fitness);

    assert_eq!(population.history().len(), 3);
    assert_eq!(trainer.history().count(), 3);
    assert!(champion.is_some_and(|fitness| fitness > 0.0));

    let best = population.history().iter().map(|s| s.best).fold(0.0, f64::max);
    assert_eq!(champion, Some(best));
}
