//! Population management and reproduction.
//!
//! A generational loop over fixed-topology brains: every genome of a
//! generation is scored by an evaluation closure (normally the episode
//! harness), the best few are carried over untouched, and the rest of the
//! next generation is bred from the top of the ranking by weighted crossover
//! and mutation.

use std::cmp::Ordering;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::brain::Brain;
use super::params::Params;

/// Stable identifier of a genome across generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GenomeId(pub u64);

impl fmt::Display for GenomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "genome#{}", self.0)
    }
}

/// A brain together with the fitness it earned in its last evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genome {
    /// Stable identifier.
    pub id: GenomeId,
    /// The decision function.
    pub brain: Brain,
    /// Fitness from the last evaluation.
    pub fitness: f64,
}

/// Summary of one evaluated generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation index, starting at 0.
    pub generation: u32,
    /// Highest fitness.
    pub best: f64,
    /// Mean fitness.
    pub mean: f64,
    /// Id of the fittest genome.
    pub champion: GenomeId,
}

/// All genomes of the current generation.
#[derive(Debug, Clone)]
pub struct Population {
    genomes: Vec<Genome>,
    generation: u32,
    next_id: u64,
    history: Vec<GenerationStats>,
    champion: Option<(u32, Genome)>,
}

impl Population {
    /// Creates `params.population_size` genomes with random brains.
    pub fn new<R: Rng + ?Sized>(params: &Params, rng: &mut R) -> Self {
        let mut population = Self {
            genomes: Vec::with_capacity(params.population_size),
            generation: 0,
            next_id: 0,
            history: Vec::new(),
            champion: None,
        };
        let input_scale = 1.0 / params.screen_height;
        for _ in 0..params.population_size {
            let brain = Brain::new(&params.layer_sizes, params.weight_scale, input_scale, rng);
            population.push(brain);
        }
        population
    }

    fn push(&mut self, brain: Brain) {
        let id = GenomeId(self.next_id);
        self.next_id += 1;
        self.genomes.push(Genome {
            id,
            brain,
            fitness: 0.0,
        });
    }

    /// Genomes of the current generation.
    pub fn genomes(&self) -> &[Genome] {
        &self.genomes
    }

    /// Index of the current generation.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Statistics of every evaluated generation, oldest first.
    pub fn history(&self) -> &[GenerationStats] {
        &self.history
    }

    /// The fittest genome seen so far and the generation it was evaluated in.
    pub fn champion(&self) -> Option<(u32, &Genome)> {
        self.champion.as_ref().map(|(generation, genome)| (*generation, genome))
    }

    /// Scores the current generation.
    ///
    /// Fitness is reset to zero before `eval` runs, so `eval` only needs to
    /// write what each genome earned.
    ///
    /// # Panics
    ///
    /// Panics if the population is empty; `Params::validate` rejects a zero
    /// `population_size`.
    pub fn evaluate<F>(&mut self, eval: F) -> GenerationStats
    where
        F: FnOnce(u32, &mut [Genome]),
    {
        for genome in &mut self.genomes {
            genome.fitness = 0.0;
        }
        eval(self.generation, &mut self.genomes);

        let best = self
            .genomes
            .iter()
            .max_by(|a, b| by_fitness(a, b))
            .cloned()
            .expect("population is never empty");
        let mean = self.genomes.iter().map(|g| g.fitness).sum::<f64>() / self.genomes.len() as f64;

        let stats = GenerationStats {
            generation: self.generation,
            best: best.fitness,
            mean,
            champion: best.id,
        };
        info!(
            generation = stats.generation,
            best = stats.best,
            mean = stats.mean,
            champion = %stats.champion,
            "generation evaluated"
        );

        if self
            .champion
            .as_ref()
            .is_none_or(|(_, champion)| best.fitness > champion.fitness)
        {
            self.champion = Some((self.generation, best));
        }
        self.history.push(stats);
        stats
    }

    /// Replaces the current generation with its offspring.
    pub fn evolve<R: Rng + ?Sized>(&mut self, params: &Params, rng: &mut R) {
        let mut ranked = std::mem::take(&mut self.genomes);
        ranked.sort_by(|a, b| by_fitness(b, a));

        let size = params.population_size;
        let elites = params.elitism.min(ranked.len());
        let parents = ((ranked.len() as f32 * params.survival_threshold).ceil() as usize)
            .clamp(1, ranked.len());

        self.genomes = ranked.iter().take(elites).cloned().collect();

        while self.genomes.len() < size {
            let mutation_scale = sample_mutation_scale(params, rng);
            let idx1 = rng.random_range(0..parents);

            let mut brain = if parents > 1 && rng.random::<f32>() < params.crossover_rate {
                let mut idx2 = rng.random_range(0..parents);
                while idx2 == idx1 {
                    idx2 = rng.random_range(0..parents);
                }
                let alpha = rng.random::<f32>();
                Brain::crossover_weighted(&ranked[idx1].brain, &ranked[idx2].brain, alpha)
            } else {
                ranked[idx1].brain.clone()
            };
            brain.mutate(mutation_scale, rng);
            self.push(brain);
        }

        self.generation += 1;
    }

    /// Runs up to `generations` rounds of evaluation and reproduction.
    ///
    /// Stops early once the best fitness reaches `params.fitness_threshold`.
    /// Returns the fittest genome seen.
    pub fn run<R, F>(&mut self, params: &Params, rng: &mut R, generations: u32, mut eval: F) -> Option<&Genome>
    where
        R: Rng + ?Sized,
        F: FnMut(u32, &mut [Genome]),
    {
        for round in 0..generations {
            let stats = self.evaluate(&mut eval);

            if let Some(threshold) = params.fitness_threshold
                && stats.best >= threshold
            {
                info!(
                    generation = stats.generation,
                    best = stats.best,
                    threshold,
                    "fitness threshold reached"
                );
                break;
            }
            if round + 1 < generations {
                self.evolve(params, rng);
            }
        }
        self.champion().map(|(_, genome)| genome)
    }
}

fn by_fitness(a: &Genome, b: &Genome) -> Ordering {
    a.fitness.partial_cmp(&b.fitness).unwrap_or(Ordering::Equal)
}

/// Samples a mutation scale log-uniformly from `[mutation_min, mutation_max)`.
pub fn sample_mutation_scale<R: Rng + ?Sized>(params: &Params, rng: &mut R) -> f32 {
    let log_min = params.mutation_min.ln();
    let log_max = params.mutation_max.ln();
    rng.random_range(log_min..log_max).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn params() -> Params {
        Params {
            population_size: 10,
            elitism: 2,
            ..Params::default()
        }
    }

    #[test]
    fn test_new_population_has_unique_ids() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let population = Population::new(&params(), &mut rng);
        let mut ids: Vec<GenomeId> = population.genomes().iter().map(|g| g.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 10);
        assert_eq!(population.generation(), 0);
    }

    #[test]
    fn test_evaluate_resets_and_records() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut population = Population::new(&params(), &mut rng);
        let stats = population.evaluate(|_, genomes| {
            for (i, genome) in genomes.iter_mut().enumerate() {
                genome.fitness += i as f64;
            }
        });
        assert!((stats.best - 9.0).abs() < f64::EPSILON);
        assert!((stats.mean - 4.5).abs() < f64::EPSILON);
        assert_eq!(stats.champion, GenomeId(9));

        // fitness is reset before the next evaluation
        let again = population.evaluate(|_, _| {});
        assert!(again.best.abs() < f64::EPSILON);
        assert_eq!(population.history().len(), 2);
        assert_eq!(population.champion().map(|(_, g)| g.id), Some(GenomeId(9)));
    }

    #[test]
    fn test_evolve_keeps_elites_and_size() {
        let p = params();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut population = Population::new(&p, &mut rng);
        population.evaluate(|_, genomes| {
            for genome in genomes.iter_mut() {
                genome.fitness = genome.id.0 as f64;
            }
        });
        population.evolve(&p, &mut rng);

        let genomes = population.genomes();
        assert_eq!(genomes.len(), 10);
        assert_eq!(population.generation(), 1);
        assert_eq!(genomes[0].id, GenomeId(9));
        assert_eq!(genomes[1].id, GenomeId(8));
        assert!(genomes[2..].iter().all(|g| g.id.0 >= 10));
    }

    #[test]
    fn test_run_stops_at_threshold() {
        let p = Params {
            fitness_threshold: Some(5.0),
            ..params()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut population = Population::new(&p, &mut rng);
        let mut calls = 0;
        let champion = population
            .run(&p, &mut rng, 10, |generation, genomes| {
                calls += 1;
                genomes[0].fitness = f64::from(generation) * 2.0;
            })
            .map(|g| g.fitness);
        assert_eq!(calls, 4);
        assert_eq!(champion, Some(6.0));
    }

    #[test]
    fn test_mutation_scale_range() {
        let p = params();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..1_000 {
            let scale = sample_mutation_scale(&p, &mut rng);
            assert!(scale >= p.mutation_min * 0.999 && scale < p.mutation_max * 1.001);
        }
    }
}
