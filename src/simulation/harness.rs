//! Episode loop and fitness shaping.
//!
//! An [`Episode`] binds every bird it spawns to the genome that steers it by
//! id, so deaths never shift anyone else's bookkeeping. Fitness is shaped per
//! episode rather than per bird: a shared running value grows every tick the
//! cohort survives and jumps whenever some bird sets a new record, and every
//! genome still flying is credited with that running value. A genome's
//! fitness therefore only grows and freezes on the tick its bird dies.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::agent::Controller;
use super::bird::BirdId;
use super::collision::Collision;
use super::evolution::{Genome, GenomeId};
use super::params::Params;
use super::sprites::SpriteSet;
use super::state::SimulationState;

/// Summaries kept by a [`Trainer`].
const HISTORY_LIMIT: usize = 1_000;

/// Where an episode is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Birds are still flying.
    Running,
    /// Every bird crashed or the tick cap was reached.
    Terminal,
}

/// Outcome of one finished episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// Generation the episode evaluated.
    pub generation: u32,
    /// Ticks simulated.
    pub ticks: u64,
    /// Best score of the state when the episode ended.
    pub best_score: u32,
    /// Some bird set a new record during the episode.
    pub record: bool,
    /// Birds that hit the ground.
    pub ground_deaths: usize,
    /// Birds that hit a pipe.
    pub pipe_deaths: usize,
    /// Birds still flying when the tick cap ended the episode.
    pub survivors: usize,
    /// Final running fitness; equals the fitness of the longest-lived genome.
    pub fitness: f64,
}

/// One generation's run through the pipe course.
#[derive(Debug, Clone)]
pub struct Episode {
    generation: u32,
    bindings: BTreeMap<BirdId, GenomeId>,
    fitness: BTreeMap<GenomeId, f64>,
    running: f64,
    record: bool,
    ground_deaths: usize,
    pipe_deaths: usize,
    phase: Phase,
}

impl Episode {
    /// Resets `state` and spawns one bird per cohort member.
    pub fn begin(
        state: &mut SimulationState,
        generation: u32,
        cohort: impl IntoIterator<Item = (GenomeId, Controller)>,
    ) -> Self {
        state.reset();

        let mut bindings = BTreeMap::new();
        let mut fitness = BTreeMap::new();
        for (genome, controller) in cohort {
            let bird = state.spawn_bird(controller);
            bindings.insert(bird, genome);
            fitness.insert(genome, 0.0);
        }

        debug!(generation, birds = bindings.len(), "episode started");

        let phase = if state.is_over() {
            Phase::Terminal
        } else {
            Phase::Running
        };
        Self {
            generation,
            bindings,
            fitness,
            running: 0.0,
            record: false,
            ground_deaths: 0,
            pipe_deaths: 0,
            phase,
        }
    }

    /// Advances the episode by one tick.
    pub fn tick(&mut self, state: &mut SimulationState) -> Phase {
        if self.phase == Phase::Terminal {
            return Phase::Terminal;
        }

        let report = state.step();
        for (bird, crash) in &report.deaths {
            self.bindings.remove(bird);
            match crash {
                Collision::Ground => self.ground_deaths += 1,
                Collision::Pipe => self.pipe_deaths += 1,
                Collision::None => {}
            }
        }

        // a tick that ends with nobody flying earns nothing
        let params = state.params();
        if !self.bindings.is_empty() {
            self.running += params.survival_reward;
        }
        if report.new_record && !self.bindings.is_empty() {
            self.running += params.record_bonus;
            self.record = true;
        }
        for genome in self.bindings.values() {
            self.fitness.insert(*genome, self.running);
        }

        if state.is_over() {
            self.phase = Phase::Terminal;
        } else if let Some(cap) = params.max_ticks
            && state.tick() >= cap
        {
            debug!(
                generation = self.generation,
                survivors = self.bindings.len(),
                "tick cap reached"
            );
            self.phase = Phase::Terminal;
        }
        self.phase
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Generation this episode evaluates.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Fitness earned so far by a genome of the cohort.
    pub fn fitness(&self, genome: GenomeId) -> Option<f64> {
        self.fitness.get(&genome).copied()
    }

    /// The shared running fitness.
    pub fn running_fitness(&self) -> f64 {
        self.running
    }

    /// The genome steering a living bird.
    pub fn genome_of(&self, bird: BirdId) -> Option<GenomeId> {
        self.bindings.get(&bird).copied()
    }

    /// Number of birds still bound to a genome.
    pub fn flying(&self) -> usize {
        self.bindings.len()
    }

    /// Writes the earned fitness into matching genomes.
    pub fn apply(&self, genomes: &mut [Genome]) {
        for genome in genomes {
            if let Some(fitness) = self.fitness(genome.id) {
                genome.fitness = fitness;
            }
        }
    }

    /// Summarises the episode as it stands.
    pub fn summary(&self, state: &SimulationState) -> EpisodeSummary {
        EpisodeSummary {
            generation: self.generation,
            ticks: state.tick(),
            best_score: state.best_score(),
            record: self.record,
            ground_deaths: self.ground_deaths,
            pipe_deaths: self.pipe_deaths,
            survivors: self.bindings.len(),
            fitness: self.running,
        }
    }
}

/// Neural controllers for every genome, paired with their ids.
pub fn cohort(genomes: &[Genome]) -> impl Iterator<Item = (GenomeId, Controller)> + '_ {
    genomes
        .iter()
        .map(|genome| (genome.id, Controller::neural(genome.brain.clone())))
}

/// Runs evaluation episodes on one long-lived simulation state.
#[derive(Debug)]
pub struct Trainer {
    state: SimulationState,
    history: VecDeque<EpisodeSummary>,
}

impl Trainer {
    /// Creates a trainer with its own simulation state.
    pub fn new(params: Params, sprites: Arc<SpriteSet>, seed: Option<u64>) -> Self {
        Self {
            state: SimulationState::new(params, sprites, seed),
            history: VecDeque::new(),
        }
    }

    /// The simulation state, for rendering.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Mutable simulation state, for delivering keyboard input.
    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    /// Starts an episode for `genomes` without running it.
    pub fn begin(&mut self, generation: u32, genomes: &[Genome]) -> Episode {
        self.begin_cohort(generation, cohort(genomes))
    }

    /// Starts an episode for any mix of controllers.
    pub fn begin_cohort(
        &mut self,
        generation: u32,
        cohort: impl IntoIterator<Item = (GenomeId, Controller)>,
    ) -> Episode {
        Episode::begin(&mut self.state, generation, cohort)
    }

    /// Advances a running episode by one tick.
    pub fn tick(&mut self, episode: &mut Episode) -> Phase {
        episode.tick(&mut self.state)
    }

    /// Records the summary of a finished episode.
    pub fn finish(&mut self, episode: &Episode) -> EpisodeSummary {
        let summary = episode.summary(&self.state);
        info!(
            generation = summary.generation,
            ticks = summary.ticks,
            best_score = summary.best_score,
            ground_deaths = summary.ground_deaths,
            pipe_deaths = summary.pipe_deaths,
            survivors = summary.survivors,
            "episode finished"
        );
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(summary);
        summary
    }

    /// Runs a whole episode for `genomes` and writes their fitness.
    pub fn evaluate(&mut self, generation: u32, genomes: &mut [Genome]) -> EpisodeSummary {
        let mut episode = self.begin(generation, genomes);
        while self.tick(&mut episode) == Phase::Running {}
        episode.apply(genomes);
        self.finish(&episode)
    }

    /// Summaries of recent episodes, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &EpisodeSummary> {
        self.history.iter()
    }
}
