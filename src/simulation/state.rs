//! Simulation state shared by one cohort of birds.
//!
//! All birds of an episode fly through the same pipe course. Per-bird work
//! (decision, physics, crash test, scoring window) runs in parallel because
//! each bird only reads the shared pipes and sprites; everything that touches
//! shared bookkeeping happens afterwards, serially and in id order.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::debug;

use super::agent::Controller;
use super::bird::{Bird, BirdId};
use super::collision::{self, Collision};
use super::params::Params;
use super::pipes::{Maintenance, PipeQueue};
use super::sprites::SpriteSet;

/// A bird together with the strategy that steers it.
#[derive(Debug)]
pub struct Entrant {
    /// The bird itself.
    pub bird: Bird,
    /// Its decision procedure, fixed for the episode.
    pub controller: Controller,
}

/// What happened during one [`SimulationState::step`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// Birds that crashed this tick, in id order. They are already removed.
    pub deaths: Vec<(BirdId, Collision)>,
    /// Birds that passed a pipe this tick, in id order.
    pub scored: Vec<BirdId>,
    /// Some bird raised the best score this tick.
    pub new_record: bool,
    /// Pipe sequence changes made at the end of the tick.
    pub pipes: Maintenance,
}

/// Per-bird result of the parallel phase.
struct Outcome {
    id: BirdId,
    crash: Collision,
    scored: bool,
}

/// Birds, pipes and score bookkeeping for one episode.
#[derive(Debug)]
pub struct SimulationState {
    params: Params,
    sprites: Arc<SpriteSet>,
    birds: BTreeMap<BirdId, Entrant>,
    pipes: PipeQueue,
    best_score: u32,
    alive: usize,
    tick: u64,
    next_id: u64,
    rng: ChaCha8Rng,
}

impl SimulationState {
    /// Creates an empty state. Without a seed the pipe course is drawn from OS entropy.
    pub fn new(params: Params, sprites: Arc<SpriteSet>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };
        let mut state = Self {
            params,
            sprites,
            birds: BTreeMap::new(),
            pipes: PipeQueue::new(),
            best_score: 0,
            alive: 0,
            tick: 0,
            next_id: 0,
            rng,
        };
        state.reset();
        state
    }

    /// Removes every bird and lays out a fresh pipe course.
    ///
    /// The best score survives resets.
    pub fn reset(&mut self) {
        self.birds.clear();
        self.alive = 0;
        self.tick = 0;
        self.pipes.clear();

        let pipe_height = self.sprites.pipe_height();
        let first = self.params.screen_width + self.params.first_pipe_offset;
        let second = first + self.params.screen_width / 2.0;
        for x in [first, second] {
            self.pipes.spawn(&mut self.rng, x, &self.params, pipe_height);
        }
    }

    /// Adds a bird at the start position and returns its id.
    pub fn spawn_bird(&mut self, controller: Controller) -> BirdId {
        let id = BirdId(self.next_id);
        self.next_id += 1;

        let y = ((self.params.screen_height - self.sprites.bird_height() as f32) / 2.0).trunc();
        let bird = Bird::new(id, self.params.bird_x, y, &self.params);
        self.birds.insert(id, Entrant { bird, controller });
        self.alive += 1;
        id
    }

    /// Resets the state and spawns one bird per controller.
    pub fn initialize(&mut self, controllers: impl IntoIterator<Item = Controller>) -> Vec<BirdId> {
        self.reset();
        controllers
            .into_iter()
            .map(|controller| self.spawn_bird(controller))
            .collect()
    }

    /// Delivers a flap request to a keyboard bird.
    ///
    /// Returns `false` if the bird is gone or not keyboard controlled.
    pub fn request_flap(&mut self, id: BirdId) -> bool {
        self.birds
            .get_mut(&id)
            .is_some_and(|entrant| entrant.controller.press())
    }

    /// Advances every bird and the pipe course by one tick.
    pub fn step(&mut self) -> StepReport {
        let params = &self.params;
        let sprites = &*self.sprites;
        let pipes = &self.pipes;
        let bird_w = sprites.bird_width();
        let bird_h = sprites.bird_height();
        let pipe_w = sprites.pipe_width();

        let mut outcomes: Vec<Outcome> = self
            .birds
            .par_iter_mut()
            .map(|(&id, entrant)| {
                let Entrant { bird, controller } = entrant;

                if controller.decide(bird, pipes, params) {
                    bird.flap(params, bird_h);
                }
                bird.animate();
                bird.integrate(params, bird_h);

                let crash = collision::check_crash(bird, pipes, sprites, params.ground_y);
                let scored = !crash.is_crash() && passes_pipe(bird, pipes, bird_w, pipe_w, params);
                if crash.is_crash() {
                    bird.kill(crash);
                } else if scored {
                    bird.score += 1;
                }

                Outcome { id, crash, scored }
            })
            .collect();
        outcomes.sort_unstable_by_key(|outcome| outcome.id);

        let mut report = StepReport::default();
        for outcome in outcomes {
            if outcome.crash.is_crash() {
                debug!(bird = %outcome.id, crash = ?outcome.crash, tick = self.tick, "bird crashed");
                report.deaths.push((outcome.id, outcome.crash));
            } else if outcome.scored {
                report.scored.push(outcome.id);
                if let Some(entrant) = self.birds.get(&outcome.id)
                    && entrant.bird.score > self.best_score
                {
                    self.best_score = entrant.bird.score;
                    report.new_record = true;
                }
            }
        }

        for (id, _) in &report.deaths {
            self.birds.remove(id);
        }
        self.alive -= report.deaths.len();
        debug_assert_eq!(
            self.alive,
            self.birds.values().filter(|e| e.bird.is_alive()).count(),
            "alive count out of sync with the bird map"
        );

        if report.new_record {
            debug!(best_score = self.best_score, tick = self.tick, "new record");
        }

        self.pipes.scroll(-self.params.pipe_speed);
        report.pipes = self.pipes.maintain(
            &mut self.rng,
            &self.params,
            pipe_w,
            self.sprites.pipe_height(),
        );
        self.tick += 1;

        report
    }

    /// Whether every bird has crashed.
    pub fn is_over(&self) -> bool {
        self.alive == 0
    }

    /// Simulation parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Shared sprite masks.
    pub fn sprites(&self) -> &Arc<SpriteSet> {
        &self.sprites
    }

    /// Living birds in id order.
    pub fn birds(&self) -> impl Iterator<Item = &Bird> {
        self.birds.values().map(|entrant| &entrant.bird)
    }

    /// Living birds together with their controllers, in id order.
    pub fn entrants(&self) -> impl Iterator<Item = &Entrant> {
        self.birds.values()
    }

    /// A living bird by id.
    pub fn bird(&self, id: BirdId) -> Option<&Bird> {
        self.birds.get(&id).map(|entrant| &entrant.bird)
    }

    /// Mutable access to a living bird, for scripted setups.
    pub fn bird_mut(&mut self, id: BirdId) -> Option<&mut Bird> {
        self.birds.get_mut(&id).map(|entrant| &mut entrant.bird)
    }

    /// The pipe course.
    pub fn pipes(&self) -> &PipeQueue {
        &self.pipes
    }

    /// Mutable access to the pipe course, for scripted setups.
    pub fn pipes_mut(&mut self) -> &mut PipeQueue {
        &mut self.pipes
    }

    /// Highest per-bird score seen since the state was created.
    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    /// Number of birds still flying.
    pub fn alive(&self) -> usize {
        self.alive
    }

    /// Ticks since the last reset.
    pub fn tick(&self) -> u64 {
        self.tick
    }
}

/// A bird scores on the single tick its centre enters the first
/// `pipe_speed` pixels past a pipe's centre.
fn passes_pipe(bird: &Bird, pipes: &PipeQueue, bird_w: u32, pipe_w: u32, params: &Params) -> bool {
    let bird_mid = bird.mid_x(bird_w);
    pipes.iter().any(|pair| {
        let pipe_mid = pair.mid_x(pipe_w);
        pipe_mid <= bird_mid && bird_mid < pipe_mid + params.pipe_speed
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::agent::StrategyKind;
    use crate::simulation::pipes::PipePair;

    fn state(seed: u64) -> SimulationState {
        SimulationState::new(Params::default(), Arc::new(SpriteSet::classic()), Some(seed))
    }

    #[test]
    fn test_reset_seeds_two_pipes() {
        let s = state(1);
        let xs: Vec<f32> = s.pipes().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![488.0, 632.0]);
        assert!(s.is_over());
    }

    #[test]
    fn test_spawn_position() {
        let mut s = state(1);
        let id = s.spawn_bird(Controller::reflex());
        let bird = s.bird(id).unwrap();
        assert!((bird.x - 57.0).abs() < f32::EPSILON);
        assert!((bird.y - 244.0).abs() < f32::EPSILON);
        assert_eq!(s.alive(), 1);
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut s = state(1);
        let first = s.initialize([Controller::reflex(), Controller::reflex()]);
        let second = s.initialize([Controller::reflex()]);
        assert_eq!(first, vec![BirdId(0), BirdId(1)]);
        assert_eq!(second, vec![BirdId(2)]);
        assert!(s.bird(BirdId(0)).is_none());
    }

    #[test]
    fn test_idle_keyboard_bird_hits_ground() {
        let mut s = state(3);
        let id = s.spawn_bird(Controller::keyboard());
        let mut death = None;
        for _ in 0..200 {
            let report = s.step();
            if let Some(&(dead, crash)) = report.deaths.first() {
                death = Some((dead, crash));
                break;
            }
        }
        assert_eq!(death, Some((id, Collision::Ground)));
        assert!(s.is_over());
        assert!(s.bird(id).is_none());
    }

    #[test]
    fn test_request_flap_only_reaches_keyboard_birds() {
        let mut s = state(1);
        let keyboard = s.spawn_bird(Controller::keyboard());
        let reflex = s.spawn_bird(Controller::reflex());
        assert!(s.request_flap(keyboard));
        assert!(!s.request_flap(reflex));
        assert!(!s.request_flap(BirdId(99)));

        let kinds: Vec<StrategyKind> = s.entrants().map(|e| e.controller.kind()).collect();
        assert_eq!(kinds, [StrategyKind::Keyboard, StrategyKind::Reflex]);
    }

    #[test]
    fn test_scoring_window_counts_once() {
        let mut s = state(1);
        let id = s.spawn_bird(Controller::reflex());
        s.pipes_mut().clear();
        // pipe centre 26px right of the bird centre, gap around the bird
        let bird_mid = s.bird(id).unwrap().mid_x(34);
        let x = bird_mid - 26.0 + 4.0 * 5.0;
        s.pipes_mut().push(PipePair::new(x, 180.0, 100.0, 320));

        let mut scored_ticks = 0;
        for _ in 0..20 {
            if let Some(bird) = s.bird_mut(id) {
                bird.y = 220.0;
                bird.vel_y = 0.0;
            }
            let report = s.step();
            assert!(report.deaths.is_empty());
            if !report.scored.is_empty() {
                scored_ticks += 1;
                assert!(report.new_record);
            }
        }
        assert_eq!(scored_ticks, 1);
        assert_eq!(s.bird(id).unwrap().score, 1);
        assert_eq!(s.best_score(), 1);
    }

    #[test]
    fn test_same_seed_same_course() {
        let mut a = state(42);
        let mut b = state(42);
        for _ in 0..500 {
            a.step();
            b.step();
        }
        let pa: Vec<PipePair> = a.pipes().iter().copied().collect();
        let pb: Vec<PipePair> = b.pipes().iter().copied().collect();
        assert_eq!(pa, pb);
        assert_eq!(a.tick(), 500);
    }
}
