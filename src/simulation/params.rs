use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{Error, Result};

/// Simulation parameters that control the game, the harness and evolution.
///
/// Defaults reproduce the classic 288×512 Flappy Bird tuning at 30 ticks per
/// second. All distances are in screen pixels, all rates are per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Playfield width.
    pub screen_width: f32,
    /// Playfield height.
    pub screen_height: f32,
    /// Y coordinate of the top of the ground strip.
    pub ground_y: f32,
    /// Fixed horizontal position of every bird.
    pub bird_x: f32,
    /// Vertical opening between the upper and lower pipe.
    pub pipe_gap: f32,
    /// Distance pipes scroll left each tick.
    pub pipe_speed: f32,
    /// New pipes appear this far past the right edge.
    pub pipe_spawn_offset: f32,
    /// The first seeded pipe starts this far past the right edge.
    pub first_pipe_offset: f32,
    /// Velocity set by a flap (negative is up).
    pub flap_velocity: f32,
    /// Maximum falling speed.
    pub max_velocity_y: f32,
    /// Downward acceleration applied each tick.
    pub gravity: f32,
    /// Rotation lost each tick, in degrees.
    pub rotation_speed: f32,
    /// Rotation a flap kicks the bird up to, in degrees.
    pub flap_rotation: f32,
    /// Rotation stops decreasing at this angle.
    pub min_rotation: f32,
    /// Upper bound of the rotation actually drawn.
    pub rotation_threshold: f32,
    /// A pipe still counts as ahead while its x is within this margin behind the bird.
    pub reflex_margin: f32,
    /// Reflex birds flap once they are this close above the lower pipe.
    pub reflex_allowance: f32,
    /// Neural birds flap when the network output exceeds this value.
    pub flap_threshold: f32,
    /// Fitness gained by every surviving genome each tick.
    pub survival_reward: f64,
    /// Fitness bonus on a tick that sets a new best score.
    pub record_bonus: f64,
    /// Hard cap on episode length; `None` runs until every bird is dead.
    pub max_ticks: Option<u64>,
    /// Target tick rate for windowed modes.
    pub ticks_per_second: u32,
    /// Number of genomes per generation.
    pub population_size: usize,
    /// Default number of generations for a training run.
    pub generations: u32,
    /// Layer dimensions of every brain, input to output.
    pub layer_sizes: Vec<usize>,
    /// Initial weights are drawn from `[-weight_scale, weight_scale)`.
    pub weight_scale: f32,
    /// Genomes copied unchanged into the next generation.
    pub elitism: usize,
    /// Fraction of the ranked population allowed to reproduce.
    pub survival_threshold: f32,
    /// Probability that a child is produced by crossover instead of cloning.
    pub crossover_rate: f32,
    /// Lower bound of the log-uniform mutation scale.
    pub mutation_min: f32,
    /// Upper bound of the log-uniform mutation scale.
    pub mutation_max: f32,
    /// Stop training once the champion reaches this fitness.
    pub fitness_threshold: Option<f64>,
    /// Seed for pipes and evolution; `None` draws one from the OS.
    pub rng_seed: Option<u64>,
}

impl Default for Params {
    fn default() -> Self {
        let screen_width = 288.0;
        let screen_height = 512.0;
        Self {
            screen_width,
            screen_height,
            ground_y: screen_height * 0.79,
            bird_x: (screen_width * 0.2f32).trunc(),
            pipe_gap: 100.0,
            pipe_speed: 4.0,
            pipe_spawn_offset: 10.0,
            first_pipe_offset: 200.0,
            flap_velocity: -9.0,
            max_velocity_y: 10.0,
            gravity: 1.0,
            rotation_speed: 3.0,
            flap_rotation: 45.0,
            min_rotation: -90.0,
            rotation_threshold: 20.0,
            reflex_margin: 52.0,
            reflex_allowance: 35.0,
            flap_threshold: 0.5,
            survival_reward: 0.1,
            record_bonus: 5.0,
            max_ticks: Some(36_000),
            ticks_per_second: 30,
            population_size: 50,
            generations: 50,
            layer_sizes: vec![3, 4, 1],
            weight_scale: 1.0,
            elitism: 2,
            survival_threshold: 0.2,
            crossover_rate: 0.6,
            mutation_min: 0.002,
            mutation_max: 0.5,
            fitness_threshold: None,
            rng_seed: None,
        }
    }
}

impl Params {
    /// Lowest gap row a generated pipe may use (inclusive).
    pub fn min_gap_y(&self) -> i32 {
        (self.ground_y * 0.2).ceil() as i32
    }

    /// Gap rows must stay strictly below this value.
    pub fn max_gap_y(&self) -> i32 {
        (self.ground_y * 0.8 - self.pipe_gap).ceil() as i32
    }

    /// Checks that the parameters describe a playable, trainable game.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(Error::InvalidConfig(msg));

        if self.screen_width <= 0.0 || self.screen_height <= 0.0 {
            return fail("screen dimensions must be positive".into());
        }
        if self.ground_y <= 0.0 || self.ground_y > self.screen_height {
            return fail(format!(
                "ground_y {} must lie within the screen height {}",
                self.ground_y, self.screen_height
            ));
        }
        if self.pipe_gap <= 0.0 {
            return fail("pipe_gap must be positive".into());
        }
        if self.min_gap_y() >= self.max_gap_y() {
            return fail(format!(
                "pipe_gap {} leaves no room for a gap between {} and {}",
                self.pipe_gap,
                self.ground_y * 0.2,
                self.ground_y * 0.8 - self.pipe_gap
            ));
        }
        if self.pipe_speed <= 0.0 {
            return fail("pipe_speed must be positive".into());
        }
        if self.gravity < 0.0 || self.rotation_speed < 0.0 {
            return fail("gravity and rotation_speed must not be negative".into());
        }
        if self.ticks_per_second == 0 {
            return fail("ticks_per_second must be non-zero".into());
        }
        if self.population_size == 0 {
            return fail("population_size must be non-zero".into());
        }
        if self.elitism > self.population_size {
            return fail(format!(
                "elitism {} exceeds population_size {}",
                self.elitism, self.population_size
            ));
        }
        if self.layer_sizes.len() < 2 {
            return fail("layer_sizes needs at least an input and an output layer".into());
        }
        if self.layer_sizes.first() != Some(&3) || self.layer_sizes.last() != Some(&1) {
            return fail(format!(
                "layer_sizes {:?} must start with 3 inputs and end with 1 output",
                self.layer_sizes
            ));
        }
        if self.layer_sizes.contains(&0) {
            return fail("layer_sizes must not contain empty layers".into());
        }
        if !(0.0..=1.0).contains(&self.survival_threshold) || self.survival_threshold == 0.0 {
            return fail("survival_threshold must be in (0, 1]".into());
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return fail("crossover_rate must be in [0, 1]".into());
        }
        if self.mutation_min <= 0.0 || self.mutation_max <= self.mutation_min {
            return fail("mutation range must satisfy 0 < mutation_min < mutation_max".into());
        }
        if self.weight_scale <= 0.0 {
            return fail("weight_scale must be positive".into());
        }
        Ok(())
    }

    /// Seconds between two ticks in windowed modes.
    pub fn tick_interval(&self) -> f32 {
        1.0 / self.ticks_per_second as f32
    }

    /// Saves the parameters to a JSON file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Loads parameters from a JSON file. Missing fields take their defaults.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&json)?;
        params.validate()?;
        Ok(params)
    }
}
