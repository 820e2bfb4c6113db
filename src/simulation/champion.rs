//! Champion persistence.
//!
//! The best brain of a training run is written as a single JSON document so
//! it can be replayed later.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::brain::Brain;
use super::error::{Error, Result};
use super::evolution::Genome;

/// Format version written by this build.
pub const CHAMPION_VERSION: u32 = 1;

/// A saved champion brain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Champion {
    /// Format version.
    pub version: u32,
    /// When the file was written, RFC 3339.
    pub saved_at: String,
    /// Generation the champion was evaluated in.
    pub generation: u32,
    /// Fitness the champion earned.
    pub fitness: f64,
    /// The decision function.
    pub brain: Brain,
}

impl Champion {
    /// Wraps a genome for saving.
    pub fn from_genome(generation: u32, genome: &Genome) -> Self {
        Self {
            version: CHAMPION_VERSION,
            saved_at: chrono::Utc::now().to_rfc3339(),
            generation,
            fitness: genome.fitness,
            brain: genome.brain.clone(),
        }
    }

    /// Saves the champion to a JSON file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), fitness = self.fitness, "champion saved");
        Ok(())
    }

    /// Loads a champion from a JSON file and checks it can drive a bird.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let champion: Self = serde_json::from_str(&json)?;

        if champion.version != CHAMPION_VERSION {
            return Err(Error::IncompatibleChampion {
                found: champion.version,
                expected: CHAMPION_VERSION,
            });
        }
        let (inputs, outputs) = (champion.brain.input_size(), champion.brain.output_size());
        if inputs != 3 || outputs != 1 {
            return Err(Error::ChampionShape { inputs, outputs });
        }
        Ok(champion)
    }
}
