//! Agent strategies deciding when a bird flaps.
//!
//! A bird's [`Controller`] is picked once when the bird is spawned and never
//! changes during the episode. Strategies only read the pipe sequence.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::bird::Bird;
use super::params::Params;
use super::pipes::{PipePair, PipeQueue};

/// A decision function mapping `(bird_y, upper_pipe_y, lower_pipe_y)` to a
/// scalar. Neural birds flap when the scalar exceeds the flap threshold.
///
/// Implementations must be pure: the same inputs always give the same output.
pub trait Network: Send + Sync + fmt::Debug {
    /// Evaluates the network on one observation.
    fn activate(&self, inputs: &[f32; 3]) -> f32;
}

/// Which strategy a controller uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyKind {
    /// Human input.
    Keyboard,
    /// Scripted reflex heuristic.
    Reflex,
    /// Neural network inference.
    Neural,
}

/// Per-bird decision procedure.
#[derive(Debug)]
pub enum Controller {
    /// Flaps once per delivered input event.
    Keyboard {
        /// An input event is waiting to be consumed.
        pending: bool,
    },
    /// Flaps whenever the bird sinks close to the lower pipe.
    Reflex,
    /// Flaps when the network output exceeds the threshold.
    Neural(Box<dyn Network>),
}

impl Controller {
    /// A keyboard controller with no pending input.
    pub fn keyboard() -> Self {
        Controller::Keyboard { pending: false }
    }

    /// The scripted reflex controller.
    pub fn reflex() -> Self {
        Controller::Reflex
    }

    /// A controller driven by `network`.
    pub fn neural(network: impl Network + 'static) -> Self {
        Controller::Neural(Box::new(network))
    }

    /// The strategy tag.
    pub fn kind(&self) -> StrategyKind {
        match self {
            Controller::Keyboard { .. } => StrategyKind::Keyboard,
            Controller::Reflex => StrategyKind::Reflex,
            Controller::Neural(_) => StrategyKind::Neural,
        }
    }

    /// Delivers an input event. Returns `false` for non-keyboard controllers.
    pub fn press(&mut self) -> bool {
        match self {
            Controller::Keyboard { pending } => {
                *pending = true;
                true
            }
            _ => false,
        }
    }

    /// Decides whether the bird flaps this tick.
    pub fn decide(&mut self, bird: &Bird, pipes: &PipeQueue, params: &Params) -> bool {
        match self {
            Controller::Keyboard { pending } => std::mem::take(pending),
            Controller::Reflex => {
                let pipe = pipes.nearest(bird.x, params.reflex_margin);
                bird.y >= pipe.lower_y - params.reflex_allowance
            }
            Controller::Neural(network) => {
                let pipe = pipes.nearest(bird.x, params.reflex_margin);
                network.activate(&observe(bird, pipe)) > params.flap_threshold
            }
        }
    }
}

/// The observation fed to neural controllers.
pub fn observe(bird: &Bird, pipe: &PipePair) -> [f32; 3] {
    [bird.y, pipe.upper_y, pipe.lower_y]
}
