//! # Flappy Evo - Neuroevolution Testbed for Flappy Bird
//!
//! A Flappy Bird clone whose players are evolved neural networks. A whole
//! cohort of birds flies through the same pipe course at once, each bird
//! steered by its own decision function, and the distance each one survives
//! becomes the fitness of its genome.
//!
//! ## Features
//!
//! - Fixed-timestep bird physics (gravity, flap impulse, rotation)
//! - Pixel-exact collision between sprite hit masks
//! - Seeded pipe generation with a FIFO pipe sequence
//! - Keyboard, scripted-reflex and neural-network agent strategies
//! - Episode harness with configurable fitness shaping
//! - Generational evolution of MLP brains (elitism, crossover, mutation)
//! - Save/load of the champion brain as JSON
//!
//! ## Core Modules
//!
//! - [`simulation::state`] - Simulation state and the per-tick update
//! - [`simulation::harness`] - Episode state machine and fitness bookkeeping
//! - [`simulation::evolution`] - Population management and reproduction
//! - [`simulation::collision`] - Hit masks and crash detection
//! - [`simulation::agent`] - Agent strategies

/// Core simulation logic and data structures.
pub mod simulation {
    /// Agent strategies deciding when a bird flaps.
    pub mod agent;
    /// Bird entity and its per-tick physics.
    pub mod bird;
    /// Neural network implementation for neural agents.
    pub mod brain;
    /// Champion persistence.
    pub mod champion;
    /// Pixel-mask collision detection.
    pub mod collision;
    /// Error types.
    pub mod error;
    /// Population management and reproduction.
    pub mod evolution;
    /// Episode loop and fitness shaping.
    pub mod harness;
    /// Simulation parameters.
    pub mod params;
    /// Pipe generation and the FIFO pipe sequence.
    pub mod pipes;
    /// Sprite hit-mask resources.
    pub mod sprites;
    /// Simulation state shared by one cohort of birds.
    pub mod state;
}

pub use simulation::error::{Error, Result};
