//! Neural network implementation for neural agents.
//!
//! A [`Brain`] is a fixed-topology multi-layer perceptron with tanh hidden
//! layers and a sigmoid output, plus the genetic operators (mutation and
//! weighted crossover) the evolution driver needs. It implements
//! [`Network`](super::agent::Network), so it can drive a bird directly.

use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::agent::Network;

pub mod mlp;

pub use mlp::{Activation, Mlp};

/// Multi-layer perceptron brain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brain {
    /// Ordered layers from input to output.
    pub layers: Vec<Mlp>,
    /// Raw observations (screen pixels) are multiplied by this before the first layer.
    pub input_scale: f32,
}

impl Brain {
    /// Creates a new brain with random weights.
    ///
    /// `layer_sizes` lists every layer width including input and output.
    pub fn new<R: Rng + ?Sized>(
        layer_sizes: &[usize],
        scale: f32,
        input_scale: f32,
        rng: &mut R,
    ) -> Self {
        let last = layer_sizes.len().saturating_sub(2);
        let layers = (0..layer_sizes.len().saturating_sub(1))
            .map(|i| {
                let activation = if i == last {
                    Activation::Sigmoid
                } else {
                    Activation::Tanh
                };
                Mlp::new_random(layer_sizes[i], layer_sizes[i + 1], scale, activation, rng)
            })
            .collect();

        Self {
            layers,
            input_scale,
        }
    }

    /// Number of inputs the first layer expects.
    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, Mlp::input_size)
    }

    /// Number of outputs of the last layer.
    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, Mlp::output_size)
    }

    /// Runs a forward pass through the brain.
    #[inline]
    pub fn think(&self, inputs: &Array1<f32>) -> Array1<f32> {
        let mut output = inputs * self.input_scale;
        for layer in &self.layers {
            output = layer.forward(&output);
        }
        output
    }

    /// Creates a new brain by weighted averaging two parent brains.
    ///
    /// `weight1` is the share of `parent1`. Parents with different shapes
    /// cannot be mixed; the result is then a clone of `parent1`.
    pub fn crossover_weighted(parent1: &Brain, parent2: &Brain, weight1: f32) -> Self {
        if !parent1.same_shape(parent2) {
            return parent1.clone();
        }
        let layers = parent1
            .layers
            .iter()
            .zip(&parent2.layers)
            .map(|(layer1, layer2)| Mlp::crossover_weighted(layer1, layer2, weight1))
            .collect();
        Self {
            layers,
            input_scale: parent1.input_scale,
        }
    }

    /// Mutates all parameters in the brain.
    pub fn mutate<R: Rng + ?Sized>(&mut self, mutation_scale: f32, rng: &mut R) {
        for layer in &mut self.layers {
            layer.mutate(mutation_scale, rng);
        }
    }

    /// Euclidean distance between the parameters of two brains.
    ///
    /// Brains of different shape are infinitely far apart.
    pub fn distance(brain1: &Brain, brain2: &Brain) -> f32 {
        if !brain1.same_shape(brain2) {
            return f32::INFINITY;
        }
        brain1
            .to_flat_vector()
            .iter()
            .zip(brain2.to_flat_vector())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f32>()
            .sqrt()
    }

    /// Flattens all weights and biases into a single vector.
    pub fn to_flat_vector(&self) -> Vec<f32> {
        let mut flat = Vec::with_capacity(self.parameter_count());
        for layer in &self.layers {
            flat.extend(layer.weights.iter().copied());
            flat.extend(layer.biases.iter().copied());
        }
        flat
    }

    /// Total number of weights and biases.
    pub fn parameter_count(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.weights.len() + l.biases.len())
            .sum()
    }

    fn same_shape(&self, other: &Brain) -> bool {
        self.layers.len() == other.layers.len()
            && self
                .layers
                .iter()
                .zip(&other.layers)
                .all(|(a, b)| a.weights.dim() == b.weights.dim())
    }
}

impl Network for Brain {
    fn activate(&self, inputs: &[f32; 3]) -> f32 {
        let inputs = Array1::from_iter(inputs.iter().copied());
        self.think(&inputs)[0]
    }
}
