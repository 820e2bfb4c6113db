//! Multi-layer perceptron layer.

use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Activation applied to a layer's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    /// Hyperbolic tangent, used for hidden layers.
    Tanh,
    /// Logistic sigmoid, used for the output layer so it lands in (0, 1).
    Sigmoid,
}

impl Activation {
    #[inline]
    fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Tanh => x.tanh(),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
        }
    }
}

/// A single fully connected layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mlp {
    /// Weight matrix (`output_size` × `input_size`).
    pub weights: Array2<f32>,
    /// Bias vector (`output_size`).
    pub biases: Array1<f32>,
    /// Output activation.
    pub activation: Activation,
}

impl Mlp {
    /// Creates a new layer with weights and biases drawn from `[-scale, scale)`.
    pub fn new_random<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        scale: f32,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        Self {
            weights: Array2::from_shape_fn((output_size, input_size), |_| {
                rng.random_range(-scale..scale)
            }),
            biases: Array1::from_shape_fn(output_size, |_| rng.random_range(-scale..scale)),
            activation,
        }
    }

    /// Number of inputs.
    pub fn input_size(&self) -> usize {
        self.weights.ncols()
    }

    /// Number of outputs.
    pub fn output_size(&self) -> usize {
        self.weights.nrows()
    }

    /// Performs a forward pass.
    #[inline]
    pub fn forward(&self, inputs: &Array1<f32>) -> Array1<f32> {
        let mut output = self.weights.dot(inputs);
        output += &self.biases;
        let activation = self.activation;
        output.mapv_inplace(|x| activation.apply(x));
        output
    }

    /// Adds uniform noise in `[-mutation_scale, mutation_scale)` to every parameter.
    pub fn mutate<R: Rng + ?Sized>(&mut self, mutation_scale: f32, rng: &mut R) {
        if mutation_scale <= 0.0 {
            return;
        }
        self.weights
            .mapv_inplace(|w| w + rng.random_range(-mutation_scale..mutation_scale));
        self.biases
            .mapv_inplace(|b| b + rng.random_range(-mutation_scale..mutation_scale));
    }

    /// Creates a new layer by weighted averaging two parent layers.
    ///
    /// `weight1` is the share of `parent1`; the rest comes from `parent2`.
    pub fn crossover_weighted(parent1: &Mlp, parent2: &Mlp, weight1: f32) -> Self {
        let weight2 = 1.0 - weight1;
        Self {
            weights: &parent1.weights * weight1 + &parent2.weights * weight2,
            biases: &parent1.biases * weight1 + &parent2.biases * weight2,
            activation: parent1.activation,
        }
    }
}
