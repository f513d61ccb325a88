use serde::{Deserialize, Serialize};

/// Activation kinds a neuron can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationFunction {
    /// Logistic sigmoid: 1/(1+e^(-x))
    Sigmoid,

    /// Hyperbolic tangent, saturated to ±1 beyond |x| > 10
    Tangent,
}

impl Default for ActivationFunction {
    fn default() -> Self {
        ActivationFunction::Sigmoid
    }
}

impl ActivationFunction {
    /// Apply this activation to a weighted input sum
    pub fn apply(self, x: f64) -> f64 {
        activation::activate(self, x)
    }
}

/// Activation functions for neural networks
pub mod activation {
    use super::ActivationFunction;

    /// Past this magnitude the tangent output is pinned to ±1
    pub const TANGENT_SATURATION: f64 = 10.0;

    /// Apply activation function to input value
    pub fn activate(func: ActivationFunction, x: f64) -> f64 {
        match func {
            ActivationFunction::Sigmoid => logistic(x),
            ActivationFunction::Tangent => bounded_tanh(x),
        }
    }

    /// Logistic sigmoid activation function
    pub fn logistic(x: f64) -> f64 {
        1.0 / (1.0 + (-x).exp())
    }

    /// Hyperbolic tangent activation function
    pub fn bounded_tanh(x: f64) -> f64 {
        if x < -TANGENT_SATURATION {
            -1.0
        } else if x > TANGENT_SATURATION {
            1.0
        } else {
            x.tanh()
        }
    }

    /// Slope term `(1 - y) * y` used by backpropagation on a neuron output `y`
    pub fn output_slope(y: f64) -> f64 {
        (1.0 - y) * y
    }
}
