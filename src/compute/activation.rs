//! Output nonlinearities applied to field activation.

use crate::schema::ActivationFunction;

/// Logistic function `1 / (1 + exp(-steepness * (x - x_shift)))`.
#[inline]
pub fn sigmoid(x: f64, steepness: f64, x_shift: f64) -> f64 {
    1.0 / (1.0 + (-steepness * (x - x_shift)).exp())
}

/// Step function: `1` strictly above `x_shift`, `0` otherwise.
#[inline]
pub fn heaviside(x: f64, x_shift: f64) -> f64 {
    if x > x_shift { 1.0 } else { 0.0 }
}

impl ActivationFunction {
    #[inline]
    pub fn apply(&self, x: f64) -> f64 {
        match *self {
            ActivationFunction::Sigmoid { steepness, x_shift } => sigmoid(x, steepness, x_shift),
            ActivationFunction::Heaviside { x_shift } => heaviside(x, x_shift),
        }
    }

    /// Apply elementwise into a pre-allocated buffer.
    pub fn apply_into(&self, input: &[f64], output: &mut [f64]) {
        for (out, &x) in output.iter_mut().zip(input) {
            *out = self.apply(x);
        }
    }
}
