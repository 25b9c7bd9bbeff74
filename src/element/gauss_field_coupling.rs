//! Sparse point-to-point projection writing Gaussian bumps.

use std::f64::consts::PI;

use super::{Dynamics, Io};
use crate::compute::gauss_profile;
use crate::schema::{ElementParameters, GaussFieldCouplingParameters};

/// For every coupling whose source sample is positive, adds
/// `weight * input[source] * bump(target)` to the output.
#[derive(Debug)]
pub struct GaussFieldCoupling {
    parameters: GaussFieldCouplingParameters,
    /// Unit bump centred on each coupling's target, one per coupling.
    bumps: Vec<Vec<f64>>,
}

impl GaussFieldCoupling {
    pub(crate) fn new(parameters: GaussFieldCouplingParameters, size: usize) -> Self {
        let scale = if parameters.normalized {
            1.0 / (2.0 * PI * parameters.width * parameters.width).sqrt()
        } else {
            1.0
        };
        let bumps = parameters
            .couplings
            .iter()
            .map(|c| {
                let mut bump = gauss_profile(
                    size,
                    c.target_index as f64,
                    parameters.width,
                    parameters.circular,
                );
                for v in &mut bump {
                    *v *= scale;
                }
                bump
            })
            .collect();

        Self { parameters, bumps }
    }
}

impl Dynamics for GaussFieldCoupling {
    fn init(&mut self, io: Io<'_>) {
        io.output.fill(0.0);
    }

    fn step(&mut self, io: Io<'_>, _t: f64, _delta_t: f64) {
        io.output.fill(0.0);
        for (coupling, bump) in self.parameters.couplings.iter().zip(&self.bumps) {
            let x = io.input[coupling.source_index];
            if x <= 0.0 {
                continue;
            }
            let amplitude = coupling.weight * x;
            for (out, b) in io.output.iter_mut().zip(bump) {
                *out += amplitude * b;
            }
        }
    }

    fn parameters(&self) -> ElementParameters {
        ElementParameters::GaussFieldCoupling(self.parameters.clone())
    }
}
