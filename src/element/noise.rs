//! Gaussian white noise source.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, StandardNormal};

use super::{Dynamics, Io};
use crate::schema::{ElementParameters, NormalNoiseParameters};

/// Source element emitting `amplitude / sqrt(delta_t) * N(0, 1)` per sample.
#[derive(Debug)]
pub struct NormalNoise {
    parameters: NormalNoiseParameters,
    rng: StdRng,
}

impl NormalNoise {
    pub(crate) fn new(parameters: NormalNoiseParameters) -> Self {
        let rng = Self::seeded(&parameters);
        Self { parameters, rng }
    }

    fn seeded(parameters: &NormalNoiseParameters) -> StdRng {
        match parameters.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl Dynamics for NormalNoise {
    fn init(&mut self, io: Io<'_>) {
        self.rng = Self::seeded(&self.parameters);
        io.output.fill(0.0);
    }

    fn step(&mut self, io: Io<'_>, _t: f64, delta_t: f64) {
        let scale = self.parameters.amplitude / delta_t.sqrt();
        for out in io.output.iter_mut() {
            let sample: f64 = StandardNormal.sample(&mut self.rng);
            *out = scale * sample;
        }
    }

    fn parameters(&self) -> ElementParameters {
        ElementParameters::NormalNoise(self.parameters.clone())
    }
}
