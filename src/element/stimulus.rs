//! Constant Gaussian stimulus.

use super::{Dynamics, Io};
use crate::compute::{gauss_profile, normalize_sum};
use crate::schema::{ElementDimensions, ElementParameters, GaussStimulusParameters};

/// Source element whose output is a fixed Gaussian bump.
#[derive(Debug)]
pub struct GaussStimulus {
    parameters: GaussStimulusParameters,
    d_x: f64,
}

impl GaussStimulus {
    pub(crate) fn new(parameters: GaussStimulusParameters, dimensions: &ElementDimensions) -> Self {
        Self {
            parameters,
            d_x: dimensions.d_x,
        }
    }

    /// Stimulus profile over `size` samples. `position` is in spatial units,
    /// `width` in samples.
    pub fn profile(&self, size: usize) -> Vec<f64> {
        let p = &self.parameters;
        let mut profile = gauss_profile(size, p.position / self.d_x, p.width, p.circular);
        if p.normalized {
            normalize_sum(&mut profile);
        }
        for v in &mut profile {
            *v *= p.amplitude;
        }
        profile
    }
}

impl Dynamics for GaussStimulus {
    fn init(&mut self, io: Io<'_>) {
        let profile = self.profile(io.output.len());
        io.output.copy_from_slice(&profile);
    }

    fn step(&mut self, _io: Io<'_>, _t: f64, _delta_t: f64) {}

    fn parameters(&self) -> ElementParameters {
        ElementParameters::GaussStimulus(self.parameters.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, ElementId, OUTPUT};
    use crate::schema::ElementCommonParameters;

    fn stimulus(size: usize, parameters: GaussStimulusParameters) -> Element {
        Element::new(
            ElementId(0),
            &ElementCommonParameters::new("stimulus", ElementDimensions::with_size(size)),
            parameters,
        )
        .unwrap()
    }

    #[test]
    fn test_peak_at_position() {
        let mut element = stimulus(
            50,
            GaussStimulusParameters {
                position: 20.0,
                amplitude: 8.0,
                ..Default::default()
            },
        );
        element.init();

        let output = element.component(OUTPUT).unwrap();
        assert_eq!(output[20], 8.0);
        assert!((output[18] - output[22]).abs() < 1e-12);
        assert!(output[19] < 8.0);
    }

    #[test]
    fn test_width_in_samples_with_fine_resolution() {
        let mut element = Element::new(
            ElementId(0),
            &ElementCommonParameters::new("stimulus", ElementDimensions::new(50.0, 0.5).unwrap()),
            GaussStimulusParameters {
                width: 2.0,
                amplitude: 1.0,
                position: 25.0,
                circular: false,
                ..Default::default()
            },
        )
        .unwrap();
        element.init();

        let output = element.component(OUTPUT).unwrap();
        assert_eq!(output.len(), 100);
        assert_eq!(output[50], 1.0);
        assert!((output[52] - (-0.5f64).exp()).abs() < 1e-12);
        assert!((output[48] - output[52]).abs() < 1e-12);
    }

    #[test]
    fn test_constant_over_steps() {
        let mut element = stimulus(30, GaussStimulusParameters::default());
        element.init();
        let before = element.get_component(OUTPUT).unwrap();
        element.step(1.0, 1.0, |_, _| None);
        assert_eq!(element.component(OUTPUT).unwrap(), &before[..]);
        // Circular profile centred on sample 0 wraps to the far edge
        assert!((before[1] - before[29]).abs() < 1e-12);
    }

    #[test]
    fn test_normalized_profile_sums_to_amplitude() {
        let mut element = stimulus(
            100,
            GaussStimulusParameters {
                position: 50.0,
                amplitude: 3.0,
                normalized: true,
                ..Default::default()
            },
        );
        element.init();
        let sum: f64 = element.component(OUTPUT).unwrap().iter().sum();
        assert!((sum - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_position_out_of_range_fails() {
        let result = Element::new(
            ElementId(0),
            &ElementCommonParameters::new("stimulus", ElementDimensions::with_size(10)),
            GaussStimulusParameters {
                position: 11.0,
                ..Default::default()
            },
        );
        assert!(result.is_err());
    }
}
