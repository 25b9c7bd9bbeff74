//! Leaky-integrator neural field with a pluggable output nonlinearity.

use log::trace;

use super::{ACTIVATION, Dynamics, Io, RESTING_LEVEL};
use crate::compute::heaviside;
use crate::schema::{ElementParameters, NeuralFieldParameters};

/// Threshold above which a sample counts towards the centroid.
pub const CENTROID_THRESHOLD: f64 = 0.1;
/// Threshold above which a sample belongs to a bump.
pub const BUMP_THRESHOLD: f64 = 1e-5;
/// Largest change of activation sum, mean and norm for a stable step.
pub const STABILITY_THRESHOLD: f64 = 0.035;

const CENTROID_EPSILON: f64 = 1e-6;

/// A connected region of positive activation.
#[derive(Debug, Clone, PartialEq)]
pub struct NeuralFieldBump {
    /// First sample of the bump.
    pub start: usize,
    /// Last sample of the bump (inclusive). Smaller than `start` when the
    /// bump wraps around the field's edge.
    pub end: usize,
    /// Number of samples.
    pub width: usize,
    /// Midpoint in samples.
    pub centroid: f64,
    /// Peak activation.
    pub amplitude: f64,
}

/// Summary of the field after the latest step.
#[derive(Debug, Clone, PartialEq)]
pub struct NeuralFieldState {
    /// Circular centroid of the active region, `-1` when nothing is active.
    pub centroid: f64,
    pub lowest_activation: f64,
    pub highest_activation: f64,
    pub stable: bool,
    pub bumps: Vec<NeuralFieldBump>,
}

impl Default for NeuralFieldState {
    fn default() -> Self {
        Self {
            centroid: -1.0,
            lowest_activation: 0.0,
            highest_activation: 0.0,
            stable: false,
            bumps: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActivationSummary {
    sum: f64,
    mean: f64,
    norm: f64,
}

impl ActivationSummary {
    fn of(activation: &[f64]) -> Self {
        let sum: f64 = activation.iter().sum();
        let norm = activation.iter().map(|a| a * a).sum::<f64>().sqrt();
        Self {
            sum,
            mean: sum / activation.len() as f64,
            norm,
        }
    }

    fn close_to(&self, other: &Self) -> bool {
        (self.sum - other.sum).abs() < STABILITY_THRESHOLD
            && (self.mean - other.mean).abs() < STABILITY_THRESHOLD
            && (self.norm - other.norm).abs() < STABILITY_THRESHOLD
    }
}

#[derive(Debug)]
pub struct NeuralField {
    parameters: NeuralFieldParameters,
    activation: Vec<f64>,
    resting_level: Vec<f64>,
    state: NeuralFieldState,
    previous: Option<ActivationSummary>,
}

impl NeuralField {
    pub(crate) fn new(parameters: NeuralFieldParameters, size: usize) -> Self {
        Self {
            activation: vec![parameters.starting_resting_level; size],
            resting_level: vec![parameters.starting_resting_level; size],
            parameters,
            state: NeuralFieldState::default(),
            previous: None,
        }
    }

    pub fn activation(&self) -> &[f64] {
        &self.activation
    }

    pub fn resting_level(&self) -> &[f64] {
        &self.resting_level
    }

    pub fn centroid(&self) -> f64 {
        self.state.centroid
    }

    pub fn state(&self) -> &NeuralFieldState {
        &self.state
    }

    pub fn is_stable(&self) -> bool {
        self.state.stable
    }

    pub fn bumps(&self) -> &[NeuralFieldBump] {
        &self.state.bumps
    }

    fn update_state(&mut self) {
        self.state.centroid = compute_centroid(&self.activation, self.state.centroid);
        self.state.lowest_activation = self.activation.iter().copied().fold(f64::INFINITY, f64::min);
        self.state.highest_activation = self
            .activation
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);

        let summary = ActivationSummary::of(&self.activation);
        self.state.stable = self.previous.is_some_and(|p| p.close_to(&summary));
        self.previous = Some(summary);

        self.state.bumps = find_bumps(&self.activation, BUMP_THRESHOLD);
    }
}

impl Dynamics for NeuralField {
    fn init(&mut self, io: Io<'_>) {
        let resting = self.parameters.starting_resting_level;
        self.activation.fill(resting);
        self.resting_level.fill(resting);
        self.parameters.activation.apply_into(&self.activation, io.output);

        self.state = NeuralFieldState {
            lowest_activation: resting,
            highest_activation: resting,
            ..Default::default()
        };
        self.previous = None;
    }

    fn step(&mut self, io: Io<'_>, _t: f64, delta_t: f64) {
        let rate = delta_t / self.parameters.tau;
        for ((a, r), x) in self
            .activation
            .iter_mut()
            .zip(&self.resting_level)
            .zip(io.input)
        {
            *a += rate * (-*a + r + x);
        }

        self.parameters.activation.apply_into(&self.activation, io.output);
        self.update_state();
        trace!(
            "field step: centroid {:.3}, max {:.3}",
            self.state.centroid, self.state.highest_activation
        );
    }

    fn component(&self, name: &str) -> Option<&[f64]> {
        match name {
            ACTIVATION => Some(&self.activation),
            RESTING_LEVEL => Some(&self.resting_level),
            _ => None,
        }
    }

    fn component_mut(&mut self, name: &str) -> Option<&mut [f64]> {
        match name {
            ACTIVATION => Some(&mut self.activation),
            RESTING_LEVEL => Some(&mut self.resting_level),
            _ => None,
        }
    }

    fn component_names(&self) -> &'static [&'static str] {
        &[ACTIVATION, RESTING_LEVEL]
    }

    fn parameters(&self) -> ElementParameters {
        ElementParameters::NeuralField(self.parameters.clone())
    }
}

/// Circular centroid of the samples whose activation exceeds
/// [`CENTROID_THRESHOLD`].
///
/// Returns `-1` when no sample is active, and `previous` when the active
/// mass is negligible. Active regions touching either edge are measured on a
/// shifted period so that a region wrapping around the edge stays contiguous.
pub fn compute_centroid(activation: &[f64], previous: f64) -> f64 {
    let size = activation.len();
    let active: Vec<f64> = activation
        .iter()
        .map(|&a| heaviside(a, CENTROID_THRESHOLD))
        .collect();

    if !active.iter().any(|&a| a > 0.0) {
        return -1.0;
    }

    let period = size as f64;
    let midpoint = period * 0.5;
    let at_limits = active[0] > 0.0 || active[size - 1] > 0.0;

    let mut mass = 0.0;
    let mut weighted = 0.0;
    for (i, &a) in active.iter().enumerate() {
        let offset = if at_limits { period * 10.0 } else { 0.0 };
        let distance = (i as f64 - midpoint + offset) % period;
        mass += a;
        weighted += distance * a;
    }

    if mass <= CENTROID_EPSILON {
        return previous;
    }

    let centroid = (midpoint + weighted / mass) % period;
    if at_limits && centroid < 0.0 {
        centroid + period
    } else {
        centroid
    }
}

/// Maximal runs of samples above `threshold`. A run touching the last sample
/// is merged with a run touching the first sample.
pub fn find_bumps(activation: &[f64], threshold: f64) -> Vec<NeuralFieldBump> {
    let size = activation.len();
    let mut bumps: Vec<NeuralFieldBump> = Vec::new();
    let mut current: Option<(usize, f64)> = None;

    let close = |start: usize, end: usize, amplitude: f64| NeuralFieldBump {
        start,
        end,
        width: end - start + 1,
        centroid: (start + end) as f64 / 2.0,
        amplitude,
    };

    for (i, &a) in activation.iter().enumerate() {
        match (a > threshold, current) {
            (true, None) => current = Some((i, a)),
            (true, Some((start, peak))) => current = Some((start, peak.max(a))),
            (false, Some((start, peak))) => {
                bumps.push(close(start, i - 1, peak));
                current = None;
            }
            (false, None) => {}
        }
    }
    if let Some((start, peak)) = current {
        bumps.push(close(start, size - 1, peak));
    }

    if bumps.len() > 1 && activation[0] > threshold && activation[size - 1] > threshold {
        let first = bumps.remove(0);
        if let Some(last) = bumps.pop() {
            let width = first.width + last.width;
            let centroid = (last.start as f64 + (width - 1) as f64 / 2.0) % size as f64;
            bumps.push(NeuralFieldBump {
                start: last.start,
                end: first.end,
                width,
                centroid,
                amplitude: first.amplitude.max(last.amplitude),
            });
        }
    }

    bumps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::sigmoid;
    use crate::element::{Element, ElementId, INPUT, OUTPUT, SourceInfo};
    use crate::schema::{ActivationFunction, ElementCommonParameters, ElementDimensions};

    fn no_sources(_: ElementId, _: &str) -> Option<&'static [f64]> {
        None
    }

    fn field(size: usize, tau: f64, resting: f64) -> Element {
        Element::new(
            ElementId(0),
            &ElementCommonParameters::new("field", ElementDimensions::with_size(size)),
            NeuralFieldParameters {
                tau,
                starting_resting_level: resting,
                activation: ActivationFunction::Sigmoid {
                    steepness: 2.0,
                    x_shift: 0.0,
                },
            },
        )
        .unwrap()
    }

    #[test]
    fn test_init_state() {
        let mut element = field(5, 1.0, -5.0);
        element.init();

        assert_eq!(element.component(ACTIVATION).unwrap(), &[-5.0; 5]);
        let expected = sigmoid(-5.0, 2.0, 0.0);
        assert_eq!(element.component(OUTPUT).unwrap(), &[expected; 5]);
        assert_eq!(element.as_neural_field().unwrap().centroid(), -1.0);
    }

    #[test]
    fn test_resting_level_is_fixed_point() {
        let mut element = field(8, 10.0, -3.0);
        element.init();
        element.step(1.0, 1.0, no_sources);
        assert_eq!(element.component(ACTIVATION).unwrap(), &[-3.0; 8]);
    }

    #[test]
    fn test_euler_step() {
        let (tau, resting, a0, dt) = (7.0, -2.0, 3.5, 0.5);
        let mut element = field(4, tau, resting);
        element.init();
        element.component_mut(ACTIVATION).unwrap().fill(a0);
        element.step(dt, dt, no_sources);

        let expected = a0 + (dt / tau) * (-a0 + resting + 0.0);
        assert_eq!(element.component(ACTIVATION).unwrap(), &[expected; 4]);
        assert_eq!(expected, a0 + (dt / tau) * (resting - a0));
    }

    #[test]
    fn test_input_drives_activation() {
        let mut element = field(3, 1.0, 0.0);
        element.init();
        // tau == dt: activation jumps straight to resting + input
        element.component_mut(RESTING_LEVEL).unwrap().fill(1.0);
        let self_info = SourceInfo {
            id: ElementId(0),
            name: "field",
            component_len: 3,
        };
        element.register_input(self_info, RESTING_LEVEL).unwrap();
        element.step(1.0, 1.0, no_sources);
        assert_eq!(element.component(INPUT).unwrap(), &[1.0; 3]);
        assert_eq!(element.component(ACTIVATION).unwrap(), &[2.0; 3]);
    }

    #[test]
    fn test_centroid_sentinel() {
        assert_eq!(compute_centroid(&[0.0, 0.05, 0.1, -4.0], 3.0), -1.0);
    }

    #[test]
    fn test_centroid_interior() {
        let mut activation = vec![-1.0; 20];
        activation[4] = 1.0;
        activation[5] = 1.0;
        activation[6] = 1.0;
        assert!((compute_centroid(&activation, -1.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_centroid_wraps() {
        let mut activation = vec![-1.0; 10];
        activation[9] = 1.0;
        activation[0] = 1.0;
        activation[1] = 1.0;
        assert!(compute_centroid(&activation, -1.0).abs() < 1e-12);

        let mut activation = vec![-1.0; 10];
        for i in [8, 9, 0, 1] {
            activation[i] = 1.0;
        }
        assert!((compute_centroid(&activation, -1.0) - 9.5).abs() < 1e-12);
    }

    #[test]
    fn test_bumps() {
        let activation = [0.0, 1.0, 2.0, 0.0, 0.0, 3.0, 0.0];
        let bumps = find_bumps(&activation, BUMP_THRESHOLD);
        assert_eq!(bumps.len(), 2);
        assert_eq!((bumps[0].start, bumps[0].end, bumps[0].width), (1, 2, 2));
        assert_eq!(bumps[0].amplitude, 2.0);
        assert_eq!(bumps[1].centroid, 5.0);
    }

    #[test]
    fn test_bumps_merge_across_edge() {
        let activation = [1.0, 2.0, 0.0, 0.0, 0.0, 4.0];
        let bumps = find_bumps(&activation, BUMP_THRESHOLD);
        assert_eq!(bumps.len(), 1);
        let bump = &bumps[0];
        assert_eq!((bump.start, bump.end, bump.width), (5, 1, 3));
        assert_eq!(bump.amplitude, 4.0);
        assert_eq!(bump.centroid, 0.0);
    }

    #[test]
    fn test_stability() {
        let mut element = field(10, 10.0, -5.0);
        element.init();
        element.step(1.0, 1.0, no_sources);
        // First step has no previous summary
        assert!(!element.as_neural_field().unwrap().is_stable());
        element.step(2.0, 1.0, no_sources);
        assert!(element.as_neural_field().unwrap().is_stable());

        element.component_mut(ACTIVATION).unwrap().fill(5.0);
        element.step(3.0, 1.0, no_sources);
        assert!(!element.as_neural_field().unwrap().is_stable());
    }
}
