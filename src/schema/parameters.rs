//! Element type labels and the type-specific parameter bundles.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ElementDimensions;
use crate::error::{DnfError, Result};

/// Closed set of element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementLabel {
    Uninitialized,
    NeuralField,
    GaussStimulus,
    NormalNoise,
    GaussKernel,
    MexicanHatKernel,
    LateralInteractions,
    FieldCoupling,
    GaussFieldCoupling,
}

impl ElementLabel {
    /// Every constructible label, in the order pickers list them.
    pub const ALL: [ElementLabel; 8] = [
        ElementLabel::NeuralField,
        ElementLabel::GaussStimulus,
        ElementLabel::NormalNoise,
        ElementLabel::GaussKernel,
        ElementLabel::MexicanHatKernel,
        ElementLabel::LateralInteractions,
        ElementLabel::FieldCoupling,
        ElementLabel::GaussFieldCoupling,
    ];

    /// Human-readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            ElementLabel::Uninitialized => "uninitialized",
            ElementLabel::NeuralField => "neural field",
            ElementLabel::GaussStimulus => "gauss stimulus",
            ElementLabel::NormalNoise => "normal noise",
            ElementLabel::GaussKernel => "gauss kernel",
            ElementLabel::MexicanHatKernel => "mexican hat kernel",
            ElementLabel::LateralInteractions => "lateral interactions",
            ElementLabel::FieldCoupling => "field coupling",
            ElementLabel::GaussFieldCoupling => "gauss field coupling",
        }
    }
}

impl fmt::Display for ElementLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Output nonlinearity of a neural field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivationFunction {
    /// `1 / (1 + exp(-steepness * (x - x_shift)))`
    Sigmoid { steepness: f64, x_shift: f64 },
    /// `1` where `x > x_shift`, `0` elsewhere.
    Heaviside { x_shift: f64 },
}

impl Default for ActivationFunction {
    fn default() -> Self {
        ActivationFunction::Sigmoid {
            steepness: 4.0,
            x_shift: 0.0,
        }
    }
}

/// Weight update law of a plastic field coupling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningRule {
    #[default]
    Hebb,
    Oja,
    DeltaWidrowHoff,
    DeltaKroghHertz,
}

impl fmt::Display for LearningRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LearningRule::Hebb => "hebbian",
            LearningRule::Oja => "oja",
            LearningRule::DeltaWidrowHoff => "delta widrow-hoff",
            LearningRule::DeltaKroghHertz => "delta krogh-hertz",
        };
        f.write_str(name)
    }
}

/// How a kernel convolves its input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvolutionMethod {
    /// Direct "valid" correlation over a pre-wrapped copy of the input.
    #[default]
    Direct,
    /// Circular convolution in the frequency domain. Only used for
    /// circular kernels; non-circular kernels fall back to `Direct`.
    Fft,
}

/// Options shared by every kernel type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelOptions {
    /// Wrap the field at its edges.
    pub circular: bool,
    /// Divide each Gaussian profile by its sum before scaling.
    pub normalized: bool,
    /// Number of widths retained on each side of the kernel centre.
    pub cutoff_factor: f64,
    pub method: ConvolutionMethod,
}

impl Default for KernelOptions {
    fn default() -> Self {
        Self {
            circular: true,
            normalized: true,
            cutoff_factor: 5.0,
            method: ConvolutionMethod::Direct,
        }
    }
}

impl KernelOptions {
    fn validate(&self, element: &str) -> Result<()> {
        if !(self.cutoff_factor > 0.0) {
            return Err(DnfError::invalid(element, "kernel cutoff factor must be positive"));
        }
        Ok(())
    }
}

fn positive(element: &str, what: &str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(DnfError::invalid(
            element,
            format!("{what} must be positive, got {value}"),
        ))
    }
}

fn finite(element: &str, what: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DnfError::invalid(
            element,
            format!("{what} must be finite, got {value}"),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuralFieldParameters {
    /// Time constant of the leaky integrator.
    pub tau: f64,
    /// Initial value of the resting level and the activation.
    pub starting_resting_level: f64,
    pub activation: ActivationFunction,
}

impl Default for NeuralFieldParameters {
    fn default() -> Self {
        Self {
            tau: 25.0,
            starting_resting_level: -10.0,
            activation: ActivationFunction::default(),
        }
    }
}

impl NeuralFieldParameters {
    pub fn validate(&self, element: &str) -> Result<()> {
        positive(element, "tau", self.tau)?;
        finite(element, "resting level", self.starting_resting_level)?;
        match self.activation {
            ActivationFunction::Sigmoid { steepness, x_shift } => {
                finite(element, "sigmoid steepness", steepness)?;
                finite(element, "sigmoid shift", x_shift)
            }
            ActivationFunction::Heaviside { x_shift } => finite(element, "heaviside shift", x_shift),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaussStimulusParameters {
    pub width: f64,
    pub amplitude: f64,
    /// Centre of the stimulus in spatial units, within `[0, x_max]`.
    pub position: f64,
    pub circular: bool,
    pub normalized: bool,
}

impl Default for GaussStimulusParameters {
    fn default() -> Self {
        Self {
            width: 5.0,
            amplitude: 15.0,
            position: 0.0,
            circular: true,
            normalized: false,
        }
    }
}

impl GaussStimulusParameters {
    pub fn validate(&self, element: &str, dimensions: &ElementDimensions) -> Result<()> {
        positive(element, "stimulus width", self.width)?;
        finite(element, "stimulus amplitude", self.amplitude)?;
        if !(0.0..=dimensions.x_max).contains(&self.position) {
            return Err(DnfError::invalid(
                element,
                format!(
                    "stimulus position {} lies outside [0, {}]",
                    self.position, dimensions.x_max
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalNoiseParameters {
    pub amplitude: f64,
    /// Seed for the generator; drawn from entropy when absent.
    pub seed: Option<u64>,
}

impl Default for NormalNoiseParameters {
    fn default() -> Self {
        Self {
            amplitude: 0.01,
            seed: None,
        }
    }
}

impl NormalNoiseParameters {
    pub fn validate(&self, element: &str) -> Result<()> {
        finite(element, "noise amplitude", self.amplitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaussKernelParameters {
    pub width: f64,
    pub amplitude: f64,
    /// Gain of the all-to-all term added to every output sample.
    pub amplitude_global: f64,
    pub options: KernelOptions,
}

impl Default for GaussKernelParameters {
    fn default() -> Self {
        Self {
            width: 5.0,
            amplitude: 10.0,
            amplitude_global: 0.0,
            options: KernelOptions::default(),
        }
    }
}

impl GaussKernelParameters {
    pub fn validate(&self, element: &str) -> Result<()> {
        positive(element, "kernel width", self.width)?;
        finite(element, "kernel amplitude", self.amplitude)?;
        finite(element, "global amplitude", self.amplitude_global)?;
        self.options.validate(element)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MexicanHatKernelParameters {
    pub width_exc: f64,
    pub amplitude_exc: f64,
    pub width_inh: f64,
    pub amplitude_inh: f64,
    pub options: KernelOptions,
}

impl Default for MexicanHatKernelParameters {
    fn default() -> Self {
        Self {
            width_exc: 5.0,
            amplitude_exc: 15.0,
            width_inh: 10.0,
            amplitude_inh: 15.0,
            options: KernelOptions::default(),
        }
    }
}

impl MexicanHatKernelParameters {
    pub fn validate(&self, element: &str) -> Result<()> {
        validate_mexican_hat(
            element,
            self.width_exc,
            self.amplitude_exc,
            self.width_inh,
            self.amplitude_inh,
        )?;
        self.options.validate(element)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LateralInteractionsParameters {
    pub width_exc: f64,
    pub amplitude_exc: f64,
    pub width_inh: f64,
    pub amplitude_inh: f64,
    pub amplitude_global: f64,
    pub options: KernelOptions,
}

impl Default for LateralInteractionsParameters {
    fn default() -> Self {
        Self {
            width_exc: 5.0,
            amplitude_exc: 15.0,
            width_inh: 10.0,
            amplitude_inh: 15.0,
            amplitude_global: -0.01,
            options: KernelOptions::default(),
        }
    }
}

impl LateralInteractionsParameters {
    pub fn validate(&self, element: &str) -> Result<()> {
        validate_mexican_hat(
            element,
            self.width_exc,
            self.amplitude_exc,
            self.width_inh,
            self.amplitude_inh,
        )?;
        finite(element, "global amplitude", self.amplitude_global)?;
        self.options.validate(element)
    }
}

fn validate_mexican_hat(
    element: &str,
    width_exc: f64,
    amplitude_exc: f64,
    width_inh: f64,
    amplitude_inh: f64,
) -> Result<()> {
    positive(element, "excitatory width", width_exc)?;
    positive(element, "inhibitory width", width_inh)?;
    finite(element, "excitatory amplitude", amplitude_exc)?;
    finite(element, "inhibitory amplitude", amplitude_inh)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldCouplingParameters {
    /// Dimensions of the field projected from.
    pub input_dimensions: ElementDimensions,
    pub learning_rule: LearningRule,
    /// Output gain applied to the projection.
    pub gain: f64,
    pub learning_rate: f64,
    /// Weights only change while this is set and a learning target exists.
    pub learning_active: bool,
    /// Directory holding `<name>_weights.txt`. Weights are read from it on
    /// `init` when set.
    pub weights_directory: Option<PathBuf>,
}

impl Default for FieldCouplingParameters {
    fn default() -> Self {
        Self {
            input_dimensions: ElementDimensions::default(),
            learning_rule: LearningRule::default(),
            gain: 1.0,
            learning_rate: 0.01,
            learning_active: false,
            weights_directory: None,
        }
    }
}

impl FieldCouplingParameters {
    pub fn validate(&self, element: &str) -> Result<()> {
        self.input_dimensions.validate()?;
        finite(element, "coupling gain", self.gain)?;
        finite(element, "learning rate", self.learning_rate)
    }
}

/// One sparse projection from a source sample to a target sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussCoupling {
    pub source_index: usize,
    pub target_index: usize,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaussFieldCouplingParameters {
    pub input_dimensions: ElementDimensions,
    /// Width of the bump written around each target sample.
    pub width: f64,
    pub circular: bool,
    pub normalized: bool,
    pub couplings: Vec<GaussCoupling>,
}

impl Default for GaussFieldCouplingParameters {
    fn default() -> Self {
        Self {
            input_dimensions: ElementDimensions::default(),
            width: 5.0,
            circular: false,
            normalized: false,
            couplings: Vec::new(),
        }
    }
}

impl GaussFieldCouplingParameters {
    pub fn validate(&self, element: &str, dimensions: &ElementDimensions) -> Result<()> {
        self.input_dimensions.validate()?;
        positive(element, "coupling width", self.width)?;
        let input_size = self.input_dimensions.size();
        let output_size = dimensions.size();
        for coupling in &self.couplings {
            if coupling.source_index >= input_size {
                return Err(DnfError::invalid(
                    element,
                    format!(
                        "coupling source index {} exceeds input size {input_size}",
                        coupling.source_index
                    ),
                ));
            }
            if coupling.target_index >= output_size {
                return Err(DnfError::invalid(
                    element,
                    format!(
                        "coupling target index {} exceeds output size {output_size}",
                        coupling.target_index
                    ),
                ));
            }
            finite(element, "coupling weight", coupling.weight)?;
        }
        Ok(())
    }
}

/// Type-specific parameter bundle, tagged by element type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementParameters {
    NeuralField(NeuralFieldParameters),
    GaussStimulus(GaussStimulusParameters),
    NormalNoise(NormalNoiseParameters),
    GaussKernel(GaussKernelParameters),
    MexicanHatKernel(MexicanHatKernelParameters),
    LateralInteractions(LateralInteractionsParameters),
    FieldCoupling(FieldCouplingParameters),
    GaussFieldCoupling(GaussFieldCouplingParameters),
}

impl ElementParameters {
    pub fn label(&self) -> ElementLabel {
        match self {
            ElementParameters::NeuralField(_) => ElementLabel::NeuralField,
            ElementParameters::GaussStimulus(_) => ElementLabel::GaussStimulus,
            ElementParameters::NormalNoise(_) => ElementLabel::NormalNoise,
            ElementParameters::GaussKernel(_) => ElementLabel::GaussKernel,
            ElementParameters::MexicanHatKernel(_) => ElementLabel::MexicanHatKernel,
            ElementParameters::LateralInteractions(_) => ElementLabel::LateralInteractions,
            ElementParameters::FieldCoupling(_) => ElementLabel::FieldCoupling,
            ElementParameters::GaussFieldCoupling(_) => ElementLabel::GaussFieldCoupling,
        }
    }

    /// Default bundle for a label, `None` for `Uninitialized`.
    pub fn default_for(label: ElementLabel) -> Option<Self> {
        let parameters = match label {
            ElementLabel::Uninitialized => return None,
            ElementLabel::NeuralField => ElementParameters::NeuralField(Default::default()),
            ElementLabel::GaussStimulus => ElementParameters::GaussStimulus(Default::default()),
            ElementLabel::NormalNoise => ElementParameters::NormalNoise(Default::default()),
            ElementLabel::GaussKernel => ElementParameters::GaussKernel(Default::default()),
            ElementLabel::MexicanHatKernel => {
                ElementParameters::MexicanHatKernel(Default::default())
            }
            ElementLabel::LateralInteractions => {
                ElementParameters::LateralInteractions(Default::default())
            }
            ElementLabel::FieldCoupling => ElementParameters::FieldCoupling(Default::default()),
            ElementLabel::GaussFieldCoupling => {
                ElementParameters::GaussFieldCoupling(Default::default())
            }
        };
        Some(parameters)
    }

    /// Validate against the element's own name and dimensions.
    pub fn validate(&self, element: &str, dimensions: &ElementDimensions) -> Result<()> {
        match self {
            ElementParameters::NeuralField(p) => p.validate(element),
            ElementParameters::GaussStimulus(p) => p.validate(element, dimensions),
            ElementParameters::NormalNoise(p) => p.validate(element),
            ElementParameters::GaussKernel(p) => p.validate(element),
            ElementParameters::MexicanHatKernel(p) => p.validate(element),
            ElementParameters::LateralInteractions(p) => p.validate(element),
            ElementParameters::FieldCoupling(p) => p.validate(element),
            ElementParameters::GaussFieldCoupling(p) => p.validate(element, dimensions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_display_names() {
        assert_eq!(ElementLabel::NeuralField.to_string(), "neural field");
        assert_eq!(
            ElementLabel::MexicanHatKernel.display_name(),
            "mexican hat kernel"
        );
        assert!(!ElementLabel::ALL.contains(&ElementLabel::Uninitialized));
    }

    #[test]
    fn test_defaults_are_valid() {
        let dimensions = ElementDimensions::default();
        for label in ElementLabel::ALL {
            let parameters = ElementParameters::default_for(label).unwrap();
            assert_eq!(parameters.label(), label);
            assert!(parameters.validate("test", &dimensions).is_ok(), "{label}");
        }
        assert!(ElementParameters::default_for(ElementLabel::Uninitialized).is_none());
    }

    #[test]
    fn test_stimulus_position_out_of_range() {
        let dimensions = ElementDimensions::with_size(50);
        let parameters = GaussStimulusParameters {
            position: 60.0,
            ..Default::default()
        };
        assert!(matches!(
            parameters.validate("stimulus", &dimensions),
            Err(DnfError::InvalidParameter { .. })
        ));

        let parameters = GaussStimulusParameters {
            position: -1.0,
            ..Default::default()
        };
        assert!(parameters.validate("stimulus", &dimensions).is_err());
    }

    #[test]
    fn test_non_positive_width_rejected() {
        let parameters = GaussKernelParameters {
            width: 0.0,
            ..Default::default()
        };
        assert!(parameters.validate("kernel").is_err());

        let parameters = MexicanHatKernelParameters {
            width_inh: -2.0,
            ..Default::default()
        };
        assert!(parameters.validate("kernel").is_err());

        let parameters = NeuralFieldParameters {
            tau: 0.0,
            ..Default::default()
        };
        assert!(parameters.validate("field").is_err());
    }

    #[test]
    fn test_gauss_coupling_indices_checked() {
        let parameters = GaussFieldCouplingParameters {
            input_dimensions: ElementDimensions::with_size(10),
            couplings: vec![GaussCoupling {
                source_index: 3,
                target_index: 20,
                weight: 1.0,
            }],
            ..Default::default()
        };
        assert!(
            parameters
                .validate("coupling", &ElementDimensions::with_size(20))
                .is_err()
        );
        assert!(
            parameters
                .validate("coupling", &ElementDimensions::with_size(21))
                .is_ok()
        );
    }

    #[test]
    fn test_tagged_serialization() {
        let parameters = ElementParameters::NeuralField(NeuralFieldParameters::default());
        let json = serde_json::to_value(&parameters).unwrap();
        assert_eq!(json["type"], "neural_field");
        assert_eq!(json["activation"]["kind"], "sigmoid");

        let parsed: ElementParameters =
            serde_json::from_str(r#"{"type":"gauss_kernel","width":3.0}"#).unwrap();
        match parsed {
            ElementParameters::GaussKernel(p) => {
                assert_eq!(p.width, 3.0);
                assert_eq!(p.amplitude, 10.0);
                assert!(p.options.circular);
            }
            other => panic!("unexpected parameters {other:?}"),
        }
    }
}
