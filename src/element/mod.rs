//! Element module - Graph nodes with named components and input edges.
//!
//! Every element owns an `input` and an `output` array plus whatever state
//! its type needs. Before stepping, an element sums the components of all its
//! registered sources into `input`; sources are addressed by id and resolved
//! by the caller, so elements never hold references to each other.

mod factory;
mod field_coupling;
mod gauss_field_coupling;
mod kernel;
mod neural_field;
mod noise;
mod stimulus;

use std::fmt;

use log::{debug, info, trace};

pub use factory::*;
pub use field_coupling::*;
pub use gauss_field_coupling::*;
pub use kernel::*;
pub use neural_field::*;
pub use noise::*;
pub use stimulus::*;

use crate::error::{DnfError, Result};
use crate::schema::{
    ElementCommonParameters, ElementDimensions, ElementLabel, ElementParameters,
};

pub const INPUT: &str = "input";
pub const OUTPUT: &str = "output";
pub const ACTIVATION: &str = "activation";
pub const RESTING_LEVEL: &str = "resting level";
pub const KERNEL: &str = "kernel";
pub const WEIGHTS: &str = "weights";

/// Unique identifier of an element, never reused by its allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues strictly increasing element ids.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator whose first id is `first`.
    pub fn starting_at(first: u64) -> Self {
        Self { next: first }
    }

    pub fn next_id(&mut self) -> ElementId {
        let id = ElementId(self.next);
        self.next += 1;
        id
    }
}

/// A registered dependency: `component` of the element `source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEdge {
    pub source: ElementId,
    pub source_name: String,
    pub component: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Initialized,
    Closed,
}

/// Buffers handed to an element's dynamics for one call.
pub(crate) struct Io<'a> {
    pub input: &'a [f64],
    pub output: &'a mut [f64],
    /// Post-synaptic values for plastic couplings.
    pub learning_target: Option<&'a [f64]>,
}

/// Capabilities every element type provides.
pub(crate) trait Dynamics {
    fn init(&mut self, io: Io<'_>);

    fn step(&mut self, io: Io<'_>, t: f64, delta_t: f64);

    fn close(&mut self) {}

    /// Type-specific components beyond `input` and `output`.
    fn component(&self, _name: &str) -> Option<&[f64]> {
        None
    }

    fn component_mut(&mut self, _name: &str) -> Option<&mut [f64]> {
        None
    }

    fn component_names(&self) -> &'static [&'static str] {
        &[]
    }

    fn parameters(&self) -> ElementParameters;
}

/// Closed set of element behaviours.
#[derive(Debug)]
pub enum ElementKind {
    NeuralField(NeuralField),
    GaussStimulus(GaussStimulus),
    NormalNoise(NormalNoise),
    GaussKernel(GaussKernel),
    MexicanHatKernel(MexicanHatKernel),
    LateralInteractions(LateralInteractions),
    FieldCoupling(FieldCoupling),
    GaussFieldCoupling(GaussFieldCoupling),
}

impl ElementKind {
    /// Build the behaviour for already validated parameters.
    fn from_parameters(
        name: &str,
        dimensions: &ElementDimensions,
        parameters: ElementParameters,
    ) -> Self {
        let size = dimensions.size();
        match parameters {
            ElementParameters::NeuralField(p) => Self::NeuralField(NeuralField::new(p, size)),
            ElementParameters::GaussStimulus(p) => {
                Self::GaussStimulus(GaussStimulus::new(p, dimensions))
            }
            ElementParameters::NormalNoise(p) => Self::NormalNoise(NormalNoise::new(p)),
            ElementParameters::GaussKernel(p) => Self::GaussKernel(GaussKernel::new(p, size)),
            ElementParameters::MexicanHatKernel(p) => {
                Self::MexicanHatKernel(MexicanHatKernel::new(p, size))
            }
            ElementParameters::LateralInteractions(p) => {
                Self::LateralInteractions(LateralInteractions::new(p, size))
            }
            ElementParameters::FieldCoupling(p) => {
                Self::FieldCoupling(FieldCoupling::new(name, p, size))
            }
            ElementParameters::GaussFieldCoupling(p) => {
                Self::GaussFieldCoupling(GaussFieldCoupling::new(p, size))
            }
        }
    }

    pub fn label(&self) -> ElementLabel {
        match self {
            Self::NeuralField(_) => ElementLabel::NeuralField,
            Self::GaussStimulus(_) => ElementLabel::GaussStimulus,
            Self::NormalNoise(_) => ElementLabel::NormalNoise,
            Self::GaussKernel(_) => ElementLabel::GaussKernel,
            Self::MexicanHatKernel(_) => ElementLabel::MexicanHatKernel,
            Self::LateralInteractions(_) => ElementLabel::LateralInteractions,
            Self::FieldCoupling(_) => ElementLabel::FieldCoupling,
            Self::GaussFieldCoupling(_) => ElementLabel::GaussFieldCoupling,
        }
    }

    fn dynamics(&self) -> &dyn Dynamics {
        match self {
            Self::NeuralField(e) => e,
            Self::GaussStimulus(e) => e,
            Self::NormalNoise(e) => e,
            Self::GaussKernel(e) => e,
            Self::MexicanHatKernel(e) => e,
            Self::LateralInteractions(e) => e,
            Self::FieldCoupling(e) => e,
            Self::GaussFieldCoupling(e) => e,
        }
    }

    fn dynamics_mut(&mut self) -> &mut dyn Dynamics {
        match self {
            Self::NeuralField(e) => e,
            Self::GaussStimulus(e) => e,
            Self::NormalNoise(e) => e,
            Self::GaussKernel(e) => e,
            Self::MexicanHatKernel(e) => e,
            Self::LateralInteractions(e) => e,
            Self::FieldCoupling(e) => e,
            Self::GaussFieldCoupling(e) => e,
        }
    }
}

/// Identity and size of an element offered as an input source.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SourceInfo<'a> {
    pub id: ElementId,
    pub name: &'a str,
    pub component_len: usize,
}

/// A node of the element graph.
#[derive(Debug)]
pub struct Element {
    id: ElementId,
    name: String,
    dimensions: ElementDimensions,
    input: Vec<f64>,
    output: Vec<f64>,
    inputs: Vec<InputEdge>,
    learning_target: Option<InputEdge>,
    lifecycle: Lifecycle,
    kind: ElementKind,
}

impl Element {
    /// Validate parameters and construct an uninitialized element.
    pub fn new(
        id: ElementId,
        common: &ElementCommonParameters,
        parameters: impl Into<ElementParameters>,
    ) -> Result<Self> {
        let parameters = parameters.into();
        common.validate()?;
        parameters.validate(&common.name, &common.dimensions)?;

        let size = common.dimensions.size();
        let input_size = input_size_of(&parameters, size);
        let kind = ElementKind::from_parameters(&common.name, &common.dimensions, parameters);

        debug!("Created {} '{}' ({} samples)", kind.label(), common.name, size);

        Ok(Self {
            id,
            name: common.name.clone(),
            dimensions: common.dimensions,
            input: vec![0.0; input_size],
            output: vec![0.0; size],
            inputs: Vec::new(),
            learning_target: None,
            lifecycle: Lifecycle::Uninitialized,
            kind,
        })
    }

    #[inline]
    pub fn unique_identifier(&self) -> ElementId {
        self.id
    }

    #[inline]
    pub fn unique_name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> ElementLabel {
        self.kind.label()
    }

    /// Number of output samples.
    #[inline]
    pub fn size(&self) -> usize {
        self.output.len()
    }

    /// Length of the `input` component.
    #[inline]
    pub fn input_size(&self) -> usize {
        self.input.len()
    }

    pub fn dimensions(&self) -> &ElementDimensions {
        &self.dimensions
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Registered input edges, in registration order.
    pub fn inputs(&self) -> &[InputEdge] {
        &self.inputs
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut ElementKind {
        &mut self.kind
    }

    pub fn parameters(&self) -> ElementParameters {
        self.kind.dynamics().parameters()
    }

    /// Replace the type-specific parameters and re-run `init`.
    ///
    /// The label and the input size must stay the same.
    pub fn set_parameters(&mut self, parameters: impl Into<ElementParameters>) -> Result<()> {
        let parameters = parameters.into();
        if parameters.label() != self.label() {
            return Err(DnfError::invalid(
                &self.name,
                format!(
                    "cannot replace {} parameters with {} parameters",
                    self.label(),
                    parameters.label()
                ),
            ));
        }
        parameters.validate(&self.name, &self.dimensions)?;
        let input_size = input_size_of(&parameters, self.size());
        if input_size != self.input.len() {
            return Err(DnfError::invalid(
                &self.name,
                format!(
                    "input size cannot change from {} to {input_size}",
                    self.input.len()
                ),
            ));
        }

        let mut kind = ElementKind::from_parameters(&self.name, &self.dimensions, parameters);
        if let (ElementKind::FieldCoupling(old), ElementKind::FieldCoupling(new)) =
            (&self.kind, &mut kind)
        {
            new.set_weights(old.weights().clone());
        }
        self.kind = kind;
        info!("Updated parameters of '{}'", self.name);
        self.init();
        Ok(())
    }

    /// Borrow a component by name.
    pub fn component(&self, name: &str) -> Result<&[f64]> {
        match name {
            INPUT => Ok(&self.input),
            OUTPUT => Ok(&self.output),
            _ => self
                .kind
                .dynamics()
                .component(name)
                .ok_or_else(|| self.component_not_found(name)),
        }
    }

    /// Copy of a component.
    pub fn get_component(&self, name: &str) -> Result<Vec<f64>> {
        self.component(name).map(<[f64]>::to_vec)
    }

    /// Mutable view of a component. Derived components such as `kernel`
    /// are read-only and reported as not found.
    pub fn component_mut(&mut self, name: &str) -> Result<&mut [f64]> {
        match name {
            INPUT => Ok(&mut self.input),
            OUTPUT => Ok(&mut self.output),
            _ => {
                let missing = self.component_not_found(name);
                self.kind.dynamics_mut().component_mut(name).ok_or(missing)
            }
        }
    }

    /// Every component name this element answers to.
    pub fn component_names(&self) -> Vec<&'static str> {
        let mut names = vec![INPUT, OUTPUT];
        names.extend_from_slice(self.kind.dynamics().component_names());
        names
    }

    fn component_not_found(&self, component: &str) -> DnfError {
        DnfError::ComponentNotFound {
            element: self.name.clone(),
            component: component.to_string(),
        }
    }

    /// Register `component` of `source` as an input.
    pub fn add_input(&mut self, source: Option<&Element>, component: &str) -> Result<()> {
        let source = source.ok_or_else(|| DnfError::NullInput {
            element: self.name.clone(),
        })?;
        let component_len = source.component(component)?.len();
        self.register_input(
            SourceInfo {
                id: source.id,
                name: &source.name,
                component_len,
            },
            component,
        )
    }

    /// Register an edge from a source described by id, name and component length.
    pub(crate) fn register_input(&mut self, source: SourceInfo<'_>, component: &str) -> Result<()> {
        if self.has_input_by_id(source.id) {
            return Err(DnfError::InputAlreadyExists {
                element: self.name.clone(),
                input: source.name.to_string(),
            });
        }
        if source.component_len != self.input.len() && source.component_len != self.size() {
            return Err(DnfError::SizeMismatch {
                element: self.name.clone(),
                input: source.name.to_string(),
                expected: self.input.len(),
                found: source.component_len,
            });
        }

        self.inputs.push(InputEdge {
            source: source.id,
            source_name: source.name.to_string(),
            component: component.to_string(),
        });
        info!(
            "Added '{}' ({}) as input to '{}'",
            source.name, component, self.name
        );
        Ok(())
    }

    /// Remove the edge from the source named `name`, if any.
    pub fn remove_input(&mut self, name: &str) {
        let before = self.inputs.len();
        self.inputs.retain(|edge| edge.source_name != name);
        if self.inputs.len() != before {
            info!("Removed '{}' as input from '{}'", name, self.name);
        }
    }

    /// Remove the edge from the source with id `id`, if any.
    pub fn remove_input_by_id(&mut self, id: ElementId) {
        let before = self.inputs.len();
        self.inputs.retain(|edge| edge.source != id);
        if self.inputs.len() != before {
            info!("Removed element {} as input from '{}'", id, self.name);
        }
    }

    pub fn has_input(&self, name: &str, component: &str) -> bool {
        self.inputs
            .iter()
            .any(|edge| edge.source_name == name && edge.component == component)
    }

    pub fn has_input_from(&self, id: ElementId, component: &str) -> bool {
        self.inputs
            .iter()
            .any(|edge| edge.source == id && edge.component == component)
    }

    /// Whether any edge comes from the element with id `id`.
    pub fn has_input_by_id(&self, id: ElementId) -> bool {
        self.inputs.iter().any(|edge| edge.source == id)
    }

    pub fn learning_target(&self) -> Option<&InputEdge> {
        self.learning_target.as_ref()
    }

    /// Set the post-synaptic source of a plastic coupling.
    pub(crate) fn register_learning_target(
        &mut self,
        target: SourceInfo<'_>,
        component: &str,
    ) -> Result<()> {
        if !matches!(self.kind, ElementKind::FieldCoupling(_)) {
            return Err(DnfError::invalid(
                &self.name,
                format!("{} elements cannot learn", self.label()),
            ));
        }
        if target.id == self.id {
            return Err(DnfError::invalid(
                &self.name,
                "a coupling cannot be its own learning target",
            ));
        }
        if target.component_len != self.size() {
            return Err(DnfError::SizeMismatch {
                element: self.name.clone(),
                input: target.name.to_string(),
                expected: self.size(),
                found: target.component_len,
            });
        }
        self.learning_target = Some(InputEdge {
            source: target.id,
            source_name: target.name.to_string(),
            component: component.to_string(),
        });
        info!(
            "'{}' now learns towards '{}' ({})",
            self.name, target.name, component
        );
        Ok(())
    }

    pub fn set_learning_target(&mut self, target: &Element, component: &str) -> Result<()> {
        let component_len = target.component(component)?.len();
        self.register_learning_target(
            SourceInfo {
                id: target.id,
                name: &target.name,
                component_len,
            },
            component,
        )
    }

    pub fn clear_learning_target(&mut self) {
        self.learning_target = None;
    }

    /// Component of this element read through one of its own edges.
    fn own_component(&self, name: &str) -> Option<&[f64]> {
        match name {
            OUTPUT => Some(&self.output),
            INPUT => None,
            _ => self.kind.dynamics().component(name),
        }
    }

    /// Zero `input`, then add every source component into it in edge order.
    ///
    /// `resolve` maps a source id and component name to the source's current
    /// values. Edges to this element itself are read directly. Edges whose
    /// source cannot be resolved contribute nothing.
    pub fn update_input<'a, F>(&mut self, resolve: F)
    where
        F: Fn(ElementId, &str) -> Option<&'a [f64]>,
    {
        let mut input = std::mem::take(&mut self.input);
        input.fill(0.0);

        for edge in &self.inputs {
            let values = if edge.source == self.id {
                self.own_component(&edge.component)
            } else {
                resolve(edge.source, &edge.component)
            };

            match values {
                Some(values) => {
                    for (acc, v) in input.iter_mut().zip(values) {
                        *acc += v;
                    }
                }
                None => trace!(
                    "'{}' skipped unresolved input '{}' ({})",
                    self.name, edge.source_name, edge.component
                ),
            }
        }

        self.input = input;
    }

    pub fn init(&mut self) {
        self.input.fill(0.0);
        self.output.fill(0.0);
        self.kind.dynamics_mut().init(Io {
            input: &self.input,
            output: &mut self.output,
            learning_target: None,
        });
        self.lifecycle = Lifecycle::Initialized;
    }

    /// Pull inputs through `resolve`, then advance the element's own state.
    pub fn step<'a, F>(&mut self, t: f64, delta_t: f64, resolve: F)
    where
        F: Fn(ElementId, &str) -> Option<&'a [f64]>,
    {
        self.update_input(&resolve);

        let learning_target = self
            .learning_target
            .as_ref()
            .and_then(|edge| resolve(edge.source, &edge.component));

        self.kind.dynamics_mut().step(
            Io {
                input: &self.input,
                output: &mut self.output,
                learning_target,
            },
            t,
            delta_t,
        );
    }

    pub fn close(&mut self) {
        self.kind.dynamics_mut().close();
        self.lifecycle = Lifecycle::Closed;
    }

    pub fn as_neural_field(&self) -> Option<&NeuralField> {
        match &self.kind {
            ElementKind::NeuralField(field) => Some(field),
            _ => None,
        }
    }

    pub fn as_field_coupling(&self) -> Option<&FieldCoupling> {
        match &self.kind {
            ElementKind::FieldCoupling(coupling) => Some(coupling),
            _ => None,
        }
    }

    pub fn as_field_coupling_mut(&mut self) -> Option<&mut FieldCoupling> {
        match &mut self.kind {
            ElementKind::FieldCoupling(coupling) => Some(coupling),
            _ => None,
        }
    }
}

fn input_size_of(parameters: &ElementParameters, size: usize) -> usize {
    match parameters {
        ElementParameters::FieldCoupling(p) => p.input_dimensions.size(),
        ElementParameters::GaussFieldCoupling(p) => p.input_dimensions.size(),
        _ => size,
    }
}

macro_rules! impl_into_parameters {
    ($($params:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<crate::schema::$params> for ElementParameters {
                fn from(p: crate::schema::$params) -> Self {
                    ElementParameters::$variant(p)
                }
            }
        )*
    };
}

impl_into_parameters! {
    NeuralFieldParameters => NeuralField,
    GaussStimulusParameters => GaussStimulus,
    NormalNoiseParameters => NormalNoise,
    GaussKernelParameters => GaussKernel,
    MexicanHatKernelParameters => MexicanHatKernel,
    LateralInteractionsParameters => LateralInteractions,
    FieldCouplingParameters => FieldCoupling,
    GaussFieldCouplingParameters => GaussFieldCoupling,
}
