//! DNF Composer - Dynamic neural field simulation.
//!
//! Builds graphs of interacting elements (neural fields, stimuli, noise,
//! interaction kernels and field couplings) and integrates them in discrete
//! time with forward Euler steps.
//!
//! # Architecture
//!
//! - `schema`: Serializable parameters, simulation settings and architecture
//!   descriptions
//! - `compute`: Numerical building blocks (kernels, convolution, activation
//!   functions, learning rules)
//! - `element`: Graph nodes, their dynamics and the element factory
//! - `simulation`: The element store and the stepping loop
//!
//! # Example
//!
//! ```rust,no_run
//! use dnf_composer::{
//!     element::{ElementFactory, OUTPUT},
//!     schema::{
//!         ElementCommonParameters, ElementDimensions, ElementLabel, GaussStimulusParameters,
//!         NeuralFieldParameters, SimulationConfig,
//!     },
//!     Simulation,
//! };
//!
//! let mut factory = ElementFactory::new();
//! let mut simulation = Simulation::new(SimulationConfig::default())?;
//!
//! let dimensions = ElementDimensions::default();
//! let field = factory.create_element(
//!     ElementLabel::NeuralField,
//!     &ElementCommonParameters::new("field", dimensions),
//!     &NeuralFieldParameters::default().into(),
//! )?;
//! let stimulus = factory.create_element(
//!     ElementLabel::GaussStimulus,
//!     &ElementCommonParameters::new("stimulus", dimensions),
//!     &GaussStimulusParameters { position: 50.0, ..Default::default() }.into(),
//! )?;
//! simulation.add_element(field.expect("neural fields are supported"));
//! simulation.add_element(stimulus.expect("stimuli are supported"));
//! simulation.create_interaction("stimulus", OUTPUT, "field")?;
//!
//! simulation.init();
//! for _ in 0..200 {
//!     simulation.step();
//! }
//!
//! let field = simulation.get_element("field")?.as_neural_field().expect("a field");
//! println!("Peak at {}", field.centroid());
//! # Ok::<(), dnf_composer::DnfError>(())
//! ```

pub mod compute;
pub mod element;
pub mod error;
pub mod schema;
pub mod simulation;

// Re-export commonly used types
pub use element::{Element, ElementFactory, ElementId};
pub use error::{DnfError, Result};
pub use schema::{ArchitectureDescription, SimulationConfig};
pub use simulation::Simulation;
