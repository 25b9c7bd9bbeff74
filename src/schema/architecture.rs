//! Serializable description of a whole element graph.

use serde::{Deserialize, Serialize};

use super::{ElementDimensions, ElementParameters, SimulationConfig};

fn default_component() -> String {
    "output".to_string()
}

/// One input edge, by source name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDescription {
    pub source: String,
    #[serde(default = "default_component")]
    pub component: String,
}

/// One element with its parameters and incoming edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDescription {
    pub name: String,
    #[serde(default)]
    pub dimensions: ElementDimensions,
    pub parameters: ElementParameters,
    #[serde(default)]
    pub inputs: Vec<InputDescription>,
    /// Post-synaptic source of a plastic coupling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_target: Option<InputDescription>,
}

/// A complete simulation: time parameters plus every element, in insertion
/// order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureDescription {
    #[serde(default)]
    pub simulation: SimulationConfig,
    pub elements: Vec<ElementDescription>,
}
