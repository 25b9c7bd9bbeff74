//! Conversion between a running simulation and its JSON description.

use std::fs;
use std::path::Path;

use log::{info, warn};

use super::Simulation;
use crate::element::{ElementFactory, InputEdge, OUTPUT};
use crate::error::Result;
use crate::schema::{
    ArchitectureDescription, ElementCommonParameters, ElementDescription, ElementDimensions,
    ElementParameters, GaussStimulusParameters, InputDescription, LateralInteractionsParameters,
    NeuralFieldParameters, NormalNoiseParameters, SimulationConfig,
};

impl Simulation {
    /// Describe the current graph. Edges whose source no longer exists are
    /// left out.
    pub fn to_architecture(&self) -> ArchitectureDescription {
        let name_of = |edge: &InputEdge| {
            self.slots
                .get(&edge.source)
                .map(|&slot| self.elements[slot].unique_name().to_string())
        };

        let elements = self
            .elements
            .iter()
            .map(|element| ElementDescription {
                name: element.unique_name().to_string(),
                dimensions: *element.dimensions(),
                parameters: element.parameters(),
                inputs: element
                    .inputs()
                    .iter()
                    .filter_map(|edge| {
                        name_of(edge).map(|source| InputDescription {
                            source,
                            component: edge.component.clone(),
                        })
                    })
                    .collect(),
                learning_target: element.learning_target().and_then(|edge| {
                    name_of(edge).map(|source| InputDescription {
                        source,
                        component: edge.component.clone(),
                    })
                }),
            })
            .collect();

        ArchitectureDescription {
            simulation: self.config.clone(),
            elements,
        }
    }

    /// Build a simulation from a description, creating elements through
    /// `factory` and then wiring every edge.
    pub fn from_architecture(
        description: &ArchitectureDescription,
        factory: &mut ElementFactory,
    ) -> Result<Self> {
        let mut simulation = Simulation::new(description.simulation.clone())?;

        let mut added = Vec::with_capacity(description.elements.len());
        for entry in &description.elements {
            let common = ElementCommonParameters::new(entry.name.clone(), entry.dimensions);
            let label = entry.parameters.label();
            let created = match factory.create_element(label, &common, &entry.parameters)? {
                Some(element) => simulation.add_element(element),
                None => {
                    warn!("Skipping '{}': {} is not supported", entry.name, label);
                    false
                }
            };
            added.push(created);
        }

        for (entry, &added) in description.elements.iter().zip(&added) {
            // Skipped, or shadowed by an earlier entry of the same name
            if !added {
                continue;
            }
            for input in &entry.inputs {
                simulation.create_interaction(&input.source, &input.component, &entry.name)?;
            }
            if let Some(target) = &entry.learning_target {
                simulation.set_learning_target(&entry.name, &target.source, &target.component)?;
            }
        }

        info!(
            "Built '{}' with {} elements",
            simulation.identifier(),
            simulation.number_of_elements()
        );
        Ok(simulation)
    }

    /// Write the description as pretty-printed JSON.
    pub fn save_architecture<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.to_architecture())?;
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&path, json)?;
        info!("Saved architecture to {}", path.as_ref().display());
        Ok(())
    }

    pub fn load_architecture<P: AsRef<Path>>(
        path: P,
        factory: &mut ElementFactory,
    ) -> Result<Self> {
        let json = fs::read_to_string(&path)?;
        let description: ArchitectureDescription = serde_json::from_str(&json)?;
        info!("Loaded architecture from {}", path.as_ref().display());
        Self::from_architecture(&description, factory)
    }
}

/// A single selective field: a localized stimulus, noise, and lateral
/// interactions feeding back into the field.
pub fn example_architecture() -> ArchitectureDescription {
    let dimensions = ElementDimensions::default();
    let edge = |source: &str| InputDescription {
        source: source.to_string(),
        component: OUTPUT.to_string(),
    };
    let element = |name: &str, parameters: ElementParameters, inputs: Vec<InputDescription>| {
        ElementDescription {
            name: name.to_string(),
            dimensions,
            parameters,
            inputs,
            learning_target: None,
        }
    };

    ArchitectureDescription {
        simulation: SimulationConfig::new("example", 1.0, 0.0, 0.0),
        elements: vec![
            element(
                "stimulus",
                GaussStimulusParameters {
                    position: 30.0,
                    ..Default::default()
                }
                .into(),
                vec![],
            ),
            element(
                "noise",
                NormalNoiseParameters {
                    amplitude: 0.2,
                    seed: Some(1),
                }
                .into(),
                vec![],
            ),
            element(
                "field",
                NeuralFieldParameters::default().into(),
                vec![edge("stimulus"), edge("noise"), edge("lateral interactions")],
            ),
            element(
                "lateral interactions",
                LateralInteractionsParameters::default().into(),
                vec![edge("field")],
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ACTIVATION, WEIGHTS};
    use crate::error::DnfError;
    use crate::schema::{ElementLabel, FieldCouplingParameters};
    use tempfile::tempdir;

    #[test]
    fn test_example_builds_and_converges() {
        let mut factory = ElementFactory::new();
        let mut sim = Simulation::from_architecture(&example_architecture(), &mut factory).unwrap();
        assert_eq!(sim.number_of_elements(), 4);
        assert_eq!(sim.elements_with_input("field", OUTPUT).len(), 1);

        sim.init();
        for _ in 0..300 {
            sim.step();
        }
        let field = sim.get_element("field").unwrap().as_neural_field().unwrap();
        assert!((field.centroid() - 30.0).abs() < 2.0, "{}", field.centroid());
    }

    #[test]
    fn test_description_roundtrip() {
        let mut factory = ElementFactory::new();
        let description = example_architecture();
        let sim = Simulation::from_architecture(&description, &mut factory).unwrap();
        assert_eq!(sim.to_architecture(), description);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("architecture.json");
        let mut factory = ElementFactory::new();
        let mut sim = Simulation::from_architecture(&example_architecture(), &mut factory).unwrap();

        let coupling = ElementDescription {
            name: "coupling".to_string(),
            dimensions: ElementDimensions::default(),
            parameters: FieldCouplingParameters {
                input_dimensions: ElementDimensions::default(),
                ..Default::default()
            }
            .into(),
            inputs: vec![],
            learning_target: None,
        };
        let element = factory
            .create_element(
                ElementLabel::FieldCoupling,
                &ElementCommonParameters::new(coupling.name.clone(), coupling.dimensions),
                &coupling.parameters,
            )
            .unwrap()
            .unwrap();
        sim.add_element(element);
        sim.create_interaction("field", OUTPUT, "coupling").unwrap();
        sim.set_learning_target("coupling", "stimulus", OUTPUT)
            .unwrap();
        sim.save_architecture(&path).unwrap();

        let loaded = Simulation::load_architecture(&path, &mut factory).unwrap();
        assert_eq!(loaded.to_architecture(), sim.to_architecture());
        let target = loaded
            .get_element("coupling")
            .unwrap()
            .learning_target()
            .unwrap();
        assert_eq!(target.source_name, "stimulus");
        assert!(loaded.component("coupling", WEIGHTS).is_ok());
    }

    #[test]
    fn test_stale_edges_are_not_described() {
        let mut factory = ElementFactory::new();
        let mut sim = Simulation::from_architecture(&example_architecture(), &mut factory).unwrap();
        let replacement = factory
            .create_element(
                ElementLabel::GaussStimulus,
                &ElementCommonParameters::new("stimulus", ElementDimensions::default()),
                &ElementParameters::GaussStimulus(GaussStimulusParameters::default()),
            )
            .unwrap()
            .unwrap();
        sim.reset_element("stimulus", replacement).unwrap();

        let description = sim.to_architecture();
        let field = description
            .elements
            .iter()
            .find(|e| e.name == "field")
            .unwrap();
        assert!(field.inputs.iter().all(|edge| edge.source != "stimulus"));
        assert_eq!(field.inputs.len(), 2);
    }

    #[test]
    fn test_unknown_source_fails() {
        let mut description = example_architecture();
        description.elements[2].inputs.push(InputDescription {
            source: "missing".to_string(),
            component: ACTIVATION.to_string(),
        });
        let mut factory = ElementFactory::new();
        assert!(matches!(
            Simulation::from_architecture(&description, &mut factory),
            Err(DnfError::ElementNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_entry_is_not_wired() {
        let mut description = example_architecture();
        let mut duplicate = description.elements[0].clone();
        duplicate.inputs = vec![InputDescription {
            source: "field".to_string(),
            component: OUTPUT.to_string(),
        }];
        description.elements.push(duplicate);

        let mut factory = ElementFactory::new();
        let sim = Simulation::from_architecture(&description, &mut factory).unwrap();
        assert_eq!(sim.number_of_elements(), 4);
        assert!(sim.get_element("stimulus").unwrap().inputs().is_empty());
        assert_eq!(sim.elements_with_input("field", OUTPUT).len(), 1);
    }

    #[test]
    fn test_unsupported_elements_are_skipped() {
        let mut factory = ElementFactory::empty();
        let sim = Simulation::from_architecture(&example_architecture(), &mut factory).unwrap();
        assert_eq!(sim.number_of_elements(), 0);
    }
}
