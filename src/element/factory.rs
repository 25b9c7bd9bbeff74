//! Registry of element constructors keyed by type label.

use std::collections::HashMap;

use log::warn;

use super::{Element, ElementId, IdAllocator};
use crate::error::Result;
use crate::schema::{
    ElementCommonParameters, ElementDimensions, ElementLabel, ElementParameters,
};

/// Builds an element, or returns `None` when the parameters do not belong
/// to the constructor's label.
pub type Constructor =
    Box<dyn Fn(ElementId, &ElementCommonParameters, &ElementParameters) -> Option<Result<Element>>>;

/// Creates elements from a label and a parameter bundle, issuing ids from
/// its own allocator.
pub struct ElementFactory {
    ids: IdAllocator,
    constructors: HashMap<ElementLabel, Constructor>,
}

impl Default for ElementFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementFactory {
    /// Factory with every built-in element type registered.
    pub fn new() -> Self {
        Self::with_ids(IdAllocator::new())
    }

    pub fn with_ids(ids: IdAllocator) -> Self {
        let mut factory = Self {
            ids,
            constructors: HashMap::new(),
        };
        for label in ElementLabel::ALL {
            factory.register(
                label,
                Box::new(
                    move |id: ElementId,
                          common: &ElementCommonParameters,
                          parameters: &ElementParameters| {
                        (parameters.label() == label)
                            .then(|| Element::new(id, common, parameters.clone()))
                    },
                ),
            );
        }
        factory
    }

    /// Factory without any registered constructor.
    pub fn empty() -> Self {
        Self {
            ids: IdAllocator::new(),
            constructors: HashMap::new(),
        }
    }

    /// Register or replace the constructor for `label`.
    pub fn register(&mut self, label: ElementLabel, constructor: Constructor) {
        self.constructors.insert(label, constructor);
    }

    pub fn supports(&self, label: ElementLabel) -> bool {
        self.constructors.contains_key(&label)
    }

    /// Next id this factory will hand out.
    pub fn next_id(&mut self) -> ElementId {
        self.ids.next_id()
    }

    /// Create an element of type `label`.
    ///
    /// Returns `Ok(None)` when the label is not supported or the parameters
    /// belong to another type; invalid parameter values are errors.
    pub fn create_element(
        &mut self,
        label: ElementLabel,
        common: &ElementCommonParameters,
        parameters: &ElementParameters,
    ) -> Result<Option<Element>> {
        let Some(constructor) = self.constructors.get(&label) else {
            warn!("No constructor registered for {label} elements");
            return Ok(None);
        };

        match constructor(self.ids.next_id(), common, parameters) {
            Some(element) => element.map(Some),
            None => {
                warn!(
                    "Cannot build a {label} element from {} parameters",
                    parameters.label()
                );
                Ok(None)
            }
        }
    }

    /// Create an element with default dimensions and parameters, named
    /// after its label and id.
    pub fn create_default(&mut self, label: ElementLabel) -> Result<Option<Element>> {
        let Some(parameters) = ElementParameters::default_for(label) else {
            warn!("No default parameters for {label} elements");
            return Ok(None);
        };
        let Some(constructor) = self.constructors.get(&label) else {
            warn!("No constructor registered for {label} elements");
            return Ok(None);
        };

        let id = self.ids.next_id();
        let common =
            ElementCommonParameters::new(format!("{label} {id}"), ElementDimensions::default());
        constructor(id, &common, &parameters).transpose()
    }
}
