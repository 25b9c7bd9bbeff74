//! Simulation - Owns the element graph and drives the discrete-time loop.
//!
//! Elements live in one insertion-ordered store; edges refer to sources by
//! [`ElementId`], so cyclic graphs (a field feeding a kernel that feeds the
//! field back) need no shared ownership.

mod architecture;

pub use architecture::example_architecture;

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use log::{debug, info, warn};

use crate::element::{Element, ElementId, SourceInfo};
use crate::error::{DnfError, Result};
use crate::schema::{SimulationConfig, UpdateSchedule};

/// Snapshot of source components taken at the start of a synchronous tick.
type Snapshot = HashMap<ElementId, HashMap<String, Vec<f64>>>;

#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    elements: Vec<Element>,
    slots: HashMap<ElementId, usize>,
    initialized: bool,
    paused: bool,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::from_valid_config(SimulationConfig::default())
    }
}

impl Simulation {
    /// Create an empty simulation. Fails when `delta_t <= 0` or `t_zero > t`.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: SimulationConfig) -> Self {
        Self {
            config,
            elements: Vec::new(),
            slots: HashMap::new(),
            initialized: false,
            paused: false,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn identifier(&self) -> &str {
        &self.config.identifier
    }

    #[inline]
    pub fn t(&self) -> f64 {
        self.config.t
    }

    #[inline]
    pub fn t_zero(&self) -> f64 {
        self.config.t_zero
    }

    #[inline]
    pub fn delta_t(&self) -> f64 {
        self.config.delta_t
    }

    pub fn set_delta_t(&mut self, delta_t: f64) -> Result<()> {
        let config = SimulationConfig {
            delta_t,
            ..self.config.clone()
        };
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn schedule(&self) -> UpdateSchedule {
        self.config.schedule
    }

    pub fn set_schedule(&mut self, schedule: UpdateSchedule) {
        self.config.schedule = schedule;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Reset time to `t_zero` and initialize every element in insertion order.
    pub fn init(&mut self) {
        self.config.t = self.config.t_zero;
        for element in &mut self.elements {
            element.init();
        }
        self.initialized = true;
        info!(
            "Initialized simulation '{}' with {} elements",
            self.config.identifier,
            self.elements.len()
        );
    }

    /// Advance time by `delta_t` and step every element. Does nothing while
    /// paused.
    pub fn step(&mut self) {
        if self.paused {
            return;
        }
        self.advance();
    }

    fn advance(&mut self) {
        self.config.t += self.config.delta_t;
        let (t, delta_t) = (self.config.t, self.config.delta_t);

        match self.config.schedule {
            UpdateSchedule::InsertionOrder => {
                let slots = &self.slots;
                for i in 0..self.elements.len() {
                    let (before, rest) = self.elements.split_at_mut(i);
                    if let Some((current, after)) = rest.split_first_mut() {
                        let before: &[Element] = before;
                        let after: &[Element] = after;
                        current.step(t, delta_t, |id: ElementId, component: &str| {
                            lookup(slots, before, after, i, id, component)
                        });
                    }
                }
            }
            UpdateSchedule::Synchronous => {
                let snapshot = self.snapshot();
                for element in &mut self.elements {
                    element.step(t, delta_t, |id: ElementId, component: &str| {
                        snapshot
                            .get(&id)
                            .and_then(|components| components.get(component))
                            .map(Vec::as_slice)
                    });
                }
            }
        }
    }

    /// Copy every component some edge reads, before anything steps.
    fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::new();
        for element in &self.elements {
            let edges = element.inputs().iter().chain(element.learning_target());
            for edge in edges {
                let Some(&slot) = self.slots.get(&edge.source) else {
                    continue;
                };
                if let Ok(values) = self.elements[slot].component(&edge.component) {
                    snapshot
                        .entry(edge.source)
                        .or_default()
                        .entry(edge.component.clone())
                        .or_insert_with(|| values.to_vec());
                }
            }
        }
        snapshot
    }

    /// Close every element.
    pub fn close(&mut self) {
        for element in &mut self.elements {
            element.close();
        }
        self.initialized = false;
        info!("Closed simulation '{}'", self.config.identifier);
    }

    /// Run for `duration` time units: initialize if needed, step until the
    /// clock has advanced by `duration`, then close. Runs even while paused.
    pub fn run(&mut self, duration: f64) -> Result<()> {
        if !(duration > 0.0) {
            return Err(DnfError::InvalidRunDuration(duration));
        }
        if !self.initialized {
            self.init();
        }

        let end = self.config.t + duration;
        while self.config.t < end {
            self.advance();
        }
        self.close();
        Ok(())
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Drop every element and reset time.
    pub fn clean(&mut self) {
        self.elements.clear();
        self.slots.clear();
        self.config.t = self.config.t_zero;
        self.initialized = false;
        info!("Cleaned simulation '{}'", self.config.identifier);
    }

    /// Append `element` and initialize it. Returns `false`, leaving the
    /// simulation unchanged, when an element with the same name or id exists.
    pub fn add_element(&mut self, mut element: Element) -> bool {
        if self.index_of(element.unique_name()).is_some() {
            warn!(
                "Element '{}' already exists in '{}', ignoring",
                element.unique_name(),
                self.config.identifier
            );
            return false;
        }
        if self.slots.contains_key(&element.unique_identifier()) {
            warn!(
                "Element id {} already exists in '{}', ignoring '{}'",
                element.unique_identifier(),
                self.config.identifier,
                element.unique_name()
            );
            return false;
        }

        element.init();
        info!(
            "Added {} '{}' to '{}'",
            element.label(),
            element.unique_name(),
            self.config.identifier
        );
        self.slots
            .insert(element.unique_identifier(), self.elements.len());
        self.elements.push(element);
        true
    }

    /// Remove `name` as an input from every other element, then remove it.
    pub fn remove_element(&mut self, name: &str) -> Result<Element> {
        let index = self.require(name)?;
        let id = self.elements[index].unique_identifier();

        for element in &mut self.elements {
            element.remove_input_by_id(id);
            if element.learning_target().is_some_and(|edge| edge.source == id) {
                element.clear_learning_target();
            }
        }

        let removed = self.elements.remove(index);
        self.rebuild_slots();
        info!("Removed '{}' from '{}'", name, self.config.identifier);
        Ok(removed)
    }

    /// Replace the element named `name` with `element` and initialize it.
    /// Fails when the replacement's name or id belongs to another element.
    ///
    /// Edges other elements hold to the replaced element are left as they
    /// are; they no longer resolve and contribute nothing until re-created.
    pub fn reset_element(&mut self, name: &str, mut element: Element) -> Result<()> {
        let index = self.require(name)?;
        let old_id = self.elements[index].unique_identifier();

        if self
            .index_of(element.unique_name())
            .is_some_and(|other| other != index)
        {
            return Err(DnfError::invalid(
                element.unique_name(),
                format!("cannot replace '{name}': the name is already taken"),
            ));
        }
        if self
            .slots
            .get(&element.unique_identifier())
            .is_some_and(|&other| other != index)
        {
            return Err(DnfError::invalid(
                element.unique_name(),
                format!(
                    "cannot replace '{name}': id {} belongs to another element",
                    element.unique_identifier()
                ),
            ));
        }

        let stale: Vec<&str> = self
            .elements
            .iter()
            .filter(|e| e.has_input_by_id(old_id))
            .map(Element::unique_name)
            .collect();
        if !stale.is_empty() {
            warn!(
                "Elements {:?} still take input from the replaced '{}'",
                stale, name
            );
        }

        element.init();
        self.slots.remove(&old_id);
        self.slots.insert(element.unique_identifier(), index);
        self.elements[index] = element;
        info!("Reset '{}' in '{}'", name, self.config.identifier);
        Ok(())
    }

    /// Register `source_component` of `source` as an input of `target`.
    pub fn create_interaction(
        &mut self,
        source: &str,
        source_component: &str,
        target: &str,
    ) -> Result<()> {
        let source_index = self.require(source)?;
        let target_index = self.require(target)?;

        let source_element = &self.elements[source_index];
        let id = source_element.unique_identifier();
        let component_len = source_element.component(source_component)?.len();
        self.elements[target_index].register_input(
            SourceInfo {
                id,
                name: source,
                component_len,
            },
            source_component,
        )
    }

    /// Make `target_component` of `target` the post-synaptic signal of the
    /// field coupling `coupling`.
    pub fn set_learning_target(
        &mut self,
        coupling: &str,
        target: &str,
        target_component: &str,
    ) -> Result<()> {
        let coupling_index = self.require(coupling)?;
        let target_index = self.require(target)?;

        let target_element = &self.elements[target_index];
        let id = target_element.unique_identifier();
        let component_len = target_element.component(target_component)?.len();
        self.elements[coupling_index].register_learning_target(
            SourceInfo {
                id,
                name: target,
                component_len,
            },
            target_component,
        )
    }

    pub fn get_element(&self, name: &str) -> Result<&Element> {
        let index = self.require(name)?;
        Ok(&self.elements[index])
    }

    pub fn get_element_mut(&mut self, name: &str) -> Result<&mut Element> {
        let index = self.require(name)?;
        Ok(&mut self.elements[index])
    }

    pub fn element_at(&self, index: usize) -> Result<&Element> {
        self.elements.get(index).ok_or(DnfError::IndexOutOfRange {
            index,
            len: self.elements.len(),
        })
    }

    /// All elements, in insertion order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn number_of_elements(&self) -> usize {
        self.elements.len()
    }

    /// Copy of a component of the element named `name`.
    pub fn get_component(&self, name: &str, component: &str) -> Result<Vec<f64>> {
        self.get_element(name)?.get_component(component)
    }

    pub fn component(&self, name: &str, component: &str) -> Result<&[f64]> {
        self.get_element(name)?.component(component)
    }

    pub fn component_mut(&mut self, name: &str, component: &str) -> Result<&mut [f64]> {
        self.get_element_mut(name)?.component_mut(component)
    }

    /// Elements reading `component` of the element named `name`.
    pub fn elements_with_input(&self, name: &str, component: &str) -> Vec<&Element> {
        let Some(index) = self.index_of(name) else {
            return Vec::new();
        };
        let id = self.elements[index].unique_identifier();
        self.elements
            .iter()
            .filter(|e| {
                e.inputs()
                    .iter()
                    .any(|edge| edge.source == id && edge.component == component)
            })
            .collect()
    }

    /// Append a component as one line of space-separated values.
    pub fn export_component<P: AsRef<Path>>(
        &self,
        name: &str,
        component: &str,
        path: P,
    ) -> Result<()> {
        let values = self.component(name, component)?;
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        let line: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        writeln!(file, "{}", line.join(" "))?;
        debug!(
            "Exported '{}' ({}) to {}",
            name,
            component,
            path.as_ref().display()
        );
        Ok(())
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.unique_name() == name)
    }

    fn require(&self, name: &str) -> Result<usize> {
        self.index_of(name)
            .ok_or_else(|| DnfError::ElementNotFound(name.to_string()))
    }

    fn rebuild_slots(&mut self) {
        self.slots = self
            .elements
            .iter()
            .enumerate()
            .map(|(i, e)| (e.unique_identifier(), i))
            .collect();
    }
}

/// Resolve a source while the element at `current` is borrowed mutably.
fn lookup<'a>(
    slots: &HashMap<ElementId, usize>,
    before: &'a [Element],
    after: &'a [Element],
    current: usize,
    id: ElementId,
    component: &str,
) -> Option<&'a [f64]> {
    let &slot = slots.get(&id)?;
    let element = if slot < current {
        before.get(slot)?
    } else if slot > current {
        after.get(slot - current - 1)?
    } else {
        return None;
    };
    element.component(component).ok()
}
