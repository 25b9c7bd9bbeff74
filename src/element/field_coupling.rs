//! Dense, optionally plastic projection between two fields.

use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::{Dynamics, Io, WEIGHTS};
use crate::compute::{WeightMatrix, apply_learning_rule};
use crate::schema::{ElementParameters, FieldCouplingParameters};

/// Projects its input through a weight matrix, `output = gain * W * input`.
///
/// While learning is active and a learning target is registered, the
/// weights are updated after every projection with the configured rule,
/// using the input as pre-synaptic and the target as post-synaptic values.
#[derive(Debug)]
pub struct FieldCoupling {
    name: String,
    parameters: FieldCouplingParameters,
    weights: WeightMatrix,
}

impl FieldCoupling {
    pub(crate) fn new(name: &str, parameters: FieldCouplingParameters, size: usize) -> Self {
        let weights = WeightMatrix::zeros(size, parameters.input_dimensions.size());
        Self {
            name: name.to_string(),
            parameters,
            weights,
        }
    }

    pub fn weights(&self) -> &WeightMatrix {
        &self.weights
    }

    pub fn weights_mut(&mut self) -> &mut WeightMatrix {
        &mut self.weights
    }

    /// Replace the weights. Ignored with a warning when the shape differs.
    pub fn set_weights(&mut self, weights: WeightMatrix) {
        if weights.rows() != self.weights.rows() || weights.cols() != self.weights.cols() {
            warn!(
                "Ignoring {}x{} weights for '{}', expected {}x{}",
                weights.rows(),
                weights.cols(),
                self.name,
                self.weights.rows(),
                self.weights.cols()
            );
            return;
        }
        self.weights = weights;
    }

    pub fn is_learning(&self) -> bool {
        self.parameters.learning_active
    }

    pub fn set_learning(&mut self, active: bool) {
        self.parameters.learning_active = active;
    }

    /// Default weights file, `<weights_directory>/<name>_weights.txt`.
    pub fn weights_path(&self) -> Option<PathBuf> {
        self.parameters
            .weights_directory
            .as_ref()
            .map(|dir| dir.join(format!("{}_weights.txt", self.name)))
    }

    pub fn set_weights_directory(&mut self, directory: impl Into<PathBuf>) {
        self.parameters.weights_directory = Some(directory.into());
    }

    /// Read weights from the default file. Returns `false` and keeps the
    /// current weights when no directory is set or the file cannot be used.
    pub fn read_weights(&mut self) -> bool {
        match self.weights_path() {
            Some(path) => self.read_weights_from(path),
            None => {
                warn!("'{}' has no weights directory to read from", self.name);
                false
            }
        }
    }

    /// Read weights from `path`. Returns `false` and keeps the current
    /// weights when the file is missing, malformed or of the wrong shape.
    pub fn read_weights_from<P: AsRef<Path>>(&mut self, path: P) -> bool {
        let path = path.as_ref();
        match WeightMatrix::read_from(path) {
            Ok(weights)
                if weights.rows() == self.weights.rows()
                    && weights.cols() == self.weights.cols() =>
            {
                self.weights = weights;
                info!("Read weights of '{}' from {}", self.name, path.display());
                true
            }
            Ok(weights) => {
                warn!(
                    "Weights in {} are {}x{}, '{}' needs {}x{}",
                    path.display(),
                    weights.rows(),
                    weights.cols(),
                    self.name,
                    self.weights.rows(),
                    self.weights.cols()
                );
                false
            }
            Err(e) => {
                warn!(
                    "Could not read weights of '{}' from {}: {}",
                    self.name,
                    path.display(),
                    e
                );
                false
            }
        }
    }

    /// Write weights to the default file, returning its path.
    pub fn write_weights(&self) -> io::Result<PathBuf> {
        let path = self.weights_path().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "No weights directory set")
        })?;
        self.write_weights_to(&path)?;
        Ok(path)
    }

    pub fn write_weights_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        self.weights.write_to(&path)?;
        info!(
            "Saved weights of '{}' to {}",
            self.name,
            path.as_ref().display()
        );
        Ok(())
    }

    pub fn clear_weights(&mut self) {
        self.weights.fill(0.0);
    }

    /// Fill the weights uniformly from `[min, max)` with a seeded generator.
    pub fn randomize_weights(&mut self, seed: u64, min: f64, max: f64) {
        let mut rng = StdRng::seed_from_u64(seed);
        self.weights.randomize(&mut rng, min, max);
    }
}

impl Dynamics for FieldCoupling {
    fn init(&mut self, io: Io<'_>) {
        io.output.fill(0.0);
        if self.parameters.weights_directory.is_some() && !self.read_weights() {
            info!("'{}' starts with its current weights", self.name);
        }
    }

    fn step(&mut self, io: Io<'_>, _t: f64, _delta_t: f64) {
        self.weights.project_into(io.input, io.output);
        let gain = self.parameters.gain;
        for out in io.output.iter_mut() {
            *out *= gain;
        }

        if !self.parameters.learning_active {
            return;
        }
        if let Some(post) = io.learning_target {
            apply_learning_rule(
                self.parameters.learning_rule,
                &mut self.weights,
                io.input,
                post,
                self.parameters.learning_rate,
            );
        }
    }

    fn component(&self, name: &str) -> Option<&[f64]> {
        (name == WEIGHTS).then_some(self.weights.as_slice())
    }

    fn component_mut(&mut self, name: &str) -> Option<&mut [f64]> {
        (name == WEIGHTS).then_some(self.weights.as_mut_slice())
    }

    fn component_names(&self) -> &'static [&'static str] {
        &[WEIGHTS]
    }

    fn parameters(&self) -> ElementParameters {
        ElementParameters::FieldCoupling(self.parameters.clone())
    }
}
