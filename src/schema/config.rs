//! Configuration types for simulations and element dimensions.

use serde::{Deserialize, Serialize};

/// Order in which elements observe each other's outputs within one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateSchedule {
    /// Elements step in insertion order and read whatever their sources hold
    /// at that moment: sources added earlier contribute this tick's values,
    /// sources added later contribute the previous tick's values.
    #[default]
    InsertionOrder,
    /// Every element reads a snapshot of the graph taken at the start of the
    /// tick, so insertion order has no effect on the trajectory.
    Synchronous,
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Human-readable identifier of the simulation.
    pub identifier: String,
    /// Time step used by every element.
    pub delta_t: f64,
    /// Time the simulation is reset to on `init`.
    pub t_zero: f64,
    /// Current time.
    pub t: f64,
    #[serde(default)]
    pub schedule: UpdateSchedule,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            identifier: "default simulation".to_string(),
            delta_t: 1.0,
            t_zero: 0.0,
            t: 0.0,
            schedule: UpdateSchedule::default(),
        }
    }
}

impl SimulationConfig {
    pub fn new(identifier: impl Into<String>, delta_t: f64, t_zero: f64, t: f64) -> Self {
        Self {
            identifier: identifier.into(),
            delta_t,
            t_zero,
            t,
            schedule: UpdateSchedule::default(),
        }
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.delta_t > 0.0) || !self.delta_t.is_finite() {
            return Err(ConfigError::InvalidTimeStep(self.delta_t));
        }
        if self.t_zero > self.t {
            return Err(ConfigError::InvalidStartTime {
                t_zero: self.t_zero,
                t: self.t,
            });
        }
        Ok(())
    }
}

/// Spatial extent of an element and its sampling step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementDimensions {
    /// Spatial extent in field units.
    pub x_max: f64,
    /// Distance between two samples.
    pub d_x: f64,
}

impl Default for ElementDimensions {
    fn default() -> Self {
        Self {
            x_max: 100.0,
            d_x: 1.0,
        }
    }
}

impl ElementDimensions {
    pub fn new(x_max: f64, d_x: f64) -> Result<Self, ConfigError> {
        let dimensions = Self { x_max, d_x };
        dimensions.validate()?;
        Ok(dimensions)
    }

    /// Unit-step dimensions holding exactly `size` samples.
    pub fn with_size(size: usize) -> Self {
        Self {
            x_max: size as f64,
            d_x: 1.0,
        }
    }

    /// Number of samples, `round(x_max / d_x)`.
    #[inline]
    pub fn size(&self) -> usize {
        (self.x_max / self.d_x).round() as usize
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.x_max > 0.0) || !(self.d_x > 0.0) || self.size() == 0 {
            return Err(ConfigError::InvalidDimensions {
                x_max: self.x_max,
                d_x: self.d_x,
            });
        }
        Ok(())
    }
}

/// Parameters shared by every element: its name and spatial dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementCommonParameters {
    pub name: String,
    #[serde(default)]
    pub dimensions: ElementDimensions,
}

impl ElementCommonParameters {
    pub fn new(name: impl Into<String>, dimensions: ElementDimensions) -> Self {
        Self {
            name: name.into(),
            dimensions,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        self.dimensions.validate()
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Time step must be positive and finite, got {0}")]
    InvalidTimeStep(f64),
    #[error("Start time {t_zero} must not be later than the current time {t}")]
    InvalidStartTime { t_zero: f64, t: f64 },
    #[error("Dimensions (x_max = {x_max}, d_x = {d_x}) must be positive and hold at least one sample")]
    InvalidDimensions { x_max: f64, d_x: f64 },
    #[error("Element name must not be empty")]
    EmptyName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
        assert!(ElementDimensions::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_time_step() {
        let config = SimulationConfig::new("sim", 0.0, 0.0, 0.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeStep(_))
        ));

        let config = SimulationConfig::new("sim", -1.0, 0.0, 0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_start_time_after_current_time() {
        let config = SimulationConfig::new("sim", 1.0, 5.0, 2.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidStartTime { .. })
        ));
    }

    #[test]
    fn test_dimensions_size() {
        assert_eq!(ElementDimensions::new(100.0, 1.0).unwrap().size(), 100);
        assert_eq!(ElementDimensions::new(360.0, 0.5).unwrap().size(), 720);
        assert_eq!(ElementDimensions::with_size(5).size(), 5);
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(ElementDimensions::new(0.0, 1.0).is_err());
        assert!(ElementDimensions::new(10.0, 0.0).is_err());
        assert!(ElementDimensions::new(10.0, -1.0).is_err());
        // Rounds down to zero samples
        assert!(ElementDimensions::new(0.4, 1.0).is_err());
    }

    #[test]
    fn test_empty_name_rejected() {
        let common = ElementCommonParameters::new("  ", ElementDimensions::default());
        assert!(matches!(common.validate(), Err(ConfigError::EmptyName)));
    }

    #[test]
    fn test_serialization() {
        let config = SimulationConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.identifier, config.identifier);
        assert_eq!(parsed.schedule, UpdateSchedule::InsertionOrder);

        let parsed: SimulationConfig =
            serde_json::from_str(r#"{"identifier":"x","delta_t":0.5,"t_zero":0,"t":0}"#).unwrap();
        assert_eq!(parsed.schedule, UpdateSchedule::InsertionOrder);
        assert_eq!(parsed.delta_t, 0.5);
    }
}
