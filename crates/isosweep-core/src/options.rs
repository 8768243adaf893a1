//! Configuration options for an extraction run.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IsosweepError, Result};

/// How often a mesh snapshot is handed to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UpdateType {
    /// After every cell that added triangles.
    Cube,
    /// After every completed z-slice (default).
    #[default]
    Slice,
    /// Once, when the sweep finishes. Never pauses.
    Complete,
}

/// Options for one extraction run. Fixed once the run starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionOptions {
    /// The isovalue defining the surface.
    pub level: f32,

    /// Lattice stride between cell corners on every axis.
    pub grid_size: u32,

    /// Snapshot granularity.
    pub update: UpdateType,

    /// Whether the sweep suspends itself after each emitted snapshot until
    /// resumed. Ignored for [`UpdateType::Complete`].
    pub pause_on_update: bool,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            level: 0.5,
            grid_size: 1,
            update: UpdateType::Slice,
            pause_on_update: false,
        }
    }
}

impl ExtractionOptions {
    /// Creates options for the given isovalue with default settings otherwise.
    pub fn new(level: f32) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    /// Sets the isovalue.
    #[must_use]
    pub fn with_level(mut self, level: f32) -> Self {
        self.level = level;
        self
    }

    /// Sets the lattice stride.
    #[must_use]
    pub fn with_grid_size(mut self, grid_size: u32) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Sets the snapshot granularity.
    #[must_use]
    pub fn with_update(mut self, update: UpdateType) -> Self {
        self.update = update;
        self
    }

    /// Enables or disables pausing after each snapshot.
    #[must_use]
    pub fn with_pause_on_update(mut self, pause: bool) -> Self {
        self.pause_on_update = pause;
        self
    }

    /// Returns true if the sweep should suspend after emitting a snapshot.
    #[must_use]
    pub fn pauses_after_update(&self) -> bool {
        self.pause_on_update && self.update != UpdateType::Complete
    }

    /// Checks the options before a run.
    pub fn validate(&self) -> Result<()> {
        if !self.level.is_finite() || self.level < 0.0 {
            return Err(IsosweepError::InvalidLevel(self.level));
        }
        if self.grid_size < 1 || i32::try_from(self.grid_size).is_err() {
            return Err(IsosweepError::InvalidGridSize(self.grid_size));
        }
        Ok(())
    }

    /// Parses and validates options from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Loads and validates options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serializes the options to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let options = ExtractionOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.update, UpdateType::Slice);
        assert!(!options.pauses_after_update());
    }

    #[test]
    fn test_rejects_negative_level() {
        let err = ExtractionOptions::new(-0.1).validate().unwrap_err();
        assert!(matches!(err, IsosweepError::InvalidLevel(_)));
        assert!(ExtractionOptions::new(f32::NAN).validate().is_err());
        assert!(ExtractionOptions::new(0.0).validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_grid_size() {
        let err = ExtractionOptions::default()
            .with_grid_size(0)
            .validate()
            .unwrap_err();
        assert!(matches!(err, IsosweepError::InvalidGridSize(0)));
    }

    #[test]
    fn test_complete_never_pauses() {
        let options = ExtractionOptions::default()
            .with_update(UpdateType::Complete)
            .with_pause_on_update(true);
        assert!(!options.pauses_after_update());
        let options = options.with_update(UpdateType::Cube);
        assert!(options.pauses_after_update());
    }

    #[test]
    fn test_json_roundtrip_and_defaults() {
        let options = ExtractionOptions::from_json(r#"{ "level": 2.5, "update": "Cube" }"#).unwrap();
        assert_eq!(options.level, 2.5);
        assert_eq!(options.update, UpdateType::Cube);
        assert_eq!(options.grid_size, 1);

        let json = options.to_json().unwrap();
        assert_eq!(ExtractionOptions::from_json(&json).unwrap(), options);
    }

    #[test]
    fn test_json_errors() {
        assert!(matches!(
            ExtractionOptions::from_json("{ not json"),
            Err(IsosweepError::JsonError(_))
        ));
        assert!(matches!(
            ExtractionOptions::from_json(r#"{ "grid_size": 0 }"#),
            Err(IsosweepError::InvalidGridSize(0))
        ));
        assert!(matches!(
            ExtractionOptions::load("/nonexistent/isosweep.json"),
            Err(IsosweepError::IoError(_))
        ));
    }
}
