//! Sensor detection model: pure lookup tables indexed by sensor and target
//! type.
//!
//! All tables are immutable after construction. Lookups for unconfigured
//! pairs return `None` — the "no data" sentinel. Callers must treat `None`
//! as "this sensor cannot detect/misclassify this combination" and
//! short-circuit, never as a probability of zero.

use std::collections::HashMap;

use thiserror::Error;

use skywatch_core::types::{SensorType, TargetType};

/// Table construction failures.
#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("probability {value} outside [0, 1]")]
    ProbabilityRange { value: f64 },
    #[error("duplicate entry for sensor {sensor:?} / target type {ttype:?}")]
    DuplicateEntry {
        sensor: SensorType,
        ttype: TargetType,
    },
    #[error("duplicate misclassify entry for sensor {sensor:?}, {true_type:?} -> {reported:?}")]
    DuplicateMisclassify {
        sensor: SensorType,
        true_type: TargetType,
        reported: TargetType,
    },
    #[error("target type {ttype:?} outside configured range 0..{num_types}")]
    TypeOutOfRange { ttype: TargetType, num_types: usize },
}

/// Immutable detection/misclassification probability tables.
#[derive(Debug, Clone, Default)]
pub struct DetectionTables {
    num_target_types: usize,
    detection: HashMap<(SensorType, TargetType), f64>,
    heading_conf: HashMap<(SensorType, TargetType), f64>,
    misclassify: HashMap<(SensorType, TargetType, TargetType), f64>,
}

impl DetectionTables {
    pub fn builder(num_target_types: usize) -> DetectionTablesBuilder {
        DetectionTablesBuilder {
            tables: DetectionTables {
                num_target_types,
                ..Default::default()
            },
        }
    }

    /// Number of target types the tables were configured for.
    pub fn num_target_types(&self) -> usize {
        self.num_target_types
    }

    /// Probability this sensor detects a present target of this type, or
    /// `None` when the combination is unconfigured (sensor incapable).
    pub fn detection_prob(&self, sensor: SensorType, ttype: TargetType) -> Option<f64> {
        self.detection.get(&(sensor, ttype)).copied()
    }

    /// Heading confidence coefficient for the exponential heading filter,
    /// or `None` when unconfigured.
    pub fn heading_confidence(&self, sensor: SensorType, ttype: TargetType) -> Option<f64> {
        self.heading_conf.get(&(sensor, ttype)).copied()
    }

    /// Probability this sensor reports a present `true_type` target as
    /// `reported`, or `None` when the combination is unconfigured.
    pub fn misclassify_prob(
        &self,
        sensor: SensorType,
        true_type: TargetType,
        reported: TargetType,
    ) -> Option<f64> {
        self.misclassify.get(&(sensor, true_type, reported)).copied()
    }
}

/// Builder validating each entry as it is added.
#[derive(Debug, Clone)]
pub struct DetectionTablesBuilder {
    tables: DetectionTables,
}

impl DetectionTablesBuilder {
    fn check_prob(value: f64) -> Result<(), TableError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(TableError::ProbabilityRange { value });
        }
        Ok(())
    }

    fn check_type(&self, ttype: TargetType) -> Result<(), TableError> {
        if ttype.0 as usize >= self.tables.num_target_types {
            return Err(TableError::TypeOutOfRange {
                ttype,
                num_types: self.tables.num_target_types,
            });
        }
        Ok(())
    }

    /// Configure the detection probability for a (sensor, type) pair.
    pub fn detection(
        mut self,
        sensor: SensorType,
        ttype: TargetType,
        prob: f64,
    ) -> Result<Self, TableError> {
        Self::check_prob(prob)?;
        self.check_type(ttype)?;
        if self.tables.detection.insert((sensor, ttype), prob).is_some() {
            return Err(TableError::DuplicateEntry { sensor, ttype });
        }
        Ok(self)
    }

    /// Configure the heading confidence coefficient for a (sensor, type)
    /// pair.
    pub fn heading_confidence(
        mut self,
        sensor: SensorType,
        ttype: TargetType,
        coeff: f64,
    ) -> Result<Self, TableError> {
        Self::check_prob(coeff)?;
        self.check_type(ttype)?;
        if self
            .tables
            .heading_conf
            .insert((sensor, ttype), coeff)
            .is_some()
        {
            return Err(TableError::DuplicateEntry { sensor, ttype });
        }
        Ok(self)
    }

    /// Configure the probability of reporting `true_type` as `reported`.
    pub fn misclassify(
        mut self,
        sensor: SensorType,
        true_type: TargetType,
        reported: TargetType,
        prob: f64,
    ) -> Result<Self, TableError> {
        Self::check_prob(prob)?;
        self.check_type(true_type)?;
        self.check_type(reported)?;
        if self
            .tables
            .misclassify
            .insert((sensor, true_type, reported), prob)
            .is_some()
        {
            return Err(TableError::DuplicateMisclassify {
                sensor,
                true_type,
                reported,
            });
        }
        Ok(self)
    }

    pub fn build(self) -> DetectionTables {
        self.tables
    }
}
