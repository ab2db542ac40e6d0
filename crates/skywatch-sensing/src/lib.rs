//! Sensor modeling for SKYWATCH: detection/misclassification tables and
//! the scan engine that turns sensor geometry plus ground truth into
//! Bayesian belief updates.

pub mod scan;
pub mod tables;

pub use scan::{GroundTruth, ScanConfig, TruthObservation};
pub use tables::DetectionTables;
