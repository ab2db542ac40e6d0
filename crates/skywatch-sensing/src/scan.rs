//! Scan engine.
//!
//! Each scan walks the sensor's field-of-view cells, consults ground truth
//! for what is really there, rolls detection and misclassification draws
//! against the detection tables, and applies a Bayesian posterior update to
//! the agent's grid belief.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use skywatch_belief::GridBelief;
use skywatch_core::constants::{
    BAYES_DENOMINATOR_FLOOR, HEADING_CONF_DEFAULT, HEADING_DRIFT_SPAN_DEG, HEADING_ERROR_SPAN_DEG,
};
use skywatch_core::types::{Coordinate, GridCell, SensorType, TargetId, TargetType};

use crate::tables::DetectionTables;

/// Detection probability formula selection.
///
/// The baseline formula ignores relative heading even though the tables
/// carry heading-confidence coefficients; the heading-weighted variant uses
/// them to attenuate detection of targets seen from unfavorable aspects.
/// Which is "correct" is an open question inherited from the original
/// system, so both are selectable rather than one being guessed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionLaw {
    /// Detection probability depends only on (sensor, target type).
    #[default]
    Baseline,
    /// Detection probability attenuated by relative heading via the
    /// heading-confidence coefficient.
    HeadingWeighted,
}

/// Misclassification candidate iteration order.
///
/// Type-ID order reproduces the legacy first-match-wins semantics, which
/// structurally biases misclassification labels toward low type IDs.
/// Shuffled order removes that bias at the cost of diverging from legacy
/// simulation statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MisclassifyOrder {
    #[default]
    TypeIdOrder,
    Shuffled,
}

/// Scan engine configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    pub detection_law: DetectionLaw,
    pub misclassify_order: MisclassifyOrder,
}

/// A real target as reported by the truth collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruthObservation {
    pub id: TargetId,
    pub ttype: TargetType,
    pub position: Coordinate,
    pub heading_deg: f64,
}

/// The ground-truth query collaborator. Implemented outside this crate
/// (the simulation holds the real world); the scan engine only ever sees
/// these two queries.
pub trait GroundTruth {
    /// The real target of the given type occupying a cell, if any.
    fn target_in_cell(&self, cell: GridCell, ttype: TargetType) -> Option<TruthObservation>;

    /// All real targets inside an axis-aligned region.
    fn targets_in_region(&self, min: Coordinate, max: Coordinate) -> Vec<TruthObservation>;
}

/// One positive detection produced by a scan, for registry promotion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub cell: GridCell,
    /// The type the sensor reported (possibly misclassified).
    pub reported: TargetType,
    /// Posterior existence probability written to the grid.
    pub posterior: f64,
    /// Truth identity of the detected target, for the correlation policy.
    pub truth_id: TargetId,
}

/// Probability that `sensor` detects a present target of `ttype`, under
/// the configured detection law. `None` means the sensor cannot detect
/// this type at all.
pub fn prob_of_detect(
    config: &ScanConfig,
    tables: &DetectionTables,
    sensor: SensorType,
    ttype: TargetType,
    sensor_heading_deg: f64,
    target_heading_deg: f64,
) -> Option<f64> {
    let base = tables.detection_prob(sensor, ttype)?;
    match config.detection_law {
        DetectionLaw::Baseline => Some(base),
        DetectionLaw::HeadingWeighted => {
            let conf = tables
                .heading_confidence(sensor, ttype)
                .unwrap_or(HEADING_CONF_DEFAULT);
            let delta = (sensor_heading_deg - target_heading_deg).to_radians();
            // Attenuates to base*(1-conf) at a fully adverse aspect.
            let factor = 1.0 - conf * (1.0 - delta.cos()) / 2.0;
            Some(base * factor)
        }
    }
}

/// Bayesian posterior for the reported type given the cell's priors.
///
/// `numerator = P(detect as reported | reported is true) × prior[reported]`;
/// the denominator sums, over every type `i`, the probability that a
/// present type-`i` target would have produced this report, weighted by
/// `prior[i]`. Unconfigured table entries contribute nothing. The
/// denominator is floored so the division never blows up.
///
/// Pure: repeated computation on the same inputs is identical.
/// Returns `None` when the sensor has no detection data for the reported
/// type (the incapable sentinel — no belief write should follow).
pub fn bayes_posterior(
    tables: &DetectionTables,
    sensor: SensorType,
    reported: TargetType,
    priors: &[f64],
) -> Option<f64> {
    let p_detect_reported = tables.detection_prob(sensor, reported)?;
    let numerator = p_detect_reported * priors[reported.0 as usize];

    let mut denominator = 0.0;
    for (i, &prior) in priors.iter().enumerate() {
        let itype = TargetType(i as u16);
        let p = if itype == reported {
            p_detect_reported
        } else {
            tables.misclassify_prob(sensor, itype, reported).unwrap_or(0.0)
        };
        denominator += p * prior;
    }

    Some(numerator / denominator.max(BAYES_DENOMINATOR_FLOOR))
}

/// Shortest signed angular difference `to − from` in degrees, in
/// (−180, 180].
fn heading_delta_deg(from: f64, to: f64) -> f64 {
    let mut d = (to - from).rem_euclid(360.0);
    if d > 180.0 {
        d -= 360.0;
    }
    d
}

/// Exponential/alpha heading filter:
/// `new = prior + coeff × shortest_delta(prior → sample)`.
pub fn blend_heading_deg(prior: f64, sample: f64, coeff: f64) -> f64 {
    (prior + coeff * heading_delta_deg(prior, sample)).rem_euclid(360.0)
}

/// Run one scan over the field of view. Returns the positive detections
/// so the caller can promote tracked targets.
#[allow(clippy::too_many_arguments)]
pub fn simulate_scan(
    config: &ScanConfig,
    tables: &DetectionTables,
    truth: &dyn GroundTruth,
    grid: &mut GridBelief,
    sensor: SensorType,
    sensor_heading_deg: f64,
    fov_cells: &[GridCell],
    now: f64,
    rng: &mut ChaCha8Rng,
) -> Vec<Detection> {
    let mut detections = Vec::new();
    for &cell in fov_cells {
        for t in 0..tables.num_target_types() {
            let ttype = TargetType(t as u16);
            if let Some(det) = scan_cell(
                config,
                tables,
                truth,
                grid,
                cell,
                ttype,
                sensor,
                sensor_heading_deg,
                now,
                rng,
            ) {
                detections.push(det);
            }
        }
    }
    detections
}

/// Scan one (cell, true type) combination. Returns the detection if the
/// draw succeeded and a belief write happened; `None` is the no-detection
/// sentinel (absent target, incapable sensor, or failed draw) and writes
/// nothing.
#[allow(clippy::too_many_arguments)]
fn scan_cell(
    config: &ScanConfig,
    tables: &DetectionTables,
    truth: &dyn GroundTruth,
    grid: &mut GridBelief,
    cell: GridCell,
    true_type: TargetType,
    sensor: SensorType,
    sensor_heading_deg: f64,
    now: f64,
    rng: &mut ChaCha8Rng,
) -> Option<Detection> {
    let obs = truth.target_in_cell(cell, true_type)?;

    // The heading-weighted law sees the agent's own heading estimate, not
    // truth: detectability is judged against what the sensor expects.
    let estimated_heading = grid.heading(cell, true_type.0 as usize);
    let pd = prob_of_detect(
        config,
        tables,
        sensor,
        true_type,
        sensor_heading_deg,
        estimated_heading,
    )?;
    if !rng.gen_bool(pd.clamp(0.0, 1.0)) {
        return None;
    }

    let reported = draw_reported_type(config, tables, sensor, true_type, rng);

    let priors: Vec<f64> = grid.probs_at(cell).to_vec();
    let posterior = bayes_posterior(tables, sensor, reported, &priors)?;

    // Heading estimate: sample from truth when a real target of the
    // reported type is present, otherwise perturb the prior.
    let conf = tables
        .heading_confidence(sensor, reported)
        .unwrap_or(HEADING_CONF_DEFAULT);
    let prior_heading = grid.heading(cell, reported.0 as usize);
    let sample = match truth.target_in_cell(cell, reported) {
        Some(real) => {
            let span = HEADING_ERROR_SPAN_DEG * (1.0 - conf);
            real.heading_deg + rng.gen_range(-span..=span)
        }
        None => prior_heading + rng.gen_range(-HEADING_DRIFT_SPAN_DEG..=HEADING_DRIFT_SPAN_DEG),
    };
    let new_heading = blend_heading_deg(prior_heading, sample, conf);

    grid.record_estimate(cell, reported.0 as usize, posterior, new_heading, now);

    Some(Detection {
        cell,
        reported,
        posterior,
        truth_id: obs.id,
    })
}

/// Decide what type the sensor reports for a detected `true_type` target.
/// Candidates are drawn in the configured order; the first successful
/// misclassify draw wins, otherwise the report is truthful.
fn draw_reported_type(
    config: &ScanConfig,
    tables: &DetectionTables,
    sensor: SensorType,
    true_type: TargetType,
    rng: &mut ChaCha8Rng,
) -> TargetType {
    let mut order: Vec<u16> = (0..tables.num_target_types() as u16).collect();
    if config.misclassify_order == MisclassifyOrder::Shuffled {
        // Fisher-Yates on the candidate list, driven by the scan RNG.
        for i in (1..order.len()).rev() {
            let j = rng.gen_range(0..=i);
            order.swap(i, j);
        }
    }

    for candidate in order {
        let reported = TargetType(candidate);
        if reported == true_type {
            continue;
        }
        if let Some(p) = tables.misclassify_prob(sensor, true_type, reported) {
            if rng.gen_bool(p.clamp(0.0, 1.0)) {
                return reported;
            }
        }
    }
    true_type
}
