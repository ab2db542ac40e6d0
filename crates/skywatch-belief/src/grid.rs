//! GridBelief: per-cell, per-type probabilistic world estimate.
//!
//! Flat row-major storage. Cells are created once at construction and live
//! for the simulation's duration; scans and merges are the only mutators.
//! No implicit decay — if a caller wants decay it applies its own policy
//! between scans.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use skywatch_core::types::GridCell;

/// Quantized-encoding failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("encoded grid truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("encoded grid header has non-positive dimensions")]
    BadHeader,
}

/// An agent's belief about target existence, type, and heading per cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridBelief {
    rows: usize,
    cols: usize,
    num_types: usize,
    /// Existence probability per (cell, type), in [0, 1].
    probs: Vec<f64>,
    /// Heading estimate per (cell, type), degrees (0 = North, clockwise).
    headings: Vec<f64>,
    /// Simulation timestamp of the most recent estimate write per (cell, type).
    updated: Vec<f64>,
}

impl GridBelief {
    /// Create a belief grid with maximum-ignorance priors (0.5 everywhere).
    pub fn new(rows: usize, cols: usize, num_types: usize) -> Self {
        let n = rows * cols * num_types;
        Self {
            rows,
            cols,
            num_types,
            probs: vec![0.5; n],
            headings: vec![0.0; n],
            updated: vec![0.0; n],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn num_types(&self) -> usize {
        self.num_types
    }

    fn index(&self, cell: GridCell, ttype: usize) -> usize {
        debug_assert!(cell.row < self.rows && cell.col < self.cols);
        debug_assert!(ttype < self.num_types);
        (cell.row * self.cols + cell.col) * self.num_types + ttype
    }

    /// Existence probability for a target type in a cell.
    pub fn prob(&self, cell: GridCell, ttype: usize) -> f64 {
        self.probs[self.index(cell, ttype)]
    }

    /// Heading estimate (degrees) for a target type in a cell. Only
    /// meaningful when the matching probability is non-trivial.
    pub fn heading(&self, cell: GridCell, ttype: usize) -> f64 {
        self.headings[self.index(cell, ttype)]
    }

    /// Timestamp of the last estimate write for a target type in a cell.
    pub fn updated(&self, cell: GridCell, ttype: usize) -> f64 {
        self.updated[self.index(cell, ttype)]
    }

    /// Existence probabilities for every type in a cell, in type-ID order.
    pub fn probs_at(&self, cell: GridCell) -> &[f64] {
        let start = (cell.row * self.cols + cell.col) * self.num_types;
        &self.probs[start..start + self.num_types]
    }

    /// Record a new estimate for one (cell, type).
    ///
    /// The only mutator besides merge. A probability outside [0, 1] is a
    /// programming error upstream (an unfloored normalization or a race),
    /// so it fails loudly here rather than being clamped.
    pub fn record_estimate(&mut self, cell: GridCell, ttype: usize, prob: f64, heading_deg: f64, now: f64) {
        debug_assert!(
            (0.0..=1.0).contains(&prob),
            "probability out of range: {prob}"
        );
        let idx = self.index(cell, ttype);
        self.probs[idx] = prob;
        self.headings[idx] = heading_deg.rem_euclid(360.0);
        self.updated[idx] = now;
    }

    /// Derived cell uncertainty: `1 − max_t prob(cell, t)`.
    /// Lower means higher confidence the cell's state is known.
    pub fn uncertainty(&self, cell: GridCell) -> f64 {
        let max = self
            .probs_at(cell)
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        1.0 - max
    }

    /// Cell with maximum uncertainty, scanning row-major and keeping the
    /// first maximum (deterministic tie-break).
    pub fn most_uncertain_cell(&self) -> GridCell {
        let mut best = GridCell::new(0, 0);
        let mut best_u = f64::NEG_INFINITY;
        for row in 0..self.rows {
            for col in 0..self.cols {
                let cell = GridCell::new(row, col);
                let u = self.uncertainty(cell);
                if u > best_u {
                    best_u = u;
                    best = cell;
                }
            }
        }
        best
    }

    /// Mean uncertainty across all cells.
    pub fn mean_uncertainty(&self) -> f64 {
        let mut sum = 0.0;
        for row in 0..self.rows {
            for col in 0..self.cols {
                sum += self.uncertainty(GridCell::new(row, col));
            }
        }
        sum / (self.rows * self.cols) as f64
    }

    /// Merge another grid into this one, field by field: the newer
    /// timestamp wins; on a timestamp tie the higher probability wins.
    /// Idempotent, and commutative per (cell, type).
    pub fn merge_from(&mut self, other: &GridBelief) {
        debug_assert!(
            self.rows == other.rows
                && self.cols == other.cols
                && self.num_types == other.num_types,
            "belief grids must share dimensions to merge"
        );
        if self.probs.len() != other.probs.len() {
            return;
        }
        for i in 0..self.probs.len() {
            let take = other.updated[i] > self.updated[i]
                || (other.updated[i] == self.updated[i] && other.probs[i] > self.probs[i]);
            if take {
                self.probs[i] = other.probs[i];
                self.headings[i] = other.headings[i];
                self.updated[i] = other.updated[i];
            }
        }
    }

    /// Compact encoding for external viewers: `rows: i32 LE`, `cols: i32
    /// LE`, `num_types: i16 LE`, then one byte per (cell, type) in storage
    /// order holding `round(prob × 100)` in 0..=100.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(10 + self.probs.len());
        out.extend_from_slice(&(self.rows as i32).to_le_bytes());
        out.extend_from_slice(&(self.cols as i32).to_le_bytes());
        out.extend_from_slice(&(self.num_types as i16).to_le_bytes());
        for &p in &self.probs {
            out.push((p * 100.0).round() as u8);
        }
        out
    }

    /// Decode a viewer encoding back into a grid. Headings and timestamps
    /// are not carried by the encoding and come back zeroed.
    pub fn decode(bytes: &[u8]) -> Result<GridBelief, EncodingError> {
        if bytes.len() < 10 {
            return Err(EncodingError::Truncated {
                expected: 10,
                actual: bytes.len(),
            });
        }
        let rows = i32::from_le_bytes(bytes[0..4].try_into().unwrap_or_default());
        let cols = i32::from_le_bytes(bytes[4..8].try_into().unwrap_or_default());
        let num_types = i16::from_le_bytes(bytes[8..10].try_into().unwrap_or_default());
        if rows <= 0 || cols <= 0 || num_types <= 0 {
            return Err(EncodingError::BadHeader);
        }
        let (rows, cols, num_types) = (rows as usize, cols as usize, num_types as usize);
        let n = rows * cols * num_types;
        if bytes.len() != 10 + n {
            return Err(EncodingError::Truncated {
                expected: 10 + n,
                actual: bytes.len(),
            });
        }
        let probs = bytes[10..].iter().map(|&b| b as f64 / 100.0).collect();
        Ok(GridBelief {
            rows,
            cols,
            num_types,
            probs,
            headings: vec![0.0; n],
            updated: vec![0.0; n],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_grid() -> GridBelief {
        GridBelief::new(4, 5, 2)
    }

    #[test]
    fn test_new_grid_priors() {
        let grid = make_grid();
        for row in 0..4 {
            for col in 0..5 {
                let cell = GridCell::new(row, col);
                for t in 0..2 {
                    assert!((grid.prob(cell, t) - 0.5).abs() < 1e-12);
                    assert_eq!(grid.updated(cell, t), 0.0);
                }
                assert!((grid.uncertainty(cell) - 0.5).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_record_estimate_and_uncertainty() {
        let mut grid = make_grid();
        let cell = GridCell::new(2, 3);
        grid.record_estimate(cell, 1, 0.9, 135.0, 10.0);

        assert!((grid.prob(cell, 1) - 0.9).abs() < 1e-12);
        assert!((grid.heading(cell, 1) - 135.0).abs() < 1e-12);
        assert_eq!(grid.updated(cell, 1), 10.0);
        // Other type in the same cell untouched
        assert!((grid.prob(cell, 0) - 0.5).abs() < 1e-12);
        // Uncertainty follows the max type probability
        assert!((grid.uncertainty(cell) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_heading_normalized_on_write() {
        let mut grid = make_grid();
        let cell = GridCell::new(0, 0);
        grid.record_estimate(cell, 0, 0.5, -90.0, 1.0);
        assert!((grid.heading(cell, 0) - 270.0).abs() < 1e-12);
    }

    #[test]
    fn test_most_uncertain_cell_first_max() {
        let mut grid = make_grid();
        // All cells tie at 0.5; first max is (0, 0)
        assert_eq!(grid.most_uncertain_cell(), GridCell::new(0, 0));

        // Raise belief everywhere except (1, 2): that cell becomes the
        // unique maximum-uncertainty cell.
        for row in 0..4 {
            for col in 0..5 {
                if row == 1 && col == 2 {
                    continue;
                }
                grid.record_estimate(GridCell::new(row, col), 0, 0.8, 0.0, 1.0);
            }
        }
        assert_eq!(grid.most_uncertain_cell(), GridCell::new(1, 2));
    }

    #[test]
    fn test_merge_newer_timestamp_wins() {
        let mut a = make_grid();
        let mut b = make_grid();
        let cell = GridCell::new(1, 1);

        a.record_estimate(cell, 0, 0.9, 10.0, 5.0);
        b.record_estimate(cell, 0, 0.3, 200.0, 8.0);

        a.merge_from(&b);
        assert!((a.prob(cell, 0) - 0.3).abs() < 1e-12, "newer write wins");
        assert!((a.heading(cell, 0) - 200.0).abs() < 1e-12);
        assert_eq!(a.updated(cell, 0), 8.0);

        // Merging the older grid back changes nothing.
        let before = a.clone();
        let mut older = make_grid();
        older.record_estimate(cell, 0, 0.9, 10.0, 5.0);
        a.merge_from(&older);
        assert_eq!(a, before);
    }

    #[test]
    fn test_merge_tie_higher_prob_wins() {
        let mut a = make_grid();
        let mut b = make_grid();
        let cell = GridCell::new(0, 4);

        a.record_estimate(cell, 1, 0.4, 90.0, 7.0);
        b.record_estimate(cell, 1, 0.7, 180.0, 7.0);

        a.merge_from(&b);
        assert!((a.prob(cell, 1) - 0.7).abs() < 1e-12);
        assert!((a.heading(cell, 1) - 180.0).abs() < 1e-12);
    }

    #[test]
    fn test_merge_idempotent() {
        let mut a = make_grid();
        let mut b = make_grid();
        b.record_estimate(GridCell::new(3, 3), 1, 0.95, 42.0, 3.0);
        b.record_estimate(GridCell::new(0, 1), 0, 0.2, 7.0, 9.0);

        a.merge_from(&b);
        let once = a.clone();
        a.merge_from(&b);
        assert_eq!(a, once, "merging the same snapshot twice must be a no-op");
    }

    #[test]
    fn test_encode_layout() {
        let mut grid = GridBelief::new(2, 3, 2);
        grid.record_estimate(GridCell::new(0, 0), 0, 1.0, 0.0, 1.0);
        grid.record_estimate(GridCell::new(1, 2), 1, 0.25, 0.0, 1.0);

        let bytes = grid.encode();
        assert_eq!(bytes.len(), 10 + 2 * 3 * 2);
        assert_eq!(&bytes[0..4], &2i32.to_le_bytes());
        assert_eq!(&bytes[4..8], &3i32.to_le_bytes());
        assert_eq!(&bytes[8..10], &2i16.to_le_bytes());
        // (0,0) type 0 is the first payload byte
        assert_eq!(bytes[10], 100);
        // (1,2) type 1 is the last payload byte
        assert_eq!(bytes[10 + 11], 25);
        // untouched cells encode the 0.5 prior
        assert_eq!(bytes[11], 50);
    }

    #[test]
    fn test_decode_round_trip() {
        let mut grid = GridBelief::new(3, 3, 1);
        grid.record_estimate(GridCell::new(1, 1), 0, 0.87, 10.0, 2.0);

        let decoded = GridBelief::decode(&grid.encode()).unwrap();
        assert_eq!(decoded.rows(), 3);
        assert_eq!(decoded.cols(), 3);
        // Quantized to the nearest percent
        assert!((decoded.prob(GridCell::new(1, 1), 0) - 0.87).abs() < 0.005);
    }

    #[test]
    fn test_decode_rejects_truncation() {
        let grid = GridBelief::new(2, 2, 1);
        let mut bytes = grid.encode();
        bytes.pop();
        assert!(matches!(
            GridBelief::decode(&bytes),
            Err(EncodingError::Truncated { .. })
        ));
        assert!(matches!(
            GridBelief::decode(&bytes[..4]),
            Err(EncodingError::Truncated { .. })
        ));
    }
}
