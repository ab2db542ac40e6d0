//! Fundamental geometric and simulation types.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// 2D position in simulation space (meters, Cartesian).
/// x = East, y = North. Altitude is handled by the flight layer, not here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance to another coordinate in meters.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Bearing to another coordinate in degrees (0 = North, clockwise).
    pub fn bearing_to_deg(&self, other: &Coordinate) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx.atan2(dy).to_degrees().rem_euclid(360.0)
    }

    pub fn as_dvec2(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }
}

/// Normalize a heading into [0, 360) degrees.
pub fn normalize_heading_deg(heading: f64) -> f64 {
    heading.rem_euclid(360.0)
}

/// Unit vector for a heading in degrees (0 = North, clockwise).
pub fn heading_unit_vector(heading_deg: f64) -> DVec2 {
    let rad = heading_deg.to_radians();
    DVec2::new(rad.sin(), rad.cos())
}

/// A cell address in the belief grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
}

impl GridCell {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// The world-to-grid frame: dimensions plus uniform cell size.
///
/// The full geodetic transform lives outside this core; the frame only
/// carries what the belief and sensing layers need to move between
/// coordinates and cell addresses. The world origin is the southwest corner
/// of cell (0, 0); rows grow northward, columns eastward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridFrame {
    pub rows: usize,
    pub cols: usize,
    /// Edge length of one square cell in meters.
    pub cell_size_m: f64,
}

impl GridFrame {
    pub fn new(rows: usize, cols: usize, cell_size_m: f64) -> Self {
        Self {
            rows,
            cols,
            cell_size_m,
        }
    }

    /// Cell containing a coordinate, or None if outside the grid.
    pub fn cell_of(&self, pos: &Coordinate) -> Option<GridCell> {
        if pos.x < 0.0 || pos.y < 0.0 {
            return None;
        }
        let col = (pos.x / self.cell_size_m) as usize;
        let row = (pos.y / self.cell_size_m) as usize;
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(GridCell { row, col })
    }

    /// Center coordinate of a cell.
    pub fn center_of(&self, cell: GridCell) -> Coordinate {
        Coordinate {
            x: (cell.col as f64 + 0.5) * self.cell_size_m,
            y: (cell.row as f64 + 0.5) * self.cell_size_m,
        }
    }

    /// World extent east-west (meters).
    pub fn width_m(&self) -> f64 {
        self.cols as f64 * self.cell_size_m
    }

    /// World extent north-south (meters).
    pub fn height_m(&self) -> f64 {
        self.rows as f64 * self.cell_size_m
    }

    /// Corner-to-corner diagonal of the world (meters). Used as the bid
    /// normalization distance: no two points are farther apart than this.
    pub fn max_distance_m(&self) -> f64 {
        let w = self.width_m();
        let h = self.height_m();
        (w * w + h * h).sqrt()
    }
}

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub elapsed_secs: f64,
}

impl SimTime {
    /// Seconds per tick at the default tick rate.
    pub fn dt(&self) -> f64 {
        1.0 / crate::constants::TICK_RATE as f64
    }

    /// Advance by one tick.
    pub fn advance(&mut self) {
        self.tick += 1;
        self.elapsed_secs += self.dt();
    }
}

/// Stable identifier for one swarm agent.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct AgentId(pub u32);

/// Stable cross-agent identifier for a tracked target.
///
/// Assumed pre-correlated: every agent that tracks the same physical target
/// records the same id (see `CorrelationPolicy` in skywatch-belief).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TargetId(pub u32);

/// Sensor type index into the detection tables.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SensorType(pub u16);

/// Target type index; valid values are `0..num_target_types`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TargetType(pub u16);

/// Weapon type index into the effectiveness table.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct WeaponType(pub u16);
