//! Simulation constants and tuning parameters.

/// Simulation tick rate (Hz).
pub const TICK_RATE: u32 = 60;

/// Seconds per tick.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

// --- World defaults ---

/// Default belief grid rows.
pub const DEFAULT_GRID_ROWS: usize = 40;

/// Default belief grid columns.
pub const DEFAULT_GRID_COLS: usize = 40;

/// Default cell edge length in meters.
pub const DEFAULT_CELL_SIZE_M: f64 = 250.0;

/// Default number of target types in play.
pub const DEFAULT_TARGET_TYPES: usize = 3;

// --- Belief ---

/// Floor applied to the Bayesian normalization denominator.
/// Keeps the posterior finite without materially biasing it.
pub const BAYES_DENOMINATOR_FLOOR: f64 = 1e-9;

/// Existence belief above which a cell detection is promoted into the
/// target registry as a tracked target.
pub const TRACK_PROMOTE_PROB: f64 = 0.85;

/// Heading confidence coefficient used when the detection tables carry no
/// entry for a (sensor, target type) pair that still produced a detection.
pub const HEADING_CONF_DEFAULT: f64 = 0.5;

/// Half-span of the uniform heading sample error at zero confidence
/// (degrees). Scales down linearly as confidence rises.
pub const HEADING_ERROR_SPAN_DEG: f64 = 45.0;

/// Half-span of the heading perturbation applied when no truth target of
/// the reported type occupies the scanned cell (degrees).
pub const HEADING_DRIFT_SPAN_DEG: f64 = 10.0;

// --- Sensing ---

/// Maximum sensor range in meters (footprint radius).
pub const SENSOR_MAX_RANGE_M: f64 = 1_500.0;

/// Footprint radius multiplier while a focused stare is active.
pub const FOCUSED_SCAN_RANGE_FRACTION: f64 = 0.4;

// --- Search ---

/// A search cell is abandoned once its uncertainty falls below this.
pub const SEARCH_RESELECT_UNCERTAINTY: f64 = 0.25;

/// A search cell is also abandoned after staring at it this long, so
/// coverage keeps circulating over cells whose uncertainty never drops.
pub const SEARCH_DWELL_SECS: f64 = 6.0;

// --- Monitor / orbit ---

/// Number of edges in the polygonal stand-off orbit approximation.
pub const ORBIT_EDGE_COUNT: usize = 8;

/// Orbit radius as a fraction of max sensor range.
pub const ORBIT_STANDOFF_FRACTION: f64 = 0.6;

/// Fraction of max sensor range at which an en-route monitor transitions
/// to orbiting.
pub const ORBIT_ENTRY_FRACTION: f64 = 0.8;

/// Fraction of max sensor range the believed target position may drift
/// from the orbit anchor before the orbit is re-routed.
pub const MONITOR_REROUTE_FRACTION: f64 = 0.5;

// --- Confirm / BDA ---

/// Focused-stare duration to confirm a monitored target (seconds).
pub const CONFIRM_STARE_SECS: f64 = 4.0;

/// Focused-stare duration for battle damage assessment (seconds).
pub const BDA_STARE_SECS: f64 = 4.0;

// --- Attack ---

/// Fraction of max sensor range at which an en-route attacker releases.
pub const WEAPON_RELEASE_FRACTION: f64 = 0.5;

// --- Targets ---

/// Mobile truth target cruise speed (m/s).
pub const TARGET_CRUISE_SPEED: f64 = 12.0;

// --- Agents ---

/// Agent cruise speed (m/s).
pub const AGENT_CRUISE_SPEED: f64 = 55.0;

/// Waypoint capture radius (meters).
pub const WAYPOINT_CAPTURE_M: f64 = 40.0;

/// Ticks between outbound belief snapshot broadcasts.
pub const COMMS_INTERVAL_TICKS: u64 = 120;
