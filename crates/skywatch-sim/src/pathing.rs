//! Waypoint pathing collaborator.
//!
//! Deliberately simple flight: constant cruise speed straight toward the
//! next waypoint, instant heading changes. Dubins curves and real flight
//! physics live outside this repository; the engine only consumes
//! `route_to` / `follow_orbit` / `current_coordinate` / `current_heading`.

use std::collections::VecDeque;

use skywatch_core::constants::WAYPOINT_CAPTURE_M;
use skywatch_core::types::Coordinate;
use skywatch_tasking::fsm::OrbitCircle;

/// Generate the N-sided polygonal approximation of an orbit circle,
/// starting from the vertex nearest `entry` and winding in the requested
/// direction.
pub fn generate_orbit(
    circle: &OrbitCircle,
    edges: usize,
    clockwise: bool,
    entry: Coordinate,
) -> Vec<Coordinate> {
    debug_assert!(edges >= 3, "an orbit polygon needs at least 3 edges");
    let entry_angle = (entry.y - circle.center.y).atan2(entry.x - circle.center.x);
    let step = std::f64::consts::TAU / edges as f64;
    let signed_step = if clockwise { -step } else { step };

    (0..edges)
        .map(|k| {
            let angle = entry_angle + signed_step * k as f64;
            Coordinate::new(
                circle.center.x + circle.radius * angle.cos(),
                circle.center.y + circle.radius * angle.sin(),
            )
        })
        .collect()
}

/// Simple waypoint-following pather.
#[derive(Debug, Clone)]
pub struct WaypointPather {
    position: Coordinate,
    heading_deg: f64,
    speed_mps: f64,
    route: VecDeque<Coordinate>,
    /// Orbits loop their waypoint ring forever; point routes do not.
    looping: bool,
}

impl WaypointPather {
    pub fn new(start: Coordinate, heading_deg: f64, speed_mps: f64) -> Self {
        Self {
            position: start,
            heading_deg: heading_deg.rem_euclid(360.0),
            speed_mps,
            route: VecDeque::new(),
            looping: false,
        }
    }

    pub fn current_coordinate(&self) -> Coordinate {
        self.position
    }

    pub fn current_heading_deg(&self) -> f64 {
        self.heading_deg
    }

    /// Replace the route with a single destination.
    pub fn route_to(&mut self, destination: Coordinate) {
        self.route.clear();
        self.route.push_back(destination);
        self.looping = false;
    }

    /// Replace the route with a looping orbit polygon.
    pub fn follow_orbit(&mut self, circle: &OrbitCircle, edges: usize, clockwise: bool) {
        self.route.clear();
        self.route
            .extend(generate_orbit(circle, edges, clockwise, self.position));
        self.looping = true;
    }

    /// Advance flight by `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        let Some(&next) = self.route.front() else {
            return;
        };

        let distance = self.position.distance_to(&next);
        if distance > 1e-6 {
            self.heading_deg = self.position.bearing_to_deg(&next);
        }

        let travel = self.speed_mps * dt;
        if distance <= travel.max(WAYPOINT_CAPTURE_M) {
            self.position = next;
            self.route.pop_front();
            if self.looping {
                self.route.push_back(next);
            }
            return;
        }

        let frac = travel / distance;
        self.position = Coordinate::new(
            self.position.x + (next.x - self.position.x) * frac,
            self.position.y + (next.y - self.position.y) * frac,
        );
    }
}
