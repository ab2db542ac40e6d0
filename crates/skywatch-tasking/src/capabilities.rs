//! Agent capability model: sensor fits, weapon stations, and the weapon
//! effectiveness table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use skywatch_core::types::{SensorType, TargetType, WeaponType};
use skywatch_sensing::DetectionTables;

/// Effectiveness table construction failures.
#[derive(Debug, Error, PartialEq)]
pub enum EffectivenessError {
    #[error("probability {value} outside [0, 1]")]
    ProbabilityRange { value: f64 },
    #[error("duplicate entry for weapon {weapon:?} / target type {ttype:?}")]
    DuplicateEntry { weapon: WeaponType, ttype: TargetType },
}

/// Probability a weapon kills a target of a given type. Unconfigured
/// pairs are `None` — the weapon is ineffective against that type, and the
/// auction must treat it as "no bid", never as probability zero.
#[derive(Debug, Clone, Default)]
pub struct EffectivenessTable {
    entries: HashMap<(WeaponType, TargetType), f64>,
}

impl EffectivenessTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(
        &mut self,
        weapon: WeaponType,
        ttype: TargetType,
        prob: f64,
    ) -> Result<(), EffectivenessError> {
        if !(0.0..=1.0).contains(&prob) {
            return Err(EffectivenessError::ProbabilityRange { value: prob });
        }
        if self.entries.insert((weapon, ttype), prob).is_some() {
            return Err(EffectivenessError::DuplicateEntry { weapon, ttype });
        }
        Ok(())
    }

    pub fn effectiveness(&self, weapon: WeaponType, ttype: TargetType) -> Option<f64> {
        self.entries.get(&(weapon, ttype)).copied()
    }
}

/// One sensor carried by an agent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SensorFit {
    pub kind: SensorType,
    /// Footprint radius in meters.
    pub max_range_m: f64,
}

/// One weapon station with its remaining rounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeaponStation {
    pub kind: WeaponType,
    pub remaining: u32,
}

/// What one agent can sense and shoot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentCapabilities {
    pub sensors: Vec<SensorFit>,
    pub weapons: Vec<WeaponStation>,
}

impl AgentCapabilities {
    /// Longest sensor footprint radius across fits (0 with no sensors).
    pub fn max_sensor_range(&self) -> f64 {
        self.sensors
            .iter()
            .map(|s| s.max_range_m)
            .fold(0.0, f64::max)
    }

    /// Best detection probability any carried sensor offers against a
    /// target type. `None` when no sensor has data for the type.
    pub fn best_sensor_prob(&self, tables: &DetectionTables, ttype: TargetType) -> Option<f64> {
        self.sensors
            .iter()
            .filter_map(|s| tables.detection_prob(s.kind, ttype))
            .fold(None, |best, p| match best {
                Some(b) if b >= p => Some(b),
                _ => Some(p),
            })
    }

    /// Best-effectiveness armed station against a target type: returns
    /// (station index, kill probability). Stations with no remaining
    /// rounds or no effectiveness data do not qualify; ties keep the
    /// first station.
    pub fn best_weapon(
        &self,
        table: &EffectivenessTable,
        ttype: TargetType,
    ) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, station) in self.weapons.iter().enumerate() {
            if station.remaining == 0 {
                continue;
            }
            let Some(p) = table.effectiveness(station.kind, ttype) else {
                continue;
            };
            if best.is_none_or(|(_, bp)| p > bp) {
                best = Some((idx, p));
            }
        }
        best
    }

    /// Expend one round from a station. Returns false if it was empty.
    pub fn expend_round(&mut self, station: usize) -> bool {
        match self.weapons.get_mut(station) {
            Some(s) if s.remaining > 0 => {
                s.remaining -= 1;
                true
            }
            _ => false,
        }
    }

    /// Total rounds remaining across all stations.
    pub fn total_rounds(&self) -> u32 {
        self.weapons.iter().map(|s| s.remaining).sum()
    }
}
