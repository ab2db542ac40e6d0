//! World and swarm construction: default sensor/weapon tables, truth
//! target spawning, and agent loadouts.

use hecs::World;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use skywatch_core::constants::{SENSOR_MAX_RANGE_M, TARGET_CRUISE_SPEED};
use skywatch_core::types::{AgentId, Coordinate, GridFrame, SensorType, TargetId, TargetType, WeaponType};
use skywatch_sensing::tables::TableError;
use skywatch_sensing::DetectionTables;
use skywatch_tasking::capabilities::EffectivenessError;
use skywatch_tasking::{AgentCapabilities, EffectivenessTable, SensorFit, WeaponStation};

use crate::agent::Agent;
use crate::pathing::WaypointPather;
use crate::truth::{TruthTarget, TruthVelocity};

/// Electro-optical sensor carried by every agent.
pub const EO_SENSOR: SensorType = SensorType(0);
/// Infrared sensor carried by odd-numbered agents.
pub const IR_SENSOR: SensorType = SensorType(1);
/// Gun pod, effective against even target types.
pub const GUN: WeaponType = WeaponType(0);
/// Rocket pod, effective against odd target types.
pub const ROCKET: WeaponType = WeaponType(1);

/// Rounds loaded per weapon station.
const STATION_ROUNDS: u32 = 6;

// Per-type table entries, cycled when more types are configured.
const EO_DETECTION: [f64; 4] = [0.9, 0.8, 0.85, 0.75];
const EO_HEADING_CONF: [f64; 4] = [0.7, 0.55, 0.6, 0.5];
const IR_DETECTION: [f64; 4] = [0.7, 0.75, 0.65, 0.7];

fn build_detection_tables(num_types: usize) -> Result<DetectionTables, TableError> {
    let mut builder = DetectionTables::builder(num_types);
    for t in 0..num_types {
        let ttype = TargetType(t as u16);
        builder = builder.detection(EO_SENSOR, ttype, EO_DETECTION[t % 4])?;
        builder = builder.heading_confidence(EO_SENSOR, ttype, EO_HEADING_CONF[t % 4])?;
        builder = builder.detection(IR_SENSOR, ttype, IR_DETECTION[t % 4])?;
        builder = builder.heading_confidence(IR_SENSOR, ttype, 0.45)?;
        // Each type can be mistaken for its successor.
        if t + 1 < num_types {
            let next = TargetType((t + 1) as u16);
            builder = builder.misclassify(EO_SENSOR, ttype, next, 0.06)?;
            builder = builder.misclassify(IR_SENSOR, ttype, next, 0.1)?;
        }
    }
    Ok(builder.build())
}

/// Default detection tables for the configured number of target types.
pub fn default_detection_tables(num_types: usize) -> DetectionTables {
    build_detection_tables(num_types).expect("default sensor tables use literal in-range entries")
}

fn build_effectiveness(num_types: usize) -> Result<EffectivenessTable, EffectivenessError> {
    let mut table = EffectivenessTable::new();
    for t in 0..num_types {
        let ttype = TargetType(t as u16);
        if t % 2 == 0 {
            table.set(GUN, ttype, 0.95)?;
        } else {
            table.set(ROCKET, ttype, 0.9)?;
        }
    }
    Ok(table)
}

/// Default weapon effectiveness table. Guns and rockets split the type
/// space, so a single loadout cannot attack everything.
pub fn default_effectiveness(num_types: usize) -> EffectivenessTable {
    build_effectiveness(num_types).expect("default effectiveness uses literal in-range entries")
}

/// Spawn the truth targets: alternating mobile and static, types cycling
/// through the configured range.
pub fn spawn_targets(
    world: &mut World,
    rng: &mut ChaCha8Rng,
    frame: &GridFrame,
    num_types: usize,
    count: usize,
) {
    for i in 0..count {
        let position = Coordinate::new(
            rng.gen_range(0.1..0.9) * frame.width_m(),
            rng.gen_range(0.1..0.9) * frame.height_m(),
        );
        let velocity = if i % 2 == 0 {
            let heading = rng.gen_range(0.0..std::f64::consts::TAU);
            TruthVelocity {
                x: TARGET_CRUISE_SPEED * heading.sin(),
                y: TARGET_CRUISE_SPEED * heading.cos(),
            }
        } else {
            TruthVelocity::default()
        };
        world.spawn((
            TruthTarget {
                id: TargetId(i as u32),
                ttype: TargetType((i % num_types) as u16),
                destroyed: false,
            },
            position,
            velocity,
        ));
    }
}

/// Build the swarm: agents spread along the southern edge, loadouts
/// alternating between gun and rocket carriers.
pub fn build_agents(frame: &GridFrame, count: usize, num_types: usize) -> Vec<Agent> {
    (0..count)
        .map(|i| {
            let mut sensors = vec![SensorFit {
                kind: EO_SENSOR,
                max_range_m: SENSOR_MAX_RANGE_M,
            }];
            if i % 2 == 1 {
                sensors.push(SensorFit {
                    kind: IR_SENSOR,
                    max_range_m: SENSOR_MAX_RANGE_M * 0.8,
                });
            }
            let weapons = vec![WeaponStation {
                kind: if i % 2 == 0 { GUN } else { ROCKET },
                remaining: STATION_ROUNDS,
            }];

            let start = Coordinate::new(
                frame.width_m() * (i + 1) as f64 / (count + 1) as f64,
                frame.cell_size_m * 0.5,
            );

            Agent {
                id: AgentId(i as u32),
                capabilities: AgentCapabilities { sensors, weapons },
                grid: skywatch_belief::GridBelief::new(frame.rows, frame.cols, num_types),
                registry: skywatch_belief::TargetRegistry::new(),
                task: skywatch_tasking::AgentTask::default(),
                pather: WaypointPather::new(
                    start,
                    0.0,
                    skywatch_core::constants::AGENT_CRUISE_SPEED,
                ),
                coverage: vec![0; frame.rows * frame.cols],
                pending_strike: None,
            }
        })
        .collect()
}
