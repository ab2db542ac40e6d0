//! Swarm engine — steps every agent through its per-tick sequence.
//!
//! Agents execute strictly sequentially inside one `tick()`, each running
//! its full unit of work: scan → auction → task execution → merge inbound
//! → enqueue outbound. Sequential stepping makes every task-ownership
//! read-modify-write trivially atomic; see `TaskStatus::submit_bid` for
//! the contract a concurrent scheduler would have to uphold.

use hecs::World;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::warn;

use skywatch_belief::merge::merge_snapshot;
use skywatch_belief::registry::{CorrelationPolicy, IdentityCorrelation};
use skywatch_belief::BeliefSnapshot;
use skywatch_core::constants::*;
use skywatch_core::enums::TaskKind;
use skywatch_core::events::SwarmEvent;
use skywatch_core::state::SwarmSnapshot;
use skywatch_core::types::{GridFrame, SimTime, TargetId};
use skywatch_sensing::scan::{simulate_scan, Detection, ScanConfig};
use skywatch_sensing::DetectionTables;
use skywatch_tasking::auction::{run_auction, AuctionContext, AuctionOutcome};
use skywatch_tasking::fsm::{
    evaluate, AgentTask, AttackLeg, Directive, MonitorLeg, TaskContext, TaskEffect,
};
use skywatch_tasking::EffectivenessTable;

use crate::agent::{Agent, PendingStrike};
use crate::systems;
use crate::transport::{MessageBus, SwarmMessage};
use crate::truth::{self, TruthView};
use crate::world_setup;

/// Configuration for starting a new swarm simulation.
#[derive(Debug, Clone)]
pub struct SwarmConfig {
    /// RNG seed for determinism. Same seed = same simulation.
    pub seed: u64,
    pub rows: usize,
    pub cols: usize,
    pub cell_size_m: f64,
    pub num_target_types: usize,
    pub agent_count: usize,
    pub target_count: usize,
    /// Ticks between outbound belief broadcasts per agent.
    pub comms_interval_ticks: u64,
    pub scan: ScanConfig,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            rows: DEFAULT_GRID_ROWS,
            cols: DEFAULT_GRID_COLS,
            cell_size_m: DEFAULT_CELL_SIZE_M,
            num_target_types: DEFAULT_TARGET_TYPES,
            agent_count: 4,
            target_count: 6,
            comms_interval_ticks: COMMS_INTERVAL_TICKS,
            scan: ScanConfig::default(),
        }
    }
}

/// The swarm engine. Owns the truth world and all agents.
pub struct SwarmEngine {
    frame: GridFrame,
    world: World,
    time: SimTime,
    rng: ChaCha8Rng,
    tables: DetectionTables,
    effectiveness: EffectivenessTable,
    correlation: Box<dyn CorrelationPolicy>,
    agents: Vec<Agent>,
    bus: MessageBus,
    events: Vec<SwarmEvent>,
    scan_config: ScanConfig,
    comms_interval_ticks: u64,
}

impl SwarmEngine {
    /// Create a new engine with the given config.
    pub fn new(config: SwarmConfig) -> Self {
        let frame = GridFrame::new(config.rows, config.cols, config.cell_size_m);
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut world = World::new();
        world_setup::spawn_targets(
            &mut world,
            &mut rng,
            &frame,
            config.num_target_types,
            config.target_count,
        );
        let agents = world_setup::build_agents(&frame, config.agent_count, config.num_target_types);
        let bus = MessageBus::new(config.agent_count);

        Self {
            frame,
            world,
            time: SimTime::default(),
            rng,
            tables: world_setup::default_detection_tables(config.num_target_types),
            effectiveness: world_setup::default_effectiveness(config.num_target_types),
            correlation: Box::new(IdentityCorrelation),
            agents,
            bus,
            events: Vec::new(),
            scan_config: config.scan,
            comms_interval_ticks: config.comms_interval_ticks.max(1),
        }
    }

    /// Replace the cross-agent correlation policy.
    pub fn set_correlation_policy(&mut self, policy: Box<dyn CorrelationPolicy>) {
        self.correlation = policy;
    }

    /// Advance the simulation by one tick and return the resulting
    /// snapshot. Every agent runs exactly once, in agent-ID order.
    pub fn tick(&mut self) -> SwarmSnapshot {
        let now = self.time.elapsed_secs;
        let tick = self.time.tick;

        for idx in 0..self.agents.len() {
            step_agent(
                &mut self.agents[idx],
                &mut self.world,
                &mut self.rng,
                &mut self.bus,
                &mut self.events,
                &self.tables,
                &self.effectiveness,
                self.correlation.as_ref(),
                &self.frame,
                &self.scan_config,
                now,
                tick,
                self.comms_interval_ticks,
            );
        }

        systems::movement::run(&mut self.world, &self.frame);
        self.time.advance();

        let events = std::mem::take(&mut self.events);
        systems::snapshot::build(&self.world, &self.agents, self.time, events)
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    pub fn frame(&self) -> GridFrame {
        self.frame
    }

    /// Read-only reference to the truth world.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn agent(&self, idx: usize) -> Option<&Agent> {
        self.agents.get(idx)
    }

    /// The quantized viewer encoding of one agent's grid belief.
    pub fn encode_agent_grid(&self, idx: usize) -> Option<Vec<u8>> {
        self.agents.get(idx).map(|a| a.grid.encode())
    }

    #[cfg(test)]
    pub fn agent_mut(&mut self, idx: usize) -> &mut Agent {
        &mut self.agents[idx]
    }

    #[cfg(test)]
    pub fn bus_mut(&mut self) -> &mut MessageBus {
        &mut self.bus
    }
}

/// Run one agent's full per-tick unit of work.
#[allow(clippy::too_many_arguments)]
fn step_agent(
    agent: &mut Agent,
    world: &mut World,
    rng: &mut ChaCha8Rng,
    bus: &mut MessageBus,
    events: &mut Vec<SwarmEvent>,
    tables: &DetectionTables,
    effectiveness: &EffectivenessTable,
    correlation: &dyn CorrelationPolicy,
    frame: &GridFrame,
    scan_config: &ScanConfig,
    now: f64,
    tick: u64,
    comms_interval: u64,
) {
    // 1. Perceive and scan.
    let detections = run_scans(agent, world, rng, tables, frame, scan_config, now, tick);

    // 2. Promote confident detections into the target registry.
    promote_tracks(agent, correlation, frame, events, &detections, now);

    // 3. Compete in the auction.
    run_agent_auction(agent, tables, effectiveness, frame, events, now);

    // 4. Drive the task state machine and its collaborators.
    execute_task(agent, world, rng, effectiveness, frame, events, now);

    // 5. Fold in whatever the swarm sent us.
    drain_and_merge(agent, bus);

    // 6. Share our belief on the comms schedule (staggered per agent).
    if (tick + agent.id.0 as u64) % comms_interval == 0 {
        let snapshot = BeliefSnapshot::capture(agent.id, now, &agent.grid, &agent.registry);
        bus.broadcast(agent.id, SwarmMessage::BeliefShare { snapshot });
    }

    // 7. Fly.
    agent.pather.advance(DT);
}

/// Run every carried sensor over its current footprint.
#[allow(clippy::too_many_arguments)]
fn run_scans(
    agent: &mut Agent,
    world: &World,
    rng: &mut ChaCha8Rng,
    tables: &DetectionTables,
    frame: &GridFrame,
    scan_config: &ScanConfig,
    now: f64,
    tick: u64,
) -> Vec<Detection> {
    // A focused stare narrows the footprint onto the stared-at target.
    let focus = match agent.task {
        AgentTask::Confirm { target, .. } | AgentTask::Bda { target, .. } => {
            agent.registry.get(target).map(|t| t.position)
        }
        _ => None,
    };

    let mut detections = Vec::new();
    for i in 0..agent.capabilities.sensors.len() {
        let fit = agent.capabilities.sensors[i];
        let (center, radius) = match focus {
            Some(point) => (point, fit.max_range_m * FOCUSED_SCAN_RANGE_FRACTION),
            None => (agent.pather.current_coordinate(), fit.max_range_m),
        };
        let cells = systems::perception::fov_cells(frame, center, radius);
        for cell in &cells {
            agent.coverage[cell.row * frame.cols + cell.col] = tick;
        }

        let view = TruthView {
            world,
            frame: *frame,
        };
        detections.extend(simulate_scan(
            scan_config,
            tables,
            &view,
            &mut agent.grid,
            fit.kind,
            agent.pather.current_heading_deg(),
            &cells,
            now,
            rng,
        ));
    }
    detections
}

/// Promote high-confidence cell detections into tracked targets. The
/// estimate written to the registry is belief-derived: cell center, grid
/// heading, normalized cell type distribution.
fn promote_tracks(
    agent: &mut Agent,
    correlation: &dyn CorrelationPolicy,
    frame: &GridFrame,
    events: &mut Vec<SwarmEvent>,
    detections: &[Detection],
    now: f64,
) {
    for det in detections {
        if det.posterior < TRACK_PROMOTE_PROB {
            continue;
        }
        let id = correlation.correlate(det.truth_id, det.cell, det.reported);
        let type_probs = normalized(agent.grid.probs_at(det.cell));
        let heading = agent.grid.heading(det.cell, det.reported.0 as usize);
        let position = frame.center_of(det.cell);

        let created = agent
            .registry
            .observe(id, position, heading, &type_probs, now);
        if created {
            events.push(SwarmEvent::ContactTracked {
                agent: agent.id,
                target: id,
            });
        }
    }
}

fn normalized(probs: &[f64]) -> Vec<f64> {
    let sum: f64 = probs.iter().sum();
    if sum <= 0.0 {
        return vec![1.0 / probs.len() as f64; probs.len()];
    }
    probs.iter().map(|p| p / sum).collect()
}

/// Run the auction and switch the local task machine on its outcome.
fn run_agent_auction(
    agent: &mut Agent,
    tables: &DetectionTables,
    effectiveness: &EffectivenessTable,
    frame: &GridFrame,
    events: &mut Vec<SwarmEvent>,
    now: f64,
) {
    let holding = agent.held_task();
    let outcome = {
        let ctx = AuctionContext {
            agent: agent.id,
            position: agent.pather.current_coordinate(),
            now,
            max_world_distance: frame.max_distance_m(),
            capabilities: &agent.capabilities,
            detection: tables,
            effectiveness,
        };
        run_auction(&ctx, &mut agent.registry, holding)
    };

    match outcome {
        AuctionOutcome::Holding { .. } => {}
        AuctionOutcome::Claimed {
            kind,
            target,
            score,
        } => {
            agent.task = match kind {
                TaskKind::Monitor => AgentTask::Monitor {
                    target,
                    leg: MonitorLeg::EnRoute,
                },
                TaskKind::Attack => AgentTask::Attack {
                    target,
                    leg: AttackLeg::EnRoute,
                },
            };
            events.push(SwarmEvent::TaskClaimed {
                agent: agent.id,
                target,
                kind,
                score,
            });
        }
        AuctionOutcome::Outbid { kind, target } => {
            clear_focus(agent);
            agent.task = AgentTask::default();
            events.push(SwarmEvent::TaskLost {
                agent: agent.id,
                target,
                kind,
            });
        }
        AuctionOutcome::AttackResolvedExternally { .. } => {
            clear_focus(agent);
            agent.task = AgentTask::default();
        }
        AuctionOutcome::Search => {
            // An idle Search outcome keeps the current search cell; a
            // Search outcome while nominally holding a task means the
            // task ended under us.
            if agent.task.target().is_some() {
                clear_focus(agent);
                agent.task = AgentTask::default();
            }
        }
    }
}

/// Drop the shared focused-scan flag if the local machine held one.
fn clear_focus(agent: &mut Agent) {
    if let AgentTask::Confirm { target, .. } | AgentTask::Bda { target, .. } = agent.task {
        if let Some(t) = agent.registry.get_mut(target) {
            t.focused_scan = false;
        }
    }
}

/// Evaluate the task state machine, apply its directive to the pather,
/// and apply its shared-state effects.
fn execute_task(
    agent: &mut Agent,
    world: &mut World,
    rng: &mut ChaCha8Rng,
    effectiveness: &EffectivenessTable,
    frame: &GridFrame,
    events: &mut Vec<SwarmEvent>,
    now: f64,
) {
    let update = {
        let ctx = TaskContext {
            position: agent.pather.current_coordinate(),
            heading_deg: agent.pather.current_heading_deg(),
            max_sensor_range: agent.capabilities.max_sensor_range(),
            dt: DT,
            frame,
            grid: &agent.grid,
            registry: &agent.registry,
            coverage: &agent.coverage,
        };
        evaluate(&ctx, &agent.task)
    };

    agent.task = update.task;

    match update.directive {
        Some(Directive::RouteTo(dest)) => agent.pather.route_to(dest),
        Some(Directive::Orbit {
            circle,
            edges,
            clockwise,
        }) => agent.pather.follow_orbit(&circle, edges, clockwise),
        // Staring is sensor pointing, not flight: the focused footprint
        // in run_scans does the pointing, the route stands.
        Some(Directive::Stare(_)) | None => {}
    }

    for effect in update.effects {
        apply_effect(agent, world, rng, effectiveness, events, effect, now);
    }
}

fn apply_effect(
    agent: &mut Agent,
    world: &mut World,
    rng: &mut ChaCha8Rng,
    effectiveness: &EffectivenessTable,
    events: &mut Vec<SwarmEvent>,
    effect: TaskEffect,
    now: f64,
) {
    match effect {
        TaskEffect::SetFocusedScan { target, on } => {
            if let Some(t) = agent.registry.get_mut(target) {
                t.focused_scan = on;
            }
        }
        TaskEffect::MonitorArrived { target } => {
            if let Some(t) = agent.registry.get_mut(target) {
                if t.monitor.owner == Some(agent.id) {
                    t.monitor.mark_performing(now);
                }
            }
        }
        TaskEffect::AttackArrived { target } => {
            if let Some(t) = agent.registry.get_mut(target) {
                if t.attack.owner == Some(agent.id) {
                    t.attack.mark_performing(now);
                }
            }
        }
        TaskEffect::OpenAttack { target } => {
            if let Some(t) = agent.registry.get_mut(target) {
                t.attack.ensure_open(now);
                t.monitor.complete(now);
            }
        }
        TaskEffect::ReleaseWeapon { target } => {
            release_weapon(agent, world, rng, effectiveness, events, target);
        }
        TaskEffect::BdaComplete { target } => {
            finalize_strike(agent, events, target, now);
        }
    }
}

/// Expend a round and resolve the strike against the truth world. The
/// outcome is held as a pending strike until the BDA stare concludes.
fn release_weapon(
    agent: &mut Agent,
    world: &mut World,
    rng: &mut ChaCha8Rng,
    effectiveness: &EffectivenessTable,
    events: &mut Vec<SwarmEvent>,
    target: TargetId,
) {
    let Some(ttype) = agent.registry.get(target).map(|t| t.most_likely_type()) else {
        return;
    };
    let Some((station, p)) = agent.capabilities.best_weapon(effectiveness, ttype) else {
        return;
    };
    agent.capabilities.expend_round(station);

    let killed = rng.gen_bool(p.clamp(0.0, 1.0));
    if killed {
        truth::mark_destroyed(world, target);
    }
    agent.pending_strike = Some(PendingStrike { target, killed });
    events.push(SwarmEvent::AttackResolved {
        target,
        destroyed: killed,
    });
}

/// BDA concluded: commit the assessment to the shared task record. A kill
/// completes the attack and clears the owner (the signal laggard owners
/// read as "successfully attacked"); a miss reopens the task for
/// re-attack. A richer assessment policy would slot in here.
fn finalize_strike(agent: &mut Agent, events: &mut Vec<SwarmEvent>, target: TargetId, now: f64) {
    let Some(strike) = agent.pending_strike.take() else {
        return;
    };
    if strike.target != target {
        return;
    }
    let Some(t) = agent.registry.get_mut(target) else {
        return;
    };
    if strike.killed {
        t.destroyed = true;
        t.attack.complete(now);
        events.push(SwarmEvent::TargetDestroyed { target });
    } else {
        t.attack.release(now);
    }
}

/// Drain the inbound queue in delivery order, merging belief shares and
/// dropping anything the belief layer has no handler for.
fn drain_and_merge(agent: &mut Agent, bus: &mut MessageBus) {
    for message in bus.drain_inbound(agent.id) {
        match message {
            SwarmMessage::BeliefShare { snapshot } => {
                merge_snapshot(&mut agent.grid, &mut agent.registry, &snapshot);
            }
            SwarmMessage::Telemetry { agent_id, .. } => {
                warn!(
                    receiver = agent.id.0,
                    sender = agent_id.0,
                    "dropping unhandled telemetry message"
                );
            }
        }
    }
}
