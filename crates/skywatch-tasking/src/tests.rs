#[cfg(test)]
mod tests {
    use skywatch_belief::registry::{TargetBelief, TargetRegistry};
    use skywatch_belief::GridBelief;
    use skywatch_core::constants::*;
    use skywatch_core::enums::{TaskKind, TaskState};
    use skywatch_core::types::*;
    use skywatch_sensing::DetectionTables;

    use crate::auction::{attack_bid, monitor_bid, run_auction, AuctionContext, AuctionOutcome};
    use crate::capabilities::{AgentCapabilities, EffectivenessTable, SensorFit, WeaponStation};
    use crate::fsm::{
        evaluate, orbit_direction_clockwise, select_search_cell, AgentTask, AttackLeg, Directive,
        MonitorLeg, TaskContext, TaskEffect,
    };

    const EO: SensorType = SensorType(0);
    const GUN: WeaponType = WeaponType(0);
    const TYPE_A: TargetType = TargetType(0);
    const TYPE_B: TargetType = TargetType(1);

    fn detection_tables() -> DetectionTables {
        DetectionTables::builder(2)
            .detection(EO, TYPE_A, 0.9)
            .unwrap()
            .detection(EO, TYPE_B, 0.6)
            .unwrap()
            .build()
    }

    fn effectiveness() -> EffectivenessTable {
        let mut table = EffectivenessTable::new();
        table.set(GUN, TYPE_A, 0.8).unwrap();
        table
    }

    fn full_caps() -> AgentCapabilities {
        AgentCapabilities {
            sensors: vec![SensorFit {
                kind: EO,
                max_range_m: 1_000.0,
            }],
            weapons: vec![WeaponStation {
                kind: GUN,
                remaining: 2,
            }],
        }
    }

    fn ctx<'a>(
        agent: u32,
        position: Coordinate,
        now: f64,
        caps: &'a AgentCapabilities,
        detection: &'a DetectionTables,
        eff: &'a EffectivenessTable,
    ) -> AuctionContext<'a> {
        AuctionContext {
            agent: AgentId(agent),
            position,
            now,
            max_world_distance: 10_000.0,
            capabilities: caps,
            detection,
            effectiveness: eff,
        }
    }

    fn tracked_target(id: u32, x: f64, y: f64) -> TargetBelief {
        TargetBelief::new(
            TargetId(id),
            Coordinate::new(x, y),
            0.0,
            vec![0.9, 0.1],
            1.0,
        )
    }

    // ---- Bids ----

    #[test]
    fn test_monitor_bid_formula() {
        let caps = full_caps();
        let detection = detection_tables();
        let eff = effectiveness();
        let c = ctx(1, Coordinate::new(0.0, 0.0), 1.0, &caps, &detection, &eff);
        let target = tracked_target(1, 3_000.0, 4_000.0);

        // distance 5000, best sensor prob 0.9 against type A
        let bid = monitor_bid(&c, &target).unwrap();
        assert!((bid - (10_000.0 - 5_000.0 + 10_000.0 * 0.9)).abs() < 1e-9);
    }

    #[test]
    fn test_attack_bid_formula() {
        let caps = full_caps();
        let detection = detection_tables();
        let eff = effectiveness();
        let c = ctx(1, Coordinate::new(0.0, 0.0), 1.0, &caps, &detection, &eff);
        let target = tracked_target(1, 3_000.0, 4_000.0);

        let bid = attack_bid(&c, &target).unwrap();
        assert!((bid - (10_000.0 - 5_000.0 + 10_000.0 * 0.8)).abs() < 1e-9);
    }

    #[test]
    fn test_no_capability_means_no_bid() {
        let detection = detection_tables();
        let eff = effectiveness();

        // No sensor data for type B's best type, no weapon at all.
        let bare = AgentCapabilities::default();
        let c = ctx(1, Coordinate::new(0.0, 0.0), 1.0, &bare, &detection, &eff);
        let target = tracked_target(1, 100.0, 100.0);
        assert_eq!(monitor_bid(&c, &target), None);
        assert_eq!(attack_bid(&c, &target), None);

        // A weapon with zero rounds left does not support a bid either.
        let empty_gun = AgentCapabilities {
            sensors: vec![],
            weapons: vec![WeaponStation {
                kind: GUN,
                remaining: 0,
            }],
        };
        let c = ctx(1, Coordinate::new(0.0, 0.0), 1.0, &empty_gun, &detection, &eff);
        assert_eq!(attack_bid(&c, &target), None);
    }

    // ---- Auction: claiming ----

    #[test]
    fn test_idle_agent_claims_open_monitor() {
        let caps = full_caps();
        let detection = detection_tables();
        let eff = effectiveness();
        let mut registry = TargetRegistry::new();
        registry.insert(tracked_target(1, 500.0, 0.0));

        let c = ctx(7, Coordinate::new(0.0, 0.0), 2.0, &caps, &detection, &eff);
        let outcome = run_auction(&c, &mut registry, None);

        match outcome {
            AuctionOutcome::Claimed {
                kind: TaskKind::Monitor,
                target,
                score,
            } => {
                assert_eq!(target, TargetId(1));
                assert!(score > 0.0);
            }
            other => panic!("expected monitor claim, got {other:?}"),
        }
        let status = &registry.get(TargetId(1)).unwrap().monitor;
        assert_eq!(status.owner, Some(AgentId(7)));
        assert_eq!(status.state, TaskState::EnRoute);
        assert_eq!(status.updated, 2.0);
    }

    #[test]
    fn test_higher_bid_takes_over_and_loser_reverts() {
        // Agent A claims Monitor; closer agent B out-bids; A's next tick
        // sees owner=B with a score above its own and reverts to Search.
        let caps = full_caps();
        let detection = detection_tables();
        let eff = effectiveness();
        let mut registry = TargetRegistry::new();
        registry.insert(tracked_target(1, 4_000.0, 0.0));

        let far = Coordinate::new(0.0, 0.0);
        let near = Coordinate::new(3_500.0, 0.0);

        let a = ctx(1, far, 2.0, &caps, &detection, &eff);
        assert!(matches!(
            run_auction(&a, &mut registry, None),
            AuctionOutcome::Claimed { .. }
        ));
        let score_a = registry.get(TargetId(1)).unwrap().monitor.score;

        let b = ctx(2, near, 3.0, &caps, &detection, &eff);
        match run_auction(&b, &mut registry, None) {
            AuctionOutcome::Claimed { score, .. } => assert!(score > score_a),
            other => panic!("expected takeover, got {other:?}"),
        }
        assert_eq!(
            registry.get(TargetId(1)).unwrap().monitor.owner,
            Some(AgentId(2))
        );

        // A still believes it holds the task; the re-bid path discovers
        // the new owner.
        let a = ctx(1, far, 4.0, &caps, &detection, &eff);
        let outcome = run_auction(&a, &mut registry, Some((TaskKind::Monitor, TargetId(1))));
        assert_eq!(
            outcome,
            AuctionOutcome::Outbid {
                kind: TaskKind::Monitor,
                target: TargetId(1)
            }
        );
        // B's record is untouched by A's loss.
        assert_eq!(
            registry.get(TargetId(1)).unwrap().monitor.owner,
            Some(AgentId(2))
        );
    }

    #[test]
    fn test_equal_bid_keeps_incumbent() {
        let caps = full_caps();
        let detection = detection_tables();
        let eff = effectiveness();
        let mut registry = TargetRegistry::new();
        registry.insert(tracked_target(1, 1_000.0, 0.0));

        // Two agents at the same distance with the same capabilities
        // compute identical bids.
        let same_spot = Coordinate::new(0.0, 0.0);
        let a = ctx(1, same_spot, 2.0, &caps, &detection, &eff);
        run_auction(&a, &mut registry, None);

        let b = ctx(2, same_spot, 3.0, &caps, &detection, &eff);
        let outcome = run_auction(&b, &mut registry, None);
        assert_eq!(outcome, AuctionOutcome::Search, "tie must not take over");
        assert_eq!(
            registry.get(TargetId(1)).unwrap().monitor.owner,
            Some(AgentId(1))
        );
    }

    #[test]
    fn test_attack_precedence_over_monitor() {
        let caps = full_caps();
        let detection = detection_tables();
        let eff = effectiveness();
        let mut registry = TargetRegistry::new();
        let mut target = tracked_target(1, 500.0, 0.0);
        target.attack.ensure_open(1.0);
        registry.insert(target);

        let c = ctx(3, Coordinate::new(0.0, 0.0), 2.0, &caps, &detection, &eff);
        match run_auction(&c, &mut registry, None) {
            AuctionOutcome::Claimed {
                kind: TaskKind::Attack,
                ..
            } => {}
            other => panic!("attack must take precedence, got {other:?}"),
        }
        // The monitor bid was suppressed this tick.
        let t = registry.get(TargetId(1)).unwrap();
        assert_eq!(t.monitor.owner, None);
        assert_eq!(t.attack.owner, Some(AgentId(3)));
        assert_eq!(t.attack.state, TaskState::EnRoute);
    }

    #[test]
    fn test_attack_not_biddable_until_open() {
        let caps = full_caps();
        let detection = detection_tables();
        let eff = effectiveness();
        let mut registry = TargetRegistry::new();
        // Attack still NoTask: only the monitor task is up for bids.
        registry.insert(tracked_target(1, 500.0, 0.0));

        let c = ctx(3, Coordinate::new(0.0, 0.0), 2.0, &caps, &detection, &eff);
        match run_auction(&c, &mut registry, None) {
            AuctionOutcome::Claimed {
                kind: TaskKind::Monitor,
                ..
            } => {}
            other => panic!("expected monitor claim, got {other:?}"),
        }
    }

    #[test]
    fn test_attack_performing_never_rebid() {
        let caps = full_caps();
        let detection = detection_tables();
        let eff = effectiveness();
        let mut registry = TargetRegistry::new();
        let mut target = tracked_target(1, 500.0, 0.0);
        target.attack.ensure_open(1.0);
        target.attack.submit_bid(AgentId(9), 1.0, 1.0);
        target.attack.mark_performing(1.5);
        // Monitor complete so no monitor bid competes.
        target.monitor.complete(1.5);
        registry.insert(target);

        let c = ctx(3, Coordinate::new(0.0, 0.0), 2.0, &caps, &detection, &eff);
        assert_eq!(run_auction(&c, &mut registry, None), AuctionOutcome::Search);
        assert_eq!(
            registry.get(TargetId(1)).unwrap().attack.owner,
            Some(AgentId(9))
        );
    }

    #[test]
    fn test_destroyed_targets_ignored() {
        let caps = full_caps();
        let detection = detection_tables();
        let eff = effectiveness();
        let mut registry = TargetRegistry::new();
        let mut target = tracked_target(1, 500.0, 0.0);
        target.destroyed = true;
        registry.insert(target);

        let c = ctx(3, Coordinate::new(0.0, 0.0), 2.0, &caps, &detection, &eff);
        assert_eq!(run_auction(&c, &mut registry, None), AuctionOutcome::Search);
    }

    // ---- Auction: holding ----

    #[test]
    fn test_own_rebid_updates_in_place_and_never_regresses_timestamp() {
        let caps = full_caps();
        let detection = detection_tables();
        let eff = effectiveness();
        let mut registry = TargetRegistry::new();
        registry.insert(tracked_target(1, 500.0, 0.0));

        let c = ctx(1, Coordinate::new(0.0, 0.0), 2.0, &caps, &detection, &eff);
        run_auction(&c, &mut registry, None);

        let mut last_updated = registry.get(TargetId(1)).unwrap().monitor.updated;
        for step in 1..5 {
            let now = 2.0 + step as f64;
            let c = ctx(1, Coordinate::new(0.0, 0.0), now, &caps, &detection, &eff);
            let outcome = run_auction(&c, &mut registry, Some((TaskKind::Monitor, TargetId(1))));
            assert_eq!(
                outcome,
                AuctionOutcome::Holding {
                    kind: TaskKind::Monitor,
                    target: TargetId(1)
                }
            );
            let status = &registry.get(TargetId(1)).unwrap().monitor;
            assert_eq!(status.owner, Some(AgentId(1)));
            assert!(status.updated > last_updated);
            last_updated = status.updated;
        }
    }

    #[test]
    fn test_cleared_attack_owner_means_resolved() {
        let caps = full_caps();
        let detection = detection_tables();
        let eff = effectiveness();
        let mut registry = TargetRegistry::new();
        let mut target = tracked_target(1, 500.0, 0.0);
        target.attack.ensure_open(1.0);
        target.attack.submit_bid(AgentId(1), 50.0, 1.0);
        // Ownership cleared externally between ticks; target still live.
        target.attack.release(2.0);
        registry.insert(target);

        let c = ctx(1, Coordinate::new(0.0, 0.0), 3.0, &caps, &detection, &eff);
        let outcome = run_auction(&c, &mut registry, Some((TaskKind::Attack, TargetId(1))));
        assert_eq!(
            outcome,
            AuctionOutcome::AttackResolvedExternally {
                target: TargetId(1)
            }
        );
        // The previous owner must not have re-claimed.
        assert_eq!(registry.get(TargetId(1)).unwrap().attack.owner, None);
    }

    #[test]
    fn test_holder_with_expended_weapons_releases_attack() {
        let detection = detection_tables();
        let eff = effectiveness();
        let mut caps = full_caps();
        let mut registry = TargetRegistry::new();
        let mut target = tracked_target(1, 500.0, 0.0);
        target.attack.ensure_open(1.0);
        target.attack.submit_bid(AgentId(1), 50.0, 1.0);
        registry.insert(target);

        caps.weapons[0].remaining = 0;
        let c = ctx(1, Coordinate::new(0.0, 0.0), 3.0, &caps, &detection, &eff);
        let outcome = run_auction(&c, &mut registry, Some((TaskKind::Attack, TargetId(1))));
        assert_eq!(outcome, AuctionOutcome::Search);

        let status = &registry.get(TargetId(1)).unwrap().attack;
        assert_eq!(status.owner, None, "incapable holder must stand down");
        assert_eq!(status.state, TaskState::Open);
    }

    #[test]
    fn test_single_owner_invariant_across_contention() {
        let caps = full_caps();
        let detection = detection_tables();
        let eff = effectiveness();
        let mut registry = TargetRegistry::new();
        registry.insert(tracked_target(1, 5_000.0, 5_000.0));

        // Several agents at different ranges all bid over several ticks.
        for round in 0..4u32 {
            for agent in 0..5u32 {
                let pos = Coordinate::new(1_000.0 * agent as f64, 500.0 * round as f64);
                let c = ctx(agent, pos, round as f64, &caps, &detection, &eff);
                run_auction(&c, &mut registry, None);
                let status = &registry.get(TargetId(1)).unwrap().monitor;
                // Ownership is a single scalar field; it is either empty
                // or exactly one agent.
                assert!(status.owner.is_some());
            }
        }
    }

    // ---- Search FSM ----

    fn frame() -> GridFrame {
        GridFrame::new(10, 10, 100.0)
    }

    fn task_ctx<'a>(
        position: Coordinate,
        heading: f64,
        grid: &'a GridBelief,
        registry: &'a TargetRegistry,
        frame: &'a GridFrame,
        coverage: &'a [u64],
    ) -> TaskContext<'a> {
        TaskContext {
            position,
            heading_deg: heading,
            max_sensor_range: 1_000.0,
            dt: DT,
            frame,
            grid,
            registry,
            coverage,
        }
    }

    #[test]
    fn test_search_selects_most_uncertain_cell() {
        let mut grid = GridBelief::new(10, 10, 2);
        // Make every cell confident except (4, 6).
        for row in 0..10 {
            for col in 0..10 {
                if row == 4 && col == 6 {
                    continue;
                }
                grid.record_estimate(GridCell::new(row, col), 0, 0.9, 0.0, 1.0);
            }
        }
        let registry = TargetRegistry::new();
        let f = frame();
        let coverage = vec![0u64; 100];
        let ctx = task_ctx(
            Coordinate::new(0.0, 0.0),
            0.0,
            &grid,
            &registry,
            &f,
            &coverage,
        );

        let update = evaluate(&ctx, &AgentTask::default());
        match update.task {
            AgentTask::Search { cell, .. } => assert_eq!(cell, Some(GridCell::new(4, 6))),
            other => panic!("expected search, got {other:?}"),
        }
        assert_eq!(
            update.directive,
            Some(Directive::RouteTo(f.center_of(GridCell::new(4, 6))))
        );
    }

    #[test]
    fn test_search_reselects_when_uncertainty_drops() {
        let mut grid = GridBelief::new(10, 10, 2);
        let current = GridCell::new(2, 2);
        // Current cell now confidently known.
        grid.record_estimate(current, 0, 0.9, 0.0, 1.0);
        let registry = TargetRegistry::new();
        let f = frame();
        let coverage = vec![0u64; 100];
        let ctx = task_ctx(
            Coordinate::new(0.0, 0.0),
            0.0,
            &grid,
            &registry,
            &f,
            &coverage,
        );

        let update = evaluate(
            &ctx,
            &AgentTask::Search {
                cell: Some(current),
                dwell_secs: 0.0,
            },
        );
        match update.task {
            AgentTask::Search { cell, .. } => {
                assert_ne!(cell, Some(current), "confident cell must be abandoned")
            }
            other => panic!("expected search, got {other:?}"),
        }
    }

    #[test]
    fn test_search_staleness_breaks_ties() {
        let grid = GridBelief::new(2, 2, 1);
        let mut coverage = vec![10u64; 4];
        // Cell (1, 0) is the least recently scanned.
        coverage[2] = 1;
        assert_eq!(select_search_cell(&grid, &coverage), GridCell::new(1, 0));
    }

    #[test]
    fn test_search_dwell_expiry_reselects() {
        let grid = GridBelief::new(2, 2, 1);
        let registry = TargetRegistry::new();
        let f = GridFrame::new(2, 2, 100.0);
        let mut coverage = vec![0u64; 4];
        let cell = GridCell::new(0, 0);
        coverage[0] = 50; // current cell was just scanned
        let ctx = task_ctx(
            f.center_of(cell),
            0.0,
            &grid,
            &registry,
            &f,
            &coverage,
        );

        let update = evaluate(
            &ctx,
            &AgentTask::Search {
                cell: Some(cell),
                dwell_secs: SEARCH_DWELL_SECS,
            },
        );
        match update.task {
            AgentTask::Search { cell: next, .. } => {
                assert_ne!(next, Some(cell), "dwell expiry must rotate coverage")
            }
            other => panic!("expected search, got {other:?}"),
        }
    }

    // ---- Monitor FSM ----

    #[test]
    fn test_monitor_enroute_routes_to_believed_position() {
        let grid = GridBelief::new(10, 10, 2);
        let mut registry = TargetRegistry::new();
        registry.insert(tracked_target(1, 900.0, 900.0));
        let f = frame();
        let coverage = vec![0u64; 100];
        // Far from the target: keep flying.
        let ctx = task_ctx(
            Coordinate::new(0.0, 0.0),
            45.0,
            &grid,
            &registry,
            &f,
            &coverage,
        );

        let update = evaluate(
            &ctx,
            &AgentTask::Monitor {
                target: TargetId(1),
                leg: MonitorLeg::EnRoute,
            },
        );
        assert_eq!(
            update.directive,
            Some(Directive::RouteTo(Coordinate::new(900.0, 900.0)))
        );
        assert!(update.effects.is_empty());
    }

    #[test]
    fn test_monitor_transitions_to_orbit_at_entry_range() {
        let grid = GridBelief::new(10, 10, 2);
        let mut registry = TargetRegistry::new();
        registry.insert(tracked_target(1, 700.0, 0.0));
        let f = frame();
        let coverage = vec![0u64; 100];
        // 700 m out, entry threshold is 0.8 * 1000 = 800 m.
        let ctx = task_ctx(
            Coordinate::new(0.0, 0.0),
            90.0,
            &grid,
            &registry,
            &f,
            &coverage,
        );

        let update = evaluate(
            &ctx,
            &AgentTask::Monitor {
                target: TargetId(1),
                leg: MonitorLeg::EnRoute,
            },
        );
        match update.task {
            AgentTask::Monitor {
                leg: MonitorLeg::Orbiting { anchor },
                ..
            } => assert_eq!(anchor, Coordinate::new(700.0, 0.0)),
            other => panic!("expected orbiting, got {other:?}"),
        }
        match update.directive {
            Some(Directive::Orbit { circle, edges, .. }) => {
                assert_eq!(circle.center, Coordinate::new(700.0, 0.0));
                assert!((circle.radius - ORBIT_STANDOFF_FRACTION * 1_000.0).abs() < 1e-9);
                assert_eq!(edges, ORBIT_EDGE_COUNT);
            }
            other => panic!("expected orbit directive, got {other:?}"),
        }
        assert!(update
            .effects
            .contains(&TaskEffect::MonitorArrived { target: TargetId(1) }));
    }

    #[test]
    fn test_orbit_direction_follows_cross_product_sign() {
        let center = Coordinate::new(0.0, 0.0);
        let entry = Coordinate::new(500.0, 0.0);
        // Heading north at the eastern entry point sweeps counter-clockwise.
        assert!(!orbit_direction_clockwise(center, entry, 0.0));
        // Heading south at the same point sweeps clockwise.
        assert!(orbit_direction_clockwise(center, entry, 180.0));
    }

    #[test]
    fn test_monitor_reroutes_on_drift() {
        let grid = GridBelief::new(10, 10, 2);
        let mut registry = TargetRegistry::new();
        let mut target = tracked_target(1, 900.0, 0.0);
        // Someone already confirmed; pure surveillance from here.
        target.attack.ensure_open(1.0);
        registry.insert(target);
        let f = frame();
        let coverage = vec![0u64; 100];
        let ctx = task_ctx(
            Coordinate::new(0.0, 0.0),
            90.0,
            &grid,
            &registry,
            &f,
            &coverage,
        );

        // Anchor far from the current believed position (> 0.5 * 1000 m).
        let stale_anchor = Coordinate::new(300.0, 0.0);
        let update = evaluate(
            &ctx,
            &AgentTask::Monitor {
                target: TargetId(1),
                leg: MonitorLeg::Orbiting {
                    anchor: stale_anchor,
                },
            },
        );
        match update.task {
            AgentTask::Monitor {
                leg: MonitorLeg::Orbiting { anchor },
                ..
            } => assert_eq!(anchor, Coordinate::new(900.0, 0.0)),
            other => panic!("expected re-anchored orbit, got {other:?}"),
        }
        assert!(matches!(update.directive, Some(Directive::Orbit { .. })));
    }

    #[test]
    fn test_monitor_holds_orbit_within_drift_threshold() {
        let grid = GridBelief::new(10, 10, 2);
        let mut registry = TargetRegistry::new();
        let mut target = tracked_target(1, 900.0, 0.0);
        target.attack.ensure_open(1.0);
        registry.insert(target);
        let f = frame();
        let coverage = vec![0u64; 100];
        let ctx = task_ctx(
            Coordinate::new(200.0, 0.0),
            90.0,
            &grid,
            &registry,
            &f,
            &coverage,
        );

        let anchor = Coordinate::new(1_000.0, 0.0);
        let update = evaluate(
            &ctx,
            &AgentTask::Monitor {
                target: TargetId(1),
                leg: MonitorLeg::Orbiting { anchor },
            },
        );
        assert_eq!(update.directive, None, "keep flying the current orbit");
    }

    // ---- Confirm FSM ----

    #[test]
    fn test_orbiting_monitor_begins_confirm_when_unconfirmed() {
        let grid = GridBelief::new(10, 10, 2);
        let mut registry = TargetRegistry::new();
        registry.insert(tracked_target(1, 500.0, 0.0));
        let f = frame();
        let coverage = vec![0u64; 100];
        let ctx = task_ctx(
            Coordinate::new(0.0, 0.0),
            0.0,
            &grid,
            &registry,
            &f,
            &coverage,
        );

        let update = evaluate(
            &ctx,
            &AgentTask::Monitor {
                target: TargetId(1),
                leg: MonitorLeg::Orbiting {
                    anchor: Coordinate::new(500.0, 0.0),
                },
            },
        );
        assert!(matches!(update.task, AgentTask::Confirm { .. }));
        assert!(update.effects.contains(&TaskEffect::SetFocusedScan {
            target: TargetId(1),
            on: true
        }));
    }

    #[test]
    fn test_confirm_stare_accumulates_then_opens_attack() {
        let grid = GridBelief::new(10, 10, 2);
        let mut registry = TargetRegistry::new();
        registry.insert(tracked_target(1, 500.0, 0.0));
        let f = frame();
        let coverage = vec![0u64; 100];
        let ctx = task_ctx(
            Coordinate::new(0.0, 0.0),
            0.0,
            &grid,
            &registry,
            &f,
            &coverage,
        );

        // Mid-stare: timer accumulates, stare directive continues.
        let update = evaluate(
            &ctx,
            &AgentTask::Confirm {
                target: TargetId(1),
                stare_secs: 1.0,
            },
        );
        match update.task {
            AgentTask::Confirm { stare_secs, .. } => {
                assert!((stare_secs - (1.0 + DT)).abs() < 1e-12)
            }
            other => panic!("expected confirm, got {other:?}"),
        }
        assert_eq!(
            update.directive,
            Some(Directive::Stare(Coordinate::new(500.0, 0.0)))
        );

        // Expiry: the shared attack task opens, focus clears, the agent
        // returns to its orbit.
        let update = evaluate(
            &ctx,
            &AgentTask::Confirm {
                target: TargetId(1),
                stare_secs: CONFIRM_STARE_SECS,
            },
        );
        assert!(matches!(
            update.task,
            AgentTask::Monitor {
                leg: MonitorLeg::Orbiting { .. },
                ..
            }
        ));
        assert!(update
            .effects
            .contains(&TaskEffect::OpenAttack { target: TargetId(1) }));
        assert!(update.effects.contains(&TaskEffect::SetFocusedScan {
            target: TargetId(1),
            on: false
        }));
    }

    // ---- Attack / BDA FSM ----

    #[test]
    fn test_attack_enroute_then_performs_then_bda() {
        let grid = GridBelief::new(10, 10, 2);
        let mut registry = TargetRegistry::new();
        registry.insert(tracked_target(1, 2_000.0, 0.0));
        let f = frame();
        let coverage = vec![0u64; 100];

        // Out of release range (threshold 0.5 * 1000 = 500 m): keep flying.
        let far_ctx = task_ctx(
            Coordinate::new(0.0, 0.0),
            90.0,
            &grid,
            &registry,
            &f,
            &coverage,
        );
        let update = evaluate(
            &far_ctx,
            &AgentTask::Attack {
                target: TargetId(1),
                leg: AttackLeg::EnRoute,
            },
        );
        assert_eq!(
            update.directive,
            Some(Directive::RouteTo(Coordinate::new(2_000.0, 0.0)))
        );

        // Inside release range: arrival effect fires.
        let near_ctx = task_ctx(
            Coordinate::new(1_600.0, 0.0),
            90.0,
            &grid,
            &registry,
            &f,
            &coverage,
        );
        let update = evaluate(
            &near_ctx,
            &AgentTask::Attack {
                target: TargetId(1),
                leg: AttackLeg::EnRoute,
            },
        );
        assert!(matches!(
            update.task,
            AgentTask::Attack {
                leg: AttackLeg::Performing,
                ..
            }
        ));
        assert!(update
            .effects
            .contains(&TaskEffect::AttackArrived { target: TargetId(1) }));

        // Performing releases the weapon and starts the BDA stare.
        let update = evaluate(
            &near_ctx,
            &AgentTask::Attack {
                target: TargetId(1),
                leg: AttackLeg::Performing,
            },
        );
        assert!(matches!(update.task, AgentTask::Bda { .. }));
        assert!(update
            .effects
            .contains(&TaskEffect::ReleaseWeapon { target: TargetId(1) }));
        assert!(update.effects.contains(&TaskEffect::SetFocusedScan {
            target: TargetId(1),
            on: true
        }));
    }

    #[test]
    fn test_bda_timer_completes_to_search() {
        let grid = GridBelief::new(10, 10, 2);
        let mut registry = TargetRegistry::new();
        registry.insert(tracked_target(1, 500.0, 0.0));
        let f = frame();
        let coverage = vec![0u64; 100];
        let ctx = task_ctx(
            Coordinate::new(0.0, 0.0),
            0.0,
            &grid,
            &registry,
            &f,
            &coverage,
        );

        let update = evaluate(
            &ctx,
            &AgentTask::Bda {
                target: TargetId(1),
                stare_secs: BDA_STARE_SECS,
            },
        );
        assert!(matches!(update.task, AgentTask::Search { .. }));
        assert!(update
            .effects
            .contains(&TaskEffect::BdaComplete { target: TargetId(1) }));
        assert!(update.effects.contains(&TaskEffect::SetFocusedScan {
            target: TargetId(1),
            on: false
        }));
    }
}
