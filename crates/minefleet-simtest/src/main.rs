//! MineFleet Headless Fleet Harness
//!
//! Replays fleet scenarios against the engine with no broker, no socket and
//! no UI. Everything runs in-process.
//!
//! Usage:
//!   cargo run -p minefleet-simtest
//!   cargo run -p minefleet-simtest -- --verbose

use std::sync::Arc;

use minefleet_core::prelude::*;
use minefleet_logic::collision::wall_contact;
use minefleet_logic::command::Command;
use minefleet_logic::geometry::Projection;
use minefleet_logic::map::{is_layout_usable, validate_layout};
use minefleet_logic::telemetry::{TelemetryMessage, TopicScheme};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== MineFleet Fleet Harness ===\n");

    let mut results = Vec::new();

    // 1. Projection and map layout
    results.extend(validate_geometry(verbose));

    // 2. Authority precedence
    results.extend(validate_authority());

    // 3. Collision detection
    results.extend(validate_collisions());

    // 4. Collectibles
    results.extend(validate_collectibles());

    // 5. Wire formats
    results.extend(validate_wire_formats(verbose));

    // 6. Random-walk sweep in the default maze
    results.extend(validate_random_walk(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn engine(layout: MapLayout) -> Option<FleetEngine> {
    match FleetEngine::with_layout(EngineConfig::default(), layout, Arc::new(NullOutbound)) {
        Ok(engine) => Some(engine),
        Err(e) => {
            println!("  engine construction failed: {}", e);
            None
        }
    }
}

fn engine_failure(name: &str) -> Vec<TestResult> {
    vec![TestResult {
        name: name.into(),
        passed: false,
        detail: "engine could not be built".into(),
    }]
}

// ── 1. Geometry ─────────────────────────────────────────────────────────

fn validate_geometry(verbose: bool) -> Vec<TestResult> {
    println!("--- Geometry ---");
    let mut results = Vec::new();
    let projection = Projection::default();

    let corners = [
        (LogicalPoint::new(0.0, 0.0), PixelPoint::new(8, 8)),
        (LogicalPoint::new(50.0, 50.0), PixelPoint::new(372, 187)),
        (LogicalPoint::new(100.0, 100.0), PixelPoint::new(728, 358)),
    ];
    for (logical, expected) in corners {
        let got = projection.to_pixel(logical);
        results.push(TestResult {
            name: format!("projection_{}_{}", logical.x, logical.y),
            passed: got == expected,
            detail: format!("({}, {}) → {:?}, expected {:?}", logical.x, logical.y, got, expected),
        });
    }

    let geometry = GeometryConfig::default();
    let maze = MapLayout::maze(geometry.canvas_width, geometry.canvas_height);
    let problems = validate_layout(&maze, &geometry);
    if verbose {
        for p in &problems {
            println!("  layout: {}", p.message);
        }
    }
    results.push(TestResult {
        name: "maze_layout_usable".into(),
        passed: is_layout_usable(&problems) && maze.walls.len() == 11,
        detail: format!("{} walls, {} problems", maze.walls.len(), problems.len()),
    });

    let spawn = geometry.truck_box(projection.to_pixel(geometry.bounds().center()));
    results.push(TestResult {
        name: "maze_spawn_clear".into(),
        passed: wall_contact(&spawn, &maze.walls).is_none(),
        detail: format!("spawn box {:?}", spawn),
    });

    results
}

// ── 2. Authority ────────────────────────────────────────────────────────

fn validate_authority() -> Vec<TestResult> {
    println!("--- Authority ---");
    let mut results = Vec::new();
    let Some(engine) = engine(MapLayout::maze(760, 390)) else {
        return engine_failure("authority_engine");
    };

    // simulated step from the centre
    let a = engine.add_truck();
    let _ = engine.commands().toggle_motion(a);
    let res = engine
        .dispatcher()
        .submit(ProposedUpdate::simulated(a, LogicalPoint::new(50.8, 49.6)));
    let truck = engine.truck(a);
    results.push(TestResult {
        name: "simulated_step_accepted".into(),
        passed: res.is_applied()
            && truck.as_ref().is_some_and(|t| t.authority == Authority::Local),
        detail: format!("{:?}", res.drop_reason()),
    });

    // external telemetry taints, simulator is locked out
    let b = engine.add_truck();
    let _ = engine.commands().toggle_motion(b);
    let topic = format!("truck/{}/position", b);
    let external = engine.telemetry().handle_message(&topic, "10,10");
    let simulated = engine
        .dispatcher()
        .submit(ProposedUpdate::simulated(b, LogicalPoint::new(11.0, 11.0)));
    results.push(TestResult {
        name: "external_taints".into(),
        passed: external.as_ref().is_ok_and(Resolution::is_applied)
            && engine.truck(b).is_some_and(|t| t.authority == Authority::External),
        detail: format!("{:?}", external),
    });
    results.push(TestResult {
        name: "simulated_rejected_after_external".into(),
        passed: simulated.drop_reason()
            == Some(DropReason::Ownership(OwnershipConflict::ExternalAuthority)),
        detail: format!("{:?}", simulated.drop_reason()),
    });

    // manual override resets authority
    let line = format!("set_manual:{}:20:40:0", b);
    let outcome = engine.commands().execute_line(&line);
    let truck = engine.truck(b);
    results.push(TestResult {
        name: "manual_resets_authority".into(),
        passed: matches!(outcome, Ok(CommandOutcome::Resolved(Resolution::Applied(_))))
            && truck.as_ref().is_some_and(|t| {
                t.authority == Authority::Local && t.position == LogicalPoint::new(20.0, 40.0)
            }),
        detail: format!("{:?}", truck.map(|t| (t.position, t.authority))),
    });

    results
}

// ── 3. Collisions ───────────────────────────────────────────────────────

fn validate_collisions() -> Vec<TestResult> {
    println!("--- Collisions ---");
    let mut results = Vec::new();
    let Some(engine) = engine(MapLayout::maze(760, 390)) else {
        return engine_failure("collision_engine");
    };

    let first = engine.add_truck();
    let second = engine.add_truck();
    engine
        .dispatcher()
        .submit(ProposedUpdate::manual(first, LogicalPoint::new(20.0, 25.0)));
    engine
        .dispatcher()
        .submit(ProposedUpdate::manual(second, LogicalPoint::new(40.0, 25.0)));
    let first_before = engine.truck(first);

    // landing within the collision radius of another truck
    let res = engine
        .dispatcher()
        .submit(ProposedUpdate::manual(second, LogicalPoint::new(21.0, 25.0)));
    results.push(TestResult {
        name: "truck_contact_rejected".into(),
        passed: res.drop_reason() == Some(DropReason::TruckContact(first))
            && engine.truck(first) == first_before,
        detail: format!("{:?}", res.drop_reason()),
    });

    // landing inside a wall
    let before = engine.truck(second).map(|t| t.position);
    let res = engine
        .dispatcher()
        .submit(ProposedUpdate::manual(second, LogicalPoint::new(30.0, 16.8)));
    results.push(TestResult {
        name: "wall_contact_rejected".into(),
        passed: matches!(res.drop_reason(), Some(DropReason::WallContact(_)))
            && engine.truck(second).map(|t| t.position) == before,
        detail: format!("{:?}", res.drop_reason()),
    });

    let res = engine
        .dispatcher()
        .submit(ProposedUpdate::manual(second, LogicalPoint::new(100.5, 30.0)));
    results.push(TestResult {
        name: "out_of_bounds_rejected".into(),
        passed: res.drop_reason() == Some(DropReason::OutOfBounds),
        detail: format!("{:?}", res.drop_reason()),
    });

    results
}

// ── 4. Collectibles ─────────────────────────────────────────────────────

fn validate_collectibles() -> Vec<TestResult> {
    println!("--- Collectibles ---");
    let mut results = Vec::new();
    let Some(engine) = engine(MapLayout::open()) else {
        return engine_failure("collectible_engine");
    };
    let updates = engine.subscribe();

    let truck = engine.add_truck();
    let target = LogicalPoint::new(20.0, 20.0);
    let px = engine.map().to_pixel(target);
    let placed = engine.add_collectible(px);
    let refused = engine.add_collectible(PixelPoint::new(px.x + 5, px.y + 5));
    results.push(TestResult {
        name: "collectible_overlap_refused".into(),
        passed: placed.is_some() && refused.is_none(),
        detail: format!("placed {:?}, refused {:?}", placed, refused),
    });

    // pickup on an accepted move, removed exactly once
    let first = engine.dispatcher().submit(ProposedUpdate::manual(truck, target));
    engine
        .dispatcher()
        .submit(ProposedUpdate::manual(truck, LogicalPoint::new(21.0, 20.0)));
    let again = engine.dispatcher().submit(ProposedUpdate::manual(truck, target));
    let removals = updates
        .try_iter()
        .filter(|n| matches!(n, Notification::CollectibleRemoved { .. }))
        .count();
    results.push(TestResult {
        name: "collectible_removed_once".into(),
        passed: first.accepted().is_some_and(|u| u.collected.len() == 1)
            && again.accepted().is_some_and(|u| u.collected.is_empty())
            && removals == 1
            && engine.collectibles().is_empty(),
        detail: format!("{} removal notifications", removals),
    });

    results
}

// ── 5. Wire formats ─────────────────────────────────────────────────────

fn validate_wire_formats(verbose: bool) -> Vec<TestResult> {
    println!("--- Wire Formats ---");
    let mut results = Vec::new();

    let lines = [
        "add_truck",
        "set_manual:3:0:0:0",
        "set_auto:3",
        "inject_temp_failure:3",
        "inject_electric_failure:3",
        "inject_hydraulic_failure:3",
    ];
    let mut round_trips = 0;
    for line in lines {
        match line.parse::<Command>() {
            Ok(cmd) if cmd.to_string() == line => round_trips += 1,
            other => {
                if verbose {
                    println!("  {} → {:?}", line, other);
                }
            }
        }
    }
    results.push(TestResult {
        name: "command_lines".into(),
        passed: round_trips == lines.len(),
        detail: format!("{}/{} lines round-trip", round_trips, lines.len()),
    });

    let rejected = ["set_manual:1:0:0:181", "set_manual:1:0:0", "warp:1"]
        .iter()
        .filter(|l| l.parse::<Command>().is_err())
        .count();
    results.push(TestResult {
        name: "command_validation".into(),
        passed: rejected == 3,
        detail: format!("{}/3 invalid lines rejected", rejected),
    });

    let topics = TopicScheme::default();
    let parsed = topics.parse("planner/truck/4/position", "42.3,12.5");
    results.push(TestResult {
        name: "telemetry_position".into(),
        passed: parsed
            == Ok(TelemetryMessage::Position {
                truck: 4,
                position: LogicalPoint::new(42.3, 12.5),
            }),
        detail: format!("{:?}", parsed),
    });
    results.push(TestResult {
        name: "telemetry_malformed".into(),
        passed: topics.parse("truck/4/position", "42.3, 12.5").is_err()
            && topics.parse("truck/x/position", "1,2").is_err(),
        detail: "whitespace and bad ids rejected".into(),
    });

    results
}

// ── 6. Random walk ──────────────────────────────────────────────────────

fn validate_random_walk(verbose: bool) -> Vec<TestResult> {
    println!("--- Random Walk ---");
    let mut results = Vec::new();
    let config = EngineConfig {
        seed: Some(2024),
        ..Default::default()
    };
    let engine = match FleetEngine::new(config, Arc::new(NullOutbound)) {
        Ok(engine) => engine,
        Err(_) => return engine_failure("random_walk_engine"),
    };

    // park trucks on a clear row near the bottom wall, then let them wander
    let mut rng = StdRng::seed_from_u64(7);
    let mut ids = Vec::new();
    for i in 0..8 {
        let id = engine.add_truck();
        let x = 8.0 + f64::from(i) * 11.0 + rng.gen_range(0.0..1.0);
        engine
            .dispatcher()
            .submit(ProposedUpdate::manual(id, LogicalPoint::new(x, 92.0)));
        let _ = engine.commands().toggle_motion(id);
        ids.push(id);
    }

    let mut proposed = 0;
    let mut applied = 0;
    for _ in 0..2000 {
        let report = engine.simulator().tick();
        proposed += report.proposed;
        applied += report.applied;
    }
    if verbose {
        println!("  {} proposals, {} applied", proposed, applied);
    }

    let geometry = engine.map().geometry().clone();
    let trucks = engine.trucks();
    let in_bounds = trucks.iter().all(|t| geometry.bounds().contains(t.position));
    let clear_of_walls = trucks.iter().all(|t| {
        let bbox = geometry.truck_box(engine.map().to_pixel(t.position));
        wall_contact(&bbox, engine.map().walls()).is_none()
    });
    let mut apart = true;
    for (i, a) in trucks.iter().enumerate() {
        for b in &trucks[i + 1..] {
            let d = engine
                .map()
                .to_pixel(a.position)
                .distance(&engine.map().to_pixel(b.position));
            if d < geometry.collision_radius {
                apart = false;
            }
        }
    }

    results.push(TestResult {
        name: "walk_in_bounds".into(),
        passed: in_bounds,
        detail: format!("{} trucks after 2000 ticks", trucks.len()),
    });
    results.push(TestResult {
        name: "walk_clear_of_walls".into(),
        passed: clear_of_walls,
        detail: "no truck box overlaps a wall".into(),
    });
    results.push(TestResult {
        name: "walk_trucks_apart".into(),
        passed: apart,
        detail: format!("collision radius {}", geometry.collision_radius),
    });
    results.push(TestResult {
        name: "walk_makes_progress".into(),
        passed: applied > 0 && proposed == ids.len() * 2000,
        detail: format!("{}/{} proposals applied", applied, proposed),
    });

    if verbose {
        match engine.snapshot_json() {
            Ok(json) => println!("  final fleet:\n{}", json),
            Err(e) => println!("  snapshot failed: {}", e),
        }
    }

    results
}
