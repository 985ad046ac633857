//! Many producers hammering the dispatcher at once.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use minefleet_core::prelude::*;
use rand::rngs::StdRng;
use crossbeam_channel::Receiver;
use rand::{Rng, SeedableRng};

fn engine(layout: MapLayout, seed: u64) -> Arc<FleetEngine> {
    let config = EngineConfig {
        tick_ms: 2,
        seed: Some(seed),
        ..Default::default()
    };
    Arc::new(FleetEngine::with_layout(config, layout, Arc::new(NullOutbound)).unwrap())
}

/// Spread trucks over a grid so the random walk has room to move.
fn spread(engine: &FleetEngine, count: usize) -> Vec<TruckId> {
    (0..count)
        .map(|i| {
            let id = engine.add_truck();
            let x = 10.0 + (i % 5) as f64 * 20.0;
            let y = 15.0 + (i / 5) as f64 * 25.0;
            engine.commands().set_manual(id, x, y, 0).unwrap();
            engine.commands().set_auto(id).unwrap();
            engine.commands().toggle_motion(id).unwrap();
            id
        })
        .collect()
}

#[test]
fn trucks_never_end_up_inside_each_other() {
    let engine = engine(MapLayout::open(), 11);
    let ids = spread(&engine, 15);
    let radius = engine.map().geometry().collision_radius;
    let simulator = engine.start_simulator().unwrap();

    let producers: Vec<_> = (0..4u64)
        .map(|t| {
            let engine = Arc::clone(&engine);
            let ids = ids.clone();
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(100 + t);
                for _ in 0..2000 {
                    let id = ids[rng.gen_range(0..ids.len())];
                    let target = engine.truck(id).unwrap().position;
                    let candidate = LogicalPoint::new(
                        (target.x + rng.gen_range(-3.0..=3.0)).clamp(0.0, 100.0),
                        (target.y + rng.gen_range(-3.0..=3.0)).clamp(0.0, 100.0),
                    );
                    let source = if rng.gen_bool(0.5) {
                        UpdateSource::Manual
                    } else {
                        UpdateSource::Simulated
                    };
                    engine
                        .dispatcher()
                        .submit(ProposedUpdate::new(id, candidate, source));
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }
    simulator.stop();

    let trucks = engine.trucks();
    for (i, a) in trucks.iter().enumerate() {
        for b in &trucks[i + 1..] {
            let pa = engine.map().to_pixel(a.position);
            let pb = engine.map().to_pixel(b.position);
            assert!(
                pa.distance(&pb) >= radius,
                "trucks {} and {} overlap at {:?} / {:?}",
                a.id,
                b.id,
                pa,
                pb
            );
        }
    }
}

#[test]
fn racing_trucks_collect_each_item_once() {
    let engine = engine(MapLayout::open(), 5);
    let updates = engine.subscribe();
    let ids: Vec<_> = (0..6).map(|_| engine.add_truck()).collect();

    let mut placed = 0;
    for gx in 0..12 {
        for gy in 0..6 {
            if engine.add_collectible(PixelPoint::new(40 + gx * 55, 30 + gy * 55)).is_some() {
                placed += 1;
            }
        }
    }

    let workers: Vec<_> = ids
        .iter()
        .map(|&id| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(u64::from(id));
                for _ in 0..3000 {
                    let candidate = LogicalPoint::new(rng.gen_range(0.0..=100.0), rng.gen_range(0.0..=100.0));
                    engine.dispatcher().submit(ProposedUpdate::manual(id, candidate));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let mut seen = HashSet::new();
    for notification in updates.try_iter() {
        if let Notification::CollectibleRemoved { id, .. } = notification {
            assert!(seen.insert(id), "{id:?} reported twice");
        }
    }
    assert_eq!(seen.len() + engine.collectibles().len(), placed);
}

#[test]
fn per_truck_notifications_follow_resolution_order() {
    let engine = engine(MapLayout::open(), 3);
    let updates = engine.subscribe();
    let id = engine.add_truck();

    let writers: Vec<_> = (0..3)
        .map(|w| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for step in 0..200 {
                    let x = f64::from(w * 30 + 5) + f64::from(step % 20) * 0.5;
                    engine
                        .dispatcher()
                        .submit(ProposedUpdate::external(id, LogicalPoint::new(x, 40.0)));
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let last = updates
        .try_iter()
        .filter_map(|n| match n {
            Notification::TruckUpdated { truck, position, .. } if truck == id => Some(position),
            _ => None,
        })
        .last()
        .unwrap();
    assert_eq!(engine.truck(id).unwrap().position, last);
}

#[test]
fn simulator_leaves_external_trucks_alone_under_load() {
    let engine = engine(MapLayout::open(), 9);
    let ids = spread(&engine, 10);
    let tainted = ids[0];
    engine.telemetry().handle_message("truck/1/position", "90,90").unwrap();

    let simulator = engine.start_simulator().unwrap();
    thread::sleep(Duration::from_millis(100));
    simulator.stop();

    let truck = engine.truck(tainted).unwrap();
    assert_eq!(truck.position, LogicalPoint::new(90.0, 90.0));
    assert_eq!(truck.authority, Authority::External);
}

/// Walk the notification stream and return, per truck, how many external
/// updates changed the position published just before them.
fn external_moves(updates: &Receiver<Notification>, start: LogicalPoint) -> (usize, HashMap<TruckId, usize>) {
    let mut last: HashMap<TruckId, LogicalPoint> = HashMap::new();
    let mut applied = 0;
    let mut moved = HashMap::new();
    for notification in updates.try_iter() {
        if let Notification::TruckUpdated {
            truck,
            position,
            authority,
            ..
        } = notification
        {
            let previous = last.insert(truck, position).unwrap_or(start);
            if authority == Authority::External {
                applied += 1;
                if previous != position {
                    *moved.entry(truck).or_insert(0) += 1;
                }
            }
        }
    }
    (applied, moved)
}

#[test]
fn failure_readings_never_roll_back_manual_moves() {
    let engine = engine(MapLayout::open(), 21);
    let updates = engine.subscribe();
    let id = engine.add_truck();

    let mover = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for i in 0..20_000 {
                let x = if i % 2 == 0 { 10.0 } else { 90.0 };
                engine
                    .dispatcher()
                    .submit(ProposedUpdate::manual(id, LogicalPoint::new(x, 50.0)));
            }
        })
    };
    let reader = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for i in 0..20_000 {
                engine
                    .telemetry()
                    .handle_message("truck/1/failure/i_temperatura", &i.to_string())
                    .unwrap();
            }
        })
    };
    mover.join().unwrap();
    reader.join().unwrap();

    let (applied, moved) = external_moves(&updates, LogicalPoint::new(50.0, 50.0));
    assert_eq!(applied, 20_000);
    assert!(moved.is_empty(), "failure readings moved trucks: {moved:?}");
    assert_eq!(engine.truck(id).unwrap().failures["i_temperatura"], "19999");
}

#[test]
fn readings_alongside_manual_and_simulated_producers_keep_positions() {
    let engine = engine(MapLayout::open(), 23);
    let ids = spread(&engine, 6);
    let updates = engine.subscribe();
    let starts: HashMap<TruckId, LogicalPoint> = ids.iter().map(|&id| (id, engine.truck(id).unwrap().position)).collect();
    let simulator = engine.start_simulator().unwrap();

    let manual = {
        let engine = Arc::clone(&engine);
        let ids = ids.clone();
        thread::spawn(move || {
            let mut rng = StdRng::seed_from_u64(31);
            for _ in 0..5000 {
                let id = ids[rng.gen_range(0..ids.len())];
                let from = engine.truck(id).unwrap().position;
                let candidate = LogicalPoint::new(
                    (from.x + rng.gen_range(-2.0..=2.0)).clamp(0.0, 100.0),
                    (from.y + rng.gen_range(-2.0..=2.0)).clamp(0.0, 100.0),
                );
                engine.dispatcher().submit(ProposedUpdate::manual(id, candidate));
            }
        })
    };
    let readers: Vec<_> = ["failure/i_falha_eletrica", "sensor/i_angulo", "sensor/i_temperatura"]
        .into_iter()
        .enumerate()
        .map(|(r, key)| {
            let engine = Arc::clone(&engine);
            let ids = ids.clone();
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(40 + r as u64);
                for _ in 0..5000 {
                    let id = ids[rng.gen_range(0..ids.len())];
                    let value = rng.gen_range(-180..=180).to_string();
                    let res = engine
                        .telemetry()
                        .handle_message(&format!("truck/{id}/{key}"), &value)
                        .unwrap();
                    assert!(res.is_applied());
                }
            })
        })
        .collect();

    manual.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    simulator.stop();

    let mut last = starts;
    let mut external = 0;
    for notification in updates.try_iter() {
        if let Notification::TruckUpdated {
            truck,
            position,
            authority,
            ..
        } = notification
        {
            let previous = last.insert(truck, position);
            if authority == Authority::External {
                external += 1;
                assert_eq!(previous, Some(position), "reading moved truck {truck}");
            }
        }
    }
    assert_eq!(external, 15_000);
}

#[test]
fn axis_readings_keep_the_other_axis_current() {
    let engine = engine(MapLayout::open(), 25);
    let updates = engine.subscribe();
    let id = engine.add_truck();

    let mover = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for i in 0..10_000 {
                let y = if i % 2 == 0 { 20.0 } else { 80.0 };
                engine
                    .dispatcher()
                    .submit(ProposedUpdate::manual(id, LogicalPoint::new(30.0, y)));
            }
        })
    };
    let reader = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for _ in 0..10_000 {
                engine
                    .telemetry()
                    .handle_message("truck/1/sensor/i_posicao_x", "60")
                    .unwrap();
            }
        })
    };
    mover.join().unwrap();
    reader.join().unwrap();

    let mut last = LogicalPoint::new(50.0, 50.0);
    for notification in updates.try_iter() {
        if let Notification::TruckUpdated {
            position, authority, ..
        } = notification
        {
            if authority == Authority::External {
                assert_eq!(position, LogicalPoint::new(60.0, last.y));
            }
            last = position;
        }
    }
}
