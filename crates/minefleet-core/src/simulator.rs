//! Motion Simulator: random-walk proposals for trucks nobody else drives.
//!
//! Each tick looks at a snapshot of the fleet, draws one candidate per
//! eligible truck and submits it through the dispatcher like any other
//! producer. Eligibility is re-checked by the arbiter at resolution time,
//! so a truck tainted between snapshot and submit is simply skipped.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender};
use minefleet_logic::motion::random_step;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::ConfigError;
use crate::dispatcher::Dispatcher;
use crate::error::{EngineError, Result};
use crate::sync::lock;
use crate::update::ProposedUpdate;

/// Outcome counts for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub proposed: usize,
    pub applied: usize,
}

pub struct MotionSimulator {
    dispatcher: Arc<Dispatcher>,
    max_step: f64,
    rng: Mutex<StdRng>,
}

impl MotionSimulator {
    /// A fixed `seed` makes the walk reproducible. `max_step` must be finite
    /// and positive.
    pub fn new(dispatcher: Arc<Dispatcher>, max_step: f64, seed: Option<u64>) -> Result<Self> {
        if !(max_step.is_finite() && max_step > 0.0) {
            return Err(EngineError::InvalidConfig(vec![ConfigError::InvalidMaxStep(max_step)]));
        }
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            dispatcher,
            max_step,
            rng: Mutex::new(rng),
        })
    }

    /// Propose one step for every currently eligible truck.
    pub fn tick(&self) -> TickReport {
        let bounds = self.dispatcher.map().bounds();
        let mut report = TickReport::default();
        for (id, from) in self.dispatcher.registry().simulation_candidates() {
            let candidate = random_step(&mut *lock(&self.rng), from, self.max_step, &bounds);
            report.proposed += 1;
            if self.dispatcher.submit(ProposedUpdate::simulated(id, candidate)).is_applied() {
                report.applied += 1;
            }
        }
        report
    }

    /// Run `tick` every `period` on a background thread until the handle is
    /// stopped or dropped.
    pub fn spawn(self: &Arc<Self>, period: Duration) -> Result<SimulatorHandle> {
        let simulator = Arc::clone(self);
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        let worker = thread::Builder::new()
            .name("minefleet-simulator".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => {
                        let report = simulator.tick();
                        log::trace!("Simulator tick: {}/{} applied", report.applied, report.proposed);
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(EngineError::SimulatorSpawn)?;
        log::info!("Motion simulator started ({} ms period)", period.as_millis());
        Ok(SimulatorHandle {
            stop_tx: Some(stop_tx),
            worker: Some(worker),
        })
    }
}

/// Owner of the simulator thread. Dropping it stops the thread.
pub struct SimulatorHandle {
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl SimulatorHandle {
    /// Stop the ticker and wait for the in-flight tick to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("Motion simulator thread panicked");
            } else {
                log::info!("Motion simulator stopped");
            }
        }
    }
}

impl Drop for SimulatorHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
