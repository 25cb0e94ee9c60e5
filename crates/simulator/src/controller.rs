//! Shared simulation state and the operations that mutate it.
//!
//! All fields live behind one mutex. The lock is never held across an
//! `.await`; the generation loop copies what it needs and releases it before
//! talking to the activity store.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use habit_core::api::{SimulatorSnapshot, TaskView};
use habit_core::now_utc;
use rand::seq::IteratorRandom;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, TaskTemplate};
use crate::config::SimulatorConfig;
use crate::generation;
use crate::log_buffer::LogBuffer;
use crate::store_client::ActivityStore;

/// Rejected control operation. State is left unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SimError {
    #[error("unknown task {0}")]
    UnknownTask(String),
    #[error("Invalid interval")]
    InvalidInterval,
    #[error("simulator is shut down")]
    Closed,
}

struct State {
    active: HashSet<String>,
    running: bool,
    interval: Duration,
    log: LogBuffer,
    last_event: Option<DateTime<Utc>>,
    /// Handle of the live generation loop, if any. Cleared by the loop itself
    /// on exit, in the same critical section that observes `running == false`.
    task: Option<JoinHandle<()>>,
    closed: bool,
}

pub(crate) struct Shared<S> {
    catalog: Catalog,
    pub(crate) store: S,
    state: Mutex<State>,
    wake: Notify,
    loop_starts: AtomicU64,
}

impl<S> Shared<S> {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn push_log(&self, message: &str) {
        let mut st = self.lock();
        let line = st.log.push(now_utc(), message);
        info!(target: "simulator", "{line}");
    }

    /// Cycle boundary. Returns the interval to sleep for, or `None` if the
    /// loop must exit (in which case it has been deregistered).
    pub(crate) fn checkpoint(&self) -> Option<Duration> {
        let mut st = self.lock();
        if st.running {
            return Some(st.interval);
        }
        st.task = None;
        None
    }

    /// Called when a loop ends without passing through a stopping
    /// `checkpoint`, i.e. its task panicked or was cancelled. Deregisters the
    /// loop and clears the run flag so the next `toggle_run` starts afresh.
    pub(crate) fn abandon(&self) {
        let was_running = {
            let mut st = self.lock();
            st.task = None;
            std::mem::replace(&mut st.running, false)
        };
        warn!("generation loop terminated abnormally");
        if was_running {
            self.push_log("Simulation stopped: generation loop terminated unexpectedly");
        }
    }

    /// Sleep for `interval`, returning early only on shutdown.
    pub(crate) async fn idle(&self, interval: Duration) {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = self.wake.notified() => {}
        }
    }

    /// Uniformly pick one active template.
    pub(crate) fn pick_active(&self) -> Option<TaskTemplate> {
        let st = self.lock();
        let id = st.active.iter().choose(&mut rand::thread_rng())?;
        self.catalog.get(id).cloned()
    }

    pub(crate) fn record_event(&self, at: DateTime<Utc>) {
        self.lock().last_event = Some(at);
    }
}

/// Owner of the simulation. Cheap to clone; clones share state.
pub struct Simulator<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for Simulator<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: ActivityStore> Simulator<S> {
    pub fn new(catalog: Catalog, store: S, config: &SimulatorConfig) -> Self {
        let state = State {
            active: HashSet::new(),
            running: false,
            interval: config.interval,
            log: LogBuffer::new(config.log_capacity),
            last_event: None,
            task: None,
            closed: false,
        };
        Self {
            shared: Arc::new(Shared {
                catalog,
                store,
                state: Mutex::new(state),
                wake: Notify::new(),
                loop_starts: AtomicU64::new(0),
            }),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.shared.catalog
    }

    /// Flip a template in or out of the active set. Returns whether it is now active.
    pub fn toggle_task(&self, task_id: &str) -> Result<bool, SimError> {
        let task = self
            .shared
            .catalog
            .get(task_id)
            .ok_or_else(|| SimError::UnknownTask(task_id.to_string()))?;

        let now_active = {
            let mut st = self.shared.lock();
            if st.active.remove(task_id) {
                false
            } else {
                st.active.insert(task_id.to_string());
                true
            }
        };
        let verb = if now_active { "Activated" } else { "Deactivated" };
        self.shared
            .push_log(&format!("{verb} task '{}' ({})", task.name, task.id));
        Ok(now_active)
    }

    /// Replace the generation interval. Takes effect from the next cycle; a
    /// sleep already in progress keeps its old length.
    pub fn set_interval(&self, seconds: f64) -> Result<Duration, SimError> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(SimError::InvalidInterval);
        }
        let interval = Duration::try_from_secs_f64(seconds).map_err(|_| SimError::InvalidInterval)?;
        if interval.is_zero() {
            return Err(SimError::InvalidInterval);
        }
        self.shared.lock().interval = interval;
        self.shared
            .push_log(&format!("Generation interval set to {seconds}s"));
        Ok(interval)
    }

    /// Flip the run flag and return the new value.
    ///
    /// Starting spawns the generation loop unless one is still registered
    /// (for example a loop that was stopped but has not reached its next
    /// cycle boundary yet; it simply keeps going). Stopping is cooperative:
    /// the loop exits at its next cycle boundary.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn toggle_run(&self) -> Result<bool, SimError> {
        let running = {
            let mut st = self.shared.lock();
            if st.closed {
                return Err(SimError::Closed);
            }
            st.running = !st.running;
            if st.running {
                st.last_event = Some(now_utc());
                if st.task.is_none() {
                    self.shared.loop_starts.fetch_add(1, Ordering::SeqCst);
                    st.task = Some(tokio::spawn(generation::run(Arc::clone(&self.shared))));
                    debug!("spawned generation loop");
                }
            }
            st.running
        };
        self.shared.push_log(if running {
            "Simulation started"
        } else {
            "Simulation stopped"
        });
        Ok(running)
    }

    /// Log contents, oldest first.
    pub fn logs(&self) -> Vec<String> {
        self.shared.lock().log.entries()
    }

    /// Predicted time of the next generation event, `None` when stopped or
    /// when no baseline exists.
    pub fn next_event_time(&self) -> Option<DateTime<Utc>> {
        let st = self.shared.lock();
        if !st.running {
            return None;
        }
        let last = st.last_event?;
        let step = chrono::Duration::from_std(st.interval).ok()?;
        last.checked_add_signed(step)
    }

    pub fn last_event_time(&self) -> Option<DateTime<Utc>> {
        self.shared.lock().last_event
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().running
    }

    pub fn interval(&self) -> Duration {
        self.shared.lock().interval
    }

    pub fn is_active(&self, task_id: &str) -> bool {
        self.shared.lock().active.contains(task_id)
    }

    /// Active template ids, sorted.
    pub fn active_tasks(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.shared.lock().active.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// True while a generation loop is registered.
    pub fn loop_alive(&self) -> bool {
        self.shared.lock().task.is_some()
    }

    /// Number of generation loops spawned so far.
    pub fn loop_starts(&self) -> u64 {
        self.shared.loop_starts.load(Ordering::SeqCst)
    }

    pub fn tasks(&self) -> Vec<TaskView> {
        let st = self.shared.lock();
        self.shared
            .catalog
            .iter()
            .map(|t| TaskView {
                id: t.id.clone(),
                name: t.name.clone(),
                description: t.description.clone(),
                category: t.category.clone(),
                difficulty: t.difficulty,
                active: st.active.contains(&t.id),
            })
            .collect()
    }

    pub fn snapshot(&self) -> SimulatorSnapshot {
        let tasks = self.tasks();
        let st = self.shared.lock();
        SimulatorSnapshot {
            tasks,
            interval: st.interval.as_secs_f64(),
            is_running: st.running,
        }
    }

    /// Stop the simulation for good and wait for the generation loop to exit.
    /// An in-flight store call is allowed to finish; an interval sleep is cut short.
    pub async fn shutdown(&self) {
        let handle = {
            let mut st = self.shared.lock();
            st.closed = true;
            st.running = false;
            st.task.take()
        };
        self.shared.wake.notify_one();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "generation loop ended abnormally");
            }
        }
        debug!("simulator shut down");
    }
}
