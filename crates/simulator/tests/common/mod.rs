#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use habit_core::model::{NewCompletion, NewHabit};
use habit_simulator::{ActivityStore, Catalog, ClientError, Simulator, SimulatorConfig};

/// In-process activity store that records what it is sent.
#[derive(Clone, Default)]
pub struct FakeStore {
    pub habits: Arc<Mutex<Vec<NewHabit>>>,
    pub completions: Arc<Mutex<Vec<NewCompletion>>>,
    pub fail_create: Arc<AtomicBool>,
    pub fail_complete: Arc<AtomicBool>,
    /// Make `create_habit` panic, killing the generation task.
    pub panic_create: Arc<AtomicBool>,
}

impl FakeStore {
    pub fn habit_count(&self) -> usize {
        self.habits.lock().unwrap().len()
    }

    pub fn completion_count(&self) -> usize {
        self.completions.lock().unwrap().len()
    }
}

fn unavailable() -> ClientError {
    ClientError::Status {
        status: 503,
        body: "unavailable".into(),
    }
}

impl ActivityStore for FakeStore {
    async fn create_habit(&self, habit: &NewHabit) -> Result<String, ClientError> {
        if self.panic_create.load(Ordering::SeqCst) {
            panic!("activity store crashed");
        }
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.habits.lock().unwrap().push(habit.clone());
        Ok(habit.id.clone())
    }

    async fn record_completion(&self, completion: &NewCompletion) -> Result<(), ClientError> {
        if self.fail_complete.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.completions.lock().unwrap().push(completion.clone());
        Ok(())
    }
}

pub fn simulator(interval: Duration) -> (Simulator<FakeStore>, FakeStore) {
    let store = FakeStore::default();
    let config = SimulatorConfig {
        interval,
        catalog_size: 5,
        seed: Some(7),
        ..SimulatorConfig::default()
    };
    let sim = Simulator::new(Catalog::seeded(5, Some(7)), store.clone(), &config);
    (sim, store)
}

/// Poll `cond` every 50ms until it holds or `limit` elapses.
pub async fn wait_for(limit: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    cond()
}

pub fn count_matching(logs: &[String], needle: &str) -> usize {
    logs.iter().filter(|l| l.contains(needle)).count()
}
