//! Simulator feeding a real activity store over HTTP.

mod common;

use std::sync::Arc;
use std::time::Duration;

use habit_core::api::HealthResponse;
use habit_daemon::api::{router, AppState};
use habit_daemon::store::MemoryStore;
use habit_simulator::{Catalog, HttpActivityStore, Simulator, SimulatorConfig};

use common::{count_matching, wait_for};

async fn start_daemon() -> String {
    let app = router(AppState::new(Arc::new(MemoryStore::new())).unwrap());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn generated_activity_reaches_the_store() {
    let base = start_daemon().await;
    let config = SimulatorConfig {
        store_url: base.clone(),
        interval: Duration::from_millis(200),
        ..SimulatorConfig::default()
    };
    let store = HttpActivityStore::new(&config.store_url, config.request_timeout).unwrap();
    let sim = Simulator::new(Catalog::seeded(4, Some(1)), store, &config);

    sim.toggle_task("task_1").unwrap();
    sim.toggle_task("task_2").unwrap();
    sim.toggle_run().unwrap();

    assert!(
        wait_for(Duration::from_secs(10), || {
            count_matching(&sim.logs(), "Successfully completed habit") >= 2
        })
        .await,
        "logs: {:?}",
        sim.logs()
    );
    sim.shutdown().await;
    assert_eq!(count_matching(&sim.logs(), "Failed"), 0);

    let health: HealthResponse = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(health.habits_count >= 2);
    assert_eq!(health.completions_count, health.habits_count);
}

#[tokio::test]
async fn unreachable_store_is_logged() {
    let config = SimulatorConfig {
        store_url: "http://127.0.0.1:1".into(),
        interval: Duration::from_millis(100),
        request_timeout: Duration::from_millis(500),
        ..SimulatorConfig::default()
    };
    let store = HttpActivityStore::new(&config.store_url, config.request_timeout).unwrap();
    let sim = Simulator::new(Catalog::seeded(2, Some(1)), store, &config);
    sim.toggle_task("task_1").unwrap();
    sim.toggle_run().unwrap();

    assert!(
        wait_for(Duration::from_secs(10), || {
            count_matching(&sim.logs(), "Failed to create habit 'Task 1'") >= 1
        })
        .await
    );
    assert!(sim.is_running());
    sim.shutdown().await;
}
