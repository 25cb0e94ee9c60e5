use std::net::SocketAddr;
use std::time::Duration;

use crate::catalog::DEFAULT_CATALOG_SIZE;
use crate::log_buffer::DEFAULT_LOG_CAPACITY;

#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub listen: SocketAddr,
    /// Base URL of the activity store REST API.
    pub store_url: String,
    pub interval: Duration,
    pub request_timeout: Duration,
    pub catalog_size: usize,
    /// Fixed seed for catalog generation; entropy when unset.
    pub seed: Option<u64>,
    pub log_capacity: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 5000)),
            store_url: "http://127.0.0.1:8000".into(),
            interval: Duration::from_secs(10),
            request_timeout: Duration::from_millis(5000),
            catalog_size: DEFAULT_CATALOG_SIZE,
            seed: None,
            log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}
