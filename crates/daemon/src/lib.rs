#![forbid(unsafe_code)]

//! Activity store: REST backend recording users, habits and completions.

use std::sync::Arc;

use anyhow::Context;

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod store;
pub mod tracker;

use crate::config::DaemonConfig;
use crate::store::{MemoryStore, SqliteStore, Store};

/// Open the store selected by `config`.
pub fn open_store(config: &DaemonConfig) -> anyhow::Result<Arc<dyn Store>> {
    if config.in_memory {
        return Ok(Arc::new(MemoryStore::new()));
    }
    let store = SqliteStore::open(&config.db_path)
        .with_context(|| format!("opening sqlite store at {}", config.db_path.display()))?;
    Ok(Arc::new(store))
}
