use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub listen: SocketAddr,
    pub db_path: PathBuf,
    /// Use a non-durable in-process store instead of SQLite.
    pub in_memory: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8000)),
            db_path: PathBuf::from(".habits/habits.db"),
            in_memory: false,
        }
    }
}
