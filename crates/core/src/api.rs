//! Request and response bodies shared by the daemon, the simulator and
//! their clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generic acknowledgement: `{"status":"success"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    /// Always `"success"`.
    pub status: String,
}

impl StatusResponse {
    /// The success acknowledgement.
    pub fn success() -> Self {
        Self {
            status: "success".into(),
        }
    }
}

/// Error body: `{"status":"error","message":...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Always `"error"`.
    pub status: String,
    /// Human-readable reason.
    pub message: String,
}

impl ErrorResponse {
    /// Build an error body.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".into(),
            message: message.into(),
        }
    }
}

/// `POST /interval` body. The value is kept loose so that non-numeric input
/// can be reported as a validation failure rather than a decode error.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IntervalRequest {
    /// Seconds between generation events; must be a positive number.
    #[serde(default)]
    pub interval: Option<serde_json::Value>,
}

/// `POST /run/toggle` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunToggleResponse {
    /// Always `"success"`.
    pub status: String,
    /// Run flag after the toggle.
    pub is_running: bool,
}

/// `GET /logs` response, oldest entry first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogsResponse {
    /// Formatted entries.
    pub logs: Vec<String>,
}

/// `GET /next_event` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NextEventResponse {
    /// `None` while the simulation is stopped.
    #[serde(with = "crate::timestamp::option")]
    pub next_event_time: Option<DateTime<Utc>>,
}

/// A catalog entry as shown on the control surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskView {
    /// Template id, e.g. `task_3`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// One of the catalog categories.
    pub category: String,
    /// 1-5 scale.
    pub difficulty: u8,
    /// Whether the template is in the active set.
    pub active: bool,
}

/// `GET /` on the simulator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulatorSnapshot {
    /// Every catalog template with its active flag.
    pub tasks: Vec<TaskView>,
    /// Seconds.
    pub interval: f64,
    /// Whether the generation loop is enabled.
    pub is_running: bool,
}

/// `GET /` on the daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceInfo {
    /// Greeting shown by the service.
    pub message: String,
    /// Crate version.
    pub version: String,
    /// Capabilities the service offers.
    pub features: Vec<String>,
}

/// `GET /health` on the daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// Always `"healthy"`.
    pub status: String,
    /// Stored users.
    pub users_count: u64,
    /// Stored habits, active or not.
    pub habits_count: u64,
    /// Stored completions.
    pub completions_count: u64,
}

/// Optional `?user_id=` query.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserQuery {
    /// Restrict to habits owned by this user.
    #[serde(default)]
    pub user_id: Option<String>,
}
