//! Client side of the activity store.

use std::future::Future;
use std::time::Duration;

use habit_core::model::{NewCompletion, NewHabit};
use thiserror::Error;

/// Failure talking to the activity store.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("activity store returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("activity store response has no habit id")]
    MissingId,
}

/// The two calls the generation loop makes.
pub trait ActivityStore: Send + Sync + 'static {
    /// Create a habit; resolves to the server-assigned id.
    fn create_habit(&self, habit: &NewHabit) -> impl Future<Output = Result<String, ClientError>> + Send;

    /// Record a completion against an existing habit.
    fn record_completion(
        &self,
        completion: &NewCompletion,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// [`ActivityStore`] over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpActivityStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpActivityStore {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ClientError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

impl ActivityStore for HttpActivityStore {
    async fn create_habit(&self, habit: &NewHabit) -> Result<String, ClientError> {
        let url = format!("{}/habits", self.base_url);
        let resp = self.client.post(&url).json(habit).send().await?;
        let created: serde_json::Value = Self::check(resp).await?.json().await?;
        created
            .get("id")
            .and_then(serde_json::Value::as_str)
            .map(String::from)
            .ok_or(ClientError::MissingId)
    }

    async fn record_completion(&self, completion: &NewCompletion) -> Result<(), ClientError> {
        let url = format!("{}/completions", self.base_url);
        let resp = self.client.post(&url).json(completion).send().await?;
        Self::check(resp).await?;
        Ok(())
    }
}
