use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::header,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use habit_core::api::{HealthResponse, ServiceInfo, StatusResponse, UserQuery};
use habit_core::model::{Analytics, Habit, HabitCompletion, NewCompletion, NewHabit, NewUser, UserProfile};
use habit_core::validation::{validate_new_completion, validate_new_habit, validate_new_user};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::error::ApiError;
use crate::metrics::{track_requests, MetricsError, RequestMetrics};
use crate::store::{Store, StoreError, UserRecord};
use crate::tracker;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub metrics: RequestMetrics,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Result<Self, MetricsError> {
        Ok(Self {
            store,
            metrics: RequestMetrics::new()?,
        })
    }

    /// Run a store operation on the blocking pool; store backends do
    /// synchronous I/O.
    async fn with_store<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Store) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|e| ApiError::Internal(format!("store task failed: {e}")))?
            .map_err(ApiError::from)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/users", post(create_user))
        .route("/users/{id}", get(get_user))
        .route("/habits", get(list_habits).post(create_habit))
        .route("/habits/{id}", get(get_habit).delete(delete_habit))
        .route("/habits/{id}/completions", get(list_completions))
        .route("/completions", post(record_completion))
        .route("/analytics/{user_id}", get(user_analytics))
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_requests,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "Habit tracker service is running".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        features: vec![
            "users".into(),
            "habits".into(),
            "completions".into(),
            "streaks".into(),
            "analytics".into(),
            "metrics".into(),
        ],
    })
}

async fn health(State(st): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let counts = st.with_store(|store| store.counts()).await?;
    Ok(Json(HealthResponse {
        status: "healthy".into(),
        users_count: counts.users,
        habits_count: counts.habits,
        completions_count: counts.completions,
    }))
}

async fn metrics(State(st): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let body = st.metrics.encode_text()?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}

fn profile(user: UserRecord, habits: Vec<Habit>) -> UserProfile {
    UserProfile {
        id: user.id,
        name: user.name,
        habits,
        preferred_notification_time: user.preferred_notification_time,
        timezone: user.timezone,
        created_at: user.created_at,
    }
}

async fn create_user(
    State(st): State<AppState>,
    Json(req): Json<NewUser>,
) -> Result<Json<UserProfile>, ApiError> {
    validate_new_user(&req)?;
    let record = UserRecord::from(req);
    let stored = record.clone();
    st.with_store(move |store| store.insert_user(&stored)).await?;
    info!(user_id = %record.id, "created user");
    Ok(Json(profile(record, vec![])))
}

async fn get_user(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>, ApiError> {
    let lookup = id.clone();
    let found = st
        .with_store(move |store| {
            let Some(user) = store.get_user(&lookup)? else {
                return Ok(None);
            };
            let habits = store.list_habits(Some(&lookup))?;
            Ok(Some((user, habits)))
        })
        .await?;
    let (user, habits) = found.ok_or_else(|| ApiError::not_found(format!("user {id}")))?;
    Ok(Json(profile(user, habits)))
}

async fn create_habit(
    State(st): State<AppState>,
    Query(q): Query<UserQuery>,
    Json(req): Json<NewHabit>,
) -> Result<Json<Habit>, ApiError> {
    validate_new_habit(&req)?;
    let habit = Habit::from_new(req, q.user_id);
    let stored = habit.clone();
    st.with_store(move |store| {
        if let Some(user_id) = &stored.user_id {
            if store.get_user(user_id)?.is_none() {
                return Err(StoreError::NotFound(format!("user {user_id}")));
            }
        }
        store.insert_habit(&stored)
    })
    .await?;
    info!(habit_id = %habit.id, name = %habit.name, "created habit");
    Ok(Json(habit))
}

async fn list_habits(
    State(st): State<AppState>,
    Query(q): Query<UserQuery>,
) -> Result<Json<Vec<Habit>>, ApiError> {
    let habits = st
        .with_store(move |store| store.list_habits(q.user_id.as_deref()))
        .await?;
    Ok(Json(habits))
}

async fn get_habit(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Habit>, ApiError> {
    let lookup = id.clone();
    let habit = st
        .with_store(move |store| store.get_habit(&lookup))
        .await?
        .ok_or_else(|| ApiError::not_found(format!("habit {id}")))?;
    Ok(Json(habit))
}

async fn delete_habit(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let target = id.clone();
    if !st.with_store(move |store| store.deactivate_habit(&target)).await? {
        return Err(ApiError::not_found(format!("habit {id}")));
    }
    info!(habit_id = %id, "deactivated habit");
    Ok(Json(StatusResponse::success()))
}

async fn record_completion(
    State(st): State<AppState>,
    Json(req): Json<NewCompletion>,
) -> Result<Json<HabitCompletion>, ApiError> {
    validate_new_completion(&req)?;
    let (completion, habit) = st
        .with_store(move |store| store.record_completion(&req))
        .await?;
    info!(
        habit_id = %habit.id,
        streak = habit.streak,
        success_rate = habit.success_rate,
        "recorded completion"
    );
    Ok(Json(completion))
}

async fn list_completions(
    State(st): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<HabitCompletion>>, ApiError> {
    let lookup = id.clone();
    let completions = st
        .with_store(move |store| {
            if store.get_habit(&lookup)?.is_none() {
                return Ok(None);
            }
            store.list_completions(&lookup).map(Some)
        })
        .await?
        .ok_or_else(|| ApiError::not_found(format!("habit {id}")))?;
    Ok(Json(completions))
}

async fn user_analytics(
    State(st): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Analytics>, ApiError> {
    let lookup = user_id.clone();
    let habits = st
        .with_store(move |store| store.list_habits(Some(&lookup)))
        .await?;
    Ok(Json(tracker::analytics(&user_id, &habits)))
}
