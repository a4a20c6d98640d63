use crate::api::LogKind;
use crate::app_store::{Tab, Toast, ToastKind};
use crate::checkin;
use crate::circles::CircleError;
use crate::cognitive::{CognitiveError, CognitiveSummary, SessionStatus};
use crate::errors::{ApiError, AppError};
use crate::fasting::{FastError, SyncOutcome};
use crate::models::{
    ApiResponse, BuddyRequest, CheckInInputs, CheckInResult, Circle, CircleMember, CoachingReply,
    CoachingRequest, CompletedFast, CreateCircleRequest, FastSnapshot, HydrationEntry, LogReceipt,
    MealEntry, MoodEntry, NavRequest, Recipe, RecipeQuery, Settings, StartFastRequest,
    StatsResponse, TrialRequest, WeightEntry,
};
use crate::offline::{QueuedWrite, ReplayReport};
use crate::push::{self, Notification, PushPayload};
use crate::state::AppState;
use crate::stats::build_stats;
use crate::sync::sync_once;
use crate::timer;
use crate::ui::render_index;
use axum::{
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

type JsonResult<T> = Result<Json<ApiResponse<T>>, AppError>;

fn ok<T>(data: T) -> JsonResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

/// Maps store and backend failures onto the HTTP surface.
trait IntoAppError {
    fn into_app_error(self, login_url: &str) -> AppError;
}

impl IntoAppError for ApiError {
    fn into_app_error(self, login_url: &str) -> AppError {
        AppError::api(self, login_url)
    }
}

impl IntoAppError for FastError {
    fn into_app_error(self, login_url: &str) -> AppError {
        match self {
            FastError::Api(err) => AppError::api(err, login_url),
            other => AppError::bad_request(other.to_string()),
        }
    }
}

impl IntoAppError for CircleError {
    fn into_app_error(self, login_url: &str) -> AppError {
        match self {
            CircleError::Api(err) => AppError::api(err, login_url),
            other => AppError::bad_request(other.to_string()),
        }
    }
}

impl IntoAppError for CognitiveError {
    fn into_app_error(self, login_url: &str) -> AppError {
        match self {
            CognitiveError::Api(err) => AppError::api(err, login_url),
            other => AppError::bad_request(other.to_string()),
        }
    }
}

impl AppState {
    fn fail<E: IntoAppError>(&self, err: E) -> AppError {
        err.into_app_error(&self.config.login_url)
    }
}

pub async fn index(State(state): State<AppState>) -> Response {
    match sync_once(&state).await {
        Err(FastError::Api(ApiError::Unauthorized { .. })) => {
            return Redirect::to(&state.config.login_url).into_response();
        }
        Err(err) => warn!("initial sync failed: {err}"),
        Ok(_) => {}
    }

    let snapshot = state.fasting.snapshot(Utc::now()).await;
    let tab = state.app.tab().await;
    Html(render_index(&snapshot, tab)).into_response()
}

pub async fn get_fast(State(state): State<AppState>) -> JsonResult<FastSnapshot> {
    ok(state.fasting.snapshot(Utc::now()).await)
}

pub async fn start_fast(
    State(state): State<AppState>,
    Json(payload): Json<StartFastRequest>,
) -> JsonResult<FastSnapshot> {
    let protocol = match (payload.protocol, payload.target_hours) {
        (None, None) => state.api.settings().await.ok().map(|settings| settings.default_protocol),
        (protocol, _) => protocol,
    };

    state
        .fasting
        .start(&state.api, protocol, payload.target_hours)
        .await
        .map_err(|err| state.fail(err))?;
    state.app.push_toast(ToastKind::Success, "Fast started").await;
    ok(state.fasting.snapshot(Utc::now()).await)
}

pub async fn pause_fast(State(state): State<AppState>) -> JsonResult<FastSnapshot> {
    state
        .fasting
        .pause(&state.api)
        .await
        .map_err(|err| state.fail(err))?;
    ok(state.fasting.snapshot(Utc::now()).await)
}

pub async fn resume_fast(State(state): State<AppState>) -> JsonResult<FastSnapshot> {
    state
        .fasting
        .resume(&state.api)
        .await
        .map_err(|err| state.fail(err))?;
    ok(state.fasting.snapshot(Utc::now()).await)
}

#[derive(Serialize)]
pub struct EndedFast {
    pub fasted: String,
    pub elapsed_ms: i64,
    pub reached_target: bool,
}

pub async fn end_fast(State(state): State<AppState>) -> JsonResult<EndedFast> {
    let before = state.fasting.snapshot(Utc::now()).await;
    state
        .fasting
        .end(&state.api)
        .await
        .map_err(|err| state.fail(err))?;

    let ended = EndedFast {
        fasted: timer::format_elapsed(before.elapsed_ms),
        elapsed_ms: before.elapsed_ms,
        reached_target: before.progress >= 100.0,
    };
    state
        .app
        .push_toast(ToastKind::Success, format!("Fast ended after {}", ended.fasted))
        .await;
    ok(ended)
}

#[derive(Serialize)]
pub struct SyncResult {
    pub outcome: SyncOutcome,
    pub snapshot: FastSnapshot,
    pub last_synced: Option<DateTime<Utc>>,
}

pub async fn sync_fast(State(state): State<AppState>) -> JsonResult<SyncResult> {
    let outcome = sync_once(&state).await.map_err(|err| state.fail(err))?;
    ok(SyncResult {
        outcome,
        snapshot: state.fasting.snapshot(Utc::now()).await,
        last_synced: state.fasting.last_synced().await,
    })
}

pub async fn fast_history(State(state): State<AppState>) -> JsonResult<Vec<CompletedFast>> {
    let history = state.api.fast_history().await.map_err(|err| state.fail(err))?;
    ok(history)
}

async fn log_entry(state: &AppState, kind: LogKind, payload: Value) -> JsonResult<LogReceipt> {
    match state.api.log(kind, &payload).await {
        Ok(record) => ok(LogReceipt {
            queued: false,
            record: Some(record),
        }),
        Err(err) if err.is_network() => {
            state.queue.enqueue(kind, payload).await?;
            state
                .app
                .push_toast(
                    ToastKind::Info,
                    "You're offline. This entry will sync when you reconnect.",
                )
                .await;
            ok(LogReceipt {
                queued: true,
                record: None,
            })
        }
        Err(err) => Err(state.fail(err)),
    }
}

fn to_payload<T: Serialize>(entry: &T) -> Result<Value, AppError> {
    serde_json::to_value(entry).map_err(AppError::internal)
}

pub async fn log_weight(
    State(state): State<AppState>,
    Json(mut entry): Json<WeightEntry>,
) -> JsonResult<LogReceipt> {
    if !(20.0..=400.0).contains(&entry.weight_kg) {
        return Err(AppError::bad_request("weight_kg must be between 20 and 400"));
    }
    entry.logged_at.get_or_insert_with(Utc::now);
    log_entry(&state, LogKind::Weight, to_payload(&entry)?).await
}

pub async fn log_hydration(
    State(state): State<AppState>,
    Json(mut entry): Json<HydrationEntry>,
) -> JsonResult<LogReceipt> {
    if entry.amount_ml == 0 || entry.amount_ml > 5_000 {
        return Err(AppError::bad_request("amount_ml must be between 1 and 5000"));
    }
    entry.logged_at.get_or_insert_with(Utc::now);
    log_entry(&state, LogKind::Hydration, to_payload(&entry)?).await
}

pub async fn log_mood(
    State(state): State<AppState>,
    Json(mut entry): Json<MoodEntry>,
) -> JsonResult<LogReceipt> {
    if !(1..=5).contains(&entry.mood) {
        return Err(AppError::bad_request("mood must be between 1 and 5"));
    }
    entry.logged_at.get_or_insert_with(Utc::now);
    log_entry(&state, LogKind::Mood, to_payload(&entry)?).await
}

pub async fn log_meal(
    State(state): State<AppState>,
    Json(mut entry): Json<MealEntry>,
) -> JsonResult<LogReceipt> {
    entry.description = entry.description.trim().to_string();
    if entry.description.is_empty() {
        return Err(AppError::bad_request("description must not be empty"));
    }
    entry.logged_at.get_or_insert_with(Utc::now);
    log_entry(&state, LogKind::Meal, to_payload(&entry)?).await
}

pub async fn get_stats(State(state): State<AppState>) -> JsonResult<StatsResponse> {
    let history = state.api.fast_history().await.map_err(|err| state.fail(err))?;
    ok(build_stats(&history))
}

pub async fn get_analytics(State(state): State<AppState>) -> JsonResult<Value> {
    let analytics = state.api.analytics().await.map_err(|err| state.fail(err))?;
    ok(analytics)
}

pub async fn checkin(
    State(state): State<AppState>,
    Json(inputs): Json<CheckInInputs>,
) -> JsonResult<CheckInResult> {
    let result = checkin::evaluate(inputs);
    state
        .api
        .save_checkin(&result)
        .await
        .map_err(|err| state.fail(err))?;
    ok(result)
}

pub async fn list_circles(State(state): State<AppState>) -> JsonResult<Vec<Circle>> {
    let circles = state
        .circles
        .refresh(&state.api)
        .await
        .map_err(|err| state.fail(err))?;
    ok(circles)
}

pub async fn create_circle(
    State(state): State<AppState>,
    Json(payload): Json<CreateCircleRequest>,
) -> JsonResult<Circle> {
    let circle = state
        .circles
        .create(&state.api, &payload.name, payload.description.as_deref())
        .await
        .map_err(|err| state.fail(err))?;
    ok(circle)
}

pub async fn join_circle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> JsonResult<Circle> {
    let circle = state
        .circles
        .join(&state.api, &id)
        .await
        .map_err(|err| state.fail(err))?;
    state
        .app
        .push_toast(ToastKind::Success, format!("Joined {}", circle.name))
        .await;
    ok(circle)
}

pub async fn leave_circle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> JsonResult<Vec<Circle>> {
    state
        .circles
        .leave(&state.api, &id)
        .await
        .map_err(|err| state.fail(err))?;
    ok(state.circles.circles().await)
}

pub async fn circle_members(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> JsonResult<Vec<CircleMember>> {
    let members = state
        .circles
        .members(&state.api, &id)
        .await
        .map_err(|err| state.fail(err))?;
    ok(members)
}

pub async fn get_buddies(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> JsonResult<Vec<String>> {
    ok(state.circles.buddies(&id).await)
}

pub async fn set_buddies(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<BuddyRequest>,
) -> JsonResult<Vec<String>> {
    let buddies = state
        .circles
        .set_buddies(&state.api, &id, &payload.buddy_ids)
        .await
        .map_err(|err| state.fail(err))?;
    ok(buddies)
}

pub async fn recipes(
    State(state): State<AppState>,
    Query(query): Query<RecipeQuery>,
) -> JsonResult<Vec<Recipe>> {
    let recipes = state.api.recipes(&query).await.map_err(|err| state.fail(err))?;
    ok(recipes)
}

pub async fn coaching(
    State(state): State<AppState>,
    Json(payload): Json<CoachingRequest>,
) -> JsonResult<CoachingReply> {
    let topic = payload.topic.trim();
    if topic.is_empty() {
        return Err(AppError::bad_request("topic must not be empty"));
    }
    let context = state.fasting.snapshot(Utc::now()).await;
    let reply = state
        .api
        .coaching(topic, payload.question.as_deref(), &context)
        .await
        .map_err(|err| state.fail(err))?;
    ok(reply)
}

pub async fn get_settings(State(state): State<AppState>) -> JsonResult<Settings> {
    let settings = state.api.settings().await.map_err(|err| state.fail(err))?;
    ok(settings)
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(settings): Json<Settings>,
) -> JsonResult<Settings> {
    if settings.hydration_goal_ml == 0 || settings.hydration_goal_ml > 10_000 {
        return Err(AppError::bad_request("hydration_goal_ml must be between 1 and 10000"));
    }
    let saved = state
        .api
        .update_settings(&settings)
        .await
        .map_err(|err| state.fail(err))?;
    state.app.push_toast(ToastKind::Success, "Settings saved").await;
    ok(saved)
}

pub async fn cognitive_start(State(state): State<AppState>) -> JsonResult<SessionStatus> {
    ok(state.cognitive.start(Utc::now()).await)
}

pub async fn cognitive_trial(
    State(state): State<AppState>,
    Json(payload): Json<TrialRequest>,
) -> JsonResult<SessionStatus> {
    let status = state
        .cognitive
        .record(payload.reaction_ms)
        .await
        .map_err(|err| state.fail(err))?;
    ok(status)
}

pub async fn cognitive_finish(State(state): State<AppState>) -> JsonResult<CognitiveSummary> {
    let now = Utc::now();
    let fasted_ms = state.fasting.snapshot(now).await.elapsed_ms;
    let summary = state
        .cognitive
        .finish(&state.api, fasted_ms, now)
        .await
        .map_err(|err| state.fail(err))?;
    ok(summary)
}

pub async fn toasts(State(state): State<AppState>) -> JsonResult<Vec<Toast>> {
    ok(state.app.drain_toasts().await)
}

pub async fn navigate(
    State(state): State<AppState>,
    Json(payload): Json<NavRequest>,
) -> JsonResult<Tab> {
    state.app.navigate(payload.tab).await;
    ok(payload.tab)
}

pub async fn pending_queue(State(state): State<AppState>) -> JsonResult<Vec<QueuedWrite>> {
    ok(state.queue.pending().await)
}

pub async fn replay_queue(State(state): State<AppState>) -> JsonResult<ReplayReport> {
    ok(state.queue.replay(&state.api).await?)
}

pub async fn render_notification(Json(payload): Json<PushPayload>) -> JsonResult<Notification> {
    ok(push::render(payload))
}
