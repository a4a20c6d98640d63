use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/fast", get(handlers::get_fast))
        .route("/api/fast/start", post(handlers::start_fast))
        .route("/api/fast/pause", post(handlers::pause_fast))
        .route("/api/fast/resume", post(handlers::resume_fast))
        .route("/api/fast/end", post(handlers::end_fast))
        .route("/api/fast/sync", post(handlers::sync_fast))
        .route("/api/fast/history", get(handlers::fast_history))
        .route("/api/log/weight", post(handlers::log_weight))
        .route("/api/log/hydration", post(handlers::log_hydration))
        .route("/api/log/mood", post(handlers::log_mood))
        .route("/api/log/meal", post(handlers::log_meal))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/analytics", get(handlers::get_analytics))
        .route("/api/checkin", post(handlers::checkin))
        .route("/api/circles", get(handlers::list_circles).post(handlers::create_circle))
        .route("/api/circles/:id/join", post(handlers::join_circle))
        .route("/api/circles/:id/leave", post(handlers::leave_circle))
        .route("/api/circles/:id/members", get(handlers::circle_members))
        .route("/api/circles/:id/buddies", get(handlers::get_buddies).post(handlers::set_buddies))
        .route("/api/recipes", get(handlers::recipes))
        .route("/api/coaching", post(handlers::coaching))
        .route("/api/settings", get(handlers::get_settings).put(handlers::update_settings))
        .route("/api/cognitive/start", post(handlers::cognitive_start))
        .route("/api/cognitive/trial", post(handlers::cognitive_trial))
        .route("/api/cognitive/finish", post(handlers::cognitive_finish))
        .route("/api/toasts", get(handlers::toasts))
        .route("/api/nav", post(handlers::navigate))
        .route("/api/queue", get(handlers::pending_queue))
        .route("/api/queue/replay", post(handlers::replay_queue))
        .route("/api/notifications/render", post(handlers::render_notification))
        .with_state(state)
}
