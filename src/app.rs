use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, patch, post, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/today", get(handlers::get_today))
        .route("/api/:tier/mission", get(handlers::get_mission).put(handlers::save_mission))
        .route("/api/:tier/mission/prompts", get(handlers::get_prompts))
        .route("/api/:tier/:habit/tracker", get(handlers::get_tracker))
        .route(
            "/api/:tier/:habit/tracker/:date",
            put(handlers::record_completion).delete(handlers::clear_completion),
        )
        .route("/api/:tier/:habit/tracker/:date/toggle", post(handlers::toggle_completion))
        .route("/api/:tier/:habit/streaks", get(handlers::get_streaks))
        .route(
            "/api/:tier/:habit/planner",
            get(handlers::get_planner).post(handlers::add_entry),
        )
        .route("/api/:tier/:habit/planner/entries", get(handlers::list_entries))
        .route(
            "/api/:tier/:habit/planner/:id",
            patch(handlers::edit_entry).delete(handlers::delete_entry),
        )
        .route("/api/:tier/:habit/planner/:id/toggle", post(handlers::toggle_occurrence))
        .with_state(state)
}
