use crate::calendar::{Period, Window, parse_date, parse_month, parse_time};
use crate::content::mission_prompts;
use crate::errors::AppError;
use crate::models::{
    AgeTier, CompletionResponse, EditEntryRequest, EntryEdit, MissionRequest, MissionStatement,
    MonthQuery, NewEntry, NewEntryRequest, Occurrence, PlannerEntry, PlannerQuery, PlannerResponse,
    PromptsResponse, Recurrence, ScopeKey, StreakSummary, TodayResponse, ToggleRequest,
    TrackerMonth,
};
use crate::engine::ProgressEngine;
use crate::planner::group_by_day;
use crate::state::AppState;
use crate::storage::JsonFileStore;
use crate::ui::render_index;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use chrono::NaiveDate;
use tokio::sync::MutexGuard;

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let today = state.clock.today();
    let engine = state.engine.lock().await;
    let mut rows = Vec::new();
    for tier in AgeTier::ALL {
        for habit in 1..=7 {
            let scope = ScopeKey::new(tier, habit)?;
            rows.push((scope, engine.streaks(&scope, today)?));
        }
    }
    Ok(Html(render_index(today, &rows)))
}

pub async fn get_today(State(state): State<AppState>) -> Json<TodayResponse> {
    Json(TodayResponse {
        date: state.clock.today().to_string(),
    })
}

pub async fn get_tracker(
    State(state): State<AppState>,
    Path((tier, habit)): Path<(String, String)>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<TrackerMonth>, AppError> {
    let scope = ScopeKey::parse(&tier, &habit)?;
    let today = state.clock.today();
    let month = match query.month.as_deref() {
        Some(raw) => parse_month(raw)?,
        None => today,
    };

    let engine = state.engine.lock().await;
    Ok(Json(engine.tracker_month(&scope, month, today)?))
}

pub async fn record_completion(
    State(state): State<AppState>,
    Path((tier, habit, date)): Path<(String, String, String)>,
) -> Result<Json<CompletionResponse>, AppError> {
    let (scope, date) = (ScopeKey::parse(&tier, &habit)?, parse_date(&date)?);
    let today = state.clock.today();

    let mut engine = state.engine.lock().await;
    engine.record_completion(&scope, date, today).await?;
    let streaks = engine.streaks(&scope, today)?;
    Ok(completion_response(&streaks, scope, date, true))
}

pub async fn clear_completion(
    State(state): State<AppState>,
    Path((tier, habit, date)): Path<(String, String, String)>,
) -> Result<Json<CompletionResponse>, AppError> {
    let (scope, date) = (ScopeKey::parse(&tier, &habit)?, parse_date(&date)?);
    let today = state.clock.today();

    let mut engine = state.engine.lock().await;
    engine.clear_completion(&scope, date, today).await?;
    let streaks = engine.streaks(&scope, today)?;
    Ok(completion_response(&streaks, scope, date, false))
}

pub async fn toggle_completion(
    State(state): State<AppState>,
    Path((tier, habit, date)): Path<(String, String, String)>,
) -> Result<Json<CompletionResponse>, AppError> {
    let (scope, date) = (ScopeKey::parse(&tier, &habit)?, parse_date(&date)?);
    let today = state.clock.today();

    let mut engine = state.engine.lock().await;
    let completed = engine.toggle_completion(&scope, date, today).await?;
    let streaks = engine.streaks(&scope, today)?;
    Ok(completion_response(&streaks, scope, date, completed))
}

pub async fn get_streaks(
    State(state): State<AppState>,
    Path((tier, habit)): Path<(String, String)>,
) -> Result<Json<StreakSummary>, AppError> {
    let scope = ScopeKey::parse(&tier, &habit)?;
    let engine = state.engine.lock().await;
    Ok(Json(engine.streaks(&scope, state.clock.today())?))
}

pub async fn get_planner(
    State(state): State<AppState>,
    Path((tier, habit)): Path<(String, String)>,
    Query(query): Query<PlannerQuery>,
) -> Result<Json<PlannerResponse>, AppError> {
    let scope = ScopeKey::parse(&tier, &habit)?;
    let period = match query.period.as_deref() {
        Some(raw) => raw.parse::<Period>()?,
        None => Period::Week,
    };
    let anchor = match query.date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => state.clock.today(),
    };
    let window = Window::shifted(period, anchor, query.offset.unwrap_or(0))?;

    let engine = planner_engine(&state, &scope).await?;
    let occurrences = engine.list_occurrences(&scope, window.start, window.end)?;
    Ok(Json(PlannerResponse {
        scope,
        period: period.as_str().to_string(),
        start_date: window.start,
        end_date: window.end,
        days: group_by_day(&window, occurrences),
    }))
}

pub async fn list_entries(
    State(state): State<AppState>,
    Path((tier, habit)): Path<(String, String)>,
) -> Result<Json<Vec<PlannerEntry>>, AppError> {
    let scope = ScopeKey::parse(&tier, &habit)?;
    let engine = planner_engine(&state, &scope).await?;
    Ok(Json(engine.list_entries(&scope)?))
}

pub async fn add_entry(
    State(state): State<AppState>,
    Path((tier, habit)): Path<(String, String)>,
    Json(payload): Json<NewEntryRequest>,
) -> Result<(StatusCode, Json<PlannerEntry>), AppError> {
    let scope = ScopeKey::parse(&tier, &habit)?;
    let input = NewEntry {
        date: parse_date(&payload.date)?,
        time: parse_time(&payload.time)?,
        activity: payload.activity,
        recurrence: parse_recurrence(payload.recurrence.as_deref())?.unwrap_or_default(),
    };

    let mut engine = planner_engine(&state, &scope).await?;
    let entry = engine.add_entry(&scope, input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn edit_entry(
    State(state): State<AppState>,
    Path((tier, habit, id)): Path<(String, String, String)>,
    Json(payload): Json<EditEntryRequest>,
) -> Result<Json<PlannerEntry>, AppError> {
    let scope = ScopeKey::parse(&tier, &habit)?;
    let edit = EntryEdit {
        time: payload.time.as_deref().map(parse_time).transpose()?,
        activity: payload.activity,
        recurrence: parse_recurrence(payload.recurrence.as_deref())?,
    };

    let mut engine = planner_engine(&state, &scope).await?;
    Ok(Json(engine.edit_entry(&scope, &id, edit).await?))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Path((tier, habit, id)): Path<(String, String, String)>,
) -> Result<StatusCode, AppError> {
    let scope = ScopeKey::parse(&tier, &habit)?;
    let mut engine = planner_engine(&state, &scope).await?;
    engine.delete_entry(&scope, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_occurrence(
    State(state): State<AppState>,
    Path((tier, habit, id)): Path<(String, String, String)>,
    Json(payload): Json<ToggleRequest>,
) -> Result<Json<Occurrence>, AppError> {
    let scope = ScopeKey::parse(&tier, &habit)?;
    let date = parse_date(&payload.date)?;
    let today = state.clock.today();

    let mut engine = planner_engine(&state, &scope).await?;
    Ok(Json(engine.toggle_occurrence(&scope, &id, date, today).await?))
}

pub async fn get_mission(
    State(state): State<AppState>,
    Path(tier): Path<String>,
) -> Result<Json<MissionStatement>, AppError> {
    let tier = tier.parse::<AgeTier>()?;
    let engine = state.engine.lock().await;
    Ok(Json(engine.mission_statement(tier)?))
}

pub async fn save_mission(
    State(state): State<AppState>,
    Path(tier): Path<String>,
    Json(payload): Json<MissionRequest>,
) -> Result<Json<MissionStatement>, AppError> {
    let tier = tier.parse::<AgeTier>()?;
    let today = state.clock.today();
    let mut engine = state.engine.lock().await;
    Ok(Json(engine.save_mission_statement(tier, &payload.statement, today).await?))
}

pub async fn get_prompts(Path(tier): Path<String>) -> Result<Json<PromptsResponse>, AppError> {
    let tier = tier.parse::<AgeTier>()?;
    Ok(Json(PromptsResponse {
        tier,
        prompts: mission_prompts(tier).to_vec(),
    }))
}

/// Locks the engine, first giving a never-used planner scope its samples.
async fn planner_engine<'a>(
    state: &'a AppState,
    scope: &ScopeKey,
) -> Result<MutexGuard<'a, ProgressEngine<JsonFileStore>>, AppError> {
    let mut engine = state.engine.lock().await;
    engine.seed_planner(scope, state.clock.today()).await?;
    Ok(engine)
}

fn parse_recurrence(raw: Option<&str>) -> Result<Option<Recurrence>, AppError> {
    Ok(raw.map(str::parse::<Recurrence>).transpose()?)
}

fn completion_response(
    streaks: &StreakSummary,
    scope: ScopeKey,
    date: NaiveDate,
    completed: bool,
) -> Json<CompletionResponse> {
    Json(CompletionResponse {
        scope,
        date,
        completed,
        current_streak: streaks.current,
        best_streak: streaks.best,
    })
}
