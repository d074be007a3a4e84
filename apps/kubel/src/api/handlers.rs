//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Every edit opens an [`EvaluationSession`] on a copy of the stored
//! person, applies the change and persists the whole store before the
//! in-memory state is replaced. A failed save leaves the state untouched.

use super::{
    AppState,
    types::{
        ApiError, BirthdayRequest, DisplaySettingsRequest, HealthResponse, NameRequest,
        NoteRequest, PersonListOrderRequest, PersonResponse, PersonSummary, SelectionRequest,
        SelectionResponse,
    },
};
use crate::updater;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use kubel_core::{
    CategoryData, ChartPoint, Config, Data, EvaluationSession, KubelError, Person, PhaseSummary,
    PrintOptions, Report, UpdateState, save_config, save_data, today,
};

type ApiResult<T> = Result<Json<T>, ApiError>;

// =============================================================================
// HELPERS
// =============================================================================

/// Apply `edit` to a session on person `id` and persist the result.
async fn edit_person<T>(
    state: &AppState,
    id: &str,
    edit: impl FnOnce(&mut EvaluationSession<'_>) -> Result<T, KubelError>,
) -> Result<(T, Person), KubelError> {
    let mut data = state.data.write().await;
    let person = data.person(id)?.clone();

    let mut session = EvaluationSession::open(person, &state.schema);
    let value = edit(&mut session)?;

    let mut next: Data = data.clone();
    next.save_person(id, session.into_person(), Utc::now());
    save_data(state.gateway.as_ref(), &next)?;

    let person = next.person(id)?.clone();
    *data = next;
    Ok((value, person))
}

/// Copy of the stored person `id`.
async fn read_person(state: &AppState, id: &str) -> Result<Person, KubelError> {
    let data = state.data.read().await;
    Ok(data.person(id)?.clone())
}

// =============================================================================
// HEALTH / CATEGORIES
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Category definitions in file order.
pub async fn categories_handler(State(state): State<AppState>) -> Json<CategoryData> {
    Json(state.schema.as_ref().clone())
}

// =============================================================================
// PEOPLE
// =============================================================================

/// People list, sorted by the configured order.
pub async fn list_people_handler(State(state): State<AppState>) -> Json<Vec<PersonSummary>> {
    let (order, direction) = state.config.read().await.person_order();
    let data = state.data.read().await;
    Json(
        data.people_sorted(order, direction)
            .into_iter()
            .map(|(id, person)| PersonSummary::new(id, person))
            .collect(),
    )
}

/// Create an empty person.
pub async fn create_person_handler(
    State(state): State<AppState>,
    Json(request): Json<NameRequest>,
) -> Result<(StatusCode, Json<PersonResponse>), ApiError> {
    let mut data = state.data.write().await;
    let mut next = data.clone();
    let id = next.add_person(&request.name, &state.schema, Utc::now())?;
    save_data(state.gateway.as_ref(), &next)?;

    let person = next.person(&id)?.clone();
    *data = next;
    tracing::info!(person = %id, "Person created");
    Ok((StatusCode::CREATED, Json(PersonResponse { id, person })))
}

/// One person, reconciled against the current definitions.
pub async fn get_person_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<PersonResponse> {
    let person = read_person(&state, &id).await?;
    let session = EvaluationSession::open(person, &state.schema);
    Ok(Json(PersonResponse {
        id,
        person: session.into_person(),
    }))
}

pub async fn rename_person_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<NameRequest>,
) -> ApiResult<PersonResponse> {
    let mut data = state.data.write().await;
    let mut next = data.clone();
    next.rename_person(&id, &request.name, Utc::now())?;
    save_data(state.gateway.as_ref(), &next)?;

    let person = next.person(&id)?.clone();
    *data = next;
    Ok(Json(PersonResponse { id, person }))
}

/// Delete a person; unknown ids succeed as well.
pub async fn delete_person_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut data = state.data.write().await;
    if !data.people.contains_key(&id) {
        return Ok(StatusCode::NO_CONTENT);
    }

    let mut next = data.clone();
    next.delete_person(&id);
    save_data(state.gateway.as_ref(), &next)?;
    *data = next;
    tracing::info!(person = %id, "Person deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// EVALUATION EDITS
// =============================================================================

/// Click a selection on one entry (toggle, then auto-completion).
pub async fn select_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SelectionRequest>,
) -> ApiResult<SelectionResponse> {
    let (outcome, person) = edit_person(&state, &id, |session| {
        session.select(
            &request.category,
            &request.phase,
            request.entry,
            request.selection,
        )
    })
    .await?;

    if outcome.cascade.changed() {
        tracing::info!(
            person = %id,
            category = %request.category,
            phase = %request.phase,
            "Auto-completion applied"
        );
    }
    Ok(Json(SelectionResponse::new(outcome, person)))
}

pub async fn birthday_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<BirthdayRequest>,
) -> ApiResult<PersonResponse> {
    let (_, person) = edit_person(&state, &id, |session| match request.birthday.as_deref() {
        Some(birthday) if !birthday.trim().is_empty() => session.set_birthday(birthday, today()),
        _ => {
            session.clear_birthday();
            Ok(())
        }
    })
    .await?;
    Ok(Json(PersonResponse { id, person }))
}

pub async fn note_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<NoteRequest>,
) -> ApiResult<PersonResponse> {
    let (_, person) = edit_person(&state, &id, |session| session.set_note(&request.note)).await?;
    Ok(Json(PersonResponse { id, person }))
}

pub async fn display_settings_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<DisplaySettingsRequest>,
) -> ApiResult<PersonResponse> {
    let (_, person) = edit_person(&state, &id, |session| {
        if let Some(baseline) = request.baseline {
            session.set_baseline(baseline)?;
        }
        if let Some(min_value) = request.min_value {
            session.set_min_value(min_value)?;
        }
        Ok(())
    })
    .await?;
    Ok(Json(PersonResponse { id, person }))
}

// =============================================================================
// VIEWS
// =============================================================================

/// Phase results of one category.
pub async fn phases_handler(
    State(state): State<AppState>,
    Path((id, category)): Path<(String, String)>,
) -> ApiResult<Vec<PhaseSummary>> {
    let person = read_person(&state, &id).await?;
    let session = EvaluationSession::open(person, &state.schema);
    Ok(Json(session.phase_summaries(&category, today())?))
}

pub async fn chart_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<ChartPoint>> {
    let person = read_person(&state, &id).await?;
    let session = EvaluationSession::open(person, &state.schema);
    Ok(Json(session.chart(today())?))
}

/// Report with the default print options.
pub async fn report_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Report> {
    let person = read_person(&state, &id).await?;
    let session = EvaluationSession::open(person, &state.schema);
    Ok(Json(session.report(today())?))
}

/// Report with caller-provided print options.
pub async fn custom_report_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut options): Json<PrintOptions>,
) -> ApiResult<Report> {
    options.set_tables_per_row(options.tables_per_row)?;
    let person = read_person(&state, &id).await?;
    let session = EvaluationSession::open(person, &state.schema);
    Ok(Json(Report::build(
        session.person(),
        session.schema(),
        &options,
        today(),
    )?))
}

/// Default print options for a person.
pub async fn print_options_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<PrintOptions> {
    let person = read_person(&state, &id).await?;
    Ok(Json(PrintOptions::for_person(&person, &state.schema, today())))
}

// =============================================================================
// CONFIG
// =============================================================================

pub async fn get_config_handler(State(state): State<AppState>) -> Json<Config> {
    Json(*state.config.read().await)
}

/// Update the people list order and persist `config.json`.
pub async fn person_list_order_handler(
    State(state): State<AppState>,
    Json(request): Json<PersonListOrderRequest>,
) -> ApiResult<Config> {
    let mut config = state.config.write().await;
    let mut next = *config;
    next.set_person_list_order(request.order.as_deref(), request.orderdir.as_deref())?;
    save_config(state.gateway.as_ref(), &next)?;
    *config = next;
    Ok(Json(next))
}

// =============================================================================
// UPDATE
// =============================================================================

/// Last known update state.
pub async fn update_state_handler(State(state): State<AppState>) -> Json<UpdateState> {
    Json(state.update.read().await.clone())
}

/// Fetch the manifest now and store the outcome.
pub async fn update_check_handler(State(state): State<AppState>) -> Json<UpdateState> {
    let checked = updater::check_for_update(&state.update_url).await;
    *state.update.write().await = checked.clone();
    Json(checked)
}
