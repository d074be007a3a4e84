//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//! Field names are camelCase, like the persisted files.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kubel_core::{CascadeOutcome, KubelError, Person, Selection, SelectionOutcome};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// PEOPLE
// =============================================================================

/// One row of the people list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    pub last_changed: String,
}

impl PersonSummary {
    #[must_use]
    pub fn new(id: &str, person: &Person) -> Self {
        Self {
            id: id.to_string(),
            name: person.name.clone(),
            birthday: person.birthday.clone(),
            last_changed: person.last_changed.clone(),
        }
    }
}

/// Body of `POST /people` and `PUT /people/{id}/name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

/// A person together with its id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonResponse {
    pub id: String,
    pub person: Person,
}

// =============================================================================
// EVALUATION EDITS
// =============================================================================

/// Click on one entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionRequest {
    pub category: String,
    pub phase: String,
    pub entry: usize,
    /// Selection code (`-1..=3`).
    pub selection: Selection,
}

/// Outcome of a selection edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResponse {
    pub previous: Selection,
    pub current: Selection,
    pub cascade: CascadeOutcome,
    /// User-facing notifications for the cascades that fired.
    pub messages: Vec<String>,
    pub person: Person,
}

impl SelectionResponse {
    #[must_use]
    pub fn new(outcome: SelectionOutcome, person: Person) -> Self {
        Self {
            previous: outcome.previous,
            current: outcome.current,
            cascade: outcome.cascade,
            messages: outcome
                .cascade
                .messages()
                .into_iter()
                .map(str::to_string)
                .collect(),
            person,
        }
    }
}

/// Body of `PUT /people/{id}/birthday`; `null` clears it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BirthdayRequest {
    #[serde(default)]
    pub birthday: Option<String>,
}

/// Body of `PUT /people/{id}/note`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteRequest {
    pub note: String,
}

/// Body of `PUT /people/{id}/display`; missing fields stay unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySettingsRequest {
    #[serde(default)]
    pub baseline: Option<f64>,
    #[serde(default)]
    pub min_value: Option<f64>,
}

// =============================================================================
// CONFIG
// =============================================================================

/// Body of `PUT /config/personlist`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonListOrderRequest {
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub orderdir: Option<String>,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
        }
    }
}

/// A `KubelError` on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub KubelError);

impl From<KubelError> for ApiError {
    fn from(error: KubelError) -> Self {
        Self(error)
    }
}

impl ApiError {
    /// HTTP status for the wrapped error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            KubelError::PersonNotFound(_)
            | KubelError::CategoryNotFound(_)
            | KubelError::PhaseNotFound { .. }
            | KubelError::EntryNotFound { .. } => StatusCode::NOT_FOUND,
            KubelError::InvalidSelection(_)
            | KubelError::InvalidBirthday(_)
            | KubelError::FutureBirthday(_)
            | KubelError::InvalidName(_)
            | KubelError::NoteTooLong(..)
            | KubelError::InvalidConfigValue { .. }
            | KubelError::OutOfRange { .. }
            | KubelError::DeserializationError(_) => StatusCode::BAD_REQUEST,
            KubelError::UpdateError(_) => StatusCode::BAD_GATEWAY,
            KubelError::IoError(_)
            | KubelError::SerializationError(_)
            | KubelError::MalformedSchema(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }
        (status, Json(ErrorResponse::new(self.0.to_string()))).into_response()
    }
}
