//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the medication and log endpoints and the
//! master definition for the OpenAPI specification.

use crate::web::{auth, state::AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use medication_tracker_core::{
    LogStatus, MedicationDraft, MedicationPatch, PortError, FREQUENCY_OPTIONS,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        get_state_handler,
        list_medications_handler,
        create_medication_handler,
        get_medication_handler,
        update_medication_handler,
        delete_medication_handler,
        list_logs_handler,
        create_log_handler,
        adherence_handler,
        dashboard_handler,
        frequencies_handler,
        auth::login_handler,
        auth::register_handler,
        auth::logout_handler,
        auth::me_handler,
    ),
    components(
        schemas(CreateLogRequest, auth::LoginRequest, auth::RegisterRequest)
    ),
    tags(
        (name = "Medication Tracker API", description = "Medications, dose logs and adherence for the local tracker.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Payload Structs
//=========================================================================================

/// Payload for recording a dose.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLogRequest {
    pub medication_id: String,
    /// One of `taken`, `missed`, `skipped`.
    #[schema(value_type = String)]
    pub status: LogStatus,
    pub notes: Option<String>,
}

/// Optional scope of log and adherence queries.
#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MedicationScope {
    /// Restrict to logs of this medication. Empty means all logs.
    pub medication_id: Option<String>,
}

impl MedicationScope {
    fn medication_id(&self) -> Option<&str> {
        self.medication_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

// Rejected input is the caller's fault; anything else is ours.
fn store_failure(e: PortError, context: &str) -> (StatusCode, String) {
    match e {
        PortError::Invalid(reason) => (StatusCode::BAD_REQUEST, reason),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, context.to_string()),
    }
}

//=========================================================================================
// State and Medication Handlers
//=========================================================================================

/// The full store snapshot: medications, logs and the loading flag.
#[utoipa::path(
    get,
    path = "/state",
    responses((status = 200, description = "Current store snapshot"))
)]
pub async fn get_state_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(app_state.store.snapshot())
}

/// All medications in display order.
#[utoipa::path(
    get,
    path = "/medications",
    responses((status = 200, description = "Medications in display order"))
)]
pub async fn list_medications_handler(
    State(app_state): State<Arc<AppState>>,
) -> impl IntoResponse {
    Json(app_state.store.medications())
}

/// Add a medication from the raw form values.
///
/// The draft is validated first; an invalid draft never reaches the store.
#[utoipa::path(
    post,
    path = "/medications",
    request_body(content_type = "application/json", description = "Raw form values: name, dosage, frequency, timeSlots, startDate, endDate."),
    responses(
        (status = 201, description = "Medication created"),
        (status = 400, description = "A required field is blank or malformed"),
        (status = 500, description = "The medication could not be persisted")
    )
)]
pub async fn create_medication_handler(
    State(app_state): State<Arc<AppState>>,
    Json(draft): Json<MedicationDraft>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let patient_id = app_state.active_patient_id().await;
    let new_medication = draft.validate(&patient_id).map_err(|e| {
        warn!("Rejected medication draft: {}", e);
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;

    let created = app_state
        .store
        .add_medication(new_medication)
        .await
        .map_err(|e| {
            error!("Failed to add medication: {:?}", e);
            store_failure(e, "Failed to add medication")
        })?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// A single medication.
#[utoipa::path(
    get,
    path = "/medications/{id}",
    params(("id" = String, Path, description = "Medication id")),
    responses(
        (status = 200, description = "The medication"),
        (status = 404, description = "No medication with this id")
    )
)]
pub async fn get_medication_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state
        .store
        .medication(&id)
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Medication {} not found", id)))
}

/// Change some fields of a medication. Fields left out are untouched.
#[utoipa::path(
    patch,
    path = "/medications/{id}",
    params(("id" = String, Path, description = "Medication id")),
    request_body(content_type = "application/json", description = "Any subset of name, dosage, frequency, timeSlots, startDate, endDate (null clears it), patientId."),
    responses(
        (status = 200, description = "The updated medication"),
        (status = 400, description = "A supplied field is blank or malformed, or the end date precedes the start date"),
        (status = 404, description = "No medication with this id; nothing changed"),
        (status = 500, description = "The change could not be persisted")
    )
)]
pub async fn update_medication_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<MedicationPatch>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let updated = app_state
        .store
        .update_medication(&id, patch)
        .await
        .map_err(|e| {
            error!("Failed to update medication {}: {:?}", id, e);
            store_failure(e, "Failed to update medication")
        })?;

    updated
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Medication {} not found", id)))
}

/// Delete a medication. Its logs are kept. Deleting an unknown id is a no-op.
#[utoipa::path(
    delete,
    path = "/medications/{id}",
    params(("id" = String, Path, description = "Medication id")),
    responses(
        (status = 204, description = "Deleted, or there was nothing to delete"),
        (status = 500, description = "The deletion could not be persisted")
    )
)]
pub async fn delete_medication_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state.store.delete_medication(&id).await.map_err(|e| {
        error!("Failed to delete medication {}: {:?}", id, e);
        store_failure(e, "Failed to delete medication")
    })?;
    Ok(StatusCode::NO_CONTENT)
}

/// The recommended frequency options for the add form.
#[utoipa::path(
    get,
    path = "/frequencies",
    responses((status = 200, description = "Frequency labels", body = [String]))
)]
pub async fn frequencies_handler() -> impl IntoResponse {
    Json(FREQUENCY_OPTIONS)
}

//=========================================================================================
// Log and Statistics Handlers
//=========================================================================================

/// Dose logs, oldest first.
#[utoipa::path(
    get,
    path = "/logs",
    params(MedicationScope),
    responses((status = 200, description = "Logs in insertion order"))
)]
pub async fn list_logs_handler(
    State(app_state): State<Arc<AppState>>,
    Query(scope): Query<MedicationScope>,
) -> impl IntoResponse {
    let logs = match scope.medication_id() {
        Some(id) => app_state.store.logs_for(id),
        None => app_state.store.logs(),
    };
    Json(logs)
}

/// Record a dose as taken, missed or skipped.
#[utoipa::path(
    post,
    path = "/logs",
    request_body = CreateLogRequest,
    responses(
        (status = 201, description = "Log recorded"),
        (status = 500, description = "The log could not be persisted")
    )
)]
pub async fn create_log_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<CreateLogRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let log = app_state
        .store
        .log_medication(&req.medication_id, req.status, req.notes)
        .await
        .map_err(|e| {
            error!("Failed to log medication {}: {:?}", req.medication_id, e);
            store_failure(e, "Failed to log medication")
        })?;
    Ok((StatusCode::CREATED, Json(log)))
}

/// Adherence for one medication, or across all logs.
#[utoipa::path(
    get,
    path = "/adherence",
    params(MedicationScope),
    responses((status = 200, description = "Status counts and the rounded adherence rate"))
)]
pub async fn adherence_handler(
    State(app_state): State<Arc<AppState>>,
    Query(scope): Query<MedicationScope>,
) -> impl IntoResponse {
    Json(
        app_state
            .store
            .adherence_report(scope.medication_id()),
    )
}

/// Dashboard statistics for today.
///
/// "Today" is the current UTC date: `takenToday` counts taken logs whose
/// timestamp falls on that date in UTC, not in the caller's local time.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses((status = 200, description = "Dashboard summary; takenToday counts by UTC date"))
)]
pub async fn dashboard_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(app_state.store.dashboard(Utc::now().date_naive()))
}
