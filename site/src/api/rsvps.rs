//! RSVP endpoints.
//!
//! - GET    /api/rsvps?id=..            one RSVP
//! - GET    /api/rsvps?attendance=..    RSVPs with one reply
//! - GET    /api/rsvps?stats=true       head counts
//! - GET    /api/rsvps                  every RSVP
//! - POST   /api/rsvps                  `{ "rsvp": {...} }`
//! - PUT    /api/rsvps                  `{ "id": .., ...fields }`
//! - DELETE /api/rsvps?id=..
//! - PATCH  /api/rsvps?action=migrate-ids
//! - POST   /api/rsvps/:id/check-in
//! - POST   /api/rsvps/:id/check-out

use super::{IdQuery, Success};
use crate::server::state::AppState;
use crate::services::rsvps::{Attendance, NewRsvp, Rsvp, RsvpStats};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use wedding_web::{AppError, WebResult};

/// Lookup filters, checked in field order
#[derive(Debug, Default, Deserialize)]
pub struct RsvpQuery {
    /// Document id
    #[serde(default)]
    pub id: Option<String>,
    /// `attending`, `not-attending` or `maybe`
    #[serde(default)]
    pub attendance: Option<String>,
    /// Return head counts instead of records
    #[serde(default)]
    pub stats: Option<bool>,
}

/// RSVP lookup answer
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RsvpLookup {
    /// `{ "rsvp": ... }`
    Rsvp(Rsvp),
    /// `{ "rsvps": [...] }`
    Rsvps(Vec<Rsvp>),
    /// `{ "stats": ... }`
    Stats(RsvpStats),
}

/// Body of `POST /api/rsvps`
#[derive(Debug, Deserialize)]
pub struct CreateRsvpRequest {
    /// The reply
    pub rsvp: NewRsvp,
}

/// Answer to `POST /api/rsvps`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpCreated {
    /// Document id
    pub id: String,
    /// Guest-facing id
    pub rsvp_id: String,
}

/// `?action=`
#[derive(Debug, Deserialize)]
pub struct ActionQuery {
    /// Maintenance task to run
    #[serde(default)]
    pub action: Option<String>,
}

/// Answer to the id migration
#[derive(Debug, Serialize)]
pub struct MigrationReport {
    /// Always true
    pub success: bool,
    /// Summary
    pub message: String,
    /// Records that received a new id
    pub migrated: usize,
}

/// Look RSVPs up by id, by reply, as stats, or list them all.
///
/// # Errors
///
/// 400 for an unknown attendance value; 404 if `id` names no RSVP.
pub async fn get_rsvps(
    State(state): State<AppState>,
    Query(query): Query<RsvpQuery>,
) -> WebResult<Json<RsvpLookup>> {
    if let Some(id) = query.id.filter(|id| !id.trim().is_empty()) {
        let rsvp = state
            .rsvps
            .get(&id)
            .await?
            .ok_or_else(|| AppError::not_found("RSVP", &id))?;
        return Ok(Json(RsvpLookup::Rsvp(rsvp)));
    }

    if let Some(raw) = query.attendance {
        let attendance = Attendance::parse(raw.trim())
            .ok_or_else(|| AppError::bad_request(format!("Unknown attendance: {raw}")))?;
        return Ok(Json(RsvpLookup::Rsvps(state.rsvps.by_attendance(attendance).await?)));
    }

    if query.stats.unwrap_or(false) {
        return Ok(Json(RsvpLookup::Stats(state.rsvps.stats().await?)));
    }

    Ok(Json(RsvpLookup::Rsvps(state.rsvps.list().await?)))
}

/// Store a guest's reply.
///
/// ```bash
/// curl -X POST http://localhost:8080/api/rsvps -H "Content-Type: application/json" \
///   -d '{"rsvp": {"primaryGuest": {"name": "Tunde"}, "attendance": "attending", "eventType": "both"}}'
/// ```
///
/// # Errors
///
/// 400 without a primary guest name.
pub async fn create_rsvp(
    State(state): State<AppState>,
    Json(request): Json<CreateRsvpRequest>,
) -> WebResult<(StatusCode, Json<RsvpCreated>)> {
    let rsvp = state.rsvps.create(request.rsvp).await?;
    Ok((
        StatusCode::CREATED,
        Json(RsvpCreated {
            id: rsvp.id,
            rsvp_id: rsvp.rsvp_id,
        }),
    ))
}

/// Merge the posted fields into an RSVP.
///
/// # Errors
///
/// 400 without an `id`; 404 for an unknown RSVP.
pub async fn update_rsvp(
    State(state): State<AppState>,
    Json(mut fields): Json<Map<String, Value>>,
) -> WebResult<Json<Success>> {
    let id = match fields.remove("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id,
        _ => return Err(AppError::bad_request("id is required")),
    };
    state.rsvps.update(&id, Value::Object(fields)).await?;
    Ok(Json(Success::ok()))
}

/// Remove an RSVP.
///
/// # Errors
///
/// 400 without an `id`.
pub async fn delete_rsvp(State(state): State<AppState>, Query(query): Query<IdQuery>) -> WebResult<Json<Success>> {
    state.rsvps.delete(&query.require()?).await?;
    Ok(Json(Success::ok()))
}

/// Run a maintenance action. Only `migrate-ids` exists.
///
/// # Errors
///
/// 400 for any other action.
pub async fn patch_rsvps(
    State(state): State<AppState>,
    Query(query): Query<ActionQuery>,
) -> WebResult<Json<MigrationReport>> {
    match query.action.as_deref() {
        Some("migrate-ids") => {
            let migrated = state.rsvps.migrate_ids().await?;
            Ok(Json(MigrationReport {
                success: true,
                message: format!("Migrated {migrated} RSVP ids"),
                migrated,
            }))
        },
        Some(other) => Err(AppError::bad_request(format!("Unknown action: {other}"))),
        None => Err(AppError::bad_request("action is required")),
    }
}

/// Mark a guest as arrived.
///
/// # Errors
///
/// 404 for an unknown RSVP.
pub async fn check_in(State(state): State<AppState>, Path(id): Path<String>) -> WebResult<Json<Success>> {
    state.rsvps.check_in(&id).await?;
    tracing::info!(rsvp = %id, "Guest checked in");
    Ok(Json(Success::ok()))
}

/// Undo a check-in.
///
/// # Errors
///
/// 404 for an unknown RSVP.
pub async fn check_out(State(state): State<AppState>, Path(id): Path<String>) -> WebResult<Json<Success>> {
    state.rsvps.check_out(&id).await?;
    Ok(Json(Success::ok()))
}
