//! Constellation API endpoints.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use stellar_core::{
    Actor, ConstellationDetail, ConstellationFields, ConstellationId, ConstellationListing,
    ConstellationQuery, ConstellationStatus,
};

use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::auth::Caller;
use crate::state::AppState;

/// Query parameters for listing constellations.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub name: Option<String>,
    pub status: Option<String>,
    pub formed_from: Option<String>,
    pub formed_to: Option<String>,
}

impl ListQuery {
    fn into_query(self) -> ApiResult<ConstellationQuery> {
        Ok(ConstellationQuery {
            name_prefix: non_empty(self.name),
            status_prefix: non_empty(self.status),
            formed_from: non_empty(self.formed_from)
                .map(|raw| parse_bound(&raw, false))
                .transpose()?,
            formed_to: non_empty(self.formed_to)
                .map(|raw| parse_bound(&raw, true))
                .transpose()?,
        })
    }
}

/// Request body for a status change.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: ConstellationStatus,
}

#[derive(Debug, Serialize)]
pub struct ConstellationsResponse {
    pub constellations: Vec<ConstellationListing>,
}

#[derive(Debug, Serialize)]
pub struct ConstellationResponse {
    pub constellation: ConstellationDetail,
}

/// List constellations visible to the caller.
pub async fn list_constellations(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<ConstellationsResponse>> {
    let constellations = state
        .engine
        .list_constellations(query.into_query()?, &actor)
        .await?;
    Ok(Json(ConstellationsResponse { constellations }))
}

/// Fetch one constellation with its planets.
pub async fn get_constellation(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiPath(id): ApiPath<ConstellationId>,
) -> ApiResult<Json<ConstellationResponse>> {
    detail(&state, id, &actor).await
}

/// Update name and dates.
pub async fn update_constellation(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiPath(id): ApiPath<ConstellationId>,
    ApiJson(fields): ApiJson<ConstellationFields>,
) -> ApiResult<Json<ConstellationResponse>> {
    state
        .engine
        .update_constellation_fields(id, &actor, fields)
        .await?;
    detail(&state, id, &actor).await
}

/// Delete a draft and return what remains.
pub async fn delete_constellation(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiPath(id): ApiPath<ConstellationId>,
) -> ApiResult<Json<ConstellationsResponse>> {
    state.engine.delete_constellation(id, &actor).await?;
    let constellations = state
        .engine
        .list_constellations(ConstellationQuery::default(), &actor)
        .await?;
    Ok(Json(ConstellationsResponse { constellations }))
}

/// Request a status change.
pub async fn update_status(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiPath(id): ApiPath<ConstellationId>,
    ApiJson(request): ApiJson<StatusRequest>,
) -> ApiResult<Json<ConstellationResponse>> {
    let updated = state
        .engine
        .transition_status(id, &actor, request.status)
        .await?;
    detail(&state, updated.id, &actor).await
}

/// Submit the caller's draft.
pub async fn submit_draft(
    State(state): State<AppState>,
    Caller(actor): Caller,
) -> ApiResult<Json<ConstellationResponse>> {
    let submitted = state.engine.submit_draft(&actor).await?;
    detail(&state, submitted.id, &actor).await
}

async fn detail(
    state: &AppState,
    id: ConstellationId,
    actor: &Actor,
) -> ApiResult<Json<ConstellationResponse>> {
    let constellation = state.engine.get_constellation(id, actor).await?;
    Ok(Json(ConstellationResponse { constellation }))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an RFC 3339 timestamp or a `YYYY-MM-DD` date.
///
/// A bare date is the start of that day, or its last instant when `end_of_day` is set.
fn parse_bound(raw: &str, end_of_day: bool) -> ApiResult<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    let invalid = || ApiError::BadRequest(format!("invalid date '{raw}'"));
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())?;
    let time = if end_of_day {
        date.and_hms_nano_opt(23, 59, 59, 999_999_999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    time.map(|t| t.and_utc()).ok_or_else(invalid)
}
