//! Planet catalog endpoints, including draft membership.

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use stellar_core::{Actor, ConstellationId, Planet, PlanetFields, PlanetId};
use stellar_workflow::Page;

use crate::api::error::ApiResult;
use crate::api::extract::{ApiBytes, ApiJson, ApiPath, ApiQuery};
use crate::auth::{Caller, MaybeCaller};
use crate::state::AppState;

/// Page size used when only `page` is given.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Query parameters for listing planets.
#[derive(Debug, Default, Deserialize)]
pub struct PlanetListQuery {
    pub name: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl PlanetListQuery {
    fn page(&self) -> Option<Page> {
        if self.page.is_none() && self.page_size.is_none() {
            return None;
        }
        Some(Page {
            number: self.page.unwrap_or(1),
            size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        })
    }
}

/// Catalog listing with the caller's draft. Anonymous callers and
/// moderators get no draft.
#[derive(Debug, Serialize)]
pub struct PlanetsResponse {
    pub planets: Vec<Planet>,
    pub draft_id: Option<ConstellationId>,
    pub draft_size: usize,
}

#[derive(Debug, Serialize)]
pub struct PlanetResponse {
    pub planet: Planet,
}

/// List active planets. Open to anonymous callers.
pub async fn list_planets(
    State(state): State<AppState>,
    MaybeCaller(actor): MaybeCaller,
    ApiQuery(query): ApiQuery<PlanetListQuery>,
) -> ApiResult<Json<PlanetsResponse>> {
    let prefix = query.name.as_deref().map(str::trim).unwrap_or_default();
    let planets = state.catalog.list_planets(prefix, query.page()).await?;
    listing(&state, actor.as_ref(), planets).await
}

/// Fetch one active planet. Open to anonymous callers.
pub async fn get_planet(
    State(state): State<AppState>,
    MaybeCaller(_actor): MaybeCaller,
    ApiPath(id): ApiPath<PlanetId>,
) -> ApiResult<Json<PlanetResponse>> {
    let planet = state.catalog.get_planet(id).await?;
    Ok(Json(PlanetResponse { planet }))
}

pub async fn create_planet(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiJson(fields): ApiJson<PlanetFields>,
) -> ApiResult<(StatusCode, Json<PlanetResponse>)> {
    let planet = state.catalog.create_planet(&actor, fields).await?;
    Ok((StatusCode::CREATED, Json(PlanetResponse { planet })))
}

pub async fn update_planet(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiPath(id): ApiPath<PlanetId>,
    ApiJson(fields): ApiJson<PlanetFields>,
) -> ApiResult<Json<PlanetResponse>> {
    let planet = state.catalog.update_planet(&actor, id, fields).await?;
    Ok(Json(PlanetResponse { planet }))
}

/// Soft-delete a planet and return the remaining catalog.
pub async fn delete_planet(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiPath(id): ApiPath<PlanetId>,
) -> ApiResult<Json<PlanetsResponse>> {
    state.catalog.delete_planet(&actor, id).await?;
    full_listing(&state, &actor).await
}

/// Upload a planet image. The body is the raw image.
pub async fn upload_image(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiPath(id): ApiPath<PlanetId>,
    headers: HeaderMap,
    ApiBytes(body): ApiBytes,
) -> ApiResult<Json<PlanetResponse>> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let planet = state
        .catalog
        .upload_planet_image(&actor, id, body.to_vec(), content_type)
        .await?;
    Ok(Json(PlanetResponse { planet }))
}

/// Add a planet to the caller's draft.
pub async fn add_to_draft(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiPath(id): ApiPath<PlanetId>,
) -> ApiResult<(StatusCode, Json<PlanetsResponse>)> {
    state.engine.add_planet_to_draft(id, &actor).await?;
    let listing = full_listing(&state, &actor).await?;
    Ok((StatusCode::CREATED, listing))
}

/// Remove a planet from the caller's draft.
pub async fn remove_from_draft(
    State(state): State<AppState>,
    Caller(actor): Caller,
    ApiPath(id): ApiPath<PlanetId>,
) -> ApiResult<Json<PlanetsResponse>> {
    state.engine.remove_planet_from_draft(id, &actor).await?;
    full_listing(&state, &actor).await
}

async fn full_listing(state: &AppState, actor: &Actor) -> ApiResult<Json<PlanetsResponse>> {
    let planets = state.catalog.list_planets("", None).await?;
    listing(state, Some(actor), planets).await
}

async fn listing(
    state: &AppState,
    actor: Option<&Actor>,
    planets: Vec<Planet>,
) -> ApiResult<Json<PlanetsResponse>> {
    let draft = match actor {
        Some(actor) if !actor.role.can_moderate() => state.engine.current_draft(actor.id).await?,
        _ => None,
    };
    Ok(Json(PlanetsResponse {
        planets,
        draft_id: draft.map(|d| d.id),
        draft_size: draft.map(|d| d.planet_count).unwrap_or_default(),
    }))
}
