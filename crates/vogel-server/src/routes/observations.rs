//! Observation route handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use vogel_core::Error;
use vogel_store::models::{BirdObservation, Count};
use vogel_store::queries::observations::{self, ObservationFilter};
use vogel_store::queries::species;
use vogel_store::JsonStore;

use crate::context::AppContext;
use crate::error::AppError;

/// Default page size of `GET /observations`.
pub const DEFAULT_LIMIT: usize = 100;
/// Largest accepted page size.
pub const MAX_LIMIT: usize = 1000;

/// Query parameters of `GET /observations`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListObservationsQuery {
    pub species_id: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ListObservationsQuery {
    fn into_filter(self) -> Result<ObservationFilter, Error> {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(Error::validation(format!(
                "limit must be between 1 and {MAX_LIMIT}, got {limit}"
            )));
        }
        // Empty values mean "no filter".
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        Ok(ObservationFilter {
            species_id: non_empty(self.species_id),
            date_from: non_empty(self.date_from),
            date_to: non_empty(self.date_to),
            limit: Some(limit),
            offset: self.offset.unwrap_or(0),
        })
    }
}

/// GET /observations
#[utoipa::path(
    get,
    path = "/observations",
    params(
        ("speciesId" = Option<String>, Query, description = "Only observations of this species"),
        ("dateFrom" = Option<String>, Query, description = "Inclusive lower date bound"),
        ("dateTo" = Option<String>, Query, description = "Exclusive upper date bound"),
        ("limit" = Option<usize>, Query, description = "Page size, 1 to 1000 (default 100)"),
        ("offset" = Option<usize>, Query, description = "Number of matches to skip")
    ),
    responses(
        (status = 200, description = "Matching observations", body = Vec<BirdObservation>),
        (status = 400, description = "Invalid query")
    )
)]
pub async fn list_observations(
    State(ctx): State<AppContext>,
    Query(query): Query<ListObservationsQuery>,
) -> Result<Json<Vec<BirdObservation>>, AppError> {
    let filter = query.into_filter()?;
    Ok(Json(observations::list_observations(&ctx.store, &filter)?))
}

/// GET /observations/count
#[utoipa::path(
    get,
    path = "/observations/count",
    responses((status = 200, description = "Number of observations", body = Count))
)]
pub async fn count_observations(State(ctx): State<AppContext>) -> Result<Json<Count>, AppError> {
    let count = observations::observation_count(&ctx.store)?;
    Ok(Json(Count { count }))
}

/// GET /observations/:id
#[utoipa::path(
    get,
    path = "/observations/{id}",
    params(("id" = String, Path, description = "Observation ID")),
    responses(
        (status = 200, description = "Observation details", body = BirdObservation),
        (status = 404, description = "Observation not found")
    )
)]
pub async fn get_observation(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<BirdObservation>, AppError> {
    let found = observations::get_observation(&ctx.store, &id)?
        .ok_or_else(|| Error::not_found("Observation", &id))?;
    Ok(Json(found))
}

/// PUT /observations/:id
#[utoipa::path(
    put,
    path = "/observations/{id}",
    params(("id" = String, Path, description = "Observation ID")),
    request_body = BirdObservation,
    responses(
        (status = 200, description = "Observation stored", body = BirdObservation),
        (status = 400, description = "Id mismatch, unknown species or invalid body"),
        (status = 403, description = "Missing or wrong edit key")
    )
)]
pub async fn put_observation(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Json(payload): Json<BirdObservation>,
) -> Result<Json<BirdObservation>, AppError> {
    if payload.id != id {
        return Err(Error::validation("Path id and body id differ").into());
    }
    let stored = save_observation(&ctx.store, payload)?;
    tracing::info!(observation_id = %stored.id, "Observation saved");
    Ok(Json(stored))
}

/// POST /observations
#[utoipa::path(
    post,
    path = "/observations",
    request_body = BirdObservation,
    responses(
        (status = 201, description = "Observation stored", body = BirdObservation),
        (status = 400, description = "Unknown species or invalid body"),
        (status = 403, description = "Missing or wrong edit key")
    )
)]
pub async fn create_observation(
    State(ctx): State<AppContext>,
    Json(payload): Json<BirdObservation>,
) -> Result<impl IntoResponse, AppError> {
    let stored = save_observation(&ctx.store, payload)?;
    tracing::info!(observation_id = %stored.id, "Observation created");
    Ok((StatusCode::CREATED, Json(stored)))
}

/// DELETE /observations/:id
#[utoipa::path(
    delete,
    path = "/observations/{id}",
    params(("id" = String, Path, description = "Observation ID")),
    responses(
        (status = 204, description = "Observation deleted"),
        (status = 404, description = "Observation not found"),
        (status = 403, description = "Missing or wrong edit key")
    )
)]
pub async fn delete_observation(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !observations::delete_observation(&ctx.store, &id)? {
        return Err(Error::not_found("Observation", &id).into());
    }
    tracing::info!(observation_id = %id, "Observation deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Validate and upsert; the referenced species must exist.
fn save_observation(store: &JsonStore, obs: BirdObservation) -> Result<BirdObservation, Error> {
    obs.validate()?;
    if species::get_species(store, &obs.species_id)?.is_none() {
        return Err(Error::validation("Referenced species does not exist"));
    }
    observations::upsert_observation(store, obs)
}
