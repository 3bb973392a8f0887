//! Species route handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use vogel_core::Error;
use vogel_store::models::{BirdSpecies, Count};
use vogel_store::queries::species;

use crate::context::AppContext;
use crate::error::AppError;

/// GET /species
#[utoipa::path(
    get,
    path = "/species",
    responses((status = 200, description = "All species", body = Vec<BirdSpecies>))
)]
pub async fn list_species(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<BirdSpecies>>, AppError> {
    Ok(Json(species::list_species(&ctx.store)?))
}

/// GET /species/count
#[utoipa::path(
    get,
    path = "/species/count",
    responses((status = 200, description = "Number of species", body = Count))
)]
pub async fn count_species(State(ctx): State<AppContext>) -> Result<Json<Count>, AppError> {
    let count = species::species_count(&ctx.store)?;
    Ok(Json(Count { count }))
}

/// GET /species/:id
#[utoipa::path(
    get,
    path = "/species/{id}",
    params(("id" = String, Path, description = "Species ID")),
    responses(
        (status = 200, description = "Species details", body = BirdSpecies),
        (status = 404, description = "Species not found")
    )
)]
pub async fn get_species(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<BirdSpecies>, AppError> {
    let found = species::get_species(&ctx.store, &id)?
        .ok_or_else(|| Error::not_found("Species", &id))?;
    Ok(Json(found))
}

/// PUT /species/:id
#[utoipa::path(
    put,
    path = "/species/{id}",
    params(("id" = String, Path, description = "Species ID")),
    request_body = BirdSpecies,
    responses(
        (status = 200, description = "Species stored", body = BirdSpecies),
        (status = 400, description = "Path id and body id differ, or invalid body"),
        (status = 403, description = "Missing or wrong edit key")
    )
)]
pub async fn put_species(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Json(payload): Json<BirdSpecies>,
) -> Result<Json<BirdSpecies>, AppError> {
    if payload.id != id {
        return Err(Error::validation("Path id and body id differ").into());
    }
    payload.validate()?;

    let stored = species::upsert_species(&ctx.store, payload)?;
    tracing::info!(species_id = %stored.id, "Species saved");
    Ok(Json(stored))
}

/// POST /species
#[utoipa::path(
    post,
    path = "/species",
    request_body = BirdSpecies,
    responses(
        (status = 201, description = "Species stored", body = BirdSpecies),
        (status = 400, description = "Invalid body"),
        (status = 403, description = "Missing or wrong edit key")
    )
)]
pub async fn create_species(
    State(ctx): State<AppContext>,
    Json(payload): Json<BirdSpecies>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let stored = species::upsert_species(&ctx.store, payload)?;
    tracing::info!(species_id = %stored.id, "Species created");
    Ok((StatusCode::CREATED, Json(stored)))
}

/// DELETE /species/:id
///
/// Removes the species' observations as well.
#[utoipa::path(
    delete,
    path = "/species/{id}",
    params(("id" = String, Path, description = "Species ID")),
    responses(
        (status = 204, description = "Species and its observations deleted"),
        (status = 404, description = "Species not found"),
        (status = 403, description = "Missing or wrong edit key")
    )
)]
pub async fn delete_species(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !species::delete_species(&ctx.store, &id)? {
        return Err(Error::not_found("Species", &id).into());
    }
    tracing::info!(species_id = %id, "Species deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /species/:id/has-observations
#[utoipa::path(
    get,
    path = "/species/{id}/has-observations",
    params(("id" = String, Path, description = "Species ID")),
    responses((status = 200, description = "Whether any observation references the species", body = bool))
)]
pub async fn has_observations(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<bool>, AppError> {
    Ok(Json(species::species_has_observations(&ctx.store, &id)?))
}
