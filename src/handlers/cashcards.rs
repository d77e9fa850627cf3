use axum::{
    extract::{Path, RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};

use crate::app::AppState;
use crate::auth::Principal;
use crate::database::models::Card;
use crate::error::ApiError;
use crate::paging::PageParams;
use crate::services::{CardRequest, Mutation};

/// GET /cashcards/:id - 200 with the card, or an empty 404
pub async fn get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    match state.cards.find(id, &principal).await? {
        Some(card) => Ok(Json(card).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

/// POST /cashcards - 201 with a Location header, no body
pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CardRequest>,
) -> Result<Response, ApiError> {
    let created = state.cards.create(payload, &principal).await?;
    Ok((StatusCode::CREATED, [(header::LOCATION, created.location)]).into_response())
}

/// GET /cashcards?page&size&sort - the caller's cards, one page
pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    RawQuery(query): RawQuery,
) -> Result<Json<Vec<Card>>, ApiError> {
    let params = PageParams::from_query(query.as_deref());
    let cards = state.cards.list(&params, &principal).await?;
    Ok(Json(cards))
}

/// PUT /cashcards/:id - 204, or an empty 404
pub async fn put(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
    Json(payload): Json<CardRequest>,
) -> Result<StatusCode, ApiError> {
    let outcome = state.cards.update(id, payload, &principal).await?;
    Ok(status_of(outcome))
}

/// DELETE /cashcards/:id - 204, or an empty 404
pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let outcome = state.cards.delete(id, &principal).await?;
    Ok(status_of(outcome))
}

fn status_of(outcome: Mutation) -> StatusCode {
    match outcome {
        Mutation::NoContent => StatusCode::NO_CONTENT,
        Mutation::NotFound => StatusCode::NOT_FOUND,
    }
}
