use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    state::AppState,
};

use super::dto::{
    CalculationResponse, CreateCalculationRequest, Pagination, PreviewRequest, PreviewResponse,
    UpdateCalculationRequest,
};
use super::services::{new_calculation, preview, revise_calculation};

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/calculations", get(list_calculations))
        .route("/calculations/:id", get(get_calculation))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/calculations", post(create_calculation))
        .route("/calculations/preview", post(preview_calculation))
        .route(
            "/calculations/:id",
            axum::routing::put(update_calculation).delete(delete_calculation),
        )
}

fn not_found() -> AppError {
    AppError::NotFound("Calculation not found".into())
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn list_calculations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> AppResult<Json<Vec<CalculationResponse>>> {
    if p.limit < 0 || p.offset < 0 {
        return Err(AppError::Validation("limit and offset must be non-negative".into()));
    }
    let items = state
        .store
        .list_calculations(user_id, Some(p.limit), p.offset)
        .await?;
    Ok(Json(items.into_iter().map(CalculationResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_calculation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CalculationResponse>> {
    let calc = state
        .store
        .get_calculation(user_id, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(calc.into()))
}

#[instrument(skip(state, payload))]
pub async fn create_calculation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<CreateCalculationRequest>, JsonRejection>,
) -> AppResult<(StatusCode, HeaderMap, Json<CalculationResponse>)> {
    let Json(body) = payload?;
    let calc = body
        .inputs
        .into_values()
        .and_then(|inputs| new_calculation(user_id, body.kind, inputs))
        .map_err(|e| {
            warn!(error = %e, kind = %body.kind, "calculation rejected");
            AppError::from(e)
        })?;

    let calc = state.store.insert_calculation(calc).await?;
    info!(calc_id = %calc.id, kind = %calc.kind, result = calc.result, "calculation created");

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/calculations/{}", calc.id).parse() {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(calc.into())))
}

#[instrument(skip(state, payload))]
pub async fn update_calculation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateCalculationRequest>, JsonRejection>,
) -> AppResult<Json<CalculationResponse>> {
    let Json(body) = payload?;
    let existing = state
        .store
        .get_calculation(user_id, id)
        .await?
        .ok_or_else(not_found)?;

    let kind = body.kind.unwrap_or(existing.kind);
    let revised = body
        .inputs
        .into_values()
        .and_then(|inputs| revise_calculation(existing, kind, inputs))
        .map_err(|e| {
            warn!(error = %e, calc_id = %id, "calculation update rejected");
            AppError::from(e)
        })?;

    let calc = state
        .store
        .update_calculation(revised)
        .await?
        .ok_or_else(not_found)?;
    info!(calc_id = %calc.id, kind = %calc.kind, result = calc.result, "calculation updated");
    Ok(Json(calc.into()))
}

#[instrument(skip(state))]
pub async fn delete_calculation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !state.store.delete_calculation(user_id, id).await? {
        return Err(not_found());
    }
    info!(calc_id = %id, "calculation deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Live validation and result preview for the calculation forms.
#[instrument(skip(payload))]
pub async fn preview_calculation(
    AuthUser(_user_id): AuthUser,
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> AppResult<Json<PreviewResponse>> {
    let Json(body) = payload?;
    Ok(Json(preview(body.kind, body.inputs)))
}
