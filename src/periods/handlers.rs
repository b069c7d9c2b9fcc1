use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::auth::extractors::CurrentUser;
use crate::error::ApiError;
use crate::ids::IdInput;
use crate::owned::{delete_for_owner, get_by_id_for_owner, get_many_by_owner};
use crate::periods::dto::{load_new, load_patch, PeriodOut};
use crate::periods::repo::Period;
use crate::state::AppState;

/// GET /expense/ — the caller's periods. Dumps an empty object when there
/// are none.
#[instrument(skip(state, user), fields(user_id = user.0.id))]
pub async fn list_periods(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let periods = get_many_by_owner::<Period>(&state.db, &IdInput::from(user.0.id))
        .await?
        .unwrap_or_default();
    if periods.is_empty() {
        return Ok(Json(json!({})));
    }
    let out: Vec<PeriodOut> = periods.iter().map(PeriodOut::from).collect();
    Ok(Json(serde_json::to_value(out).map_err(anyhow::Error::from)?))
}

/// GET /expense/:id — one period, visible only to its owner.
#[instrument(skip(state, user), fields(user_id = user.0.id))]
pub async fn get_period(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match get_by_id_for_owner::<Period>(&state.db, &IdInput::from(id), user.0.id).await? {
        Some(period) => Ok(Json(
            serde_json::to_value(PeriodOut::from(&period)).map_err(anyhow::Error::from)?,
        )),
        None => Ok(Json(json!({}))),
    }
}

/// POST /expense/ — create a period owned by the caller. A duplicate
/// (user, month, year) trips the unique constraint and surfaces as a
/// generic storage error.
#[instrument(skip(state, user, payload), fields(user_id = user.0.id))]
pub async fn create_period(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let new = load_new(&payload).map_err(ApiError::Validation)?;
    let period = Period::create(&state.db, new.month, new.year, user.0.id)
        .await
        .map_err(ApiError::Storage)?;
    info!(period_id = period.id, month = period.month, year = period.year, "period created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "msg": "Successfully created period" })),
    ))
}

/// PATCH /expense/:id
#[instrument(skip(state, user, payload), fields(user_id = user.0.id))]
pub async fn update_period(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let mut period = get_by_id_for_owner::<Period>(&state.db, &IdInput::from(id), user.0.id)
        .await?
        .ok_or(ApiError::NotFound("Period not found"))?;

    let patch = load_patch(&payload).map_err(ApiError::Validation)?;
    patch.apply(&mut period);
    let period = period.save(&state.db).await.map_err(ApiError::Storage)?;
    info!(period_id = period.id, "period updated");
    Ok(Json(json!({ "msg": "Successfully updated period" })))
}

/// DELETE /expense/:id
#[instrument(skip(state, user), fields(user_id = user.0.id))]
pub async fn delete_period(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let removed = delete_for_owner::<Period>(&state.db, &IdInput::from(id), user.0.id).await?;
    if !removed {
        return Err(ApiError::NotFound("Period not found"));
    }
    info!("period deleted");
    Ok(Json(json!({ "msg": "Successfully deleted period" })))
}
