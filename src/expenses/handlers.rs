use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::auth::extractors::CurrentUser;
use crate::error::ApiError;
use crate::expenses::dto::{load_new, load_patch, ExpenseOut};
use crate::expenses::repo::Expense;
use crate::ids::IdInput;
use crate::owned::{delete_for_owner, get_by_id_for_owner, get_many_by_owner};
use crate::state::AppState;

/// GET /expense/items/ — the caller's expenses, oldest first.
#[instrument(skip(state, user), fields(user_id = user.0.id))]
pub async fn list_expenses(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let expenses = get_many_by_owner::<Expense>(&state.db, &IdInput::from(user.0.id))
        .await?
        .unwrap_or_default();
    if expenses.is_empty() {
        return Ok(Json(json!({})));
    }
    let out: Vec<ExpenseOut> = expenses.iter().map(ExpenseOut::from).collect();
    Ok(Json(serde_json::to_value(out).map_err(anyhow::Error::from)?))
}

/// GET /expense/items/:id
#[instrument(skip(state, user), fields(user_id = user.0.id))]
pub async fn get_expense(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match get_by_id_for_owner::<Expense>(&state.db, &IdInput::from(id), user.0.id).await? {
        Some(expense) => Ok(Json(
            serde_json::to_value(ExpenseOut::from(&expense)).map_err(anyhow::Error::from)?,
        )),
        None => Ok(Json(json!({}))),
    }
}

/// POST /expense/items/
#[instrument(skip(state, user, payload), fields(user_id = user.0.id))]
pub async fn create_expense(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let new = load_new(&payload).map_err(ApiError::Validation)?;
    let expense = Expense::create(&state.db, new, user.0.id)
        .await
        .map_err(ApiError::Storage)?;
    info!(expense_id = expense.id, name = %expense.name, "expense created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "msg": "Successfully created expense" })),
    ))
}

/// PATCH /expense/items/:id — applies the supplied fields and stamps
/// date_last_updated.
#[instrument(skip(state, user, payload), fields(user_id = user.0.id))]
pub async fn update_expense(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let mut expense = get_by_id_for_owner::<Expense>(&state.db, &IdInput::from(id), user.0.id)
        .await?
        .ok_or(ApiError::NotFound("Expense not found"))?;

    let patch = load_patch(&payload).map_err(ApiError::Validation)?;
    patch.apply(&mut expense);
    let expense = expense.save(&state.db).await.map_err(ApiError::Storage)?;
    info!(expense_id = expense.id, "expense updated");
    Ok(Json(json!({ "msg": "Successfully updated expense" })))
}

/// DELETE /expense/items/:id
#[instrument(skip(state, user), fields(user_id = user.0.id))]
pub async fn delete_expense(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let removed = delete_for_owner::<Expense>(&state.db, &IdInput::from(id), user.0.id).await?;
    if !removed {
        return Err(ApiError::NotFound("Expense not found"));
    }
    info!("expense deleted");
    Ok(Json(json!({ "msg": "Successfully deleted expense" })))
}
