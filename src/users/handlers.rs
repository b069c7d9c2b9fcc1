use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::auth::jwt::JwtKeys;
use crate::error::ApiError;
use crate::ids::IdInput;
use crate::state::AppState;
use crate::users::dto::{load_new, load_patch, strip_immutable_fields, UserOut};
use crate::users::repo::User;

/// GET /users/ — every user, output allow-listed. An empty table dumps as
/// an empty object.
#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let users = User::all(&state.db).await?;
    if users.is_empty() {
        return Ok(Json(json!({})));
    }
    let out: Vec<UserOut> = users.iter().map(UserOut::from).collect();
    Ok(Json(serde_json::to_value(out).map_err(anyhow::Error::from)?))
}

/// GET /users/:id — a single user, or an empty object when the id does not
/// resolve.
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match User::get_by_id(&state.db, &IdInput::from(id)).await? {
        Some(user) => Ok(Json(
            serde_json::to_value(UserOut::from(&user)).map_err(anyhow::Error::from)?,
        )),
        None => Ok(Json(json!({}))),
    }
}

/// POST /users/ — registration. Open route: no token required.
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let new = load_new(&payload).map_err(ApiError::Validation)?;
    let user = User::create(&state.db, new).await.map_err(ApiError::Storage)?;
    info!(user_id = user.id, username = %user.username, "user created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "msg": "Successfully created user" })),
    ))
}

/// PATCH /users/:id — partial update. Password and email changes need a
/// dedicated flow and are stripped from the payload before loading.
#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    strip_immutable_fields(&mut payload);

    let mut user = User::get_by_id(&state.db, &IdInput::from(id))
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    let patch = load_patch(&payload).map_err(ApiError::Validation)?;
    patch.apply(&mut user);
    let user = user.save(&state.db).await.map_err(ApiError::Storage)?;
    info!(user_id = user.id, "user updated");
    Ok(Json(json!({ "msg": "Successfully updated user" })))
}

/// DELETE /users/:id
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = User::get_by_id(&state.db, &IdInput::from(id))
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;
    User::delete(&state.db, user.id).await?;
    info!(user_id = user.id, "user deleted");
    Ok(Json(json!({ "msg": "Successfully deleted user" })))
}

/// POST /users/auth/login — exchange email + password for a bearer token.
/// Open route: logging in must work without a pre-existing token.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let email = payload.get("email").and_then(Value::as_str);
    let password = payload.get("password").and_then(Value::as_str);

    let (Some(email), Some(password)) = (email, password) else {
        warn!("login payload missing email or password");
        return Err(ApiError::NotFound("User not found"));
    };

    let found = User::find_by_email(&state.db, email).await?;
    let user = match found {
        Some(user) => user.check_password(password)?.then_some(user),
        None => None,
    };
    let Some(user) = user else {
        warn!(email, "login rejected");
        return Err(ApiError::NotFound("User not found"));
    };

    let keys = JwtKeys::from_ref(&state);
    let auth_token = keys.sign(user.id)?;
    info!(user_id = user.id, "user logged in");
    Ok(Json(json!({
        "msg": "Successfully logged in",
        "auth_token": auth_token,
    })))
}
