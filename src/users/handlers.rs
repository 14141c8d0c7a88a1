use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    error::ApiError,
    state::AppState,
    users::{
        dto::{ApiResponse, CreateUserRequest, UpdateUserRequest, UserResponse},
        services::NewAccount,
    },
    validation,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user)
                .put(update_user)
                .patch(update_user)
                .delete(delete_user),
        )
}

pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::Validation(format!("Invalid request data: {}", e.body_text())))
}

fn user_id(id: Result<Path<i32>, PathRejection>) -> Result<i32, ApiError> {
    id.map(|Path(id)| id)
        .map_err(|_| ApiError::Validation("Invalid user ID".into()))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    let req = json_body(payload)?;
    validation::name(&req.name)?;
    validation::email(&req.email)?;
    validation::new_password(&req.password)?;
    validation::age(req.age)?;

    let user = state
        .accounts
        .create_user(NewAccount {
            name: req.name,
            email: req.email,
            password: req.password,
            age: req.age,
            is_active: req.is_active,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::data(user))))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, ApiError> {
    let users = state.accounts.list_all().await?;
    Ok(Json(ApiResponse::data(users)))
}

#[instrument(skip(state, id))]
pub async fn get_user(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let id = user_id(id)?;
    let user = state.accounts.get_by_id(id).await?;
    Ok(Json(ApiResponse::data(user)))
}

/// Backs both PUT and PATCH; either way only present fields change.
#[instrument(skip(state, id, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let id = user_id(id)?;
    let req = json_body(payload)?;
    if let Some(name) = &req.name {
        validation::name(name)?;
    }
    if let Some(email) = &req.email {
        validation::email(email)?;
    }
    validation::age(req.age.flatten())?;

    let user = state.accounts.update_user(id, req.into()).await?;
    Ok(Json(ApiResponse::data(user)))
}

#[instrument(skip(state, id))]
pub async fn delete_user(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let id = user_id(id)?;
    state.accounts.delete_user(id).await?;
    Ok(Json(ApiResponse::message("User deleted successfully")))
}
