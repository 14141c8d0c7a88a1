use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::dto::{LoginRequest, SignupRequest},
    error::ApiError,
    state::AppState,
    users::dto::{ApiResponse, UserResponse},
    users::handlers::json_body,
    validation,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    let req = json_body(payload)?;
    validation::name(&req.name)?;
    validation::email(&req.email)?;
    validation::new_password(&req.password)?;
    validation::age(req.age)?;

    let user = state
        .accounts
        .signup(req.name, req.email, req.password, req.age)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::data(user))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let req = json_body(payload)?;
    validation::email(&req.email)?;
    validation::login_password(&req.password)?;

    let user = state.accounts.login(&req.email, req.password).await?;
    Ok(Json(ApiResponse::data(user)))
}
