use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{get, patch, post},
};

use crate::{
    dto::auth::{ChangePasswordRequest, CurrentUserData, LoginRequest, RegisterRequest, UserData},
    error::AppResult,
    middleware::{
        auth::{AuthUser, expired_session_cookie, session_cookie},
        validate::ValidatedJson,
    },
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/current-user", get(current_user))
        .route("/password", patch(change_password))
}

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Register user", body = ApiResponse<UserData>),
        (status = 400, description = "Email taken or payload invalid")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let (token, body) = auth_service::register_user(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(body),
    ))
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<UserData>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let (token, body) = auth_service::login_user(&state, payload).await?;
    Ok(([(header::SET_COOKIE, session_cookie(&token))], Json(body)))
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 200, description = "Clear the session cookie")
    ),
    tag = "Auth"
)]
pub async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, expired_session_cookie())],
        Json(ApiResponse::success(serde_json::json!({}))),
    )
}

#[utoipa::path(
    get,
    path = "/v1/auth/current-user",
    responses(
        (status = 200, description = "Current user, or null without a valid session", body = ApiResponse<CurrentUserData>)
    ),
    tag = "Auth"
)]
pub async fn current_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<ApiResponse<CurrentUserData>>> {
    let resp = auth_service::current_user(&state, &headers).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/v1/auth/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Incorrect current password")
    ),
    security(("cookie_auth" = [])),
    tag = "Auth"
)]
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = auth_service::change_password(&state, &user, payload).await?;
    Ok(Json(resp))
}
