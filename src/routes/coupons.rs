use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    dto::coupons::{CouponData, CouponsList, CreateCouponRequest},
    error::AppResult,
    middleware::{auth::AuthUser, validate::ValidatedJson},
    response::ApiResponse,
    routes::params::ListQuery,
    services::coupon_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_coupons).post(create_coupon))
        .route("/{id}", delete(delete_coupon))
}

#[utoipa::path(
    get,
    path = "/v1/coupons",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("perPage" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "List coupons", body = ApiResponse<CouponsList>)
    ),
    security(("cookie_auth" = [])),
    tag = "Coupons"
)]
pub async fn list_coupons(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<CouponsList>>> {
    let resp =
        coupon_service::list_coupons(&state, &user, query.pagination, query.sort_order).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/v1/coupons",
    request_body = CreateCouponRequest,
    responses(
        (status = 201, description = "Create coupon", body = ApiResponse<CouponData>),
        (status = 400, description = "Name taken or payload invalid"),
    ),
    security(("cookie_auth" = [])),
    tag = "Coupons"
)]
pub async fn create_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateCouponRequest>,
) -> AppResult<impl IntoResponse> {
    let resp = coupon_service::create_coupon(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/v1/coupons/{id}",
    params(
        ("id" = Uuid, Path, description = "Coupon ID")
    ),
    responses(
        (status = 204, description = "Deleted coupon"),
        (status = 404, description = "Coupon not found"),
    ),
    security(("cookie_auth" = [])),
    tag = "Coupons"
)]
pub async fn delete_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    coupon_service::delete_coupon(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
