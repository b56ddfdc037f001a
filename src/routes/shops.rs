use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    dto::shops::{
        ShopData, ShopsList, UpdateShopActivityRequest, UpdateShopInfoRequest,
        UpdateShopPaymentRequest,
    },
    error::AppResult,
    middleware::{
        auth::{AuthUser, ensure_seller},
        validate::ValidatedJson,
    },
    response::ApiResponse,
    routes::params::ShopListQuery,
    services::shop_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_shops))
        .route("/seller", get(get_seller_shop))
        .route("/seller/info", patch(update_shop_info))
        .route("/seller/payment", patch(update_payment_status))
        .route("/{id}", get(get_shop))
        .route("/{id}/activity", patch(update_activity_status))
}

#[utoipa::path(
    get,
    path = "/v1/shops",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("perPage" = Option<i64>, Query, description = "Items per page, default 20"),
        ("activityStatus" = Option<String>, Query, description = "Filter by activity status, default pending"),
    ),
    responses(
        (status = 200, description = "List shops by activity status", body = ApiResponse<ShopsList>)
    ),
    security(("cookie_auth" = [])),
    tag = "Shops"
)]
pub async fn list_shops(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ShopListQuery>,
) -> AppResult<Json<ApiResponse<ShopsList>>> {
    let resp = shop_service::list_shops(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/v1/shops/seller",
    responses(
        (status = 200, description = "The caller's own shop", body = ApiResponse<ShopData>),
        (status = 404, description = "Shop not found"),
    ),
    security(("cookie_auth" = [])),
    tag = "Shops"
)]
pub async fn get_seller_shop(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ShopData>>> {
    ensure_seller(&user)?;
    let resp = shop_service::get_seller_shop(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/v1/shops/seller/info",
    request_body = UpdateShopInfoRequest,
    responses(
        (status = 200, description = "Updated shop info", body = ApiResponse<ShopData>),
        (status = 404, description = "Shop not found"),
    ),
    security(("cookie_auth" = [])),
    tag = "Shops"
)]
pub async fn update_shop_info(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<UpdateShopInfoRequest>,
) -> AppResult<Json<ApiResponse<ShopData>>> {
    ensure_seller(&user)?;
    let resp = shop_service::update_shop_info(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/v1/shops/seller/payment",
    request_body = UpdateShopPaymentRequest,
    responses(
        (status = 200, description = "Updated payment status", body = ApiResponse<ShopData>),
        (status = 404, description = "Shop not found"),
    ),
    security(("cookie_auth" = [])),
    tag = "Shops"
)]
pub async fn update_payment_status(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateShopPaymentRequest>,
) -> AppResult<Json<ApiResponse<ShopData>>> {
    ensure_seller(&user)?;
    let resp = shop_service::update_payment_status(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/v1/shops/{id}",
    params(
        ("id" = Uuid, Path, description = "Shop ID")
    ),
    responses(
        (status = 200, description = "Get shop", body = ApiResponse<ShopData>),
        (status = 404, description = "Shop not found"),
    ),
    security(("cookie_auth" = [])),
    tag = "Shops"
)]
pub async fn get_shop(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ShopData>>> {
    let resp = shop_service::get_shop(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/v1/shops/{id}/activity",
    params(
        ("id" = Uuid, Path, description = "Shop ID")
    ),
    request_body = UpdateShopActivityRequest,
    responses(
        (status = 200, description = "Updated activity status", body = ApiResponse<ShopData>),
        (status = 404, description = "Shop not found"),
    ),
    security(("cookie_auth" = [])),
    tag = "Shops"
)]
pub async fn update_activity_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateShopActivityRequest>,
) -> AppResult<Json<ApiResponse<ShopData>>> {
    let resp = shop_service::update_activity_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
