use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        BuyerStatsData, CheckoutRequest, OrderData, OrderItemData, OrderItemsList, OrdersList,
        SellerStatsData, UpdateItemStatusRequest,
    },
    entity::users::UserRole,
    error::AppResult,
    middleware::{
        auth::{AuthUser, ensure_buyer, ensure_one_of, ensure_seller},
        validate::ValidatedJson,
    },
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(checkout))
        .route("/stats", get(buyer_stats))
        .route("/seller", get(list_seller_orders))
        .route("/seller/stats", get(seller_stats))
        .route("/seller/{order_item_id}", patch(update_item_status))
}

#[utoipa::path(
    post,
    path = "/v1/orders",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order created across all carted shops", body = ApiResponse<OrderData>),
        (status = 400, description = "Insufficient product quantity or expired coupon")
    ),
    security(("cookie_auth" = [])),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CheckoutRequest>,
) -> AppResult<impl IntoResponse> {
    ensure_buyer(&user)?;
    let resp = order_service::checkout(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/v1/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("perPage" = Option<i64>, Query, description = "Items per page, default 20"),
        ("deliveryStatus" = Option<String>, Query, description = "Filter by delivery status"),
    ),
    responses(
        (status = 200, description = "Buyer order history; admins see all orders", body = ApiResponse<OrdersList>)
    ),
    security(("cookie_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrdersList>>> {
    ensure_one_of(&user, &[UserRole::Buyer, UserRole::Admin])?;
    let resp = order_service::list_buyer_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/v1/orders/stats",
    responses(
        (status = 200, description = "Buyer order counts per delivery status", body = ApiResponse<BuyerStatsData>)
    ),
    security(("cookie_auth" = [])),
    tag = "Orders"
)]
pub async fn buyer_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<BuyerStatsData>>> {
    ensure_buyer(&user)?;
    let resp = order_service::buyer_stats(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/v1/orders/seller",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("perPage" = Option<i64>, Query, description = "Items per page, default 20"),
        ("deliveryStatus" = Option<String>, Query, description = "Filter by delivery status"),
    ),
    responses(
        (status = 200, description = "Order items for the caller's shop", body = ApiResponse<OrderItemsList>)
    ),
    security(("cookie_auth" = [])),
    tag = "Orders"
)]
pub async fn list_seller_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderItemsList>>> {
    ensure_seller(&user)?;
    let resp = order_service::list_seller_order_items(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/v1/orders/seller/stats",
    responses(
        (status = 200, description = "Order item counts for the caller's shop", body = ApiResponse<SellerStatsData>)
    ),
    security(("cookie_auth" = [])),
    tag = "Orders"
)]
pub async fn seller_stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SellerStatsData>>> {
    ensure_seller(&user)?;
    let resp = order_service::seller_stats(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/v1/orders/seller/{order_item_id}",
    params(
        ("order_item_id" = Uuid, Path, description = "Order item ID")
    ),
    request_body = UpdateItemStatusRequest,
    responses(
        (status = 200, description = "Item finalized; parent order status re-derived", body = ApiResponse<OrderItemData>),
        (status = 404, description = "Order item not found"),
    ),
    security(("cookie_auth" = [])),
    tag = "Orders"
)]
pub async fn update_item_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_item_id): Path<Uuid>,
    Json(payload): Json<UpdateItemStatusRequest>,
) -> AppResult<Json<ApiResponse<OrderItemData>>> {
    ensure_seller(&user)?;
    let resp = order_service::update_item_status(&state, &user, order_item_id, payload).await?;
    Ok(Json(resp))
}
