use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::reviews::{MyReviewData, ReviewData, ReviewRequest, ReviewSummaryData, ReviewsList},
    error::AppResult,
    middleware::{auth::AuthUser, validate::ValidatedJson},
    response::ApiResponse,
    routes::params::ListQuery,
    services::review_service,
    state::AppState,
};

/// Mounted under `/products`; every path is product-scoped.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/reviews", get(list_product_reviews).put(review_product))
        .route("/{id}/reviews/me", get(get_my_review))
        .route("/{id}/reviews/summary", get(get_review_summary))
}

#[utoipa::path(
    get,
    path = "/v1/products/{id}/reviews",
    params(
        ("id" = Uuid, Path, description = "Product ID"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("perPage" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "Reviews for a product", body = ApiResponse<ReviewsList>)
    ),
    tag = "Reviews"
)]
pub async fn list_product_reviews(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<ReviewsList>>> {
    let resp =
        review_service::list_product_reviews(&state, id, query.pagination, query.sort_order)
            .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/v1/products/{id}/reviews/me",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "The caller's review, or null", body = ApiResponse<MyReviewData>)
    ),
    security(("cookie_auth" = [])),
    tag = "Reviews"
)]
pub async fn get_my_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MyReviewData>>> {
    let resp = review_service::get_my_review(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/v1/products/{id}/reviews",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Review created or replaced", body = ApiResponse<ReviewData>),
        (status = 404, description = "Product not found"),
    ),
    security(("cookie_auth" = [])),
    tag = "Reviews"
)]
pub async fn review_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ReviewRequest>,
) -> AppResult<Json<ApiResponse<ReviewData>>> {
    let resp = review_service::review_product(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/v1/products/{id}/reviews/summary",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Star histogram and average", body = ApiResponse<ReviewSummaryData>)
    ),
    tag = "Reviews"
)]
pub async fn get_review_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ReviewSummaryData>>> {
    let resp = review_service::get_review_summary(&state, id).await?;
    Ok(Json(resp))
}
