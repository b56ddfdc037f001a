use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::products::{
        BrandsData, CreateProductRequest, ProductData, ProductsList, UpdateProductRequest,
    },
    entity::users::UserRole,
    error::AppResult,
    middleware::{
        auth::{AuthUser, ensure_one_of, ensure_seller},
        validate::ValidatedJson,
    },
    response::ApiResponse,
    routes::params::{ProductQuery, SimilarQuery},
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/brands", get(get_product_brands))
        .route("/{id}", get(get_product))
        .route("/{id}", patch(update_product))
        .route("/{id}", delete(delete_product))
        .route("/{id}/similar", get(get_similar_products))
}

#[utoipa::path(
    get,
    path = "/v1/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("perPage" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Text search over title and description"),
        ("category" = Option<Uuid>, Query, description = "Filter by category"),
        ("subcategories" = Option<String>, Query, description = "Comma-separated subcategory ids"),
        ("brands" = Option<String>, Query, description = "Comma-separated brand names"),
        ("rating" = Option<i32>, Query, description = "Rounded-up average rating"),
    ),
    responses(
        (status = 200, description = "List products", body = ApiResponse<ProductsList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductsList>>> {
    let resp = product_service::list_products(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/v1/products/brands",
    responses(
        (status = 200, description = "Distinct brand names", body = ApiResponse<BrandsData>)
    ),
    tag = "Products"
)]
pub async fn get_product_brands(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<BrandsData>>> {
    let resp = product_service::get_product_brands(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/v1/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<ProductData>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProductData>>> {
    let resp = product_service::get_product(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/v1/products/{id}/similar",
    params(
        ("id" = Uuid, Path, description = "Product ID"),
        ("perPage" = Option<i64>, Query, description = "Number of products, default 3"),
    ),
    responses(
        (status = 200, description = "Products from the same category", body = ApiResponse<ProductsList>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_similar_products(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<SimilarQuery>,
) -> AppResult<Json<ApiResponse<ProductsList>>> {
    let resp = product_service::get_similar_products(&state, id, query.per_page).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/v1/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Create product", body = ApiResponse<ProductData>),
        (status = 400, description = "Shop not eligible to list products")
    ),
    security(("cookie_auth" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateProductRequest>,
) -> AppResult<impl IntoResponse> {
    ensure_seller(&user)?;
    let resp = product_service::create_product(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/v1/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated product", body = ApiResponse<ProductData>),
        (status = 404, description = "Product not found"),
    ),
    security(("cookie_auth" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<ProductData>>> {
    ensure_one_of(&user, &[UserRole::Seller, UserRole::Admin])?;
    let resp = product_service::update_product(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/v1/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 204, description = "Deleted product"),
        (status = 404, description = "Product not found"),
    ),
    security(("cookie_auth" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    ensure_one_of(&user, &[UserRole::Seller, UserRole::Admin])?;
    product_service::delete_product(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
