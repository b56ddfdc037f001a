use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::categories::{
        CreateSubcategoryRequest, SubcategoriesList, SubcategoryData, UpdateSubcategoryRequest,
    },
    error::AppResult,
    middleware::{auth::AuthUser, validate::ValidatedJson},
    response::ApiResponse,
    routes::params::SubcategoryListQuery,
    services::subcategory_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_subcategories).post(create_subcategory))
        .route("/{id}", get(get_subcategory))
        .route("/{id}", patch(update_subcategory))
        .route("/{id}", delete(delete_subcategory))
}

#[utoipa::path(
    get,
    path = "/v1/subcategories",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("perPage" = Option<i64>, Query, description = "Items per page, default 20"),
        ("category" = Option<Uuid>, Query, description = "Filter by parent category"),
    ),
    responses(
        (status = 200, description = "List subcategories", body = ApiResponse<SubcategoriesList>)
    ),
    tag = "Categories"
)]
pub async fn list_subcategories(
    State(state): State<AppState>,
    Query(query): Query<SubcategoryListQuery>,
) -> AppResult<Json<ApiResponse<SubcategoriesList>>> {
    let resp = subcategory_service::list_subcategories(
        &state,
        query.category,
        query.pagination,
        query.sort_order,
    )
    .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/v1/subcategories/{id}",
    params(
        ("id" = Uuid, Path, description = "Subcategory ID")
    ),
    responses(
        (status = 200, description = "Get subcategory", body = ApiResponse<SubcategoryData>),
        (status = 404, description = "Subcategory not found"),
    ),
    tag = "Categories"
)]
pub async fn get_subcategory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SubcategoryData>>> {
    let resp = subcategory_service::get_subcategory(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/v1/subcategories",
    request_body = CreateSubcategoryRequest,
    responses(
        (status = 201, description = "Create subcategory", body = ApiResponse<SubcategoryData>),
        (status = 404, description = "Parent category not found"),
    ),
    security(("cookie_auth" = [])),
    tag = "Categories"
)]
pub async fn create_subcategory(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateSubcategoryRequest>,
) -> AppResult<impl IntoResponse> {
    let resp = subcategory_service::create_subcategory(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/v1/subcategories/{id}",
    params(
        ("id" = Uuid, Path, description = "Subcategory ID")
    ),
    request_body = UpdateSubcategoryRequest,
    responses(
        (status = 200, description = "Updated subcategory", body = ApiResponse<SubcategoryData>),
        (status = 404, description = "Subcategory not found"),
    ),
    security(("cookie_auth" = [])),
    tag = "Categories"
)]
pub async fn update_subcategory(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateSubcategoryRequest>,
) -> AppResult<Json<ApiResponse<SubcategoryData>>> {
    let resp = subcategory_service::update_subcategory(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/v1/subcategories/{id}",
    params(
        ("id" = Uuid, Path, description = "Subcategory ID")
    ),
    responses(
        (status = 204, description = "Deleted subcategory"),
        (status = 404, description = "Subcategory not found"),
    ),
    security(("cookie_auth" = [])),
    tag = "Categories"
)]
pub async fn delete_subcategory(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    subcategory_service::delete_subcategory(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
