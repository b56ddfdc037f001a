use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, QueryOrder, QuerySelect, Set};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::categories::{CategoriesList, CategoryData, UpsertCategoryRequest},
    entity::categories::{self, Column as CategoryCol, Entity as Categories},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Category,
    response::ApiResponse,
    routes::params::{Pagination, SortOrder},
    services::slugify,
    state::AppState,
};

pub async fn list_categories(
    state: &AppState,
    pagination: Pagination,
    sort_order: Option<SortOrder>,
) -> AppResult<ApiResponse<CategoriesList>> {
    let (_, limit, offset) = pagination.normalize();

    let mut finder = Categories::find();
    finder = match sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(CategoryCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(CategoryCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let categories = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();

    Ok(ApiResponse::with_total(CategoriesList { categories }, total))
}

pub async fn get_category(state: &AppState, id: Uuid) -> AppResult<ApiResponse<CategoryData>> {
    let category = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;
    Ok(ApiResponse::success(CategoryData {
        category: category_from_entity(category),
    }))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: UpsertCategoryRequest,
) -> AppResult<ApiResponse<CategoryData>> {
    ensure_admin(user)?;

    let category = categories::ActiveModel {
        id: Set(Uuid::new_v4()),
        slug: Set(slugify(&payload.name)),
        name: Set(payload.name),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "category_create",
        Some("categories"),
        Some(serde_json::json!({ "category_id": category.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(CategoryData {
        category: category_from_entity(category),
    }))
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpsertCategoryRequest,
) -> AppResult<ApiResponse<CategoryData>> {
    ensure_admin(user)?;

    let existing = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;

    let mut active: categories::ActiveModel = existing.into();
    active.slug = Set(slugify(&payload.name));
    active.name = Set(payload.name);
    active.updated_at = Set(Utc::now().into());
    let category = active.update(&state.orm).await?;

    Ok(ApiResponse::success(CategoryData {
        category: category_from_entity(category),
    }))
}

pub async fn delete_category(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<()> {
    ensure_admin(user)?;

    let result = Categories::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Category"));
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "category_delete",
        Some("categories"),
        Some(serde_json::json!({ "category_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(())
}

pub(crate) fn category_from_entity(model: categories::Model) -> Category {
    Category {
        id: model.id,
        name: model.name,
        slug: model.slug,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
