use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::categories::{
        CreateSubcategoryRequest, SubcategoriesList, SubcategoryData, UpdateSubcategoryRequest,
    },
    entity::{
        categories::Entity as Categories,
        subcategories::{self, Column as SubcategoryCol, Entity as Subcategories},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Subcategory,
    response::ApiResponse,
    routes::params::{Pagination, SortOrder},
    services::slugify,
    state::AppState,
};

pub async fn list_subcategories(
    state: &AppState,
    category: Option<Uuid>,
    pagination: Pagination,
    sort_order: Option<SortOrder>,
) -> AppResult<ApiResponse<SubcategoriesList>> {
    let (_, limit, offset) = pagination.normalize();

    let mut finder = Subcategories::find();
    if let Some(category_id) = category {
        finder = finder.filter(SubcategoryCol::CategoryId.eq(category_id));
    }
    finder = match sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(SubcategoryCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(SubcategoryCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let subcategories = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(subcategory_from_entity)
        .collect();

    Ok(ApiResponse::with_total(
        SubcategoriesList { subcategories },
        total,
    ))
}

pub async fn get_subcategory(state: &AppState, id: Uuid) -> AppResult<ApiResponse<SubcategoryData>> {
    let subcategory = Subcategories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Subcategory"))?;
    Ok(ApiResponse::success(SubcategoryData {
        subcategory: subcategory_from_entity(subcategory),
    }))
}

pub async fn create_subcategory(
    state: &AppState,
    user: &AuthUser,
    payload: CreateSubcategoryRequest,
) -> AppResult<ApiResponse<SubcategoryData>> {
    ensure_admin(user)?;

    Categories::find_by_id(payload.category)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;

    let subcategory = subcategories::ActiveModel {
        id: Set(Uuid::new_v4()),
        category_id: Set(payload.category),
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
        "subcategory_create",
        Some("subcategories"),
        Some(serde_json::json!({ "subcategory_id": subcategory.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(SubcategoryData {
        subcategory: subcategory_from_entity(subcategory),
    }))
}

pub async fn update_subcategory(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateSubcategoryRequest,
) -> AppResult<ApiResponse<SubcategoryData>> {
    ensure_admin(user)?;

    let existing = Subcategories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Subcategory"))?;

    let mut active: subcategories::ActiveModel = existing.into();
    active.slug = Set(slugify(&payload.name));
    active.name = Set(payload.name);
    active.updated_at = Set(Utc::now().into());
    let subcategory = active.update(&state.orm).await?;

    Ok(ApiResponse::success(SubcategoryData {
        subcategory: subcategory_from_entity(subcategory),
    }))
}

pub async fn delete_subcategory(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<()> {
    ensure_admin(user)?;

    let result = Subcategories::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Subcategory"));
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "subcategory_delete",
        Some("subcategories"),
        Some(serde_json::json!({ "subcategory_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(())
}

pub(crate) fn subcategory_from_entity(model: subcategories::Model) -> Subcategory {
    Subcategory {
        id: model.id,
        category: model.category_id,
        name: model.name,
        slug: model.slug,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
