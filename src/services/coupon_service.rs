use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::coupons::{CouponData, CouponsList, CreateCouponRequest},
    entity::coupons::{self, Column as CouponCol, Entity as Coupons},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Coupon,
    response::ApiResponse,
    routes::params::{Pagination, SortOrder},
    state::AppState,
};

pub async fn list_coupons(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
    sort_order: Option<SortOrder>,
) -> AppResult<ApiResponse<CouponsList>> {
    ensure_admin(user)?;
    let (_, limit, offset) = pagination.normalize();

    let mut finder = Coupons::find();
    finder = match sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(CouponCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(CouponCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let coupons = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(coupon_from_entity)
        .collect();

    Ok(ApiResponse::with_total(CouponsList { coupons }, total))
}

pub async fn create_coupon(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCouponRequest,
) -> AppResult<ApiResponse<CouponData>> {
    ensure_admin(user)?;

    let existing = Coupons::find()
        .filter(CouponCol::Name.eq(payload.name.as_str()))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest("Coupon name is already taken".into()));
    }

    let coupon = coupons::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        discount: Set(payload.discount),
        expiration_date: Set(payload.expiration_date.into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "coupon_create",
        Some("coupons"),
        Some(serde_json::json!({ "coupon_id": coupon.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(CouponData {
        coupon: coupon_from_entity(coupon),
    }))
}

pub async fn delete_coupon(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<()> {
    ensure_admin(user)?;

    let result = Coupons::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Coupon"));
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "coupon_delete",
        Some("coupons"),
        Some(serde_json::json!({ "coupon_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(())
}

pub(crate) fn coupon_from_entity(model: coupons::Model) -> Coupon {
    Coupon {
        id: model.id,
        name: model.name,
        discount: model.discount,
        expiration_date: model.expiration_date.with_timezone(&Utc),
        created_at: model.created_at.with_timezone(&Utc),
    }
}
