use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::OrmConn,
    dto::shops::{
        ShopData, ShopsList, UpdateShopActivityRequest, UpdateShopInfoRequest,
        UpdateShopPaymentRequest,
    },
    entity::shops::{
        self, Column as ShopCol, Entity as Shops, ShopActivityStatus, ShopPaymentStatus,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Shop,
    response::ApiResponse,
    routes::params::{ShopListQuery, SortOrder},
    state::AppState,
};

pub(crate) async fn find_shop_for_user(
    orm: &OrmConn,
    user_id: Uuid,
) -> AppResult<Option<shops::Model>> {
    Ok(Shops::find()
        .filter(ShopCol::UserId.eq(user_id))
        .one(orm)
        .await?)
}

/// Every seller gets exactly one shop, created at registration time and
/// gated by the admin activation workflow afterwards.
pub(crate) async fn create_for_user<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<shops::Model> {
    let shop = shops::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        activity_status: Set(ShopActivityStatus::Pending),
        payment_status: Set(ShopPaymentStatus::Unpaid),
        shop_info: Set(serde_json::json!({})),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(shop)
}

pub async fn list_shops(
    state: &AppState,
    user: &AuthUser,
    query: ShopListQuery,
) -> AppResult<ApiResponse<ShopsList>> {
    ensure_admin(user)?;
    let (_, limit, offset) = query.pagination.normalize();

    // the admin console browses the activation queue by default
    let activity_status = query.activity_status.unwrap_or(ShopActivityStatus::Pending);
    let condition = Condition::all().add(ShopCol::ActivityStatus.eq(activity_status));

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Shops::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(ShopCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(ShopCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let shops = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(shop_from_entity)
        .collect();

    Ok(ApiResponse::with_total(ShopsList { shops }, total))
}

pub async fn get_shop(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ShopData>> {
    let shop = Shops::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Shop"))?;
    Ok(ApiResponse::success(ShopData {
        shop: shop_from_entity(shop),
    }))
}

pub async fn get_seller_shop(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<ShopData>> {
    let shop = find_shop_for_user(&state.orm, user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Shop"))?;
    Ok(ApiResponse::success(ShopData {
        shop: shop_from_entity(shop),
    }))
}

pub async fn update_shop_info(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateShopInfoRequest,
) -> AppResult<ApiResponse<ShopData>> {
    let shop = find_shop_for_user(&state.orm, user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Shop"))?;

    let mut info = match shop.shop_info.clone() {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    info.insert("name".into(), serde_json::json!(payload.shop_name));
    if let Some(country) = payload.country {
        info.insert("country".into(), serde_json::json!(country));
    }
    if let Some(city) = payload.city {
        info.insert("city".into(), serde_json::json!(city));
    }

    let mut active: shops::ActiveModel = shop.into();
    active.shop_info = Set(serde_json::Value::Object(info));
    active.updated_at = Set(Utc::now().into());
    let shop = active.update(&state.orm).await?;

    Ok(ApiResponse::success(ShopData {
        shop: shop_from_entity(shop),
    }))
}

pub async fn update_payment_status(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateShopPaymentRequest,
) -> AppResult<ApiResponse<ShopData>> {
    let shop = find_shop_for_user(&state.orm, user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Shop"))?;

    let mut active: shops::ActiveModel = shop.into();
    active.payment_status = Set(payload.payment_status);
    active.updated_at = Set(Utc::now().into());
    let shop = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "shop_payment_status",
        Some("shops"),
        Some(serde_json::json!({ "shop_id": shop.id, "payment_status": shop.payment_status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(ShopData {
        shop: shop_from_entity(shop),
    }))
}

/// Admin activation workflow.
pub async fn update_activity_status(
    state: &AppState,
    user: &AuthUser,
    shop_id: Uuid,
    payload: UpdateShopActivityRequest,
) -> AppResult<ApiResponse<ShopData>> {
    ensure_admin(user)?;
    let shop = Shops::find_by_id(shop_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Shop"))?;

    let mut active: shops::ActiveModel = shop.into();
    active.activity_status = Set(payload.activity_status);
    active.updated_at = Set(Utc::now().into());
    let shop = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "shop_activity_status",
        Some("shops"),
        Some(serde_json::json!({ "shop_id": shop.id, "activity_status": shop.activity_status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(ShopData {
        shop: shop_from_entity(shop),
    }))
}

/// Gate for product listing: the shop must be activated and paid up.
pub(crate) fn can_list_products(shop: &shops::Model) -> bool {
    shop.activity_status == ShopActivityStatus::Active
        && shop.payment_status == ShopPaymentStatus::Paid
}

pub(crate) fn shop_from_entity(model: shops::Model) -> Shop {
    Shop {
        id: model.id,
        user: model.user_id,
        activity_status: model.activity_status,
        payment_status: model.payment_status,
        shop_info: model.shop_info,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
