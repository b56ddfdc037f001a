use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::wishlist::WishlistData,
    entity::{
        products::{Column as ProdCol, Entity as Products},
        wishlist_items::{self, Column as WishCol, Entity as WishlistItems},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::ApiResponse,
    services::product_service::hydrate_products,
    state::AppState,
};

pub async fn get_wishlist(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<WishlistData>> {
    let products = load_wishlist_products(state, user.user_id).await?;
    Ok(ApiResponse::success(WishlistData { products }))
}

pub async fn add_to_wishlist(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<WishlistData>> {
    Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let existing = WishlistItems::find()
        .filter(WishCol::UserId.eq(user.user_id))
        .filter(WishCol::ProductId.eq(product_id))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest(
            "This product is already on the wishlist".into(),
        ));
    }

    wishlist_items::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        product_id: Set(product_id),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "wishlist_add",
        Some("wishlist_items"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let products = load_wishlist_products(state, user.user_id).await?;
    Ok(ApiResponse::success(WishlistData { products }))
}

pub async fn remove_from_wishlist(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<WishlistData>> {
    let existing = WishlistItems::find()
        .filter(WishCol::UserId.eq(user.user_id))
        .filter(WishCol::ProductId.eq(product_id))
        .one(&state.orm)
        .await?;
    let Some(existing) = existing else {
        return Err(AppError::BadRequest(
            "This product is not on the wishlist".into(),
        ));
    };

    WishlistItems::delete_by_id(existing.id)
        .exec(&state.orm)
        .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "wishlist_remove",
        Some("wishlist_items"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let products = load_wishlist_products(state, user.user_id).await?;
    Ok(ApiResponse::success(WishlistData { products }))
}

async fn load_wishlist_products(state: &AppState, user_id: Uuid) -> AppResult<Vec<Product>> {
    let items = WishlistItems::find()
        .filter(WishCol::UserId.eq(user_id))
        .order_by_desc(WishCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = items.iter().map(|item| item.product_id).collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let models = Products::find()
        .filter(ProdCol::Id.is_in(ids.clone()))
        .all(&state.orm)
        .await?;
    let mut products = hydrate_products(&state.orm, models).await?;

    // keep most-recently-added first, matching the wishlist row order
    products.sort_by_key(|product| ids.iter().position(|id| *id == product.id));
    Ok(products)
}
