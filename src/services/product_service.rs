use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, Query as SeaQuery, extension::postgres::PgExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::OrmConn,
    dto::products::{BrandsData, CreateProductRequest, ProductData, ProductsList, UpdateProductRequest},
    entity::{
        categories::Entity as Categories,
        product_subcategories::{self, Column as LinkCol, Entity as ProductSubcategories},
        products::{self, Column as ProdCol, Entity as Products},
        users::UserRole,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Product, ProductImage},
    response::ApiResponse,
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::{shop_service, slugify},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductsList>> {
    let (_, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(ProdCol::Title).ilike(pattern.clone()))
                .add(Expr::col(ProdCol::Description).ilike(pattern)),
        );
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(ProdCol::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(ProdCol::Price.lte(max_price));
    }
    if let Some(category) = query.category {
        condition = condition.add(ProdCol::CategoryId.eq(category));
    }
    if let Some(shop) = query.shop {
        condition = condition.add(ProdCol::ShopId.eq(shop));
    }
    if let Some(brands) = query.brands.as_ref().filter(|s| !s.is_empty()) {
        let brands: Vec<&str> = brands.split(',').map(str::trim).collect();
        condition = condition.add(ProdCol::Brand.is_in(brands));
    }
    if let Some(shipping) = query.shipping {
        condition = condition.add(ProdCol::Shipping.eq(shipping));
    }
    if let Some(rating) = query.rating {
        // ceil(average_rating) == rating, expressed as a half-open range
        let rating = Decimal::from(rating);
        condition = condition
            .add(ProdCol::AverageRating.gt(rating - Decimal::ONE))
            .add(ProdCol::AverageRating.lte(rating));
    }
    if let Some(subcategories) = query.subcategories.as_ref().filter(|s| !s.is_empty()) {
        let ids: Vec<Uuid> = subcategories
            .split(',')
            .filter_map(|raw| Uuid::parse_str(raw.trim()).ok())
            .collect();
        if !ids.is_empty() {
            condition = condition.add(
                ProdCol::Id.in_subquery(
                    SeaQuery::select()
                        .column(LinkCol::ProductId)
                        .from(ProductSubcategories)
                        .and_where(LinkCol::SubcategoryId.is_in(ids))
                        .to_owned(),
                ),
            );
        }
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => ProdCol::CreatedAt,
        ProductSortBy::Price => ProdCol::Price,
        ProductSortBy::Title => ProdCol::Title,
        ProductSortBy::Sold => ProdCol::Sold,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let page_models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let products = hydrate_products(&state.orm, page_models).await?;

    Ok(ApiResponse::with_total(ProductsList { products }, total))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductData>> {
    let model = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let subcategories = subcategory_ids(&state.orm, &[id]).await?;
    let product = product_from_entity(model, subcategories.get(&id).cloned().unwrap_or_default())?;

    Ok(ApiResponse::success(ProductData { product }))
}

/// Other products from the same category, excluding the product itself.
pub async fn get_similar_products(
    state: &AppState,
    id: Uuid,
    per_page: Option<i64>,
) -> AppResult<ApiResponse<ProductsList>> {
    let model = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let limit = per_page.unwrap_or(3).clamp(1, 50);
    let condition = Condition::all()
        .add(ProdCol::Id.ne(model.id))
        .add(ProdCol::CategoryId.eq(model.category_id));

    let finder = Products::find().filter(condition);
    let total = finder.clone().count(&state.orm).await? as i64;
    let similar = finder.limit(limit as u64).all(&state.orm).await?;
    let products = hydrate_products(&state.orm, similar).await?;

    Ok(ApiResponse::with_total(ProductsList { products }, total))
}

pub async fn get_product_brands(state: &AppState) -> AppResult<ApiResponse<BrandsData>> {
    let brands: Vec<String> = Products::find()
        .select_only()
        .column(ProdCol::Brand)
        .distinct()
        .order_by_asc(ProdCol::Brand)
        .into_tuple()
        .all(&state.orm)
        .await?;

    Ok(ApiResponse::success(BrandsData { brands }))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<ProductData>> {
    let shop = shop_service::find_shop_for_user(&state.orm, user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Shop"))?;
    if !shop_service::can_list_products(&shop) {
        return Err(AppError::BadRequest(
            "Your shop is not eligible to list products".into(),
        ));
    }

    Categories::find_by_id(payload.category)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Category"))?;

    let txn = state.orm.begin().await?;

    let product = products::ActiveModel {
        id: Set(Uuid::new_v4()),
        shop_id: Set(shop.id),
        category_id: Set(payload.category),
        slug: Set(slugify(&payload.title)),
        title: Set(payload.title),
        description: Set(payload.description),
        price: Set(payload.price),
        discount: Set(payload.discount.unwrap_or(Decimal::ZERO)),
        quantity: Set(payload.quantity),
        sold: Set(0),
        images: Set(serde_json::to_value(&payload.images)
            .map_err(|err| AppError::Internal(err.into()))?),
        shipping: Set(payload.shipping.unwrap_or(true)),
        brand: Set(payload.brand),
        average_rating: Set(Decimal::ZERO),
        review_count: Set(0),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    link_subcategories(&txn, product.id, &payload.subcategories).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let product = product_from_entity(product, payload.subcategories)?;
    Ok(ApiResponse::success(ProductData { product }))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<ProductData>> {
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    ensure_owns_product(state, user, &existing).await?;

    let txn = state.orm.begin().await?;

    let mut active: products::ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.slug = Set(slugify(&title));
        active.title = Set(title);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(discount) = payload.discount {
        active.discount = Set(discount);
    }
    if let Some(category) = payload.category {
        Categories::find_by_id(category)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found("Category"))?;
        active.category_id = Set(category);
    }
    if let Some(quantity) = payload.quantity {
        active.quantity = Set(quantity);
    }
    if let Some(images) = payload.images {
        active.images =
            Set(serde_json::to_value(&images).map_err(|err| AppError::Internal(err.into()))?);
    }
    if let Some(shipping) = payload.shipping {
        active.shipping = Set(shipping);
    }
    if let Some(brand) = payload.brand {
        active.brand = Set(brand);
    }
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&txn).await?;

    if let Some(subcategories) = &payload.subcategories {
        ProductSubcategories::delete_many()
            .filter(LinkCol::ProductId.eq(product.id))
            .exec(&txn)
            .await?;
        link_subcategories(&txn, product.id, subcategories).await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let product_id = product.id;
    let subcategories = subcategory_ids(&state.orm, &[product_id]).await?;
    let product = product_from_entity(
        product,
        subcategories.get(&product_id).cloned().unwrap_or_default(),
    )?;
    Ok(ApiResponse::success(ProductData { product }))
}

pub async fn delete_product(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<()> {
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    ensure_owns_product(state, user, &existing).await?;

    Products::delete_by_id(id).exec(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(())
}

/// Sellers manage their own catalog; admins may touch any product.
async fn ensure_owns_product(
    state: &AppState,
    user: &AuthUser,
    product: &products::Model,
) -> AppResult<()> {
    if user.role == UserRole::Admin {
        return Ok(());
    }
    let shop = shop_service::find_shop_for_user(&state.orm, user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Shop"))?;
    if product.shop_id != shop.id {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

async fn link_subcategories<C: sea_orm::ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    subcategories: &[Uuid],
) -> AppResult<()> {
    for subcategory_id in subcategories {
        product_subcategories::ActiveModel {
            product_id: Set(product_id),
            subcategory_id: Set(*subcategory_id),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

async fn subcategory_ids(
    orm: &OrmConn,
    product_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<Uuid>>> {
    let links = ProductSubcategories::find()
        .filter(LinkCol::ProductId.is_in(product_ids.to_vec()))
        .all(orm)
        .await?;

    let mut by_product: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for link in links {
        by_product
            .entry(link.product_id)
            .or_default()
            .push(link.subcategory_id);
    }
    Ok(by_product)
}

pub(crate) async fn hydrate_products(
    orm: &OrmConn,
    models: Vec<products::Model>,
) -> AppResult<Vec<Product>> {
    let ids: Vec<Uuid> = models.iter().map(|p| p.id).collect();
    let mut subcategories = subcategory_ids(orm, &ids).await?;

    models
        .into_iter()
        .map(|model| {
            let subs = subcategories.remove(&model.id).unwrap_or_default();
            product_from_entity(model, subs)
        })
        .collect()
}

pub(crate) fn product_from_entity(
    model: products::Model,
    subcategories: Vec<Uuid>,
) -> AppResult<Product> {
    let images: Vec<ProductImage> =
        serde_json::from_value(model.images).map_err(|err| AppError::Internal(err.into()))?;
    Ok(Product {
        id: model.id,
        shop: model.shop_id,
        title: model.title,
        slug: model.slug,
        description: model.description,
        price: model.price,
        discount: model.discount,
        category: model.category_id,
        subcategories,
        quantity: model.quantity,
        sold: model.sold,
        images,
        shipping: model.shipping,
        brand: model.brand,
        average_rating: model.average_rating,
        review_count: model.review_count,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}
