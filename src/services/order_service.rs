use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{
        BuyerOrderStats, BuyerStatsData, CartLine, CheckoutRequest, OrderData, OrderItemData,
        OrderItemsList, OrdersList, SellerOrderStats, SellerStatsData, UpdateItemStatusRequest,
    },
    entity::{
        coupons::{Column as CouponCol, Entity as Coupons},
        order_items::{
            self, Column as OrderItemCol, Entity as OrderItems, ItemDeliveryStatus,
            ItemPaymentStatus,
        },
        orders::{self, Column as OrderCol, Entity as Orders, OrderDeliveryStatus, OrderPaymentStatus},
        products::{self, Column as ProdCol, Entity as Products},
        users::UserRole,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{ItemLine, Order, OrderItem, OrderLine},
    response::ApiResponse,
    routes::params::{OrderListQuery, SortOrder},
    services::shop_service::find_shop_for_user,
    state::AppState,
};

/// A cart line priced against the product's current price and discount,
/// tagged with the owning shop for the per-seller split.
#[derive(Debug, Clone)]
pub(crate) struct PricedLine {
    pub shop: Uuid,
    pub product: Uuid,
    pub count: i32,
    pub line_total: Decimal,
}

fn line_total(price: Decimal, discount: Decimal, count: i32) -> Decimal {
    let gross = price * Decimal::from(count);
    if discount > Decimal::ZERO {
        gross - gross * discount / Decimal::ONE_HUNDRED
    } else {
        gross
    }
}

/// Applied once to a grand total, never per line.
fn apply_coupon(total: Decimal, discount: Decimal) -> Decimal {
    total - total * discount / Decimal::ONE_HUNDRED
}

/// Validates stock for every line and prices the cart. Rejects the whole
/// cart on the first shortfall; no partial order is ever produced.
fn price_cart(products: &[products::Model], cart: &[CartLine]) -> AppResult<Vec<PricedLine>> {
    let by_id: HashMap<Uuid, &products::Model> = products.iter().map(|p| (p.id, p)).collect();

    let mut lines = Vec::with_capacity(cart.len());
    for cart_line in cart {
        if cart_line.count <= 0 {
            return Err(AppError::BadRequest("Cart has invalid quantity".into()));
        }
        let product = by_id
            .get(&cart_line.product)
            .ok_or_else(|| AppError::not_found("Product"))?;
        if product.quantity < cart_line.count {
            return Err(AppError::BadRequest("Insufficient product quantity".into()));
        }
        lines.push(PricedLine {
            shop: product.shop_id,
            product: product.id,
            count: cart_line.count,
            line_total: line_total(product.price, product.discount, cart_line.count),
        });
    }
    Ok(lines)
}

/// Partition priced lines by shop, preserving first-seen shop order.
fn split_by_shop(lines: &[PricedLine]) -> Vec<(Uuid, Vec<PricedLine>)> {
    let mut groups: Vec<(Uuid, Vec<PricedLine>)> = Vec::new();
    for line in lines {
        match groups.iter_mut().find(|(shop, _)| *shop == line.shop) {
            Some((_, group)) => group.push(line.clone()),
            None => groups.push((line.shop, vec![line.clone()])),
        }
    }
    groups
}

/// Derive the parent order's delivery status from a finished item
/// transition. A transition to `delivered` can only make the parent
/// `delivered`/`partiallyDelivered`; `canceled` only
/// `canceled`/`partiallyCanceled`. A mixed terminal set therefore keeps
/// whichever partial value the last transition produced — deliberately, no
/// dedicated "mixed" state exists. Returns `None` for a non-transition.
fn derive_parent_status(
    trigger: ItemDeliveryStatus,
    siblings: &[ItemDeliveryStatus],
) -> Option<OrderDeliveryStatus> {
    match trigger {
        ItemDeliveryStatus::Delivered => {
            if siblings.iter().all(|s| *s == ItemDeliveryStatus::Delivered) {
                Some(OrderDeliveryStatus::Delivered)
            } else {
                Some(OrderDeliveryStatus::PartiallyDelivered)
            }
        }
        ItemDeliveryStatus::Canceled => {
            if siblings.iter().all(|s| *s == ItemDeliveryStatus::Canceled) {
                Some(OrderDeliveryStatus::Canceled)
            } else {
                Some(OrderDeliveryStatus::PartiallyCanceled)
            }
        }
        ItemDeliveryStatus::Pending => None,
    }
}

/// Checkout: validate stock, price with product discounts and an optional
/// coupon, decrement inventory, and persist one parent order plus one order
/// item per shop. The whole sequence runs in a single transaction with the
/// product rows locked, so concurrent checkouts cannot oversell and a
/// failure never leaves stock or records half-written.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderData>> {
    if payload.cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let txn = state.orm.begin().await?;

    let coupon = match payload.coupon.as_deref() {
        // unknown coupon names are ignored, not rejected
        Some(name) => Coupons::find()
            .filter(CouponCol::Name.eq(name))
            .one(&txn)
            .await?,
        None => None,
    };
    if let Some(coupon) = &coupon {
        if coupon.expiration_date < Utc::now() {
            return Err(AppError::BadRequest(
                "This coupon has already expired.".into(),
            ));
        }
    }

    let product_ids: Vec<Uuid> = payload.cart.iter().map(|line| line.product).collect();
    let cart_products = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .lock(LockType::Update)
        .all(&txn)
        .await?;

    let priced = price_cart(&cart_products, &payload.cart)?;

    let mut total: Decimal = priced.iter().map(|line| line.line_total).sum();
    if let Some(coupon) = &coupon {
        total = apply_coupon(total, coupon.discount);
    }

    for line in &priced {
        Products::update_many()
            .col_expr(ProdCol::Quantity, Expr::col(ProdCol::Quantity).sub(line.count))
            .col_expr(ProdCol::Sold, Expr::col(ProdCol::Sold).add(line.count))
            .filter(ProdCol::Id.eq(line.product))
            .exec(&txn)
            .await?;
    }

    let order_lines: Vec<OrderLine> = priced
        .iter()
        .map(|line| OrderLine {
            shop: line.shop,
            product: line.product,
            count: line.count,
        })
        .collect();

    let order = orders::ActiveModel {
        id: Set(Uuid::new_v4()),
        buyer_id: Set(user.user_id),
        products: Set(to_json(&order_lines)?),
        total_price: Set(total),
        delivery_status: Set(OrderDeliveryStatus::Pending),
        payment_status: Set(OrderPaymentStatus::Paid),
        coupon_id: Set(coupon.as_ref().map(|c| c.id)),
        delivery_address: Set(payload.address.clone()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for (shop_id, shop_lines) in split_by_shop(&priced) {
        let mut subtotal: Decimal = shop_lines.iter().map(|line| line.line_total).sum();
        if let Some(coupon) = &coupon {
            subtotal = apply_coupon(subtotal, coupon.discount);
        }
        let item_lines: Vec<ItemLine> = shop_lines
            .iter()
            .map(|line| ItemLine {
                product: line.product,
                count: line.count,
            })
            .collect();

        order_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            parent_order_id: Set(order.id),
            shop_id: Set(shop_id),
            products: Set(to_json(&item_lines)?),
            total_price: Set(subtotal),
            delivery_status: Set(ItemDeliveryStatus::Pending),
            payment_status: Set(ItemPaymentStatus::Paid),
            coupon_id: Set(coupon.as_ref().map(|c| c.id)),
            delivery_address: Set(payload.address.clone()),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_checkout",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total_price": order.total_price })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(OrderData {
        order: order_from_entity(order)?,
    }))
}

/// Buyer order history; admins see every order.
pub async fn list_buyer_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrdersList>> {
    let (_, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if user.role != UserRole::Admin {
        condition = condition.add(OrderCol::BuyerId.eq(user.user_id));
    }
    if let Some(status) = query.delivery_status {
        condition = condition.add(OrderCol::DeliveryStatus.eq(status));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<Order>>>()?;

    Ok(ApiResponse::with_total(OrdersList { orders }, total))
}

/// The seller's slice of the marketplace: their order items.
pub async fn list_seller_order_items(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderItemsList>> {
    let shop = find_shop_for_user(&state.orm, user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Shop"))?;

    let (_, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all().add(OrderItemCol::ShopId.eq(shop.id));
    if let Some(status) = query.delivery_status {
        condition = condition.add(OrderItemCol::DeliveryStatus.eq(item_status_from_order(status)?));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = OrderItems::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderItemCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderItemCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect::<AppResult<Vec<OrderItem>>>()?;

    Ok(ApiResponse::with_total(OrderItemsList { orders: items }, total))
}

fn item_status_from_order(status: OrderDeliveryStatus) -> AppResult<ItemDeliveryStatus> {
    match status {
        OrderDeliveryStatus::Pending => Ok(ItemDeliveryStatus::Pending),
        OrderDeliveryStatus::Delivered => Ok(ItemDeliveryStatus::Delivered),
        OrderDeliveryStatus::Canceled => Ok(ItemDeliveryStatus::Canceled),
        _ => Err(AppError::BadRequest("Invalid delivery status filter".into())),
    }
}

/// A seller finishes one of their order items, and the parent order's
/// delivery status is re-derived from all siblings. The parent row is
/// locked first so concurrent sibling transitions serialize instead of
/// overwriting each other's aggregate.
pub async fn update_item_status(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    payload: UpdateItemStatusRequest,
) -> AppResult<ApiResponse<OrderItemData>> {
    if payload.delivery_status == ItemDeliveryStatus::Pending {
        return Err(AppError::BadRequest("Invalid delivery status".into()));
    }

    let shop = find_shop_for_user(&state.orm, user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Shop"))?;

    let txn = state.orm.begin().await?;

    let item = OrderItems::find_by_id(item_id)
        .filter(OrderItemCol::ShopId.eq(shop.id))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Order item"))?;

    if item.delivery_status != ItemDeliveryStatus::Pending {
        return Err(AppError::BadRequest("Order item already finalized".into()));
    }

    let parent = Orders::find_by_id(item.parent_order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    let mut active: order_items::ActiveModel = item.into();
    active.delivery_status = Set(payload.delivery_status);
    active.updated_at = Set(Utc::now().into());
    let item = active.update(&txn).await?;

    let sibling_statuses: Vec<ItemDeliveryStatus> = OrderItems::find()
        .filter(OrderItemCol::ParentOrderId.eq(parent.id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|sibling| sibling.delivery_status)
        .collect();

    if let Some(next) = derive_parent_status(payload.delivery_status, &sibling_statuses) {
        let mut parent_active: orders::ActiveModel = parent.into();
        parent_active.delivery_status = Set(next);
        parent_active.updated_at = Set(Utc::now().into());
        parent_active.update(&txn).await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_item_status",
        Some("order_items"),
        Some(serde_json::json!({
            "order_item_id": item.id,
            "delivery_status": payload.delivery_status,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(OrderItemData {
        order: order_item_from_entity(item)?,
    }))
}

#[derive(Debug, sqlx::FromRow)]
struct StatusCountRow {
    delivery_status: String,
    orders: i64,
    total: Decimal,
}

/// Buyer-facing counts per delivery status plus the summed total.
pub async fn buyer_stats(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<BuyerStatsData>> {
    let rows = sqlx::query_as::<_, StatusCountRow>(
        r#"
        SELECT delivery_status, COUNT(*) AS orders, COALESCE(SUM(total_price), 0) AS total
        FROM orders
        WHERE buyer_id = $1
        GROUP BY delivery_status
        "#,
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    let mut stats = BuyerOrderStats {
        total_orders: 0,
        pending_orders: 0,
        partially_delivered_orders: 0,
        delivered_orders: 0,
        partially_canceled_orders: 0,
        canceled_orders: 0,
        total_price: Decimal::ZERO,
    };
    for row in rows {
        stats.total_orders += row.orders;
        stats.total_price += row.total;
        match row.delivery_status.as_str() {
            "pending" => stats.pending_orders += row.orders,
            "partiallyDelivered" => stats.partially_delivered_orders += row.orders,
            "delivered" => stats.delivered_orders += row.orders,
            "partiallyCanceled" => stats.partially_canceled_orders += row.orders,
            "canceled" => stats.canceled_orders += row.orders,
            other => tracing::warn!(status = other, "unknown delivery status in stats"),
        }
    }

    Ok(ApiResponse::success(BuyerStatsData { stats }))
}

/// Seller-facing counts over the caller's order items.
pub async fn seller_stats(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<SellerStatsData>> {
    let shop = find_shop_for_user(&state.orm, user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Shop"))?;

    let rows = sqlx::query_as::<_, StatusCountRow>(
        r#"
        SELECT delivery_status, COUNT(*) AS orders, COALESCE(SUM(total_price), 0) AS total
        FROM order_items
        WHERE shop_id = $1
        GROUP BY delivery_status
        "#,
    )
    .bind(shop.id)
    .fetch_all(&state.pool)
    .await?;

    let mut stats = SellerOrderStats {
        total_orders: 0,
        pending_orders: 0,
        delivered_orders: 0,
        canceled_orders: 0,
        total_price: Decimal::ZERO,
    };
    for row in rows {
        stats.total_orders += row.orders;
        stats.total_price += row.total;
        match row.delivery_status.as_str() {
            "pending" => stats.pending_orders += row.orders,
            "delivered" => stats.delivered_orders += row.orders,
            "canceled" => stats.canceled_orders += row.orders,
            other => tracing::warn!(status = other, "unknown delivery status in stats"),
        }
    }

    Ok(ApiResponse::success(SellerStatsData { stats }))
}

fn to_json<T: serde::Serialize>(value: &T) -> AppResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|err| AppError::Internal(err.into()))
}

pub(crate) fn order_from_entity(model: orders::Model) -> AppResult<Order> {
    let products: Vec<OrderLine> =
        serde_json::from_value(model.products).map_err(|err| AppError::Internal(err.into()))?;
    Ok(Order {
        id: model.id,
        buyer: model.buyer_id,
        products,
        total_price: model.total_price,
        delivery_status: model.delivery_status,
        payment_status: model.payment_status,
        coupon: model.coupon_id,
        delivery_address: model.delivery_address,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub(crate) fn order_item_from_entity(model: order_items::Model) -> AppResult<OrderItem> {
    let products: Vec<ItemLine> =
        serde_json::from_value(model.products).map_err(|err| AppError::Internal(err.into()))?;
    Ok(OrderItem {
        id: model.id,
        parent_order: model.parent_order_id,
        shop: model.shop_id,
        products,
        total_price: model.total_price,
        delivery_status: model.delivery_status,
        payment_status: model.payment_status,
        coupon: model.coupon_id,
        delivery_address: model.delivery_address,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(shop: Uuid, price: Decimal, discount: Decimal, quantity: i32) -> products::Model {
        let now = Utc::now().into();
        products::Model {
            id: Uuid::new_v4(),
            shop_id: shop,
            category_id: Uuid::new_v4(),
            title: "Test product".into(),
            slug: "test-product".into(),
            description: "A product under test".into(),
            price,
            discount,
            quantity,
            sold: 0,
            images: serde_json::json!([]),
            shipping: true,
            brand: "Acme".into(),
            average_rating: Decimal::ZERO,
            review_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn cart_line(product: &products::Model, count: i32) -> CartLine {
        CartLine {
            product: product.id,
            count,
        }
    }

    #[test]
    fn prices_a_two_shop_cart_and_splits_per_shop() {
        let shop1 = Uuid::new_v4();
        let shop2 = Uuid::new_v4();
        let a = product(shop1, dec!(10), Decimal::ZERO, 2);
        let b = product(shop2, dec!(5), Decimal::ZERO, 3);

        let priced = price_cart(
            &[a.clone(), b.clone()],
            &[cart_line(&a, 2), cart_line(&b, 3)],
        )
        .unwrap();

        let total: Decimal = priced.iter().map(|l| l.line_total).sum();
        assert_eq!(total, dec!(35));

        let groups = split_by_shop(&priced);
        assert_eq!(groups.len(), 2);
        let (first_shop, first_lines) = &groups[0];
        let (second_shop, second_lines) = &groups[1];
        assert_eq!(*first_shop, shop1);
        assert_eq!(*second_shop, shop2);
        let first_total: Decimal = first_lines.iter().map(|l| l.line_total).sum();
        let second_total: Decimal = second_lines.iter().map(|l| l.line_total).sum();
        assert_eq!(first_total, dec!(20));
        assert_eq!(second_total, dec!(15));
    }

    #[test]
    fn product_discount_applies_per_line() {
        let shop = Uuid::new_v4();
        let discounted = product(shop, dec!(100), dec!(25), 10);

        let priced = price_cart(&[discounted.clone()], &[cart_line(&discounted, 2)]).unwrap();
        // 200 - 25% = 150
        assert_eq!(priced[0].line_total, dec!(150));
    }

    #[test]
    fn coupon_applies_once_to_the_grand_total() {
        let total = dec!(200);
        let discounted = apply_coupon(total, dec!(10));
        assert_eq!(discounted, dec!(180));
        // never compounded: applying twice would yield 162, not 180
        assert_eq!(apply_coupon(discounted, dec!(10)), dec!(162));
    }

    #[test]
    fn insufficient_stock_rejects_the_whole_cart() {
        let shop = Uuid::new_v4();
        let scarce = product(shop, dec!(10), Decimal::ZERO, 1);
        let plentiful = product(shop, dec!(10), Decimal::ZERO, 50);

        let err = price_cart(
            &[scarce.clone(), plentiful.clone()],
            &[cart_line(&plentiful, 2), cart_line(&scarce, 2)],
        )
        .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Insufficient product quantity"));
    }

    #[test]
    fn non_positive_count_is_rejected() {
        let shop = Uuid::new_v4();
        let p = product(shop, dec!(10), Decimal::ZERO, 5);
        let err = price_cart(&[p.clone()], &[cart_line(&p, 0)]).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Cart has invalid quantity"));
    }

    #[test]
    fn all_delivered_siblings_make_the_parent_delivered() {
        use ItemDeliveryStatus::*;
        assert_eq!(
            derive_parent_status(Delivered, &[Delivered, Delivered]),
            Some(OrderDeliveryStatus::Delivered)
        );
        assert_eq!(
            derive_parent_status(Delivered, &[Delivered, Pending]),
            Some(OrderDeliveryStatus::PartiallyDelivered)
        );
    }

    #[test]
    fn all_canceled_siblings_make_the_parent_canceled() {
        use ItemDeliveryStatus::*;
        assert_eq!(
            derive_parent_status(Canceled, &[Canceled, Canceled]),
            Some(OrderDeliveryStatus::Canceled)
        );
        assert_eq!(
            derive_parent_status(Canceled, &[Canceled, Pending]),
            Some(OrderDeliveryStatus::PartiallyCanceled)
        );
    }

    #[test]
    fn mixed_terminal_siblings_keep_the_partial_flavor_of_the_trigger() {
        use ItemDeliveryStatus::*;
        // one delivered, one canceled: the last transition decides which
        // partial value the parent carries
        assert_eq!(
            derive_parent_status(Delivered, &[Delivered, Canceled]),
            Some(OrderDeliveryStatus::PartiallyDelivered)
        );
        assert_eq!(
            derive_parent_status(Canceled, &[Delivered, Canceled]),
            Some(OrderDeliveryStatus::PartiallyCanceled)
        );
    }
}
