use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entity::order_items::ItemDeliveryStatus,
    models::{Order, OrderItem},
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product: Uuid,
    pub count: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[validate(length(min = 1, message = "Cart is empty"))]
    pub cart: Vec<CartLine>,
    #[validate(length(min = 1, message = "Delivery address is required"))]
    pub address: String,
    pub coupon: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemStatusRequest {
    pub delivery_status: ItemDeliveryStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderData {
    pub order: Order,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrdersList {
    pub orders: Vec<Order>,
}

/// Seller endpoints call the per-seller items "orders" on the wire.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemData {
    pub order: OrderItem,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemsList {
    pub orders: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuyerOrderStats {
    pub total_orders: i64,
    pub pending_orders: i64,
    pub partially_delivered_orders: i64,
    pub delivered_orders: i64,
    pub partially_canceled_orders: i64,
    pub canceled_orders: i64,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SellerOrderStats {
    pub total_orders: i64,
    pub pending_orders: i64,
    pub delivered_orders: i64,
    pub canceled_orders: i64,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BuyerStatsData {
    pub stats: BuyerOrderStats,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SellerStatsData {
    pub stats: SellerOrderStats,
}
