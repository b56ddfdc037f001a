use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    entity::shops::{ShopActivityStatus, ShopPaymentStatus},
    models::Shop,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShopInfoRequest {
    #[validate(length(min = 1, max = 100, message = "Please provide a shop name"))]
    pub shop_name: String,
    pub country: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShopPaymentRequest {
    pub payment_status: ShopPaymentStatus,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShopActivityRequest {
    pub activity_status: ShopActivityStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShopData {
    pub shop: Shop,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShopsList {
    pub shops: Vec<Shop>,
}
