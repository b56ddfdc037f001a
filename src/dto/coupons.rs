use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::models::Coupon;

pub fn validate_coupon_discount(discount: &Decimal) -> Result<(), ValidationError> {
    let max = Decimal::new(9999, 2); // 99.99
    if *discount <= Decimal::ZERO || *discount > max {
        let mut error = ValidationError::new("discount");
        error.message = Some("Discount must be greater than 0 and at most 99.99".into());
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCouponRequest {
    #[validate(length(min = 2, max = 20, message = "Coupon name is too short"))]
    pub name: String,
    #[validate(custom = "validate_coupon_discount")]
    pub discount: Decimal,
    pub expiration_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponData {
    pub coupon: Coupon,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponsList {
    pub coupons: Vec<Coupon>,
}
