use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{Product, ProductImage};

pub fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() || price.is_zero() {
        let mut error = ValidationError::new("price");
        error.message = Some("Price must be greater than 0".into());
        return Err(error);
    }
    Ok(())
}

pub fn validate_discount_percent(discount: &Decimal) -> Result<(), ValidationError> {
    if discount.is_sign_negative() || *discount >= Decimal::ONE_HUNDRED {
        let mut error = ValidationError::new("discount");
        error.message = Some("Discount must be between 0 and 100 percent".into());
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(min = 2, max = 32, message = "Product name is too short"))]
    pub title: String,
    #[validate(length(min = 1, max = 2000, message = "Product description is required"))]
    pub description: String,
    #[validate(custom = "validate_price")]
    pub price: Decimal,
    #[validate(custom = "validate_discount_percent")]
    pub discount: Option<Decimal>,
    pub category: Uuid,
    #[serde(default)]
    pub subcategories: Vec<Uuid>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    pub shipping: Option<bool>,
    #[validate(length(min = 1, max = 50, message = "Please provide a brand name"))]
    pub brand: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[validate(length(min = 2, max = 32, message = "Product name is too short"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 2000, message = "Product description is required"))]
    pub description: Option<String>,
    #[validate(custom = "validate_price")]
    pub price: Option<Decimal>,
    #[validate(custom = "validate_discount_percent")]
    pub discount: Option<Decimal>,
    pub category: Option<Uuid>,
    pub subcategories: Option<Vec<Uuid>>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: Option<i32>,
    pub images: Option<Vec<ProductImage>>,
    pub shipping: Option<bool>,
    #[validate(length(min = 1, max = 50, message = "Please provide a brand name"))]
    pub brand: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductData {
    pub product: Product,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductsList {
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BrandsData {
    pub brands: Vec<String>,
}
