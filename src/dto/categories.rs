use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Category, Subcategory};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertCategoryRequest {
    #[validate(length(min = 2, max = 32, message = "Category name is too short"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubcategoryRequest {
    #[validate(length(min = 2, max = 32, message = "Subcategory name is too short"))]
    pub name: String,
    pub category: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubcategoryRequest {
    #[validate(length(min = 2, max = 32, message = "Subcategory name is too short"))]
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryData {
    pub category: Category,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoriesList {
    pub categories: Vec<Category>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubcategoryData {
    pub subcategory: Subcategory,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubcategoriesList {
    pub subcategories: Vec<Subcategory>,
}
