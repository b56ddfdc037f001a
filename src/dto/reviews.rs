use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Review;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewData {
    pub review: Review,
}

/// `review` is null when the caller has not reviewed the product yet.
#[derive(Debug, Serialize, ToSchema)]
pub struct MyReviewData {
    pub review: Option<Review>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewsList {
    pub reviews: Vec<Review>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingBucket {
    pub rating: i32,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub average_rating: Decimal,
    pub total_reviews: i64,
    pub ratings: Vec<RatingBucket>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewSummaryData {
    pub review: ReviewSummary,
}
