use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::reviews::{
        MyReviewData, RatingBucket, ReviewData, ReviewRequest, ReviewSummary, ReviewSummaryData,
        ReviewsList,
    },
    entity::{
        products::{self, Entity as Products},
        reviews::{self, Column as ReviewCol, Entity as Reviews},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Review,
    response::ApiResponse,
    routes::params::{Pagination, SortOrder},
    state::AppState,
};

pub async fn list_product_reviews(
    state: &AppState,
    product_id: Uuid,
    pagination: Pagination,
    sort_order: Option<SortOrder>,
) -> AppResult<ApiResponse<ReviewsList>> {
    let (_, limit, offset) = pagination.normalize();

    let condition = Condition::all().add(ReviewCol::ProductId.eq(product_id));
    let mut finder = Reviews::find().filter(condition);
    finder = match sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(ReviewCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(ReviewCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let reviews = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(review_from_entity)
        .collect();

    Ok(ApiResponse::with_total(ReviewsList { reviews }, total))
}

pub async fn get_my_review(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<MyReviewData>> {
    let review = Reviews::find()
        .filter(ReviewCol::ProductId.eq(product_id))
        .filter(ReviewCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .map(review_from_entity);

    Ok(ApiResponse::success(MyReviewData { review }))
}

/// Upsert the caller's review and fold the rating into the product's
/// aggregates incrementally, without recounting every review.
pub async fn review_product(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: ReviewRequest,
) -> AppResult<ApiResponse<ReviewData>> {
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let existing = Reviews::find()
        .filter(ReviewCol::ProductId.eq(product_id))
        .filter(ReviewCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?;

    let comment = payload.comment.unwrap_or_default();
    let new_rating = payload.rating;

    let (review, average, count) = match existing {
        Some(review) => {
            let old_rating = review.rating;
            let mut active: reviews::ActiveModel = review.into();
            active.rating = Set(new_rating);
            active.comment = Set(comment);
            active.updated_at = Set(Utc::now().into());
            let review = active.update(&state.orm).await?;

            let count = product.review_count.max(1);
            let average = (product.average_rating * Decimal::from(count)
                - Decimal::from(old_rating)
                + Decimal::from(new_rating))
                / Decimal::from(count);
            (review, average, count)
        }
        None => {
            let review = reviews::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                product_id: Set(product_id),
                rating: Set(new_rating),
                comment: Set(comment),
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(&state.orm)
            .await?;

            let count = product.review_count + 1;
            let average = (product.average_rating * Decimal::from(product.review_count)
                + Decimal::from(new_rating))
                / Decimal::from(count);
            (review, average, count)
        }
    };

    let mut product_active: products::ActiveModel = product.into();
    product_active.average_rating = Set(average);
    product_active.review_count = Set(count);
    product_active.updated_at = Set(Utc::now().into());
    product_active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "review_upsert",
        Some("reviews"),
        Some(serde_json::json!({ "product_id": product_id, "rating": new_rating })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(ReviewData {
        review: review_from_entity(review),
    }))
}

#[derive(Debug, sqlx::FromRow)]
struct RatingCountRow {
    rating: i32,
    count: i64,
}

/// Star histogram plus the overall average, computed on the read side.
pub async fn get_review_summary(
    state: &AppState,
    product_id: Uuid,
) -> AppResult<ApiResponse<ReviewSummaryData>> {
    let rows = sqlx::query_as::<_, RatingCountRow>(
        r#"
        SELECT rating, COUNT(*) AS count
        FROM reviews
        WHERE product_id = $1
        GROUP BY rating
        ORDER BY rating DESC
        "#,
    )
    .bind(product_id)
    .fetch_all(&state.pool)
    .await?;

    let total_reviews: i64 = rows.iter().map(|row| row.count).sum();
    let weighted: Decimal = rows
        .iter()
        .map(|row| Decimal::from(row.rating) * Decimal::from(row.count))
        .sum();
    let average_rating = if total_reviews > 0 {
        weighted / Decimal::from(total_reviews)
    } else {
        Decimal::ZERO
    };

    // zero-filled buckets from 5 stars down to 1
    let ratings = (1..=5)
        .rev()
        .map(|rating| RatingBucket {
            rating,
            count: rows
                .iter()
                .find(|row| row.rating == rating)
                .map(|row| row.count)
                .unwrap_or(0),
        })
        .collect();

    Ok(ApiResponse::success(ReviewSummaryData {
        review: ReviewSummary {
            average_rating,
            total_reviews,
            ratings,
        },
    }))
}

pub(crate) fn review_from_entity(model: reviews::Model) -> Review {
    Review {
        id: model.id,
        user: model.user_id,
        product: model.product_id,
        rating: model.rating,
        comment: model.comment,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
