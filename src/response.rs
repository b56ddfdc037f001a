use serde::Serialize;
use utoipa::ToSchema;

/// Success envelope: `{"success": true, ...payload, "totalCount": n?}`.
/// The payload struct is flattened so each endpoint keeps its resource key
/// (`order`, `products`, `shop`, ...) at the top level.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
    #[serde(rename = "totalCount", skip_serializing_if = "Option::is_none")]
    pub total_count: Option<i64>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            total_count: None,
        }
    }

    pub fn with_total(data: T, total_count: i64) -> Self {
        Self {
            success: true,
            data,
            total_count: Some(total_count),
        }
    }
}
