use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod categories;
pub mod chats;
pub mod coupons;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod reviews;
pub mod shops;
pub mod subcategories;
pub mod wishlist;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/categories", categories::router())
        .nest("/subcategories", subcategories::router())
        .nest("/products", products::router().merge(reviews::router()))
        .nest("/coupons", coupons::router())
        .nest("/shops", shops::router())
        .nest("/orders", orders::router())
        .nest("/wishlist", wishlist::router())
        .nest("/chats", chats::router())
}
