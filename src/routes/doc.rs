use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{CurrentUserData, UserData},
        categories::{CategoriesList, CategoryData, SubcategoriesList, SubcategoryData},
        chats::{ChatData, ChatsList, MaybeChatData, MessageData, MessagesList},
        coupons::{CouponData, CouponsList},
        orders::{
            BuyerOrderStats, BuyerStatsData, OrderData, OrderItemData, OrderItemsList, OrdersList,
            SellerOrderStats, SellerStatsData,
        },
        products::{BrandsData, ProductData, ProductsList},
        reviews::{MyReviewData, ReviewData, ReviewSummary, ReviewSummaryData, ReviewsList},
        shops::{ShopData, ShopsList},
        wishlist::WishlistData,
    },
    entity::{
        chats::ChatKind,
        order_items::{ItemDeliveryStatus, ItemPaymentStatus},
        orders::{OrderDeliveryStatus, OrderPaymentStatus},
        shops::{ShopActivityStatus, ShopPaymentStatus},
        users::UserRole,
    },
    middleware::auth::SESSION_COOKIE,
    models::{
        Category, Chat, Coupon, ItemLine, Message, Order, OrderItem, OrderLine, Product,
        ProductImage, Review, Shop, Subcategory, User,
    },
    response::ApiResponse,
    routes::{
        auth, categories, chats, coupons, health, orders, params, products, reviews, shops,
        subcategories, wishlist,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "cookie_auth",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::logout,
        auth::current_user,
        auth::change_password,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        subcategories::list_subcategories,
        subcategories::get_subcategory,
        subcategories::create_subcategory,
        subcategories::update_subcategory,
        subcategories::delete_subcategory,
        products::list_products,
        products::get_product_brands,
        products::get_product,
        products::get_similar_products,
        products::create_product,
        products::update_product,
        products::delete_product,
        reviews::list_product_reviews,
        reviews::get_my_review,
        reviews::review_product,
        reviews::get_review_summary,
        coupons::list_coupons,
        coupons::create_coupon,
        coupons::delete_coupon,
        shops::list_shops,
        shops::get_seller_shop,
        shops::update_shop_info,
        shops::update_payment_status,
        shops::get_shop,
        shops::update_activity_status,
        orders::checkout,
        orders::list_orders,
        orders::buyer_stats,
        orders::list_seller_orders,
        orders::seller_stats,
        orders::update_item_status,
        wishlist::get_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
        chats::list_chats,
        chats::create_chat,
        chats::get_chat_with,
        chats::list_messages,
        chats::send_message,
    ),
    components(
        schemas(
            User,
            Shop,
            Category,
            Subcategory,
            Product,
            ProductImage,
            Coupon,
            Order,
            OrderItem,
            OrderLine,
            ItemLine,
            Review,
            Chat,
            Message,
            UserRole,
            ShopActivityStatus,
            ShopPaymentStatus,
            OrderDeliveryStatus,
            OrderPaymentStatus,
            ItemDeliveryStatus,
            ItemPaymentStatus,
            ChatKind,
            UserData,
            CurrentUserData,
            CategoryData,
            CategoriesList,
            SubcategoryData,
            SubcategoriesList,
            ProductData,
            ProductsList,
            BrandsData,
            CouponData,
            CouponsList,
            ShopData,
            ShopsList,
            OrderData,
            OrdersList,
            OrderItemData,
            OrderItemsList,
            BuyerOrderStats,
            BuyerStatsData,
            SellerOrderStats,
            SellerStatsData,
            ReviewData,
            MyReviewData,
            ReviewsList,
            ReviewSummary,
            ReviewSummaryData,
            WishlistData,
            ChatData,
            MaybeChatData,
            ChatsList,
            MessageData,
            MessagesList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            ApiResponse<ProductData>,
            ApiResponse<ProductsList>,
            ApiResponse<OrderData>,
            ApiResponse<OrdersList>,
            ApiResponse<OrderItemData>,
            ApiResponse<BuyerStatsData>,
            ApiResponse<SellerStatsData>
        )
    ),
    security(
        ("cookie_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication and session endpoints"),
        (name = "Categories", description = "Category and subcategory endpoints"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Reviews", description = "Product review endpoints"),
        (name = "Coupons", description = "Coupon endpoints"),
        (name = "Shops", description = "Seller shop endpoints"),
        (name = "Orders", description = "Checkout and fulfillment endpoints"),
        (name = "Wishlist", description = "Wishlist endpoints"),
        (name = "Chats", description = "Buyer-seller chat endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
