pub mod audit_logs;
pub mod categories;
pub mod chat_participants;
pub mod chats;
pub mod coupons;
pub mod messages;
pub mod order_items;
pub mod orders;
pub mod product_subcategories;
pub mod products;
pub mod reviews;
pub mod shops;
pub mod subcategories;
pub mod users;
pub mod wishlist_items;

pub use audit_logs::Entity as AuditLogs;
pub use categories::Entity as Categories;
pub use chat_participants::Entity as ChatParticipants;
pub use chats::Entity as Chats;
pub use coupons::Entity as Coupons;
pub use messages::Entity as Messages;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use product_subcategories::Entity as ProductSubcategories;
pub use products::Entity as Products;
pub use reviews::Entity as Reviews;
pub use shops::Entity as Shops;
pub use subcategories::Entity as Subcategories;
pub use users::Entity as Users;
pub use wishlist_items::Entity as WishlistItems;
