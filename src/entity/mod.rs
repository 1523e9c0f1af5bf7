pub mod audit_logs;
pub mod banners;
pub mod cart_items;
pub mod categories;
pub mod collection_products;
pub mod collections;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod settings;
pub mod users;
pub mod wishlist_items;

pub use audit_logs::Entity as AuditLogs;
pub use banners::Entity as Banners;
pub use cart_items::Entity as CartItems;
pub use categories::Entity as Categories;
pub use collection_products::Entity as CollectionProducts;
pub use collections::Entity as Collections;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use settings::Entity as Settings;
pub use users::Entity as Users;
pub use wishlist_items::Entity as WishlistItems;
