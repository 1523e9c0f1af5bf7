pub mod admin;
pub mod analytics;
pub mod auth;
pub mod banners;
pub mod cart;
pub mod categories;
pub mod collections;
pub mod customers;
pub mod orders;
pub mod products;
pub mod settings;
pub mod wishlist;
