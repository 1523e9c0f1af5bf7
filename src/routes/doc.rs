use utoipa::{
    Modify, OpenApi,
    openapi::{
        self, OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin as admin_dto, analytics, auth as auth_dto, banners as banner_dto, cart as cart_dto,
        categories as category_dto, collections as collection_dto, customers, orders as order_dto,
        products as product_dto, settings as settings_dto, wishlist as wishlist_dto,
    },
    models::{
        Banner, CartItem, Category, Collection, DiscountType, Order, OrderItem, OrderStatus,
        PaymentStatus, Product, ShippingAddress, StoreSettings, User, WishlistItem,
    },
    pricing::OrderTotals,
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, banners, cart, categories, collections, health, orders, params, products,
        settings, wishlist,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
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
        auth::me,
        auth::update_me,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        collections::list_collections,
        collections::get_collection,
        collections::create_collection,
        collections::update_collection,
        collections::delete_collection,
        collections::add_product,
        collections::remove_product,
        banners::list_banners,
        banners::create_banner,
        banners::update_banner,
        banners::delete_banner,
        settings::get_settings,
        settings::update_settings,
        cart::view_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_cart_item,
        cart::clear_cart,
        wishlist::list_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
        wishlist::clear_wishlist,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        orders::pay_order,
        orders::cancel_order,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::delete_order,
        admin::update_order_status,
        admin::update_payment_status,
        admin::list_customers,
        admin::get_customer,
        admin::delete_customer,
        admin::block_customer,
        admin::unblock_customer,
        admin::list_low_stock,
        admin::adjust_inventory,
        admin::analytics_summary,
        admin::analytics_sales,
        admin::analytics_top_products
    ),
    components(
        schemas(
            User,
            Product,
            Category,
            Collection,
            Banner,
            StoreSettings,
            ShippingAddress,
            Order,
            OrderItem,
            OrderStatus,
            PaymentStatus,
            DiscountType,
            CartItem,
            WishlistItem,
            OrderTotals,
            auth_dto::RegisterRequest,
            auth_dto::LoginRequest,
            auth_dto::LoginResponse,
            auth_dto::UpdateProfileRequest,
            product_dto::CreateProductRequest,
            product_dto::UpdateProductRequest,
            product_dto::ProductList,
            category_dto::CreateCategoryRequest,
            category_dto::UpdateCategoryRequest,
            category_dto::CategoryList,
            collection_dto::CreateCollectionRequest,
            collection_dto::UpdateCollectionRequest,
            collection_dto::CollectionProductRequest,
            collection_dto::CollectionList,
            collection_dto::CollectionWithProducts,
            banner_dto::CreateBannerRequest,
            banner_dto::UpdateBannerRequest,
            banner_dto::BannerList,
            settings_dto::UpdateSettingsRequest,
            cart_dto::AddToCartRequest,
            cart_dto::UpdateCartItemRequest,
            cart_dto::CartLine,
            cart_dto::CartView,
            wishlist_dto::AddWishlistRequest,
            wishlist_dto::WishlistProductList,
            order_dto::CheckoutRequest,
            order_dto::PayOrderRequest,
            order_dto::OrderList,
            order_dto::OrderWithItems,
            admin_dto::UpdateOrderStatusRequest,
            admin_dto::UpdatePaymentStatusRequest,
            admin_dto::InventoryAdjustRequest,
            customers::CustomerList,
            customers::CustomerDetail,
            analytics::AnalyticsSummary,
            analytics::StatusCount,
            analytics::SalesReport,
            analytics::DailySales,
            analytics::TopProduct,
            analytics::TopProductList,
            params::SortOrder,
            params::ProductSortBy,
            Meta,
            ApiResponse<Product>,
            ApiResponse<product_dto::ProductList>,
            ApiResponse<order_dto::OrderWithItems>,
            ApiResponse<order_dto::OrderList>,
            ApiResponse<cart_dto::CartView>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Product catalog"),
        (name = "Categories", description = "Product categories"),
        (name = "Collections", description = "Curated product collections"),
        (name = "Banners", description = "Storefront banners"),
        (name = "Settings", description = "Store settings"),
        (name = "Cart", description = "Per-user cart"),
        (name = "Wishlist", description = "Per-user wishlist"),
        (name = "Orders", description = "Checkout and customer orders"),
        (name = "Admin", description = "Back-office endpoints"),
        (name = "Analytics", description = "Back-office reporting"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
