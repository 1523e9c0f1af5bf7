use storefront_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    dto::{
        admin::{InventoryAdjustRequest, LowStockQuery, UpdateOrderStatusRequest},
        auth::{LoginRequest, RegisterRequest},
        cart::AddToCartRequest,
        categories::CreateCategoryRequest,
        orders::{CheckoutRequest, PayOrderRequest},
        products::CreateProductRequest,
        wishlist::AddWishlistRequest,
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::{DiscountType, OrderStatus, PaymentStatus, ShippingAddress},
    pricing::PricingPolicy,
    routes::params::Pagination,
    services::{
        admin_service, analytics_service, auth_service, cart_service, category_service,
        customer_service, order_service, product_service, wishlist_service,
    },
    state::AppState,
};
use uuid::Uuid;

// Full storefront flow against a real database:
// catalog -> cart -> checkout -> pay -> fulfilment, then cancellation and blocking.
#[tokio::test]
async fn storefront_checkout_flow() -> anyhow::Result<()> {
    // Allow skipping when no DB is configured in the environment.
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run the checkout flow."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;

    let admin_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role) VALUES ($1, 'Admin', 'admin@test.local', 'x', 'admin')",
    )
    .bind(admin_id)
    .execute(&state.pool)
    .await?;
    let admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };

    let registered = auth_service::register_user(
        &state,
        RegisterRequest {
            name: "Jane Buyer".into(),
            email: "Jane@Test.local".into(),
            password: "secret123".into(),
            phone: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(registered.email, "jane@test.local");
    let customer = AuthUser {
        user_id: registered.id,
        role: "user".into(),
    };

    let duplicate = auth_service::register_user(
        &state,
        RegisterRequest {
            name: "Jane Again".into(),
            email: "jane@test.local".into(),
            password: "secret123".into(),
            phone: None,
        },
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    // Catalog
    let category = category_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            name: "Apparel".into(),
            slug: None,
            description: None,
            image_url: None,
            is_active: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(category.slug, "apparel");

    let hoodie = product_service::create_product(
        &state,
        &admin,
        product_request("Hoodie", 10_000, Some((DiscountType::Percentage, 10)), 10, Some(category.id)),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(hoodie.final_price, 9_000);

    let freebie = product_service::create_product(
        &state,
        &admin,
        product_request("Sticker", 5_000, Some((DiscountType::Fixed, 6_000)), 5, None),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(freebie.final_price, 0, "discount never drives price below zero");

    // Cart: same product and options merge, other options get their own line.
    add(&state, &customer, hoodie.id, 2, Some("M")).await?;
    let cart = cart_service::view_cart(&state, &customer).await?.data.unwrap();
    assert_eq!(cart.totals.subtotal, 18_000);
    assert_eq!(cart.totals.shipping, 1_000);
    assert_eq!(cart.totals.tax, 1_800);
    assert_eq!(cart.totals.total, 20_800);

    add(&state, &customer, hoodie.id, 1, Some("M")).await?;
    add(&state, &customer, hoodie.id, 1, Some("S")).await?;
    let cart = cart_service::view_cart(&state, &customer).await?.data.unwrap();
    assert_eq!(cart.items.len(), 2);
    let line_sum: i64 = cart.items.iter().map(|l| l.unit_price * l.quantity as i64).sum();
    assert_eq!(cart.totals.subtotal, line_sum);
    assert_eq!(cart.totals.subtotal, 36_000);
    assert_eq!(cart.totals.shipping, 0, "free shipping above the threshold");
    assert_eq!(cart.totals.total, 36_000 + 3_600);

    let too_many = add(&state, &customer, hoodie.id, 50, Some("M")).await;
    assert!(matches!(too_many, Err(AppError::BadRequest(_))));
    let bad_size = add(&state, &customer, hoodie.id, 1, Some("XXL")).await;
    assert!(matches!(bad_size, Err(AppError::BadRequest(_))));

    // Wishlist is idempotent per product.
    let first = wishlist_service::add_to_wishlist(
        &state,
        &customer,
        AddWishlistRequest { product_id: freebie.id },
    )
    .await?
    .data
    .unwrap();
    let second = wishlist_service::add_to_wishlist(
        &state,
        &customer,
        AddWishlistRequest { product_id: freebie.id },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(first.id, second.id);
    let wishlist = wishlist_service::list_wishlist(&state, &customer, Pagination::default()).await?;
    assert_eq!(wishlist.meta.unwrap().total, Some(1));
    let missing = wishlist_service::remove_from_wishlist(&state, &customer, hoodie.id).await;
    assert!(matches!(missing, Err(AppError::NotFound)));

    // Checkout
    let placed = order_service::checkout(&state, &customer, checkout_request())
        .await?
        .data
        .unwrap();
    let order = placed.order;
    assert_eq!(order.subtotal, 36_000);
    assert_eq!(order.shipping_fee, 0);
    assert_eq!(order.tax, 3_600);
    assert_eq!(order.total_amount, order.subtotal + order.shipping_fee + order.tax);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(placed.items.len(), 2);
    assert!(placed.items.iter().all(|item| item.price == 9_000));

    let hoodie_now = product_service::get_product(&state, None, hoodie.id).await?.data.unwrap();
    assert_eq!(hoodie_now.stock, 6);
    let cart = cart_service::view_cart(&state, &customer).await?.data.unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(cart.totals.shipping, 0, "empty cart carries no shipping");

    let empty = order_service::checkout(&state, &customer, checkout_request()).await;
    assert!(matches!(empty, Err(AppError::BadRequest(_))));

    // Payment
    let wrong = order_service::pay_order(
        &state,
        &customer,
        order.id,
        PayOrderRequest {
            invoice_number: "INV-WRONG".into(),
        },
    )
    .await;
    assert!(matches!(wrong, Err(AppError::BadRequest(_))));

    let paid = order_service::pay_order(
        &state,
        &customer,
        order.id,
        PayOrderRequest {
            invoice_number: order.invoice_number.clone(),
        },
    )
    .await?
    .data
    .unwrap()
    .order;
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(paid.status, OrderStatus::Confirmed);
    assert!(paid.paid_at.is_some());

    // Fulfilment moves forward only and stops at a terminal status.
    let processing = set_status(&state, &admin, order.id, "processing").await?;
    assert_eq!(processing, OrderStatus::Processing);
    let backwards = set_status(&state, &admin, order.id, "confirmed").await;
    assert!(matches!(backwards, Err(AppError::Conflict(_))));
    let unknown = set_status(&state, &admin, order.id, "teleported").await;
    assert!(matches!(unknown, Err(AppError::BadRequest(_))));
    assert_eq!(
        set_status(&state, &admin, order.id, "delivered").await?,
        OrderStatus::Delivered
    );
    let after_terminal = set_status(&state, &admin, order.id, "cancelled").await;
    assert!(matches!(after_terminal, Err(AppError::Conflict(_))));
    let cancel_delivered = order_service::cancel_order(&state, &customer, order.id).await;
    assert!(matches!(cancel_delivered, Err(AppError::Conflict(_))));

    // Customer cancellation restocks.
    add(&state, &customer, hoodie.id, 2, None).await?;
    let second_order = order_service::checkout(&state, &customer, checkout_request())
        .await?
        .data
        .unwrap()
        .order;
    assert_eq!(second_order.shipping_fee, 1_000);
    let stock = product_service::get_product(&state, None, hoodie.id).await?.data.unwrap().stock;
    assert_eq!(stock, 4);
    let cancelled = order_service::cancel_order(&state, &customer, second_order.id)
        .await?
        .data
        .unwrap()
        .order;
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    let stock = product_service::get_product(&state, None, hoodie.id).await?.data.unwrap().stock;
    assert_eq!(stock, 6);

    // Inventory
    let adjusted = admin_service::adjust_inventory(
        &state,
        &admin,
        hoodie.id,
        InventoryAdjustRequest { delta: -4 },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(adjusted.stock, 2);
    let negative = admin_service::adjust_inventory(
        &state,
        &admin,
        hoodie.id,
        InventoryAdjustRequest { delta: -3 },
    )
    .await;
    assert!(matches!(negative, Err(AppError::BadRequest(_))));
    let low = admin_service::list_low_stock(
        &state,
        &admin,
        LowStockQuery {
            page: None,
            per_page: None,
            threshold: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert!(low.items.iter().any(|p| p.id == hoodie.id));

    // Analytics
    let summary = analytics_service::summary(&state, &admin).await?.data.unwrap();
    assert_eq!(summary.order_count, 2);
    assert_eq!(summary.revenue, order.total_amount);
    assert_eq!(summary.paid_revenue, order.total_amount);
    assert_eq!(summary.customer_count, 1);

    // Blocking is idempotent and locks the customer out.
    for _ in 0..2 {
        let blocked = customer_service::set_blocked(&state, &admin, customer.user_id, true)
            .await?
            .data
            .unwrap();
        assert!(blocked.is_blocked);
    }
    let login = auth_service::login_user(
        &state,
        LoginRequest {
            email: "jane@test.local".into(),
            password: "secret123".into(),
        },
    )
    .await;
    assert!(matches!(login, Err(AppError::Forbidden)));
    let blocked_checkout = order_service::checkout(&state, &customer, checkout_request()).await;
    assert!(matches!(blocked_checkout, Err(AppError::Forbidden)));

    customer_service::set_blocked(&state, &admin, customer.user_id, false).await?;
    let (token, _) = auth_service::login_user(
        &state,
        LoginRequest {
            email: "jane@test.local".into(),
            password: "secret123".into(),
        },
    )
    .await?;
    assert!(!token.is_empty());

    let detail = customer_service::get_customer(&state, &admin, customer.user_id)
        .await?
        .data
        .unwrap();
    assert_eq!(detail.order_count, 2);
    assert_eq!(detail.total_spent, order.total_amount);

    // Deleting missing rows is a 404.
    let missing = Uuid::new_v4();
    assert!(matches!(
        admin_service::delete_order(&state, &admin, missing).await,
        Err(AppError::NotFound)
    ));
    assert!(matches!(
        product_service::delete_product(&state, &admin, missing).await,
        Err(AppError::NotFound)
    ));
    assert!(matches!(
        category_service::delete_category(&state, &admin, missing).await,
        Err(AppError::NotFound)
    ));

    // Admin-only operations stay admin-only.
    let forbidden = product_service::delete_product(&state, &customer, hoodie.id).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url, 5).await?;
    run_migrations(&pool).await?;

    // Clean tables between runs
    sqlx::query(
        "TRUNCATE TABLE order_items, orders, cart_items, wishlist_items, collection_products, collections, banners, settings, audit_logs, products, categories, users CASCADE",
    )
    .execute(&pool)
    .await?;

    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "flow-test-secret".into(),
        jwt_ttl_hours: 1,
        cookie_secure: false,
        db_max_connections: 5,
        cors_allowed_origin: None,
        default_pricing: PricingPolicy {
            shipping_fee: 1_000,
            free_shipping_threshold: 30_000,
            tax_rate_bps: 1_000,
        },
    };
    Ok(AppState::new(pool, config))
}

fn product_request(
    name: &str,
    price: i64,
    discount: Option<(DiscountType, i64)>,
    stock: i32,
    category_id: Option<Uuid>,
) -> CreateProductRequest {
    CreateProductRequest {
        name: name.into(),
        slug: None,
        description: None,
        price,
        discount_type: discount.map(|(kind, _)| kind),
        discount_value: discount.map(|(_, value)| value),
        stock,
        category_id,
        sizes: vec!["S".into(), "M".into()],
        colors: Vec::new(),
        images: Vec::new(),
        is_featured: None,
        is_active: None,
    }
}

async fn add(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    quantity: i32,
    size: Option<&str>,
) -> Result<(), AppError> {
    cart_service::add_to_cart(
        state,
        user,
        AddToCartRequest {
            product_id,
            quantity,
            size: size.map(str::to_string),
            color: None,
        },
    )
    .await
    .map(|_| ())
}

async fn set_status(
    state: &AppState,
    admin: &AuthUser,
    order_id: Uuid,
    status: &str,
) -> Result<OrderStatus, AppError> {
    let resp = admin_service::update_order_status(
        state,
        admin,
        order_id,
        UpdateOrderStatusRequest {
            status: status.into(),
        },
    )
    .await?;
    Ok(resp.data.unwrap().status)
}

fn checkout_request() -> CheckoutRequest {
    CheckoutRequest {
        shipping_address: ShippingAddress {
            full_name: "Jane Buyer".into(),
            phone: "555-0100".into(),
            line1: "1 Market Street".into(),
            line2: None,
            city: "Springfield".into(),
            state: None,
            postal_code: "12345".into(),
            country: "US".into(),
        },
        payment_method: "cash_on_delivery".into(),
    }
}
