use storefront_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    dto::{
        banners::{BannerQuery, CreateBannerRequest},
        cart::{AddToCartRequest, MAX_LINE_QUANTITY},
        categories::CreateCategoryRequest,
        collections::{CollectionProductRequest, CreateCollectionRequest},
        orders::CheckoutRequest,
        products::CreateProductRequest,
        settings::UpdateSettingsRequest,
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::ShippingAddress,
    pricing::PricingPolicy,
    routes::params::ProductQuery,
    services::{
        banner_service, cart_service, category_service, collection_service, order_service,
        product_service, settings_service,
    },
    state::AppState,
};
use uuid::Uuid;

// Catalog administration against a real database:
// collections, visibility, search, banners, settings-driven pricing and category removal.
#[tokio::test]
async fn catalog_admin_flow() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run the catalog flow."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;
    let admin = insert_user(&state, "admin@catalog.local", "admin").await?;
    let customer = insert_user(&state, "shopper@catalog.local", "user").await?;

    // Deleting a category keeps its products, detached.
    let category = category_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            name: "Outerwear".into(),
            slug: None,
            description: None,
            image_url: None,
            is_active: None,
        },
    )
    .await?
    .data
    .unwrap();
    let jacket = create(&state, &admin, "Rain Jacket", 8_000, Some(category.id), true).await?;
    assert_eq!(jacket.category_id, Some(category.id));
    category_service::delete_category(&state, &admin, category.id).await?;
    let jacket = product_service::get_product(&state, Some(&admin), jacket.id)
        .await?
        .data
        .unwrap();
    assert_eq!(jacket.category_id, None);

    // Collections: attaching twice keeps one link, detaching a missing link is a 404.
    let collection = collection_service::create_collection(
        &state,
        &admin,
        CreateCollectionRequest {
            name: "Rainy Days".into(),
            slug: None,
            description: None,
            image_url: None,
            is_active: None,
            product_ids: Vec::new(),
        },
    )
    .await?
    .data
    .unwrap();
    for _ in 0..2 {
        collection_service::add_product(
            &state,
            &admin,
            collection.id,
            CollectionProductRequest { product_id: jacket.id },
        )
        .await?;
    }
    let with_products = collection_service::get_collection(&state, None, collection.id)
        .await?
        .data
        .unwrap();
    assert_eq!(with_products.products.len(), 1);

    let in_collection = product_service::list_products(
        &state,
        None,
        ProductQuery {
            collection: Some(collection.id),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(in_collection.meta.unwrap().total, Some(1));
    assert_eq!(in_collection.data.unwrap().items[0].id, jacket.id);

    collection_service::remove_product(&state, &admin, collection.id, jacket.id).await?;
    let again = collection_service::remove_product(&state, &admin, collection.id, jacket.id).await;
    assert!(matches!(again, Err(AppError::NotFound)));
    let in_collection = product_service::list_products(
        &state,
        None,
        ProductQuery {
            collection: Some(collection.id),
            ..Default::default()
        },
    )
    .await?;
    assert!(in_collection.data.unwrap().items.is_empty());

    // Inactive rows are hidden from shoppers on detail views too.
    let hidden = create(&state, &admin, "Prototype Boots", 12_000, None, false).await?;
    let anonymous = product_service::get_product(&state, None, hidden.id).await;
    assert!(matches!(anonymous, Err(AppError::NotFound)));
    let as_customer = product_service::get_product(&state, Some(&customer), hidden.id).await;
    assert!(matches!(as_customer, Err(AppError::NotFound)));
    assert!(product_service::get_product(&state, Some(&admin), hidden.id).await.is_ok());

    let draft = collection_service::create_collection(
        &state,
        &admin,
        CreateCollectionRequest {
            name: "Coming Soon".into(),
            slug: None,
            description: None,
            image_url: None,
            is_active: Some(false),
            product_ids: vec![jacket.id],
        },
    )
    .await?
    .data
    .unwrap();
    let anonymous = collection_service::get_collection(&state, None, draft.id).await;
    assert!(matches!(anonymous, Err(AppError::NotFound)));
    assert!(collection_service::get_collection(&state, Some(&admin), draft.id).await.is_ok());

    // Search terms are matched literally.
    create(&state, &admin, "100% Cotton Tee", 2_500, None, true).await?;
    let percent = search(&state, "%").await?;
    assert_eq!(percent, vec!["100% Cotton Tee".to_string()]);
    assert!(search(&state, "_").await?.is_empty());

    // Banners: ordered by position, `all` is for admins only.
    for (title, position, is_active) in [("Third", 2, true), ("First", 0, true), ("Hidden", 1, false)] {
        banner_service::create_banner(
            &state,
            &admin,
            CreateBannerRequest {
                title: title.into(),
                subtitle: None,
                image_url: format!("/images/{}.jpg", title.to_lowercase()),
                link_url: None,
                position: Some(position),
                is_active: Some(is_active),
            },
        )
        .await?;
    }
    let public: Vec<String> = banner_service::list_banners(&state, None, BannerQuery { all: None })
        .await?
        .data
        .unwrap()
        .items
        .into_iter()
        .map(|b| b.title)
        .collect();
    assert_eq!(public, vec!["First", "Third"]);

    let anonymous = banner_service::list_banners(&state, None, BannerQuery { all: Some(true) }).await;
    assert!(matches!(anonymous, Err(AppError::Unauthorized(_))));
    let as_customer =
        banner_service::list_banners(&state, Some(&customer), BannerQuery { all: Some(true) }).await;
    assert!(matches!(as_customer, Err(AppError::Forbidden)));
    let every: Vec<i32> =
        banner_service::list_banners(&state, Some(&admin), BannerQuery { all: Some(true) })
            .await?
            .data
            .unwrap()
            .items
            .into_iter()
            .map(|b| b.position)
            .collect();
    assert_eq!(every, vec![0, 1, 2]);

    // Stored settings override the configured pricing defaults.
    let settings = settings_service::update_settings(
        &state,
        &admin,
        UpdateSettingsRequest {
            store_name: None,
            currency: None,
            contact_email: None,
            shipping_fee: Some(250),
            free_shipping_threshold: Some(100_000),
            tax_rate_bps: Some(0),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(settings.shipping_fee, 250);

    add(&state, &customer, jacket.id, 2).await?;
    let cart = cart_service::view_cart(&state, &customer).await?.data.unwrap();
    assert_eq!(cart.totals.subtotal, 16_000);
    assert_eq!(cart.totals.shipping, 250);
    assert_eq!(cart.totals.tax, 0);
    assert_eq!(cart.totals.total, 16_250);

    // Oversized quantities never reach the stock arithmetic.
    let huge = add(&state, &customer, jacket.id, i32::MAX).await;
    assert!(matches!(huge, Err(AppError::Validation(_))));
    let above_stock = add(&state, &customer, jacket.id, MAX_LINE_QUANTITY).await;
    assert!(matches!(above_stock, Err(AppError::BadRequest(_))));

    let order = order_service::checkout(&state, &customer, checkout_request())
        .await?
        .data
        .unwrap()
        .order;
    assert_eq!(order.shipping_fee, 250);
    assert_eq!(order.tax, 0);
    assert_eq!(order.total_amount, 16_250);

    Ok(())
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url, 5).await?;
    run_migrations(&pool).await?;

    sqlx::query(
        "TRUNCATE TABLE order_items, orders, cart_items, wishlist_items, collection_products, collections, banners, settings, audit_logs, products, categories, users CASCADE",
    )
    .execute(&pool)
    .await?;

    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "catalog-test-secret".into(),
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

async fn insert_user(state: &AppState, email: &str, role: &str) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role) VALUES ($1, 'Catalog Tester', $2, 'x', $3)",
    )
    .bind(id)
    .bind(email)
    .bind(role)
    .execute(&state.pool)
    .await?;
    Ok(AuthUser {
        user_id: id,
        role: role.into(),
    })
}

async fn create(
    state: &AppState,
    admin: &AuthUser,
    name: &str,
    price: i64,
    category_id: Option<Uuid>,
    is_active: bool,
) -> Result<storefront_api::models::Product, AppError> {
    let resp = product_service::create_product(
        state,
        admin,
        CreateProductRequest {
            name: name.into(),
            slug: None,
            description: None,
            price,
            discount_type: None,
            discount_value: None,
            stock: 20,
            category_id,
            sizes: Vec::new(),
            colors: Vec::new(),
            images: Vec::new(),
            is_featured: None,
            is_active: Some(is_active),
        },
    )
    .await?;
    Ok(resp.data.unwrap())
}

async fn search(state: &AppState, term: &str) -> Result<Vec<String>, AppError> {
    let resp = product_service::list_products(
        state,
        None,
        ProductQuery {
            q: Some(term.into()),
            ..Default::default()
        },
    )
    .await?;
    Ok(resp.data.unwrap().items.into_iter().map(|p| p.name).collect())
}

async fn add(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    quantity: i32,
) -> Result<(), AppError> {
    cart_service::add_to_cart(
        state,
        user,
        AddToCartRequest {
            product_id,
            quantity,
            size: None,
            color: None,
        },
    )
    .await
    .map(|_| ())
}

fn checkout_request() -> CheckoutRequest {
    CheckoutRequest {
        shipping_address: ShippingAddress {
            full_name: "Sam Shopper".into(),
            phone: "555-0199".into(),
            line1: "9 Harbour Road".into(),
            line2: None,
            city: "Portsmouth".into(),
            state: None,
            postal_code: "54321".into(),
            country: "GB".into(),
        },
        payment_method: "cash_on_delivery".into(),
    }
}
