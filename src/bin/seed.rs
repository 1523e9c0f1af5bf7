use storefront_api::{
    config::AppConfig,
    db::{DbPool, create_pool, run_migrations},
    entity::settings::SETTINGS_ID,
    models::{ROLE_ADMIN, ROLE_USER},
    services::{auth_service::hash_password, slugify},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, 2).await?;
    run_migrations(&pool).await?;

    let admin_id = ensure_user(&pool, "Admin", "admin@example.com", "admin123", ROLE_ADMIN).await?;
    let user_id = ensure_user(&pool, "Customer", "user@example.com", "user123", ROLE_USER).await?;
    seed_settings(&pool, &config).await?;
    seed_catalog(&pool).await?;
    seed_banners(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &DbPool,
    name: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    // Existing accounts keep their password; only the role is enforced.
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn seed_settings(pool: &DbPool, config: &AppConfig) -> anyhow::Result<()> {
    let pricing = config.default_pricing;
    sqlx::query(
        r#"
        INSERT INTO settings (id, store_name, currency, shipping_fee, free_shipping_threshold, tax_rate_bps)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(SETTINGS_ID)
    .bind("Storefront")
    .bind("USD")
    .bind(pricing.shipping_fee)
    .bind(pricing.free_shipping_threshold)
    .bind(pricing.tax_rate_bps)
    .execute(pool)
    .await?;

    println!("Seeded settings");
    Ok(())
}

async fn ensure_category(pool: &DbPool, name: &str, description: &str) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO categories (id, name, slug, description)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(slugify(name))
    .bind(description)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn seed_catalog(pool: &DbPool) -> anyhow::Result<()> {
    let apparel = ensure_category(pool, "Apparel", "Shirts, hoodies and caps").await?;
    let home = ensure_category(pool, "Home", "Mugs and desk accessories").await?;

    // (name, description, price, discount, stock, category, sizes, featured)
    let products = vec![
        ("Classic Hoodie", "Heavyweight cotton hoodie", 5500, Some(("percentage", 10)), 50, apparel, vec!["S", "M", "L", "XL"], true),
        ("Logo Tee", "Soft crew-neck tee", 2000, None, 120, apparel, vec!["S", "M", "L"], false),
        ("Enamel Mug", "Keeps coffee warm", 1200, Some(("fixed", 200)), 100, home, vec![], true),
        ("Desk Mat", "Large felt desk mat", 3000, None, 3, home, vec![], false),
    ];

    let collection_id: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO collections (id, name, slug, description)
        VALUES ($1, 'Featured', 'featured', 'Hand-picked favourites')
        ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .fetch_one(pool)
    .await?;

    for (name, description, price, discount, stock, category_id, sizes, featured) in products {
        let (discount_type, discount_value) = discount.unwrap_or(("", 0));
        let (product_id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO products
                (id, name, slug, description, price, discount_type, discount_value, stock,
                 category_id, sizes, is_featured)
            VALUES ($1, $2, $3, $4, $5, NULLIF($6, ''), $7, $8, $9, $10, $11)
            ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(slugify(name))
        .bind(description)
        .bind(price as i64)
        .bind(discount_type)
        .bind(discount_value as i64)
        .bind(stock as i32)
        .bind(category_id)
        .bind(serde_json::json!(sizes))
        .bind(featured)
        .fetch_one(pool)
        .await?;

        if featured {
            sqlx::query(
                r#"
                INSERT INTO collection_products (collection_id, product_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(collection_id.0)
            .bind(product_id)
            .execute(pool)
            .await?;
        }
    }

    println!("Seeded catalog");
    Ok(())
}

async fn seed_banners(pool: &DbPool) -> anyhow::Result<()> {
    let exists: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM banners")
        .fetch_one(pool)
        .await?;
    if exists.0 > 0 {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO banners (id, title, subtitle, image_url, link_url, position)
        VALUES ($1, 'New season', 'Fresh arrivals are in', '/images/banner-season.jpg', '/collections/featured', 0)
        "#,
    )
    .bind(Uuid::new_v4())
    .execute(pool)
    .await?;

    println!("Seeded banners");
    Ok(())
}
