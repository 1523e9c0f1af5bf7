use crate::{
    dto::analytics::{
        AnalyticsSummary, DailySales, SalesQuery, SalesReport, StatusCount, TopProduct,
        TopProductList, TopProductsQuery,
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    models::ROLE_USER,
    response::{ApiResponse, Meta},
    services::admin_service::DEFAULT_LOW_STOCK_THRESHOLD,
    state::AppState,
};

const DEFAULT_SALES_DAYS: i64 = 30;
const DEFAULT_TOP_PRODUCTS: i64 = 10;

#[derive(sqlx::FromRow)]
struct Totals {
    revenue: i64,
    paid_revenue: i64,
    order_count: i64,
}

pub async fn summary(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AnalyticsSummary>> {
    ensure_admin(user)?;

    let totals = sqlx::query_as::<_, Totals>(
        r#"
        SELECT
            COALESCE(SUM(total_amount) FILTER (WHERE status <> 'cancelled'), 0)::BIGINT AS revenue,
            COALESCE(SUM(total_amount) FILTER (WHERE payment_status = 'paid'), 0)::BIGINT AS paid_revenue,
            COUNT(*)::BIGINT AS order_count
        FROM orders
        "#,
    )
    .fetch_one(&state.pool)
    .await?;

    let customer_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*)::BIGINT FROM users WHERE role = $1")
            .bind(ROLE_USER)
            .fetch_one(&state.pool)
            .await?;

    let product_count: i64 = sqlx::query_scalar("SELECT COUNT(*)::BIGINT FROM products")
        .fetch_one(&state.pool)
        .await?;

    let low_stock_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*)::BIGINT FROM products WHERE stock <= $1")
            .bind(DEFAULT_LOW_STOCK_THRESHOLD)
            .fetch_one(&state.pool)
            .await?;

    let orders_by_status = sqlx::query_as::<_, StatusCount>(
        r#"
        SELECT status, COUNT(*)::BIGINT AS count
        FROM orders
        GROUP BY status
        ORDER BY status
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Summary",
        AnalyticsSummary {
            revenue: totals.revenue,
            paid_revenue: totals.paid_revenue,
            order_count: totals.order_count,
            customer_count,
            product_count,
            low_stock_count,
            orders_by_status,
        },
        Some(Meta::empty()),
    ))
}

/// Clamp the requested window to 1..=365 days.
fn sales_window(days: Option<i64>) -> i64 {
    days.unwrap_or(DEFAULT_SALES_DAYS).clamp(1, 365)
}

/// Revenue per day over the last `days` days, including today. Days without
/// orders are reported with zero.
pub async fn sales(
    state: &AppState,
    user: &AuthUser,
    query: SalesQuery,
) -> AppResult<ApiResponse<SalesReport>> {
    ensure_admin(user)?;
    let days = sales_window(query.days);

    let items = sqlx::query_as::<_, DailySales>(
        r#"
        SELECT
            d.day::DATE AS day,
            COUNT(o.id)::BIGINT AS orders,
            COALESCE(SUM(o.total_amount), 0)::BIGINT AS revenue
        FROM generate_series(
            CURRENT_DATE - ($1::INT - 1),
            CURRENT_DATE,
            INTERVAL '1 day'
        ) AS d(day)
        LEFT JOIN orders o
            ON o.created_at::DATE = d.day::DATE
            AND o.status <> 'cancelled'
        GROUP BY d.day
        ORDER BY d.day
        "#,
    )
    .bind(days as i32)
    .fetch_all(&state.pool)
    .await?;

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Sales",
        SalesReport { days, items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn top_products(
    state: &AppState,
    user: &AuthUser,
    query: TopProductsQuery,
) -> AppResult<ApiResponse<TopProductList>> {
    ensure_admin(user)?;
    let limit = query.limit.unwrap_or(DEFAULT_TOP_PRODUCTS).clamp(1, 100);

    let items = sqlx::query_as::<_, TopProduct>(
        r#"
        SELECT
            oi.product_id,
            MAX(oi.product_name) AS product_name,
            SUM(oi.quantity)::BIGINT AS quantity,
            SUM(oi.price * oi.quantity)::BIGINT AS revenue
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        WHERE o.status <> 'cancelled'
        GROUP BY oi.product_id
        ORDER BY quantity DESC, revenue DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(&state.pool)
    .await?;

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Top products",
        TopProductList { items },
        Some(Meta::new(1, limit, total)),
    ))
}

#[cfg(test)]
mod tests {
    use super::sales_window;

    #[test]
    fn sales_window_is_clamped() {
        assert_eq!(sales_window(None), 30);
        assert_eq!(sales_window(Some(0)), 1);
        assert_eq!(sales_window(Some(7)), 7);
        assert_eq!(sales_window(Some(10_000)), 365);
    }
}
