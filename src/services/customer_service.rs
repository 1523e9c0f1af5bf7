use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::customers::{CustomerDetail, CustomerList, CustomerQuery},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{ROLE_USER, User},
    response::{ApiResponse, Meta},
    services::contains_pattern,
    state::AppState,
};

#[derive(sqlx::FromRow)]
struct OrderStats {
    order_count: i64,
    total_spent: i64,
}

pub async fn list_customers(
    state: &AppState,
    user: &AuthUser,
    query: CustomerQuery,
) -> AppResult<ApiResponse<CustomerList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all().add(UserCol::Role.eq(ROLE_USER));
    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(UserCol::Name).ilike(pattern.clone()))
                .add(Expr::col(UserCol::Email).ilike(pattern)),
        );
    }
    if let Some(blocked) = query.blocked {
        condition = condition.add(UserCol::IsBlocked.eq(blocked));
    }

    let finder = Users::find()
        .filter(condition)
        .order_by_desc(UserCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    Ok(ApiResponse::success(
        "Customers",
        CustomerList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

async fn find_customer(state: &AppState, id: Uuid) -> AppResult<UserModel> {
    Users::find_by_id(id)
        .filter(UserCol::Role.eq(ROLE_USER))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn get_customer(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<CustomerDetail>> {
    ensure_admin(user)?;
    let customer = find_customer(state, id).await?;

    let stats = sqlx::query_as::<_, OrderStats>(
        r#"
        SELECT
            COUNT(*)::BIGINT AS order_count,
            COALESCE(SUM(total_amount) FILTER (WHERE status <> 'cancelled'), 0)::BIGINT AS total_spent
        FROM orders
        WHERE user_id = $1
        "#,
    )
    .bind(customer.id)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Customer",
        CustomerDetail {
            customer: User::from(customer),
            order_count: stats.order_count,
            total_spent: stats.total_spent,
        },
        Some(Meta::empty()),
    ))
}

/// Sets the blocked flag. Repeating the same call leaves the row as it is.
pub async fn set_blocked(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    blocked: bool,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let customer = find_customer(state, id).await?;

    let customer = if customer.is_blocked == blocked {
        customer
    } else {
        let mut active: UserActive = customer.into();
        active.is_blocked = Set(blocked);
        active.update(&state.orm).await?
    };

    let action = if blocked {
        "customer_block"
    } else {
        "customer_unblock"
    };
    tracing::info!(customer_id = %customer.id, blocked, "customer access changed");
    audit::record(
        state,
        Some(user.user_id),
        action,
        "users",
        serde_json::json!({ "customer_id": customer.id }),
    )
    .await;

    let message = if blocked {
        "Customer blocked"
    } else {
        "Customer unblocked"
    };
    Ok(ApiResponse::success(
        message,
        User::from(customer),
        Some(Meta::empty()),
    ))
}

/// Removes the customer together with their cart, wishlist and orders.
pub async fn delete_customer(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Users::delete_many()
        .filter(UserCol::Id.eq(id))
        .filter(UserCol::Role.eq(ROLE_USER))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        state,
        Some(user.user_id),
        "customer_delete",
        "users",
        serde_json::json!({ "customer_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Customer deleted"))
}
