use std::collections::HashMap;

use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::cart::{AddToCartRequest, CartLine, CartView, UpdateCartItemRequest},
    entity::{
        cart_items::{ActiveModel as CartActive, Column as CartCol, Entity as CartItems},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartItem, Product},
    response::{ApiResponse, Meta},
    pricing::line_total,
    services::settings_service::load_settings,
    state::AppState,
};

pub async fn view_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let lines = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = lines.iter().map(|line| line.product_id).collect();
    let products: HashMap<Uuid, ProductModel> = if ids.is_empty() {
        HashMap::new()
    } else {
        Products::find()
            .filter(ProdCol::Id.is_in(ids))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect()
    };

    let mut items: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines {
        let Some(product) = products.get(&line.product_id).cloned() else {
            continue;
        };
        let unit_price = product.final_price();
        items.push(CartLine {
            id: line.id,
            product: Product::from(product),
            quantity: line.quantity,
            size: line.size,
            color: line.color,
            unit_price,
            line_total: line_total(unit_price, line.quantity)?,
        });
    }

    let policy = load_settings(&state.orm, &state.config)
        .await?
        .pricing_policy();
    let totals = policy.totals(items.iter().map(|line| (line.unit_price, line.quantity)))?;
    let count = items.len() as i64;

    Ok(ApiResponse::success(
        "OK",
        CartView { items, totals },
        Some(Meta::new(1, count, count)),
    ))
}

/// Option must be one of the product's listed values when it lists any.
fn check_option(kind: &str, chosen: Option<&str>, allowed: &[String]) -> AppResult<()> {
    match chosen {
        Some(value) if !allowed.is_empty() && !allowed.iter().any(|a| a == value) => Err(
            AppError::BadRequest(format!("{kind} '{value}' is not available for this product")),
        ),
        _ => Ok(()),
    }
}

/// Quantity of a line after adding `added` to what is already there.
fn merged_quantity(existing: Option<i32>, added: i32) -> Option<i32> {
    existing.unwrap_or(0).checked_add(added)
}

fn nullable_eq(col: CartCol, value: Option<&str>) -> Condition {
    match value {
        Some(v) => Condition::all().add(col.eq(v)),
        None => Condition::all().add(col.is_null()),
    }
}

/// Adds to an existing line with the same product, size and color, or appends a new one.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    payload.validate()?;

    let product = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::BadRequest("product not found".to_string()))?;
    let view = Product::from(product.clone());
    check_option("size", payload.size.as_deref(), &view.sizes)?;
    check_option("color", payload.color.as_deref(), &view.colors)?;

    let exist = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::ProductId.eq(payload.product_id))
        .filter(nullable_eq(CartCol::Size, payload.size.as_deref()))
        .filter(nullable_eq(CartCol::Color, payload.color.as_deref()))
        .one(&state.orm)
        .await?;

    let quantity = merged_quantity(exist.as_ref().map(|line| line.quantity), payload.quantity)
        .filter(|quantity| *quantity <= product.stock);
    let Some(quantity) = quantity else {
        return Err(AppError::BadRequest(format!(
            "Insufficient stock for product {}",
            product.name
        )));
    };

    let cart_item = match exist {
        Some(line) => {
            let mut active: CartActive = line.into();
            active.quantity = Set(quantity);
            active.update(&state.orm).await?
        }
        None => {
            CartActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                product_id: Set(payload.product_id),
                quantity: Set(quantity),
                size: Set(payload.size),
                color: Set(payload.color),
                created_at: NotSet,
            }
            .insert(&state.orm)
            .await?
        }
    };

    audit::record(
        state,
        Some(user.user_id),
        "cart_update",
        "cart_items",
        serde_json::json!({ "product_id": cart_item.product_id, "quantity": cart_item.quantity }),
    )
    .await;

    Ok(ApiResponse::success("OK", CartItem::from(cart_item), None))
}

pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    payload.validate()?;
    let line = CartItems::find_by_id(id)
        .filter(CartCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let stock = Products::find_by_id(line.product_id)
        .one(&state.orm)
        .await?
        .map_or(0, |p| p.stock);
    if payload.quantity > stock {
        return Err(AppError::BadRequest("Insufficient stock".into()));
    }

    let mut active: CartActive = line.into();
    active.quantity = Set(payload.quantity);
    let line = active.update(&state.orm).await?;

    Ok(ApiResponse::success("Updated", CartItem::from(line), None))
}

pub async fn remove_cart_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(CartCol::Id.eq(id))
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        state,
        Some(user.user_id),
        "cart_remove",
        "cart_items",
        serde_json::json!({ "cart_item_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Removed from cart"))
}

pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;
    tracing::debug!(user_id = %user.user_id, removed = result.rows_affected, "cart cleared");
    Ok(ApiResponse::done("Cart cleared"))
}

#[cfg(test)]
mod tests {
    use super::{check_option, merged_quantity};

    #[test]
    fn options_are_checked_only_when_listed() {
        let sizes = vec!["S".to_string(), "M".to_string()];
        assert!(check_option("size", Some("M"), &sizes).is_ok());
        assert!(check_option("size", Some("XL"), &sizes).is_err());
        assert!(check_option("size", None, &sizes).is_ok());
        assert!(check_option("color", Some("red"), &[]).is_ok());
    }

    #[test]
    fn merged_quantity_rejects_overflow() {
        assert_eq!(merged_quantity(None, 3), Some(3));
        assert_eq!(merged_quantity(Some(2), 3), Some(5));
        assert_eq!(merged_quantity(Some(1), i32::MAX), None);
    }
}
