use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{models::Product, pricing::OrderTotals};

/// Upper bound on a single cart line.
pub const MAX_LINE_QUANTITY: i32 = 10_000;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    #[validate(range(
        min = 1,
        max = MAX_LINE_QUANTITY,
        message = "quantity must be between 1 and 10000"
    ))]
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateCartItemRequest {
    #[validate(range(
        min = 1,
        max = MAX_LINE_QUANTITY,
        message = "quantity must be between 1 and 10000"
    ))]
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub product: Product,
    pub quantity: i32,
    pub size: Option<String>,
    pub color: Option<String>,
    pub unit_price: i64,
    pub line_total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub totals: OrderTotals,
}
