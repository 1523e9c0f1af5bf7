use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::pricing::MAX_PRICE;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateSettingsRequest {
    #[validate(length(min = 1, max = 120))]
    pub store_name: Option<String>,
    #[validate(length(equal = 3, message = "currency must be an ISO 4217 code"))]
    pub currency: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    #[validate(range(min = 0, max = MAX_PRICE))]
    pub shipping_fee: Option<i64>,
    #[validate(range(min = 0, max = MAX_PRICE))]
    pub free_shipping_threshold: Option<i64>,
    #[validate(range(min = 0, max = 10000))]
    pub tax_rate_bps: Option<i32>,
}
