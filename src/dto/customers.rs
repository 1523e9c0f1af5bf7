use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{models::User, routes::params::Pagination};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomerQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Matches name or email.
    pub q: Option<String>,
    pub blocked: Option<bool>,
}

impl CustomerQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerList {
    pub items: Vec<User>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerDetail {
    pub customer: User,
    pub order_count: i64,
    /// Sum of non-cancelled order totals.
    pub total_spent: i64,
}
