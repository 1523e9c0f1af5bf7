use sea_orm::entity::prelude::*;

/// Singleton row; the store always reads and writes `id = 1`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub store_name: String,
    pub currency: String,
    pub contact_email: Option<String>,
    pub shipping_fee: i64,
    pub free_shipping_threshold: i64,
    pub tax_rate_bps: i32,
    pub updated_at: DateTimeWithTimeZone,
}

pub const SETTINGS_ID: i32 = 1;

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
