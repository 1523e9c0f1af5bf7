use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set, sea_query::OnConflict};
use validator::Validate;

use crate::{
    audit,
    config::AppConfig,
    dto::settings::UpdateSettingsRequest,
    entity::settings::{ActiveModel as SettingsActive, Column, Entity as Settings, Model, SETTINGS_ID},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::StoreSettings,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const DEFAULT_STORE_NAME: &str = "Storefront";
pub const DEFAULT_CURRENCY: &str = "USD";

/// Read the settings row, creating it from configured defaults on first use.
pub async fn load_settings<C: ConnectionTrait>(conn: &C, config: &AppConfig) -> AppResult<Model> {
    if let Some(settings) = Settings::find_by_id(SETTINGS_ID).one(conn).await? {
        return Ok(settings);
    }

    let pricing = config.default_pricing;
    let defaults = SettingsActive {
        id: Set(SETTINGS_ID),
        store_name: Set(DEFAULT_STORE_NAME.to_string()),
        currency: Set(DEFAULT_CURRENCY.to_string()),
        contact_email: Set(None),
        shipping_fee: Set(pricing.shipping_fee),
        free_shipping_threshold: Set(pricing.free_shipping_threshold),
        tax_rate_bps: Set(pricing.tax_rate_bps),
        updated_at: Set(Utc::now().into()),
    };
    Settings::insert(defaults)
        .on_conflict(OnConflict::column(Column::Id).do_nothing().to_owned())
        .exec_without_returning(conn)
        .await?;

    Settings::find_by_id(SETTINGS_ID)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("settings row missing after insert")))
}

pub async fn get_settings(state: &AppState) -> AppResult<ApiResponse<StoreSettings>> {
    let settings = load_settings(&state.orm, &state.config).await?;
    Ok(ApiResponse::success(
        "Settings",
        StoreSettings::from(settings),
        None,
    ))
}

pub async fn update_settings(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateSettingsRequest,
) -> AppResult<ApiResponse<StoreSettings>> {
    ensure_admin(user)?;
    payload.validate()?;

    let existing = load_settings(&state.orm, &state.config).await?;
    let mut active: SettingsActive = existing.into();
    if let Some(store_name) = payload.store_name {
        active.store_name = Set(store_name);
    }
    if let Some(currency) = payload.currency {
        active.currency = Set(currency.to_uppercase());
    }
    if let Some(contact_email) = payload.contact_email {
        active.contact_email = Set(Some(contact_email));
    }
    if let Some(shipping_fee) = payload.shipping_fee {
        active.shipping_fee = Set(shipping_fee);
    }
    if let Some(threshold) = payload.free_shipping_threshold {
        active.free_shipping_threshold = Set(threshold);
    }
    if let Some(tax_rate_bps) = payload.tax_rate_bps {
        active.tax_rate_bps = Set(tax_rate_bps);
    }
    active.updated_at = Set(Utc::now().into());
    let settings = active.update(&state.orm).await?;

    audit::record(
        state,
        Some(user.user_id),
        "settings_update",
        "settings",
        serde_json::json!({
            "shipping_fee": settings.shipping_fee,
            "free_shipping_threshold": settings.free_shipping_threshold,
            "tax_rate_bps": settings.tax_rate_bps,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Settings updated",
        StoreSettings::from(settings),
        Some(Meta::empty()),
    ))
}
