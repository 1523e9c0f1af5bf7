use std::env;

use crate::pricing::PricingPolicy;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub cookie_secure: bool,
    pub db_max_connections: u32,
    pub cors_allowed_origin: Option<String>,
    /// Seeds the settings row; the stored row wins once it exists.
    pub default_pricing: PricingPolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("APP_PORT", 3000)?;
        let cors_allowed_origin = env::var("CORS_ALLOWED_ORIGIN")
            .ok()
            .filter(|origin| !origin.trim().is_empty());

        let default_pricing = PricingPolicy {
            shipping_fee: parse_or("SHIPPING_FEE", PricingPolicy::default().shipping_fee)?,
            free_shipping_threshold: parse_or(
                "FREE_SHIPPING_THRESHOLD",
                PricingPolicy::default().free_shipping_threshold,
            )?,
            tax_rate_bps: parse_or("TAX_RATE_BPS", PricingPolicy::default().tax_rate_bps)?,
        };

        Ok(Self {
            port,
            database_url,
            host,
            jwt_secret,
            jwt_ttl_hours: parse_or("JWT_TTL_HOURS", 24)?,
            cookie_secure: parse_flag(env::var("COOKIE_SECURE").ok().as_deref()),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 10)?,
            cors_allowed_origin,
            default_pricing,
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T> {
    parse_value(key, env::var(key).ok().as_deref(), default)
}

/// Unset or blank falls back to `default`; anything else must parse.
fn parse_value<T: std::str::FromStr>(key: &str, raw: Option<&str>, default: T) -> anyhow::Result<T> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(default),
        Some(value) => value
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{key} has an invalid value: {value:?}")),
    }
}

fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

#[cfg(test)]
mod tests {
    use super::{parse_flag, parse_value};

    #[test]
    fn flag_accepts_common_truthy_values() {
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some(" YES ")));
        assert!(parse_flag(Some("1")));
        assert!(!parse_flag(Some("false")));
        assert!(!parse_flag(Some("")));
        assert!(!parse_flag(None));
    }

    #[test]
    fn numeric_settings_fall_back_only_when_unset() {
        assert_eq!(parse_value("SHIPPING_FEE", None, 1_000_i64).unwrap(), 1_000);
        assert_eq!(parse_value("SHIPPING_FEE", Some("  "), 1_000_i64).unwrap(), 1_000);
        assert_eq!(parse_value("SHIPPING_FEE", Some(" 750 "), 1_000_i64).unwrap(), 750);

        let err = parse_value("TAX_RATE_BPS", Some("8.25%"), 0_i32).unwrap_err();
        assert!(err.to_string().contains("TAX_RATE_BPS"));
        assert!(parse_value("JWT_TTL_HOURS", Some("a day"), 24_i64).is_err());
    }
}
