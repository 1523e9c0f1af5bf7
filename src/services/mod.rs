use sea_orm::{DbErr, SqlErr};

use crate::error::AppError;

pub mod admin_service;
pub mod analytics_service;
pub mod auth_service;
pub mod banner_service;
pub mod cart_service;
pub mod category_service;
pub mod collection_service;
pub mod customer_service;
pub mod order_service;
pub mod product_service;
pub mod settings_service;
pub mod wishlist_service;

/// URL slug: lowercase ASCII alphanumerics joined by single dashes.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for ch in input.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Slug from an explicit value or the name; empty results are rejected.
pub(crate) fn resolve_slug(explicit: Option<&str>, name: &str) -> Result<String, AppError> {
    let slug = slugify(explicit.unwrap_or(name));
    if slug.is_empty() {
        return Err(AppError::BadRequest("slug must contain letters or digits".into()));
    }
    Ok(slug)
}

/// `%term%` for ILIKE with the term's own wildcards escaped.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Turn unique-constraint failures into 409s.
pub(crate) fn map_unique(err: DbErr, what: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict(format!("{what} already exists"))
        }
        _ => AppError::OrmError(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Summer Sale 2024!! "), "summer-sale-2024");
        assert_eq!(slugify("T-Shirts & Tops"), "t-shirts-tops");
        assert_eq!(slugify("--a--b--"), "a-b");
    }

    #[test]
    fn slug_falls_back_to_name() {
        assert_eq!(resolve_slug(None, "Linen Shirt").unwrap(), "linen-shirt");
        assert_eq!(resolve_slug(Some("Custom Slug"), "x").unwrap(), "custom-slug");
        assert!(resolve_slug(None, "!!!").is_err());
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("mug"), "%mug%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }
}
