use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::{
        categories::{Column as CategoryCol, Entity as Categories},
        collection_products::{Column as CollectionProductCol, Entity as CollectionProducts},
        products::{ActiveModel, Column, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{DiscountType, Product},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::{contains_pattern, map_unique, resolve_slug},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    viewer: Option<&AuthUser>,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    let include_inactive =
        query.include_inactive.unwrap_or(false) && viewer.is_some_and(AuthUser::is_admin);
    if !include_inactive {
        condition = condition.add(Column::IsActive.eq(true));
    }

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(category) = query.category.as_ref().filter(|s| !s.is_empty()) {
        match resolve_category(state, category).await? {
            Some(category_id) => condition = condition.add(Column::CategoryId.eq(category_id)),
            None => return Ok(empty_page(page, limit)),
        }
    }

    if let Some(collection_id) = query.collection {
        let ids: Vec<Uuid> = CollectionProducts::find()
            .filter(CollectionProductCol::CollectionId.eq(collection_id))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|row| row.product_id)
            .collect();
        if ids.is_empty() {
            return Ok(empty_page(page, limit));
        }
        condition = condition.add(Column::Id.is_in(ids));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    if let Some(featured) = query.featured {
        condition = condition.add(Column::IsFeatured.eq(featured));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    let data = ProductList { items };
    Ok(ApiResponse::success("Products", data, Some(meta)))
}

fn empty_page(page: i64, limit: i64) -> ApiResponse<ProductList> {
    ApiResponse::success(
        "Products",
        ProductList { items: Vec::new() },
        Some(Meta::new(page, limit, 0)),
    )
}

/// Accepts a category id or slug.
async fn resolve_category(state: &AppState, category: &str) -> AppResult<Option<Uuid>> {
    if let Ok(id) = Uuid::parse_str(category) {
        return Ok(Some(id));
    }
    let found = Categories::find()
        .filter(CategoryCol::Slug.eq(category))
        .one(&state.orm)
        .await?;
    Ok(found.map(|c| c.id))
}

pub async fn get_product(
    state: &AppState,
    viewer: Option<&AuthUser>,
    id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    let is_admin = viewer.is_some_and(AuthUser::is_admin);
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .filter(|p| p.is_active || is_admin)
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Product", Product::from(product), None))
}

fn check_discount(kind: Option<DiscountType>, value: i64) -> AppResult<()> {
    if kind == Some(DiscountType::Percentage) && value > 100 {
        return Err(AppError::BadRequest(
            "percentage discount cannot exceed 100".into(),
        ));
    }
    Ok(())
}

async fn ensure_category_exists(state: &AppState, category_id: Option<Uuid>) -> AppResult<()> {
    if let Some(id) = category_id {
        if Categories::find_by_id(id).one(&state.orm).await?.is_none() {
            return Err(AppError::BadRequest("category not found".into()));
        }
    }
    Ok(())
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;
    let discount_value = payload.discount_value.unwrap_or(0);
    check_discount(payload.discount_type, discount_value)?;
    ensure_category_exists(state, payload.category_id).await?;

    let slug = resolve_slug(payload.slug.as_deref(), &payload.name)?;
    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        slug: Set(slug),
        description: Set(payload.description),
        price: Set(payload.price),
        discount_type: Set(payload.discount_type),
        discount_value: Set(discount_value),
        stock: Set(payload.stock),
        category_id: Set(payload.category_id),
        sizes: Set(serde_json::json!(payload.sizes)),
        colors: Set(serde_json::json!(payload.colors)),
        images: Set(serde_json::json!(payload.images)),
        is_featured: Set(payload.is_featured.unwrap_or(false)),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let product = active
        .insert(&state.orm)
        .await
        .map_err(|e| map_unique(e, "product slug"))?;

    audit::record(
        state,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;
    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let (discount_type, discount_value) = if payload.clear_discount.unwrap_or(false) {
        (None, 0)
    } else {
        (
            payload.discount_type.or(existing.discount_type),
            payload.discount_value.unwrap_or(existing.discount_value),
        )
    };
    check_discount(discount_type, discount_value)?;
    ensure_category_exists(state, payload.category_id).await?;

    let mut active: ActiveModel = existing.into();
    if let Some(slug) = payload.slug.as_deref() {
        active.slug = Set(resolve_slug(Some(slug), "")?);
    }
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    active.discount_type = Set(discount_type);
    active.discount_value = Set(discount_value);
    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(Some(category_id));
    }
    if let Some(sizes) = payload.sizes {
        active.sizes = Set(serde_json::json!(sizes));
    }
    if let Some(colors) = payload.colors {
        active.colors = Set(serde_json::json!(colors));
    }
    if let Some(images) = payload.images {
        active.images = Set(serde_json::json!(images));
    }
    if let Some(is_featured) = payload.is_featured {
        active.is_featured = Set(is_featured);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());

    let product = active
        .update(&state.orm)
        .await
        .map_err(|e| map_unique(e, "product slug"))?;

    audit::record(
        state,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        state,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_discount_above_hundred_is_rejected() {
        assert!(check_discount(Some(DiscountType::Percentage), 101).is_err());
        assert!(check_discount(Some(DiscountType::Percentage), 100).is_ok());
        assert!(check_discount(Some(DiscountType::Fixed), 5_000).is_ok());
        assert!(check_discount(None, 500).is_ok());
    }
}
