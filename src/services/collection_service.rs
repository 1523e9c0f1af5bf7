use std::collections::BTreeSet;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::collections::{
        CollectionList, CollectionProductRequest, CollectionWithProducts, CreateCollectionRequest,
        UpdateCollectionRequest,
    },
    entity::{
        collection_products::{
            ActiveModel as LinkActive, Column as LinkCol, Entity as CollectionProducts,
        },
        collections::{ActiveModel, Column, Entity as Collections},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Collection, Product},
    response::{ApiResponse, Meta},
    services::{map_unique, resolve_slug},
    state::AppState,
};

pub async fn list_collections(
    state: &AppState,
    viewer: Option<&AuthUser>,
) -> AppResult<ApiResponse<CollectionList>> {
    let mut finder = Collections::find().order_by_asc(Column::Name);
    if !viewer.is_some_and(AuthUser::is_admin) {
        finder = finder.filter(Column::IsActive.eq(true));
    }
    let items: Vec<Collection> = finder
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Collection::from)
        .collect();
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Collections",
        CollectionList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_collection(
    state: &AppState,
    viewer: Option<&AuthUser>,
    id: Uuid,
) -> AppResult<ApiResponse<CollectionWithProducts>> {
    let is_admin = viewer.is_some_and(AuthUser::is_admin);
    let collection = Collections::find_by_id(id)
        .one(&state.orm)
        .await?
        .filter(|c| c.is_active || is_admin)
        .ok_or(AppError::NotFound)?;

    let mut products = collection
        .find_related(Products)
        .order_by_desc(ProdCol::CreatedAt);
    if !is_admin {
        products = products.filter(ProdCol::IsActive.eq(true));
    }
    let products = products
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    Ok(ApiResponse::success(
        "Collection",
        CollectionWithProducts {
            collection: Collection::from(collection),
            products,
        },
        None,
    ))
}

async fn ensure_products_exist<C: ConnectionTrait>(conn: &C, ids: &BTreeSet<Uuid>) -> AppResult<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let found = Products::find()
        .filter(ProdCol::Id.is_in(ids.iter().copied()))
        .count(conn)
        .await?;
    if found as usize != ids.len() {
        return Err(AppError::BadRequest("product not found".into()));
    }
    Ok(())
}

async fn link_products<C: ConnectionTrait>(
    conn: &C,
    collection_id: Uuid,
    ids: &BTreeSet<Uuid>,
) -> AppResult<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let links = ids.iter().map(|product_id| LinkActive {
        collection_id: Set(collection_id),
        product_id: Set(*product_id),
        created_at: Set(Utc::now().into()),
    });
    CollectionProducts::insert_many(links)
        .on_conflict(
            OnConflict::columns([LinkCol::CollectionId, LinkCol::ProductId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

pub async fn create_collection(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCollectionRequest,
) -> AppResult<ApiResponse<Collection>> {
    ensure_admin(user)?;
    payload.validate()?;
    let slug = resolve_slug(payload.slug.as_deref(), &payload.name)?;
    let product_ids: BTreeSet<Uuid> = payload.product_ids.iter().copied().collect();

    let txn = state.orm.begin().await?;
    ensure_products_exist(&txn, &product_ids).await?;

    let collection = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        slug: Set(slug),
        description: Set(payload.description),
        image_url: Set(payload.image_url),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(|e| map_unique(e, "collection slug"))?;

    link_products(&txn, collection.id, &product_ids).await?;
    txn.commit().await?;

    audit::record(
        state,
        Some(user.user_id),
        "collection_create",
        "collections",
        serde_json::json!({ "collection_id": collection.id, "products": product_ids.len() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Collection created",
        Collection::from(collection),
        Some(Meta::empty()),
    ))
}

pub async fn update_collection(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCollectionRequest,
) -> AppResult<ApiResponse<Collection>> {
    ensure_admin(user)?;
    payload.validate()?;
    let existing = Collections::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

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
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    let collection = active
        .update(&state.orm)
        .await
        .map_err(|e| map_unique(e, "collection slug"))?;

    audit::record(
        state,
        Some(user.user_id),
        "collection_update",
        "collections",
        serde_json::json!({ "collection_id": collection.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Collection::from(collection),
        Some(Meta::empty()),
    ))
}

pub async fn delete_collection(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Collections::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        state,
        Some(user.user_id),
        "collection_delete",
        "collections",
        serde_json::json!({ "collection_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Deleted"))
}

/// Idempotent: attaching an already linked product succeeds.
pub async fn add_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: CollectionProductRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    if Collections::find_by_id(id).one(&state.orm).await?.is_none() {
        return Err(AppError::NotFound);
    }
    let ids = BTreeSet::from([payload.product_id]);
    ensure_products_exist(&state.orm, &ids).await?;
    link_products(&state.orm, id, &ids).await?;

    audit::record(
        state,
        Some(user.user_id),
        "collection_add_product",
        "collections",
        serde_json::json!({ "collection_id": id, "product_id": payload.product_id }),
    )
    .await;

    Ok(ApiResponse::done("Product added to collection"))
}

pub async fn remove_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = CollectionProducts::delete_many()
        .filter(LinkCol::CollectionId.eq(id))
        .filter(LinkCol::ProductId.eq(product_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        state,
        Some(user.user_id),
        "collection_remove_product",
        "collections",
        serde_json::json!({ "collection_id": id, "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::done("Product removed from collection"))
}
