use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::banners::{BannerList, BannerQuery, CreateBannerRequest, UpdateBannerRequest},
    entity::banners::{ActiveModel, Column, Entity as Banners},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Banner,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_banners(
    state: &AppState,
    viewer: Option<&AuthUser>,
    query: BannerQuery,
) -> AppResult<ApiResponse<BannerList>> {
    let mut finder = Banners::find()
        .order_by_asc(Column::Position)
        .order_by_desc(Column::CreatedAt);
    if query.all.unwrap_or(false) {
        match viewer {
            Some(user) => ensure_admin(user)?,
            None => return Err(AppError::Unauthorized("Missing credentials".into())),
        }
    } else {
        finder = finder.filter(Column::IsActive.eq(true));
    }

    let items: Vec<Banner> = finder
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Banner::from)
        .collect();
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Banners",
        BannerList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn create_banner(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBannerRequest,
) -> AppResult<ApiResponse<Banner>> {
    ensure_admin(user)?;
    payload.validate()?;

    let banner = ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(payload.title),
        subtitle: Set(payload.subtitle),
        image_url: Set(payload.image_url),
        link_url: Set(payload.link_url),
        position: Set(payload.position.unwrap_or(0)),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        state,
        Some(user.user_id),
        "banner_create",
        "banners",
        serde_json::json!({ "banner_id": banner.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Banner created",
        Banner::from(banner),
        Some(Meta::empty()),
    ))
}

pub async fn update_banner(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBannerRequest,
) -> AppResult<ApiResponse<Banner>> {
    ensure_admin(user)?;
    payload.validate()?;
    let existing = Banners::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(subtitle) = payload.subtitle {
        active.subtitle = Set(Some(subtitle));
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(image_url);
    }
    if let Some(link_url) = payload.link_url {
        active.link_url = Set(Some(link_url));
    }
    if let Some(position) = payload.position {
        active.position = Set(position);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    let banner = active.update(&state.orm).await?;

    audit::record(
        state,
        Some(user.user_id),
        "banner_update",
        "banners",
        serde_json::json!({ "banner_id": banner.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Banner::from(banner),
        Some(Meta::empty()),
    ))
}

pub async fn delete_banner(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Banners::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        state,
        Some(user.user_id),
        "banner_delete",
        "banners",
        serde_json::json!({ "banner_id": id }),
    )
    .await;

    Ok(ApiResponse::done("Deleted"))
}
