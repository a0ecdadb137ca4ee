use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::core::error::Result;
use crate::core::extractor::{AppJson, RecordId};
use crate::features::auth::guards::RequireAdmin;
use crate::features::categories::dtos::{
    CategoryDetailDto, CategoryInputDto, CategoryRecordDto, CategoryResponseDto,
};
use crate::features::categories::services::CategoryService;
use crate::shared::types::{ErrorResponse, MessageResponse};

/// List all categories
///
/// Returns every category with its parent's slug. Not paginated.
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "List of categories", body = Vec<CategoryResponseDto>),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - Admin access required", body = ErrorResponse)
    ),
    tag = "categories",
    security(("bearer_auth" = []))
)]
pub async fn list_categories(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
) -> Result<Json<Vec<CategoryResponseDto>>> {
    let categories = service.list().await?;
    Ok(Json(categories))
}

/// List main categories (no parent)
#[utoipa::path(
    get,
    path = "/api/categories/main",
    responses(
        (status = 200, description = "List of main categories", body = Vec<CategoryRecordDto>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "categories",
    security(("bearer_auth" = []))
)]
pub async fn list_main_categories(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
) -> Result<Json<Vec<CategoryRecordDto>>> {
    let categories = service.list_main().await?;
    Ok(Json(categories))
}

/// List subcategories of a category
#[utoipa::path(
    get,
    path = "/api/categories/{category}/subcategories",
    params(
        ("category" = String, Path, description = "Parent category slug")
    ),
    responses(
        (status = 200, description = "List of subcategories", body = Vec<CategoryRecordDto>),
        (status = 404, description = "Parent category not found", body = ErrorResponse)
    ),
    tag = "categories",
    security(("bearer_auth" = []))
)]
pub async fn list_subcategories(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    Path(parent_slug): Path<String>,
) -> Result<Json<Vec<CategoryRecordDto>>> {
    let categories = service.list_subcategories(&parent_slug).await?;
    Ok(Json(categories))
}

/// Get category by id
#[utoipa::path(
    get,
    path = "/api/categories/{category}",
    params(
        ("category" = i64, Path, description = "Category id")
    ),
    responses(
        (status = 200, description = "Category found", body = CategoryDetailDto),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    tag = "categories",
    security(("bearer_auth" = []))
)]
pub async fn get_category(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    RecordId(id): RecordId,
) -> Result<Json<CategoryDetailDto>> {
    let category = service.get(id).await?;
    Ok(Json(category))
}

/// Create a category
///
/// The slug is derived from the name when omitted; derived slugs that are
/// already taken get a numeric suffix.
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CategoryInputDto,
    responses(
        (status = 201, description = "Category created", body = CategoryResponseDto),
        (status = 404, description = "Parent category not found", body = ErrorResponse),
        (status = 409, description = "Slug taken by a concurrent write", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "categories",
    security(("bearer_auth" = []))
)]
pub async fn create_category(
    RequireAdmin(user): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    AppJson(dto): AppJson<CategoryInputDto>,
) -> Result<(StatusCode, Json<CategoryResponseDto>)> {
    tracing::debug!("Category create requested by {}", user.sub);
    let category = service.create(dto).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Update a category
#[utoipa::path(
    put,
    path = "/api/categories/{category}",
    params(
        ("category" = i64, Path, description = "Category id")
    ),
    request_body = CategoryInputDto,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponseDto),
        (status = 404, description = "Category or parent not found", body = ErrorResponse),
        (status = 409, description = "Slug taken by a concurrent write", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "categories",
    security(("bearer_auth" = []))
)]
pub async fn update_category(
    RequireAdmin(user): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    RecordId(id): RecordId,
    AppJson(dto): AppJson<CategoryInputDto>,
) -> Result<Json<CategoryResponseDto>> {
    tracing::debug!("Category {} update requested by {}", id, user.sub);
    let category = service.update(id, dto).await?;
    Ok(Json(category))
}

/// Delete a category
///
/// Refused with 422 while products or subcategories reference it.
#[utoipa::path(
    delete,
    path = "/api/categories/{category}",
    params(
        ("category" = i64, Path, description = "Category id")
    ),
    responses(
        (status = 200, description = "Category deleted", body = MessageResponse),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 422, description = "Category still has products or subcategories", body = ErrorResponse)
    ),
    tag = "categories",
    security(("bearer_auth" = []))
)]
pub async fn delete_category(
    RequireAdmin(user): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
    RecordId(id): RecordId,
) -> Result<Json<MessageResponse>> {
    tracing::debug!("Category {} delete requested by {}", id, user.sub);
    service.delete(id).await?;
    Ok(Json(MessageResponse::new("Category deleted successfully")))
}

/// List every category slug
///
/// Used by the product screens to populate category filters.
#[utoipa::path(
    get,
    path = "/api/products/category-list",
    responses(
        (status = 200, description = "Category slugs", body = Vec<String>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "categories",
    security(("bearer_auth" = []))
)]
pub async fn list_category_slugs(
    RequireAdmin(_user): RequireAdmin,
    State(service): State<Arc<CategoryService>>,
) -> Result<Json<Vec<String>>> {
    let slugs = service.list_slugs().await?;
    Ok(Json(slugs))
}
