use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use crate::application::category_service::CategoryPage;
use crate::domain::category::{BookCategoryLink, Category, CategoryRequest, parse_id};
use crate::domain::pagination::Pagination;
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::middleware::auth::AuthenticatedUser;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CategoryPayloadDto {
    #[serde(default)]
    #[validate(length(max = 255))]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct BookCategoryDto {
    #[validate(range(min = 1))]
    pub(crate) book_id: i64,
    #[validate(range(min = 1))]
    pub(crate) category_id: i64,
}

/// Raw query values; anything unparsable or non-positive falls back to the defaults.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub(crate) struct ListCategoriesQuery {
    pub(crate) page: Option<String>,
    #[serde(alias = "limit")]
    pub(crate) page_size: Option<String>,
}

impl ListCategoriesQuery {
    pub(crate) fn into_pagination(self) -> Pagination {
        Pagination::new(parse_or_zero(self.page), parse_or_zero(self.page_size))
    }
}

fn parse_or_zero(raw: Option<String>) -> i64 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .unwrap_or(0)
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct CategoryDto {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PaginationDto {
    pub(crate) page: i64,
    pub(crate) page_size: i64,
    pub(crate) offset: i64,
    pub(crate) total_count: i64,
    pub(crate) page_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ListCategoriesResponseDto {
    pub(crate) categories: Vec<CategoryDto>,
    pub(crate) pagination: PaginationDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct BookCategoryResponseDto {
    pub(crate) book_id: i64,
    pub(crate) category_id: i64,
}

impl From<Category> for CategoryDto {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

impl From<Pagination> for PaginationDto {
    fn from(pagination: Pagination) -> Self {
        Self {
            page: pagination.page,
            page_size: pagination.page_size,
            offset: pagination.offset,
            total_count: pagination.total_count,
            page_count: pagination.page_count,
        }
    }
}

impl From<CategoryPage> for ListCategoriesResponseDto {
    fn from(page: CategoryPage) -> Self {
        Self {
            categories: page.categories.into_iter().map(CategoryDto::from).collect(),
            pagination: PaginationDto::from(page.pagination),
        }
    }
}

impl From<BookCategoryLink> for BookCategoryResponseDto {
    fn from(link: BookCategoryLink) -> Self {
        Self {
            book_id: link.book_id,
            category_id: link.category_id,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    tag = "categories",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("page" = Option<i64>, Query, description = "Page number, defaults to 1"),
        ("page_size" = Option<i64>, Query, description = "Items per page, defaults to 5 (alias: limit)")
    ),
    responses(
        (status = 200, description = "Categories listed", body = ListCategoriesResponseDto),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<ListCategoriesQuery>,
) -> AppResult<(StatusCode, Json<ListCategoriesResponseDto>)> {
    let page = state
        .category_service
        .list_categories(query.into_pagination())
        .await?;

    Ok((StatusCode::OK, Json(ListCategoriesResponseDto::from(page))))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    tag = "categories",
    security(
        ("bearer_auth" = [])
    ),
    request_body = CategoryPayloadDto,
    responses(
        (status = 201, description = "Category created", body = CategoryDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn create_category(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    payload: Result<Json<CategoryPayloadDto>, JsonRejection>,
) -> AppResult<(StatusCode, Json<CategoryDto>)> {
    let Json(dto) = payload?;
    dto.validate()?;
    let req = CategoryRequest {
        name: dto.name,
        description: dto.description,
    };

    let created = state.category_service.create_category(req).await?;
    info!(
        subject_id = caller.subject_id,
        role = %caller.role,
        category_id = created.id,
        "category created"
    );

    Ok((StatusCode::CREATED, Json(CategoryDto::from(created))))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    tag = "categories",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Category id")
    ),
    responses(
        (status = 200, description = "Category found", body = CategoryDto),
        (status = 400, description = "Malformed id"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Category not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<CategoryDto>)> {
    let id = parse_id("id", &id)?;
    let category = state.category_service.get_category_detail(id).await?;

    Ok((StatusCode::OK, Json(CategoryDto::from(category))))
}

#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}",
    tag = "categories",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Category id")
    ),
    request_body = CategoryPayloadDto,
    responses(
        (status = 200, description = "Category updated", body = CategoryDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Category not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn update_category(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
    payload: Result<Json<CategoryPayloadDto>, JsonRejection>,
) -> AppResult<(StatusCode, Json<CategoryDto>)> {
    let id = parse_id("id", &id)?;
    let Json(dto) = payload?;
    dto.validate()?;
    let req = CategoryRequest {
        name: dto.name,
        description: dto.description,
    };

    let updated = state.category_service.update_category(id, req).await?;
    info!(
        subject_id = caller.subject_id,
        role = %caller.role,
        category_id = updated.id,
        "category updated"
    );

    Ok((StatusCode::OK, Json(CategoryDto::from(updated))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    tag = "categories",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Category id")
    ),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 400, description = "Malformed id"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Category not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn delete_category(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_id("id", &id)?;
    state.category_service.delete_category(id).await?;
    info!(
        subject_id = caller.subject_id,
        role = %caller.role,
        category_id = id,
        "category deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/categories/books",
    tag = "categories",
    security(
        ("bearer_auth" = [])
    ),
    request_body = BookCategoryDto,
    responses(
        (status = 201, description = "Book linked to category", body = BookCategoryResponseDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Category not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn add_book_category(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    payload: Result<Json<BookCategoryDto>, JsonRejection>,
) -> AppResult<(StatusCode, Json<BookCategoryResponseDto>)> {
    let Json(dto) = payload?;
    dto.validate()?;
    let link = BookCategoryLink {
        book_id: dto.book_id,
        category_id: dto.category_id,
    };

    let link = state.category_service.add_book_category_link(link).await?;
    info!(
        subject_id = caller.subject_id,
        role = %caller.role,
        book_id = link.book_id,
        category_id = link.category_id,
        "book linked to category"
    );

    Ok((StatusCode::CREATED, Json(BookCategoryResponseDto::from(link))))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/books/{id}",
    tag = "categories",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Book id")
    ),
    responses(
        (status = 200, description = "Categories of the book", body = Vec<CategoryDto>),
        (status = 400, description = "Malformed id"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn list_categories_for_book(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
) -> AppResult<(StatusCode, Json<Vec<CategoryDto>>)> {
    let book_id = parse_id("book_id", &book_id)?;
    let categories = state
        .category_service
        .list_categories_for_book(book_id)
        .await?;

    Ok((
        StatusCode::OK,
        Json(categories.into_iter().map(CategoryDto::from).collect()),
    ))
}
