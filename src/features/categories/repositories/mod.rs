//! Category persistence.
//!
//! The service talks to storage only through [`CategoryRepository`]. Slug
//! uniqueness and parent/product references are enforced by the store
//! itself, so a write that loses a race surfaces as a [`RepositoryError`]
//! instead of silently producing a duplicate or an orphan.

use async_trait::async_trait;
use thiserror::Error;

use crate::features::categories::models::{Category, CategoryChanges, CategoryWithParentSlug};

#[cfg(test)]
mod memory;
mod postgres;

#[cfg(test)]
pub use memory::InMemoryCategoryRepository;
pub use postgres::PgCategoryRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A UNIQUE constraint rejected the write (duplicate slug)
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A FOREIGN KEY constraint rejected the write or delete
    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Every category with its parent's slug, ordered by id
    async fn list_with_parent_slug(&self) -> RepositoryResult<Vec<CategoryWithParentSlug>>;

    /// Categories without a parent, ordered by id
    async fn list_main(&self) -> RepositoryResult<Vec<Category>>;

    /// Direct children of `parent_id`, ordered by id
    async fn list_children(&self, parent_id: i64) -> RepositoryResult<Vec<Category>>;

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Category>>;

    async fn find_by_slug(&self, slug: &str) -> RepositoryResult<Option<Category>>;

    /// Whether another category already uses `slug`, ignoring `excluding_id`
    async fn slug_exists(&self, slug: &str, excluding_id: Option<i64>) -> RepositoryResult<bool>;

    async fn insert(&self, changes: &CategoryChanges) -> RepositoryResult<Category>;

    /// Returns `None` when no row has `id`
    async fn update(&self, id: i64, changes: &CategoryChanges)
        -> RepositoryResult<Option<Category>>;

    /// Returns `false` when no row has `id`
    async fn delete(&self, id: i64) -> RepositoryResult<bool>;

    async fn count_children(&self, id: i64) -> RepositoryResult<i64>;

    /// Number of products whose `category_id` is `id`
    async fn count_products(&self, id: i64) -> RepositoryResult<i64>;

    /// All slugs, ordered by id
    async fn list_slugs(&self) -> RepositoryResult<Vec<String>>;
}
