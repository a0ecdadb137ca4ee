use async_trait::async_trait;
use sqlx::PgPool;

use super::{CategoryRepository, RepositoryError, RepositoryResult};
use crate::features::categories::models::{Category, CategoryChanges, CategoryWithParentSlug};

const CATEGORY_COLUMNS: &str = "id, name, slug, parent_id, created_at, updated_at";

/// Convert a database error into the constraint it tripped, if any
fn classify(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &e {
        let constraint = db_err.constraint().unwrap_or("unknown").to_string();

        // PostgreSQL unique_violation
        if db_err.code().as_deref() == Some("23505") {
            return RepositoryError::UniqueViolation(constraint);
        }

        // PostgreSQL foreign_key_violation
        if db_err.code().as_deref() == Some("23503") {
            return RepositoryError::ForeignKeyViolation(constraint);
        }
    }

    RepositoryError::Database(e)
}

/// PostgreSQL-backed category store
pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn list_with_parent_slug(&self) -> RepositoryResult<Vec<CategoryWithParentSlug>> {
        sqlx::query_as::<_, CategoryWithParentSlug>(
            r#"
            SELECT c.id, c.name, c.slug, c.parent_id, p.slug AS parent_slug
            FROM categories c
            LEFT JOIN categories p ON p.id = c.parent_id
            ORDER BY c.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(classify)
    }

    async fn list_main(&self) -> RepositoryResult<Vec<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {} FROM categories WHERE parent_id IS NULL ORDER BY id",
            CATEGORY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(classify)
    }

    async fn list_children(&self, parent_id: i64) -> RepositoryResult<Vec<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {} FROM categories WHERE parent_id = $1 ORDER BY id",
            CATEGORY_COLUMNS
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(classify)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {} FROM categories WHERE id = $1",
            CATEGORY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)
    }

    async fn find_by_slug(&self, slug: &str) -> RepositoryResult<Option<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            "SELECT {} FROM categories WHERE slug = $1",
            CATEGORY_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)
    }

    async fn slug_exists(&self, slug: &str, excluding_id: Option<i64>) -> RepositoryResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM categories
                WHERE slug = $1 AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(slug)
        .bind(excluding_id)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn insert(&self, changes: &CategoryChanges) -> RepositoryResult<Category> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            INSERT INTO categories (name, slug, parent_id)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        ))
        .bind(&changes.name)
        .bind(&changes.slug)
        .bind(changes.parent_id)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn update(
        &self,
        id: i64,
        changes: &CategoryChanges,
    ) -> RepositoryResult<Option<Category>> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            UPDATE categories
            SET name = $2, slug = $3, parent_id = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.slug)
        .bind(changes.parent_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_children(&self, id: i64) -> RepositoryResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories WHERE parent_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)
    }

    async fn count_products(&self, id: i64) -> RepositoryResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE category_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)
    }

    async fn list_slugs(&self) -> RepositoryResult<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT slug FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(classify)
    }
}
