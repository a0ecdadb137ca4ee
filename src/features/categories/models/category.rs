use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for category
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category row joined with its parent's slug
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct CategoryWithParentSlug {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i64>,
    pub parent_slug: Option<String>,
}

/// Column values written on insert and update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryChanges {
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i64>,
}
