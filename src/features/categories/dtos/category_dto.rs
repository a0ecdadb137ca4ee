use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::categories::models::{Category, CategoryWithParentSlug};

/// Request DTO for creating or updating a category
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CategoryInputDto {
    #[validate(length(
        min = 1,
        max = 255,
        message = "The name field is required and must not exceed 255 characters."
    ))]
    pub name: String,

    /// Derived from `name` when absent
    #[validate(
        length(max = 255, message = "The slug must not exceed 255 characters."),
        regex(
            path = "*crate::shared::validation::SLUG_REGEX",
            message = "The slug may only contain lowercase letters, digits and single hyphens."
        )
    )]
    #[serde(default)]
    pub slug: Option<String>,

    /// Parent category id; `null` makes this a main category
    #[serde(default)]
    pub parent_id: Option<i64>,
}

impl CategoryInputDto {
    /// Trim the name and treat a blank slug as "not provided"
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            slug: self
                .slug
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            parent_id: self.parent_id,
        }
    }
}

/// Category with its parent's slug (list, create and update responses)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponseDto {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i64>,
    pub parent_slug: Option<String>,
}

impl From<CategoryWithParentSlug> for CategoryResponseDto {
    fn from(c: CategoryWithParentSlug) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            parent_id: c.parent_id,
            parent_slug: c.parent_slug,
        }
    }
}

impl CategoryResponseDto {
    pub fn from_category(c: Category, parent_slug: Option<String>) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            parent_id: c.parent_id,
            parent_slug,
        }
    }
}

/// Full category record (main category and subcategory listings)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryRecordDto {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryRecordDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            parent_id: c.parent_id,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Minimal reference to a related category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryRefDto {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl From<Category> for CategoryRefDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
        }
    }
}

/// Single category with its parent, children and product count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryDetailDto {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i64>,
    pub parent: Option<CategoryRefDto>,
    pub children: Vec<CategoryRefDto>,
    pub products_count: i64,
}
