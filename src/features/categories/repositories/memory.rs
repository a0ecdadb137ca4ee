use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{CategoryRepository, RepositoryError, RepositoryResult};
use crate::features::categories::models::{Category, CategoryChanges, CategoryWithParentSlug};

#[derive(Default)]
struct State {
    next_id: i64,
    categories: BTreeMap<i64, Category>,
    product_counts: HashMap<i64, i64>,
}

impl State {
    fn slug_taken(&self, slug: &str, excluding_id: Option<i64>) -> bool {
        self.categories
            .values()
            .any(|c| c.slug == slug && Some(c.id) != excluding_id)
    }

    fn check_parent(&self, parent_id: Option<i64>) -> RepositoryResult<()> {
        match parent_id {
            Some(id) if !self.categories.contains_key(&id) => Err(
                RepositoryError::ForeignKeyViolation("categories_parent_id_fkey".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

/// Category store held in memory, with the same constraints as the
/// `categories` table (unique slug, parent and product references).
#[derive(Default)]
pub struct InMemoryCategoryRepository {
    state: RwLock<State>,
    stale_slug_checks: AtomicBool,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `count` products referencing `category_id`
    pub async fn set_product_count(&self, category_id: i64, count: i64) {
        self.state
            .write()
            .await
            .product_counts
            .insert(category_id, count);
    }

    /// Make `slug_exists` always answer `false`, as a concurrent writer
    /// would observe before the competing insert commits.
    pub fn use_stale_slug_checks(&self) {
        self.stale_slug_checks.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn list_with_parent_slug(&self) -> RepositoryResult<Vec<CategoryWithParentSlug>> {
        let state = self.state.read().await;
        Ok(state
            .categories
            .values()
            .map(|c| CategoryWithParentSlug {
                id: c.id,
                name: c.name.clone(),
                slug: c.slug.clone(),
                parent_id: c.parent_id,
                parent_slug: c
                    .parent_id
                    .and_then(|pid| state.categories.get(&pid))
                    .map(|p| p.slug.clone()),
            })
            .collect())
    }

    async fn list_main(&self) -> RepositoryResult<Vec<Category>> {
        let state = self.state.read().await;
        Ok(state
            .categories
            .values()
            .filter(|c| c.parent_id.is_none())
            .cloned()
            .collect())
    }

    async fn list_children(&self, parent_id: i64) -> RepositoryResult<Vec<Category>> {
        let state = self.state.read().await;
        Ok(state
            .categories
            .values()
            .filter(|c| c.parent_id == Some(parent_id))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Category>> {
        Ok(self.state.read().await.categories.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> RepositoryResult<Option<Category>> {
        let state = self.state.read().await;
        Ok(state.categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn slug_exists(&self, slug: &str, excluding_id: Option<i64>) -> RepositoryResult<bool> {
        if self.stale_slug_checks.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(self.state.read().await.slug_taken(slug, excluding_id))
    }

    async fn insert(&self, changes: &CategoryChanges) -> RepositoryResult<Category> {
        let mut state = self.state.write().await;

        if state.slug_taken(&changes.slug, None) {
            return Err(RepositoryError::UniqueViolation(
                "categories_slug_key".to_string(),
            ));
        }
        state.check_parent(changes.parent_id)?;

        state.next_id += 1;
        let now = Utc::now();
        let category = Category {
            id: state.next_id,
            name: changes.name.clone(),
            slug: changes.slug.clone(),
            parent_id: changes.parent_id,
            created_at: now,
            updated_at: now,
        };
        state.categories.insert(category.id, category.clone());

        Ok(category)
    }

    async fn update(
        &self,
        id: i64,
        changes: &CategoryChanges,
    ) -> RepositoryResult<Option<Category>> {
        let mut state = self.state.write().await;

        if !state.categories.contains_key(&id) {
            return Ok(None);
        }
        if state.slug_taken(&changes.slug, Some(id)) {
            return Err(RepositoryError::UniqueViolation(
                "categories_slug_key".to_string(),
            ));
        }
        state.check_parent(changes.parent_id)?;

        let Some(category) = state.categories.get_mut(&id) else {
            return Ok(None);
        };
        category.name = changes.name.clone();
        category.slug = changes.slug.clone();
        category.parent_id = changes.parent_id;
        category.updated_at = Utc::now();

        Ok(Some(category.clone()))
    }

    async fn delete(&self, id: i64) -> RepositoryResult<bool> {
        let mut state = self.state.write().await;

        if !state.categories.contains_key(&id) {
            return Ok(false);
        }
        if state.categories.values().any(|c| c.parent_id == Some(id)) {
            return Err(RepositoryError::ForeignKeyViolation(
                "categories_parent_id_fkey".to_string(),
            ));
        }
        if state.product_counts.get(&id).copied().unwrap_or(0) > 0 {
            return Err(RepositoryError::ForeignKeyViolation(
                "products_category_id_fkey".to_string(),
            ));
        }

        state.categories.remove(&id);
        Ok(true)
    }

    async fn count_children(&self, id: i64) -> RepositoryResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .categories
            .values()
            .filter(|c| c.parent_id == Some(id))
            .count() as i64)
    }

    async fn count_products(&self, id: i64) -> RepositoryResult<i64> {
        let state = self.state.read().await;
        Ok(state.product_counts.get(&id).copied().unwrap_or(0))
    }

    async fn list_slugs(&self) -> RepositoryResult<Vec<String>> {
        let state = self.state.read().await;
        Ok(state.categories.values().map(|c| c.slug.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changes(name: &str, slug: &str, parent_id: Option<i64>) -> CategoryChanges {
        CategoryChanges {
            name: name.to_string(),
            slug: slug.to_string(),
            parent_id,
        }
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected_by_store() {
        let repo = InMemoryCategoryRepository::new();
        repo.insert(&changes("Books", "books", None)).await.unwrap();

        let err = repo
            .insert(&changes("Books again", "books", None))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn test_unknown_parent_rejected_by_store() {
        let repo = InMemoryCategoryRepository::new();
        let err = repo
            .insert(&changes("Orphan", "orphan", Some(99)))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn test_delete_restricted_by_references() {
        let repo = InMemoryCategoryRepository::new();
        let parent = repo.insert(&changes("Books", "books", None)).await.unwrap();
        let child = repo
            .insert(&changes("Fiction", "fiction", Some(parent.id)))
            .await
            .unwrap();

        assert!(matches!(
            repo.delete(parent.id).await,
            Err(RepositoryError::ForeignKeyViolation(_))
        ));

        repo.set_product_count(child.id, 3).await;
        assert!(matches!(
            repo.delete(child.id).await,
            Err(RepositoryError::ForeignKeyViolation(_))
        ));

        repo.set_product_count(child.id, 0).await;
        assert!(repo.delete(child.id).await.unwrap());
        assert!(repo.delete(parent.id).await.unwrap());
        assert!(!repo.delete(parent.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_ids_are_not_reused() {
        let repo = InMemoryCategoryRepository::new();
        let first = repo.insert(&changes("A", "a", None)).await.unwrap();
        repo.delete(first.id).await.unwrap();
        let second = repo.insert(&changes("B", "b", None)).await.unwrap();
        assert!(second.id > first.id);
    }
}
