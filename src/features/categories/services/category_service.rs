use std::collections::HashSet;
use std::sync::Arc;

use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::categories::dtos::{
    CategoryDetailDto, CategoryInputDto, CategoryRecordDto, CategoryRefDto, CategoryResponseDto,
};
use crate::features::categories::models::{Category, CategoryChanges};
use crate::features::categories::repositories::{CategoryRepository, RepositoryError};
use crate::shared::constants::MAX_CATEGORY_DEPTH;
use crate::shared::slug::{is_variant_of, slugify, with_suffix};

/// Convert a store failure into the error reported to the caller
fn handle_repo_error(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::UniqueViolation(constraint) => {
            tracing::warn!("Category write lost a slug race ({})", constraint);
            AppError::Conflict(
                "A category with this slug was created concurrently. Please retry.".to_string(),
            )
        }
        RepositoryError::ForeignKeyViolation(constraint) => {
            tracing::warn!("Category write violated {}", constraint);
            AppError::Conflict(
                "The category is referenced by other records or its parent no longer exists."
                    .to_string(),
            )
        }
        // Logged by AppError::into_response
        RepositoryError::Database(e) => AppError::Database(e),
    }
}

/// Parent foreign-key failures on insert/update mean the parent vanished
fn handle_write_error(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::ForeignKeyViolation(_) => {
            AppError::NotFound("Parent category not found".to_string())
        }
        other => handle_repo_error(other),
    }
}

/// Service for category operations
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>) -> Self {
        Self { repo }
    }

    /// List every category with its parent's slug
    pub async fn list(&self) -> Result<Vec<CategoryResponseDto>> {
        let categories = self
            .repo
            .list_with_parent_slug()
            .await
            .map_err(handle_repo_error)?;

        Ok(categories.into_iter().map(Into::into).collect())
    }

    /// List categories without a parent
    pub async fn list_main(&self) -> Result<Vec<CategoryRecordDto>> {
        let categories = self.repo.list_main().await.map_err(handle_repo_error)?;
        Ok(categories.into_iter().map(Into::into).collect())
    }

    /// List the direct children of the category identified by `parent_slug`
    pub async fn list_subcategories(&self, parent_slug: &str) -> Result<Vec<CategoryRecordDto>> {
        let parent = self.get_by_slug(parent_slug).await?;

        let children = self
            .repo
            .list_children(parent.id)
            .await
            .map_err(handle_repo_error)?;

        Ok(children.into_iter().map(Into::into).collect())
    }

    /// Get a category with its parent, children and product count
    pub async fn get(&self, id: i64) -> Result<CategoryDetailDto> {
        let category = self.find_by_id(id).await?;

        let parent = match category.parent_id {
            Some(parent_id) => self
                .repo
                .find_by_id(parent_id)
                .await
                .map_err(handle_repo_error)?
                .map(CategoryRefDto::from),
            None => None,
        };

        let children = self
            .repo
            .list_children(id)
            .await
            .map_err(handle_repo_error)?;

        let products_count = self
            .repo
            .count_products(id)
            .await
            .map_err(handle_repo_error)?;

        Ok(CategoryDetailDto {
            id: category.id,
            name: category.name,
            slug: category.slug,
            parent_id: category.parent_id,
            parent,
            children: children.into_iter().map(Into::into).collect(),
            products_count,
        })
    }

    /// Get a category by slug
    pub async fn get_by_slug(&self, slug: &str) -> Result<CategoryRecordDto> {
        self.find_by_slug(slug).await.map(Into::into)
    }

    /// Every category slug
    pub async fn list_slugs(&self) -> Result<Vec<String>> {
        self.repo.list_slugs().await.map_err(handle_repo_error)
    }

    /// Create a category
    pub async fn create(&self, dto: CategoryInputDto) -> Result<CategoryResponseDto> {
        let dto = Self::validate_input(dto)?;

        let parent_slug = match dto.parent_id {
            Some(parent_id) => Some(self.find_parent(parent_id).await?.slug),
            None => None,
        };

        let slug = self
            .resolve_slug(&dto.name, dto.slug.as_deref(), None)
            .await?;

        let category = self
            .repo
            .insert(&CategoryChanges {
                name: dto.name,
                slug,
                parent_id: dto.parent_id,
            })
            .await
            .map_err(handle_write_error)?;

        tracing::info!(
            "Category created: id={}, slug={}, parent_id={:?}",
            category.id,
            category.slug,
            category.parent_id
        );

        Ok(CategoryResponseDto::from_category(category, parent_slug))
    }

    /// Update a category's name, slug and parent
    pub async fn update(&self, id: i64, dto: CategoryInputDto) -> Result<CategoryResponseDto> {
        let current = self.find_by_id(id).await?;
        let dto = Self::validate_input(dto)?;

        let parent_slug = match dto.parent_id {
            Some(parent_id) if parent_id == id => {
                return Err(AppError::Validation(
                    "A category cannot be its own parent.".to_string(),
                ));
            }
            Some(parent_id) => {
                let parent = self.find_parent(parent_id).await?;
                self.ensure_not_descendant(id, &parent).await?;
                Some(parent.slug)
            }
            None => None,
        };

        let slug = self
            .resolve_slug(&dto.name, dto.slug.as_deref(), Some(&current))
            .await?;

        let category = self
            .repo
            .update(
                id,
                &CategoryChanges {
                    name: dto.name,
                    slug,
                    parent_id: dto.parent_id,
                },
            )
            .await
            .map_err(handle_write_error)?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;

        tracing::info!(
            "Category updated: id={}, slug={}, parent_id={:?}",
            category.id,
            category.slug,
            category.parent_id
        );

        Ok(CategoryResponseDto::from_category(category, parent_slug))
    }

    /// Delete a category that has no products and no subcategories
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.find_by_id(id).await?;

        let products_count = self
            .repo
            .count_products(id)
            .await
            .map_err(handle_repo_error)?;
        if products_count > 0 {
            return Err(AppError::DeleteBlocked {
                message: "Cannot delete category with associated products".to_string(),
                products_count: Some(products_count),
                children_count: None,
            });
        }

        let children_count = self
            .repo
            .count_children(id)
            .await
            .map_err(handle_repo_error)?;
        if children_count > 0 {
            return Err(AppError::DeleteBlocked {
                message: "Cannot delete category with subcategories".to_string(),
                products_count: None,
                children_count: Some(children_count),
            });
        }

        let deleted = self.repo.delete(id).await.map_err(handle_repo_error)?;
        if !deleted {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }

        tracing::info!("Category deleted: id={}", id);
        Ok(())
    }

    fn validate_input(dto: CategoryInputDto) -> Result<CategoryInputDto> {
        let dto = dto.normalized();
        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        Ok(dto)
    }

    async fn find_by_id(&self, id: i64) -> Result<Category> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(handle_repo_error)?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Category> {
        self.repo
            .find_by_slug(slug)
            .await
            .map_err(handle_repo_error)?
            .ok_or_else(|| AppError::NotFound(format!("Category '{}' not found", slug)))
    }

    async fn find_parent(&self, parent_id: i64) -> Result<Category> {
        self.repo
            .find_by_id(parent_id)
            .await
            .map_err(handle_repo_error)?
            .ok_or_else(|| AppError::NotFound(format!("Parent category {} not found", parent_id)))
    }

    /// Reject a new parent that sits below `id` in the hierarchy
    async fn ensure_not_descendant(&self, id: i64, parent: &Category) -> Result<()> {
        let mut visited = HashSet::new();
        let mut cursor = parent.parent_id;

        while let Some(ancestor_id) = cursor {
            if ancestor_id == id {
                return Err(AppError::Validation(
                    "A category cannot be moved under one of its own subcategories.".to_string(),
                ));
            }
            if !visited.insert(ancestor_id) || visited.len() > MAX_CATEGORY_DEPTH {
                break;
            }
            cursor = self
                .repo
                .find_by_id(ancestor_id)
                .await
                .map_err(handle_repo_error)?
                .and_then(|c| c.parent_id);
        }

        Ok(())
    }

    /// Pick the slug to store.
    ///
    /// A requested slug is kept verbatim and must be free. A derived slug
    /// gets `-1`, `-2`, ... appended until free. `current` is the record
    /// being updated; it never collides with itself and keeps its stored
    /// slug while its name still derives the same base.
    async fn resolve_slug(
        &self,
        name: &str,
        requested: Option<&str>,
        current: Option<&Category>,
    ) -> Result<String> {
        let excluding_id = current.map(|c| c.id);

        if let Some(slug) = requested {
            let taken = self
                .repo
                .slug_exists(slug, excluding_id)
                .await
                .map_err(handle_repo_error)?;
            if taken {
                return Err(AppError::Validation(
                    "The slug has already been taken.".to_string(),
                ));
            }
            return Ok(slug.to_string());
        }

        let base = slugify(name);
        if base.is_empty() {
            return Err(AppError::Validation(
                "The name must contain at least one letter or digit to derive a slug.".to_string(),
            ));
        }

        // Re-saving under the same name keeps whatever suffix was assigned
        if let Some(current) = current.filter(|c| is_variant_of(&c.slug, &base)) {
            return Ok(current.slug.clone());
        }

        let mut candidate = base.clone();
        let mut attempt = 0;
        while self
            .repo
            .slug_exists(&candidate, excluding_id)
            .await
            .map_err(handle_repo_error)?
        {
            attempt += 1;
            candidate = with_suffix(&base, attempt);
        }

        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::categories::repositories::InMemoryCategoryRepository;
    use crate::shared::validation::SLUG_REGEX;
    use fake::faker::company::en::CompanyName;
    use fake::Fake;
    use tokio_test::{assert_err, assert_ok};

    fn setup() -> (Arc<InMemoryCategoryRepository>, CategoryService) {
        let repo = Arc::new(InMemoryCategoryRepository::new());
        let service = CategoryService::new(repo.clone());
        (repo, service)
    }

    fn input(name: &str, slug: Option<&str>, parent_id: Option<i64>) -> CategoryInputDto {
        CategoryInputDto {
            name: name.to_string(),
            slug: slug.map(str::to_string),
            parent_id,
        }
    }

    async fn create(service: &CategoryService, name: &str, parent_id: Option<i64>) -> CategoryResponseDto {
        service.create(input(name, None, parent_id)).await.unwrap()
    }

    #[tokio::test]
    async fn test_electronics_scenario() {
        let (_, service) = setup();

        let electronics = create(&service, "Electronics", None).await;
        assert_eq!(electronics.name, "Electronics");
        assert_eq!(electronics.slug, "electronics");
        assert_eq!(electronics.parent_id, None);
        assert_eq!(electronics.parent_slug, None);

        let duplicate = create(&service, "Electronics", None).await;
        assert_eq!(duplicate.slug, "electronics-1");

        let phones = create(&service, "Phones", Some(electronics.id)).await;
        assert_eq!(phones.parent_slug.as_deref(), Some("electronics"));

        let subcategories = service.list_subcategories("electronics").await.unwrap();
        assert_eq!(subcategories.len(), 1);
        assert_eq!(subcategories[0].name, "Phones");

        let err = service.delete(electronics.id).await.unwrap_err();
        match err {
            AppError::DeleteBlocked {
                children_count,
                products_count,
                ..
            } => {
                assert_eq!(children_count, Some(1));
                assert_eq!(products_count, None);
            }
            other => panic!("expected DeleteBlocked, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_suffixes_are_monotonic_and_gap_free() {
        let (_, service) = setup();

        let mut slugs = Vec::new();
        for name in ["Home & Garden", "home garden", "HOME--GARDEN!", "  Home/Garden "] {
            slugs.push(create(&service, name, None).await.slug);
        }

        assert_eq!(
            slugs,
            vec!["home-garden", "home-garden-1", "home-garden-2", "home-garden-3"]
        );
    }

    #[tokio::test]
    async fn test_derived_slugs_match_pattern() {
        let (_, service) = setup();

        for _ in 0..50 {
            let name: String = CompanyName().fake();
            let created = create(&service, &name, None).await;
            assert!(
                SLUG_REGEX.is_match(&created.slug),
                "invalid slug {:?} for {:?}",
                created.slug,
                name
            );
            assert!(created.slug.starts_with(&slugify(&name)));
        }
    }

    #[tokio::test]
    async fn test_create_rejects_blank_and_unsluggable_names() {
        let (_, service) = setup();

        let err = service.create(input("   ", None, None)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service.create(input("&&&", None, None)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // An explicit slug makes a symbol-only name acceptable
        let created = assert_ok!(service.create(input("&&&", Some("misc"), None)).await);
        assert_eq!(created.slug, "misc");
    }

    #[tokio::test]
    async fn test_create_with_explicit_slug() {
        let (_, service) = setup();

        let created = service
            .create(input("Sports & Outdoors", Some("sports"), None))
            .await
            .unwrap();
        assert_eq!(created.slug, "sports");

        let err = service
            .create(input("Sport", Some("sports"), None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service
            .create(input("Sport", Some("Sports Gear"), None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_with_unknown_parent() {
        let (repo, service) = setup();

        let err = service
            .create(input("Phones", None, Some(42)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(repo.list_slugs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_slug_race_surfaces_as_conflict() {
        let (repo, service) = setup();
        create(&service, "Books", None).await;

        repo.use_stale_slug_checks();
        let err = service
            .create(input("Books", None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(repo.list_slugs().await.unwrap(), vec!["books".to_string()]);
    }

    #[tokio::test]
    async fn test_update_keeping_slug_does_not_suffix() {
        let (repo, service) = setup();
        let books = create(&service, "Books", None).await;
        create(&service, "Books", None).await; // books-1

        let updated = service
            .update(books.id, input("Printed Books", Some("books"), None))
            .await
            .unwrap();
        assert_eq!(updated.name, "Printed Books");
        assert_eq!(updated.slug, "books");

        // Same name, no slug: the derived slug equals the stored one
        let updated = service
            .update(books.id, input("Books", None, None))
            .await
            .unwrap();
        assert_eq!(updated.slug, "books");

        let stored = repo.find_by_id(books.id).await.unwrap().unwrap();
        assert_eq!(stored.slug, "books");
    }

    #[tokio::test]
    async fn test_update_of_suffixed_record_is_stable() {
        let (_, service) = setup();
        create(&service, "Books", None).await;
        let second = create(&service, "Books", None).await;
        assert_eq!(second.slug, "books-1");

        let updated = service
            .update(second.id, input("Books", None, None))
            .await
            .unwrap();
        assert_eq!(updated.slug, "books-1");
    }

    #[tokio::test]
    async fn test_resave_keeps_suffix_when_lower_suffix_is_free() {
        let (_, service) = setup();
        create(&service, "Books", None).await;
        let second = create(&service, "Books", None).await;
        let third = create(&service, "Books", None).await;
        assert_eq!(third.slug, "books-2");

        // Frees "books-1", which the suffix loop would otherwise pick
        assert_ok!(service.delete(second.id).await);

        let resaved = service
            .update(third.id, input("Books", None, None))
            .await
            .unwrap();
        assert_eq!(resaved.slug, "books-2");

        let renamed = service
            .update(third.id, input("Books!", None, None))
            .await
            .unwrap();
        assert_eq!(renamed.slug, "books-2");
    }

    #[tokio::test]
    async fn test_long_names_keep_slugs_within_column() {
        let (repo, service) = setup();
        let name = "a".repeat(255);

        let first = create(&service, &name, None).await;
        let second = create(&service, &name, None).await;
        assert_eq!(first.slug.len(), 255);
        assert!(second.slug.len() <= 255, "slug length {}", second.slug.len());
        assert!(second.slug.ends_with("-1"));
        assert!(SLUG_REGEX.is_match(&second.slug));

        let resaved = service
            .update(second.id, input(&name, None, None))
            .await
            .unwrap();
        assert_eq!(resaved.slug, second.slug);
        assert_eq!(repo.list_slugs().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_rename_rederives_slug() {
        let (_, service) = setup();
        let category = create(&service, "Gadgets", None).await;
        create(&service, "Toys", None).await;

        let updated = service
            .update(category.id, input("Toys", None, None))
            .await
            .unwrap();
        assert_eq!(updated.slug, "toys-1");
    }

    #[tokio::test]
    async fn test_update_rejects_slug_of_another_category() {
        let (_, service) = setup();
        let books = create(&service, "Books", None).await;
        create(&service, "Music", None).await;

        let err = service
            .update(books.id, input("Books", Some("music"), None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_rejects_self_parent() {
        let (repo, service) = setup();
        let books = create(&service, "Books", None).await;
        let before = repo.find_by_id(books.id).await.unwrap().unwrap();

        let err = service
            .update(books.id, input("Renamed", None, Some(books.id)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let after = repo.find_by_id(books.id).await.unwrap().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_update_rejects_cycle_through_descendant() {
        let (_, service) = setup();
        let books = create(&service, "Books", None).await;
        let fiction = create(&service, "Fiction", Some(books.id)).await;
        let fantasy = create(&service, "Fantasy", Some(fiction.id)).await;

        let err = service
            .update(books.id, input("Books", None, Some(fantasy.id)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // Moving a leaf under another branch is fine
        let music = create(&service, "Music", None).await;
        let moved = service
            .update(fantasy.id, input("Fantasy", None, Some(music.id)))
            .await
            .unwrap();
        assert_eq!(moved.parent_slug.as_deref(), Some("music"));
    }

    #[tokio::test]
    async fn test_update_not_found_and_unknown_parent() {
        let (_, service) = setup();
        let err = service
            .update(7, input("Ghost", None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let books = create(&service, "Books", None).await;
        let err = service
            .update(books.id, input("Books", None, Some(999)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_can_detach_from_parent() {
        let (_, service) = setup();
        let books = create(&service, "Books", None).await;
        let fiction = create(&service, "Fiction", Some(books.id)).await;

        let updated = service
            .update(fiction.id, input("Fiction", None, None))
            .await
            .unwrap();
        assert_eq!(updated.parent_id, None);
        assert_eq!(updated.parent_slug, None);
        assert_eq!(service.list_main().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_blocked_by_products() {
        let (repo, service) = setup();
        let books = create(&service, "Books", None).await;
        create(&service, "Fiction", Some(books.id)).await;
        repo.set_product_count(books.id, 3).await;

        let err = service.delete(books.id).await.unwrap_err();
        match err {
            AppError::DeleteBlocked {
                products_count,
                children_count,
                ..
            } => {
                // Products are reported first even when children also exist
                assert_eq!(products_count, Some(3));
                assert_eq!(children_count, None);
            }
            other => panic!("expected DeleteBlocked, got {:?}", other),
        }
        assert!(repo.find_by_id(books.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_blocked_by_children_reports_true_count() {
        let (repo, service) = setup();
        let books = create(&service, "Books", None).await;
        for name in ["Fiction", "Non-Fiction", "Comics"] {
            create(&service, name, Some(books.id)).await;
        }

        let err = service.delete(books.id).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::DeleteBlocked {
                children_count: Some(3),
                ..
            }
        ));
        assert!(repo.find_by_id(books.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_removes_unreferenced_category() {
        let (repo, service) = setup();
        let books = create(&service, "Books", None).await;

        assert_ok!(service.delete(books.id).await);
        assert!(repo.find_by_id(books.id).await.unwrap().is_none());

        let err = assert_err!(service.delete(books.id).await);
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_detail() {
        let (repo, service) = setup();
        let electronics = create(&service, "Electronics", None).await;
        let phones = create(&service, "Phones", Some(electronics.id)).await;
        create(&service, "Laptops", Some(electronics.id)).await;
        repo.set_product_count(electronics.id, 5).await;

        let detail = service.get(electronics.id).await.unwrap();
        assert_eq!(detail.parent, None);
        assert_eq!(detail.products_count, 5);
        let child_slugs: Vec<&str> = detail.children.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(child_slugs, vec!["phones", "laptops"]);

        let detail = service.get(phones.id).await.unwrap();
        let parent = detail.parent.unwrap();
        assert_eq!(parent.id, electronics.id);
        assert_eq!(parent.slug, "electronics");
        assert!(detail.children.is_empty());
        assert_eq!(detail.products_count, 0);

        assert!(matches!(
            service.get(999).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_listings() {
        let (_, service) = setup();
        let books = create(&service, "Books", None).await;
        create(&service, "Fiction", Some(books.id)).await;
        create(&service, "Music", None).await;

        let all = service.list().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].slug, "fiction");
        assert_eq!(all[1].parent_slug.as_deref(), Some("books"));
        assert_eq!(all[0].parent_slug, None);

        let main: Vec<String> = service
            .list_main()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.slug)
            .collect();
        assert_eq!(main, vec!["books", "music"]);

        assert!(service.list_subcategories("music").await.unwrap().is_empty());
        assert!(matches!(
            service.list_subcategories("nope").await.unwrap_err(),
            AppError::NotFound(_)
        ));

        assert_eq!(
            service.list_slugs().await.unwrap(),
            vec!["books", "fiction", "music"]
        );
        assert_eq!(service.get_by_slug("fiction").await.unwrap().parent_id, Some(books.id));
        assert!(service.get_by_slug("nope").await.is_err());
    }
}
