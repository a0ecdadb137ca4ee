use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::categories::handlers;
use crate::features::categories::services::CategoryService;

/// Create routes for the categories feature
///
/// Note: every route requires an admin; mount behind the auth middleware.
/// Static segments (`main`) win over the `{category}` capture.
pub fn routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route(
            "/api/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route("/api/categories/main", get(handlers::list_main_categories))
        .route(
            "/api/categories/{category}",
            get(handlers::get_category)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
        .route(
            "/api/categories/{category}/subcategories",
            get(handlers::list_subcategories),
        )
        .route(
            "/api/products/category-list",
            get(handlers::list_category_slugs),
        )
        .with_state(service)
}
