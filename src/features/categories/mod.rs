//! Category hierarchy management for the admin panel.
//!
//! Categories form a parent/child hierarchy keyed by id. Slugs are unique
//! across the table, and a category can only be deleted once no product and
//! no subcategory references it.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Auth | Description |
//! |--------|----------|------|-------------|
//! | GET | `/api/categories` | Admin | All categories with parent slug |
//! | GET | `/api/categories/main` | Admin | Categories without a parent |
//! | GET | `/api/categories/{slug}/subcategories` | Admin | Children of a category |
//! | GET | `/api/categories/{id}` | Admin | Category with parent, children and product count |
//! | POST | `/api/categories` | Admin | Create category |
//! | PUT | `/api/categories/{id}` | Admin | Update category |
//! | DELETE | `/api/categories/{id}` | Admin | Delete unreferenced category |
//! | GET | `/api/products/category-list` | Admin | All category slugs |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use repositories::PgCategoryRepository;
pub use services::CategoryService;
