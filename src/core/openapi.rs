use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::categories::{dtos as categories_dtos, handlers as categories_handlers};
use crate::shared::types::{ErrorResponse, MessageResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Categories (admin)
        categories_handlers::list_categories,
        categories_handlers::list_main_categories,
        categories_handlers::list_subcategories,
        categories_handlers::get_category,
        categories_handlers::create_category,
        categories_handlers::update_category,
        categories_handlers::delete_category,
        categories_handlers::list_category_slugs,
    ),
    components(
        schemas(
            ErrorResponse,
            MessageResponse,
            // Categories
            categories_dtos::CategoryInputDto,
            categories_dtos::CategoryResponseDto,
            categories_dtos::CategoryRecordDto,
            categories_dtos::CategoryRefDto,
            categories_dtos::CategoryDetailDto,
        )
    ),
    tags(
        (name = "categories", description = "Product category hierarchy (admin only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Catalog Admin API",
        version = "0.1.0",
        description = "API documentation for the catalog admin panel",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to the OpenAPI document
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
