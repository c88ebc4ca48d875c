use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::presentation::handlers::categories::{
    BookCategoryDto, BookCategoryResponseDto, CategoryDto, CategoryPayloadDto,
    ListCategoriesQuery, ListCategoriesResponseDto, PaginationDto,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::handlers::categories::list_categories,
        crate::presentation::handlers::categories::create_category,
        crate::presentation::handlers::categories::get_category,
        crate::presentation::handlers::categories::update_category,
        crate::presentation::handlers::categories::delete_category,
        crate::presentation::handlers::categories::add_book_category,
        crate::presentation::handlers::categories::list_categories_for_book
    ),
    components(
        schemas(
            CategoryPayloadDto,
            BookCategoryDto,
            ListCategoriesQuery,
            CategoryDto,
            PaginationDto,
            ListCategoriesResponseDto,
            BookCategoryResponseDto
        )
    ),
    tags(
        (name = "categories", description = "Category taxonomy and book links")
    ),
    modifiers(&SecurityAddon)
)]
pub(crate) struct ApiDoc;

pub(crate) struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.take().unwrap_or_default();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("opaque")
                    .build(),
            ),
        );
        openapi.components = Some(components);
    }
}

#[cfg(test)]
mod tests {
    use utoipa::OpenApi;

    use super::ApiDoc;

    #[test]
    fn document_lists_every_category_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/api/v1/categories",
            "/api/v1/categories/{id}",
            "/api/v1/categories/books",
            "/api/v1/categories/books/{id}",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }

        let components = doc.components.expect("components must be present");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
