//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{authors, book_instances, books, catalog, genres, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Folio API",
        version = "0.3.0",
        description = "Library catalog: authors, books, genres and copies"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Home
        catalog::index,
        // Authors
        authors::author_list,
        authors::author_detail,
        authors::author_create_get,
        authors::author_create_post,
        authors::author_update_get,
        authors::author_update_post,
        authors::author_delete_get,
        authors::author_delete_post,
        // Books
        books::book_list,
        books::book_detail,
        books::book_create_get,
        books::book_create_post,
        books::book_update_get,
        books::book_update_post,
        books::book_delete_get,
        books::book_delete_post,
        // Genres
        genres::genre_list,
        genres::genre_detail,
        genres::genre_create_get,
        genres::genre_create_post,
        genres::genre_update_get,
        genres::genre_update_post,
        genres::genre_delete_get,
        genres::genre_delete_post,
        // Book instances
        book_instances::bookinstance_list,
        book_instances::bookinstance_detail,
        book_instances::bookinstance_create_get,
        book_instances::bookinstance_create_post,
        book_instances::bookinstance_update_get,
        book_instances::bookinstance_update_post,
        book_instances::bookinstance_delete_get,
        book_instances::bookinstance_delete_post,
    ),
    components(
        schemas(
            crate::models::Author,
            crate::models::Book,
            crate::models::Genre,
            crate::models::BookInstance,
            crate::models::BookInstanceStatus,
            crate::models::author::AuthorForm,
            crate::models::book::BookForm,
            crate::models::genre::GenreForm,
            crate::models::book_instance::BookInstanceForm,
            crate::api::DeleteForm,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "catalog", description = "Catalog home"),
        (name = "authors", description = "Author pages"),
        (name = "books", description = "Book pages"),
        (name = "genres", description = "Genre pages"),
        (name = "bookinstances", description = "Book copy pages")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
