//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, authors, book_instances, books, genres, health, index, renewal};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Catalog API",
        version = "0.3.0",
        description = "Local library catalog REST API: books, authors, copies, loans and renewals",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Home
        index::index,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        // Genres
        genres::list_genres,
        genres::create_genre,
        // Copies and loans
        book_instances::create_instance,
        book_instances::get_instance,
        book_instances::list_my_borrowed,
        book_instances::list_all_borrowed,
        book_instances::lend_instance,
        book_instances::return_instance,
        // Renewal
        renewal::get_renewal_form,
        renewal::renew_instance,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::RegisterResponse,
            crate::models::user::User,
            crate::models::user::RegisterRequest,
            // Catalog
            crate::models::book::Book,
            crate::models::book::AuthorRef,
            crate::models::book::BookShort,
            crate::models::book::BookDetails,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::author::Author,
            crate::models::author::AuthorDetails,
            crate::models::author::CreateAuthor,
            crate::models::author::UpdateAuthor,
            crate::models::genre::Genre,
            crate::models::genre::CreateGenre,
            // Copies and loans
            crate::models::book_instance::LoanStatus,
            crate::models::book_instance::BookInstance,
            crate::models::book_instance::BookInstanceDetails,
            crate::models::book_instance::BorrowedInstance,
            crate::models::book_instance::CreateBookInstance,
            crate::models::book_instance::LendRequest,
            crate::models::book_instance::RenewalRequest,
            crate::models::book_instance::RenewalForm,
            crate::models::book_instance::RenewalResponse,
            // Pages
            crate::api::BookPage,
            crate::api::AuthorPage,
            crate::api::BorrowedPage,
            // Home
            crate::services::stats::CatalogCounts,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "index", description = "Home page counters"),
        (name = "auth", description = "Accounts and authentication"),
        (name = "books", description = "Book management"),
        (name = "authors", description = "Author management"),
        (name = "genres", description = "Genre management"),
        (name = "book_instances", description = "Copies and loans"),
        (name = "renewal", description = "Due date renewal by librarians")
    )
)]
pub struct ApiDoc;

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

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_renewal_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/book-instances/{id}/renew"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("RenewalForm"));
    }
}
