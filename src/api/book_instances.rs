//! Copy and loan endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::book_instance::{
        BookInstance, BookInstanceDetails, BorrowedQuery, CreateBookInstance, LendRequest,
    },
    services::loans::BORROWED_PER_PAGE,
};

use super::{AuthenticatedUser, BorrowedPage, PaginatedResponse};

/// Register a new copy of a book
#[utoipa::path(
    post,
    path = "/books/{id}/instances",
    tag = "book_instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = CreateBookInstance,
    responses(
        (status = 201, description = "Copy created", body = BookInstance),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<i32>,
    Json(instance): Json<CreateBookInstance>,
) -> AppResult<(StatusCode, Json<BookInstance>)> {
    claims.require_librarian()?;
    instance.validate()?;

    let created = state.services.catalog.create_instance(book_id, instance).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get a copy with its book title and author
#[utoipa::path(
    get,
    path = "/book-instances/{id}",
    tag = "book_instances",
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Copy details", body = BookInstanceDetails),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_instance(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstanceDetails>> {
    let instance = state.services.loans.get_instance(id).await?;
    Ok(Json(instance))
}

/// Copies on loan to the current user
#[utoipa::path(
    get,
    path = "/borrowed/mine",
    tag = "book_instances",
    security(("bearer_auth" = [])),
    params(
        ("page" = Option<i64>, Query, description = "Page number (default: 1)")
    ),
    responses(
        (status = 200, description = "Borrowed copies", body = BorrowedPage),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_my_borrowed(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BorrowedQuery>,
) -> AppResult<Json<BorrowedPage>> {
    let today = state.services.clock.today();
    let (items, total) = state
        .services
        .loans
        .list_borrowed_by(claims.user_id, query.page, today)
        .await?;
    Ok(Json(PaginatedResponse::new(items, total, query.page, BORROWED_PER_PAGE)))
}

/// Every copy on loan, for librarians
#[utoipa::path(
    get,
    path = "/borrowed",
    tag = "book_instances",
    security(("bearer_auth" = [])),
    params(
        ("page" = Option<i64>, Query, description = "Page number (default: 1)")
    ),
    responses(
        (status = 200, description = "Borrowed copies", body = BorrowedPage),
        (status = 403, description = "Librarian permission required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_all_borrowed(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BorrowedQuery>,
) -> AppResult<Json<BorrowedPage>> {
    claims.require_librarian()?;

    let today = state.services.clock.today();
    let (items, total) = state.services.loans.list_all_borrowed(query.page, today).await?;
    Ok(Json(PaginatedResponse::new(items, total, query.page, BORROWED_PER_PAGE)))
}

/// Lend an available copy to a reader
#[utoipa::path(
    post,
    path = "/book-instances/{id}/lend",
    tag = "book_instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    request_body = LendRequest,
    responses(
        (status = 200, description = "Copy lent", body = BookInstance),
        (status = 400, description = "Invalid due date", body = crate::error::ErrorResponse),
        (status = 404, description = "Copy or borrower not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Copy cannot be lent", body = crate::error::ErrorResponse)
    )
)]
pub async fn lend_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<LendRequest>,
) -> AppResult<Json<BookInstance>> {
    claims.require_librarian()?;

    let today = state.services.clock.today();
    let instance = state
        .services
        .loans
        .lend(id, request.borrower_id, request.due_back, today)
        .await?;
    Ok(Json(instance))
}

/// Mark an on-loan copy as returned
#[utoipa::path(
    post,
    path = "/book-instances/{id}/return",
    tag = "book_instances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Copy returned", body = BookInstance),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Copy is not on loan", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstance>> {
    claims.require_librarian()?;

    let instance = state.services.loans.return_instance(id).await?;
    Ok(Json(instance))
}
