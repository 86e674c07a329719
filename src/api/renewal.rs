//! Librarian renewal of an on-loan copy

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book_instance::{RenewalForm, RenewalRequest, RenewalResponse},
};

use super::AuthenticatedUser;

/// Open the renewal form with a proposed date three weeks ahead
#[utoipa::path(
    get,
    path = "/book-instances/{id}/renew",
    tag = "renewal",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Renewal form", body = RenewalForm),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Librarian permission required", body = crate::error::ErrorResponse),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Copy is not on loan", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_renewal_form(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RenewalForm>> {
    claims.require_librarian()?;

    let today = state.services.clock.today();
    let form = state.services.renewal.renewal_form(id, today).await?;
    Ok(Json(form))
}

/// Submit a new due-back date
///
/// A rejected date answers 400 with the form re-displayed, carrying the
/// submitted date and the error message.
#[utoipa::path(
    post,
    path = "/book-instances/{id}/renew",
    tag = "renewal",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    request_body = RenewalRequest,
    responses(
        (status = 200, description = "Due date updated", body = RenewalResponse),
        (status = 400, description = "Date rejected, form re-displayed", body = RenewalForm),
        (status = 403, description = "Librarian permission required", body = crate::error::ErrorResponse),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Copy is not on loan", body = crate::error::ErrorResponse)
    )
)]
pub async fn renew_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<RenewalRequest>,
) -> AppResult<Response> {
    claims.require_librarian()?;

    let today = state.services.clock.today();
    match state
        .services
        .renewal
        .renew(id, request.renewal_date, today)
        .await
    {
        Ok(renewal) => Ok(Json(RenewalResponse {
            book_instance: renewal.book_instance,
            message: renewal.message,
        })
        .into_response()),
        Err(AppError::InvalidRenewalDate(e)) => {
            tracing::debug!(instance_id = %id, reason = e.kind(), "Renewal date rejected");
            let form = state
                .services
                .renewal
                .rejected_form(id, request.renewal_date, &e)
                .await?;
            Ok((StatusCode::BAD_REQUEST, Json(form)).into_response())
        }
        Err(e) => Err(e),
    }
}
