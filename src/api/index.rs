//! Home page counters

use axum::{extract::State, Json};

use crate::{error::AppResult, services::stats::CatalogCounts};

use super::OptionalUser;

/// Catalog counters and the caller's visit count
#[utoipa::path(
    get,
    path = "/index",
    tag = "index",
    responses(
        (status = 200, description = "Catalog counters", body = CatalogCounts),
        (status = 401, description = "Invalid token", body = crate::error::ErrorResponse)
    )
)]
pub async fn index(
    State(state): State<crate::AppState>,
    OptionalUser(claims): OptionalUser,
) -> AppResult<Json<CatalogCounts>> {
    let counts = state
        .services
        .stats
        .index(claims.map(|c| c.user_id))
        .await?;
    Ok(Json(counts))
}
