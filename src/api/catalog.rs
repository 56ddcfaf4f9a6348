//! Catalog home page

use axum::extract::State;

use super::Page;
use crate::{error::AppResult, AppState};

/// Record counts for the catalog home page
#[utoipa::path(
    get,
    path = "/catalog",
    tag = "catalog",
    responses(
        (status = 200, description = "Home page with record counts"),
        (status = 500, description = "A count failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn index(State(state): State<AppState>) -> AppResult<Page> {
    let home = state.services.catalog.summary().await?;
    Page::view("index", &home)
}
