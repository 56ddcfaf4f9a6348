//! Author pages

use axum::{
    extract::{Path, State},
    Json,
};

use super::{parse_id, removed, submitted, DeleteForm, Page};
use crate::{error::AppResult, models::author::AuthorForm, AppState};

/// List authors by family name
#[utoipa::path(
    get,
    path = "/catalog/authors",
    tag = "authors",
    responses((status = 200, description = "Author list page"))
)]
pub async fn author_list(State(state): State<AppState>) -> AppResult<Page> {
    let page = state.services.authors.list().await?;
    Page::view("author_list", &page)
}

/// Author with the books it wrote
#[utoipa::path(
    get,
    path = "/catalog/author/{id}",
    tag = "authors",
    params(("id" = String, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author detail page"),
        (status = 400, description = "Malformed id", body = crate::error::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn author_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Page> {
    let id = parse_id(&id)?;
    let page = state.services.authors.detail(id).await?;
    Page::view("author_detail", &page)
}

#[utoipa::path(
    get,
    path = "/catalog/author/create",
    tag = "authors",
    responses((status = 200, description = "Empty author form"))
)]
pub async fn author_create_get(State(state): State<AppState>) -> AppResult<Page> {
    Page::view("author_form", &state.services.authors.create_form())
}

/// Create an author
#[utoipa::path(
    post,
    path = "/catalog/author/create",
    tag = "authors",
    request_body = AuthorForm,
    responses(
        (status = 303, description = "Saved, redirect to the author"),
        (status = 200, description = "Form redisplayed with errors")
    )
)]
pub async fn author_create_post(
    State(state): State<AppState>,
    Json(form): Json<AuthorForm>,
) -> AppResult<Page> {
    let outcome = state.services.authors.create(form).await?;
    submitted("author_form", outcome)
}

#[utoipa::path(
    get,
    path = "/catalog/author/{id}/update",
    tag = "authors",
    params(("id" = String, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author form with current values"),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn author_update_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Page> {
    let id = parse_id(&id)?;
    let page = state.services.authors.edit_form(id).await?;
    Page::view("author_form", &page)
}

/// Replace an author
#[utoipa::path(
    post,
    path = "/catalog/author/{id}/update",
    tag = "authors",
    params(("id" = String, Path, description = "Author ID")),
    request_body = AuthorForm,
    responses(
        (status = 303, description = "Saved, redirect to the author"),
        (status = 200, description = "Form redisplayed with errors"),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn author_update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<AuthorForm>,
) -> AppResult<Page> {
    let id = parse_id(&id)?;
    let outcome = state.services.authors.update(id, form).await?;
    submitted("author_form", outcome)
}

#[utoipa::path(
    get,
    path = "/catalog/author/{id}/delete",
    tag = "authors",
    params(("id" = String, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Delete confirmation listing the author's books"),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn author_delete_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Page> {
    let id = parse_id(&id)?;
    let page = state.services.authors.delete_form(id).await?;
    Page::view("author_delete", &page)
}

/// Delete an author that has no books
#[utoipa::path(
    post,
    path = "/catalog/author/{id}/delete",
    tag = "authors",
    params(("id" = String, Path, description = "Author ID")),
    request_body = DeleteForm,
    responses(
        (status = 303, description = "Deleted (or already gone), redirect to the list"),
        (status = 200, description = "Blocked by books, confirmation redisplayed"),
        (status = 400, description = "Missing or mismatched authorid", body = crate::error::ErrorResponse)
    )
)]
pub async fn author_delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<DeleteForm>,
) -> AppResult<Page> {
    let id = form.confirm("authorid", parse_id(&id)?)?;
    let outcome = state.services.authors.delete(id).await?;
    removed("author_delete", outcome)
}
