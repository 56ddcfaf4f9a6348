//! Book pages

use axum::{
    extract::{Path, State},
    Json,
};

use super::{parse_id, removed, submitted, DeleteForm, Page};
use crate::{error::AppResult, models::book::BookForm, AppState};

/// List books with their authors
#[utoipa::path(
    get,
    path = "/catalog/books",
    tag = "books",
    responses((status = 200, description = "Book list page"))
)]
pub async fn book_list(State(state): State<AppState>) -> AppResult<Page> {
    let page = state.services.books.list().await?;
    Page::view("book_list", &page)
}

/// Book with author, genres and copies
#[utoipa::path(
    get,
    path = "/catalog/book/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book detail page"),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn book_detail(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Page> {
    let id = parse_id(&id)?;
    let page = state.services.books.detail(id).await?;
    Page::view("book_detail", &page)
}

/// Empty book form with author and genre choices
#[utoipa::path(
    get,
    path = "/catalog/book/create",
    tag = "books",
    responses((status = 200, description = "Empty book form"))
)]
pub async fn book_create_get(State(state): State<AppState>) -> AppResult<Page> {
    let page = state.services.books.create_form().await?;
    Page::view("book_form", &page)
}

/// Create a book
#[utoipa::path(
    post,
    path = "/catalog/book/create",
    tag = "books",
    request_body = BookForm,
    responses(
        (status = 303, description = "Saved, redirect to the book"),
        (status = 200, description = "Form redisplayed with errors and genre selection")
    )
)]
pub async fn book_create_post(
    State(state): State<AppState>,
    Json(form): Json<BookForm>,
) -> AppResult<Page> {
    let outcome = state.services.books.create(form).await?;
    submitted("book_form", outcome)
}

#[utoipa::path(
    get,
    path = "/catalog/book/{id}/update",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book form with the current genres checked"),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn book_update_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Page> {
    let id = parse_id(&id)?;
    let page = state.services.books.edit_form(id).await?;
    Page::view("book_form", &page)
}

/// Replace a book
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/update",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    request_body = BookForm,
    responses(
        (status = 303, description = "Saved, redirect to the book"),
        (status = 200, description = "Form redisplayed with errors"),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn book_update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<BookForm>,
) -> AppResult<Page> {
    let id = parse_id(&id)?;
    let outcome = state.services.books.update(id, form).await?;
    submitted("book_form", outcome)
}

#[utoipa::path(
    get,
    path = "/catalog/book/{id}/delete",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Delete confirmation listing the copies"),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn book_delete_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Page> {
    let id = parse_id(&id)?;
    let page = state.services.books.delete_form(id).await?;
    Page::view("book_delete", &page)
}

/// Delete a book that has no copies
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/delete",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    request_body = DeleteForm,
    responses(
        (status = 303, description = "Deleted (or already gone), redirect to the list"),
        (status = 200, description = "Blocked by copies, confirmation redisplayed"),
        (status = 400, description = "Missing or mismatched bookid", body = crate::error::ErrorResponse)
    )
)]
pub async fn book_delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<DeleteForm>,
) -> AppResult<Page> {
    let id = form.confirm("bookid", parse_id(&id)?)?;
    let outcome = state.services.books.delete(id).await?;
    removed("book_delete", outcome)
}
