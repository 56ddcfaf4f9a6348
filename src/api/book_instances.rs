//! Book instance (copy) pages

use axum::{
    extract::{Path, State},
    Json,
};

use super::{parse_id, removed, submitted, DeleteForm, Page};
use crate::{error::AppResult, models::book_instance::BookInstanceForm, AppState};

#[utoipa::path(
    get,
    path = "/catalog/bookinstances",
    tag = "bookinstances",
    responses((status = 200, description = "Copy list page"))
)]
pub async fn bookinstance_list(State(state): State<AppState>) -> AppResult<Page> {
    let page = state.services.book_instances.list().await?;
    Page::view("bookinstance_list", &page)
}

#[utoipa::path(
    get,
    path = "/catalog/bookinstance/{id}",
    tag = "bookinstances",
    params(("id" = String, Path, description = "Book instance ID")),
    responses(
        (status = 200, description = "Copy detail page"),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn bookinstance_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Page> {
    let id = parse_id(&id)?;
    let page = state.services.book_instances.detail(id).await?;
    Page::view("bookinstance_detail", &page)
}

#[utoipa::path(
    get,
    path = "/catalog/bookinstance/create",
    tag = "bookinstances",
    responses((status = 200, description = "Empty copy form with book and status choices"))
)]
pub async fn bookinstance_create_get(State(state): State<AppState>) -> AppResult<Page> {
    let page = state.services.book_instances.create_form().await?;
    Page::view("bookinstance_form", &page)
}

/// Register a copy of a book
#[utoipa::path(
    post,
    path = "/catalog/bookinstance/create",
    tag = "bookinstances",
    request_body = BookInstanceForm,
    responses(
        (status = 303, description = "Saved, redirect to the copy"),
        (status = 200, description = "Form redisplayed with errors")
    )
)]
pub async fn bookinstance_create_post(
    State(state): State<AppState>,
    Json(form): Json<BookInstanceForm>,
) -> AppResult<Page> {
    let outcome = state.services.book_instances.create(form).await?;
    submitted("bookinstance_form", outcome)
}

#[utoipa::path(
    get,
    path = "/catalog/bookinstance/{id}/update",
    tag = "bookinstances",
    params(("id" = String, Path, description = "Book instance ID")),
    responses(
        (status = 200, description = "Copy form with current values"),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn bookinstance_update_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Page> {
    let id = parse_id(&id)?;
    let page = state.services.book_instances.edit_form(id).await?;
    Page::view("bookinstance_form", &page)
}

#[utoipa::path(
    post,
    path = "/catalog/bookinstance/{id}/update",
    tag = "bookinstances",
    params(("id" = String, Path, description = "Book instance ID")),
    request_body = BookInstanceForm,
    responses(
        (status = 303, description = "Saved, redirect to the copy"),
        (status = 200, description = "Form redisplayed with errors"),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn bookinstance_update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<BookInstanceForm>,
) -> AppResult<Page> {
    let id = parse_id(&id)?;
    let outcome = state.services.book_instances.update(id, form).await?;
    submitted("bookinstance_form", outcome)
}

#[utoipa::path(
    get,
    path = "/catalog/bookinstance/{id}/delete",
    tag = "bookinstances",
    params(("id" = String, Path, description = "Book instance ID")),
    responses(
        (status = 200, description = "Delete confirmation"),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn bookinstance_delete_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Page> {
    let id = parse_id(&id)?;
    let page = state.services.book_instances.delete_form(id).await?;
    Page::view("bookinstance_delete", &page)
}

#[utoipa::path(
    post,
    path = "/catalog/bookinstance/{id}/delete",
    tag = "bookinstances",
    params(("id" = String, Path, description = "Book instance ID")),
    request_body = DeleteForm,
    responses(
        (status = 303, description = "Deleted (or already gone), redirect to the list"),
        (status = 400, description = "Missing or mismatched bookinstanceid", body = crate::error::ErrorResponse)
    )
)]
pub async fn bookinstance_delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<DeleteForm>,
) -> AppResult<Page> {
    let id = form.confirm("bookinstanceid", parse_id(&id)?)?;
    let outcome = state.services.book_instances.delete(id).await?;
    removed("bookinstance_delete", outcome)
}
