//! Genre pages

use axum::{
    extract::{Path, State},
    Json,
};

use super::{parse_id, removed, submitted, DeleteForm, Page};
use crate::{error::AppResult, models::genre::GenreForm, AppState};

#[utoipa::path(
    get,
    path = "/catalog/genres",
    tag = "genres",
    responses((status = 200, description = "Genre list page"))
)]
pub async fn genre_list(State(state): State<AppState>) -> AppResult<Page> {
    let page = state.services.genres.list().await?;
    Page::view("genre_list", &page)
}

#[utoipa::path(
    get,
    path = "/catalog/genre/{id}",
    tag = "genres",
    params(("id" = String, Path, description = "Genre ID")),
    responses(
        (status = 200, description = "Genre with its books"),
        (status = 404, description = "Genre not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn genre_detail(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Page> {
    let id = parse_id(&id)?;
    let page = state.services.genres.detail(id).await?;
    Page::view("genre_detail", &page)
}

#[utoipa::path(
    get,
    path = "/catalog/genre/create",
    tag = "genres",
    responses((status = 200, description = "Empty genre form"))
)]
pub async fn genre_create_get(State(state): State<AppState>) -> AppResult<Page> {
    Page::view("genre_form", &state.services.genres.create_form())
}

/// Create a genre, or go to the existing one with the same name
#[utoipa::path(
    post,
    path = "/catalog/genre/create",
    tag = "genres",
    request_body = GenreForm,
    responses(
        (status = 303, description = "Saved or already present, redirect to the genre"),
        (status = 200, description = "Form redisplayed with errors")
    )
)]
pub async fn genre_create_post(
    State(state): State<AppState>,
    Json(form): Json<GenreForm>,
) -> AppResult<Page> {
    let outcome = state.services.genres.create(form).await?;
    submitted("genre_form", outcome)
}

#[utoipa::path(
    get,
    path = "/catalog/genre/{id}/update",
    tag = "genres",
    params(("id" = String, Path, description = "Genre ID")),
    responses(
        (status = 200, description = "Genre form with the current name"),
        (status = 404, description = "Genre not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn genre_update_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Page> {
    let id = parse_id(&id)?;
    let page = state.services.genres.edit_form(id).await?;
    Page::view("genre_form", &page)
}

#[utoipa::path(
    post,
    path = "/catalog/genre/{id}/update",
    tag = "genres",
    params(("id" = String, Path, description = "Genre ID")),
    request_body = GenreForm,
    responses(
        (status = 303, description = "Saved, redirect to the genre"),
        (status = 200, description = "Form redisplayed with errors"),
        (status = 404, description = "Genre not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn genre_update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<GenreForm>,
) -> AppResult<Page> {
    let id = parse_id(&id)?;
    let outcome = state.services.genres.update(id, form).await?;
    submitted("genre_form", outcome)
}

#[utoipa::path(
    get,
    path = "/catalog/genre/{id}/delete",
    tag = "genres",
    params(("id" = String, Path, description = "Genre ID")),
    responses(
        (status = 200, description = "Delete confirmation listing the genre's books"),
        (status = 404, description = "Genre not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn genre_delete_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Page> {
    let id = parse_id(&id)?;
    let page = state.services.genres.delete_form(id).await?;
    Page::view("genre_delete", &page)
}

/// Delete a genre no book is filed under
#[utoipa::path(
    post,
    path = "/catalog/genre/{id}/delete",
    tag = "genres",
    params(("id" = String, Path, description = "Genre ID")),
    request_body = DeleteForm,
    responses(
        (status = 303, description = "Deleted (or already gone), redirect to the list"),
        (status = 200, description = "Blocked by books, confirmation redisplayed"),
        (status = 400, description = "Missing or mismatched genreid", body = crate::error::ErrorResponse)
    )
)]
pub async fn genre_delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<DeleteForm>,
) -> AppResult<Page> {
    let id = form.confirm("genreid", parse_id(&id)?)?;
    let outcome = state.services.genres.delete(id).await?;
    removed("genre_delete", outcome)
}
