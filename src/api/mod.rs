//! HTTP handlers for the catalog pages
//!
//! Handlers only translate between HTTP and the services: parse the path id,
//! hand the JSON body over, and turn the service outcome into a [`Page`].

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod catalog;
pub mod genres;
pub mod health;
pub mod openapi;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    services::{validation::parse_record_id, Removal, Submission},
    AppState,
};

/// What a handler hands back: a view to render or a place to go next
#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    View {
        view: &'static str,
        title: String,
        context: Value,
    },
    Redirect(String),
}

impl Page {
    /// Render `context` under `view`, taking the title from its `title` field
    pub fn view<C: Serialize>(view: &'static str, context: &C) -> AppResult<Page> {
        let context = serde_json::to_value(context)
            .map_err(|e| AppError::Internal(format!("Cannot serialize {} context: {}", view, e)))?;
        let title = context
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(Page::View { view, title, context })
    }
}

#[derive(Serialize)]
struct ViewBody<'a> {
    view: &'a str,
    title: &'a str,
    context: &'a Value,
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        match self {
            Page::View { view, title, context } => (
                StatusCode::OK,
                Json(ViewBody {
                    view,
                    title: &title,
                    context: &context,
                }),
            )
                .into_response(),
            Page::Redirect(location) => Redirect::to(&location).into_response(),
        }
    }
}

/// Create/update outcome: redirect when saved, redisplay the form otherwise
pub fn submitted<C: Serialize>(view: &'static str, outcome: Submission<C>) -> AppResult<Page> {
    match outcome {
        Submission::Saved { url } => Ok(Page::Redirect(url)),
        Submission::Invalid(form) => Page::view(view, &form),
    }
}

/// Delete outcome: redirect when gone, show the confirmation page when blocked
pub fn removed<C: Serialize>(view: &'static str, outcome: Removal<C>) -> AppResult<Page> {
    match outcome {
        Removal::Removed { url } => Ok(Page::Redirect(url)),
        Removal::Blocked(page) => Page::view(view, &page),
    }
}

/// Parse a record id taken from the URL path
pub fn parse_id(raw: &str) -> AppResult<Uuid> {
    parse_record_id(raw).ok_or_else(|| AppError::BadRequest(format!("Invalid id: {}", raw)))
}

/// Delete confirmation body. Only the field named after the record type
/// being deleted is read.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DeleteForm {
    pub authorid: Option<String>,
    pub bookid: Option<String>,
    pub genreid: Option<String>,
    pub bookinstanceid: Option<String>,
}

impl DeleteForm {
    /// The id in `field` must be present and name the record in the path
    pub fn confirm(&self, field: &'static str, path_id: Uuid) -> AppResult<Uuid> {
        let value = match field {
            "authorid" => &self.authorid,
            "bookid" => &self.bookid,
            "genreid" => &self.genreid,
            _ => &self.bookinstanceid,
        };
        let raw = value
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .ok_or_else(|| AppError::BadRequest(format!("Missing {}", field)))?;
        let id = parse_id(raw)?;
        if id != path_id {
            return Err(AppError::BadRequest(format!(
                "{} {} does not match the requested record",
                field, id
            )));
        }
        Ok(id)
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let catalog = Router::new()
        .route("/", get(catalog::index))
        // Authors
        .route("/authors", get(authors::author_list))
        .route(
            "/author/create",
            get(authors::author_create_get).post(authors::author_create_post),
        )
        .route("/author/:id", get(authors::author_detail))
        .route(
            "/author/:id/update",
            get(authors::author_update_get).post(authors::author_update_post),
        )
        .route(
            "/author/:id/delete",
            get(authors::author_delete_get).post(authors::author_delete_post),
        )
        // Books
        .route("/books", get(books::book_list))
        .route(
            "/book/create",
            get(books::book_create_get).post(books::book_create_post),
        )
        .route("/book/:id", get(books::book_detail))
        .route(
            "/book/:id/update",
            get(books::book_update_get).post(books::book_update_post),
        )
        .route(
            "/book/:id/delete",
            get(books::book_delete_get).post(books::book_delete_post),
        )
        // Genres
        .route("/genres", get(genres::genre_list))
        .route(
            "/genre/create",
            get(genres::genre_create_get).post(genres::genre_create_post),
        )
        .route("/genre/:id", get(genres::genre_detail))
        .route(
            "/genre/:id/update",
            get(genres::genre_update_get).post(genres::genre_update_post),
        )
        .route(
            "/genre/:id/delete",
            get(genres::genre_delete_get).post(genres::genre_delete_post),
        )
        // Book instances
        .route("/bookinstances", get(book_instances::bookinstance_list))
        .route(
            "/bookinstance/create",
            get(book_instances::bookinstance_create_get)
                .post(book_instances::bookinstance_create_post),
        )
        .route("/bookinstance/:id", get(book_instances::bookinstance_detail))
        .route(
            "/bookinstance/:id/update",
            get(book_instances::bookinstance_update_get)
                .post(book_instances::bookinstance_update_post),
        )
        .route(
            "/bookinstance/:id/delete",
            get(book_instances::bookinstance_delete_get)
                .post(book_instances::bookinstance_delete_post),
        );

    let app = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .nest("/catalog", catalog)
        .with_state(state);

    app.merge(openapi::create_openapi_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
