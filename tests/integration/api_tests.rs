//! HTTP round trips through the full router

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use folio_server::{api, repository::Repository, services::Services, AppConfig, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    api::router(AppState {
        config: Arc::new(AppConfig::default()),
        services: Arc::new(Services::new(Repository::in_memory())),
    })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to send request");
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|value| value.to_str().expect("Invalid Location header").to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Failed to parse response")
    };
    (status, location, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

#[tokio::test]
async fn test_health_check() {
    let app = app();
    let (status, _, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _, body) = send(&app, get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_author_lifecycle() {
    let app = app();

    let (status, location, _) = send(
        &app,
        post(
            "/catalog/author/create",
            json!({ "first_name": "Jane", "family_name": "Austen", "date_of_birth": "1775-12-16" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    let author_url = location.expect("No redirect location");
    let author_id = author_url.rsplit('/').next().unwrap().to_string();

    let (status, _, body) = send(&app, get(&author_url)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"], "author_detail");
    assert_eq!(body["title"], "Austen, Jane");
    assert_eq!(body["context"]["author"]["lifespan"], "1775-12-16 - ");

    // A book by the author blocks the delete
    let (status, book_url, _) = send(
        &app,
        post(
            "/catalog/book/create",
            json!({ "title": "Emma", "author": author_id, "summary": "Highbury", "isbn": "9780141439587" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    let book_url = book_url.expect("No redirect location");
    let book_id = book_url.rsplit('/').next().unwrap().to_string();

    let delete_author = format!("{}/delete", author_url);
    let (status, _, body) = send(&app, post(&delete_author, json!({ "authorid": author_id }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view"], "author_delete");
    assert_eq!(body["context"]["author_books"][0]["title"], "Emma");

    let (status, location, _) = send(
        &app,
        post(&format!("{}/delete", book_url), json!({ "bookid": book_id })),
    )
    .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/catalog/books"));

    let (status, location, _) = send(&app, post(&delete_author, json!({ "authorid": author_id }))).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/catalog/authors"));

    let (status, _, _) = send(&app, get(&author_url)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_with_mismatched_correlation_id() {
    let app = app();
    let (_, location, _) = send(&app, post("/catalog/genre/create", json!({ "name": "Poetry" }))).await;
    let genre_url = location.expect("No redirect location");

    let other = uuid::Uuid::new_v4().to_string();
    let (status, _, body) = send(
        &app,
        post(&format!("{}/delete", genre_url), json!({ "genreid": other })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadRequest");

    // Still there
    let (status, _, _) = send(&app, get(&genre_url)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_book_form_lists_choices() {
    let app = app();
    send(&app, post("/catalog/genre/create", json!({ "name": "Satire" }))).await;
    send(
        &app,
        post("/catalog/author/create", json!({ "first_name": "Jonathan", "family_name": "Swift" })),
    )
    .await;

    let (status, _, body) = send(&app, get("/catalog/book/create")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Create Book");
    assert_eq!(body["context"]["authors"][0]["name"], "Swift, Jonathan");
    assert_eq!(body["context"]["genres"][0]["checked"], false);
}

#[tokio::test]
async fn test_bookinstance_form_offers_every_status() {
    let app = app();
    let (status, _, body) = send(&app, get("/catalog/bookinstance/create")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["context"]["status_list"],
        json!(["Maintenance", "Available", "Loaned", "Reserved"])
    );
}
