//! Folio library catalog server
//!
//! Authors, books, genres and book copies, kept in independent collections
//! and served as JSON pages. Referential integrity between collections is
//! enforced by the services, not by the store.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
