//! Business logic services

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod catalog;
pub mod genres;
pub mod guard;
pub mod join;
pub mod validation;

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    repository::Repository,
};

/// Outcome of a create or update submission
#[derive(Debug, Clone, PartialEq)]
pub enum Submission<C> {
    /// Stored; continue at the record's canonical URL
    Saved { url: String },
    /// Input rejected; show the form again
    Invalid(C),
}

/// Outcome of a delete submission
#[derive(Debug, Clone, PartialEq)]
pub enum Removal<C> {
    /// Gone (deleted now or earlier); continue at the listing
    Removed { url: String },
    /// Dependents still exist; show the confirmation page again
    Blocked(C),
}

/// Turn a missing record into a `NotFound` error
pub(crate) fn found<T>(record: Option<T>, what: &str, id: Uuid) -> AppResult<T> {
    record.ok_or_else(|| AppError::NotFound(format!("{} {} not found", what, id)))
}

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub authors: authors::AuthorsService,
    pub books: books::BooksService,
    pub genres: genres::GenresService,
    pub book_instances: book_instances::BookInstancesService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            authors: authors::AuthorsService::new(repository.clone()),
            books: books::BooksService::new(repository.clone()),
            genres: genres::GenresService::new(repository.clone()),
            book_instances: book_instances::BookInstancesService::new(repository),
        }
    }
}
