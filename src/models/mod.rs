//! Data models for the Folio catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;

use serde::Serialize;

// Re-export commonly used types
pub use author::{Author, AuthorView};
pub use book::Book;
pub use book_instance::{BookInstance, BookInstanceStatus};
pub use genre::{Genre, GenreOption};

/// Records reachable at a stable, id-derived path
pub trait CanonicalUrl {
    fn url(&self) -> String;
}

/// A record together with its canonical URL, for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Linked<T> {
    #[serde(flatten)]
    pub record: T,
    pub url: String,
}

impl<T: CanonicalUrl> From<T> for Linked<T> {
    fn from(record: T) -> Self {
        let url = record.url();
        Self { record, url }
    }
}

/// Wrap every record of a list with its URL
pub fn linked<T: CanonicalUrl>(records: Vec<T>) -> Vec<Linked<T>> {
    records.into_iter().map(Linked::from).collect()
}
