//! Catalog home summary

use serde::Serialize;

use super::join::ConcurrentJoin;
use crate::{
    error::AppResult,
    models::{
        author::AuthorFilter, book::BookFilter, book_instance::BookInstanceFilter,
        genre::GenreFilter, BookInstanceStatus,
    },
    repository::Repository,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub book_count: u64,
    pub book_instance_count: u64,
    pub book_instance_available_count: u64,
    pub author_count: u64,
    pub genre_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomePage {
    pub title: &'static str,
    pub data: CatalogCounts,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Five independent counts; any failure fails the whole page
    pub async fn summary(&self) -> AppResult<HomePage> {
        let repo = &self.repository;
        let (books, instances, available, authors, genres) = (
            repo.books.clone(),
            repo.book_instances.clone(),
            repo.book_instances.clone(),
            repo.authors.clone(),
            repo.genres.clone(),
        );

        let mut join = ConcurrentJoin::new("catalog_summary");
        let book_count = join.add("book_count", async move { books.count(&BookFilter::All).await });
        let book_instance_count = join.add("book_instance_count", async move {
            instances.count(&BookInstanceFilter::All).await
        });
        let book_instance_available_count = join.add("book_instance_available_count", async move {
            available
                .count(&BookInstanceFilter::Status(BookInstanceStatus::Available))
                .await
        });
        let author_count = join.add("author_count", async move { authors.count(&AuthorFilter::All).await });
        let genre_count = join.add("genre_count", async move { genres.count(&GenreFilter::All).await });
        let mut joined = join.run().await?;

        Ok(HomePage {
            title: "Local Library Home",
            data: CatalogCounts {
                book_count: joined.take(book_count)?,
                book_instance_count: joined.take(book_instance_count)?,
                book_instance_available_count: joined.take(book_instance_available_count)?,
                author_count: joined.take(author_count)?,
                genre_count: joined.take(genre_count)?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        error::AppError,
        models::Genre,
        repository::MockCollection,
    };

    #[tokio::test]
    async fn test_counts_on_empty_catalog() {
        let service = CatalogService::new(Repository::in_memory());
        let home = service.summary().await.unwrap();
        assert_eq!(home.data.book_count, 0);
        assert_eq!(home.data.genre_count, 0);
    }

    #[tokio::test]
    async fn test_one_failing_count_fails_the_page() {
        let mut genres = MockCollection::<Genre>::new();
        genres
            .expect_count()
            .returning(|_| Err(AppError::Backend("timeout".into())));
        let repository = Repository {
            genres: Arc::new(genres),
            ..Repository::in_memory()
        };

        let err = CatalogService::new(repository).summary().await.unwrap_err();
        assert!(matches!(err, AppError::Backend(_)));
    }
}
