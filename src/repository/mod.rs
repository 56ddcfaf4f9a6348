//! Repository layer: one collection per entity type
//!
//! Every collection offers single-record operations only. Nothing here spans
//! two collections, so multi-record consistency is up to the services.

pub mod memory;
pub mod postgres;

use std::{cmp::Ordering, fmt::Debug, sync::Arc};

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Author, Book, BookInstance, Genre},
};

/// A record stored in its own collection under a store-assigned id
pub trait Entity: Clone + Debug + Send + Sync + 'static {
    /// Collection name, used in logs and error messages
    const COLLECTION: &'static str;

    /// User-supplied fields (everything except the id)
    type Data: Clone + Debug + Send + Sync + 'static;
    /// Selection understood by `find_many` and `count`
    type Filter: Clone + Debug + Send + Sync + 'static;
    /// Explicit ordering keys
    type Sort: Copy + Debug + Send + Sync + 'static;

    fn id(&self) -> Uuid;

    fn from_data(id: Uuid, data: Self::Data) -> Self;

    fn matches(&self, filter: &Self::Filter) -> bool;

    fn compare(&self, other: &Self, sort: Self::Sort) -> Ordering;
}

/// Per-entity store operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Collection<E: Entity>: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<E>>;

    /// Records matching `filter`, in store order unless `sort` is given
    async fn find_many(&self, filter: &E::Filter, sort: Option<E::Sort>) -> AppResult<Vec<E>>;

    async fn count(&self, filter: &E::Filter) -> AppResult<u64>;

    async fn insert(&self, data: E::Data) -> AppResult<E>;

    /// Full replace. `None` when no record has this id.
    async fn update_by_id(&self, id: Uuid, data: E::Data) -> AppResult<Option<E>>;

    /// `false` when no record had this id
    async fn delete_by_id(&self, id: Uuid) -> AppResult<bool>;
}

/// Main repository struct holding one collection per entity type
#[derive(Clone)]
pub struct Repository {
    pub authors: Arc<dyn Collection<Author>>,
    pub books: Arc<dyn Collection<Book>>,
    pub genres: Arc<dyn Collection<Genre>>,
    pub book_instances: Arc<dyn Collection<BookInstance>>,
}

impl Repository {
    /// Repository backed by process memory
    pub fn in_memory() -> Self {
        Self {
            authors: Arc::new(memory::MemoryCollection::<Author>::new()),
            books: Arc::new(memory::MemoryCollection::<Book>::new()),
            genres: Arc::new(memory::MemoryCollection::<Genre>::new()),
            book_instances: Arc::new(memory::MemoryCollection::<BookInstance>::new()),
        }
    }

    /// Repository backed by PostgreSQL tables
    pub fn postgres(pool: Pool<Postgres>) -> Self {
        Self {
            authors: Arc::new(postgres::PgAuthors::new(pool.clone())),
            books: Arc::new(postgres::PgBooks::new(pool.clone())),
            genres: Arc::new(postgres::PgGenres::new(pool.clone())),
            book_instances: Arc::new(postgres::PgBookInstances::new(pool)),
        }
    }
}
