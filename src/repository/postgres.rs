//! PostgreSQL collection backend
//!
//! One table per entity type. Every method is a single statement; no
//! transaction ever spans two tables.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::Collection;
use crate::{
    error::AppResult,
    models::{
        author::{AuthorData, AuthorFilter, AuthorSort},
        book::{BookData, BookFilter, BookSort},
        book_instance::{BookInstanceData, BookInstanceFilter, BookInstanceSort},
        genre::{GenreData, GenreFilter, GenreSort},
        Author, Book, BookInstance, Genre,
    },
};

async fn delete_row(pool: &Pool<Postgres>, table: &str, id: Uuid) -> AppResult<bool> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table))
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn count_rows(mut query: QueryBuilder<'_, Postgres>, pool: &Pool<Postgres>) -> AppResult<u64> {
    let count: i64 = query.build_query_scalar().fetch_one(pool).await?;
    Ok(count.max(0) as u64)
}

// ---------------------------------------------------------------------------
// Authors
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgAuthors {
    pool: Pool<Postgres>,
}

impl PgAuthors {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn author_query(select: &str, filter: &AuthorFilter) -> QueryBuilder<'static, Postgres> {
    let query = QueryBuilder::new(format!("{} FROM authors", select));
    match filter {
        AuthorFilter::All => {}
    }
    query
}

#[async_trait]
impl Collection<Author> for PgAuthors {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Author>> {
        let row = sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_many(&self, filter: &AuthorFilter, sort: Option<AuthorSort>) -> AppResult<Vec<Author>> {
        let mut query = author_query("SELECT *", filter);
        if let Some(AuthorSort::FamilyName) = sort {
            query.push(" ORDER BY family_name ASC");
        }
        let rows = query.build_query_as::<Author>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn count(&self, filter: &AuthorFilter) -> AppResult<u64> {
        count_rows(author_query("SELECT COUNT(*)", filter), &self.pool).await
    }

    async fn insert(&self, data: AuthorData) -> AppResult<Author> {
        let row = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (first_name, family_name, date_of_birth, date_of_death)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&data.first_name)
        .bind(&data.family_name)
        .bind(data.date_of_birth)
        .bind(data.date_of_death)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_by_id(&self, id: Uuid, data: AuthorData) -> AppResult<Option<Author>> {
        let row = sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors
            SET first_name = $2, family_name = $3, date_of_birth = $4, date_of_death = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.first_name)
        .bind(&data.family_name)
        .bind(data.date_of_birth)
        .bind(data.date_of_death)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<bool> {
        delete_row(&self.pool, "authors", id).await
    }
}

// ---------------------------------------------------------------------------
// Genres
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgGenres {
    pool: Pool<Postgres>,
}

impl PgGenres {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn genre_query(select: &str, filter: &GenreFilter) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!("{} FROM genres", select));
    match filter {
        GenreFilter::All => {}
        GenreFilter::Name(name) => {
            query.push(" WHERE name = ").push_bind(name.clone());
        }
        GenreFilter::Ids(ids) => {
            query.push(" WHERE id = ANY(").push_bind(ids.clone()).push(")");
        }
    }
    query
}

#[async_trait]
impl Collection<Genre> for PgGenres {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Genre>> {
        let row = sqlx::query_as::<_, Genre>("SELECT * FROM genres WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_many(&self, filter: &GenreFilter, sort: Option<GenreSort>) -> AppResult<Vec<Genre>> {
        let mut query = genre_query("SELECT *", filter);
        if let Some(GenreSort::Name) = sort {
            query.push(" ORDER BY name ASC");
        }
        let rows = query.build_query_as::<Genre>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn count(&self, filter: &GenreFilter) -> AppResult<u64> {
        count_rows(genre_query("SELECT COUNT(*)", filter), &self.pool).await
    }

    async fn insert(&self, data: GenreData) -> AppResult<Genre> {
        let row = sqlx::query_as::<_, Genre>("INSERT INTO genres (name) VALUES ($1) RETURNING *")
            .bind(&data.name)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_by_id(&self, id: Uuid, data: GenreData) -> AppResult<Option<Genre>> {
        let row = sqlx::query_as::<_, Genre>("UPDATE genres SET name = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(&data.name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<bool> {
        delete_row(&self.pool, "genres", id).await
    }
}

// ---------------------------------------------------------------------------
// Books
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgBooks {
    pool: Pool<Postgres>,
}

impl PgBooks {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn book_query(select: &str, filter: &BookFilter) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!("{} FROM books", select));
    match filter {
        BookFilter::All => {}
        BookFilter::Author(author_id) => {
            query.push(" WHERE author_id = ").push_bind(*author_id);
        }
        BookFilter::Genre(genre_id) => {
            query.push(" WHERE ").push_bind(*genre_id).push(" = ANY(genre_ids)");
        }
    }
    query
}

#[async_trait]
impl Collection<Book> for PgBooks {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_many(&self, filter: &BookFilter, sort: Option<BookSort>) -> AppResult<Vec<Book>> {
        let mut query = book_query("SELECT *", filter);
        if let Some(BookSort::Title) = sort {
            query.push(" ORDER BY title ASC");
        }
        let rows = query.build_query_as::<Book>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn count(&self, filter: &BookFilter) -> AppResult<u64> {
        count_rows(book_query("SELECT COUNT(*)", filter), &self.pool).await
    }

    async fn insert(&self, data: BookData) -> AppResult<Book> {
        let row = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author_id, summary, isbn, genre_ids)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(data.author_id)
        .bind(&data.summary)
        .bind(&data.isbn)
        .bind(&data.genre_ids)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_by_id(&self, id: Uuid, data: BookData) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $2, author_id = $3, summary = $4, isbn = $5, genre_ids = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.title)
        .bind(data.author_id)
        .bind(&data.summary)
        .bind(&data.isbn)
        .bind(&data.genre_ids)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<bool> {
        delete_row(&self.pool, "books", id).await
    }
}

// ---------------------------------------------------------------------------
// Book instances
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgBookInstances {
    pool: Pool<Postgres>,
}

impl PgBookInstances {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn book_instance_query(select: &str, filter: &BookInstanceFilter) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!("{} FROM book_instances", select));
    match filter {
        BookInstanceFilter::All => {}
        BookInstanceFilter::Book(book_id) => {
            query.push(" WHERE book_id = ").push_bind(*book_id);
        }
        BookInstanceFilter::Status(status) => {
            query.push(" WHERE status = ").push_bind(*status);
        }
    }
    query
}

#[async_trait]
impl Collection<BookInstance> for PgBookInstances {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<BookInstance>> {
        let row = sqlx::query_as::<_, BookInstance>("SELECT * FROM book_instances WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_many(
        &self,
        filter: &BookInstanceFilter,
        _sort: Option<BookInstanceSort>,
    ) -> AppResult<Vec<BookInstance>> {
        let mut query = book_instance_query("SELECT *", filter);
        let rows = query
            .build_query_as::<BookInstance>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count(&self, filter: &BookInstanceFilter) -> AppResult<u64> {
        count_rows(book_instance_query("SELECT COUNT(*)", filter), &self.pool).await
    }

    async fn insert(&self, data: BookInstanceData) -> AppResult<BookInstance> {
        let row = sqlx::query_as::<_, BookInstance>(
            r#"
            INSERT INTO book_instances (book_id, imprint, status, due_back)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(data.book_id)
        .bind(&data.imprint)
        .bind(data.status)
        .bind(data.due_back)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_by_id(&self, id: Uuid, data: BookInstanceData) -> AppResult<Option<BookInstance>> {
        let row = sqlx::query_as::<_, BookInstance>(
            r#"
            UPDATE book_instances
            SET book_id = $2, imprint = $3, status = $4, due_back = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.book_id)
        .bind(&data.imprint)
        .bind(data.status)
        .bind(data.due_back)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<bool> {
        delete_row(&self.pool, "book_instances", id).await
    }
}
