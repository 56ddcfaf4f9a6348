//! Book pages and mutations, including the genre multi-select

use serde::Serialize;
use uuid::Uuid;

use super::{
    found,
    guard::{GuardDecision, IntegrityGuard},
    join::ConcurrentJoin,
    validation::{check, Checked, FieldError},
    Removal, Submission,
};
use crate::{
    error::AppResult,
    models::{
        author::{AuthorFilter, AuthorSort},
        book::{BookData, BookFilter, BookForm, BookInput},
        book_instance::BookInstanceFilter,
        genre::{mark_selected, GenreFilter, GenreSort},
        linked, Author, AuthorView, Book, BookInstance, CanonicalUrl, Genre, GenreOption, Linked,
    },
    repository::Repository,
};

pub const BOOKS_URL: &str = "/catalog/books";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookListEntry {
    #[serde(flatten)]
    pub book: Linked<Book>,
    /// `None` when the referenced author no longer exists
    pub author: Option<AuthorView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookListPage {
    pub title: &'static str,
    pub book_list: Vec<BookListEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookDetailPage {
    pub title: String,
    pub book: Linked<Book>,
    pub author: Option<AuthorView>,
    pub genres: Vec<Linked<Genre>>,
    pub book_instances: Vec<Linked<BookInstance>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookFormPage {
    pub title: &'static str,
    pub book_id: Option<Uuid>,
    pub book: Option<BookInput>,
    pub authors: Vec<AuthorView>,
    pub genres: Vec<GenreOption>,
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookDeletePage {
    pub title: &'static str,
    pub book: Linked<Book>,
    pub book_instances: Vec<Linked<BookInstance>>,
}

impl BookDeletePage {
    fn new(book: Book, instances: Vec<BookInstance>) -> Self {
        Self {
            title: "Delete Book",
            book: book.into(),
            book_instances: linked(instances),
        }
    }
}

fn form_title(id: Option<Uuid>) -> &'static str {
    if id.is_some() {
        "Update Book"
    } else {
        "Create Book"
    }
}

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
    guard: IntegrityGuard<Book, BookInstance>,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        let guard = IntegrityGuard::new(
            repository.books.clone(),
            repository.book_instances.clone(),
            BookInstanceFilter::Book,
        );
        Self { repository, guard }
    }

    /// Every book with its author resolved
    pub async fn list(&self) -> AppResult<BookListPage> {
        let books = self.repository.books.clone();
        let authors = self.repository.authors.clone();

        let mut join = ConcurrentJoin::new("book_list");
        let book_list = join.add("books", async move {
            books.find_many(&BookFilter::All, None).await
        });
        let author_list = join.add("authors", async move {
            authors.find_many(&AuthorFilter::All, None).await
        });
        let mut joined = join.run().await?;
        let books = joined.take(book_list)?;
        let authors = joined.take(author_list)?;

        let book_list = books
            .into_iter()
            .map(|book| BookListEntry {
                author: authors
                    .iter()
                    .find(|author| author.id == book.author_id)
                    .cloned()
                    .map(AuthorView::from),
                book: book.into(),
            })
            .collect();
        Ok(BookListPage {
            title: "Book List",
            book_list,
        })
    }

    /// Book with its author, genres and copies
    pub async fn detail(&self, id: Uuid) -> AppResult<BookDetailPage> {
        let inspected = self.guard.inspect(id).await?;
        let book = found(inspected.entity, "Book", id)?;

        let authors = self.repository.authors.clone();
        let genres = self.repository.genres.clone();
        let author_id = book.author_id;
        let genre_ids = book.genre_ids.clone();

        let mut join = ConcurrentJoin::new("book_detail");
        let author = join.add("author", async move { authors.find_by_id(author_id).await });
        let book_genres = join.add("genres", async move {
            genres.find_many(&GenreFilter::Ids(genre_ids), None).await
        });
        let mut joined = join.run().await?;

        Ok(BookDetailPage {
            title: book.title.clone(),
            author: joined.take(author)?.map(AuthorView::from),
            genres: linked(joined.take(book_genres)?),
            book_instances: linked(inspected.dependents),
            book: book.into(),
        })
    }

    pub async fn create_form(&self) -> AppResult<BookFormPage> {
        let (authors, genres) = self.form_choices().await?;
        Ok(BookFormPage {
            title: "Create Book",
            book_id: None,
            book: None,
            authors: authors.into_iter().map(AuthorView::from).collect(),
            genres: mark_selected(&genres, &[]),
            errors: Vec::new(),
        })
    }

    pub async fn create(&self, form: BookForm) -> AppResult<Submission<BookFormPage>> {
        self.save(None, form).await
    }

    /// Update form with the book's current genres checked
    pub async fn edit_form(&self, id: Uuid) -> AppResult<BookFormPage> {
        let books = self.repository.books.clone();
        let authors = self.repository.authors.clone();
        let genres = self.repository.genres.clone();

        let mut join = ConcurrentJoin::new("book_edit_form");
        let book = join.add("book", async move { books.find_by_id(id).await });
        let author_list = join.add("authors", async move {
            authors
                .find_many(&AuthorFilter::All, Some(AuthorSort::FamilyName))
                .await
        });
        let genre_list = join.add("genres", async move {
            genres.find_many(&GenreFilter::All, Some(GenreSort::Name)).await
        });
        let mut joined = join.run().await?;

        let book = found(joined.take(book)?, "Book", id)?;
        let authors = joined.take(author_list)?;
        let genres = joined.take(genre_list)?;
        Ok(BookFormPage {
            title: "Update Book",
            book_id: Some(id),
            genres: mark_selected(&genres, &book.genre_ids),
            authors: authors.into_iter().map(AuthorView::from).collect(),
            book: Some(BookInput::from(&book)),
            errors: Vec::new(),
        })
    }

    pub async fn update(&self, id: Uuid, form: BookForm) -> AppResult<Submission<BookFormPage>> {
        self.save(Some(id), form).await
    }

    async fn save(&self, id: Option<Uuid>, form: BookForm) -> AppResult<Submission<BookFormPage>> {
        let input = form.normalize();
        let (input, data) = match check(input) {
            Checked::Valid { form, data } => (form, data),
            Checked::Invalid { form, errors } => {
                return self.redisplay(id, form, errors).await.map(Submission::Invalid);
            }
        };

        let missing = self.missing_references(&data).await?;
        if !missing.is_empty() {
            tracing::debug!("Book submission references {} missing record(s)", missing.len());
            return self.redisplay(id, input, missing).await.map(Submission::Invalid);
        }

        let book = match id {
            None => self.repository.books.insert(data).await?,
            Some(id) => found(self.repository.books.update_by_id(id, data).await?, "Book", id)?,
        };
        tracing::info!("Saved book {} ({})", book.id, book.title);
        Ok(Submission::Saved { url: book.url() })
    }

    /// Field errors for an author or genres that do not exist
    async fn missing_references(&self, data: &BookData) -> AppResult<Vec<FieldError>> {
        let authors = self.repository.authors.clone();
        let genres = self.repository.genres.clone();
        let author_id = data.author_id;
        let genre_ids = data.genre_ids.clone();

        let mut join = ConcurrentJoin::new("book_references");
        let author = join.add("author", async move { authors.find_by_id(author_id).await });
        let known_genres = join.add("genres", async move {
            if genre_ids.is_empty() {
                return Ok(Vec::new());
            }
            genres.find_many(&GenreFilter::Ids(genre_ids), None).await
        });
        let mut joined = join.run().await?;

        let mut errors = Vec::new();
        if joined.take(author)?.is_none() {
            errors.push(FieldError::new("author", "Author not found"));
        }
        let known_genres = joined.take(known_genres)?;
        for genre_id in &data.genre_ids {
            if !known_genres.iter().any(|genre| genre.id == *genre_id) {
                errors.push(FieldError::new("genre", format!("Genre {} not found", genre_id)));
            }
        }
        Ok(errors)
    }

    async fn redisplay(
        &self,
        id: Option<Uuid>,
        input: BookInput,
        errors: Vec<FieldError>,
    ) -> AppResult<BookFormPage> {
        let (authors, genres) = self.form_choices().await?;
        Ok(BookFormPage {
            title: form_title(id),
            book_id: id,
            genres: mark_selected(&genres, &input.selected_genre_ids()),
            authors: authors.into_iter().map(AuthorView::from).collect(),
            book: Some(input),
            errors,
        })
    }

    /// Authors and genres offered by the book form
    async fn form_choices(&self) -> AppResult<(Vec<Author>, Vec<Genre>)> {
        let authors = self.repository.authors.clone();
        let genres = self.repository.genres.clone();

        let mut join = ConcurrentJoin::new("book_form");
        let author_list = join.add("authors", async move {
            authors
                .find_many(&AuthorFilter::All, Some(AuthorSort::FamilyName))
                .await
        });
        let genre_list = join.add("genres", async move {
            genres.find_many(&GenreFilter::All, Some(GenreSort::Name)).await
        });
        let mut joined = join.run().await?;
        Ok((joined.take(author_list)?, joined.take(genre_list)?))
    }

    pub async fn delete_form(&self, id: Uuid) -> AppResult<BookDeletePage> {
        let inspected = self.guard.inspect(id).await?;
        let book = found(inspected.entity, "Book", id)?;
        Ok(BookDeletePage::new(book, inspected.dependents))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<Removal<BookDeletePage>> {
        match self.guard.check_and_maybe_delete(id).await? {
            GuardDecision::Deleted | GuardDecision::AlreadyGone => Ok(Removal::Removed {
                url: BOOKS_URL.to_string(),
            }),
            GuardDecision::Blocked { entity, dependents } => {
                Ok(Removal::Blocked(BookDeletePage::new(entity, dependents)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{error::AppError, models::author::AuthorData, repository::MockCollection};

    /// Books service over a failing book store and a real author
    async fn service_with(books: MockCollection<Book>) -> (BooksService, Uuid) {
        let repository = Repository {
            books: Arc::new(books),
            ..Repository::in_memory()
        };
        let author = repository
            .authors
            .insert(AuthorData {
                first_name: "Jane".into(),
                family_name: "Austen".into(),
                date_of_birth: None,
                date_of_death: None,
            })
            .await
            .unwrap();
        (BooksService::new(repository), author.id)
    }

    fn emma(author: Uuid) -> BookForm {
        BookForm {
            title: "Emma".into(),
            author: author.to_string(),
            summary: "A novel".into(),
            isbn: "9780141439587".into(),
            genre: None,
        }
    }

    #[tokio::test]
    async fn test_insert_failure_is_forwarded() {
        let mut books = MockCollection::<Book>::new();
        books
            .expect_insert()
            .times(1)
            .returning(|_| Err(AppError::Backend("write failed".into())));
        let (service, author) = service_with(books).await;

        let err = service.create(emma(author)).await.unwrap_err();
        assert!(matches!(err, AppError::Backend(_)));
    }

    #[tokio::test]
    async fn test_update_failure_is_forwarded() {
        let mut books = MockCollection::<Book>::new();
        books
            .expect_update_by_id()
            .times(1)
            .returning(|_, _| Err(AppError::Backend("write failed".into())));
        let (service, author) = service_with(books).await;

        let err = service
            .update(Uuid::new_v4(), emma(author))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Backend(_)));
    }
}
