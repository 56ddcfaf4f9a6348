//! Book instance (copy) pages and mutations

use serde::Serialize;
use uuid::Uuid;

use super::{
    found,
    join::ConcurrentJoin,
    validation::{check, Checked, FieldError},
    Removal, Submission,
};
use crate::{
    error::AppResult,
    models::{
        book::{BookFilter, BookSort},
        book_instance::{BookInstanceFilter, BookInstanceForm},
        linked, Book, BookInstance, BookInstanceStatus, CanonicalUrl, Linked,
    },
    repository::Repository,
};

pub const BOOK_INSTANCES_URL: &str = "/catalog/bookinstances";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookInstanceListEntry {
    #[serde(flatten)]
    pub instance: Linked<BookInstance>,
    pub book: Option<Linked<Book>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookInstanceListPage {
    pub title: &'static str,
    pub bookinstance_list: Vec<BookInstanceListEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookInstanceDetailPage {
    pub title: String,
    pub bookinstance: Linked<BookInstance>,
    pub due_back_formatted: String,
    pub book: Option<Linked<Book>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookInstanceFormPage {
    pub title: &'static str,
    pub bookinstance_id: Option<Uuid>,
    pub bookinstance: Option<BookInstanceForm>,
    pub book_list: Vec<Linked<Book>>,
    pub status_list: [BookInstanceStatus; 4],
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookInstanceDeletePage {
    pub title: &'static str,
    pub bookinstance: Linked<BookInstance>,
}

#[derive(Clone)]
pub struct BookInstancesService {
    repository: Repository,
}

impl BookInstancesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Every copy with its book resolved
    pub async fn list(&self) -> AppResult<BookInstanceListPage> {
        let instances = self.repository.book_instances.clone();
        let books = self.repository.books.clone();

        let mut join = ConcurrentJoin::new("bookinstance_list");
        let instance_list = join.add("instances", async move {
            instances.find_many(&BookInstanceFilter::All, None).await
        });
        let book_list = join.add("books", async move {
            books.find_many(&BookFilter::All, None).await
        });
        let mut joined = join.run().await?;
        let instances = joined.take(instance_list)?;
        let books = joined.take(book_list)?;

        let bookinstance_list = instances
            .into_iter()
            .map(|instance| BookInstanceListEntry {
                book: books
                    .iter()
                    .find(|book| book.id == instance.book_id)
                    .cloned()
                    .map(Linked::from),
                instance: instance.into(),
            })
            .collect();
        Ok(BookInstanceListPage {
            title: "Book Instance List",
            bookinstance_list,
        })
    }

    pub async fn detail(&self, id: Uuid) -> AppResult<BookInstanceDetailPage> {
        let instance = found(
            self.repository.book_instances.find_by_id(id).await?,
            "Book instance",
            id,
        )?;
        let book = self.repository.books.find_by_id(instance.book_id).await?;
        Ok(BookInstanceDetailPage {
            title: match &book {
                Some(book) => format!("Copy: {}", book.title),
                None => "Copy".to_string(),
            },
            due_back_formatted: instance.due_back_formatted(),
            bookinstance: instance.into(),
            book: book.map(Linked::from),
        })
    }

    pub async fn create_form(&self) -> AppResult<BookInstanceFormPage> {
        let books = self.book_choices().await?;
        Ok(Self::form_page(None, None, books, Vec::new()))
    }

    pub async fn create(&self, form: BookInstanceForm) -> AppResult<Submission<BookInstanceFormPage>> {
        let (form, data) = match check(form) {
            Checked::Valid { form, data } => (form, data),
            Checked::Invalid { form, errors } => {
                let books = self.book_choices().await?;
                return Ok(Submission::Invalid(Self::form_page(None, Some(form), books, errors)));
            }
        };

        if self.repository.books.find_by_id(data.book_id).await?.is_none() {
            let books = self.book_choices().await?;
            let errors = vec![FieldError::new("book", "Book not found")];
            return Ok(Submission::Invalid(Self::form_page(None, Some(form), books, errors)));
        }

        let instance = self.repository.book_instances.insert(data).await?;
        tracing::info!("Created book instance {} ({})", instance.id, instance.status);
        Ok(Submission::Saved { url: instance.url() })
    }

    pub async fn edit_form(&self, id: Uuid) -> AppResult<BookInstanceFormPage> {
        let (instance, books) = self.instance_with_books(id).await?;
        let instance = found(instance, "Book instance", id)?;
        Ok(Self::form_page(
            Some(id),
            Some(BookInstanceForm::from(&instance)),
            books,
            Vec::new(),
        ))
    }

    /// The copy must exist before the submission is even looked at
    pub async fn update(
        &self,
        id: Uuid,
        form: BookInstanceForm,
    ) -> AppResult<Submission<BookInstanceFormPage>> {
        let (instance, books) = self.instance_with_books(id).await?;
        found(instance, "Book instance", id)?;

        let (form, data) = match check(form) {
            Checked::Valid { form, data } => (form, data),
            Checked::Invalid { form, errors } => {
                return Ok(Submission::Invalid(Self::form_page(Some(id), Some(form), books, errors)));
            }
        };

        if !books.iter().any(|book| book.id == data.book_id) {
            let errors = vec![FieldError::new("book", "Book not found")];
            return Ok(Submission::Invalid(Self::form_page(Some(id), Some(form), books, errors)));
        }

        let instance = found(
            self.repository.book_instances.update_by_id(id, data).await?,
            "Book instance",
            id,
        )?;
        tracing::info!("Updated book instance {} ({})", instance.id, instance.status);
        Ok(Submission::Saved { url: instance.url() })
    }

    pub async fn delete_form(&self, id: Uuid) -> AppResult<BookInstanceDeletePage> {
        let instance = found(
            self.repository.book_instances.find_by_id(id).await?,
            "Book instance",
            id,
        )?;
        Ok(BookInstanceDeletePage {
            title: "Delete Book Instance",
            bookinstance: instance.into(),
        })
    }

    /// Copies have no dependents; deleting an unknown id is a no-op
    pub async fn delete(&self, id: Uuid) -> AppResult<Removal<BookInstanceDeletePage>> {
        if self.repository.book_instances.delete_by_id(id).await? {
            tracing::info!("Deleted book instance {}", id);
        } else {
            tracing::debug!("Book instance {} already gone, nothing to delete", id);
        }
        Ok(Removal::Removed {
            url: BOOK_INSTANCES_URL.to_string(),
        })
    }

    async fn instance_with_books(&self, id: Uuid) -> AppResult<(Option<BookInstance>, Vec<Book>)> {
        let instances = self.repository.book_instances.clone();
        let books = self.repository.books.clone();

        let mut join = ConcurrentJoin::new("bookinstance_form");
        let instance = join.add("instance", async move { instances.find_by_id(id).await });
        let book_list = join.add("books", async move {
            books.find_many(&BookFilter::All, Some(BookSort::Title)).await
        });
        let mut joined = join.run().await?;
        Ok((joined.take(instance)?, joined.take(book_list)?))
    }

    async fn book_choices(&self) -> AppResult<Vec<Book>> {
        self.repository
            .books
            .find_many(&BookFilter::All, Some(BookSort::Title))
            .await
    }

    fn form_page(
        id: Option<Uuid>,
        form: Option<BookInstanceForm>,
        books: Vec<Book>,
        errors: Vec<FieldError>,
    ) -> BookInstanceFormPage {
        BookInstanceFormPage {
            title: if id.is_some() {
                "Update Book Instance"
            } else {
                "Create Book Instance"
            },
            bookinstance_id: id,
            bookinstance: form,
            book_list: linked(books),
            status_list: BookInstanceStatus::ALL,
            errors,
        }
    }
}
