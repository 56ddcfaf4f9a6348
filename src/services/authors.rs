//! Author pages and mutations

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
        author::{AuthorFilter, AuthorForm, AuthorSort},
        book::BookFilter,
        linked, Author, AuthorView, Book, CanonicalUrl, Linked,
    },
    repository::Repository,
};

pub const AUTHORS_URL: &str = "/catalog/authors";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorListPage {
    pub title: &'static str,
    pub author_list: Vec<AuthorView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorDetailPage {
    pub title: String,
    pub author: AuthorView,
    pub books: Vec<Linked<Book>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorFormPage {
    pub title: &'static str,
    /// Id of the record being edited
    pub author_id: Option<Uuid>,
    pub author: Option<AuthorForm>,
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorDeletePage {
    pub title: &'static str,
    pub author: AuthorView,
    pub author_books: Vec<Linked<Book>>,
}

impl AuthorDeletePage {
    fn new(author: Author, books: Vec<Book>) -> Self {
        Self {
            title: "Delete Author",
            author: author.into(),
            author_books: linked(books),
        }
    }
}

#[derive(Clone)]
pub struct AuthorsService {
    repository: Repository,
    guard: IntegrityGuard<Author, Book>,
}

impl AuthorsService {
    pub fn new(repository: Repository) -> Self {
        let guard = IntegrityGuard::new(
            repository.authors.clone(),
            repository.books.clone(),
            BookFilter::Author,
        );
        Self { repository, guard }
    }

    /// All authors, ascending by family name
    pub async fn list(&self) -> AppResult<AuthorListPage> {
        let authors = self
            .repository
            .authors
            .find_many(&AuthorFilter::All, Some(AuthorSort::FamilyName))
            .await?;
        Ok(AuthorListPage {
            title: "Author List",
            author_list: authors.into_iter().map(AuthorView::from).collect(),
        })
    }

    /// Author with the books it wrote
    pub async fn detail(&self, id: Uuid) -> AppResult<AuthorDetailPage> {
        let authors = self.repository.authors.clone();
        let books = self.repository.books.clone();

        let mut join = ConcurrentJoin::new("author_detail");
        let author = join.add("author", async move { authors.find_by_id(id).await });
        let author_books = join.add("books", async move {
            books.find_many(&BookFilter::Author(id), None).await
        });
        let mut joined = join.run().await?;

        let author = found(joined.take(author)?, "Author", id)?;
        let books = joined.take(author_books)?;
        Ok(AuthorDetailPage {
            title: author.full_name(),
            author: author.into(),
            books: linked(books),
        })
    }

    pub fn create_form(&self) -> AuthorFormPage {
        AuthorFormPage {
            title: "Create Author",
            author_id: None,
            author: None,
            errors: Vec::new(),
        }
    }

    pub async fn create(&self, form: AuthorForm) -> AppResult<Submission<AuthorFormPage>> {
        self.save(None, form).await
    }

    pub async fn edit_form(&self, id: Uuid) -> AppResult<AuthorFormPage> {
        let author = found(self.repository.authors.find_by_id(id).await?, "Author", id)?;
        Ok(AuthorFormPage {
            title: "Update Author",
            author_id: Some(id),
            author: Some(AuthorForm::from(&author)),
            errors: Vec::new(),
        })
    }

    pub async fn update(&self, id: Uuid, form: AuthorForm) -> AppResult<Submission<AuthorFormPage>> {
        self.save(Some(id), form).await
    }

    async fn save(&self, id: Option<Uuid>, form: AuthorForm) -> AppResult<Submission<AuthorFormPage>> {
        let (form, data) = match check(form) {
            Checked::Valid { form, data } => (form, data),
            Checked::Invalid { form, errors } => {
                return Ok(Submission::Invalid(AuthorFormPage {
                    title: if id.is_some() { "Update Author" } else { "Create Author" },
                    author_id: id,
                    author: Some(form),
                    errors,
                }));
            }
        };

        let author = match id {
            None => self.repository.authors.insert(data).await?,
            Some(id) => found(
                self.repository.authors.update_by_id(id, data).await?,
                "Author",
                id,
            )?,
        };
        tracing::info!(
            "Saved author {} ({} {})",
            author.id,
            form.first_name,
            form.family_name
        );
        Ok(Submission::Saved { url: author.url() })
    }

    /// Confirmation page listing the books that would block the delete
    pub async fn delete_form(&self, id: Uuid) -> AppResult<AuthorDeletePage> {
        let inspected = self.guard.inspect(id).await?;
        let author = found(inspected.entity, "Author", id)?;
        Ok(AuthorDeletePage::new(author, inspected.dependents))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<Removal<AuthorDeletePage>> {
        match self.guard.check_and_maybe_delete(id).await? {
            GuardDecision::Deleted | GuardDecision::AlreadyGone => Ok(Removal::Removed {
                url: AUTHORS_URL.to_string(),
            }),
            GuardDecision::Blocked { entity, dependents } => {
                Ok(Removal::Blocked(AuthorDeletePage::new(entity, dependents)))
            }
        }
    }
}
