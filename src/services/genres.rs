//! Genre pages and mutations

use serde::Serialize;
use uuid::Uuid;

use super::{
    found,
    guard::{GuardDecision, IntegrityGuard},
    validation::{check, Checked, FieldError},
    Removal, Submission,
};
use crate::{
    error::AppResult,
    models::{
        book::BookFilter,
        genre::{GenreData, GenreFilter, GenreForm, GenreSort},
        linked, Book, CanonicalUrl, Genre, Linked,
    },
    repository::Repository,
};

pub const GENRES_URL: &str = "/catalog/genres";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreListPage {
    pub title: &'static str,
    pub genre_list: Vec<Linked<Genre>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreDetailPage {
    pub title: &'static str,
    pub genre: Linked<Genre>,
    pub genre_books: Vec<Linked<Book>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreFormPage {
    pub title: &'static str,
    pub genre_id: Option<Uuid>,
    pub genre: Option<GenreForm>,
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreDeletePage {
    pub title: &'static str,
    pub genre: Linked<Genre>,
    pub genre_books: Vec<Linked<Book>>,
}

impl GenreDeletePage {
    fn new(genre: Genre, books: Vec<Book>) -> Self {
        Self {
            title: "Delete Genre",
            genre: genre.into(),
            genre_books: linked(books),
        }
    }
}

#[derive(Clone)]
pub struct GenresService {
    repository: Repository,
    guard: IntegrityGuard<Genre, Book>,
}

impl GenresService {
    pub fn new(repository: Repository) -> Self {
        let guard = IntegrityGuard::new(
            repository.genres.clone(),
            repository.books.clone(),
            BookFilter::Genre,
        );
        Self { repository, guard }
    }

    pub async fn list(&self) -> AppResult<GenreListPage> {
        let genres = self
            .repository
            .genres
            .find_many(&GenreFilter::All, Some(GenreSort::Name))
            .await?;
        Ok(GenreListPage {
            title: "Genre List",
            genre_list: linked(genres),
        })
    }

    /// Genre with every book filed under it
    pub async fn detail(&self, id: Uuid) -> AppResult<GenreDetailPage> {
        let inspected = self.guard.inspect(id).await?;
        let genre = found(inspected.entity, "Genre", id)?;
        Ok(GenreDetailPage {
            title: "Genre Detail",
            genre: genre.into(),
            genre_books: linked(inspected.dependents),
        })
    }

    pub fn create_form(&self) -> GenreFormPage {
        GenreFormPage {
            title: "Create Genre",
            genre_id: None,
            genre: None,
            errors: Vec::new(),
        }
    }

    /// Find-or-create by name. An existing genre with the same name is
    /// returned instead of inserting a duplicate.
    pub async fn create(&self, form: GenreForm) -> AppResult<Submission<GenreFormPage>> {
        let data = match check(form) {
            Checked::Valid { data, .. } => data,
            Checked::Invalid { form, errors } => {
                return Ok(Submission::Invalid(GenreFormPage {
                    title: "Create Genre",
                    genre_id: None,
                    genre: Some(form),
                    errors,
                }));
            }
        };

        // TODO: two concurrent creates of one name can both miss here; needs a
        // unique index plus insert-or-fetch on the store side.
        let genre = match self.find_by_name(&data).await? {
            Some(existing) => {
                tracing::warn!("Genre '{}' already exists as {}", existing.name, existing.id);
                existing
            }
            None => {
                let created = self.repository.genres.insert(data).await?;
                tracing::info!("Created genre {} ({})", created.id, created.name);
                created
            }
        };
        Ok(Submission::Saved { url: genre.url() })
    }

    async fn find_by_name(&self, data: &GenreData) -> AppResult<Option<Genre>> {
        let matches = self
            .repository
            .genres
            .find_many(&GenreFilter::Name(data.name.clone()), None)
            .await?;
        Ok(matches.into_iter().next())
    }

    pub async fn edit_form(&self, id: Uuid) -> AppResult<GenreFormPage> {
        let genre = found(self.repository.genres.find_by_id(id).await?, "Genre", id)?;
        Ok(GenreFormPage {
            title: "Update Genre",
            genre_id: Some(id),
            genre: Some(GenreForm { name: genre.name }),
            errors: Vec::new(),
        })
    }

    pub async fn update(&self, id: Uuid, form: GenreForm) -> AppResult<Submission<GenreFormPage>> {
        found(self.repository.genres.find_by_id(id).await?, "Genre", id)?;

        let data = match check(form) {
            Checked::Valid { data, .. } => data,
            Checked::Invalid { form, errors } => {
                return Ok(Submission::Invalid(GenreFormPage {
                    title: "Update Genre",
                    genre_id: Some(id),
                    genre: Some(form),
                    errors,
                }));
            }
        };

        let genre = found(
            self.repository.genres.update_by_id(id, data).await?,
            "Genre",
            id,
        )?;
        tracing::info!("Updated genre {} ({})", genre.id, genre.name);
        Ok(Submission::Saved { url: genre.url() })
    }

    pub async fn delete_form(&self, id: Uuid) -> AppResult<GenreDeletePage> {
        let inspected = self.guard.inspect(id).await?;
        let genre = found(inspected.entity, "Genre", id)?;
        Ok(GenreDeletePage::new(genre, inspected.dependents))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<Removal<GenreDeletePage>> {
        match self.guard.check_and_maybe_delete(id).await? {
            GuardDecision::Deleted | GuardDecision::AlreadyGone => Ok(Removal::Removed {
                url: GENRES_URL.to_string(),
            }),
            GuardDecision::Blocked { entity, dependents } => {
                Ok(Removal::Blocked(GenreDeletePage::new(entity, dependents)))
            }
        }
    }
}
