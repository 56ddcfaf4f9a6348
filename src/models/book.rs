//! Book model and form types

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::CanonicalUrl;
use crate::{
    repository::Entity,
    services::validation::{
        self, declared_rules, normalize_relation, FieldError, FormFields, RelationInput,
        Submitted, ValidationPipeline,
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author_id: Uuid,
    pub summary: String,
    pub isbn: String,
    /// Ordered set of genre ids
    pub genre_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookData {
    pub title: String,
    pub author_id: Uuid,
    pub summary: String,
    pub isbn: String,
    pub genre_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookFilter {
    All,
    Author(Uuid),
    /// Books whose genre set contains this id
    Genre(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSort {
    Title,
}

impl CanonicalUrl for Book {
    fn url(&self) -> String {
        format!("/catalog/book/{}", self.id)
    }
}

impl Entity for Book {
    const COLLECTION: &'static str = "books";

    type Data = BookData;
    type Filter = BookFilter;
    type Sort = BookSort;

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_data(id: Uuid, data: BookData) -> Self {
        Self {
            id,
            title: data.title,
            author_id: data.author_id,
            summary: data.summary,
            isbn: data.isbn,
            genre_ids: data.genre_ids,
        }
    }

    fn matches(&self, filter: &BookFilter) -> bool {
        match filter {
            BookFilter::All => true,
            BookFilter::Author(author_id) => self.author_id == *author_id,
            BookFilter::Genre(genre_id) => self.genre_ids.contains(genre_id),
        }
    }

    fn compare(&self, other: &Self, sort: BookSort) -> Ordering {
        match sort {
            BookSort::Title => self.title.cmp(&other.title),
        }
    }
}

/// Book form as submitted. `genre` may be absent, one id or a list of ids.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BookForm {
    #[serde(default)]
    pub title: String,
    /// Author id
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub isbn: String,
    /// Genre id or list of genre ids
    #[schema(value_type = Option<Vec<String>>)]
    pub genre: Option<RelationInput>,
}

impl BookForm {
    /// Resolve the relation shape before any validation sees the form
    pub fn normalize(self) -> BookInput {
        BookInput {
            title: self.title,
            author: self.author,
            summary: self.summary,
            isbn: self.isbn,
            genre: normalize_relation(self.genre),
        }
    }
}

/// Book form with its genre set resolved
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Validate)]
pub struct BookInput {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author must not be empty"))]
    pub author: String,
    #[validate(length(min = 1, message = "Summary must not be empty"))]
    pub summary: String,
    #[validate(length(min = 1, message = "ISBN must not be empty"))]
    pub isbn: String,
    pub genre: Vec<String>,
}

impl BookInput {
    /// Genre ids that parse, for redisplay
    pub fn selected_genre_ids(&self) -> Vec<Uuid> {
        self.genre
            .iter()
            .filter_map(|id| validation::parse_record_id(id))
            .collect()
    }
}

impl FormFields for BookInput {
    const FIELDS: &'static [&'static str] = &["title", "author", "summary", "isbn"];
}

fn trim_book(form: &mut BookInput) {
    validation::trim(&mut form.title);
    validation::trim(&mut form.author);
    validation::trim(&mut form.summary);
    validation::trim(&mut form.isbn);
    for id in form.genre.iter_mut() {
        validation::trim(id);
    }
}

fn escape_book(form: &mut BookInput) {
    form.title = validation::escape_html(&form.title);
    form.summary = validation::escape_html(&form.summary);
    form.isbn = validation::escape_html(&form.isbn);
}

impl Submitted for BookInput {
    type Data = BookData;

    fn pipeline() -> ValidationPipeline<Self> {
        ValidationPipeline::new()
            .normalize(trim_book)
            .check(declared_rules::<BookInput>)
            .normalize(escape_book)
    }

    fn to_data(&self) -> Result<BookData, Vec<FieldError>> {
        let mut errors = Vec::new();
        let author_id = validation::parse_record_id(&self.author);
        if author_id.is_none() {
            errors.push(FieldError::new("author", "Author is not a valid id"));
        }
        let mut genre_ids = Vec::with_capacity(self.genre.len());
        for raw in &self.genre {
            match validation::parse_record_id(raw) {
                // Spelling variants of one id collapse to a single entry
                Some(id) if genre_ids.contains(&id) => {}
                Some(id) => genre_ids.push(id),
                None => errors.push(FieldError::new("genre", format!("Genre '{}' is not a valid id", raw))),
            }
        }
        match author_id {
            Some(author_id) if errors.is_empty() => Ok(BookData {
                title: self.title.clone(),
                author_id,
                summary: self.summary.clone(),
                isbn: self.isbn.clone(),
                genre_ids,
            }),
            _ => Err(errors),
        }
    }
}

impl From<&Book> for BookInput {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author_id.to_string(),
            summary: book.summary.clone(),
            isbn: book.isbn.clone(),
            genre: book.genre_ids.iter().map(Uuid::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::validation::{check, Checked};

    fn form(genre: Option<RelationInput>) -> BookForm {
        BookForm {
            title: "Emma".into(),
            author: Uuid::new_v4().to_string(),
            summary: "A novel".into(),
            isbn: "9780141439587".into(),
            genre,
        }
    }

    #[test]
    fn test_single_genre_becomes_one_element_set() {
        let id = Uuid::new_v4().to_string();
        let input = form(Some(RelationInput::One(id.clone()))).normalize();
        assert_eq!(input.genre, vec![id]);
    }

    #[test]
    fn test_missing_genre_becomes_empty_set() {
        let input = form(None).normalize();
        assert!(input.genre.is_empty());
        let Checked::Valid { data, .. } = check(input) else {
            panic!("expected a valid form");
        };
        assert!(data.genre_ids.is_empty());
    }

    #[test]
    fn test_genre_ids_deduplicated_after_parsing() {
        let genre = Uuid::new_v4();
        let other = Uuid::new_v4();
        let lower = genre.to_string();
        let input = form(Some(RelationInput::Many(vec![
            lower.clone(),
            other.to_string(),
            lower.to_uppercase(),
            format!("  {}  ", lower),
        ])))
        .normalize();

        let Checked::Valid { data, .. } = check(input) else {
            panic!("expected a valid form");
        };
        assert_eq!(data.genre_ids, vec![genre, other]);
    }

    #[test]
    fn test_required_fields_reported_in_order() {
        let input = BookForm::default().normalize();
        let Checked::Invalid { errors, .. } = check(input) else {
            panic!("expected validation errors");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["title", "author", "summary", "isbn"]);
    }

    #[test]
    fn test_malformed_relation_ids() {
        let mut input = form(Some(RelationInput::Many(vec!["nope".into()]))).normalize();
        input.author = "not-an-id".into();
        let Checked::Invalid { errors, .. } = check(input) else {
            panic!("expected validation errors");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["author", "genre"]);
    }

    #[test]
    fn test_filters() {
        let genre = Uuid::new_v4();
        let book = Book::from_data(
            Uuid::new_v4(),
            BookData {
                title: "Emma".into(),
                author_id: Uuid::new_v4(),
                summary: "s".into(),
                isbn: "i".into(),
                genre_ids: vec![genre],
            },
        );
        assert!(book.matches(&BookFilter::Genre(genre)));
        assert!(!book.matches(&BookFilter::Author(genre)));
        assert!(book.url().starts_with("/catalog/book/"));
    }
}
