//! Author model and related types

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::CanonicalUrl;
use crate::{
    repository::Entity,
    services::validation::{
        self, declared_rules, FieldError, FormFields, Submitted, ValidationPipeline,
    },
};

/// Stored author record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: Uuid,
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

/// Validated author fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorData {
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorFilter {
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorSort {
    FamilyName,
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

impl Author {
    /// "family_name, first_name"; empty when either part is missing
    pub fn full_name(&self) -> String {
        if self.first_name.is_empty() || self.family_name.is_empty() {
            return String::new();
        }
        format!("{}, {}", self.family_name, self.first_name)
    }

    pub fn date_of_birth_formatted(&self) -> String {
        format_date(self.date_of_birth)
    }

    pub fn date_of_death_formatted(&self) -> String {
        format_date(self.date_of_death)
    }

    pub fn lifespan(&self) -> String {
        format!(
            "{} - {}",
            self.date_of_birth_formatted(),
            self.date_of_death_formatted()
        )
    }
}

impl CanonicalUrl for Author {
    fn url(&self) -> String {
        format!("/catalog/author/{}", self.id)
    }
}

impl Entity for Author {
    const COLLECTION: &'static str = "authors";

    type Data = AuthorData;
    type Filter = AuthorFilter;
    type Sort = AuthorSort;

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_data(id: Uuid, data: AuthorData) -> Self {
        Self {
            id,
            first_name: data.first_name,
            family_name: data.family_name,
            date_of_birth: data.date_of_birth,
            date_of_death: data.date_of_death,
        }
    }

    fn matches(&self, filter: &AuthorFilter) -> bool {
        match filter {
            AuthorFilter::All => true,
        }
    }

    fn compare(&self, other: &Self, sort: AuthorSort) -> Ordering {
        match sort {
            AuthorSort::FamilyName => self.family_name.cmp(&other.family_name),
        }
    }
}

/// Author snapshot with its derived fields, for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorView {
    #[serde(flatten)]
    pub author: Author,
    pub name: String,
    pub date_of_birth_formatted: String,
    pub date_of_death_formatted: String,
    pub lifespan: String,
    pub url: String,
}

impl From<Author> for AuthorView {
    fn from(author: Author) -> Self {
        Self {
            name: author.full_name(),
            date_of_birth_formatted: author.date_of_birth_formatted(),
            date_of_death_formatted: author.date_of_death_formatted(),
            lifespan: author.lifespan(),
            url: author.url(),
            author,
        }
    }
}

/// Submitted author form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct AuthorForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "First name must be specified (at most 100 characters)"))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Family name must be specified (at most 100 characters)"))]
    pub family_name: String,
    /// ISO-8601 date
    pub date_of_birth: Option<String>,
    /// ISO-8601 date
    pub date_of_death: Option<String>,
}

impl FormFields for AuthorForm {
    const FIELDS: &'static [&'static str] = &["first_name", "family_name"];
}

fn trim_author(form: &mut AuthorForm) {
    validation::trim(&mut form.first_name);
    validation::trim(&mut form.family_name);
    validation::trim_optional(&mut form.date_of_birth);
    validation::trim_optional(&mut form.date_of_death);
}

fn alphanumeric_names(form: &AuthorForm) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if !validation::is_alphanumeric(&form.first_name) {
        errors.push(FieldError::new(
            "first_name",
            "First name has non-alphanumeric characters",
        ));
    }
    if !validation::is_alphanumeric(&form.family_name) {
        errors.push(FieldError::new(
            "family_name",
            "Family name has non-alphanumeric characters",
        ));
    }
    errors
}

fn life_dates(form: &AuthorForm) -> Vec<FieldError> {
    [
        validation::optional_date_error("date_of_birth", &form.date_of_birth, "Invalid date of birth"),
        validation::optional_date_error("date_of_death", &form.date_of_death, "Invalid date of death"),
    ]
    .into_iter()
    .flatten()
    .collect()
}

impl Submitted for AuthorForm {
    type Data = AuthorData;

    fn pipeline() -> ValidationPipeline<Self> {
        ValidationPipeline::new()
            .normalize(trim_author)
            .check(declared_rules::<AuthorForm>)
            .check(alphanumeric_names)
            .check(life_dates)
    }

    fn to_data(&self) -> Result<AuthorData, Vec<FieldError>> {
        Ok(AuthorData {
            first_name: self.first_name.clone(),
            family_name: self.family_name.clone(),
            date_of_birth: self.date_of_birth.as_deref().and_then(validation::parse_iso_date),
            date_of_death: self.date_of_death.as_deref().and_then(validation::parse_iso_date),
        })
    }
}

impl From<&Author> for AuthorForm {
    fn from(author: &Author) -> Self {
        Self {
            first_name: author.first_name.clone(),
            family_name: author.family_name.clone(),
            date_of_birth: author.date_of_birth.map(|d| d.to_string()),
            date_of_death: author.date_of_death.map(|d| d.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::validation::{check, Checked};

    fn austen() -> Author {
        Author {
            id: Uuid::nil(),
            first_name: "Jane".into(),
            family_name: "Austen".into(),
            date_of_birth: None,
            date_of_death: None,
        }
    }

    #[test]
    fn test_derived_fields_without_dates() {
        let author = austen();
        assert_eq!(author.full_name(), "Austen, Jane");
        assert_eq!(author.date_of_birth_formatted(), "");
        assert_eq!(author.lifespan(), " - ");
        assert_eq!(
            author.url(),
            "/catalog/author/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_lifespan_with_dates() {
        let author = Author {
            date_of_birth: NaiveDate::from_ymd_opt(1775, 12, 16),
            date_of_death: NaiveDate::from_ymd_opt(1817, 7, 18),
            ..austen()
        };
        assert_eq!(author.lifespan(), "1775-12-16 - 1817-07-18");

        let view = AuthorView::from(author);
        assert_eq!(view.name, "Austen, Jane");
        assert_eq!(view.date_of_death_formatted, "1817-07-18");
    }

    #[test]
    fn test_form_rules() {
        let form = AuthorForm {
            first_name: "  ".into(),
            family_name: "O'Brien".into(),
            date_of_birth: Some("yesterday".into()),
            date_of_death: Some("".into()),
        };
        let Checked::Invalid { form, errors } = check(form) else {
            panic!("expected validation errors");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["first_name", "family_name", "date_of_birth"]);
        assert_eq!(form.date_of_death, None);
    }

    #[test]
    fn test_form_to_data() {
        let form = AuthorForm {
            first_name: " Jane ".into(),
            family_name: "Austen".into(),
            date_of_birth: Some("1775-12-16".into()),
            date_of_death: None,
        };
        let Checked::Valid { data, .. } = check(form) else {
            panic!("expected a valid form");
        };
        assert_eq!(data.first_name, "Jane");
        assert_eq!(data.date_of_birth, NaiveDate::from_ymd_opt(1775, 12, 16));
    }
}
