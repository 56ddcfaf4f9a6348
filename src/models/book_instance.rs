//! Book instance (lending copy) model

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::CanonicalUrl;
use crate::{
    repository::Entity,
    services::validation::{self, declared_rules, FieldError, FormFields, Submitted, ValidationPipeline},
};

/// Lending status of a copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum BookInstanceStatus {
    Maintenance,
    Available,
    Loaned,
    Reserved,
}

impl BookInstanceStatus {
    pub const ALL: [BookInstanceStatus; 4] = [
        BookInstanceStatus::Maintenance,
        BookInstanceStatus::Available,
        BookInstanceStatus::Loaned,
        BookInstanceStatus::Reserved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookInstanceStatus::Maintenance => "Maintenance",
            BookInstanceStatus::Available => "Available",
            BookInstanceStatus::Loaned => "Loaned",
            BookInstanceStatus::Reserved => "Reserved",
        }
    }
}

impl std::fmt::Display for BookInstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookInstanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookInstanceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Invalid book instance status: {}", s))
    }
}

// SQLx conversion for BookInstanceStatus
impl sqlx::Type<Postgres> for BookInstanceStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BookInstanceStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BookInstanceStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    pub id: Uuid,
    pub book_id: Uuid,
    pub imprint: String,
    pub status: BookInstanceStatus,
    pub due_back: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookInstanceData {
    pub book_id: Uuid,
    pub imprint: String,
    pub status: BookInstanceStatus,
    pub due_back: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookInstanceFilter {
    All,
    Book(Uuid),
    Status(BookInstanceStatus),
}

/// Copies are only ever listed in store order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookInstanceSort {}

impl BookInstance {
    pub fn due_back_formatted(&self) -> String {
        self.due_back
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

impl CanonicalUrl for BookInstance {
    fn url(&self) -> String {
        format!("/catalog/bookinstance/{}", self.id)
    }
}

impl Entity for BookInstance {
    const COLLECTION: &'static str = "book_instances";

    type Data = BookInstanceData;
    type Filter = BookInstanceFilter;
    type Sort = BookInstanceSort;

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_data(id: Uuid, data: BookInstanceData) -> Self {
        Self {
            id,
            book_id: data.book_id,
            imprint: data.imprint,
            status: data.status,
            due_back: data.due_back,
        }
    }

    fn matches(&self, filter: &BookInstanceFilter) -> bool {
        match filter {
            BookInstanceFilter::All => true,
            BookInstanceFilter::Book(book_id) => self.book_id == *book_id,
            BookInstanceFilter::Status(status) => self.status == *status,
        }
    }

    fn compare(&self, _other: &Self, sort: BookInstanceSort) -> Ordering {
        match sort {}
    }
}

/// Submitted book instance form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct BookInstanceForm {
    /// Book id
    #[serde(default)]
    #[validate(length(min = 1, message = "Book must not be empty"))]
    pub book: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Imprint must not be empty"))]
    pub imprint: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Status must not be empty"))]
    pub status: String,
    /// ISO-8601 date
    pub due_back: Option<String>,
}

impl FormFields for BookInstanceForm {
    const FIELDS: &'static [&'static str] = &["book", "imprint", "status"];
}

fn trim_instance(form: &mut BookInstanceForm) {
    validation::trim(&mut form.book);
    validation::trim(&mut form.imprint);
    validation::trim(&mut form.status);
    validation::trim_optional(&mut form.due_back);
}

fn known_status(form: &BookInstanceForm) -> Vec<FieldError> {
    if form.status.is_empty() || form.status.parse::<BookInstanceStatus>().is_ok() {
        return Vec::new();
    }
    vec![FieldError::new("status", format!("Unknown status '{}'", form.status))]
}

fn due_back_rules(form: &BookInstanceForm) -> Vec<FieldError> {
    if let Some(error) = validation::optional_date_error("due_back", &form.due_back, "Invalid date") {
        return vec![error];
    }
    if form.due_back.is_none() && form.status != BookInstanceStatus::Available.as_str() {
        return vec![FieldError::new(
            "due_back",
            "Due date must be entered if Status is not Available",
        )];
    }
    Vec::new()
}

fn escape_imprint(form: &mut BookInstanceForm) {
    form.imprint = validation::escape_html(&form.imprint);
}

impl Submitted for BookInstanceForm {
    type Data = BookInstanceData;

    fn pipeline() -> ValidationPipeline<Self> {
        ValidationPipeline::new()
            .normalize(trim_instance)
            .check(declared_rules::<BookInstanceForm>)
            .check(known_status)
            .check(due_back_rules)
            .normalize(escape_imprint)
    }

    fn to_data(&self) -> Result<BookInstanceData, Vec<FieldError>> {
        let book_id = validation::parse_record_id(&self.book)
            .ok_or_else(|| vec![FieldError::new("book", "Book is not a valid id")])?;
        let status = self
            .status
            .parse::<BookInstanceStatus>()
            .map_err(|e| vec![FieldError::new("status", e)])?;
        Ok(BookInstanceData {
            book_id,
            imprint: self.imprint.clone(),
            status,
            due_back: self.due_back.as_deref().and_then(validation::parse_iso_date),
        })
    }
}

impl From<&BookInstance> for BookInstanceForm {
    fn from(instance: &BookInstance) -> Self {
        Self {
            book: instance.book_id.to_string(),
            imprint: instance.imprint.clone(),
            status: instance.status.to_string(),
            due_back: instance.due_back.map(|d| d.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::validation::{check, Checked};

    fn form(status: &str, due_back: Option<&str>) -> BookInstanceForm {
        BookInstanceForm {
            book: Uuid::new_v4().to_string(),
            imprint: "Penguin, 2003".into(),
            status: status.into(),
            due_back: due_back.map(str::to_string),
        }
    }

    #[test]
    fn test_loaned_without_due_back_is_rejected() {
        let Checked::Invalid { errors, .. } = check(form("Loaned", None)) else {
            panic!("due_back must be required for a loaned copy");
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "due_back");
    }

    #[test]
    fn test_available_without_due_back_passes() {
        let Checked::Valid { data, .. } = check(form("Available", None)) else {
            panic!("expected a valid form");
        };
        assert_eq!(data.status, BookInstanceStatus::Available);
        assert_eq!(data.due_back, None);
    }

    #[test]
    fn test_blank_due_back_counts_as_missing() {
        assert!(matches!(
            check(form("Reserved", Some("  "))),
            Checked::Invalid { .. }
        ));
        let Checked::Valid { data, .. } = check(form("Reserved", Some("2024-05-01"))) else {
            panic!("expected a valid form");
        };
        assert_eq!(data.due_back, NaiveDate::from_ymd_opt(2024, 5, 1));
    }

    #[test]
    fn test_unknown_status_and_bad_date() {
        let Checked::Invalid { errors, .. } = check(form("Lost", Some("soon"))) else {
            panic!("expected validation errors");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["status", "due_back"]);
    }

    #[test]
    fn test_status_round_trip() {
        for status in BookInstanceStatus::ALL {
            assert_eq!(status.as_str().parse::<BookInstanceStatus>(), Ok(status));
        }
        assert!("available".parse::<BookInstanceStatus>().is_err());
    }
}
