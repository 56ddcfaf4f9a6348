//! Genre model, selection marking for the book form

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::CanonicalUrl;
use crate::{
    repository::Entity,
    services::validation::{self, declared_rules, FieldError, FormFields, Submitted, ValidationPipeline},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreData {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenreFilter {
    All,
    /// Exact name match
    Name(String),
    Ids(Vec<Uuid>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenreSort {
    Name,
}

impl CanonicalUrl for Genre {
    fn url(&self) -> String {
        format!("/catalog/genre/{}", self.id)
    }
}

impl Entity for Genre {
    const COLLECTION: &'static str = "genres";

    type Data = GenreData;
    type Filter = GenreFilter;
    type Sort = GenreSort;

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_data(id: Uuid, data: GenreData) -> Self {
        Self { id, name: data.name }
    }

    fn matches(&self, filter: &GenreFilter) -> bool {
        match filter {
            GenreFilter::All => true,
            GenreFilter::Name(name) => &self.name == name,
            GenreFilter::Ids(ids) => ids.contains(&self.id),
        }
    }

    fn compare(&self, other: &Self, sort: GenreSort) -> Ordering {
        match sort {
            GenreSort::Name => self.name.cmp(&other.name),
        }
    }
}

/// Genre checkbox on the book form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreOption {
    #[serde(flatten)]
    pub genre: Genre,
    pub url: String,
    pub checked: bool,
}

/// Presentation copies of `candidates`, checked where the id is in `selected`.
/// Ids are compared by value since both lists come from separate reads.
pub fn mark_selected(candidates: &[Genre], selected: &[Uuid]) -> Vec<GenreOption> {
    candidates
        .iter()
        .map(|genre| GenreOption {
            genre: genre.clone(),
            url: genre.url(),
            checked: selected.contains(&genre.id),
        })
        .collect()
}

/// Submitted genre form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct GenreForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Genre name required (at most 100 characters)"))]
    pub name: String,
}

impl FormFields for GenreForm {
    const FIELDS: &'static [&'static str] = &["name"];
}

fn trim_name(form: &mut GenreForm) {
    validation::trim(&mut form.name);
}

fn escape_name(form: &mut GenreForm) {
    form.name = validation::escape_html(&form.name);
}

impl Submitted for GenreForm {
    type Data = GenreData;

    fn pipeline() -> ValidationPipeline<Self> {
        ValidationPipeline::new()
            .normalize(trim_name)
            .check(declared_rules::<GenreForm>)
            .normalize(escape_name)
    }

    fn to_data(&self) -> Result<GenreData, Vec<FieldError>> {
        Ok(GenreData {
            name: self.name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::validation::{check, Checked};

    fn genre(name: &str) -> Genre {
        Genre {
            id: Uuid::new_v4(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_mark_selected_flags_only_members() {
        let candidates = vec![genre("Poetry"), genre("Fantasy"), genre("Horror")];
        let before = candidates.clone();
        // Same value, separately constructed
        let selected = vec![Uuid::parse_str(&candidates[1].id.to_string()).unwrap()];

        let options = mark_selected(&candidates, &selected);

        let checked: Vec<_> = options.iter().map(|o| o.checked).collect();
        assert_eq!(checked, [false, true, false]);
        assert_eq!(candidates, before);
        assert_eq!(options[1].url, candidates[1].url());
    }

    #[test]
    fn test_mark_selected_with_nothing_selected() {
        let candidates = vec![genre("Poetry")];
        assert!(mark_selected(&candidates, &[]).iter().all(|o| !o.checked));
        assert!(mark_selected(&[], &[candidates[0].id]).is_empty());
    }

    #[test]
    fn test_genre_form() {
        let Checked::Invalid { errors, .. } = check(GenreForm { name: "   ".into() }) else {
            panic!("blank name must be rejected");
        };
        assert_eq!(errors[0].field, "name");

        let Checked::Valid { data, .. } = check(GenreForm { name: " Sci-Fi & Fantasy ".into() }) else {
            panic!("expected a valid form");
        };
        assert_eq!(data.name, "Sci-Fi &amp; Fantasy");
    }

    #[test]
    fn test_filters() {
        let g = genre("Poetry");
        assert!(g.matches(&GenreFilter::Name("Poetry".into())));
        assert!(!g.matches(&GenreFilter::Name("poetry".into())));
        assert!(g.matches(&GenreFilter::Ids(vec![g.id])));
        assert!(!g.matches(&GenreFilter::Ids(vec![])));
    }
}
