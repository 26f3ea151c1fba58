use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use diesel::{Insertable, Queryable, Selectable};
use serde::{Deserialize, Deserializer, Serialize};

use crate::schema::todos;

pub type TodoId = i32;

pub const TITLE_MAX_CHARS: usize = 200;

#[derive(Serialize, Deserialize, Queryable, Selectable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = todos)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Applies validated changes in place. `id` and `created_at` are never
    /// touched; `updated_at` is set to `at`.
    pub fn apply(&mut self, changes: TodoChanges, at: DateTime<Utc>) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(completed) = changes.completed {
            self.completed = completed;
        }
        self.updated_at = at;
    }
}

impl fmt::Display for Todo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// A todo that has not been assigned an id yet.
#[derive(Insertable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = todos)]
pub struct NewTodo {
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewTodo {
    /// Builds a record from validated changes, filling in the field defaults.
    pub fn from_changes(changes: TodoChanges, at: DateTime<Utc>) -> Self {
        Self {
            title: changes.title.unwrap_or_default(),
            description: changes.description.unwrap_or_default(),
            completed: changes.completed.unwrap_or(false),
            created_at: at,
            updated_at: at,
        }
    }
}

/// Request body for create, update and partial update.
///
/// Each field distinguishes "absent" (`None`) from an explicit `null`
/// (`Some(None)`). Read-only fields such as `id` are ignored.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct TodoInput {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub completed: Option<Option<bool>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Whether omitted fields are an error (`Full`) or left alone (`Partial`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Full,
    Partial,
}

/// Field values that passed validation. `None` means "leave unchanged".
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";
const NOT_BLANK: &str = "This field may not be blank.";

impl TodoInput {
    pub fn validate(self, mode: Validation) -> Result<TodoChanges, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let title = match self.title {
            None if mode == Validation::Full => {
                errors.add("title", REQUIRED);
                None
            }
            None => None,
            Some(None) => {
                errors.add("title", NOT_NULL);
                None
            }
            Some(Some(raw)) => {
                let title = raw.trim();
                if title.is_empty() {
                    errors.add("title", NOT_BLANK);
                } else if title.chars().count() > TITLE_MAX_CHARS {
                    errors.add(
                        "title",
                        format!("Ensure this field has no more than {TITLE_MAX_CHARS} characters."),
                    );
                }
                Some(title.to_owned())
            }
        };

        let description = match self.description {
            Some(None) => {
                errors.add("description", NOT_NULL);
                None
            }
            Some(Some(raw)) => Some(raw.trim().to_owned()),
            None => None,
        };

        let completed = match self.completed {
            Some(None) => {
                errors.add("completed", NOT_NULL);
                None
            }
            Some(Some(value)) => Some(value),
            None => None,
        };

        if errors.is_empty() {
            Ok(TodoChanges { title, description, completed })
        } else {
            Err(errors)
        }
    }
}

/// Per-field validation messages, serialized as `{"field": ["message", ..]}`.
#[derive(Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid input:")?;
        for (field, messages) in &self.0 {
            write!(f, " {field}: {}", messages.join(" "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn input(title: Option<Option<&str>>) -> TodoInput {
        TodoInput {
            title: title.map(|t| t.map(str::to_owned)),
            ..TodoInput::default()
        }
    }

    #[test]
    fn title_is_required_for_full_validation() {
        let errors = input(None).validate(Validation::Full).unwrap_err();
        assert_eq!(errors.field("title"), Some(&[REQUIRED.to_owned()][..]));
    }

    #[test]
    fn missing_title_is_fine_for_partial_validation() {
        let changes = input(None).validate(Validation::Partial).unwrap();
        assert_eq!(changes, TodoChanges::default());
    }

    #[rstest]
    #[case::null(None, NOT_NULL)]
    #[case::empty(Some(""), NOT_BLANK)]
    #[case::whitespace(Some("   "), NOT_BLANK)]
    fn bad_titles_are_rejected_in_both_modes(
        #[case] title: Option<&str>,
        #[case] message: &str,
        #[values(Validation::Full, Validation::Partial)] mode: Validation,
    ) {
        let errors = input(Some(title)).validate(mode).unwrap_err();
        assert_eq!(errors.field("title"), Some(&[message.to_owned()][..]));
    }

    #[test]
    fn overlong_title_is_rejected() {
        let long = "x".repeat(TITLE_MAX_CHARS + 1);
        let errors = input(Some(Some(&long))).validate(Validation::Full).unwrap_err();
        assert!(errors.field("title").is_some());

        let exact = "x".repeat(TITLE_MAX_CHARS);
        assert!(input(Some(Some(&exact))).validate(Validation::Full).is_ok());
    }

    #[test]
    fn text_fields_are_trimmed() {
        let payload = TodoInput {
            title: Some(Some("  Buy milk ".to_owned())),
            description: Some(Some(" two litres\n".to_owned())),
            completed: None,
        };

        let changes = payload.validate(Validation::Full).unwrap();
        assert_eq!(changes.title.as_deref(), Some("Buy milk"));
        assert_eq!(changes.description.as_deref(), Some("two litres"));
    }

    #[test]
    fn nulls_are_reported_per_field() {
        let payload = TodoInput {
            title: None,
            description: Some(None),
            completed: Some(None),
        };

        let errors = payload.validate(Validation::Full).unwrap_err();
        assert!(errors.field("title").is_some());
        assert!(errors.field("description").is_some());
        assert!(errors.field("completed").is_some());
    }

    #[test]
    fn deserializing_distinguishes_absent_from_null() {
        let absent: TodoInput = rocket::serde::json::from_str(r#"{"id": 7}"#).unwrap();
        assert_eq!(absent, TodoInput::default());

        let null: TodoInput = rocket::serde::json::from_str(r#"{"title": null}"#).unwrap();
        assert_eq!(null.title, Some(None));
    }

    #[test]
    fn new_todo_gets_defaults() {
        let at = Utc::now();
        let changes = TodoChanges { title: Some("Learn CI/CD".to_owned()), ..Default::default() };

        let todo = NewTodo::from_changes(changes, at);
        assert_eq!(todo.title, "Learn CI/CD");
        assert_eq!(todo.description, "");
        assert!(!todo.completed);
        assert_eq!(todo.created_at, todo.updated_at);
    }

    #[test]
    fn display_is_the_title() {
        let at = Utc::now();
        let todo = Todo {
            id: 1,
            title: "My task".to_owned(),
            description: String::new(),
            completed: false,
            created_at: at,
            updated_at: at,
        };
        assert_eq!(todo.to_string(), "My task");
    }
}
