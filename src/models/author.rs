//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::book::BookShort;
use crate::error::AppError;

/// Full author model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// "Last, First" as shown in listings
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

/// Author with the books attributed to them
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorDetails {
    #[serde(flatten)]
    pub author: Author,
    /// "Last, First"
    pub name: String,
    pub books: Vec<BookShort>,
}

impl AuthorDetails {
    pub fn new(author: Author, books: Vec<BookShort>) -> Self {
        Self {
            name: author.display_name(),
            author,
            books,
        }
    }
}

/// Author query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct AuthorQuery {
    pub page: Option<i64>,
}

/// Create author request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAuthor {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

/// Update author request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAuthor {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: Option<String>,
    /// Absent keeps the stored date, `null` clears it
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub date_of_birth: Option<Option<NaiveDate>>,
    /// Absent keeps the stored date, `null` clears it
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub date_of_death: Option<Option<NaiveDate>>,
}

impl UpdateAuthor {
    /// Birth and death dates after applying this update to `current`
    pub fn merged_dates(&self, current: &Author) -> (Option<NaiveDate>, Option<NaiveDate>) {
        (
            self.date_of_birth.unwrap_or(current.date_of_birth),
            self.date_of_death.unwrap_or(current.date_of_death),
        )
    }
}

/// An author cannot die before being born
pub fn check_lifespan(
    date_of_birth: Option<NaiveDate>,
    date_of_death: Option<NaiveDate>,
) -> Result<(), AppError> {
    match (date_of_birth, date_of_death) {
        (Some(born), Some(died)) if died < born => Err(AppError::Validation(
            "Date of death cannot precede date of birth".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn le_guin() -> Author {
        Author {
            id: 1,
            first_name: "Ursula".to_string(),
            last_name: "Le Guin".to_string(),
            date_of_birth: ymd(1929, 10, 21),
            date_of_death: ymd(2018, 1, 22),
        }
    }

    #[test]
    fn test_details_carry_display_name() {
        let details = AuthorDetails::new(le_guin(), vec![]);
        assert_eq!(details.name, "Le Guin, Ursula");

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["name"], "Le Guin, Ursula");
        assert_eq!(json["last_name"], "Le Guin");
    }

    #[test]
    fn test_update_distinguishes_absent_and_null_dates() {
        let keep: UpdateAuthor = serde_json::from_str(r#"{"first_name": "Ursula K."}"#).unwrap();
        assert_eq!(keep.date_of_death, None);
        assert_eq!(keep.merged_dates(&le_guin()), (ymd(1929, 10, 21), ymd(2018, 1, 22)));

        let clear: UpdateAuthor = serde_json::from_str(r#"{"date_of_death": null}"#).unwrap();
        assert_eq!(clear.date_of_death, Some(None));
        assert_eq!(clear.merged_dates(&le_guin()), (ymd(1929, 10, 21), None));

        let set: UpdateAuthor =
            serde_json::from_str(r#"{"date_of_birth": "1929-10-20"}"#).unwrap();
        assert_eq!(set.merged_dates(&le_guin()).0, ymd(1929, 10, 20));
    }

    #[test]
    fn test_lifespan() {
        assert!(check_lifespan(ymd(1929, 10, 21), ymd(2018, 1, 22)).is_ok());
        assert!(check_lifespan(None, ymd(2018, 1, 22)).is_ok());
        assert!(check_lifespan(ymd(1929, 10, 21), None).is_ok());
        assert!(matches!(
            check_lifespan(ymd(2018, 1, 22), ymd(1929, 10, 21)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_create_validation() {
        let author = CreateAuthor {
            first_name: String::new(),
            last_name: "Pratchett".to_string(),
            date_of_birth: None,
            date_of_death: None,
        };
        let errors = author.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("first_name"));
    }
}
