//! Book instance (loanable copy) model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Loan status of a copy, stored as a one letter code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum LoanStatus {
    #[default]
    #[serde(rename = "m")]
    Maintenance,
    #[serde(rename = "o")]
    OnLoan,
    #[serde(rename = "a")]
    Available,
    #[serde(rename = "r")]
    Reserved,
}

impl LoanStatus {
    /// Return the stored code for this status
    pub fn as_code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Available => "Available",
            LoanStatus::Reserved => "Reserved",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "m" => Ok(LoanStatus::Maintenance),
            "o" => Ok(LoanStatus::OnLoan),
            "a" => Ok(LoanStatus::Available),
            "r" => Ok(LoanStatus::Reserved),
            other => Err(format!("Invalid loan status code: {}", other)),
        }
    }
}

// SQLx conversion for LoanStatus
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_code(), buf)
    }
}

/// A single loanable copy of a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    pub id: Uuid,
    pub book_id: i32,
    pub imprint: String,
    /// Only meaningful while the copy is on loan
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub borrower_id: Option<i32>,
}

impl BookInstance {
    pub fn is_on_loan(&self) -> bool {
        self.status == LoanStatus::OnLoan
    }

    /// Put the copy on loan to `borrower_id` until `due_back`
    pub fn lend_to(&mut self, borrower_id: i32, due_back: NaiveDate) {
        self.status = LoanStatus::OnLoan;
        self.borrower_id = Some(borrower_id);
        self.due_back = Some(due_back);
    }

    /// Bring the copy back on the shelf
    pub fn mark_returned(&mut self) {
        self.status = LoanStatus::Available;
        self.borrower_id = None;
        self.due_back = None;
    }
}

/// Book instance together with the title and author of its book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstanceDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub instance: BookInstance,
    pub book_title: String,
    pub author_last_name: Option<String>,
}

impl BookInstanceDetails {
    /// User-facing confirmation after a due date change
    pub fn renewal_confirmation(&self) -> String {
        format!(
            "Due date for the book \"{}\" from \"{}\" was successfully updated.",
            self.book_title,
            self.author_last_name.as_deref().unwrap_or("unknown"),
        )
    }
}

/// Row of a borrowed-books listing
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowedInstance {
    pub id: Uuid,
    pub book_id: i32,
    pub book_title: String,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    pub borrower_username: Option<String>,
    #[sqlx(default)]
    #[serde(default)]
    pub is_overdue: bool,
}

impl BorrowedInstance {
    /// Set `is_overdue` when the due-back date is before `today`
    pub fn flag_overdue(&mut self, today: NaiveDate) {
        self.is_overdue = self.due_back.map(|d| d < today).unwrap_or(false);
    }
}

/// Borrowed listing query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BorrowedQuery {
    pub page: Option<i64>,
}

/// Create book instance request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookInstance {
    #[validate(length(min = 1, max = 200, message = "Imprint must be 1-200 characters"))]
    pub imprint: String,
    /// Initial status (defaults to maintenance); a new copy cannot start on loan
    pub status: Option<LoanStatus>,
}

/// Lend request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LendRequest {
    pub borrower_id: i32,
    /// Defaults to three weeks from today
    pub due_back: Option<NaiveDate>,
}

/// Renewal submission, accepted as `renewal_date` or `due_back`
#[derive(Debug, Deserialize, ToSchema)]
pub struct RenewalRequest {
    #[serde(alias = "due_back")]
    pub renewal_date: NaiveDate,
}

pub const RENEWAL_HELP_TEXT: &str = "Enter a date between now and 4 weeks (default 3).";

/// Renewal form in the awaiting-input state
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenewalForm {
    pub book_instance: BookInstanceDetails,
    /// Date shown in the input: the proposal, or the rejected submission
    pub renewal_date: NaiveDate,
    pub help_text: String,
    /// Validation error for `renewal_date`, when a submission was rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Completed renewal
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenewalResponse {
    pub book_instance: BookInstance,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(status: LoanStatus, due_back: Option<NaiveDate>) -> BookInstance {
        BookInstance {
            id: Uuid::nil(),
            book_id: 1,
            imprint: "Gollancz, 1974".to_string(),
            due_back,
            status,
            borrower_id: None,
        }
    }

    #[test]
    fn test_status_codes_round_trip() {
        for status in [
            LoanStatus::Maintenance,
            LoanStatus::OnLoan,
            LoanStatus::Available,
            LoanStatus::Reserved,
        ] {
            assert_eq!(status.as_code().parse::<LoanStatus>(), Ok(status));
        }
        assert!("x".parse::<LoanStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_as_code() {
        assert_eq!(serde_json::to_string(&LoanStatus::OnLoan).unwrap(), "\"o\"");
        assert_eq!(LoanStatus::default(), LoanStatus::Maintenance);
    }

    #[test]
    fn test_overdue_strictly_after_due_date() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let mut row = BorrowedInstance {
            id: Uuid::nil(),
            book_id: 1,
            book_title: "Mort".to_string(),
            imprint: "Gollancz, 1987".to_string(),
            due_back: NaiveDate::from_ymd_opt(2024, 1, 5),
            borrower_id: Some(4),
            borrower_username: None,
            is_overdue: false,
        };
        row.flag_overdue(today);
        assert!(row.is_overdue);

        row.due_back = Some(today);
        row.flag_overdue(today);
        assert!(!row.is_overdue);

        row.due_back = None;
        row.flag_overdue(today);
        assert!(!row.is_overdue);
    }

    #[test]
    fn test_lend_and_return() {
        let due = NaiveDate::from_ymd_opt(2024, 1, 22).unwrap();
        let mut copy = instance(LoanStatus::Available, None);
        copy.lend_to(4, due);
        assert!(copy.is_on_loan());
        assert_eq!(copy.borrower_id, Some(4));
        assert_eq!(copy.due_back, Some(due));

        copy.mark_returned();
        assert_eq!(copy.status, LoanStatus::Available);
        assert_eq!(copy.borrower_id, None);
        assert_eq!(copy.due_back, None);
    }

    #[test]
    fn test_renewal_confirmation() {
        let details = BookInstanceDetails {
            instance: instance(LoanStatus::OnLoan, None),
            book_title: "The Left Hand of Darkness".to_string(),
            author_last_name: Some("Le Guin".to_string()),
        };
        assert_eq!(
            details.renewal_confirmation(),
            "Due date for the book \"The Left Hand of Darkness\" from \"Le Guin\" was successfully updated."
        );
    }

    #[test]
    fn test_renewal_request_accepts_both_field_names() {
        let a: RenewalRequest = serde_json::from_str(r#"{"renewal_date":"2024-01-15"}"#).unwrap();
        let b: RenewalRequest = serde_json::from_str(r#"{"due_back":"2024-01-15"}"#).unwrap();
        assert_eq!(a.renewal_date, b.renewal_date);
    }
}
