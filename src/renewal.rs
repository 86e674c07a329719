//! Renewal date rules
//!
//! A due-back date may be moved anywhere between today and four weeks ahead,
//! both ends included. "Today" is always passed in by the caller.

use chrono::{Days, NaiveDate};
use thiserror::Error;

/// Furthest a renewal may push the due-back date
pub const MAX_RENEWAL_DAYS: u64 = 28;

/// Date offered by default when a renewal form is opened
pub const DEFAULT_RENEWAL_DAYS: u64 = 21;

/// Rejection reasons for a proposed due-back date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenewalDateError {
    #[error("Invalid date - renewal in past")]
    InPast { date: NaiveDate, today: NaiveDate },

    #[error("Invalid date - renewal more than 4 weeks ahead")]
    TooFarAhead { date: NaiveDate, latest: NaiveDate },
}

impl RenewalDateError {
    /// Short machine-readable reason
    pub fn kind(&self) -> &'static str {
        match self {
            RenewalDateError::InPast { .. } => "past",
            RenewalDateError::TooFarAhead { .. } => "too far ahead",
        }
    }
}

/// Latest due-back date accepted on `today`
pub fn latest_renewal_date(today: NaiveDate) -> NaiveDate {
    today
        .checked_add_days(Days::new(MAX_RENEWAL_DAYS))
        .unwrap_or(NaiveDate::MAX)
}

/// Due-back date proposed to the librarian on `today`
pub fn proposed_renewal_date(today: NaiveDate) -> NaiveDate {
    today
        .checked_add_days(Days::new(DEFAULT_RENEWAL_DAYS))
        .unwrap_or(NaiveDate::MAX)
}

/// Check a candidate due-back date, returning it unchanged when accepted
pub fn validate_renewal_date(
    date: NaiveDate,
    today: NaiveDate,
) -> Result<NaiveDate, RenewalDateError> {
    if date < today {
        return Err(RenewalDateError::InPast { date, today });
    }

    let latest = latest_renewal_date(today);
    if date > latest {
        return Err(RenewalDateError::TooFarAhead { date, latest });
    }

    Ok(date)
}
