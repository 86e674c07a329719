//! Renewal workflow: propose a due date, validate the submission, persist it

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book_instance::{BookInstance, BookInstanceDetails, RenewalForm, RENEWAL_HELP_TEXT},
    renewal::{proposed_renewal_date, validate_renewal_date},
    repository::BookInstanceStore,
};

/// Result of a completed renewal
#[derive(Debug, Clone, PartialEq)]
pub struct Renewal {
    pub book_instance: BookInstance,
    /// Confirmation shown to the librarian
    pub message: String,
}

#[derive(Clone)]
pub struct RenewalService {
    store: Arc<dyn BookInstanceStore>,
}

impl RenewalService {
    pub fn new(store: Arc<dyn BookInstanceStore>) -> Self {
        Self { store }
    }

    async fn load_on_loan(&self, instance_id: Uuid) -> AppResult<BookInstanceDetails> {
        let details = self
            .store
            .get_by_id(instance_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", instance_id)))?;

        if !details.instance.is_on_loan() {
            return Err(AppError::BusinessRule(format!(
                "Book instance {} is not on loan ({})",
                instance_id, details.instance.status
            )));
        }

        Ok(details)
    }

    /// Open the renewal form with today + 3 weeks proposed
    pub async fn renewal_form(&self, instance_id: Uuid, today: NaiveDate) -> AppResult<RenewalForm> {
        let details = self.load_on_loan(instance_id).await?;

        Ok(RenewalForm {
            book_instance: details,
            renewal_date: proposed_renewal_date(today),
            help_text: RENEWAL_HELP_TEXT.to_string(),
            error: None,
            reason: None,
        })
    }

    /// Move the due-back date of an on-loan copy to `proposed_date`
    pub async fn renew(
        &self,
        instance_id: Uuid,
        proposed_date: NaiveDate,
        today: NaiveDate,
    ) -> AppResult<Renewal> {
        let details = self.load_on_loan(instance_id).await?;
        let due_back = validate_renewal_date(proposed_date, today)?;

        let mut instance = details.instance.clone();
        instance.due_back = Some(due_back);
        self.store.save(&instance).await?;

        let message = details.renewal_confirmation();
        tracing::info!(
            instance_id = %instance_id,
            due_back = %due_back,
            "Book instance renewed"
        );

        Ok(Renewal {
            book_instance: instance,
            message,
        })
    }

    /// Build the form re-displayed after a rejected submission
    pub async fn rejected_form(
        &self,
        instance_id: Uuid,
        submitted: NaiveDate,
        error: &crate::renewal::RenewalDateError,
    ) -> AppResult<RenewalForm> {
        let details = self.load_on_loan(instance_id).await?;

        Ok(RenewalForm {
            book_instance: details,
            renewal_date: submitted,
            help_text: RENEWAL_HELP_TEXT.to_string(),
            error: Some(error.to_string()),
            reason: Some(error.kind().to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::book_instance::LoanStatus, renewal::RenewalDateError,
        repository::book_instances::MockBookInstanceStore,
    };
    use mockall::predicate::eq;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn on_loan(id: Uuid) -> BookInstanceDetails {
        BookInstanceDetails {
            instance: BookInstance {
                id,
                book_id: 3,
                imprint: "Ace Books, 1969".to_string(),
                due_back: Some(ymd(2024, 1, 3)),
                status: LoanStatus::OnLoan,
                borrower_id: Some(8),
            },
            book_title: "The Left Hand of Darkness".to_string(),
            author_last_name: Some("Le Guin".to_string()),
        }
    }

    fn service(store: MockBookInstanceStore) -> RenewalService {
        RenewalService::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_renew_inside_window_updates_due_back() {
        let id = Uuid::new_v4();
        let mut store = MockBookInstanceStore::new();
        store
            .expect_get_by_id()
            .with(eq(id))
            .returning(move |id| Ok(Some(on_loan(id))));
        store
            .expect_save()
            .withf(move |i| i.id == id && i.due_back == Some(ymd(2024, 1, 15)))
            .times(1)
            .returning(|_| Ok(()));

        let renewal = service(store)
            .renew(id, ymd(2024, 1, 15), ymd(2024, 1, 1))
            .await
            .unwrap();

        assert_eq!(renewal.book_instance.due_back, Some(ymd(2024, 1, 15)));
        assert_eq!(renewal.book_instance.status, LoanStatus::OnLoan);
        assert_eq!(
            renewal.message,
            "Due date for the book \"The Left Hand of Darkness\" from \"Le Guin\" was successfully updated."
        );
    }

    #[tokio::test]
    async fn test_renew_in_past_is_rejected_without_saving() {
        let id = Uuid::new_v4();
        let mut store = MockBookInstanceStore::new();
        store
            .expect_get_by_id()
            .returning(move |id| Ok(Some(on_loan(id))));
        store.expect_save().never();

        let err = service(store)
            .renew(id, ymd(2023, 12, 31), ymd(2024, 1, 1))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::InvalidRenewalDate(RenewalDateError::InPast { .. })
        ));
    }

    #[tokio::test]
    async fn test_renew_too_far_ahead_is_rejected_without_saving() {
        let id = Uuid::new_v4();
        let mut store = MockBookInstanceStore::new();
        store
            .expect_get_by_id()
            .returning(move |id| Ok(Some(on_loan(id))));
        store.expect_save().never();

        let err = service(store)
            .renew(id, ymd(2024, 1, 30), ymd(2024, 1, 1))
            .await
            .unwrap_err();

        match err {
            AppError::InvalidRenewalDate(e) => assert_eq!(e.kind(), "too far ahead"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_renew_unknown_instance_is_not_found() {
        let mut store = MockBookInstanceStore::new();
        store.expect_get_by_id().returning(|_| Ok(None));
        store.expect_save().never();

        let err = service(store)
            .renew(Uuid::new_v4(), ymd(2024, 1, 15), ymd(2024, 1, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_renew_copy_not_on_loan_is_rejected() {
        let id = Uuid::new_v4();
        let mut store = MockBookInstanceStore::new();
        store.expect_get_by_id().returning(move |id| {
            let mut details = on_loan(id);
            details.instance.mark_returned();
            Ok(Some(details))
        });
        store.expect_save().never();

        let err = service(store)
            .renew(id, ymd(2024, 1, 15), ymd(2024, 1, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BusinessRule(_)));
    }

    #[tokio::test]
    async fn test_form_proposes_three_weeks() {
        let id = Uuid::new_v4();
        let mut store = MockBookInstanceStore::new();
        store
            .expect_get_by_id()
            .returning(move |id| Ok(Some(on_loan(id))));

        let form = service(store).renewal_form(id, ymd(2024, 1, 1)).await.unwrap();

        assert_eq!(form.renewal_date, ymd(2024, 1, 22));
        assert_eq!(form.book_instance.instance.due_back, Some(ymd(2024, 1, 3)));
        assert!(form.error.is_none());
    }

    #[tokio::test]
    async fn test_rejected_form_keeps_submitted_date() {
        let id = Uuid::new_v4();
        let mut store = MockBookInstanceStore::new();
        store
            .expect_get_by_id()
            .returning(move |id| Ok(Some(on_loan(id))));

        let today = ymd(2024, 1, 1);
        let submitted = ymd(2023, 12, 31);
        let error = validate_renewal_date(submitted, today).unwrap_err();
        let form = service(store)
            .rejected_form(id, submitted, &error)
            .await
            .unwrap();

        assert_eq!(form.renewal_date, submitted);
        assert_eq!(form.error.as_deref(), Some("Invalid date - renewal in past"));
        assert_eq!(form.reason.as_deref(), Some("past"));
    }
}
