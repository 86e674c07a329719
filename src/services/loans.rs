//! Loan management service: lending, returning and borrowed listings

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book_instance::{BookInstance, BookInstanceDetails, BorrowedInstance, LoanStatus},
    renewal::{proposed_renewal_date, validate_renewal_date},
    repository::{BookInstanceStore, UserLookup},
};

/// Page size of borrowed listings
pub const BORROWED_PER_PAGE: i64 = 10;

#[derive(Clone)]
pub struct LoansService {
    store: Arc<dyn BookInstanceStore>,
    users: Arc<dyn UserLookup>,
}

impl LoansService {
    pub fn new(store: Arc<dyn BookInstanceStore>, users: Arc<dyn UserLookup>) -> Self {
        Self { store, users }
    }

    /// A copy with its book title and author
    pub async fn get_instance(&self, instance_id: Uuid) -> AppResult<BookInstanceDetails> {
        self.store
            .get_by_id(instance_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", instance_id)))
    }

    /// Copies on loan to one user, soonest due first
    pub async fn list_borrowed_by(
        &self,
        user_id: i32,
        page: Option<i64>,
        today: NaiveDate,
    ) -> AppResult<(Vec<BorrowedInstance>, i64)> {
        let (items, total) = self
            .store
            .list_on_loan(Some(user_id), page, BORROWED_PER_PAGE)
            .await?;
        Ok((flag_overdue(items, today), total))
    }

    /// Every copy on loan, soonest due first
    pub async fn list_all_borrowed(
        &self,
        page: Option<i64>,
        today: NaiveDate,
    ) -> AppResult<(Vec<BorrowedInstance>, i64)> {
        let (items, total) = self
            .store
            .list_on_loan(None, page, BORROWED_PER_PAGE)
            .await?;
        Ok((flag_overdue(items, today), total))
    }

    /// Lend a copy; the due date defaults to three weeks from today
    pub async fn lend(
        &self,
        instance_id: Uuid,
        borrower_id: i32,
        due_back: Option<NaiveDate>,
        today: NaiveDate,
    ) -> AppResult<BookInstance> {
        let mut instance = self.get_instance(instance_id).await?.instance;
        match instance.status {
            LoanStatus::Available | LoanStatus::Reserved => {}
            status => {
                return Err(AppError::BusinessRule(format!(
                    "Book instance {} cannot be lent ({})",
                    instance_id, status
                )))
            }
        }

        if !self.users.exists(borrower_id).await? {
            return Err(AppError::NotFound(format!("User with id {} not found", borrower_id)));
        }

        let due_back = match due_back {
            Some(date) => validate_renewal_date(date, today)?,
            None => proposed_renewal_date(today),
        };

        instance.lend_to(borrower_id, due_back);
        self.store.save(&instance).await?;

        tracing::info!(
            instance_id = %instance_id,
            borrower_id,
            due_back = %due_back,
            "Book instance lent"
        );

        Ok(instance)
    }

    /// Mark an on-loan copy as returned
    pub async fn return_instance(&self, instance_id: Uuid) -> AppResult<BookInstance> {
        let mut instance = self.get_instance(instance_id).await?.instance;
        if !instance.is_on_loan() {
            return Err(AppError::BusinessRule(format!(
                "Book instance {} is not on loan ({})",
                instance_id, instance.status
            )));
        }

        instance.mark_returned();
        self.store.save(&instance).await?;

        tracing::info!(instance_id = %instance_id, "Book instance returned");

        Ok(instance)
    }
}

fn flag_overdue(mut items: Vec<BorrowedInstance>, today: NaiveDate) -> Vec<BorrowedInstance> {
    for item in &mut items {
        item.flag_overdue(today);
    }
    items
}
