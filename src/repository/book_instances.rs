//! Book instances repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::page_bounds;
use crate::{
    error::{AppError, AppResult},
    models::book_instance::{
        BookInstance, BookInstanceDetails, BorrowedInstance, CreateBookInstance, LoanStatus,
    },
};

/// Persistence needed by the circulation workflows (renew, lend, return)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookInstanceStore: Send + Sync {
    /// Fetch a copy with its book title and author
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<BookInstanceDetails>>;

    /// Persist status, due-back date, borrower and imprint of a copy
    async fn save(&self, instance: &BookInstance) -> AppResult<()>;

    /// Copies on loan ordered by due-back date, optionally for one borrower
    async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        page: Option<i64>,
        per_page: i64,
    ) -> AppResult<(Vec<BorrowedInstance>, i64)>;
}

#[derive(Clone)]
pub struct BookInstancesRepository {
    pool: Pool<Postgres>,
}

impl BookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Register a new copy of a book
    pub async fn create(&self, book_id: i32, data: &CreateBookInstance) -> AppResult<BookInstance> {
        let instance = sqlx::query_as::<_, BookInstance>(
            r#"
            INSERT INTO book_instances (id, book_id, imprint, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, book_id, imprint, due_back, status, borrower_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(book_id)
        .bind(&data.imprint)
        .bind(data.status.unwrap_or_default())
        .fetch_one(&self.pool)
        .await?;

        Ok(instance)
    }

    /// Copies of a book
    pub async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let instances = sqlx::query_as::<_, BookInstance>(
            r#"
            SELECT id, book_id, imprint, due_back, status, borrower_id
            FROM book_instances
            WHERE book_id = $1
            ORDER BY due_back NULLS LAST, imprint
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(instances)
    }

    /// Count all copies
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count copies with a given status
    pub async fn count_by_status(&self, status: LoanStatus) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl BookInstanceStore for BookInstancesRepository {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<BookInstanceDetails>> {
        let instance = sqlx::query_as::<_, BookInstanceDetails>(
            r#"
            SELECT bi.id, bi.book_id, bi.imprint, bi.due_back, bi.status, bi.borrower_id,
                   b.title AS book_title, a.last_name AS author_last_name
            FROM book_instances bi
            JOIN books b ON b.id = bi.book_id
            LEFT JOIN authors a ON a.id = b.author_id
            WHERE bi.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(instance)
    }

    async fn save(&self, instance: &BookInstance) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE book_instances
            SET imprint = $2, due_back = $3, status = $4, borrower_id = $5
            WHERE id = $1
            "#,
        )
        .bind(instance.id)
        .bind(&instance.imprint)
        .bind(instance.due_back)
        .bind(instance.status)
        .bind(instance.borrower_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Book instance {} not found",
                instance.id
            )));
        }
        Ok(())
    }

    async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        page: Option<i64>,
        per_page: i64,
    ) -> AppResult<(Vec<BorrowedInstance>, i64)> {
        let (limit, offset) = page_bounds(page, per_page)?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM book_instances
            WHERE status = $1 AND ($2::int IS NULL OR borrower_id = $2)
            "#,
        )
        .bind(LoanStatus::OnLoan)
        .bind(borrower_id)
        .fetch_one(&self.pool)
        .await?;

        let instances = sqlx::query_as::<_, BorrowedInstance>(
            r#"
            SELECT bi.id, bi.book_id, b.title AS book_title, bi.imprint, bi.due_back,
                   bi.borrower_id, u.username AS borrower_username
            FROM book_instances bi
            JOIN books b ON b.id = bi.book_id
            LEFT JOIN users u ON u.id = bi.borrower_id
            WHERE bi.status = $1 AND ($2::int IS NULL OR bi.borrower_id = $2)
            ORDER BY bi.due_back NULLS LAST, bi.id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(LoanStatus::OnLoan)
        .bind(borrower_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((instances, total))
    }
}
