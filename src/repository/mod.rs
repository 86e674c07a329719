//! Repository layer for database operations

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod genres;
pub mod users;

use sqlx::{Pool, Postgres};

use crate::error::{AppError, AppResult};

pub use book_instances::BookInstanceStore;
pub use users::UserLookup;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub authors: authors::AuthorsRepository,
    pub books: books::BooksRepository,
    pub genres: genres::GenresRepository,
    pub book_instances: book_instances::BookInstancesRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            authors: authors::AuthorsRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            genres: genres::GenresRepository::new(pool.clone()),
            book_instances: book_instances::BookInstancesRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            pool,
        }
    }
}

/// LIMIT and OFFSET for a 1-based page number
pub(crate) fn page_bounds(page: Option<i64>, per_page: i64) -> AppResult<(i64, i64)> {
    let page = page.unwrap_or(1).max(1);
    let offset = (page - 1)
        .checked_mul(per_page)
        .ok_or_else(|| AppError::Validation(format!("page: Page {} is out of range", page)))?;
    Ok((per_page, offset))
}

#[cfg(test)]
mod tests {
    use super::page_bounds;
    use crate::error::AppError;

    #[test]
    fn test_page_bounds() {
        assert_eq!(page_bounds(None, 4).unwrap(), (4, 0));
        assert_eq!(page_bounds(Some(3), 10).unwrap(), (10, 20));
        assert_eq!(page_bounds(Some(0), 10).unwrap(), (10, 0));
        assert_eq!(page_bounds(Some(-5), 4).unwrap(), (4, 0));
    }

    #[test]
    fn test_page_bounds_overflow_is_rejected() {
        assert!(matches!(
            page_bounds(Some(i64::MAX), 4),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            page_bounds(Some(i64::MAX / 2), 10),
            Err(AppError::Validation(_))
        ));
        assert_eq!(
            page_bounds(Some(i64::MAX / 10), 10).unwrap(),
            (10, (i64::MAX / 10 - 1) * 10)
        );
    }
}
