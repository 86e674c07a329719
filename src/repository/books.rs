//! Books repository for database operations

use sqlx::{Pool, Postgres};

use super::page_bounds;
use crate::{
    error::{conflict_on_unique, AppError, AppResult},
    models::{
        book::{Book, BookQuery, BookRow, BookShort, CreateBook, UpdateBook},
        genre::Genre,
    },
};

const BOOK_SELECT: &str = r#"
    SELECT b.id, b.title, b.summary, b.isbn, b.author_id,
           a.first_name AS author_first_name, a.last_name AS author_last_name
    FROM books b
    LEFT JOIN authors a ON a.id = b.author_id
"#;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List books with optional title filter and pagination
    pub async fn list(&self, query: &BookQuery, per_page: i64) -> AppResult<(Vec<BookShort>, i64)> {
        let (limit, offset) = page_bounds(query.page, per_page)?;
        let pattern = query
            .title
            .as_deref()
            .map(|t| format!("%{}%", escape_like(t)));

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM books WHERE ($1::text IS NULL OR title ILIKE $1)",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let books = sqlx::query_as::<_, BookShort>(
            r#"
            SELECT b.id, b.title, b.author_id,
                   a.last_name || ', ' || a.first_name AS author_name
            FROM books b
            LEFT JOIN authors a ON a.id = b.author_id
            WHERE ($1::text IS NULL OR b.title ILIKE $1)
            ORDER BY b.title, b.id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((books, total))
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, BookRow>(&format!("{} WHERE b.id = $1", BOOK_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Book::from)
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Genres of a book
    pub async fn genres(&self, book_id: i32) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>(
            r#"
            SELECT g.id, g.name
            FROM genres g
            JOIN book_genres bg ON bg.genre_id = g.id
            WHERE bg.book_id = $1
            ORDER BY g.name
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(genres)
    }

    /// Create a book with its genres
    pub async fn create(&self, data: &CreateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO books (title, author_id, summary, isbn)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&data.title)
        .bind(data.author_id)
        .bind(&data.summary)
        .bind(&data.isbn)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "A book with this ISBN already exists"))?;

        Self::replace_genres(&mut tx, id, &data.genre_ids).await?;
        tx.commit().await?;

        self.get_by_id(id).await
    }

    /// Update a book, leaving absent fields untouched
    pub async fn update(&self, id: i32, data: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let mut sets: Vec<String> = Vec::new();
        let mut idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(data.title, "title");
        add_field!(data.author_id, "author_id");
        add_field!(data.summary, "summary");
        add_field!(data.isbn, "isbn");

        let query = if sets.is_empty() {
            "SELECT id FROM books WHERE id = $1".to_string()
        } else {
            format!("UPDATE books SET {} WHERE id = $1 RETURNING id", sets.join(", "))
        };

        let mut builder = sqlx::query_scalar::<_, i32>(&query).bind(id);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.title);
        bind_field!(data.author_id);
        bind_field!(data.summary);
        bind_field!(data.isbn);

        builder
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| conflict_on_unique(e, "A book with this ISBN already exists"))?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        if let Some(ref genre_ids) = data.genre_ids {
            Self::replace_genres(&mut tx, id, genre_ids).await?;
        }
        tx.commit().await?;

        self.get_by_id(id).await
    }

    async fn replace_genres(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        book_id: i32,
        genre_ids: &[i32],
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut **tx)
            .await?;

        if genre_ids.is_empty() {
            return Ok(());
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO book_genres (book_id, genre_id)
            SELECT $1, g.id FROM genres g WHERE g.id = ANY($2)
            "#,
        )
        .bind(book_id)
        .bind(genre_ids)
        .execute(&mut **tx)
        .await?;

        let mut distinct = genre_ids.to_vec();
        distinct.sort_unstable();
        distinct.dedup();
        if inserted.rows_affected() != distinct.len() as u64 {
            return Err(AppError::Validation("Unknown genre id".to_string()));
        }

        Ok(())
    }

    /// Delete a book and its copies
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    /// Count books
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count books whose title contains `word`, ignoring case
    pub async fn count_title_containing(&self, word: &str) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE title ILIKE $1")
            .bind(format!("%{}%", escape_like(word)))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// Escape LIKE wildcards so user input matches literally
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("the"), "the");
        assert_eq!(escape_like("100%_done"), "100\\%\\_done");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
