//! Catalog service: books, authors, genres and copies

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{check_lifespan, Author, AuthorDetails, CreateAuthor, UpdateAuthor},
        book::{Book, BookDetails, BookQuery, BookShort, CreateBook, UpdateBook},
        book_instance::{BookInstance, CreateBookInstance, LoanStatus},
        genre::{CreateGenre, Genre},
    },
    repository::Repository,
};

/// Page size of book and author listings
pub const CATALOG_PER_PAGE: i64 = 4;

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Round-trip to the database
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.repository.pool).await?;
        Ok(())
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    pub async fn list_books(&self, query: &BookQuery) -> AppResult<(Vec<BookShort>, i64)> {
        self.repository.books.list(query, CATALOG_PER_PAGE).await
    }

    /// Book with its genres and copies
    pub async fn get_book(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.repository.books.get_by_id(id).await?;
        let genres = self.repository.books.genres(id).await?;
        let instances = self.repository.book_instances.list_for_book(id).await?;

        Ok(BookDetails::new(book, genres, instances))
    }

    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        if let Some(author_id) = book.author_id {
            self.ensure_author(author_id).await?;
        }
        let created = self.repository.books.create(&book).await?;
        tracing::info!(book_id = created.id, "Book created");
        Ok(created)
    }

    pub async fn update_book(&self, id: i32, book: UpdateBook) -> AppResult<Book> {
        if let Some(author_id) = book.author_id {
            self.ensure_author(author_id).await?;
        }
        self.repository.books.update(id, &book).await
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }

    async fn ensure_author(&self, author_id: i32) -> AppResult<()> {
        if !self.repository.authors.exists(author_id).await? {
            return Err(AppError::Validation(format!("Unknown author id {}", author_id)));
        }
        Ok(())
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    pub async fn list_authors(&self, page: Option<i64>) -> AppResult<(Vec<Author>, i64)> {
        self.repository.authors.list(page, CATALOG_PER_PAGE).await
    }

    /// Author with their books
    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetails> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.authors.books(id).await?;
        Ok(AuthorDetails::new(author, books))
    }

    pub async fn create_author(&self, author: CreateAuthor) -> AppResult<Author> {
        check_lifespan(author.date_of_birth, author.date_of_death)?;
        self.repository.authors.create(&author).await
    }

    pub async fn update_author(&self, id: i32, author: UpdateAuthor) -> AppResult<Author> {
        let current = self.repository.authors.get_by_id(id).await?;
        let (date_of_birth, date_of_death) = author.merged_dates(&current);
        check_lifespan(date_of_birth, date_of_death)?;
        self.repository.authors.update(id, &author).await
    }

    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!(author_id = id, "Author deleted");
        Ok(())
    }

    // =========================================================================
    // GENRES
    // =========================================================================

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.list().await
    }

    pub async fn create_genre(&self, genre: CreateGenre) -> AppResult<Genre> {
        self.repository.genres.create(&genre).await
    }

    // =========================================================================
    // COPIES
    // =========================================================================

    /// Register a new copy of an existing book
    pub async fn create_instance(
        &self,
        book_id: i32,
        instance: CreateBookInstance,
    ) -> AppResult<BookInstance> {
        if instance.status == Some(LoanStatus::OnLoan) {
            return Err(AppError::Validation(
                "A new copy cannot start on loan".to_string(),
            ));
        }
        self.repository.books.get_by_id(book_id).await?;
        self.repository.book_instances.create(book_id, &instance).await
    }
}
