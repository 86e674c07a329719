//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{book_instance::BookInstance, genre::Genre};

/// Book row joined with its author's names
#[derive(Debug, Clone, FromRow)]
pub struct BookRow {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author_id: Option<i32>,
    pub author_first_name: Option<String>,
    pub author_last_name: Option<String>,
}

/// Author reference embedded in book payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuthorRef {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
}

/// Book as stored, with its author resolved
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author: Option<AuthorRef>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        let author = match (row.author_id, row.author_first_name, row.author_last_name) {
            (Some(id), Some(first_name), Some(last_name)) => Some(AuthorRef {
                id,
                first_name,
                last_name,
            }),
            _ => None,
        };

        Book {
            id: row.id,
            title: row.title,
            summary: row.summary,
            isbn: row.isbn,
            author,
        }
    }
}

/// Short book representation for lists
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookShort {
    pub id: i32,
    pub title: String,
    pub author_id: Option<i32>,
    pub author_name: Option<String>,
}

/// Book with genres and copies, for the detail view
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub genres: Vec<Genre>,
    /// Comma separated genre names
    pub genre: String,
    pub instances: Vec<BookInstance>,
}

impl BookDetails {
    pub fn new(book: Book, genres: Vec<Genre>, instances: Vec<BookInstance>) -> Self {
        let genre = genres
            .iter()
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            book,
            genres,
            genre,
            instances,
        }
    }
}

/// Book query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Case-insensitive title filter
    pub title: Option<String>,
    pub page: Option<i64>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    pub author_id: Option<i32>,
    #[validate(length(max = 1000, message = "Summary must be at most 1000 characters"))]
    #[serde(default)]
    pub summary: String,
    /// 13 character ISBN
    #[validate(length(equal = 13, message = "ISBN must be 13 characters"))]
    pub isbn: String,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}

/// Update book request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    pub author_id: Option<i32>,
    #[validate(length(max = 1000, message = "Summary must be at most 1000 characters"))]
    pub summary: Option<String>,
    #[validate(length(equal = 13, message = "ISBN must be 13 characters"))]
    pub isbn: Option<String>,
    /// Replaces the genre set when present
    pub genre_ids: Option<Vec<i32>>,
}
