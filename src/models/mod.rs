//! Data models for the catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;
pub mod user;

// Re-export commonly used types
pub use author::Author;
pub use book::{Book, BookShort};
pub use book_instance::{BookInstance, BookInstanceDetails, LoanStatus};
pub use genre::Genre;
pub use user::{User, UserClaims};
