//! Home page counters

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult, models::book_instance::LoanStatus, repository::Repository,
    services::redis::RedisService,
};

/// Catalog counters shown on the home page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogCounts {
    pub num_books: i64,
    pub num_instances: i64,
    pub num_instances_available: i64,
    pub num_authors: i64,
    pub num_genres: i64,
    /// Books with "the" in their title
    pub num_book_the: i64,
    /// Earlier visits to the home page by this visitor
    pub num_visits: i64,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
    redis: RedisService,
}

impl StatsService {
    pub fn new(repository: Repository, redis: RedisService) -> Self {
        Self { repository, redis }
    }

    /// Counters for the home page; records the visit
    pub async fn index(&self, user_id: Option<i32>) -> AppResult<CatalogCounts> {
        let visitor = visitor_key(user_id);
        let num_visits = match self.redis.record_visit(&visitor).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("Visit counter unavailable: {}", e);
                0
            }
        };

        Ok(CatalogCounts {
            num_books: self.repository.books.count().await?,
            num_instances: self.repository.book_instances.count().await?,
            num_instances_available: self
                .repository
                .book_instances
                .count_by_status(LoanStatus::Available)
                .await?,
            num_authors: self.repository.authors.count().await?,
            num_genres: self.repository.genres.count().await?,
            num_book_the: self.repository.books.count_title_containing("the").await?,
            num_visits,
        })
    }
}

fn visitor_key(user_id: Option<i32>) -> String {
    match user_id {
        Some(id) => format!("user:{}", id),
        None => "anonymous".to_string(),
    }
}
