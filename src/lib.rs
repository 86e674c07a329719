//! Local Library Catalog Server
//!
//! REST JSON API for a small library catalog: books, authors, genres and
//! their loanable copies, with lending, returns and librarian renewals of
//! due-back dates.

use std::sync::Arc;

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod renewal;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use clock::Clock;
use repository::Repository;
use services::{redis::RedisService, Services};
use sqlx::{Pool, Postgres};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<Services>,
}

impl AppState {
    /// Wire repositories and services on top of a pool and a Redis client
    pub fn new(
        config: AppConfig,
        pool: Pool<Postgres>,
        redis: RedisService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let services = Services::new(Repository::new(pool), config.auth.clone(), redis, clock);
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}
