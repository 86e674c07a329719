//! Business logic services

pub mod catalog;
pub mod loans;
pub mod redis;
pub mod renewal;
pub mod stats;
pub mod users;

use std::sync::Arc;

use crate::{clock::Clock, config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub renewal: renewal::RenewalService,
    pub users: users::UsersService,
    pub stats: stats::StatsService,
    /// Source of "today" for loan and renewal dates
    pub clock: Arc<dyn Clock>,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        redis_service: redis::RedisService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let book_instances = Arc::new(repository.book_instances.clone());
        let user_lookup = Arc::new(repository.users.clone());

        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(book_instances.clone(), user_lookup),
            renewal: renewal::RenewalService::new(book_instances),
            users: users::UsersService::new(repository.clone(), auth_config),
            stats: stats::StatsService::new(repository, redis_service),
            clock,
        }
    }
}
