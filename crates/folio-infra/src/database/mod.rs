//! SeaORM-backed persistence.

mod connections;
pub mod entity;
mod postgres_base;
pub mod postgres_repo;

use std::sync::Arc;

use sea_orm::DbConn;

use folio_core::services::Repositories;

pub use connections::{DatabaseConfig, connect};
pub use postgres_base::PostgresBaseRepository;
pub use postgres_repo::{
    PostgresCommentRepository, PostgresFollowRepository, PostgresGroupRepository,
    PostgresPostRepository, PostgresUserRepository,
};

/// Every repository over one connection pool.
pub fn repositories(db: DbConn) -> Repositories {
    Repositories {
        users: Arc::new(PostgresUserRepository::new(db.clone())),
        groups: Arc::new(PostgresGroupRepository::new(db.clone())),
        posts: Arc::new(PostgresPostRepository::new(db.clone())),
        comments: Arc::new(PostgresCommentRepository::new(db.clone())),
        follows: Arc::new(PostgresFollowRepository::new(db)),
    }
}

#[cfg(test)]
mod tests;
