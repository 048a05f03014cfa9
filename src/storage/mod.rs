//! Article persistence
//!
//! One wide `articles` table with a unique `url`, plus a `batches` ledger so
//! that runs inserting nothing still advance the run number.

pub mod repository;

pub use repository::{
    create_mock_repository, create_sqlite_repository, ArticleRepository, MockArticleRepository,
    SharedArticleRepository, SqliteArticleRepository,
};

use crate::config::DatabaseConfig;
use crate::utils::error::StorageError;

/// Open the configured SQLite store
pub fn open_repository(config: &DatabaseConfig) -> Result<SharedArticleRepository, StorageError> {
    create_sqlite_repository(&config.sqlite_path)
}
