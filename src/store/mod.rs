//! Album data access.
//!
//! [`AlbumStore`] is the contract both front ends consume. Two implementations exist:
//! [`MemoryStore`] keeps albums in a mutex-guarded vector and removes them physically on delete,
//! [`SqliteStore`] persists them in SQLite, maintains timestamps and soft-deletes rows. Deleted
//! albums are invisible to every operation in both, and ids are never handed out twice.

pub mod memory;
pub mod migrations;
pub mod sqlite;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error as ThisError;
use tracing::info;

use crate::album::{seed_albums, Album, AlbumId, NewAlbum};
use crate::config::{Config, StoreKind};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A store instance shared by every handler of both front ends.
pub type SharedStore = Arc<dyn AlbumStore>;

#[derive(Debug, ThisError, PartialEq)]
pub enum StoreError {
    #[error("album {0} not found")]
    NotFound(AlbumId),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

#[async_trait]
pub trait AlbumStore: Send + Sync {
    /// Every live album. Memory stores return insertion order, SQLite orders by id.
    async fn list_all(&self) -> StoreResult<Vec<Album>>;

    async fn get_by_id(&self, id: AlbumId) -> StoreResult<Album>;

    /// Stores `album` under a freshly assigned id and returns the stored record.
    async fn create(&self, album: NewAlbum) -> StoreResult<Album>;

    /// Overwrites every field of album `id` except the id itself.
    async fn update(&self, id: AlbumId, album: NewAlbum) -> StoreResult<Album>;

    async fn delete(&self, id: AlbumId) -> StoreResult<()>;

    async fn count(&self) -> StoreResult<usize>;
}

/// Fills an empty store with the seed catalog. A store that already holds albums is left as is.
pub async fn seed(store: &dyn AlbumStore) -> StoreResult<usize> {
    if store.count().await? > 0 {
        return Ok(0);
    }

    let albums = seed_albums();
    let seeded = albums.len();
    for album in albums {
        store.create(album).await?;
    }

    info!("Seeded store with {} albums", seeded);
    Ok(seeded)
}

/// Builds the store selected by `config`, applying the schema and the seed catalog as configured.
pub async fn open_store(config: &Config) -> StoreResult<SharedStore> {
    let store: SharedStore = match config.store {
        StoreKind::Memory => {
            info!("Using in-memory store");
            Arc::new(MemoryStore::new())
        }
        StoreKind::Sqlite => {
            info!("Using SQLite store at {}", config.database_path.display());
            Arc::new(SqliteStore::open(&config.database_path).await?)
        }
    };

    if !config.no_seed {
        seed(store.as_ref()).await?;
    }

    Ok(store)
}
