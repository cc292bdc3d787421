use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

use crate::album::{Album, AlbumId, NewAlbum};
use crate::store::migrations::apply_migrations;
use crate::store::{AlbumStore, StoreError, StoreResult};

const ALBUM_SELECT_SQL: &str = "SELECT id, title, artist, price, tax, created_at, updated_at
FROM albums";

/// SQLite-backed album store.
///
/// Rows are soft-deleted through `deleted_at` and every read filters them out. All statements
/// run on the blocking pool against a single connection, one statement per call, in autocommit.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) the database file at `path` and applies the schema.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = tokio::task::spawn_blocking(move || -> StoreResult<Connection> {
            let mut conn = Connection::open(&path)?;
            bootstrap(&mut conn)?;
            info!("Opened database {}", path.display());
            Ok(conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))??;

        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let mut conn = Connection::open_in_memory()?;
        bootstrap(&mut conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn call<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| StoreError::Unavailable("sqlite connection lock poisoned".into()))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?
    }
}

fn bootstrap(conn: &mut Connection) -> StoreResult<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_migrations(conn)
}

fn parse_album_row(row: &Row<'_>) -> rusqlite::Result<Album> {
    let id: i64 = row.get(0)?;
    let created_at: DateTime<Utc> = row.get(5)?;
    let updated_at: DateTime<Utc> = row.get(6)?;

    Ok(Album {
        id: id as AlbumId,
        title: row.get(1)?,
        artist: row.get(2)?,
        price: row.get(3)?,
        tax: row.get(4)?,
        created_at: Some(created_at),
        updated_at: Some(updated_at),
    })
}

fn select_live(conn: &Connection, id: AlbumId) -> StoreResult<Album> {
    // Ids beyond the i64 range can't have been issued by SQLite.
    let Ok(row_id) = i64::try_from(id) else {
        return Err(StoreError::NotFound(id));
    };

    conn.query_row(
        &format!("{ALBUM_SELECT_SQL} WHERE id = ?1 AND deleted_at IS NULL"),
        params![row_id],
        parse_album_row,
    )
    .optional()?
    .ok_or(StoreError::NotFound(id))
}

#[async_trait]
impl AlbumStore for SqliteStore {
    async fn list_all(&self) -> StoreResult<Vec<Album>> {
        self.call(|conn| {
            let mut stmt =
                conn.prepare(&format!("{ALBUM_SELECT_SQL} WHERE deleted_at IS NULL ORDER BY id"))?;
            let albums = stmt
                .query_map([], parse_album_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(albums)
        })
        .await
    }

    async fn get_by_id(&self, id: AlbumId) -> StoreResult<Album> {
        self.call(move |conn| select_live(conn, id)).await
    }

    async fn create(&self, album: NewAlbum) -> StoreResult<Album> {
        self.call(move |conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO albums (title, artist, price, tax, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![album.title, album.artist, album.price, album.tax, now],
            )?;
            let id = conn.last_insert_rowid() as AlbumId;
            debug!("Inserted album {}", id);

            Ok(Album {
                id,
                title: album.title,
                artist: album.artist,
                price: album.price,
                tax: album.tax,
                created_at: Some(now),
                updated_at: Some(now),
            })
        })
        .await
    }

    async fn update(&self, id: AlbumId, album: NewAlbum) -> StoreResult<Album> {
        self.call(move |conn| {
            let Ok(row_id) = i64::try_from(id) else {
                return Err(StoreError::NotFound(id));
            };

            let changed = conn.execute(
                "UPDATE albums
                 SET title = ?1, artist = ?2, price = ?3, tax = ?4, updated_at = ?5
                 WHERE id = ?6 AND deleted_at IS NULL",
                params![
                    album.title,
                    album.artist,
                    album.price,
                    album.tax,
                    Utc::now(),
                    row_id
                ],
            )?;

            if changed == 0 {
                return Err(StoreError::NotFound(id));
            }

            select_live(conn, id)
        })
        .await
    }

    async fn delete(&self, id: AlbumId) -> StoreResult<()> {
        self.call(move |conn| {
            let Ok(row_id) = i64::try_from(id) else {
                return Err(StoreError::NotFound(id));
            };

            let changed = conn.execute(
                "UPDATE albums SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
                params![Utc::now(), row_id],
            )?;

            if changed == 0 {
                return Err(StoreError::NotFound(id));
            }

            debug!("Soft-deleted album {}", id);
            Ok(())
        })
        .await
    }

    async fn count(&self) -> StoreResult<usize> {
        self.call(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM albums WHERE deleted_at IS NULL",
                [],
                |row| row.get(0),
            )?;
            Ok(count as usize)
        })
        .await
    }
}
