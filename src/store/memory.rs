use async_trait::async_trait;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::album::{Album, AlbumId, NewAlbum};
use crate::store::{AlbumStore, StoreError, StoreResult};

/// The MemoryStore keeps albums in insertion order behind a mutex, so it can be shared and cloned
/// cheaply across concurrent handlers. Deleted albums are removed physically; the id counter only
/// moves forward, so an id is never handed out twice.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<InnerStore>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        let state = State {
            albums: Vec::new(),
            next_id: 1,
        };

        Self {
            inner: Arc::new(InnerStore {
                state: Mutex::new(state),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

pub struct InnerStore {
    state: Mutex<State>,
}

pub struct InnerStoreLocked<'a> {
    state: MutexGuard<'a, State>,
}

impl<'a> InnerStoreLocked<'a> {
    pub fn insert(&mut self, album: NewAlbum) -> Album {
        let id = self.state.next_id;
        self.state.next_id += 1;

        let album = Album {
            id,
            title: album.title,
            artist: album.artist,
            price: album.price,
            tax: album.tax,
            created_at: None,
            updated_at: None,
        };
        self.state.albums.push(album.clone());
        album
    }

    pub fn get(&self, id: AlbumId) -> Option<&Album> {
        self.state.albums.iter().find(|album| album.id == id)
    }

    pub fn get_mut(&mut self, id: AlbumId) -> Option<&mut Album> {
        self.state.albums.iter_mut().find(|album| album.id == id)
    }

    pub fn remove(&mut self, id: AlbumId) -> Option<Album> {
        let position = self.state.albums.iter().position(|album| album.id == id)?;
        Some(self.state.albums.remove(position))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Album> {
        self.state.albums.iter()
    }

    pub fn size(&self) -> usize {
        self.state.albums.len()
    }
}

impl Deref for MemoryStore {
    type Target = InnerStore;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl InnerStore {
    pub fn lock(&self) -> StoreResult<InnerStoreLocked<'_>> {
        let state = self
            .state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        Ok(InnerStoreLocked { state })
    }
}

struct State {
    albums: Vec<Album>,
    next_id: AlbumId,
}

#[async_trait]
impl AlbumStore for MemoryStore {
    async fn list_all(&self) -> StoreResult<Vec<Album>> {
        Ok(self.lock()?.iter().cloned().collect())
    }

    async fn get_by_id(&self, id: AlbumId) -> StoreResult<Album> {
        self.lock()?
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn create(&self, album: NewAlbum) -> StoreResult<Album> {
        Ok(self.lock()?.insert(album))
    }

    async fn update(&self, id: AlbumId, album: NewAlbum) -> StoreResult<Album> {
        let mut store = self.lock()?;
        let stored = store.get_mut(id).ok_or(StoreError::NotFound(id))?;
        stored.apply(album);
        Ok(stored.clone())
    }

    async fn delete(&self, id: AlbumId) -> StoreResult<()> {
        self.lock()?
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    async fn count(&self) -> StoreResult<usize> {
        Ok(self.lock()?.size())
    }
}
