use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;

use albumstore::album::{Album, NewAlbum};
use albumstore::store::{AlbumStore, MemoryStore, SqliteStore, StoreError};

fn random_album() -> NewAlbum {
    let mut rng = rand::thread_rng();
    let mut word = |len: usize| -> String {
        (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    };

    let title = word(12);
    let artist = word(8);
    let price = rng.gen_range(0..100_000) as f64 / 100.0;
    let tax = rng.gen_range(0..50) as f64 / 100.0;

    NewAlbum::new(title, artist, price).with_tax(tax)
}

fn same_fields(album: &Album, expected: &NewAlbum) -> bool {
    album.title == expected.title
        && album.artist == expected.artist
        && album.price == expected.price
        && album.tax == expected.tax
}

async fn create_then_get(store: &dyn AlbumStore) {
    for _ in 0..20 {
        let input = random_album();

        let created = store.create(input.clone()).await.unwrap();
        let fetched = store.get_by_id(created.id).await.unwrap();

        assert_ne!(created.id, 0);
        assert!(same_fields(&created, &input));
        assert_eq!(fetched, created);
    }
}

async fn unknown_id_is_not_found(store: &dyn AlbumStore) {
    let created = store.create(random_album()).await.unwrap();
    let unknown = created.id + 1000;

    assert_eq!(
        store.get_by_id(unknown).await,
        Err(StoreError::NotFound(unknown))
    );
}

async fn delete_hides_album(store: &dyn AlbumStore) {
    let keep = store.create(random_album()).await.unwrap();
    let gone = store.create(random_album()).await.unwrap();

    store.delete(gone.id).await.unwrap();

    assert_eq!(
        store.get_by_id(gone.id).await,
        Err(StoreError::NotFound(gone.id))
    );
    assert_eq!(
        store.delete(gone.id).await,
        Err(StoreError::NotFound(gone.id))
    );

    let ids: Vec<_> = store
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|album| album.id)
        .collect();
    assert!(ids.contains(&keep.id));
    assert!(!ids.contains(&gone.id));
}

async fn update_missing_leaves_store_unchanged(store: &dyn AlbumStore) {
    store.create(random_album()).await.unwrap();
    let before = store.list_all().await.unwrap();

    let missing = 424242;
    assert_eq!(
        store.update(missing, random_album()).await,
        Err(StoreError::NotFound(missing))
    );

    assert_eq!(store.list_all().await.unwrap(), before);
}

async fn update_replaces_fields(store: &dyn AlbumStore) {
    let created = store.create(random_album()).await.unwrap();
    let replacement = random_album();

    let updated = store.update(created.id, replacement.clone()).await.unwrap();

    assert_eq!(updated.id, created.id);
    assert!(same_fields(&updated, &replacement));
    assert_eq!(store.get_by_id(created.id).await.unwrap(), updated);
}

async fn list_is_ordered_by_id(store: &dyn AlbumStore) {
    for _ in 0..5 {
        store.create(random_album()).await.unwrap();
    }

    let ids: Vec<_> = store
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|album| album.id)
        .collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();

    assert_eq!(ids, sorted);
    assert_eq!(store.count().await.unwrap(), ids.len());
}

async fn concurrent_creates_get_distinct_ids(store: Arc<dyn AlbumStore>) {
    let handles: Vec<_> = (0..32)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.create(random_album()).await.unwrap().id })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        assert!(ids.insert(handle.await.unwrap()));
    }
    assert_eq!(ids.len(), 32);
}

macro_rules! store_contract {
    ($name:ident, $store:expr) => {
        mod $name {
            use super::*;

            #[tokio::test]
            async fn create_then_get() {
                super::create_then_get(&$store).await;
            }

            #[tokio::test]
            async fn unknown_id_is_not_found() {
                super::unknown_id_is_not_found(&$store).await;
            }

            #[tokio::test]
            async fn delete_hides_album() {
                super::delete_hides_album(&$store).await;
            }

            #[tokio::test]
            async fn update_missing_leaves_store_unchanged() {
                super::update_missing_leaves_store_unchanged(&$store).await;
            }

            #[tokio::test]
            async fn update_replaces_fields() {
                super::update_replaces_fields(&$store).await;
            }

            #[tokio::test]
            async fn list_is_ordered_by_id() {
                super::list_is_ordered_by_id(&$store).await;
            }

            #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
            async fn concurrent_creates_get_distinct_ids() {
                super::concurrent_creates_get_distinct_ids(Arc::new($store)).await;
            }
        }
    };
}

store_contract!(memory, MemoryStore::new());
store_contract!(sqlite, SqliteStore::open_in_memory().unwrap());

#[tokio::test]
async fn sqlite_file_store_honours_contract() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("contract.db")).await.unwrap();

    create_then_get(&store).await;
    delete_hides_album(&store).await;
    update_missing_leaves_store_unchanged(&store).await;
}
