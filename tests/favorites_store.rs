mod common;

use cineverse::favorites::{
    FavoritesError, FavoritesStorage, FavoritesStore, FileStorage, MemoryStorage, SortOrder,
};
use common::{movie, rated};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[test]
fn starts_empty_without_a_record() {
    let store = FavoritesStore::open(MemoryStorage::default()).unwrap();
    assert!(store.is_empty());
    assert!(!store.contains(1));
}

#[test]
fn add_then_remove_tracks_membership() {
    let store = FavoritesStore::open(MemoryStorage::default()).unwrap();

    assert!(store.add(movie(1, "Test Movie")).unwrap());
    assert!(store.contains(1));
    assert_eq!(store.len(), 1);

    assert_eq!(store.remove(1).unwrap(), 1);
    assert!(!store.contains(1));
    assert!(store.is_empty());
}

#[test]
fn adding_the_same_id_twice_keeps_one_entry() {
    let store = FavoritesStore::open(MemoryStorage::default()).unwrap();
    assert!(store.add(movie(1, "Test Movie")).unwrap());
    assert!(!store.add(movie(1, "Test Movie (re-fetched)")).unwrap());
    assert_eq!(store.len(), 1);
    assert_eq!(store.list()[0].title, "Test Movie");
}

#[test]
fn remove_clears_duplicates_already_on_disk() {
    let record = serde_json::json!({
        "favorites": [movie(7, "Dup"), movie(7, "Dup"), movie(8, "Other")]
    })
    .to_string();
    let store = FavoritesStore::open(MemoryStorage::with_record(record)).unwrap();
    assert_eq!(store.len(), 3);
    assert_eq!(store.remove(7).unwrap(), 2);
    assert_eq!(store.list().iter().map(|m| m.id).collect::<Vec<_>>(), vec![8]);
}

#[test]
fn every_mutation_rewrites_the_full_record() {
    let storage = Arc::new(MemoryStorage::default());
    let store = FavoritesStore::open(storage.clone()).unwrap();

    store.add(movie(1, "One")).unwrap();
    store.add(movie(2, "Two")).unwrap();
    store.remove(1).unwrap();
    store.add(movie(3, "Three")).unwrap();

    let reloaded = FavoritesStore::open(MemoryStorage::with_record(storage.record().unwrap()))
        .unwrap();
    let mut ids: Vec<i64> = reloaded.list().iter().map(|m| m.id).collect();
    ids.sort();
    assert_eq!(ids, vec![2, 3]);
    assert_eq!(reloaded.list(), store.list());
}

#[test]
fn toggle_flips_membership() {
    let store = FavoritesStore::open(MemoryStorage::default()).unwrap();
    assert!(store.toggle(movie(5, "Five")).unwrap());
    assert!(store.contains(5));
    assert!(!store.toggle(movie(5, "Five")).unwrap());
    assert!(!store.contains(5));
}

#[test]
fn corrupt_record_is_fatal_on_open() {
    let result = FavoritesStore::open(MemoryStorage::with_record("{not json"));
    assert!(matches!(result, Err(FavoritesError::Corrupt(_))));
}

#[test]
fn open_or_reset_replaces_a_corrupt_record() {
    let storage = Arc::new(MemoryStorage::with_record("{not json"));
    let store = FavoritesStore::open_or_reset(storage.clone()).unwrap();
    assert!(store.is_empty());
    assert_eq!(storage.record().as_deref(), Some(r#"{"favorites":[]}"#));
}

struct FlakyStorage {
    inner: MemoryStorage,
    fail: AtomicBool,
}

impl FavoritesStorage for FlakyStorage {
    fn load(&self) -> io::Result<Option<String>> {
        self.inner.load()
    }

    fn save(&self, record: &str) -> io::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        self.inner.save(record)
    }
}

#[test]
fn failed_save_leaves_committed_state_untouched() {
    let storage = Arc::new(FlakyStorage {
        inner: MemoryStorage::default(),
        fail: AtomicBool::new(false),
    });
    let store = FavoritesStore::open(storage.clone()).unwrap();
    store.add(movie(1, "Kept")).unwrap();

    storage.fail.store(true, Ordering::SeqCst);
    assert!(matches!(store.add(movie(2, "Lost")), Err(FavoritesError::Io(_))));
    assert!(matches!(store.remove(1), Err(FavoritesError::Io(_))));

    assert!(store.contains(1));
    assert!(!store.contains(2));
    let on_disk = storage.inner.record().unwrap();
    assert!(on_disk.contains("Kept"));
    assert!(!on_disk.contains("Lost"));
}

#[test]
fn observers_see_each_committed_snapshot() {
    let store = FavoritesStore::open(MemoryStorage::default()).unwrap();
    let mut rx = store.subscribe();
    assert!(rx.borrow_and_update().is_empty());

    store.add(movie(1, "One")).unwrap();
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().len(), 1);

    // A duplicate add commits nothing.
    store.add(movie(1, "One")).unwrap();
    assert!(!rx.has_changed().unwrap());

    store.remove(1).unwrap();
    assert!(rx.borrow_and_update().is_empty());
}

#[test]
fn sorted_views_follow_the_chosen_order() {
    let store = FavoritesStore::open(MemoryStorage::default()).unwrap();
    store.add(rated(1, "Zodiac", 7.7)).unwrap();
    store.add(rated(2, "alien", 8.5)).unwrap();
    store.add(rated(3, "Memento", 8.4)).unwrap();

    let titles = |order| {
        store
            .sorted(order)
            .into_iter()
            .map(|m| m.title)
            .collect::<Vec<_>>()
    };
    assert_eq!(titles(SortOrder::TitleAsc), vec!["alien", "Memento", "Zodiac"]);
    assert_eq!(titles(SortOrder::TitleDesc), vec!["Zodiac", "Memento", "alien"]);
    assert_eq!(titles(SortOrder::RatingDesc), vec!["alien", "Memento", "Zodiac"]);
    assert_eq!(titles(SortOrder::RatingAsc), vec!["Zodiac", "Memento", "alien"]);
}

#[test]
fn file_storage_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/favorites.json");

    let store = FavoritesStore::open(FileStorage::new(&path)).unwrap();
    store.add(movie(42, "On Disk")).unwrap();
    drop(store);

    let reopened = FavoritesStore::open(FileStorage::new(&path)).unwrap();
    assert!(reopened.contains(42));
    assert_eq!(reopened.list()[0].release_date, movie(42, "On Disk").release_date);
}

#[test]
fn file_storage_reports_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("favorites.json");
    std::fs::write(&path, "[{\"id\": \"oops\"}]").unwrap();
    assert!(matches!(
        FavoritesStore::open(FileStorage::new(&path)),
        Err(FavoritesError::Corrupt(_))
    ));
}

#[test]
fn concurrent_mutations_lose_no_updates() {
    let storage = Arc::new(MemoryStorage::default());
    let store = Arc::new(FavoritesStore::open(storage.clone()).unwrap());
    for id in 1000..1008 {
        store.add(movie(id, "Doomed")).unwrap();
    }

    let mut handles = Vec::new();
    for id in 0..32 {
        let store = store.clone();
        handles.push(std::thread::spawn(move || {
            store.add(movie(id, &format!("Movie {id}"))).unwrap();
        }));
    }
    for id in 1000..1008 {
        let store = store.clone();
        handles.push(std::thread::spawn(move || {
            assert_eq!(store.remove(id).unwrap(), 1);
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    let reloaded = FavoritesStore::open(MemoryStorage::with_record(storage.record().unwrap()))
        .unwrap();
    let mut ids: Vec<i64> = reloaded.list().iter().map(|m| m.id).collect();
    ids.sort();
    assert_eq!(ids, (0..32).collect::<Vec<_>>());
    assert_eq!(store.len(), 32);
}

#[test]
fn removing_an_absent_id_writes_and_publishes_nothing() {
    let storage = Arc::new(FlakyStorage {
        inner: MemoryStorage::default(),
        fail: AtomicBool::new(false),
    });
    let store = FavoritesStore::open(storage.clone()).unwrap();
    store.add(movie(1, "Kept")).unwrap();
    let mut rx = store.subscribe();
    rx.borrow_and_update();

    // A save attempt would fail, so Ok proves none was made.
    storage.fail.store(true, Ordering::SeqCst);
    assert_eq!(store.remove(99).unwrap(), 0);
    assert!(!rx.has_changed().unwrap());
    assert!(store.contains(1));
}
