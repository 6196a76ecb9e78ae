//! Flat JSON file record store.
//!
//! The whole file is read on every operation and rewritten on every write
//! through a sibling temp file + rename. Writers inside one process are
//! serialized; there is no locking across processes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shelf_kernel::Migration;
use tokio::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::record::{rating_in_range, Book, BookFields, BookId};
use crate::BookStore;

/// On-disk layout of the record file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RecordFile {
    #[serde(default)]
    next_id: BookId,
    #[serde(default)]
    books: Vec<Book>,
}

impl RecordFile {
    fn allocate_id(&mut self) -> BookId {
        // Files written by hand may omit `next_id`.
        let floor = self.books.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        let id = self.next_id.max(floor);
        self.next_id = id + 1;
        id
    }
}

pub struct JsonFileBookStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileBookStore {
    /// Open the record file at `path`, creating its directory if needed. A
    /// missing file is treated as an empty store.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let store = Self {
            path,
            write_lock: Mutex::new(()),
        };
        // Fail fast on a corrupt file rather than on the first request.
        store.read().await?;
        Ok(store)
    }

    async fn read(&self) -> StoreResult<RecordFile> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(RecordFile::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RecordFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, file: &RecordFile) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(file)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

fn guard_rating(fields: &BookFields) -> StoreResult<()> {
    if rating_in_range(fields.rating) {
        Ok(())
    } else {
        Err(StoreError::RatingOutOfRange(fields.rating))
    }
}

#[async_trait]
impl BookStore for JsonFileBookStore {
    fn backend(&self) -> &'static str {
        "json"
    }

    async fn apply_migration(&self, module: &str, migration: &Migration) -> StoreResult<bool> {
        tracing::debug!(
            module,
            migration = migration.id,
            "record file has no schema; skipping migration"
        );
        Ok(false)
    }

    async fn list(&self) -> StoreResult<Vec<Book>> {
        Ok(self.read().await?.books)
    }

    async fn get(&self, id: BookId) -> StoreResult<Option<Book>> {
        Ok(self.read().await?.books.into_iter().find(|b| b.id == id))
    }

    async fn insert(&self, fields: BookFields) -> StoreResult<Book> {
        guard_rating(&fields)?;

        let _guard = self.write_lock.lock().await;
        let mut file = self.read().await?;
        let book = fields.into_book(file.allocate_id());
        file.books.push(book.clone());
        self.write(&file).await?;

        Ok(book)
    }

    async fn update(&self, id: BookId, fields: BookFields) -> StoreResult<bool> {
        guard_rating(&fields)?;

        let _guard = self.write_lock.lock().await;
        let mut file = self.read().await?;
        let Some(slot) = file.books.iter_mut().find(|b| b.id == id) else {
            return Ok(false);
        };
        *slot = fields.into_book(id);
        self.write(&file).await?;

        Ok(true)
    }

    async fn delete(&self, id: BookId) -> StoreResult<bool> {
        let _guard = self.write_lock.lock().await;
        let mut file = self.read().await?;
        let before = file.books.len();
        file.books.retain(|b| b.id != id);
        if file.books.len() == before {
            return Ok(false);
        }
        self.write(&file).await?;

        Ok(true)
    }

    async fn close(&self) {
        tracing::debug!(path = %self.path.display(), "record file store closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(title: &str, rating: i64) -> BookFields {
        BookFields {
            title: title.to_string(),
            author: "Someone".to_string(),
            rating,
            cover_id: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn missing_file_is_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileBookStore::open(dir.path().join("nested/books.json"))
            .await
            .unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ids_are_sequential_and_not_reused_after_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileBookStore::open(dir.path().join("books.json"))
            .await
            .unwrap();

        let a = store.insert(fields("A", 1)).await.unwrap();
        let b = store.insert(fields("B", 2)).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        assert!(store.delete(b.id).await.unwrap());
        let c = store.insert(fields("C", 3)).await.unwrap();
        assert_eq!(c.id, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_are_serialized() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(
            JsonFileBookStore::open(dir.path().join("books.json"))
                .await
                .unwrap(),
        );

        let mut writers = tokio::task::JoinSet::new();
        for n in 0..16 {
            let store = store.clone();
            writers.spawn(async move { store.insert(fields(&format!("Book {n}"), 3)).await });
        }

        let mut ids = Vec::new();
        while let Some(joined) = writers.join_next().await {
            ids.push(joined.unwrap().unwrap().id);
        }
        ids.sort_unstable();
        assert_eq!(ids, (1..=16).collect::<Vec<BookId>>());

        let mut stored: Vec<BookId> = store.list().await.unwrap().iter().map(|b| b.id).collect();
        stored.sort_unstable();
        assert_eq!(stored, ids);
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.json");
        let created = {
            let store = JsonFileBookStore::open(&path).await.unwrap();
            store
                .insert(BookFields {
                    cover_id: Some("0451524934".to_string()),
                    ..fields("1984", 4)
                })
                .await
                .unwrap()
        };

        let reopened = JsonFileBookStore::open(&path).await.unwrap();
        assert_eq!(reopened.get(created.id).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn rating_guard_mirrors_check_constraint() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileBookStore::open(dir.path().join("books.json"))
            .await
            .unwrap();

        let err = store.insert(fields("Dune", 6)).await.unwrap_err();
        assert!(matches!(err, StoreError::RatingOutOfRange(6)));

        let created = store.insert(fields("Dune", 2)).await.unwrap();
        assert!(store.update(created.id, fields("Dune", 0)).await.is_err());
        assert_eq!(store.get(created.id).await.unwrap().unwrap().rating, 2);
    }

    #[tokio::test]
    async fn update_and_delete_of_missing_ids_are_noops() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileBookStore::open(dir.path().join("books.json"))
            .await
            .unwrap();
        let kept = store.insert(fields("Emma", 5)).await.unwrap();

        assert!(!store.update(99, fields("Ghost", 3)).await.unwrap());
        assert!(!store.delete(99).await.unwrap());
        assert_eq!(store.list().await.unwrap(), vec![kept]);
    }

    #[tokio::test]
    async fn corrupt_file_fails_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = JsonFileBookStore::open(&path).await.err().unwrap();
        assert!(matches!(err, StoreError::Format(_)));
    }
}
