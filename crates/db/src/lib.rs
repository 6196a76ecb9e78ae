//! Record store for book entries.
//!
//! Two media are supported behind the [`BookStore`] trait: a SQLite table
//! (`books`) and a flat JSON file. Handlers only ever see the trait object,
//! so listing, validation and cover resolution stay independent of where
//! the records live.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use shelf_kernel::settings::{StorageBackend, StorageSettings};
use shelf_kernel::{InitCtx, Migration, Module};

pub mod error;
pub mod json_file;
pub mod record;
pub mod sqlite;

pub use error::{StoreError, StoreResult};
pub use json_file::JsonFileBookStore;
pub use record::{rating_in_range, Book, BookFields, BookId, MAX_RATING, MIN_RATING};
pub use sqlite::SqliteBookStore;

/// Persistence interface shared by every backing medium.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Short backend name used in logs.
    fn backend(&self) -> &'static str;

    /// Apply one module migration if it has not been applied yet.
    /// Returns `true` when the migration ran.
    async fn apply_migration(&self, module: &str, migration: &Migration) -> StoreResult<bool>;

    /// All records in storage order.
    async fn list(&self) -> StoreResult<Vec<Book>>;

    async fn get(&self, id: BookId) -> StoreResult<Option<Book>>;

    /// Persist a new record; the store assigns its identifier.
    async fn insert(&self, fields: BookFields) -> StoreResult<Book>;

    /// Overwrite a record in place. Returns `false` if no such record exists.
    async fn update(&self, id: BookId, fields: BookFields) -> StoreResult<bool>;

    /// Remove a record. Returns `false` if no such record existed.
    async fn delete(&self, id: BookId) -> StoreResult<bool>;

    /// Release the underlying resources. Called once on shutdown.
    async fn close(&self);
}

/// Open the store selected by `settings.backend`.
pub async fn open(settings: &StorageSettings) -> anyhow::Result<Arc<dyn BookStore>> {
    let store: Arc<dyn BookStore> = match settings.backend {
        StorageBackend::Sqlite => Arc::new(
            SqliteBookStore::connect(&settings.database_url)
                .await
                .with_context(|| format!("failed to open sqlite store at {}", settings.database_url))?,
        ),
        StorageBackend::Json => Arc::new(
            JsonFileBookStore::open(&settings.json_path)
                .await
                .with_context(|| {
                    format!("failed to open record file {}", settings.json_path.display())
                })?,
        ),
    };

    tracing::info!(backend = store.backend(), "record store opened");
    Ok(store)
}

/// Apply migrations collected from the module registry, in order.
pub async fn run_migrations(
    store: &dyn BookStore,
    migrations: &[(String, Migration)],
) -> anyhow::Result<()> {
    for (module, migration) in migrations {
        let applied = store
            .apply_migration(module, migration)
            .await
            .with_context(|| format!("migration {}/{} failed", module, migration.id))?;

        if applied {
            tracing::info!(module = %module, migration = migration.id, "migration applied");
        } else {
            tracing::debug!(module = %module, migration = migration.id, "migration already applied");
        }
    }

    Ok(())
}

/// Core module owning the store lifecycle: the store is opened before the
/// registry is built and closed when this module stops.
pub struct StoreModule {
    store: Arc<dyn BookStore>,
}

impl StoreModule {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for StoreModule {
    fn name(&self) -> &'static str {
        "db"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            backend = self.store.backend(),
            environment = ?ctx.settings.environment,
            "db module initialized"
        );
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.store.close().await;
        tracing::info!(module = self.name(), "record store closed");
        Ok(())
    }
}

/// Create the core `db` module for an opened store.
pub fn create_module(store: Arc<dyn BookStore>) -> Arc<dyn Module> {
    Arc::new(StoreModule::new(store))
}
