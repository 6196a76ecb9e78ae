//! Application startup and shutdown sequence.

use std::sync::Arc;

use anyhow::Context;
use shelf_db::BookStore;
use shelf_kernel::settings::Settings;
use shelf_kernel::{InitCtx, ModuleRegistry};

use crate::modules;

/// Register the core `db` module and every custom module around `store`.
pub fn build_registry(store: Arc<dyn BookStore>, settings: &Settings) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    registry.register_core(shelf_db::create_module(store.clone()));
    modules::register_all(&mut registry, store, settings)?;
    Ok(registry)
}

/// Open the configured store, build the registry and apply pending
/// migrations.
pub async fn prepare(settings: &Settings) -> anyhow::Result<(Arc<dyn BookStore>, ModuleRegistry)> {
    let store = shelf_db::open(&settings.storage).await?;
    let registry = build_registry(store.clone(), settings)?;

    shelf_db::run_migrations(store.as_ref(), &registry.collect_migrations())
        .await
        .context("failed to apply migrations")?;

    Ok((store, registry))
}

/// Run the web application until a shutdown signal arrives.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let (_store, registry) = prepare(&settings).await?;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry
        .run_until(&ctx, shelf_http::start_server(&registry, &settings))
        .await
}
