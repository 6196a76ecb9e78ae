pub mod books;

use std::sync::Arc;

use shelf_db::BookStore;
use shelf_kernel::settings::Settings;
use shelf_kernel::ModuleRegistry;

/// Register all project-specific modules with the registry
pub fn register_all(
    registry: &mut ModuleRegistry,
    store: Arc<dyn BookStore>,
    settings: &Settings,
) -> anyhow::Result<()> {
    registry.register_custom(books::create_module(store, settings)?);
    Ok(())
}
