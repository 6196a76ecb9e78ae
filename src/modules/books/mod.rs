pub mod covers;
pub mod listing;
pub mod models;
pub mod routes;
pub mod validation;
pub mod views;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use axum::Router;
use shelf_db::BookStore;
use shelf_kernel::settings::Settings;
use shelf_kernel::{InitCtx, Migration, Module};

use covers::{CoverLookup, GoogleBooksClient};
use routes::BooksState;

/// Book tracking pages: listing, add, edit and delete.
pub struct BooksModule {
    state: BooksState,
}

impl BooksModule {
    pub fn new(
        store: Arc<dyn BookStore>,
        covers: Arc<dyn CoverLookup>,
        fallback_cover_url: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            state: BooksState {
                store,
                covers,
                fallback_cover_url: fallback_cover_url.into(),
            },
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            backend = self.state.store.backend(),
            cover_lookup = %ctx.settings.covers.lookup_url,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_create_books",
            up: shelf_db::sqlite::CREATE_BOOKS_TABLE,
        }]
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module, wiring the Google Books cover client from
/// settings.
pub fn create_module(
    store: Arc<dyn BookStore>,
    settings: &Settings,
) -> anyhow::Result<Arc<dyn Module>> {
    let covers = GoogleBooksClient::from_settings(&settings.covers)
        .context("failed to build cover lookup client")?;

    Ok(Arc::new(BooksModule::new(
        store,
        Arc::new(covers),
        settings.covers.fallback_url.as_str(),
    )))
}
