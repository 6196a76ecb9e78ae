use anyhow::Context;
use std::future::Future;
use std::sync::Arc;

use crate::module::{InitCtx, Migration, Module};

/// Which lifecycle group a module belongs to. Core modules come up before
/// custom modules and go down after them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Core,
    Custom,
}

impl Tier {
    fn label(self) -> &'static str {
        match self {
            Tier::Core => "core",
            Tier::Custom => "custom",
        }
    }
}

/// Owns every registered module and drives their lifecycle.
///
/// Within a tier, modules are initialized and started in registration order
/// and stopped in reverse.
#[derive(Default)]
pub struct ModuleRegistry {
    core_modules: Vec<Arc<dyn Module>>,
    custom_modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register infrastructure the feature modules depend on (the store).
    pub fn register_core(&mut self, module: Arc<dyn Module>) {
        self.core_modules.push(module);
    }

    /// Register a feature module.
    pub fn register_custom(&mut self, module: Arc<dyn Module>) {
        self.custom_modules.push(module);
    }

    /// Core modules followed by custom modules, in registration order.
    pub fn modules(&self) -> impl Iterator<Item = &Arc<dyn Module>> {
        self.core_modules.iter().chain(self.custom_modules.iter())
    }

    fn tier(&self, tier: Tier) -> &[Arc<dyn Module>] {
        match tier {
            Tier::Core => &self.core_modules,
            Tier::Custom => &self.custom_modules,
        }
    }

    async fn init_tier(&self, tier: Tier, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        for module in self.tier(tier) {
            tracing::info!(module = module.name(), tier = tier.label(), "initializing module");
            module.init(ctx).await.with_context(|| {
                format!("failed to initialize {} module '{}'", tier.label(), module.name())
            })?;
        }
        Ok(())
    }

    async fn start_tier(&self, tier: Tier, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        for module in self.tier(tier) {
            tracing::info!(module = module.name(), tier = tier.label(), "starting module");
            module.start(ctx).await.with_context(|| {
                format!("failed to start {} module '{}'", tier.label(), module.name())
            })?;
        }
        Ok(())
    }

    /// Stop every module of `tier`, continuing past failures. The first
    /// failure is returned.
    async fn stop_tier(&self, tier: Tier) -> anyhow::Result<()> {
        let mut first_error = None;

        for module in self.tier(tier).iter().rev() {
            tracing::info!(module = module.name(), tier = tier.label(), "stopping module");
            if let Err(e) = module.stop().await {
                tracing::error!(module = module.name(), error = %format!("{e:#}"), "module failed to stop");
                first_error.get_or_insert_with(|| {
                    e.context(format!("failed to stop {} module '{}'", tier.label(), module.name()))
                });
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Initialize then start every module: core first, then custom.
    pub async fn start_all(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            core = self.core_modules.len(),
            custom = self.custom_modules.len(),
            "bringing modules up"
        );

        self.init_tier(Tier::Core, ctx).await?;
        self.init_tier(Tier::Custom, ctx).await?;
        self.start_tier(Tier::Core, ctx).await?;
        self.start_tier(Tier::Custom, ctx).await
    }

    /// Stop custom modules, then core modules. Every module is asked to
    /// stop even when an earlier one fails.
    pub async fn stop_all(&self) -> anyhow::Result<()> {
        let custom = self.stop_tier(Tier::Custom).await;
        let core = self.stop_tier(Tier::Core).await;
        custom.and(core)
    }

    /// Bring modules up, drive `serve` to completion and bring them down
    /// again. Modules are stopped whether startup, `serve` or neither
    /// failed; `serve` is never polled if startup fails.
    pub async fn run_until<F>(&self, ctx: &InitCtx<'_>, serve: F) -> anyhow::Result<()>
    where
        F: Future<Output = anyhow::Result<()>>,
    {
        let outcome = match self.start_all(ctx).await {
            Ok(()) => serve.await,
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "startup failed; stopping modules");
                Err(e)
            }
        };

        let stopped = self.stop_all().await;
        outcome.and(stopped)
    }

    /// Every module's migrations tagged with the owning module's name,
    /// ordered by module name then migration id.
    pub fn collect_migrations(&self) -> Vec<(String, Migration)> {
        let mut migrations: Vec<(String, Migration)> = self
            .modules()
            .flat_map(|module| {
                let name = module.name().to_string();
                module
                    .migrations()
                    .into_iter()
                    .map(move |migration| (name.clone(), migration))
            })
            .collect();

        migrations.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(b.1.id)));
        migrations
    }
}
