use anyhow::Context;
use shelf_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load shelf settings")?;
    shelf_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        backend = ?settings.storage.backend,
        "shelf-app starting"
    );

    shelf_app::bootstrap::serve(settings).await?;

    tracing::info!("shelf-app stopped");
    Ok(())
}
