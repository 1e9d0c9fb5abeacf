use clipshelf_api::setup;
use clipshelf_api::telemetry::{init_telemetry, LogFormat};
use clipshelf_core::Config;

// Use mimalloc as the global allocator for better performance and lower fragmentation,
// especially when running on musl-based systems inside containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    init_telemetry(LogFormat::from_env())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded and validated successfully");

    let (_state, router) = setup::initialize_app(config.clone()).await?;

    setup::server::start_server(&config, router).await
}
