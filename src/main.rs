use tracing::{info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wacc_dashboard::app::Application;
use wacc_dashboard::config::Config;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables (ignore errors if .env is missing)
    dotenvy::dotenv().ok();

    // Initialize tracing with environment filter support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,wacc_dashboard=debug")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .init();

    let config = Config::from_env();
    info!("Starting WACC dashboard with config: {:?}", config);

    Application::build(config).await?.run_until_stopped().await
}
