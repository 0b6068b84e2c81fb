use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::api::{create_router, AppState};
use crate::cache::TableCache;
use crate::config::Config;
use crate::services::DashboardService;

/// Running dashboard server
pub struct Application {
    pub server_handle: JoinHandle<Result<(), std::io::Error>>,
}

impl Application {
    /// Build the service graph, warm the table cache and spawn the HTTP server
    ///
    /// A failed warm-up is logged, not fatal: the page reports the error and
    /// the next request retries the load.
    pub async fn build(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        info!("Initializing application components");

        let cache = TableCache::new();
        let dashboard_service = DashboardService::new(config.data_dir.clone(), cache);

        match dashboard_service.table().await {
            Ok(table) => info!(
                "Preloaded {} rows from {}",
                table.len(),
                table.source().display()
            ),
            Err(e) => warn!(
                "Could not preload data from {}: {}",
                config.data_dir.display(),
                e
            ),
        }

        let app_state = AppState { dashboard_service };
        let app = create_router(app_state).layer(TraceLayer::new_for_http());

        let addr = config.server_addr();
        info!("Starting HTTP server on {}", addr);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        let server_handle = tokio::spawn(async move { axum::serve(listener, app).await });

        info!("Application initialized successfully");
        Ok(Self { server_handle })
    }

    /// Run until the server stops
    pub async fn run_until_stopped(self) -> Result<(), Box<dyn std::error::Error>> {
        self.server_handle.await??;
        Ok(())
    }
}
