mod handlers;
mod types;
mod state;
pub use handlers::*;
pub use types::*;
pub use state::*;

use tokio::net::TcpListener;
use axum::{
    Router,
    routing::get
};
use tower_http::cors::{Any, CorsLayer};
use std::sync::Arc;
use std::net::SocketAddr;
use object_store::ObjectStore;
use tracing::info;
use anyhow::Result;
use std::time::Duration;
use crate::Config;

/// Routes served by [`serve`], separate so tests can drive them without a socket.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_check))
        .route("/sources", get(get_sources))

        // Chart data
        .route("/boxplot", get(get_boxplot))
        .route("/details", get(get_group_details))
        .route("/locations", get(get_locations))
        .route("/regions", get(get_regions))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(host: String, port: u16, store: Arc<dyn ObjectStore>, config: Config) -> Result<()> {
    let state = Arc::new(AppState::new(store, config));
    let app = router(state);

    let addr = format!("{}:{}", host, port)
        .parse::<SocketAddr>()?;

    let listener = TcpListener::bind(&addr).await?;

    info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
