#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use taskgraph::config::AnalysisConfig;
    use taskgraph::http_api::{self, AppState};
    use taskgraph::persistence::JsonDirStore;
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr: SocketAddr = std::env::var("TASKGRAPH_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;
    let data_dir = std::env::var("TASKGRAPH_DATA_DIR").unwrap_or_else(|_| "./data".to_string());

    let config = AnalysisConfig::from_env()?;
    let store = JsonDirStore::new(&data_dir)?;
    tracing::info!(data_dir = %data_dir, "using JSON project store");

    http_api::serve(addr, AppState::new(Arc::new(store), config)).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
