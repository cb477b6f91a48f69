use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use paystream_client::{HttpAgentApi, ProofLedger, Secp256k1Signer};
use paystream_server::config::ServerConfig;
use paystream_server::routes::{AppState, app_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env().context("loading configuration")?;

    let ledger = Arc::new(ProofLedger::new());
    let mut api = HttpAgentApi::new(&config.base_url, ledger.clone())
        .context("building upstream client")?;
    if let Some(api_key) = &config.api_key {
        api = api.with_api_key(api_key.clone());
    }
    if let (Some(network), Some(private_key)) = (&config.network, &config.private_key) {
        let signer = Secp256k1Signer::from_hex(private_key).context("loading signing key")?;
        api = api.with_signer(network.clone(), Arc::new(signer));
        info!("payment signing enabled on network {network}");
    }

    let state = AppState {
        api: Arc::new(api),
        ledger,
    };
    let app = app_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("paystream proxy listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
