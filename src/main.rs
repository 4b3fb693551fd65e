use anyhow::Result;
use axum::Router;
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting s3-proxy with config: {:?}", cfg);

    // --- Initialize the S3 client from the standard AWS resolution chain ---
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = cfg.region.clone() {
        loader = loader.region(aws_config::Region::new(region));
    }
    let sdk_config = loader.load().await;

    let region = cfg
        .region
        .clone()
        .or_else(|| sdk_config.region().map(|r| r.to_string()))
        .unwrap_or_else(|| "us-east-1".into());
    tracing::debug!("Resolved S3 region => {}", region);

    let mut s3_builder = aws_sdk_s3::config::Builder::from(&sdk_config);
    if let Some(endpoint) = &cfg.endpoint_url {
        tracing::debug!("Using custom S3 endpoint => {}", endpoint);
        s3_builder = s3_builder.endpoint_url(endpoint).force_path_style(true);
    }
    let s3 = aws_sdk_s3::Client::from_conf(s3_builder.build());

    // --- Initialize core service ---
    let client =
        services::storage_client::S3StorageClient::new(s3, region, cfg.endpoint_url.clone());
    let storage = services::storage_service::StorageService::new(Arc::new(client));

    // --- Build router ---
    let app: Router = routes::routes::routes().with_state(storage);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
