use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// AWS region override; falls back to the SDK's own resolution chain.
    pub region: Option<String>,
    /// Custom S3-compatible endpoint (minio and friends). Implies path-style
    /// addressing.
    pub endpoint_url: Option<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "HTTP proxy for S3 bucket and object-listing operations")]
pub struct Args {
    /// Host to bind to (overrides S3_PROXY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides S3_PROXY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// AWS region (overrides S3_PROXY_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Custom S3-compatible endpoint URL (overrides S3_PROXY_ENDPOINT_URL)
    #[arg(long)]
    pub endpoint_url: Option<String>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("S3_PROXY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("S3_PROXY_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing S3_PROXY_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading S3_PROXY_PORT"),
        };
        let env_region = env::var("S3_PROXY_REGION").ok();
        let env_endpoint = env::var("S3_PROXY_ENDPOINT_URL").ok();

        // --- Merge ---
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            region: args.region.or(env_region),
            endpoint_url: args.endpoint_url.or(env_endpoint),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addr_joins_host_and_port() {
        let cfg = AppConfig {
            host: "127.0.0.1".into(),
            port: 8080,
            region: None,
            endpoint_url: None,
        };
        assert_eq!(cfg.addr(), "127.0.0.1:8080");
    }
}
