//! Defines routes for the S3 proxy operations.
//!
//! ## Structure
//! - **Proxy endpoints**
//!   - `POST /s3/{bucket}` — create the bucket and wait for readiness
//!   - `GET  /s3?bucket={bucket}` — list objects with derived metadata
//!
//! - **Operational endpoints**
//!   - `GET /healthz` — liveness
//!   - `GET /readyz`  — readiness (provider reachability)

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        s3_handlers::{create_bucket, list_objects},
    },
    services::storage_service::StorageService,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build and return the router for all proxy routes.
///
/// The router carries shared state (`StorageService`) to all handlers.
pub fn routes() -> Router<StorageService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // proxy endpoints
        .route("/s3", get(list_objects))
        .route("/s3/{bucket}", post(create_bucket))
}
