//! HTTP handlers for the proxy's bucket and listing operations.
//! Parameter validation happens here; everything else is delegated to
//! `StorageService`.

use crate::{
    errors::AppError, models::object_view::ObjectView,
    services::storage_service::StorageService,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

/// Query params accepted by the listing endpoint.
#[derive(Debug, Deserialize)]
pub struct ListObjectsQuery {
    pub bucket: Option<String>,
}

/// POST `/s3/{bucket}` — create the bucket and wait until it is available.
///
/// Empty body on success; provider rejections and waiter timeouts surface as
/// HTTP errors.
pub async fn create_bucket(
    State(service): State<StorageService>,
    Path(bucket): Path<String>,
) -> Result<StatusCode, AppError> {
    service.create_bucket(&bucket).await?;
    Ok(StatusCode::OK)
}

/// GET `/s3?bucket={bucket}` — list the bucket's objects as view records.
///
/// The `bucket` query parameter is required; the response order carries no
/// meaning.
pub async fn list_objects(
    State(service): State<StorageService>,
    Query(query): Query<ListObjectsQuery>,
) -> Result<Json<Vec<ObjectView>>, AppError> {
    let bucket = query
        .bucket
        .filter(|bucket| !bucket.is_empty())
        .ok_or_else(|| {
            AppError::new(
                StatusCode::BAD_REQUEST,
                "missing required query parameter `bucket`",
            )
        })?;

    let views = service.list_objects(&bucket).await?;
    Ok(Json(views))
}
