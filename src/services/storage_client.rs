//! Narrow abstraction over the object-storage provider.
//!
//! The service layer only ever talks to [`StorageClient`], so the projection
//! and public-read logic can be exercised against an in-memory fake. The one
//! production implementation wraps the AWS SDK S3 client and maps SDK
//! failures into [`StorageError`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::client::Waiters;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::types::{Grant, Permission as S3Permission, Type as GranteeType};
use thiserror::Error;

use crate::models::acl::{AclGrant, Grantee, Permission};

/// Upper bound on the bucket-existence wait. The SDK polls HeadBucket
/// underneath until the bucket shows up or this elapses.
const BUCKET_READY_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("bucket `{name}` invalid: {reason}")]
    InvalidBucketName { name: String, reason: String },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("bucket already exists: {0}")]
    BucketAlreadyExists(String),
    #[error("bucket `{bucket}` did not become ready: {reason}")]
    BucketNotReady { bucket: String, reason: String },
    #[error("storage provider error: {0}")]
    Provider(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Capability set the proxy needs from the storage provider.
///
/// Deliberately minimal: create + wait-ready for provisioning, and the four
/// read paths (keys, user metadata, URL, ACL) the object projection is built
/// from, plus a reachability probe for the readiness endpoint.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Issue a bucket-creation request. Durable side effect at the provider.
    async fn create_bucket(&self, name: &str) -> StorageResult<()>;

    /// Block until the provider reports the bucket exists, bounded by the
    /// client's waiter timeout.
    async fn wait_until_bucket_exists(&self, name: &str) -> StorageResult<()>;

    /// Enumerate every object key in the bucket, following provider
    /// continuation tokens internally.
    async fn list_object_keys(&self, bucket: &str) -> StorageResult<Vec<String>>;

    /// User-defined metadata attached to an object. Empty map when none.
    async fn object_metadata(
        &self,
        bucket: &str,
        key: &str,
    ) -> StorageResult<HashMap<String, String>>;

    /// Provider-style URL for retrieving the object bytes.
    fn object_url(&self, bucket: &str, key: &str) -> String;

    /// The object's access-control grants, grantee identity canonicalized.
    async fn object_acl(&self, bucket: &str, key: &str) -> StorageResult<Vec<AclGrant>>;

    /// Cheap reachability probe against the provider.
    async fn check_ready(&self) -> StorageResult<()>;
}

/// [`StorageClient`] backed by `aws_sdk_s3`.
#[derive(Clone)]
pub struct S3StorageClient {
    client: aws_sdk_s3::Client,
    region: String,
    endpoint_url: Option<String>,
}

impl S3StorageClient {
    pub fn new(
        client: aws_sdk_s3::Client,
        region: impl Into<String>,
        endpoint_url: Option<String>,
    ) -> Self {
        Self {
            client,
            region: region.into(),
            endpoint_url: endpoint_url.map(|url| url.trim_end_matches('/').to_string()),
        }
    }
}

#[async_trait]
impl StorageClient for S3StorageClient {
    async fn create_bucket(&self, name: &str) -> StorageResult<()> {
        self.client
            .create_bucket()
            .bucket(name)
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    async fn wait_until_bucket_exists(&self, name: &str) -> StorageResult<()> {
        self.client
            .wait_until_bucket_exists()
            .bucket(name)
            .wait(BUCKET_READY_TIMEOUT)
            .await
            .map_err(|err| StorageError::BucketNotReady {
                bucket: name.to_string(),
                reason: err.to_string(),
            })?;
        Ok(())
    }

    async fn list_object_keys(&self, bucket: &str) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation_token = None;
        loop {
            let mut req = self.client.list_objects_v2().bucket(bucket);
            if let Some(token) = continuation_token {
                req = req.continuation_token(token);
            }
            let resp = req.send().await.map_err(map_sdk_error)?;
            for obj in resp.contents() {
                if let Some(key) = obj.key() {
                    keys.push(key.to_string());
                }
            }
            continuation_token = resp.next_continuation_token;
            if continuation_token.is_none() {
                break;
            }
        }
        Ok(keys)
    }

    async fn object_metadata(
        &self,
        bucket: &str,
        key: &str,
    ) -> StorageResult<HashMap<String, String>> {
        let output = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(output.metadata().cloned().unwrap_or_default())
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        match &self.endpoint_url {
            // Path-style under a custom endpoint (minio and friends).
            Some(endpoint) => format!("{endpoint}/{bucket}/{key}"),
            None => format!("https://{bucket}.s3.{}.amazonaws.com/{key}", self.region),
        }
    }

    async fn object_acl(&self, bucket: &str, key: &str) -> StorageResult<Vec<AclGrant>> {
        let output = self
            .client
            .get_object_acl()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(output.grants().iter().filter_map(grant_from_sdk).collect())
    }

    async fn check_ready(&self) -> StorageResult<()> {
        self.client
            .list_buckets()
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }
}

/// Translate an SDK grant into the domain representation.
///
/// Grants with no grantee or permission, and grantee/permission kinds the SDK
/// reports as unknown, are dropped rather than guessed at.
fn grant_from_sdk(grant: &Grant) -> Option<AclGrant> {
    let sdk_grantee = grant.grantee()?;
    let permission = match grant.permission()? {
        S3Permission::Read => Permission::Read,
        S3Permission::Write => Permission::Write,
        S3Permission::ReadAcp => Permission::ReadAcp,
        S3Permission::WriteAcp => Permission::WriteAcp,
        S3Permission::FullControl => Permission::FullControl,
        _ => return None,
    };
    let grantee = match sdk_grantee.r#type() {
        GranteeType::Group => Grantee::group(sdk_grantee.uri()?),
        GranteeType::CanonicalUser => Grantee::CanonicalUser {
            id: sdk_grantee.id()?.to_string(),
        },
        GranteeType::AmazonCustomerByEmail => Grantee::Email {
            address: sdk_grantee.email_address()?.to_string(),
        },
        _ => return None,
    };
    Some(AclGrant { grantee, permission })
}

/// Map an SDK operation failure onto the error taxonomy by provider error
/// code, keeping the full error chain in the message.
fn map_sdk_error<E>(err: SdkError<E>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let code = err.code().map(str::to_owned);
    let message = DisplayErrorContext(&err).to_string();
    match code.as_deref() {
        Some("NoSuchBucket") | Some("NoSuchKey") | Some("NotFound") => {
            StorageError::NotFound(message)
        }
        Some("AccessDenied") => StorageError::AccessDenied(message),
        Some("BucketAlreadyExists") | Some("BucketAlreadyOwnedByYou") => {
            StorageError::BucketAlreadyExists(message)
        }
        _ => StorageError::Provider(message),
    }
}
