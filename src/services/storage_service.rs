//! StorageService — the proxy's two operations against the external store:
//! bucket provisioning (create + wait until ready) and object listing with
//! per-object projection. All state lives at the provider; this layer only
//! validates input, delegates through [`StorageClient`], and shapes results.

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::info;

use crate::models::acl::is_public_read;
use crate::models::object_view::ObjectView;
use crate::services::storage_client::{StorageClient, StorageError, StorageResult};

/// Metadata field carrying an object's display name.
const NAME_METADATA_KEY: &str = "name";

/// Cap on concurrent per-object metadata/ACL fetches within one listing.
const MAX_PROJECTION_CONCURRENCY: usize = 16;

const BUCKET_NAME_MIN_LEN: usize = 3;
const BUCKET_NAME_MAX_LEN: usize = 63;

/// StorageService provides the proxy operations:
/// - Create a bucket and block until the provider reports it exists
/// - List a bucket's objects, projecting each into an [`ObjectView`]
///
/// Listing fans out per-object reads concurrently; the fan-out is bounded and
/// all-or-nothing, so a single failed projection fails the whole listing
/// rather than returning a partial result.
#[derive(Clone)]
pub struct StorageService {
    client: Arc<dyn StorageClient>,
}

impl StorageService {
    pub fn new(client: Arc<dyn StorageClient>) -> Self {
        Self { client }
    }

    /// Create `name` at the provider and wait for it to become available.
    ///
    /// The name is validated locally first, so malformed requests never reach
    /// the provider. Creation rejections and waiter timeouts propagate
    /// unchanged; there is no retry and no partial-success state.
    pub async fn create_bucket(&self, name: &str) -> StorageResult<()> {
        ensure_bucket_name_valid(name)?;

        self.client.create_bucket(name).await?;
        info!("Request to create bucket `{}` sent", name);

        self.client.wait_until_bucket_exists(name).await?;
        info!("Bucket `{}` is ready", name);

        Ok(())
    }

    /// List every object in `bucket` as an [`ObjectView`].
    ///
    /// Projections run concurrently under a fixed cap and complete in no
    /// particular order; callers must not depend on ordering. An empty bucket
    /// yields an empty vector. A missing or inaccessible bucket, or any
    /// single object whose metadata/ACL read fails, fails the entire listing.
    pub async fn list_objects(&self, bucket: &str) -> StorageResult<Vec<ObjectView>> {
        ensure_bucket_name_valid(bucket)?;

        let keys = self.client.list_object_keys(bucket).await?;
        let views: Vec<ObjectView> = stream::iter(keys)
            .map(|key| self.project_object(bucket, key))
            .buffer_unordered(MAX_PROJECTION_CONCURRENCY)
            .try_collect()
            .await?;

        info!("Found {} objects in bucket `{}`", views.len(), bucket);
        Ok(views)
    }

    /// Provider reachability, surfaced by the readiness endpoint.
    pub async fn check_ready(&self) -> StorageResult<()> {
        self.client.check_ready().await
    }

    /// Build the view for one object from live provider state.
    async fn project_object(&self, bucket: &str, key: String) -> StorageResult<ObjectView> {
        let metadata = self.client.object_metadata(bucket, &key).await?;
        let grants = self.client.object_acl(bucket, &key).await?;

        Ok(ObjectView {
            name: metadata.get(NAME_METADATA_KEY).cloned(),
            url: self.client.object_url(bucket, &key),
            is_public: is_public_read(&grants),
            key,
        })
    }
}

/// Validate bucket name format.
///
/// Enforces S3-like naming rules:
/// - 3–63 characters
/// - lowercase letters, digits, dots, hyphens only
/// - cannot start/end with dot or hyphen
/// - cannot contain consecutive dots or dot-hyphen patterns
/// - cannot look like an IPv4 address
fn ensure_bucket_name_valid(name: &str) -> StorageResult<()> {
    let invalid = |reason: &str| StorageError::InvalidBucketName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim() != name {
        return Err(invalid("cannot begin or end with whitespace"));
    }

    if name.len() < BUCKET_NAME_MIN_LEN || name.len() > BUCKET_NAME_MAX_LEN {
        return Err(invalid("must be between 3 and 63 characters"));
    }

    if !name
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '.' | '-'))
    {
        return Err(invalid(
            "allowed characters are lowercase letters, digits, dots, and hyphens",
        ));
    }

    if name.starts_with('.') || name.ends_with('.') || name.starts_with('-') || name.ends_with('-')
    {
        return Err(invalid("must start and end with a lowercase letter or digit"));
    }

    if name.contains("..") || name.contains("-.") || name.contains(".-") {
        return Err(invalid(
            "cannot contain consecutive dots or dot-hyphen combinations",
        ));
    }

    if is_ipv4_like(name) {
        return Err(invalid("must not be formatted like an IP address"));
    }

    Ok(())
}

/// Check if a string matches IPv4-like dotted decimal form.
/// Rejects names formatted like `1.2.3.4`.
fn is_ipv4_like(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() != 4 {
        return false;
    }
    parts.iter().all(|segment| {
        !segment.is_empty()
            && segment.len() <= 3
            && segment.chars().all(|c| c.is_ascii_digit())
            && segment.parse::<u8>().is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::acl::{AclGrant, Grantee, Permission, public_read_grant};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    struct FakeObject {
        key: &'static str,
        metadata: &'static [(&'static str, &'static str)],
        grants: Vec<AclGrant>,
    }

    /// In-memory provider: a map of bucket name to objects, recording
    /// provisioning calls so tests can assert ordering and short-circuits.
    #[derive(Default)]
    struct FakeStorageClient {
        buckets: HashMap<String, Vec<FakeObject>>,
        calls: Mutex<Vec<String>>,
        fail_acl_for: Option<&'static str>,
    }

    impl FakeStorageClient {
        fn with_bucket(name: &str, objects: Vec<FakeObject>) -> Self {
            Self {
                buckets: HashMap::from([(name.to_string(), objects)]),
                ..Self::default()
            }
        }

        fn find(&self, bucket: &str, key: &str) -> StorageResult<FakeObject> {
            self.buckets
                .get(bucket)
                .and_then(|objects| objects.iter().find(|o| o.key == key))
                .cloned()
                .ok_or_else(|| StorageError::NotFound(format!("{bucket}/{key}")))
        }
    }

    #[async_trait]
    impl StorageClient for FakeStorageClient {
        async fn create_bucket(&self, name: &str) -> StorageResult<()> {
            self.calls.lock().unwrap().push(format!("create:{name}"));
            Ok(())
        }

        async fn wait_until_bucket_exists(&self, name: &str) -> StorageResult<()> {
            self.calls.lock().unwrap().push(format!("wait:{name}"));
            Ok(())
        }

        async fn list_object_keys(&self, bucket: &str) -> StorageResult<Vec<String>> {
            self.buckets
                .get(bucket)
                .map(|objects| objects.iter().map(|o| o.key.to_string()).collect())
                .ok_or_else(|| StorageError::NotFound(format!("bucket `{bucket}`")))
        }

        async fn object_metadata(
            &self,
            bucket: &str,
            key: &str,
        ) -> StorageResult<HashMap<String, String>> {
            let object = self.find(bucket, key)?;
            Ok(object
                .metadata
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect())
        }

        fn object_url(&self, bucket: &str, key: &str) -> String {
            format!("https://{bucket}.s3.test/{key}")
        }

        async fn object_acl(&self, bucket: &str, key: &str) -> StorageResult<Vec<AclGrant>> {
            if self.fail_acl_for == Some(key) {
                return Err(StorageError::Provider(format!("acl fetch failed for {key}")));
            }
            Ok(self.find(bucket, key)?.grants)
        }

        async fn check_ready(&self) -> StorageResult<()> {
            Ok(())
        }
    }

    fn owner_full_control() -> AclGrant {
        AclGrant {
            grantee: Grantee::CanonicalUser {
                id: "owner-canonical-id".into(),
            },
            permission: Permission::FullControl,
        }
    }

    fn service_with(fake: FakeStorageClient) -> (StorageService, Arc<FakeStorageClient>) {
        let fake = Arc::new(fake);
        (StorageService::new(fake.clone()), fake)
    }

    #[tokio::test]
    async fn create_bucket_sends_request_then_waits() {
        let (service, fake) = service_with(FakeStorageClient::default());
        service.create_bucket("new-bucket").await.unwrap();
        assert_eq!(
            *fake.calls.lock().unwrap(),
            vec!["create:new-bucket", "wait:new-bucket"]
        );
    }

    #[tokio::test]
    async fn invalid_bucket_name_never_reaches_provider() {
        let (service, fake) = service_with(FakeStorageClient::default());
        let err = service.create_bucket("Bad_Bucket").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidBucketName { .. }));
        assert!(fake.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn listing_empty_bucket_yields_empty_vec() {
        let (service, _) = service_with(FakeStorageClient::with_bucket("photos", vec![]));
        assert_eq!(service.list_objects("photos").await.unwrap(), vec![]);
    }

    #[tokio::test]
    async fn listing_unknown_bucket_is_an_error() {
        let (service, _) = service_with(FakeStorageClient::default());
        let err = service.list_objects("nope-bucket").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn public_object_projects_name_url_and_flag() {
        let object = FakeObject {
            key: "a.jpg",
            metadata: &[("name", "Sunset")],
            grants: vec![public_read_grant()],
        };
        let (service, _) = service_with(FakeStorageClient::with_bucket("photos", vec![object]));

        let views = service.list_objects("photos").await.unwrap();
        assert_eq!(
            views,
            vec![ObjectView {
                name: Some("Sunset".into()),
                key: "a.jpg".into(),
                url: "https://photos.s3.test/a.jpg".into(),
                is_public: true,
            }]
        );
    }

    #[tokio::test]
    async fn owner_only_object_is_private() {
        let object = FakeObject {
            key: "a.jpg",
            metadata: &[("name", "Sunset")],
            grants: vec![owner_full_control()],
        };
        let (service, _) = service_with(FakeStorageClient::with_bucket("photos", vec![object]));

        let views = service.list_objects("photos").await.unwrap();
        assert!(!views[0].is_public);
    }

    #[tokio::test]
    async fn missing_name_metadata_projects_as_none() {
        let object = FakeObject {
            key: "b.jpg",
            metadata: &[("author", "someone")],
            grants: vec![],
        };
        let (service, _) = service_with(FakeStorageClient::with_bucket("photos", vec![object]));

        let views = service.list_objects("photos").await.unwrap();
        assert_eq!(views[0].name, None);
    }

    #[tokio::test]
    async fn single_acl_failure_aborts_whole_listing() {
        let objects = vec![
            FakeObject {
                key: "ok.jpg",
                metadata: &[],
                grants: vec![],
            },
            FakeObject {
                key: "broken.jpg",
                metadata: &[],
                grants: vec![],
            },
        ];
        let mut fake = FakeStorageClient::with_bucket("photos", objects);
        fake.fail_acl_for = Some("broken.jpg");
        let (service, _) = service_with(fake);

        let err = service.list_objects("photos").await.unwrap_err();
        assert!(matches!(err, StorageError::Provider(_)));
    }

    #[tokio::test]
    async fn projection_is_stable_across_listings() {
        let objects = vec![
            FakeObject {
                key: "a.jpg",
                metadata: &[("name", "Sunset")],
                grants: vec![public_read_grant()],
            },
            FakeObject {
                key: "b.jpg",
                metadata: &[],
                grants: vec![owner_full_control()],
            },
        ];
        let (service, _) = service_with(FakeStorageClient::with_bucket("photos", objects));

        let mut first = service.list_objects("photos").await.unwrap();
        let mut second = service.list_objects("photos").await.unwrap();
        first.sort_by(|a, b| a.key.cmp(&b.key));
        second.sort_by(|a, b| a.key.cmp(&b.key));
        assert_eq!(first, second);
    }

    #[test]
    fn bucket_name_rules() {
        assert!(ensure_bucket_name_valid("photos").is_ok());
        assert!(ensure_bucket_name_valid("my.bucket-01").is_ok());

        assert!(ensure_bucket_name_valid("ab").is_err());
        assert!(ensure_bucket_name_valid(&"a".repeat(64)).is_err());
        assert!(ensure_bucket_name_valid("Photos").is_err());
        assert!(ensure_bucket_name_valid("pho tos").is_err());
        assert!(ensure_bucket_name_valid(".photos").is_err());
        assert!(ensure_bucket_name_valid("photos-").is_err());
        assert!(ensure_bucket_name_valid("pho..tos").is_err());
        assert!(ensure_bucket_name_valid("pho.-tos").is_err());
        assert!(ensure_bucket_name_valid("192.168.0.1").is_err());
    }
}
