//! AWS S3 storage backend implementation
//!
//! The SDK is async while [`StorageApiSync`] is blocking, so [`S3Storage`]
//! owns a current-thread tokio runtime and drives each request to completion
//! on it. Do not call it from inside another tokio runtime.

use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    primitives::ByteStream,
    Client as S3Client,
};

use crate::error::{StorageError, StorageResult};
use crate::storage::constants::DEFAULT_BUCKET;
use crate::storage::storage_api::{utils, StorageApiSync, StorageBackend};
use bytes::Bytes;
use tokio::runtime::Runtime;

/// S3 storage configuration
#[derive(Debug, Clone)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,
    /// AWS region
    pub region: String,
    /// AWS access key ID (optional, falls back to the default provider chain)
    pub access_key_id: Option<String>,
    /// AWS secret access key (optional, falls back to the default provider chain)
    pub secret_access_key: Option<String>,
    /// S3 endpoint URL (for S3-compatible services such as LocalStack or MinIO)
    pub endpoint_url: Option<String>,
    /// Enable path-style addressing
    pub path_style: bool,
    /// Issue a HeadBucket request when the backend is created
    pub verify_bucket: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            region: "us-east-1".to_string(),
            access_key_id: None,
            secret_access_key: None,
            endpoint_url: None,
            path_style: false,
            verify_bucket: true,
        }
    }
}

impl S3Config {
    /// Build a configuration from the process environment
    ///
    /// Reads `RECIPES_BUCKET`, `AWS_REGION`, `AWS_ENDPOINT_URL`,
    /// `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY`. A custom endpoint turns
    /// on path-style addressing, which S3-compatible services expect.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        let endpoint_url = var("AWS_ENDPOINT_URL");

        Self {
            bucket: var("RECIPES_BUCKET").unwrap_or(defaults.bucket),
            region: var("AWS_REGION").unwrap_or(defaults.region),
            access_key_id: var("AWS_ACCESS_KEY_ID"),
            secret_access_key: var("AWS_SECRET_ACCESS_KEY"),
            path_style: endpoint_url.is_some(),
            endpoint_url,
            verify_bucket: defaults.verify_bucket,
        }
    }
}

/// S3 storage backend
pub struct S3Storage {
    client: S3Client,
    config: S3Config,
    runtime: Runtime,
}

impl std::fmt::Debug for S3Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Storage")
            .field("bucket", &self.config.bucket)
            .field("region", &self.config.region)
            .field("endpoint_url", &self.config.endpoint_url)
            .finish()
    }
}

impl S3Storage {
    /// Create a new S3 storage backend
    pub fn new(config: S3Config) -> StorageResult<Self> {
        let runtime = build_runtime()?;

        let sdk_config = runtime.block_on(Self::build_aws_config(&config));
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.path_style)
            .build();
        let client = S3Client::from_conf(s3_config);

        let storage = Self {
            client,
            config,
            runtime,
        };

        if storage.config.verify_bucket {
            storage.verify_bucket_access()?;
        }

        tracing::info!(
            bucket = %storage.config.bucket,
            region = %storage.config.region,
            "s3 storage ready"
        );
        Ok(storage)
    }

    /// Wrap an already configured client
    ///
    /// Only `config.bucket` is used; the client carries region, credentials
    /// and endpoint. No bucket verification is performed.
    pub fn from_client(client: S3Client, config: S3Config) -> StorageResult<Self> {
        Ok(Self {
            client,
            config,
            runtime: build_runtime()?,
        })
    }

    /// Bucket this backend reads and writes
    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }

    /// Build AWS configuration
    async fn build_aws_config(config: &S3Config) -> aws_config::SdkConfig {
        let mut builder = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            builder = builder.credentials_provider(aws_sdk_s3::config::Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "recipe-store",
            ));
        }

        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        builder.load().await
    }

    fn verify_bucket_access(&self) -> StorageResult<()> {
        let bucket = &self.config.bucket;
        self.runtime
            .block_on(self.client.head_bucket().bucket(bucket).send())
            .map(|_| ())
            .map_err(|e| StorageError::ConnectionError {
                reason: format!(
                    "Cannot access S3 bucket '{}': {}",
                    bucket,
                    DisplayErrorContext(&e)
                ),
            })
    }
}

fn build_runtime() -> StorageResult<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| StorageError::OperationFailed {
            operation: "build_runtime".to_string(),
            reason: e.to_string(),
        })
}

/// Classify an SDK failure into the storage error taxonomy
fn map_sdk_error<E, R>(operation: &str, key: &str, err: SdkError<E, R>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let reason = format!("{}", DisplayErrorContext(&err));

    let mapped = match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
            StorageError::ConnectionError { reason }
        }
        _ => match err.code() {
            Some("NoSuchKey") | Some("NotFound") => {
                return StorageError::ResourceNotFound {
                    resource: key.to_string(),
                }
            }
            Some("AccessDenied") => StorageError::PermissionDenied {
                resource: key.to_string(),
            },
            Some("InvalidAccessKeyId") | Some("SignatureDoesNotMatch") | Some("ExpiredToken") => {
                StorageError::AuthenticationFailed { reason }
            }
            _ => StorageError::OperationFailed {
                operation: operation.to_string(),
                reason,
            },
        },
    };

    tracing::warn!(operation, key, error = %mapped, "s3 request failed");
    mapped
}

impl StorageApiSync for S3Storage {
    fn put(&self, key: &str, data: Bytes) -> StorageResult<()> {
        utils::validate_key(key)?;

        let request = self
            .client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type("application/json")
            .body(ByteStream::from(data));

        self.runtime
            .block_on(request.send())
            .map_err(|e| map_sdk_error("put_object", key, e))?;

        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<Bytes> {
        utils::validate_key(key)?;

        self.runtime.block_on(async {
            let response = self
                .client
                .get_object()
                .bucket(&self.config.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| match e {
                    SdkError::ServiceError(ref service_err)
                        if service_err.err().is_no_such_key() =>
                    {
                        StorageError::ResourceNotFound {
                            resource: key.to_string(),
                        }
                    }
                    other => map_sdk_error("get_object", key, other),
                })?;

            let data = response
                .body
                .collect()
                .await
                .map_err(|e| StorageError::ConnectionError {
                    reason: format!("Failed to read object body for {}: {}", key, e),
                })?;

            Ok(data.into_bytes())
        })
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        utils::validate_key(key)?;

        // S3 answers 204 for absent keys as well
        self.runtime
            .block_on(
                self.client
                    .delete_object()
                    .bucket(&self.config.bucket)
                    .key(key)
                    .send(),
            )
            .map_err(|e| map_sdk_error("delete_object", key, e))?;

        Ok(())
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        utils::validate_key(key)?;

        let response = self.runtime.block_on(
            self.client
                .head_object()
                .bucket(&self.config.bucket)
                .key(key)
                .send(),
        );

        match response {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(ref service_err)) if service_err.err().is_not_found() => {
                Ok(false)
            }
            Err(e) => match map_sdk_error("head_object", key, e) {
                StorageError::ResourceNotFound { .. } => Ok(false),
                other => Err(other),
            },
        }
    }

    fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.runtime.block_on(async {
            let mut keys = Vec::new();
            let mut continuation_token: Option<String> = None;

            loop {
                let mut request = self.client.list_objects_v2().bucket(&self.config.bucket);
                if !prefix.is_empty() {
                    request = request.prefix(prefix);
                }
                if let Some(token) = continuation_token.take() {
                    request = request.continuation_token(token);
                }

                let response = request
                    .send()
                    .await
                    .map_err(|e| map_sdk_error("list_objects_v2", prefix, e))?;

                keys.extend(
                    response
                        .contents()
                        .iter()
                        .filter_map(|obj| obj.key().map(str::to_string)),
                );

                match (response.is_truncated(), response.next_continuation_token()) {
                    (Some(true), Some(token)) => continuation_token = Some(token.to_string()),
                    _ => break,
                }
            }

            keys.sort();
            Ok(keys)
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecipeError;
    use crate::{Recipe, RecipeStore};
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::operation::delete_object::DeleteObjectOutput;
    use aws_sdk_s3::operation::get_object::{GetObjectError, GetObjectOutput};
    use aws_sdk_s3::operation::head_object::{HeadObjectError, HeadObjectOutput};
    use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
    use aws_sdk_s3::operation::put_object::PutObjectOutput;
    use aws_sdk_s3::types::error::{NoSuchKey, NotFound};
    use aws_sdk_s3::types::Object;
    use aws_smithy_mocks::{mock, mock_client, RuleMode};

    const NACHOS_BODY: &[u8] = br#"{"name": "nachos", "instructions": "Melt cheese on chips"}"#;

    fn stub_storage(client: S3Client) -> S3Storage {
        S3Storage::from_client(client, S3Config::default()).unwrap()
    }

    fn no_such_key() -> GetObjectError {
        GetObjectError::NoSuchKey(NoSuchKey::builder().build())
    }

    #[test]
    fn test_s3_config_default() {
        let config = S3Config::default();
        assert_eq!(config.bucket, "recipes");
        assert_eq!(config.region, "us-east-1");
        assert!(config.endpoint_url.is_none());
        assert!(!config.path_style);
        assert!(config.verify_bucket);
    }

    #[test]
    fn test_s3_storage_unreachable_endpoint() {
        let config = S3Config {
            bucket: "test-bucket".to_string(),
            access_key_id: Some("test".to_string()),
            secret_access_key: Some("test".to_string()),
            endpoint_url: Some("http://127.0.0.1:1".to_string()),
            path_style: true,
            ..Default::default()
        };

        // Nothing listens on port 1, so bucket verification must fail
        assert!(S3Storage::new(config).is_err());
    }

    #[test]
    fn test_get_reads_object_body() {
        let get = mock!(aws_sdk_s3::Client::get_object)
            .match_requests(|req| req.bucket() == Some("recipes") && req.key() == Some("nachos"))
            .then_output(|| {
                GetObjectOutput::builder()
                    .body(ByteStream::from_static(NACHOS_BODY))
                    .build()
            });
        let storage = stub_storage(mock_client!(aws_sdk_s3, &[&get]));

        assert_eq!(storage.get("nachos").unwrap(), Bytes::from_static(NACHOS_BODY));
    }

    #[test]
    fn test_get_no_such_key_is_resource_not_found() {
        let get = mock!(aws_sdk_s3::Client::get_object).then_error(no_such_key);
        let storage = stub_storage(mock_client!(aws_sdk_s3, &[&get]));

        match storage.get("sandwich") {
            Err(StorageError::ResourceNotFound { resource }) => assert_eq!(resource, "sandwich"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_get_access_denied_is_permission_denied() {
        let get = mock!(aws_sdk_s3::Client::get_object).then_error(|| {
            GetObjectError::generic(
                ErrorMetadata::builder()
                    .code("AccessDenied")
                    .message("Access Denied")
                    .build(),
            )
        });
        let storage = stub_storage(mock_client!(aws_sdk_s3, &[&get]));

        assert!(matches!(
            storage.get("nachos"),
            Err(StorageError::PermissionDenied { ref resource }) if resource == "nachos"
        ));
    }

    #[test]
    fn test_unclassified_service_error_is_operation_failed() {
        let get = mock!(aws_sdk_s3::Client::get_object).then_error(|| {
            GetObjectError::generic(ErrorMetadata::builder().code("SlowDown").build())
        });
        let storage = stub_storage(mock_client!(aws_sdk_s3, &[&get]));

        assert!(matches!(
            storage.get("nachos"),
            Err(StorageError::OperationFailed { ref operation, .. }) if operation == "get_object"
        ));
    }

    #[test]
    fn test_put_targets_bucket_and_key() {
        let put = mock!(aws_sdk_s3::Client::put_object)
            .match_requests(|req| req.bucket() == Some("recipes") && req.key() == Some("nachos"))
            .then_output(|| PutObjectOutput::builder().build());
        let storage = stub_storage(mock_client!(aws_sdk_s3, &[&put]));

        storage.put("nachos", Bytes::from_static(NACHOS_BODY)).unwrap();
    }

    #[test]
    fn test_delete_succeeds_for_absent_key() {
        let delete = mock!(aws_sdk_s3::Client::delete_object)
            .match_requests(|req| req.key() == Some("never-saved"))
            .then_output(|| DeleteObjectOutput::builder().build());
        let storage = stub_storage(mock_client!(aws_sdk_s3, &[&delete]));

        storage.delete("never-saved").unwrap();
    }

    #[test]
    fn test_exists_maps_not_found_to_false() {
        let found = mock!(aws_sdk_s3::Client::head_object)
            .match_requests(|req| req.key() == Some("nachos"))
            .then_output(|| HeadObjectOutput::builder().build());
        let missing = mock!(aws_sdk_s3::Client::head_object)
            .match_requests(|req| req.key() == Some("sandwich"))
            .then_error(|| HeadObjectError::NotFound(NotFound::builder().build()));
        let storage = stub_storage(mock_client!(
            aws_sdk_s3,
            RuleMode::MatchAny,
            &[&found, &missing]
        ));

        assert!(storage.exists("nachos").unwrap());
        assert!(!storage.exists("sandwich").unwrap());
    }

    #[test]
    fn test_list_follows_continuation_tokens() {
        let first_page = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|req| req.continuation_token().is_none())
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(Object::builder().key("tacos").build())
                    .contents(Object::builder().key("nachos").build())
                    .is_truncated(true)
                    .next_continuation_token("page-2")
                    .build()
            });
        let second_page = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|req| req.continuation_token() == Some("page-2"))
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(Object::builder().key("burrito").build())
                    .is_truncated(false)
                    .build()
            });
        let storage = stub_storage(mock_client!(
            aws_sdk_s3,
            RuleMode::MatchAny,
            &[&first_page, &second_page]
        ));

        assert_eq!(storage.list("").unwrap(), vec!["burrito", "nachos", "tacos"]);
    }

    #[test]
    fn test_recipe_store_over_s3() {
        let found = mock!(aws_sdk_s3::Client::get_object)
            .match_requests(|req| req.key() == Some("nachos"))
            .then_output(|| {
                GetObjectOutput::builder()
                    .body(ByteStream::from_static(NACHOS_BODY))
                    .build()
            });
        let missing = mock!(aws_sdk_s3::Client::get_object)
            .match_requests(|req| req.key() == Some("sandwich"))
            .then_error(no_such_key);
        let store = RecipeStore::new(stub_storage(mock_client!(
            aws_sdk_s3,
            RuleMode::MatchAny,
            &[&found, &missing]
        )));

        assert_eq!(
            store.get_by_name("nachos").unwrap(),
            Recipe::new("nachos", "Melt cheese on chips")
        );
        assert!(matches!(
            store.get_by_name("sandwich"),
            Err(RecipeError::NotFound { ref name }) if name == "sandwich"
        ));
    }
}
