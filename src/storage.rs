//! Object storage helpers.
//!
//! Photos go to the backend's storage service. By default the REST gateway
//! uploads them itself; when S3 keys are configured [`S3Store`] writes
//! through the backend's S3-compatible endpoint instead. Either way the
//! public URL has the same shape.

use s3::creds::Credentials;
use s3::region::Region;
use s3::Bucket;
use tracing::debug;

use crate::config::S3Credentials;
use crate::gateway::GatewayError;

/// Public URL for an object in a public bucket.
#[must_use]
pub fn public_object_url(base_url: &str, bucket: &str, path: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{bucket}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Content type for an object key, from its extension.
#[must_use]
pub fn content_type_for(path: &str) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

/// Client for the S3-compatible storage endpoint.
#[derive(Clone)]
pub struct S3Store {
    endpoint: String,
    region: String,
    credentials: Credentials,
}

impl S3Store {
    /// Create a store for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected by the S3 client.
    pub fn new(base_url: &str, creds: &S3Credentials) -> Result<Self, GatewayError> {
        let credentials = Credentials::new(
            Some(&creds.access_key_id),
            Some(&creds.secret_access_key),
            None,
            None,
            None,
        )
        .map_err(|e| GatewayError::Storage(format!("invalid S3 credentials: {e}")))?;

        Ok(Self {
            endpoint: format!("{}/storage/v1/s3", base_url.trim_end_matches('/')),
            region: creds.region.clone(),
            credentials,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn bucket(&self, name: &str) -> Result<Box<Bucket>, GatewayError> {
        let region = Region::Custom {
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
        };
        let bucket = Bucket::new(name, region, self.credentials.clone())
            .map_err(|e| GatewayError::Storage(format!("failed to open bucket {name}: {e}")))?;
        // The storage endpoint only understands path-style addressing
        Ok(bucket.with_path_style())
    }

    /// Upload bytes under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the upload fails or is rejected.
    pub async fn upload_bytes(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<(), GatewayError> {
        debug!(bucket = %bucket, key = %key, content_type = %content_type, "Uploading bytes to S3 storage");

        let response = self
            .bucket(bucket)?
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(|e| GatewayError::Storage(e.to_string()))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(GatewayError::Storage(format!(
                "S3 put returned status {status}"
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for S3Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Store")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}
