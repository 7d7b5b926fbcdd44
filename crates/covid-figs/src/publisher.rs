//! Publishing of rendered files to object storage.

use async_trait::async_trait;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use covid_figs_common::{join_key, FigsError, Result};
use covid_figs_config::StorageConfig;
use serde::Serialize;
use std::path::Path;
use tracing::{info, instrument};

/// Location of an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
}

impl StoredObject {
    /// `s3://{bucket}/{key}`
    pub fn s3_uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }

    /// Virtual-hosted HTTPS URL, regional when `region` is known.
    pub fn public_url(&self, region: Option<&str>) -> String {
        match region {
            Some(region) => format!(
                "https://{}.s3.{region}.amazonaws.com/{}",
                self.bucket, self.key
            ),
            None => format!("https://{}.s3.amazonaws.com/{}", self.bucket, self.key),
        }
    }
}

/// MIME type sent with an uploaded file, from its extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    match Path::new(file_name).extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("csv") => "text/csv",
        _ => "application/octet-stream",
    }
}

/// Destination of rendered files.
#[async_trait]
pub trait ObjectPublisher: Send + Sync {
    /// Upload `local_path` under `file_name`, readable by anyone when `public`.
    async fn upload(&self, local_path: &Path, file_name: &str, public: bool)
        -> Result<StoredObject>;
}

/// Publisher writing to one S3 bucket under a key prefix.
#[derive(Debug, Clone)]
pub struct S3Publisher {
    client: aws_sdk_s3::Client,
    bucket: String,
    prefix: String,
}

impl S3Publisher {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    /// Client built from the ambient AWS configuration, with the configured region if any.
    pub async fn from_config(storage: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &storage.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let shared = loader.load().await;
        Self::new(
            aws_sdk_s3::Client::new(&shared),
            storage.bucket_name.clone(),
            storage.prefix.clone(),
        )
    }
}

#[async_trait]
impl ObjectPublisher for S3Publisher {
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn upload(
        &self,
        local_path: &Path,
        file_name: &str,
        public: bool,
    ) -> Result<StoredObject> {
        let key = join_key(&self.prefix, file_name);
        let body = ByteStream::from_path(local_path).await.map_err(|e| {
            FigsError::storage_with_source(format!("Failed to read {}", local_path.display()), e)
        })?;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type_for(file_name))
            .body(body);
        if public {
            request = request.acl(ObjectCannedAcl::PublicRead);
        }
        request.send().await.map_err(|e| {
            FigsError::storage_with_source(
                format!("Failed to upload s3://{}/{}", self.bucket, key),
                e,
            )
        })?;

        let stored = StoredObject {
            bucket: self.bucket.clone(),
            key,
        };
        info!("Uploaded {} -> {}", local_path.display(), stored.s3_uri());
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object() -> StoredObject {
        StoredObject {
            bucket: "figs".to_string(),
            key: "covid/lombardia-overview.png".to_string(),
        }
    }

    #[test]
    fn test_object_urls() {
        let stored = object();
        assert_eq!(stored.s3_uri(), "s3://figs/covid/lombardia-overview.png");
        assert_eq!(
            stored.public_url(Some("eu-south-1")),
            "https://figs.s3.eu-south-1.amazonaws.com/covid/lombardia-overview.png"
        );
        assert_eq!(
            stored.public_url(None),
            "https://figs.s3.amazonaws.com/covid/lombardia-overview.png"
        );
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("italia-overview.png"), "image/png");
        assert_eq!(content_type_for("totali_italia-gf.csv"), "text/csv");
        assert_eq!(content_type_for("README"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_unreadable_file_is_a_storage_error() {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(Region::new("eu-south-1"))
            .build();
        let publisher = S3Publisher::new(aws_sdk_s3::Client::from_conf(config), "figs", "covid");

        let err = publisher
            .upload(Path::new("/nonexistent/italia-overview.png"), "italia-overview.png", true)
            .await
            .unwrap_err();
        assert!(matches!(err, FigsError::Storage { .. }));
    }
}
