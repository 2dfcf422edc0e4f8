use aws_config::Region;
use aws_sdk_s3::{
    config::{BehaviorVersion, Credentials},
    primitives::ByteStream,
    types::{BucketCannedAcl, ObjectCannedAcl},
    Client, Config,
};
use bytes::Bytes;

use crate::{config::MinioConfig, error::AppResult};

#[derive(Clone)]
pub struct MinioClient {
    client: Client,
    config: MinioConfig,
}

impl MinioClient {
    pub fn new(config: &MinioConfig) -> Self {
        let creds = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "minio",
        );

        let s3_config = Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint)
            .credentials_provider(creds)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            config: config.clone(),
        }
    }

    pub async fn ensure_buckets(&self) -> AppResult<()> {
        let bucket = &self.config.avatars_bucket;
        let result = self.client.head_bucket().bucket(bucket).send().await;

        if result.is_err() {
            self.client
                .create_bucket()
                .bucket(bucket)
                .acl(BucketCannedAcl::PublicRead)
                .send()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create bucket: {}", e))?;
            tracing::info!("Created bucket: {}", bucket);
        }

        Ok(())
    }

    pub async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> AppResult<String> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to upload file: {}", e))?;

        Ok(self.get_file_url(bucket, key))
    }

    pub fn get_file_url(&self, bucket: &str, key: &str) -> String {
        match &self.config.public_url {
            Some(public_url) => format!("{}/{}/{}", public_url.trim_end_matches('/'), bucket, key),
            None => format!("{}/{}/{}", self.config.endpoint.trim_end_matches('/'), bucket, key),
        }
    }

    pub fn avatars_bucket(&self) -> &str {
        &self.config.avatars_bucket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(public_url: Option<&str>) -> MinioConfig {
        MinioConfig {
            endpoint: "http://localhost:9000/".to_string(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            use_ssl: false,
            region: "us-east-1".to_string(),
            avatars_bucket: "avatars".to_string(),
            public_url: public_url.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn file_url_prefers_public_url() {
        let minio = MinioClient::new(&config(Some("https://cdn.school.edu")));
        assert_eq!(
            minio.get_file_url("avatars", "a/1.png"),
            "https://cdn.school.edu/avatars/a/1.png"
        );

        let minio = MinioClient::new(&config(None));
        assert_eq!(
            minio.get_file_url("avatars", "a/1.png"),
            "http://localhost:9000/avatars/a/1.png"
        );
    }
}
