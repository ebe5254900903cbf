//! Object storage adapter for catalog images.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;

use crate::application::admin::images::{ImageStore, ImageStoreError};

use super::backend::{BackendClient, BackendError, error_message};

/// Uploads images through the backend's storage REST API.
#[derive(Clone, Debug)]
pub struct RestImageStore {
    backend: BackendClient,
}

impl RestImageStore {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    pub fn public_url(&self, bucket: &str, object_name: &str) -> Result<String, ImageStoreError> {
        self.backend
            .endpoint(&["storage", "v1", "object", "public", bucket, object_name])
            .map(String::from)
            .map_err(transport)
    }
}

#[async_trait]
impl ImageStore for RestImageStore {
    async fn put_image(
        &self,
        bucket: &str,
        object_name: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<String, ImageStoreError> {
        if object_name.is_empty() || object_name.contains('/') {
            return Err(ImageStoreError::InvalidName {
                name: object_name.to_string(),
            });
        }

        let url = self
            .backend
            .endpoint(&["storage", "v1", "object", bucket, object_name])
            .map_err(transport)?;

        let response = self
            .backend
            .request(Method::PUT, url, None)
            .header("content-type", content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(|err| transport(BackendError::from(err)))?;

        if !response.status().is_success() {
            let (status, message) = error_message(response).await;
            return Err(ImageStoreError::Rejected { status, message });
        }

        self.public_url(bucket, object_name)
    }
}

fn transport(err: BackendError) -> ImageStoreError {
    ImageStoreError::Transport {
        message: err.to_string(),
    }
}
