//! Catalog image uploads.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::try_join_all;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("image storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image storage request failed: {message}")]
    Transport { message: String },
    #[error("image storage rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("invalid object name `{name}`")]
    InvalidName { name: String },
}

/// Object storage that serves uploaded images from public URLs.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store `bytes` as `bucket/object_name` and return its public URL.
    async fn put_image(
        &self,
        bucket: &str,
        object_name: &str,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<String, ImageStoreError>;
}

#[derive(Debug, Error)]
pub enum AdminImageError {
    #[error("{0}")]
    Validation(&'static str),
    #[error(transparent)]
    Store(#[from] ImageStoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTarget {
    Product,
    Category,
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    /// Guessed from `filename` when absent.
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub struct ImageBuckets {
    pub products: String,
    pub categories: String,
}

#[derive(Clone)]
pub struct AdminImageService {
    store: Arc<dyn ImageStore>,
    buckets: ImageBuckets,
    max_bytes: usize,
}

impl AdminImageService {
    pub fn new(store: Arc<dyn ImageStore>, buckets: ImageBuckets, max_bytes: usize) -> Self {
        Self {
            store,
            buckets,
            max_bytes,
        }
    }

    /// Upload one image and return the URL to store on the record.
    pub async fn upload(
        &self,
        target: ImageTarget,
        upload: ImageUpload,
    ) -> Result<String, AdminImageError> {
        if upload.bytes.is_empty() {
            return Err(AdminImageError::Validation("Image file is empty"));
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(AdminImageError::Validation("Image file is too large"));
        }

        let content_type = upload
            .content_type
            .clone()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| {
                mime_guess::from_path(&upload.filename)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            });
        if !content_type.starts_with("image/") {
            return Err(AdminImageError::Validation("Only image files can be uploaded"));
        }

        let bucket = match target {
            ImageTarget::Product => self.buckets.products.as_str(),
            ImageTarget::Category => self.buckets.categories.as_str(),
        };
        let name = object_name(&upload.filename, &content_type, OffsetDateTime::now_utc());

        let url = self
            .store
            .put_image(bucket, &name, &content_type, upload.bytes)
            .await?;
        info!(
            target = "application::admin::images",
            bucket,
            object = %name,
            "image uploaded"
        );
        Ok(url)
    }

    /// Upload several images, keeping their order.
    pub async fn upload_all(
        &self,
        target: ImageTarget,
        uploads: Vec<ImageUpload>,
    ) -> Result<Vec<String>, AdminImageError> {
        try_join_all(uploads.into_iter().map(|upload| self.upload(target, upload))).await
    }
}

/// Collision-resistant object name: `{unix_millis}-{uuid}.{ext}`.
pub fn object_name(filename: &str, content_type: &str, now: OffsetDateTime) -> String {
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    let extension = file_extension(filename)
        .or_else(|| {
            mime_guess::get_mime_extensions_str(content_type)
                .and_then(|extensions| extensions.first())
                .map(|ext| ext.to_string())
        })
        .unwrap_or_else(|| "img".to_string());

    format!("{millis}-{}.{extension}", Uuid::new_v4().simple())
}

fn file_extension(filename: &str) -> Option<String> {
    let (_, extension) = filename.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();
    let valid = !extension.is_empty()
        && extension.len() <= 5
        && extension.chars().all(|ch| ch.is_ascii_alphanumeric());
    valid.then_some(extension)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use time::macros::datetime;

    use super::*;

    #[derive(Default)]
    struct RecordingStore {
        puts: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl ImageStore for RecordingStore {
        async fn put_image(
            &self,
            bucket: &str,
            object_name: &str,
            content_type: &str,
            _bytes: Bytes,
        ) -> Result<String, ImageStoreError> {
            self.puts.lock().expect("lock").push((
                bucket.to_string(),
                object_name.to_string(),
                content_type.to_string(),
            ));
            Ok(format!("https://cdn.example/{bucket}/{object_name}"))
        }
    }

    fn service(store: Arc<RecordingStore>) -> AdminImageService {
        AdminImageService::new(
            store,
            ImageBuckets {
                products: "product-images".into(),
                categories: "categories".into(),
            },
            1024,
        )
    }

    #[test]
    fn object_names_keep_extension_and_timestamp() {
        let now = datetime!(2024-05-01 10:00:00 UTC);
        let name = object_name("Saree Front.JPG", "image/jpeg", now);
        assert!(name.starts_with("1714557600000-"));
        assert!(name.ends_with(".jpg"));
        assert_ne!(name, object_name("Saree Front.JPG", "image/jpeg", now));
    }

    #[test]
    fn object_names_fall_back_to_content_type() {
        let name = object_name("upload", "image/png", datetime!(2024-05-01 0:00 UTC));
        assert!(name.ends_with(".png"));
    }

    #[tokio::test]
    async fn uploads_route_to_target_bucket() {
        let store = Arc::new(RecordingStore::default());
        let service = service(store.clone());

        let url = service
            .upload(
                ImageTarget::Category,
                ImageUpload {
                    filename: "banner.webp".into(),
                    content_type: None,
                    bytes: Bytes::from_static(b"RIFF"),
                },
            )
            .await
            .expect("uploaded");

        assert!(url.starts_with("https://cdn.example/categories/"));
        let puts = store.puts.lock().expect("lock");
        assert_eq!(puts[0].0, "categories");
        assert_eq!(puts[0].2, "image/webp");
    }

    #[tokio::test]
    async fn rejects_empty_oversized_and_non_images() {
        let store = Arc::new(RecordingStore::default());
        let service = service(store.clone());

        for upload in [
            ImageUpload {
                filename: "empty.jpg".into(),
                content_type: None,
                bytes: Bytes::new(),
            },
            ImageUpload {
                filename: "big.jpg".into(),
                content_type: None,
                bytes: Bytes::from(vec![0u8; 2048]),
            },
            ImageUpload {
                filename: "notes.txt".into(),
                content_type: None,
                bytes: Bytes::from_static(b"hello"),
            },
        ] {
            assert!(matches!(
                service.upload(ImageTarget::Product, upload).await,
                Err(AdminImageError::Validation(_))
            ));
        }
        assert!(store.puts.lock().expect("lock").is_empty());
    }
}
