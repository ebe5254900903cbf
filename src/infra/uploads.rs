//! Filesystem image storage for deployments without object storage.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::{fs, io::AsyncWriteExt};

use crate::application::admin::images::{ImageStore, ImageStoreError};

/// Stores images under `root/{bucket}/{object_name}` and serves them from
/// `public_base/{bucket}/{object_name}`.
#[derive(Debug)]
pub struct LocalImageStore {
    root: PathBuf,
    public_base: String,
}

impl LocalImageStore {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf, public_base: impl Into<String>) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            public_base: public_base.into().trim_end_matches('/').to_string(),
        })
    }

    fn absolute_path(&self, bucket: &str, object_name: &str) -> Result<PathBuf, ImageStoreError> {
        let bucket = single_component(bucket)?;
        let object = single_component(object_name)?;
        Ok(self.root.join(bucket).join(object))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put_image(
        &self,
        bucket: &str,
        object_name: &str,
        _content_type: &str,
        bytes: Bytes,
    ) -> Result<String, ImageStoreError> {
        let absolute = self.absolute_path(bucket, object_name)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create_new(&absolute).await?;
        if let Err(err) = file.write_all(&bytes).await {
            drop(file);
            let _ = fs::remove_file(&absolute).await;
            return Err(ImageStoreError::Io(err));
        }
        file.flush().await?;

        Ok(format!("{}/{bucket}/{object_name}", self.public_base))
    }
}

fn single_component(value: &str) -> Result<&str, ImageStoreError> {
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(value),
        _ => Err(ImageStoreError::InvalidName {
            name: value.to_string(),
        }),
    }
}
