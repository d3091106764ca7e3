pub mod cloudinary;

use std::path::Path;

use async_trait::async_trait;

use crate::errors::Result;

/// Remote folder every upload is mirrored into.
pub const REMOTE_FOLDER: &str = "uploads";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredAsset {
    pub secure_url: String,
}

/// A remote content store that takes a local file and hands back a durable URL.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, local_path: &Path, folder: &str) -> Result<StoredAsset>;
}
