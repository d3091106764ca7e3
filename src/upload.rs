use std::{
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use async_std::fs::File;
use log::{info, warn};

use crate::{
    errors::{Error, Result},
    filesystem,
};

/// Multipart field an upload has to arrive under.
pub const IMAGE_FIELD: &str = "image";

/// Local folders uploads are sorted into, keyed by collection route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadFolder {
    Project,
    Certificate,
}

impl UploadFolder {
    pub fn from_route(collection: &str) -> Result<Self> {
        match collection {
            "Project-Part" => Ok(UploadFolder::Project),
            "Certificate-Part" => Ok(UploadFolder::Certificate),
            other => Err(Error::Configuration(other.to_string())),
        }
    }

    pub fn dir_name(&self) -> &'static str {
        match self {
            UploadFolder::Project => "project",
            UploadFolder::Certificate => "certif",
        }
    }
}

#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub path: PathBuf,
    pub original_name: String,
    pub folder: UploadFolder,
}

pub struct UploadReceiver {
    root: PathBuf,
}

impl UploadReceiver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Starts one upload for the collection named by `route`. The folder is
    /// resolved before anything touches the disk. The finished file is kept
    /// after the request ends.
    pub async fn open(&self, route: &str, original_name: &str) -> Result<UploadWriter> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Unexpected error: time went backwards")
            .as_millis();
        self.open_at(millis, route, original_name).await
    }

    async fn open_at(&self, millis: u128, route: &str, original_name: &str) -> Result<UploadWriter> {
        let folder = UploadFolder::from_route(route)?;
        let directory = self.root.join(folder.dir_name());
        filesystem::ensure_directory(&directory).await?;

        // No collision handling past the timestamp: same name, same
        // millisecond overwrites.
        let original_name = base_name(original_name);
        let path = directory.join(format!("{}-{}", millis, original_name));
        let file = filesystem::create_file(&path).await?;

        Ok(UploadWriter {
            file,
            written: 0,
            upload: UploadedFile {
                path,
                original_name,
                folder,
            },
        })
    }
}

/// An upload being streamed to disk chunk by chunk.
pub struct UploadWriter {
    file: File,
    written: usize,
    upload: UploadedFile,
}

impl UploadWriter {
    pub async fn write(&mut self, chunk: &[u8]) -> Result<()> {
        filesystem::write_chunk(&mut self.file, chunk).await?;
        self.written += chunk.len();
        Ok(())
    }

    pub async fn finish(mut self) -> Result<UploadedFile> {
        filesystem::finish_file(&mut self.file).await?;
        info!(
            "Stored upload {} ({} bytes) in {}",
            self.upload.original_name,
            self.written,
            self.upload.path.display()
        );
        Ok(self.upload)
    }

    /// Drops a partially written file after the request body broke off.
    pub async fn abort(self) {
        let path = self.upload.path;
        drop(self.file);
        if let Err(e) = filesystem::remove_file(&path).await {
            warn!("Failed to remove partial upload {}: {}", path.display(), e);
        }
    }
}

/// Drops any directory part a client put in the filename.
fn base_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store(
        receiver: &UploadReceiver,
        millis: u128,
        route: &str,
        name: &str,
        chunks: &[&[u8]],
    ) -> UploadedFile {
        let mut writer = receiver.open_at(millis, route, name).await.unwrap();
        for chunk in chunks {
            writer.write(chunk).await.unwrap();
        }
        writer.finish().await.unwrap()
    }

    #[test]
    fn folder_mapping_is_fixed() {
        assert_eq!(
            UploadFolder::from_route("Project-Part").unwrap().dir_name(),
            "project"
        );
        assert_eq!(
            UploadFolder::from_route("Certificate-Part").unwrap().dir_name(),
            "certif"
        );
        assert!(matches!(
            UploadFolder::from_route("project-part"),
            Err(Error::Configuration(_))
        ));
    }

    #[actix_web::test]
    async fn streams_timestamped_file_into_mapped_folder() {
        let root = tempfile::tempdir().unwrap();
        let receiver = UploadReceiver::new(root.path());

        let file = store(
            &receiver,
            1700000000123,
            "Certificate-Part",
            "award.png",
            &[&b"pn"[..], &b"g"[..]],
        )
        .await;

        assert_eq!(file.folder, UploadFolder::Certificate);
        assert_eq!(file.original_name, "award.png");
        assert_eq!(
            file.path,
            root.path().join("certif").join("1700000000123-award.png")
        );
        assert_eq!(std::fs::read(&file.path).unwrap(), b"png");
    }

    #[actix_web::test]
    async fn same_name_in_same_millisecond_overwrites() {
        let root = tempfile::tempdir().unwrap();
        let receiver = UploadReceiver::new(root.path());

        let first = store(&receiver, 42, "Project-Part", "shot.jpg", &[&b"first"[..]]).await;
        let second = store(&receiver, 42, "Project-Part", "shot.jpg", &[&b"second"[..]]).await;

        assert_eq!(first.path, second.path);
        assert_eq!(std::fs::read(&second.path).unwrap(), b"second");
        let entries = std::fs::read_dir(root.path().join("project")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[actix_web::test]
    async fn unmapped_route_writes_nothing() {
        let root = tempfile::tempdir().unwrap();
        let receiver = UploadReceiver::new(root.path().join("upload"));

        let result = receiver.open("Blog-Part", "shot.jpg").await;

        assert!(matches!(result, Err(Error::Configuration(_))));
        assert!(!root.path().join("upload").exists());
    }

    #[actix_web::test]
    async fn directory_parts_of_client_filename_are_dropped() {
        let root = tempfile::tempdir().unwrap();
        let receiver = UploadReceiver::new(root.path());

        let file = store(&receiver, 7, "Project-Part", "../../etc/passwd", &[&b"x"[..]]).await;

        assert_eq!(file.path, root.path().join("project").join("7-passwd"));
    }

    #[actix_web::test]
    async fn aborted_upload_leaves_no_file() {
        let root = tempfile::tempdir().unwrap();
        let receiver = UploadReceiver::new(root.path());

        let mut writer = receiver.open_at(9, "Project-Part", "half.png").await.unwrap();
        writer.write(b"partial").await.unwrap();
        writer.abort().await;

        let entries = std::fs::read_dir(root.path().join("project")).unwrap().count();
        assert_eq!(entries, 0);
    }
}
