use std::path::Path;

use async_std::{fs, io::prelude::WriteExt};

/// Creates `path` and any missing parents. An existing directory is fine.
pub async fn ensure_directory(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path).await
}

/// Opens `path` for writing, truncating whatever was there.
pub async fn create_file(path: &Path) -> std::io::Result<fs::File> {
    fs::File::create(path).await
}

pub async fn write_chunk(file: &mut fs::File, chunk: &[u8]) -> std::io::Result<()> {
    file.write_all(chunk).await
}

pub async fn finish_file(file: &mut fs::File) -> std::io::Result<()> {
    file.flush().await?;
    file.sync_all().await
}

pub async fn remove_file(path: &Path) -> std::io::Result<()> {
    fs::remove_file(path).await
}
