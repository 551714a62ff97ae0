// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Storage and asset provider abstractions.
//!
//! The export pipeline is written against these traits and receives concrete
//! instances by dependency injection — there is no global provider registry.
//!
//! # Provider Implementations
//!
//! - [`LocalStorage`] / [`LocalAssetProvider`]: local filesystem backends
//! - [`MemoryStorage`] / [`MemoryAssetProvider`]: in-memory backends for
//!   tests and embedding
//!
//! Custom backends (e.g. blob stores) implement the same traits.

use crate::{Asset, AssetSize, AssetState, AssetType, Error};
use log::{debug, warn};
use sha2::{Digest, Sha256};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::RwLock,
};
use walkdir::WalkDir;

/// File format extensions enumerated as assets.
pub const SUPPORTED_FORMATS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff", "pdf"];

/// Capability set for reading and writing project artifacts.
///
/// Paths are relative to the provider's root. Every method is a suspension
/// point; implementations must not block the executor.
#[allow(async_fn_in_trait)]
pub trait StorageProvider: Send + Sync {
    /// Read a file as UTF-8 text.
    async fn read_text(&self, path: &str) -> Result<String, Error>;

    /// Read a file as raw bytes.
    async fn read_binary(&self, path: &str) -> Result<Vec<u8>, Error>;

    /// Write UTF-8 text, creating parent directories as needed.
    async fn write_text(&self, path: &str, contents: &str) -> Result<(), Error>;

    /// Write raw bytes, creating parent directories as needed.
    async fn write_binary(&self, path: &str, contents: &[u8]) -> Result<(), Error>;

    /// Delete a single file.
    async fn delete_file(&self, path: &str) -> Result<(), Error>;

    /// List the files directly inside a container, as paths relative to the
    /// provider root.
    async fn list_files(&self, container: &str) -> Result<Vec<String>, Error>;

    /// Create a container (directory); succeeds if it already exists.
    async fn create_container(&self, container: &str) -> Result<(), Error>;

    /// Delete a container and its contents; succeeds if it does not exist.
    async fn delete_container(&self, container: &str) -> Result<(), Error>;

    /// Whether a file exists at the given path.
    async fn file_exists(&self, path: &str) -> Result<bool, Error>;
}

/// Source of assets for a project: enumeration plus binary content fetch.
#[allow(async_fn_in_trait)]
pub trait AssetProvider: Send + Sync {
    /// Enumerate all assets available from the source.
    async fn assets(&self) -> Result<Vec<Asset>, Error>;

    /// Look up a single asset by id.
    async fn asset(&self, id: &str) -> Result<Option<Asset>, Error>;

    /// Fetch the raw binary content of an asset.
    async fn read_asset(&self, asset: &Asset) -> Result<Vec<u8>, Error>;
}

/// Stable asset id: hex SHA-256 of the normalized path.
pub fn asset_id(path: &str) -> String {
    let digest = Sha256::digest(path.replace('\\', "/").as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Local filesystem storage rooted at a directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> LocalStorage {
        let root = root.into();
        debug!("LocalStorage rooted at {:?}", root);
        LocalStorage { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    async fn ensure_parent(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

impl StorageProvider for LocalStorage {
    async fn read_text(&self, path: &str) -> Result<String, Error> {
        Ok(tokio::fs::read_to_string(self.resolve(path)).await?)
    }

    async fn read_binary(&self, path: &str) -> Result<Vec<u8>, Error> {
        Ok(tokio::fs::read(self.resolve(path)).await?)
    }

    async fn write_text(&self, path: &str, contents: &str) -> Result<(), Error> {
        self.write_binary(path, contents.as_bytes()).await
    }

    async fn write_binary(&self, path: &str, contents: &[u8]) -> Result<(), Error> {
        let path = self.resolve(path);
        self.ensure_parent(&path).await?;
        Ok(tokio::fs::write(path, contents).await?)
    }

    async fn delete_file(&self, path: &str) -> Result<(), Error> {
        Ok(tokio::fs::remove_file(self.resolve(path)).await?)
    }

    async fn list_files(&self, container: &str) -> Result<Vec<String>, Error> {
        let mut entries = tokio::fs::read_dir(self.resolve(container)).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                let name = entry.file_name().to_string_lossy().to_string();
                files.push(format!("{}/{}", container.trim_end_matches('/'), name));
            }
        }
        files.sort();
        Ok(files)
    }

    async fn create_container(&self, container: &str) -> Result<(), Error> {
        Ok(tokio::fs::create_dir_all(self.resolve(container)).await?)
    }

    async fn delete_container(&self, container: &str) -> Result<(), Error> {
        let path = self.resolve(container);
        if tokio::fs::try_exists(&path).await? {
            tokio::fs::remove_dir_all(path).await?;
        }
        Ok(())
    }

    async fn file_exists(&self, path: &str) -> Result<bool, Error> {
        Ok(tokio::fs::try_exists(self.resolve(path)).await?)
    }
}

/// In-memory storage (no persistence), for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> MemoryStorage {
        MemoryStorage::default()
    }

    fn lock_err(what: &str) -> Error {
        Error::IoError(std::io::Error::other(format!(
            "Failed to acquire {} lock",
            what
        )))
    }

    fn not_found(path: &str) -> Error {
        Error::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("No such file: {}", path),
        ))
    }
}

impl StorageProvider for MemoryStorage {
    async fn read_text(&self, path: &str) -> Result<String, Error> {
        let bytes = self.read_binary(path).await?;
        String::from_utf8(bytes).map_err(|e| {
            Error::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("File {} is not valid UTF-8: {}", path, e),
            ))
        })
    }

    async fn read_binary(&self, path: &str) -> Result<Vec<u8>, Error> {
        let files = self.files.read().map_err(|_| Self::lock_err("read"))?;
        files.get(path).cloned().ok_or_else(|| Self::not_found(path))
    }

    async fn write_text(&self, path: &str, contents: &str) -> Result<(), Error> {
        self.write_binary(path, contents.as_bytes()).await
    }

    async fn write_binary(&self, path: &str, contents: &[u8]) -> Result<(), Error> {
        let mut files = self.files.write().map_err(|_| Self::lock_err("write"))?;
        files.insert(path.to_string(), contents.to_vec());
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> Result<(), Error> {
        let mut files = self.files.write().map_err(|_| Self::lock_err("write"))?;
        files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(path))
    }

    async fn list_files(&self, container: &str) -> Result<Vec<String>, Error> {
        let prefix = format!("{}/", container.trim_end_matches('/'));
        let files = self.files.read().map_err(|_| Self::lock_err("read"))?;
        let mut names: Vec<String> = files
            .keys()
            .filter(|key| key.starts_with(&prefix))
            .cloned()
            .collect();
        names.sort();
        Ok(names)
    }

    async fn create_container(&self, _container: &str) -> Result<(), Error> {
        // Containers are implicit in the flat key space.
        Ok(())
    }

    async fn delete_container(&self, container: &str) -> Result<(), Error> {
        let prefix = format!("{}/", container.trim_end_matches('/'));
        let mut files = self.files.write().map_err(|_| Self::lock_err("write"))?;
        files.retain(|key, _| !key.starts_with(&prefix));
        Ok(())
    }

    async fn file_exists(&self, path: &str) -> Result<bool, Error> {
        let files = self.files.read().map_err(|_| Self::lock_err("read"))?;
        Ok(files.contains_key(path))
    }
}

/// Local filesystem asset source.
///
/// Enumerates supported image/document files under a root folder. The format
/// of each asset is verified against its magic bytes: a renamed or spoofed
/// extension is corrected to the sniffed type with a warning, matching the
/// editor's behavior. Image dimensions are read from the file header so the
/// export pipeline can normalize bounding boxes without decoding pixels.
#[derive(Debug, Clone)]
pub struct LocalAssetProvider {
    root: PathBuf,
}

impl LocalAssetProvider {
    pub fn new(root: impl Into<PathBuf>) -> LocalAssetProvider {
        let root = root.into();
        debug!("LocalAssetProvider rooted at {:?}", root);
        LocalAssetProvider { root }
    }

    fn asset_from_path(path: &Path) -> Option<Asset> {
        let name = path.file_name()?.to_string_lossy().to_string();
        let mut format = path.extension()?.to_string_lossy().to_ascii_lowercase();
        if !SUPPORTED_FORMATS.contains(&format.as_str()) {
            return None;
        }

        // Fix spoofed extensions to the sniffed type.
        if let Ok(Some(kind)) = infer::get_from_path(path) {
            let sniffed = kind.extension();
            if SUPPORTED_FORMATS.contains(&sniffed) && sniffed != format {
                warn!(
                    "Asset {:?} has extension {} but content is {}; using sniffed type",
                    path, format, sniffed
                );
                format = sniffed.to_string();
            }
        }

        let size = imagesize::size(path)
            .ok()
            .map(|dim| AssetSize {
                width: dim.width as u32,
                height: dim.height as u32,
            });

        let path_str = path.to_string_lossy().to_string();
        Some(Asset {
            id: asset_id(&path_str),
            name,
            path: path_str,
            asset_type: AssetType::from_format(&format),
            format,
            state: AssetState::NotVisited,
            size,
        })
    }
}

impl AssetProvider for LocalAssetProvider {
    async fn assets(&self) -> Result<Vec<Asset>, Error> {
        let root = self.root.clone();
        let assets = tokio::task::spawn_blocking(move || {
            let mut assets: Vec<Asset> = WalkDir::new(&root)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .filter_map(|entry| LocalAssetProvider::asset_from_path(entry.path()))
                .collect();
            assets.sort_by(|a, b| a.name.cmp(&b.name));
            assets
        })
        .await
        .map_err(|e| Error::IoError(std::io::Error::other(e)))?;

        debug!("Enumerated {} assets under {:?}", assets.len(), self.root);
        Ok(assets)
    }

    async fn asset(&self, id: &str) -> Result<Option<Asset>, Error> {
        Ok(self.assets().await?.into_iter().find(|a| a.id == id))
    }

    async fn read_asset(&self, asset: &Asset) -> Result<Vec<u8>, Error> {
        Ok(tokio::fs::read(&asset.path).await?)
    }
}

/// In-memory asset source for tests and embedding.
///
/// Assets without registered content fail [`AssetProvider::read_asset`] with
/// a not-found error, which is the natural seam for exercising per-asset
/// failure isolation.
#[derive(Debug, Default)]
pub struct MemoryAssetProvider {
    assets: Vec<Asset>,
    contents: HashMap<String, Vec<u8>>,
}

impl MemoryAssetProvider {
    pub fn new() -> MemoryAssetProvider {
        MemoryAssetProvider::default()
    }

    /// Register an asset along with its binary content.
    pub fn insert(&mut self, asset: Asset, content: Vec<u8>) {
        self.contents.insert(asset.id.clone(), content);
        self.assets.push(asset);
    }

    /// Register an asset with no content; reads of it will fail.
    pub fn insert_without_content(&mut self, asset: Asset) {
        self.assets.push(asset);
    }
}

impl AssetProvider for MemoryAssetProvider {
    async fn assets(&self) -> Result<Vec<Asset>, Error> {
        Ok(self.assets.clone())
    }

    async fn asset(&self, id: &str) -> Result<Option<Asset>, Error> {
        Ok(self.assets.iter().find(|a| a.id == id).cloned())
    }

    async fn read_asset(&self, asset: &Asset) -> Result<Vec<u8>, Error> {
        self.contents.get(&asset.id).cloned().ok_or_else(|| {
            Error::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("No content for asset {}", asset.name),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Minimal PNG header: signature plus an IHDR chunk carrying the given
    /// dimensions. Enough for both magic-byte sniffing and size probing.
    pub(crate) fn tiny_png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        // bit depth, color type, compression, filter, interlace
        bytes.extend_from_slice(&[8, 2, 0, 0, 0]);
        bytes.extend_from_slice(&[0, 0, 0, 0]); // CRC, not validated by probes
        bytes
    }

    #[tokio::test]
    async fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new();

        assert!(!storage.file_exists("a.txt").await.unwrap());
        storage.write_text("a.txt", "hello").await.unwrap();
        assert!(storage.file_exists("a.txt").await.unwrap());
        assert_eq!(storage.read_text("a.txt").await.unwrap(), "hello");

        storage.write_binary("b.bin", &[1, 2, 3]).await.unwrap();
        assert_eq!(storage.read_binary("b.bin").await.unwrap(), vec![1, 2, 3]);

        storage.delete_file("a.txt").await.unwrap();
        let err = storage.read_text("a.txt").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_memory_storage_containers() {
        let storage = MemoryStorage::new();
        storage.create_container("export").await.unwrap();
        storage.write_binary("export/a.tfrecord", &[0]).await.unwrap();
        storage.write_binary("export/b.tfrecord", &[1]).await.unwrap();
        storage.write_binary("other/c.tfrecord", &[2]).await.unwrap();

        let files = storage.list_files("export").await.unwrap();
        assert_eq!(files, vec!["export/a.tfrecord", "export/b.tfrecord"]);

        storage.delete_container("export").await.unwrap();
        assert!(storage.list_files("export").await.unwrap().is_empty());
        assert!(storage.file_exists("other/c.tfrecord").await.unwrap());
    }

    #[tokio::test]
    async fn test_local_storage_round_trip() {
        let temp = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp.path());

        storage
            .write_text("nested/dir/file.txt", "content")
            .await
            .unwrap();
        assert_eq!(
            storage.read_text("nested/dir/file.txt").await.unwrap(),
            "content"
        );

        storage.create_container("out").await.unwrap();
        storage.write_binary("out/x.bin", &[9, 9]).await.unwrap();
        let files = storage.list_files("out").await.unwrap();
        assert_eq!(files, vec!["out/x.bin"]);

        storage.delete_container("out").await.unwrap();
        assert!(!storage.file_exists("out/x.bin").await.unwrap());

        let err = storage.read_text("missing.txt").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_local_asset_provider_enumerates_images() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("one.png"), tiny_png(64, 48)).unwrap();
        std::fs::write(temp.path().join("two.png"), tiny_png(32, 32)).unwrap();
        std::fs::write(temp.path().join("notes.txt"), b"skip me").unwrap();

        let provider = LocalAssetProvider::new(temp.path());
        let assets = provider.assets().await.unwrap();

        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].name, "one.png");
        assert_eq!(assets[0].format, "png");
        assert_eq!(assets[0].asset_type, AssetType::Image);
        assert_eq!(
            assets[0].size,
            Some(AssetSize {
                width: 64,
                height: 48
            })
        );
        assert_eq!(assets[0].state, AssetState::NotVisited);

        // Ids are stable across enumerations.
        let again = provider.assets().await.unwrap();
        assert_eq!(assets[0].id, again[0].id);

        // Content fetch returns the raw bytes.
        let bytes = provider.read_asset(&assets[1]).await.unwrap();
        assert_eq!(bytes, tiny_png(32, 32));
    }

    #[tokio::test]
    async fn test_local_asset_provider_corrects_spoofed_extension() {
        let temp = TempDir::new().unwrap();
        // PNG content renamed to .jpg
        std::fs::write(temp.path().join("fake.jpg"), tiny_png(10, 10)).unwrap();

        let provider = LocalAssetProvider::new(temp.path());
        let assets = provider.assets().await.unwrap();

        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].format, "png");
    }

    #[tokio::test]
    async fn test_memory_asset_provider_missing_content_fails_read() {
        let mut provider = MemoryAssetProvider::new();
        let asset = Asset {
            id: "a1".to_string(),
            name: "a.png".to_string(),
            path: "/mem/a.png".to_string(),
            format: "png".to_string(),
            state: AssetState::Tagged,
            asset_type: AssetType::Image,
            size: None,
        };
        provider.insert_without_content(asset.clone());

        assert!(provider.asset("a1").await.unwrap().is_some());
        let err = provider.read_asset(&asset).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
