// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! # LabelKit Export Library
//!
//! LabelKit turns labeling projects into machine-learning training data. It
//! models the projects, assets, and annotations produced by an image labeling
//! editor and exports them as framed record files with a label map, ready for
//! object-detection training pipelines.
//!
//! ## Features
//!
//! - **Project Model**: Projects, assets, regions, and structured label data
//!   matching the editor's JSON schemas
//! - **Providers**: Storage and asset access behind traits, with local
//!   filesystem and in-memory implementations
//! - **Record Codec**: Checksummed record framing and a feature-map message
//!   codec, with a lenient reader that salvages intact records from corrupted
//!   files
//! - **Export Pipeline**: Asset-state filtering, bounded-batch concurrency,
//!   and per-asset failure isolation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use labelkit::{
//!     Error, LocalAssetProvider, LocalStorage, Project, StorageProvider,
//!     TfRecordsExporter,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let storage = LocalStorage::new("/data/out");
//!     let project = Project::from_json(&storage.read_text("project.json").await?)?;
//!     let assets = LocalAssetProvider::new(&project.source_connection);
//!
//!     let exporter =
//!         TfRecordsExporter::new(&project, &storage, &assets, Default::default());
//!     let results = exporter.export(None).await?;
//!     println!("Exported {}/{} assets", results.completed(), results.count());
//!
//!     Ok(())
//! }
//! ```

mod asset;
mod error;
mod project;

pub mod batch;
pub mod export;
pub mod metadata;
pub mod storage;
pub mod tfrecord;

pub use crate::{
    asset::{
        Asset, AssetMetadata, AssetSize, AssetState, AssetType, BoundingBox, Label, LabelData,
        LabelValue, Point, Region, RegionType,
    },
    batch::{DEFAULT_BATCH_SIZE, batch_size},
    error::Error,
    export::{
        ExportAssetResult, ExportAssetState, ExportResults, Progress, TfRecordsExportOptions,
        TfRecordsExporter, assets_for_export, label_map,
    },
    metadata::{AssetLabels, AssetResolver, LABELS_SUFFIX},
    project::{Project, Tag},
    storage::{
        AssetProvider, LocalAssetProvider, LocalStorage, MemoryAssetProvider, MemoryStorage,
        StorageProvider, SUPPORTED_FORMATS, asset_id,
    },
    tfrecord::{
        Example, FeatureKind, FeatureValue, ParseOutcome, TfRecordReader, TfRecordWriter,
    },
};

/// Schema version written into label files created by this library.
pub const LABELS_VERSION: &str = "1.0";

#[cfg(test)]
mod tests {
    #[ctor::ctor]
    fn init() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .is_test(true)
            .init();
    }
}
