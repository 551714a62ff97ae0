// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Asset metadata resolution.
//!
//! Label content for an asset lives in a side file named
//! `<asset name>.labels.json` under the project's target storage. The
//! resolver reads and validates that file, degrading gracefully:
//!
//! - no label file → metadata with no regions and no label data (the normal
//!   "not yet labeled" case);
//! - unreadable or invalid label file → metadata without label content, with
//!   a warning (the editor may have left a partial write behind);
//! - storage failures other than not-found → an error, since the caller
//!   cannot tell labeled and unlabeled assets apart without storage.

use crate::{Asset, AssetMetadata, Error, LabelData, Region, StorageProvider};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Suffix of the per-asset label file.
pub const LABELS_SUFFIX: &str = ".labels.json";

/// On-disk schema of a `<asset name>.labels.json` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetLabels {
    pub version: String,
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_data: Option<LabelData>,
}

impl AssetLabels {
    /// Parse and validate label file contents.
    pub fn from_json(text: &str) -> Result<AssetLabels, Error> {
        let labels: AssetLabels = serde_json::from_str(text)?;
        labels.validate()?;
        Ok(labels)
    }

    /// Field validation over the parsed schema.
    ///
    /// Regions must carry at least one tag and non-degenerate geometry;
    /// structured labels must have non-empty names and a document
    /// association.
    pub fn validate(&self) -> Result<(), Error> {
        if self.version.is_empty() {
            return Err(Error::InvalidLabelData("missing version".to_string()));
        }

        for region in &self.regions {
            if region.tags.is_empty() {
                return Err(Error::InvalidLabelData(format!(
                    "region {} has no tags",
                    region.id
                )));
            }
            if region.bounding_box().is_none() {
                return Err(Error::InvalidLabelData(format!(
                    "region {} has no geometry",
                    region.id
                )));
            }
        }

        if let Some(label_data) = &self.label_data {
            if label_data.document.is_empty() {
                return Err(Error::InvalidLabelData(
                    "label data has no document association".to_string(),
                ));
            }
            for label in &label_data.labels {
                if label.label.is_empty() {
                    return Err(Error::InvalidLabelData(
                        "label with empty name".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Resolves assets to their full [`AssetMetadata`] through a storage
/// provider.
pub struct AssetResolver<'a, S: StorageProvider> {
    storage: &'a S,
}

impl<'a, S: StorageProvider> AssetResolver<'a, S> {
    pub fn new(storage: &'a S) -> AssetResolver<'a, S> {
        AssetResolver { storage }
    }

    /// The label file path for an asset.
    pub fn labels_path(asset: &Asset) -> String {
        format!("{}{}", asset.name, LABELS_SUFFIX)
    }

    /// Resolve an asset to its metadata.
    ///
    /// Only storage failures other than not-found produce an error; see the
    /// module docs for the degradation rules.
    pub async fn metadata(&self, asset: &Asset) -> Result<AssetMetadata, Error> {
        let path = Self::labels_path(asset);

        let text = match self.storage.read_text(&path).await {
            Ok(text) => text,
            Err(err) if err.is_not_found() => {
                debug!("No label file for asset {}", asset.name);
                return Ok(AssetMetadata::empty(asset.clone()));
            }
            Err(err) => return Err(err),
        };

        match AssetLabels::from_json(&text) {
            Ok(labels) => Ok(AssetMetadata {
                asset: asset.clone(),
                regions: labels.regions,
                label_data: labels.label_data,
                version: labels.version,
            }),
            Err(err) => {
                warn!("Ignoring invalid label file {}: {}", path, err);
                Ok(AssetMetadata::empty(asset.clone()))
            }
        }
    }
}
