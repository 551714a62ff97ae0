// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Record-file exporter.
//!
//! Writes one record file per asset into a `<project>-TFRecords-export`
//! container on the target storage, plus a `tf_label_map.pbtxt` mapping tag
//! names to 1-based class ids. Each record carries the encoded image bytes,
//! its dimensions and identity, and the normalized bounding boxes and class
//! assignments of its tagged regions.

use super::{
    ExportAssetResult, ExportAssetState, ExportResults, Progress, assets_for_export,
};
use crate::{
    Asset, AssetMetadata, AssetProvider, AssetResolver, Error, Project, StorageProvider, Tag,
    batch::{batch_size, map_batched},
    tfrecord::{Example, encode_frame},
};
use log::{info, warn};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// Name of the label map file written alongside the records.
pub const LABEL_MAP_FILE: &str = "tf_label_map.pbtxt";

/// Options for a record-file export run.
#[derive(Debug, Clone)]
pub struct TfRecordsExportOptions {
    pub asset_state: ExportAssetState,
    pub batch_size: usize,
}

impl Default for TfRecordsExportOptions {
    fn default() -> TfRecordsExportOptions {
        TfRecordsExportOptions {
            asset_state: ExportAssetState::default(),
            batch_size: batch_size(),
        }
    }
}

/// Render the label map: one `item` block per tag, ids assigned 1-based in
/// declaration order. Id 0 is reserved for background.
pub fn label_map(tags: &[Tag]) -> String {
    tags.iter()
        .enumerate()
        .map(|(index, tag)| {
            format!("item {{\n\tid: {}\n\tname: \"{}\"\n}}\n", index + 1, tag.name)
        })
        .collect()
}

/// Exports a project's assets as framed records.
pub struct TfRecordsExporter<'a, S: StorageProvider, A: AssetProvider> {
    project: &'a Project,
    storage: &'a S,
    assets: &'a A,
    options: TfRecordsExportOptions,
}

impl<'a, S: StorageProvider, A: AssetProvider> TfRecordsExporter<'a, S, A> {
    pub fn new(
        project: &'a Project,
        storage: &'a S,
        assets: &'a A,
        options: TfRecordsExportOptions,
    ) -> TfRecordsExporter<'a, S, A> {
        TfRecordsExporter {
            project,
            storage,
            assets,
            options,
        }
    }

    /// The export container name, derived from the project name.
    pub fn container_name(project: &Project) -> String {
        format!("{}-TFRecords-export", project.name.replace(' ', "-"))
    }

    /// Run the export.
    ///
    /// Container creation and label-map emission failures abort the run;
    /// everything after that is isolated per asset and reported through the
    /// returned [`ExportResults`]. When a progress channel is supplied, one
    /// [`Progress`] message is sent as each asset settles.
    pub async fn export(
        &self,
        progress: Option<mpsc::Sender<Progress>>,
    ) -> Result<ExportResults, Error> {
        let container = Self::container_name(self.project);
        self.storage.create_container(&container).await?;
        self.storage
            .write_text(
                &format!("{}/{}", container, LABEL_MAP_FILE),
                &label_map(&self.project.tags),
            )
            .await?;

        let selected =
            assets_for_export(self.project, self.assets, self.options.asset_state).await?;
        let total = selected.len();
        info!(
            "Exporting {} asset(s) from project {} to {}",
            total, self.project.name, container
        );

        let resolver = AssetResolver::new(self.storage);
        let settled = AtomicUsize::new(0);

        let container = &container;
        let resolver = &resolver;
        let settled = &settled;
        let progress = &progress;

        let results = map_batched(selected, self.options.batch_size, |asset| async move {
            let error = self.export_asset(container, resolver, &asset).await.err();
            if let Some(err) = &error {
                warn!("Failed to export asset {}: {}", asset.name, err);
            }

            let current = settled.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(sender) = progress {
                let _ = sender.send(Progress { current, total }).await;
            }

            ExportAssetResult { asset, error }
        })
        .await;

        let results = ExportResults { results };
        info!(
            "Export finished: {}/{} asset(s) succeeded",
            results.completed(),
            results.count()
        );
        Ok(results)
    }

    async fn export_asset(
        &self,
        container: &str,
        resolver: &AssetResolver<'_, S>,
        asset: &Asset,
    ) -> Result<(), Error> {
        let metadata = resolver.metadata(asset).await?;
        let content = self.assets.read_asset(asset).await?;
        let example = encode_image_example(self.project, &metadata, &content)?;
        let frame = encode_frame(&example.encode());

        let path = format!("{}/{}.tfrecord", container, asset.stem());
        self.storage.write_binary(&path, &frame).await
    }
}

/// Encode one asset's image and regions as a feature-map message.
///
/// Bounding boxes are normalized to `[0, 1]` against the asset's pixel
/// dimensions, so an asset with missing or zero dimensions cannot be encoded
/// and fails with [`Error::InvalidAssetSize`]. Regions without tags, without
/// geometry, or tagged only with names outside the project vocabulary are
/// skipped with a warning.
pub fn encode_image_example(
    project: &Project,
    metadata: &AssetMetadata,
    content: &[u8],
) -> Result<Example, Error> {
    let asset = &metadata.asset;
    let size = asset
        .size
        .filter(|s| s.width > 0 && s.height > 0)
        .ok_or_else(|| Error::InvalidAssetSize(asset.name.clone()))?;
    let width = f64::from(size.width);
    let height = f64::from(size.height);

    let mut xmin = Vec::new();
    let mut xmax = Vec::new();
    let mut ymin = Vec::new();
    let mut ymax = Vec::new();
    let mut texts = Vec::new();
    let mut labels = Vec::new();

    for region in &metadata.regions {
        let Some(bbox) = region.bounding_box() else {
            warn!(
                "Skipping region {} on {}: no geometry",
                region.id, asset.name
            );
            continue;
        };
        if region.tags.is_empty() {
            warn!("Skipping region {} on {}: no tags", region.id, asset.name);
            continue;
        }

        for tag in &region.tags {
            let Some(id) = project.tag_id(tag) else {
                warn!(
                    "Skipping tag {} on region {}: not in project vocabulary",
                    tag, region.id
                );
                continue;
            };
            xmin.push((bbox.left / width) as f32);
            xmax.push(((bbox.left + bbox.width) / width) as f32);
            ymin.push((bbox.top / height) as f32);
            ymax.push(((bbox.top + bbox.height) / height) as f32);
            texts.push(tag.clone());
            labels.push(id);
        }
    }

    let mut example = Example::new();
    example
        .add_bytes("image/encoded", content.to_vec())
        .add_string("image/format", &asset.format)
        .add_string("image/filename", &asset.name)
        .add_string("image/source_id", &asset.id)
        .add_int64("image/height", i64::from(size.height))
        .add_int64("image/width", i64::from(size.width))
        .add_float_list("image/object/bbox/xmin", xmin)
        .add_float_list("image/object/bbox/xmax", xmax)
        .add_float_list("image/object/bbox/ymin", ymin)
        .add_float_list("image/object/bbox/ymax", ymax)
        .add_string_list("image/object/class/text", &texts)
        .add_int64_list("image/object/class/label", labels);
    Ok(example)
}
