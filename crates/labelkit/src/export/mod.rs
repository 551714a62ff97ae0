// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Export pipeline.
//!
//! Exporters take a project plus injected storage and asset providers, select
//! the assets matching the configured state filter, resolve each asset's
//! metadata, and write the converted output to the project's target storage.
//! Asset conversion failures are isolated per asset: one bad image fails its
//! own record and is reported in the results, while container and label-map
//! failures abort the run.

pub mod tfrecords;

pub use tfrecords::{TfRecordsExportOptions, TfRecordsExporter, label_map};

use crate::{
    Asset, AssetMetadata, AssetProvider, AssetResolver, AssetState, AssetType, Error, Project,
    StorageProvider, batch::map_batched,
};
use log::debug;

/// Which assets an export run includes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportAssetState {
    /// Every asset the source provides, plus everything the project tracks.
    #[default]
    All,
    /// Assets opened in the editor, labeled or not.
    Visited,
    /// Assets carrying at least one region or label.
    Tagged,
}

impl std::fmt::Display for ExportAssetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            ExportAssetState::All => "all",
            ExportAssetState::Visited => "visited",
            ExportAssetState::Tagged => "tagged",
        };
        write!(f, "{}", value)
    }
}

impl TryFrom<&str> for ExportAssetState {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self, Error> {
        match s {
            "all" => Ok(ExportAssetState::All),
            "visited" => Ok(ExportAssetState::Visited),
            "tagged" => Ok(ExportAssetState::Tagged),
            _ => Err(Error::InvalidAssetState(s.to_string())),
        }
    }
}

/// Progress of an export run, sent after each asset settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

/// Outcome for a single exported asset.
#[derive(Debug)]
pub struct ExportAssetResult {
    pub asset: Asset,
    pub error: Option<Error>,
}

impl ExportAssetResult {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate outcome of an export run.
#[derive(Debug, Default)]
pub struct ExportResults {
    pub results: Vec<ExportAssetResult>,
}

impl ExportResults {
    /// Number of assets the run attempted.
    pub fn count(&self) -> usize {
        self.results.len()
    }

    /// Number of assets exported successfully.
    pub fn completed(&self) -> usize {
        self.results.iter().filter(|r| r.success()).count()
    }

    /// Results for assets that failed.
    pub fn errors(&self) -> impl Iterator<Item = &ExportAssetResult> {
        self.results.iter().filter(|r| !r.success())
    }
}

/// Select the assets an export run covers.
///
/// `All` merges the project's tracked assets with a fresh enumeration from
/// the source provider, deduplicated by id with the tracked entry winning
/// since it carries workflow state. `Visited` includes tagged assets too,
/// since tagging implies a visit. Video assets are never exported.
pub async fn assets_for_export<A: AssetProvider>(
    project: &Project,
    provider: &A,
    filter: ExportAssetState,
) -> Result<Vec<Asset>, Error> {
    let mut selected: Vec<Asset> = match filter {
        ExportAssetState::All => {
            let mut assets: Vec<Asset> = project.assets.values().cloned().collect();
            for asset in provider.assets().await? {
                if !project.assets.contains_key(&asset.id) {
                    assets.push(asset);
                }
            }
            assets
        }
        ExportAssetState::Visited => project
            .assets
            .values()
            .filter(|a| matches!(a.state, AssetState::Visited | AssetState::Tagged))
            .cloned()
            .collect(),
        ExportAssetState::Tagged => project
            .assets
            .values()
            .filter(|a| a.state == AssetState::Tagged)
            .cloned()
            .collect(),
    };

    selected.retain(|a| a.asset_type != AssetType::Video);
    selected.sort_by(|a, b| a.name.cmp(&b.name));

    debug!(
        "Selected {} asset(s) for export with filter {}",
        selected.len(),
        filter
    );
    Ok(selected)
}

/// Resolve metadata for a set of assets in bounded batches.
///
/// Resolution failures are carried per asset rather than aborting the batch.
pub async fn resolve_metadata<S: StorageProvider>(
    storage: &S,
    assets: Vec<Asset>,
    batch_size: usize,
) -> Vec<(Asset, Result<AssetMetadata, Error>)> {
    let resolver = AssetResolver::new(storage);
    let resolver = &resolver;
    map_batched(assets, batch_size, |asset| async move {
        let metadata = resolver.metadata(&asset).await;
        (asset, metadata)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AssetSize, MemoryAssetProvider, Tag, storage::asset_id};

    fn asset(name: &str, state: AssetState, asset_type: AssetType) -> Asset {
        Asset {
            id: asset_id(name),
            name: name.to_string(),
            path: format!("/data/{}", name),
            format: name.rsplit_once('.').map(|(_, e)| e).unwrap_or("").to_string(),
            state,
            asset_type,
            size: Some(AssetSize {
                width: 100,
                height: 100,
            }),
        }
    }

    fn project_with(assets: Vec<Asset>) -> Project {
        Project {
            name: "Test Project".to_string(),
            version: "1.0".to_string(),
            source_connection: "/in".to_string(),
            target_connection: "/out".to_string(),
            tags: vec![Tag::new("cat")],
            assets: assets.into_iter().map(|a| (a.id.clone(), a)).collect(),
        }
    }

    fn provider_with(assets: &[Asset]) -> MemoryAssetProvider {
        let mut provider = MemoryAssetProvider::new();
        for asset in assets {
            provider.insert(asset.clone(), vec![1, 2, 3]);
        }
        provider
    }

    #[tokio::test]
    async fn test_all_merges_tracked_and_enumerated() {
        let tracked = asset("a.png", AssetState::Tagged, AssetType::Image);
        let fresh = asset("b.png", AssetState::NotVisited, AssetType::Image);
        let project = project_with(vec![tracked.clone()]);
        // The provider re-enumerates the tracked asset plus a new one.
        let provider = provider_with(&[tracked.clone(), fresh]);

        let selected = assets_for_export(&project, &provider, ExportAssetState::All)
            .await
            .unwrap();

        assert_eq!(selected.len(), 2);
        // The tracked copy wins so its state is preserved.
        assert_eq!(selected[0].name, "a.png");
        assert_eq!(selected[0].state, AssetState::Tagged);
        assert_eq!(selected[1].name, "b.png");
    }

    #[tokio::test]
    async fn test_visited_includes_tagged() {
        let project = project_with(vec![
            asset("t.png", AssetState::Tagged, AssetType::Image),
            asset("v.png", AssetState::Visited, AssetType::Image),
            asset("n.png", AssetState::NotVisited, AssetType::Image),
        ]);
        let provider = provider_with(&[]);

        let selected = assets_for_export(&project, &provider, ExportAssetState::Visited)
            .await
            .unwrap();
        let names: Vec<&str> = selected.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["t.png", "v.png"]);
    }

    #[tokio::test]
    async fn test_tagged_excludes_visited() {
        let project = project_with(vec![
            asset("t.png", AssetState::Tagged, AssetType::Image),
            asset("v.png", AssetState::Visited, AssetType::Image),
        ]);
        let provider = provider_with(&[]);

        let selected = assets_for_export(&project, &provider, ExportAssetState::Tagged)
            .await
            .unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "t.png");
    }

    #[tokio::test]
    async fn test_video_assets_are_always_excluded() {
        let video = asset("clip.mp4", AssetState::Tagged, AssetType::Video);
        let image = asset("a.png", AssetState::Tagged, AssetType::Image);
        let project = project_with(vec![video.clone(), image]);
        let provider = provider_with(&[video]);

        for filter in [
            ExportAssetState::All,
            ExportAssetState::Visited,
            ExportAssetState::Tagged,
        ] {
            let selected = assets_for_export(&project, &provider, filter).await.unwrap();
            assert!(selected.iter().all(|a| a.asset_type != AssetType::Video));
        }
    }

    #[test]
    fn test_export_asset_state_conversions() {
        assert_eq!(
            ExportAssetState::try_from("tagged").unwrap(),
            ExportAssetState::Tagged
        );
        assert_eq!(ExportAssetState::default(), ExportAssetState::All);
        assert!(ExportAssetState::try_from("everything").is_err());
        assert_eq!(ExportAssetState::Visited.to_string(), "visited");
    }

    #[tokio::test]
    async fn test_resolve_metadata_isolates_failures() {
        let storage = crate::MemoryStorage::new();
        let labeled = asset("labeled.png", AssetState::Tagged, AssetType::Image);
        let bare = asset("bare.png", AssetState::Visited, AssetType::Image);
        storage
            .write_text(
                "labeled.png.labels.json",
                r#"{"version": "1.0", "regions": [{"id": "r1", "type": "rectangle", "tags": ["cat"], "points": [{"x": 0.0, "y": 0.0}, {"x": 5.0, "y": 5.0}]}]}"#,
            )
            .await
            .unwrap();

        let resolved = resolve_metadata(&storage, vec![labeled, bare], 2).await;

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].0.name, "labeled.png");
        assert_eq!(resolved[0].1.as_ref().unwrap().regions.len(), 1);
        assert!(resolved[1].1.as_ref().unwrap().regions.is_empty());
    }

    #[test]
    fn test_export_results_counts() {
        let a = asset("a.png", AssetState::Tagged, AssetType::Image);
        let results = ExportResults {
            results: vec![
                ExportAssetResult {
                    asset: a.clone(),
                    error: None,
                },
                ExportAssetResult {
                    asset: a,
                    error: Some(Error::InvalidAssetSize("b.png".to_string())),
                },
            ],
        };

        assert_eq!(results.count(), 2);
        assert_eq!(results.completed(), 1);
        assert_eq!(results.errors().count(), 1);
    }
}
