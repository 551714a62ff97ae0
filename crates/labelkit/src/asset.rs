// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Core asset and annotation data model.
//!
//! Assets are the images and documents tracked by a labeling project. Each
//! asset carries a workflow state ([`AssetState`]) and, once labeled, resolves
//! to an [`AssetMetadata`] holding its drawn regions and/or structured label
//! data. These types mirror the on-disk project and label-file JSON schemas.

use serde::{Deserialize, Serialize};

/// Workflow state of an asset within a project.
///
/// Export filters are expressed against this state: `Tagged` assets carry at
/// least one region or label, `Visited` assets were opened in the editor but
/// not necessarily labeled, `NotVisited` assets were only enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetState {
    NotVisited,
    Visited,
    Tagged,
}

impl std::fmt::Display for AssetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            AssetState::NotVisited => "notVisited",
            AssetState::Visited => "visited",
            AssetState::Tagged => "tagged",
        };
        write!(f, "{}", value)
    }
}

impl TryFrom<&str> for AssetState {
    type Error = crate::Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "notVisited" | "not-visited" => Ok(AssetState::NotVisited),
            "visited" => Ok(AssetState::Visited),
            "tagged" => Ok(AssetState::Tagged),
            _ => Err(crate::Error::InvalidState(s.to_string())),
        }
    }
}

/// Media type of an asset, derived from its format extension.
///
/// Only static image/document types are exportable; `Video` assets are
/// excluded from every export run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetType {
    Image,
    Tiff,
    Pdf,
    Video,
    Unknown,
}

impl AssetType {
    /// Derive the asset type from a file format extension (lowercased).
    pub fn from_format(format: &str) -> AssetType {
        match format.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "bmp" | "gif" => AssetType::Image,
            "tif" | "tiff" => AssetType::Tiff,
            "pdf" => AssetType::Pdf,
            "mp4" | "mov" | "avi" | "webm" | "mkv" => AssetType::Video,
            _ => AssetType::Unknown,
        }
    }
}

/// Pixel dimensions of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSize {
    pub width: u32,
    pub height: u32,
}

/// A single asset tracked by a project.
///
/// The id is a SHA-256 digest of the normalized path so the same file always
/// resolves to the same asset across enumeration runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub path: String,
    /// File format extension without the leading dot, e.g. `jpg`.
    pub format: String,
    pub state: AssetState,
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<AssetSize>,
}

impl Asset {
    /// The asset name with its format extension stripped, used to derive
    /// output file names (`<stem>.tfrecord`).
    pub fn stem(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, ext)) if ext.eq_ignore_ascii_case(&self.format) => stem,
            _ => &self.name,
        }
    }
}

/// A 2D point in absolute pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// An axis-aligned bounding box in absolute pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Geometry kind of a drawn region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegionType {
    Rectangle,
    Polygon,
    Point,
    Polyline,
}

impl std::fmt::Display for RegionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            RegionType::Rectangle => "rectangle",
            RegionType::Polygon => "polygon",
            RegionType::Point => "point",
            RegionType::Polyline => "polyline",
        };
        write!(f, "{}", value)
    }
}

impl TryFrom<&str> for RegionType {
    type Error = crate::Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "rectangle" => Ok(RegionType::Rectangle),
            "polygon" => Ok(RegionType::Polygon),
            "point" => Ok(RegionType::Point),
            "polyline" => Ok(RegionType::Polyline),
            _ => Err(crate::Error::InvalidRegionType(s.to_string())),
        }
    }
}

/// A drawn region on an asset: geometry plus the tag names assigned to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: String,
    #[serde(rename = "type")]
    pub region_type: RegionType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub points: Vec<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
}

impl Region {
    /// Resolve the region's bounding box.
    ///
    /// Prefers the explicit box when present; otherwise computes the
    /// axis-aligned hull of the point list. Returns `None` for a region with
    /// neither a box nor points.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        if let Some(bbox) = self.bounding_box {
            return Some(bbox);
        }

        let first = self.points.first()?;
        let mut min = *first;
        let mut max = *first;
        for p in &self.points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }

        Some(BoundingBox {
            left: min.x,
            top: min.y,
            width: max.x - min.x,
            height: max.y - min.y,
        })
    }
}

/// One value region of a structured label: the text that was associated with
/// the label on a given page, with its bounding geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelValue {
    pub page: u32,
    pub text: String,
    #[serde(default)]
    pub bounding_boxes: Vec<Vec<f64>>,
}

/// A structured label: a field name and the value regions assigned to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub label: String,
    #[serde(default)]
    pub value: Vec<LabelValue>,
}

/// Structured label data for a document asset: the document association plus
/// per-label value regions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelData {
    pub document: String,
    #[serde(default)]
    pub labels: Vec<Label>,
}

/// An asset paired with its resolved annotation content.
///
/// Invariant: a `Tagged` asset carries at least one region or label. The
/// editor layer maintains this; the export pipeline relies on it only for
/// output completeness, never for safety.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMetadata {
    pub asset: Asset,
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_data: Option<LabelData>,
    pub version: String,
}

impl AssetMetadata {
    /// Metadata for an asset that has no label file yet.
    pub fn empty(asset: Asset) -> AssetMetadata {
        AssetMetadata {
            asset,
            regions: Vec::new(),
            label_data: None,
            version: crate::LABELS_VERSION.to_string(),
        }
    }
}
