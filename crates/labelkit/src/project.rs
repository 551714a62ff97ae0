// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Labeling project model.
//!
//! A project ties together a source connection (where assets come from), a
//! target connection (where exports and label files go), the ordered tag
//! vocabulary, and the assets already tracked by the editor.

use crate::{Asset, Error};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A project tag: a name and the display color assigned in the editor.
///
/// Tag order is significant — label maps assign 1-based ids in declaration
/// order, so reordering tags changes the exported class ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub color: String,
}

impl Tag {
    pub fn new(name: &str) -> Tag {
        Tag {
            name: name.to_string(),
            color: String::new(),
        }
    }
}

/// A labeling project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    pub version: String,
    /// Folder assets are enumerated from.
    pub source_connection: String,
    /// Folder label files and exports are written to.
    pub target_connection: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Assets already tracked by the editor, keyed by asset id.
    #[serde(default)]
    pub assets: HashMap<String, Asset>,
}

impl Project {
    /// Parse a project from its JSON file contents.
    pub fn from_json(text: &str) -> Result<Project, Error> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize the project to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The 1-based label-map id for a tag name, or `None` when the tag is not
    /// part of the project vocabulary. Id 0 is reserved for background.
    pub fn tag_id(&self, name: &str) -> Option<i64> {
        self.tags
            .iter()
            .position(|tag| tag.name == name)
            .map(|pos| pos as i64 + 1)
    }
}
