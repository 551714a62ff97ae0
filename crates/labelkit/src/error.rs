// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

/// Comprehensive error type for Labelkit operations.
///
/// Covers storage I/O, project and label-file parsing, the TFRecord feature
/// codec, and export preconditions. Frame corruption during TFRecord reads is
/// deliberately *not* represented here: the reader recovers locally and
/// reports a [`ParseOutcome`](crate::tfrecord::ParseOutcome) instead.
#[derive(Debug)]
pub enum Error {
    /// An I/O error occurred during file operations.
    IoError(std::io::Error),
    /// JSON serialization or deserialization error.
    JsonError(serde_json::Error),
    /// A serialized feature message could not be decoded.
    MalformedExample(String),
    /// A feature key was not present in the record.
    MissingFeature(String),
    /// A feature was present but held a different kind than requested.
    FeatureKindMismatch(String),
    /// A label file failed field validation.
    InvalidLabelData(String),
    /// An asset has missing or zero pixel dimensions, which would make
    /// bounding-box normalization divide by zero.
    InvalidAssetSize(String),
    /// Invalid asset state filter string.
    InvalidAssetState(String),
    /// Invalid region type string.
    InvalidRegionType(String),
    /// Invalid asset state string.
    InvalidState(String),
}

impl Error {
    /// Returns true when the error is a not-found I/O condition.
    ///
    /// The metadata resolver uses this to distinguish "asset has no label
    /// file yet" (expected) from real storage failures (propagated).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::IoError(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::JsonError(err)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "I/O error: {}", e),
            Error::JsonError(e) => write!(f, "JSON error: {}", e),
            Error::MalformedExample(s) => write!(f, "Malformed example message: {}", s),
            Error::MissingFeature(s) => write!(f, "Missing feature: {}", s),
            Error::FeatureKindMismatch(s) => write!(f, "Feature kind mismatch: {}", s),
            Error::InvalidLabelData(s) => write!(f, "Invalid label data: {}", s),
            Error::InvalidAssetSize(s) => write!(f, "Invalid asset size: {}", s),
            Error::InvalidAssetState(s) => write!(f, "Invalid asset state filter: {}", s),
            Error::InvalidRegionType(s) => write!(f, "Invalid region type: {}", s),
            Error::InvalidState(s) => write!(f, "Invalid asset state: {}", s),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            Error::JsonError(e) => Some(e),
            _ => None,
        }
    }
}
