// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Record-file container format and feature codec.
//!
//! A record file is a sequence of length-prefixed, checksummed frames, each
//! carrying one encoded feature-map message. The [`writer`] module produces
//! frames, the [`reader`] module parses them leniently, and [`feature`]
//! holds the message codec shared by both.

pub mod crc;
pub mod feature;
pub mod reader;
pub mod writer;

pub use crc::{crc32c, mask, masked_crc32c};
pub use feature::{Example, Feature, FeatureKind, FeatureValue};
pub use reader::{ParseOutcome, TfRecordReader};
pub use writer::{FRAME_OVERHEAD, TfRecordWriter, encode_frame};
