// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Lenient record-frame parsing.
//!
//! The reader walks frames front to back and stops at the first frame that
//! fails its length check, either CRC, or payload decode. Everything parsed
//! before the bad frame is kept, so a file truncated or corrupted partway
//! through still yields its intact prefix. The stop reason and byte offset
//! are reported through [`ParseOutcome`] rather than an error, since a
//! partial read is still a useful read.

use super::crc::masked_crc32c;
use super::feature::{Example, FeatureKind, FeatureValue};
use crate::Error;
use log::warn;

/// Why parsing stopped, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Every frame parsed and the buffer ended on a frame boundary.
    Complete,
    /// The buffer ended partway through a frame.
    Truncated { offset: usize },
    /// The stored length checksum did not match the length bytes.
    LengthCrcMismatch { offset: usize },
    /// The stored payload checksum did not match the payload bytes.
    DataCrcMismatch { offset: usize },
    /// The payload checksum held but the message inside did not decode.
    MalformedExample { offset: usize },
}

impl ParseOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, ParseOutcome::Complete)
    }
}

/// Parsed records plus the outcome of the parse.
#[derive(Debug)]
pub struct TfRecordReader {
    records: Vec<Example>,
    outcome: ParseOutcome,
}

impl TfRecordReader {
    /// Parse as many whole records as the buffer holds.
    pub fn parse(data: &[u8]) -> TfRecordReader {
        let mut records = Vec::new();
        let mut pos = 0usize;

        let outcome = loop {
            if pos == data.len() {
                break ParseOutcome::Complete;
            }
            let Some(header) = data.get(pos..pos + 12) else {
                break ParseOutcome::Truncated { offset: pos };
            };

            let mut length_bytes = [0u8; 8];
            length_bytes.copy_from_slice(&header[0..8]);
            let mut crc_bytes = [0u8; 4];
            crc_bytes.copy_from_slice(&header[8..12]);
            let stored_length_crc = u32::from_le_bytes(crc_bytes);
            if masked_crc32c(&length_bytes) != stored_length_crc {
                break ParseOutcome::LengthCrcMismatch { offset: pos };
            }

            let length = u64::from_le_bytes(length_bytes);
            let Ok(length) = usize::try_from(length) else {
                break ParseOutcome::Truncated { offset: pos };
            };
            let payload_start = pos + 12;
            let Some(payload_end) = payload_start.checked_add(length) else {
                break ParseOutcome::Truncated { offset: pos };
            };
            let Some(payload) = data.get(payload_start..payload_end) else {
                break ParseOutcome::Truncated { offset: pos };
            };
            let Some(trailer) = data.get(payload_end..payload_end + 4) else {
                break ParseOutcome::Truncated { offset: pos };
            };

            let mut crc_bytes = [0u8; 4];
            crc_bytes.copy_from_slice(trailer);
            let stored_data_crc = u32::from_le_bytes(crc_bytes);
            if masked_crc32c(payload) != stored_data_crc {
                break ParseOutcome::DataCrcMismatch { offset: pos };
            }

            match Example::decode(payload) {
                Ok(example) => records.push(example),
                Err(_) => break ParseOutcome::MalformedExample { offset: pos },
            }

            pos = payload_end + 4;
        };

        if !outcome.is_complete() {
            warn!(
                "Stopped parsing after {} record(s): {:?}",
                records.len(),
                outcome
            );
        }

        TfRecordReader { records, outcome }
    }

    pub fn outcome(&self) -> &ParseOutcome {
        &self.outcome
    }

    /// Number of records parsed.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Example] {
        &self.records
    }

    /// Look up a feature in record `index`.
    pub fn feature(&self, index: usize, key: &str, kind: FeatureKind) -> Result<FeatureValue, Error> {
        let record = self.records.get(index).ok_or_else(|| {
            Error::InvalidState(format!(
                "record index {} out of range ({} records)",
                index,
                self.records.len()
            ))
        })?;
        record.feature(key, kind)
    }
}
