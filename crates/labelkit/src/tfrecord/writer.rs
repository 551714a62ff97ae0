// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Record-frame encoding.
//!
//! Each record is framed as a little-endian u64 payload length, the masked
//! CRC32C of those eight length bytes, the payload itself, and the masked
//! CRC32C of the payload. Frames are written back to back with no file
//! header or trailer, so concatenating two files yields one valid file.

use super::crc::masked_crc32c;
use super::feature::Example;

/// Bytes of frame overhead per record: length, length CRC, payload CRC.
pub const FRAME_OVERHEAD: usize = 8 + 4 + 4;

/// Frame a single payload as a standalone record.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(FRAME_OVERHEAD + payload.len());
    let length = (payload.len() as u64).to_le_bytes();
    frame.extend_from_slice(&length);
    frame.extend_from_slice(&masked_crc32c(&length).to_le_bytes());
    frame.extend_from_slice(payload);
    frame.extend_from_slice(&masked_crc32c(payload).to_le_bytes());
    frame
}

/// Accumulates framed records into a single buffer.
#[derive(Debug, Default)]
pub struct TfRecordWriter {
    buffer: Vec<u8>,
    records: usize,
}

impl TfRecordWriter {
    pub fn new() -> TfRecordWriter {
        TfRecordWriter::default()
    }

    /// Append one raw payload as a framed record.
    pub fn write_payload(&mut self, payload: &[u8]) {
        self.buffer.extend_from_slice(&encode_frame(payload));
        self.records += 1;
    }

    /// Encode and append one example message.
    pub fn write_example(&mut self, example: &Example) {
        self.write_payload(&example.encode());
    }

    /// Number of records written so far.
    pub fn records(&self) -> usize {
        self.records
    }

    /// Consume the writer and return the framed bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tfrecord::crc::masked_crc32c;

    #[test]
    fn test_frame_layout() {
        let payload = b"hello records";
        let frame = encode_frame(payload);

        assert_eq!(frame.len(), FRAME_OVERHEAD + payload.len());
        assert_eq!(&frame[0..8], &(payload.len() as u64).to_le_bytes());
        assert_eq!(
            &frame[8..12],
            &masked_crc32c(&(payload.len() as u64).to_le_bytes()).to_le_bytes()
        );
        assert_eq!(&frame[12..12 + payload.len()], payload);
        assert_eq!(
            &frame[12 + payload.len()..],
            &masked_crc32c(payload).to_le_bytes()
        );
    }

    #[test]
    fn test_empty_payload_frame() {
        let frame = encode_frame(b"");
        assert_eq!(frame.len(), FRAME_OVERHEAD);
        assert_eq!(&frame[0..8], &0u64.to_le_bytes());
    }

    #[test]
    fn test_writer_concatenates_frames() {
        let mut writer = TfRecordWriter::new();
        writer.write_payload(b"one");
        writer.write_payload(b"two");
        assert_eq!(writer.records(), 2);

        let mut expected = encode_frame(b"one");
        expected.extend_from_slice(&encode_frame(b"two"));
        assert_eq!(writer.into_bytes(), expected);
    }
}
