// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Typed feature-map messages and their protobuf wire codec.
//!
//! One [`Example`] holds the feature map for a single record: each key maps
//! to exactly one feature kind (byte-strings, 64-bit integers, or floats),
//! and lists may hold zero or more entries. The wire layout is the standard
//! `Example`/`Features`/`Feature` message nesting: varint-tagged fields,
//! length-delimited submessages, packed primitive lists. The decoder also
//! accepts unpacked primitive lists for interoperability.
//!
//! Features are kept in a sorted map so encoding the same inputs always
//! produces byte-identical messages.

use crate::Error;
use std::collections::BTreeMap;

// Protobuf wire types.
const WIRE_VARINT: u32 = 0;
const WIRE_I32: u32 = 5;
const WIRE_LEN: u32 = 2;

/// A single typed feature value list.
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    /// Byte-string list; covers both UTF-8 text and raw binary.
    Bytes(Vec<Vec<u8>>),
    Int64(Vec<i64>),
    Float(Vec<f32>),
}

/// The kind tag used when looking a feature back up out of a record.
///
/// `String` and `Binary` both address byte-string features; `String`
/// additionally decodes the bytes as UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    String,
    Binary,
    Int64,
    Float,
}

/// A decoded feature value, typed per the requested [`FeatureKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    String(Vec<String>),
    Binary(Vec<Vec<u8>>),
    Int64(Vec<i64>),
    Float(Vec<f32>),
}

impl FeatureValue {
    pub fn strings(&self) -> Option<&[String]> {
        match self {
            FeatureValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn bytes(&self) -> Option<&[Vec<u8>]> {
        match self {
            FeatureValue::Binary(v) => Some(v),
            _ => None,
        }
    }

    pub fn int64s(&self) -> Option<&[i64]> {
        match self {
            FeatureValue::Int64(v) => Some(v),
            _ => None,
        }
    }

    pub fn floats(&self) -> Option<&[f32]> {
        match self {
            FeatureValue::Float(v) => Some(v),
            _ => None,
        }
    }
}

/// One record's feature map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Example {
    features: BTreeMap<String, Feature>,
}

impl Example {
    pub fn new() -> Example {
        Example::default()
    }

    /// Add a single byte-string feature.
    pub fn add_bytes(&mut self, key: &str, value: Vec<u8>) -> &mut Self {
        self.add_bytes_list(key, vec![value])
    }

    /// Add a byte-string list feature.
    pub fn add_bytes_list(&mut self, key: &str, values: Vec<Vec<u8>>) -> &mut Self {
        self.features.insert(key.to_string(), Feature::Bytes(values));
        self
    }

    /// Add a single UTF-8 string feature.
    pub fn add_string(&mut self, key: &str, value: &str) -> &mut Self {
        self.add_bytes(key, value.as_bytes().to_vec())
    }

    /// Add a list of UTF-8 string features.
    pub fn add_string_list(&mut self, key: &str, values: &[String]) -> &mut Self {
        self.add_bytes_list(key, values.iter().map(|s| s.as_bytes().to_vec()).collect())
    }

    /// Add a single int64 feature.
    pub fn add_int64(&mut self, key: &str, value: i64) -> &mut Self {
        self.add_int64_list(key, vec![value])
    }

    /// Add an int64 list feature.
    pub fn add_int64_list(&mut self, key: &str, values: Vec<i64>) -> &mut Self {
        self.features.insert(key.to_string(), Feature::Int64(values));
        self
    }

    /// Add a float list feature.
    pub fn add_float_list(&mut self, key: &str, values: Vec<f32>) -> &mut Self {
        self.features.insert(key.to_string(), Feature::Float(values));
        self
    }

    /// Number of features in the map.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterate over feature keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    /// Look up a feature by key and kind.
    ///
    /// An unknown key yields [`Error::MissingFeature`]; a key holding a
    /// different kind than requested yields [`Error::FeatureKindMismatch`].
    /// The caller is responsible for knowing the schema it wrote.
    pub fn feature(&self, key: &str, kind: FeatureKind) -> Result<FeatureValue, Error> {
        let feature = self
            .features
            .get(key)
            .ok_or_else(|| Error::MissingFeature(key.to_string()))?;

        match (feature, kind) {
            (Feature::Bytes(values), FeatureKind::Binary) => {
                Ok(FeatureValue::Binary(values.clone()))
            }
            (Feature::Bytes(values), FeatureKind::String) => {
                let strings = values
                    .iter()
                    .map(|bytes| {
                        String::from_utf8(bytes.clone()).map_err(|_| {
                            Error::FeatureKindMismatch(format!("{} is not valid UTF-8", key))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(FeatureValue::String(strings))
            }
            (Feature::Int64(values), FeatureKind::Int64) => {
                Ok(FeatureValue::Int64(values.clone()))
            }
            (Feature::Float(values), FeatureKind::Float) => {
                Ok(FeatureValue::Float(values.clone()))
            }
            (feature, kind) => Err(Error::FeatureKindMismatch(format!(
                "{} holds {}, requested {:?}",
                key,
                match feature {
                    Feature::Bytes(_) => "bytes",
                    Feature::Int64(_) => "int64",
                    Feature::Float(_) => "float",
                },
                kind
            ))),
        }
    }

    /// Encode the example into its wire message.
    ///
    /// Always succeeds; the same feature map encodes to the same bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut features = Vec::new();
        for (key, feature) in &self.features {
            let mut entry = Vec::new();
            put_len_field(&mut entry, 1, key.as_bytes());
            put_len_field(&mut entry, 2, &encode_feature(feature));
            put_len_field(&mut features, 1, &entry);
        }

        let mut example = Vec::new();
        put_len_field(&mut example, 1, &features);
        example
    }

    /// Decode an example from its wire message.
    pub fn decode(data: &[u8]) -> Result<Example, Error> {
        let mut example = Example::new();
        let mut reader = Reader::new(data);

        while !reader.at_end() {
            let (field, wire) = reader.tag()?;
            match (field, wire) {
                (1, WIRE_LEN) => {
                    let features = reader.len_delimited()?;
                    decode_features(features, &mut example)?;
                }
                _ => reader.skip(wire)?,
            }
        }

        Ok(example)
    }
}

fn encode_feature(feature: &Feature) -> Vec<u8> {
    let mut out = Vec::new();
    match feature {
        Feature::Bytes(values) => {
            let mut list = Vec::new();
            for value in values {
                put_len_field(&mut list, 1, value);
            }
            put_len_field(&mut out, 1, &list);
        }
        Feature::Float(values) => {
            let mut packed = Vec::with_capacity(values.len() * 4);
            for value in values {
                packed.extend_from_slice(&value.to_le_bytes());
            }
            let mut list = Vec::new();
            put_len_field(&mut list, 1, &packed);
            put_len_field(&mut out, 2, &list);
        }
        Feature::Int64(values) => {
            let mut packed = Vec::new();
            for &value in values {
                put_varint(&mut packed, value as u64);
            }
            let mut list = Vec::new();
            put_len_field(&mut list, 1, &packed);
            put_len_field(&mut out, 3, &list);
        }
    }
    out
}

fn decode_features(data: &[u8], example: &mut Example) -> Result<(), Error> {
    let mut reader = Reader::new(data);
    while !reader.at_end() {
        let (field, wire) = reader.tag()?;
        match (field, wire) {
            (1, WIRE_LEN) => {
                let entry = reader.len_delimited()?;
                let (key, feature) = decode_entry(entry)?;
                example.features.insert(key, feature);
            }
            _ => reader.skip(wire)?,
        }
    }
    Ok(())
}

fn decode_entry(data: &[u8]) -> Result<(String, Feature), Error> {
    let mut reader = Reader::new(data);
    let mut key = None;
    let mut feature = None;

    while !reader.at_end() {
        let (field, wire) = reader.tag()?;
        match (field, wire) {
            (1, WIRE_LEN) => {
                let bytes = reader.len_delimited()?;
                let name = String::from_utf8(bytes.to_vec())
                    .map_err(|_| Error::MalformedExample("non-UTF-8 feature key".to_string()))?;
                key = Some(name);
            }
            (2, WIRE_LEN) => {
                feature = Some(decode_feature(reader.len_delimited()?)?);
            }
            _ => reader.skip(wire)?,
        }
    }

    match (key, feature) {
        (Some(key), Some(feature)) => Ok((key, feature)),
        _ => Err(Error::MalformedExample(
            "feature map entry missing key or value".to_string(),
        )),
    }
}

fn decode_feature(data: &[u8]) -> Result<Feature, Error> {
    let mut reader = Reader::new(data);
    // An empty Feature message defaults to an empty byte-string list.
    let mut feature = Feature::Bytes(Vec::new());

    while !reader.at_end() {
        let (field, wire) = reader.tag()?;
        match (field, wire) {
            (1, WIRE_LEN) => feature = Feature::Bytes(decode_bytes_list(reader.len_delimited()?)?),
            (2, WIRE_LEN) => feature = Feature::Float(decode_float_list(reader.len_delimited()?)?),
            (3, WIRE_LEN) => feature = Feature::Int64(decode_int64_list(reader.len_delimited()?)?),
            _ => reader.skip(wire)?,
        }
    }

    Ok(feature)
}

fn decode_bytes_list(data: &[u8]) -> Result<Vec<Vec<u8>>, Error> {
    let mut reader = Reader::new(data);
    let mut values = Vec::new();
    while !reader.at_end() {
        let (field, wire) = reader.tag()?;
        match (field, wire) {
            (1, WIRE_LEN) => values.push(reader.len_delimited()?.to_vec()),
            _ => reader.skip(wire)?,
        }
    }
    Ok(values)
}

fn decode_float_list(data: &[u8]) -> Result<Vec<f32>, Error> {
    let mut reader = Reader::new(data);
    let mut values = Vec::new();
    while !reader.at_end() {
        let (field, wire) = reader.tag()?;
        match (field, wire) {
            // Packed: one length-delimited run of fixed32 values.
            (1, WIRE_LEN) => {
                let packed = reader.len_delimited()?;
                if packed.len() % 4 != 0 {
                    return Err(Error::MalformedExample(
                        "packed float list length not a multiple of 4".to_string(),
                    ));
                }
                for chunk in packed.chunks_exact(4) {
                    values.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
                }
            }
            // Unpacked: individual fixed32 fields.
            (1, WIRE_I32) => values.push(f32::from_le_bytes(reader.fixed32()?)),
            _ => reader.skip(wire)?,
        }
    }
    Ok(values)
}

fn decode_int64_list(data: &[u8]) -> Result<Vec<i64>, Error> {
    let mut reader = Reader::new(data);
    let mut values = Vec::new();
    while !reader.at_end() {
        let (field, wire) = reader.tag()?;
        match (field, wire) {
            // Packed: one length-delimited run of varints.
            (1, WIRE_LEN) => {
                let mut packed = Reader::new(reader.len_delimited()?);
                while !packed.at_end() {
                    values.push(packed.varint()? as i64);
                }
            }
            // Unpacked: individual varint fields.
            (1, WIRE_VARINT) => values.push(reader.varint()? as i64),
            _ => reader.skip(wire)?,
        }
    }
    Ok(values)
}

fn put_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

/// Append a length-delimited field: tag, length varint, payload.
fn put_len_field(buf: &mut Vec<u8>, field: u32, payload: &[u8]) {
    put_varint(buf, ((field << 3) | WIRE_LEN) as u64);
    put_varint(buf, payload.len() as u64);
    buf.extend_from_slice(payload);
}

/// Bounds-checked cursor over a wire message.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Reader<'a> {
        Reader { buf, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn varint(&mut self) -> Result<u64, Error> {
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = *self
                .buf
                .get(self.pos)
                .ok_or_else(|| Error::MalformedExample("truncated varint".to_string()))?;
            self.pos += 1;

            if shift >= 64 {
                return Err(Error::MalformedExample("varint overflow".to_string()));
            }
            value |= u64::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    fn tag(&mut self) -> Result<(u32, u32), Error> {
        let tag = self.varint()?;
        let field = (tag >> 3) as u32;
        let wire = (tag & 0x7) as u32;
        if field == 0 {
            return Err(Error::MalformedExample("field number zero".to_string()));
        }
        Ok((field, wire))
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], Error> {
        let end = self
            .pos
            .checked_add(count)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| Error::MalformedExample("length past end of message".to_string()))?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn len_delimited(&mut self) -> Result<&'a [u8], Error> {
        let len = self.varint()?;
        let len = usize::try_from(len)
            .map_err(|_| Error::MalformedExample("length does not fit usize".to_string()))?;
        self.take(len)
    }

    fn fixed32(&mut self) -> Result<[u8; 4], Error> {
        let bytes = self.take(4)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    fn skip(&mut self, wire: u32) -> Result<(), Error> {
        match wire {
            WIRE_VARINT => {
                self.varint()?;
            }
            1 => {
                self.take(8)?;
            }
            WIRE_LEN => {
                self.len_delimited()?;
            }
            WIRE_I32 => {
                self.take(4)?;
            }
            _ => {
                return Err(Error::MalformedExample(format!(
                    "unsupported wire type {}",
                    wire
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_example() -> Example {
        let mut example = Example::new();
        example
            .add_string("image/format", "png")
            .add_bytes("image/encoded", vec![0xFF, 0xD8, 0xFF])
            .add_int64("image/height", 480)
            .add_int64_list("image/object/class/label", vec![1, 2, 3])
            .add_float_list("image/object/bbox/xmin", vec![0.1, 0.5, 0.25])
            .add_string_list(
                "image/object/class/text",
                &["cat".to_string(), "dog".to_string(), "cat".to_string()],
            );
        example
    }

    #[test]
    fn test_round_trip_all_kinds() {
        let example = sample_example();
        let decoded = Example::decode(&example.encode()).unwrap();
        assert_eq!(decoded, example);

        let text = decoded
            .feature("image/object/class/text", FeatureKind::String)
            .unwrap();
        assert_eq!(text.strings().unwrap(), &["cat", "dog", "cat"]);

        let encoded = decoded
            .feature("image/encoded", FeatureKind::Binary)
            .unwrap();
        assert_eq!(encoded.bytes().unwrap()[0], vec![0xFF, 0xD8, 0xFF]);

        let height = decoded.feature("image/height", FeatureKind::Int64).unwrap();
        assert_eq!(height.int64s().unwrap(), &[480]);

        let xmin = decoded
            .feature("image/object/bbox/xmin", FeatureKind::Float)
            .unwrap();
        assert_eq!(xmin.floats().unwrap(), &[0.1, 0.5, 0.25]);
    }

    #[test]
    fn test_round_trip_negative_int64() {
        let mut example = Example::new();
        example.add_int64_list("values", vec![-1, i64::MIN, i64::MAX, 0]);

        let decoded = Example::decode(&example.encode()).unwrap();
        let values = decoded.feature("values", FeatureKind::Int64).unwrap();
        assert_eq!(values.int64s().unwrap(), &[-1, i64::MIN, i64::MAX, 0]);
    }

    #[test]
    fn test_round_trip_empty_lists() {
        let mut example = Example::new();
        example
            .add_float_list("boxes", Vec::new())
            .add_int64_list("labels", Vec::new())
            .add_bytes_list("names", Vec::new());

        let decoded = Example::decode(&example.encode()).unwrap();
        assert_eq!(decoded.len(), 3);
        assert!(
            decoded
                .feature("boxes", FeatureKind::Float)
                .unwrap()
                .floats()
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_missing_key_and_kind_mismatch() {
        let example = sample_example();

        let err = example.feature("no/such/key", FeatureKind::Int64).unwrap_err();
        assert!(matches!(err, Error::MissingFeature(_)));

        let err = example
            .feature("image/height", FeatureKind::Float)
            .unwrap_err();
        assert!(matches!(err, Error::FeatureKindMismatch(_)));
    }

    #[test]
    fn test_string_kind_rejects_invalid_utf8() {
        let mut example = Example::new();
        example.add_bytes("raw", vec![0xFF, 0xFE]);

        assert!(example.feature("raw", FeatureKind::Binary).is_ok());
        let err = example.feature("raw", FeatureKind::String).unwrap_err();
        assert!(matches!(err, Error::FeatureKindMismatch(_)));
    }

    #[test]
    fn test_encode_is_deterministic_and_order_independent() {
        let mut a = Example::new();
        a.add_string("b", "two").add_string("a", "one");

        let mut b = Example::new();
        b.add_string("a", "one").add_string("b", "two");

        assert_eq!(a.encode(), b.encode());
        assert_eq!(a.encode(), a.encode());
    }

    #[test]
    fn test_decode_rejects_truncated_message() {
        let encoded = sample_example().encode();
        let err = Example::decode(&encoded[..encoded.len() - 3]).unwrap_err();
        assert!(matches!(err, Error::MalformedExample(_)));
    }

    #[test]
    fn test_decode_accepts_unpacked_primitives() {
        // Int64List { value: 7 } with the value as an unpacked varint field.
        let int64_list = [0x08, 0x07];
        let mut feature = Vec::new();
        put_len_field(&mut feature, 3, &int64_list);
        let mut entry = Vec::new();
        put_len_field(&mut entry, 1, b"count");
        put_len_field(&mut entry, 2, &feature);
        let mut features = Vec::new();
        put_len_field(&mut features, 1, &entry);
        let mut message = Vec::new();
        put_len_field(&mut message, 1, &features);

        let decoded = Example::decode(&message).unwrap();
        let values = decoded.feature("count", FeatureKind::Int64).unwrap();
        assert_eq!(values.int64s().unwrap(), &[7]);
    }
}
