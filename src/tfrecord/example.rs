//! `tf.train.Example` protobuf messages.
//!
//! Field numbers and types mirror `tensorflow/core/example/example.proto`
//! and `feature.proto`, so the encoded bytes are readable by
//! `tf.io.parse_single_example`. The feature map uses a `BTreeMap` so the
//! same record always encodes to the same bytes.

use std::collections::BTreeMap;

/// A single training example: a map of named features.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Example {
    #[prost(message, optional, tag = "1")]
    pub features: Option<Features>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Features {
    #[prost(btree_map = "string, message", tag = "1")]
    pub feature: BTreeMap<String, Feature>,
}

/// One feature value: a list of bytes, floats or int64s.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Feature {
    #[prost(oneof = "feature::Kind", tags = "1, 2, 3")]
    pub kind: Option<feature::Kind>,
}

pub mod feature {
    use super::{BytesList, FloatList, Int64List};

    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Kind {
        #[prost(message, tag = "1")]
        BytesList(BytesList),
        #[prost(message, tag = "2")]
        FloatList(FloatList),
        #[prost(message, tag = "3")]
        Int64List(Int64List),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BytesList {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub value: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct FloatList {
    #[prost(float, repeated, packed = "true", tag = "1")]
    pub value: Vec<f32>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Int64List {
    #[prost(int64, repeated, packed = "true", tag = "1")]
    pub value: Vec<i64>,
}

impl Feature {
    pub fn int64(value: i64) -> Self {
        Self::int64_list(vec![value])
    }

    pub fn int64_list(value: Vec<i64>) -> Self {
        Self {
            kind: Some(feature::Kind::Int64List(Int64List { value })),
        }
    }

    pub fn float_list(value: Vec<f32>) -> Self {
        Self {
            kind: Some(feature::Kind::FloatList(FloatList { value })),
        }
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        Self::bytes_list(vec![value.into()])
    }

    pub fn bytes_list(value: Vec<Vec<u8>>) -> Self {
        Self {
            kind: Some(feature::Kind::BytesList(BytesList { value })),
        }
    }

    pub fn as_int64_list(&self) -> Option<&[i64]> {
        match &self.kind {
            Some(feature::Kind::Int64List(list)) => Some(&list.value),
            _ => None,
        }
    }

    pub fn as_float_list(&self) -> Option<&[f32]> {
        match &self.kind {
            Some(feature::Kind::FloatList(list)) => Some(&list.value),
            _ => None,
        }
    }

    pub fn as_bytes_list(&self) -> Option<&[Vec<u8>]> {
        match &self.kind {
            Some(feature::Kind::BytesList(list)) => Some(&list.value),
            _ => None,
        }
    }

    /// Name of the populated list type, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            Some(feature::Kind::BytesList(_)) => "bytes_list",
            Some(feature::Kind::FloatList(_)) => "float_list",
            Some(feature::Kind::Int64List(_)) => "int64_list",
            None => "empty",
        }
    }
}

impl Example {
    pub fn from_features(feature: BTreeMap<String, Feature>) -> Self {
        Self {
            features: Some(Features { feature }),
        }
    }

    pub fn feature(&self, key: &str) -> Option<&Feature> {
        self.features.as_ref()?.feature.get(key)
    }

    /// Feature keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.features
            .iter()
            .flat_map(|features| features.feature.keys().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn encodes_deterministically_and_decodes() {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), Feature::float_list(vec![0.25, 0.5]));
        map.insert("a".to_string(), Feature::int64(42));
        map.insert("c".to_string(), Feature::bytes("jpeg"));
        let example = Example::from_features(map.clone());

        let bytes = example.encode_to_vec();
        assert_eq!(bytes, Example::from_features(map).encode_to_vec());

        let decoded = Example::decode(bytes.as_slice()).expect("decode");
        assert_eq!(decoded, example);
        assert_eq!(decoded.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(decoded.feature("a").and_then(Feature::as_int64_list), Some(&[42][..]));
        assert_eq!(
            decoded.feature("b").and_then(Feature::as_float_list),
            Some(&[0.25f32, 0.5][..])
        );
        assert_eq!(
            decoded.feature("c").and_then(Feature::as_bytes_list),
            Some(&[b"jpeg".to_vec()][..])
        );
    }

    #[test]
    fn int64_feature_wire_bytes() {
        // Feature { int64_list (field 3) { value: [1] packed } }
        let bytes = Feature::int64(1).encode_to_vec();
        assert_eq!(bytes, vec![0x1a, 0x03, 0x0a, 0x01, 0x01]);
    }

    #[test]
    fn accessors_reject_wrong_kind() {
        let feature = Feature::int64(1);
        assert!(feature.as_float_list().is_none());
        assert!(feature.as_bytes_list().is_none());
        assert_eq!(feature.kind_name(), "int64_list");
        assert_eq!(Feature::default().kind_name(), "empty");
    }
}
