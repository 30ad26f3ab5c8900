use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single descriptor value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Number(value)
    }
}

impl From<f32> for FeatureValue {
    fn from(value: f32) -> Self {
        FeatureValue::Number(value as f64)
    }
}

impl From<bool> for FeatureValue {
    fn from(value: bool) -> Self {
        FeatureValue::Flag(value)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Text(value.to_string())
    }
}

/// Descriptors of one buffer, keyed by metric name.
///
/// Serializes as a flat JSON object, e.g. `{"bpm": 120.0, "key": "A", ...}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSet(BTreeMap<String, FeatureValue>);

impl FeatureSet {
    pub fn get(&self, key: &str) -> Option<&FeatureValue> {
        self.0.get(key)
    }

    /// Numeric value of `key`; flags read as 0.0 / 1.0, text as `None`.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            FeatureValue::Number(n) => Some(*n),
            FeatureValue::Flag(b) => Some(if *b { 1.0 } else { 0.0 }),
            FeatureValue::Text(_) => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.0.get(key)? {
            FeatureValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            FeatureValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<FeatureValue>> FromIterator<(K, V)> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Round to `decimals` places, half away from zero.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_accessors() {
        let set: FeatureSet = [
            ("bpm", FeatureValue::from(128.0)),
            ("key", FeatureValue::from("F#")),
            ("is_stereo", FeatureValue::from(true)),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.number("bpm"), Some(128.0));
        assert_eq!(set.text("key"), Some("F#"));
        assert_eq!(set.flag("is_stereo"), Some(true));
        assert_eq!(set.number("is_stereo"), Some(1.0));
        assert_eq!(set.number("key"), None);
        assert_eq!(set.number("missing"), None);
    }

    #[test]
    fn serializes_as_flat_object() {
        let set: FeatureSet = [("bpm", FeatureValue::from(90.5)), ("key", FeatureValue::from("C"))]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"bpm":90.5,"key":"C"}"#);
        let back: FeatureSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(2.25, 1), 2.3);
        assert_eq!(round_to(-1.25, 1), -1.3);
    }
}
