//! Major/relative-minor key naming for detected pitch classes.

use serde::Serialize;
use std::fmt;

use crate::analysis::harmonic::PITCH_CLASSES;

/// A major key and its relative minor, both as pitch-class names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct KeyPair {
    pub major: &'static str,
    pub minor: &'static str,
}

impl fmt::Display for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}m", self.major, self.minor)
    }
}

fn index_of(key: &str) -> Option<usize> {
    PITCH_CLASSES.iter().position(|&k| k == key)
}

/// Relative minor of a major key, three semitones below.
pub fn relative_minor(major: &str) -> Option<&'static str> {
    index_of(major).map(|i| PITCH_CLASSES[(i + 9) % 12])
}

/// Key reached by moving `semitones` away from `key`. Fractional shifts are
/// rounded to the nearest semitone.
pub fn transpose_key(key: &str, semitones: f32) -> Option<KeyPair> {
    let index = index_of(key)? as i64;
    let shifted = (index + semitones.round() as i64).rem_euclid(12) as usize;
    let major = PITCH_CLASSES[shifted];
    Some(KeyPair {
        major,
        minor: PITCH_CLASSES[(shifted + 9) % 12],
    })
}

/// `"C/Am"`-style label; unknown keys print as `"?/?m"`.
pub fn format_with_minor(key: &str) -> String {
    match transpose_key(key, 0.0) {
        Some(pair) => pair.to_string(),
        None => "?/?m".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_minors() {
        assert_eq!(relative_minor("C"), Some("A"));
        assert_eq!(relative_minor("D#"), Some("C"));
        assert_eq!(relative_minor("A"), Some("F#"));
        assert_eq!(relative_minor("H"), None);
    }

    #[test]
    fn transposition_wraps_both_ways() {
        let up = transpose_key("A#", 3.0).unwrap();
        assert_eq!(up, KeyPair { major: "C#", minor: "A#" });
        let down = transpose_key("C", -1.0).unwrap();
        assert_eq!(down.major, "B");
        assert_eq!(down.minor, "G#");
        assert_eq!(transpose_key("E", 12.0).unwrap().major, "E");
        assert_eq!(transpose_key("N/A", 2.0), None);
    }

    #[test]
    fn labels() {
        assert_eq!(format_with_minor("C"), "C/Am");
        assert_eq!(format_with_minor("F#"), "F#/D#m");
        assert_eq!(format_with_minor(""), "?/?m");
    }
}
