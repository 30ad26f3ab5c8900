use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Settings for every effect in the chain.
///
/// Each field defaults to the value that turns its effect off, so
/// `EffectParameters::default()` leaves a buffer untouched. Deserializing
/// accepts any subset of keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectParameters {
    /// Playback speed ratio; values above 1.0 shorten the track.
    pub speed: f32,
    /// Pitch shift in semitones, fractional steps allowed.
    pub pitch: f32,
    /// Forces speed 1.25 and pitch +3 semitones.
    pub nightcore: bool,
    pub reverb: f32,
    /// Gain in dB.
    pub gain: f32,
    pub low_pass: f32,
    pub high_pass: f32,
    pub delay: f32,
    /// Delay time in milliseconds.
    pub delay_time: f32,
    pub delay_feedback: f32,
    pub chorus: f32,
    pub chorus_rate: f32,
    pub chorus_depth: f32,
    pub flanger: f32,
    pub flanger_rate: f32,
    pub flanger_depth: f32,
    pub phaser: f32,
    pub phaser_rate: f32,
    pub distortion: f32,
    pub compression: f32,
    pub compression_ratio: f32,
    /// Threshold in dBFS.
    pub compression_threshold: f32,
    pub normalize: bool,
    pub reverse: bool,
    /// Fade-in length in seconds.
    pub fade_in: f32,
    /// Fade-out length in seconds.
    pub fade_out: f32,
    /// Stereo position in [-1.0, 1.0]; ignored for mono input.
    pub pan: f32,
    pub eq_bass: f32,
    pub eq_low_mid: f32,
    pub eq_mid: f32,
    pub eq_high_mid: f32,
    pub eq_treble: f32,
    /// Seeds the reverb noise. `None` draws a fresh seed per call.
    pub reverb_seed: Option<u64>,
}

impl Default for EffectParameters {
    fn default() -> Self {
        Self {
            speed: 1.0,
            pitch: 0.0,
            nightcore: false,
            reverb: 0.0,
            gain: 0.0,
            low_pass: 20000.0,
            high_pass: 20.0,
            delay: 0.0,
            delay_time: 250.0,
            delay_feedback: 0.3,
            chorus: 0.0,
            chorus_rate: 1.5,
            chorus_depth: 0.3,
            flanger: 0.0,
            flanger_rate: 0.5,
            flanger_depth: 0.5,
            phaser: 0.0,
            phaser_rate: 0.5,
            distortion: 0.0,
            compression: 0.0,
            compression_ratio: 4.0,
            compression_threshold: -12.0,
            normalize: false,
            reverse: false,
            fade_in: 0.0,
            fade_out: 0.0,
            pan: 0.0,
            eq_bass: 0.0,
            eq_low_mid: 0.0,
            eq_mid: 0.0,
            eq_high_mid: 0.0,
            eq_treble: 0.0,
            reverb_seed: None,
        }
    }
}

impl EffectParameters {
    /// Speed and pitch after the nightcore override.
    pub fn resolved(&self) -> Self {
        let mut params = self.clone();
        if params.nightcore {
            params.speed = 1.25;
            params.pitch = 3.0;
        }
        params
    }

    /// Per-band EQ gains in dB, bass first.
    pub fn eq_gains(&self) -> [f32; 5] {
        [
            self.eq_bass,
            self.eq_low_mid,
            self.eq_mid,
            self.eq_high_mid,
            self.eq_treble,
        ]
    }

    /// Reject values the processor cannot interpret.
    pub fn validate(&self) -> Result<()> {
        let finite: &[(&'static str, f32)] = &[
            ("speed", self.speed),
            ("pitch", self.pitch),
            ("reverb", self.reverb),
            ("gain", self.gain),
            ("low_pass", self.low_pass),
            ("high_pass", self.high_pass),
            ("delay", self.delay),
            ("delay_time", self.delay_time),
            ("delay_feedback", self.delay_feedback),
            ("chorus", self.chorus),
            ("chorus_rate", self.chorus_rate),
            ("chorus_depth", self.chorus_depth),
            ("flanger", self.flanger),
            ("flanger_rate", self.flanger_rate),
            ("flanger_depth", self.flanger_depth),
            ("phaser", self.phaser),
            ("phaser_rate", self.phaser_rate),
            ("distortion", self.distortion),
            ("compression", self.compression),
            ("compression_ratio", self.compression_ratio),
            ("compression_threshold", self.compression_threshold),
            ("fade_in", self.fade_in),
            ("fade_out", self.fade_out),
            ("pan", self.pan),
            ("eq_bass", self.eq_bass),
            ("eq_low_mid", self.eq_low_mid),
            ("eq_mid", self.eq_mid),
            ("eq_high_mid", self.eq_high_mid),
            ("eq_treble", self.eq_treble),
        ];
        for &(name, value) in finite {
            if !value.is_finite() {
                return Err(invalid(name, "must be a finite number"));
            }
        }

        let unit: &[(&'static str, f32)] = &[
            ("reverb", self.reverb),
            ("delay", self.delay),
            ("delay_feedback", self.delay_feedback),
            ("chorus", self.chorus),
            ("chorus_depth", self.chorus_depth),
            ("flanger", self.flanger),
            ("flanger_depth", self.flanger_depth),
            ("phaser", self.phaser),
            ("distortion", self.distortion),
            ("compression", self.compression),
        ];
        for &(name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(name, "must be between 0.0 and 1.0"));
            }
        }

        let positive: &[(&'static str, f32)] = &[
            ("speed", self.speed),
            ("low_pass", self.low_pass),
            ("high_pass", self.high_pass),
            ("chorus_rate", self.chorus_rate),
            ("flanger_rate", self.flanger_rate),
            ("phaser_rate", self.phaser_rate),
        ];
        for &(name, value) in positive {
            if value <= 0.0 {
                return Err(invalid(name, "must be greater than zero"));
            }
        }

        let non_negative: &[(&'static str, f32)] = &[
            ("delay_time", self.delay_time),
            ("fade_in", self.fade_in),
            ("fade_out", self.fade_out),
        ];
        for &(name, value) in non_negative {
            if value < 0.0 {
                return Err(invalid(name, "must not be negative"));
            }
        }

        if self.compression_ratio < 1.0 {
            return Err(invalid("compression_ratio", "must be at least 1.0"));
        }
        if self.compression_threshold > 0.0 {
            return Err(invalid("compression_threshold", "must be at most 0 dBFS"));
        }
        if !(-1.0..=1.0).contains(&self.pan) {
            return Err(invalid("pan", "must be between -1.0 and 1.0"));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, reason: &str) -> Error {
    Error::InvalidParameter {
        name,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_published_values() {
        let p = EffectParameters::default();
        assert_eq!(p.speed, 1.0);
        assert_eq!(p.low_pass, 20000.0);
        assert_eq!(p.high_pass, 20.0);
        assert_eq!(p.delay_time, 250.0);
        assert_eq!(p.delay_feedback, 0.3);
        assert_eq!(p.chorus_rate, 1.5);
        assert_eq!(p.flanger_depth, 0.5);
        assert_eq!(p.compression_ratio, 4.0);
        assert_eq!(p.compression_threshold, -12.0);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn nightcore_overrides_speed_and_pitch() {
        let p = EffectParameters {
            nightcore: true,
            speed: 0.5,
            pitch: -7.0,
            ..Default::default()
        }
        .resolved();
        assert_eq!(p.speed, 1.25);
        assert_eq!(p.pitch, 3.0);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let p: EffectParameters = serde_json::from_str(r#"{"reverb": 0.4, "pan": -0.5}"#).unwrap();
        assert_eq!(p.reverb, 0.4);
        assert_eq!(p.pan, -0.5);
        assert_eq!(p.speed, 1.0);
        assert_eq!(p.reverb_seed, None);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let cases = [
            EffectParameters { speed: 0.0, ..Default::default() },
            EffectParameters { low_pass: -100.0, ..Default::default() },
            EffectParameters { reverb: 1.5, ..Default::default() },
            EffectParameters { pan: 2.0, ..Default::default() },
            EffectParameters { compression_ratio: 0.5, ..Default::default() },
            EffectParameters { fade_in: -1.0, ..Default::default() },
            EffectParameters { gain: f32::NAN, ..Default::default() },
        ];
        for params in cases {
            assert!(params.validate().is_err(), "{:?} should be rejected", params);
        }
    }

    #[test]
    fn names_the_offending_parameter() {
        let err = EffectParameters { chorus_rate: 0.0, ..Default::default() }
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("chorus_rate"));
    }
}
