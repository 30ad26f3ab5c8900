pub mod features;
pub mod harmonic;
pub mod level;
pub mod spectral;
pub mod stft;
pub mod tempo;

use serde::Deserialize;

use crate::audio::bands::BANDS;
use crate::audio::buffer::SampleBuffer;
use crate::error::{Error, Result};

pub use features::{FeatureSet, FeatureValue};

use features::round_to;
use level::LevelStats;
use spectral::SpectralStats;
use stft::Stft;

/// Analysis window and STFT geometry.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Only the first `max_duration_secs` of a buffer are analyzed.
    pub max_duration_secs: f32,
    pub n_fft: usize,
    pub hop_length: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            max_duration_secs: 30.0,
            n_fft: 2048,
            hop_length: 512,
        }
    }
}

impl AnalysisSettings {
    /// Rejects geometries the STFT and level passes cannot run with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |name, reason: &str| Error::InvalidParameter {
            name,
            reason: reason.to_string(),
        };
        if !(self.max_duration_secs.is_finite() && self.max_duration_secs > 0.0) {
            return Err(invalid("max_duration_secs", "must be a positive number of seconds"));
        }
        if self.n_fft < 2 {
            return Err(invalid("n_fft", "must be at least 2"));
        }
        if self.hop_length == 0 || self.hop_length > self.n_fft {
            return Err(invalid("hop_length", "must be between 1 and n_fft"));
        }
        Ok(())
    }
}

/// Reduces a [`SampleBuffer`] to a [`FeatureSet`].
pub struct FeatureExtractor {
    settings: AnalysisSettings,
    stft: Stft,
}

impl FeatureExtractor {
    pub fn new(settings: AnalysisSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::with_valid(settings))
    }

    fn with_valid(settings: AnalysisSettings) -> Self {
        let stft = Stft::new(settings.n_fft, settings.hop_length);
        Self { settings, stft }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    pub fn extract(&self, buffer: &SampleBuffer) -> Result<FeatureSet> {
        if buffer.is_empty() {
            return Err(Error::InvalidInput("cannot analyze an empty buffer".into()));
        }
        let buffer = buffer.truncated(self.settings.max_duration_secs);
        let sr = buffer.sample_rate;
        let mono = buffer.to_mono();
        let duration = buffer.duration() as f64;

        log::info!("Pass 1: Level analysis ({:.1}s @ {} Hz)...", duration, sr);
        let level = LevelStats::compute(&mono, self.settings.n_fft, self.settings.hop_length);

        log::info!("Pass 2: Spectral analysis ({} frames)...", self.stft.num_frames(mono.len()));
        let spectrogram = self.stft.magnitudes(&mono);
        let freqs = self.stft.bin_frequencies(sr);
        let spectral = SpectralStats::compute(&spectrogram, &freqs);
        let band_pct = spectral::band_energy_pct(&spectrogram, &freqs);

        log::info!("Pass 3: Rhythm, key and source separation...");
        let envelope = tempo::onset_envelope(&spectrogram, self.settings.n_fft / self.settings.hop_length);
        let bpm = tempo::estimate_tempo(&envelope, sr, self.settings.hop_length);
        if bpm.is_none() {
            log::warn!("No onsets found, tempo reported as 0");
        }
        let stability = tempo::tempo_stability(&mono, sr, &self.stft);
        let key = harmonic::detect_key(&spectrogram, &freqs);
        let (harmonic_ratio, percussive_ratio) = harmonic::harmonic_percussive_ratio(&spectrogram);
        let width = stereo_width(&buffer);

        log::info!(
            "Features: bpm={:.1}, key={}, rms={:.2} dB, centroid={:.0} Hz, harmonic={:.3}",
            bpm.unwrap_or(0.0),
            key,
            level.rms_db,
            spectral.centroid,
            harmonic_ratio
        );

        let mut entries: Vec<(String, FeatureValue)> = vec![
            ("bpm".into(), round_to(bpm.unwrap_or(0.0), 1).into()),
            ("key".into(), key.into()),
            ("spectral_centroid".into(), spectral.centroid.into()),
            ("spectral_bandwidth".into(), spectral.bandwidth.into()),
            ("rms_level".into(), level.rms.into()),
            ("zero_crossing_rate".into(), level.zero_crossing_rate.into()),
            ("duration".into(), duration.into()),
            ("peak_level_db".into(), round_to(level.peak_db, 2).into()),
            ("rms_level_db".into(), round_to(level.rms_db, 2).into()),
            ("crest_factor".into(), round_to(level.crest_factor, 2).into()),
            ("crest_factor_db".into(), round_to(level.crest_factor_db, 2).into()),
            ("dynamic_range_db".into(), round_to(level.dynamic_range_db, 2).into()),
            ("spectral_rolloff".into(), round_to(spectral.rolloff, 1).into()),
            ("spectral_contrast".into(), round_to(spectral.contrast, 2).into()),
            ("spectral_flatness".into(), round_to(spectral.flatness, 3).into()),
            ("harmonic_ratio".into(), round_to(harmonic_ratio, 3).into()),
            ("percussive_ratio".into(), round_to(percussive_ratio, 3).into()),
            ("tempo_stability".into(), round_to(stability, 3).into()),
            ("is_stereo".into(), buffer.is_stereo().into()),
            ("stereo_width".into(), round_to(width, 3).into()),
        ];
        entries.extend(
            BANDS
                .iter()
                .zip(band_pct)
                .map(|(band, pct)| (format!("{}_energy_pct", band.name), round_to(pct, 1).into())),
        );

        Ok(entries.into_iter().collect())
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::with_valid(AnalysisSettings::default())
    }
}

/// Pearson correlation between the two channels; 0.0 for mono input or a
/// channel without variance.
pub fn stereo_width(buffer: &SampleBuffer) -> f64 {
    let [left, right] = buffer.channels.as_slice() else {
        return 0.0;
    };
    let n = left.len().min(right.len());
    if n < 2 {
        return 0.0;
    }
    let mean_l = left[..n].iter().map(|&s| s as f64).sum::<f64>() / n as f64;
    let mean_r = right[..n].iter().map(|&s| s as f64).sum::<f64>() / n as f64;

    let (mut cov, mut var_l, mut var_r) = (0.0f64, 0.0f64, 0.0f64);
    for (&l, &r) in left[..n].iter().zip(&right[..n]) {
        let dl = l as f64 - mean_l;
        let dr = r as f64 - mean_r;
        cov += dl * dr;
        var_l += dl * dl;
        var_r += dr * dr;
    }
    let denom = (var_l * var_r).sqrt();
    if denom < 1e-12 {
        return 0.0;
    }
    cov / denom
}
