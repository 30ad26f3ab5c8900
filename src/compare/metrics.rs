use serde::Serialize;

/// Weight and tolerance of one compared descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MetricConfig {
    pub key: &'static str,
    pub name: &'static str,
    pub weight: f64,
    /// Relative difference, in percent, that still scores 80.
    pub tolerance_pct: f64,
}

const fn metric(key: &'static str, name: &'static str, weight: f64, tolerance_pct: f64) -> MetricConfig {
    MetricConfig {
        key,
        name,
        weight,
        tolerance_pct,
    }
}

/// The weights add up to 1.41, not 1.0. Scores are normalized by the weight
/// of the metrics actually compared, so the sum only sets relative emphasis.
pub const METRICS: [MetricConfig; 17] = [
    // rhythm
    metric("bpm", "BPM", 0.15, 5.0),
    metric("tempo_stability", "Tempo stability", 0.10, 10.0),
    // level
    metric("rms_level_db", "RMS level", 0.12, 15.0),
    metric("peak_level_db", "Peak level", 0.08, 20.0),
    metric("crest_factor_db", "Crest factor", 0.10, 25.0),
    metric("dynamic_range_db", "Dynamic range", 0.10, 20.0),
    // spectrum
    metric("spectral_centroid", "Spectral centroid", 0.12, 15.0),
    metric("spectral_bandwidth", "Spectral bandwidth", 0.08, 20.0),
    metric("spectral_rolloff", "Spectral rolloff", 0.08, 15.0),
    metric("spectral_contrast", "Spectral contrast", 0.07, 25.0),
    // bands
    metric("bass_energy_pct", "Bass energy", 0.05, 20.0),
    metric("low_mid_energy_pct", "Low-mid energy", 0.05, 20.0),
    metric("mid_energy_pct", "Mid energy", 0.05, 20.0),
    metric("high_mid_energy_pct", "High-mid energy", 0.05, 20.0),
    metric("treble_energy_pct", "Treble energy", 0.05, 20.0),
    // separation
    metric("harmonic_ratio", "Harmonic ratio", 0.08, 20.0),
    metric("percussive_ratio", "Percussive ratio", 0.08, 20.0),
];

/// Relative difference in percent. A zero reference falls back to the
/// absolute difference × 100.
pub fn difference_pct(original: f64, reference: f64) -> f64 {
    if reference != 0.0 {
        ((original - reference) / reference).abs() * 100.0
    } else {
        (original - reference).abs() * 100.0
    }
}

/// Four-segment tolerance curve: 100..80 within `tol`, 80..50 up to 2·tol,
/// 50..20 up to 3·tol, then down to 0 at 4·tol.
pub fn score(diff_pct: f64, tolerance_pct: f64) -> f64 {
    let tol = tolerance_pct;
    let raw = if diff_pct <= tol {
        100.0 - (diff_pct / tol) * 20.0
    } else if diff_pct <= tol * 2.0 {
        80.0 - ((diff_pct - tol) / tol) * 30.0
    } else if diff_pct <= tol * 3.0 {
        50.0 - ((diff_pct - tol * 2.0) / tol) * 30.0
    } else {
        20.0 - ((diff_pct - tol * 3.0) / tol) * 20.0
    };
    raw.clamp(0.0, 100.0)
}
