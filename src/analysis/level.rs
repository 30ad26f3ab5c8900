//! Time-domain level descriptors.

const EPS: f64 = 1e-10;

#[derive(Clone, Debug, PartialEq)]
pub struct LevelStats {
    /// Mean of the framewise RMS.
    pub rms: f64,
    pub peak: f64,
    pub rms_db: f64,
    pub peak_db: f64,
    pub crest_factor: f64,
    pub crest_factor_db: f64,
    pub dynamic_range_db: f64,
    pub zero_crossing_rate: f64,
}

impl LevelStats {
    pub fn compute(samples: &[f32], frame_len: usize, hop: usize) -> Self {
        let rms = mean(&frames(samples, frame_len, hop, frame_rms));
        let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs())) as f64;
        let peak_db = to_db(peak);
        let rms_db = to_db(rms);
        let crest_factor = peak / (rms + EPS);

        Self {
            rms,
            peak,
            rms_db,
            peak_db,
            crest_factor,
            crest_factor_db: to_db(crest_factor),
            dynamic_range_db: peak_db - rms_db,
            zero_crossing_rate: mean(&frames(samples, frame_len, hop, frame_zcr)),
        }
    }
}

fn to_db(linear: f64) -> f64 {
    20.0 * (linear + EPS).log10()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Apply `f` to centered frames of `frame_len` samples every `hop` samples.
/// Positions before the start or past the end read as zero.
fn frames(samples: &[f32], frame_len: usize, hop: usize, f: fn(&[f32]) -> f64) -> Vec<f64> {
    let half = frame_len / 2;
    let count = 1 + samples.len() / hop;
    let mut frame = vec![0.0f32; frame_len];
    (0..count)
        .map(|t| {
            let center = t * hop;
            for (i, slot) in frame.iter_mut().enumerate() {
                let pos = center as isize + i as isize - half as isize;
                *slot = if pos >= 0 && (pos as usize) < samples.len() {
                    samples[pos as usize]
                } else {
                    0.0
                };
            }
            f(&frame)
        })
        .collect()
}

fn frame_rms(frame: &[f32]) -> f64 {
    let energy: f64 = frame.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (energy / frame.len() as f64).sqrt()
}

/// Fraction of adjacent sample pairs whose sign bit differs.
fn frame_zcr(frame: &[f32]) -> f64 {
    let crossings = frame
        .windows(2)
        .filter(|w| w[0].is_sign_negative() != w[1].is_sign_negative())
        .count();
    crossings as f64 / frame.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn sine(amp: f32) -> Vec<f32> {
        (0..44100)
            .map(|i| (TAU * 441.0 * i as f32 / 44100.0).sin() * amp)
            .collect()
    }

    #[test]
    fn sine_levels() {
        let stats = LevelStats::compute(&sine(0.5), 2048, 512);
        assert!((stats.peak - 0.5).abs() < 1e-3);
        assert!((stats.peak_db + 6.02).abs() < 0.05);
        // edge frames are half empty, so the mean sits a little under 0.5/√2
        assert!(stats.rms > 0.33 && stats.rms < 0.36, "{}", stats.rms);
        assert!((stats.crest_factor - stats.peak / stats.rms).abs() < 1e-6);
        assert!((stats.dynamic_range_db - (stats.peak_db - stats.rms_db)).abs() < 1e-9);
    }

    #[test]
    fn zero_crossing_rate_tracks_frequency() {
        let stats = LevelStats::compute(&sine(0.5), 2048, 512);
        // 441 Hz crosses zero 882 times per second
        let expected = 882.0 / 44100.0;
        assert!((stats.zero_crossing_rate - expected).abs() < 0.003);
    }

    #[test]
    fn silence_is_finite() {
        let stats = LevelStats::compute(&vec![0.0; 4096], 2048, 512);
        assert_eq!(stats.rms, 0.0);
        assert!(stats.peak_db.is_finite());
        assert!(stats.crest_factor.is_finite());
        assert_eq!(stats.zero_crossing_rate, 0.0);
    }
}
