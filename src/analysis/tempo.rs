//! Onset-based tempo estimation.

use rayon::prelude::*;

use super::stft::Stft;

const MIN_BPM: f64 = 30.0;
const MAX_BPM: f64 = 300.0;
const PRIOR_BPM: f64 = 120.0;
/// Spread of the tempo prior, in octaves.
const PRIOR_OCTAVES: f64 = 1.0;
const TOP_DB: f32 = 80.0;
const MIN_ONSET_STRENGTH: f32 = 1e-3;
const STABILITY_SEGMENTS: usize = 4;

/// Positive spectral flux of the dB spectrogram, averaged across bins.
///
/// The first and last `edge_frames` entries are zeroed; centered frames at the
/// borders see the padding rather than the signal.
pub fn onset_envelope(spectrogram: &[Vec<f32>], edge_frames: usize) -> Vec<f32> {
    let db: Vec<Vec<f32>> = spectrogram
        .iter()
        .map(|frame| frame.iter().map(|&m| 20.0 * m.max(1e-10).log10()).collect())
        .collect();
    let ceiling = db
        .iter()
        .flat_map(|frame| frame.iter())
        .fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
    let floor = ceiling - TOP_DB;

    let mut envelope = vec![0.0f32; db.len()];
    for t in 1..db.len() {
        let bins = db[t].len().max(1) as f32;
        let flux: f32 = db[t]
            .iter()
            .zip(db[t - 1].iter())
            .map(|(&cur, &prev)| (cur.max(floor) - prev.max(floor)).max(0.0))
            .sum();
        envelope[t] = flux / bins;
    }

    let edge = edge_frames.min(envelope.len() / 2);
    let len = envelope.len();
    envelope[..edge].fill(0.0);
    envelope[len - edge..].fill(0.0);
    envelope
}

/// Tempo in BPM from the autocorrelation of an onset envelope, or `None`
/// when the envelope carries no onsets.
pub fn estimate_tempo(envelope: &[f32], sample_rate: u32, hop: usize) -> Option<f64> {
    let peak = envelope.iter().fold(0.0f32, |acc, &v| acc.max(v));
    if peak < MIN_ONSET_STRENGTH {
        return None;
    }

    let frame_rate = sample_rate as f64 / hop as f64;
    let min_lag = ((60.0 * frame_rate / MAX_BPM).ceil() as usize).max(1);
    let max_lag = ((60.0 * frame_rate / MIN_BPM).floor() as usize).min(envelope.len().saturating_sub(1));
    if min_lag > max_lag {
        return None;
    }

    let mean = envelope.iter().map(|&v| v as f64).sum::<f64>() / envelope.len() as f64;
    let centered: Vec<f64> = envelope.iter().map(|&v| v as f64 - mean).collect();

    let (best_lag, best_score) = (min_lag..=max_lag)
        .map(|lag| {
            let overlap = centered.len() - lag;
            let ac = centered[..overlap]
                .iter()
                .zip(centered[lag..].iter())
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / overlap as f64;
            let bpm = 60.0 * frame_rate / lag as f64;
            let prior = (-0.5 * ((bpm / PRIOR_BPM).log2() / PRIOR_OCTAVES).powi(2)).exp();
            (lag, ac * prior)
        })
        .fold((0, f64::NEG_INFINITY), |best, cur| if cur.1 > best.1 { cur } else { best });

    if best_lag == 0 || best_score <= 0.0 {
        return None;
    }
    Some(60.0 * frame_rate / best_lag as f64)
}

/// Tempo of a whole signal.
pub fn tempo(samples: &[f32], sample_rate: u32, stft: &Stft) -> Option<f64> {
    let spectrogram = stft.magnitudes(samples);
    estimate_tempo(
        &onset_envelope(&spectrogram, stft.n_fft / stft.hop),
        sample_rate,
        stft.hop,
    )
}

/// `1 - std / mean` of the tempi of four equal segments. Segments without a
/// tempo are ignored; fewer than two tempi give 1.0.
pub fn tempo_stability(samples: &[f32], sample_rate: u32, stft: &Stft) -> f64 {
    let segment_len = samples.len() / STABILITY_SEGMENTS;
    if segment_len == 0 {
        return 1.0;
    }
    let tempi: Vec<f64> = samples
        .par_chunks(segment_len)
        .take(STABILITY_SEGMENTS)
        .filter_map(|segment| tempo(segment, sample_rate, stft))
        .collect();
    log::debug!("Segment tempi: {:?}", tempi);

    if tempi.len() < 2 {
        return 1.0;
    }
    let n = tempi.len() as f64;
    let mean = tempi.iter().sum::<f64>() / n;
    let variance = tempi.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / n;
    1.0 - variance.sqrt() / mean
}
