use rayon::prelude::*;

use crate::audio::bands::BANDS;

const EPS: f64 = 1e-10;
const ROLLOFF_PERCENT: f64 = 0.85;
const CONTRAST_FMIN: f32 = 200.0;
const CONTRAST_BANDS: usize = 6;
const CONTRAST_QUANTILE: f64 = 0.02;

/// Frame-averaged spectral shape descriptors.
#[derive(Clone, Debug, PartialEq)]
pub struct SpectralStats {
    pub centroid: f64,
    pub bandwidth: f64,
    pub rolloff: f64,
    pub contrast: f64,
    pub flatness: f64,
}

struct FrameStats {
    centroid: f64,
    bandwidth: f64,
    rolloff: f64,
    contrast: f64,
    flatness: f64,
}

impl SpectralStats {
    /// `spectrogram` holds one magnitude spectrum per frame, `freqs` the
    /// center frequency of each bin.
    pub fn compute(spectrogram: &[Vec<f32>], freqs: &[f32]) -> Self {
        if spectrogram.is_empty() {
            return Self {
                centroid: 0.0,
                bandwidth: 0.0,
                rolloff: 0.0,
                contrast: 0.0,
                flatness: 0.0,
            };
        }
        let edges = contrast_edges(freqs);
        let per_frame: Vec<FrameStats> = spectrogram
            .par_iter()
            .map(|frame| frame_stats(frame, freqs, &edges))
            .collect();

        let n = per_frame.len() as f64;
        let avg = |f: fn(&FrameStats) -> f64| per_frame.iter().map(f).sum::<f64>() / n;
        Self {
            centroid: avg(|s| s.centroid),
            bandwidth: avg(|s| s.bandwidth),
            rolloff: avg(|s| s.rolloff),
            contrast: avg(|s| s.contrast),
            flatness: avg(|s| s.flatness),
        }
    }
}

fn frame_stats(frame: &[f32], freqs: &[f32], contrast_edges: &[(usize, usize)]) -> FrameStats {
    let total: f64 = frame.iter().map(|&m| m as f64).sum();

    let (centroid, bandwidth, rolloff) = if total > EPS {
        let centroid = frame
            .iter()
            .zip(freqs)
            .map(|(&m, &f)| m as f64 * f as f64)
            .sum::<f64>()
            / total;
        let spread = frame
            .iter()
            .zip(freqs)
            .map(|(&m, &f)| (m as f64 / total) * (f as f64 - centroid).powi(2))
            .sum::<f64>();

        let threshold = ROLLOFF_PERCENT * total;
        let mut cumulative = 0.0;
        let mut rolloff = freqs.last().copied().unwrap_or(0.0) as f64;
        for (&m, &f) in frame.iter().zip(freqs) {
            cumulative += m as f64;
            if cumulative >= threshold {
                rolloff = f as f64;
                break;
            }
        }
        (centroid, spread.sqrt(), rolloff)
    } else {
        (0.0, 0.0, 0.0)
    };

    FrameStats {
        centroid,
        bandwidth,
        rolloff,
        contrast: frame_contrast(frame, contrast_edges),
        flatness: frame_flatness(frame),
    }
}

/// Geometric over arithmetic mean of the power spectrum.
fn frame_flatness(frame: &[f32]) -> f64 {
    if frame.is_empty() {
        return 0.0;
    }
    let n = frame.len() as f64;
    let power: Vec<f64> = frame
        .iter()
        .map(|&m| ((m as f64) * (m as f64)).max(EPS))
        .collect();
    let log_mean = power.iter().map(|p| p.ln()).sum::<f64>() / n;
    let arith_mean = power.iter().sum::<f64>() / n;
    log_mean.exp() / arith_mean
}

/// Bin ranges of the octave sub-bands: [0, fmin), then octaves above fmin,
/// with the last band running to Nyquist.
fn contrast_edges(freqs: &[f32]) -> Vec<(usize, usize)> {
    let mut octave_edges = vec![0.0f32];
    octave_edges.extend((0..=CONTRAST_BANDS).map(|k| CONTRAST_FMIN * 2f32.powi(k as i32)));
    let nyquist = freqs.last().copied().unwrap_or(0.0);

    let mut ranges = Vec::with_capacity(CONTRAST_BANDS + 1);
    for k in 0..=CONTRAST_BANDS {
        let low = octave_edges[k];
        let high = if k == CONTRAST_BANDS {
            nyquist
        } else {
            octave_edges[k + 1]
        };
        let start = freqs.iter().position(|&f| f >= low).unwrap_or(freqs.len());
        let end = freqs.iter().rposition(|&f| f <= high).map_or(0, |i| i + 1);
        if start < end {
            ranges.push((start, end));
        }
    }
    ranges
}

/// Mean dB difference between the loudest and quietest 2% of bins in each
/// octave sub-band.
fn frame_contrast(frame: &[f32], edges: &[(usize, usize)]) -> f64 {
    if edges.is_empty() {
        return 0.0;
    }
    let mut total = 0.0;
    let mut sorted: Vec<f64> = Vec::new();
    for &(start, end) in edges {
        sorted.clear();
        sorted.extend(frame[start..end].iter().map(|&m| m as f64));
        sorted.sort_by(|a, b| a.total_cmp(b));

        let count = ((CONTRAST_QUANTILE * sorted.len() as f64).round() as usize).max(1);
        let valley = sorted[..count].iter().sum::<f64>() / count as f64;
        let peak = sorted[sorted.len() - count..].iter().sum::<f64>() / count as f64;
        total += power_db(peak) - power_db(valley);
    }
    total / edges.len() as f64
}

fn power_db(value: f64) -> f64 {
    10.0 * value.max(EPS).log10()
}

/// Share of magnitude energy in each of the five bands, in percent of the
/// five-band total.
pub fn band_energy_pct(spectrogram: &[Vec<f32>], freqs: &[f32]) -> [f64; 5] {
    let mut energies = [0.0f64; 5];
    if spectrogram.is_empty() {
        return energies;
    }
    for (b, band) in BANDS.iter().enumerate() {
        let last = b == BANDS.len() - 1;
        let in_band: Vec<usize> = freqs
            .iter()
            .enumerate()
            .filter(|(_, &f)| f >= band.low_hz && (f < band.high_hz || (last && f <= band.high_hz)))
            .map(|(i, _)| i)
            .collect();
        let per_frame_sum: f64 = spectrogram
            .iter()
            .map(|frame| in_band.iter().map(|&i| frame[i] as f64).sum::<f64>())
            .sum();
        energies[b] = per_frame_sum / spectrogram.len() as f64;
    }

    let total: f64 = energies.iter().sum();
    energies.map(|e| e / (total + EPS) * 100.0)
}
