//! Pitch-class profile and harmonic/percussive separation.

use rayon::prelude::*;

pub const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

const MIN_CHROMA_HZ: f32 = 27.5;
const HPSS_KERNEL: usize = 31;
const MASK_POWER: i32 = 2;
const EPS: f64 = 1e-10;

/// Pitch class of a frequency, A4 = 440 Hz.
fn pitch_class(freq: f32) -> usize {
    let semitones_from_a = (12.0 * (freq / 440.0).log2()).round() as i64;
    (semitones_from_a + 9).rem_euclid(12) as usize
}

/// Summed 12-bin chroma profile. Each frame is normalized to its strongest
/// pitch class before summing; frames are summed in order so the result does
/// not depend on thread scheduling.
pub fn chroma_profile(spectrogram: &[Vec<f32>], freqs: &[f32]) -> [f64; 12] {
    let classes: Vec<Option<usize>> = freqs
        .iter()
        .map(|&f| (f >= MIN_CHROMA_HZ).then(|| pitch_class(f)))
        .collect();

    spectrogram
        .par_iter()
        .map(|frame| {
            let mut chroma = [0.0f64; 12];
            for (&m, class) in frame.iter().zip(classes.iter()) {
                if let Some(c) = class {
                    chroma[*c] += (m as f64) * (m as f64);
                }
            }
            let max = chroma.iter().cloned().fold(0.0, f64::max);
            if max > EPS {
                chroma.iter_mut().for_each(|v| *v /= max);
            }
            chroma
        })
        .collect::<Vec<_>>()
        .into_iter()
        .fold([0.0f64; 12], |mut acc, frame| {
            acc.iter_mut().zip(frame).for_each(|(a, f)| *a += f);
            acc
        })
}

/// Name of the pitch class with the most chroma energy.
pub fn detect_key(spectrogram: &[Vec<f32>], freqs: &[f32]) -> &'static str {
    let chroma = chroma_profile(spectrogram, freqs);
    let (best, _) = chroma
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
    PITCH_CLASSES[best]
}

fn median(window: &mut [f32]) -> f32 {
    let mid = window.len() / 2;
    let (_, m, _) = window.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
    *m
}

/// Median filter along time for each bin (harmonic) and along frequency for
/// each frame (percussive). Windows are truncated at the borders.
fn median_filters(spectrogram: &[Vec<f32>]) -> (Vec<Vec<f32>>, Vec<Vec<f32>>) {
    let frames = spectrogram.len();
    let bins = spectrogram.first().map_or(0, Vec::len);
    let half = HPSS_KERNEL / 2;

    let harmonic: Vec<Vec<f32>> = (0..frames)
        .into_par_iter()
        .map(|t| {
            let lo = t.saturating_sub(half);
            let hi = (t + half + 1).min(frames);
            let mut window = Vec::with_capacity(HPSS_KERNEL);
            (0..bins)
                .map(|k| {
                    window.clear();
                    window.extend(spectrogram[lo..hi].iter().map(|frame| frame[k]));
                    median(&mut window)
                })
                .collect()
        })
        .collect();

    let percussive: Vec<Vec<f32>> = spectrogram
        .par_iter()
        .map(|frame| {
            let mut window = Vec::with_capacity(HPSS_KERNEL);
            (0..bins)
                .map(|k| {
                    let lo = k.saturating_sub(half);
                    let hi = (k + half + 1).min(bins);
                    window.clear();
                    window.extend_from_slice(&frame[lo..hi]);
                    median(&mut window)
                })
                .collect()
        })
        .collect();

    (harmonic, percussive)
}

/// Energy shares of the harmonic and percussive components. The two ratios
/// sum to one.
pub fn harmonic_percussive_ratio(spectrogram: &[Vec<f32>]) -> (f64, f64) {
    let (harmonic, percussive) = median_filters(spectrogram);

    let (h_energy, p_energy) = spectrogram
        .par_iter()
        .zip(harmonic.par_iter().zip(percussive.par_iter()))
        .map(|(frame, (h_frame, p_frame))| {
            let mut h_sum = 0.0f64;
            let mut p_sum = 0.0f64;
            for ((&s, &h), &p) in frame.iter().zip(h_frame).zip(p_frame) {
                let h = (h as f64).powi(MASK_POWER);
                let p = (p as f64).powi(MASK_POWER);
                let total = h + p;
                if total <= EPS {
                    continue;
                }
                let s = s as f64;
                h_sum += (s * h / total).powi(2);
                p_sum += (s * p / total).powi(2);
            }
            (h_sum, p_sum)
        })
        .collect::<Vec<(f64, f64)>>()
        .into_iter()
        .fold((0.0, 0.0), |a, b| (a.0 + b.0, a.1 + b.1));

    let harmonic_ratio = h_energy / (h_energy + p_energy + EPS);
    (harmonic_ratio, 1.0 - harmonic_ratio)
}
