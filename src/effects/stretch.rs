use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use rustfft::num_complex::Complex;
use std::f32::consts::PI;

use crate::analysis::stft::Stft;
use crate::error::{Error, Result};

const N_FFT: usize = 2048;
const HOP: usize = 512;
const SINC_LEN: usize = 256;

/// Phase-vocoder time stretch. `rate` > 1.0 shortens the signal; the output
/// has `round(len / rate)` samples and the original pitch.
pub fn time_stretch(samples: &[f32], rate: f32) -> Vec<f32> {
    if samples.is_empty() || rate <= 0.0 {
        return samples.to_vec();
    }
    let target_len = (samples.len() as f64 / rate as f64).round() as usize;

    let stft = Stft::new(N_FFT, HOP);
    let mut frames = stft.forward(samples);
    let bins = stft.num_bins();
    frames.push(vec![Complex::new(0.0, 0.0); bins]);

    let phase_advance: Vec<f32> = (0..bins)
        .map(|k| 2.0 * PI * k as f32 * HOP as f32 / N_FFT as f32)
        .collect();

    let mut phase: Vec<f32> = frames[0].iter().map(|c| c.arg()).collect();
    let mut stretched: Vec<Vec<Complex<f32>>> = Vec::new();

    let last = frames.len() - 1;
    let mut t = 0.0f32;
    while (t as usize) < last {
        let idx = t as usize;
        let alpha = t - idx as f32;
        let (cur, next) = (&frames[idx], &frames[idx + 1]);

        let frame: Vec<Complex<f32>> = (0..bins)
            .map(|k| {
                let mag = (1.0 - alpha) * cur[k].norm() + alpha * next[k].norm();
                Complex::from_polar(mag, phase[k])
            })
            .collect();
        stretched.push(frame);

        for k in 0..bins {
            let delta = next[k].arg() - cur[k].arg() - phase_advance[k];
            let wrapped = delta - 2.0 * PI * (delta / (2.0 * PI)).round();
            phase[k] += phase_advance[k] + wrapped;
        }
        t += rate;
    }

    stft.inverse(&stretched, target_len)
}

/// Shift pitch by `semitones` while keeping the sample count.
///
/// Stretches by `2^(-semitones/12)` and resamples the result back to the
/// original length.
pub fn pitch_shift(samples: &[f32], semitones: f32) -> Result<Vec<f32>> {
    if samples.is_empty() || semitones == 0.0 {
        return Ok(samples.to_vec());
    }
    let rate = 2f32.powf(-semitones / 12.0);
    let stretched = time_stretch(samples, rate);
    resample(&stretched, rate as f64, samples.len())
}

/// Band-limited resampling by `ratio` (output rate / input rate), trimmed or
/// zero-padded to exactly `target_len` samples.
pub fn resample(samples: &[f32], ratio: f64, target_len: usize) -> Result<Vec<f32>> {
    if samples.is_empty() {
        return Ok(vec![0.0; target_len]);
    }

    let params = SincInterpolationParameters {
        sinc_len: SINC_LEN,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    // Tail padding flushes the sinc filter's group delay.
    let mut padded = samples.to_vec();
    padded.resize(samples.len() + SINC_LEN, 0.0);

    let mut resampler = SincFixedIn::<f32>::new(
        ratio,
        1.1, // max relative ratio
        params,
        padded.len(),
        1, // mono
    )
    .map_err(|e| Error::Resample(e.to_string()))?;
    let delay = resampler.output_delay();

    let input = vec![padded];
    let output = resampler
        .process(&input, None)
        .map_err(|e| Error::Resample(e.to_string()))?;

    let mut result: Vec<f32> = output
        .into_iter()
        .next()
        .unwrap_or_default()
        .into_iter()
        .skip(delay)
        .take(target_len)
        .collect();
    result.resize(target_len, 0.0);
    Ok(result)
}
