//! Convolution reverb over a synthesized impulse response.
//!
//! The impulse response has two parts:
//! - early reflections: four taps at 10/20/30/40 ms,
//! - a late tail: noise under an exponential decay, with three slow sines
//!   (0.8/1.3/2.1 Hz) riding on the envelope to break up periodicity.
//!
//! Longer and slower-decaying tails go with larger amounts.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustfft::{num_complex::Complex, FftPlanner};
use std::f32::consts::TAU;

use super::dynamics::{peak, renormalize_peak};
use super::filter::Cascade;

const EARLY_TAPS_MS: [f32; 4] = [10.0, 20.0, 30.0, 40.0];
const EARLY_GAINS: [f32; 4] = [0.3, 0.2, 0.15, 0.1];
const MOD_FREQS_HZ: [f32; 3] = [0.8, 1.3, 2.1];
const TAIL_START_MS: f32 = 5.0;

/// Build a unit-peak impulse response for `amount` in (0, 1].
pub fn impulse_response(amount: f32, sample_rate: u32, seed: u64) -> Vec<f32> {
    let amount = amount.clamp(0.0, 1.0);
    let sr = sample_rate as f32;
    let duration = 1.0 + 3.0 * amount;
    let len = (duration * sr) as usize;
    let decay_rate = 3.0 + 6.0 * (1.0 - amount);

    let mut rng = StdRng::seed_from_u64(seed);
    let white: Vec<f32> = (0..len).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
    let mut colored = white.clone();
    Cascade::butter_lowpass((sr * 0.2).min(4000.0), sample_rate).process_in_place(&mut colored);

    let tail_start = (TAIL_START_MS / 1000.0 * sr) as usize;
    let mut ir = vec![0.0f32; len];
    for (i, slot) in ir.iter_mut().enumerate().skip(tail_start) {
        let t = i as f32 / sr;
        let envelope = (-decay_rate * t).exp();
        let wobble = MOD_FREQS_HZ
            .iter()
            .map(|f| (TAU * f * t).sin())
            .sum::<f32>()
            / MOD_FREQS_HZ.len() as f32;
        let modulation = 1.0 + 0.3 * wobble;
        *slot = envelope * modulation * (0.5 * white[i] + amount * colored[i]);
    }

    for (ms, gain) in EARLY_TAPS_MS.iter().zip(EARLY_GAINS.iter()) {
        let idx = (ms / 1000.0 * sr) as usize;
        if idx < len {
            ir[idx] += gain * amount;
        }
    }

    let ir_peak = peak(&ir);
    if ir_peak > 1e-12 {
        ir.iter_mut().for_each(|s| *s /= ir_peak);
    }
    ir
}

/// Linear convolution truncated to the length of `signal`.
pub fn convolve(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
    if signal.is_empty() || kernel.is_empty() {
        return vec![0.0; signal.len()];
    }
    let size = (signal.len() + kernel.len() - 1).next_power_of_two();

    let mut planner = FftPlanner::<f32>::new();
    let forward = planner.plan_fft_forward(size);
    let inverse = planner.plan_fft_inverse(size);

    let mut a: Vec<Complex<f32>> = signal.iter().map(|&s| Complex::new(s, 0.0)).collect();
    a.resize(size, Complex::new(0.0, 0.0));
    let mut b: Vec<Complex<f32>> = kernel.iter().map(|&s| Complex::new(s, 0.0)).collect();
    b.resize(size, Complex::new(0.0, 0.0));

    forward.process(&mut a);
    forward.process(&mut b);
    for (x, y) in a.iter_mut().zip(b.iter()) {
        *x = *x * *y;
    }
    inverse.process(&mut a);

    let scale = 1.0 / size as f32;
    a[..signal.len()].iter().map(|c| c.re * scale).collect()
}

/// Mix the convolved signal into `samples` at a wet fraction of `amount × 0.6`.
///
/// The wet path is scaled to the dry peak before mixing.
pub fn apply(samples: &mut [f32], ir: &[f32], amount: f32) {
    let dry_peak = peak(samples);
    if dry_peak <= 0.0 {
        return;
    }
    let mut wet = convolve(samples, ir);
    let wet_peak = peak(&wet);
    if wet_peak > 1e-12 {
        let scale = dry_peak / wet_peak;
        wet.iter_mut().for_each(|s| *s *= scale);
    }

    let mix = amount * 0.6;
    for (s, w) in samples.iter_mut().zip(wet.iter()) {
        *s = (1.0 - mix) * *s + mix * w;
    }
    renormalize_peak(samples);
}
