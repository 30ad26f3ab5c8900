//! Delay-line effects: echo, chorus, flanger, and the swept band-pass phaser.

use std::f32::consts::TAU;

use super::dynamics::renormalize_peak;
use super::filter::Biquad;

const CHORUS_BASE_MS: f32 = 10.0;
const FLANGER_BASE_MS: f32 = 1.0;
const PHASER_CENTER_HZ: f64 = 1000.0;
const PHASER_SWING_HZ: f64 = 2000.0;
const PHASER_BLOCK_MS: f32 = 10.0;
const PHASER_Q: f64 = 2.0;

/// Echo with a first tap at `time_ms` and one repeat at twice that.
///
/// The first tap is scaled by `feedback`. The second tap is the feedback
/// repeat of the first, so it carries `feedback²`. Both are summed into the
/// input at `amount` and the result is renormalized if it clips.
pub fn delay(samples: &mut [f32], sample_rate: u32, amount: f32, time_ms: f32, feedback: f32) {
    let d = (time_ms / 1000.0 * sample_rate as f32).round() as usize;
    if d == 0 || d >= samples.len() {
        return;
    }
    let dry = samples.to_vec();
    for i in d..samples.len() {
        let mut echo = feedback * dry[i - d];
        if i >= 2 * d {
            echo += feedback * feedback * dry[i - 2 * d];
        }
        samples[i] += amount * echo;
    }
    renormalize_peak(samples);
}

/// Read `x` at a fractional position behind `i`, zero before the start.
#[inline]
fn read_delayed(x: &[f32], i: usize, delay_samples: f32) -> f32 {
    let pos = i as f32 - delay_samples;
    if pos < 0.0 {
        return 0.0;
    }
    let idx = pos.floor() as usize;
    let frac = pos - idx as f32;
    let a = x[idx];
    let b = if idx + 1 < x.len() { x[idx + 1] } else { a };
    a + (b - a) * frac
}

/// Delay line swept by a sine LFO around `base_ms`, crossfaded with the dry
/// signal at `mix`.
fn modulated_delay(
    samples: &mut [f32],
    sample_rate: u32,
    base_ms: f32,
    rate_hz: f32,
    depth: f32,
    mix: f32,
) {
    let sr = sample_rate as f32;
    let base = base_ms / 1000.0 * sr;
    let dry = samples.to_vec();
    for (i, s) in samples.iter_mut().enumerate() {
        let lfo = (TAU * rate_hz * i as f32 / sr).sin();
        let delay_samples = (base * (1.0 + depth * lfo)).max(0.0);
        let wet = read_delayed(&dry, i, delay_samples);
        *s = (1.0 - mix) * dry[i] + mix * wet;
    }
}

/// Doubling around a 10 ms delay, mixed at `amount × 0.5`.
pub fn chorus(samples: &mut [f32], sample_rate: u32, amount: f32, rate_hz: f32, depth: f32) {
    modulated_delay(samples, sample_rate, CHORUS_BASE_MS, rate_hz, depth, amount * 0.5);
}

/// Comb filtering around a 1 ms delay, mixed at `amount × 0.7`.
pub fn flanger(samples: &mut [f32], sample_rate: u32, amount: f32, rate_hz: f32, depth: f32) {
    modulated_delay(samples, sample_rate, FLANGER_BASE_MS, rate_hz, depth, amount * 0.7);
}

/// Narrow band-pass whose center sweeps around 1 kHz by `amount × 2 kHz`,
/// retuned every 10 ms block and mixed at `amount × 0.5`.
///
/// Filter state carries across blocks so retuning does not restart the filter.
pub fn phaser(samples: &mut [f32], sample_rate: u32, amount: f32, rate_hz: f32) {
    let sr = sample_rate as f64;
    let block = ((PHASER_BLOCK_MS / 1000.0) * sample_rate as f32).max(1.0) as usize;
    let mix = amount * 0.5;
    let min_hz = 20.0;
    let max_hz = sr * 0.45;

    let mut filter = Biquad::bandpass(PHASER_CENTER_HZ, PHASER_Q, sr);
    for (block_idx, chunk) in samples.chunks_mut(block).enumerate() {
        let t = (block_idx * block) as f64 / sr;
        let sweep = (std::f64::consts::TAU * rate_hz as f64 * t).sin();
        let center = (PHASER_CENTER_HZ + amount as f64 * PHASER_SWING_HZ * sweep).clamp(min_hz, max_hz);
        filter.retune(&Biquad::bandpass(center, PHASER_Q, sr));

        for s in chunk.iter_mut() {
            let wet = filter.process(*s as f64) as f32;
            *s = (1.0 - mix) * *s + mix * wet;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_places_echoes() {
        let mut x = vec![0.0f32; 100];
        x[0] = 0.5;
        // 10 samples at 1 kHz
        delay(&mut x, 1000, 1.0, 10.0, 0.5);
        assert_eq!(x[0], 0.5);
        assert!((x[10] - 0.25).abs() < 1e-6);
        assert!((x[20] - 0.125).abs() < 1e-6);
        assert_eq!(x[30], 0.0);
    }

    #[test]
    fn delay_renormalizes_when_clipping() {
        let mut x = vec![1.0f32; 50];
        delay(&mut x, 1000, 1.0, 5.0, 1.0);
        assert!(x.iter().all(|s| s.abs() <= 1.0 + 1e-6));
    }

    #[test]
    fn delay_longer_than_buffer_is_noop() {
        let mut x = vec![0.3f32; 10];
        delay(&mut x, 1000, 1.0, 500.0, 0.5);
        assert_eq!(x, vec![0.3f32; 10]);
    }

    #[test]
    fn fractional_read_interpolates() {
        let x = [0.0, 1.0, 2.0, 3.0];
        assert!((read_delayed(&x, 3, 0.5) - 2.5).abs() < 1e-6);
        assert_eq!(read_delayed(&x, 0, 1.0), 0.0);
    }

    #[test]
    fn chorus_changes_signal_but_stays_bounded() {
        let sr = 8000;
        let input: Vec<f32> = (0..sr)
            .map(|i| (TAU * 220.0 * i as f32 / sr as f32).sin() * 0.8)
            .collect();
        let mut out = input.clone();
        chorus(&mut out, sr, 1.0, 1.5, 0.3);
        assert_ne!(out, input);
        assert!(out.iter().all(|s| s.abs() <= 0.8 + 1e-5));
    }

    #[test]
    fn flanger_with_zero_depth_is_static_comb() {
        let mut impulse = vec![0.0f32; 64];
        impulse[0] = 1.0;
        // 1 ms at 8 kHz = 8 samples
        flanger(&mut impulse, 8000, 1.0, 0.5, 0.0);
        assert!((impulse[0] - 0.3).abs() < 1e-6);
        assert!((impulse[8] - 0.7).abs() < 1e-6);
    }

    #[test]
    fn phaser_attenuates_off_center_content() {
        let sr = 44100;
        let input: Vec<f32> = (0..sr)
            .map(|i| (TAU * 60.0 * i as f32 / sr as f32).sin())
            .collect();
        let mut out = input.clone();
        phaser(&mut out, sr, 0.2, 0.5);
        let energy = |x: &[f32]| x.iter().map(|s| s * s).sum::<f32>();
        assert!(energy(&out) < energy(&input));
    }

    fn window_rms(x: &[f32], sr: u32, from_s: f32, to_s: f32) -> f32 {
        let window = &x[(from_s * sr as f32) as usize..(to_s * sr as f32) as usize];
        (window.iter().map(|s| s * s).sum::<f32>() / window.len() as f32).sqrt()
    }

    #[test]
    fn phaser_center_sweeps_between_extremes() {
        // amount 0.4 swings the center between 200 Hz and 1800 Hz once a second;
        // an on-center tone passes whole, an off-center one drops to 1 - mix
        let sr = 44100;
        let tone = |freq: f32| -> Vec<f32> {
            (0..sr)
                .map(|i| (TAU * freq * i as f32 / sr as f32).sin() * 0.5)
                .collect()
        };

        let mut high = tone(1800.0);
        phaser(&mut high, sr, 0.4, 1.0);
        let near_top = window_rms(&high, sr, 0.2, 0.3);
        let near_bottom = window_rms(&high, sr, 0.7, 0.8);
        assert!(near_top > near_bottom * 1.15, "{} vs {}", near_top, near_bottom);

        let mut low = tone(200.0);
        phaser(&mut low, sr, 0.4, 1.0);
        let near_top = window_rms(&low, sr, 0.2, 0.3);
        let near_bottom = window_rms(&low, sr, 0.7, 0.8);
        assert!(near_bottom > near_top * 1.15, "{} vs {}", near_bottom, near_top);
    }
}
