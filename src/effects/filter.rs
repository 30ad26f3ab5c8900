use std::f64::consts::PI;

use super::dynamics::db_to_linear;
use crate::audio::bands::BANDS;

/// Section Qs of a 4th-order Butterworth response: 1 / (2 cos(kπ/8)), k = 1, 3.
const BUTTERWORTH_Q4: [f64; 2] = [0.541_196_1, 1.306_563];

/// Odd-reflection padding per biquad section, scipy's `3 * (2 * sections + 1)`.
const PAD_PER_SECTION: usize = 6;

/*
| type      | built as                                  |
| --------- | ----------------------------------------- |
| low-pass  | two RBJ low-pass sections                 |
| high-pass | two RBJ high-pass sections                |
| band-pass | 4th-order high-pass ∘ 4th-order low-pass  |
*/

/// Transposed direct-form II biquad, RBJ cookbook coefficients.
#[derive(Clone, Copy, Debug)]
pub struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    z1: f64,
    z2: f64,
}

impl Biquad {
    fn from_raw(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    pub fn lowpass(freq: f64, q: f64, sample_rate: f64) -> Self {
        let (cos, alpha) = Self::prewarp(freq, q, sample_rate);
        Self::from_raw(
            (1.0 - cos) / 2.0,
            1.0 - cos,
            (1.0 - cos) / 2.0,
            1.0 + alpha,
            -2.0 * cos,
            1.0 - alpha,
        )
    }

    pub fn highpass(freq: f64, q: f64, sample_rate: f64) -> Self {
        let (cos, alpha) = Self::prewarp(freq, q, sample_rate);
        Self::from_raw(
            (1.0 + cos) / 2.0,
            -(1.0 + cos),
            (1.0 + cos) / 2.0,
            1.0 + alpha,
            -2.0 * cos,
            1.0 - alpha,
        )
    }

    /// Band-pass with 0 dB gain at the center frequency.
    pub fn bandpass(freq: f64, q: f64, sample_rate: f64) -> Self {
        let (cos, alpha) = Self::prewarp(freq, q, sample_rate);
        Self::from_raw(alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos, 1.0 - alpha)
    }

    fn prewarp(freq: f64, q: f64, sample_rate: f64) -> (f64, f64) {
        let freq = freq.clamp(1.0, sample_rate * 0.499);
        let w0 = 2.0 * PI * freq / sample_rate;
        (w0.cos(), w0.sin() / (2.0 * q.max(0.01)))
    }

    /// Replace the coefficients, keeping the filter state.
    pub fn retune(&mut self, other: &Biquad) {
        self.b0 = other.b0;
        self.b1 = other.b1;
        self.b2 = other.b2;
        self.a1 = other.a1;
        self.a2 = other.a2;
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }

    fn dc_gain(&self) -> f64 {
        let den = 1.0 + self.a1 + self.a2;
        if den.abs() < 1e-12 {
            0.0
        } else {
            (self.b0 + self.b1 + self.b2) / den
        }
    }

    /// Load the steady state for a constant input `x0` and return the output.
    fn prime(&mut self, x0: f64) -> f64 {
        let y0 = self.dc_gain() * x0;
        self.z2 = self.b2 * x0 - self.a2 * y0;
        self.z1 = self.b1 * x0 - self.a1 * y0 + self.z2;
        y0
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

/// Series chain of biquad sections.
#[derive(Clone, Debug)]
pub struct Cascade {
    sections: Vec<Biquad>,
}

impl Cascade {
    pub fn butter_lowpass(cutoff_hz: f32, sample_rate: u32) -> Self {
        let sr = sample_rate as f64;
        Self {
            sections: BUTTERWORTH_Q4
                .iter()
                .map(|&q| Biquad::lowpass(cutoff_hz as f64, q, sr))
                .collect(),
        }
    }

    pub fn butter_highpass(cutoff_hz: f32, sample_rate: u32) -> Self {
        let sr = sample_rate as f64;
        Self {
            sections: BUTTERWORTH_Q4
                .iter()
                .map(|&q| Biquad::highpass(cutoff_hz as f64, q, sr))
                .collect(),
        }
    }

    /// Band between `low_hz` and `high_hz`, or `None` when the band lies
    /// above Nyquist. Upper edges past Nyquist are pulled to 0.99 × Nyquist.
    pub fn butter_bandpass(low_hz: f32, high_hz: f32, sample_rate: u32) -> Option<Self> {
        let nyquist = sample_rate as f32 / 2.0;
        if low_hz >= nyquist * 0.99 {
            return None;
        }
        let high_hz = high_hz.min(nyquist * 0.99);
        let mut sections = Self::butter_highpass(low_hz, sample_rate).sections;
        sections.extend(Self::butter_lowpass(high_hz, sample_rate).sections);
        Some(Self { sections })
    }

    /// Causal filtering in place from a cleared state.
    pub fn process_in_place(&mut self, samples: &mut [f32]) {
        self.sections.iter_mut().for_each(Biquad::reset);
        for s in samples.iter_mut() {
            *s = self.run(*s as f64) as f32;
        }
    }

    #[inline]
    fn run(&mut self, x: f64) -> f64 {
        self.sections.iter_mut().fold(x, |acc, section| section.process(acc))
    }

    fn prime(&mut self, x0: f64) {
        self.sections
            .iter_mut()
            .fold(x0, |acc, section| section.prime(acc));
    }

    /// Zero-phase filtering: forward pass, then a backward pass over the
    /// result, on an odd-reflection padded copy of the input.
    pub fn filtfilt(&self, samples: &[f32]) -> Vec<f32> {
        let n = samples.len();
        if n < 2 {
            return samples.to_vec();
        }
        let pad = (PAD_PER_SECTION * self.sections.len() + 3).min(n - 1);

        let first = samples[0] as f64;
        let last = samples[n - 1] as f64;
        let mut ext: Vec<f64> = Vec::with_capacity(n + 2 * pad);
        ext.extend((1..=pad).rev().map(|i| 2.0 * first - samples[i] as f64));
        ext.extend(samples.iter().map(|&s| s as f64));
        ext.extend((1..=pad).map(|i| 2.0 * last - samples[n - 1 - i] as f64));

        let mut filter = self.clone();
        filter.prime(ext[0]);
        for s in ext.iter_mut() {
            *s = filter.run(*s);
        }

        let mut filter = self.clone();
        filter.prime(ext[ext.len() - 1]);
        for s in ext.iter_mut().rev() {
            *s = filter.run(*s);
        }

        ext[pad..pad + n].iter().map(|&s| s as f32).collect()
    }
}

/// Five-band equalizer. Each band with a nonzero gain is isolated with a
/// zero-phase band-pass and added back scaled by `10^(gain/20) - 1`, so
/// content outside the band is left as it was.
pub fn equalize(samples: &mut [f32], sample_rate: u32, gains_db: [f32; 5]) {
    let dry = samples.to_vec();
    for (band, gain_db) in BANDS.iter().zip(gains_db) {
        if gain_db == 0.0 {
            continue;
        }
        let Some(bandpass) = Cascade::butter_bandpass(band.low_hz, band.high_hz, sample_rate) else {
            log::debug!("EQ band {} above Nyquist, skipped", band.name);
            continue;
        };
        let isolated = bandpass.filtfilt(&dry);
        let scale = db_to_linear(gain_db) - 1.0;
        for (s, b) in samples.iter_mut().zip(isolated.iter()) {
            *s += b * scale;
        }
    }
}
