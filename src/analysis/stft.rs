use rayon::prelude::*;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Short-time Fourier transform with centered, zero-padded frames.
///
/// Frame `t` is centered on sample `t * hop`, so a signal of `n` samples
/// yields `1 + n / hop` frames of `n_fft / 2 + 1` bins.
pub struct Stft {
    pub n_fft: usize,
    pub hop: usize,
    window: Vec<f32>,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl Stft {
    pub fn new(n_fft: usize, hop: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        Self {
            n_fft,
            hop,
            window: hann_window(n_fft),
            forward: planner.plan_fft_forward(n_fft),
            inverse: planner.plan_fft_inverse(n_fft),
        }
    }

    pub fn num_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    pub fn num_frames(&self, len: usize) -> usize {
        1 + len / self.hop
    }

    /// Center frequency of every bin in Hz.
    pub fn bin_frequencies(&self, sample_rate: u32) -> Vec<f32> {
        let resolution = sample_rate as f32 / self.n_fft as f32;
        (0..self.num_bins()).map(|k| k as f32 * resolution).collect()
    }

    /// Complex spectra, one `Vec` per frame.
    pub fn forward(&self, samples: &[f32]) -> Vec<Vec<Complex<f32>>> {
        let half = self.n_fft / 2;
        let bins = self.num_bins();

        (0..self.num_frames(samples.len()))
            .into_par_iter()
            .map(|frame_idx| {
                let mut buffer = vec![Complex::new(0.0, 0.0); self.n_fft];
                let center = frame_idx * self.hop;
                for (i, slot) in buffer.iter_mut().enumerate() {
                    let pos = center as isize + i as isize - half as isize;
                    if pos >= 0 && (pos as usize) < samples.len() {
                        *slot = Complex::new(samples[pos as usize] * self.window[i], 0.0);
                    }
                }
                self.forward.process(&mut buffer);
                buffer.truncate(bins);
                buffer
            })
            .collect()
    }

    /// Magnitude spectrogram, one `Vec` per frame.
    pub fn magnitudes(&self, samples: &[f32]) -> Vec<Vec<f32>> {
        self.forward(samples)
            .into_par_iter()
            .map(|frame| frame.iter().map(|c| c.norm()).collect())
            .collect()
    }

    /// Overlap-add resynthesis of half spectra back to `length` samples.
    pub fn inverse(&self, frames: &[Vec<Complex<f32>>], length: usize) -> Vec<f32> {
        let half = self.n_fft / 2;
        let padded_len = self.n_fft + self.hop * frames.len().saturating_sub(1);
        let mut output = vec![0.0f32; padded_len];
        let mut window_sum = vec![0.0f32; padded_len];
        let scale = 1.0 / self.n_fft as f32;

        let time_frames: Vec<Vec<f32>> = frames
            .par_iter()
            .map(|frame| {
                let mut buffer = vec![Complex::new(0.0, 0.0); self.n_fft];
                for (k, &bin) in frame.iter().enumerate().take(half + 1) {
                    buffer[k] = bin;
                    if k > 0 && k < half {
                        buffer[self.n_fft - k] = bin.conj();
                    }
                }
                self.inverse.process(&mut buffer);
                buffer
                    .iter()
                    .zip(self.window.iter())
                    .map(|(c, w)| c.re * scale * w)
                    .collect()
            })
            .collect();

        for (t, frame) in time_frames.iter().enumerate() {
            let start = t * self.hop;
            for (i, &s) in frame.iter().enumerate() {
                output[start + i] += s;
                window_sum[start + i] += self.window[i] * self.window[i];
            }
        }

        for (s, &w) in output.iter_mut().zip(window_sum.iter()) {
            if w > 1e-8 {
                *s /= w;
            }
        }

        let mut trimmed: Vec<f32> = output.into_iter().skip(half).take(length).collect();
        trimmed.resize(length, 0.0);
        trimmed
    }
}

/// Periodic Hann window.
pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / size as f32).cos()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sr: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sr as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn frame_count_follows_hop() {
        let stft = Stft::new(2048, 512);
        let frames = stft.forward(&vec![0.0; 44100]);
        assert_eq!(frames.len(), 1 + 44100 / 512);
        assert_eq!(frames[0].len(), 1025);
    }

    #[test]
    fn peak_bin_matches_tone() {
        let stft = Stft::new(2048, 512);
        let mags = stft.magnitudes(&sine(1000.0, 44100, 8192));
        let mid = &mags[mags.len() / 2];
        let (peak_bin, _) = mid
            .iter()
            .enumerate()
            .fold((0, 0.0f32), |best, (i, &m)| if m > best.1 { (i, m) } else { best });
        let freq = stft.bin_frequencies(44100)[peak_bin];
        assert!((freq - 1000.0).abs() < 44100.0 / 2048.0);
    }

    #[test]
    fn inverse_reconstructs_signal() {
        let stft = Stft::new(1024, 256);
        let signal = sine(440.0, 22050, 6000);
        let rebuilt = stft.inverse(&stft.forward(&signal), signal.len());
        assert_eq!(rebuilt.len(), signal.len());
        for (a, b) in signal.iter().zip(rebuilt.iter()).skip(100).take(5000) {
            assert!((a - b).abs() < 1e-3, "{} vs {}", a, b);
        }
    }
}
