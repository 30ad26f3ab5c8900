//! Level and dynamics stages: gain, saturation, compression, normalization.

/// Linear amplitude of a dB value.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// dB value of a linear amplitude, floored at -200 dB for silence.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    20.0 * linear.max(1e-10).log10()
}

pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
}

/// Scale down so the peak is 1.0, only when it is above 1.0.
pub fn renormalize_peak(samples: &mut [f32]) {
    let p = peak(samples);
    if p > 1.0 {
        samples.iter_mut().for_each(|s| *s /= p);
    }
}

pub fn apply_gain(samples: &mut [f32], gain_db: f32) {
    let scale = db_to_linear(gain_db);
    samples.iter_mut().for_each(|s| *s *= scale);
}

/// Hyperbolic-tangent soft clipping with drive `1 + amount × 9`.
pub fn distort(samples: &mut [f32], amount: f32) {
    let drive = 1.0 + amount * 9.0;
    samples.iter_mut().for_each(|s| *s = (*s * drive).tanh());
}

/// Static downward compression blended with the dry signal by `amount`.
///
/// Levels above `threshold_db` keep only `1 / ratio` of their excess.
pub fn compress(samples: &mut [f32], amount: f32, ratio: f32, threshold_db: f32) {
    let ratio = ratio.max(1.0);
    for s in samples.iter_mut() {
        let level_db = linear_to_db(s.abs());
        if level_db <= threshold_db {
            continue;
        }
        let compressed_db = threshold_db + (level_db - threshold_db) / ratio;
        let wet = s.signum() * db_to_linear(compressed_db);
        *s = (1.0 - amount) * *s + amount * wet;
    }
}

/// Scale so the maximum absolute sample is exactly 1.0. Silence is left alone.
pub fn normalize(samples: &mut [f32]) {
    let p = peak(samples);
    if p > 0.0 {
        samples.iter_mut().for_each(|s| *s /= p);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_db_doubles_amplitude() {
        let mut x = vec![0.25, -0.1];
        apply_gain(&mut x, 6.0206);
        assert!((x[0] - 0.5).abs() < 1e-4);
        assert!((x[1] + 0.2).abs() < 1e-4);
    }

    #[test]
    fn db_round_trip() {
        assert!((linear_to_db(db_to_linear(-12.0)) + 12.0).abs() < 1e-4);
        assert!((linear_to_db(0.0) + 200.0).abs() < 1e-3);
    }

    #[test]
    fn distortion_stays_bounded() {
        let mut x = vec![-1.0, -0.5, 0.0, 0.5, 1.0];
        distort(&mut x, 1.0);
        assert!(x.iter().all(|s| s.abs() <= 1.0));
        assert_eq!(x[2], 0.0);
        assert!(x[3] > 0.99);
    }

    #[test]
    fn compression_only_touches_loud_samples() {
        let mut x = vec![0.1, 1.0];
        compress(&mut x, 1.0, 4.0, -12.0);
        assert_eq!(x[0], 0.1);
        // 0 dBFS is 12 dB over; 4:1 leaves 3 dB over -> -9 dBFS
        assert!((x[1] - db_to_linear(-9.0)).abs() < 1e-4);
    }

    #[test]
    fn compression_amount_blends_dry() {
        let mut x = vec![1.0];
        compress(&mut x, 0.5, 4.0, -12.0);
        let expected = 0.5 + 0.5 * db_to_linear(-9.0);
        assert!((x[0] - expected).abs() < 1e-4);
    }

    #[test]
    fn normalize_sets_unit_peak() {
        let mut x = vec![0.1, -0.4, 0.2];
        normalize(&mut x);
        assert!((peak(&x) - 1.0).abs() < 1e-6);
        let mut silence = vec![0.0; 4];
        normalize(&mut silence);
        assert!(silence.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn renormalize_only_when_clipping() {
        let mut quiet = vec![0.5, -0.9];
        renormalize_peak(&mut quiet);
        assert_eq!(quiet, vec![0.5, -0.9]);
        let mut loud = vec![2.0, -1.0];
        renormalize_peak(&mut loud);
        assert_eq!(loud, vec![1.0, -0.5]);
    }
}
