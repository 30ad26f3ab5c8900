//! Stereo placement and time-domain edits.

const PAN_LAW: f32 = 0.707;

/// Channel gains `(left, right)` for a pan position in [-1.0, 1.0].
///
/// The channel on the side being panned towards stays at unity; the other
/// one is scaled by `(1 - |pan|) × 0.707`.
pub fn pan_gains(pan: f32) -> (f32, f32) {
    if pan >= 0.0 {
        ((1.0 - pan) * PAN_LAW, 1.0)
    } else {
        (1.0, (1.0 + pan) * PAN_LAW)
    }
}

pub fn pan(left: &mut [f32], right: &mut [f32], position: f32) {
    let (lg, rg) = pan_gains(position);
    left.iter_mut().for_each(|s| *s *= lg);
    right.iter_mut().for_each(|s| *s *= rg);
}

pub fn reverse(samples: &mut [f32]) {
    samples.reverse();
}

/// Linear ramps over the first `fade_in` and last `fade_out` seconds.
///
/// The first sample of a fade-in and the last sample of a fade-out are zero.
pub fn fade(samples: &mut [f32], sample_rate: u32, fade_in: f32, fade_out: f32) {
    let len = samples.len();
    let n_in = ((fade_in * sample_rate as f32) as usize).min(len);
    let n_out = ((fade_out * sample_rate as f32) as usize).min(len);

    for (i, s) in samples.iter_mut().take(n_in).enumerate() {
        *s *= i as f32 / n_in as f32;
    }
    for j in 0..n_out {
        samples[len - n_out + j] *= 1.0 - (j + 1) as f32 / n_out as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_right_silences_left() {
        let mut l = vec![0.5; 4];
        let mut r = vec![0.5; 4];
        pan(&mut l, &mut r, 1.0);
        assert!(l.iter().all(|&s| s == 0.0));
        assert!(r.iter().all(|&s| s == 0.5));
    }

    #[test]
    fn full_left_silences_right() {
        let (lg, rg) = pan_gains(-1.0);
        assert_eq!(lg, 1.0);
        assert_eq!(rg, 0.0);
    }

    #[test]
    fn partial_pan_attenuates_far_side() {
        let (lg, rg) = pan_gains(0.5);
        assert!((lg - 0.3535).abs() < 1e-4);
        assert_eq!(rg, 1.0);
    }

    #[test]
    fn reverse_twice_is_identity() {
        let original = vec![0.1, 0.2, -0.3, 0.4];
        let mut x = original.clone();
        reverse(&mut x);
        assert_eq!(x, vec![0.4, -0.3, 0.2, 0.1]);
        reverse(&mut x);
        assert_eq!(x, original);
    }

    #[test]
    fn fades_ramp_linearly() {
        let mut x = vec![1.0f32; 100];
        fade(&mut x, 10, 1.0, 1.0);
        assert_eq!(x[0], 0.0);
        assert!((x[5] - 0.5).abs() < 1e-6);
        assert_eq!(x[50], 1.0);
        assert_eq!(x[99], 0.0);
        assert!((x[94] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn fade_longer_than_buffer_is_clamped() {
        let mut x = vec![1.0f32; 10];
        fade(&mut x, 10, 5.0, 0.0);
        assert_eq!(x[0], 0.0);
        assert!((x[9] - 0.9).abs() < 1e-6);
    }
}
