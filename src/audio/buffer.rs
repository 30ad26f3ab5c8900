use crate::error::{Error, Result};

/// Channel-separated audio samples with their sample rate.
///
/// Holds one (mono) or two (stereo) channels of equal length. Samples are
/// nominally in [-1.0, 1.0].
#[derive(Clone, Debug, PartialEq)]
pub struct SampleBuffer {
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: u32,
}

impl SampleBuffer {
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::InvalidInput("sample rate must be positive".into()));
        }
        if channels.is_empty() || channels.len() > 2 {
            return Err(Error::InvalidInput(format!(
                "expected 1 or 2 channels, got {}",
                channels.len()
            )));
        }
        if channels.iter().any(|c| c.len() != channels[0].len()) {
            return Err(Error::InvalidInput("channel lengths differ".into()));
        }
        Ok(Self {
            channels,
            sample_rate,
        })
    }

    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::new(vec![samples], sample_rate)
    }

    pub fn stereo(left: Vec<f32>, right: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::new(vec![left, right], sample_rate)
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn is_stereo(&self) -> bool {
        self.channels.len() == 2
    }

    /// Number of frames (samples per channel).
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn duration(&self) -> f32 {
        self.len() as f32 / self.sample_rate as f32
    }

    /// Largest absolute sample across all channels.
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flat_map(|c| c.iter())
            .fold(0.0f32, |acc, s| acc.max(s.abs()))
    }

    /// Average of all channels.
    pub fn to_mono(&self) -> Vec<f32> {
        match self.channels.as_slice() {
            [only] => only.clone(),
            [left, right] => left
                .iter()
                .zip(right.iter())
                .map(|(l, r)| (l + r) * 0.5)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Copy of the buffer limited to the first `seconds` of audio.
    pub fn truncated(&self, seconds: f32) -> Self {
        let max_len = (seconds.max(0.0) * self.sample_rate as f32) as usize;
        let keep = self.len().min(max_len);
        Self {
            channels: self.channels.iter().map(|c| c[..keep].to_vec()).collect(),
            sample_rate: self.sample_rate,
        }
    }
}
