use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

use super::buffer::SampleBuffer;
use crate::error::Result;

/// Write the buffer as an interleaved 32-bit float WAV file.
pub fn write_wav(path: &Path, buffer: &SampleBuffer) -> Result<()> {
    let spec = WavSpec {
        channels: buffer.num_channels() as u16,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for i in 0..buffer.len() {
        for channel in &buffer.channels {
            writer.write_sample(channel[i])?;
        }
    }
    writer.finalize()?;

    log::info!(
        "Wrote {} ({} frames, {} channel(s), {}Hz)",
        path.display(),
        buffer.len(),
        buffer.num_channels(),
        buffer.sample_rate
    );
    Ok(())
}
