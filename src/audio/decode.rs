use std::path::Path;
use symphonia::core::audio::SampleBuffer as SymphoniaBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::buffer::SampleBuffer;
use crate::error::{Error, Result};

/// Decode an audio file (WAV, MP3, FLAC, OGG, AAC) into separate channels.
///
/// Mono stays mono and stereo stays stereo. Layouts with more channels are
/// folded down to stereo: even-indexed channels are averaged into the left
/// channel and odd-indexed ones into the right.
pub fn decode_audio(path: &Path) -> Result<SampleBuffer> {
    let file = std::fs::File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| Error::Decode(format!("failed to probe {}: {e}", path.display())))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::Decode("no audio tracks found".into()))?;

    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count()).max(1);
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| Error::Decode("unknown sample rate".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("failed to create decoder: {e}")))?;

    let out_channels = channels.min(2);
    let mut planes: Vec<Vec<f32>> = vec![Vec::new(); out_channels];

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(Error::Decode(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(msg)) => {
                log::warn!("Skipping undecodable packet: {}", msg);
                continue;
            }
            Err(e) => return Err(Error::Decode(e.to_string())),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();

        let mut sample_buf = SymphoniaBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        deinterleave_into(sample_buf.samples(), channels, &mut planes);
    }

    log::info!(
        "Decoded audio: {} frames, {} channel(s), {}Hz, {:.1}s",
        planes[0].len(),
        out_channels,
        sample_rate,
        planes[0].len() as f32 / sample_rate as f32
    );

    SampleBuffer::new(planes, sample_rate)
}

fn deinterleave_into(interleaved: &[f32], channels: usize, planes: &mut [Vec<f32>]) {
    match (channels, planes.len()) {
        (1, _) => planes[0].extend_from_slice(interleaved),
        (2, _) => {
            for frame in interleaved.chunks_exact(2) {
                planes[0].push(frame[0]);
                planes[1].push(frame[1]);
            }
        }
        _ => {
            let evens = channels.div_ceil(2) as f32;
            let odds = (channels / 2) as f32;
            for frame in interleaved.chunks_exact(channels) {
                let mut left = 0.0;
                let mut right = 0.0;
                for (i, &s) in frame.iter().enumerate() {
                    if i % 2 == 0 {
                        left += s;
                    } else {
                        right += s;
                    }
                }
                planes[0].push(left / evens);
                planes[1].push(right / odds);
            }
        }
    }
}
