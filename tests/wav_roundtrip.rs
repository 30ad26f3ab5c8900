use brainwave::audio::{decode::decode_audio, encode::write_wav};
use brainwave::{EffectChain, EffectParameters, FeatureExtractor, SampleBuffer};
use std::f32::consts::TAU;

const SR: u32 = 44100;

fn sine(freq: f32, amp: f32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (TAU * freq * i as f32 / SR as f32).sin() * amp)
        .collect()
}

#[test]
fn stereo_wav_survives_write_and_decode() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tone.wav");
    let original = SampleBuffer::stereo(sine(440.0, 0.5, 22050), sine(660.0, 0.25, 22050), SR).unwrap();

    write_wav(&path, &original).unwrap();
    let decoded = decode_audio(&path).unwrap();

    assert_eq!(decoded.sample_rate, SR);
    assert_eq!(decoded.num_channels(), 2);
    assert_eq!(decoded.len(), original.len());
    for (a, b) in original.channels.iter().zip(decoded.channels.iter()) {
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
    }
}

#[test]
fn processed_file_can_be_analyzed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("processed.wav");
    let input = SampleBuffer::mono(sine(220.0, 0.3, SR as usize), SR).unwrap();

    let processed = EffectChain::new(EffectParameters {
        normalize: true,
        fade_out: 0.1,
        ..Default::default()
    })
    .process(&input);
    write_wav(&path, &processed).unwrap();

    let features = FeatureExtractor::default()
        .extract(&decode_audio(&path).unwrap())
        .unwrap();
    assert_eq!(features.flag("is_stereo"), Some(false));
    assert!(features.number("peak_level_db").unwrap().abs() < 0.01);
    assert_eq!(features.text("key"), Some("A"));
}

#[test]
fn decoding_garbage_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noise.wav");
    std::fs::write(&path, b"definitely not audio").unwrap();
    assert!(decode_audio(&path).is_err());
}
