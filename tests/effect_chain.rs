use brainwave::effects::presets;
use brainwave::{EffectChain, EffectParameters, SampleBuffer, Stage};
use std::f32::consts::TAU;

const SR: u32 = 44100;

fn sine(freq: f32, amp: f32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| (TAU * freq * i as f32 / SR as f32).sin() * amp)
        .collect()
}

fn stereo() -> SampleBuffer {
    SampleBuffer::stereo(sine(440.0, 0.5, 8820), sine(550.0, 0.3, 8820), SR).unwrap()
}

fn run(params: EffectParameters, input: &SampleBuffer) -> SampleBuffer {
    EffectChain::checked(params).unwrap().process(input)
}

#[test]
fn defaults_leave_audio_untouched() {
    let input = stereo();
    assert_eq!(run(EffectParameters::default(), &input), input);
}

#[test]
fn plus_six_db_doubles_the_peak() {
    let input = SampleBuffer::mono(sine(440.0, 0.25, 4410), SR).unwrap();
    let out = run(
        EffectParameters {
            gain: 6.0,
            ..Default::default()
        },
        &input,
    );
    let ratio = out.peak() / input.peak();
    assert!((ratio - 1.995).abs() < 0.01, "{}", ratio);
}

#[test]
fn normalize_brings_each_channel_to_full_scale() {
    let out = run(
        EffectParameters {
            normalize: true,
            ..Default::default()
        },
        &stereo(),
    );
    for channel in &out.channels {
        let peak = channel.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!((peak - 1.0).abs() < 1e-5, "{}", peak);
    }
}

#[test]
fn reversing_twice_restores_the_input() {
    let params = EffectParameters {
        reverse: true,
        ..Default::default()
    };
    let input = stereo();
    let once = run(params.clone(), &input);
    assert_ne!(once, input);
    assert_eq!(run(params, &once), input);
}

#[test]
fn hard_pan_keeps_one_side() {
    let input = stereo();
    let right = run(
        EffectParameters {
            pan: 1.0,
            ..Default::default()
        },
        &input,
    );
    assert!(right.channels[0].iter().all(|&s| s == 0.0));
    assert_eq!(right.channels[1], input.channels[1]);

    let left = run(
        EffectParameters {
            pan: -1.0,
            ..Default::default()
        },
        &input,
    );
    assert_eq!(left.channels[0], input.channels[0]);
    assert!(left.channels[1].iter().all(|&s| s == 0.0));
}

#[test]
fn pan_is_ignored_for_mono() {
    let input = SampleBuffer::mono(sine(440.0, 0.5, 4410), SR).unwrap();
    let chain = EffectChain::new(EffectParameters {
        pan: 0.7,
        ..Default::default()
    });
    assert!(chain.stages(false).is_empty());
    assert_eq!(chain.process(&input), input);
}

#[test]
fn pitch_shift_keeps_length_and_stretch_changes_it() {
    let input = stereo();
    let shifted = run(presets::transpose(4.0), &input);
    assert_eq!(shifted.len(), input.len());

    let slowed = run(
        EffectParameters {
            speed: 0.5,
            ..Default::default()
        },
        &input,
    );
    assert_eq!(slowed.len(), input.len() * 2);
}

#[test]
fn presets_run_without_clipping() {
    let input = stereo();
    for name in presets::NAMES {
        let params = EffectParameters {
            reverb_seed: Some(3),
            ..presets::by_name(name).unwrap()
        };
        let out = run(params, &input);
        assert!(out.peak() <= 1.0 + 1e-6, "{}", name);
        assert!(out.channels.iter().flatten().all(|s| s.is_finite()), "{}", name);
    }
}

#[test]
fn kitchen_sink_chain() {
    let params = EffectParameters {
        reverb: 0.4,
        reverb_seed: Some(11),
        gain: -3.0,
        eq_bass: 4.0,
        eq_treble: -4.0,
        low_pass: 12000.0,
        high_pass: 60.0,
        delay: 0.3,
        delay_time: 40.0,
        chorus: 0.4,
        flanger: 0.3,
        phaser: 0.5,
        distortion: 0.2,
        compression: 0.6,
        pan: -0.3,
        fade_in: 0.02,
        fade_out: 0.02,
        normalize: true,
        ..Default::default()
    };
    let chain = EffectChain::checked(params).unwrap();
    let mut seen = Vec::new();
    let out = chain.process_with(&stereo(), |stage| seen.push(stage));

    assert_eq!(seen.first(), Some(&Stage::Reverb));
    assert_eq!(seen.last(), Some(&Stage::Normalize));
    assert_eq!(seen.len(), 14);
    assert_eq!(out.len(), 8820);
    assert!(out.peak() <= 1.0 + 1e-6);
    assert_eq!(out.channels[0][0], 0.0);
}

#[test]
fn invalid_parameters_are_refused() {
    for params in [
        EffectParameters {
            speed: 0.0,
            ..Default::default()
        },
        EffectParameters {
            pan: 1.5,
            ..Default::default()
        },
        EffectParameters {
            compression_ratio: 0.5,
            ..Default::default()
        },
        EffectParameters {
            reverb: f32::NAN,
            ..Default::default()
        },
    ] {
        assert!(EffectChain::checked(params).is_err());
    }
}
