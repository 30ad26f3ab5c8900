use super::params::EffectParameters;

/// Names accepted by [`by_name`].
pub const NAMES: [&str; 5] = [
    "nightcore",
    "slowed",
    "slowed_reverb",
    "half_speed",
    "quarter_speed",
];

/// Parameter set for a named preset.
pub fn by_name(name: &str) -> Option<EffectParameters> {
    let params = match name {
        "nightcore" => EffectParameters {
            nightcore: true,
            ..Default::default()
        },
        "slowed" => EffectParameters {
            speed: 0.75,
            reverb: 0.3,
            ..Default::default()
        },
        "slowed_reverb" => EffectParameters {
            speed: 0.75,
            reverb: 0.6,
            ..Default::default()
        },
        "half_speed" => EffectParameters {
            speed: 0.5,
            ..Default::default()
        },
        "quarter_speed" => EffectParameters {
            speed: 0.25,
            ..Default::default()
        },
        _ => return None,
    };
    Some(params)
}

/// Pitch-only transposition by whole or fractional semitones.
pub fn transpose(semitones: f32) -> EffectParameters {
    EffectParameters {
        pitch: semitones,
        ..Default::default()
    }
}

/// Like [`by_name`], also accepting `transpose:<semitones>` (e.g. `transpose:-2`).
pub fn parse(spec: &str) -> Option<EffectParameters> {
    match spec.split_once(':') {
        Some(("transpose", steps)) => steps.trim().parse().ok().map(transpose),
        Some(_) => None,
        None => by_name(spec),
    }
}

/// One-line description of a preset for listings.
pub fn describe(name: &str) -> &'static str {
    match name {
        "nightcore" => "speed 1.25, pitch +3 semitones",
        "slowed" => "speed 0.75, light reverb",
        "slowed_reverb" => "speed 0.75, heavy reverb",
        "half_speed" => "speed 0.5",
        "quarter_speed" => "speed 0.25",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_name_resolves() {
        for name in NAMES {
            let params = by_name(name).unwrap();
            assert!(params.validate().is_ok(), "{name}");
        }
        assert!(by_name("vaporwave").is_none());
    }

    #[test]
    fn transpose_only_touches_pitch() {
        let p = transpose(-2.0);
        assert_eq!(p.pitch, -2.0);
        assert_eq!(EffectParameters { pitch: 0.0, ..p }, EffectParameters::default());
    }

    #[test]
    fn parses_transpose_specs() {
        assert_eq!(parse("transpose:-2").unwrap().pitch, -2.0);
        assert_eq!(parse("transpose: 1.5").unwrap().pitch, 1.5);
        assert!(parse("transpose:up").is_none());
        assert!(parse("echo:3").is_none());
        assert_eq!(parse("slowed"), by_name("slowed"));
    }
}
