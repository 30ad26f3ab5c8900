/// A frequency band shared by the equalizer and the band-energy metrics.
#[derive(Clone, Copy, Debug)]
pub struct Band {
    pub name: &'static str,
    pub low_hz: f32,
    pub high_hz: f32,
}

pub const BANDS: [Band; 5] = [
    Band { name: "bass", low_hz: 20.0, high_hz: 250.0 },
    Band { name: "low_mid", low_hz: 250.0, high_hz: 500.0 },
    Band { name: "mid", low_hz: 500.0, high_hz: 2000.0 },
    Band { name: "high_mid", low_hz: 2000.0, high_hz: 4000.0 },
    Band { name: "treble", low_hz: 4000.0, high_hz: 20000.0 },
];
