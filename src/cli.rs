use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use brainwave::EffectParameters;

#[derive(Parser, Debug)]
#[command(name = "brainwave", about = "Audio analysis, effects processing and similarity scoring")]
pub struct Cli {
    /// Config file (defaults to ./brainwave.toml or the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract descriptors from one or more audio files
    Analyze {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print features as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the effect chain over a file and write a WAV
    Process {
        input: PathBuf,

        /// Output WAV file (defaults to <input><suffix>.wav)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Start from a named preset (see `brainwave presets`)
        #[arg(long)]
        preset: Option<String>,

        /// Effect parameters as a JSON object, e.g. '{"reverb": 0.4}'
        #[arg(long)]
        params: Option<String>,

        #[command(flatten)]
        effects: EffectArgs,
    },

    /// Score how close ORIGINAL sounds to REFERENCE
    Compare {
        original: PathBuf,
        reference: PathBuf,

        /// Print the comparison as JSON
        #[arg(long)]
        json: bool,
    },

    /// List built-in presets
    Presets,
}

/// Per-effect overrides. Unset flags leave the parameter alone.
#[derive(Args, Debug, Default)]
pub struct EffectArgs {
    /// Playback speed ratio
    #[arg(long)]
    pub speed: Option<f32>,
    /// Pitch shift in semitones
    #[arg(long, allow_hyphen_values = true)]
    pub pitch: Option<f32>,
    /// Speed 1.25 and +3 semitones
    #[arg(long)]
    pub nightcore: bool,
    /// Reverb amount (0-1)
    #[arg(long)]
    pub reverb: Option<f32>,
    /// Seed for reproducible reverb
    #[arg(long)]
    pub reverb_seed: Option<u64>,
    /// Gain in dB
    #[arg(long, allow_hyphen_values = true)]
    pub gain: Option<f32>,
    /// Low-pass cutoff in Hz
    #[arg(long)]
    pub low_pass: Option<f32>,
    /// High-pass cutoff in Hz
    #[arg(long)]
    pub high_pass: Option<f32>,
    #[arg(long)]
    pub delay: Option<f32>,
    /// Delay time in ms
    #[arg(long)]
    pub delay_time: Option<f32>,
    #[arg(long)]
    pub delay_feedback: Option<f32>,
    #[arg(long)]
    pub chorus: Option<f32>,
    #[arg(long)]
    pub chorus_rate: Option<f32>,
    #[arg(long)]
    pub chorus_depth: Option<f32>,
    #[arg(long)]
    pub flanger: Option<f32>,
    #[arg(long)]
    pub flanger_rate: Option<f32>,
    #[arg(long)]
    pub flanger_depth: Option<f32>,
    #[arg(long)]
    pub phaser: Option<f32>,
    #[arg(long)]
    pub phaser_rate: Option<f32>,
    #[arg(long)]
    pub distortion: Option<f32>,
    #[arg(long)]
    pub compression: Option<f32>,
    #[arg(long)]
    pub compression_ratio: Option<f32>,
    /// Compressor threshold in dBFS
    #[arg(long, allow_hyphen_values = true)]
    pub compression_threshold: Option<f32>,
    /// Peak-normalize to full scale
    #[arg(long)]
    pub normalize: bool,
    #[arg(long)]
    pub reverse: bool,
    /// Fade-in in seconds
    #[arg(long)]
    pub fade_in: Option<f32>,
    /// Fade-out in seconds
    #[arg(long)]
    pub fade_out: Option<f32>,
    /// Stereo position (-1 left, 1 right)
    #[arg(long, allow_hyphen_values = true)]
    pub pan: Option<f32>,
    #[arg(long, allow_hyphen_values = true)]
    pub eq_bass: Option<f32>,
    #[arg(long, allow_hyphen_values = true)]
    pub eq_low_mid: Option<f32>,
    #[arg(long, allow_hyphen_values = true)]
    pub eq_mid: Option<f32>,
    #[arg(long, allow_hyphen_values = true)]
    pub eq_high_mid: Option<f32>,
    #[arg(long, allow_hyphen_values = true)]
    pub eq_treble: Option<f32>,
}

impl EffectArgs {
    /// Overwrite every parameter that was given on the command line.
    pub fn apply(&self, params: &mut EffectParameters) {
        let overrides = [
            (self.speed, &mut params.speed),
            (self.pitch, &mut params.pitch),
            (self.reverb, &mut params.reverb),
            (self.gain, &mut params.gain),
            (self.low_pass, &mut params.low_pass),
            (self.high_pass, &mut params.high_pass),
            (self.delay, &mut params.delay),
            (self.delay_time, &mut params.delay_time),
            (self.delay_feedback, &mut params.delay_feedback),
            (self.chorus, &mut params.chorus),
            (self.chorus_rate, &mut params.chorus_rate),
            (self.chorus_depth, &mut params.chorus_depth),
            (self.flanger, &mut params.flanger),
            (self.flanger_rate, &mut params.flanger_rate),
            (self.flanger_depth, &mut params.flanger_depth),
            (self.phaser, &mut params.phaser),
            (self.phaser_rate, &mut params.phaser_rate),
            (self.distortion, &mut params.distortion),
            (self.compression, &mut params.compression),
            (self.compression_ratio, &mut params.compression_ratio),
            (self.compression_threshold, &mut params.compression_threshold),
            (self.fade_in, &mut params.fade_in),
            (self.fade_out, &mut params.fade_out),
            (self.pan, &mut params.pan),
            (self.eq_bass, &mut params.eq_bass),
            (self.eq_low_mid, &mut params.eq_low_mid),
            (self.eq_mid, &mut params.eq_mid),
            (self.eq_high_mid, &mut params.eq_high_mid),
            (self.eq_treble, &mut params.eq_treble),
        ];
        for (value, slot) in overrides {
            if let Some(v) = value {
                *slot = v;
            }
        }
        if self.nightcore {
            params.nightcore = true;
        }
        if self.normalize {
            params.normalize = true;
        }
        if self.reverse {
            params.reverse = true;
        }
        if self.reverb_seed.is_some() {
            params.reverb_seed = self.reverb_seed;
        }
    }
}
