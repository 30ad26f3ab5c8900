mod cli;
mod config;

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use brainwave::audio::{decode::decode_audio, encode::write_wav};
use brainwave::compare::METRICS;
use brainwave::effects::presets;
use brainwave::{compare, keys, EffectChain, EffectParameters, FeatureExtractor, FeatureSet, SampleBuffer};
use cli::{Cli, Command, EffectArgs};
use config::Config;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let config = match config::find_config(cli.config.as_deref()) {
        Some(path) => match config::load_config(&path) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            Err(err) if cli.config.is_some() => return Err(err),
            Err(err) => {
                log::warn!("{:#}", err);
                Config::default()
            }
        },
        None => Config::default(),
    };

    match cli.command {
        Command::Analyze { files, json } => run_analyze(&config, &files, json),
        Command::Process {
            input,
            output,
            preset,
            params,
            effects,
        } => run_process(&config, &input, output, preset.as_deref(), params.as_deref(), &effects),
        Command::Compare {
            original,
            reference,
            json,
        } => run_compare(&config, &original, &reference, json),
        Command::Presets => {
            println!("Available presets:");
            for name in presets::NAMES {
                println!("  {:<16} {}", name, presets::describe(name));
            }
            println!("  {:<16} {}", "transpose:<N>", "pitch shift by N semitones");
            Ok(())
        }
    }
}

fn load(path: &Path) -> Result<SampleBuffer> {
    if !path.exists() {
        bail!("Input file not found: {}", path.display());
    }
    log::info!("Decoding {}...", path.display());
    decode_audio(path).with_context(|| format!("Failed to decode {}", path.display()))
}

fn analyze_file(extractor: &FeatureExtractor, path: &Path) -> Result<FeatureSet> {
    let buffer = load(path)?;
    extractor
        .extract(&buffer)
        .with_context(|| format!("Failed to analyze {}", path.display()))
}

fn run_analyze(config: &Config, files: &[PathBuf], json: bool) -> Result<()> {
    let extractor = FeatureExtractor::new(config.analysis.clone())?;
    let mut reports = serde_json::Map::new();

    for path in files {
        let features = analyze_file(&extractor, path)?;
        if json {
            reports.insert(path.display().to_string(), serde_json::to_value(&features)?);
            continue;
        }
        println!("{}", path.display());
        for (key, value) in features.iter() {
            let shown = match value {
                brainwave::FeatureValue::Number(n) => format!("{}", n),
                brainwave::FeatureValue::Flag(b) => b.to_string(),
                brainwave::FeatureValue::Text(t) => t.clone(),
            };
            println!("  {:<22} {}", key, shown);
        }
        if let Some(key) = features.text("key") {
            println!("  {:<22} {}", "key (major/minor)", keys::format_with_minor(key));
        }
    }

    if json {
        let out = if reports.len() == 1 {
            reports.into_iter().next().map(|(_, v)| v).unwrap_or_default()
        } else {
            serde_json::Value::Object(reports)
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    }
    Ok(())
}

/// Config baseline, then the preset, then `--params` JSON, then single flags.
fn build_params(
    config: &Config,
    preset: Option<&str>,
    json: Option<&str>,
    flags: &EffectArgs,
) -> Result<EffectParameters> {
    let mut params = match preset {
        Some(name) => {
            let mut p = presets::parse(name)
                .with_context(|| format!("Unknown preset '{}' (see `brainwave presets`)", name))?;
            p.reverb_seed = config.effects.reverb_seed;
            p
        }
        None => config.effects.clone(),
    };

    if let Some(json) = json {
        let overrides: serde_json::Value =
            serde_json::from_str(json).context("--params is not valid JSON")?;
        let serde_json::Value::Object(overrides) = overrides else {
            bail!("--params must be a JSON object");
        };
        let mut merged = serde_json::to_value(&params)?;
        if let serde_json::Value::Object(ref mut fields) = merged {
            fields.extend(overrides);
        }
        params = serde_json::from_value(merged).context("Invalid effect parameters in --params")?;
    }

    flags.apply(&mut params);
    Ok(params)
}

fn output_path(config: &Config, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".into());
    let name = format!("{}{}.wav", stem, config.output.suffix);
    match &config.output.dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

fn run_process(
    config: &Config,
    input: &Path,
    output: Option<PathBuf>,
    preset: Option<&str>,
    json: Option<&str>,
    flags: &EffectArgs,
) -> Result<()> {
    let params = build_params(config, preset, json, flags)?;
    let chain = EffectChain::checked(params).context("Invalid effect parameters")?;
    let output = output.unwrap_or_else(|| output_path(config, input));

    let buffer = load(input)?;
    log::info!(
        "Input: {:.1}s, {} channel(s) @ {}Hz",
        buffer.duration(),
        buffer.num_channels(),
        buffer.sample_rate
    );

    let stages = chain.stages(buffer.is_stereo());
    let pb = ProgressBar::new(stages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} stages {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );
    let mut started = 0;
    let processed = chain.process_with(&buffer, |stage| {
        pb.set_position(started);
        pb.set_message(stage.name());
        started += 1;
    });
    pb.set_position(started);
    pb.finish_with_message("done");

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    write_wav(&output, &processed).with_context(|| format!("Failed to write {}", output.display()))?;

    let pitch = chain.params().pitch;
    if pitch != 0.0 {
        let extractor = FeatureExtractor::new(config.analysis.clone())?;
        let features = extractor.extract(&buffer)?;
        if let Some(key) = features.text("key") {
            let shifted = keys::transpose_key(key, pitch)
                .map(|pair| pair.to_string())
                .unwrap_or_else(|| "?/?m".into());
            log::info!("Key: {} -> {}", keys::format_with_minor(key), shifted);
        }
    }

    log::info!("Done! Output: {}", output.display());
    Ok(())
}

fn run_compare(config: &Config, original: &Path, reference: &Path, json: bool) -> Result<()> {
    let extractor = FeatureExtractor::new(config.analysis.clone())?;
    let (original_features, reference_features) = rayon::join(
        || analyze_file(&extractor, original),
        || analyze_file(&extractor, reference),
    );
    let result = compare(&original_features?, &reference_features?);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!(
        "Similarity: {:.1}% ({})",
        result.global_score, result.global_status_label
    );
    println!("Keys: {} vs {}", result.original_key, result.reference_key);
    for metric in METRICS.iter() {
        let Some(cmp) = result.comparisons.get(metric.key) else {
            continue;
        };
        println!(
            "  {:<20} {:>10.2} {:>10.2} {:>8.2}% {:>6.1}  {}",
            cmp.name,
            cmp.original_value,
            cmp.reference_value,
            cmp.difference_pct,
            cmp.score,
            cmp.status_label
        );
    }
    Ok(())
}
