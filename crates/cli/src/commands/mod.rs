mod cost;
mod generate;
mod login;

use std::path::Path;

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use nai::{GenerationParams, UcPreset};

use crate::cli::{Commands, ParamArgs};
use crate::error::Result;

pub async fn dispatch(command: Commands, verbose: bool) -> Result<()> {
    match command {
        Commands::Login { credentials, connection } => login::execute(&credentials, &connection).await,
        Commands::Generate(args) => generate::execute(&args, verbose).await,
        Commands::Cost { params, opus } => cost::execute(&params, opus),
    }
}

/// Builds validated parameters from command line flags.
pub fn build_params(args: &ParamArgs) -> Result<GenerationParams> {
    let mut builder = GenerationParams::builder(&args.prompt)
        .quality_toggle(!args.no_quality)
        .sm(!args.no_smea)
        .sm_dyn(args.smea_dyn);

    if let Some(negative) = &args.negative {
        builder = builder.negative_prompt(negative);
    }
    if let Some(model) = args.model {
        builder = builder.model(model);
    }
    if let Some(action) = args.action {
        builder = builder.action(action);
    }
    if let Some(resolution) = args.resolution {
        builder = builder.resolution(resolution);
    }
    if let Some(width) = args.width {
        builder = builder.width(width);
    }
    if let Some(height) = args.height {
        builder = builder.height(height);
    }
    if let Some(samples) = args.samples {
        builder = builder.n_samples(samples);
    }
    if let Some(steps) = args.steps {
        builder = builder.steps(steps);
    }
    if let Some(scale) = args.scale {
        builder = builder.scale(scale);
    }
    if let Some(sampler) = args.sampler {
        builder = builder.sampler(sampler);
    }
    if let Some(schedule) = args.noise_schedule {
        builder = builder.noise_schedule(schedule);
    }
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    builder = builder.uc_preset_value(args.uc_preset.unwrap_or(UcPreset::default().value()));
    if let Some(strength) = args.strength {
        builder = builder.strength(strength);
    }
    if let Some(noise) = args.noise {
        builder = builder.noise(noise);
    }
    if let Some(path) = &args.image {
        builder = builder.image(read_base64(path)?);
    }
    if let Some(path) = &args.mask {
        builder = builder.mask(read_base64(path)?);
    }

    Ok(builder.build()?)
}

fn read_base64(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(STANDARD.encode(bytes))
}
