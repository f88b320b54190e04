//! Generation parameters: validation, normalization and cost estimation.
//!
//! [`GenerationParams`] can only be obtained from
//! [`GenerationParamsBuilder::build`], which checks every field against its
//! domain, resolves the image dimensions, enforces the resolution-derived
//! sample cap and then applies the prompt/sampler normalizations. A value of
//! this type is therefore always valid and ready to be sent.
//!
//! # Example
//!
//! ```ignore
//! use nai::{GenerationParams, Resolution, UcPreset};
//!
//! let params = GenerationParams::builder("1girl, cherry blossoms")
//!     .resolution(Resolution::NormalPortrait)
//!     .uc_preset(UcPreset::Light)
//!     .n_samples(2)
//!     .build()?;
//! assert_eq!(params.calculate_cost(false), 48);
//! ```

use nai_protocol::{
    Action, Controlnet, GenerateImageRequest, ImageParameters, Model, NoiseSchedule, Resolution, Sampler, UcPreset,
};
use rand::Rng;
use thiserror::Error;

/// Largest accepted seed. Consecutive samples add 1 to the seed, so the top
/// of the `u32` range is reserved for up to 8 samples.
pub const MAX_SEED: u64 = 4_294_967_295 - 7;

/// Parameters accepted by the service ever since version 1 of the format.
const PARAMS_VERSION: u8 = 1;

// Pricing constants reverse-derived from the provider's price list.
const COST_PER_PIXEL: f64 = 2951823174884865e-21;
const COST_PER_PIXEL_STEP: f64 = 5.753298233447344e-7;
const MIN_BILLED_AREA: u64 = 65_536;
const OPUS_FREE_MAX_STEPS: u32 = 28;

macro_rules! heavy_tags {
    () => {
        ", lowres, {bad}, error, fewer, extra, missing, worst quality, jpeg artifacts, bad quality, watermark, unfinished, displeasing, chromatic aberration, signature, extra digits, artistic error, username, scan, [abstract]"
    };
}

const UC_HEAVY: &str = heavy_tags!();
const UC_LIGHT: &str = ", lowres, jpeg artifacts, worst quality, watermark, blurry, very displeasing";
const UC_HUMAN_FOCUS: &str = concat!(
    heavy_tags!(),
    ", bad anatomy, bad hands, @_@, mismatched pupils, heart-shaped pupils, glowing eyes"
);
const QUALITY_TAGS: &str = ", best quality, amazing quality, very aesthetic, absurdres";

/// Reason a parameter set was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be a multiple of {step}, got {value}")]
    NotMultipleOf { field: &'static str, value: f64, step: f64 },

    #[error("max value of n_samples is {max} under resolution {width}x{height}, got {requested}")]
    TooManySamples {
        requested: u32,
        max: u32,
        width: u32,
        height: u32,
    },

    #[error("ucPreset must be one of 0, 1, 2, 3, got {0}")]
    InvalidUcPreset(u8),
}

/// Maximum number of samples a single request may produce at `width`×`height`.
///
/// Zero means the resolution is too large for any sample.
pub fn max_samples(width: u32, height: u32) -> u32 {
    let area = u64::from(width) * u64::from(height);
    if area <= 512 * 704 {
        8
    } else if area <= 640 * 640 {
        6
    } else if area <= 1024 * 3072 {
        4
    } else {
        0
    }
}

/// Validated, normalized generation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    prompt: String,
    model: Model,
    action: Action,
    resolution: Resolution,
    parameters: ImageParameters,
}

impl GenerationParams {
    /// Starts a builder with the service defaults and fresh random seeds.
    pub fn builder(prompt: impl Into<String>) -> GenerationParamsBuilder {
        GenerationParamsBuilder::new(prompt)
    }

    /// Prompt after normalization (quality tags included when enabled).
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// Preset used for dimensions that were not set explicitly.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// The nested wire-level `parameters` object.
    pub fn parameters(&self) -> &ImageParameters {
        &self.parameters
    }

    pub fn width(&self) -> u32 {
        self.parameters.width
    }

    pub fn height(&self) -> u32 {
        self.parameters.height
    }

    pub fn n_samples(&self) -> u32 {
        self.parameters.n_samples
    }

    /// Sample cap for the resolved dimensions.
    pub fn max_samples(&self) -> u32 {
        max_samples(self.width(), self.height())
    }

    /// Estimated cost of the request in Anlas.
    ///
    /// `is_opus` applies the subscription's free-generation discount of one
    /// sample for requests of at most 28 steps up to 1024×1024.
    pub fn calculate_cost(&self, is_opus: bool) -> u32 {
        let p = &self.parameters;

        let strength = match (self.action, p.strength) {
            (Action::Img2Img, Some(s)) if s != 0.0 => s,
            _ => 1.0,
        };
        let smea_factor = if p.sm_dyn {
            1.4
        } else if p.sm {
            1.2
        } else {
            1.0
        };

        let mut resolution = (u64::from(p.width) * u64::from(p.height)).max(MIN_BILLED_AREA);
        // Squares in the normal tier are billed like portrait/landscape.
        if resolution > Resolution::NormalPortrait.area() && resolution <= Resolution::NormalSquare.area() {
            resolution = Resolution::NormalPortrait.area();
        }

        let pixels = resolution as f64;
        let steps = f64::from(p.steps);
        let mut per_sample = (COST_PER_PIXEL * pixels + COST_PER_PIXEL_STEP * pixels * steps).ceil() * smea_factor;
        per_sample = (per_sample * strength).ceil().max(2.0);
        if p.uncond_scale != 1.0 {
            per_sample = (per_sample * 1.3).ceil();
        }

        let opus_discount =
            is_opus && p.steps <= OPUS_FREE_MAX_STEPS && resolution <= Resolution::NormalSquare.area();

        per_sample as u32 * (p.n_samples - u32::from(opus_discount))
    }

    /// Request body for the generation endpoint.
    pub fn to_request(&self) -> GenerateImageRequest {
        GenerateImageRequest {
            input: self.prompt.clone(),
            model: self.model,
            action: self.action,
            parameters: self.parameters.clone(),
        }
    }
}

/// Builder for [`GenerationParams`].
///
/// Optional payload fields are omitted from the request unless set;
/// `strength` and `noise` have defaults that can be cleared.
#[derive(Debug, Clone)]
pub struct GenerationParamsBuilder {
    prompt: String,
    model: Model,
    action: Action,
    resolution: Resolution,

    negative_prompt: String,
    quality_toggle: bool,
    uc_preset: u8,

    width: Option<u32>,
    height: Option<u32>,
    n_samples: u32,

    steps: u32,
    scale: f64,
    dynamic_thresholding: bool,
    seed: Option<u64>,
    extra_noise_seed: Option<u64>,
    sampler: Sampler,
    sm: bool,
    sm_dyn: bool,
    uncond_scale: f64,
    cfg_rescale: f64,
    noise_schedule: NoiseSchedule,

    image: Option<String>,
    strength: Option<f64>,
    noise: Option<f64>,
    controlnet_strength: f64,
    controlnet_condition: Option<String>,
    controlnet_model: Option<Controlnet>,

    reference_image: Option<String>,
    reference_information_extracted: Option<f64>,
    reference_strength: Option<f64>,

    add_original_image: bool,
    mask: Option<String>,

    legacy: bool,
    legacy_v3_extend: bool,
}

impl GenerationParamsBuilder {
    fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: Model::V3,
            action: Action::Generate,
            resolution: Resolution::NormalSquare,
            negative_prompt: String::new(),
            quality_toggle: true,
            uc_preset: UcPreset::HumanFocus.value(),
            width: None,
            height: None,
            n_samples: 1,
            steps: 28,
            scale: 6.0,
            dynamic_thresholding: false,
            seed: None,
            extra_noise_seed: None,
            sampler: Sampler::Euler,
            sm: true,
            sm_dyn: false,
            uncond_scale: 1.0,
            cfg_rescale: 0.0,
            noise_schedule: NoiseSchedule::Native,
            image: None,
            strength: Some(0.3),
            noise: Some(0.0),
            controlnet_strength: 1.0,
            controlnet_condition: None,
            controlnet_model: None,
            reference_image: None,
            reference_information_extracted: None,
            reference_strength: None,
            add_original_image: true,
            mask: None,
            legacy: false,
            legacy_v3_extend: false,
        }
    }

    pub fn model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// Preset used when `width` or `height` is not set.
    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = negative_prompt.into();
        self
    }

    pub fn quality_toggle(mut self, enabled: bool) -> Self {
        self.quality_toggle = enabled;
        self
    }

    pub fn uc_preset(mut self, preset: UcPreset) -> Self {
        self.uc_preset = preset.value();
        self
    }

    /// Sets `ucPreset` from its raw value; checked in [`build`](Self::build).
    pub fn uc_preset_value(mut self, value: u8) -> Self {
        self.uc_preset = value;
        self
    }

    /// Overrides the preset width.
    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn n_samples(mut self, n_samples: u32) -> Self {
        self.n_samples = n_samples;
        self
    }

    pub fn steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn dynamic_thresholding(mut self, enabled: bool) -> Self {
        self.dynamic_thresholding = enabled;
        self
    }

    /// Fixed seed; a random one is drawn at build time otherwise.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn extra_noise_seed(mut self, seed: u64) -> Self {
        self.extra_noise_seed = Some(seed);
        self
    }

    pub fn sampler(mut self, sampler: Sampler) -> Self {
        self.sampler = sampler;
        self
    }

    /// SMEA. Forced off for img2img and inpainting.
    pub fn sm(mut self, enabled: bool) -> Self {
        self.sm = enabled;
        self
    }

    /// SMEA DYN. Forced off for img2img and inpainting.
    pub fn sm_dyn(mut self, enabled: bool) -> Self {
        self.sm_dyn = enabled;
        self
    }

    pub fn uncond_scale(mut self, value: f64) -> Self {
        self.uncond_scale = value;
        self
    }

    pub fn cfg_rescale(mut self, value: f64) -> Self {
        self.cfg_rescale = value;
        self
    }

    pub fn noise_schedule(mut self, schedule: NoiseSchedule) -> Self {
        self.noise_schedule = schedule;
        self
    }

    /// Base64-encoded source image for img2img.
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn strength(mut self, strength: f64) -> Self {
        self.strength = Some(strength);
        self
    }

    /// Omits `strength` from the request.
    pub fn clear_strength(mut self) -> Self {
        self.strength = None;
        self
    }

    pub fn noise(mut self, noise: f64) -> Self {
        self.noise = Some(noise);
        self
    }

    /// Omits `noise` from the request.
    pub fn clear_noise(mut self) -> Self {
        self.noise = None;
        self
    }

    pub fn controlnet_strength(mut self, value: f64) -> Self {
        self.controlnet_strength = value;
        self
    }

    /// Base64-encoded controlnet condition image.
    pub fn controlnet_condition(mut self, condition: impl Into<String>) -> Self {
        self.controlnet_condition = Some(condition.into());
        self
    }

    pub fn controlnet_model(mut self, model: Controlnet) -> Self {
        self.controlnet_model = Some(model);
        self
    }

    /// Base64-encoded vibe-transfer reference image.
    pub fn reference_image(mut self, image: impl Into<String>) -> Self {
        self.reference_image = Some(image.into());
        self
    }

    pub fn reference_information_extracted(mut self, value: f64) -> Self {
        self.reference_information_extracted = Some(value);
        self
    }

    pub fn reference_strength(mut self, value: f64) -> Self {
        self.reference_strength = Some(value);
        self
    }

    pub fn add_original_image(mut self, enabled: bool) -> Self {
        self.add_original_image = enabled;
        self
    }

    /// Base64-encoded inpainting mask; white marks the area to repaint.
    pub fn mask(mut self, mask: impl Into<String>) -> Self {
        self.mask = Some(mask.into());
        self
    }

    pub fn legacy(mut self, enabled: bool) -> Self {
        self.legacy = enabled;
        self
    }

    pub fn legacy_v3_extend(mut self, enabled: bool) -> Self {
        self.legacy_v3_extend = enabled;
        self
    }

    /// Validates every field, then normalizes.
    ///
    /// Fails on the first field outside its domain, or when `n_samples`
    /// exceeds the cap for the resolved dimensions.
    pub fn build(self) -> Result<GenerationParams, ParamError> {
        let (preset_width, preset_height) = self.resolution.dimensions();
        let width = self.width.unwrap_or(preset_width);
        let height = self.height.unwrap_or(preset_height);

        check_range("width", f64::from(width), 64.0, 49152.0)?;
        check_range("height", f64::from(height), 64.0, 49152.0)?;
        check_range("n_samples", f64::from(self.n_samples), 1.0, 8.0)?;
        check_range("steps", f64::from(self.steps), 1.0, 50.0)?;
        check_step("scale", self.scale, 0.0, 10.0, 0.1)?;
        check_step("uncond_scale", self.uncond_scale, 0.0, 1.5, 0.05)?;
        check_step("cfg_rescale", self.cfg_rescale, 0.0, 1.0, 0.02)?;
        check_step("controlnet_strength", self.controlnet_strength, 0.1, 2.0, 0.1)?;
        if let Some(strength) = self.strength {
            check_step("strength", strength, 0.01, 0.99, 0.01)?;
        }
        if let Some(noise) = self.noise {
            check_step("noise", noise, 0.0, 0.99, 0.01)?;
        }
        if let Some(value) = self.reference_information_extracted {
            check_step("reference_information_extracted", value, 0.01, 1.0, 0.01)?;
        }
        if let Some(value) = self.reference_strength {
            check_step("reference_strength", value, 0.01, 1.0, 0.01)?;
        }
        let seed = resolve_seed("seed", self.seed)?;
        let extra_noise_seed = resolve_seed("extra_noise_seed", self.extra_noise_seed)?;
        let uc_preset = UcPreset::try_from(self.uc_preset).map_err(ParamError::InvalidUcPreset)?;

        let cap = max_samples(width, height);
        if self.n_samples > cap {
            return Err(ParamError::TooManySamples {
                requested: self.n_samples,
                max: cap,
                width,
                height,
            });
        }

        let mut negative_prompt = self.negative_prompt;
        negative_prompt.push_str(match uc_preset {
            UcPreset::Heavy => UC_HEAVY,
            UcPreset::Light => UC_LIGHT,
            UcPreset::HumanFocus => UC_HUMAN_FOCUS,
            UcPreset::Disabled => "",
        });

        let mut prompt = self.prompt;
        if self.quality_toggle {
            prompt.push_str(QUALITY_TAGS);
        }

        // SMEA samplers are unstable for image-conditioned actions.
        let (sm, sm_dyn) = match self.action {
            Action::Img2Img | Action::Inpaint => (false, false),
            Action::Generate => (self.sm, self.sm_dyn),
        };

        Ok(GenerationParams {
            prompt,
            model: self.model,
            action: self.action,
            resolution: self.resolution,
            parameters: ImageParameters {
                negative_prompt,
                quality_toggle: self.quality_toggle,
                uc_preset,
                width,
                height,
                n_samples: self.n_samples,
                steps: self.steps,
                scale: self.scale,
                dynamic_thresholding: self.dynamic_thresholding,
                seed,
                extra_noise_seed,
                sampler: self.sampler,
                sm,
                sm_dyn,
                uncond_scale: self.uncond_scale,
                cfg_rescale: self.cfg_rescale,
                noise_schedule: self.noise_schedule,
                image: self.image,
                strength: self.strength,
                noise: self.noise,
                controlnet_strength: self.controlnet_strength,
                controlnet_condition: self.controlnet_condition,
                controlnet_model: self.controlnet_model,
                reference_image: self.reference_image,
                reference_information_extracted: self.reference_information_extracted,
                reference_strength: self.reference_strength,
                add_original_image: self.add_original_image,
                mask: self.mask,
                params_version: PARAMS_VERSION,
                legacy: self.legacy,
                legacy_v3_extend: self.legacy_v3_extend,
            },
        })
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ParamError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ParamError::OutOfRange { field, value, min, max })
    }
}

fn check_step(field: &'static str, value: f64, min: f64, max: f64, step: f64) -> Result<(), ParamError> {
    check_range(field, value, min, max)?;
    if is_multiple_of(value, step) {
        Ok(())
    } else {
        Err(ParamError::NotMultipleOf { field, value, step })
    }
}

/// Tolerant multiple check: `6.0 / 0.1` is 59.999..., which still counts.
fn is_multiple_of(value: f64, step: f64) -> bool {
    let ratio = value / step;
    (ratio - ratio.round()).abs() <= 1e-9 * ratio.abs().max(1.0)
}

fn resolve_seed(field: &'static str, seed: Option<u64>) -> Result<u64, ParamError> {
    match seed {
        Some(value) if value == 0 || value > MAX_SEED => Err(ParamError::OutOfRange {
            field,
            value: value as f64,
            min: 1.0,
            max: MAX_SEED as f64,
        }),
        Some(value) => Ok(value),
        None => Ok(rand::thread_rng().gen_range(1..=MAX_SEED)),
    }
}
