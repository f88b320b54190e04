//! Body of `POST /ai/generate-image`.
//!
//! ```json
//! {
//!   "input": "1girl, best quality",
//!   "model": "nai-diffusion-3",
//!   "action": "generate",
//!   "parameters": { "width": 1024, "height": 1024, "n_samples": 1, ... }
//! }
//! ```
//!
//! The prompt, model and action travel at the top level; everything else sits
//! in the nested `parameters` object. Unset optional parameters are omitted.

use serde::{Deserialize, Serialize};

use crate::types::{Action, Controlnet, Model, NoiseSchedule, Sampler, UcPreset};

/// Request body of the generation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateImageRequest {
    /// Prompt text
    pub input: String,
    pub model: Model,
    pub action: Action,
    pub parameters: ImageParameters,
}

/// Nested `parameters` object.
///
/// Field names match the service exactly, including its two camelCase keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageParameters {
    pub negative_prompt: String,
    #[serde(rename = "qualityToggle")]
    pub quality_toggle: bool,
    #[serde(rename = "ucPreset")]
    pub uc_preset: UcPreset,

    pub width: u32,
    pub height: u32,
    pub n_samples: u32,

    pub steps: u32,
    pub scale: f64,
    pub dynamic_thresholding: bool,
    pub seed: u64,
    pub extra_noise_seed: u64,
    pub sampler: Sampler,
    pub sm: bool,
    pub sm_dyn: bool,
    pub uncond_scale: f64,
    pub cfg_rescale: f64,
    pub noise_schedule: NoiseSchedule,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise: Option<f64>,
    pub controlnet_strength: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controlnet_condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controlnet_model: Option<Controlnet>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_information_extracted: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_strength: Option<f64>,

    pub add_original_image: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<String>,

    pub params_version: u8,
    pub legacy: bool,
    pub legacy_v3_extend: bool,
}
