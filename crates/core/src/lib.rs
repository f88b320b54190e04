//! Async client for the NovelAI image generation API.
//!
//! The crate is organized bottom-up:
//!
//! * [`credentials`] derives the login access key from a username/password
//! * [`params`] validates and normalizes generation parameters and estimates cost
//! * [`archive`] decodes the zip archive the service answers with
//! * the session layer keeps one authenticated transport alive, re-logging in
//!   lazily and closing itself when idle
//! * [`NaiClient`] ties them together
//!
//! Wire types live in `nai-protocol` and are re-exported here.
//!
//! # Example
//!
//! ```ignore
//! use nai::{Credentials, GenerationParams, Host, NaiClient, SessionOptions};
//!
//! let client = NaiClient::new(Credentials::new("user@example.com", "password"));
//! client.init(SessionOptions::default()).await?;
//!
//! let params = GenerationParams::builder("a lighthouse at dusk").n_samples(2).build()?;
//! let assets = client.generate(&params, Host::Api, false, false).await?;
//! ```

pub mod archive;
mod asset;
mod client;
mod config;
pub mod credentials;
mod error;
pub mod params;
mod session;

pub use asset::GeneratedAsset;
pub use client::NaiClient;
pub use config::{ClientConfig, DEFAULT_CLOSE_DELAY, DEFAULT_TIMEOUT, SessionOptions};
pub use credentials::{Credentials, encode_access_key};
pub use error::{Error, ErrorKind, Result};
pub use params::{GenerationParams, GenerationParamsBuilder, MAX_SEED, ParamError, max_samples};
pub use session::SessionState;

pub use nai_protocol::{Action, Controlnet, Host, Model, NoiseSchedule, Resolution, Sampler, UcPreset};
