//! Wire types for the NovelAI image generation API.
//!
//! This crate contains the serde-serializable types exchanged with the
//! service over HTTPS, plus the closed sets of literal values the service
//! accepts (hosts, models, actions, samplers, ...). These types represent the
//! "protocol layer": the shapes of data as they appear on the wire.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization and literal lookup
//! * Closed: every category is an exhaustively matched enum carrying its value
//! * Stable: Changes only when the wire protocol changes
//!
//! Validation, normalization and pricing are built on top of these types in `nai-rs`.

pub mod auth;
pub mod host;
pub mod image;
pub mod types;

pub use auth::*;
pub use host::*;
pub use image::*;
pub use types::*;
