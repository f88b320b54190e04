//! Account credentials and access-key derivation.
//!
//! The service never sees the password. Instead the client derives a one-time
//! access key the server can recompute on its side:
//!
//! 1. salt = BLAKE2b-128(password[..6] + username + "novelai_data_access_key")
//! 2. raw = Argon2id(password, salt, t=2, m=1953 KiB, p=1, len=64)
//! 3. key = first 64 characters of base64url(raw)
//!
//! Any deviation in these parameters yields a key the server silently refuses.

use std::fmt;

use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use blake2::Blake2b;
use blake2::digest::Digest;
use blake2::digest::consts::U16;

use crate::error::{Error, Result};

const DOMAIN_SEPARATOR: &str = "novelai_data_access_key";
const ARGON2_TIME_COST: u32 = 2;
const ARGON2_MEMORY_KIB: u32 = 2_000_000 / 1024;
const ARGON2_PARALLELISM: u32 = 1;
const ARGON2_OUTPUT_LEN: usize = 64;
const ACCESS_KEY_LEN: usize = 64;

type Blake2b128 = Blake2b<U16>;

/// Username and password of a service account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credentials(username={})", self.username)
    }
}

/// Derives the login access key for `credentials`.
///
/// Deterministic: the same credentials always produce the same key.
pub fn encode_access_key(credentials: &Credentials) -> Result<String> {
    let prefix: String = credentials.password.chars().take(6).collect();
    let pre_salt = format!("{prefix}{}{DOMAIN_SEPARATOR}", credentials.username);
    let salt = Blake2b128::digest(pre_salt.as_bytes());

    let params = Params::new(
        ARGON2_MEMORY_KIB,
        ARGON2_TIME_COST,
        ARGON2_PARALLELISM,
        Some(ARGON2_OUTPUT_LEN),
    )
    .map_err(|e| Error::Credential(e.to_string()))?;
    let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut raw = [0u8; ARGON2_OUTPUT_LEN];
    argon
        .hash_password_into(credentials.password.as_bytes(), &salt, &mut raw)
        .map_err(|e| Error::Credential(e.to_string()))?;

    let mut key = URL_SAFE.encode(raw);
    key.truncate(ACCESS_KEY_LEN);
    Ok(key)
}
