//! Public client: session control and image generation.

use std::sync::Arc;
use std::time::Duration;

use nai_protocol::{Endpoint, Host};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::archive;
use crate::asset::GeneratedAsset;
use crate::config::{ClientConfig, SessionOptions};
use crate::credentials::Credentials;
use crate::error::{Error, Result, classify_status};
use crate::params::GenerationParams;
use crate::session::{Session, SessionState};

/// Async client for the image generation service.
///
/// Cheap to clone; clones share one session. The session logs in lazily on
/// the first request, or explicitly through [`init`](Self::init).
///
/// ```ignore
/// let client = NaiClient::new(Credentials::new("user@example.com", "password"));
/// client.init(SessionOptions::default()).await?;
///
/// let params = GenerationParams::builder("1girl, cherry blossoms").build()?;
/// for asset in client.generate(&params, Host::Api, true, false).await? {
///     std::fs::write(asset.filename(), asset.data())?;
/// }
/// ```
#[derive(Clone)]
pub struct NaiClient {
    session: Arc<Session>,
}

impl NaiClient {
    /// Client for the production service.
    pub fn new(credentials: Credentials) -> Self {
        Self::with_config(credentials, ClientConfig::default())
    }

    pub fn with_config(credentials: Credentials, config: ClientConfig) -> Self {
        Self {
            session: Arc::new(Session::new(credentials, config)),
        }
    }

    /// Logs in, replacing any running session.
    ///
    /// `options` are kept for later automatic re-logins.
    pub async fn init(&self, options: SessionOptions) -> Result<()> {
        self.session.init(options).await
    }

    /// Closes the session after `delay`, or after the configured close delay
    /// when `None`.
    pub async fn close(&self, delay: Option<Duration>) {
        self.session.close(delay).await
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn is_running(&self) -> bool {
        self.state() == SessionState::Running
    }

    /// When the idle timer will close the session, if armed.
    pub fn pending_close_at(&self) -> Option<Instant> {
        self.session.pending_close_at()
    }

    /// Logs in on a separate connection and returns the bearer token.
    ///
    /// The session itself is left untouched.
    pub async fn access_token(&self) -> Result<String> {
        self.session.fetch_token().await
    }

    /// Generates images on `host`.
    ///
    /// Logs in first when the session is not running. With `verbose` the
    /// estimated cost is logged at info level. A 401/402 answer closes the
    /// session so the next call logs in again.
    pub async fn generate(
        &self,
        params: &GenerationParams,
        host: Host,
        verbose: bool,
        is_opus: bool,
    ) -> Result<Vec<GeneratedAsset>> {
        let transport = self.session.ensure_running("generate").await?;
        let options = self.session.options();
        if options.auto_close {
            self.session.reset_idle_timer();
        }

        if verbose {
            info!(
                target = "nai",
                host = %host,
                cost = params.calculate_cost(is_opus),
                n_samples = params.n_samples(),
                width = params.width(),
                height = params.height(),
                "generating images"
            );
        }

        let url = format!("{}{}", self.session.config().url_for(host), Endpoint::GenerateImage.path());
        let epoch = transport.epoch();
        let response = transport.post_json(&url, &params.to_request(), host.accept()).await?;

        if !response.status.is_success() {
            let err = classify_status(response.status, &String::from_utf8_lossy(&response.body));
            debug!(target = "nai", host = %host, status = response.status.as_u16(), error = %err, "generation rejected");
            if err.is_authentication() {
                self.session.mark_unauthenticated(epoch);
            }
            return Err(err);
        }

        let content_type = response.content_type.unwrap_or_default();
        let media_type = content_type.split(';').next().unwrap_or_default().trim();
        if !media_type.eq_ignore_ascii_case(host.accept()) {
            return Err(Error::UnexpectedContentType {
                expected: host.accept(),
                actual: content_type,
            });
        }

        let entries = archive::decode(&response.body)?;
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let shared = Arc::new(params.clone());
        let assets: Vec<GeneratedAsset> = entries
            .into_iter()
            .zip(0u32..)
            .map(|(entry, index)| {
                GeneratedAsset::new(
                    format!("{timestamp}_{}_p{index}.png", host.id()),
                    entry.name,
                    index,
                    entry.data,
                    Arc::clone(&shared),
                )
            })
            .collect();

        debug!(target = "nai", host = %host, assets = assets.len(), "generation complete");

        if options.auto_close {
            self.session.reset_idle_timer();
        }
        Ok(assets)
    }
}

impl std::fmt::Debug for NaiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NaiClient").field("state", &self.state()).finish_non_exhaustive()
    }
}
