//! Authenticated session lifecycle.
//!
//! A [`Session`] owns the HTTP transport and bearer token. It moves through
//! [`SessionState`]:
//!
//! ```text
//! Uninitialized -> Authenticating -> Running -> Closed
//!                        ^                         |
//!                        +------- lazy re-init ----+
//! ```
//!
//! Logins are serialized by an async init lock, so concurrent callers that
//! find the session down share a single login. Every session-dependent call
//! goes through [`Session::ensure_running`], which returns a snapshot of the
//! transport ([`TransportHandle`]) the call then uses on its own.
//!
//! Closing signals a watch channel; requests still in flight on the closed
//! transport fail with [`Error::TransportClosed`]. A login that is still in
//! flight when [`Session::close`] runs is discarded and fails the same way.

use std::sync::{Arc, Weak};

use nai_protocol::{Endpoint, JSON_CONTENT_TYPE, LoginRequest, LoginResponse};
use parking_lot::Mutex;
use reqwest::StatusCode;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, SessionOptions};
use crate::credentials::{Credentials, encode_access_key};
use crate::error::{Error, Result, classify_status};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Never logged in.
    Uninitialized,
    /// Login in progress.
    Authenticating,
    /// Logged in; requests may be sent.
    Running,
    /// Closed explicitly, by the idle timer, or after an authentication failure.
    Closed,
}

/// Live transport owned by the session.
struct Transport {
    http: reqwest::Client,
    token: Arc<str>,
    epoch: u64,
    shutdown: watch::Sender<bool>,
}

impl Transport {
    fn handle(&self) -> TransportHandle {
        TransportHandle {
            http: self.http.clone(),
            token: Arc::clone(&self.token),
            epoch: self.epoch,
            shutdown: self.shutdown.subscribe(),
        }
    }

    fn close(self) {
        self.shutdown.send_replace(true);
    }
}

/// Per-call snapshot of the session transport.
pub(crate) struct TransportHandle {
    http: reqwest::Client,
    token: Arc<str>,
    epoch: u64,
    shutdown: watch::Receiver<bool>,
}

/// Fully read response of an authenticated request.
#[derive(Debug)]
pub(crate) struct RawResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl TransportHandle {
    /// Identifies the transport this handle was taken from.
    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    /// POSTs `body` as JSON with the bearer token and reads the whole response.
    ///
    /// Resolves to [`Error::TransportClosed`] as soon as the session closes
    /// the transport, even mid-body.
    pub(crate) async fn post_json<T>(mut self, url: &str, body: &T, accept: &'static str) -> Result<RawResponse>
    where
        T: Serialize + ?Sized,
    {
        let request = self
            .http
            .post(url)
            .bearer_auth(&*self.token)
            .header(header::ACCEPT, accept)
            .json(body);

        let exchange = async move {
            let response = request.send().await?;
            let status = response.status();
            let content_type = response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            let body = response.bytes().await?.to_vec();
            Ok::<_, Error>(RawResponse {
                status,
                content_type,
                body,
            })
        };

        tokio::select! {
            result = exchange => result,
            _ = self.shutdown.wait_for(|closed| *closed) => Err(Error::TransportClosed),
        }
    }
}

struct SessionInner {
    state: SessionState,
    options: SessionOptions,
    transport: Option<Transport>,
    next_epoch: u64,
    /// Bumped by every explicit close.
    closes: u64,
}

struct IdleTimer {
    generation: u64,
    deadline: Instant,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct IdleState {
    generation: u64,
    timer: Option<IdleTimer>,
}

/// Authenticated session shared by every clone of a client.
pub(crate) struct Session {
    credentials: Credentials,
    config: ClientConfig,
    inner: Mutex<SessionInner>,
    init_lock: tokio::sync::Mutex<()>,
    idle: Mutex<IdleState>,
}

impl Session {
    pub(crate) fn new(credentials: Credentials, config: ClientConfig) -> Self {
        Self {
            credentials,
            config,
            inner: Mutex::new(SessionInner {
                state: SessionState::Uninitialized,
                options: SessionOptions::default(),
                transport: None,
                next_epoch: 0,
                closes: 0,
            }),
            init_lock: tokio::sync::Mutex::new(()),
            idle: Mutex::new(IdleState::default()),
        }
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    pub(crate) fn options(&self) -> SessionOptions {
        self.inner.lock().options.clone()
    }

    /// Logs in with `options`, replacing any running transport.
    pub(crate) async fn init(self: &Arc<Self>, options: SessionOptions) -> Result<()> {
        let _guard = self.init_lock.lock().await;
        self.init_locked(options).await
    }

    /// Caller must hold `init_lock`.
    async fn init_locked(self: &Arc<Self>, options: SessionOptions) -> Result<()> {
        let (previous, closes) = {
            let mut inner = self.inner.lock();
            inner.options = options.clone();
            inner.state = SessionState::Authenticating;
            (inner.transport.take(), inner.closes)
        };
        if let Some(previous) = previous {
            debug!(target = "nai.session", epoch = previous.epoch, "replacing running transport");
            previous.close();
        }
        self.cancel_idle_timer();

        let attempt = async {
            let http = build_http(&options, &self.config)?;
            let token = login(&http, self.config.login_url(), &self.credentials).await?;
            Ok::<_, Error>((http, token))
        };

        match attempt.await {
            Ok((http, token)) => {
                let epoch = {
                    let mut inner = self.inner.lock();
                    if inner.closes != closes {
                        inner.state = SessionState::Closed;
                        drop(inner);
                        debug!(target = "nai.session", "session closed during login, discarding token");
                        return Err(Error::TransportClosed);
                    }
                    inner.next_epoch += 1;
                    let epoch = inner.next_epoch;
                    let (shutdown, _) = watch::channel(false);
                    inner.transport = Some(Transport {
                        http,
                        token: Arc::from(token),
                        epoch,
                        shutdown,
                    });
                    inner.state = SessionState::Running;
                    epoch
                };
                info!(
                    target = "nai.session",
                    user = self.credentials.username(),
                    epoch,
                    auto_close = options.auto_close,
                    "session running"
                );
                if options.auto_close {
                    self.reset_idle_timer();
                }
                Ok(())
            }
            Err(err) => {
                self.inner.lock().state = SessionState::Closed;
                warn!(target = "nai.session", error = %err, "login failed");
                Err(err)
            }
        }
    }

    /// Returns a transport snapshot, logging in first when the session is down.
    ///
    /// Concurrent callers share one login. A failed login is reported as
    /// [`Error::SessionUnavailable`] naming `operation`.
    pub(crate) async fn ensure_running(self: &Arc<Self>, operation: &'static str) -> Result<TransportHandle> {
        if let Some(handle) = self.running_handle() {
            return Ok(handle);
        }

        let _guard = self.init_lock.lock().await;
        if let Some(handle) = self.running_handle() {
            return Ok(handle);
        }

        debug!(target = "nai.session", operation, state = ?self.state(), "session not running, logging in");
        let options = self.options();
        self.init_locked(options).await.map_err(|source| Error::SessionUnavailable {
            operation,
            source: Box::new(source),
        })?;

        self.running_handle().ok_or(Error::TransportClosed)
    }

    fn running_handle(&self) -> Option<TransportHandle> {
        let inner = self.inner.lock();
        match (inner.state, &inner.transport) {
            (SessionState::Running, Some(transport)) => Some(transport.handle()),
            _ => None,
        }
    }

    /// Flips the session to `Closed` after the service rejected its token.
    ///
    /// Ignored when the rejection came from an already replaced transport.
    /// The transport is kept; the next login replaces it.
    pub(crate) fn mark_unauthenticated(&self, epoch: u64) {
        let mut inner = self.inner.lock();
        let current = inner.transport.as_ref().map(|t| t.epoch);
        if inner.state == SessionState::Running && current == Some(epoch) {
            inner.state = SessionState::Closed;
            drop(inner);
            warn!(target = "nai.session", epoch, "token rejected, session closed");
        }
    }

    /// Waits `delay` (or the configured close delay), then closes the session.
    ///
    /// A login still in flight at that point fails instead of reopening it.
    pub(crate) async fn close(&self, delay: Option<Duration>) {
        let delay = delay.unwrap_or_else(|| self.inner.lock().options.close_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.cancel_idle_timer();
        self.inner.lock().closes += 1;
        self.shutdown("close");
    }

    fn shutdown(&self, reason: &'static str) {
        let transport = {
            let mut inner = self.inner.lock();
            inner.state = SessionState::Closed;
            inner.transport.take()
        };
        if let Some(transport) = transport {
            let epoch = transport.epoch;
            transport.close();
            info!(target = "nai.session", reason, epoch, "session closed");
        }
    }

    /// Re-arms the idle close with the configured delay.
    ///
    /// Any pending close is cancelled first, under the same lock the timer
    /// checks when it fires.
    pub(crate) fn reset_idle_timer(self: &Arc<Self>) {
        let delay = self.inner.lock().options.close_delay;
        let mut idle = self.idle.lock();
        if let Some(previous) = idle.timer.take() {
            previous.handle.abort();
        }
        idle.generation += 1;
        let generation = idle.generation;
        let deadline = Instant::now() + delay;

        let session: Weak<Session> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(session) = session.upgrade() {
                session.expire_idle(generation);
            }
        });

        idle.timer = Some(IdleTimer {
            generation,
            deadline,
            handle,
        });
    }

    fn cancel_idle_timer(&self) {
        if let Some(timer) = self.idle.lock().timer.take() {
            timer.handle.abort();
        }
    }

    fn expire_idle(&self, generation: u64) {
        let mut idle = self.idle.lock();
        if idle.timer.as_ref().map(|t| t.generation) != Some(generation) {
            return;
        }
        idle.timer = None;
        debug!(target = "nai.session", generation, "idle timeout reached");
        // Shut down while still holding the idle lock so a concurrent reset
        // cannot arm a timer for a session that is about to close.
        self.shutdown("idle");
    }

    /// Deadline of the pending idle close, if one is armed.
    pub(crate) fn pending_close_at(&self) -> Option<Instant> {
        self.idle.lock().timer.as_ref().map(|t| t.deadline)
    }

    /// Logs in on a throw-away transport and returns the token.
    pub(crate) async fn fetch_token(&self) -> Result<String> {
        let http = build_http(&self.options(), &self.config)?;
        login(&http, self.config.login_url(), &self.credentials).await
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(timer) = self.idle.get_mut().timer.take() {
            timer.handle.abort();
        }
    }
}

fn build_http(options: &SessionOptions, config: &ClientConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    headers.insert(header::ORIGIN, HeaderValue::from_static(nai_protocol::ORIGIN));
    headers.insert(header::REFERER, HeaderValue::from_static(nai_protocol::ORIGIN));
    headers.insert(header::USER_AGENT, HeaderValue::from_static(nai_protocol::USER_AGENT));

    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .timeout(options.timeout);
    if let Some(proxy) = config.proxy_url() {
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }
    Ok(builder.build()?)
}

async fn login(http: &reqwest::Client, base_url: &str, credentials: &Credentials) -> Result<String> {
    let key = encode_access_key(credentials)?;
    let url = format!("{base_url}{}", Endpoint::Login.path());
    debug!(target = "nai.session", user = credentials.username(), "logging in");

    let response = http.post(&url).json(&LoginRequest { key }).send().await?;
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(classify_status(status, &text));
    }

    let body: LoginResponse = serde_json::from_str(&text)?;
    Ok(body.access_token)
}
