//! Session bootstrap: session token → jwt exchange and header assembly.
//!
//! The content API authenticates every request with a short-lived jwt obtained
//! from the long-lived session token. The exchange happens once at startup;
//! the resulting headers are baked into a shared `reqwest::Client` reused for
//! the whole run.

use std::time::Duration;

use rand::seq::SliceRandom;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use bookmirror_shared::{MirrorError, Result};

/// Default timeout in seconds for every request on the shared client.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Pool of browser user-agent strings; one is picked per run so the mirror
/// does not advertise itself with a constant fingerprint.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:125.0) Gecko/20100101 Firefox/125.0",
];

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Inputs for the session bootstrap.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Base URL of the auth API (jwt exchange endpoint).
    pub auth_base_url: String,
    /// `origin` header value.
    pub origin: String,
    /// `referer` header value.
    pub referer: String,
    /// The long-lived session credential.
    pub session_token: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl SessionOptions {
    /// Options with the default timeout.
    pub fn new(
        auth_base_url: impl Into<String>,
        origin: impl Into<String>,
        referer: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        Self {
            auth_base_url: auth_base_url.into(),
            origin: origin.into(),
            referer: referer.into(),
            session_token: session_token.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Process-wide authorization state: the authenticated shared client.
///
/// Created once before the walk begins, held for the whole run. No refresh or
/// rotation — a run outliving the jwt fails with per-leaf network errors.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
}

/// Shape of the jwt exchange response.
#[derive(Debug, Deserialize)]
struct JwtResponse {
    jwt: String,
}

impl Session {
    /// Exchange the session token for a jwt and build the shared client with
    /// the full outbound header set.
    #[instrument(skip_all, fields(auth_base = %opts.auth_base_url))]
    pub async fn bootstrap(opts: &SessionOptions) -> Result<Self> {
        let jwt = fetch_jwt(opts).await?;
        debug!(jwt_len = jwt.len(), "jwt obtained");

        let user_agent = *USER_AGENTS
            .choose(&mut rand::thread_rng())
            .expect("user-agent pool is non-empty");

        let cookie = format!(
            "auth_session_token={}; user_jwt={jwt};",
            opts.session_token
        );

        let mut headers = HeaderMap::new();
        headers.insert("Cookie", header_value(&cookie)?);
        headers.insert("origin", header_value(&opts.origin)?);
        headers.insert("referer", header_value(&opts.referer)?);
        headers.insert("user-jwt", header_value(&jwt)?);

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| MirrorError::Network(format!("failed to build HTTP client: {e}")))?;

        info!("session established");

        Ok(Self { client })
    }

    /// The shared authenticated client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Perform the jwt exchange request on a bare client.
async fn fetch_jwt(opts: &SessionOptions) -> Result<String> {
    let base = opts.auth_base_url.trim_end_matches('/');
    let url = format!(
        "{base}/api/v3/auth/user_jwt?session_token={}",
        opts.session_token
    );

    let client = Client::builder()
        .timeout(Duration::from_secs(opts.timeout_secs))
        .build()
        .map_err(|e| MirrorError::Network(format!("failed to build HTTP client: {e}")))?;

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| MirrorError::Network(format!("jwt exchange: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(MirrorError::Network(format!("jwt exchange: HTTP {status}")));
    }

    let body: JwtResponse = response
        .json()
        .await
        .map_err(|e| MirrorError::Decode(format!("jwt exchange: {e}")))?;

    Ok(body.jwt)
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| MirrorError::config(format!("invalid header value: {e}")))
}
