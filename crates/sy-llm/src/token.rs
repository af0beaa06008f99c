//! Enterprise bearer-token lifecycle: acquire, cache, refresh.
//!
//! One `TokenManager` owns at most one `EnterpriseToken`. The token is kept in
//! memory only and handed out through `ensure_valid()`, which re-acquires it
//! once it enters the refresh margin or after it was invalidated by a 401.
//!
//! ```text
//! NoToken ──acquire──▶ Valid ──(now ≥ expires_at − margin)──▶ Expiring ──acquire──▶ Valid
//!                        │
//!                        └──401──▶ Invalid ──acquire──▶ Valid
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use tokio::sync::Mutex as AsyncMutex;

use crate::error::{LlmError, LlmResult, truncate};

/// Tokens are refreshed this many seconds before their reported expiry.
pub const REFRESH_MARGIN_SECS: i64 = 300;

/// Source of "now" for expiry math.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: TimeDelta) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|now| *now).unwrap_or_else(|e| *e.into_inner())
    }
}

/// A bearer token and its absolute expiry.
#[derive(Clone)]
pub struct EnterpriseToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl EnterpriseToken {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// The secret itself. Callers put it in an Authorization header and
    /// nowhere else.
    pub fn secret(&self) -> &str {
        &self.token
    }

    /// True while `now` is before the refresh margin.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - TimeDelta::seconds(REFRESH_MARGIN_SECS)
    }
}

impl std::fmt::Debug for EnterpriseToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnterpriseToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Observable lifecycle state of the cached token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// Nothing acquired yet.
    NoToken,
    /// Cached token can be used as-is.
    Valid,
    /// Inside the refresh margin (or past expiry); next use re-acquires.
    Expiring,
    /// Rejected by the chat endpoint; next use re-acquires.
    Invalid,
}

impl TokenState {
    pub fn needs_refresh(self) -> bool {
        !matches!(self, TokenState::Valid)
    }
}

/// OAuth2 client-credentials parameters.
#[derive(Clone)]
pub struct ClientCredentials {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub resource: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("resource", &self.resource)
            .finish()
    }
}

enum Slot {
    Empty,
    Held(EnterpriseToken),
    Invalidated,
}

/// Token endpoint response (only fields we need).
#[derive(Deserialize)]
struct TokenResponse {
    #[serde(alias = "token")]
    access_token: Option<String>,
    expires_in: Option<serde_json::Value>,
}

/// Owns and refreshes the enterprise bearer token.
///
/// The cache is behind an async mutex held for the whole check-then-acquire
/// sequence, so concurrent callers never refresh twice.
pub struct TokenManager {
    client: reqwest::Client,
    credentials: ClientCredentials,
    timeout_secs: u64,
    clock: Arc<dyn Clock>,
    slot: AsyncMutex<Slot>,
}

impl TokenManager {
    pub fn new(credentials: ClientCredentials, timeout_secs: u64) -> LlmResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LlmError::TokenAcquisition(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            credentials,
            timeout_secs,
            clock: Arc::new(SystemClock),
            slot: AsyncMutex::new(Slot::Empty),
        })
    }

    /// Replace the clock used for expiry math.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Start with a pre-seeded token instead of an empty cache.
    pub fn with_token(mut self, token: EnterpriseToken) -> Self {
        self.slot = AsyncMutex::new(Slot::Held(token));
        self
    }

    pub async fn state(&self) -> TokenState {
        let now = self.clock.now();
        match &*self.slot.lock().await {
            Slot::Empty => TokenState::NoToken,
            Slot::Invalidated => TokenState::Invalid,
            Slot::Held(token) if token.is_valid_at(now) => TokenState::Valid,
            Slot::Held(_) => TokenState::Expiring,
        }
    }

    /// Expiry of the cached token, if one is held.
    pub async fn expires_at(&self) -> Option<DateTime<Utc>> {
        match &*self.slot.lock().await {
            Slot::Held(token) => Some(token.expires_at()),
            _ => None,
        }
    }

    /// Return the cached token if still valid, otherwise acquire a new one.
    pub async fn ensure_valid(&self) -> LlmResult<String> {
        let mut slot = self.slot.lock().await;
        if let Slot::Held(token) = &*slot
            && token.is_valid_at(self.clock.now())
        {
            tracing::debug!(expires_at = %token.expires_at(), "using cached enterprise token");
            return Ok(token.secret().to_string());
        }
        self.acquire_into(&mut slot).await
    }

    /// Unconditionally run the client-credentials exchange and cache the result.
    pub async fn acquire(&self) -> LlmResult<String> {
        let mut slot = self.slot.lock().await;
        self.acquire_into(&mut slot).await
    }

    /// Drop the cached token after the chat endpoint rejected it.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = Slot::Invalidated;
        tracing::info!("enterprise token invalidated");
    }

    async fn acquire_into(&self, slot: &mut Slot) -> LlmResult<String> {
        tracing::debug!(token_url = %self.credentials.token_url, "requesting enterprise token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("resource", self.credentials.resource.as_str()),
        ];

        let response = self
            .client
            .post(&self.credentials.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    format!("token endpoint timed out after {}s", self.timeout_secs)
                } else {
                    format!("failed to connect to token endpoint: {e}")
                };
                LlmError::TokenAcquisition(reason)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::TokenAcquisition(format!(
                "token endpoint returned HTTP {}: {}",
                status.as_u16(),
                truncate(&body, 200)
            )));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            LlmError::TokenAcquisition(format!("token response is not JSON: {e}"))
        })?;
        let keys = body
            .as_object()
            .map(|o| o.keys().cloned().collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        let parsed: TokenResponse = serde_json::from_value(body).map_err(|e| {
            LlmError::TokenAcquisition(format!("unexpected token response shape: {e}"))
        })?;

        let Some(access_token) = parsed.access_token.filter(|t| !t.is_empty()) else {
            return Err(LlmError::TokenAcquisition(format!(
                "no access_token in token response (keys: {keys})"
            )));
        };
        let Some(expires_in) = parsed.expires_in.as_ref().and_then(parse_seconds) else {
            return Err(LlmError::TokenAcquisition(format!(
                "no usable expires_in in token response (keys: {keys})"
            )));
        };

        let Some(expires_at) = TimeDelta::try_seconds(expires_in)
            .and_then(|delta| self.clock.now().checked_add_signed(delta))
        else {
            return Err(LlmError::TokenAcquisition(format!(
                "expires_in out of range in token response: {expires_in}"
            )));
        };
        *slot = Slot::Held(EnterpriseToken::new(access_token.clone(), expires_at));
        tracing::info!(%expires_at, expires_in, "enterprise token acquired");
        Ok(access_token)
    }
}

/// Accept `3600` or `"3600"`; reject non-positive values.
fn parse_seconds(value: &serde_json::Value) -> Option<i64> {
    let secs = match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    (secs > 0).then_some(secs)
}
