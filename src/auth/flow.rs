//! Browser sign-in with a loopback redirect (OAuth 2.0 for installed apps)
//!
//! The flow is an explicit state machine:
//!
//! ```text
//! Idle -> AwaitingBrowser -> PollingForToken -> Authenticated
//!                 |                 |---------> Cancelled
//!                 |                 `---------> TimedOut
//!                 `---------------------------> Cancelled   (browser could not open)
//! ```
//!
//! 1. Generate a PKCE challenge and a random `state` nonce.
//! 2. Bind a local TCP listener for the redirect callback.
//! 3. Build the authorization URL and hand it to the [`BrowserLauncher`].
//! 4. Wait for the redirect, bounded by the configured timeout and by the
//!    caller's cancellation token. The listener is dropped on every exit.
//! 5. Validate `state` and exchange `code` for tokens.
//!
//! # References
//!
//! - RFC 8252 OAuth 2.0 for Native Apps <https://www.rfc-editor.org/rfc/rfc8252>
//! - RFC 7636 PKCE <https://www.rfc-editor.org/rfc/rfc7636>

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::Engine as _;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::auth::pkce;
use crate::auth::token_store::OAuthToken;
use crate::config::GDriveConfig;
use crate::error::{AuthFailure, ChatVaultError, Result};

// ---------------------------------------------------------------------------
// OAuthFlowConfig
// ---------------------------------------------------------------------------

/// Parameters of the installed-application authorization flow.
#[derive(Debug, Clone)]
pub struct OAuthFlowConfig {
    /// OAuth client identifier.
    pub client_id: String,

    /// Client secret; Google issues one to installed apps and expects it at
    /// the token endpoint even though it is not confidential.
    pub client_secret: Option<String>,

    /// Space-separated scopes to request.
    pub scope: String,

    /// Authorization endpoint the browser is sent to.
    pub auth_endpoint: Url,

    /// Token endpoint for code exchange and refresh.
    pub token_endpoint: Url,

    /// Local port for the redirect listener; `0` lets the OS pick.
    pub redirect_port: u16,

    /// Whether to launch the browser; when false the URL is only printed.
    pub open_browser: bool,

    /// Upper bound on the wait for the redirect.
    pub timeout: Duration,
}

impl OAuthFlowConfig {
    /// Builds the flow configuration from the Google Drive settings.
    ///
    /// # Errors
    ///
    /// Returns [`ChatVaultError::Config`] when an endpoint is not a valid URL.
    pub fn from_gdrive(config: &GDriveConfig) -> Result<Self> {
        let parse = |field: &str, value: &str| {
            Url::parse(value).map_err(|e| {
                ChatVaultError::Config(format!("store.gdrive.{} is not a valid URL: {}", field, e))
            })
        };

        Ok(Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scope: config.scope.clone(),
            auth_endpoint: parse("auth_endpoint", &config.auth_endpoint)?,
            token_endpoint: parse("token_endpoint", &config.token_endpoint)?,
            redirect_port: config.redirect_port,
            open_browser: config.open_browser,
            timeout: Duration::from_secs(config.auth_timeout_seconds),
        })
    }
}

// ---------------------------------------------------------------------------
// FlowState
// ---------------------------------------------------------------------------

/// Position of an [`OAuthFlow`] in its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Nothing started yet.
    Idle,
    /// Authorization URL built, browser being opened.
    AwaitingBrowser,
    /// Waiting for the redirect to reach the loopback listener.
    PollingForToken,
    /// Token obtained.
    Authenticated,
    /// User denied, browser unavailable, or the caller cancelled.
    Cancelled,
    /// No redirect arrived within the timeout.
    TimedOut,
}

impl FlowState {
    /// Terminal states end the flow; the listener is gone once reached.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Authenticated | Self::Cancelled | Self::TimedOut)
    }
}

// ---------------------------------------------------------------------------
// BrowserLauncher
// ---------------------------------------------------------------------------

/// Opens the authorization URL for the user.
pub trait BrowserLauncher: Send + Sync {
    /// Opens `url`; an error means the user never saw the consent page.
    fn open(&self, url: &str) -> std::io::Result<()>;
}

/// Launches the platform's default browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        #[cfg(target_os = "macos")]
        let mut command = std::process::Command::new("open");
        #[cfg(target_os = "linux")]
        let mut command = std::process::Command::new("xdg-open");
        #[cfg(target_os = "windows")]
        let mut command = {
            let mut c = std::process::Command::new("cmd");
            c.args(["/C", "start", ""]);
            c
        };
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            let _ = url;
            return Err(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "no browser launcher for this platform",
            ));
        }

        #[cfg(any(target_os = "macos", target_os = "linux", target_os = "windows"))]
        {
            command.arg(url).spawn().map(|_| ())
        }
    }
}

// ---------------------------------------------------------------------------
// Token endpoint response (raw deserialization)
// ---------------------------------------------------------------------------

#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl TokenResponse {
    fn into_oauth_token(self) -> OAuthToken {
        let expires_at = self.expires_in.map(|secs| {
            chrono::Utc::now() + chrono::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
        });

        OAuthToken {
            access_token: self.access_token,
            token_type: self.token_type,
            expires_at,
            refresh_token: self.refresh_token,
            scope: self.scope,
        }
    }
}

/// Outcome of one redirect hitting the listener.
#[derive(Debug, PartialEq, Eq)]
enum Callback {
    Code(String),
    Denied(String),
    /// Not the callback path (e.g. `/favicon.ico`); keep waiting.
    Ignored,
}

// ---------------------------------------------------------------------------
// OAuthFlow
// ---------------------------------------------------------------------------

/// Drives one sign-in attempt.
///
/// # Examples
///
/// ```no_run
/// use chatvault::auth::flow::{OAuthFlow, OAuthFlowConfig};
/// use chatvault::config::GDriveConfig;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> chatvault::error::Result<()> {
/// let mut gdrive = GDriveConfig::default();
/// gdrive.client_id = "client.apps.googleusercontent.com".to_string();
/// let flow = OAuthFlow::new(reqwest::Client::new(), OAuthFlowConfig::from_gdrive(&gdrive)?);
/// let token = flow.authorize(&CancellationToken::new()).await?;
/// println!("signed in, expires at {:?}", token.expires_at);
/// # Ok(())
/// # }
/// ```
pub struct OAuthFlow {
    http: reqwest::Client,
    config: OAuthFlowConfig,
    launcher: Arc<dyn BrowserLauncher>,
    state: Mutex<FlowState>,
}

impl OAuthFlow {
    /// Creates a flow that opens the system browser.
    pub fn new(http: reqwest::Client, config: OAuthFlowConfig) -> Self {
        Self::with_launcher(http, config, Arc::new(SystemBrowser))
    }

    /// Creates a flow with a custom browser launcher.
    pub fn with_launcher(
        http: reqwest::Client,
        config: OAuthFlowConfig,
        launcher: Arc<dyn BrowserLauncher>,
    ) -> Self {
        Self {
            http,
            config,
            launcher,
            state: Mutex::new(FlowState::Idle),
        }
    }

    /// Current state of the flow.
    pub fn state(&self) -> FlowState {
        *self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn transition(&self, next: FlowState) {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        tracing::debug!(from = ?*state, to = ?next, "oauth flow transition");
        *state = next;
    }

    /// Moves to a terminal state and builds the matching error.
    fn fail(&self, terminal: FlowState, reason: AuthFailure, message: String) -> anyhow::Error {
        self.transition(terminal);
        ChatVaultError::auth(reason, message).into()
    }

    /// Runs the full sign-in flow.
    ///
    /// # Errors
    ///
    /// Returns [`ChatVaultError::Auth`] with:
    /// - `popup_blocked` when the browser (or the redirect listener) cannot
    ///   be opened,
    /// - `user_cancelled` when consent is denied or `cancel` fires,
    /// - `timeout` when no redirect arrives in time,
    /// - `token_invalid` on a state mismatch or a rejected code exchange.
    pub async fn authorize(&self, cancel: &CancellationToken) -> Result<OAuthToken> {
        if self.state() != FlowState::Idle {
            return Err(ChatVaultError::auth(
                AuthFailure::TokenInvalid,
                "sign-in flow already used; start a new one",
            )
            .into());
        }

        let pkce_challenge = pkce::generate();
        let state = generate_state();

        self.transition(FlowState::AwaitingBrowser);

        let listener = match TcpListener::bind(("127.0.0.1", self.config.redirect_port)).await {
            Ok(listener) => listener,
            Err(e) => {
                return Err(self.fail(
                    FlowState::Cancelled,
                    AuthFailure::PopupBlocked,
                    format!("failed to bind redirect listener: {e}"),
                ))
            }
        };
        let port = listener
            .local_addr()
            .map_err(|e| {
                self.fail(
                    FlowState::Cancelled,
                    AuthFailure::PopupBlocked,
                    format!("failed to get local address: {e}"),
                )
            })?
            .port();
        let redirect_uri = format!("http://127.0.0.1:{}/callback", port);

        let auth_url =
            self.build_authorization_url(&redirect_uri, &state, &pkce_challenge.challenge);

        eprintln!(
            "Open the following URL in your browser to authorize ChatVault:\n{}",
            auth_url
        );
        if self.config.open_browser {
            if let Err(e) = self.launcher.open(auth_url.as_str()) {
                return Err(self.fail(
                    FlowState::Cancelled,
                    AuthFailure::PopupBlocked,
                    format!(
                        "could not open the browser ({e}); set store.gdrive.open_browser \
                         to false and open the URL manually"
                    ),
                ));
            }
        }

        self.transition(FlowState::PollingForToken);

        let waiting = tokio::time::timeout(self.config.timeout, wait_for_code(&listener, &state));
        let waited = tokio::select! {
            result = waiting => result,
            _ = cancel.cancelled() => {
                return Err(self.fail(
                    FlowState::Cancelled,
                    AuthFailure::UserCancelled,
                    "sign-in was cancelled".to_string(),
                ));
            }
        };
        drop(listener);

        let code = match waited {
            Err(_) => {
                return Err(self.fail(
                    FlowState::TimedOut,
                    AuthFailure::Timeout,
                    format!(
                        "no authorization received within {} seconds",
                        self.config.timeout.as_secs()
                    ),
                ))
            }
            Ok(Err(e)) => {
                self.transition(FlowState::Cancelled);
                return Err(e);
            }
            Ok(Ok(code)) => code,
        };

        match self
            .exchange_code(&code, &redirect_uri, &pkce_challenge.verifier)
            .await
        {
            Ok(token) => {
                self.transition(FlowState::Authenticated);
                tracing::info!("Authorization successful");
                Ok(token)
            }
            Err(e) => {
                self.transition(FlowState::Cancelled);
                Err(e)
            }
        }
    }

    /// Exchanges a refresh token for a new access token.
    ///
    /// Google does not return a new refresh token on refresh; the caller
    /// keeps the old one.
    ///
    /// # Errors
    ///
    /// Returns `token_invalid` if the token endpoint rejects the request.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<OAuthToken> {
        let mut params: HashMap<&str, &str> = HashMap::new();
        params.insert("grant_type", "refresh_token");
        params.insert("refresh_token", refresh_token);
        params.insert("client_id", &self.config.client_id);
        if let Some(ref secret) = self.config.client_secret {
            params.insert("client_secret", secret);
        }

        self.post_token_request(&params, "refresh").await
    }

    /// Builds the authorization URL with all required query parameters.
    fn build_authorization_url(
        &self,
        redirect_uri: &str,
        state: &str,
        code_challenge: &str,
    ) -> Url {
        let mut url = self.config.auth_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", &self.config.scope)
            .append_pair("state", state)
            .append_pair("code_challenge", code_challenge)
            .append_pair("code_challenge_method", pkce::PkceChallenge::METHOD)
            // Ask for a refresh token so later runs do not re-prompt.
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent");
        url
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        code_verifier: &str,
    ) -> Result<OAuthToken> {
        let mut params: HashMap<&str, &str> = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("redirect_uri", redirect_uri);
        params.insert("client_id", &self.config.client_id);
        params.insert("code_verifier", code_verifier);
        if let Some(ref secret) = self.config.client_secret {
            params.insert("client_secret", secret);
        }

        self.post_token_request(&params, "token exchange").await
    }

    async fn post_token_request(
        &self,
        params: &HashMap<&str, &str>,
        what: &str,
    ) -> Result<OAuthToken> {
        let resp = self
            .http
            .post(self.config.token_endpoint.clone())
            .form(params)
            .send()
            .await
            .map_err(|e| {
                ChatVaultError::auth(
                    AuthFailure::TokenInvalid,
                    format!("{what} request failed: {e}"),
                )
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ChatVaultError::auth(
                AuthFailure::TokenInvalid,
                format!("{what} endpoint returned {status}: {body}"),
            )
            .into());
        }

        let raw: TokenResponse = resp.json().await.map_err(|e| {
            ChatVaultError::auth(
                AuthFailure::TokenInvalid,
                format!("failed to parse {what} response: {e}"),
            )
        })?;

        Ok(raw.into_oauth_token())
    }
}

// ---------------------------------------------------------------------------
// Redirect listener
// ---------------------------------------------------------------------------

/// How long one redirect connection may take to send its request.
const CALLBACK_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Accepts connections until one carries the callback, then returns its code.
///
/// Each connection is read on its own task, so an idle or malformed
/// connection (a browser preconnect, a port scan) never holds up the real
/// redirect. Such connections are dropped and the wait continues.
async fn wait_for_code(listener: &TcpListener, expected_state: &str) -> Result<String> {
    let (tx, mut rx) = mpsc::channel::<Result<Callback>>(8);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::debug!("Failed to accept redirect connection: {}", e);
                        continue;
                    }
                };
                let tx = tx.clone();
                let expected_state = expected_state.to_string();
                tokio::spawn(async move {
                    let read = read_callback(stream, &expected_state);
                    match tokio::time::timeout(CALLBACK_READ_TIMEOUT, read).await {
                        Ok(Ok(outcome)) => {
                            let _ = tx.send(outcome).await;
                        }
                        Ok(Err(e)) => {
                            tracing::debug!("Dropping redirect connection from {}: {}", peer, e)
                        }
                        Err(_) => {
                            tracing::debug!("Redirect connection from {} sent no request", peer)
                        }
                    }
                });
            }
            Some(outcome) = rx.recv() => match outcome? {
                Callback::Code(code) => return Ok(code),
                Callback::Denied(error) => {
                    return Err(ChatVaultError::auth(
                        AuthFailure::UserCancelled,
                        format!("authorization was denied: {error}"),
                    )
                    .into())
                }
                Callback::Ignored => {}
            },
        }
    }
}

/// Reads one redirect request, answers it and interprets it.
///
/// The outer error is a transport failure on this connection only.
async fn read_callback(
    stream: TcpStream,
    expected_state: &str,
) -> std::io::Result<Result<Callback>> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).await? == 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "connection closed before a request",
        ));
    }

    // Drain headers so the browser sees a well-formed exchange.
    let mut header = String::new();
    loop {
        header.clear();
        let n = reader.read_line(&mut header).await?;
        if n == 0 || header.trim_end().is_empty() {
            break;
        }
    }

    let outcome = parse_callback(&request_line, expected_state);
    let (status, body) = match &outcome {
        Ok(Callback::Code(_)) => {
            ("200 OK", "Authorization successful. You may close this tab.")
        }
        Ok(Callback::Denied(_)) => {
            ("200 OK", "Authorization was denied. You may close this tab.")
        }
        Ok(Callback::Ignored) => ("404 Not Found", "Not found"),
        Err(_) => ("400 Bad Request", "Authorization failed. Return to the terminal."),
    };
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\
         Connection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = write_half.write_all(response.as_bytes()).await;
    let _ = write_half.shutdown().await;

    Ok(outcome)
}

/// Interprets the request line of a redirect: `GET /callback?code=..&state=.. HTTP/1.1`.
fn parse_callback(request_line: &str, expected_state: &str) -> Result<Callback> {
    let target = request_line.split_whitespace().nth(1).unwrap_or("/");
    let url = match Url::parse(&format!("http://127.0.0.1{}", target)) {
        Ok(url) => url,
        Err(_) => return Ok(Callback::Ignored),
    };
    if url.path() != "/callback" {
        return Ok(Callback::Ignored);
    }

    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

    if params.get("state").map(String::as_str) != Some(expected_state) {
        return Err(ChatVaultError::auth(
            AuthFailure::TokenInvalid,
            "state mismatch in OAuth callback",
        )
        .into());
    }

    if let Some(error) = params.get("error") {
        return Ok(Callback::Denied(error.clone()));
    }

    params
        .get("code")
        .cloned()
        .map(Callback::Code)
        .ok_or_else(|| {
            ChatVaultError::auth(
                AuthFailure::TokenInvalid,
                "authorization code missing from callback",
            )
            .into()
        })
}

/// 16 random bytes encoded as base64url without padding.
fn generate_state() -> String {
    use rand::RngCore as _;
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> OAuthFlowConfig {
        OAuthFlowConfig {
            client_id: "test-client".to_string(),
            client_secret: None,
            scope: "https://www.googleapis.com/auth/drive.file".to_string(),
            auth_endpoint: Url::parse("https://accounts.example.com/o/oauth2/v2/auth").unwrap(),
            token_endpoint: Url::parse("https://oauth2.example.com/token").unwrap(),
            redirect_port: 0,
            open_browser: false,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_parse_callback_with_code_and_state() {
        let outcome =
            parse_callback("GET /callback?code=abc123&state=xyz HTTP/1.1", "xyz").unwrap();
        assert_eq!(outcome, Callback::Code("abc123".to_string()));
    }

    #[test]
    fn test_parse_callback_decodes_percent_encoding() {
        let outcome =
            parse_callback("GET /callback?code=4%2F0Ab&state=xyz HTTP/1.1", "xyz").unwrap();
        assert_eq!(outcome, Callback::Code("4/0Ab".to_string()));
    }

    #[test]
    fn test_parse_callback_denied() {
        let outcome =
            parse_callback("GET /callback?error=access_denied&state=xyz HTTP/1.1", "xyz").unwrap();
        assert_eq!(outcome, Callback::Denied("access_denied".to_string()));
    }

    #[test]
    fn test_parse_callback_state_mismatch() {
        let err =
            parse_callback("GET /callback?code=abc&state=other HTTP/1.1", "xyz").unwrap_err();
        assert!(err.to_string().contains("state mismatch"));
    }

    #[test]
    fn test_parse_callback_missing_code() {
        let err = parse_callback("GET /callback?state=xyz HTTP/1.1", "xyz").unwrap_err();
        assert!(err.to_string().contains("code missing"));
    }

    #[test]
    fn test_parse_callback_ignores_other_paths() {
        let outcome = parse_callback("GET /favicon.ico HTTP/1.1", "xyz").unwrap();
        assert_eq!(outcome, Callback::Ignored);
    }

    #[test]
    fn test_generate_state_produces_unique_values() {
        let a = generate_state();
        let b = generate_state();
        assert!(!a.is_empty());
        assert_ne!(a, b);
    }

    #[test]
    fn test_build_authorization_url_contains_required_params() {
        let flow = OAuthFlow::new(reqwest::Client::new(), test_config());
        let url = flow
            .build_authorization_url(
                "http://127.0.0.1:12345/callback",
                "test_state",
                "test_challenge",
            )
            .to_string();

        assert!(url.contains("response_type=code"), "missing response_type: {url}");
        assert!(url.contains("client_id=test-client"), "missing client_id: {url}");
        assert!(url.contains("redirect_uri="), "missing redirect_uri: {url}");
        assert!(url.contains("state=test_state"), "missing state: {url}");
        assert!(url.contains("code_challenge=test_challenge"), "missing challenge: {url}");
        assert!(url.contains("code_challenge_method=S256"), "missing method: {url}");
        assert!(url.contains("access_type=offline"), "missing access_type: {url}");
        assert!(url.contains("scope=https"), "missing scope: {url}");
    }

    #[test]
    fn test_flow_starts_idle() {
        let flow = OAuthFlow::new(reqwest::Client::new(), test_config());
        assert_eq!(flow.state(), FlowState::Idle);
        assert!(!flow.state().is_terminal());
    }

    #[test]
    fn test_terminal_states() {
        assert!(FlowState::Authenticated.is_terminal());
        assert!(FlowState::Cancelled.is_terminal());
        assert!(FlowState::TimedOut.is_terminal());
        assert!(!FlowState::PollingForToken.is_terminal());
        assert!(!FlowState::AwaitingBrowser.is_terminal());
    }

    #[test]
    fn test_token_response_into_oauth_token_sets_expires_at() {
        let raw = TokenResponse {
            access_token: "tok".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: Some(3600),
            refresh_token: None,
            scope: None,
        };
        assert!(raw.into_oauth_token().expires_at.is_some());
    }

    #[test]
    fn test_token_response_defaults_token_type() {
        let raw: TokenResponse = serde_json::from_str(r#"{"access_token":"tok"}"#).unwrap();
        assert_eq!(raw.token_type, "Bearer");
        assert!(raw.into_oauth_token().expires_at.is_none());
    }

    #[test]
    fn test_from_gdrive_rejects_bad_endpoint() {
        let gdrive = GDriveConfig {
            token_endpoint: "not a url".to_string(),
            ..GDriveConfig::default()
        };
        assert!(OAuthFlowConfig::from_gdrive(&gdrive).is_err());
    }

    #[test]
    fn test_from_gdrive_copies_settings() {
        let gdrive = GDriveConfig {
            client_id: "cid".to_string(),
            auth_timeout_seconds: 42,
            open_browser: false,
            ..GDriveConfig::default()
        };
        let config = OAuthFlowConfig::from_gdrive(&gdrive).unwrap();
        assert_eq!(config.client_id, "cid");
        assert_eq!(config.timeout, Duration::from_secs(42));
        assert!(!config.open_browser);
    }
}
