//! Browser sign-in flow tests
//!
//! The browser is replaced by a launcher that plays the user's part: it
//! reads the authorization URL and calls the loopback redirect from a
//! separate thread. The token endpoint is a wiremock server.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chatvault::auth::flow::{BrowserLauncher, FlowState, OAuthFlow, OAuthFlowConfig};
use chatvault::auth::token_store::{MemoryTokenStore, OAuthToken, TokenStorage};
use chatvault::auth::{AuthManager, CredentialProvider};
use chatvault::error::{classify, AuthFailure, ChatVaultError};

/// What the simulated user does once the consent page "opens".
#[derive(Clone, Copy)]
enum UserAction {
    Approve,
    /// Leaves an idle socket open and sends garbage before the redirect.
    ApproveAfterStrayConnections,
    Deny,
    Ignore,
    BrowserMissing,
}

struct ScriptedBrowser {
    action: UserAction,
    opened: Mutex<Vec<String>>,
}

impl ScriptedBrowser {
    fn new(action: UserAction) -> Arc<Self> {
        Arc::new(Self {
            action,
            opened: Mutex::new(Vec::new()),
        })
    }
}

impl BrowserLauncher for ScriptedBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        self.opened.lock().unwrap().push(url.to_string());

        let query = match self.action {
            UserAction::BrowserMissing => {
                return Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no browser"))
            }
            UserAction::Ignore => return Ok(()),
            UserAction::Approve | UserAction::ApproveAfterStrayConnections => "code=abc",
            UserAction::Deny => "error=access_denied",
        };

        let auth_url = Url::parse(url).unwrap();
        let param = |key: &str| {
            auth_url
                .query_pairs()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.into_owned())
                .unwrap()
        };
        let redirect = Url::parse(&param("redirect_uri")).unwrap();
        let state = param("state");
        let target = format!("{}?{}&state={}", redirect.path(), query, state);
        let addr = format!("127.0.0.1:{}", redirect.port().unwrap());
        let stray = matches!(self.action, UserAction::ApproveAfterStrayConnections);

        std::thread::spawn(move || {
            let mut held = Vec::new();
            if stray {
                held.push(TcpStream::connect(&addr).unwrap());
                let mut garbage = TcpStream::connect(&addr).unwrap();
                garbage.write_all(b"\xff\xfe\x00\r\n\r\n").unwrap();
                held.push(garbage);
                std::thread::sleep(Duration::from_millis(50));
            }
            let mut stream = TcpStream::connect(addr).unwrap();
            write!(stream, "GET {target} HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n").unwrap();
            let mut response = String::new();
            let _ = stream.read_to_string(&mut response);
        });
        Ok(())
    }
}

fn flow_config(token_server: &MockServer) -> OAuthFlowConfig {
    OAuthFlowConfig {
        client_id: "test-client".to_string(),
        client_secret: Some("test-secret".to_string()),
        scope: "https://www.googleapis.com/auth/drive.file".to_string(),
        auth_endpoint: Url::parse("https://accounts.example.com/o/oauth2/v2/auth").unwrap(),
        token_endpoint: Url::parse(&format!("{}/token", token_server.uri())).unwrap(),
        redirect_port: 0,
        open_browser: true,
        timeout: Duration::from_secs(5),
    }
}

fn auth_reason(err: &anyhow::Error) -> Option<AuthFailure> {
    match classify(err) {
        Some(ChatVaultError::Auth { reason, .. }) => Some(*reason),
        _ => None,
    }
}

#[tokio::test]
async fn test_approved_sign_in_exchanges_code_with_verifier() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=abc"))
        .and(body_string_contains("code_verifier="))
        .and(body_string_contains("client_secret=test-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "ya29.fresh",
            "expires_in": 3600,
            "refresh_token": "1//refresh",
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let browser = ScriptedBrowser::new(UserAction::Approve);
    let flow =
        OAuthFlow::with_launcher(reqwest::Client::new(), flow_config(&server), browser.clone());

    let token = flow.authorize(&CancellationToken::new()).await.unwrap();
    assert_eq!(token.access_token, "ya29.fresh");
    assert_eq!(token.refresh_token.as_deref(), Some("1//refresh"));
    assert!(token.expires_at.is_some());
    assert_eq!(flow.state(), FlowState::Authenticated);

    let opened = browser.opened.lock().unwrap();
    assert_eq!(opened.len(), 1);
    assert!(opened[0].contains("code_challenge_method=S256"));
    assert!(opened[0].contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A"));
}

#[tokio::test]
async fn test_denied_consent_is_user_cancelled() {
    let server = MockServer::start().await;
    let flow = OAuthFlow::with_launcher(
        reqwest::Client::new(),
        flow_config(&server),
        ScriptedBrowser::new(UserAction::Deny),
    );

    let err = flow.authorize(&CancellationToken::new()).await.unwrap_err();
    assert_eq!(auth_reason(&err), Some(AuthFailure::UserCancelled));
    assert_eq!(flow.state(), FlowState::Cancelled);
}

#[tokio::test]
async fn test_missing_browser_is_popup_blocked() {
    let server = MockServer::start().await;
    let flow = OAuthFlow::with_launcher(
        reqwest::Client::new(),
        flow_config(&server),
        ScriptedBrowser::new(UserAction::BrowserMissing),
    );

    let err = flow.authorize(&CancellationToken::new()).await.unwrap_err();
    assert_eq!(auth_reason(&err), Some(AuthFailure::PopupBlocked));
    assert_eq!(flow.state(), FlowState::Cancelled);
}

#[tokio::test]
async fn test_cancellation_stops_waiting() {
    let server = MockServer::start().await;
    let flow = OAuthFlow::with_launcher(
        reqwest::Client::new(),
        flow_config(&server),
        ScriptedBrowser::new(UserAction::Ignore),
    );

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = flow.authorize(&cancel).await.unwrap_err();
    assert_eq!(auth_reason(&err), Some(AuthFailure::UserCancelled));
    assert_eq!(flow.state(), FlowState::Cancelled);
}

#[tokio::test]
async fn test_no_redirect_times_out() {
    let server = MockServer::start().await;
    let mut config = flow_config(&server);
    config.timeout = Duration::from_millis(100);
    let flow = OAuthFlow::with_launcher(
        reqwest::Client::new(),
        config,
        ScriptedBrowser::new(UserAction::Ignore),
    );

    let err = flow.authorize(&CancellationToken::new()).await.unwrap_err();
    assert_eq!(auth_reason(&err), Some(AuthFailure::Timeout));
    assert_eq!(flow.state(), FlowState::TimedOut);
}

#[tokio::test]
async fn test_rejected_code_is_token_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"invalid_grant"}"#))
        .mount(&server)
        .await;

    let flow = OAuthFlow::with_launcher(
        reqwest::Client::new(),
        flow_config(&server),
        ScriptedBrowser::new(UserAction::Approve),
    );

    let err = flow.authorize(&CancellationToken::new()).await.unwrap_err();
    assert_eq!(auth_reason(&err), Some(AuthFailure::TokenInvalid));
    assert!(err.to_string().contains("invalid_grant"));
}

#[tokio::test]
async fn test_flow_cannot_be_reused() {
    let server = MockServer::start().await;
    let flow = OAuthFlow::with_launcher(
        reqwest::Client::new(),
        flow_config(&server),
        ScriptedBrowser::new(UserAction::BrowserMissing),
    );
    let _ = flow.authorize(&CancellationToken::new()).await;

    let err = flow.authorize(&CancellationToken::new()).await.unwrap_err();
    assert_eq!(auth_reason(&err), Some(AuthFailure::TokenInvalid));
}

#[tokio::test]
async fn test_manager_refresh_keeps_refresh_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=rt-old"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "refreshed",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = Arc::new(MemoryTokenStore::new());
    let mut expired = OAuthToken::bearer("stale");
    expired.expires_at = Some(chrono::Utc::now() - chrono::Duration::minutes(5));
    expired.refresh_token = Some("rt-old".to_string());
    tokens.save_token("gdrive", &expired).unwrap();

    let browser = ScriptedBrowser::new(UserAction::Ignore);
    let manager = AuthManager::new(
        reqwest::Client::new(),
        flow_config(&server),
        tokens.clone(),
        "gdrive",
    )
    .with_launcher(browser.clone());

    let token = manager.credential().await.unwrap();
    assert_eq!(token.access_token, "refreshed");
    assert_eq!(token.refresh_token.as_deref(), Some("rt-old"));

    let persisted = tokens.load_token("gdrive").unwrap().unwrap();
    assert_eq!(persisted.access_token, "refreshed");
    assert_eq!(persisted.refresh_token.as_deref(), Some("rt-old"));
    assert!(browser.opened.lock().unwrap().is_empty());

    // Cached for the rest of the process.
    assert_eq!(manager.credential().await.unwrap().access_token, "refreshed");
}

#[tokio::test]
async fn test_manager_signs_in_when_nothing_persisted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "first",
            "expires_in": 3600,
            "refresh_token": "rt"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = Arc::new(MemoryTokenStore::new());
    let manager = AuthManager::new(
        reqwest::Client::new(),
        flow_config(&server),
        tokens.clone(),
        "gdrive",
    )
    .with_launcher(ScriptedBrowser::new(UserAction::Approve));

    assert_eq!(manager.credential().await.unwrap().access_token, "first");
    assert_eq!(
        tokens.load_token("gdrive").unwrap().unwrap().refresh_token.as_deref(),
        Some("rt")
    );
}

#[tokio::test]
async fn test_idle_and_garbled_connections_do_not_block_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("code=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "ya29.after-noise",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let browser = ScriptedBrowser::new(UserAction::ApproveAfterStrayConnections);
    let flow = OAuthFlow::with_launcher(reqwest::Client::new(), flow_config(&server), browser);

    let started = std::time::Instant::now();
    let token = flow.authorize(&CancellationToken::new()).await.unwrap();
    assert_eq!(token.access_token, "ya29.after-noise");
    assert_eq!(flow.state(), FlowState::Authenticated);
    assert!(started.elapsed() < Duration::from_secs(4));
}
