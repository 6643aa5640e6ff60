use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, StatusCode};
use url::Url;

use crate::{
    config::Config,
    error::{AuthError, ConfigError},
    info,
    server::LoopbackAuthServer,
    types::{CallbackOutcome, TokenResponse},
    warning,
};

/// The OAuth token endpoint: code exchange and refresh.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AuthError>;

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError>;
}

/// Obtains an authorization code for the given consent URL.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// `state` is the value embedded in `url`; a redirect carrying any other
    /// state yields no code.
    async fn authorize(&self, url: &str, state: &str) -> Result<CallbackOutcome, AuthError>;
}

/// Builds the consent URL the user is sent to.
///
/// # Example
///
/// ```
/// let url = authorization_url(
///     "https://accounts.spotify.com/authorize",
///     "client",
///     "http://127.0.0.1:8888/callback",
///     "playlist-read-private",
///     "xyz",
/// );
/// ```
pub fn authorization_url(
    auth_url: &str,
    client_id: &str,
    redirect_uri: &str,
    scope: &str,
    state: &str,
) -> String {
    let params = [
        ("client_id", client_id),
        ("response_type", "code"),
        ("redirect_uri", redirect_uri),
        ("scope", scope),
        ("show_dialog", "false"),
        ("state", state),
    ];

    match Url::parse_with_params(auth_url, &params) {
        Ok(url) => url.to_string(),
        Err(_) => {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(params)
                .finish();
            format!("{}?{}", auth_url, query)
        }
    }
}

/// Builds the `Authorization: Basic` value from the client credentials.
pub fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    let encoded = STANDARD.encode(format!("{}:{}", client_id, client_secret));
    format!("Basic {}", encoded)
}

/// Token endpoint of the Spotify accounts service, authenticated with the
/// client id and secret.
#[derive(Clone)]
pub struct SpotifyAccounts {
    client: Client,
    token_url: String,
    redirect_uri: String,
    authorization: String,
}

impl SpotifyAccounts {
    pub fn new(config: &Config) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &Config) -> Self {
        Self {
            client,
            token_url: config.token_url.clone(),
            redirect_uri: config.redirect_uri.clone(),
            authorization: basic_auth_header(&config.client_id, &config.client_secret),
        }
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let res = self
            .client
            .post(&self.token_url)
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .form(form)
            .send()
            .await?;

        if res.status() != StatusCode::OK {
            return Err(AuthError::Rejected {
                status: res.status().as_u16(),
            });
        }

        res.json::<TokenResponse>()
            .await
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl TokenEndpoint for SpotifyAccounts {
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AuthError> {
        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.redirect_uri),
        ])
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }
}

/// Interactive authorization: binds the loopback listener, opens the consent
/// page in the default browser and waits for the single redirect.
pub struct BrowserAuthorizer {
    server: LoopbackAuthServer,
}

impl BrowserAuthorizer {
    pub fn new(server: LoopbackAuthServer) -> Self {
        Self { server }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(LoopbackAuthServer::from_redirect_uri(
            &config.redirect_uri,
            config.auth_timeout,
        )?))
    }
}

#[async_trait]
impl Authorizer for BrowserAuthorizer {
    async fn authorize(&self, url: &str, state: &str) -> Result<CallbackOutcome, AuthError> {
        // bind first so the redirect cannot arrive before anyone listens
        let bound = self
            .server
            .bind(Some(state.to_string()))
            .await
            .map_err(AuthError::Listener)?;

        info!("Opening browser for Spotify authorization...");
        if webbrowser::open(url).is_err() {
            warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                url
            )
        }

        let pb = ProgressBar::new_spinner();
        pb.set_message(format!(
            "Waiting for authorization (up to {}s)...",
            self.server.max_wait().as_secs()
        ));
        pb.enable_steady_tick(Duration::from_millis(100));
        if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }

        let outcome = bound.wait().await;
        pb.finish_and_clear();

        Ok(outcome)
    }
}
