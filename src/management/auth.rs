use chrono::Utc;

use crate::{
    config::Config,
    error::AuthError,
    management::CredentialStore,
    spotify::auth::{Authorizer, TokenEndpoint, authorization_url},
    types::{CallbackOutcome, TokenRecord, TokenResponse},
    utils, warning,
};

/// Seconds subtracted from the server-reported lifetime before a token is
/// stored, so it is refreshed strictly before it really expires.
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// States of the token lifecycle during a single run.
#[derive(Debug)]
pub enum TokenState {
    NoToken,
    Valid(TokenRecord),
    Expired(TokenRecord),
    AuthFailed(AuthError),
}

impl TokenState {
    /// Classifies a cached record against the current unix time.
    pub fn classify(cached: Option<TokenRecord>, now: i64) -> Self {
        match cached {
            None => TokenState::NoToken,
            Some(token) if now < token.expiry => TokenState::Valid(token),
            Some(token) => TokenState::Expired(token),
        }
    }
}

/// Owns the OAuth code exchange and refresh protocol.
///
/// The cache is consulted first; an expired token is refreshed, and only when
/// that is impossible the interactive browser flow is started. Every change to
/// the token is written back through the [`CredentialStore`] right away.
pub struct TokenManager<E, A> {
    store: CredentialStore,
    endpoint: E,
    authorizer: A,
    auth_url: String,
    client_id: String,
    redirect_uri: String,
    scope: String,
    token: Option<TokenRecord>,
}

impl<E, A> TokenManager<E, A>
where
    E: TokenEndpoint,
    A: Authorizer,
{
    pub fn new(config: &Config, store: CredentialStore, endpoint: E, authorizer: A) -> Self {
        Self {
            store,
            endpoint,
            authorizer,
            auth_url: config.auth_url.clone(),
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scope: config.scope.clone(),
            token: None,
        }
    }

    /// Drives the state machine until a usable access token exists or
    /// authorization has failed for this run.
    ///
    /// A cached token that has not expired is returned without any network
    /// call and without opening a browser or a listener.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthError`] that moved the machine into `AUTH_FAILED`:
    /// a timed out or code-less redirect, a rejected code exchange, or a
    /// listener that could not be bound.
    pub async fn ensure_authenticated(&mut self) -> Result<String, AuthError> {
        let cached = self.store.load_token().await;
        let mut state = TokenState::classify(cached, Utc::now().timestamp());

        loop {
            state = match state {
                TokenState::Valid(token) => {
                    let access_token = token.access_token.clone();
                    self.token = Some(token);
                    return Ok(access_token);
                }
                TokenState::AuthFailed(e) => return Err(e),
                TokenState::Expired(token) => match self.refresh(&token).await {
                    Some(refreshed) => TokenState::Valid(refreshed),
                    None => TokenState::NoToken,
                },
                TokenState::NoToken => match self.authorize().await {
                    Ok(token) => TokenState::Valid(token),
                    Err(e) => TokenState::AuthFailed(e),
                },
            };
        }
    }

    pub fn current_token(&self) -> Option<&TokenRecord> {
        self.token.as_ref()
    }

    async fn refresh(&self, token: &TokenRecord) -> Option<TokenRecord> {
        let refresh_token = token.refresh_token.as_deref()?;

        match self.endpoint.refresh(refresh_token).await {
            Ok(response) => {
                let previous = token.refresh_token.clone();
                let refreshed = Self::record_from(response, previous);
                self.persist(&refreshed).await;
                Some(refreshed)
            }
            Err(e) => {
                warning!("Token refresh failed, authorization required: {}", e);
                None
            }
        }
    }

    async fn authorize(&self) -> Result<TokenRecord, AuthError> {
        let state = utils::generate_state();
        let url = authorization_url(
            &self.auth_url,
            &self.client_id,
            &self.redirect_uri,
            &self.scope,
            &state,
        );

        let code = match self.authorizer.authorize(&url, &state).await? {
            CallbackOutcome::Code(code) => code,
            CallbackOutcome::Missing => return Err(AuthError::NoCode),
            CallbackOutcome::TimedOut => return Err(AuthError::Timeout),
        };

        let response = self.endpoint.exchange_code(&code).await?;
        let token = Self::record_from(response, None);
        self.persist(&token).await;
        Ok(token)
    }

    fn record_from(response: TokenResponse, previous_refresh: Option<String>) -> TokenRecord {
        TokenRecord {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            expiry: Utc::now().timestamp() + response.expires_in - EXPIRY_MARGIN_SECS,
        }
    }

    async fn persist(&self, token: &TokenRecord) {
        if let Err(e) = self.store.save_token(token).await {
            warning!("Failed to save token to cache: {}", e);
        }
    }
}
