use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while assembling the runtime configuration.
///
/// All of them are fatal and are reported before any network call is made.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing Spotify credentials: {key} is not set")]
    MissingCredential { key: &'static str },

    #[error("Spotify credentials still hold the template value for {key}")]
    PlaceholderCredential { key: &'static str },

    #[error("Invalid redirect URI '{uri}': {reason}")]
    InvalidRedirectUri { uri: String, reason: String },

    #[error("Invalid podcast show list: {0}")]
    InvalidShows(String),

    #[error("Invalid authorization timeout '{0}': expected a positive number of seconds")]
    InvalidTimeout(String),
}

impl ConfigError {
    /// Whether the client id or secret itself is what needs fixing.
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            ConfigError::MissingCredential { .. } | ConfigError::PlaceholderCredential { .. }
        )
    }
}

/// Terminal failures of the authorization state machine.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Timed out waiting for the authorization redirect")]
    Timeout,

    #[error("The authorization redirect carried no code")]
    NoCode,

    #[error("Token endpoint responded with HTTP {status}")]
    Rejected { status: u16 },

    #[error("Token endpoint request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Token endpoint returned an unexpected body: {0}")]
    MalformedResponse(String),

    #[error("Cannot listen for the authorization redirect: {0}")]
    Listener(#[source] std::io::Error),
}

/// Failure of a single Web API call.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} responded with HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Cannot decode response of {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

/// A batched mutation stopped part way through.
///
/// Batches before `failed_batch` were applied and stay applied.
#[derive(Error, Debug)]
#[error("Batch {failed_batch} of {total_batches} failed after {applied} item(s) were applied: {source}")]
pub struct BatchError {
    pub applied: usize,
    pub failed_batch: usize,
    pub total_batches: usize,
    #[source]
    pub source: ApiError,
}

#[derive(Error, Debug)]
pub enum PlaylistError {
    #[error("Cannot look up the current user: {0}")]
    UserLookup(#[source] ApiError),

    #[error("Cannot create playlist '{name}': {source}")]
    Create {
        name: String,
        #[source]
        source: ApiError,
    },
}

#[derive(Error, Debug)]
pub enum CoverError {
    #[error("Cannot read cover image {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cover image too large ({kib}KB > 256KB)")]
    TooLarge { kib: usize },

    #[error("Cover upload failed: {0}")]
    Upload(#[from] ApiError),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Cannot write cache file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot serialize cache data: {0}")]
    Serialize(#[from] serde_json::Error),
}
