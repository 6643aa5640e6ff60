//! Configuration management for the daily podcast playlist job.
//!
//! This module handles loading and validating configuration values from environment
//! variables and `.env` files. Everything the job needs at runtime is collected into a
//! single [`Config`] value that is built once in `main` and handed to the components
//! that need it.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use std::{env, net::IpAddr, path::PathBuf, time::Duration};

use url::{Host, Url};

use crate::{Res, error::ConfigError, types::Show};

pub const CLIENT_ID_KEY: &str = "SPOTIFY_API_AUTH_CLIENT_ID";
pub const CLIENT_SECRET_KEY: &str = "SPOTIFY_API_AUTH_CLIENT_SECRET";

const CLIENT_ID_PLACEHOLDER: &str = "your_client_id_here";
const CLIENT_SECRET_PLACEHOLDER: &str = "your_client_secret_here";

pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
pub const DEFAULT_SCOPE: &str =
    "playlist-modify-public playlist-modify-private playlist-read-private ugc-image-upload";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_MARKET: &str = "US";
pub const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_PLAYLIST_NAME: &str = "Daily Podcasts";

const DEFAULT_SHOWS: &[(&str, &str)] = &[
    ("FT News Briefing", "1410RabA4XOqO6IV8p0gYF"),
    ("Up First from NPR", "2mTUnDkuKUkhiueKcVWoP0"),
    ("The Daily", "3IM0lmZxpFAY7CwMuv9H4g"),
];

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    pub market: String,
    pub shows: Vec<Show>,
    pub cover_image: Option<PathBuf>,
    pub auth_timeout: Duration,
    pub cache_dir: PathBuf,
}

impl Config {
    /// Builds the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Credentials are validated first so a missing client id or secret is
    /// reported before anything else.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingCredential`] when the client id or secret is unset or blank
    /// - [`ConfigError::PlaceholderCredential`] when a template value was left in place
    /// - [`ConfigError::InvalidRedirectUri`] when the redirect URI is not a loopback `http` URL with a port
    /// - [`ConfigError::InvalidShows`] when `PODCAST_SHOWS` cannot be parsed
    /// - [`ConfigError::InvalidTimeout`] when `AUTH_TIMEOUT_SECS` is not a positive integer
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let client_id = required_credential(value(CLIENT_ID_KEY), CLIENT_ID_KEY, CLIENT_ID_PLACEHOLDER)?;
        let client_secret = required_credential(
            value(CLIENT_SECRET_KEY),
            CLIENT_SECRET_KEY,
            CLIENT_SECRET_PLACEHOLDER,
        )?;

        let redirect_uri =
            value("SPOTIFY_API_REDIRECT_URI").unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());
        validate_redirect_uri(&redirect_uri)?;

        let shows = match value("PODCAST_SHOWS") {
            Some(raw) => parse_shows(&raw)?,
            None => default_shows(),
        };

        let auth_timeout = match value("AUTH_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
            None => Duration::from_secs(DEFAULT_AUTH_TIMEOUT_SECS),
        };

        let cache_dir = value("PODQUEUE_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_cache_dir);

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri,
            scope: value("SPOTIFY_API_AUTH_SCOPE").unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
            auth_url: value("SPOTIFY_API_AUTH_URL").unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
            token_url: value("SPOTIFY_API_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            api_url: value("SPOTIFY_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            market: value("SPOTIFY_MARKET").unwrap_or_else(|| DEFAULT_MARKET.to_string()),
            shows,
            cover_image: value("PLAYLIST_COVER_IMAGE").map(PathBuf::from),
            auth_timeout,
            cache_dir,
        })
    }

    pub fn token_cache_path(&self) -> PathBuf {
        self.cache_dir.join("token.json")
    }

    pub fn playlist_cache_path(&self) -> PathBuf {
        self.cache_dir.join("playlist.json")
    }
}

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Looks for the file under `podqueue/.env` in the platform-specific local data
/// directory:
/// - Linux: `~/.local/share/podqueue/.env`
/// - macOS: `~/Library/Application Support/podqueue/.env`
/// - Windows: `%LOCALAPPDATA%/podqueue/.env`
///
/// A missing file is not an error; the variables may as well come from the
/// environment the job is scheduled in. Variables already present in the
/// environment are never overridden.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or an existing file
/// cannot be parsed.
pub async fn load_env() -> Res<()> {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("podqueue/.env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if !path.is_file() {
        return Ok(());
    }

    dotenv::from_path(&path)?;
    Ok(())
}

/// Parses a show list of the form `Name=show_id,Other Name=other_id`.
///
/// Order is preserved exactly as written; it decides the order episodes end up
/// in the playlist.
pub fn parse_shows(raw: &str) -> Result<Vec<Show>, ConfigError> {
    let mut shows = Vec::new();

    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        let Some((name, id)) = entry.rsplit_once('=') else {
            return Err(ConfigError::InvalidShows(format!(
                "entry '{}' is not of the form Name=show_id",
                entry
            )));
        };

        let (name, id) = (name.trim(), id.trim());
        if id.is_empty() {
            return Err(ConfigError::InvalidShows(format!(
                "entry '{}' has an empty show id",
                entry
            )));
        }

        shows.push(Show {
            name: if name.is_empty() { id.to_string() } else { name.to_string() },
            id: id.to_string(),
        });
    }

    if shows.is_empty() {
        return Err(ConfigError::InvalidShows("no shows configured".to_string()));
    }

    Ok(shows)
}

pub fn default_shows() -> Vec<Show> {
    DEFAULT_SHOWS
        .iter()
        .map(|(name, id)| Show {
            name: name.to_string(),
            id: id.to_string(),
        })
        .collect()
}

fn default_cache_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("podqueue/cache");
    path
}

fn required_credential(
    value: Option<String>,
    key: &'static str,
    placeholder: &str,
) -> Result<String, ConfigError> {
    match value {
        None => Err(ConfigError::MissingCredential { key }),
        Some(v) if v == placeholder => Err(ConfigError::PlaceholderCredential { key }),
        Some(v) => Ok(v),
    }
}

/// Checks that the redirect URI can be served by the loopback listener:
/// plain `http`, a loopback host and an explicit port.
pub fn validate_redirect_uri(uri: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidRedirectUri {
        uri: uri.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(uri).map_err(|e| invalid(&e.to_string()))?;
    if url.scheme() != "http" {
        return Err(invalid("scheme must be http"));
    }

    let loopback = match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
        Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
        None => false,
    };
    if !loopback {
        return Err(invalid("host must be a loopback address"));
    }

    if url.port().is_none() {
        return Err(invalid("an explicit port is required"));
    }

    Ok(())
}
