use serde::{Deserialize, Serialize};
use tabled::Tabled;
use tokio::sync::oneshot;

/// Cached OAuth credentials.
///
/// `expiry` is a unix timestamp in seconds that already has the safety margin
/// subtracted, so the token is usable while `now < expiry`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expiry: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistRecord {
    pub name: String,
    pub id: String,
}

/// Body of a successful token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

/// Result of waiting for the OAuth redirect on the loopback listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Code(String),
    Missing,
    TimedOut,
}

/// Transient state of the loopback listener: the one-shot slot the callback
/// handler answers through. Taken by the first request that arrives.
#[derive(Debug)]
pub struct AuthSession {
    pub expected_state: Option<String>,
    pub responder: Option<oneshot::Sender<Option<String>>>,
}

/// A podcast show as configured by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Show {
    pub name: String,
    pub id: String,
}

/// An episode that falls into the recency window of the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
    pub uri: String,
    pub name: String,
    pub duration_ms: u64,
    pub release_date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    pub track: Option<TrackRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackRef {
    pub uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EpisodeItem {
    pub uri: String,
    pub name: String,
    pub duration_ms: u64,
    pub release_date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddItemsRequest<'a> {
    pub uris: &'a [String],
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoveItemsRequest {
    pub tracks: Vec<UriRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UriRef {
    pub uri: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdatePlaylistRequest<'a> {
    pub description: &'a str,
}

#[derive(Tabled)]
pub struct EpisodeTableRow {
    pub date: String,
    pub show: String,
    pub episode: String,
    pub minutes: u64,
}
