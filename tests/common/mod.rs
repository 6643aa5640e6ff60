#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    path::Path,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use podqueue::{
    config::Config,
    error::{ApiError, AuthError},
    spotify::{
        auth::{Authorizer, TokenEndpoint},
        client::PlaylistApi,
    },
    types::{
        CallbackOutcome, CreatePlaylistRequest, EpisodeItem, Page, PlaylistItem, PlaylistSummary,
        TokenResponse, TrackRef,
    },
};

pub fn test_config(cache_dir: &Path) -> Config {
    let mut env = HashMap::new();
    env.insert("SPOTIFY_API_AUTH_CLIENT_ID", "test-client".to_string());
    env.insert("SPOTIFY_API_AUTH_CLIENT_SECRET", "test-secret".to_string());
    env.insert(
        "PODQUEUE_CACHE_DIR",
        cache_dir.to_string_lossy().into_owned(),
    );
    Config::from_lookup(|key| env.get(key).cloned()).unwrap()
}

pub fn status_error(status: u16) -> ApiError {
    ApiError::Status {
        endpoint: "fake".to_string(),
        status,
    }
}

pub fn episode_item(uri: &str, release_date: &str, duration_ms: u64) -> EpisodeItem {
    EpisodeItem {
        uri: uri.to_string(),
        name: format!("Episode {}", uri),
        duration_ms,
        release_date: release_date.to_string(),
    }
}

pub fn uris(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{}:{}", prefix, i)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CurrentUser,
    GetPlaylist(String),
    UserPlaylists(u32),
    CreatePlaylist(String),
    PlaylistItems(u32),
    Add(Vec<String>),
    Remove(Vec<String>),
    ShowEpisodes(String),
    UpdateDescription(String),
    UploadCover(usize),
}

#[derive(Default)]
pub struct FakeState {
    pub playlists: Vec<PlaylistSummary>,
    /// playlist id -> item uris; `None` stands for an unavailable track
    pub items: HashMap<String, Vec<Option<String>>>,
    pub shows: HashMap<String, Vec<EpisodeItem>>,
    pub failing_shows: HashSet<String>,
    /// 1-based index of the add call that fails
    pub fail_add_call: Option<usize>,
    /// 1-based index of the remove call that fails
    pub fail_remove_call: Option<usize>,
    pub fail_items_at_offset: Option<u32>,
    pub fail_user: bool,
    pub calls: Vec<Call>,
    add_calls: usize,
    remove_calls: usize,
    created: usize,
}

/// In-memory stand-in for the Web API.
#[derive(Clone, Default)]
pub struct FakeApi {
    state: Arc<Mutex<FakeState>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn add_playlist(&self, id: &str, name: &str) {
        self.with_state(|s| {
            s.playlists.push(PlaylistSummary {
                id: id.to_string(),
                name: name.to_string(),
            });
            s.items.entry(id.to_string()).or_default();
        });
    }

    pub fn set_items(&self, playlist_id: &str, items: Vec<Option<String>>) {
        self.with_state(|s| {
            s.items.insert(playlist_id.to_string(), items);
        });
    }

    pub fn set_show(&self, show_id: &str, episodes: Vec<EpisodeItem>) {
        self.with_state(|s| {
            s.shows.insert(show_id.to_string(), episodes);
        });
    }

    pub fn items(&self, playlist_id: &str) -> Vec<String> {
        self.with_state(|s| {
            s.items
                .get(playlist_id)
                .map(|items| items.iter().flatten().cloned().collect())
                .unwrap_or_default()
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with_state(|s| s.calls.clone())
    }

    pub fn add_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Add(uris) => Some(uris),
                _ => None,
            })
            .collect()
    }

    pub fn remove_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Remove(uris) => Some(uris),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.with_state(|s| s.calls.clear());
    }
}

fn page<T: Clone>(all: &[T], limit: u32, offset: u32) -> Page<T> {
    let start = (offset as usize).min(all.len());
    let end = (start + limit as usize).min(all.len());
    Page {
        items: all[start..end].to_vec(),
        next: (end < all.len()).then(|| format!("offset={}", end)),
    }
}

#[async_trait]
impl PlaylistApi for FakeApi {
    async fn current_user_id(&self) -> Result<String, ApiError> {
        self.with_state(|s| {
            s.calls.push(Call::CurrentUser);
            if s.fail_user {
                Err(status_error(401))
            } else {
                Ok("user-1".to_string())
            }
        })
    }

    async fn get_playlist(&self, playlist_id: &str) -> Result<PlaylistSummary, ApiError> {
        self.with_state(|s| {
            s.calls.push(Call::GetPlaylist(playlist_id.to_string()));
            s.playlists
                .iter()
                .find(|p| p.id == playlist_id)
                .cloned()
                .ok_or_else(|| status_error(404))
        })
    }

    async fn user_playlists(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Page<PlaylistSummary>, ApiError> {
        self.with_state(|s| {
            s.calls.push(Call::UserPlaylists(offset));
            Ok(page(&s.playlists, limit, offset))
        })
    }

    async fn create_playlist(
        &self,
        _user_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Result<PlaylistSummary, ApiError> {
        self.with_state(|s| {
            s.calls.push(Call::CreatePlaylist(request.name.clone()));
            s.created += 1;
            let playlist = PlaylistSummary {
                id: format!("created-{}", s.created),
                name: request.name.clone(),
            };
            s.playlists.push(playlist.clone());
            s.items.insert(playlist.id.clone(), Vec::new());
            Ok(playlist)
        })
    }

    async fn playlist_items(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<PlaylistItem>, ApiError> {
        self.with_state(|s| {
            s.calls.push(Call::PlaylistItems(offset));
            if s.fail_items_at_offset == Some(offset) {
                return Err(status_error(500));
            }
            let items: Vec<PlaylistItem> = s
                .items
                .get(playlist_id)
                .map(|items| {
                    items
                        .iter()
                        .map(|uri| PlaylistItem {
                            track: uri.clone().map(|uri| TrackRef { uri }),
                        })
                        .collect()
                })
                .unwrap_or_default();
            Ok(page(&items, limit, offset))
        })
    }

    async fn add_items(&self, playlist_id: &str, uris: &[String]) -> Result<(), ApiError> {
        self.with_state(|s| {
            s.calls.push(Call::Add(uris.to_vec()));
            s.add_calls += 1;
            if s.fail_add_call == Some(s.add_calls) {
                return Err(status_error(502));
            }
            s.items
                .entry(playlist_id.to_string())
                .or_default()
                .extend(uris.iter().cloned().map(Some));
            Ok(())
        })
    }

    async fn remove_items(&self, playlist_id: &str, uris: &[String]) -> Result<(), ApiError> {
        self.with_state(|s| {
            s.calls.push(Call::Remove(uris.to_vec()));
            s.remove_calls += 1;
            if s.fail_remove_call == Some(s.remove_calls) {
                return Err(status_error(502));
            }
            if let Some(items) = s.items.get_mut(playlist_id) {
                items.retain(|item| match item {
                    Some(uri) => !uris.contains(uri),
                    None => true,
                });
            }
            Ok(())
        })
    }

    async fn show_episodes(&self, show_id: &str, limit: u32) -> Result<Vec<EpisodeItem>, ApiError> {
        self.with_state(|s| {
            s.calls.push(Call::ShowEpisodes(show_id.to_string()));
            if s.failing_shows.contains(show_id) {
                return Err(status_error(503));
            }
            Ok(s.shows
                .get(show_id)
                .map(|episodes| episodes.iter().take(limit as usize).cloned().collect())
                .unwrap_or_default())
        })
    }

    async fn update_description(
        &self,
        _playlist_id: &str,
        description: &str,
    ) -> Result<(), ApiError> {
        self.with_state(|s| {
            s.calls.push(Call::UpdateDescription(description.to_string()));
            Ok(())
        })
    }

    async fn upload_cover(&self, _playlist_id: &str, jpeg_base64: String) -> Result<(), ApiError> {
        self.with_state(|s| {
            s.calls.push(Call::UploadCover(jpeg_base64.len()));
            Ok(())
        })
    }
}

#[derive(Default)]
pub struct EndpointState {
    pub exchange_response: Option<TokenResponse>,
    pub refresh_response: Option<TokenResponse>,
    pub exchanged_codes: Vec<String>,
    pub refreshed_with: Vec<String>,
}

/// Token endpoint fake; a `None` response answers with HTTP 400.
#[derive(Clone, Default)]
pub struct FakeEndpoint {
    state: Arc<Mutex<EndpointState>>,
}

impl FakeEndpoint {
    pub fn new(exchange: Option<TokenResponse>, refresh: Option<TokenResponse>) -> Self {
        Self {
            state: Arc::new(Mutex::new(EndpointState {
                exchange_response: exchange,
                refresh_response: refresh,
                ..Default::default()
            })),
        }
    }

    pub fn exchanged_codes(&self) -> Vec<String> {
        self.state.lock().unwrap().exchanged_codes.clone()
    }

    pub fn refreshed_with(&self) -> Vec<String> {
        self.state.lock().unwrap().refreshed_with.clone()
    }
}

#[async_trait]
impl TokenEndpoint for FakeEndpoint {
    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AuthError> {
        let mut state = self.state.lock().unwrap();
        state.exchanged_codes.push(code.to_string());
        state
            .exchange_response
            .clone()
            .ok_or(AuthError::Rejected { status: 400 })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        let mut state = self.state.lock().unwrap();
        state.refreshed_with.push(refresh_token.to_string());
        state
            .refresh_response
            .clone()
            .ok_or(AuthError::Rejected { status: 400 })
    }
}

/// Authorizer fake returning a fixed outcome and recording the consent URLs.
#[derive(Clone)]
pub struct FakeAuthorizer {
    outcome: CallbackOutcome,
    urls: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeAuthorizer {
    pub fn new(outcome: CallbackOutcome) -> Self {
        Self {
            outcome,
            urls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> usize {
        self.urls.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Authorizer for FakeAuthorizer {
    async fn authorize(&self, url: &str, state: &str) -> Result<CallbackOutcome, AuthError> {
        self.urls
            .lock()
            .unwrap()
            .push((url.to_string(), state.to_string()));
        Ok(self.outcome.clone())
    }
}

pub fn token_response(access: &str, refresh: Option<&str>, expires_in: i64) -> TokenResponse {
    TokenResponse {
        access_token: access.to_string(),
        refresh_token: refresh.map(String::from),
        expires_in,
    }
}
