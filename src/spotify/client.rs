use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, header::CONTENT_TYPE};
use serde::de::DeserializeOwned;

use crate::{
    config::Config,
    error::ApiError,
    types::{
        AddItemsRequest, CreatePlaylistRequest, EpisodeItem, Page, PlaylistItem, PlaylistSummary,
        RemoveItemsRequest, UpdatePlaylistRequest, UriRef, UserProfile,
    },
};

/// The Web API calls the playlist reconciler depends on.
///
/// Every method maps to a single HTTP request. A non-success status is an
/// [`ApiError::Status`]; nothing is retried.
#[async_trait]
pub trait PlaylistApi: Send + Sync {
    async fn current_user_id(&self) -> Result<String, ApiError>;

    /// Fetches a playlist by id; used as a liveness check for cached ids.
    async fn get_playlist(&self, playlist_id: &str) -> Result<PlaylistSummary, ApiError>;

    async fn user_playlists(&self, limit: u32, offset: u32)
    -> Result<Page<PlaylistSummary>, ApiError>;

    async fn create_playlist(
        &self,
        user_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Result<PlaylistSummary, ApiError>;

    async fn playlist_items(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<PlaylistItem>, ApiError>;

    async fn add_items(&self, playlist_id: &str, uris: &[String]) -> Result<(), ApiError>;

    async fn remove_items(&self, playlist_id: &str, uris: &[String]) -> Result<(), ApiError>;

    /// Latest episodes of a show, newest first. Unavailable entries the
    /// service reports as `null` are dropped.
    async fn show_episodes(&self, show_id: &str, limit: u32) -> Result<Vec<EpisodeItem>, ApiError>;

    async fn update_description(&self, playlist_id: &str, description: &str)
    -> Result<(), ApiError>;

    /// Uploads a base64-encoded JPEG as playlist cover.
    async fn upload_cover(&self, playlist_id: &str, jpeg_base64: String) -> Result<(), ApiError>;
}

/// Spotify Web API client authenticated with a bearer token.
#[derive(Clone)]
pub struct SpotifyClient {
    client: Client,
    api_url: String,
    access_token: String,
    market: String,
}

impl SpotifyClient {
    pub fn new(config: &Config, access_token: impl Into<String>) -> Self {
        Self::with_client(Client::new(), config, access_token)
    }

    pub fn with_client(client: Client, config: &Config, access_token: impl Into<String>) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            market: config.market.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|source| ApiError::Request {
                endpoint: endpoint.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        self.send(endpoint, request)
            .await?
            .json::<T>()
            .await
            .map_err(|source| ApiError::Decode {
                endpoint: endpoint.to_string(),
                source,
            })
    }
}

#[async_trait]
impl PlaylistApi for SpotifyClient {
    async fn current_user_id(&self) -> Result<String, ApiError> {
        let request = self.client.get(self.url("/me"));
        let profile: UserProfile = self.send_json("GET /me", request).await?;
        Ok(profile.id)
    }

    async fn get_playlist(&self, playlist_id: &str) -> Result<PlaylistSummary, ApiError> {
        let request = self
            .client
            .get(self.url(&format!("/playlists/{}", playlist_id)))
            .query(&[("fields", "id,name")]);
        self.send_json("GET /playlists/{id}", request).await
    }

    async fn user_playlists(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Page<PlaylistSummary>, ApiError> {
        let request = self
            .client
            .get(self.url("/me/playlists"))
            .query(&[("limit", limit), ("offset", offset)]);
        self.send_json("GET /me/playlists", request).await
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        request: &CreatePlaylistRequest,
    ) -> Result<PlaylistSummary, ApiError> {
        let request = self
            .client
            .post(self.url(&format!("/users/{}/playlists", user_id)))
            .json(request);
        self.send_json("POST /users/{id}/playlists", request).await
    }

    async fn playlist_items(
        &self,
        playlist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<PlaylistItem>, ApiError> {
        let request = self
            .client
            .get(self.url(&format!("/playlists/{}/tracks", playlist_id)))
            .query(&[("limit", limit), ("offset", offset)]);
        self.send_json("GET /playlists/{id}/tracks", request).await
    }

    async fn add_items(&self, playlist_id: &str, uris: &[String]) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.url(&format!("/playlists/{}/tracks", playlist_id)))
            .json(&AddItemsRequest { uris });
        self.send("POST /playlists/{id}/tracks", request).await?;
        Ok(())
    }

    async fn remove_items(&self, playlist_id: &str, uris: &[String]) -> Result<(), ApiError> {
        let body = RemoveItemsRequest {
            tracks: uris.iter().map(|uri| UriRef { uri: uri.clone() }).collect(),
        };
        let request = self
            .client
            .delete(self.url(&format!("/playlists/{}/tracks", playlist_id)))
            .json(&body);
        self.send("DELETE /playlists/{id}/tracks", request).await?;
        Ok(())
    }

    async fn show_episodes(&self, show_id: &str, limit: u32) -> Result<Vec<EpisodeItem>, ApiError> {
        let request = self
            .client
            .get(self.url(&format!("/shows/{}/episodes", show_id)))
            .query(&[("limit", limit.to_string()), ("market", self.market.clone())]);
        let page: Page<Option<EpisodeItem>> =
            self.send_json("GET /shows/{id}/episodes", request).await?;
        Ok(page.items.into_iter().flatten().collect())
    }

    async fn update_description(
        &self,
        playlist_id: &str,
        description: &str,
    ) -> Result<(), ApiError> {
        let request = self
            .client
            .put(self.url(&format!("/playlists/{}", playlist_id)))
            .json(&UpdatePlaylistRequest { description });
        self.send("PUT /playlists/{id}", request).await?;
        Ok(())
    }

    async fn upload_cover(&self, playlist_id: &str, jpeg_base64: String) -> Result<(), ApiError> {
        let request = self
            .client
            .put(self.url(&format!("/playlists/{}/images", playlist_id)))
            .header(CONTENT_TYPE, "image/jpeg")
            .body(jpeg_base64);
        self.send("PUT /playlists/{id}/images", request).await?;
        Ok(())
    }
}
