use std::{collections::HashSet, path::Path};

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{Local, NaiveDateTime};

use crate::{
    error::{ApiError, BatchError, CoverError, PlaylistError},
    management::CredentialStore,
    spotify::client::PlaylistApi,
    types::{CreatePlaylistRequest, Episode, Show},
    utils, warning,
};

/// Maximum number of items per add or remove call.
pub const BATCH_SIZE: usize = 100;
pub const PLAYLISTS_PAGE_SIZE: u32 = 50;
pub const ITEMS_PAGE_SIZE: u32 = 100;
pub const EPISODES_PER_SHOW: u32 = 10;
pub const MAX_COVER_BYTES: usize = 256 * 1024;

/// What happened to a single show during [`PlaylistReconciler::reconcile`].
#[derive(Debug)]
pub struct ShowReport {
    pub show: Show,
    /// Episodes inside the window that were queued for adding, in API order.
    pub staged: Vec<Episode>,
    /// Episodes inside the window that were already present or already staged.
    pub duplicates: Vec<Episode>,
    /// Set when the show could not be fetched; the show is skipped.
    pub error: Option<ApiError>,
}

#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub shows: Vec<ShowReport>,
    /// Episodes that made it into the playlist, in show order.
    pub added: Vec<Episode>,
    /// Staged episodes that were not added because a batch failed.
    pub pending: Vec<Episode>,
    pub total_duration_ms: u64,
    pub clear_error: Option<BatchError>,
    pub add_error: Option<BatchError>,
}

impl ReconcileReport {
    pub fn total_minutes(&self) -> u64 {
        self.total_duration_ms / 60_000
    }

    pub fn is_complete(&self) -> bool {
        self.clear_error.is_none()
            && self.add_error.is_none()
            && self.shows.iter().all(|s| s.error.is_none())
    }
}

/// Brings the playlist in line with the recent episodes of the configured
/// shows.
///
/// Every operation works on a fresh snapshot fetched from the service, so
/// running the job twice in a row is harmless. Batches that were applied
/// before a failure stay applied; there is no rollback.
pub struct PlaylistReconciler<A> {
    api: A,
    store: CredentialStore,
    now: Option<NaiveDateTime>,
}

impl<A: PlaylistApi> PlaylistReconciler<A> {
    pub fn new(api: A, store: CredentialStore) -> Self {
        Self {
            api,
            store,
            now: None,
        }
    }

    /// Pins the clock used for the recency window and descriptions.
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn now(&self) -> NaiveDateTime {
        self.now.unwrap_or_else(|| Local::now().naive_local())
    }

    /// Finds the playlist called `name`, creating it if needed.
    ///
    /// Order of attempts:
    /// 1. The cached id, if cached under the same name and the service still knows it
    /// 2. An exact, case-sensitive name match across all pages of the user's playlists
    /// 3. A new private playlist
    ///
    /// The resolved id is written back to the playlist cache.
    pub async fn resolve_playlist(&self, name: &str) -> Result<String, PlaylistError> {
        if let Some(cached) = self.store.load_playlist(name).await {
            if self.api.get_playlist(&cached).await.is_ok() {
                return Ok(cached);
            }
        }

        if let Some(found) = self.find_playlist_by_name(name).await {
            self.remember_playlist(name, &found).await;
            return Ok(found);
        }

        let user_id = self
            .api
            .current_user_id()
            .await
            .map_err(PlaylistError::UserLookup)?;

        let request = CreatePlaylistRequest {
            name: name.to_string(),
            description: utils::creation_description(self.now()),
            public: false,
        };
        let created = self
            .api
            .create_playlist(&user_id, &request)
            .await
            .map_err(|source| PlaylistError::Create {
                name: name.to_string(),
                source,
            })?;

        self.remember_playlist(name, &created.id).await;
        Ok(created.id)
    }

    async fn find_playlist_by_name(&self, name: &str) -> Option<String> {
        let mut offset = 0;

        loop {
            let page = match self.api.user_playlists(PLAYLISTS_PAGE_SIZE, offset).await {
                Ok(page) => page,
                Err(e) => {
                    warning!("Stopped searching playlists early: {}", e);
                    return None;
                }
            };

            if let Some(playlist) = page.items.iter().find(|p| p.name == name) {
                return Some(playlist.id.clone());
            }

            if page.next.is_none() || page.items.is_empty() {
                return None;
            }
            offset += PLAYLISTS_PAGE_SIZE;
        }
    }

    async fn remember_playlist(&self, name: &str, id: &str) {
        if let Err(e) = self.store.save_playlist(name, id).await {
            warning!("Failed to save playlist to cache: {}", e);
        }
    }

    /// Collects the URIs currently in the playlist, in playlist order and
    /// without repeats. Entries without a track (deleted or unavailable
    /// items) are skipped. A failing page ends the listing early.
    pub async fn fetch_current_episode_uris(&self, playlist_id: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut uris = Vec::new();
        let mut offset = 0;

        loop {
            let page = match self
                .api
                .playlist_items(playlist_id, ITEMS_PAGE_SIZE, offset)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    warning!("Stopped listing playlist items early: {}", e);
                    break;
                }
            };

            for item in &page.items {
                if let Some(track) = &item.track {
                    if seen.insert(track.uri.clone()) {
                        uris.push(track.uri.clone());
                    }
                }
            }

            if page.next.is_none() || page.items.is_empty() {
                break;
            }
            offset += ITEMS_PAGE_SIZE;
        }

        uris
    }

    /// Removes everything from the playlist. Returns the number of URIs
    /// removed.
    pub async fn clear(&self, playlist_id: &str) -> Result<usize, BatchError> {
        let uris = self.fetch_current_episode_uris(playlist_id).await;
        self.apply_batches(&uris, |batch| self.api.remove_items(playlist_id, batch))
            .await
    }

    /// Appends `uris` in order. Returns the number of URIs added.
    pub async fn add(&self, playlist_id: &str, uris: &[String]) -> Result<usize, BatchError> {
        self.apply_batches(uris, |batch| self.api.add_items(playlist_id, batch))
            .await
    }

    async fn apply_batches<'a, F, Fut>(&self, uris: &'a [String], call: F) -> Result<usize, BatchError>
    where
        F: Fn(&'a [String]) -> Fut,
        Fut: Future<Output = Result<(), ApiError>>,
    {
        let total_batches = uris.len().div_ceil(BATCH_SIZE);
        let mut applied = 0;

        for (index, batch) in uris.chunks(BATCH_SIZE).enumerate() {
            if let Err(source) = call(batch).await {
                return Err(BatchError {
                    applied,
                    failed_batch: index + 1,
                    total_batches,
                    source,
                });
            }
            applied += batch.len();
        }

        Ok(applied)
    }

    /// Fetches the latest episodes of a show and keeps those released on or
    /// after `now - days`. Episodes with an unparseable release date are
    /// skipped silently.
    pub async fn fetch_recent_episodes(
        &self,
        show_id: &str,
        days: u32,
    ) -> Result<Vec<Episode>, ApiError> {
        let cutoff = utils::cutoff(self.now(), days);
        let items = self.api.show_episodes(show_id, EPISODES_PER_SHOW).await?;

        Ok(items
            .into_iter()
            .filter(|item| utils::is_on_or_after(&item.release_date, cutoff) == Some(true))
            .map(|item| Episode {
                uri: item.uri,
                name: item.name,
                duration_ms: item.duration_ms,
                release_date: item.release_date,
            })
            .collect())
    }

    /// Runs one reconciliation pass.
    ///
    /// Without `keep_old` the playlist is cleared first. With it, the current
    /// contents are snapshotted and never added again. In both modes an
    /// episode surfaced by more than one show is only added once. Shows are
    /// processed in the given order and each show keeps the order the service
    /// returned; there is no re-sorting by date.
    pub async fn reconcile(
        &self,
        playlist_id: &str,
        shows: &[Show],
        days: u32,
        keep_old: bool,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let mut known: HashSet<String> = if keep_old {
            self.fetch_current_episode_uris(playlist_id)
                .await
                .into_iter()
                .collect()
        } else {
            if let Err(e) = self.clear(playlist_id).await {
                report.clear_error = Some(e);
            }
            HashSet::new()
        };

        let mut staged: Vec<Episode> = Vec::new();

        for show in shows {
            let mut show_report = ShowReport {
                show: show.clone(),
                staged: Vec::new(),
                duplicates: Vec::new(),
                error: None,
            };

            match self.fetch_recent_episodes(&show.id, days).await {
                Ok(episodes) => {
                    for episode in episodes {
                        if known.insert(episode.uri.clone()) {
                            show_report.staged.push(episode.clone());
                            staged.push(episode);
                        } else {
                            show_report.duplicates.push(episode);
                        }
                    }
                }
                Err(e) => show_report.error = Some(e),
            }

            report.shows.push(show_report);
        }

        let uris: Vec<String> = staged.iter().map(|e| e.uri.clone()).collect();
        let applied = match self.add(playlist_id, &uris).await {
            Ok(applied) => applied,
            Err(e) => {
                let applied = e.applied;
                report.add_error = Some(e);
                applied
            }
        };

        report.pending = staged.split_off(applied);
        report.added = staged;
        report.total_duration_ms = report.added.iter().map(|e| e.duration_ms).sum();
        report
    }

    /// Stamps the playlist description with the time of this run.
    pub async fn update_description(&self, playlist_id: &str) -> Result<(), ApiError> {
        let description = utils::update_description(self.now());
        self.api.update_description(playlist_id, &description).await
    }

    /// Uploads a JPEG as playlist cover. Files above 256KB are rejected
    /// before anything is sent.
    pub async fn set_cover(&self, playlist_id: &str, image_path: &Path) -> Result<(), CoverError> {
        let image = async_fs::read(image_path)
            .await
            .map_err(|source| CoverError::Read {
                path: image_path.to_path_buf(),
                source,
            })?;

        if image.len() > MAX_COVER_BYTES {
            return Err(CoverError::TooLarge {
                kib: image.len() / 1024,
            });
        }

        self.api
            .upload_cover(playlist_id, STANDARD.encode(&image))
            .await?;
        Ok(())
    }
}
