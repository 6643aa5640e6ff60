use std::{path::PathBuf, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    config::{self, Config},
    error, info,
    management::{CredentialStore, PlaylistReconciler, ReconcileReport, TokenManager},
    spotify::{
        auth::{BrowserAuthorizer, SpotifyAccounts},
        client::SpotifyClient,
    },
    success,
    types::EpisodeTableRow,
    utils, warning,
};

/// Options of a single playlist update run.
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    pub days: u32,
    pub keep_old: bool,
    pub playlist: String,
    pub cover: Option<PathBuf>,
}

/// Runs the daily update: authenticate, resolve the playlist, reconcile it
/// with the recent episodes and report what happened.
///
/// Exits with code 1 on configuration or authorization errors. Everything
/// after that is best effort: failures are reported and the run goes on.
pub async fn update(opts: UpdateOptions) {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) if e.is_credential_error() => error!(
            "{}\nSet {} and {} in the environment or in ~/.local/share/podqueue/.env.\nGet these from https://developer.spotify.com/dashboard",
            e,
            config::CLIENT_ID_KEY,
            config::CLIENT_SECRET_KEY
        ),
        Err(e) => error!("{}", e),
    };

    let store = CredentialStore::from_config(&config);
    let authorizer = match BrowserAuthorizer::from_config(&config) {
        Ok(authorizer) => authorizer,
        Err(e) => error!("{}", e),
    };

    let mut token_mgr = TokenManager::new(
        &config,
        store.clone(),
        SpotifyAccounts::new(&config),
        authorizer,
    );
    let access_token = match token_mgr.ensure_authenticated().await {
        Ok(token) => token,
        Err(e) => error!("Authorization failed: {}", e),
    };

    let reconciler = PlaylistReconciler::new(SpotifyClient::new(&config, access_token), store);

    info!("Playlist: {}", opts.playlist);
    let playlist_id = match reconciler.resolve_playlist(&opts.playlist).await {
        Ok(id) => id,
        Err(e) => {
            warning!("Failed to create/find playlist: {}", e);
            return;
        }
    };

    if let Some(cover) = opts.cover.as_ref().or(config.cover_image.as_ref()) {
        info!("Setting cover image...");
        match reconciler.set_cover(&playlist_id, cover).await {
            Ok(()) => success!("Cover updated!"),
            Err(e) => warning!("{}", e),
        }
    }

    if !opts.keep_old {
        info!("Clearing old episodes...");
    }

    let pb = spinner(format!(
        "Fetching episodes of the last {} day(s) from {} show(s)...",
        opts.days,
        config.shows.len()
    ));
    let report = reconciler
        .reconcile(&playlist_id, &config.shows, opts.days, opts.keep_old)
        .await;
    pb.finish_and_clear();

    print_report(&report, opts.days);

    if let Err(e) = reconciler.update_description(&playlist_id).await {
        warning!("Failed to update playlist description: {}", e);
    }

    print_summary(&report, &playlist_id);
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

fn print_report(report: &ReconcileReport, days: u32) {
    if let Some(e) = &report.clear_error {
        warning!("Failed to clear old episodes: {}", e);
    }

    for show in &report.shows {
        info!("{}...", show.show.name);

        if let Some(e) = &show.error {
            warning!("Skipped {}: {}", show.show.name, e);
            continue;
        }

        if show.staged.is_empty() && show.duplicates.is_empty() {
            info!("No episodes in the last {} day(s)", days);
        }

        for episode in &show.staged {
            info!(
                "{} - {} ({}m)",
                episode.release_date,
                utils::truncate(&episode.name, 40),
                episode.duration_ms / 60_000
            );
        }

        for episode in &show.duplicates {
            info!("Already in playlist: {}", utils::truncate(&episode.name, 40));
        }
    }

    let staged = report.added.len() + report.pending.len();
    if staged == 0 {
        return;
    }

    info!("Adding {} episode(s) to playlist...", staged);
    match &report.add_error {
        None => success!("Episodes added!"),
        Some(e) => warning!("Failed to add some episodes: {}", e),
    }
}

fn print_summary(report: &ReconcileReport, playlist_id: &str) {
    if !report.added.is_empty() {
        let rows: Vec<EpisodeTableRow> = report
            .shows
            .iter()
            .flat_map(|show| {
                show.staged
                    .iter()
                    .filter(|e| report.added.contains(e))
                    .map(|e| EpisodeTableRow {
                        date: e.release_date.clone(),
                        show: show.show.name.clone(),
                        episode: utils::truncate(&e.name, 40),
                        minutes: e.duration_ms / 60_000,
                    })
            })
            .collect();

        println!("{}", Table::new(rows));
    }

    success!(
        "Playlist updated: {} new episode(s) ({} min)",
        report.added.len(),
        report.total_minutes()
    );
    info!("Open in Spotify: {}", utils::playlist_link(playlist_id));
}
