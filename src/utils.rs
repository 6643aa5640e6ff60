use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::{Rng, distr::Alphanumeric};

/// Random value for the OAuth `state` parameter.
pub fn generate_state() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

/// Parses an episode release date at midnight.
///
/// Accepts the two granularities the service reports for episodes: a full
/// `YYYY-MM-DD` date or a bare `YYYY` year (read as January 1st). Anything
/// else yields `None`.
pub fn parse_release_date(release_date: &str) -> Option<NaiveDateTime> {
    let date = match release_date.len() {
        10 => NaiveDate::parse_from_str(release_date, "%Y-%m-%d").ok()?,
        4 if release_date.chars().all(|c| c.is_ascii_digit()) => {
            let year = release_date.parse::<i32>().ok()?;
            NaiveDate::from_ymd_opt(year, 1, 1)?
        }
        _ => return None,
    };

    date.and_hms_opt(0, 0, 0)
}

/// Start of the recency window: `days` days before `now`. A window reaching
/// past the earliest representable date covers everything.
pub fn cutoff(now: NaiveDateTime, days: u32) -> NaiveDateTime {
    now.checked_sub_signed(Duration::days(i64::from(days)))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Whether an episode released on `release_date` falls on or after `cutoff`.
/// `None` when the date cannot be parsed.
pub fn is_on_or_after(release_date: &str, cutoff: NaiveDateTime) -> Option<bool> {
    parse_release_date(release_date).map(|date| date >= cutoff)
}

pub fn creation_description(now: NaiveDateTime) -> String {
    format!(
        "Daily podcast episodes, updated {}. Auto-generated.",
        now.format("%B %d")
    )
}

pub fn update_description(now: NaiveDateTime) -> String {
    format!(
        "Daily podcast episodes. Last updated: {}",
        now.format("%B %d, %Y at %I:%M %p")
    )
}

/// Shortens a title to `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    let mut short: String = text.chars().take(max).collect();
    short.push_str("...");
    short
}

pub fn playlist_link(playlist_id: &str) -> String {
    format!("https://open.spotify.com/playlist/{}", playlist_id)
}
