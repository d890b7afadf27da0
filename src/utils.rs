//! Text, timestamp, and file system helpers.
//!
//! This module provides helper functions used throughout the application:
//! - Markup stripping and summary truncation for feed text
//! - Timestamp parsing for the many date formats feeds use in practice
//! - Date keys and display times for snapshots
//! - String truncation for logging
//! - File system validation for output directories

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs as stdfs;
use std::io;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Maximum summary length in characters, not counting the ellipsis.
pub const MAX_SUMMARY_LENGTH: usize = 200;

/// Appended to summaries that were cut at [`MAX_SUMMARY_LENGTH`].
pub const ELLIPSIS: char = '…';

/// Shown in place of a missing publish time.
pub const UNKNOWN_TIME: &str = "Unknown time";

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Remove tag-like substrings, collapse whitespace runs, and trim.
///
/// Tags are replaced by a space so that `a<br>b` becomes `a b`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(strip_markup("<p>Hello <b>world</b></p>"), "Hello world");
/// ```
pub fn strip_markup(html: &str) -> String {
    let without_tags = TAG_RE.replace_all(html, " ");
    WS_RE.replace_all(&without_tags, " ").trim().to_string()
}

/// Cut `text` to `max` characters, appending [`ELLIPSIS`] when anything was cut.
///
/// The ellipsis is added after truncation, so a cut result is `max + 1`
/// characters long. Applying the function twice gives the same result as
/// applying it once.
pub fn truncate_text(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        None => text.to_string(),
        Some((byte_idx, _)) => {
            let mut out = String::with_capacity(byte_idx + ELLIPSIS.len_utf8());
            out.push_str(&text[..byte_idx]);
            out.push(ELLIPSIS);
            out
        }
    }
}

/// Parse a feed timestamp into UTC.
///
/// Accepted formats, tried in order:
/// - RFC 2822 (`Tue, 06 May 2025 08:30:00 GMT`), the RSS `pubDate` format,
///   also with a `UTC` zone name
/// - RFC 3339 (`2025-05-06T08:30:00Z`), the Atom format
/// - ISO 8601 with a colon-less offset (`2025-05-06T08:30:00.000+0000`)
/// - naive `2025-05-06T08:30:00[.fff]`, `2025-05-06 08:30:00`, `2025-05-06`,
///   interpreted as UTC
///
/// Empty or unrecognised input yields `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    // chrono knows `UT` and `GMT` but not `UTC`.
    let rfc2822 = match raw.strip_suffix(" UTC") {
        Some(head) => format!("{head} +0000"),
        None => raw.to_string(),
    };
    if let Ok(dt) = DateTime::parse_from_rfc2822(&rfc2822) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Snapshot key for the UTC calendar day of `now`, formatted `YYYY-MM-DD`.
pub fn date_key(now: DateTime<Utc>) -> String {
    now.date_naive().format("%Y-%m-%d").to_string()
}

/// Human-readable publish time in local time, or [`UNKNOWN_TIME`].
pub fn format_display_time(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        None => UNKNOWN_TIME.to_string(),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((idx, _)) => format!("{}…(+{} bytes)", &s[..idx], s.len() - idx),
    }
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}
