//! Output naming.
//!
//! The stream directory is derived from the top-level playlist URL so two
//! mirrors of different streams do not collide. Segment file names start with
//! the batch fetch timestamp and the zero-padded position in the batch, which
//! keeps lexical order equal to playlist order whatever order the concurrent
//! downloads finish in.

use chrono::{DateTime, TimeZone};
use url::Url;

use crate::hls::HlsMirrorError;
use crate::hls::segment_id::{path_basename, strip_extension};

const DIR_SUFFIX: &str = "_hls_segments";
const FALLBACK_SEGMENT_NAME: &str = "segment";

/// Replace everything outside `[A-Za-z0-9_-]` with `_`.
pub fn sanitize_component(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `<name>_hls_segments` for a playlist URL.
///
/// `<name>` is the playlist file stem, or the host with dots turned into
/// underscores when the path has no file name.
pub fn output_dir_name(playlist_url: &str) -> Result<String, HlsMirrorError> {
    let url = Url::parse(playlist_url).map_err(|e| HlsMirrorError::invalid_url(playlist_url, e))?;

    let basename = path_basename(&url);
    let stem = basename
        .as_deref()
        .map(strip_extension)
        .filter(|stem| !stem.is_empty());

    let name = match stem {
        Some(stem) => sanitize_component(stem),
        None => {
            let host = url
                .host_str()
                .filter(|h| !h.is_empty())
                .ok_or_else(|| HlsMirrorError::invalid_url(playlist_url, "URL has no host"))?;
            sanitize_component(&host.replace('.', "_"))
        }
    };

    Ok(format!("{name}{DIR_SUFFIX}"))
}

/// Timestamp prefix shared by every file of one batch.
pub fn fetch_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// `{timestamp}_{index:05}_{basename}`; a basename that does not already end
/// in `.{segment_extension}` gets it appended (`seg1.m4s` becomes `seg1.m4s.ts`).
pub fn segment_file_name(
    timestamp: &str,
    batch_index: usize,
    url: &Url,
    segment_extension: &str,
) -> String {
    let basename = path_basename(url).unwrap_or_else(|| FALLBACK_SEGMENT_NAME.to_string());
    let has_extension = basename
        .strip_suffix(segment_extension)
        .is_some_and(|rest| rest.ends_with('.'));

    if segment_extension.is_empty() || has_extension {
        format!("{timestamp}_{batch_index:05}_{basename}")
    } else {
        format!("{timestamp}_{batch_index:05}_{basename}.{segment_extension}")
    }
}
