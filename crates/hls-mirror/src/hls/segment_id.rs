use percent_encoding::percent_decode_str;
use url::Url;

use crate::hls::HlsMirrorError;

/// Percent-decoded last path segment of `url`, `None` for directory-like paths.
pub fn path_basename(url: &Url) -> Option<String> {
    let path = percent_decode_str(url.path()).decode_utf8_lossy();
    match path.rsplit('/').next().unwrap_or_default() {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

/// `name` without its final `.ext` suffix.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) => &name[..pos],
        None => name,
    }
}

/// Deduplication key for a segment.
///
/// A trailing run of digits in the file stem wins (`segment00042.ts` gives
/// `"42"`), because encoders number segments monotonically and the number
/// survives the live window sliding. Opaque names fall back to
/// `"{sequence}_{index}"`, which is only stable while the segment keeps its
/// position in the playlist.
pub fn derive_segment_id(url: &Url, sequence: u64, index: usize) -> Result<String, HlsMirrorError> {
    let basename =
        path_basename(url).ok_or_else(|| HlsMirrorError::InvalidFilename(url.to_string()))?;
    let stem = strip_extension(&basename);

    Ok(trailing_number(stem).unwrap_or_else(|| format!("{sequence}_{index}")))
}

fn trailing_number(stem: &str) -> Option<String> {
    let digits_start = stem
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;

    stem[digits_start..]
        .parse::<u64>()
        .ok()
        .map(|n| n.to_string())
}
