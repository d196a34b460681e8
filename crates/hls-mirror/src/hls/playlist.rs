// HLS playlist parsing: classification, media sequence and URL extraction.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{trace, warn};
use url::Url;

use crate::hls::HlsMirrorError;

const VARIANT_STREAM_TAG: &str = "#EXT-X-STREAM-INF";
const SEGMENT_DURATION_TAG: &str = "#EXTINF";

static MEDIA_SEQUENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"#EXT-X-MEDIA-SEQUENCE:(\d+)").expect("media sequence pattern is valid")
});

/// One parsed snapshot of a playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    /// Absolute URLs in document order
    pub entries: Vec<Url>,
    /// `true` when the entries are media playlists rather than segments
    pub is_master: bool,
    /// Declared `#EXT-X-MEDIA-SEQUENCE`, 0 when absent or unparsable
    pub sequence: u64,
    /// URI lines dropped because they could not be resolved
    pub rejected_lines: usize,
}

impl Playlist {
    /// Parse `content`, resolving every URI line against `base_url`.
    ///
    /// Only a document with no recognisable markers or an unparsable base
    /// URL is an error. A bad URI line is logged and skipped.
    pub fn parse(content: &str, base_url: &str) -> Result<Self, HlsMirrorError> {
        let has_variants = content.contains(VARIANT_STREAM_TAG);
        let has_segments = content.contains(SEGMENT_DURATION_TAG);

        let is_master = match (has_variants, has_segments) {
            (true, true) => {
                warn!(url = %base_url, "Playlist carries both master and media tags, treating it as a media playlist");
                false
            }
            (true, false) => true,
            (false, true) => false,
            (false, false) => {
                return Err(HlsMirrorError::UnrecognizedFormat {
                    url: base_url.to_string(),
                });
            }
        };

        let sequence = extract_media_sequence(content);

        let base = Url::parse(base_url).map_err(|e| HlsMirrorError::invalid_url(base_url, e))?;

        let mut entries = Vec::new();
        let mut rejected_lines = 0;
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match resolve_reference(&base, line) {
                Ok(url) => entries.push(url),
                Err(e) => {
                    warn!(line = %line, error = %e, "Skipping unresolvable playlist entry");
                    rejected_lines += 1;
                }
            }
        }

        trace!(
            url = %base_url,
            entries = entries.len(),
            is_master,
            sequence,
            "Playlist parsed"
        );

        Ok(Self {
            entries,
            is_master,
            sequence,
            rejected_lines,
        })
    }
}

/// First `#EXT-X-MEDIA-SEQUENCE` value, or 0.
pub fn extract_media_sequence(content: &str) -> u64 {
    MEDIA_SEQUENCE_RE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .unwrap_or(0)
}

/// Resolve `reference` against `base`; a reference without a query inherits
/// the base's query so token-signed playlists keep working for segments.
pub fn resolve_reference(base: &Url, reference: &str) -> Result<Url, HlsMirrorError> {
    let mut resolved = base
        .join(reference)
        .map_err(|e| HlsMirrorError::invalid_url(reference, e))?;

    let base_query = base.query().filter(|q| !q.is_empty());
    if resolved.query().is_none_or(str::is_empty) {
        if let Some(query) = base_query {
            resolved.set_query(Some(query));
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEDIA: &str = "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-TARGETDURATION:4
#EXT-X-MEDIA-SEQUENCE:1203
#EXTINF:4.000,
segment01203.ts
#EXTINF:4.000,

   segment01204.ts
#EXTINF:4.000,
https://other.example.com/abs/segment01205.ts
";

    const MASTER: &str = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=1280000,RESOLUTION=640x360
low/index.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=2560000,RESOLUTION=1280x720
high/index.m3u8
";

    #[test]
    fn media_playlist_entries_and_sequence() {
        let playlist = Playlist::parse(MEDIA, "https://cdn.example.com/live/stream.m3u8").unwrap();

        assert!(!playlist.is_master);
        assert_eq!(playlist.sequence, 1203);
        assert_eq!(playlist.rejected_lines, 0);
        let entries: Vec<&str> = playlist.entries.iter().map(Url::as_str).collect();
        assert_eq!(
            entries,
            vec![
                "https://cdn.example.com/live/segment01203.ts",
                "https://cdn.example.com/live/segment01204.ts",
                "https://other.example.com/abs/segment01205.ts",
            ]
        );
    }

    #[test]
    fn master_playlist_keeps_document_order() {
        let playlist = Playlist::parse(MASTER, "https://cdn.example.com/live/master.m3u8").unwrap();

        assert!(playlist.is_master);
        assert_eq!(playlist.sequence, 0);
        assert_eq!(
            playlist.entries[0].as_str(),
            "https://cdn.example.com/live/low/index.m3u8"
        );
        assert_eq!(
            playlist.entries[1].as_str(),
            "https://cdn.example.com/live/high/index.m3u8"
        );
    }

    #[test]
    fn mixed_markers_resolve_as_media() {
        let content = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=1
#EXTINF:2.0,
a.ts
";
        let playlist = Playlist::parse(content, "https://h/p/pl.m3u8").unwrap();
        assert!(!playlist.is_master);
        assert_eq!(playlist.entries.len(), 1);
    }

    #[test]
    fn no_markers_is_unrecognized() {
        let err = Playlist::parse("#EXTM3U\nfoo.ts\n", "https://h/p/pl.m3u8").unwrap_err();
        assert!(matches!(err, HlsMirrorError::UnrecognizedFormat { .. }));
    }

    #[test]
    fn bad_base_url_fails() {
        let err = Playlist::parse(MEDIA, "not a url").unwrap_err();
        assert!(matches!(err, HlsMirrorError::InvalidUrl { .. }));
    }

    #[test]
    fn unresolvable_line_is_skipped() {
        let content = "#EXTM3U
#EXTINF:2.0,
http://[::1/broken.ts
#EXTINF:2.0,
ok.ts
";
        let playlist = Playlist::parse(content, "https://h/p/pl.m3u8").unwrap();
        assert_eq!(playlist.rejected_lines, 1);
        assert_eq!(playlist.entries.len(), 1);
        assert_eq!(playlist.entries[0].as_str(), "https://h/p/ok.ts");
    }

    #[test]
    fn missing_or_garbage_sequence_defaults_to_zero() {
        assert_eq!(extract_media_sequence("#EXTM3U\n#EXTINF:1,\na.ts"), 0);
        assert_eq!(extract_media_sequence("#EXT-X-MEDIA-SEQUENCE:abc"), 0);
        assert_eq!(
            extract_media_sequence("#EXT-X-MEDIA-SEQUENCE:99999999999999999999999"),
            0
        );
        assert_eq!(
            extract_media_sequence("#EXT-X-MEDIA-SEQUENCE:7\n#EXT-X-MEDIA-SEQUENCE:9"),
            7
        );
    }

    #[test]
    fn segment_inherits_base_query() {
        let base = Url::parse("https://h/p/pl.m3u8?tok=1").unwrap();
        assert_eq!(
            resolve_reference(&base, "seg1.ts").unwrap().as_str(),
            "https://h/p/seg1.ts?tok=1"
        );
    }

    #[test]
    fn segment_query_is_not_overridden() {
        let base = Url::parse("https://h/p/pl.m3u8?tok=1").unwrap();
        assert_eq!(
            resolve_reference(&base, "seg1.ts?x=2").unwrap().as_str(),
            "https://h/p/seg1.ts?x=2"
        );
    }

    #[test]
    fn parent_and_root_relative_references() {
        let base = Url::parse("https://h/a/b/pl.m3u8").unwrap();
        assert_eq!(
            resolve_reference(&base, "../c/seg.ts").unwrap().as_str(),
            "https://h/a/c/seg.ts"
        );
        assert_eq!(
            resolve_reference(&base, "/root/seg.ts").unwrap().as_str(),
            "https://h/root/seg.ts"
        );
        assert_eq!(
            resolve_reference(&base, "//mirror.example.com/seg.ts")
                .unwrap()
                .as_str(),
            "https://mirror.example.com/seg.ts"
        );
    }
}
