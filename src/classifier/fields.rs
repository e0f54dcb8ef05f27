//! Field extraction shared by the outer card and quoted cards.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use url::Url;

use super::record::Author;
use super::ExtractError;
use crate::dom::{CardNode, Marker};

/// Pattern to extract a post ID from a status URL.
static STATUS_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/status/(\d+)").unwrap());

/// Hosts that serve the same posts as the canonical origin.
const MIRROR_HOSTS: &[&str] = &[
    "twitter.com",
    "www.twitter.com",
    "mobile.twitter.com",
    "x.com",
    "www.x.com",
    "mobile.x.com",
];

/// Extract the post ID from a status URL or path.
///
/// Status URLs have format: `https://x.com/{user}/status/{id}`
#[must_use]
pub fn extract_status_id(url: &str) -> Option<String> {
    STATUS_ID_PATTERN
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Number of `/status/<id>` segments in a URL.
#[must_use]
pub fn count_status_segments(url: &str) -> usize {
    STATUS_ID_PATTERN.find_iter(url).count()
}

/// Resolve an `href` against the site origin and map mirror hosts onto it.
///
/// # Errors
///
/// Returns an error if the href cannot be joined to the origin.
pub fn absolutize(href: &str, origin: &Url) -> Result<String, ExtractError> {
    let mut url = origin.join(href).map_err(|e| ExtractError::InvalidLink {
        href: href.to_string(),
        source: e,
    })?;

    let host = url.host_str().map(str::to_lowercase);
    if let (Some(host), Some(origin_host)) = (host, origin.host_str()) {
        if host != origin_host && MIRROR_HOSTS.contains(&host.as_str()) {
            if let Err(e) = url.set_host(Some(origin_host)) {
                debug!(href, error = %e, "Keeping mirror host");
            } else if url.set_scheme(origin.scheme()).is_err() {
                debug!(href, scheme = origin.scheme(), "Keeping mirror scheme");
            }
        }
    }

    Ok(url.to_string())
}

/// Split the text runs of a display-name block into name and handle.
///
/// The block renders as the name, `@handle`, then decorations such as the
/// separator dot and relative time. Inline markup (emoji images, badges)
/// can break the name into several runs; everything before the first
/// `@` run is the name. Without an `@` run the first two runs are taken as
/// name and handle.
#[must_use]
pub fn split_author(blocks: &[String]) -> Author {
    // The name itself may start with '@', so the handle search skips it.
    if let Some(at) = blocks
        .iter()
        .skip(1)
        .position(|run| run.starts_with('@'))
        .map(|i| i + 1)
    {
        return Author {
            name: blocks[..at].join(" "),
            handle: blocks[at].replacen('@', "", 1),
        };
    }

    let name = blocks.first().cloned().unwrap_or_default();
    let handle = blocks
        .get(1)
        .map(|h| h.replacen('@', "", 1))
        .unwrap_or_default();
    Author { name, handle }
}

/// Author of the first display-name block under `node`.
pub fn read_author<N: CardNode>(node: &N) -> Author {
    node.find_first(Marker::AuthorName)
        .map(|el| split_author(&el.text_blocks()))
        .unwrap_or_default()
}

/// Text of the first post-text block under `node`, or empty.
pub fn read_text<N: CardNode>(node: &N) -> String {
    node.find_first(Marker::PostText)
        .map(|el| el.text())
        .unwrap_or_default()
}

/// Machine-readable and display timestamps of the first time element.
pub fn read_timestamp<N: CardNode>(node: &N) -> (Option<String>, String) {
    node.find_first(Marker::Timestamp).map_or((None, String::new()), |el| {
        let machine = el.attr("datetime").filter(|d| !d.is_empty());
        (machine, el.text())
    })
}

/// First status link under `node` whose ID differs from `exclude_id`.
///
/// Links without a numeric ID are skipped too.
pub fn first_distinct_status_link<N: CardNode>(
    node: &N,
    exclude_id: Option<&str>,
) -> Option<String> {
    node.find_all(Marker::StatusLink).into_iter().find_map(|link| {
        let href = link.attr("href")?;
        let id = extract_status_id(&href)?;
        (Some(id.as_str()) != exclude_id).then_some(href)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_origin;

    #[test]
    fn test_extract_status_id() {
        assert_eq!(
            extract_status_id("https://x.com/user/status/1234567890"),
            Some("1234567890".to_string())
        );
        assert_eq!(
            extract_status_id("/user/status/123/photo/1"),
            Some("123".to_string())
        );
        assert_eq!(extract_status_id("https://x.com/user"), None);
        assert_eq!(extract_status_id("/user/status/"), None);
    }

    #[test]
    fn test_count_status_segments() {
        assert_eq!(count_status_segments("https://x.com/a/status/1"), 1);
        assert_eq!(count_status_segments("https://x.com/a/status/1/status/2"), 2);
        assert_eq!(count_status_segments("https://x.com/a"), 0);
    }

    #[test]
    fn test_absolutize_relative_and_absolute() {
        let origin = default_origin();
        assert_eq!(
            absolutize("/alice/status/1", &origin).unwrap(),
            "https://x.com/alice/status/1"
        );
        assert_eq!(
            absolutize("alice/status/1", &origin).unwrap(),
            "https://x.com/alice/status/1"
        );
        assert_eq!(
            absolutize("https://x.com/alice/status/1", &origin).unwrap(),
            "https://x.com/alice/status/1"
        );
    }

    #[test]
    fn test_absolutize_maps_mirror_hosts() {
        let origin = default_origin();
        assert_eq!(
            absolutize("http://mobile.twitter.com/alice/status/1", &origin).unwrap(),
            "https://x.com/alice/status/1"
        );
        assert_eq!(
            absolutize("https://example.com/alice/status/1", &origin).unwrap(),
            "https://example.com/alice/status/1"
        );
    }

    #[test]
    fn test_split_author() {
        let blocks: Vec<String> = ["Alice Smith", "@alice", "·", "2h"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let author = split_author(&blocks);
        assert_eq!(author.name, "Alice Smith");
        assert_eq!(author.handle, "alice");

        let only_name = split_author(&["Solo".to_string()]);
        assert_eq!(only_name.name, "Solo");
        assert_eq!(only_name.handle, "");

        assert_eq!(split_author(&[]), Author::default());
    }

    #[test]
    fn test_split_author_joins_inline_name_runs() {
        let blocks: Vec<String> = ["Alice", "Smith", "@alice", "·", "2h"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let author = split_author(&blocks);
        assert_eq!(author.name, "Alice Smith");
        assert_eq!(author.handle, "alice");
    }
}
