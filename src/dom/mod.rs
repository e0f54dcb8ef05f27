//! Query capability over a rendered post card.
//!
//! The classifier never touches a concrete document model. It asks questions
//! of a [`CardNode`] handle, so the same heuristics run against parsed HTML
//! snapshots, a live browser bridge, or hand-built fixtures.

mod html;

pub use html::{HtmlCard, HtmlSnapshot};

/// Structural markers the classifier looks for inside a card.
///
/// Each marker corresponds to a CSS selector over the feed's rendered
/// markup; [`Marker::css`] is the canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// A post card (`article[data-testid="tweet"]`).
    Card,
    /// Dedicated quoted-post wrapper.
    QuoteCard,
    /// The post's own text block.
    PostText,
    /// Combined display-name / handle block.
    AuthorName,
    /// Timestamp element carrying a machine-readable `datetime`.
    Timestamp,
    /// Any anchor pointing at a status path.
    StatusLink,
    /// "X reposted" style annotation above the card.
    SocialContext,
    /// Photo or video attachment.
    Media,
    /// Clickable container that wraps an embedded card.
    LinkContainer,
    /// Broad set of text-bearing elements used for fallback text scans.
    TextRun,
}

impl Marker {
    /// All markers, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Card,
        Self::QuoteCard,
        Self::PostText,
        Self::AuthorName,
        Self::Timestamp,
        Self::StatusLink,
        Self::SocialContext,
        Self::Media,
        Self::LinkContainer,
        Self::TextRun,
    ];

    /// CSS selector text for this marker.
    #[must_use]
    pub const fn css(self) -> &'static str {
        match self {
            Self::Card => r#"article[data-testid="tweet"]"#,
            Self::QuoteCard => r#"[data-testid="quoteTweet"]"#,
            Self::PostText => r#"[data-testid="tweetText"]"#,
            Self::AuthorName => r#"[data-testid="User-Name"]"#,
            Self::Timestamp => "time",
            Self::StatusLink => r#"a[href*="/status/"]"#,
            Self::SocialContext => r#"[data-testid="socialContext"]"#,
            Self::Media => r#"[data-testid="tweetPhoto"], [data-testid="videoComponent"]"#,
            Self::LinkContainer => r#"div[role="link"]"#,
            Self::TextRun => "span, a, div",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Read-only handle to one element of a rendered card tree.
///
/// Implementations must be cheap to clone; the classifier clones handles
/// freely while walking ancestors.
pub trait CardNode: Clone {
    /// First strict descendant matching `marker`, in document order.
    fn find_first(&self, marker: Marker) -> Option<Self>;

    /// All strict descendants matching `marker`, in document order.
    fn find_all(&self, marker: Marker) -> Vec<Self>;

    /// Rendered text of this element and its descendants.
    ///
    /// Content under hidden descendants is left out; a hidden element still
    /// reports its own content.
    fn text(&self) -> String;

    /// Non-empty, trimmed text runs in document order.
    ///
    /// For a display-name block this yields `["Name", "@handle", ...]`.
    fn text_blocks(&self) -> Vec<String> {
        self.text()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect()
    }

    /// Attribute value, if present.
    fn attr(&self, name: &str) -> Option<String>;

    /// Parent element, if any.
    fn parent(&self) -> Option<Self>;

    /// Whether this element itself matches `marker`.
    fn matches(&self, marker: Marker) -> bool;

    /// Identity comparison: both handles refer to the same element.
    fn same_node(&self, other: &Self) -> bool;

    /// True when `ancestor` is a proper ancestor of this element.
    fn is_strict_descendant_of(&self, ancestor: &Self) -> bool {
        let mut current = self.parent();
        while let Some(node) = current {
            if node.same_node(ancestor) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Nearest ancestor-or-self matching `marker`.
    fn closest(&self, marker: Marker) -> Option<Self> {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            if node.matches(marker) {
                return Some(node);
            }
            current = node.parent();
        }
        None
    }
}

/// Keep only the cards whose nearest enclosing card is not in the list.
///
/// `cards` is expected to be every card under some scope, as returned by
/// [`CardNode::find_all`]; a card nested deeper than one level then still
/// has its direct enclosing card in the list. Only nested cards pay for a
/// membership scan.
#[must_use]
pub fn top_level<N: CardNode>(cards: &[N]) -> Vec<N> {
    cards
        .iter()
        .filter(|card| {
            match card.parent().and_then(|parent| parent.closest(Marker::Card)) {
                Some(outer) => !cards.iter().any(|other| other.same_node(&outer)),
                None => true,
            }
        })
        .cloned()
        .collect()
}
