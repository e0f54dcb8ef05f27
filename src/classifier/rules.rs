//! Ordered detection rules.
//!
//! Each tier is a table of named, independent rules tried in order; the
//! first rule that fires wins and its name is recorded in the signal trace.

use std::sync::LazyLock;

use regex::Regex;

use super::fields::count_status_segments;
use super::ClassifierConfig;
use crate::dom::{top_level, CardNode, Marker};

/// Social-context phrasings that announce a repost.
static REPOST_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)reposted|retweeted|转推").unwrap());

/// "Replying to @user" annotation, in the locales the feed renders.
static REPLY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)replying\s+to|回复给").unwrap());

/// Post text that opens by addressing another account.
static LEADING_MENTION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@\w+\s+").unwrap());

/// What the rules may look at for one card.
pub(crate) struct CardContext<'a, N> {
    pub card: &'a N,
    /// The post's own text.
    pub text: &'a str,
    /// Absolute main status link.
    pub link: &'a str,
    pub repost_context: bool,
    pub config: &'a ClassifierConfig,
}

pub(crate) type QuoteRule<N> = fn(&CardContext<'_, N>) -> Option<N>;
pub(crate) type ReplyRule<N> = fn(&CardContext<'_, N>) -> bool;

/// Quote boundary searches, highest priority first.
pub(crate) fn quote_rules<N: CardNode>() -> [(&'static str, QuoteRule<N>); 3] {
    [
        ("quote-marker", quote_marker),
        ("nested-card", nested_card),
        ("second-text-block", second_text_block),
    ]
}

/// Reply signals; any one is sufficient.
pub(crate) fn reply_rules<N: CardNode>() -> [(&'static str, ReplyRule<N>); 4] {
    [
        ("replying-to-annotation", replying_to_annotation),
        ("chained-status-link", chained_status_link),
        ("leading-mention", leading_mention),
        ("thread-structure", thread_structure),
    ]
}

/// Whether a social-context annotation text announces a repost.
pub(crate) fn is_repost_context(text: &str) -> bool {
    REPOST_PATTERN.is_match(text)
}

/// Run a quote rule table, returning the winning rule and boundary.
pub(crate) fn find_quote<N: CardNode>(ctx: &CardContext<'_, N>) -> Option<(&'static str, N)> {
    quote_rules()
        .into_iter()
        .find_map(|(name, rule)| rule(ctx).map(|boundary| (name, boundary)))
}

/// Run the reply rule table, returning the first rule that fired.
pub(crate) fn find_reply<N: CardNode>(ctx: &CardContext<'_, N>) -> Option<&'static str> {
    reply_rules()
        .into_iter()
        .find_map(|(name, rule)| rule(ctx).then_some(name))
}

fn quote_marker<N: CardNode>(ctx: &CardContext<'_, N>) -> Option<N> {
    ctx.card.find_first(Marker::QuoteCard)
}

fn nested_card<N: CardNode>(ctx: &CardContext<'_, N>) -> Option<N> {
    if ctx.repost_context {
        return None;
    }
    ctx.card
        .find_all(Marker::Card)
        .into_iter()
        .find(|nested| !nested.same_node(ctx.card) && nested.is_strict_descendant_of(ctx.card))
}

/// A quote rendered without structural nesting shows a second text block.
fn second_text_block<N: CardNode>(ctx: &CardContext<'_, N>) -> Option<N> {
    if ctx.repost_context {
        return None;
    }
    let second = ctx.card.find_all(Marker::PostText).into_iter().nth(1)?;
    let container = second
        .closest(Marker::LinkContainer)
        .or_else(|| second.closest(Marker::Card))
        .or_else(|| second.parent())?;
    container
        .is_strict_descendant_of(ctx.card)
        .then_some(container)
}

fn replying_to_annotation<N: CardNode>(ctx: &CardContext<'_, N>) -> bool {
    if REPLY_PATTERN.is_match(ctx.card.text().trim()) {
        return true;
    }
    ctx.card.find_all(Marker::TextRun).iter().any(|run| {
        let text = run.text();
        let text = text.trim();
        text.contains("Replying to") || text.contains("回复给")
    })
}

fn chained_status_link<N: CardNode>(ctx: &CardContext<'_, N>) -> bool {
    count_status_segments(ctx.link) > 1
}

fn leading_mention<N: CardNode>(ctx: &CardContext<'_, N>) -> bool {
    LEADING_MENTION_PATTERN.is_match(ctx.text.trim())
}

/// Threaded replies render as a short run of sibling cards.
///
/// Walk up from the card; the first ancestor holding a bounded number of
/// top-level cards decides. Timelines hold far more cards than the upper
/// bound, so they never match.
fn thread_structure<N: CardNode>(ctx: &CardContext<'_, N>) -> bool {
    let bounds = &ctx.config.thread_siblings;
    let mut current = ctx.card.parent();

    for _ in 0..ctx.config.thread_max_depth {
        let Some(ancestor) = current else {
            break;
        };
        let group = top_level(&ancestor.find_all(Marker::Card));
        if bounds.contains(&group.len()) {
            return group
                .iter()
                .position(|member| member.same_node(ctx.card))
                .is_some_and(|pos| pos > 0);
        }
        current = ancestor.parent();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repost_context_phrasings() {
        assert!(is_repost_context("Bob reposted"));
        assert!(is_repost_context("You Reposted"));
        assert!(is_repost_context("Carol Retweeted"));
        assert!(is_repost_context("Dave 转推了"));
        assert!(!is_repost_context("Pinned"));
        assert!(!is_repost_context("Bob liked"));
    }

    #[test]
    fn test_reply_pattern() {
        assert!(REPLY_PATTERN.is_match("Replying to @alice"));
        assert!(REPLY_PATTERN.is_match("replying   to @alice"));
        assert!(REPLY_PATTERN.is_match("回复给 @alice"));
        assert!(!REPLY_PATTERN.is_match("Reply"));
    }

    #[test]
    fn test_leading_mention_pattern() {
        assert!(LEADING_MENTION_PATTERN.is_match("@alice thanks!"));
        assert!(LEADING_MENTION_PATTERN.is_match("@a_b\nhi"));
        assert!(!LEADING_MENTION_PATTERN.is_match("@alice"));
        assert!(!LEADING_MENTION_PATTERN.is_match("hi @alice there"));
        assert!(!LEADING_MENTION_PATTERN.is_match("email@alice.com ok"));
    }

    #[test]
    fn test_rule_tables_are_ordered() {
        let quote: Vec<&str> = quote_rules::<crate::dom::HtmlCard<'_>>()
            .iter()
            .map(|(name, _)| *name)
            .collect();
        assert_eq!(quote, ["quote-marker", "nested-card", "second-text-block"]);

        let reply: Vec<&str> = reply_rules::<crate::dom::HtmlCard<'_>>()
            .iter()
            .map(|(name, _)| *name)
            .collect();
        assert_eq!(
            reply,
            [
                "replying-to-annotation",
                "chained-status-link",
                "leading-mention",
                "thread-structure"
            ]
        );
    }
}
