use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category assigned to a post card. Exactly one applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    /// An original post with no other signal.
    #[default]
    Tweet,
    Reply,
    Repost,
    Quote,
}

impl PostType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tweet => "tweet",
            Self::Reply => "reply",
            Self::Repost => "repost",
            Self::Quote => "quote",
        }
    }

    /// Display label shown next to the save affordance.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tweet => "Tweet",
            Self::Reply => "Reply",
            Self::Repost => "Repost",
            Self::Quote => "Quote",
        }
    }
}

/// A type string that names no [`PostType`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown post type '{0}'")]
pub struct UnknownPostType(pub String);

impl FromStr for PostType {
    type Err = UnknownPostType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tweet" => Ok(Self::Tweet),
            "reply" => Ok(Self::Reply),
            "repost" => Ok(Self::Repost),
            "quote" => Ok(Self::Quote),
            _ => Err(UnknownPostType(s.to_string())),
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display name and handle of a post's author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    pub name: String,
    /// Handle without the leading `@`.
    pub handle: String,
}

/// The embedded post of a quote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotedPost {
    pub text: String,
    pub author: Author,
    /// Absolute URL of the quoted post, empty when no distinct link was found.
    pub link: String,
}

/// Canonical record extracted from one card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostRecord {
    pub id: String,
    pub text: String,
    pub author: Author,
    /// ISO-8601 timestamp of the post.
    pub date: String,
    /// Human-readable timestamp as rendered.
    pub date_text: String,
    pub link: String,
    #[serde(rename = "type")]
    pub post_type: PostType,
    /// Author of the reposted post; empty unless `post_type` is `Repost`.
    pub original_author: String,
    #[serde(alias = "quotedTweet")]
    pub quoted_post: Option<QuotedPost>,
    pub has_media: bool,
    /// ISO-8601 time of extraction.
    pub saved_at: String,
}
