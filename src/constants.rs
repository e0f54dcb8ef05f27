//! Shared constants used across the application.

/// Origin that relative status links are resolved against.
///
/// The feed renders most links as site-relative paths (`/user/status/123`);
/// stored records always carry absolute URLs rooted here.
pub const DEFAULT_SITE_ORIGIN: &str = "https://x.com";

/// Default bounds for the threaded-reply structural heuristic.
///
/// A conversation view renders a handful of top-level cards under one
/// container, while a home timeline renders dozens.
pub const DEFAULT_THREAD_MIN_SIBLINGS: usize = 2;
pub const DEFAULT_THREAD_MAX_SIBLINGS: usize = 4;

/// How many ancestors above a card the structural heuristic inspects.
pub const DEFAULT_THREAD_MAX_DEPTH: usize = 25;

/// Prefix for exported backup files.
pub const EXPORT_FILE_PREFIX: &str = "x-tweets-backup";
