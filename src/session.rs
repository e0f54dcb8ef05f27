//! Per-page bookkeeping for cards that already carry a save affordance.

use std::collections::HashSet;

use tracing::debug;

/// Post IDs whose cards have been processed on the current page.
///
/// Keyed by post ID rather than card identity, because feeds re-render the
/// same post into fresh elements. A navigation starts a new generation with
/// an empty set.
#[derive(Debug, Default)]
pub struct CardRegistry {
    processed: HashSet<String>,
    generation: u64,
}

impl CardRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a post as processed. Returns `false` if it already was.
    pub fn mark_processed(&mut self, post_id: &str) -> bool {
        self.processed.insert(post_id.to_string())
    }

    #[must_use]
    pub fn is_processed(&self, post_id: &str) -> bool {
        self.processed.contains(post_id)
    }

    /// Forget a post so a later pass retries it.
    pub fn release(&mut self, post_id: &str) -> bool {
        self.processed.remove(post_id)
    }

    /// Drop all state at a page navigation.
    pub fn reset_on_navigation(&mut self) {
        debug!(
            generation = self.generation,
            released = self.processed.len(),
            "Resetting processed cards"
        );
        self.processed.clear();
        self.generation += 1;
    }

    /// Number of navigations seen so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.processed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }
}
