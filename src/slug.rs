//! Filesystem-safe, collision-free identifiers for generated articles.
//!
//! A slug names both the Markdown file (`<slug>.md`) and the entry in the
//! state's `used_slugs` history. Slugs are never recycled: once a slug is in
//! the history, a later article with the same title gets a numbered suffix.

use crate::models::PLACEHOLDER_TITLE;
use std::collections::HashSet;
use tracing::debug;

/// Convert a title to a lowercase `snake_case` slug.
///
/// Every maximal run of characters outside `[a-z0-9]` (after lowercasing)
/// becomes a single `_`; leading and trailing separators are dropped. A title
/// with nothing usable maps to [`PLACEHOLDER_TITLE`].
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify("Binary Search"), "binary_search");
/// assert_eq!(slugify("  KMP (Knuth-Morris-Pratt)!! "), "kmp_knuth_morris_pratt");
/// assert_eq!(slugify("???"), "topic");
/// ```
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_sep = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c);
        } else {
            pending_sep = true;
        }
    }

    if slug.is_empty() {
        PLACEHOLDER_TITLE.to_string()
    } else {
        slug
    }
}

/// Hands out unique slugs for one batch.
///
/// A candidate is rejected if it appears in the run's history (`used_slugs`
/// from the state file) or was already taken in this batch, either by an
/// earlier article or by a file that already exists in the batch directory.
#[derive(Debug, Default)]
pub struct SlugAllocator {
    history: HashSet<String>,
    batch: HashSet<String>,
}

impl SlugAllocator {
    pub fn new<I, S>(history: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            history: history.into_iter().map(Into::into).collect(),
            batch: HashSet::new(),
        }
    }

    /// Mark slugs as taken for this batch without allocating them.
    pub fn reserve<I, S>(&mut self, existing: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.batch.extend(existing.into_iter().map(Into::into));
    }

    fn is_taken(&self, slug: &str) -> bool {
        self.history.contains(slug) || self.batch.contains(slug)
    }

    /// Allocate a slug for `title`, appending `_1`, `_2`, … until it is free.
    pub fn allocate(&mut self, title: &str) -> String {
        let base = slugify(title);
        let mut slug = base.clone();
        let mut n = 1usize;
        while self.is_taken(&slug) {
            slug = format!("{base}_{n}");
            n += 1;
        }
        if slug != base {
            debug!(%base, %slug, "Slug collided; using suffixed slug");
        }
        self.batch.insert(slug.clone());
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Binary Search"), "binary_search");
        assert_eq!(slugify("binary   search!!"), "binary_search");
        assert_eq!(slugify("  KMP (Knuth-Morris-Pratt) "), "kmp_knuth_morris_pratt");
        assert_eq!(slugify("0/1 Knapsack"), "0_1_knapsack");
        assert_eq!(slugify("Dijkstra's Algorithm"), "dijkstra_s_algorithm");
    }

    #[test]
    fn test_slugify_drops_non_ascii() {
        assert_eq!(slugify("Árbol B+"), "rbol_b");
        assert_eq!(slugify("___"), PLACEHOLDER_TITLE);
        assert_eq!(slugify(""), PLACEHOLDER_TITLE);
        assert_eq!(slugify("√ ∑"), PLACEHOLDER_TITLE);
    }

    #[test]
    fn test_allocate_is_injective_within_batch() {
        let mut alloc = SlugAllocator::new(Vec::<String>::new());
        assert_eq!(alloc.allocate("Binary Search"), "binary_search");
        assert_eq!(alloc.allocate("binary   search!!"), "binary_search_1");
        assert_eq!(alloc.allocate("BINARY SEARCH"), "binary_search_2");
    }

    #[test]
    fn test_allocate_respects_history() {
        let mut alloc = SlugAllocator::new(["kmp_algorithm", "kmp_algorithm_1"]);
        assert_eq!(alloc.allocate("KMP Algorithm"), "kmp_algorithm_2");

        let mut alloc = SlugAllocator::new(["kmp_algorithm"]);
        assert_eq!(alloc.allocate("KMP Algorithm"), "kmp_algorithm_1");
    }

    #[test]
    fn test_allocate_respects_reserved_files() {
        let mut alloc = SlugAllocator::new(Vec::<String>::new());
        alloc.reserve(["trie"]);
        assert_eq!(alloc.allocate("Trie"), "trie_1");
    }

    #[test]
    fn test_empty_titles_get_placeholder() {
        let mut alloc = SlugAllocator::new(Vec::<String>::new());
        assert_eq!(alloc.allocate(""), "topic");
        assert_eq!(alloc.allocate("!!!"), "topic_1");
    }
}
