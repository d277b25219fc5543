//! Deduplication against previously notified postings.
//!
//! The cache is an ordered list of identifiers (oldest first) with a
//! set index for membership. It is bounded: appending beyond the cap drops
//! the oldest entries.

use std::collections::HashSet;

use crate::error::{AppError, Result};
use crate::models::Posting;

/// Default number of identifiers retained.
pub const DEFAULT_MAX_ENTRIES: usize = 300;

/// Bounded, insertion-ordered set of notified posting identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupCache {
    entries: Vec<String>,
    index: HashSet<String>,
    max_entries: usize,
}

impl DedupCache {
    /// Build a cache from persisted entries.
    ///
    /// Duplicate entries keep their last position and the result is trimmed to the cap.
    pub fn new(entries: Vec<String>, max_entries: usize) -> Self {
        Self::empty(max_entries).append(entries)
    }

    /// An empty cache with the given cap.
    pub fn empty(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: HashSet::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Membership test.
    pub fn is_known(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Postings whose identifier is not cached, in input order.
    ///
    /// Repeats within `postings` are kept only at their first occurrence.
    pub fn filter_new(&self, postings: &[Posting]) -> Vec<Posting> {
        let mut seen: HashSet<String> = HashSet::new();
        postings
            .iter()
            .filter(|p| {
                let id = p.identifier();
                !self.is_known(&id) && seen.insert(id)
            })
            .cloned()
            .collect()
    }

    /// Append identifiers, deduplicating on write, then keep the newest `max_entries`.
    ///
    /// An identifier already present moves to the end.
    pub fn append<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for id in ids {
            let id = id.into();
            if !self.index.insert(id.clone()) {
                self.entries.retain(|e| e != &id);
            }
            self.entries.push(id);
        }

        if self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.max_entries;
            for dropped in self.entries.drain(..excess) {
                self.index.remove(&dropped);
            }
        }

        self
    }

    /// Entries, oldest first.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}

/// Outcome of choosing which postings go into a digest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub postings: Vec<Posting>,
    /// True when nothing was new and already-notified postings were re-sent.
    pub fallback: bool,
}

/// Pick the postings to notify.
///
/// New postings win. When every fetched posting is already cached, the first
/// `fallback_count` distinct postings of the fetch are re-sent so a digest
/// still goes out. `fallback_count == 0` disables that.
pub fn select_for_digest(
    cache: &DedupCache,
    fetched: &[Posting],
    fallback_count: usize,
) -> Selection {
    let fresh = cache.filter_new(fetched);
    if !fresh.is_empty() || fetched.is_empty() || fallback_count == 0 {
        return Selection {
            postings: fresh,
            fallback: false,
        };
    }

    let mut seen: HashSet<String> = HashSet::new();
    let postings = fetched
        .iter()
        .filter(|p| seen.insert(p.identifier()))
        .take(fallback_count)
        .cloned()
        .collect();

    Selection {
        postings,
        fallback: true,
    }
}

/// Decode persisted cache content: a JSON array of strings.
pub fn decode_entries(bytes: &[u8]) -> Result<Vec<String>> {
    serde_json::from_slice::<Vec<String>>(bytes).map_err(AppError::malformed_cache)
}

/// Encode cache entries for persistence.
pub fn encode_entries(entries: &[String]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(entries)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(n: usize) -> Posting {
        Posting::new(format!("Job {n}"), "Acme").with_share_url(format!("https://g.co/{n}"))
    }

    fn ids(postings: &[Posting]) -> Vec<String> {
        postings.iter().map(Posting::identifier).collect()
    }

    #[test]
    fn test_filter_new_preserves_order() {
        let cache = DedupCache::new(vec!["https://g.co/2".into()], 300);
        let fetched = vec![posting(1), posting(2), posting(3)];

        let fresh = cache.filter_new(&fetched);
        assert_eq!(ids(&fresh), vec!["https://g.co/1", "https://g.co/3"]);
    }

    #[test]
    fn test_filter_new_is_idempotent() {
        let cache = DedupCache::new(vec!["https://g.co/1".into()], 300);
        let fetched = vec![posting(1), posting(2), posting(2), posting(3)];

        let first = cache.filter_new(&fetched);
        let second = cache.filter_new(&fetched);
        assert_eq!(first, second);
    }

    #[test]
    fn test_filter_new_drops_repeats_within_batch() {
        let cache = DedupCache::empty(300);
        let fetched = vec![posting(1), posting(1), posting(2)];

        assert_eq!(
            ids(&cache.filter_new(&fetched)),
            vec!["https://g.co/1", "https://g.co/2"]
        );
    }

    #[test]
    fn test_filter_new_uses_composite_key_without_share_url() {
        let cache = DedupCache::new(vec!["Rust Dev|Acme".into()], 300);
        let fetched = vec![Posting::new("Rust Dev", "Acme"), Posting::new("Rust Dev", "Beta")];

        let fresh = cache.filter_new(&fetched);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].company_name, "Beta");
    }

    #[test]
    fn test_append_dedupes_on_write() {
        let cache = DedupCache::empty(300).append(["a", "b", "a"]);
        assert_eq!(cache.entries(), ["b", "a"]);
        assert!(cache.is_known("a"));
    }

    #[test]
    fn test_append_moves_existing_to_end() {
        let cache = DedupCache::new(vec!["a".into(), "b".into(), "c".into()], 300);
        let cache = cache.append(["a"]);
        assert_eq!(cache.entries(), ["b", "c", "a"]);
    }

    #[test]
    fn test_append_trims_oldest_first() {
        let existing: Vec<String> = (0..300).map(|i| format!("id-{i}")).collect();
        let cache = DedupCache::new(existing, 300);

        let cache = cache.append((300..305).map(|i| format!("id-{i}")));
        assert_eq!(cache.len(), 300);
        assert!(!cache.is_known("id-4"));
        assert!(cache.is_known("id-5"));
        assert_eq!(cache.entries().first().map(String::as_str), Some("id-5"));
        assert_eq!(cache.entries().last().map(String::as_str), Some("id-304"));
    }

    #[test]
    fn test_new_trims_oversized_input() {
        let existing: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        let cache = DedupCache::new(existing, 4);
        assert_eq!(cache.entries(), ["6", "7", "8", "9"]);
    }

    #[test]
    fn test_select_prefers_new_postings() {
        let cache = DedupCache::new(vec!["https://g.co/1".into()], 300);
        let selection = select_for_digest(&cache, &[posting(1), posting(2)], 3);

        assert!(!selection.fallback);
        assert_eq!(ids(&selection.postings), vec!["https://g.co/2"]);
    }

    #[test]
    fn test_select_falls_back_to_prefix() {
        let fetched: Vec<Posting> = (1..=5).map(posting).collect();
        let cache = DedupCache::new(ids(&fetched), 300);

        let selection = select_for_digest(&cache, &fetched, 3);
        assert!(selection.fallback);
        assert_eq!(
            ids(&selection.postings),
            vec!["https://g.co/1", "https://g.co/2", "https://g.co/3"]
        );
    }

    #[test]
    fn test_select_fallback_smaller_fetch() {
        let fetched = vec![posting(1), posting(2)];
        let cache = DedupCache::new(ids(&fetched), 300);

        let selection = select_for_digest(&cache, &fetched, 3);
        assert!(selection.fallback);
        assert_eq!(selection.postings.len(), 2);
    }

    #[test]
    fn test_select_fallback_disabled() {
        let fetched = vec![posting(1)];
        let cache = DedupCache::new(ids(&fetched), 300);

        let selection = select_for_digest(&cache, &fetched, 0);
        assert!(!selection.fallback);
        assert!(selection.postings.is_empty());
    }

    #[test]
    fn test_select_empty_fetch() {
        let selection = select_for_digest(&DedupCache::empty(300), &[], 3);
        assert!(!selection.fallback);
        assert!(selection.postings.is_empty());
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(matches!(
            decode_entries(b"{not json"),
            Err(AppError::MalformedCache(_))
        ));
        assert!(matches!(
            decode_entries(br#"{"ids": []}"#),
            Err(AppError::MalformedCache(_))
        ));
        assert!(matches!(
            decode_entries(b"[1, 2]"),
            Err(AppError::MalformedCache(_))
        ));
    }

    #[test]
    fn test_decode_encode() {
        let entries = vec!["a".to_string(), "b".to_string()];
        let bytes = encode_entries(&entries).unwrap();
        assert_eq!(decode_entries(&bytes).unwrap(), entries);
    }
}
