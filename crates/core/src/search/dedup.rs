//! Merging of per-variant search results.

use std::collections::HashSet;

use crate::backend::SearchHit;

/// Concatenate result batches, keeping the first hit seen for each native
/// hash. Hashes are lowercased.
pub fn merge_hits<I>(batches: I) -> Vec<SearchHit>
where
    I: IntoIterator<Item = Vec<SearchHit>>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for batch in batches {
        for mut hit in batch {
            hit.native_hash = hit.native_hash.to_ascii_lowercase();
            if hit.native_hash.is_empty() || !seen.insert(hit.native_hash.clone()) {
                continue;
            }
            merged.push(hit);
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::{search_hit, HASH_A, HASH_B, HASH_C};

    #[test]
    fn test_merge_preserves_first_seen_order() {
        let first = vec![search_hit("a 1x01", HASH_A), search_hit("b 1x01", HASH_B)];
        let second = vec![
            search_hit("a S01E01", &HASH_A.to_uppercase()),
            search_hit("c S01E01", HASH_C),
        ];

        let merged = merge_hits(vec![first, second]);
        let names: Vec<_> = merged.iter().map(|h| h.display_name.as_str()).collect();
        assert_eq!(names, vec!["a 1x01", "b 1x01", "c S01E01"]);
    }

    #[test]
    fn test_duplicates_within_one_batch() {
        let merged = merge_hits(vec![vec![search_hit("x", HASH_A), search_hit("y", HASH_A)]]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].display_name, "x");
    }

    #[test]
    fn test_hits_without_hash_are_dropped() {
        let merged = merge_hits(vec![vec![search_hit("x", "")]]);
        assert!(merged.is_empty());
    }
}
