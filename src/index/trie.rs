//! Prefix-tree strategy.
//!
//! Each record's full lower-cased key is inserted character by character;
//! the node where a key ends holds the positions of the records with that
//! key. A lookup returns every record whose key *starts with* the query key,
//! so it is looser than the exact-key strategies.
//!
//! CHANGELOG:
//! - 04/02/2026 - Initial implementation

use std::collections::{BTreeMap, BTreeSet};

use super::{push_pairs_within, IndexError, IndexReuse, IndexedSource};
use crate::record::{CandidatePair, Collection, Record};

const NAME: &str = "PREFIX_TREE";

#[derive(Debug, Default)]
struct TrieNode {
    children: BTreeMap<char, TrieNode>,
    /// Non-empty iff a key ends here.
    positions: BTreeSet<usize>,
}

impl TrieNode {
    fn insert(&mut self, key: &str, position: usize) {
        let mut node = self;
        for ch in key.chars() {
            node = node.children.entry(ch).or_default();
        }
        node.positions.insert(position);
    }

    fn descend(&self, prefix: &str) -> Option<&TrieNode> {
        let mut node = self;
        for ch in prefix.chars() {
            node = node.children.get(&ch)?;
        }
        Some(node)
    }

    /// Positions of every key ending in this subtree.
    fn collect_positions(&self, out: &mut BTreeSet<usize>) {
        out.extend(self.positions.iter().copied());
        for child in self.children.values() {
            child.collect_positions(out);
        }
    }

    fn collect_shared_keys<'a>(&'a self, out: &mut Vec<&'a BTreeSet<usize>>) {
        if self.positions.len() > 1 {
            out.push(&self.positions);
        }
        for child in self.children.values() {
            child.collect_shared_keys(out);
        }
    }
}

#[derive(Debug, Default)]
pub struct TrieIndex {
    source: IndexedSource,
    root: TrieNode,
}

impl TrieIndex {
    pub(crate) fn source(&self) -> &IndexedSource {
        &self.source
    }

    pub fn build(&mut self, collection: &Collection, reuse: IndexReuse) {
        self.root = TrieNode::default();
        for (position, record) in collection.iter().enumerate() {
            if let Some(key) = record.full_key() {
                self.root.insert(&key, position);
            }
        }
        self.source.set(collection, reuse);
    }

    /// Positions of every indexed key having `record`'s key as a prefix.
    fn prefix_matches(&self, record: &Record) -> BTreeSet<usize> {
        let mut positions = BTreeSet::new();
        if let Some(node) = record.full_key().and_then(|key| self.root.descend(&key)) {
            node.collect_positions(&mut positions);
        }
        positions
    }

    pub fn find_for_query<'a>(
        &'a self,
        query: &'a Record,
        collection: &Collection,
    ) -> Result<Vec<CandidatePair<'a>>, IndexError> {
        let indexed = self.source.checked(collection, NAME, "search")?;
        Ok(self
            .prefix_matches(query)
            .into_iter()
            .filter_map(|position| indexed.get(position))
            .map(|candidate| CandidatePair::new(query, candidate))
            .collect())
    }

    pub fn find_for_cross<'a>(
        &'a self,
        list_a: &'a [Record],
        indexed_b: &Collection,
    ) -> Result<Vec<CandidatePair<'a>>, IndexError> {
        let indexed = self.source.checked(indexed_b, NAME, "compare")?;
        let mut pairs = Vec::new();
        for a in list_a {
            pairs.extend(
                self.prefix_matches(a)
                    .into_iter()
                    .filter_map(|position| indexed.get(position))
                    .map(|b| CandidatePair::new(a, b)),
            );
        }
        Ok(pairs)
    }

    /// Pairs of records whose keys are identical.
    pub fn find_for_self_pairs<'a>(
        &'a self,
        collection: &Collection,
    ) -> Result<Vec<CandidatePair<'a>>, IndexError> {
        let indexed = self.source.checked(collection, NAME, "dedupe")?;
        let mut shared = Vec::new();
        self.root.collect_shared_keys(&mut shared);

        let mut pairs = Vec::new();
        for positions in shared {
            let positions: Vec<usize> = positions.iter().copied().collect();
            push_pairs_within(&positions, indexed.records(), &mut pairs);
        }
        Ok(pairs)
    }

    pub fn reset(&mut self) {
        self.root = TrieNode::default();
        self.source.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{id_pairs, sample};
    use crate::record::rec;

    fn built(names: &Collection) -> TrieIndex {
        let mut index = TrieIndex::default();
        index.build(names, IndexReuse::Handle);
        index
    }

    #[test]
    fn test_prefix_search() {
        let names = sample();
        let index = built(&names);

        let query = rec("q", "john smith");
        let pairs = index.find_for_query(&query, &names).unwrap();
        let ids: Vec<&str> = pairs.iter().map(|p| p.b.id.as_str()).collect();
        assert_eq!(ids, vec!["L_1", "L_4", "L_5"]);

        let initial = rec("q", "j");
        let pairs = index.find_for_query(&initial, &names).unwrap();
        assert_eq!(pairs.len(), 4);
    }

    #[test]
    fn test_no_match_and_empty_key() {
        let names = sample();
        let index = built(&names);
        let unknown = rec("q", "johnny");
        assert!(index.find_for_query(&unknown, &names).unwrap().is_empty());
        let empty = Record::new("q", "", vec![]);
        assert!(index.find_for_query(&empty, &names).unwrap().is_empty());
    }

    #[test]
    fn test_self_pairs_exact_keys_only() {
        let names = sample();
        let index = built(&names);
        let pairs = index.find_for_self_pairs(&names).unwrap();
        assert_eq!(id_pairs(&pairs), vec![("L_1".to_string(), "L_4".to_string())]);
    }

    #[test]
    fn test_cross_uses_prefixes() {
        let names = sample();
        let index = built(&names);
        let list_a = vec![rec("a1", "mary"), rec("a2", "peter jones")];
        let pairs = index.find_for_cross(&list_a, &names).unwrap();
        assert_eq!(
            id_pairs(&pairs),
            vec![
                ("a1".to_string(), "L_6".to_string()),
                ("a2".to_string(), "L_3".to_string()),
            ]
        );
    }

    #[test]
    fn test_unicode_keys() {
        let names = Collection::new(vec![rec("1", "zoë müller"), rec("2", "zoë mueller")]);
        let index = built(&names);
        let query = rec("q", "zoë m");
        let pairs = index.find_for_query(&query, &names).unwrap();
        assert_eq!(pairs.len(), 2);
    }
}
