//! Full cross-product strategy. No real index: every pair is a candidate.
//!
//! Baseline for the other strategies; their candidates are always a subset
//! of these.

use super::{push_pairs_within, IndexError, IndexReuse, IndexedSource};
use crate::record::{CandidatePair, Collection, Record};

const NAME: &str = "FULL";

#[derive(Debug, Default)]
pub struct CartesianIndex {
    source: IndexedSource,
}

impl CartesianIndex {
    pub(crate) fn source(&self) -> &IndexedSource {
        &self.source
    }

    pub fn build(&mut self, collection: &Collection, reuse: IndexReuse) {
        self.source.set(collection, reuse);
    }

    pub fn find_for_query<'a>(
        &'a self,
        query: &'a Record,
        collection: &Collection,
    ) -> Result<Vec<CandidatePair<'a>>, IndexError> {
        let indexed = self.source.checked(collection, NAME, "search")?;
        Ok(indexed
            .iter()
            .map(|candidate| CandidatePair::new(query, candidate))
            .collect())
    }

    pub fn find_for_cross<'a>(
        &'a self,
        list_a: &'a [Record],
        indexed_b: &Collection,
    ) -> Result<Vec<CandidatePair<'a>>, IndexError> {
        let indexed = self.source.checked(indexed_b, NAME, "compare")?;
        let mut pairs = Vec::with_capacity(list_a.len() * indexed.len());
        for a in list_a {
            pairs.extend(indexed.iter().map(|b| CandidatePair::new(a, b)));
        }
        Ok(pairs)
    }

    pub fn find_for_self_pairs<'a>(
        &'a self,
        collection: &Collection,
    ) -> Result<Vec<CandidatePair<'a>>, IndexError> {
        let indexed = self.source.checked(collection, NAME, "dedupe")?;
        let positions: Vec<usize> = (0..indexed.len()).collect();
        let mut pairs = Vec::new();
        push_pairs_within(&positions, indexed.records(), &mut pairs);
        Ok(pairs)
    }

    pub fn reset(&mut self) {
        self.source.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{id_pairs, sample};
    use crate::record::rec;

    #[test]
    fn test_query_pairs_with_everything() {
        let names = sample();
        let mut index = CartesianIndex::default();
        index.build(&names, IndexReuse::Handle);

        let query = rec("q", "nobody at all");
        let pairs = index.find_for_query(&query, &names).unwrap();
        assert_eq!(pairs.len(), names.len());
        assert!(pairs.iter().all(|p| p.a.id == "q"));
    }

    #[test]
    fn test_cross_product() {
        let names = sample();
        let mut index = CartesianIndex::default();
        index.build(&names, IndexReuse::Handle);

        let list_a = vec![rec("a1", "x"), rec("a2", "y")];
        let pairs = index.find_for_cross(&list_a, &names).unwrap();
        assert_eq!(pairs.len(), 2 * names.len());
        assert_eq!(pairs[0].ids(), ("a1", "L_1"));
    }

    #[test]
    fn test_self_pairs() {
        let names = Collection::new(vec![rec("1", "a"), rec("2", "b"), rec("3", "c")]);
        let mut index = CartesianIndex::default();
        index.build(&names, IndexReuse::Handle);

        let pairs = index.find_for_self_pairs(&names).unwrap();
        assert_eq!(
            id_pairs(&pairs),
            vec![
                ("1".to_string(), "2".to_string()),
                ("1".to_string(), "3".to_string()),
                ("2".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_collection() {
        let empty = Collection::empty();
        let mut index = CartesianIndex::default();
        index.build(&empty, IndexReuse::Handle);
        assert!(index.find_for_self_pairs(&empty).unwrap().is_empty());
        assert!(index.find_for_query(&rec("q", "x"), &empty).unwrap().is_empty());
    }
}
