//! Bucket-by-key strategy: hash buckets keyed by the lower-cased last token.
//!
//! Records sharing a surname land in the same bucket; only records in the
//! query's bucket become candidates.

use std::collections::HashMap;

use super::{push_pairs_within, IndexError, IndexReuse, IndexedSource};
use crate::record::{CandidatePair, Collection, Record};

const NAME: &str = "BUCKET_LAST_TOKEN";

#[derive(Debug, Default)]
pub struct BucketIndex {
    source: IndexedSource,
    buckets: HashMap<String, Vec<usize>>,
}

impl BucketIndex {
    pub(crate) fn source(&self) -> &IndexedSource {
        &self.source
    }

    pub fn build(&mut self, collection: &Collection, reuse: IndexReuse) {
        self.buckets.clear();
        for (position, record) in collection.iter().enumerate() {
            if let Some(key) = record.last_token_key() {
                self.buckets.entry(key).or_default().push(position);
            }
        }
        self.source.set(collection, reuse);
    }

    /// Number of distinct keys.
    pub fn key_count(&self) -> usize {
        self.buckets.len()
    }

    fn bucket_for(&self, record: &Record) -> &[usize] {
        record
            .last_token_key()
            .and_then(|key| self.buckets.get(&key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn find_for_query<'a>(
        &'a self,
        query: &'a Record,
        collection: &Collection,
    ) -> Result<Vec<CandidatePair<'a>>, IndexError> {
        let indexed = self.source.checked(collection, NAME, "search")?;
        Ok(self
            .bucket_for(query)
            .iter()
            .filter_map(|&position| indexed.get(position))
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
                self.bucket_for(a)
                    .iter()
                    .filter_map(|&position| indexed.get(position))
                    .map(|b| CandidatePair::new(a, b)),
            );
        }
        Ok(pairs)
    }

    pub fn find_for_self_pairs<'a>(
        &'a self,
        collection: &Collection,
    ) -> Result<Vec<CandidatePair<'a>>, IndexError> {
        let indexed = self.source.checked(collection, NAME, "dedupe")?;

        // Visit buckets in order of first appearance so output is stable.
        let mut buckets: Vec<&Vec<usize>> = self.buckets.values().filter(|b| b.len() > 1).collect();
        buckets.sort_by_key(|b| b[0]);

        let mut pairs = Vec::new();
        for bucket in buckets {
            push_pairs_within(bucket, indexed.records(), &mut pairs);
        }
        Ok(pairs)
    }

    pub fn reset(&mut self) {
        self.buckets.clear();
        self.source.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{id_pairs, sample};
    use crate::record::rec;

    fn built(names: &Collection) -> BucketIndex {
        let mut index = BucketIndex::default();
        index.build(names, IndexReuse::Handle);
        index
    }

    #[test]
    fn test_dedupe_shared_surname() {
        let names = Collection::new(vec![
            rec("L_1", "john smith"),
            rec("L_2", "jane smith"),
            rec("L_3", "peter jones"),
        ]);
        let index = built(&names);
        let pairs = index.find_for_self_pairs(&names).unwrap();
        assert_eq!(id_pairs(&pairs), vec![("L_1".to_string(), "L_2".to_string())]);
    }

    #[test]
    fn test_search_by_last_token() {
        let names = sample();
        let index = built(&names);
        assert_eq!(index.key_count(), 3);

        let query = Record::new("q", "Bob SMITH", vec!["Bob".into(), "SMITH".into()]);
        let pairs = index.find_for_query(&query, &names).unwrap();
        let ids: Vec<&str> = pairs.iter().map(|p| p.b.id.as_str()).collect();
        assert_eq!(ids, vec!["L_1", "L_2", "L_4"]);
    }

    #[test]
    fn test_search_without_key() {
        let names = sample();
        let index = built(&names);
        let empty = Record::new("q", "", vec![]);
        assert!(index.find_for_query(&empty, &names).unwrap().is_empty());
        assert!(index.find_for_query(&rec("q", "nobody"), &names).unwrap().is_empty());
    }

    #[test]
    fn test_cross() {
        let names = sample();
        let index = built(&names);
        let list_a = vec![rec("a1", "ann jones"), rec("a2", "zed")];
        let pairs = index.find_for_cross(&list_a, &names).unwrap();
        assert_eq!(
            id_pairs(&pairs),
            vec![
                ("a1".to_string(), "L_3".to_string()),
                ("a1".to_string(), "L_6".to_string()),
            ]
        );
    }
}
