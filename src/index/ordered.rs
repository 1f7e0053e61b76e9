//! Ordered-map strategy: same bucketing as [`super::BucketIndex`], keyed by
//! the full lower-cased token string and stored in a `BTreeMap`.

use std::collections::BTreeMap;

use super::{push_pairs_within, IndexError, IndexReuse, IndexedSource};
use crate::record::{CandidatePair, Collection, Record};

const NAME: &str = "ORDERED_FULL_KEY";

#[derive(Debug, Default)]
pub struct OrderedIndex {
    source: IndexedSource,
    keys: BTreeMap<String, Vec<usize>>,
}

impl OrderedIndex {
    pub(crate) fn source(&self) -> &IndexedSource {
        &self.source
    }

    pub fn build(&mut self, collection: &Collection, reuse: IndexReuse) {
        self.keys.clear();
        for (position, record) in collection.iter().enumerate() {
            if let Some(key) = record.full_key() {
                self.keys.entry(key).or_default().push(position);
            }
        }
        self.source.set(collection, reuse);
    }

    /// Distinct keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    fn positions_for(&self, record: &Record) -> &[usize] {
        record
            .full_key()
            .and_then(|key| self.keys.get(&key))
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
            .positions_for(query)
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
                self.positions_for(a)
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
        let mut pairs = Vec::new();
        for positions in self.keys.values().filter(|p| p.len() > 1) {
            push_pairs_within(positions, indexed.records(), &mut pairs);
        }
        Ok(pairs)
    }

    pub fn reset(&mut self) {
        self.keys.clear();
        self.source.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{id_pairs, sample};
    use crate::record::rec;

    fn built(names: &Collection) -> OrderedIndex {
        let mut index = OrderedIndex::default();
        index.build(names, IndexReuse::Handle);
        index
    }

    #[test]
    fn test_keys_sorted() {
        let index = built(&sample());
        let keys: Vec<&str> = index.keys().collect();
        assert_eq!(
            keys,
            vec!["jane smith", "john smith", "john smithson", "mary jones", "peter jones"]
        );
    }

    #[test]
    fn test_full_key_exact_match_only() {
        let names = sample();
        let index = built(&names);

        let query = Record::new("q", "John Smith", vec!["John".into(), "Smith".into()]);
        let pairs = index.find_for_query(&query, &names).unwrap();
        let ids: Vec<&str> = pairs.iter().map(|p| p.b.id.as_str()).collect();
        assert_eq!(ids, vec!["L_1", "L_4"]);

        // a shared surname is not enough
        assert!(index.find_for_query(&rec("q", "jim jones"), &names).unwrap().is_empty());
    }

    #[test]
    fn test_self_pairs() {
        let names = sample();
        let index = built(&names);
        let pairs = index.find_for_self_pairs(&names).unwrap();
        assert_eq!(id_pairs(&pairs), vec![("L_1".to_string(), "L_4".to_string())]);
    }

    #[test]
    fn test_cross() {
        let names = sample();
        let index = built(&names);
        let list_a = vec![rec("a1", "mary jones"), rec("a2", "john smith")];
        let pairs = index.find_for_cross(&list_a, &names).unwrap();
        assert_eq!(
            id_pairs(&pairs),
            vec![
                ("a1".to_string(), "L_6".to_string()),
                ("a2".to_string(), "L_1".to_string()),
                ("a2".to_string(), "L_4".to_string()),
            ]
        );
    }
}
