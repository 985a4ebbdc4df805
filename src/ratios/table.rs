use std::collections::HashMap;

use super::models::{RaceName, RatioRecord};

/// Ratio records indexed by ordered (source, target) pair.
///
/// Only observed pairs are stored. A missing pair means "no data" and is
/// never filled in by inversion or by chaining through another race.
#[derive(Debug, Clone, Default)]
pub struct RatioTable {
    by_source: HashMap<RaceName, HashMap<RaceName, RatioRecord>>,
    len: usize,
}

impl RatioTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record. The first record for a pair wins; returns `false`
    /// when the pair was already present.
    pub fn insert(&mut self, record: RatioRecord) -> bool {
        let targets = self.by_source.entry(record.source.clone()).or_default();
        if targets.contains_key(&record.target) {
            return false;
        }
        targets.insert(record.target.clone(), record);
        self.len += 1;
        true
    }

    /// Exact lookup of the ordered pair.
    pub fn resolve(&self, source: &str, target: &str) -> Option<&RatioRecord> {
        self.by_source.get(source)?.get(target)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn records(&self) -> impl Iterator<Item = &RatioRecord> {
        self.by_source.values().flat_map(|targets| targets.values())
    }

    /// Every race appearing as source or target (unordered, may repeat).
    pub fn race_names(&self) -> impl Iterator<Item = &RaceName> {
        self.records().flat_map(|r| [&r.source, &r.target])
    }
}
