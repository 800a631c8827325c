use std::collections::HashMap;

use crate::Record;

/// Result of [`RecordSet::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

/// Insertion-ordered collection holding at most one record per id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    records: Vec<Record>,
    index: HashMap<String, usize>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from loaded records. A later duplicate id replaces the
    /// earlier one in place.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut set = Self::new();
        for record in records {
            set.upsert(record);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn exists(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    /// Inserts a new record or replaces the one with the same id, keeping
    /// its original position.
    pub fn upsert(&mut self, record: Record) -> Upsert {
        match self.index.get(&record.id) {
            Some(&pos) => {
                self.records[pos] = record;
                Upsert::Replaced
            }
            None => {
                self.index.insert(record.id.clone(), self.records.len());
                self.records.push(record);
                Upsert::Inserted
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }

    pub fn recent(&self, count: usize) -> Vec<Record> {
        most_recent(&self.records, count)
    }
}

/// Up to `count` records, newest `published_at` first. Ties keep their
/// input order.
pub fn most_recent(records: &[Record], count: usize) -> Vec<Record> {
    if count == 0 {
        return Vec::new();
    }
    let mut ordered: Vec<&Record> = records.iter().collect();
    ordered.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    ordered.into_iter().take(count).cloned().collect()
}
