//! Store - pluggable record storage.
//!
//! [`Store`] is the storage boundary the service layer talks to. Lookups
//! that find nothing return `None`/`false`; `Err` is reserved for the
//! backend itself failing. [`MemoryStore`] is the in-process
//! implementation used by the server and by tests.

use crate::schema::as_number;
use crate::{error::Result, CollectionName, Error, Fields, Record, RecordId};
use chrono::{SecondsFormat, Utc};
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// Marker that turns a filter value into a wildcard pattern.
pub const WILDCARD: char = '%';

/// Storage operations over named collections of records.
pub trait Store: Send + Sync {
    /// Insert a record, returning the id allocated for it.
    ///
    /// Any `id` or `created_at` in `fields` is ignored.
    fn insert(&self, collection: &str, fields: Fields) -> Result<RecordId>;

    /// Merge `fields` into an existing record. Returns `false` if absent.
    fn update(&self, collection: &str, id: RecordId, fields: Fields) -> Result<bool>;

    /// Remove a record. Returns `false` if absent.
    fn delete(&self, collection: &str, id: RecordId) -> Result<bool>;

    /// Point lookup.
    fn find_by_id(&self, collection: &str, id: RecordId) -> Result<Option<Record>>;

    /// Filtered, optionally sorted scan in storage order.
    fn find_all(&self, collection: &str, query: &FindQuery) -> Result<Vec<Record>>;
}

/// Filters and sort key for [`Store::find_all`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    filters: Vec<(String, Value)>,
    sort_by: Option<String>,
}

impl FindQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value`, or to match it as a pattern when
    /// `value` is a string containing [`WILDCARD`].
    ///
    /// A later filter on the same field replaces the earlier one.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        let value = value.into();
        match self.filters.iter_mut().find(|(f, _)| *f == field) {
            Some(existing) => existing.1 = value,
            None => self.filters.push((field, value)),
        }
        self
    }

    /// Require `field` to contain `fragment`, case-insensitively.
    pub fn contains(self, field: impl Into<String>, fragment: &str) -> Self {
        self.filter(field, format!("{WILDCARD}{fragment}{WILDCARD}"))
    }

    /// Order results ascending by `field`.
    pub fn sort_by(mut self, field: impl Into<String>) -> Self {
        self.sort_by = Some(field.into());
        self
    }

    pub fn filters(&self) -> &[(String, Value)] {
        &self.filters
    }

    pub fn sort_key(&self) -> Option<&str> {
        self.sort_by.as_deref()
    }

    /// Apply this query to records given in storage order.
    pub fn run<'a, I>(&self, records: I) -> Result<Vec<Record>>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let matchers = self
            .filters
            .iter()
            .map(|(field, value)| -> Result<_> { Ok((field.as_str(), Matcher::compile(value)?)) })
            .collect::<Result<Vec<_>>>()?;

        let mut results: Vec<Record> = records
            .into_iter()
            .filter(|record| {
                matchers.iter().all(|(field, matcher)| match present(record, field) {
                    Some(actual) => matcher.matches(&actual),
                    None => false,
                })
            })
            .cloned()
            .collect();

        if let Some(key) = &self.sort_by {
            sort_present_in_place(&mut results, key);
        }

        Ok(results)
    }
}

enum Matcher<'a> {
    Equals(&'a Value),
    Like(Regex),
}

impl<'a> Matcher<'a> {
    fn compile(value: &'a Value) -> Result<Self> {
        match value.as_str() {
            Some(pattern) if pattern.contains(WILDCARD) => {
                let source = pattern
                    .split(WILDCARD)
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(".*");
                RegexBuilder::new(&source)
                    .case_insensitive(true)
                    .build()
                    .map(Matcher::Like)
                    .map_err(|e| Error::Storage(format!("invalid filter pattern: {e}")))
            }
            _ => Ok(Matcher::Equals(value)),
        }
    }

    fn matches(&self, actual: &Value) -> bool {
        match self {
            Matcher::Equals(expected) => loose_eq(actual, expected),
            Matcher::Like(pattern) => pattern.is_match(&value_text(actual)),
        }
    }
}

/// Field value, treating explicit `null` as missing.
fn present(record: &Record, field: &str) -> Option<Value> {
    record.get(field).filter(|v| !v.is_null())
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) | Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => value_text(a) == value_text(b),
    }
}

/// Natural ordering over present values: numbers before text before
/// anything else, numbers by value, text byte-wise, the rest all equal.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        if as_number(value).is_some() {
            0
        } else if value.is_string() {
            1
        } else {
            2
        }
    }

    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => match (a.as_str(), b.as_str()) {
            (Some(x), Some(y)) if rank(a) == 1 && rank(b) == 1 => x.cmp(y),
            _ => rank(a).cmp(&rank(b)),
        },
    }
}

/// Stable sort by `key` over the records that have it. Records without the
/// key keep their slots.
fn sort_present_in_place(records: &mut [Record], key: &str) {
    let (slots, mut keyed): (Vec<usize>, Vec<(Value, Record)>) = records
        .iter()
        .enumerate()
        .filter_map(|(slot, record)| present(record, key).map(|v| (slot, (v, record.clone()))))
        .unzip();

    keyed.sort_by(|a, b| compare_values(&a.0, &b.0));

    for (slot, (_, record)) in slots.into_iter().zip(keyed) {
        records[slot] = record;
    }
}

/// Current time as an ISO-8601 string, second precision.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A collection of records.
#[derive(Debug, Clone)]
pub struct Collection {
    records: BTreeMap<RecordId, Record>,
    next_id: RecordId,
}

impl Default for Collection {
    fn default() -> Self {
        Self::new()
    }
}

impl Collection {
    /// Create an empty collection. The first id handed out is 1.
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Get a record by ID.
    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.records.get(&id)
    }

    /// Put a record in place as-is, keeping the id counter ahead of it.
    pub fn insert(&mut self, record: Record) {
        self.next_id = self.next_id.max(record.id.saturating_add(1));
        self.records.insert(record.id, record);
    }

    /// Next unused id, or `None` once the id space is used up.
    fn allocate_id(&mut self) -> Option<RecordId> {
        let id = self.next_id;
        if self.records.contains_key(&id) {
            return None;
        }
        self.next_id = id.saturating_add(1);
        Some(id)
    }

    /// Records in storage order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// In-memory [`Store`].
///
/// Ids are allocated per collection and never reused, so ascending id order
/// is insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<CollectionName, Collection>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with one collection pre-populated.
    pub fn seeded(collection: impl Into<CollectionName>, records: Vec<Record>) -> Self {
        let mut seeded = Collection::new();
        for record in records {
            seeded.insert(record);
        }

        let mut collections = HashMap::new();
        collections.insert(collection.into(), seeded);

        Self {
            collections: RwLock::new(collections),
        }
    }

    /// Number of records in a collection.
    pub fn count(&self, collection: &str) -> Result<usize> {
        let collections = self
            .collections
            .read()
            .map_err(|_| Error::LockPoisoned(collection.to_string()))?;
        Ok(collections.get(collection).map_or(0, Collection::len))
    }
}

impl Store for MemoryStore {
    fn insert(&self, collection: &str, fields: Fields) -> Result<RecordId> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| Error::LockPoisoned(collection.to_string()))?;
        let target = collections.entry(collection.to_string()).or_default();

        let id = target
            .allocate_id()
            .ok_or_else(|| Error::Storage(format!("no ids left in '{collection}'")))?;
        target.insert(Record::new(id, now_iso8601(), fields));
        Ok(id)
    }

    fn update(&self, collection: &str, id: RecordId, fields: Fields) -> Result<bool> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| Error::LockPoisoned(collection.to_string()))?;

        match collections
            .get_mut(collection)
            .and_then(|c| c.records.get_mut(&id))
        {
            Some(record) => {
                record.merge(fields);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete(&self, collection: &str, id: RecordId) -> Result<bool> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| Error::LockPoisoned(collection.to_string()))?;

        Ok(collections
            .get_mut(collection)
            .and_then(|c| c.records.remove(&id))
            .is_some())
    }

    fn find_by_id(&self, collection: &str, id: RecordId) -> Result<Option<Record>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| Error::LockPoisoned(collection.to_string()))?;

        Ok(collections
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned())
    }

    fn find_all(&self, collection: &str, query: &FindQuery) -> Result<Vec<Record>> {
        let collections = self
            .collections
            .read()
            .map_err(|_| Error::LockPoisoned(collection.to_string()))?;

        match collections.get(collection) {
            Some(c) => query.run(c.records()),
            None => Ok(Vec::new()),
        }
    }
}
