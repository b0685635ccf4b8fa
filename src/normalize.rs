//! Result normalization
//!
//! Turns raw Salesforce record sets into [`ToolResult`]s: single lookups become
//! `ok`, `not_found` or `ambiguous`; list and search tools always return `ok`
//! with records in the order the remote store produced them.

use crate::query::{QuerySpec, SearchSpec};
use crate::types::{CandidateSummary, ObjectType, RemoteRecord, ToolResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Default cap on candidates returned for an ambiguous lookup
pub const DEFAULT_MAX_CANDIDATES: usize = 10;

/// Shapes remote records into tool results
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    max_candidates: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CANDIDATES)
    }
}

impl Normalizer {
    /// An ambiguous result needs at least two candidates, so smaller caps are raised to 2.
    pub fn new(max_candidates: usize) -> Self {
        Self {
            max_candidates: max_candidates.max(2),
        }
    }

    /// Result of a lookup expected to match exactly one record.
    pub fn single(&self, spec: &QuerySpec, records: &[RemoteRecord], what: &str) -> ToolResult {
        match records {
            [] => ToolResult::not_found(format!("No {} found", what)),
            [record] => ToolResult::ok(shape_record(record, &spec.fields)),
            _ => self.ambiguous(spec.object_type, records),
        }
    }

    /// Result of a list query; an empty list is still `ok`.
    pub fn list(&self, spec: &QuerySpec, records: &[RemoteRecord]) -> ToolResult {
        let shaped = records
            .iter()
            .map(|r| shape_record(r, &spec.fields))
            .collect();
        ToolResult::ok(Value::Array(shaped))
    }

    /// Candidate summaries for records that matched a single-record lookup.
    pub fn ambiguous(&self, object_type: ObjectType, records: &[RemoteRecord]) -> ToolResult {
        let candidates = records
            .iter()
            .take(self.max_candidates)
            .map(|r| summarize(r, object_type))
            .collect();
        ToolResult::ambiguous(candidates, records.len())
    }

    /// Grouped search results; object types without hits are omitted.
    pub fn grouped(
        &self,
        spec: &SearchSpec,
        groups: &BTreeMap<ObjectType, Vec<RemoteRecord>>,
    ) -> ToolResult {
        let mut payload = Map::new();
        for object_type in &spec.object_types {
            let Some(records) = groups.get(object_type) else {
                continue;
            };
            if records.is_empty() {
                continue;
            }
            let fields = spec
                .fields_per_type
                .get(object_type)
                .cloned()
                .unwrap_or_default();
            let shaped = records.iter().map(|r| shape_record(r, &fields)).collect();
            payload.insert(object_type.api_name().to_string(), Value::Array(shaped));
        }
        ToolResult::ok(Value::Object(payload))
    }
}

/// Keep only the declared fields, in declared order.
///
/// Relationship paths (`Account.Name`) are flattened into dotted keys; fields
/// missing from the record come back as null.
pub fn shape_record(record: &RemoteRecord, fields: &[String]) -> Value {
    let mut shaped = Map::new();
    for field in fields {
        shaped.insert(field.clone(), lookup(record, field).cloned().unwrap_or(Value::Null));
    }
    Value::Object(shaped)
}

/// Id and display name of a record
pub fn summarize(record: &RemoteRecord, object_type: ObjectType) -> CandidateSummary {
    CandidateSummary {
        id: text_of(lookup(record, "Id")),
        display_name: text_of(lookup(record, object_type.display_field())),
    }
}

fn lookup<'a>(record: &'a RemoteRecord, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = record.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn text_of(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
