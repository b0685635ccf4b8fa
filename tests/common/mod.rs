//! Common test utilities and helpers

#![allow(dead_code)]

use async_trait::async_trait;
use salesforce_mcp::{
    ObjectType, RecordId, RemoteRecord, Result, SalesforceMcpError, SessionHandle, ToolHandler,
};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One recorded `create` call
#[derive(Debug, Clone)]
pub struct CreateCall {
    pub object_type: ObjectType,
    pub fields: RemoteRecord,
}

/// Session stub that counts calls and replays canned responses
///
/// Queries are answered from a FIFO queue; once it is empty, every further
/// query returns the fallback response (empty by default).
#[derive(Default)]
pub struct RecordingSession {
    queries: Mutex<Vec<String>>,
    query_responses: Mutex<VecDeque<Result<Vec<RemoteRecord>>>>,
    fallback: Mutex<Vec<RemoteRecord>>,
    search_groups: Mutex<BTreeMap<ObjectType, Vec<RemoteRecord>>>,
    searches: Mutex<Vec<(String, Vec<ObjectType>)>>,
    creates: Mutex<Vec<CreateCall>>,
    create_ids: Mutex<VecDeque<RecordId>>,
    updates: AtomicUsize,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next query
    pub fn push_query(self, records: Vec<RemoteRecord>) -> Self {
        self.query_responses.lock().unwrap().push_back(Ok(records));
        self
    }

    /// Queue a remote failure for the next query
    pub fn push_query_error(self, message: &str) -> Self {
        self.query_responses
            .lock()
            .unwrap()
            .push_back(Err(SalesforceMcpError::Remote(message.to_string())));
        self
    }

    /// Answer every query not covered by the queue with `records`
    pub fn always(self, records: Vec<RemoteRecord>) -> Self {
        *self.fallback.lock().unwrap() = records;
        self
    }

    pub fn with_search_group(self, object_type: ObjectType, records: Vec<RemoteRecord>) -> Self {
        self.search_groups
            .lock()
            .unwrap()
            .insert(object_type, records);
        self
    }

    /// Queue the id returned by the next `create`
    pub fn push_create_id(self, id: &str) -> Self {
        self.create_ids
            .lock()
            .unwrap()
            .push_back(RecordId::parse(id).expect("valid test id"));
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn searches(&self) -> Vec<(String, Vec<ObjectType>)> {
        self.searches.lock().unwrap().clone()
    }

    pub fn creates(&self) -> Vec<CreateCall> {
        self.creates.lock().unwrap().clone()
    }

    /// Total number of calls of any kind
    pub fn total_calls(&self) -> usize {
        self.queries.lock().unwrap().len()
            + self.searches.lock().unwrap().len()
            + self.creates.lock().unwrap().len()
            + self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionHandle for RecordingSession {
    async fn execute_query(&self, soql: &str) -> Result<Vec<RemoteRecord>> {
        self.queries.lock().unwrap().push(soql.to_string());
        match self.query_responses.lock().unwrap().pop_front() {
            Some(response) => response,
            None => Ok(self.fallback.lock().unwrap().clone()),
        }
    }

    async fn execute_search(
        &self,
        sosl: &str,
        object_types: &[ObjectType],
    ) -> Result<BTreeMap<ObjectType, Vec<RemoteRecord>>> {
        self.searches
            .lock()
            .unwrap()
            .push((sosl.to_string(), object_types.to_vec()));
        Ok(self
            .search_groups
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| object_types.contains(t))
            .map(|(t, records)| (*t, records.clone()))
            .collect())
    }

    async fn create(&self, object_type: ObjectType, fields: &RemoteRecord) -> Result<RecordId> {
        self.creates.lock().unwrap().push(CreateCall {
            object_type,
            fields: fields.clone(),
        });
        self.create_ids
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| SalesforceMcpError::Remote("no create id queued".to_string()))
    }

    async fn update(
        &self,
        _object_type: ObjectType,
        _id: &RecordId,
        _fields: &RemoteRecord,
    ) -> Result<bool> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

/// Build a handler over a shared stub so the test can inspect it afterwards
pub fn handler_for(session: RecordingSession) -> (ToolHandler, Arc<RecordingSession>) {
    let session = Arc::new(session);
    let handler = ToolHandler::new(session.clone());
    (handler, session)
}

/// Turn a JSON object literal into a record
pub fn record(value: Value) -> RemoteRecord {
    value
        .as_object()
        .cloned()
        .expect("test record must be a JSON object")
}

pub fn contact(id: &str, name: &str, email: &str) -> RemoteRecord {
    record(serde_json::json!({
        "attributes": {"type": "Contact", "url": format!("/services/data/v59.0/sobjects/Contact/{}", id)},
        "Id": id,
        "Name": name,
        "Email": email,
        "Phone": "+1 555 0100",
        "Title": "VP Engineering",
        "Account": {"attributes": {"type": "Account"}, "Name": "Acme Corp"}
    }))
}
