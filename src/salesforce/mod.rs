//! Salesforce session layer
//!
//! [`SessionHandle`] is the only way the rest of the crate reaches Salesforce.
//! [`RestSession`] implements it over the REST API once [`auth::login`] has
//! obtained a session id.

pub mod auth;
pub mod rest;

pub use auth::login;
pub use rest::RestSession;

use crate::error::Result;
use crate::types::{ObjectType, RecordId, RemoteRecord};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Authenticated connection to a Salesforce org
///
/// Implementations must be safe to share between concurrent tool invocations.
/// They neither retry nor cache: one call is one remote round trip (or, for
/// paginated queries, one logical read).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionHandle: Send + Sync {
    /// Run a SOQL query and return every matching record
    async fn execute_query(&self, soql: &str) -> Result<Vec<RemoteRecord>>;

    /// Run a SOSL search and group hits by object type
    async fn execute_search(
        &self,
        sosl: &str,
        object_types: &[ObjectType],
    ) -> Result<BTreeMap<ObjectType, Vec<RemoteRecord>>>;

    /// Create a record and return its id
    async fn create(&self, object_type: ObjectType, fields: &RemoteRecord) -> Result<RecordId>;

    /// Update fields of an existing record
    async fn update(
        &self,
        object_type: ObjectType,
        id: &RecordId,
        fields: &RemoteRecord,
    ) -> Result<bool>;
}
