//! REST API implementation of [`SessionHandle`]

use super::SessionHandle;
use crate::error::{Result, SalesforceMcpError};
use crate::types::{ObjectType, RecordId, RemoteRecord};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Session against one Salesforce instance
pub struct RestSession {
    client: reqwest::Client,
    instance_url: String,
    access_token: SecretString,
    api_version: String,
}

impl std::fmt::Debug for RestSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestSession")
            .field("instance_url", &self.instance_url)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

/// `GET /query` response page
#[derive(Debug, Deserialize)]
struct QueryResponse {
    done: bool,
    #[serde(default)]
    records: Vec<RemoteRecord>,
    #[serde(rename = "nextRecordsUrl")]
    next_records_url: Option<String>,
}

/// `GET /search` response
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "searchRecords", default)]
    search_records: Vec<RemoteRecord>,
}

/// `POST /sobjects/{type}/` response
#[derive(Debug, Deserialize)]
struct CreateResponse {
    id: Option<String>,
    success: bool,
    #[serde(default)]
    errors: Vec<Value>,
}

impl RestSession {
    /// Create a session from an instance URL and session id
    pub fn new(
        instance_url: impl Into<String>,
        access_token: SecretString,
        api_version: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            instance_url: instance_url.into().trim_end_matches('/').to_string(),
            access_token,
            api_version: api_version.into(),
        })
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    fn data_url(&self, path: &str) -> String {
        format!(
            "{}/services/data/v{}{}",
            self.instance_url, self.api_version, path
        )
    }

    /// Send with the session token; non-2xx bodies become `Remote` errors verbatim.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request
            .bearer_auth(self.access_token.expose_secret())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!("Salesforce returned {}: {}", status, body);
        if body.trim().is_empty() {
            Err(SalesforceMcpError::Remote(format!(
                "Salesforce returned HTTP {}",
                status
            )))
        } else {
            Err(SalesforceMcpError::Remote(body))
        }
    }
}

#[async_trait]
impl SessionHandle for RestSession {
    async fn execute_query(&self, soql: &str) -> Result<Vec<RemoteRecord>> {
        debug!("Executing SOQL: {}", soql);

        let request = self
            .client
            .get(self.data_url("/query"))
            .query(&[("q", soql)]);
        let mut page: QueryResponse = self.send(request).await?.json().await?;
        let mut records = std::mem::take(&mut page.records);

        while !page.done {
            let Some(next) = page.next_records_url.take() else {
                break;
            };
            debug!("Fetching next query page: {}", next);
            let request = self.client.get(format!("{}{}", self.instance_url, next));
            page = self.send(request).await?.json().await?;
            records.append(&mut page.records);
        }

        debug!("SOQL returned {} records", records.len());
        Ok(records)
    }

    async fn execute_search(
        &self,
        sosl: &str,
        object_types: &[ObjectType],
    ) -> Result<BTreeMap<ObjectType, Vec<RemoteRecord>>> {
        debug!("Executing SOSL: {}", sosl);

        let request = self
            .client
            .get(self.data_url("/search"))
            .query(&[("q", sosl)]);
        let response: SearchResponse = self.send(request).await?.json().await?;

        let mut groups: BTreeMap<ObjectType, Vec<RemoteRecord>> = BTreeMap::new();
        for record in response.search_records {
            let object_type = record
                .get("attributes")
                .and_then(|a| a.get("type"))
                .and_then(Value::as_str)
                .and_then(ObjectType::from_api_name);

            match object_type {
                Some(t) if object_types.contains(&t) => groups.entry(t).or_default().push(record),
                _ => debug!("Ignoring search hit of unrequested type"),
            }
        }

        Ok(groups)
    }

    async fn create(&self, object_type: ObjectType, fields: &RemoteRecord) -> Result<RecordId> {
        info!("Creating {} record", object_type);

        let request = self
            .client
            .post(self.data_url(&format!("/sobjects/{}/", object_type.api_name())))
            .json(fields);
        let response: CreateResponse = self.send(request).await?.json().await?;

        if !response.success {
            return Err(SalesforceMcpError::Remote(
                serde_json::to_string(&response.errors)?,
            ));
        }

        response
            .id
            .as_deref()
            .and_then(RecordId::parse)
            .ok_or_else(|| {
                SalesforceMcpError::Remote(format!(
                    "{} create succeeded without a valid record id",
                    object_type
                ))
            })
    }

    async fn update(
        &self,
        object_type: ObjectType,
        id: &RecordId,
        fields: &RemoteRecord,
    ) -> Result<bool> {
        info!("Updating {} {}", object_type, id);

        let request = self
            .client
            .patch(self.data_url(&format!(
                "/sobjects/{}/{}",
                object_type.api_name(),
                id
            )))
            .json(fields);
        self.send(request).await?;

        Ok(true)
    }
}
