//! MCP tool implementations
//!
//! Nine Salesforce tools, grouped the way a sales or support agent uses them:
//! - SALES: search_contact, get_account_details, list_open_opportunities, log_activity
//! - SERVICE: get_case_details, list_open_cases, create_case, add_comment_to_case
//! - GLOBAL: search_salesforce
//!
//! Every call is validated into a [`ToolCall`] before the session is touched.

use super::arguments::{
    AccountRef, AddCommentToCaseArgs, CaseParty, CreateCaseArgs, LogActivityArgs,
    ListOpenCasesArgs, ListOpenOpportunitiesArgs, SearchContactArgs, SearchSalesforceArgs,
    ToolCall, ToolName,
};
use crate::config::DEFAULT_MAX_LIST_RECORDS;
use crate::error::{Result, SalesforceMcpError};
use crate::normalize::{Normalizer, DEFAULT_MAX_CANDIDATES};
use crate::query::{catalog, QuerySpec, SearchSpec};
use crate::salesforce::SessionHandle;
use crate::types::{ObjectType, RecordId, RemoteRecord, ToolResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Tool schema definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name (e.g., "search_contact")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Tool handler that validates calls and dispatches them against a session
pub struct ToolHandler {
    session: Arc<dyn SessionHandle>,
    normalizer: Normalizer,
    max_list_records: u32,
}

impl ToolHandler {
    /// Create a tool handler with default result limits
    pub fn new(session: Arc<dyn SessionHandle>) -> Self {
        Self::with_limits(session, DEFAULT_MAX_CANDIDATES, DEFAULT_MAX_LIST_RECORDS)
    }

    /// Create a tool handler with explicit candidate and list caps
    pub fn with_limits(
        session: Arc<dyn SessionHandle>,
        max_candidates: usize,
        max_list_records: u32,
    ) -> Self {
        Self {
            session,
            normalizer: Normalizer::new(max_candidates),
            max_list_records: max_list_records.max(1),
        }
    }

    /// Get list of all available tools
    pub fn list_tools(&self) -> Vec<Tool> {
        tool_catalog()
    }

    /// Execute a tool call
    ///
    /// Validation failures and unknown tools are returned as `Err` before any
    /// remote call. Failures reported by Salesforce become `status: error`
    /// results carrying the remote text verbatim.
    pub async fn execute(&self, tool_name: &str, params: Value) -> Result<ToolResult> {
        debug!("Executing tool: {}", tool_name);

        let call = ToolCall::parse(tool_name, params).map_err(|e| {
            warn!("Rejected {} call: {}", tool_name, e);
            e
        })?;

        match self.dispatch(call).await {
            Ok(result) => Ok(result),
            Err(e) if e.is_remote() => {
                warn!("Tool {} failed remotely: {}", tool_name, e);
                Ok(ToolResult::error(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Run an already validated call
    pub async fn dispatch(&self, call: ToolCall) -> Result<ToolResult> {
        match call {
            ToolCall::SearchContact(args) => self.search_contact(args).await,
            ToolCall::GetAccountDetails(args) => self.get_account_details(args.account).await,
            ToolCall::ListOpenOpportunities(args) => self.list_open_opportunities(args).await,
            ToolCall::LogActivity(args) => self.log_activity(args).await,
            ToolCall::GetCaseDetails(args) => self.get_case_details(&args.case_number).await,
            ToolCall::ListOpenCases(args) => self.list_open_cases(args).await,
            ToolCall::CreateCase(args) => self.create_case(args).await,
            ToolCall::AddCommentToCase(args) => self.add_comment_to_case(args).await,
            ToolCall::SearchSalesforce(args) => self.search_salesforce(args).await,
        }
    }

    async fn query(&self, spec: &QuerySpec) -> Result<Vec<RemoteRecord>> {
        let soql = spec.to_soql()?;
        self.session.execute_query(&soql).await
    }

    // === SALES Tools ===

    async fn search_contact(&self, args: SearchContactArgs) -> Result<ToolResult> {
        let spec = catalog::contact_search(&args.name, args.email.as_deref());
        let records = self.query(&spec).await?;

        // An exact email already pins the caller's intent; duplicates are returned as-is.
        if args.email.is_some() && records.len() > 1 {
            return Ok(self.normalizer.list(&spec, &records));
        }

        Ok(self
            .normalizer
            .single(&spec, &records, &format!("contact matching '{}'", args.name)))
    }

    async fn get_account_details(&self, account: AccountRef) -> Result<ToolResult> {
        let (spec, what) = match &account {
            AccountRef::Id(id) => (catalog::account_by_id(id), format!("account with id {}", id)),
            AccountRef::Name(name) => (
                catalog::account_by_name(name),
                format!("account matching '{}'", name),
            ),
        };
        let records = self.query(&spec).await?;
        Ok(self.normalizer.single(&spec, &records, &what))
    }

    async fn list_open_opportunities(&self, args: ListOpenOpportunitiesArgs) -> Result<ToolResult> {
        let spec = catalog::open_opportunities(
            args.account.as_deref(),
            args.owner.as_deref(),
            self.max_list_records,
        );
        let records = self.query(&spec).await?;
        debug!("Found {} open opportunities", records.len());
        Ok(self.normalizer.list(&spec, &records))
    }

    async fn log_activity(&self, args: LogActivityArgs) -> Result<ToolResult> {
        let exists = catalog::record_exists(args.related_type, &args.related_to);
        if self.query(&exists).await?.is_empty() {
            return Ok(ToolResult::not_found(format!(
                "No {} found with id {}",
                args.related_type, args.related_to
            )));
        }

        let mut fields = RemoteRecord::new();
        fields.insert("Subject".into(), json!(args.subject));
        if let Some(description) = &args.description {
            fields.insert("Description".into(), json!(description));
        }
        fields.insert("Status".into(), json!("Completed"));
        let link_field = if args.related_type == ObjectType::Contact {
            "WhoId"
        } else {
            "WhatId"
        };
        fields.insert(link_field.into(), json!(args.related_to.as_str()));

        let id = self.session.create(ObjectType::Task, &fields).await?;
        info!("Logged activity {} on {} {}", id, args.related_type, args.related_to);

        Ok(ToolResult::ok(json!({
            "id": id,
            "related_to_id": args.related_to,
        })))
    }

    // === SERVICE Tools ===

    async fn get_case_details(&self, case_number: &str) -> Result<ToolResult> {
        let spec = catalog::case_by_number(case_number);
        let records = self.query(&spec).await?;
        Ok(self
            .normalizer
            .single(&spec, &records, &format!("case with number '{}'", case_number)))
    }

    async fn list_open_cases(&self, args: ListOpenCasesArgs) -> Result<ToolResult> {
        let spec = catalog::open_cases(
            args.contact_email.as_deref(),
            args.account_name.as_deref(),
            self.max_list_records,
        );
        let records = self.query(&spec).await?;
        debug!("Found {} open cases", records.len());
        Ok(self.normalizer.list(&spec, &records))
    }

    async fn create_case(&self, args: CreateCaseArgs) -> Result<ToolResult> {
        let mut fields = RemoteRecord::new();
        fields.insert("Subject".into(), json!(args.subject));
        fields.insert("Description".into(), json!(args.description));
        fields.insert("Priority".into(), json!(args.priority.as_str()));
        fields.insert("Status".into(), json!("New"));
        match &args.party {
            CaseParty::Account(id) => fields.insert("AccountId".into(), json!(id.as_str())),
            CaseParty::Contact(id) => fields.insert("ContactId".into(), json!(id.as_str())),
        };

        let id = self.session.create(ObjectType::Case, &fields).await?;
        info!("Created case {}", id);

        // The case exists from here on, so a failed read-back must not surface as an error.
        let read_back = self.query(&catalog::case_reference(id.as_str())).await;
        let (case_number, message) = match read_back {
            Ok(created) => (
                created
                    .first()
                    .and_then(|r| r.get("CaseNumber"))
                    .cloned()
                    .unwrap_or(Value::Null),
                None,
            ),
            Err(e) => {
                warn!("Case {} created but its number could not be read: {}", id, e);
                (
                    Value::Null,
                    Some(format!("Case created; reading its case number failed: {}", e)),
                )
            }
        };

        let mut result = ToolResult::ok(json!({
            "id": id,
            "case_number": case_number,
        }));
        result.message = message;
        Ok(result)
    }

    async fn add_comment_to_case(&self, args: AddCommentToCaseArgs) -> Result<ToolResult> {
        let spec = catalog::case_reference(&args.case_id_or_number);
        let records = self.query(&spec).await?;

        let case = match records.as_slice() {
            [] => {
                return Ok(ToolResult::not_found(format!(
                    "No case found for '{}'",
                    args.case_id_or_number
                )))
            }
            [case] => case,
            _ => return Ok(self.normalizer.ambiguous(ObjectType::Case, &records)),
        };

        let case_id = case
            .get("Id")
            .and_then(Value::as_str)
            .and_then(RecordId::parse)
            .ok_or_else(|| {
                SalesforceMcpError::Remote(format!(
                    "Case lookup for '{}' returned a record without an Id",
                    args.case_id_or_number
                ))
            })?;

        let mut fields = RemoteRecord::new();
        fields.insert("ParentId".into(), json!(case_id.as_str()));
        fields.insert("CommentBody".into(), json!(args.comment));
        fields.insert("IsPublished".into(), json!(args.is_public));

        let id = self.session.create(ObjectType::CaseComment, &fields).await?;
        info!("Added comment {} to case {}", id, case_id);

        Ok(ToolResult::ok(json!({
            "id": id,
            "case_id": case_id,
            "is_public": args.is_public,
        })))
    }

    // === GLOBAL Tools ===

    async fn search_salesforce(&self, args: SearchSalesforceArgs) -> Result<ToolResult> {
        let spec = SearchSpec::new(&args.term, args.object_types.as_deref());
        let sosl = spec.to_sosl();
        let groups = self
            .session
            .execute_search(&sosl, &spec.object_types)
            .await?;
        Ok(self.normalizer.grouped(&spec, &groups))
    }
}

/// Schemas of every tool, in catalog order
pub fn tool_catalog() -> Vec<Tool> {
    ToolName::ALL.into_iter().map(describe).collect()
}

fn describe(name: ToolName) -> Tool {
    let (description, input_schema) = match name {
        ToolName::SearchContact => (
            "Search Salesforce contacts by name, optionally pinned to an exact email. Returns one contact, or candidates to choose from when several match.",
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Full or partial contact name"},
                    "email": {"type": "string", "description": "Exact email address to narrow the search"}
                },
                "required": ["name"]
            }),
        ),
        ToolName::GetAccountDetails => (
            "Get the full details of an account (company) by name or Salesforce id.",
            json!({
                "type": "object",
                "properties": {
                    "name_or_id": {"type": "string", "description": "Account name (e.g. 'Acme Corp') or 15/18 character id starting with 001"}
                },
                "required": ["name_or_id"]
            }),
        ),
        ToolName::ListOpenOpportunities => (
            "List opportunities that are not closed, optionally for one account or owner.",
            json!({
                "type": "object",
                "properties": {
                    "account": {"type": "string", "description": "Account id or name fragment"},
                    "owner": {"type": "string", "description": "Owner email address or name fragment"}
                }
            }),
        ),
        ToolName::LogActivity => (
            "Log a completed activity (call, email, meeting) against an existing Account, Contact, Opportunity or Case.",
            json!({
                "type": "object",
                "properties": {
                    "subject": {"type": "string", "description": "Activity subject (e.g. 'Follow-up call')", "maxLength": 255},
                    "related_to_id": {"type": "string", "description": "Id of the record the activity relates to"},
                    "description": {"type": "string", "description": "What happened during the activity"}
                },
                "required": ["subject", "related_to_id"]
            }),
        ),
        ToolName::GetCaseDetails => (
            "Get the details of a support case by its case number.",
            json!({
                "type": "object",
                "properties": {
                    "case_number": {"type": "string", "description": "Visible case number (e.g. '00001234')"}
                },
                "required": ["case_number"]
            }),
        ),
        ToolName::ListOpenCases => (
            "List support cases that are not closed, optionally for one contact email or account name.",
            json!({
                "type": "object",
                "properties": {
                    "contact_email": {"type": "string", "description": "Email of the contact who raised the cases"},
                    "account_name": {"type": "string", "description": "Account name fragment"}
                }
            }),
        ),
        ToolName::CreateCase => (
            "Open a new support case for an account or contact. Returns the new case id and case number.",
            json!({
                "type": "object",
                "properties": {
                    "subject": {"type": "string", "description": "Short summary of the problem", "maxLength": 255},
                    "description": {"type": "string", "description": "Detailed description of the problem"},
                    "account_or_contact": {"type": "string", "description": "Id of the Account (001...) or Contact (003...) the case is for"},
                    "priority": {"type": "string", "enum": ["Low", "Medium", "High"], "default": "Medium"}
                },
                "required": ["subject", "description", "account_or_contact"]
            }),
        ),
        ToolName::AddCommentToCase => (
            "Add a comment to an existing case, identified by case id or case number.",
            json!({
                "type": "object",
                "properties": {
                    "case_id_or_number": {"type": "string", "description": "Case id (500...) or visible case number"},
                    "comment": {"type": "string", "description": "Comment text", "maxLength": 4000},
                    "is_public": {"type": "boolean", "description": "Publish the comment to the customer portal", "default": false}
                },
                "required": ["case_id_or_number", "comment"]
            }),
        ),
        ToolName::SearchSalesforce => (
            "Search across Accounts, Contacts, Opportunities and Cases. Results are grouped by object type.",
            json!({
                "type": "object",
                "properties": {
                    "term": {"type": "string", "description": "Text to search for (at least 2 characters)", "minLength": 2},
                    "object_types": {
                        "type": "array",
                        "items": {"type": "string", "enum": ["Account", "Contact", "Opportunity", "Case"]},
                        "description": "Restrict the search to these object types"
                    }
                },
                "required": ["term"]
            }),
        ),
    };

    Tool {
        name: name.as_str().to_string(),
        description: description.to_string(),
        input_schema,
    }
}
