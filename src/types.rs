//! Core data types for the Salesforce MCP bridge
//!
//! Defines the Salesforce object catalog, record identifiers, raw remote records
//! and the structured tool result returned to the MCP client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A record exactly as the session handle returned it (field name -> value).
///
/// Relationship fields arrive as nested objects (`{"Account": {"Name": ...}}`).
pub type RemoteRecord = serde_json::Map<String, Value>;

/// Salesforce object types the bridge reads or writes.
///
/// Declaration order is the canonical order used for field lists, search
/// clauses and grouped results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    Account,
    Contact,
    Opportunity,
    Case,
    /// Activity records created by `log_activity`
    Task,
    /// Comments attached by `add_comment_to_case`
    CaseComment,
}

impl ObjectType {
    /// Objects covered by global search when the caller does not restrict it
    pub const SEARCHABLE: [ObjectType; 4] = [
        ObjectType::Account,
        ObjectType::Contact,
        ObjectType::Opportunity,
        ObjectType::Case,
    ];

    /// API name used in SOQL, SOSL and REST paths
    pub fn api_name(&self) -> &'static str {
        match self {
            ObjectType::Account => "Account",
            ObjectType::Contact => "Contact",
            ObjectType::Opportunity => "Opportunity",
            ObjectType::Case => "Case",
            ObjectType::Task => "Task",
            ObjectType::CaseComment => "CaseComment",
        }
    }

    /// Field used to display a record of this type to a human
    pub fn display_field(&self) -> &'static str {
        match self {
            ObjectType::Case => "CaseNumber",
            ObjectType::Task => "Subject",
            ObjectType::CaseComment => "CommentBody",
            _ => "Name",
        }
    }

    /// Three-character key prefix shared by every record id of this type
    pub fn key_prefix(&self) -> &'static str {
        match self {
            ObjectType::Account => "001",
            ObjectType::Contact => "003",
            ObjectType::Opportunity => "006",
            ObjectType::Case => "500",
            ObjectType::Task => "00T",
            ObjectType::CaseComment => "00a",
        }
    }

    /// Parse an API name, case-insensitively
    pub fn from_api_name(name: &str) -> Option<Self> {
        [
            ObjectType::Account,
            ObjectType::Contact,
            ObjectType::Opportunity,
            ObjectType::Case,
            ObjectType::Task,
            ObjectType::CaseComment,
        ]
        .into_iter()
        .find(|t| t.api_name().eq_ignore_ascii_case(name.trim()))
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.api_name())
    }
}

/// Salesforce record id (15-character case-sensitive or 18-character form)
///
/// Deserialization goes through [`RecordId::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Parse a string that looks like a record id.
    ///
    /// Returns `None` for anything that is not 15 or 18 ASCII alphanumerics, so
    /// names and case numbers never parse as ids.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let well_formed =
            (s.len() == 15 || s.len() == 18) && s.chars().all(|c| c.is_ascii_alphanumeric());
        well_formed.then(|| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn key_prefix(&self) -> &str {
        &self.0[..3]
    }

    /// Object type implied by the key prefix, if it is one the bridge knows
    pub fn object_type(&self) -> Option<ObjectType> {
        [
            ObjectType::Account,
            ObjectType::Contact,
            ObjectType::Opportunity,
            ObjectType::Case,
            ObjectType::Task,
            ObjectType::CaseComment,
        ]
        .into_iter()
        .find(|t| t.key_prefix() == self.key_prefix())
    }

    /// True when the id belongs to the given object type
    pub fn is(&self, object_type: ObjectType) -> bool {
        self.key_prefix() == object_type.key_prefix()
    }
}

impl TryFrom<String> for RecordId {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("not a Salesforce record id: {:?}", value))
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome classification of a tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolStatus {
    Ok,
    NotFound,
    Ambiguous,
    Error,
}

/// One candidate offered back to the caller when a lookup is ambiguous
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub id: String,
    pub display_name: String,
}

/// Structured result of a tool invocation
///
/// Invariants: `NotFound` carries a null payload; `Ambiguous` carries an array of
/// at least two [`CandidateSummary`] values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub status: ToolStatus,

    pub payload: Value,

    /// Human-readable explanation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ToolResult {
    /// Successful result
    pub fn ok(payload: Value) -> Self {
        Self {
            status: ToolStatus::Ok,
            payload,
            message: None,
        }
    }

    /// Nothing matched
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::NotFound,
            payload: Value::Null,
            message: Some(message.into()),
        }
    }

    /// Several records matched a lookup that expects one
    pub fn ambiguous(candidates: Vec<CandidateSummary>, total: usize) -> Self {
        debug_assert!(candidates.len() >= 2);
        let shown = candidates.len();
        let message = if shown < total {
            format!(
                "{} records matched; showing the first {}. Narrow the query to select one.",
                total, shown
            )
        } else {
            format!("{} records matched. Narrow the query to select one.", total)
        };

        Self {
            status: ToolStatus::Ambiguous,
            payload: serde_json::to_value(candidates).unwrap_or(Value::Null),
            message: Some(message),
        }
    }

    /// Remote failure, message kept verbatim
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Error,
            payload: Value::Null,
            message: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == ToolStatus::Error
    }
}
