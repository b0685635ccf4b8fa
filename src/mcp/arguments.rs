//! Typed arguments for each tool
//!
//! A `tools/call` request carries an open JSON object. [`ToolCall::parse`]
//! turns it into one variant per tool with named, validated fields, so nothing
//! downstream ever looks at the raw map. All validation happens here, before
//! any Salesforce call.

use crate::error::{Result, SalesforceMcpError};
use crate::types::{ObjectType, RecordId};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Longest subject Salesforce stores on Task and Case
const MAX_SUBJECT_LEN: usize = 255;

/// Longest body accepted for a case comment
const MAX_COMMENT_LEN: usize = 4000;

/// Names of the tools in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    SearchContact,
    GetAccountDetails,
    ListOpenOpportunities,
    LogActivity,
    GetCaseDetails,
    ListOpenCases,
    CreateCase,
    AddCommentToCase,
    SearchSalesforce,
}

impl ToolName {
    pub const ALL: [ToolName; 9] = [
        ToolName::SearchContact,
        ToolName::GetAccountDetails,
        ToolName::ListOpenOpportunities,
        ToolName::LogActivity,
        ToolName::GetCaseDetails,
        ToolName::ListOpenCases,
        ToolName::CreateCase,
        ToolName::AddCommentToCase,
        ToolName::SearchSalesforce,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::SearchContact => "search_contact",
            ToolName::GetAccountDetails => "get_account_details",
            ToolName::ListOpenOpportunities => "list_open_opportunities",
            ToolName::LogActivity => "log_activity",
            ToolName::GetCaseDetails => "get_case_details",
            ToolName::ListOpenCases => "list_open_cases",
            ToolName::CreateCase => "create_case",
            ToolName::AddCommentToCase => "add_comment_to_case",
            ToolName::SearchSalesforce => "search_salesforce",
        }
    }
}

impl FromStr for ToolName {
    type Err = SalesforceMcpError;

    fn from_str(s: &str) -> Result<Self> {
        ToolName::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| SalesforceMcpError::UnknownTool(s.to_string()))
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case priority picklist values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CasePriority {
    Low,
    #[default]
    Medium,
    High,
}

impl CasePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            CasePriority::Low => "Low",
            CasePriority::Medium => "Medium",
            CasePriority::High => "High",
        }
    }
}

impl FromStr for CasePriority {
    type Err = SalesforceMcpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(CasePriority::Low),
            "medium" => Ok(CasePriority::Medium),
            "high" => Ok(CasePriority::High),
            _ => Err(SalesforceMcpError::invalid(
                "priority",
                format!("must be one of Low, Medium, High (got '{}')", s),
            )),
        }
    }
}

/// Account reference given to `get_account_details`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountRef {
    Id(RecordId),
    Name(String),
}

/// Record a new case is attached to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseParty {
    Account(RecordId),
    Contact(RecordId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchContactArgs {
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetAccountDetailsArgs {
    pub account: AccountRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOpenOpportunitiesArgs {
    pub account: Option<String>,
    pub owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogActivityArgs {
    pub subject: String,
    pub related_to: RecordId,
    pub related_type: ObjectType,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetCaseDetailsArgs {
    pub case_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOpenCasesArgs {
    pub contact_email: Option<String>,
    pub account_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCaseArgs {
    pub subject: String,
    pub description: String,
    pub party: CaseParty,
    pub priority: CasePriority,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddCommentToCaseArgs {
    pub case_id_or_number: String,
    pub comment: String,
    pub is_public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSalesforceArgs {
    pub term: String,
    pub object_types: Option<Vec<ObjectType>>,
}

/// A validated tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    SearchContact(SearchContactArgs),
    GetAccountDetails(GetAccountDetailsArgs),
    ListOpenOpportunities(ListOpenOpportunitiesArgs),
    LogActivity(LogActivityArgs),
    GetCaseDetails(GetCaseDetailsArgs),
    ListOpenCases(ListOpenCasesArgs),
    CreateCase(CreateCaseArgs),
    AddCommentToCase(AddCommentToCaseArgs),
    SearchSalesforce(SearchSalesforceArgs),
}

impl ToolCall {
    /// Validate `arguments` against the schema of `tool_name`.
    pub fn parse(tool_name: &str, arguments: Value) -> Result<Self> {
        let name: ToolName = tool_name.parse()?;
        let mut args = Arguments::new(name, arguments)?;

        let call = match name {
            ToolName::SearchContact => ToolCall::SearchContact(SearchContactArgs {
                name: args.required_str("name")?,
                email: args.optional_email("email")?,
            }),
            ToolName::GetAccountDetails => {
                let value = args.required_str("name_or_id")?;
                let account = match RecordId::parse(&value) {
                    Some(id) if id.is(ObjectType::Account) => AccountRef::Id(id),
                    _ => AccountRef::Name(value),
                };
                ToolCall::GetAccountDetails(GetAccountDetailsArgs { account })
            }
            ToolName::ListOpenOpportunities => {
                ToolCall::ListOpenOpportunities(ListOpenOpportunitiesArgs {
                    account: args.optional_str("account")?,
                    owner: args.optional_str("owner")?,
                })
            }
            ToolName::LogActivity => {
                let subject = args.required_str("subject")?;
                check_len("subject", &subject, MAX_SUBJECT_LEN)?;
                let related_to = args.required_id("related_to_id")?;
                let related_type = related_to
                    .object_type()
                    .filter(|t| ObjectType::SEARCHABLE.contains(t))
                    .ok_or_else(|| {
                        SalesforceMcpError::invalid(
                            "related_to_id",
                            format!(
                                "'{}' is not the id of an Account, Contact, Opportunity or Case",
                                related_to
                            ),
                        )
                    })?;
                ToolCall::LogActivity(LogActivityArgs {
                    subject,
                    related_to,
                    related_type,
                    description: args.optional_str("description")?,
                })
            }
            ToolName::GetCaseDetails => ToolCall::GetCaseDetails(GetCaseDetailsArgs {
                case_number: args.required_str("case_number")?,
            }),
            ToolName::ListOpenCases => ToolCall::ListOpenCases(ListOpenCasesArgs {
                contact_email: args.optional_email("contact_email")?,
                account_name: args.optional_str("account_name")?,
            }),
            ToolName::CreateCase => {
                let subject = args.required_str("subject")?;
                check_len("subject", &subject, MAX_SUBJECT_LEN)?;
                let description = args.required_str("description")?;
                let party_id = args.required_id("account_or_contact")?;
                let party = match party_id.object_type() {
                    Some(ObjectType::Account) => CaseParty::Account(party_id),
                    Some(ObjectType::Contact) => CaseParty::Contact(party_id),
                    _ => {
                        return Err(SalesforceMcpError::invalid(
                            "account_or_contact",
                            format!("'{}' is not an Account or Contact id", party_id),
                        ))
                    }
                };
                let priority = match args.optional_str("priority")? {
                    Some(p) => p.parse()?,
                    None => CasePriority::default(),
                };
                ToolCall::CreateCase(CreateCaseArgs {
                    subject,
                    description,
                    party,
                    priority,
                })
            }
            ToolName::AddCommentToCase => {
                let case_id_or_number = args.required_str("case_id_or_number")?;
                let comment = args.required_str("comment")?;
                check_len("comment", &comment, MAX_COMMENT_LEN)?;
                ToolCall::AddCommentToCase(AddCommentToCaseArgs {
                    case_id_or_number,
                    comment,
                    is_public: args.optional_bool("is_public")?.unwrap_or(false),
                })
            }
            ToolName::SearchSalesforce => {
                let term = args.required_str("term")?;
                if term.chars().count() < 2 {
                    return Err(SalesforceMcpError::invalid(
                        "term",
                        "must be at least 2 characters",
                    ));
                }
                let object_types = args
                    .optional_str_list("object_types")?
                    .map(|names| {
                        names
                            .iter()
                            .map(|n| parse_searchable(n))
                            .collect::<Result<Vec<_>>>()
                    })
                    .transpose()?;
                ToolCall::SearchSalesforce(SearchSalesforceArgs { term, object_types })
            }
        };

        args.finish()?;
        Ok(call)
    }
}

fn parse_searchable(name: &str) -> Result<ObjectType> {
    ObjectType::from_api_name(name)
        .filter(|t| ObjectType::SEARCHABLE.contains(t))
        .ok_or_else(|| {
            SalesforceMcpError::invalid(
                "object_types",
                format!(
                    "'{}' is not searchable; use Account, Contact, Opportunity or Case",
                    name
                ),
            )
        })
}

fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(SalesforceMcpError::invalid(
            field,
            format!("must be at most {} characters (got {})", max, len),
        ));
    }
    Ok(())
}

/// Argument object being consumed field by field
struct Arguments {
    tool: ToolName,
    map: Map<String, Value>,
}

impl Arguments {
    fn new(tool: ToolName, arguments: Value) -> Result<Self> {
        let map = match arguments {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(SalesforceMcpError::Validation(format!(
                    "arguments for {} must be an object, got {}",
                    tool,
                    json_type(&other)
                )))
            }
        };
        Ok(Self { tool, map })
    }

    /// Required non-empty string, trimmed
    fn required_str(&mut self, field: &str) -> Result<String> {
        match self.optional_str(field)? {
            Some(value) => Ok(value),
            None => Err(SalesforceMcpError::invalid(
                field,
                format!("required argument for {} is missing or empty", self.tool),
            )),
        }
    }

    /// Optional string; null, empty and whitespace-only count as absent
    fn optional_str(&mut self, field: &str) -> Result<Option<String>> {
        match self.map.remove(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
            }
            Some(other) => Err(SalesforceMcpError::invalid(
                field,
                format!("must be a string, got {}", json_type(&other)),
            )),
        }
    }

    fn optional_email(&mut self, field: &str) -> Result<Option<String>> {
        let value = self.optional_str(field)?;
        if let Some(email) = &value {
            let well_formed = email
                .split_once('@')
                .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
                .unwrap_or(false);
            if !well_formed {
                return Err(SalesforceMcpError::invalid(
                    field,
                    format!("'{}' is not an email address", email),
                ));
            }
        }
        Ok(value)
    }

    fn required_id(&mut self, field: &str) -> Result<RecordId> {
        let value = self.required_str(field)?;
        RecordId::parse(&value).ok_or_else(|| {
            SalesforceMcpError::invalid(
                field,
                format!("'{}' is not a 15 or 18 character Salesforce id", value),
            )
        })
    }

    fn optional_bool(&mut self, field: &str) -> Result<Option<bool>> {
        match self.map.remove(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(other) => Err(SalesforceMcpError::invalid(
                field,
                format!("must be a boolean, got {}", json_type(&other)),
            )),
        }
    }

    /// Optional list of strings; a single string is accepted as a one-element list
    fn optional_str_list(&mut self, field: &str) -> Result<Option<Vec<String>>> {
        match self.map.remove(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(vec![s])),
            Some(Value::Array(items)) => {
                let values = items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(s) => Ok(s),
                        other => Err(SalesforceMcpError::invalid(
                            field,
                            format!("items must be strings, got {}", json_type(&other)),
                        )),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok((!values.is_empty()).then_some(values))
            }
            Some(other) => Err(SalesforceMcpError::invalid(
                field,
                format!("must be an array of strings, got {}", json_type(&other)),
            )),
        }
    }

    /// Reject arguments the tool does not declare
    fn finish(self) -> Result<()> {
        match self.map.keys().next() {
            None => Ok(()),
            Some(extra) => Err(SalesforceMcpError::invalid(
                extra,
                format!("not an argument of {}", self.tool),
            )),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validation_message(result: Result<ToolCall>) -> String {
        match result {
            Err(SalesforceMcpError::Validation(msg)) => msg,
            other => panic!("expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_tool_names_round_trip() {
        for tool in ToolName::ALL {
            assert_eq!(tool.as_str().parse::<ToolName>().unwrap(), tool);
        }
        assert!(matches!(
            "delete_everything".parse::<ToolName>(),
            Err(SalesforceMcpError::UnknownTool(_))
        ));
    }

    #[test]
    fn test_search_contact_parsing() {
        let call = ToolCall::parse("search_contact", json!({"name": "  Jane Doe ", "email": ""}))
            .unwrap();
        assert_eq!(
            call,
            ToolCall::SearchContact(SearchContactArgs {
                name: "Jane Doe".into(),
                email: None
            })
        );
    }

    #[test]
    fn test_missing_required_names_field() {
        let msg = validation_message(ToolCall::parse("search_contact", json!({})));
        assert!(msg.starts_with("name:"));
        assert!(msg.contains("missing"));

        let msg = validation_message(ToolCall::parse("search_contact", Value::Null));
        assert!(msg.starts_with("name:"));
    }

    #[test]
    fn test_wrong_type_names_field() {
        let msg = validation_message(ToolCall::parse("get_case_details", json!({"case_number": 1234})));
        assert!(msg.contains("case_number"));
        assert!(msg.contains("must be a string"));
    }

    #[test]
    fn test_unknown_argument_rejected() {
        let msg = validation_message(ToolCall::parse(
            "search_contact",
            json!({"name": "Jane", "account_id": "001"}),
        ));
        assert!(msg.starts_with("account_id:"));
    }

    #[test]
    fn test_non_object_arguments_rejected() {
        let msg = validation_message(ToolCall::parse("list_open_cases", json!(["x"])));
        assert!(msg.contains("must be an object"));
    }

    #[test]
    fn test_account_ref_detection() {
        let by_id = ToolCall::parse("get_account_details", json!({"name_or_id": "0015Y00002oRabcAAA"}))
            .unwrap();
        assert!(matches!(
            by_id,
            ToolCall::GetAccountDetails(GetAccountDetailsArgs { account: AccountRef::Id(_) })
        ));

        // 15 alphanumerics but not an account key prefix
        let by_name = ToolCall::parse("get_account_details", json!({"name_or_id": "AcmeCorporation"}))
            .unwrap();
        assert!(matches!(
            by_name,
            ToolCall::GetAccountDetails(GetAccountDetailsArgs { account: AccountRef::Name(_) })
        ));
    }

    #[test]
    fn test_log_activity_requires_known_record_id() {
        let msg = validation_message(ToolCall::parse(
            "log_activity",
            json!({"subject": "Call", "related_to_id": "not-an-id"}),
        ));
        assert!(msg.starts_with("related_to_id:"));

        let msg = validation_message(ToolCall::parse(
            "log_activity",
            json!({"subject": "Call", "related_to_id": "00T5Y00000abcde"}),
        ));
        assert!(msg.contains("not the id of"));

        let call = ToolCall::parse(
            "log_activity",
            json!({"subject": "Call", "related_to_id": "0035Y00003abcdeAAA"}),
        )
        .unwrap();
        match call {
            ToolCall::LogActivity(args) => {
                assert_eq!(args.related_type, ObjectType::Contact);
                assert_eq!(args.description, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_create_case_party_and_priority() {
        let call = ToolCall::parse(
            "create_case",
            json!({
                "subject": "Printer on fire",
                "description": "Smoke everywhere",
                "account_or_contact": "0015Y00002oRabcAAA",
                "priority": "high"
            }),
        )
        .unwrap();
        match call {
            ToolCall::CreateCase(args) => {
                assert!(matches!(args.party, CaseParty::Account(_)));
                assert_eq!(args.priority, CasePriority::High);
            }
            other => panic!("unexpected {:?}", other),
        }

        let msg = validation_message(ToolCall::parse(
            "create_case",
            json!({
                "subject": "x",
                "description": "y",
                "account_or_contact": "0065Y00000abcde",
            }),
        ));
        assert!(msg.starts_with("account_or_contact:"));

        let msg = validation_message(ToolCall::parse(
            "create_case",
            json!({
                "subject": "x",
                "description": "y",
                "account_or_contact": "0035Y00003abcde",
                "priority": "Urgent"
            }),
        ));
        assert!(msg.starts_with("priority:"));
    }

    #[test]
    fn test_subject_length_limit() {
        let msg = validation_message(ToolCall::parse(
            "create_case",
            json!({
                "subject": "x".repeat(300),
                "description": "y",
                "account_or_contact": "0035Y00003abcde",
            }),
        ));
        assert!(msg.contains("at most 255"));
    }

    #[test]
    fn test_comment_is_public_type() {
        let msg = validation_message(ToolCall::parse(
            "add_comment_to_case",
            json!({"case_id_or_number": "00001234", "comment": "x", "is_public": "yes"}),
        ));
        assert!(msg.starts_with("is_public:"));

        let call = ToolCall::parse(
            "add_comment_to_case",
            json!({"case_id_or_number": "00001234", "comment": "x"}),
        )
        .unwrap();
        assert!(matches!(
            call,
            ToolCall::AddCommentToCase(AddCommentToCaseArgs { is_public: false, .. })
        ));
    }

    #[test]
    fn test_search_object_types() {
        let call = ToolCall::parse(
            "search_salesforce",
            json!({"term": "Acme", "object_types": ["case", "Account"]}),
        )
        .unwrap();
        assert_eq!(
            call,
            ToolCall::SearchSalesforce(SearchSalesforceArgs {
                term: "Acme".into(),
                object_types: Some(vec![ObjectType::Case, ObjectType::Account]),
            })
        );

        let msg = validation_message(ToolCall::parse(
            "search_salesforce",
            json!({"term": "Acme", "object_types": ["Lead"]}),
        ));
        assert!(msg.starts_with("object_types:"));

        let msg = validation_message(ToolCall::parse("search_salesforce", json!({"term": "a"})));
        assert!(msg.contains("at least 2"));
    }

    #[test]
    fn test_email_validation() {
        let msg = validation_message(ToolCall::parse(
            "list_open_cases",
            json!({"contact_email": "not-an-email"}),
        ));
        assert!(msg.starts_with("contact_email:"));
    }
}
