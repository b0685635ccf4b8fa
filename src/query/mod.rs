//! SOQL and SOSL construction
//!
//! Tool handlers describe what they want as a [`QuerySpec`] (or a
//! [`SearchSpec`] for global search) and render it to query text here. The
//! rendering is deterministic: fields and filters keep the order in which they
//! were declared, and every caller-supplied value is escaped.

pub mod catalog;
pub mod escape;
pub mod search;

pub use escape::{escape_soql, escape_soql_like, escape_sosl};
pub use search::SearchSpec;

use crate::error::{Result, SalesforceMcpError};
use crate::types::ObjectType;
use once_cell::sync::Lazy;
use regex::Regex;

/// Field paths must be plain identifiers joined by dots (`Account.Name`)
static FIELD_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z][A-Za-z0-9_]*)*$").expect("valid field regex")
});

/// Comparison applied by a [`Filter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Exact match
    Equals,
    /// Case-insensitive substring match
    Contains,
}

/// Right-hand side of a [`Filter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Bool(bool),
}

/// A single `field operator value` predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub operator: Operator,
    pub value: FilterValue,
}

impl Filter {
    pub fn equals(field: &str, value: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            operator: Operator::Equals,
            value: FilterValue::Text(value.into()),
        }
    }

    pub fn contains(field: &str, value: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            operator: Operator::Contains,
            value: FilterValue::Text(value.into()),
        }
    }

    pub fn is_bool(field: &str, value: bool) -> Self {
        Self {
            field: field.to_string(),
            operator: Operator::Equals,
            value: FilterValue::Bool(value),
        }
    }

    fn render(&self) -> Result<String> {
        check_field(&self.field)?;

        match (&self.operator, &self.value) {
            (Operator::Equals, FilterValue::Text(v)) => {
                Ok(format!("{} = '{}'", self.field, escape_soql(v)))
            }
            (Operator::Equals, FilterValue::Bool(b)) => Ok(format!("{} = {}", self.field, b)),
            (Operator::Contains, FilterValue::Text(v)) => {
                Ok(format!("{} LIKE '%{}%'", self.field, escape_soql_like(v)))
            }
            (operator, value) => Err(SalesforceMcpError::Internal(format!(
                "filter on {} cannot combine {:?} with {:?}",
                self.field, operator, value
            ))),
        }
    }
}

fn check_field(field: &str) -> Result<()> {
    if FIELD_PATH.is_match(field) {
        Ok(())
    } else {
        Err(SalesforceMcpError::Internal(format!(
            "invalid field path in query: {:?}",
            field
        )))
    }
}

/// A SOQL query against a single object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub object_type: ObjectType,
    pub fields: Vec<String>,
    pub filters: Vec<Filter>,
    pub limit: Option<u32>,
}

impl QuerySpec {
    /// Start a query that always selects the id and display field.
    pub fn new(object_type: ObjectType) -> Self {
        let mut fields = vec!["Id".to_string()];
        let display = object_type.display_field();
        if display != "Id" {
            fields.push(display.to_string());
        }

        Self {
            object_type,
            fields,
            filters: Vec::new(),
            limit: None,
        }
    }

    /// Add fields after the mandatory ones, skipping duplicates.
    pub fn select(mut self, fields: &[&str]) -> Self {
        for field in fields {
            if !self.fields.iter().any(|f| f == field) {
                self.fields.push(field.to_string());
            }
        }
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Append a filter only when the optional argument carries a value.
    pub fn filter_opt(self, filter: Option<Filter>) -> Self {
        match filter {
            Some(filter) => self.filter(filter),
            None => self,
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render the SOQL text.
    pub fn to_soql(&self) -> Result<String> {
        for field in &self.fields {
            check_field(field)?;
        }

        let mut soql = format!(
            "SELECT {} FROM {}",
            self.fields.join(", "),
            self.object_type.api_name()
        );

        if !self.filters.is_empty() {
            let predicates = self
                .filters
                .iter()
                .map(Filter::render)
                .collect::<Result<Vec<_>>>()?;
            soql.push_str(" WHERE ");
            soql.push_str(&predicates.join(" AND "));
        }

        if let Some(limit) = self.limit {
            soql.push_str(&format!(" LIMIT {}", limit));
        }

        Ok(soql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_and_display_always_selected() {
        let spec = QuerySpec::new(ObjectType::Case).select(&["Subject", "Id"]);
        assert_eq!(spec.fields, vec!["Id", "CaseNumber", "Subject"]);
        assert_eq!(spec.to_soql().unwrap(), "SELECT Id, CaseNumber, Subject FROM Case");
    }

    #[test]
    fn test_filters_joined_in_declaration_order() {
        let soql = QuerySpec::new(ObjectType::Contact)
            .select(&["Email"])
            .filter(Filter::contains("Name", "Jane"))
            .filter(Filter::equals("Email", "jane@x.com"))
            .limit(5)
            .to_soql()
            .unwrap();

        assert_eq!(
            soql,
            "SELECT Id, Name, Email FROM Contact WHERE Name LIKE '%Jane%' AND Email = 'jane@x.com' LIMIT 5"
        );
    }

    #[test]
    fn test_absent_optional_filter_leaves_no_trace() {
        let soql = QuerySpec::new(ObjectType::Opportunity)
            .filter_opt(None)
            .to_soql()
            .unwrap();
        assert_eq!(soql, "SELECT Id, Name FROM Opportunity");
        assert!(!soql.contains("WHERE"));
    }

    #[test]
    fn test_bool_rendering_is_unquoted() {
        let soql = QuerySpec::new(ObjectType::Case)
            .filter(Filter::equals("Origin", "Won't Fix"))
            .filter(Filter::is_bool("IsClosed", false))
            .to_soql()
            .unwrap();
        assert!(soql.ends_with("WHERE Origin = 'Won\\'t Fix' AND IsClosed = false"));
    }

    #[test]
    fn test_adversarial_value_is_escaped() {
        let soql = QuerySpec::new(ObjectType::Account)
            .filter(Filter::equals("Name", "x' OR Name != '"))
            .to_soql()
            .unwrap();
        assert_eq!(
            soql,
            "SELECT Id, Name FROM Account WHERE Name = 'x\\' OR Name != \\''"
        );
    }

    #[test]
    fn test_invalid_field_is_internal_error() {
        let result = QuerySpec::new(ObjectType::Account)
            .select(&["Name FROM User --"])
            .to_soql();
        assert!(matches!(result, Err(SalesforceMcpError::Internal(_))));
    }

    #[test]
    fn test_mismatched_operator_is_internal_error() {
        let filter = Filter {
            field: "Name".into(),
            operator: Operator::Contains,
            value: FilterValue::Bool(true),
        };
        let result = QuerySpec::new(ObjectType::Account).filter(filter).to_soql();
        assert!(matches!(result, Err(SalesforceMcpError::Internal(_))));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let build = || {
            QuerySpec::new(ObjectType::Contact)
                .select(&["Email", "Phone", "Account.Name"])
                .filter(Filter::contains("Name", "Doe"))
                .to_soql()
                .unwrap()
        };
        assert_eq!(build(), build());
    }
}
