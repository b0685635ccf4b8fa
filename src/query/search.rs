//! SOSL global search across several objects

use super::escape::escape_sosl;
use crate::types::ObjectType;
use std::collections::BTreeMap;

/// A SOSL search over one or more object types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSpec {
    pub term: String,
    /// Object types in canonical order, without duplicates
    pub object_types: Vec<ObjectType>,
    pub fields_per_type: BTreeMap<ObjectType, Vec<String>>,
}

impl SearchSpec {
    /// Search `term` in the given object types, or all searchable ones when `None`.
    ///
    /// The caller's order is ignored so the same set always yields the same text.
    pub fn new(term: &str, restrict_to: Option<&[ObjectType]>) -> Self {
        let mut object_types: Vec<ObjectType> = match restrict_to {
            Some(types) if !types.is_empty() => types.to_vec(),
            _ => ObjectType::SEARCHABLE.to_vec(),
        };
        object_types.sort();
        object_types.dedup();

        let fields_per_type = object_types
            .iter()
            .map(|t| (*t, default_search_fields(*t)))
            .collect();

        Self {
            term: term.trim().to_string(),
            object_types,
            fields_per_type,
        }
    }

    /// Render the SOSL text.
    pub fn to_sosl(&self) -> String {
        let returning: Vec<String> = self
            .object_types
            .iter()
            .map(|t| {
                let fields = self
                    .fields_per_type
                    .get(t)
                    .cloned()
                    .unwrap_or_else(|| default_search_fields(*t));
                format!("{}({})", t.api_name(), fields.join(", "))
            })
            .collect();

        format!(
            "FIND {{{}}} IN ALL FIELDS RETURNING {}",
            escape_sosl(&self.term),
            returning.join(", ")
        )
    }
}

fn default_search_fields(object_type: ObjectType) -> Vec<String> {
    let extra: &[&str] = match object_type {
        ObjectType::Account => &["Industry", "Phone"],
        ObjectType::Contact => &["Email", "Phone"],
        ObjectType::Opportunity => &["StageName", "CloseDate"],
        ObjectType::Case => &["Subject", "Status"],
        _ => &[],
    };

    let mut fields = vec!["Id".to_string(), object_type.display_field().to_string()];
    fields.extend(extra.iter().map(|f| f.to_string()));
    fields
}
