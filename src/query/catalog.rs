//! Queries issued by the tool catalog
//!
//! Each function here corresponds to one lookup a tool handler performs. Field
//! lists double as the shape of the tool's output.

use super::{Filter, QuerySpec};
use crate::types::{ObjectType, RecordId};

/// The platform's own terminal flag on opportunities and cases
pub const CLOSED_FLAG: &str = "IsClosed";

pub const CONTACT_FIELDS: &[&str] = &["Email", "Phone", "Title", "Account.Name"];

pub const ACCOUNT_FIELDS: &[&str] = &[
    "Type",
    "Industry",
    "Phone",
    "Website",
    "BillingStreet",
    "BillingCity",
    "BillingState",
    "BillingPostalCode",
    "BillingCountry",
    "AnnualRevenue",
    "NumberOfEmployees",
    "Owner.Name",
];

pub const OPPORTUNITY_FIELDS: &[&str] = &[
    "StageName",
    "Amount",
    "CloseDate",
    "Probability",
    "Account.Name",
    "Owner.Name",
];

pub const CASE_DETAIL_FIELDS: &[&str] = &[
    "Subject",
    "Status",
    "Priority",
    "Origin",
    "Description",
    "CreatedDate",
    "Contact.Name",
    "Contact.Email",
    "Account.Name",
    "Owner.Name",
];

pub const CASE_LIST_FIELDS: &[&str] = &[
    "Subject",
    "Status",
    "Priority",
    "CreatedDate",
    "Contact.Name",
    "Account.Name",
];

/// Contacts whose name contains `name`, optionally pinned to an exact email
pub fn contact_search(name: &str, email: Option<&str>) -> QuerySpec {
    QuerySpec::new(ObjectType::Contact)
        .select(CONTACT_FIELDS)
        .filter(Filter::contains("Name", name))
        .filter_opt(email.map(|e| Filter::equals("Email", e)))
}

/// A single account by id
pub fn account_by_id(id: &RecordId) -> QuerySpec {
    QuerySpec::new(ObjectType::Account)
        .select(ACCOUNT_FIELDS)
        .filter(Filter::equals("Id", id.as_str()))
        .limit(1)
}

/// Accounts whose name contains `name`
pub fn account_by_name(name: &str) -> QuerySpec {
    QuerySpec::new(ObjectType::Account)
        .select(ACCOUNT_FIELDS)
        .filter(Filter::contains("Name", name))
}

/// Opportunities the org has not marked closed
///
/// `account` is an account id or a name fragment; `owner` is an email address
/// or a name fragment of the owning user.
pub fn open_opportunities(account: Option<&str>, owner: Option<&str>, limit: u32) -> QuerySpec {
    let account_filter = account.map(|a| match RecordId::parse(a) {
        Some(id) if id.is(ObjectType::Account) => Filter::equals("AccountId", id.as_str()),
        _ => Filter::contains("Account.Name", a),
    });
    let owner_filter = owner.map(|o| {
        if o.contains('@') {
            Filter::equals("Owner.Email", o)
        } else {
            Filter::contains("Owner.Name", o)
        }
    });

    QuerySpec::new(ObjectType::Opportunity)
        .select(OPPORTUNITY_FIELDS)
        .filter(Filter::is_bool(CLOSED_FLAG, false))
        .filter_opt(account_filter)
        .filter_opt(owner_filter)
        .limit(limit)
}

/// Existence check for any record by id
pub fn record_exists(object_type: ObjectType, id: &RecordId) -> QuerySpec {
    QuerySpec::new(object_type)
        .filter(Filter::equals("Id", id.as_str()))
        .limit(1)
}

/// Full details of a case by its visible number
pub fn case_by_number(case_number: &str) -> QuerySpec {
    QuerySpec::new(ObjectType::Case)
        .select(CASE_DETAIL_FIELDS)
        .filter(Filter::equals("CaseNumber", case_number))
}

/// Resolve a case id or number to the case's id and number
pub fn case_reference(id_or_number: &str) -> QuerySpec {
    let filter = match RecordId::parse(id_or_number) {
        Some(id) if id.is(ObjectType::Case) => Filter::equals("Id", id.as_str()),
        _ => Filter::equals("CaseNumber", id_or_number),
    };

    QuerySpec::new(ObjectType::Case).filter(filter).limit(1)
}

/// Cases the org has not marked closed
pub fn open_cases(contact_email: Option<&str>, account_name: Option<&str>, limit: u32) -> QuerySpec {
    QuerySpec::new(ObjectType::Case)
        .select(CASE_LIST_FIELDS)
        .filter(Filter::is_bool(CLOSED_FLAG, false))
        .filter_opt(contact_email.map(|e| Filter::equals("Contact.Email", e)))
        .filter_opt(account_name.map(|n| Filter::contains("Account.Name", n)))
        .limit(limit)
}
