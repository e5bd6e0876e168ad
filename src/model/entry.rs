use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::{Issue, ValidationError};
use crate::types::Value;

/// Open-ended custom-fields bag: mapping targets outside the fixed entry schema.
pub type CustomFields = BTreeMap<String, Value>;

/// Funnel stage / probability status. A closed set; other labels are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    #[serde(rename = "Low")]
    Low,
    #[serde(rename = "Medium")]
    Medium,
    #[serde(rename = "High")]
    High,
    #[serde(rename = "Closed Won")]
    ClosedWon,
    #[serde(rename = "Closed Lost")]
    ClosedLost,
}

impl Status {
    /// All statuses, in funnel order.
    pub const ALL: [Status; 5] = [
        Status::Low,
        Status::Medium,
        Status::High,
        Status::ClosedWon,
        Status::ClosedLost,
    ];

    /// The label used in workbooks.
    pub fn label(self) -> &'static str {
        match self {
            Status::Low => "Low",
            Status::Medium => "Medium",
            Status::High => "High",
            Status::ClosedWon => "Closed Won",
            Status::ClosedLost => "Closed Lost",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Status {
    type Err = Issue;

    /// Exact, case-sensitive match on the label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.label() == s)
            .ok_or_else(|| Issue::InvalidStatus(s.to_string()))
    }
}

/// A contact person attached to an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contact {
    name: String,
    email: Option<String>,
    phone: Option<String>,
}

impl Contact {
    /// Create a contact. The name must be non-blank; an email, when given, must contain `@`.
    pub fn new(
        name: impl Into<String>,
        email: Option<String>,
        phone: Option<String>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let mut issues = Vec::new();
        if name.trim().is_empty() {
            issues.push(Issue::Empty {
                field: "contact name",
            });
        }
        if let Some(email) = email.as_deref() {
            if !email.contains('@') {
                issues.push(Issue::InvalidEmail(email.to_string()));
            }
        }
        ValidationError::check(issues)?;
        Ok(Self { name, email, phone })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }
}

/// One validated funnel opportunity.
///
/// Build one with [`Entry::builder`]; the builder runs every field-level check and then the
/// cross-field date check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    id: Option<String>,
    company_name: String,
    project_name: String,
    value: f64,
    probability: Option<f64>,
    status: Option<Status>,
    start_date: Option<NaiveDateTime>,
    expected_close_date: Option<NaiveDateTime>,
    contacts: Vec<Contact>,
    notes: Option<String>,
    last_updated: Option<NaiveDateTime>,
    custom_fields: CustomFields,
}

impl Entry {
    /// Start building an entry from its required fields.
    pub fn builder(
        company_name: impl Into<String>,
        project_name: impl Into<String>,
        value: f64,
    ) -> EntryBuilder {
        EntryBuilder {
            candidate: Entry {
                id: None,
                company_name: company_name.into(),
                project_name: project_name.into(),
                value,
                probability: None,
                status: None,
                start_date: None,
                expected_close_date: None,
                contacts: Vec::new(),
                notes: None,
                last_updated: None,
                custom_fields: CustomFields::new(),
            },
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Deal value. Any sign is accepted.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Probability in percent, `0..=100`.
    pub fn probability(&self) -> Option<f64> {
        self.probability
    }

    pub fn status(&self) -> Option<Status> {
        self.status
    }

    pub fn start_date(&self) -> Option<NaiveDateTime> {
        self.start_date
    }

    pub fn expected_close_date(&self) -> Option<NaiveDateTime> {
        self.expected_close_date
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn last_updated(&self) -> Option<NaiveDateTime> {
        self.last_updated
    }

    pub fn custom_fields(&self) -> &CustomFields {
        &self.custom_fields
    }

    /// Look up one custom field.
    pub fn custom_field(&self, name: &str) -> Option<&Value> {
        self.custom_fields.get(name)
    }
}

type FieldCheck = fn(&Entry, &mut Vec<Issue>);

/// Field-level checks; every failing check contributes an issue.
const FIELD_CHECKS: &[FieldCheck] = &[
    check_company_name,
    check_project_name,
    check_value,
    check_probability,
];

/// Cross-field checks; run only once all field-level checks pass.
const CROSS_FIELD_CHECKS: &[FieldCheck] = &[check_date_order];

/// Two-phase constructor for [`Entry`]: collect a candidate, then run the ordered checks.
#[derive(Debug, Clone)]
pub struct EntryBuilder {
    candidate: Entry,
}

impl EntryBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.candidate.id = Some(id.into());
        self
    }

    pub fn probability(mut self, probability: f64) -> Self {
        self.candidate.probability = Some(probability);
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.candidate.status = Some(status);
        self
    }

    pub fn start_date(mut self, date: NaiveDateTime) -> Self {
        self.candidate.start_date = Some(date);
        self
    }

    pub fn expected_close_date(mut self, date: NaiveDateTime) -> Self {
        self.candidate.expected_close_date = Some(date);
        self
    }

    pub fn contact(mut self, contact: Contact) -> Self {
        self.candidate.contacts.push(contact);
        self
    }

    pub fn contacts(mut self, contacts: impl IntoIterator<Item = Contact>) -> Self {
        self.candidate.contacts.extend(contacts);
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.candidate.notes = Some(notes.into());
        self
    }

    pub fn last_updated(mut self, at: NaiveDateTime) -> Self {
        self.candidate.last_updated = Some(at);
        self
    }

    /// Set one custom field; a later value for the same name replaces the earlier one.
    pub fn custom_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.candidate.custom_fields.insert(name.into(), value.into());
        self
    }

    /// Run all checks and return the entry, or every issue found.
    pub fn build(self) -> Result<Entry, ValidationError> {
        let candidate = self.candidate;

        let mut issues = Vec::new();
        for check in FIELD_CHECKS {
            check(&candidate, &mut issues);
        }
        ValidationError::check(issues)?;

        let mut issues = Vec::new();
        for check in CROSS_FIELD_CHECKS {
            check(&candidate, &mut issues);
        }
        ValidationError::check(issues)?;

        Ok(candidate)
    }
}

fn check_company_name(entry: &Entry, issues: &mut Vec<Issue>) {
    if entry.company_name.trim().is_empty() {
        issues.push(Issue::Empty {
            field: "company_name",
        });
    }
}

fn check_project_name(entry: &Entry, issues: &mut Vec<Issue>) {
    if entry.project_name.trim().is_empty() {
        issues.push(Issue::Empty {
            field: "project_name",
        });
    }
}

fn check_value(entry: &Entry, issues: &mut Vec<Issue>) {
    if !entry.value.is_finite() {
        issues.push(Issue::InvalidType {
            field: "value",
            expected: "finite number",
            raw: entry.value.to_string(),
        });
    }
}

fn check_probability(entry: &Entry, issues: &mut Vec<Issue>) {
    if let Some(p) = entry.probability {
        if !(0.0..=100.0).contains(&p) {
            issues.push(Issue::ProbabilityOutOfRange(p));
        }
    }
}

fn check_date_order(entry: &Entry, issues: &mut Vec<Issue>) {
    if let (Some(start), Some(close)) = (entry.start_date, entry.expected_close_date) {
        if start > close {
            issues.push(Issue::DatesOutOfOrder {
                start: start.to_string(),
                close: close.to_string(),
            });
        }
    }
}
