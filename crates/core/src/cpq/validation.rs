use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cpq::catalog::Catalog;
use crate::domain::draft::QuoteDraft;
use crate::flows::states::WizardStep;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftField {
    Service,
    Technologies,
    Scope,
    Infra,
    Name,
    Email,
    Company,
}

impl DraftField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Technologies => "technologies",
            Self::Scope => "scope",
            Self::Infra => "infra",
            Self::Name => "name",
            Self::Email => "email",
            Self::Company => "company",
        }
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    MissingSelection,
    InvalidFormat,
    EmptyRequired,
    UnknownOption,
}

#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{field}: {message}")]
pub struct FieldViolation {
    pub field: DraftField,
    pub kind: ViolationKind,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: DraftField, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self { field, kind, message: message.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<FieldViolation>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self { valid: true, violations: Vec::new() }
    }
}

impl ValidationResult {
    pub fn violation_for(&self, field: DraftField) -> Option<&FieldViolation> {
        self.violations.iter().find(|violation| violation.field == field)
    }
}

const SUBMISSION_FIELDS: &[DraftField] = &[
    DraftField::Service,
    DraftField::Technologies,
    DraftField::Scope,
    DraftField::Infra,
    DraftField::Name,
    DraftField::Email,
    DraftField::Company,
];

/// Fields that must pass before leaving `step`. Contact fields are only
/// checked at the contact stage.
pub fn gated_fields(step: WizardStep) -> &'static [DraftField] {
    match step {
        WizardStep::ServiceSelect => &[DraftField::Service],
        WizardStep::TechnologySelect => &[DraftField::Technologies],
        WizardStep::ScopeSelect => &[DraftField::Scope],
        WizardStep::InfraSelect => &[DraftField::Infra],
        WizardStep::ContactCapture => SUBMISSION_FIELDS,
        WizardStep::Submitted => &[],
    }
}

pub fn validate_step(step: WizardStep, draft: &QuoteDraft, catalog: &Catalog) -> ValidationResult {
    validate_fields(gated_fields(step), draft, catalog)
}

pub fn validate_submission(draft: &QuoteDraft, catalog: &Catalog) -> ValidationResult {
    validate_fields(SUBMISSION_FIELDS, draft, catalog)
}

pub fn validate_fields(
    fields: &[DraftField],
    draft: &QuoteDraft,
    catalog: &Catalog,
) -> ValidationResult {
    let violations: Vec<FieldViolation> =
        fields.iter().filter_map(|field| validate_field(*field, draft, catalog)).collect();
    ValidationResult { valid: violations.is_empty(), violations }
}

pub fn validate_field(
    field: DraftField,
    draft: &QuoteDraft,
    catalog: &Catalog,
) -> Option<FieldViolation> {
    match field {
        DraftField::Service => match &draft.service {
            None => Some(FieldViolation::new(
                field,
                ViolationKind::MissingSelection,
                "Choose a service to continue",
            )),
            Some(id) if catalog.find_service(id).is_none() => Some(FieldViolation::new(
                field,
                ViolationKind::UnknownOption,
                format!("Unknown service `{id}`"),
            )),
            Some(_) => None,
        },
        DraftField::Technologies => {
            let unknown: Vec<&str> = draft
                .technologies
                .iter()
                .filter(|id| catalog.find_technology(id).is_none())
                .map(|id| id.as_str())
                .collect();
            (!unknown.is_empty()).then(|| {
                FieldViolation::new(
                    field,
                    ViolationKind::UnknownOption,
                    format!("Unknown technologies: {}", unknown.join(", ")),
                )
            })
        }
        // `Scope` cannot hold a value outside 1..=6.
        DraftField::Scope => None,
        DraftField::Infra => {
            let required =
                draft.service.as_ref().map(|id| catalog.requires_infra(id)).unwrap_or(false);
            match &draft.infra {
                None if required => Some(FieldViolation::new(
                    field,
                    ViolationKind::MissingSelection,
                    "Choose an infrastructure tier to continue",
                )),
                Some(id) if catalog.find_infra_tier(id).is_none() => Some(FieldViolation::new(
                    field,
                    ViolationKind::UnknownOption,
                    format!("Unknown infrastructure tier `{id}`"),
                )),
                _ => None,
            }
        }
        DraftField::Name => require_text(field, &draft.name, "Please tell us your name"),
        DraftField::Company => require_text(field, &draft.company, "Please tell us your company"),
        DraftField::Email => {
            let email = draft.email.trim();
            if email.is_empty() {
                Some(FieldViolation::new(
                    field,
                    ViolationKind::EmptyRequired,
                    "Please provide an email address",
                ))
            } else if !is_valid_email(email) {
                Some(FieldViolation::new(
                    field,
                    ViolationKind::InvalidFormat,
                    "Please provide a valid email address",
                ))
            } else {
                None
            }
        }
    }
}

pub fn is_valid_email(candidate: &str) -> bool {
    email_pattern().is_match(candidate)
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
    })
}

fn require_text(field: DraftField, value: &str, message: &str) -> Option<FieldViolation> {
    value
        .trim()
        .is_empty()
        .then(|| FieldViolation::new(field, ViolationKind::EmptyRequired, message))
}
