pub mod audit;
pub mod config;
pub mod cpq;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod submission;
pub mod wizard;

pub use audit::{AuditContext, AuditEvent, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use cpq::{
    estimate, Catalog, CatalogError, DeterministicPricingEngine, DraftField, FieldViolation,
    PricingEngine, PricingError, PricingResult, PricingStage, PricingTraceStep,
    ScopeMultiplierTable, ValidationResult, ViolationKind,
};
pub use domain::draft::{QuoteDraft, Scope, ScopeOutOfRange};
pub use domain::offering::{
    InfraTierEntry, InfraTierId, ServiceEntry, ServiceId, TechnologyEntry, TechnologyId,
};
pub use domain::submission::{QuoteSubmission, SessionId, SubmissionId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{FlowEngine, FlowTransitionError, WizardEvent, WizardStep};
pub use submission::{
    InMemorySubmissionSink, JsonLineSubmissionSink, SubmissionSink, TracingSubmissionSink,
};
pub use wizard::{QuoteWizard, WizardState};
