//! Instant-quote wizard session.
//!
//! A `QuoteWizard` is created fresh each time the host opens the wizard and
//! dropped when it closes. Every mutation of a pricing-relevant field
//! recomputes the estimate synchronously from the draft alone, so revisiting
//! steps in any order cannot make the displayed price drift.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::cpq::catalog::Catalog;
use crate::cpq::pricing::{DeterministicPricingEngine, PricingEngine, PricingError, PricingResult};
use crate::cpq::validation::{DraftField, FieldViolation, ViolationKind};
use crate::domain::draft::{QuoteDraft, Scope};
use crate::domain::offering::{InfraTierId, ServiceId, TechnologyId};
use crate::domain::submission::{QuoteSubmission, SessionId};
use crate::errors::DomainError;
use crate::flows::engine::{includes_infra_step, FlowEngine, FlowTransitionError, InstantQuoteFlow};
use crate::flows::states::{FlowAction, TransitionOutcome, WizardEvent, WizardStep};
use crate::submission::SubmissionSink;

const AUDIT_ACTOR: &str = "quote-wizard";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    pub current_step: WizardStep,
    pub draft: QuoteDraft,
    pub contact_revealed: bool,
    pub estimated_price: Option<Decimal>,
}

pub struct QuoteWizard<P = DeterministicPricingEngine> {
    session_id: SessionId,
    catalog: Arc<Catalog>,
    pricing: P,
    flow: FlowEngine<InstantQuoteFlow>,
    audit: Option<Arc<dyn AuditSink>>,
    state: WizardState,
}

impl QuoteWizard<DeterministicPricingEngine> {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_pricing_engine(catalog, DeterministicPricingEngine::default())
    }
}

impl<P> QuoteWizard<P>
where
    P: PricingEngine,
{
    pub fn with_pricing_engine(catalog: Arc<Catalog>, pricing: P) -> Self {
        let flow = FlowEngine::default();
        let state = WizardState {
            current_step: flow.initial_step(),
            draft: QuoteDraft::default(),
            contact_revealed: false,
            estimated_price: None,
        };
        let session_id = SessionId::generate();
        debug!(event_name = "quote.wizard.opened", session_id = %session_id.0, "wizard opened");

        Self { session_id, catalog, pricing, flow, audit: None, state }
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self.emit_audit(
            AuditEvent::new(
                Some(self.session_id.clone()),
                self.session_id.0.clone(),
                "session.opened",
                AuditCategory::System,
                AUDIT_ACTOR,
                AuditOutcome::Success,
            )
            .with_metadata("step", self.state.current_step.as_str()),
        );
        self
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn current_step(&self) -> WizardStep {
        self.state.current_step
    }

    pub fn draft(&self) -> &QuoteDraft {
        &self.state.draft
    }

    pub fn estimated_price(&self) -> Option<Decimal> {
        self.state.estimated_price
    }

    pub fn contact_revealed(&self) -> bool {
        self.state.contact_revealed
    }

    pub fn is_closed(&self) -> bool {
        self.state.current_step.is_terminal()
    }

    pub fn includes_infra_step(&self) -> bool {
        includes_infra_step(&self.state.draft, &self.catalog)
    }

    /// `(step number, total steps)` for the path the current draft takes.
    pub fn progress(&self) -> (usize, usize) {
        let includes_infra = self.includes_infra_step();
        (
            self.state.current_step.display_number(includes_infra),
            WizardStep::total(includes_infra),
        )
    }

    pub fn pricing_breakdown(&self) -> Result<Option<PricingResult>, PricingError> {
        self.pricing.price(&self.state.draft, &self.catalog)
    }

    pub fn select_service(&mut self, id: impl Into<ServiceId>) -> Result<(), DomainError> {
        self.ensure_open()?;
        let id = id.into();
        if self.catalog.find_service(&id).is_none() {
            return Err(unknown_option(DraftField::Service, format!("Unknown service `{id}`")));
        }
        self.state.draft.service = Some(id);
        self.recompute_estimate();
        Ok(())
    }

    /// Flips membership of `id` and reports whether it is now selected.
    pub fn toggle_technology(&mut self, id: impl Into<TechnologyId>) -> Result<bool, DomainError> {
        self.ensure_open()?;
        let id = id.into();
        if self.catalog.find_technology(&id).is_none() {
            return Err(unknown_option(
                DraftField::Technologies,
                format!("Unknown technology `{id}`"),
            ));
        }
        let technologies = &mut self.state.draft.technologies;
        let selected = if technologies.remove(&id) {
            false
        } else {
            technologies.insert(id);
            true
        };
        self.recompute_estimate();
        Ok(selected)
    }

    pub fn set_scope(&mut self, scope: Scope) -> Result<(), DomainError> {
        self.ensure_open()?;
        self.state.draft.scope = scope;
        self.recompute_estimate();
        Ok(())
    }

    pub fn select_infra(&mut self, id: impl Into<InfraTierId>) -> Result<(), DomainError> {
        self.ensure_open()?;
        let id = id.into();
        if self.catalog.find_infra_tier(&id).is_none() {
            return Err(unknown_option(
                DraftField::Infra,
                format!("Unknown infrastructure tier `{id}`"),
            ));
        }
        self.state.draft.infra = Some(id);
        self.recompute_estimate();
        Ok(())
    }

    pub fn clear_infra(&mut self) -> Result<(), DomainError> {
        self.ensure_open()?;
        self.state.draft.infra = None;
        self.recompute_estimate();
        Ok(())
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), DomainError> {
        self.ensure_open()?;
        self.state.draft.name = name.into();
        Ok(())
    }

    pub fn set_email(&mut self, email: impl Into<String>) -> Result<(), DomainError> {
        self.ensure_open()?;
        self.state.draft.email = email.into();
        Ok(())
    }

    pub fn set_company(&mut self, company: impl Into<String>) -> Result<(), DomainError> {
        self.ensure_open()?;
        self.state.draft.company = company.into();
        Ok(())
    }

    pub fn next(&mut self) -> Result<TransitionOutcome, DomainError> {
        self.apply(WizardEvent::Next)
    }

    pub fn back(&mut self) -> Result<TransitionOutcome, DomainError> {
        self.apply(WizardEvent::Back)
    }

    /// Validates the contact stage and, when it passes, hands exactly one
    /// payload to `sink`. On failure the wizard stays on the contact step.
    pub fn submit<S>(&mut self, sink: &S) -> Result<QuoteSubmission, DomainError>
    where
        S: SubmissionSink + ?Sized,
    {
        self.ensure_open()?;
        let estimated_price = self.state.estimated_price;

        let outcome = self.apply(WizardEvent::Submit)?;
        if !outcome.actions.contains(&FlowAction::EmitSubmission) {
            return Err(DomainError::InvariantViolation(
                "submit transition did not request emission".to_owned(),
            ));
        }
        let Some(estimated_price) = estimated_price else {
            return Err(DomainError::InvariantViolation(
                "submission reached without an estimate".to_owned(),
            ));
        };

        let submission =
            QuoteSubmission::new(self.session_id.clone(), self.submission_draft(), estimated_price);
        sink.deliver(submission.clone());

        info!(
            event_name = "quote.wizard.submitted",
            session_id = %self.session_id.0,
            submission_id = %submission.submission_id.0,
            estimated_price = %estimated_price,
            "quote request handed to submission sink"
        );
        self.emit_audit(
            AuditEvent::new(
                Some(self.session_id.clone()),
                self.session_id.0.clone(),
                "submission.delivered",
                AuditCategory::Submission,
                AUDIT_ACTOR,
                AuditOutcome::Success,
            )
            .with_metadata("submission_id", submission.submission_id.0.clone())
            .with_metadata("estimated_price", estimated_price.to_string()),
        );

        Ok(submission)
    }

    fn apply(&mut self, event: WizardEvent) -> Result<TransitionOutcome, DomainError> {
        self.ensure_open()?;
        let current = self.state.current_step;
        let result = match &self.audit {
            Some(sink) => self.flow.apply_with_audit(
                current,
                event,
                &self.state.draft,
                &self.catalog,
                sink.as_ref(),
                &self.audit_context(),
            ),
            None => self.flow.apply(current, event, &self.state.draft, &self.catalog),
        };

        match result {
            Ok(outcome) => {
                self.state.current_step = outcome.to;
                if outcome.actions.contains(&FlowAction::RevealContact) {
                    self.state.contact_revealed = true;
                }
                debug!(
                    event_name = "quote.wizard.step_changed",
                    session_id = %self.session_id.0,
                    from = %outcome.from,
                    to = %outcome.to,
                    "wizard step changed"
                );
                Ok(outcome)
            }
            Err(error) => {
                debug!(
                    event_name = "quote.wizard.transition_rejected",
                    session_id = %self.session_id.0,
                    step = %current,
                    error = %error,
                    "wizard transition rejected"
                );
                if let FlowTransitionError::Blocked { step, violations } = &error {
                    let fields = violations
                        .iter()
                        .map(|violation| violation.field.as_str())
                        .collect::<Vec<_>>()
                        .join(",");
                    let event_type = if event == WizardEvent::Submit {
                        "submission.blocked"
                    } else {
                        "validation.blocked"
                    };
                    self.emit_audit(
                        AuditEvent::new(
                            Some(self.session_id.clone()),
                            self.session_id.0.clone(),
                            event_type,
                            AuditCategory::Validation,
                            AUDIT_ACTOR,
                            AuditOutcome::Rejected,
                        )
                        .with_metadata("step", step.as_str())
                        .with_metadata("fields", fields),
                    );
                }
                Err(error.into())
            }
        }
    }

    fn recompute_estimate(&mut self) {
        let estimate = match self.pricing.estimate(&self.state.draft, &self.catalog) {
            Ok(estimate) => estimate,
            Err(error) => {
                warn!(
                    event_name = "quote.wizard.pricing_failed",
                    session_id = %self.session_id.0,
                    error = %error,
                    "estimate could not be computed; clearing it"
                );
                self.emit_audit(
                    AuditEvent::new(
                        Some(self.session_id.clone()),
                        self.session_id.0.clone(),
                        "pricing.estimate_failed",
                        AuditCategory::Pricing,
                        AUDIT_ACTOR,
                        AuditOutcome::Failed,
                    )
                    .with_metadata("error", error.to_string()),
                );
                None
            }
        };
        if estimate == self.state.estimated_price {
            return;
        }
        self.state.estimated_price = estimate;
        debug!(
            event_name = "quote.wizard.estimate_recomputed",
            session_id = %self.session_id.0,
            estimated_price = ?estimate,
            "estimate recomputed"
        );
        self.emit_audit(
            AuditEvent::new(
                Some(self.session_id.clone()),
                self.session_id.0.clone(),
                "pricing.estimate_recomputed",
                AuditCategory::Pricing,
                AUDIT_ACTOR,
                AuditOutcome::Success,
            )
            .with_metadata(
                "estimated_price",
                estimate.map(|price| price.to_string()).unwrap_or_else(|| "none".to_owned()),
            ),
        );
    }

    /// Payload copy of the draft: trimmed contact fields, and no infra tier for
    /// services that never route through the infra step.
    fn submission_draft(&self) -> QuoteDraft {
        let mut draft = self.state.draft.clone();
        if !includes_infra_step(&draft, &self.catalog) {
            draft.infra = None;
        }
        draft.name = draft.name.trim().to_owned();
        draft.email = draft.email.trim().to_owned();
        draft.company = draft.company.trim().to_owned();
        draft
    }

    fn ensure_open(&self) -> Result<(), DomainError> {
        if self.is_closed() {
            return Err(DomainError::WizardClosed);
        }
        Ok(())
    }

    fn audit_context(&self) -> AuditContext {
        AuditContext::new(Some(self.session_id.clone()), self.session_id.0.clone(), AUDIT_ACTOR)
    }

    fn emit_audit(&self, event: AuditEvent) {
        if let Some(sink) = &self.audit {
            sink.emit(event);
        }
    }
}

fn unknown_option(field: DraftField, message: String) -> DomainError {
    DomainError::Validation(FieldViolation::new(field, ViolationKind::UnknownOption, message))
}
