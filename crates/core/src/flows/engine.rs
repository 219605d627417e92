use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::cpq::catalog::Catalog;
use crate::cpq::validation::{validate_step, FieldViolation};
use crate::domain::draft::QuoteDraft;
use crate::flows::states::{FlowAction, TransitionOutcome, WizardEvent, WizardStep};

pub trait FlowDefinition {
    fn initial_step(&self) -> WizardStep;
    fn transition(
        &self,
        current: WizardStep,
        event: WizardEvent,
        draft: &QuoteDraft,
        catalog: &Catalog,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

#[derive(Clone, Debug, Default)]
pub struct InstantQuoteFlow;

impl FlowDefinition for InstantQuoteFlow {
    fn initial_step(&self) -> WizardStep {
        WizardStep::ServiceSelect
    }

    fn transition(
        &self,
        current: WizardStep,
        event: WizardEvent,
        draft: &QuoteDraft,
        catalog: &Catalog,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_instant_quote(current, event, draft, catalog)
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_step(&self) -> WizardStep {
        self.flow.initial_step()
    }

    pub fn apply(
        &self,
        current: WizardStep,
        event: WizardEvent,
        draft: &QuoteDraft,
        catalog: &Catalog,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event, draft, catalog)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: WizardStep,
        event: WizardEvent,
        draft: &QuoteDraft,
        catalog: &Catalog,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event, draft, catalog);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        audit.session_id.clone(),
                        audit.correlation_id.clone(),
                        "flow.transition_applied",
                        AuditCategory::Flow,
                        audit.actor.clone(),
                        AuditOutcome::Success,
                    )
                    .with_metadata("from", outcome.from.as_str())
                    .with_metadata("to", outcome.to.as_str())
                    .with_metadata("event", format!("{:?}", outcome.event)),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit.session_id.clone(),
                        audit.correlation_id.clone(),
                        "flow.transition_rejected",
                        AuditCategory::Flow,
                        audit.actor.clone(),
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("step", current.as_str())
                    .with_metadata("event", format!("{event:?}"))
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

impl Default for FlowEngine<InstantQuoteFlow> {
    fn default() -> Self {
        Self::new(InstantQuoteFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("cannot leave {step}: {}", summarize(.violations))]
    Blocked { step: WizardStep, violations: Vec<FieldViolation> },
    #[error("invalid transition from {step} using event {event:?}")]
    InvalidTransition { step: WizardStep, event: WizardEvent },
}

impl FlowTransitionError {
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Self::Blocked { violations, .. } => violations,
            Self::InvalidTransition { .. } => &[],
        }
    }
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Forward target of `current`, ignoring validation. The infra branch is
/// decided from the draft as it is now.
pub fn next_step(current: WizardStep, draft: &QuoteDraft, catalog: &Catalog) -> Option<WizardStep> {
    match current {
        WizardStep::ServiceSelect => Some(WizardStep::TechnologySelect),
        WizardStep::TechnologySelect => Some(WizardStep::ScopeSelect),
        WizardStep::ScopeSelect if includes_infra_step(draft, catalog) => {
            Some(WizardStep::InfraSelect)
        }
        WizardStep::ScopeSelect | WizardStep::InfraSelect => Some(WizardStep::ContactCapture),
        WizardStep::ContactCapture => Some(WizardStep::Submitted),
        WizardStep::Submitted => None,
    }
}

pub fn previous_step(
    current: WizardStep,
    draft: &QuoteDraft,
    catalog: &Catalog,
) -> Option<WizardStep> {
    match current {
        WizardStep::ServiceSelect | WizardStep::Submitted => None,
        WizardStep::TechnologySelect => Some(WizardStep::ServiceSelect),
        WizardStep::ScopeSelect => Some(WizardStep::TechnologySelect),
        WizardStep::InfraSelect => Some(WizardStep::ScopeSelect),
        WizardStep::ContactCapture if includes_infra_step(draft, catalog) => {
            Some(WizardStep::InfraSelect)
        }
        WizardStep::ContactCapture => Some(WizardStep::ScopeSelect),
    }
}

pub fn includes_infra_step(draft: &QuoteDraft, catalog: &Catalog) -> bool {
    draft.service.as_ref().map(|id| catalog.requires_infra(id)).unwrap_or(false)
}

fn transition_instant_quote(
    current: WizardStep,
    event: WizardEvent,
    draft: &QuoteDraft,
    catalog: &Catalog,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use FlowAction::{CloseWizard, EmitSubmission, RevealContact};
    use WizardEvent::{Back, Next, Submit};
    use WizardStep::{ContactCapture, Submitted};

    let invalid = || FlowTransitionError::InvalidTransition { step: current, event };

    let (to, actions) = match (current, event) {
        (Submitted, _) | (ContactCapture, Next) => return Err(invalid()),
        (ContactCapture, Submit) => {
            ensure_step_valid(current, draft, catalog)?;
            (Submitted, vec![EmitSubmission, CloseWizard])
        }
        (_, Submit) => return Err(invalid()),
        (_, Next) => {
            ensure_step_valid(current, draft, catalog)?;
            let to = next_step(current, draft, catalog).ok_or_else(invalid)?;
            let actions = if to == ContactCapture { vec![RevealContact] } else { Vec::new() };
            (to, actions)
        }
        (_, Back) => (previous_step(current, draft, catalog).ok_or_else(invalid)?, Vec::new()),
    };

    Ok(TransitionOutcome { from: current, to, event, actions })
}

fn ensure_step_valid(
    step: WizardStep,
    draft: &QuoteDraft,
    catalog: &Catalog,
) -> Result<(), FlowTransitionError> {
    let result = validate_step(step, draft, catalog);
    if result.valid {
        Ok(())
    } else {
        Err(FlowTransitionError::Blocked { step, violations: result.violations })
    }
}
