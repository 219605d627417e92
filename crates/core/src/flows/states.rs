use std::fmt;

use serde::{Deserialize, Serialize};

/// Steps of the instant-quote wizard. `InfraSelect` is only reachable for
/// services that require an infrastructure tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    ServiceSelect,
    TechnologySelect,
    ScopeSelect,
    InfraSelect,
    ContactCapture,
    Submitted,
}

impl WizardStep {
    /// 1-based position on the path that includes the infra step.
    pub fn number(self) -> usize {
        match self {
            Self::ServiceSelect => 1,
            Self::TechnologySelect => 2,
            Self::ScopeSelect => 3,
            Self::InfraSelect => 4,
            Self::ContactCapture => 5,
            Self::Submitted => 6,
        }
    }

    /// Position as shown to the user, which shifts when the infra step is skipped.
    pub fn display_number(self, includes_infra: bool) -> usize {
        match self {
            Self::ContactCapture | Self::Submitted if !includes_infra => self.number() - 1,
            _ => self.number(),
        }
    }

    /// Interactive steps on the current path.
    pub fn total(includes_infra: bool) -> usize {
        if includes_infra {
            5
        } else {
            4
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::ServiceSelect => "What do you need?",
            Self::TechnologySelect => "Preferred technologies",
            Self::ScopeSelect => "Project scope",
            Self::InfraSelect => "Infrastructure tier",
            Self::ContactCapture => "Where should we send your quote?",
            Self::Submitted => "Quote requested",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ServiceSelect => "service_select",
            Self::TechnologySelect => "technology_select",
            Self::ScopeSelect => "scope_select",
            Self::InfraSelect => "infra_select",
            Self::ContactCapture => "contact_capture",
            Self::Submitted => "submitted",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Submitted)
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardEvent {
    Next,
    Back,
    Submit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowAction {
    RevealContact,
    EmitSubmission,
    CloseWizard,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: WizardStep,
    pub to: WizardStep,
    pub event: WizardEvent,
    pub actions: Vec<FlowAction>,
}
