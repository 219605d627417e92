pub mod engine;
pub mod states;

pub use engine::{
    includes_infra_step, next_step, previous_step, FlowDefinition, FlowEngine,
    FlowTransitionError, InstantQuoteFlow,
};
pub use states::{FlowAction, TransitionOutcome, WizardEvent, WizardStep};
