use thiserror::Error;

use crate::config::ConfigError;
use crate::cpq::catalog::CatalogError;
use crate::cpq::pricing::PricingError;
use crate::cpq::validation::FieldViolation;
use crate::flows::FlowTransitionError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    FlowTransition(#[from] FlowTransitionError),
    #[error(transparent)]
    Validation(#[from] FieldViolation),
    #[error("the wizard has already been submitted")]
    WizardClosed,
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

impl DomainError {
    /// Field-level problems a host can render next to inputs.
    pub fn field_violations(&self) -> Vec<FieldViolation> {
        match self {
            Self::FlowTransition(error) => error.violations().to_vec(),
            Self::Validation(violation) => vec![violation.clone()],
            Self::WizardClosed | Self::InvariantViolation(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }
}

impl ApplicationError {
    /// Stable class name for envelopes and logs.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Domain(_) => "validation",
            Self::Catalog(_) => "catalog_load",
            Self::Configuration(_) => "config_validation",
            Self::Pricing(_) => "pricing",
        }
    }

    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(error) => Self::BadRequest {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Catalog(error) => Self::Internal {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Configuration(error) => Self::Internal {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Pricing(error) => Self::Internal {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
        }
    }
}
