use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::offering::{InfraTierId, ServiceId, TechnologyId};

/// Discrete project-duration bucket, always within `1..=6`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Scope(u8);

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("scope must be in range 1..=6, got {value}")]
pub struct ScopeOutOfRange {
    pub value: i64,
}

impl Scope {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 6;
    pub const BUCKETS: usize = Self::MAX as usize;

    pub fn new(value: u8) -> Result<Self, ScopeOutOfRange> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ScopeOutOfRange { value: i64::from(value) })
        }
    }

    /// Pins any integer into the valid bucket range.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(i64::from(Self::MIN), i64::from(Self::MAX)) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based position in per-bucket tables.
    pub fn index(self) -> usize {
        usize::from(self.0 - Self::MIN)
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u8> for Scope {
    type Error = ScopeOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Scope> for u8 {
    fn from(scope: Scope) -> Self {
        scope.0
    }
}

/// Selections accumulated across wizard steps.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteDraft {
    #[serde(default)]
    pub service: Option<ServiceId>,
    #[serde(default)]
    pub technologies: BTreeSet<TechnologyId>,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub infra: Option<InfraTierId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub company: String,
}

impl QuoteDraft {
    pub fn with_service(mut self, service: impl Into<ServiceId>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_technologies<I, T>(mut self, technologies: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TechnologyId>,
    {
        self.technologies = technologies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_infra(mut self, infra: impl Into<InfraTierId>) -> Self {
        self.infra = Some(infra.into());
        self
    }

    pub fn with_contact(
        mut self,
        name: impl Into<String>,
        email: impl Into<String>,
        company: impl Into<String>,
    ) -> Self {
        self.name = name.into();
        self.email = email.into();
        self.company = company.into();
        self
    }
}
