use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::draft::Scope;
use crate::domain::offering::{
    InfraTierEntry, InfraTierId, ServiceEntry, ServiceId, TechnologyEntry, TechnologyId,
};

/// Immutable reference data offered by the wizard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    services: Vec<ServiceEntry>,
    #[serde(default)]
    technologies: Vec<TechnologyEntry>,
    #[serde(default)]
    infra_tiers: Vec<InfraTierEntry>,
    scope_labels: Vec<String>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("could not parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("catalog validation failed: {0}")]
    Validation(String),
}

impl Catalog {
    pub fn new(
        services: Vec<ServiceEntry>,
        technologies: Vec<TechnologyEntry>,
        infra_tiers: Vec<InfraTierEntry>,
        scope_labels: Vec<String>,
    ) -> Result<Self, CatalogError> {
        let catalog = Self { services, technologies, infra_tiers, scope_labels };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Catalog published on the consulting site.
    pub fn reference() -> Self {
        let service = |id: &str, label: &str, base_price: i64, requires_infra: bool| ServiceEntry {
            id: ServiceId::new(id),
            label: label.to_owned(),
            base_price: Decimal::from(base_price),
            requires_infra,
        };
        let technology = |id: &str, label: &str, add_price: i64| TechnologyEntry {
            id: TechnologyId::new(id),
            label: label.to_owned(),
            add_price: Decimal::from(add_price),
        };
        let infra = |id: &str, label: &str, add_price: i64| InfraTierEntry {
            id: InfraTierId::new(id),
            label: label.to_owned(),
            add_price: Decimal::from(add_price),
        };

        Self {
            services: vec![
                service("fullstack", "Full-Stack Product Development", 15_000, false),
                service("frontend", "Frontend & Web Apps", 8_000, false),
                service("backend", "Backend & API Engineering", 10_000, false),
                service("mobile", "Mobile Applications", 12_000, false),
                service("cloud", "Cloud Architecture & Migration", 5_000, true),
                service("iac", "Infrastructure as Code", 4_500, true),
                service("db", "Database Design & Tuning", 4_000, false),
                service("consulting", "Technical Advisory", 3_000, false),
            ],
            technologies: vec![
                technology("react", "React", 5_000),
                technology("nextjs", "Next.js", 4_000),
                technology("vue", "Vue", 4_000),
                technology("node", "Node.js", 3_500),
                technology("python", "Python", 3_500),
                technology("rust", "Rust", 6_000),
                technology("ios", "iOS (Swift)", 8_000),
                technology("android", "Android (Kotlin)", 7_000),
                technology("aws", "AWS", 3_000),
                technology("gcp", "Google Cloud", 3_000),
                technology("azure", "Azure", 3_000),
                technology("terraform", "Terraform", 2_500),
                technology("kubernetes", "Kubernetes", 4_000),
                technology("postgres", "PostgreSQL", 2_000),
            ],
            infra_tiers: vec![
                infra("starter", "Starter (single region)", 2_000),
                infra("mid", "Growth (multi-AZ, autoscaling)", 5_000),
                infra("enterprise", "Enterprise (multi-region, compliance)", 12_000),
            ],
            scope_labels: [
                "1-2 weeks",
                "2-4 weeks",
                "1-2 months",
                "2-3 months",
                "3-6 months",
                "6+ months",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let catalog = toml::from_str::<Self>(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
        let catalog = toml::from_str::<Self>(&raw)
            .map_err(|source| CatalogError::ParseFile { path: path.to_path_buf(), source })?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn services(&self) -> &[ServiceEntry] {
        &self.services
    }

    pub fn technologies(&self) -> &[TechnologyEntry] {
        &self.technologies
    }

    pub fn infra_tiers(&self) -> &[InfraTierEntry] {
        &self.infra_tiers
    }

    pub fn scope_labels(&self) -> &[String] {
        &self.scope_labels
    }

    pub fn find_service(&self, id: &ServiceId) -> Option<&ServiceEntry> {
        self.services.iter().find(|entry| &entry.id == id)
    }

    pub fn find_technology(&self, id: &TechnologyId) -> Option<&TechnologyEntry> {
        self.technologies.iter().find(|entry| &entry.id == id)
    }

    pub fn find_infra_tier(&self, id: &InfraTierId) -> Option<&InfraTierEntry> {
        self.infra_tiers.iter().find(|entry| &entry.id == id)
    }

    pub fn scope_label(&self, scope: Scope) -> Option<&str> {
        self.scope_labels.get(scope.index()).map(String::as_str)
    }

    /// Whether the service belongs to the subset routed through infra selection.
    /// Unknown services never require it.
    pub fn requires_infra(&self, id: &ServiceId) -> bool {
        self.find_service(id).map(|entry| entry.requires_infra).unwrap_or(false)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.services.is_empty() {
            return Err(CatalogError::Validation(
                "catalog must offer at least one service".to_string(),
            ));
        }

        ensure_unique("services", self.services.iter().map(|entry| entry.id.as_str()))?;
        ensure_unique("technologies", self.technologies.iter().map(|entry| entry.id.as_str()))?;
        ensure_unique("infra_tiers", self.infra_tiers.iter().map(|entry| entry.id.as_str()))?;

        let prices = self
            .services
            .iter()
            .map(|entry| (entry.id.as_str(), entry.base_price))
            .chain(self.technologies.iter().map(|entry| (entry.id.as_str(), entry.add_price)))
            .chain(self.infra_tiers.iter().map(|entry| (entry.id.as_str(), entry.add_price)));
        let ceiling = max_entry_price();
        for (id, price) in prices {
            if price.is_sign_negative() {
                return Err(CatalogError::Validation(format!(
                    "price for `{id}` must not be negative, got {price}"
                )));
            }
            if price > ceiling {
                return Err(CatalogError::Validation(format!(
                    "price for `{id}` must not exceed {ceiling}, got {price}"
                )));
            }
        }

        if self.scope_labels.len() != Scope::BUCKETS {
            return Err(CatalogError::Validation(format!(
                "catalog must define exactly {} scope labels, got {}",
                Scope::BUCKETS,
                self.scope_labels.len()
            )));
        }

        if self.services.iter().any(|entry| entry.requires_infra) && self.infra_tiers.is_empty() {
            return Err(CatalogError::Validation(
                "services require infra selection but no infra_tiers are defined".to_string(),
            ));
        }

        Ok(())
    }
}

/// Upper bound on any single catalog price. Keeps the most expensive draft of
/// any loadable catalog far below `Decimal::MAX`.
pub fn max_entry_price() -> Decimal {
    Decimal::from(1_000_000_000)
}

impl Default for Catalog {
    fn default() -> Self {
        Self::reference()
    }
}

fn ensure_unique<'a>(
    section: &str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for id in ids {
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(CatalogError::Validation(format!("{section} contains an empty id")));
        }
        if !seen.insert(trimmed) {
            return Err(CatalogError::Validation(format!(
                "duplicate id in {section}: {trimmed}"
            )));
        }
    }
    Ok(())
}
