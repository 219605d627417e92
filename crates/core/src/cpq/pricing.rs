use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cpq::catalog::Catalog;
use crate::domain::draft::{QuoteDraft, Scope};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeMultiplierTable([Decimal; Scope::BUCKETS]);

impl ScopeMultiplierTable {
    pub fn new(multipliers: [Decimal; Scope::BUCKETS]) -> Self {
        Self(multipliers)
    }

    pub fn multiplier(&self, scope: Scope) -> Decimal {
        self.0[scope.index()]
    }
}

impl Default for ScopeMultiplierTable {
    fn default() -> Self {
        Self([
            Decimal::ONE,
            Decimal::new(15, 1),
            Decimal::TWO,
            Decimal::from(3),
            Decimal::from(4),
            Decimal::from(5),
        ])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingStage {
    BasePrice,
    Technologies,
    ScopeMultiplier,
    Infrastructure,
    Rounding,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: PricingStage,
    pub detail: String,
    /// Running total after this stage.
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    pub raw_total: Decimal,
    pub total: Decimal,
    pub trace: Vec<PricingTraceStep>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("price overflowed at the {stage:?} stage")]
    Overflow { stage: PricingStage },
}

/// `Ok(None)` means there is nothing to price yet: no service is selected.
pub trait PricingEngine: Send + Sync {
    fn price(
        &self,
        draft: &QuoteDraft,
        catalog: &Catalog,
    ) -> Result<Option<PricingResult>, PricingError>;

    fn estimate(
        &self,
        draft: &QuoteDraft,
        catalog: &Catalog,
    ) -> Result<Option<Decimal>, PricingError> {
        Ok(self.price(draft, catalog)?.map(|result| result.total))
    }
}

#[derive(Clone, Debug, Default)]
pub struct DeterministicPricingEngine {
    multipliers: ScopeMultiplierTable,
}

impl DeterministicPricingEngine {
    pub fn new(multipliers: ScopeMultiplierTable) -> Self {
        Self { multipliers }
    }
}

impl PricingEngine for DeterministicPricingEngine {
    fn price(
        &self,
        draft: &QuoteDraft,
        catalog: &Catalog,
    ) -> Result<Option<PricingResult>, PricingError> {
        price_draft_with_trace(draft, catalog, &self.multipliers)
    }
}

pub fn rounding_increment() -> Decimal {
    Decimal::from(500)
}

/// Nearest multiple of 500, ties rounding up.
pub fn round_to_increment(raw: Decimal) -> Result<Decimal, PricingError> {
    let increment = rounding_increment();
    let overflow = PricingError::Overflow { stage: PricingStage::Rounding };
    let buckets = (raw / increment).checked_add(Decimal::new(5, 1)).ok_or(overflow.clone())?;
    let rounded = buckets.floor().checked_mul(increment).ok_or(overflow)?;
    Ok(rounded.normalize())
}

pub fn estimate(draft: &QuoteDraft, catalog: &Catalog) -> Result<Option<Decimal>, PricingError> {
    let priced = price_draft_with_trace(draft, catalog, &ScopeMultiplierTable::default())?;
    Ok(priced.map(|result| result.total))
}

pub fn price_draft_with_trace(
    draft: &QuoteDraft,
    catalog: &Catalog,
    multipliers: &ScopeMultiplierTable,
) -> Result<Option<PricingResult>, PricingError> {
    let Some(service_id) = draft.service.as_ref() else {
        return Ok(None);
    };
    let mut trace = Vec::with_capacity(5);

    let base = catalog.find_service(service_id).map(|entry| entry.base_price).unwrap_or_default();
    let mut total = base;
    trace.push(PricingTraceStep {
        stage: PricingStage::BasePrice,
        detail: format!("base price of `{service_id}`"),
        amount: total,
    });

    let technologies = draft
        .technologies
        .iter()
        .filter_map(|id| catalog.find_technology(id))
        .try_fold(Decimal::ZERO, |sum, entry| sum.checked_add(entry.add_price))
        .ok_or(PricingError::Overflow { stage: PricingStage::Technologies })?;
    total = total
        .checked_add(technologies)
        .ok_or(PricingError::Overflow { stage: PricingStage::Technologies })?;
    trace.push(PricingTraceStep {
        stage: PricingStage::Technologies,
        detail: format!(
            "+{technologies} for {} selected technologies",
            draft.technologies.len()
        ),
        amount: total,
    });

    let multiplier = multipliers.multiplier(draft.scope);
    total = total
        .checked_mul(multiplier)
        .ok_or(PricingError::Overflow { stage: PricingStage::ScopeMultiplier })?;
    trace.push(PricingTraceStep {
        stage: PricingStage::ScopeMultiplier,
        detail: format!("x{} for scope bucket {}", multiplier.normalize(), draft.scope.get()),
        amount: total,
    });

    let infra = draft
        .infra
        .as_ref()
        .filter(|_| catalog.requires_infra(service_id))
        .and_then(|id| catalog.find_infra_tier(id));
    if let Some(tier) = infra {
        total = total
            .checked_add(tier.add_price)
            .ok_or(PricingError::Overflow { stage: PricingStage::Infrastructure })?;
        trace.push(PricingTraceStep {
            stage: PricingStage::Infrastructure,
            detail: format!("+{} for infra tier `{}`", tier.add_price, tier.id),
            amount: total,
        });
    }

    let raw_total = total.normalize();
    let rounded = round_to_increment(raw_total)?;
    trace.push(PricingTraceStep {
        stage: PricingStage::Rounding,
        detail: format!("round {raw_total} to nearest {}", rounding_increment()),
        amount: rounded,
    });

    Ok(Some(PricingResult { raw_total, total: rounded, trace }))
}
