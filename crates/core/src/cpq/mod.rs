pub mod catalog;
pub mod pricing;
pub mod validation;

pub use catalog::{max_entry_price, Catalog, CatalogError};
pub use pricing::{
    estimate, DeterministicPricingEngine, PricingEngine, PricingError, PricingResult,
    PricingStage, PricingTraceStep, ScopeMultiplierTable,
};
pub use validation::{
    validate_step, validate_submission, DraftField, FieldViolation, ValidationResult,
    ViolationKind,
};
