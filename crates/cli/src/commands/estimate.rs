use clap::Args;
use quickquote_core::config::LoadOptions;
use quickquote_core::cpq::validation::validate_fields;
use quickquote_core::{
    ApplicationError, Catalog, DeterministicPricingEngine, DraftField, PricingEngine,
    PricingResult, PricingTraceStep, QuoteDraft, Scope, ViolationKind,
};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{load_runtime, CommandResult};

#[derive(Debug, Clone, Args)]
pub struct EstimateArgs {
    #[arg(long, help = "Service id from the catalog")]
    pub service: String,
    #[arg(long = "tech", help = "Technology id; repeat for several")]
    pub technologies: Vec<String>,
    #[arg(
        long,
        default_value_t = 3,
        value_parser = clap::value_parser!(u8).range(1..=6),
        help = "Scope bucket from 1 (shortest) to 6 (longest)"
    )]
    pub scope: u8,
    #[arg(long, help = "Infrastructure tier id, priced only for services that require one")]
    pub infra: Option<String>,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct EstimateReport {
    service: String,
    technologies: Vec<String>,
    scope: u8,
    scope_label: Option<String>,
    infra: Option<String>,
    infra_applied: bool,
    raw_total: Decimal,
    total: Decimal,
    trace: Vec<PricingTraceStep>,
    notes: Vec<String>,
}

pub fn run(options: &LoadOptions, args: &EstimateArgs) -> CommandResult {
    let (_, catalog) = match load_runtime(options) {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::from_application_error("estimate", error),
    };

    let scope = match Scope::new(args.scope) {
        Ok(scope) => scope,
        Err(error) => return CommandResult::failure("estimate", "validation", error.to_string(), 4),
    };
    let mut draft = QuoteDraft::default()
        .with_service(args.service.as_str())
        .with_technologies(args.technologies.iter().map(String::as_str))
        .with_scope(scope);
    if let Some(infra) = &args.infra {
        draft = draft.with_infra(infra.as_str());
    }

    let checked = validate_fields(
        &[DraftField::Service, DraftField::Technologies, DraftField::Infra],
        &draft,
        &catalog,
    );
    let (unknown, notes): (Vec<_>, Vec<_>) = checked
        .violations
        .into_iter()
        .partition(|violation| violation.kind == ViolationKind::UnknownOption);
    if !unknown.is_empty() {
        let message = unknown.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
        return CommandResult::failure("estimate", "validation", message, 4);
    }

    let priced = match price(&draft, &catalog) {
        Ok(Some(priced)) => priced,
        Ok(None) => {
            return CommandResult::failure(
                "estimate",
                "pricing",
                "no estimate without a selected service",
                5,
            )
        }
        Err(error) => return CommandResult::from_application_error("estimate", error),
    };

    let report = build_report(&draft, &catalog, priced, notes.iter().map(ToString::to_string));
    if args.json {
        return match serde_json::to_string_pretty(&report) {
            Ok(output) => CommandResult::output(output),
            Err(error) => {
                CommandResult::failure("estimate", "serialization", error.to_string(), 6)
            }
        };
    }

    CommandResult::output(render_human(&report))
}

fn price(draft: &QuoteDraft, catalog: &Catalog) -> Result<Option<PricingResult>, ApplicationError> {
    Ok(DeterministicPricingEngine::default().price(draft, catalog)?)
}

fn build_report(
    draft: &QuoteDraft,
    catalog: &Catalog,
    priced: PricingResult,
    notes: impl Iterator<Item = String>,
) -> EstimateReport {
    let infra_applied = draft.infra.is_some()
        && draft.service.as_ref().map(|id| catalog.requires_infra(id)).unwrap_or(false);

    EstimateReport {
        service: draft.service.as_ref().map(ToString::to_string).unwrap_or_default(),
        technologies: draft.technologies.iter().map(ToString::to_string).collect(),
        scope: draft.scope.get(),
        scope_label: catalog.scope_label(draft.scope).map(str::to_owned),
        infra: draft.infra.as_ref().map(ToString::to_string),
        infra_applied,
        raw_total: priced.raw_total,
        total: priced.total,
        trace: priced.trace,
        notes: notes.collect(),
    }
}

fn render_human(report: &EstimateReport) -> String {
    let mut lines = vec![format!("estimate for `{}`: {}", report.service, report.total)];
    for step in &report.trace {
        lines.push(format!("- {:?}: {} -> {}", step.stage, step.detail, step.amount));
    }
    if report.infra.is_some() && !report.infra_applied {
        lines.push("note: infra tier ignored; service does not require one".to_string());
    }
    for note in &report.notes {
        lines.push(format!("note: {note}"));
    }
    lines.join("\n")
}
