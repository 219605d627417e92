use quickquote_core::config::{AppConfig, LoadOptions, SinkKind};
use quickquote_core::{Catalog, DeterministicPricingEngine, PricingEngine, QuoteDraft, Scope};
use rust_decimal::Decimal;
use serde::Serialize;

use super::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(options: &LoadOptions, json_output: bool) -> CommandResult {
    let report = build_report(options);
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                concat!(
                    "{{\"overall_status\":\"fail\",",
                    "\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}"
                ),
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(options: &LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options.clone()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            match config.load_catalog() {
                Ok(catalog) => {
                    checks.push(DoctorCheck {
                        name: "catalog_load",
                        status: CheckStatus::Pass,
                        details: describe_catalog(&config, &catalog),
                    });
                    checks.push(check_pricing(&catalog));
                }
                Err(error) => {
                    checks.push(DoctorCheck {
                        name: "catalog_load",
                        status: CheckStatus::Fail,
                        details: error.to_string(),
                    });
                    checks.push(skipped("pricing_smoke", "catalog did not load"));
                }
            }
            checks.push(check_submission_sink(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("catalog_load", "configuration did not load"));
            checks.push(skipped("pricing_smoke", "configuration did not load"));
            checks.push(skipped("submission_sink", "configuration did not load"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn skipped(name: &'static str, reason: &str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: format!("skipped because {reason}"),
    }
}

fn describe_catalog(config: &AppConfig, catalog: &Catalog) -> String {
    let source = config
        .catalog
        .path
        .as_ref()
        .map(|path| format!("`{}`", path.display()))
        .unwrap_or_else(|| "built-in reference".to_string());
    format!(
        "{} services, {} technologies, {} infra tiers from {source}",
        catalog.services().len(),
        catalog.technologies().len(),
        catalog.infra_tiers().len()
    )
}

/// Every service must price above zero with the cheapest selection and must
/// not overflow with the most expensive one, at every scope bucket.
fn check_pricing(catalog: &Catalog) -> DoctorCheck {
    let engine = DeterministicPricingEngine::default();
    let cheapest_tier = catalog.infra_tiers().iter().min_by_key(|tier| tier.add_price);
    let priciest_tier = catalog.infra_tiers().iter().max_by_key(|tier| tier.add_price);
    let mut problems = Vec::new();

    for entry in catalog.services() {
        for value in Scope::MIN..=Scope::MAX {
            let Ok(scope) = Scope::new(value) else { continue };
            let mut cheapest =
                QuoteDraft::default().with_service(entry.id.clone()).with_scope(scope);
            let mut priciest = cheapest
                .clone()
                .with_technologies(catalog.technologies().iter().map(|tech| tech.id.clone()));
            if entry.requires_infra {
                if let Some(tier) = cheapest_tier {
                    cheapest = cheapest.with_infra(tier.id.clone());
                }
                if let Some(tier) = priciest_tier {
                    priciest = priciest.with_infra(tier.id.clone());
                }
            }

            match engine.estimate(&cheapest, catalog) {
                Ok(Some(total)) if total > Decimal::ZERO => {}
                Ok(Some(total)) => {
                    problems.push(format!("`{}` prices to {total} at scope {value}", entry.id));
                }
                Ok(None) => problems.push(format!("`{}` has no estimate", entry.id)),
                Err(error) => problems.push(format!("`{}`: {error}", entry.id)),
            }
            if let Err(error) = engine.estimate(&priciest, catalog) {
                problems.push(format!("`{}` with every option: {error}", entry.id));
            }
        }
    }

    if problems.is_empty() {
        DoctorCheck {
            name: "pricing_smoke",
            status: CheckStatus::Pass,
            details: format!(
                "priced {} services at every scope with cheapest and full selections",
                catalog.services().len()
            ),
        }
    } else {
        problems.dedup();
        DoctorCheck {
            name: "pricing_smoke",
            status: CheckStatus::Fail,
            details: problems.join("; "),
        }
    }
}

fn check_submission_sink(config: &AppConfig) -> DoctorCheck {
    let details = match config.submission.sink {
        SinkKind::Log => "submissions are emitted as structured log events",
        SinkKind::Stdout => "submissions are written to stdout as JSON lines",
    };
    DoctorCheck { name: "submission_sink", status: CheckStatus::Pass, details: details.to_string() }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
