use quickquote_core::config::LoadOptions;
use quickquote_core::{Catalog, Scope};

use super::{load_runtime, CommandResult};

pub fn run(options: &LoadOptions, json_output: bool) -> CommandResult {
    let (config, catalog) = match load_runtime(options) {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::from_application_error("catalog", error),
    };

    if json_output {
        return match serde_json::to_string_pretty(&catalog) {
            Ok(output) => CommandResult::output(output),
            Err(error) => {
                CommandResult::failure("catalog", "serialization", error.to_string(), 4)
            }
        };
    }

    let source = config
        .catalog
        .path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "built-in reference".to_string());
    CommandResult::output(render_human(&catalog, &source))
}

pub fn render_human(catalog: &Catalog, source: &str) -> String {
    let mut lines = vec![format!("catalog (source: {source})"), "services:".to_string()];
    for entry in catalog.services() {
        let marker = if entry.requires_infra { " [infra]" } else { "" };
        lines.push(format!("- {} = {} (base {}){marker}", entry.id, entry.label, entry.base_price));
    }

    lines.push("technologies:".to_string());
    for entry in catalog.technologies() {
        lines.push(format!("- {} = {} (+{})", entry.id, entry.label, entry.add_price));
    }

    lines.push("infra tiers:".to_string());
    for entry in catalog.infra_tiers() {
        lines.push(format!("- {} = {} (+{})", entry.id, entry.label, entry.add_price));
    }

    lines.push("scope:".to_string());
    for value in Scope::MIN..=Scope::MAX {
        let label = Scope::new(value)
            .ok()
            .and_then(|scope| catalog.scope_label(scope))
            .unwrap_or("<unlabeled>");
        lines.push(format!("- {value} = {label}"));
    }

    lines.join("\n")
}
