pub mod catalog;
pub mod config;
pub mod doctor;
pub mod estimate;
pub mod wizard;

use quickquote_core::config::{AppConfig, LoadOptions};
use quickquote_core::{ApplicationError, Catalog, InterfaceError};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'static str>,
}

impl CommandResult {
    /// Command-specific output printed as-is.
    pub fn output(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }

    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            correlation_id: None,
            hint: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            correlation_id: None,
            hint: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Error envelope for a core failure, tagged with a fresh correlation id
    /// that also appears in the log line.
    pub fn from_application_error(command: &str, error: ApplicationError) -> Self {
        let error_class = error.class();
        let exit_code = exit_code_for(&error);
        let correlation_id = Uuid::new_v4().to_string();
        warn!(
            event_name = "cli.command.failed",
            command,
            error_class,
            correlation_id = %correlation_id,
            error = %error,
            "command failed"
        );
        let interface = error.into_interface(correlation_id.clone());
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: interface_message(&interface),
            correlation_id: Some(correlation_id),
            hint: Some(interface.user_message()),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn exit_code_for(error: &ApplicationError) -> u8 {
    match error {
        ApplicationError::Configuration(_) => 2,
        ApplicationError::Catalog(_) => 3,
        ApplicationError::Domain(_) => 4,
        ApplicationError::Pricing(_) => 5,
    }
}

fn interface_message(error: &InterfaceError) -> String {
    match error {
        InterfaceError::BadRequest { message, .. } | InterfaceError::Internal { message, .. } => {
            message.clone()
        }
    }
}

/// Config and catalog every wizard-facing command starts from.
pub fn load_runtime(options: &LoadOptions) -> Result<(AppConfig, Catalog), ApplicationError> {
    let config = AppConfig::load(options.clone())?;
    let catalog = config.load_catalog()?;
    Ok((config, catalog))
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            concat!(
                "{{\"command\":\"unknown\",\"status\":\"error\",",
                "\"error_class\":\"serialization\",\"message\":\"{}\"}}"
            ),
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
