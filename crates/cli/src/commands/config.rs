use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use quickquote_core::config::{AppConfig, LoadOptions};
use toml::Value;

struct FieldSpec<'a> {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: &'a str,
}

pub fn run(options: &LoadOptions) -> String {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let catalog_path = config
        .catalog
        .path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<built-in reference>".to_string());
    let sink = format!("{:?}", config.submission.sink);
    let reduced_motion = config.host.reduced_motion.to_string();
    let format = format!("{:?}", config.logging.format);

    let fields = [
        FieldSpec {
            key_path: "catalog.path",
            env_keys: &["QUICKQUOTE_CATALOG_PATH"],
            value: &catalog_path,
        },
        FieldSpec {
            key_path: "submission.sink",
            env_keys: &["QUICKQUOTE_SUBMISSION_SINK"],
            value: &sink,
        },
        FieldSpec {
            key_path: "host.reduced_motion",
            env_keys: &["QUICKQUOTE_HOST_REDUCED_MOTION"],
            value: &reduced_motion,
        },
        FieldSpec {
            key_path: "logging.level",
            env_keys: &["QUICKQUOTE_LOGGING_LEVEL", "QUICKQUOTE_LOG_LEVEL"],
            value: &config.logging.level,
        },
        FieldSpec {
            key_path: "logging.format",
            env_keys: &["QUICKQUOTE_LOGGING_FORMAT", "QUICKQUOTE_LOG_FORMAT"],
            value: &format,
        },
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in &fields {
        lines.push(render_line(
            field.key_path,
            field.value,
            field_source(
                field.key_path,
                field.env_keys,
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
        ));
    }

    lines.join("\n")
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    let root = PathBuf::from("quickquote.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/quickquote.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let env_key = env_keys
        .iter()
        .find(|key| env::var(key).map(|value| !value.trim().is_empty()).unwrap_or(false));
    if let Some(env_key) = env_key {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
