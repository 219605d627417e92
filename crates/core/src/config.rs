use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cpq::catalog::{Catalog, CatalogError};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub submission: SubmissionConfig,
    pub host: HostConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Default)]
pub struct CatalogConfig {
    /// Replacement catalog file; the built-in reference catalog when unset.
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct SubmissionConfig {
    pub sink: SinkKind,
}

/// Settings read once by the rendering host. The wizard core never reads them.
#[derive(Clone, Debug, Default)]
pub struct HostConfig {
    pub reduced_motion: bool,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    Log,
    Stdout,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub catalog_path: Option<PathBuf>,
    pub submission_sink: Option<SinkKind>,
    pub reduced_motion: Option<bool>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            submission: SubmissionConfig { sink: SinkKind::Log },
            host: HostConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for SinkKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(Self::Log),
            "stdout" => Ok(Self::Stdout),
            other => Err(ConfigError::Validation(format!(
                "unsupported submission sink `{other}` (expected log|stdout)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("quickquote.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Catalog named by `catalog.path`, or the reference catalog.
    pub fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        match &self.catalog.path {
            Some(path) => Catalog::load(path),
            None => Ok(Catalog::reference()),
        }
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(catalog) = patch.catalog {
            if let Some(path) = catalog.path {
                self.catalog.path = Some(path);
            }
        }

        if let Some(submission) = patch.submission {
            if let Some(sink) = submission.sink {
                self.submission.sink = sink;
            }
        }

        if let Some(host) = patch.host {
            if let Some(reduced_motion) = host.reduced_motion {
                self.host.reduced_motion = reduced_motion;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("QUICKQUOTE_CATALOG_PATH") {
            self.catalog.path = Some(PathBuf::from(value));
        }

        if let Some(value) = read_env("QUICKQUOTE_SUBMISSION_SINK") {
            self.submission.sink = value.parse()?;
        }

        if let Some(value) = read_env("QUICKQUOTE_HOST_REDUCED_MOTION") {
            self.host.reduced_motion = parse_bool("QUICKQUOTE_HOST_REDUCED_MOTION", &value)?;
        }

        let log_level =
            read_env("QUICKQUOTE_LOGGING_LEVEL").or_else(|| read_env("QUICKQUOTE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("QUICKQUOTE_LOGGING_FORMAT").or_else(|| read_env("QUICKQUOTE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(catalog_path) = overrides.catalog_path {
            self.catalog.path = Some(catalog_path);
        }
        if let Some(sink) = overrides.submission_sink {
            self.submission.sink = sink;
        }
        if let Some(reduced_motion) = overrides.reduced_motion {
            self.host.reduced_motion = reduced_motion;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_catalog(&self.catalog)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("quickquote.toml"), PathBuf::from("config/quickquote.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if let Some(path) = &catalog.path {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation("catalog.path must not be empty".to_string()));
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some("toml") {
            return Err(ConfigError::Validation(format!(
                "catalog.path must point to a .toml file, got `{}`",
                path.display()
            )));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    catalog: Option<CatalogPatch>,
    submission: Option<SubmissionPatch>,
    host: Option<HostPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct SubmissionPatch {
    sink: Option<SinkKind>,
}

#[derive(Debug, Default, Deserialize)]
struct HostPatch {
    reduced_motion: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, SinkKind};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const ENV_VARS: &[&str] = &[
        "QUICKQUOTE_CATALOG_PATH",
        "QUICKQUOTE_SUBMISSION_SINK",
        "QUICKQUOTE_HOST_REDUCED_MOTION",
        "QUICKQUOTE_LOGGING_LEVEL",
        "QUICKQUOTE_LOG_LEVEL",
        "QUICKQUOTE_LOGGING_FORMAT",
        "QUICKQUOTE_LOG_FORMAT",
        "TEST_QUICKQUOTE_CATALOG",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_use_reference_catalog_and_log_sink() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_VARS);

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.catalog.path.is_none(), "catalog path should default to unset")?;
        ensure(config.submission.sink == SinkKind::Log, "sink should default to log")?;
        ensure(!config.host.reduced_motion, "reduced motion should default to false")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )?;
        let catalog = config.load_catalog().map_err(|err| err.to_string())?;
        ensure(!catalog.services().is_empty(), "reference catalog should have services")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_VARS);

        env::set_var("TEST_QUICKQUOTE_CATALOG", "/srv/site/catalog.toml");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("quickquote.toml");
            fs::write(
                &path,
                r#"
[catalog]
path = "${TEST_QUICKQUOTE_CATALOG}"

[host]
reduced_motion = true
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.catalog.path == Some(PathBuf::from("/srv/site/catalog.toml")),
                "catalog path should be interpolated from environment",
            )?;
            ensure(config.host.reduced_motion, "reduced motion should be read from file")?;
            Ok(())
        })();

        clear_vars(ENV_VARS);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_VARS);

        env::set_var("QUICKQUOTE_LOG_LEVEL", "warn");
        env::set_var("QUICKQUOTE_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(ENV_VARS);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_VARS);

        env::set_var("QUICKQUOTE_SUBMISSION_SINK", "stdout");
        env::set_var("QUICKQUOTE_CATALOG_PATH", "from-env.toml");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("quickquote.toml");
            fs::write(
                &path,
                r#"
[catalog]
path = "from-file.toml"

[submission]
sink = "log"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    catalog_path: Some(PathBuf::from("from-override.toml")),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.catalog.path == Some(PathBuf::from("from-override.toml")),
                "override catalog path should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.submission.sink == SinkKind::Stdout,
                "env sink should win over file and defaults",
            )?;
            Ok(())
        })();

        clear_vars(ENV_VARS);
        result
    }

    #[test]
    fn invalid_bool_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_VARS);

        env::set_var("QUICKQUOTE_HOST_REDUCED_MOTION", "sometimes");

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected invalid override failure".to_string()),
            Err(ConfigError::InvalidEnvOverride { key, .. }) => {
                ensure(key == "QUICKQUOTE_HOST_REDUCED_MOTION", "error should name the key")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
        };

        clear_vars(ENV_VARS);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_VARS);

        let error = match AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                catalog_path: Some(PathBuf::from("catalog.json")),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }) {
            Ok(_) => {
                return Err("expected validation failure but config load succeeded".to_string())
            }
            Err(error) => error,
        };
        let has_message = matches!(
            error,
            ConfigError::Validation(ref message) if message.contains("catalog.path")
        );
        ensure(has_message, "validation failure should mention catalog.path")
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(ENV_VARS);

        let result = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/quickquote.toml")),
            require_file: true,
            ..LoadOptions::default()
        });
        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(_))),
            "missing required file should be reported",
        )
    }
}
