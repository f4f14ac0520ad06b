//! Configuration loader
//!
//! Pipeline:
//! 1. Size limit check
//! 2. Read, strip a UTF-8 BOM, reject empty input
//! 3. YAML parsing into [`ExperienceConfig`]
//! 4. Validation (all issues collected)
//! 5. Freeze with `Arc`

use std::path::Path;
use std::sync::Arc;

use crate::config::schema::ExperienceConfig;
use crate::config::validation::Validator;
use crate::error::ConfigError;

/// Environment variable overriding the maximum config size in bytes.
pub const MAX_CONFIG_SIZE_ENV: &str = "INVISIBLE_COST_MAX_CONFIG_SIZE";

const DEFAULT_MAX_CONFIG_SIZE: usize = 1024 * 1024;

// ============================================================================
// Public API
// ============================================================================

/// Options for the configuration loader.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Maximum configuration file size in bytes.
    pub max_config_size: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            max_config_size: env_or(MAX_CONFIG_SIZE_ENV, DEFAULT_MAX_CONFIG_SIZE),
        }
    }
}

/// Result of loading a configuration file.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated configuration.
    pub config: Arc<ExperienceConfig>,

    /// Warnings encountered during loading.
    pub warnings: Vec<LoadWarning>,
}

/// Warning during configuration loading.
#[derive(Debug, Clone)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// Location where the warning occurred.
    pub location: Option<String>,
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) if !location.is_empty() => write!(f, "{location}: {}", self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// Configuration loader.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: LoaderOptions,
}

impl ConfigLoader {
    /// Creates a loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Creates a loader with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(LoaderOptions::default())
    }

    /// Loads, validates and freezes the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file is missing, unreadable or over the size limit
    /// - The file is empty
    /// - YAML parsing fails
    /// - Validation reports any error
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        let file_size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if file_size > self.options.max_config_size {
            return Err(ConfigError::InvalidValue {
                field: "file_size".to_string(),
                value: format!("{file_size} bytes"),
                expected: format!("at most {} bytes", self.options.max_config_size),
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        self.load_str(&raw, path)
    }

    /// Runs the pipeline on in-memory text; `path` only labels errors.
    ///
    /// # Errors
    ///
    /// Same as [`ConfigLoader::load`], minus the file checks.
    pub fn load_str(&self, raw: &str, path: &Path) -> Result<LoadResult, ConfigError> {
        if raw.len() > self.options.max_config_size {
            return Err(ConfigError::InvalidValue {
                field: "file_size".to_string(),
                value: format!("{} bytes", raw.len()),
                expected: format!("at most {} bytes", self.options.max_config_size),
            });
        }

        let content = raw.strip_prefix('\u{feff}').unwrap_or(raw);
        if content.trim().is_empty() {
            return Err(ConfigError::Empty {
                path: path.to_path_buf(),
            });
        }

        let value: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;
        if value.is_null() {
            return Err(ConfigError::Empty {
                path: path.to_path_buf(),
            });
        }

        let config: ExperienceConfig =
            serde_yaml::from_value(value).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: format!("Failed to deserialize configuration: {e}"),
            })?;

        let result = Validator::new().validate(&config);
        if result.has_errors() {
            return Err(ConfigError::ValidationError {
                path: path.display().to_string(),
                errors: result.errors,
            });
        }

        let warnings = result
            .warnings
            .into_iter()
            .map(|issue| LoadWarning {
                message: issue.message,
                location: Some(issue.path),
            })
            .collect();

        Ok(LoadResult {
            config: Arc::new(config),
            warnings,
        })
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn write_temp(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_file() {
        let file = write_temp(b"phases:\n  - { name: only, duration: 2 }\n");
        let result = ConfigLoader::with_defaults().load(file.path()).unwrap();
        assert_eq!(result.config.phases.as_ref().unwrap()[0].name, "only");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_bom_is_stripped() {
        let file = write_temp(b"\xEF\xBB\xBFexperience:\n  tick_hz: 20\n");
        let result = ConfigLoader::with_defaults().load(file.path()).unwrap();
        assert!((result.config.experience.tick_hz - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::with_defaults()
            .load(Path::new("/definitely/not/here.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }

    #[test]
    fn test_empty_file() {
        let file = write_temp(b"  \n# only a comment\n");
        let err = ConfigLoader::with_defaults().load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Empty { .. }));
    }

    #[test]
    fn test_parse_error_carries_line() {
        let err = ConfigLoader::with_defaults()
            .load_str("experience:\n  tick_hz: [1,\n", &PathBuf::from("bad.yaml"))
            .unwrap_err();
        match err {
            ConfigError::ParseError { line, .. } => assert!(line.is_some()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_size_limit() {
        let loader = ConfigLoader::new(LoaderOptions { max_config_size: 8 });
        let err = loader
            .load_str("experience: { tick_hz: 10 }", Path::new("big.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_validation_errors_are_collected() {
        let err = ConfigLoader::with_defaults()
            .load_str(
                "phases:\n  - { name: complete }\n  - { name: x, duration: -2 }\n",
                Path::new("v.yaml"),
            )
            .unwrap_err();
        match err {
            ConfigError::ValidationError { errors, .. } => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_warnings_are_returned() {
        let result = ConfigLoader::with_defaults()
            .load_str("phases:\n  - { name: hold }\n", Path::new("w.yaml"))
            .unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(
            result.warnings[0].location.as_deref(),
            Some("phases[0].duration")
        );
    }
}
