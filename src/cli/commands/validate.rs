//! `validate`: check configuration files without running anything.

use std::path::Path;

use serde::Serialize;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::{ConfigLoader, LoadResult};
use crate::error::{ConfigError, InvisibleCostError, Severity, ValidationIssue};

#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    valid: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
}

/// Validates every file, reports all of them, then fails on the first
/// invalid one.
///
/// # Errors
///
/// Returns the first file's [`ConfigError`]; with `--strict`, warnings
/// count as errors.
pub fn run(args: &ValidateArgs) -> Result<(), InvisibleCostError> {
    let loader = ConfigLoader::with_defaults();
    let mut reports = Vec::with_capacity(args.files.len());
    let mut first_failure = None;

    for path in &args.files {
        tracing::info!(file = %path.display(), "validating configuration");
        let outcome = check(&loader, path, args.strict);
        reports.push(report_for(path, outcome.as_ref()));
        if let Err(e) = outcome
            && first_failure.is_none()
        {
            first_failure = Some(e);
        }
    }

    match args.format {
        OutputFormat::Human => {
            for report in &reports {
                print_human(report);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
    }

    first_failure.map_or(Ok(()), |e| Err(e.into()))
}

fn check(loader: &ConfigLoader, path: &Path, strict: bool) -> Result<LoadResult, ConfigError> {
    let result = loader.load(path)?;
    if strict && !result.warnings.is_empty() {
        return Err(ConfigError::ValidationError {
            path: path.display().to_string(),
            errors: result
                .warnings
                .iter()
                .map(|w| ValidationIssue {
                    path: w.location.clone().unwrap_or_default(),
                    message: w.message.clone(),
                    severity: Severity::Error,
                })
                .collect(),
        });
    }
    Ok(result)
}

fn report_for(path: &Path, outcome: Result<&LoadResult, &ConfigError>) -> FileReport {
    let file = path.display().to_string();
    match outcome {
        Ok(result) => FileReport {
            file,
            valid: true,
            errors: Vec::new(),
            warnings: result.warnings.iter().map(ToString::to_string).collect(),
        },
        Err(ConfigError::ValidationError { errors, .. }) => FileReport {
            file,
            valid: false,
            errors: errors
                .iter()
                .map(|issue| format!("{}: {}", issue.path, issue.message))
                .collect(),
            warnings: Vec::new(),
        },
        Err(other) => FileReport {
            file,
            valid: false,
            errors: vec![other.to_string()],
            warnings: Vec::new(),
        },
    }
}

fn print_human(report: &FileReport) {
    if report.valid {
        println!("ok      {}", report.file);
    } else {
        println!("invalid {}", report.file);
    }
    for error in &report.errors {
        println!("  error: {error}");
    }
    for warning in &report.warnings {
        println!("  warning: {warning}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_yaml(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn strict_turns_warnings_into_errors() {
        let file = temp_yaml("phases:\n  - { name: hold }\n");
        let loader = ConfigLoader::with_defaults();
        assert!(check(&loader, file.path(), false).is_ok());

        let err = check(&loader, file.path(), true).unwrap_err();
        let report = report_for(file.path(), Err(&err));
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("phases[0].duration"));
    }

    #[test]
    fn missing_file_is_reported() {
        let loader = ConfigLoader::with_defaults();
        let path = Path::new("/no/such/config.yaml");
        let err = check(&loader, path, false).unwrap_err();
        let report = report_for(path, Err(&err));
        assert!(report.errors[0].contains("file not found"));
    }
}
