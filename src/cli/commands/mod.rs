//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod completions;
pub mod cost;
pub mod phases;
pub mod run;
pub mod validate;
pub mod version;

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::cli::args::{Cli, Commands};
use crate::config::{ConfigLoader, ExperienceConfig};
use crate::error::InvisibleCostError;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli, cancel: CancellationToken) -> Result<(), InvisibleCostError> {
    match cli.command {
        Commands::Run(args) => run::run(&args, cancel).await,
        Commands::Cost(args) => cost::run(&args),
        Commands::Phases(args) => phases::run(&args),
        Commands::Validate(args) => validate::run(&args),
        Commands::Completions(args) => {
            completions::run(&args);
            Ok(())
        }
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}

/// Loads `path`, logging its warnings, or returns the built-in config.
pub(crate) fn load_config(path: Option<&Path>) -> Result<Arc<ExperienceConfig>, InvisibleCostError> {
    let Some(path) = path else {
        return Ok(Arc::new(ExperienceConfig::default()));
    };

    tracing::info!(config = %path.display(), "loading configuration");
    let load_result = ConfigLoader::with_defaults().load(path)?;
    for warning in &load_result.warnings {
        tracing::warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }
    Ok(load_result.config)
}
