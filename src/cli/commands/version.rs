//! Version and build metadata.

use serde::Serialize;

use crate::cli::args::{OutputFormat, VersionArgs};

#[allow(dead_code, clippy::pedantic, clippy::nursery)]
mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[derive(Debug, Serialize)]
struct VersionInfo {
    name: &'static str,
    version: &'static str,
    commit: Option<&'static str>,
    target: &'static str,
    profile: &'static str,
    rustc: &'static str,
    built_at: &'static str,
}

impl VersionInfo {
    const fn current() -> Self {
        Self {
            name: built_info::PKG_NAME,
            version: built_info::PKG_VERSION,
            commit: built_info::GIT_COMMIT_HASH_SHORT,
            target: built_info::TARGET,
            profile: built_info::PROFILE,
            rustc: built_info::RUSTC_VERSION,
            built_at: built_info::BUILT_TIME_UTC,
        }
    }
}

/// Print version and build information.
pub fn run(args: &VersionArgs) {
    let info = VersionInfo::current();
    match args.format {
        OutputFormat::Human => {
            let commit = info.commit.unwrap_or("unknown");
            println!("{} {} ({commit})", info.name, info.version);
            println!("target:  {} ({})", info.target, info.profile);
            println!("rustc:   {}", info.rustc);
            println!("built:   {}", info.built_at);
        }
        OutputFormat::Json => match serde_json::to_string(&info) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::error!(error = %e, "failed to serialize version info"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_matches_manifest() {
        let info = VersionInfo::current();
        assert_eq!(info.name, "invisible-cost");
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("target").is_some());
    }
}
