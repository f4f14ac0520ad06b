//! CLI argument definitions
//!
//! All Clap derive structs for `invisible-cost` command-line parsing.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::cost::{AutomationLevel, Category, Channel, UserInput};
use crate::cost::input::{DEFAULT_HOURLY_RATE, DEFAULT_OVERHEAD_MULTIPLIER};
use crate::error::InputError;

// ============================================================================
// Root CLI
// ============================================================================

/// Phase-driven experience sequencer and invisible-cost calculator.
#[derive(Parser, Debug)]
#[command(name = "invisible-cost", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "INVISIBLE_COST_COLOR")]
    pub color: ColorChoice,

    /// Log output format.
    #[arg(long, default_value = "human", global = true, env = "INVISIBLE_COST_LOG_FORMAT")]
    pub log_format: crate::observability::LogFormat,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the experience in real time.
    Run(RunArgs),

    /// Compute a cost breakdown and savings projection.
    Cost(CostArgs),

    /// Print the phase timeline.
    Phases(PhasesArgs),

    /// Validate configuration files.
    Validate(ValidateArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version and build information.
    Version(VersionArgs),
}

// ============================================================================
// Shared Input Flags
// ============================================================================

/// Visitor input for the cost model.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Process category (e.g. ticket-processing, or an industry: finance, it, health, supply).
    #[arg(long)]
    pub category: Option<String>,

    /// Units handled per month.
    #[arg(long, alias = "volume", allow_negative_numbers = true)]
    pub monthly_volume: Option<f64>,

    /// Customers served (per-entity categories).
    #[arg(long, allow_negative_numbers = true)]
    pub customers: Option<f64>,

    /// Average members per customer (per-entity categories).
    #[arg(long, allow_negative_numbers = true)]
    pub avg_customer_size: Option<f64>,

    /// Staff working the process.
    #[arg(long, allow_negative_numbers = true)]
    pub staff: Option<f64>,

    /// Fully loaded hourly rate.
    #[arg(long, default_value_t = DEFAULT_HOURLY_RATE, allow_negative_numbers = true)]
    pub hourly_rate: f64,

    /// Overhead multiplier applied to direct cost (at least 1.0).
    #[arg(long, default_value_t = DEFAULT_OVERHEAD_MULTIPLIER, allow_negative_numbers = true)]
    pub overhead: f64,

    /// Automation level: manual, partial or advanced.
    #[arg(long, default_value = "manual")]
    pub automation: String,

    /// Intake channel: email, phone, portal or paper.
    #[arg(long)]
    pub channel: Option<String>,
}

impl InputArgs {
    /// Parsed category, when one was given.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::UnknownCategory`] for an unrecognised name.
    pub fn category(&self) -> Result<Option<Category>, InputError> {
        self.category.as_deref().map(str::parse).transpose()
    }

    /// Builds a [`UserInput`] for `category` from the flags.
    ///
    /// # Errors
    ///
    /// Returns an [`InputError`] for an unknown automation level or
    /// channel. Numeric checks happen in the cost model.
    pub fn to_input(&self, category: Category) -> Result<UserInput, InputError> {
        let mut input = UserInput::new(category)
            .with_hourly_rate(self.hourly_rate)
            .with_overhead(self.overhead)
            .with_automation(self.automation.parse::<AutomationLevel>()?);
        input.monthly_volume = self.monthly_volume;
        input.customers = self.customers;
        input.avg_customer_size = self.avg_customer_size;
        input.staff_count = self.staff;
        if let Some(channel) = &self.channel {
            input = input.with_channel(channel.parse::<Channel>()?);
        }
        Ok(input)
    }

    /// Whether any volume figure was supplied.
    #[must_use]
    pub const fn has_volume(&self) -> bool {
        self.monthly_volume.is_some() || self.customers.is_some()
    }
}

// ============================================================================
// Run
// ============================================================================

/// Arguments for `run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to YAML configuration file.
    #[arg(short, long, env = "INVISIBLE_COST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Render bridge address (`host:port`); overrides the config file.
    #[arg(long, env = "INVISIBLE_COST_BRIDGE")]
    pub bridge: Option<String>,

    /// Visitor input; with a category the industry narration is preselected.
    #[command(flatten)]
    pub input: InputArgs,

    /// Advance user-controlled phases after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub auto_continue: Option<f64>,

    /// Time multiplier, between 0.01 and 1000.
    #[arg(long, default_value_t = 1.0)]
    pub speed: f64,

    /// Directory holding `narration_<cue>.mp3` files.
    #[arg(long, env = "INVISIBLE_COST_ASSETS")]
    pub assets: Option<PathBuf>,

    /// Write JSONL events to this file.
    #[arg(long)]
    pub events_file: Option<PathBuf>,

    /// Serve Prometheus metrics on this port.
    #[arg(long, env = "INVISIBLE_COST_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

// ============================================================================
// Cost
// ============================================================================

/// Arguments for `cost`.
#[derive(Args, Debug)]
pub struct CostArgs {
    /// Visitor input.
    #[command(flatten)]
    pub input: InputArgs,

    /// Share of total cost removed by automation, in (0, 1].
    #[arg(long, default_value_t = 0.3, allow_negative_numbers = true)]
    pub reduction: f64,

    /// Path to YAML configuration file with benchmark overrides.
    #[arg(short, long, env = "INVISIBLE_COST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// Phases / Validate
// ============================================================================

/// Arguments for `phases`.
#[derive(Args, Debug)]
pub struct PhasesArgs {
    /// Path to YAML configuration file.
    #[arg(short, long, env = "INVISIBLE_COST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Enable strict validation (warnings become errors).
    #[arg(long)]
    pub strict: bool,
}

// ============================================================================
// Completions / Version
// ============================================================================

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Tests
// ============================================================================
