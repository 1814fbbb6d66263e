//! CLI argument definitions for the risk calculator.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use postop_cli::input::parse_assignment;
use postop_model::{BINARY_V1, ComplicationKey, ORDINAL_V1, RawValue};

#[derive(Parser)]
#[command(
    name = "postop-risk",
    version,
    about = "Postoperative complication risk after shoulder arthroplasty",
    long_about = "Estimate the risk of medical, surgical, serious and any complication \
                  after shoulder arthroplasty.\n\n\
                  Raw clinical inputs are discretized per model and scored by the trained \
                  models listed in a models directory."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow raw clinical values to appear in logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the input fields a model set expects.
    Fields(FieldsArgs),

    /// Score one patient against the trained models.
    Predict(PredictArgs),

    /// Load every model in a models directory and report on it.
    Verify(VerifyArgs),
}

#[derive(Args)]
pub struct ModelArgs {
    /// Directory holding manifest.toml and the model artifacts.
    #[arg(long = "models", value_name = "DIR")]
    pub models: PathBuf,

    /// Upper bound on loading a single model.
    #[arg(long = "load-timeout-secs", value_name = "SECS", default_value_t = 10)]
    pub load_timeout_secs: u64,
}

#[derive(Parser)]
pub struct FieldsArgs {
    /// Read schemes from the models in this directory instead of a preset.
    #[arg(long = "models", value_name = "DIR")]
    pub models: Option<PathBuf>,

    /// Complication(s) whose models to describe (default: all in the manifest).
    #[arg(long = "complication", value_name = "KEY")]
    pub complications: Vec<ComplicationKey>,

    /// Built-in scheme to describe when no models directory is given.
    #[arg(long = "scheme", value_enum, default_value = "ordinal-v1")]
    pub scheme: SchemeArg,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,
}

#[derive(Parser)]
pub struct PredictArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Complication(s) to score, in report order (default: all in the manifest).
    #[arg(long = "complication", value_name = "KEY")]
    pub complications: Vec<ComplicationKey>,

    /// One raw input value; repeat for each variable.
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, RawValue)>,

    /// JSON object of raw input values; `--set` entries override it.
    #[arg(long = "input", value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Fill variables that were not given with the form defaults.
    #[arg(long = "fill-defaults")]
    pub fill_defaults: bool,

    /// Report probabilities only, without thresholded labels.
    #[arg(long = "no-labels")]
    pub no_labels: bool,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,
}

#[derive(Parser)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SchemeArg {
    #[value(name = "ordinal-v1")]
    OrdinalV1,
    #[value(name = "binary-v1")]
    BinaryV1,
}

impl SchemeArg {
    pub fn preset_name(self) -> &'static str {
        match self {
            SchemeArg::OrdinalV1 => ORDINAL_V1,
            SchemeArg::BinaryV1 => BINARY_V1,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    Table,
    Json,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
