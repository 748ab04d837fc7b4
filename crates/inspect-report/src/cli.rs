use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmptyFilterArg {
    Accept,
    Reject,
}

#[derive(Debug, Default, Parser)]
#[command(
    name = "inspect-report",
    version,
    about = "Extract rules and issues from an InspectCode XML report",
    long_about = "Parse an InspectCode XML report, filter issue types and issues, apply rule overrides and print the result as JSON.\n\nConfiguration precedence: CLI > environment > defaults."
)]
pub struct Cli {
    #[arg(long, help = "InspectCode report (env: INSPECTCODE_REPORT_PATH)")]
    pub report: Option<PathBuf>,

    #[arg(long, help = "Rule override document (env: SONAR_PLUGIN_INSPECTCODE_OVERRIDEFILE)")]
    pub overrides: Option<PathBuf>,

    #[arg(long, help = "Only keep issues of this project (env: INSPECTCODE_PROJECT_NAME)")]
    pub project: Option<String>,

    #[arg(long, value_enum, help = "Rule language: cs|vbnet (env: INSPECTCODE_LANGUAGE)")]
    pub language: Option<Language>,

    #[arg(long, action = clap::ArgAction::SetTrue, help = "Validate documents before parsing (env: INSPECTCODE_XSD_VALIDATION)")]
    pub validate: bool,

    #[arg(long, value_enum, help = "Outcome of a configured filter without predicates: accept|reject")]
    pub empty_filter: Option<EmptyFilterArg>,
}
