use std::path::{Path, PathBuf};

use clap::ValueEnum;
use inspect_common::predicate::EmptyChain;

use crate::cli::{Cli, EmptyFilterArg};
use crate::error::AppError;

/// File name looked up in the working directory when no override path is configured.
pub const DEFAULT_OVERRIDE_FILE: &str = "sonarqube_rule_overrides.xml";

/// Source language whose issue types are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Language {
    #[default]
    #[value(name = "cs")]
    CSharp,
    #[value(name = "vbnet")]
    VisualBasic,
}

impl Language {
    fn parse(value: &str) -> Result<Self, AppError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cs" | "csharp" => Ok(Language::CSharp),
            "vbnet" | "vb" => Ok(Language::VisualBasic),
            other => Err(AppError::Config(format!(
                "INSPECTCODE_LANGUAGE must be cs or vbnet, got '{other}'"
            ))),
        }
    }
}

/// Where the rule override document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideSource {
    File(PathBuf),
    /// The default document compiled into the binary.
    Bundled,
}

/// Application configuration.
///
/// Precedence: command-line flags, then environment variables, then defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// InspectCode XML report to ingest.
    pub report_path: PathBuf,
    pub overrides: OverrideSource,
    /// Only issues of this project are kept. `None` keeps every project.
    pub project_name: Option<String>,
    pub language: Language,
    /// Run the schema validator before parsing each document.
    pub validate: bool,
    /// Outcome of a configured filter that holds no predicates.
    pub empty_filter: EmptyChain,
}

impl Config {
    /// Load configuration from environment variables, with `cli` flags taking precedence.
    ///
    /// Required (flag or variable):
    /// - `INSPECTCODE_REPORT_PATH`: path to the InspectCode report
    ///
    /// Optional:
    /// - `SONAR_PLUGIN_INSPECTCODE_OVERRIDEFILE`: override document (falls back to
    ///   `sonarqube_rule_overrides.xml` in the working directory, then the bundled default)
    /// - `INSPECTCODE_PROJECT_NAME`: project scope
    /// - `INSPECTCODE_LANGUAGE`: `cs` (default) or `vbnet`
    /// - `INSPECTCODE_XSD_VALIDATION`: `true` to validate documents before parsing
    pub fn from_env(cli: &Cli) -> Result<Self, AppError> {
        Self::load(cli, |key| std::env::var(key).ok())
    }

    fn load<F>(cli: &Cli, var: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| var(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let cwd = std::env::current_dir().map_err(|e| {
            AppError::Config(format!("cannot determine working directory: {e}"))
        })?;

        let report_path = cli
            .report
            .clone()
            .or_else(|| var("INSPECTCODE_REPORT_PATH").map(PathBuf::from))
            .ok_or_else(|| {
                AppError::Config(
                    "--report or INSPECTCODE_REPORT_PATH is required".to_string(),
                )
            })?;

        let overrides = resolve_overrides(
            cli.overrides
                .clone()
                .or_else(|| var("SONAR_PLUGIN_INSPECTCODE_OVERRIDEFILE").map(PathBuf::from)),
            &cwd,
        );

        let project_name = cli
            .project
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .or_else(|| var("INSPECTCODE_PROJECT_NAME"));

        let language = match cli.language {
            Some(language) => language,
            None => var("INSPECTCODE_LANGUAGE")
                .map(|v| Language::parse(&v))
                .transpose()?
                .unwrap_or_default(),
        };

        let validate = cli.validate
            || var("INSPECTCODE_XSD_VALIDATION").is_some_and(|v| v.eq_ignore_ascii_case("true"));

        let empty_filter = match cli.empty_filter {
            Some(EmptyFilterArg::Accept) => EmptyChain::Accept,
            Some(EmptyFilterArg::Reject) | None => EmptyChain::Reject,
        };

        Ok(Self {
            report_path,
            overrides,
            project_name,
            language,
            validate,
            empty_filter,
        })
    }
}

/// An explicit path is used as is, even when it does not exist; the pipeline reports it.
fn resolve_overrides(explicit: Option<PathBuf>, cwd: &Path) -> OverrideSource {
    if let Some(path) = explicit {
        return OverrideSource::File(path);
    }
    let local = cwd.join(DEFAULT_OVERRIDE_FILE);
    if local.is_file() {
        OverrideSource::File(local)
    } else {
        OverrideSource::Bundled
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_report_path_is_required() {
        let result = Config::load(&Cli::default(), env(&[]));
        assert!(matches!(result, Err(AppError::Config(_))));
        let result = Config::load(&Cli::default(), env(&[("INSPECTCODE_REPORT_PATH", "  ")]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_environment_values() {
        let config = Config::load(
            &Cli::default(),
            env(&[
                ("INSPECTCODE_REPORT_PATH", "report.xml"),
                ("SONAR_PLUGIN_INSPECTCODE_OVERRIDEFILE", "/etc/overrides.xml"),
                ("INSPECTCODE_PROJECT_NAME", "Core"),
                ("INSPECTCODE_LANGUAGE", "VBNET"),
                ("INSPECTCODE_XSD_VALIDATION", "True"),
            ]),
        )
        .unwrap();
        assert_eq!(config.report_path, PathBuf::from("report.xml"));
        assert_eq!(
            config.overrides,
            OverrideSource::File(PathBuf::from("/etc/overrides.xml"))
        );
        assert_eq!(config.project_name.as_deref(), Some("Core"));
        assert_eq!(config.language, Language::VisualBasic);
        assert!(config.validate);
        assert_eq!(config.empty_filter, EmptyChain::Reject);
    }

    #[test]
    fn test_cli_takes_precedence_over_environment() {
        let cli = Cli {
            report: Some(PathBuf::from("cli.xml")),
            overrides: Some(PathBuf::from("cli-overrides.xml")),
            project: Some("Cli.Project".to_string()),
            language: Some(Language::CSharp),
            validate: false,
            empty_filter: Some(EmptyFilterArg::Accept),
        };
        let config = Config::load(
            &cli,
            env(&[
                ("INSPECTCODE_REPORT_PATH", "env.xml"),
                ("SONAR_PLUGIN_INSPECTCODE_OVERRIDEFILE", "env-overrides.xml"),
                ("INSPECTCODE_PROJECT_NAME", "Env.Project"),
                ("INSPECTCODE_LANGUAGE", "vbnet"),
            ]),
        )
        .unwrap();
        assert_eq!(config.report_path, PathBuf::from("cli.xml"));
        assert_eq!(
            config.overrides,
            OverrideSource::File(PathBuf::from("cli-overrides.xml"))
        );
        assert_eq!(config.project_name.as_deref(), Some("Cli.Project"));
        assert_eq!(config.language, Language::CSharp);
        assert_eq!(config.empty_filter, EmptyChain::Accept);
    }

    #[test]
    fn test_invalid_language_is_rejected() {
        let result = Config::load(
            &Cli::default(),
            env(&[
                ("INSPECTCODE_REPORT_PATH", "report.xml"),
                ("INSPECTCODE_LANGUAGE", "fsharp"),
            ]),
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_override_resolution_order() {
        let dir = tempdir().unwrap();
        assert_eq!(resolve_overrides(None, dir.path()), OverrideSource::Bundled);

        let local = dir.path().join(DEFAULT_OVERRIDE_FILE);
        std::fs::write(&local, "<RuleOverrides/>").unwrap();
        assert_eq!(
            resolve_overrides(None, dir.path()),
            OverrideSource::File(local)
        );

        let explicit = PathBuf::from("missing.xml");
        assert_eq!(
            resolve_overrides(Some(explicit.clone()), dir.path()),
            OverrideSource::File(explicit)
        );
    }
}
