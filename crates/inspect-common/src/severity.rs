/// Severity, rule type and rule status enumerations plus the fixed tables that map
/// report-side severities onto rule-side severities and types.
///
/// Every `from_value` parser is lenient: values are trimmed and compared
/// case-insensitively, and blank or unknown values fall back to the type's default.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of an issue type as declared by the inspection report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueSeverity {
    DoNotShow,
    InvalidSeverity,
    Hint,
    Suggestion,
    #[default]
    Warning,
    Error,
}

impl IssueSeverity {
    const ALL: [IssueSeverity; 6] = [
        IssueSeverity::DoNotShow,
        IssueSeverity::InvalidSeverity,
        IssueSeverity::Hint,
        IssueSeverity::Suggestion,
        IssueSeverity::Warning,
        IssueSeverity::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IssueSeverity::DoNotShow => "DO_NOT_SHOW",
            IssueSeverity::InvalidSeverity => "INVALID_SEVERITY",
            IssueSeverity::Hint => "HINT",
            IssueSeverity::Suggestion => "SUGGESTION",
            IssueSeverity::Warning => "WARNING",
            IssueSeverity::Error => "ERROR",
        }
    }

    pub fn from_value(value: Option<&str>) -> Self {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Self::default();
        };
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(value))
            .unwrap_or_default()
    }

    /// Rule severity derived from this issue severity.
    pub fn rule_severity(self) -> RuleSeverity {
        match self {
            IssueSeverity::DoNotShow | IssueSeverity::InvalidSeverity | IssueSeverity::Hint => {
                RuleSeverity::Info
            }
            IssueSeverity::Suggestion => RuleSeverity::Minor,
            IssueSeverity::Warning => RuleSeverity::Major,
            IssueSeverity::Error => RuleSeverity::Critical,
        }
    }

    /// Rule type derived from this issue severity.
    pub fn rule_type(self) -> RuleType {
        match self {
            IssueSeverity::Warning | IssueSeverity::Error => RuleType::Bug,
            _ => RuleType::CodeSmell,
        }
    }
}

/// Severity of a converted rule definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleSeverity {
    Info,
    Minor,
    #[default]
    Major,
    Critical,
    Blocker,
}

impl RuleSeverity {
    const ALL: [RuleSeverity; 5] = [
        RuleSeverity::Info,
        RuleSeverity::Minor,
        RuleSeverity::Major,
        RuleSeverity::Critical,
        RuleSeverity::Blocker,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RuleSeverity::Info => "INFO",
            RuleSeverity::Minor => "MINOR",
            RuleSeverity::Major => "MAJOR",
            RuleSeverity::Critical => "CRITICAL",
            RuleSeverity::Blocker => "BLOCKER",
        }
    }

    pub fn from_value(value: Option<&str>) -> Self {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Self::default();
        };
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(value))
            .unwrap_or_default()
    }
}

/// Kind of a converted rule definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    #[default]
    CodeSmell,
    Bug,
    Vulnerability,
}

impl RuleType {
    const ALL: [RuleType; 3] = [RuleType::CodeSmell, RuleType::Bug, RuleType::Vulnerability];

    pub fn as_str(self) -> &'static str {
        match self {
            RuleType::CodeSmell => "CODE_SMELL",
            RuleType::Bug => "BUG",
            RuleType::Vulnerability => "VULNERABILITY",
        }
    }

    fn variant_name(self) -> &'static str {
        match self {
            RuleType::CodeSmell => "CodeSmell",
            RuleType::Bug => "Bug",
            RuleType::Vulnerability => "Vulnerability",
        }
    }

    /// Accepts either the upper-case wire name (`CODE_SMELL`) or the variant name
    /// (`CodeSmell`), ignoring case.
    pub fn from_value(value: Option<&str>) -> Self {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Self::default();
        };
        Self::ALL
            .into_iter()
            .find(|t| {
                t.as_str().eq_ignore_ascii_case(value) || t.variant_name().eq_ignore_ascii_case(value)
            })
            .unwrap_or_default()
    }
}

/// Markup used by a rule description. A description carries exactly one syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionSyntax {
    #[default]
    Html,
    Markdown,
}

/// Lifecycle status of a rule definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleStatus {
    Beta,
    Deprecated,
    #[default]
    Ready,
    Removed,
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RuleSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
