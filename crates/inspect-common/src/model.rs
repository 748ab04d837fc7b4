use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::error::CommonError;
use crate::severity::{DescriptionSyntax, IssueSeverity, RuleSeverity, RuleStatus, RuleType};

/// Sentinel for line numbers and offsets that were absent or malformed.
pub const UNSET: i64 = -1;

/// Trim a key and reject it when nothing is left.
fn normalize_key(raw: &str) -> Option<String> {
    let key = raw.trim();
    (!key.is_empty()).then(|| key.to_string())
}

fn absolute_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^\s/?#]+\S*$").expect("valid regex")
    })
}

/// An issue type declared by the inspection report (one `IssueType` element).
///
/// Identity is the key alone, so a set of definitions holds at most one entry per key.
#[derive(Debug, Clone, Serialize)]
pub struct IssueTypeDefinition {
    /// Issue type identifier, e.g. "RedundantUsingDirective"
    key: String,
    /// Human-readable category name
    pub category: Option<String>,
    /// Category identifier used by category-level overrides
    pub category_id: Option<String>,
    pub sub_category: Option<String>,
    pub description: Option<String>,
    pub severity: IssueSeverity,
    /// Whether the issue type is reported solution-wide
    pub global: bool,
    /// Reference documentation, only kept when it is an absolute URL
    wiki_url: Option<String>,
}

impl IssueTypeDefinition {
    /// Returns `None` when the key is blank.
    pub fn new(key: &str) -> Option<Self> {
        Some(Self {
            key: normalize_key(key)?,
            category: None,
            category_id: None,
            sub_category: None,
            description: None,
            severity: IssueSeverity::default(),
            global: false,
            wiki_url: None,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn wiki_url(&self) -> Option<&str> {
        self.wiki_url.as_deref()
    }

    /// Values that do not parse as an absolute URL leave the field unset.
    pub fn set_wiki_url(&mut self, value: &str) {
        let value = value.trim();
        self.wiki_url = absolute_url_re()
            .is_match(value)
            .then(|| value.to_string());
    }

    /// Only a case-insensitive "true" enables the flag.
    pub fn set_global(&mut self, value: &str) {
        self.global = value.trim().eq_ignore_ascii_case("true");
    }
}

impl PartialEq for IssueTypeDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for IssueTypeDefinition {}

impl Hash for IssueTypeDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// A concrete finding located at a file, line and character range (one `Issue` element).
///
/// Equality covers every attribute since many occurrences share one issue type key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IssueOccurrence {
    issue_type_key: String,
    pub file: Option<String>,
    pub message: Option<String>,
    pub line: i64,
    pub offset_start: i64,
    pub offset_end: i64,
}

impl IssueOccurrence {
    /// Commas in the type id are replaced by underscores to match definition keys.
    /// Returns `None` when the normalized key is blank.
    pub fn new(issue_type_id: &str) -> Option<Self> {
        Some(Self {
            issue_type_key: normalize_key(&issue_type_id.replace(',', "_"))?,
            file: None,
            message: None,
            line: UNSET,
            offset_start: UNSET,
            offset_end: UNSET,
        })
    }

    pub fn issue_type_key(&self) -> &str {
        &self.issue_type_key
    }

    /// Parse a `"<start>-<end>"` range. Both bounds are set together; on failure
    /// neither changes.
    pub fn set_offset(&mut self, range: &str) -> Result<(), CommonError> {
        let invalid = || CommonError::InvalidValue {
            field: "Offset",
            value: range.to_string(),
        };
        let (start, end) = range.trim().split_once('-').ok_or_else(invalid)?;
        let start = start.parse::<i64>().map_err(|_| invalid())?;
        let end = end.parse::<i64>().map_err(|_| invalid())?;
        self.offset_start = start;
        self.offset_end = end;
        Ok(())
    }

    pub fn set_line(&mut self, value: &str) -> Result<(), CommonError> {
        self.line = value.parse::<i64>().map_err(|_| CommonError::InvalidValue {
            field: "Line",
            value: value.to_string(),
        })?;
        Ok(())
    }
}

/// Host-neutral rule derived from an `IssueTypeDefinition`.
#[derive(Debug, Clone, Serialize)]
pub struct RuleDefinition {
    key: String,
    pub name: String,
    pub rule_type: RuleType,
    description: String,
    description_syntax: DescriptionSyntax,
    pub severity: RuleSeverity,
    status: RuleStatus,
    pub activated_by_default: bool,
    /// Category id of the source definition, matched by category overrides
    pub category_id: Option<String>,
}

impl RuleDefinition {
    /// Returns `None` when the key is blank.
    pub fn new(key: &str) -> Option<Self> {
        let key = normalize_key(key)?;
        Some(Self {
            name: key.clone(),
            key,
            rule_type: RuleType::default(),
            description: String::new(),
            description_syntax: DescriptionSyntax::default(),
            severity: RuleSeverity::default(),
            status: RuleStatus::default(),
            activated_by_default: false,
            category_id: None,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn description_syntax(&self) -> DescriptionSyntax {
        self.description_syntax
    }

    /// Text and syntax change together so a description never mixes markups.
    pub fn set_description(&mut self, text: &str, syntax: DescriptionSyntax) {
        self.description = text.trim().to_string();
        self.description_syntax = syntax;
    }

    pub fn status(&self) -> RuleStatus {
        self.status
    }

    pub fn set_status(&mut self, status: RuleStatus) -> Result<(), CommonError> {
        if status == RuleStatus::Removed {
            return Err(CommonError::RemovedRuleStatus);
        }
        self.status = status;
        Ok(())
    }
}

impl PartialEq for RuleDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for RuleDefinition {}

impl Hash for RuleDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// Replacement type and severity for a single rule key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleOverride {
    key: String,
    pub rule_type: RuleType,
    pub severity: RuleSeverity,
}

impl RuleOverride {
    pub fn new(key: &str) -> Option<Self> {
        Some(Self {
            key: normalize_key(key)?,
            rule_type: RuleType::default(),
            severity: RuleSeverity::default(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Replacement type and severity for every rule of one category id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryOverride {
    category_id: String,
    pub rule_type: RuleType,
    pub severity: RuleSeverity,
}

impl CategoryOverride {
    pub fn new(category_id: &str) -> Option<Self> {
        Some(Self {
            category_id: normalize_key(category_id)?,
            rule_type: RuleType::default(),
            severity: RuleSeverity::default(),
        })
    }

    pub fn category_id(&self) -> &str {
        &self.category_id
    }
}

/// Location of a finding: a line plus a character range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextRange {
    pub line: i64,
    pub start_offset: i64,
    pub end_offset: i64,
}

/// Host-neutral issue derived from an `IssueOccurrence`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportIssue {
    pub rule_key: String,
    pub file_path: String,
    pub message: String,
    pub range: TextRange,
}
