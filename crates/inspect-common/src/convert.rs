/// Converters from report records to host-neutral rules and issues.
///
/// A converter is a pure mapping of one record to at most one output. The batch form
/// runs on the rayon pool and makes no ordering promise.
use rayon::prelude::*;

use crate::model::{IssueOccurrence, IssueTypeDefinition, ReportIssue, RuleDefinition, TextRange};
use crate::severity::{DescriptionSyntax, RuleStatus};

/// Description used when an issue type carries none.
pub const MISSING_DESCRIPTION: &str = "(this rule does not provide a description)";

pub trait Converter<I, O>: Send + Sync
where
    I: Sync,
    O: Send,
{
    /// Map a single record. `None` means the record has no representation.
    fn convert(&self, input: &I) -> Option<O>;

    /// An absent input maps to an absent output.
    fn convert_opt(&self, input: Option<&I>) -> Option<O> {
        input.and_then(|i| self.convert(i))
    }

    /// Convert a batch in parallel, keeping only successful outputs.
    /// An absent or empty batch yields an empty vector.
    fn convert_all(&self, inputs: Option<&[I]>) -> Vec<O> {
        match inputs {
            Some(inputs) if !inputs.is_empty() => inputs
                .par_iter()
                .filter_map(|input| self.convert(input))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Builds a `RuleDefinition` from an accepted issue type.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleDefinitionConverter;

impl RuleDefinitionConverter {
    fn describe(definition: &IssueTypeDefinition) -> String {
        let text = definition
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(escape_html)
            .unwrap_or_else(|| MISSING_DESCRIPTION.to_string());

        match definition.wiki_url() {
            Some(url) => {
                let url = escape_html(url);
                format!("{text}<br /><a href=\"{url}\">{url}</a>")
            }
            None => text,
        }
    }
}

impl Converter<IssueTypeDefinition, RuleDefinition> for RuleDefinitionConverter {
    fn convert(&self, definition: &IssueTypeDefinition) -> Option<RuleDefinition> {
        let mut rule = RuleDefinition::new(definition.key())?;
        rule.set_description(&Self::describe(definition), DescriptionSyntax::Html);
        rule.severity = definition.severity.rule_severity();
        rule.rule_type = definition.severity.rule_type();
        rule.activated_by_default = false;
        rule.category_id = definition
            .category_id
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        rule.set_status(RuleStatus::Ready).ok()?;
        Some(rule)
    }
}

/// Builds a `ReportIssue` from an accepted occurrence.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportIssueConverter;

impl Converter<IssueOccurrence, ReportIssue> for ReportIssueConverter {
    fn convert(&self, occurrence: &IssueOccurrence) -> Option<ReportIssue> {
        let trimmed = |value: &Option<String>| {
            value.as_deref().map(str::trim).unwrap_or_default().to_string()
        };
        Some(ReportIssue {
            rule_key: occurrence.issue_type_key().to_string(),
            file_path: trimmed(&occurrence.file),
            message: trimmed(&occurrence.message),
            range: TextRange {
                line: occurrence.line,
                start_offset: occurrence.offset_start,
                end_offset: occurrence.offset_end,
            },
        })
    }
}

/// Escape the five characters with special meaning in HTML text and attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
