/// Applies parsed override documents to converted rule definitions.
///
/// Two ordered passes: category overrides first, then rule overrides. A rule matched
/// by both ends with the rule override's values. Duplicate keys inside one override
/// document resolve last-wins.
use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, info_span, Span};

use crate::model::{CategoryOverride, RuleDefinition, RuleOverride};
use crate::parser::OverrideSet;

/// Counts of definitions touched by each pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub category_matches: usize,
    pub rule_matches: usize,
    /// Rule overrides whose key matched no definition.
    pub unused_rule_overrides: usize,
}

#[derive(Debug, Clone)]
pub struct OverrideMerger {
    span: Span,
}

impl Default for OverrideMerger {
    fn default() -> Self {
        Self::new()
    }
}

impl OverrideMerger {
    pub fn new() -> Self {
        Self {
            span: info_span!("override_merge"),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Patch severity and type of `rules` in place.
    pub fn apply(&self, rules: &mut [RuleDefinition], overrides: &OverrideSet) -> MergeSummary {
        let _entered = self.span.enter();
        let mut summary = MergeSummary::default();
        if rules.is_empty() || overrides.is_empty() {
            return summary;
        }

        let categories = category_lookup(&overrides.categories);
        if !categories.is_empty() {
            for rule in rules.iter_mut() {
                let Some(category) = rule.category_id.as_deref().and_then(|id| categories.get(id))
                else {
                    continue;
                };
                rule.severity = category.severity;
                rule.rule_type = category.rule_type;
                summary.category_matches += 1;
            }
        }

        let mut pending = rule_lookup(&overrides.rules);
        for rule in rules.iter_mut() {
            if pending.is_empty() {
                break;
            }
            if let Some(rule_override) = pending.remove(rule.key()) {
                rule.severity = rule_override.severity;
                rule.rule_type = rule_override.rule_type;
                summary.rule_matches += 1;
            }
        }
        summary.unused_rule_overrides = pending.len();
        if !pending.is_empty() {
            debug!(keys = ?pending.keys().collect::<Vec<_>>(), "rule overrides matched no definition");
        }

        info!(
            category_matches = summary.category_matches,
            rule_matches = summary.rule_matches,
            "overrides applied"
        );
        summary
    }
}

fn category_lookup(categories: &[CategoryOverride]) -> HashMap<&str, &CategoryOverride> {
    let mut lookup = HashMap::with_capacity(categories.len());
    for category in categories {
        if lookup.insert(category.category_id(), category).is_some() {
            debug!(category_id = category.category_id(), "category override replaced");
        }
    }
    lookup
}

fn rule_lookup(rules: &[RuleOverride]) -> HashMap<&str, &RuleOverride> {
    let mut lookup = HashMap::with_capacity(rules.len());
    for rule in rules {
        if lookup.insert(rule.key(), rule).is_some() {
            debug!(key = rule.key(), "rule override replaced");
        }
    }
    lookup
}
