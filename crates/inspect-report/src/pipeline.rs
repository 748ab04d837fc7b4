/// Report pipeline: parse the report and the override document, convert, merge, and
/// assemble the JSON result.
///
/// The two documents are parsed on separate blocking tasks. A document that cannot be
/// opened, or that fails schema validation, contributes an empty result and an error
/// log; only a fatal markup error aborts the run.
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek};
use std::path::Path;

use inspect_common::convert::{ReportIssueConverter, RuleDefinitionConverter};
use inspect_common::model::{IssueTypeDefinition, ReportIssue, RuleDefinition};
use inspect_common::overrides::{MergeSummary, OverrideMerger};
use inspect_common::parser::{OverrideParser, OverrideSet, ParsedReport, ReportParser};
use inspect_common::predicate::{self, PredicateChain};
use inspect_common::validator::{Schema, SchemaValidator};
use serde::Serialize;
use tracing::{debug, error, info, info_span};

use crate::config::{Config, Language, OverrideSource};
use crate::error::AppError;

/// Override document used when none is configured or found in the working directory.
pub const BUNDLED_OVERRIDES: &str = include_str!("../resources/sonarqube_rule_overrides.xml");

#[derive(Debug, Default, Serialize)]
pub struct Summary {
    pub definitions: usize,
    pub rules: usize,
    pub projects: usize,
    pub issues_parsed: usize,
    pub issues_kept: usize,
    pub issues_skipped: usize,
    pub diagnostics: usize,
    pub overrides: MergeSummary,
}

#[derive(Debug, Default, Serialize)]
pub struct PipelineOutput {
    pub rules: Vec<RuleDefinition>,
    pub issues: Vec<ReportIssue>,
    pub summary: Summary,
}

pub struct PipelineService {
    config: Config,
}

impl PipelineService {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn definition_filter(&self) -> PredicateChain<IssueTypeDefinition> {
        let predicates = match self.config.language {
            Language::CSharp => predicate::csharp_definition_filters(),
            Language::VisualBasic => predicate::visual_basic_definition_filters(),
        };
        PredicateChain::new(predicates).on_empty(self.config.empty_filter)
    }

    fn report_parser(&self) -> ReportParser {
        let project_filter = match &self.config.project_name {
            Some(name) => PredicateChain::new(vec![predicate::project_name_equals(name)])
                .on_empty(self.config.empty_filter),
            None => PredicateChain::new(vec![predicate::has_non_empty_name()]),
        };
        ReportParser::new(
            self.definition_filter(),
            PredicateChain::new(predicate::occurrence_filters()).on_empty(self.config.empty_filter),
            project_filter,
        )
        .with_span(info_span!("report", path = %self.config.report_path.display()))
    }

    /// Run the whole pipeline once.
    pub async fn run(&self) -> Result<PipelineOutput, AppError> {
        let validate = self.config.validate;

        let parser = self.report_parser();
        let report_path = self.config.report_path.clone();
        let report_task =
            tokio::task::spawn_blocking(move || load_report(&parser, &report_path, validate));

        let source = self.config.overrides.clone();
        let override_task = tokio::task::spawn_blocking(move || load_overrides(&source, validate));

        let (report, overrides) = futures::future::try_join(report_task, override_task)
            .await
            .map_err(|e| AppError::Task(format!("spawn_blocking join error: {e}")))?;
        let report = report?;
        let overrides = overrides?;

        Ok(assemble(&report, &overrides))
    }
}

/// Convert, merge and cross-check the parsed documents.
fn assemble(report: &ParsedReport, overrides: &OverrideSet) -> PipelineOutput {
    let mut rules = report.convert_definitions(&RuleDefinitionConverter);
    rules.sort_by(|a, b| a.key().cmp(b.key()));

    let merger = OverrideMerger::new();
    let merge = merger.apply(&mut rules, overrides);

    let active: HashSet<&str> = rules.iter().map(RuleDefinition::key).collect();
    let converted = report.convert_issues(&ReportIssueConverter);
    let issues_parsed = converted.len();
    let issues: Vec<ReportIssue> = converted
        .into_iter()
        .filter(|issue| {
            let known = active.contains(issue.rule_key.as_str());
            if !known {
                debug!(
                    rule_key = %issue.rule_key,
                    file = %issue.file_path,
                    line = issue.range.line,
                    "issue skipped: rule is not active"
                );
            }
            known
        })
        .collect();

    let summary = Summary {
        definitions: report.definitions.len(),
        rules: rules.len(),
        projects: report.projects.len(),
        issues_parsed,
        issues_kept: issues.len(),
        issues_skipped: issues_parsed - issues.len(),
        diagnostics: report.diagnostics.len() + overrides.diagnostics.len(),
        overrides: merge,
    };
    info!(
        rules = summary.rules,
        issues = summary.issues_kept,
        skipped = summary.issues_skipped,
        "report processed"
    );

    PipelineOutput {
        rules,
        issues,
        summary,
    }
}

fn open(path: &Path, document: &str) -> Option<BufReader<File>> {
    match File::open(path) {
        Ok(file) => Some(BufReader::new(file)),
        Err(e) => {
            error!(path = %path.display(), error = %e, "{document} could not be opened, continuing without it");
            None
        }
    }
}

/// Run the schema gate when enabled. The reader is rewound either way.
fn passes_gate<R: BufRead + Seek>(reader: &mut R, schema: Schema, validate: bool, document: &str) -> bool {
    if !validate {
        return true;
    }
    let valid = SchemaValidator::new(schema).validate(reader);
    if !valid {
        error!("{document} failed schema validation, continuing without it");
    }
    valid
}

fn load_report(parser: &ReportParser, path: &Path, validate: bool) -> Result<ParsedReport, AppError> {
    let Some(mut reader) = open(path, "report") else {
        return Ok(ParsedReport::default());
    };
    if !passes_gate(&mut reader, Schema::report(), validate, "report") {
        return Ok(ParsedReport::default());
    }
    Ok(parser.parse(reader)?)
}

fn load_overrides(source: &OverrideSource, validate: bool) -> Result<OverrideSet, AppError> {
    match source {
        OverrideSource::File(path) => {
            let Some(mut reader) = open(path, "override document") else {
                return Ok(OverrideSet::default());
            };
            if !passes_gate(&mut reader, Schema::overrides(), validate, "override document") {
                return Ok(OverrideSet::default());
            }
            let parser = OverrideParser::new().with_span(info_span!("overrides", path = %path.display()));
            Ok(parser.parse(reader)?)
        }
        OverrideSource::Bundled => {
            let mut reader = Cursor::new(BUNDLED_OVERRIDES.as_bytes());
            if !passes_gate(&mut reader, Schema::overrides(), validate, "bundled override document") {
                return Ok(OverrideSet::default());
            }
            let parser = OverrideParser::new().with_span(info_span!("overrides", path = "bundled"));
            Ok(parser.parse(reader)?)
        }
    }
}
