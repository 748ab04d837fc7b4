/// Streaming parsers for the inspection report and the rule override document.
///
/// Both parsers are explicit state machines: each markup event is fed to `step` together
/// with the current `State` and the output accumulator, and `step` returns the next
/// state. Records under construction live inside the state value, so a parser is
/// stateless between calls and can be exercised with synthetic event sequences.
///
/// Report layout:
///   `IssueType[Id, Category, CategoryId, SubCategory, Description, Severity, WikiUrl, Global]`
///   `Issues > Project[Name] > Issue[TypeId, File, Offset, Line, Message]`
///
/// Override layout:
///   `SonarRuleOverride[SonarRuleKey, SonarRuleType, SonarSeverity]`
///   `SonarCategoryOverride[CategoryId, SonarRuleType, SonarSeverity]`
use std::collections::HashSet;
use std::io::BufRead;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info_span, warn, Span};

use crate::convert::Converter;
use crate::error::CommonError;
use crate::model::{CategoryOverride, IssueOccurrence, IssueTypeDefinition, RuleOverride};
use crate::predicate::PredicateChain;
use crate::reader::{Element, MarkupEvent, MarkupReader, ParseDiagnostic};
use crate::severity::{IssueSeverity, RuleSeverity, RuleType};

const ISSUE_TYPE: &str = "IssueType";
const PROJECT: &str = "Project";
const ISSUE: &str = "Issue";
const RULE_OVERRIDE: &str = "SonarRuleOverride";
const CATEGORY_OVERRIDE: &str = "SonarCategoryOverride";

/// Containers and metadata elements that are walked through without building records.
const REPORT_PASSTHROUGH: &[&str] = &[
    "Report",
    "Information",
    "Solution",
    "InspectionScope",
    "Element",
    "IssueTypes",
    "Issues",
];
const OVERRIDE_PASSTHROUGH: &[&str] = &["RuleOverrides"];

/// One step of a markup-driven state machine.
pub trait EventHandler {
    type State: Default;
    type Output: Default;

    fn step(&self, state: Self::State, event: MarkupEvent, out: &mut Self::Output) -> Self::State;
}

/// Feed every event to `handler`, stopping at the first fatal error.
pub fn drive<H, I>(handler: &H, events: I) -> Result<H::Output, CommonError>
where
    H: EventHandler,
    I: IntoIterator<Item = Result<MarkupEvent, CommonError>>,
{
    let mut out = H::Output::default();
    let mut state = H::State::default();
    for event in events {
        state = handler.step(state, event?, &mut out);
    }
    Ok(out)
}

// --- Report ---

/// Position of the report parser within the document.
#[derive(Debug, Default)]
pub enum ParseState {
    #[default]
    Idle,
    /// Inside `IssueType`; `None` when the element carried no usable key.
    InDefinition(Option<IssueTypeDefinition>),
    /// Inside an accepted `Project`.
    InProject { name: String },
    /// Inside an `Issue` of an accepted project.
    InIssue {
        project: String,
        slot: Option<IssueOccurrence>,
    },
    /// Inside a `Project` whose name failed the scope filter.
    SkippingProject,
}

/// Occurrences accepted for one project, in document order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectIssues {
    pub name: String,
    pub issues: Vec<IssueOccurrence>,
}

#[derive(Debug, Default)]
pub struct ParsedReport {
    /// Accepted definitions in document order. The first accepted definition per key wins.
    pub definitions: Vec<IssueTypeDefinition>,
    pub projects: Vec<ProjectIssues>,
    pub diagnostics: Vec<ParseDiagnostic>,
    definition_keys: HashSet<String>,
}

impl ParsedReport {
    fn clear(&mut self) {
        self.definitions.clear();
        self.definition_keys.clear();
        self.projects.clear();
    }

    fn insert_definition(&mut self, definition: IssueTypeDefinition) -> bool {
        if !self.definition_keys.insert(definition.key().to_string()) {
            return false;
        }
        self.definitions.push(definition);
        true
    }

    /// Start a fresh group for `name`. A repeated name replaces the earlier group.
    fn open_project(&mut self, name: &str) {
        match self.projects.iter_mut().find(|p| p.name == name) {
            Some(project) => project.issues.clear(),
            None => self.projects.push(ProjectIssues {
                name: name.to_string(),
                issues: Vec::new(),
            }),
        }
    }

    fn push_issue(&mut self, project: &str, occurrence: IssueOccurrence) {
        if let Some(group) = self.projects.iter_mut().find(|p| p.name == project) {
            group.issues.push(occurrence);
        }
    }

    /// All accepted occurrences, project by project.
    pub fn issues(&self) -> impl Iterator<Item = &IssueOccurrence> {
        self.projects.iter().flat_map(|p| p.issues.iter())
    }

    pub fn issue_count(&self) -> usize {
        self.projects.iter().map(|p| p.issues.len()).sum()
    }

    pub fn convert_definitions<O, C>(&self, converter: &C) -> Vec<O>
    where
        O: Send,
        C: Converter<IssueTypeDefinition, O>,
    {
        converter.convert_all(Some(self.definitions.as_slice()))
    }

    pub fn convert_issues<O, C>(&self, converter: &C) -> Vec<O>
    where
        O: Send,
        C: Converter<IssueOccurrence, O>,
    {
        self.projects
            .par_iter()
            .flat_map_iter(|project| project.issues.iter())
            .filter_map(|occurrence| converter.convert(occurrence))
            .collect()
    }
}

/// Single-pass parser for inspection reports.
#[derive(Debug, Clone)]
pub struct ReportParser {
    definition_filter: PredicateChain<IssueTypeDefinition>,
    issue_filter: PredicateChain<IssueOccurrence>,
    project_filter: PredicateChain<String>,
    span: Span,
}

impl Default for ReportParser {
    fn default() -> Self {
        Self::new(
            PredicateChain::absent(),
            PredicateChain::absent(),
            PredicateChain::absent(),
        )
    }
}

impl ReportParser {
    pub fn new(
        definition_filter: PredicateChain<IssueTypeDefinition>,
        issue_filter: PredicateChain<IssueOccurrence>,
        project_filter: PredicateChain<String>,
    ) -> Self {
        Self {
            definition_filter,
            issue_filter,
            project_filter,
            span: info_span!("report_parser"),
        }
    }

    /// Emit every log event of this parser under `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn parse<R: BufRead>(&self, source: R) -> Result<ParsedReport, CommonError> {
        let _entered = self.span.enter();
        let mut reader = MarkupReader::new(source);
        let mut report = drive(self, reader.by_ref())?;
        report.diagnostics = reader.into_diagnostics();
        debug!(
            definitions = report.definitions.len(),
            projects = report.projects.len(),
            issues = report.issue_count(),
            "report parsed"
        );
        Ok(report)
    }

    /// Run the state machine over an already tokenized event sequence.
    pub fn parse_events<I>(&self, events: I) -> Result<ParsedReport, CommonError>
    where
        I: IntoIterator<Item = MarkupEvent>,
    {
        let _entered = self.span.enter();
        drive(self, events.into_iter().map(Ok))
    }

    fn build_definition(&self, element: &Element) -> Option<IssueTypeDefinition> {
        let Some(mut definition) = element.get("Id").and_then(IssueTypeDefinition::new) else {
            debug!("IssueType without Id dropped");
            return None;
        };
        for (name, value) in &element.attributes {
            match name.as_str() {
                "Id" => {}
                "Category" => definition.category = Some(value.clone()),
                "CategoryId" => definition.category_id = Some(value.clone()),
                "SubCategory" => definition.sub_category = Some(value.clone()),
                "Description" => definition.description = Some(value.clone()),
                "Severity" => definition.severity = IssueSeverity::from_value(Some(value.as_str())),
                "WikiUrl" => definition.set_wiki_url(value),
                "Global" => definition.set_global(value),
                other => debug!(attribute = other, key = definition.key(), "unrecognized IssueType attribute"),
            }
        }
        Some(definition)
    }

    fn build_occurrence(&self, element: &Element) -> Option<IssueOccurrence> {
        let Some(mut occurrence) = element.get("TypeId").and_then(IssueOccurrence::new) else {
            debug!("Issue without TypeId dropped");
            return None;
        };
        for (name, value) in &element.attributes {
            let result = match name.as_str() {
                "TypeId" => Ok(()),
                "File" => {
                    occurrence.file = Some(value.clone());
                    Ok(())
                }
                "Message" => {
                    occurrence.message = Some(value.clone());
                    Ok(())
                }
                "Offset" => occurrence.set_offset(value),
                "Line" => occurrence.set_line(value),
                other => {
                    debug!(attribute = other, key = occurrence.issue_type_key(), "unrecognized Issue attribute");
                    Ok(())
                }
            };
            if let Err(e) = result {
                warn!(error = %e, key = occurrence.issue_type_key(), "attribute left unset");
            }
        }
        Some(occurrence)
    }

    fn start(&self, state: ParseState, element: Element, out: &mut ParsedReport) -> ParseState {
        let name = element.name.trim();
        match (state, name) {
            (ParseState::SkippingProject, _) => ParseState::SkippingProject,
            (ParseState::Idle, ISSUE_TYPE) => {
                ParseState::InDefinition(self.build_definition(&element))
            }
            (ParseState::Idle, PROJECT) => {
                let project = element.get("Name").unwrap_or_default().trim().to_string();
                if !self.project_filter.test(&project) {
                    debug!(project = %project, "project skipped");
                    return ParseState::SkippingProject;
                }
                out.open_project(&project);
                ParseState::InProject { name: project }
            }
            (ParseState::InProject { name: project }, ISSUE) => ParseState::InIssue {
                slot: self.build_occurrence(&element),
                project,
            },
            (state, name) => {
                if !REPORT_PASSTHROUGH.contains(&name) {
                    debug!(element = name, "unhandled element");
                }
                state
            }
        }
    }

    fn end(&self, state: ParseState, name: &str, out: &mut ParsedReport) -> ParseState {
        match (state, name.trim()) {
            (ParseState::InDefinition(slot), ISSUE_TYPE) => {
                if self.definition_filter.test_slot(slot.as_ref()) {
                    if let Some(definition) = slot {
                        if !out.insert_definition(definition) {
                            debug!("duplicate IssueType ignored");
                        }
                    }
                }
                ParseState::Idle
            }
            (ParseState::InIssue { project, slot }, ISSUE) => {
                if self.issue_filter.test_slot(slot.as_ref()) {
                    if let Some(occurrence) = slot {
                        out.push_issue(&project, occurrence);
                    }
                }
                ParseState::InProject { name: project }
            }
            (ParseState::InProject { .. } | ParseState::SkippingProject, PROJECT) => {
                ParseState::Idle
            }
            (state, _) => state,
        }
    }
}

impl EventHandler for ReportParser {
    type State = ParseState;
    type Output = ParsedReport;

    fn step(&self, state: ParseState, event: MarkupEvent, out: &mut ParsedReport) -> ParseState {
        match event {
            MarkupEvent::StartDocument => {
                out.clear();
                ParseState::Idle
            }
            MarkupEvent::Start(element) => self.start(state, element, out),
            MarkupEvent::End { name, .. } => self.end(state, &name, out),
            MarkupEvent::EndDocument => ParseState::Idle,
        }
    }
}

// --- Overrides ---

#[derive(Debug, Default)]
pub enum OverrideState {
    #[default]
    Idle,
    InRule(Option<RuleOverride>),
    InCategory(Option<CategoryOverride>),
}

/// Override entries in document order. Duplicate keys are kept here and resolved when
/// the merge builds its lookups.
#[derive(Debug, Default)]
pub struct OverrideSet {
    pub rules: Vec<RuleOverride>,
    pub categories: Vec<CategoryOverride>,
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl OverrideSet {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.categories.is_empty()
    }
}

/// Single-pass parser for rule override documents.
#[derive(Debug, Clone)]
pub struct OverrideParser {
    span: Span,
}

impl Default for OverrideParser {
    fn default() -> Self {
        Self::new()
    }
}

impl OverrideParser {
    pub fn new() -> Self {
        Self {
            span: info_span!("override_parser"),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn parse<R: BufRead>(&self, source: R) -> Result<OverrideSet, CommonError> {
        let _entered = self.span.enter();
        let mut reader = MarkupReader::new(source);
        let mut overrides = drive(self, reader.by_ref())?;
        overrides.diagnostics = reader.into_diagnostics();
        debug!(
            rules = overrides.rules.len(),
            categories = overrides.categories.len(),
            "overrides parsed"
        );
        Ok(overrides)
    }

    pub fn parse_events<I>(&self, events: I) -> Result<OverrideSet, CommonError>
    where
        I: IntoIterator<Item = MarkupEvent>,
    {
        let _entered = self.span.enter();
        drive(self, events.into_iter().map(Ok))
    }

    fn patch(element: &Element, rule_type: &mut RuleType, severity: &mut RuleSeverity) {
        for (name, value) in &element.attributes {
            match name.as_str() {
                "SonarRuleKey" | "CategoryId" => {}
                "SonarRuleType" => *rule_type = RuleType::from_value(Some(value.as_str())),
                "SonarSeverity" => *severity = RuleSeverity::from_value(Some(value.as_str())),
                other => debug!(attribute = other, element = %element.name, "unrecognized override attribute"),
            }
        }
    }

    fn build_rule(element: &Element) -> Option<RuleOverride> {
        let mut rule = element.get("SonarRuleKey").and_then(RuleOverride::new)?;
        Self::patch(element, &mut rule.rule_type, &mut rule.severity);
        Some(rule)
    }

    fn build_category(element: &Element) -> Option<CategoryOverride> {
        let mut category = element.get("CategoryId").and_then(CategoryOverride::new)?;
        Self::patch(element, &mut category.rule_type, &mut category.severity);
        Some(category)
    }
}

impl EventHandler for OverrideParser {
    type State = OverrideState;
    type Output = OverrideSet;

    fn step(&self, state: OverrideState, event: MarkupEvent, out: &mut OverrideSet) -> OverrideState {
        match event {
            MarkupEvent::StartDocument => {
                out.rules.clear();
                out.categories.clear();
                OverrideState::Idle
            }
            MarkupEvent::Start(element) => match (state, element.name.trim()) {
                (OverrideState::Idle, RULE_OVERRIDE) => OverrideState::InRule(Self::build_rule(&element)),
                (OverrideState::Idle, CATEGORY_OVERRIDE) => {
                    OverrideState::InCategory(Self::build_category(&element))
                }
                (state, name) => {
                    if !OVERRIDE_PASSTHROUGH.contains(&name) {
                        debug!(element = name, "unhandled element");
                    }
                    state
                }
            },
            MarkupEvent::End { name, .. } => match (state, name.trim()) {
                (OverrideState::InRule(slot), RULE_OVERRIDE) => {
                    out.rules.extend(slot);
                    OverrideState::Idle
                }
                (OverrideState::InCategory(slot), CATEGORY_OVERRIDE) => {
                    out.categories.extend(slot);
                    OverrideState::Idle
                }
                (state, _) => state,
            },
            MarkupEvent::EndDocument => OverrideState::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{self, EmptyChain};
    use crate::convert::ReportIssueConverter;
    use crate::reader::ParseSeverity;

    const REPORT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Report ToolsVersion="2023.1">
  <Information>
    <Solution>Demo.sln</Solution>
    <InspectionScope><Element>Solution</Element></InspectionScope>
  </Information>
  <IssueTypes>
    <IssueType Id="CS001" Category="Compiler Warnings" CategoryId="CompilerWarnings" Description="x" Severity="ERROR" WikiUrl="https://example.com/CS001" Global="True"/>
    <IssueType Id="RedundantUsingDirective" Category="Redundancies in Code" CategoryId="CodeRedundancy" Description="Redundant using directive" Severity="WARNING"/>
    <IssueType Id="CS001" Category="Duplicate" Description="second" Severity="HINT"/>
  </IssueTypes>
  <Issues>
    <Project Name="P">
      <Issue TypeId="CS001" File="a.cs" Offset="5-9" Line="10" Message="m"/>
      <Issue TypeId="RedundantUsingDirective" File="b.cs" Offset="oops" Line="3" Message="Using directive is not required"/>
    </Project>
    <Project Name="Tests">
      <Issue TypeId="CS001" File="t.cs" Offset="1-2" Line="1" Message="in tests"/>
    </Project>
  </Issues>
</Report>"#;

    fn parse(parser: &ReportParser) -> ParsedReport {
        parser.parse(REPORT.as_bytes()).unwrap()
    }

    #[test]
    fn test_definitions_are_built_from_attributes() {
        let report = parse(&ReportParser::default());
        assert_eq!(report.definitions.len(), 2);
        let cs001 = &report.definitions[0];
        assert_eq!(cs001.key(), "CS001");
        assert_eq!(cs001.category.as_deref(), Some("Compiler Warnings"));
        assert_eq!(cs001.category_id.as_deref(), Some("CompilerWarnings"));
        assert_eq!(cs001.severity, IssueSeverity::Error);
        assert_eq!(cs001.wiki_url(), Some("https://example.com/CS001"));
        assert!(cs001.global);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_first_definition_per_key_wins() {
        let report = parse(&ReportParser::default());
        let cs001: Vec<_> = report.definitions.iter().filter(|d| d.key() == "CS001").collect();
        assert_eq!(cs001.len(), 1);
        assert_eq!(cs001[0].description.as_deref(), Some("x"));
    }

    #[test]
    fn test_issue_example_is_extracted() {
        let report = parse(&ReportParser::default());
        let first = report.issues().next().unwrap();
        assert_eq!(first.issue_type_key(), "CS001");
        assert_eq!(first.file.as_deref(), Some("a.cs"));
        assert_eq!(first.message.as_deref(), Some("m"));
        assert_eq!((first.line, first.offset_start, first.offset_end), (10, 5, 9));
    }

    #[test]
    fn test_malformed_offset_keeps_record() {
        let report = parse(&ReportParser::default());
        let redundant = report
            .issues()
            .find(|o| o.issue_type_key() == "RedundantUsingDirective")
            .unwrap();
        assert_eq!((redundant.offset_start, redundant.offset_end), (-1, -1));
        assert_eq!(redundant.line, 3);
        assert_eq!(report.issue_count(), 3);
    }

    #[test]
    fn test_failing_project_scope_yields_no_issues() {
        let parser = ReportParser::new(
            PredicateChain::absent(),
            PredicateChain::absent(),
            PredicateChain::new(vec![predicate::project_name_equals("p")]),
        );
        let report = parse(&parser);
        assert_eq!(report.projects.len(), 1);
        assert_eq!(report.projects[0].name, "P");
        assert!(report.issues().all(|o| o.file.as_deref() != Some("t.cs")));
        assert_eq!(report.issue_count(), 2);
    }

    #[test]
    fn test_occurrence_filter_is_applied() {
        let parser = ReportParser::new(
            PredicateChain::absent(),
            PredicateChain::new(vec![predicate::has_valid_offset(), predicate::has_valid_line_number()]),
            PredicateChain::absent(),
        );
        let report = parse(&parser);
        assert_eq!(report.issue_count(), 2);
        assert!(report.issues().all(|o| o.offset_start >= 0));
    }

    #[test]
    fn test_empty_definition_filter_follows_policy() {
        let rejecting = ReportParser::new(
            PredicateChain::new(vec![]),
            PredicateChain::absent(),
            PredicateChain::absent(),
        );
        assert!(parse(&rejecting).definitions.is_empty());

        let accepting = ReportParser::new(
            PredicateChain::new(vec![]).on_empty(EmptyChain::Accept),
            PredicateChain::absent(),
            PredicateChain::absent(),
        );
        assert_eq!(parse(&accepting).definitions.len(), 2);
    }

    #[test]
    fn test_rejected_first_definition_lets_later_one_in() {
        let parser = ReportParser::new(
            PredicateChain::new(vec![predicate::has_valid_severity()]),
            PredicateChain::absent(),
            PredicateChain::absent(),
        );
        let events = vec![
            MarkupEvent::StartDocument,
            MarkupEvent::Start(Element::new("IssueType").attr("Id", "CS9").attr("Severity", "DO_NOT_SHOW")),
            MarkupEvent::end("IssueType"),
            MarkupEvent::Start(Element::new("IssueType").attr("Id", "CS9").attr("Severity", "HINT")),
            MarkupEvent::end("IssueType"),
            MarkupEvent::EndDocument,
        ];
        let report = parser.parse_events(events).unwrap();
        assert_eq!(report.definitions.len(), 1);
        assert_eq!(report.definitions[0].severity, IssueSeverity::Hint);
    }

    #[test]
    fn test_synthetic_events_drive_state_machine() {
        let parser = ReportParser::default();
        let mut out = ParsedReport::default();
        let state = parser.step(ParseState::Idle, MarkupEvent::StartDocument, &mut out);
        let state = parser.step(state, MarkupEvent::Start(Element::new("Project").attr("Name", " Core ")), &mut out);
        assert!(matches!(&state, ParseState::InProject { name } if name == "Core"));
        let state = parser.step(
            state,
            MarkupEvent::Start(Element::new("Issue").attr("TypeId", "Foo,Bar").attr("Line", "x")),
            &mut out,
        );
        assert!(matches!(&state, ParseState::InIssue { slot: Some(_), .. }));
        let state = parser.step(state, MarkupEvent::end("Issue"), &mut out);
        let state = parser.step(state, MarkupEvent::end("Project"), &mut out);
        assert!(matches!(state, ParseState::Idle));
        let issue = out.issues().next().unwrap();
        assert_eq!(issue.issue_type_key(), "Foo_Bar");
        assert_eq!(issue.line, -1);
    }

    #[test]
    fn test_blank_keys_are_dropped() {
        let events = vec![
            MarkupEvent::StartDocument,
            MarkupEvent::Start(Element::new("IssueType").attr("Id", "  ")),
            MarkupEvent::end("IssueType"),
            MarkupEvent::Start(Element::new("Project").attr("Name", "P")),
            MarkupEvent::Start(Element::new("Issue").attr("File", "a.cs")),
            MarkupEvent::end("Issue"),
            MarkupEvent::end("Project"),
            MarkupEvent::EndDocument,
        ];
        let report = ReportParser::default().parse_events(events).unwrap();
        assert!(report.definitions.is_empty());
        assert_eq!(report.issue_count(), 0);
        assert_eq!(report.projects.len(), 1);
    }

    #[test]
    fn test_repeated_project_replaces_group() {
        let events = vec![
            MarkupEvent::StartDocument,
            MarkupEvent::Start(Element::new("Project").attr("Name", "P")),
            MarkupEvent::Start(Element::new("Issue").attr("TypeId", "A")),
            MarkupEvent::end("Issue"),
            MarkupEvent::end("Project"),
            MarkupEvent::Start(Element::new("Project").attr("Name", "P")),
            MarkupEvent::Start(Element::new("Issue").attr("TypeId", "B")),
            MarkupEvent::end("Issue"),
            MarkupEvent::end("Project"),
            MarkupEvent::EndDocument,
        ];
        let report = ReportParser::default().parse_events(events).unwrap();
        let keys: Vec<_> = report.issues().map(|o| o.issue_type_key()).collect();
        assert_eq!(keys, vec!["B"]);
    }

    #[test]
    fn test_fatal_markup_error_aborts() {
        let result = ReportParser::default().parse(r#"<Report><IssueTypes><IssueType Id="CS001"/>"#.as_bytes());
        assert!(matches!(result, Err(CommonError::Fatal { .. })));
    }

    #[test]
    fn test_recoverable_markup_error_is_recorded() {
        let xml = r#"<Report><IssueTypes><IssueType Id="CS001" Severity="ERROR"/></Bogus></IssueTypes></Report>"#;
        let report = ReportParser::default().parse(xml.as_bytes()).unwrap();
        assert_eq!(report.definitions.len(), 1);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].severity, ParseSeverity::Error);
    }

    #[test]
    fn test_document_level_markup_errors_are_fatal() {
        for xml in ["", "  \n  ", "<Report></Report><Report></Report>", "<Report/>trailing"] {
            let result = ReportParser::default().parse(xml.as_bytes());
            assert!(matches!(result, Err(CommonError::Fatal { .. })), "{xml:?}");
        }
        let result = OverrideParser::new().parse("<RuleOverrides/><RuleOverrides/>".as_bytes());
        assert!(matches!(result, Err(CommonError::Fatal { .. })));
    }

    #[test]
    fn test_issues_convert_in_document_order() {
        let report = parse(&ReportParser::default());
        let files: Vec<_> = report
            .convert_issues(&ReportIssueConverter)
            .into_iter()
            .map(|issue| issue.file_path)
            .collect();
        assert_eq!(files, vec!["a.cs", "b.cs", "t.cs"]);
    }

    #[test]
    fn test_override_document_is_parsed() {
        let xml = r#"<?xml version="1.0"?>
<RuleOverrides>
  <SonarRuleOverride SonarRuleKey="CS001" SonarRuleType="VULNERABILITY" SonarSeverity="BLOCKER"/>
  <SonarRuleOverride SonarRuleKey="CS002" SonarSeverity="minor"/>
  <SonarRuleOverride SonarRuleKey=" " SonarSeverity="minor"/>
  <SonarCategoryOverride CategoryId="CodeRedundancy" SonarRuleType="CODE_SMELL" SonarSeverity="INFO"/>
</RuleOverrides>"#;
        let overrides = OverrideParser::new().parse(xml.as_bytes()).unwrap();
        assert_eq!(overrides.rules.len(), 2);
        assert_eq!(overrides.rules[0].key(), "CS001");
        assert_eq!(overrides.rules[0].rule_type, RuleType::Vulnerability);
        assert_eq!(overrides.rules[0].severity, RuleSeverity::Blocker);
        assert_eq!(overrides.rules[1].rule_type, RuleType::CodeSmell);
        assert_eq!(overrides.rules[1].severity, RuleSeverity::Minor);
        assert_eq!(overrides.categories.len(), 1);
        assert_eq!(overrides.categories[0].category_id(), "CodeRedundancy");
        assert_eq!(overrides.categories[0].severity, RuleSeverity::Info);
    }

    #[test]
    fn test_empty_override_document() {
        let overrides = OverrideParser::new()
            .parse_events(vec![MarkupEvent::StartDocument, MarkupEvent::EndDocument])
            .unwrap();
        assert!(overrides.is_empty());
    }
}
