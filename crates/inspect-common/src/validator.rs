/// Structural validation of report and override documents.
///
/// Neither document declares a namespace, so events pass through a `NamespaceFilter`
/// that stamps `SCHEMA_NAMESPACE` on every element before the schema sees it. The
/// source stream is rewound after validation so the same stream can be parsed next.
use std::collections::HashMap;
use std::io::{BufRead, Seek, SeekFrom};

use tracing::{debug, error, info_span, Span};

use crate::error::CommonError;
use crate::reader::{MarkupEvent, MarkupReader, ParseSeverity};

/// Namespace shared by the bundled schemas.
pub const SCHEMA_NAMESPACE: &str = "urn:inspect-report:schema";

/// Allowed children and required attributes of one element.
#[derive(Debug, Clone, Copy)]
pub struct ElementRule {
    pub name: &'static str,
    pub children: &'static [&'static str],
    pub required_attributes: &'static [&'static str],
}

const REPORT_RULES: &[ElementRule] = &[
    ElementRule {
        name: "Report",
        children: &["Information", "IssueTypes", "Issues"],
        required_attributes: &[],
    },
    ElementRule {
        name: "Information",
        children: &["Solution", "InspectionScope"],
        required_attributes: &[],
    },
    ElementRule {
        name: "Solution",
        children: &[],
        required_attributes: &[],
    },
    ElementRule {
        name: "InspectionScope",
        children: &["Element"],
        required_attributes: &[],
    },
    ElementRule {
        name: "Element",
        children: &[],
        required_attributes: &[],
    },
    ElementRule {
        name: "IssueTypes",
        children: &["IssueType"],
        required_attributes: &[],
    },
    ElementRule {
        name: "IssueType",
        children: &[],
        required_attributes: &["Id"],
    },
    ElementRule {
        name: "Issues",
        children: &["Project"],
        required_attributes: &[],
    },
    ElementRule {
        name: "Project",
        children: &["Issue"],
        required_attributes: &["Name"],
    },
    ElementRule {
        name: "Issue",
        children: &[],
        required_attributes: &["TypeId", "File", "Message"],
    },
];

const OVERRIDE_RULES: &[ElementRule] = &[
    ElementRule {
        name: "RuleOverrides",
        children: &["SonarRuleOverride", "SonarCategoryOverride"],
        required_attributes: &[],
    },
    ElementRule {
        name: "SonarRuleOverride",
        children: &[],
        required_attributes: &["SonarRuleKey"],
    },
    ElementRule {
        name: "SonarCategoryOverride",
        children: &[],
        required_attributes: &["CategoryId"],
    },
];

#[derive(Debug, Clone)]
pub struct Schema {
    namespace: &'static str,
    root: &'static str,
    rules: HashMap<&'static str, ElementRule>,
}

impl Schema {
    pub fn new(namespace: &'static str, root: &'static str, rules: &[ElementRule]) -> Self {
        Self {
            namespace,
            root,
            rules: rules.iter().map(|r| (r.name, *r)).collect(),
        }
    }

    pub fn report() -> Self {
        Self::new(SCHEMA_NAMESPACE, "Report", REPORT_RULES)
    }

    pub fn overrides() -> Self {
        Self::new(SCHEMA_NAMESPACE, "RuleOverrides", OVERRIDE_RULES)
    }

    /// Check a stream of namespaced events against this schema.
    fn check<I>(&self, events: I) -> Result<(), CommonError>
    where
        I: IntoIterator<Item = Result<MarkupEvent, CommonError>>,
    {
        let invalid = |message: String| Err(CommonError::Validation(message));
        let mut open: Vec<&ElementRule> = Vec::new();
        let mut seen_root = false;

        for event in events {
            match event? {
                MarkupEvent::Start(element) => {
                    if element.namespace.as_deref() != Some(self.namespace) {
                        return invalid(format!(
                            "<{}> is not in namespace {}",
                            element.name, self.namespace
                        ));
                    }
                    match open.last() {
                        None if seen_root => {
                            return invalid(format!("second root element <{}>", element.name));
                        }
                        None if element.name != self.root => {
                            return invalid(format!(
                                "root element <{}>, expected <{}>",
                                element.name, self.root
                            ));
                        }
                        Some(parent) if !parent.children.contains(&element.name.as_str()) => {
                            return invalid(format!(
                                "<{}> is not allowed inside <{}>",
                                element.name, parent.name
                            ));
                        }
                        _ => {}
                    }
                    let Some(rule) = self.rules.get(element.name.as_str()) else {
                        return invalid(format!("undeclared element <{}>", element.name));
                    };
                    if let Some(missing) = rule
                        .required_attributes
                        .iter()
                        .find(|name| element.get(name).is_none())
                    {
                        return invalid(format!("<{}> is missing attribute {missing}", element.name));
                    }
                    seen_root = true;
                    open.push(rule);
                }
                MarkupEvent::End { .. } => {
                    open.pop();
                }
                MarkupEvent::StartDocument | MarkupEvent::EndDocument => {}
            }
        }

        if !seen_root {
            return invalid(format!("missing root element <{}>", self.root));
        }
        Ok(())
    }
}

/// Stamps a fixed namespace on every element event that lacks it.
pub struct NamespaceFilter<I> {
    inner: I,
    namespace: &'static str,
}

impl<I> NamespaceFilter<I> {
    pub fn new(inner: I, namespace: &'static str) -> Self {
        Self { inner, namespace }
    }

    fn stamp(&self, namespace: &mut Option<String>) {
        if namespace.as_deref().map(str::trim) != Some(self.namespace) {
            *namespace = Some(self.namespace.to_string());
        }
    }
}

impl<I> Iterator for NamespaceFilter<I>
where
    I: Iterator<Item = Result<MarkupEvent, CommonError>>,
{
    type Item = Result<MarkupEvent, CommonError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut event = self.inner.next()?;
        match &mut event {
            Ok(MarkupEvent::Start(element)) => self.stamp(&mut element.namespace),
            Ok(MarkupEvent::End { namespace, .. }) => self.stamp(namespace),
            _ => {}
        }
        Some(event)
    }
}

/// Yes/no gate run over a document before it is parsed.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    schema: Schema,
    span: Span,
}

impl SchemaValidator {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            span: info_span!("schema_validator"),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Validate `source` and rewind it to where validation started.
    /// A stream that cannot report or restore its position fails validation.
    pub fn validate<R: BufRead + Seek>(&self, source: &mut R) -> bool {
        let _entered = self.span.enter();
        let mark = match source.stream_position() {
            Ok(mark) => mark,
            Err(e) => {
                error!(error = %e, "cannot mark stream position for validation");
                return false;
            }
        };

        let outcome = self.check(&mut *source);

        if let Err(e) = source.seek(SeekFrom::Start(mark)) {
            error!(error = %e, "cannot reset stream after validation");
            return false;
        }
        match outcome {
            Ok(()) => {
                debug!("document is valid");
                true
            }
            Err(e) => {
                error!(error = %e, "document failed schema validation");
                false
            }
        }
    }

    /// Validate without rewinding. Markup errors that the parser would recover from
    /// still fail validation.
    pub fn check<R: BufRead>(&self, source: R) -> Result<(), CommonError> {
        let mut reader = MarkupReader::new(source);
        self.schema
            .check(NamespaceFilter::new(reader.by_ref(), self.schema.namespace))?;
        match reader
            .diagnostics()
            .iter()
            .find(|d| d.severity == ParseSeverity::Error)
        {
            Some(d) => Err(CommonError::Validation(d.message.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use super::*;
    use crate::reader::Element;

    const REPORT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Report>
  <Information><Solution>Demo.sln</Solution></Information>
  <IssueTypes><IssueType Id="CS001" Severity="ERROR"/></IssueTypes>
  <Issues>
    <Project Name="P"><Issue TypeId="CS001" File="a.cs" Offset="5-9" Line="10" Message="m"/></Project>
  </Issues>
</Report>"#;

    #[test]
    fn test_valid_report_passes_and_stream_is_rewound() {
        let mut cursor = Cursor::new(REPORT.as_bytes());
        let validator = SchemaValidator::new(Schema::report());
        assert!(validator.validate(&mut cursor));
        assert_eq!(cursor.position(), 0);
        let mut rest = String::new();
        cursor.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, REPORT);
    }

    #[test]
    fn test_rewind_returns_to_mark_even_when_invalid() {
        let mark = REPORT.find("<IssueTypes>").unwrap() as u64;
        let mut cursor = Cursor::new(REPORT.as_bytes());
        cursor.set_position(mark);
        let validator = SchemaValidator::new(Schema::report());
        assert!(!validator.validate(&mut cursor));
        assert_eq!(cursor.position(), mark);
    }

    fn bare_override_events() -> Vec<Result<MarkupEvent, CommonError>> {
        vec![
            Ok(MarkupEvent::StartDocument),
            Ok(MarkupEvent::Start(Element::new("RuleOverrides"))),
            Ok(MarkupEvent::end("RuleOverrides")),
            Ok(MarkupEvent::EndDocument),
        ]
    }

    #[test]
    fn test_namespace_is_injected() {
        let schema = Schema::overrides();
        assert!(schema.check(bare_override_events()).is_err());
        let stamped: Vec<_> =
            NamespaceFilter::new(bare_override_events().into_iter(), SCHEMA_NAMESPACE).collect();
        assert!(matches!(
            &stamped[1],
            Ok(MarkupEvent::Start(e)) if e.namespace.as_deref() == Some(SCHEMA_NAMESPACE)
        ));
        assert!(schema.check(stamped).is_ok());
    }

    #[test]
    fn test_foreign_namespace_is_replaced() {
        let mut element = Element::new("RuleOverrides");
        element.namespace = Some("urn:other".to_string());
        let events = vec![Ok(MarkupEvent::Start(element)), Ok(MarkupEvent::end("RuleOverrides"))];
        let stamped: Vec<_> = NamespaceFilter::new(events.into_iter(), SCHEMA_NAMESPACE).collect();
        assert!(Schema::overrides().check(stamped).is_ok());
    }

    #[test]
    fn test_structural_violations_fail() {
        let validator = SchemaValidator::new(Schema::report());
        let missing_id = r#"<Report><IssueTypes><IssueType Severity="ERROR"/></IssueTypes></Report>"#;
        assert!(!validator.validate(&mut Cursor::new(missing_id.as_bytes())));
        let misplaced = r#"<Report><Issue TypeId="A" File="a.cs" Message="m"/></Report>"#;
        assert!(!validator.validate(&mut Cursor::new(misplaced.as_bytes())));
        let wrong_root = r#"<RuleOverrides/>"#;
        assert!(!validator.validate(&mut Cursor::new(wrong_root.as_bytes())));
        let truncated = r#"<Report><Issues>"#;
        assert!(!validator.validate(&mut Cursor::new(truncated.as_bytes())));
        assert!(!validator.validate(&mut Cursor::new("".as_bytes())));
    }

    #[test]
    fn test_override_document_validates() {
        let xml = r#"<RuleOverrides>
  <SonarRuleOverride SonarRuleKey="CS001" SonarSeverity="BLOCKER"/>
  <SonarCategoryOverride CategoryId="CodeRedundancy" SonarSeverity="INFO"/>
</RuleOverrides>"#;
        let validator = SchemaValidator::new(Schema::overrides());
        assert!(validator.validate(&mut Cursor::new(xml.as_bytes())));
        let missing_key = r#"<RuleOverrides><SonarRuleOverride SonarSeverity="INFO"/></RuleOverrides>"#;
        assert!(validator.check(missing_key.as_bytes()).is_err());
    }

    struct Unseekable<'a>(&'a [u8]);

    impl Read for Unseekable<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.0.read(buf)
        }
    }

    impl BufRead for Unseekable<'_> {
        fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
            Ok(self.0)
        }

        fn consume(&mut self, amt: usize) {
            self.0 = &self.0[amt..];
        }
    }

    impl Seek for Unseekable<'_> {
        fn seek(&mut self, _: SeekFrom) -> std::io::Result<u64> {
            Err(std::io::Error::new(std::io::ErrorKind::Unsupported, "no seek"))
        }
    }

    #[test]
    fn test_stream_without_reset_fails_validation() {
        let mut source = Unseekable(REPORT.as_bytes());
        assert!(!SchemaValidator::new(Schema::report()).validate(&mut source));
    }
}
