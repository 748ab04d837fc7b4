/// Forward-only markup event stream over `quick-xml`.
///
/// Raw reader events are reduced to the four kinds the parsers act on: document start,
/// element start (with decoded attributes), element end and document end. Problems the
/// reader can step over are recorded as `ParseDiagnostic`s; anything else ends the
/// stream with `CommonError::Fatal`. A document must hold exactly one root element with
/// nothing but markup around it.
use std::fmt;
use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use tracing::{error, warn};

use crate::error::CommonError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseSeverity {
    Warning,
    Error,
    Fatal,
}

/// A markup problem together with the byte position it was detected at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseDiagnostic {
    pub severity: ParseSeverity,
    pub position: u64,
    pub message: String,
}

impl ParseDiagnostic {
    fn log(&self) {
        match self.severity {
            ParseSeverity::Warning => {
                warn!(position = self.position, message = %self.message, "markup warning")
            }
            ParseSeverity::Error | ParseSeverity::Fatal => {
                error!(position = self.position, severity = %self.severity, message = %self.message, "markup error")
            }
        }
    }
}

impl fmt::Display for ParseSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ParseSeverity::Warning => "warning",
            ParseSeverity::Error => "error",
            ParseSeverity::Fatal => "fatal",
        })
    }
}

/// An opening tag with its attributes in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub namespace: Option<String>,
    pub attributes: Vec<(String, String)>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            attributes: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// First value of the named attribute.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupEvent {
    StartDocument,
    Start(Element),
    End {
        name: String,
        namespace: Option<String>,
    },
    EndDocument,
}

impl MarkupEvent {
    pub fn end(name: impl Into<String>) -> Self {
        MarkupEvent::End {
            name: name.into(),
            namespace: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Fresh,
    Body,
    Done,
}

/// Iterator of `MarkupEvent`s read from a buffered byte stream.
pub struct MarkupReader<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    open: Vec<String>,
    phase: Phase,
    root_seen: bool,
    diagnostics: Vec<ParseDiagnostic>,
}

impl<R: BufRead> MarkupReader<R> {
    pub fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        let config = reader.config_mut();
        config.expand_empty_elements = true;
        // End tags are matched against `open` so a stray one is recoverable.
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.trim_text(true);
        Self {
            reader,
            buf: Vec::new(),
            open: Vec::new(),
            phase: Phase::Fresh,
            root_seen: false,
            diagnostics: Vec::new(),
        }
    }

    /// Non-fatal problems recorded so far.
    pub fn diagnostics(&self) -> &[ParseDiagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<ParseDiagnostic> {
        self.diagnostics
    }

    fn record(&mut self, severity: ParseSeverity, message: String) {
        let diagnostic = ParseDiagnostic {
            severity,
            position: self.reader.buffer_position(),
            message,
        };
        diagnostic.log();
        self.diagnostics.push(diagnostic);
    }

    fn fatal(&mut self, message: String) -> CommonError {
        self.phase = Phase::Done;
        let diagnostic = ParseDiagnostic {
            severity: ParseSeverity::Fatal,
            position: self.reader.buffer_position(),
            message,
        };
        diagnostic.log();
        CommonError::Fatal {
            position: diagnostic.position,
            message: diagnostic.message,
        }
    }

    fn element(&mut self, start: &BytesStart<'_>) -> Element {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut element = Element::new(name);
        let mut problems = Vec::new();
        for attribute in start.attributes() {
            let attribute = match attribute {
                Ok(a) => a,
                Err(e) => {
                    problems.push((
                        ParseSeverity::Error,
                        format!("malformed attribute on <{}>: {e}", element.name),
                    ));
                    continue;
                }
            };
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = match attribute.unescape_value() {
                Ok(v) => v.into_owned(),
                Err(e) => {
                    problems.push((
                        ParseSeverity::Warning,
                        format!("attribute {key} on <{}> kept unescaped: {e}", element.name),
                    ));
                    String::from_utf8_lossy(&attribute.value).into_owned()
                }
            };
            element.attributes.push((key, value));
        }
        for (severity, message) in problems {
            self.record(severity, message);
        }
        element
    }

    fn read_next(&mut self) -> Result<Option<MarkupEvent>, CommonError> {
        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event.into_owned(),
                Err(e) => return Err(self.fatal(e.to_string())),
            };
            match event {
                Event::Start(start) => {
                    if self.root_seen && self.open.is_empty() {
                        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                        return Err(self.fatal(format!("element <{name}> follows the root element")));
                    }
                    self.root_seen = true;
                    let element = self.element(&start);
                    self.open.push(element.name.clone());
                    return Ok(Some(MarkupEvent::Start(element)));
                }
                Event::End(end) => {
                    let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                    match self.open.iter().rposition(|open| *open == name) {
                        Some(index) => {
                            let skipped = self.open.split_off(index + 1);
                            self.open.pop();
                            if !skipped.is_empty() {
                                self.record(
                                    ParseSeverity::Error,
                                    format!("</{name}> closes unterminated {}", skipped.join(", ")),
                                );
                            }
                            return Ok(Some(MarkupEvent::end(name)));
                        }
                        None => {
                            self.record(
                                ParseSeverity::Error,
                                format!("end tag </{name}> has no matching start tag"),
                            );
                        }
                    }
                }
                Event::Text(text) if self.open.is_empty() => {
                    let position = if self.root_seen { "after" } else { "before" };
                    let text = String::from_utf8_lossy(&text).trim().to_string();
                    if !text.is_empty() {
                        return Err(self.fatal(format!("text {text:?} {position} the root element")));
                    }
                }
                Event::Eof => {
                    if !self.root_seen {
                        return Err(self.fatal("document has no root element".to_string()));
                    }
                    if !self.open.is_empty() {
                        let open = self.open.join(", ");
                        return Err(self.fatal(format!("unexpected end of document inside {open}")));
                    }
                    self.phase = Phase::Done;
                    return Ok(Some(MarkupEvent::EndDocument));
                }
                // Text, comments, declarations and processing instructions carry nothing
                // the parsers read.
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for MarkupReader<R> {
    type Item = Result<MarkupEvent, CommonError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.phase {
            Phase::Fresh => {
                self.phase = Phase::Body;
                Some(Ok(MarkupEvent::StartDocument))
            }
            Phase::Body => self.read_next().transpose(),
            Phase::Done => None,
        }
    }
}
