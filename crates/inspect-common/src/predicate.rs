/// Acceptance predicates over single records and their AND-composition.
///
/// Factories return stateless, shareable predicates. A `PredicateChain` evaluates its
/// predicates left to right and stops at the first rejection. Whether a chain with no
/// predicates accepts or rejects is an explicit `EmptyChain` policy; an absent chain
/// always accepts.
use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::model::{IssueOccurrence, IssueTypeDefinition};
use crate::severity::IssueSeverity;

/// A pure acceptance test over one record.
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Category reported for JavaScript strict-mode findings of web projects.
const WEB_RELATED_CATEGORY: &str = "JsStrictModeErrors";

/// Wrap a closure as a `Predicate`.
pub fn predicate<T, F>(f: F) -> Predicate<T>
where
    T: 'static,
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Logical negation of an existing predicate.
pub fn not<T: 'static>(inner: Predicate<T>) -> Predicate<T> {
    predicate(move |record: &T| !inner(record))
}

/// Logical AND of the given predicates, short-circuiting left to right.
/// An empty list accepts everything.
pub fn and<T: 'static>(predicates: Vec<Predicate<T>>) -> Predicate<T> {
    predicate(move |record: &T| predicates.iter().all(|p| p(record)))
}

/// Outcome of evaluating a chain that holds no predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyChain {
    Accept,
    #[default]
    Reject,
}

/// An ordered collection of predicates combined by logical AND.
pub struct PredicateChain<T> {
    predicates: Option<Vec<Predicate<T>>>,
    on_empty: EmptyChain,
}

impl<T> PredicateChain<T> {
    /// A chain that was never configured. It accepts every record.
    pub fn absent() -> Self {
        Self {
            predicates: None,
            on_empty: EmptyChain::Accept,
        }
    }

    /// A configured chain. Zero predicates resolve to the default `EmptyChain::Reject`.
    pub fn new(predicates: Vec<Predicate<T>>) -> Self {
        Self {
            predicates: Some(predicates),
            on_empty: EmptyChain::default(),
        }
    }

    pub fn on_empty(mut self, policy: EmptyChain) -> Self {
        self.on_empty = policy;
        self
    }

    pub fn push(&mut self, predicate: Predicate<T>) {
        self.predicates.get_or_insert_with(Vec::new).push(predicate);
    }

    pub fn test(&self, record: &T) -> bool {
        match &self.predicates {
            None => true,
            Some(predicates) if predicates.is_empty() => self.on_empty == EmptyChain::Accept,
            Some(predicates) => predicates.iter().all(|p| p(record)),
        }
    }

    /// Test a record slot that may be empty. An empty slot never passes, which is the
    /// "is not null" gate applied ahead of every named predicate.
    pub fn test_slot(&self, record: Option<&T>) -> bool {
        record.is_some_and(|r| self.test(r))
    }
}

impl<T> Default for PredicateChain<T> {
    fn default() -> Self {
        Self::absent()
    }
}

impl<T> Clone for PredicateChain<T> {
    fn clone(&self) -> Self {
        Self {
            predicates: self.predicates.clone(),
            on_empty: self.on_empty,
        }
    }
}

impl<T> fmt::Debug for PredicateChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateChain")
            .field("predicates", &self.predicates.as_ref().map(Vec::len))
            .field("on_empty", &self.on_empty)
            .finish()
    }
}

impl<T> FromIterator<Predicate<T>> for PredicateChain<T> {
    fn from_iter<I: IntoIterator<Item = Predicate<T>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// --- Issue type definitions ---

/// Severity is neither `DO_NOT_SHOW` nor `INVALID_SEVERITY`.
pub fn has_valid_severity() -> Predicate<IssueTypeDefinition> {
    predicate(|d: &IssueTypeDefinition| {
        !matches!(
            d.severity,
            IssueSeverity::DoNotShow | IssueSeverity::InvalidSeverity
        )
    })
}

pub fn has_non_empty_description() -> Predicate<IssueTypeDefinition> {
    predicate(|d: &IssueTypeDefinition| {
        d.description.as_deref().is_some_and(|s| !s.trim().is_empty())
    })
}

fn key_shape_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\S{3,}$").expect("valid regex"))
}

fn non_csharp_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(AngularHtml\.|Asp\.|Cpp|Css|Es\dFeature|Html\.|VB|Web\.|WebConfig\.)",
        )
        .expect("valid regex")
    })
}

fn visual_basic_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*VB").expect("valid regex"))
}

/// Key follows the C# naming convention: at least three non-whitespace characters
/// and none of the prefixes used by other languages and web technologies.
pub fn is_csharp_definition() -> Predicate<IssueTypeDefinition> {
    predicate(|d: &IssueTypeDefinition| {
        key_shape_re().is_match(d.key()) && !non_csharp_prefix_re().is_match(d.key())
    })
}

/// Key follows the VB.NET naming convention (`VB` prefix).
pub fn is_visual_basic_definition() -> Predicate<IssueTypeDefinition> {
    predicate(|d: &IssueTypeDefinition| {
        key_shape_re().is_match(d.key()) && visual_basic_prefix_re().is_match(d.key())
    })
}

pub fn is_web_related_category() -> Predicate<IssueTypeDefinition> {
    predicate(|d: &IssueTypeDefinition| {
        d.category
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(WEB_RELATED_CATEGORY))
    })
}

// --- Issue occurrences ---

/// Both offsets are set and form a non-inverted range.
pub fn has_valid_offset() -> Predicate<IssueOccurrence> {
    predicate(|o: &IssueOccurrence| {
        o.offset_start >= 0 && o.offset_end >= 0 && o.offset_start <= o.offset_end
    })
}

/// Line numbers are 1-based.
pub fn has_valid_line_number() -> Predicate<IssueOccurrence> {
    predicate(|o: &IssueOccurrence| o.line >= 1)
}

// --- Project scope ---

/// Project name equals `name`, ignoring case and surrounding whitespace.
pub fn project_name_equals(name: &str) -> Predicate<String> {
    let expected = name.trim().to_lowercase();
    predicate(move |project: &String| project.trim().to_lowercase() == expected)
}

pub fn has_non_empty_name() -> Predicate<String> {
    predicate(|project: &String| !project.trim().is_empty())
}

// --- Presets ---

/// Issue types reported for C# code. The not-null gate is applied by the chain itself.
pub fn csharp_definition_filters() -> Vec<Predicate<IssueTypeDefinition>> {
    vec![
        has_valid_severity(),
        has_non_empty_description(),
        is_csharp_definition(),
        not(is_web_related_category()),
    ]
}

/// Issue types reported for VB.NET code.
pub fn visual_basic_definition_filters() -> Vec<Predicate<IssueTypeDefinition>> {
    vec![
        has_valid_severity(),
        has_non_empty_description(),
        is_visual_basic_definition(),
        not(is_web_related_category()),
    ]
}

/// Occurrences that can be located in a source file.
pub fn occurrence_filters() -> Vec<Predicate<IssueOccurrence>> {
    vec![has_valid_offset(), has_valid_line_number()]
}
