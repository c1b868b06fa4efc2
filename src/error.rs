//! Error types for xsdgen
//!
//! This module defines the error taxonomy used throughout the compiler:
//! load, parse, unsupported-construct, resolution and naming-conflict
//! diagnostics, plus the ambient I/O and configuration errors.

use std::fmt;
use thiserror::Error;

/// Result type alias using the xsdgen Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for xsdgen operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing/unreadable file or unresolved import target
    #[error("{0}")]
    Load(Diagnostic),

    /// Malformed XML or XSD syntax
    #[error("{0}")]
    Parse(Diagnostic),

    /// Schema feature with no generation mapping
    #[error("{0}")]
    Unsupported(Diagnostic),

    /// Unresolvable reference or unbreakable mandatory cycle
    #[error("{0}")]
    Resolution(Diagnostic),

    /// Two entities map to the same generated identifier
    #[error("{0}")]
    NamingConflict(Diagnostic),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A generation run failed after collecting diagnostics
    #[error("{0}")]
    Generation(#[from] GenerationFailure),
}

impl Error {
    /// Convert this error into a diagnostic for the run report
    pub fn into_diagnostic(self) -> Diagnostic {
        match self {
            Error::Load(d)
            | Error::Parse(d)
            | Error::Unsupported(d)
            | Error::Resolution(d)
            | Error::NamingConflict(d) => d,
            Error::LimitExceeded(msg) => Diagnostic::new(DiagnosticKind::Load, msg),
            Error::Io(e) => Diagnostic::new(DiagnosticKind::Load, e.to_string()),
            Error::Url(e) => Diagnostic::new(DiagnosticKind::Load, e.to_string()),
            other => Diagnostic::new(DiagnosticKind::Load, other.to_string()),
        }
    }
}

impl From<Diagnostic> for Error {
    fn from(d: Diagnostic) -> Self {
        match d.kind {
            DiagnosticKind::Load => Error::Load(d),
            DiagnosticKind::Parse => Error::Parse(d),
            DiagnosticKind::Unsupported => Error::Unsupported(d),
            DiagnosticKind::Resolution => Error::Resolution(d),
            DiagnosticKind::NamingConflict => Error::NamingConflict(d),
        }
    }
}

/// Diagnostic taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    /// Missing/unreadable file, unresolved import target
    Load,
    /// Malformed XML/XSD syntax
    Parse,
    /// Schema feature with no generation mapping
    Unsupported,
    /// Unresolvable reference, unbreakable mandatory cycle
    Resolution,
    /// Colliding generated identifiers
    NamingConflict,
}

impl DiagnosticKind {
    /// Short name used in rendered diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::Load => "load",
            DiagnosticKind::Parse => "parse",
            DiagnosticKind::Unsupported => "unsupported",
            DiagnosticKind::Resolution => "resolution",
            DiagnosticKind::NamingConflict => "naming-conflict",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Aborts the run before emission
    Error,
    /// Reported alongside successful output
    Warning,
}

/// 1-based line/column position inside a schema document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
}

impl Position {
    /// Create a new position
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Compute the position of a byte offset within `text`
    pub fn from_offset(text: &str, offset: usize) -> Self {
        let offset = offset.min(text.len());
        let before = &text.as_bytes()[..offset];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let column = String::from_utf8_lossy(&before[line_start..]).chars().count() + 1;
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A single problem found during a run, attributed to a schema location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Taxonomy kind
    pub kind: DiagnosticKind,
    /// Severity
    pub severity: Severity,
    /// Error message
    pub message: String,
    /// Schema location (file path or URL)
    pub location: Option<String>,
    /// Position inside the schema location
    pub position: Option<Position>,
    /// Qualified name of the offending component
    pub component: Option<String>,
}

impl Diagnostic {
    /// Create a new error-severity diagnostic
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message: message.into(),
            location: None,
            position: None,
            component: None,
        }
    }

    /// Create a load error
    pub fn load(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Load, message)
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Parse, message)
    }

    /// Create an unsupported-construct diagnostic
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Unsupported, message)
    }

    /// Create a resolution error
    pub fn resolution(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Resolution, message)
    }

    /// Create a naming conflict
    pub fn naming_conflict(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::NamingConflict, message)
    }

    /// Set the schema location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the position
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the offending component
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Downgrade to a warning
    pub fn as_warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }

    /// Whether this diagnostic aborts the run under the given policy
    pub fn is_fatal(&self, strict_unsupported: bool) -> bool {
        if self.severity == Severity::Warning {
            return false;
        }
        match self.kind {
            DiagnosticKind::Unsupported => strict_unsupported,
            _ => true,
        }
    }

    fn sort_key(&self) -> (&str, Position, DiagnosticKind, &str, &str) {
        (
            self.location.as_deref().unwrap_or(""),
            self.position.unwrap_or_default(),
            self.kind,
            self.component.as_deref().unwrap_or(""),
            &self.message,
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}[{}]: {}", level, self.kind, self.message)?;

        if self.location.is_some() || self.component.is_some() {
            write!(f, "\n  -->")?;
            if let Some(ref loc) = self.location {
                write!(f, " {}", loc)?;
                if let Some(pos) = self.position {
                    write!(f, ":{}", pos)?;
                }
            }
            if let Some(ref component) = self.component {
                write!(f, " ({})", component)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

/// Accumulates every diagnostic of a run so a user sees all problems at once
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    /// Add every diagnostic from an iterator
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.items.extend(diagnostics);
    }

    /// Whether any collected diagnostic aborts the run
    pub fn has_fatal(&self, strict_unsupported: bool) -> bool {
        self.items.iter().any(|d| d.is_fatal(strict_unsupported))
    }

    /// Kind of the first fatal diagnostic in sorted order
    pub fn first_fatal_kind(&self, strict_unsupported: bool) -> Option<DiagnosticKind> {
        self.sorted()
            .into_iter()
            .find(|d| d.is_fatal(strict_unsupported))
            .map(|d| d.kind)
    }

    /// Number of collected diagnostics
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing was collected
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Diagnostics in deterministic order (location, position, kind, message)
    pub fn sorted(&self) -> Vec<Diagnostic> {
        let mut items = self.items.clone();
        items.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        items.dedup();
        items
    }

    /// Non-fatal diagnostics under the given policy, sorted
    pub fn warnings(&self, strict_unsupported: bool) -> Vec<Diagnostic> {
        self.sorted()
            .into_iter()
            .filter(|d| !d.is_fatal(strict_unsupported))
            .map(Diagnostic::as_warning)
            .collect()
    }

    /// Consume into a sorted vector
    pub fn into_sorted(self) -> Vec<Diagnostic> {
        self.sorted()
    }
}

/// A failed generation run: the state it failed in and every diagnostic collected
#[derive(Debug, Clone)]
pub struct GenerationFailure {
    /// Phase that was running when the run aborted
    pub state: String,
    /// Kind of the first fatal diagnostic
    pub kind: DiagnosticKind,
    /// Every diagnostic collected up to the failure, sorted
    pub diagnostics: Vec<Diagnostic>,
}

impl GenerationFailure {
    /// Fatal diagnostics only
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// Whether any collected diagnostic has the given kind
    pub fn has_kind(&self, kind: DiagnosticKind) -> bool {
        self.diagnostics.iter().any(|d| d.kind == kind)
    }
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors = self.errors().count();
        write!(
            f,
            "generation failed while {} with {} error(s) [{}]",
            self.state, errors, self.kind
        )?;
        for diagnostic in &self.diagnostics {
            write!(f, "\n{}", diagnostic)?;
        }
        Ok(())
    }
}

impl std::error::Error for GenerationFailure {}
