//! Diagnostic module - Error and warning reporting infrastructure.
//!
//! Every phase reports problems through a shared [`Handler`], which collects
//! [`Diagnostic`] values instead of aborting. The driver consults the
//! handler after each phase of each line: a line whose phase produced an
//! error does not advance to later phases, but compilation continues with
//! the next line so one run reports as much as possible.
//!
//! Rendering is line-oriented: `TypeError [line 3]: ...`, optionally
//! followed by an indented context snippet.

use std::cell::RefCell;
use std::fmt;

/// Diagnostic severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// An error that fails the affected line
    Error,
    /// A warning that does not affect the exit status
    Warning,
    /// Additional information about a diagnostic
    Note,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Note => write!(f, "note"),
        }
    }
}

/// Classification of a diagnostic by the phase rule it violates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Illegal character, malformed number, malformed relational operator
    Lexical,
    /// Token stream does not match the grammar
    Syntax,
    /// Operand types incompatible with an operator
    Type,
    /// Undeclared identifier, uninitialized memory, RES index out of range
    Memory,
    /// Malformed IF/WHILE or non-boolean guard
    Control,
    /// Invariant violated inside a phase
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Lexical => write!(f, "LexicalError"),
            ErrorKind::Syntax => write!(f, "SyntaxError"),
            ErrorKind::Type => write!(f, "TypeError"),
            ErrorKind::Memory => write!(f, "MemoryError"),
            ErrorKind::Control => write!(f, "ControlError"),
            ErrorKind::Internal => write!(f, "InternalError"),
        }
    }
}

/// A diagnostic message attached to a source line.
///
/// # Examples
///
/// ```
/// use rpnc_util::{Diagnostic, ErrorKind, Level};
///
/// let diag = Diagnostic::error(ErrorKind::Type, "operands must be numeric", 3);
/// assert_eq!(diag.level, Level::Error);
/// assert_eq!(diag.to_string(), "TypeError [line 3]: operands must be numeric");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    /// Severity level
    pub level: Level,
    /// Error taxonomy kind
    pub kind: ErrorKind,
    /// Main diagnostic message
    pub message: String,
    /// Source line the diagnostic belongs to (1-based)
    pub line: u32,
    /// Optional context snippet (e.g. the offending expression)
    pub context: Option<String>,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    pub fn new(level: Level, kind: ErrorKind, message: impl Into<String>, line: u32) -> Self {
        Self {
            level,
            kind,
            message: message.into(),
            line,
            context: None,
        }
    }

    /// Creates an error diagnostic.
    pub fn error(kind: ErrorKind, message: impl Into<String>, line: u32) -> Self {
        Self::new(Level::Error, kind, message, line)
    }

    /// Creates a warning diagnostic.
    pub fn warning(kind: ErrorKind, message: impl Into<String>, line: u32) -> Self {
        Self::new(Level::Warning, kind, message, line)
    }

    /// Attaches a context snippet.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            Level::Warning => write!(f, "warning: ")?,
            Level::Note => write!(f, "note: ")?,
            Level::Error => {},
        }
        write!(f, "{} [line {}]: {}", self.kind, self.line, self.message)?;
        if let Some(context) = &self.context {
            write!(f, "\n  {}", context)?;
        }
        Ok(())
    }
}

/// Handler for collecting and querying diagnostics.
///
/// The handler is shared by every phase of a compilation. Interior
/// mutability lets phases that only need to report (not query) take `&self`.
///
/// # Examples
///
/// ```
/// use rpnc_util::{Diagnostic, ErrorKind, Handler};
///
/// let handler = Handler::new();
/// handler.emit(Diagnostic::error(ErrorKind::Lexical, "illegal character '@'", 1));
/// assert!(handler.has_errors());
/// assert_eq!(handler.error_count(), 1);
/// ```
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    /// Creates a new, empty handler.
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
        }
    }

    /// Records a diagnostic.
    pub fn emit(&self, diagnostic: Diagnostic) {
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Whether any error-level diagnostic has been recorded.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.level == Level::Error)
    }

    /// Number of recorded errors.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Error)
            .count()
    }

    /// Number of recorded warnings.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Warning)
            .count()
    }

    /// Snapshot of all recorded diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Diagnostics recorded for one source line.
    pub fn diagnostics_for_line(&self, line: u32) -> Vec<Diagnostic> {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.line == line)
            .cloned()
            .collect()
    }

    /// Removes all recorded diagnostics.
    pub fn clear(&self) {
        self.diagnostics.borrow_mut().clear();
    }
}

impl Default for Handler {
    fn default() -> Self {
        Self::new()
    }
}
