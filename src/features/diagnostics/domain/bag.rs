//! Error/warning accumulation for the builder and analyzer.
//!
//! The analyzer never stops at the first error: every problem it finds is
//! recorded here, and only once the whole pass is complete does a caller
//! decide whether to treat `has_errors()` as fatal.

use std::fmt;

use crate::shared::models::location::FileLocation;

/// Severity of a single recorded message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// A single diagnostic: a severity, a message, and zero or more source
/// locations it pertains to.
#[derive(Debug, Clone)]
pub struct FileMessage {
    pub severity: Severity,
    pub locations: Vec<FileLocation>,
    pub message: String,
}

impl fmt::Display for FileMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if !self.locations.is_empty() {
            write!(f, " (")?;
            for (i, loc) in self.locations.iter().enumerate() {
                if i > 0 {
                    write!(f, "; ")?;
                }
                write!(f, "{}", loc)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// The accumulated set of errors and warnings produced while building or
/// analyzing a graph.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    messages: Vec<FileMessage>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error against zero or more locations.
    pub fn error(&mut self, locations: impl Into<Vec<FileLocation>>, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{message}");
        self.messages.push(FileMessage {
            severity: Severity::Error,
            locations: locations.into(),
            message,
        });
    }

    /// Records a warning against zero or more locations.
    pub fn warning(&mut self, locations: impl Into<Vec<FileLocation>>, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.messages.push(FileMessage {
            severity: Severity::Warning,
            locations: locations.into(),
            message,
        });
    }

    /// Records a message whose severity is decided by the caller. Mirrors
    /// the original `report()` entry point that both error and warning
    /// paths funneled through.
    pub fn report(&mut self, msg: FileMessage) {
        match msg.severity {
            Severity::Error => tracing::error!("{}", msg.message),
            Severity::Warning => tracing::warn!("{}", msg.message),
        }
        self.messages.push(msg);
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|m| m.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.severity == Severity::Warning)
    }

    pub fn messages(&self) -> &[FileMessage] {
        &self.messages
    }

    /// Renders every recorded message, one per line, in the order they
    /// were recorded.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for msg in &self.messages {
            use std::fmt::Write as _;
            let _ = writeln!(out, "{}", msg);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::location::Location;

    #[test]
    fn empty_bag_has_no_errors_or_warnings() {
        let d = Diagnostics::new();
        assert!(!d.has_errors());
        assert!(!d.has_warnings());
    }

    #[test]
    fn error_and_warning_are_tracked_independently() {
        let mut d = Diagnostics::new();
        d.warning(vec![], "shadowed symbol");
        assert!(!d.has_errors());
        assert!(d.has_warnings());

        d.error(
            vec![FileLocation::new("m.mdl", Location::new(1, 1))],
            "undefined symbol: rate",
        );
        assert!(d.has_errors());
    }

    #[test]
    fn render_includes_every_message() {
        let mut d = Diagnostics::new();
        d.error(vec![], "first");
        d.warning(vec![], "second");
        let rendered = d.render();
        assert!(rendered.contains("first"));
        assert!(rendered.contains("second"));
    }
}
