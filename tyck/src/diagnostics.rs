use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "Error"),
            Level::Warning => write!(f, "Warning"),
            Level::Info => write!(f, "Info"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub code: Option<&'static str>,
    pub message: String,
    /// Declarations the diagnostic is about
    pub decls: Vec<String>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(level: Level, message: String) -> Self {
        Self {
            level,
            code: None,
            message,
            decls: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn error(message: String) -> Self {
        Self::new(Level::Error, message)
    }

    pub fn warning(message: String) -> Self {
        Self::new(Level::Warning, message)
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_decl(mut self, name: impl Into<String>) -> Self {
        self.decls.push(name.into());
        self
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    pub fn message_with_code(&self) -> String {
        match self.code {
            Some(code) => format!("[{}] {}", code, self.message),
            None => self.message.clone(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.message_with_code())?;
        for note in &self.notes {
            write!(f, "\n  note: {}", note)?;
        }
        Ok(())
    }
}

pub trait DiagnosticHandler {
    fn handle(&mut self, diagnostic: Diagnostic);
}

// Simple vector collector
pub struct DiagnosticCollector {
    pub diagnostics: Vec<Diagnostic>,
}

impl Default for DiagnosticCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level == Level::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.level == Level::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.level == Level::Warning)
    }
}

impl DiagnosticHandler for DiagnosticCollector {
    fn handle(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// Forwards everything while counting errors and warnings since the
/// last [`clear`](CountingReporter::clear).
pub struct CountingReporter<'a> {
    inner: &'a mut dyn DiagnosticHandler,
    errors: usize,
    warnings: usize,
}

impl<'a> CountingReporter<'a> {
    pub fn new(inner: &'a mut dyn DiagnosticHandler) -> Self {
        Self {
            inner,
            errors: 0,
            warnings: 0,
        }
    }

    pub fn any_error(&self) -> bool {
        self.errors > 0
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn clear(&mut self) {
        self.errors = 0;
        self.warnings = 0;
    }
}

impl DiagnosticHandler for CountingReporter<'_> {
    fn handle(&mut self, diagnostic: Diagnostic) {
        match diagnostic.level {
            Level::Error => self.errors += 1,
            Level::Warning => self.warnings += 1,
            Level::Info => {}
        }
        self.inner.handle(diagnostic);
    }
}

/// Buffers diagnostics and hands them to the wrapped handler on
/// [`flush`](DelayedReporter::flush) or when dropped.
pub struct DelayedReporter<'a> {
    inner: &'a mut dyn DiagnosticHandler,
    pending: Vec<Diagnostic>,
}

impl<'a> DelayedReporter<'a> {
    pub fn new(inner: &'a mut dyn DiagnosticHandler) -> Self {
        Self {
            inner,
            pending: Vec::new(),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn flush(&mut self) {
        for diagnostic in self.pending.drain(..) {
            self.inner.handle(diagnostic);
        }
    }
}

impl DiagnosticHandler for DelayedReporter<'_> {
    fn handle(&mut self, diagnostic: Diagnostic) {
        self.pending.push(diagnostic);
    }
}

impl Drop for DelayedReporter<'_> {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_with_code_prefixes_code() {
        let diagnostic = Diagnostic::error("broken".to_string()).with_code("E0301");
        assert_eq!(diagnostic.message_with_code(), "[E0301] broken");
        assert_eq!(diagnostic.to_string(), "Error: [E0301] broken");
    }

    #[test]
    fn counting_reporter_counts_until_cleared() {
        let mut collector = DiagnosticCollector::new();
        {
            let mut counting = CountingReporter::new(&mut collector);
            counting.handle(Diagnostic::warning("w".to_string()));
            assert!(!counting.any_error());
            counting.handle(Diagnostic::error("e".to_string()));
            assert!(counting.any_error());
            assert_eq!(counting.warning_count(), 1);

            counting.clear();
            assert!(!counting.any_error());
            assert_eq!(counting.error_count(), 0);
        }
        assert_eq!(collector.diagnostics.len(), 2);
    }

    #[test]
    fn delayed_reporter_flushes_on_drop() {
        let mut collector = DiagnosticCollector::new();
        {
            let mut delayed = DelayedReporter::new(&mut collector);
            delayed.handle(Diagnostic::error("late".to_string()));
            assert_eq!(delayed.pending(), 1);
        }
        assert!(collector.has_errors());
    }

    #[test]
    fn delayed_reporter_flush_preserves_order() {
        let mut collector = DiagnosticCollector::new();
        let mut delayed = DelayedReporter::new(&mut collector);
        delayed.handle(Diagnostic::error("first".to_string()));
        delayed.handle(Diagnostic::warning("second".to_string()));
        delayed.flush();
        assert_eq!(delayed.pending(), 0);
        drop(delayed);

        let messages: Vec<&str> = collector.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }
}
