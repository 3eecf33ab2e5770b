use std::fmt;

// ---------------------------------------------------------------------------
// Diagnostics channel
// ---------------------------------------------------------------------------

/// Severity of a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One message reported to the caller of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

/// Sink for progress narration, skipped-row notices and fatal failures.
///
/// Everything the pipeline wants the user to know goes through here;
/// nothing is discarded silently except rows with a missing key or value.
pub trait Diagnostics {
    fn report(&mut self, severity: Severity, message: String);

    fn info(&mut self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.report(Severity::Info, message.into());
    }

    fn warning(&mut self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.report(Severity::Warning, message.into());
    }

    fn error(&mut self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.report(Severity::Error, message.into());
    }
}

// ---------------------------------------------------------------------------
// MessageLog – records in order and forwards to the `log` facade
// ---------------------------------------------------------------------------

/// Keeps every diagnostic of a run and mirrors it to the logger.
#[derive(Debug, Default)]
pub struct MessageLog {
    entries: Vec<Diagnostic>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All diagnostics in emission order.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Messages of one severity, in order.
    pub fn messages(&self, severity: Severity) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|d| d.severity == severity)
            .map(|d| d.message.as_str())
            .collect()
    }
}

impl Diagnostics for MessageLog {
    fn report(&mut self, severity: Severity, message: String) {
        match severity {
            Severity::Info => log::info!("{message}"),
            Severity::Warning => log::warn!("{message}"),
            Severity::Error => log::error!("{message}"),
        }
        self.entries.push(Diagnostic { severity, message });
    }
}
