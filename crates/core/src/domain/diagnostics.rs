//! Load-time diagnostics
//!
//! Combination loads never abort on bad data: invalid, duplicate and
//! unmatched entries are dropped one by one and reported here, drift that
//! could be resolved by the other key is reported as a warning. The
//! collector is injected into every load call so callers (and tests) can
//! inspect exactly what happened; each recorded diagnostic is also emitted
//! through `tracing`.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, warn};

use super::console::ElementKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

/// One load-time finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// A persisted entry does not resolve to any template position
    InvalidEntry { group: String, entry: String },
    /// Two persisted entries resolved to the same template position; the
    /// first write wins
    DuplicateEntry { group: String, entry: String },
    /// The element still carries the saved name but sits at a different
    /// number; resolved by name
    WrongNumber {
        kind: ElementKind,
        name: String,
        expected: u32,
        found: u32,
    },
    /// The element at the saved number carries a different name now;
    /// resolved by number, the live name is authoritative
    WrongName {
        kind: ElementKind,
        number: u32,
        saved: String,
        live: String,
    },
    /// A structured-form entry matched neither by number nor by name
    Unmatched {
        kind: ElementKind,
        serial: String,
        name: String,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::WrongNumber { .. } | Diagnostic::WrongName { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::InvalidEntry { group, entry } => {
                write!(f, "invalid combination entry {entry} in {group}")
            }
            Diagnostic::DuplicateEntry { group, entry } => {
                write!(f, "duplicate combination entry {entry} in {group}")
            }
            Diagnostic::WrongNumber {
                kind,
                name,
                expected,
                found,
            } => write!(
                f,
                "wrong number {expected} of the {kind} \"{name}\" (found at {found})"
            ),
            Diagnostic::WrongName {
                kind,
                number,
                saved,
                live,
            } => write!(
                f,
                "wrong name \"{saved}\" instead of \"{live}\" of the {kind} {number}"
            ),
            Diagnostic::Unmatched { kind, serial, name } => write!(
                f,
                "could not match the {kind} \"{serial}: {name}\" by name or by number"
            ),
        }
    }
}

/// Collector handed to every load call
#[derive(Debug, Default)]
pub struct LoadDiagnostics {
    entries: Vec<Diagnostic>,
}

impl LoadDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Warning => warn!("{diagnostic}"),
            Severity::Error => error!("{diagnostic}"),
        }
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity() == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity() == Severity::Error)
    }

    /// True if the load produced neither warnings nor errors
    pub fn is_clean(&self) -> bool {
        self.entries.is_empty()
    }
}
