//! Error types for the semantic indexing engine.
//!
//! Per-file problems are recovered locally and surfaced as structured
//! diagnostics attached to the file; project-level operations never fail for
//! per-file issues. Only programmer errors (API misuse) propagate.

use crate::types::{FilePath, Location, ScopeId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Project-level errors. These indicate API misuse or internal bugs, not
/// per-file source problems.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("File '{path}' is not indexed. Call update_file first.")]
    FileNotIndexed { path: FilePath },

    #[error("Unknown symbol id '{id}'. The defining file may have been removed.")]
    SymbolNotFound { id: String },

    #[error("Unknown type id '{id}'.")]
    TypeNotFound { id: String },

    #[error("Range edit for '{path}' does not match the indexed source: {reason}")]
    InvalidEdit { path: FilePath, reason: String },

    #[error("Failed to initialize the {language} adapter: {reason}")]
    AdapterInit { language: String, reason: String },
}

/// Per-file parse and capture errors. Recovered into diagnostics.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to initialize {language} parser: {reason}")]
    ParserInit { language: String, reason: String },

    #[error(
        "File '{path}' is {size} bytes, exceeding the configured limit of {limit} bytes"
    )]
    FileTooLarge {
        path: FilePath,
        size: usize,
        limit: usize,
    },

    #[error("Parser produced no tree for '{path}'")]
    NoTree { path: FilePath },

    #[error("Malformed {category} capture at {location}: {reason}")]
    CaptureMalformed {
        category: String,
        location: Location,
        reason: String,
    },
}

/// Severity of a recovered per-file problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// A structured, recovered problem attached to a file.
///
/// Oversized files, parse failures, malformed captures, unresolved imports,
/// and internal invariant violations all land here instead of failing the
/// project operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    FileTooLarge {
        size: usize,
        limit: usize,
    },
    ParseFailure {
        reason: String,
    },
    CaptureMalformed {
        category: String,
        location: Location,
        reason: String,
    },
    UnresolvedImport {
        import_path: String,
        location: Location,
    },
    InvariantViolation {
        detail: String,
        scope_id: Option<ScopeId>,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Self::FileTooLarge { .. } | Self::ParseFailure { .. } => Severity::Error,
            Self::CaptureMalformed { .. }
            | Self::UnresolvedImport { .. }
            | Self::InvariantViolation { .. } => Severity::Warning,
        }
    }
}

/// Result type alias for project operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Result type alias for parse operations.
pub type ParseResult<T> = Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FilePath;

    #[test]
    fn test_file_too_large_message() {
        let err = ParseError::FileTooLarge {
            path: FilePath::new("big.py"),
            size: 2_000_000,
            limit: 1_048_576,
        };
        let msg = err.to_string();
        assert!(msg.contains("big.py"));
        assert!(msg.contains("2000000"));
        assert!(msg.contains("1048576"));
    }

    #[test]
    fn test_diagnostic_severity() {
        let d = Diagnostic::ParseFailure {
            reason: "no tree".into(),
        };
        assert_eq!(d.severity(), Severity::Error);

        let d = Diagnostic::UnresolvedImport {
            import_path: "./missing".into(),
            location: Location::new(FilePath::new("a.ts"), 1, 1, 1, 30),
        };
        assert_eq!(d.severity(), Severity::Warning);
    }

    #[test]
    fn test_diagnostic_serializes_with_kind_tag() {
        let d = Diagnostic::FileTooLarge {
            size: 10,
            limit: 5,
        };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kind"], "file_too_large");
    }
}
