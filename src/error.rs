//! Diagnostic error types for chain-tms.
//!
//! The reasoning core itself never fails: unknown retractions, failed
//! unifications, duplicate assertions and malformed queries are ordinary
//! outcomes reported through return values and `tracing` events. The
//! variants here cover the surfaces around the core (the statement reader,
//! file loading, JSON export) plus the invariant checker.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for chain-tms.
#[derive(Debug, Error, Diagnostic)]
pub enum TmsError {
    #[error("parse error on line {line}: {message}")]
    #[diagnostic(
        code(tms::reader::parse),
        help(
            "Statements look like `fact: (isa cube block)` or \
             `rule: ((isa ?x block) (size ?x big)) -> (heavy ?x)`. \
             Variables start with '?'."
        )
    )]
    Parse { line: usize, message: String },

    #[error("failed to read {path}")]
    #[diagnostic(
        code(tms::io),
        help("Check that the file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("knowledge base is inconsistent: {message}")]
    #[diagnostic(
        code(tms::kb::inconsistent),
        help(
            "A justification invariant was violated. This is a bug in the \
             knowledge base; please report it with the statements that led here."
        )
    )]
    Inconsistent { message: String },

    #[error("failed to serialize knowledge base export")]
    #[diagnostic(code(tms::export::serde))]
    Export {
        #[source]
        source: serde_json::Error,
    },
}

impl From<serde_json::Error> for TmsError {
    fn from(source: serde_json::Error) -> Self {
        Self::Export { source }
    }
}

/// Convenience alias for functions returning chain-tms results.
pub type TmsResult<T> = std::result::Result<T, TmsError>;
