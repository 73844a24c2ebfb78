use thiserror::Error;
use tracing::{error, warn};

use crate::expression::ParseError;
use crate::keybindings::ChordParseError;

/// Error severity for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,     // Informational, expected in normal flows
    Warning,  // Recoverable
    Error,    // Operation failed
}

/// Domain-specific errors for action-kit.
///
/// Registry mutation errors are synchronous and reported directly to the
/// caller; nothing is retried or swallowed here. Semantic type mismatches in
/// expressions are not errors at all — they evaluate to `false`.
#[derive(Error, Debug)]
pub enum ActionKitError {
    #[error("invalid context expression: {0}")]
    Expression(#[from] ParseError),

    #[error("invalid key chord: {0}")]
    Chord(#[from] ChordParseError),

    #[error("command '{0}' is already registered")]
    DuplicateCommand(String),

    #[error("command '{0}' is not registered")]
    CommandNotFound(String),

    #[error("command '{0}' is disabled in the current context")]
    CommandDisabled(String),

    #[error("command '{id}' failed")]
    CommandExecution {
        id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("keybinding for command '{0}' has no chord for this platform")]
    NoChordForPlatform(String),
}

impl ActionKitError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Expression(_) => ErrorSeverity::Warning,
            Self::Chord(_) => ErrorSeverity::Warning,
            Self::DuplicateCommand(_) => ErrorSeverity::Warning,
            Self::CommandNotFound(_) => ErrorSeverity::Warning,
            Self::CommandDisabled(_) => ErrorSeverity::Info,
            Self::CommandExecution { .. } => ErrorSeverity::Error,
            Self::NoChordForPlatform(_) => ErrorSeverity::Warning,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Expression(e) => format!("Invalid expression: {}", e),
            Self::Chord(e) => format!("Invalid shortcut: {}", e),
            Self::DuplicateCommand(id) => format!("A command named '{}' already exists", id),
            Self::CommandNotFound(id) => format!("Unknown command '{}'", id),
            Self::CommandDisabled(id) => format!("'{}' is not available right now", id),
            Self::CommandExecution { id, source } => format!("'{}' failed: {}", id, source),
            Self::NoChordForPlatform(id) => {
                format!("No shortcut defined for '{}' on this platform", id)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ActionKitError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the caller doesn't need the
/// error value.
///
/// # Examples
///
/// ```ignore
/// use action_kit::error::ResultExt;
///
/// // Log and continue if a saved keymap entry doesn't parse
/// let clause = WhenClause::parse(text).log_err();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}
