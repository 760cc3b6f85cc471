//! Error taxonomy shared by every backend adapter.
//!
//! Adapters transport errors as [`anyhow::Error`] (see [`crate::Error`]) and
//! attach context while they bubble up. The kind of failure is always one of
//! the [`DbError`] variants, recoverable with `error.downcast_ref::<DbError>()`.

use std::fmt::{self, Display};
use thiserror::Error;

/// The kinds of failure an adapter can report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DbError {
    /// Bad or mismatched configuration (DSN, driver name, options).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The native connection could not be opened or released.
    #[error("connection error ({code}): {message}")]
    Connection { code: i32, message: String },

    /// Opening the connection failed and the backend detail is withheld.
    #[error("no database connection")]
    NoConnection,

    /// Protocol misuse by the caller.
    #[error("usage error: {0}")]
    Usage(String),

    /// The operation exists in the interface but is deliberately unsupported.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// A failure reported by the backend.
    #[error("{message} (code {code})")]
    Native { code: i32, message: String },

    /// A backend failure already dispatched to the log or warning channel.
    #[error("operation failed, diagnostic {code} was reported")]
    Reported { code: i32 },
}

impl DbError {
    pub fn usage(message: impl Into<String>) -> Self {
        DbError::Usage(message.into())
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        DbError::NotImplemented(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        DbError::Configuration(message.into())
    }

    /// Backend code carried by the error, if any.
    pub fn code(&self) -> Option<i32> {
        match self {
            DbError::Connection { code, .. }
            | DbError::Native { code, .. }
            | DbError::Reported { code } => Some(*code),
            _ => None,
        }
    }
}

/// Diagnostic record as returned by the native layer's last-error query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorRecord {
    pub code: i32,
    pub message: String,
    /// Fragment of SQL the error refers to.
    pub sql_text: String,
    /// Character offset inside `sql_text`, zero when unknown.
    pub offset: usize,
}

impl ErrorRecord {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn at(mut self, sql_text: impl Into<String>, offset: usize) -> Self {
        self.sql_text = sql_text.into();
        self.offset = offset;
        self
    }
}

/// How diagnostics are surfaced to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ErrorMode {
    /// Timestamped message written to the log, the operation reports failure.
    Silent,
    /// Escaped message emitted as a warning, the operation reports failure.
    Warning,
    /// The backend error is returned as [`DbError::Native`].
    #[default]
    Exception,
}

/// The `(sqlstate, code, message)` triple exposed by `error_info()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub sqlstate: &'static str,
    pub code: Option<i32>,
    pub message: Option<String>,
}

impl ErrorInfo {
    pub const NONE: &'static str = "00000";
    pub const GENERAL: &'static str = "HY000";

    pub fn none() -> Self {
        Self {
            sqlstate: Self::NONE,
            code: None,
            message: None,
        }
    }
}

impl From<Option<&ErrorRecord>> for ErrorInfo {
    fn from(value: Option<&ErrorRecord>) -> Self {
        match value {
            Some(record) => Self {
                sqlstate: Self::GENERAL,
                code: Some(record.code),
                message: Some(record.message.clone()),
            },
            None => Self::none(),
        }
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.sqlstate)?;
        if let Some(code) = self.code {
            write!(f, " {}", code)?;
        }
        if let Some(message) = &self.message {
            write!(f, " {}", message)?;
        }
        Ok(())
    }
}

/// Builds `error`, logs it and returns it as the failure of the operation.
pub fn fail<T>(error: DbError) -> crate::Result<T> {
    let error = crate::Error::new(error);
    log::error!("{:#}", error);
    Err(error)
}

/// Returns the [`DbError`] carried by `error`, if any.
pub fn db_error(error: &crate::Error) -> Option<&DbError> {
    error.downcast_ref::<DbError>()
}
