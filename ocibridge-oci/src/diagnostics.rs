//! Retrieval and dispatch of native diagnostics.
//!
//! A failed native call (a sentinel result) raises the pending error of the
//! handle it was made on. The record is consumed when raised, so one native
//! error is reported once. A sentinel with no pending error is not a failure:
//! it is how the native layer says "nothing" (for example the end of rows).

use crate::{ErrorSource, OciNative};
use ocibridge_core::{DbError, Error, ErrorInfo, ErrorMode, ErrorRecord, Result, html_escape};
use std::cell::RefCell;
use time::{OffsetDateTime, macros::format_description};

/// Failure value of a native primitive.
pub(crate) trait Sentinel {
    fn failed(&self) -> bool;
}

impl Sentinel for bool {
    fn failed(&self) -> bool {
        !*self
    }
}

impl<T> Sentinel for Option<T> {
    fn failed(&self) -> bool {
        self.is_none()
    }
}

/// Where a diagnostic is raised from.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scope<'a> {
    pub(crate) source: ErrorSource,
    pub(crate) mode: ErrorMode,
    /// Query text of the raising statement.
    pub(crate) query: Option<&'a str>,
}

/// Error cache of one adapter instance.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    pending: RefCell<Option<ErrorRecord>>,
    last: RefCell<Option<ErrorRecord>>,
}

impl Diagnostics {
    /// Pending error of `source`, kept until it is raised.
    pub(crate) fn error<N: OciNative>(
        &self,
        native: &N,
        source: ErrorSource,
    ) -> Option<ErrorRecord> {
        let mut pending = self.pending.borrow_mut();
        if pending.is_none() {
            *pending = native.take_error(source);
        }
        pending.clone()
    }

    /// The pending error or, when none, the last one raised.
    pub(crate) fn info<N: OciNative>(&self, native: &N, source: ErrorSource) -> ErrorInfo {
        let record = self
            .error(native, source)
            .or_else(|| self.last.borrow().clone());
        ErrorInfo::from(record.as_ref())
    }

    /// Raises the pending error of the scope, if there is one.
    pub(crate) fn raise<N: OciNative>(&self, native: &N, scope: Scope<'_>) -> Result<()> {
        let Some(record) = self.error(native, scope.source) else {
            return Ok(());
        };
        self.pending.borrow_mut().take();
        let error = dispatch(scope.mode, &record, message(&record, scope.query));
        *self.last.borrow_mut() = Some(record);
        Err(error)
    }

    /// Raises the pending error when `result` is the failure sentinel.
    pub(crate) fn check<N: OciNative, S: Sentinel>(
        &self,
        native: &N,
        scope: Scope<'_>,
        result: S,
    ) -> Result<S> {
        if result.failed() {
            self.raise(native, scope)?;
        }
        Ok(result)
    }
}

/// Text of a diagnostic. The SQL fragment appears only with a known offset,
/// otherwise a statement names its own query.
pub(crate) fn message(record: &ErrorRecord, query: Option<&str>) -> String {
    match (record.offset, query) {
        (0, None) => record.message.clone(),
        (0, Some(query)) => format!("{} in {}", record.message, query),
        (offset, _) => format!("{} in {} at {}", record.message, record.sql_text, offset),
    }
}

/// Surfaces `message` according to `mode` and builds the error the failed
/// operation returns.
pub(crate) fn dispatch(mode: ErrorMode, record: &ErrorRecord, message: String) -> Error {
    match mode {
        ErrorMode::Silent => {
            log::error!("({}) Error {}", timestamp(), message);
            Error::new(DbError::Reported { code: record.code })
        }
        ErrorMode::Warning => {
            log::warn!("{}", html_escape(&format!("Error {}", message)));
            Error::new(DbError::Reported { code: record.code })
        }
        ErrorMode::Exception => {
            let error = Error::new(DbError::Native {
                code: record.code,
                message,
            });
            log::error!("{:#}", error);
            error
        }
    }
}

fn timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocibridge_core::db_error;

    #[test]
    fn messages() {
        let record = ErrorRecord::new(942, "ORA-00942: table or view does not exist");
        assert_eq!(message(&record, None), "ORA-00942: table or view does not exist");
        assert_eq!(
            message(&record, Some("SELECT * FROM missing")),
            "ORA-00942: table or view does not exist in SELECT * FROM missing"
        );
        let record = record.at("SELECT * FROM missing", 14);
        assert_eq!(
            message(&record, Some("ignored")),
            "ORA-00942: table or view does not exist in SELECT * FROM missing at 14"
        );
    }

    #[test]
    fn modes() {
        let record = ErrorRecord::new(1722, "ORA-01722: invalid number");
        let error = dispatch(ErrorMode::Exception, &record, "boom".into());
        assert_eq!(
            db_error(&error),
            Some(&DbError::Native {
                code: 1722,
                message: "boom".into()
            })
        );
        for mode in [ErrorMode::Silent, ErrorMode::Warning] {
            let error = dispatch(mode, &record, "<b>'boom'</b>".into());
            assert_eq!(db_error(&error), Some(&DbError::Reported { code: 1722 }));
        }
    }

    #[test]
    fn sentinels() {
        assert!(false.failed());
        assert!(!true.failed());
        assert!(None::<u32>.failed());
        assert!(!Some(0).failed());
    }

    #[test]
    fn timestamp_format() {
        let value = timestamp();
        assert_eq!(value.len(), 19);
        assert_eq!(&value[4..5], "-");
        assert_eq!(&value[10..11], " ");
    }
}
