use crate::{
    Attribute, AttributeValue, ColumnMeta, DbError, ErrorInfo, FetchArg, FetchArgument,
    FetchStyle, FetchedRow, Param, ParamType, Result, Value, fail,
};
use std::fmt::{self, Display};

/// Cursor orientation of a single-row fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Next,
    Prior,
    First,
    Last,
    Absolute,
    Relative,
}

impl Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Result column addressed by label or by 0-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    Name(String),
    Index(usize),
}

impl From<&str> for ColumnRef {
    fn from(value: &str) -> Self {
        ColumnRef::Name(value.to_string())
    }
}

impl From<String> for ColumnRef {
    fn from(value: String) -> Self {
        ColumnRef::Name(value)
    }
}

impl From<usize> for ColumnRef {
    fn from(value: usize) -> Self {
        ColumnRef::Index(value)
    }
}

impl Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Name(name) => f.write_str(name),
            ColumnRef::Index(index) => write!(f, "#{}", index),
        }
    }
}

/// A prepared statement.
pub trait Statement {
    /// The SQL text the statement was prepared from.
    fn query_string(&self) -> &str;

    /// Binds `param` by reference to the named marker. Output parameters are
    /// written back into `param` by `execute`.
    fn bind_param(
        &mut self,
        name: &str,
        param: &Param,
        kind: ParamType,
        max_length: Option<usize>,
    ) -> Result<()>;

    fn bind_value(&mut self, name: &str, value: Value, kind: ParamType) -> Result<()> {
        self.bind_param(name, &Param::new(value), kind, None)
    }

    /// Binds a result column to `param`, refreshed by every fetch.
    fn bind_column(
        &mut self,
        column: ColumnRef,
        param: &Param,
        kind: ParamType,
        max_length: Option<usize>,
    ) -> Result<()>;

    fn execute(&mut self) -> Result<()> {
        self.execute_with(&[])
    }

    /// Binds each `(name, value)` as a string parameter, then executes.
    fn execute_with(&mut self, params: &[(&str, Value)]) -> Result<()>;

    /// Fetches the next row, `None` once the rows are exhausted.
    fn fetch(
        &mut self,
        style: Option<FetchStyle>,
        orientation: Orientation,
        offset: i64,
    ) -> Result<Option<FetchedRow>>;

    /// Fetches the next row with the default fetch mode.
    fn fetch_next(&mut self) -> Result<Option<FetchedRow>> {
        self.fetch(None, Orientation::Next, 0)
    }

    /// Fetches the remaining rows, then closes the cursor.
    fn fetch_all(
        &mut self,
        style: Option<FetchStyle>,
        argument: FetchArgument<'_>,
    ) -> Result<Vec<FetchedRow>>;

    /// Value at `index` in the next row, `None` when there is no row or no such column.
    fn fetch_column(&mut self, index: usize) -> Result<Option<Value>>;

    fn fetch_object(&mut self, class: &str, args: Vec<Value>) -> Result<Option<FetchedRow>>;

    fn set_fetch_mode(&mut self, args: Vec<FetchArg>) -> Result<()>;

    fn close_cursor(&mut self) -> Result<()>;

    fn row_count(&self) -> Result<u64>;

    fn column_count(&self) -> Result<usize>;

    fn column_meta(&self, index: usize) -> Result<ColumnMeta>;

    fn get_attribute(&self, attribute: Attribute) -> Option<AttributeValue>;

    fn set_attribute(&mut self, attribute: Attribute, value: AttributeValue) -> bool;

    fn error_code(&self) -> &'static str {
        self.error_info().sqlstate
    }

    fn error_info(&self) -> ErrorInfo;

    fn next_rowset(&mut self) -> Result<bool> {
        fail(DbError::not_implemented("next_rowset"))
    }

    fn debug_dump_params(&self) -> Result<String> {
        fail(DbError::not_implemented("debug_dump_params"))
    }

    // Result cursors are forward only, positional iteration cannot be honored.

    fn current(&mut self) -> Result<FetchedRow> {
        fail(DbError::not_implemented("current"))
    }

    fn key(&self) -> Result<usize> {
        fail(DbError::not_implemented("key"))
    }

    fn next(&mut self) -> Result<()> {
        fail(DbError::not_implemented("next"))
    }

    fn rewind(&mut self) -> Result<()> {
        fail(DbError::not_implemented("rewind"))
    }

    fn valid(&self) -> Result<bool> {
        fail(DbError::not_implemented("valid"))
    }
}
