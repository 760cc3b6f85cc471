//! The handle based native layer the adapter drives.
//!
//! Every primitive reports failure with a sentinel (`false` or `None`). The
//! diagnostic behind a failure is fetched afterwards with
//! [`OciNative::take_error`], keyed by the handle the call was made on.

use ocibridge_core::{ErrorRecord, Value};
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatementHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LobHandle(pub u64);

/// Where the last error of a native call is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorSource {
    /// Errors not tied to a handle (failed connect, released handles).
    Global,
    Connection(ConnectionHandle),
    Statement(StatementHandle),
}

/// External datatype code used for binds and defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeType(pub u32);

impl NativeType {
    pub const CHR: NativeType = NativeType(1);
    pub const RDD: NativeType = NativeType(104);
    pub const CLOB: NativeType = NativeType(112);
    pub const BLOB: NativeType = NativeType(113);
    pub const BFILE: NativeType = NativeType(114);
    pub const CFILE: NativeType = NativeType(115);
    pub const CURSOR: NativeType = NativeType(116);

    pub const fn is_lob(self) -> bool {
        matches!(self.0, 112 | 113)
    }
}

impl Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            NativeType::CHR => "SQLT_CHR",
            NativeType::RDD => "SQLT_RDD",
            NativeType::CLOB => "SQLT_CLOB",
            NativeType::BLOB => "SQLT_BLOB",
            NativeType::BFILE => "SQLT_BFILE",
            NativeType::CFILE => "SQLT_CFILE",
            NativeType::CURSOR => "SQLT_RSET",
            NativeType(code) => return write!(f, "SQLT({})", code),
        };
        f.write_str(name)
    }
}

/// Kind of descriptor allocated for a large object binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    File,
    Lob,
    Rowid,
}

/// Commit behaviour of a statement execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommitMode {
    CommitOnSuccess,
    NoAutoCommit,
    /// Older clients lacking the no-auto-commit flag.
    Default,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionMode {
    #[default]
    Default,
    /// Authenticate with external credentials.
    CredExt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TempLobKind {
    Clob,
    Blob,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams<'a> {
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
    pub dbname: &'a str,
    pub charset: &'a str,
    pub session_mode: SessionMode,
    pub persistent: bool,
}

/// A value as exchanged with the native layer.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Raw(Vec<u8>),
    /// Locator of a large object owned by the statement that fetched it.
    Lob(LobHandle),
    Array(Vec<NativeValue>),
}

impl NativeValue {
    /// Bind form of `value`: everything but null and lists travels as text.
    pub fn from_value(value: &Value) -> ocibridge_core::Result<NativeValue> {
        Ok(match value {
            Value::List(values) => NativeValue::Array(
                values
                    .iter()
                    .map(NativeValue::from_value)
                    .collect::<ocibridge_core::Result<_>>()?,
            ),
            Value::Blob(bytes) => NativeValue::Raw(bytes.to_vec()),
            v => match v.to_text()? {
                Some(text) => NativeValue::Text(text),
                None => NativeValue::Null,
            },
        })
    }

    /// Plain value conversion, `None` for locators that need a stream.
    pub fn into_value(self) -> Option<Value> {
        Some(match self {
            NativeValue::Null => Value::Null,
            NativeValue::Integer(v) => Value::Int64(v),
            NativeValue::Float(v) => Value::Float64(v),
            NativeValue::Text(v) => Value::Varchar(v),
            NativeValue::Raw(v) => Value::Blob(v.into()),
            NativeValue::Lob(..) => return None,
            NativeValue::Array(values) => Value::List(
                values
                    .into_iter()
                    .map(|v| v.into_value().unwrap_or(Value::Null))
                    .collect(),
            ),
        })
    }
}

/// What a named parameter is bound to.
#[derive(Debug, Clone, PartialEq)]
pub enum BindTarget {
    Value(NativeValue),
    Lob(LobHandle),
    Cursor(StatementHandle),
}

/// What a result column is defined into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefineTarget {
    Variable,
    Lob(LobHandle),
}

/// Native database access layer.
///
/// Implementations are synchronous and not reentrant. Column positions are
/// 1-based.
pub trait OciNative {
    fn client_version(&self) -> String;

    /// Whether executions accept [`CommitMode::NoAutoCommit`].
    fn supports_no_auto_commit(&self) -> bool {
        true
    }

    /// Removes and returns the pending error recorded for `source`.
    fn take_error(&self, source: ErrorSource) -> Option<ErrorRecord>;

    fn connect(&self, params: &ConnectParams<'_>) -> Option<ConnectionHandle>;
    fn close(&self, connection: ConnectionHandle) -> bool;
    fn server_version(&self, connection: ConnectionHandle) -> Option<String>;
    fn commit(&self, connection: ConnectionHandle) -> bool;
    fn rollback(&self, connection: ConnectionHandle) -> bool;

    fn parse(&self, connection: ConnectionHandle, sql: &str) -> Option<StatementHandle>;
    fn new_cursor(&self, connection: ConnectionHandle) -> Option<StatementHandle>;
    fn new_descriptor(
        &self,
        connection: ConnectionHandle,
        kind: DescriptorKind,
    ) -> Option<LobHandle>;

    fn set_prefetch(&self, statement: StatementHandle, rows: u32) -> bool;
    /// Leading keyword of the statement (`SELECT`, `BEGIN`, `DECLARE`, ...).
    fn statement_type(&self, statement: StatementHandle) -> Option<String>;
    fn bind_by_name(
        &self,
        statement: StatementHandle,
        name: &str,
        target: BindTarget,
        max_length: i64,
        native_type: NativeType,
    ) -> bool;
    fn bind_array_by_name(
        &self,
        statement: StatementHandle,
        name: &str,
        values: Vec<NativeValue>,
        max_table_length: usize,
        max_item_length: i64,
        native_type: NativeType,
    ) -> bool;
    /// Current value of a bound parameter, reflecting what the execution wrote.
    fn bound_value(&self, statement: StatementHandle, name: &str) -> Option<NativeValue>;
    fn define_by_name(
        &self,
        statement: StatementHandle,
        column: &str,
        target: DefineTarget,
        native_type: NativeType,
    ) -> bool;
    fn execute(&self, statement: StatementHandle, mode: CommitMode) -> bool;

    fn num_fields(&self, statement: StatementHandle) -> Option<usize>;
    fn num_rows(&self, statement: StatementHandle) -> Option<u64>;
    fn field_name(&self, statement: StatementHandle, column: usize) -> Option<String>;
    fn field_type(&self, statement: StatementHandle, column: usize) -> Option<String>;
    fn field_type_raw(&self, statement: StatementHandle, column: usize) -> Option<i64>;
    fn field_size(&self, statement: StatementHandle, column: usize) -> Option<i64>;
    fn field_precision(&self, statement: StatementHandle, column: usize) -> Option<i64>;

    /// Next row by position, `None` once exhausted or on failure.
    fn fetch_row(&self, statement: StatementHandle) -> Option<Vec<NativeValue>>;
    /// Every remaining row.
    fn fetch_all(&self, statement: StatementHandle) -> Option<Vec<Vec<NativeValue>>>;
    fn free_statement(&self, statement: StatementHandle) -> bool;

    fn lob_write_temporary(&self, lob: LobHandle, data: &[u8], kind: TempLobKind) -> bool;
    fn lob_write(&self, lob: LobHandle, data: &[u8]) -> Option<usize>;
    fn lob_flush(&self, lob: LobHandle) -> bool;
    /// Reads up to `count` units: characters for character LOBs, bytes otherwise.
    fn lob_read(&self, lob: LobHandle, count: usize) -> Option<Vec<u8>>;
    fn lob_eof(&self, lob: LobHandle) -> bool;
    fn lob_rewind(&self, lob: LobHandle) -> bool;
    fn lob_size(&self, lob: LobHandle) -> Option<u64>;
    fn lob_tell(&self, lob: LobHandle) -> Option<u64>;
    fn lob_free(&self, lob: LobHandle) -> bool;
}
