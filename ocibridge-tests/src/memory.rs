//! In memory native layer with scripted results.
//!
//! Statements are matched by their SQL text. An unscripted statement executes
//! successfully, affects no row and produces no result set.

use ocibridge_core::ErrorRecord;
use ocibridge_oci::{
    BindTarget, CommitMode, ConnectParams, ConnectionHandle, DefineTarget, DescriptorKind,
    ErrorSource, LobHandle, NativeType, NativeValue, OciNative, SessionMode, StatementHandle,
    TempLobKind,
};
use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
};

/// Native calls that can be made to fail with [`MemoryNative::fail_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Connect,
    Close,
    ServerVersion,
    Commit,
    Rollback,
    Parse,
    NewCursor,
    NewDescriptor,
    Bind,
    Define,
    Execute,
    Fetch,
    FreeStatement,
    LobWrite,
    LobRead,
    LobFree,
    NumRows,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultColumn {
    pub name: String,
    pub type_name: String,
    pub raw: i64,
    pub size: i64,
    pub precision: i64,
}

/// Result set returned by a scripted execution. Text or raw cells of `CLOB`
/// and `BLOB` columns are served through large object locators.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<ResultColumn>,
    pub rows: Vec<Vec<NativeValue>>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, name: &str, type_name: &str) -> Self {
        let (raw, size, precision) = match type_name {
            "NUMBER" => (2, 22, 38),
            "CLOB" => (112, 4000, 0),
            "BLOB" => (113, 4000, 0),
            "DATE" => (12, 7, 0),
            "ROWID" => (104, 10, 0),
            "RAW" => (23, 2000, 0),
            _ => (1, 4000, 0),
        };
        self.columns.push(ResultColumn {
            name: name.to_string(),
            type_name: type_name.to_string(),
            raw,
            size,
            precision,
        });
        self
    }

    pub fn row(mut self, values: impl IntoIterator<Item = NativeValue>) -> Self {
        self.rows.push(values.into_iter().collect());
        self
    }

    fn is_lob(&self, column: usize) -> Option<bool> {
        match self.columns.get(column)?.type_name.as_str() {
            "CLOB" => Some(true),
            "BLOB" => Some(false),
            _ => None,
        }
    }
}

/// Value an execution writes into a bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Value(NativeValue),
    /// The value (or large object content) bound to another marker.
    Copy(String),
}

/// What executing a statement does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    pub result: Option<ResultSet>,
    pub affected: u64,
    /// Result sets handed to the cursors bound to the named markers.
    pub cursors: Vec<(String, ResultSet)>,
    pub outputs: Vec<(String, Output)>,
    pub error: Option<ErrorRecord>,
}

impl Script {
    pub fn rows(result: ResultSet) -> Self {
        Self {
            result: Some(result),
            ..Default::default()
        }
    }

    pub fn affected(affected: u64) -> Self {
        Self {
            affected,
            ..Default::default()
        }
    }

    pub fn error(record: ErrorRecord) -> Self {
        Self {
            error: Some(record),
            ..Default::default()
        }
    }

    pub fn cursor(mut self, marker: &str, result: ResultSet) -> Self {
        self.cursors.push((marker.to_string(), result));
        self
    }

    pub fn output(mut self, marker: &str, output: Output) -> Self {
        self.outputs.push((marker.to_string(), output));
        self
    }
}

/// Owned copy of the parameters of the last successful connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connected {
    pub username: Option<String>,
    pub password: Option<String>,
    pub dbname: String,
    pub charset: String,
    pub session_mode: SessionMode,
    pub persistent: bool,
}

/// A parameter as it was when the statement executed. Large objects carry
/// their content as [`NativeValue::Raw`].
#[derive(Debug, Clone, PartialEq)]
pub struct Captured {
    pub name: String,
    pub native_type: NativeType,
    pub max_length: i64,
    pub value: NativeValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub sql: String,
    pub mode: CommitMode,
    pub binds: Vec<Captured>,
}

impl Executed {
    pub fn bind(&self, name: &str) -> Option<&Captured> {
        self.binds.iter().find(|v| v.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug)]
enum Bound {
    Value(NativeValue),
    Array(Vec<NativeValue>),
    Lob(LobHandle),
    Cursor(StatementHandle),
}

#[derive(Debug)]
struct Binding {
    name: String,
    target: Bound,
    max_length: i64,
    native_type: NativeType,
}

#[derive(Debug, Default)]
struct StatementState {
    connection: u64,
    sql: String,
    prefetch: u32,
    binds: Vec<Binding>,
    defines: Vec<(String, DefineTarget)>,
    /// Result set handed over by the block that opened this cursor.
    staged: Option<ResultSet>,
    result: Option<ResultSet>,
    position: usize,
    affected: u64,
    lobs: Vec<u64>,
}

impl StatementState {
    fn binding(&self, name: &str) -> Option<&Binding> {
        self.binds.iter().find(|v| v.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Default)]
struct LobState {
    connection: u64,
    clob: bool,
    /// Character data is UTF-16, two bytes per unit.
    wide: bool,
    data: Vec<u8>,
    position: usize,
}

impl LobState {
    fn new(connection: u64, wide: bool) -> Self {
        Self {
            connection,
            wide,
            ..Default::default()
        }
    }

    /// Bytes per unit, `None` when a unit is one UTF-8 character.
    fn unit(&self) -> Option<usize> {
        match (self.clob, self.wide) {
            (false, _) => Some(1),
            (true, true) => Some(2),
            (true, false) => None,
        }
    }

    fn units(&self, bytes: &[u8]) -> u64 {
        match self.unit() {
            Some(width) => (bytes.len() / width) as u64,
            None => String::from_utf8_lossy(bytes).chars().count() as u64,
        }
    }

    /// Length in bytes of the first `count` units of `bytes`.
    fn span(&self, bytes: &[u8], count: usize) -> usize {
        match self.unit() {
            Some(width) => count.saturating_mul(width).min(bytes.len()),
            None => String::from_utf8_lossy(bytes)
                .chars()
                .take(count)
                .map(char::len_utf8)
                .sum::<usize>()
                .min(bytes.len()),
        }
    }

    /// Character data as stored by this object.
    fn encode(&self, text: String) -> Vec<u8> {
        if self.clob && self.wide {
            text.encode_utf16().flat_map(u16::to_be_bytes).collect()
        } else {
            text.into_bytes()
        }
    }
}

/// Whether character large objects of `charset` hold UTF-16.
fn wide_charset(charset: &str) -> bool {
    charset.eq_ignore_ascii_case("AL16UTF16") || charset.eq_ignore_ascii_case("UTF16")
}

#[derive(Debug)]
struct State {
    next_id: u64,
    client_version: String,
    server_version: String,
    no_auto_commit: bool,
    connections: BTreeMap<u64, Connected>,
    statements: BTreeMap<u64, StatementState>,
    lobs: BTreeMap<u64, LobState>,
    scripts: HashMap<String, Script>,
    failures: HashMap<Op, Option<ErrorRecord>>,
    errors: HashMap<ErrorSource, ErrorRecord>,
    executed: Vec<Executed>,
    last_connect: Option<Connected>,
    commits: usize,
    rollbacks: usize,
    freed_lobs: usize,
    freed_statements: usize,
}

impl State {
    fn id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Consumes an injected failure of `op`, recording its diagnostic for `source`.
    fn injected(&mut self, op: Op, source: ErrorSource) -> bool {
        match self.failures.remove(&op) {
            Some(record) => {
                if let Some(record) = record {
                    self.errors.insert(source, record);
                }
                true
            }
            None => false,
        }
    }

    fn lob_source(&self, lob: LobHandle) -> ErrorSource {
        match self.lobs.get(&lob.0) {
            Some(state) => ErrorSource::Connection(ConnectionHandle(state.connection)),
            None => ErrorSource::Global,
        }
    }

    fn wide(&self, connection: u64) -> bool {
        self.connections
            .get(&connection)
            .is_some_and(|v| wide_charset(&v.charset))
    }

    fn invalid_handle(&mut self, source: ErrorSource) {
        self.errors
            .insert(source, ErrorRecord::new(-2, "OCI_INVALID_HANDLE"));
    }

    fn capture(&self, binding: &Binding) -> NativeValue {
        match &binding.target {
            Bound::Value(value) => value.clone(),
            Bound::Array(values) => NativeValue::Array(values.clone()),
            Bound::Lob(lob) => match self.lobs.get(&lob.0) {
                Some(state) => NativeValue::Raw(state.data.clone()),
                None => NativeValue::Null,
            },
            Bound::Cursor(..) => NativeValue::Null,
        }
    }

    fn write_output(&mut self, statement: u64, name: &str, value: NativeValue) {
        let Some(state) = self.statements.get_mut(&statement) else {
            return;
        };
        let Some(binding) = state
            .binds
            .iter_mut()
            .find(|v| v.name.eq_ignore_ascii_case(name))
        else {
            return;
        };
        match &mut binding.target {
            Bound::Value(current) => *current = value,
            Bound::Array(current) => {
                if let NativeValue::Array(values) = value {
                    *current = values;
                }
            }
            Bound::Lob(lob) => {
                let lob = lob.0;
                if let Some(lob) = self.lobs.get_mut(&lob) {
                    lob.data = match value {
                        NativeValue::Raw(v) => v,
                        NativeValue::Text(v) => lob.encode(v),
                        NativeValue::Integer(v) => lob.encode(v.to_string()),
                        NativeValue::Float(v) => lob.encode(v.to_string()),
                        _ => Vec::new(),
                    };
                    lob.position = 0;
                }
            }
            Bound::Cursor(..) => {}
        }
    }

    /// Materialises the next row of `statement`. Large object cells become
    /// locators, written into the defined locator when the column has one.
    fn next_row(&mut self, statement: u64) -> Option<Vec<NativeValue>> {
        let (row, columns, defines, connection) = {
            let state = self.statements.get_mut(&statement)?;
            let result = state.result.as_ref()?;
            let row = result.rows.get(state.position)?.clone();
            let columns = result
                .columns
                .iter()
                .enumerate()
                .map(|(i, v)| (result.is_lob(i), v.name.clone()))
                .collect::<Vec<_>>();
            state.position += 1;
            (row, columns, state.defines.clone(), state.connection)
        };
        let wide = self.wide(connection);
        let mut values = Vec::with_capacity(row.len());
        for (column, value) in row.into_iter().enumerate() {
            let Some((Some(clob), name)) = columns.get(column) else {
                values.push(value);
                continue;
            };
            let lob = LobState {
                clob: *clob,
                ..LobState::new(connection, wide)
            };
            let data = match value {
                NativeValue::Text(v) => lob.encode(v),
                NativeValue::Raw(v) => v,
                value => {
                    values.push(value);
                    continue;
                }
            };
            let defined = defines.iter().find_map(|(k, v)| match v {
                DefineTarget::Lob(lob) if k.eq_ignore_ascii_case(name) => Some(lob.0),
                _ => None,
            });
            let handle = match defined {
                Some(handle) => handle,
                None => {
                    let id = self.id();
                    if let Some(state) = self.statements.get_mut(&statement) {
                        state.lobs.push(id);
                    }
                    id
                }
            };
            self.lobs.insert(handle, LobState { data, ..lob });
            values.push(NativeValue::Lob(LobHandle(handle)));
        }
        Some(values)
    }
}

/// Scriptable in memory implementation of [`OciNative`].
#[derive(Debug)]
pub struct MemoryNative {
    state: RefCell<State>,
}

impl Default for MemoryNative {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryNative {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State {
                next_id: 0,
                client_version: "23.5.0.24.07".into(),
                server_version: "Oracle Database 23ai Free Release 23.0.0.0.0".into(),
                no_auto_commit: true,
                connections: Default::default(),
                statements: Default::default(),
                lobs: Default::default(),
                scripts: Default::default(),
                failures: Default::default(),
                errors: Default::default(),
                executed: Default::default(),
                last_connect: None,
                commits: 0,
                rollbacks: 0,
                freed_lobs: 0,
                freed_statements: 0,
            }),
        }
    }

    /// Scripts the executions of `sql`.
    pub fn on(&self, sql: &str, script: Script) -> &Self {
        self.state
            .borrow_mut()
            .scripts
            .insert(sql.trim().to_string(), script);
        self
    }

    /// Makes the next call of `op` fail, recording `record` as its diagnostic.
    pub fn fail_next(&self, op: Op, record: Option<ErrorRecord>) -> &Self {
        self.state.borrow_mut().failures.insert(op, record);
        self
    }

    /// Simulates an older client lacking the no-auto-commit flag.
    pub fn set_no_auto_commit(&self, supported: bool) {
        self.state.borrow_mut().no_auto_commit = supported;
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.state.borrow().executed.clone()
    }

    pub fn last_executed(&self) -> Option<Executed> {
        self.state.borrow().executed.last().cloned()
    }

    pub fn last_connect(&self) -> Option<Connected> {
        self.state.borrow().last_connect.clone()
    }

    pub fn open_connections(&self) -> usize {
        self.state.borrow().connections.len()
    }

    pub fn live_statements(&self) -> usize {
        self.state.borrow().statements.len()
    }

    pub fn live_lobs(&self) -> usize {
        self.state.borrow().lobs.len()
    }

    pub fn freed_lobs(&self) -> usize {
        self.state.borrow().freed_lobs
    }

    pub fn freed_statements(&self) -> usize {
        self.state.borrow().freed_statements
    }

    pub fn commits(&self) -> usize {
        self.state.borrow().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.state.borrow().rollbacks
    }

    /// Prefetch applied to the most recently parsed statement.
    pub fn last_prefetch(&self) -> Option<u32> {
        self.state
            .borrow()
            .statements
            .values()
            .next_back()
            .map(|v| v.prefetch)
    }
}

impl OciNative for MemoryNative {
    fn client_version(&self) -> String {
        self.state.borrow().client_version.clone()
    }

    fn supports_no_auto_commit(&self) -> bool {
        self.state.borrow().no_auto_commit
    }

    fn take_error(&self, source: ErrorSource) -> Option<ErrorRecord> {
        self.state.borrow_mut().errors.remove(&source)
    }

    fn connect(&self, params: &ConnectParams<'_>) -> Option<ConnectionHandle> {
        let mut state = self.state.borrow_mut();
        if state.injected(Op::Connect, ErrorSource::Global) {
            return None;
        }
        if params.dbname.is_empty() && params.session_mode != SessionMode::CredExt {
            state.errors.insert(
                ErrorSource::Global,
                ErrorRecord::new(12162, "ORA-12162: TNS:net service name is incorrectly specified"),
            );
            return None;
        }
        let connected = Connected {
            username: params.username.map(str::to_string),
            password: params.password.map(str::to_string),
            dbname: params.dbname.to_string(),
            charset: params.charset.to_string(),
            session_mode: params.session_mode,
            persistent: params.persistent,
        };
        let id = state.id();
        state.connections.insert(id, connected.clone());
        state.last_connect = Some(connected);
        Some(ConnectionHandle(id))
    }

    fn close(&self, connection: ConnectionHandle) -> bool {
        let mut state = self.state.borrow_mut();
        let source = ErrorSource::Connection(connection);
        if state.injected(Op::Close, source) {
            return false;
        }
        if state.connections.remove(&connection.0).is_none() {
            state.invalid_handle(ErrorSource::Global);
            return false;
        }
        true
    }

    fn server_version(&self, connection: ConnectionHandle) -> Option<String> {
        let mut state = self.state.borrow_mut();
        if state.injected(Op::ServerVersion, ErrorSource::Connection(connection)) {
            return None;
        }
        Some(state.server_version.clone())
    }

    fn commit(&self, connection: ConnectionHandle) -> bool {
        let mut state = self.state.borrow_mut();
        if state.injected(Op::Commit, ErrorSource::Connection(connection)) {
            return false;
        }
        state.commits += 1;
        true
    }

    fn rollback(&self, connection: ConnectionHandle) -> bool {
        let mut state = self.state.borrow_mut();
        if state.injected(Op::Rollback, ErrorSource::Connection(connection)) {
            return false;
        }
        state.rollbacks += 1;
        true
    }

    fn parse(&self, connection: ConnectionHandle, sql: &str) -> Option<StatementHandle> {
        let mut state = self.state.borrow_mut();
        let source = ErrorSource::Connection(connection);
        if state.injected(Op::Parse, source) {
            return None;
        }
        if !state.connections.contains_key(&connection.0) {
            state.invalid_handle(ErrorSource::Global);
            return None;
        }
        if sql.trim().is_empty() {
            state.errors.insert(
                source,
                ErrorRecord::new(900, "ORA-00900: invalid SQL statement"),
            );
            return None;
        }
        let id = state.id();
        state.statements.insert(
            id,
            StatementState {
                connection: connection.0,
                sql: sql.trim().to_string(),
                ..Default::default()
            },
        );
        Some(StatementHandle(id))
    }

    fn new_cursor(&self, connection: ConnectionHandle) -> Option<StatementHandle> {
        let mut state = self.state.borrow_mut();
        if state.injected(Op::NewCursor, ErrorSource::Connection(connection)) {
            return None;
        }
        let id = state.id();
        state.statements.insert(
            id,
            StatementState {
                connection: connection.0,
                ..Default::default()
            },
        );
        Some(StatementHandle(id))
    }

    fn new_descriptor(
        &self,
        connection: ConnectionHandle,
        _kind: DescriptorKind,
    ) -> Option<LobHandle> {
        let mut state = self.state.borrow_mut();
        if state.injected(Op::NewDescriptor, ErrorSource::Connection(connection)) {
            return None;
        }
        let id = state.id();
        let wide = state.wide(connection.0);
        state
            .lobs
            .insert(id, LobState::new(connection.0, wide));
        Some(LobHandle(id))
    }

    fn set_prefetch(&self, statement: StatementHandle, rows: u32) -> bool {
        match self.state.borrow_mut().statements.get_mut(&statement.0) {
            Some(state) => {
                state.prefetch = rows;
                true
            }
            None => false,
        }
    }

    fn statement_type(&self, statement: StatementHandle) -> Option<String> {
        let state = self.state.borrow();
        let sql = &state.statements.get(&statement.0)?.sql;
        let keyword = sql
            .split(|c: char| !c.is_ascii_alphabetic())
            .find(|v| !v.is_empty())
            .unwrap_or_default();
        Some(keyword.to_ascii_uppercase())
    }

    fn bind_by_name(
        &self,
        statement: StatementHandle,
        name: &str,
        target: BindTarget,
        max_length: i64,
        native_type: NativeType,
    ) -> bool {
        let mut state = self.state.borrow_mut();
        if state.injected(Op::Bind, ErrorSource::Statement(statement)) {
            return false;
        }
        let target = match target {
            BindTarget::Value(value) => Bound::Value(value),
            BindTarget::Lob(lob) => {
                if native_type == NativeType::CLOB {
                    if let Some(lob) = state.lobs.get_mut(&lob.0) {
                        lob.clob = true;
                    }
                }
                Bound::Lob(lob)
            }
            BindTarget::Cursor(cursor) => Bound::Cursor(cursor),
        };
        let Some(state) = state.statements.get_mut(&statement.0) else {
            return false;
        };
        state.binds.retain(|v| !v.name.eq_ignore_ascii_case(name));
        state.binds.push(Binding {
            name: name.to_string(),
            target,
            max_length,
            native_type,
        });
        true
    }

    fn bind_array_by_name(
        &self,
        statement: StatementHandle,
        name: &str,
        values: Vec<NativeValue>,
        max_table_length: usize,
        max_item_length: i64,
        native_type: NativeType,
    ) -> bool {
        let mut state = self.state.borrow_mut();
        if state.injected(Op::Bind, ErrorSource::Statement(statement)) {
            return false;
        }
        if values.len() > max_table_length {
            state.errors.insert(
                ErrorSource::Statement(statement),
                ErrorRecord::new(
                    6513,
                    "ORA-06513: PL/SQL: index for PL/SQL table out of range for host language array",
                ),
            );
            return false;
        }
        let Some(state) = state.statements.get_mut(&statement.0) else {
            return false;
        };
        state.binds.retain(|v| !v.name.eq_ignore_ascii_case(name));
        state.binds.push(Binding {
            name: name.to_string(),
            target: Bound::Array(values),
            max_length: max_item_length,
            native_type,
        });
        true
    }

    fn bound_value(&self, statement: StatementHandle, name: &str) -> Option<NativeValue> {
        let state = self.state.borrow();
        match &state.statements.get(&statement.0)?.binding(name)?.target {
            Bound::Value(value) => Some(value.clone()),
            Bound::Array(values) => Some(NativeValue::Array(values.clone())),
            Bound::Lob(..) | Bound::Cursor(..) => None,
        }
    }

    fn define_by_name(
        &self,
        statement: StatementHandle,
        column: &str,
        target: DefineTarget,
        native_type: NativeType,
    ) -> bool {
        let mut state = self.state.borrow_mut();
        if state.injected(Op::Define, ErrorSource::Statement(statement)) {
            return false;
        }
        if let DefineTarget::Lob(lob) = target {
            if let Some(lob) = state.lobs.get_mut(&lob.0) {
                lob.clob = native_type == NativeType::CLOB;
            }
        }
        let Some(state) = state.statements.get_mut(&statement.0) else {
            return false;
        };
        state.defines.retain(|(k, _)| !k.eq_ignore_ascii_case(column));
        state.defines.push((column.to_string(), target));
        true
    }

    fn execute(&self, statement: StatementHandle, mode: CommitMode) -> bool {
        let mut state = self.state.borrow_mut();
        let source = ErrorSource::Statement(statement);
        if state.injected(Op::Execute, source) {
            return false;
        }
        let Some(current) = state.statements.get(&statement.0) else {
            state.invalid_handle(ErrorSource::Global);
            return false;
        };
        let sql = current.sql.clone();
        let staged = current.staged.clone();
        let binds = current
            .binds
            .iter()
            .map(|v| Captured {
                name: v.name.clone(),
                native_type: v.native_type,
                max_length: v.max_length,
                value: state.capture(v),
            })
            .collect();
        let script = match staged {
            Some(result) => Script::rows(result),
            None => state.scripts.get(&sql).cloned().unwrap_or_default(),
        };
        if let Some(record) = script.error {
            state.errors.insert(source, record);
            return false;
        }
        state.executed.push(Executed { sql, mode, binds });
        for (name, output) in script.outputs {
            let value = match output {
                Output::Value(value) => value,
                Output::Copy(from) => {
                    let captured = state.statements.get(&statement.0).and_then(|v| {
                        v.binding(&from).map(|binding| state.capture(binding))
                    });
                    captured.unwrap_or(NativeValue::Null)
                }
            };
            state.write_output(statement.0, &name, value);
        }
        for (name, result) in script.cursors {
            let cursor = state
                .statements
                .get(&statement.0)
                .and_then(|v| v.binding(&name))
                .and_then(|v| match v.target {
                    Bound::Cursor(cursor) => Some(cursor),
                    _ => None,
                });
            if let Some(cursor) = cursor.and_then(|v| state.statements.get_mut(&v.0)) {
                cursor.staged = Some(result);
            }
        }
        let Some(current) = state.statements.get_mut(&statement.0) else {
            return false;
        };
        current.affected = script.affected;
        current.result = script.result;
        current.position = 0;
        true
    }

    fn num_fields(&self, statement: StatementHandle) -> Option<usize> {
        let state = self.state.borrow();
        let current = state.statements.get(&statement.0)?;
        Some(current.result.as_ref().map_or(0, |v| v.columns.len()))
    }

    fn num_rows(&self, statement: StatementHandle) -> Option<u64> {
        let mut state = self.state.borrow_mut();
        if state.injected(Op::NumRows, ErrorSource::Statement(statement)) {
            return None;
        }
        let current = state.statements.get(&statement.0)?;
        Some(match &current.result {
            Some(..) => current.position as u64,
            None => current.affected,
        })
    }

    fn field_name(&self, statement: StatementHandle, column: usize) -> Option<String> {
        let state = self.state.borrow();
        let result = state.statements.get(&statement.0)?.result.as_ref()?;
        Some(result.columns.get(column.checked_sub(1)?)?.name.clone())
    }

    fn field_type(&self, statement: StatementHandle, column: usize) -> Option<String> {
        let state = self.state.borrow();
        let result = state.statements.get(&statement.0)?.result.as_ref()?;
        Some(result.columns.get(column.checked_sub(1)?)?.type_name.clone())
    }

    fn field_type_raw(&self, statement: StatementHandle, column: usize) -> Option<i64> {
        let state = self.state.borrow();
        let result = state.statements.get(&statement.0)?.result.as_ref()?;
        Some(result.columns.get(column.checked_sub(1)?)?.raw)
    }

    fn field_size(&self, statement: StatementHandle, column: usize) -> Option<i64> {
        let state = self.state.borrow();
        let result = state.statements.get(&statement.0)?.result.as_ref()?;
        Some(result.columns.get(column.checked_sub(1)?)?.size)
    }

    fn field_precision(&self, statement: StatementHandle, column: usize) -> Option<i64> {
        let state = self.state.borrow();
        let result = state.statements.get(&statement.0)?.result.as_ref()?;
        Some(result.columns.get(column.checked_sub(1)?)?.precision)
    }

    fn fetch_row(&self, statement: StatementHandle) -> Option<Vec<NativeValue>> {
        let mut state = self.state.borrow_mut();
        let source = ErrorSource::Statement(statement);
        if state.injected(Op::Fetch, source) {
            return None;
        }
        let has_result = state
            .statements
            .get(&statement.0)
            .is_some_and(|v| v.result.is_some());
        if !has_result {
            state.errors.insert(
                source,
                ErrorRecord::new(
                    24374,
                    "ORA-24374: define not done before fetch or execute and fetch",
                ),
            );
            return None;
        }
        state.next_row(statement.0)
    }

    fn fetch_all(&self, statement: StatementHandle) -> Option<Vec<Vec<NativeValue>>> {
        let mut rows = Vec::new();
        if let Some(row) = self.fetch_row(statement) {
            rows.push(row);
        } else if self
            .state
            .borrow()
            .errors
            .contains_key(&ErrorSource::Statement(statement))
        {
            return None;
        }
        while let Some(row) = self.state.borrow_mut().next_row(statement.0) {
            rows.push(row);
        }
        Some(rows)
    }

    fn free_statement(&self, statement: StatementHandle) -> bool {
        let mut state = self.state.borrow_mut();
        if state.injected(Op::FreeStatement, ErrorSource::Statement(statement)) {
            return false;
        }
        let Some(current) = state.statements.remove(&statement.0) else {
            state.invalid_handle(ErrorSource::Global);
            return false;
        };
        for lob in current.lobs {
            state.lobs.remove(&lob);
        }
        state.freed_statements += 1;
        true
    }

    fn lob_write_temporary(&self, lob: LobHandle, data: &[u8], kind: TempLobKind) -> bool {
        let mut state = self.state.borrow_mut();
        let source = state.lob_source(lob);
        if state.injected(Op::LobWrite, source) {
            return false;
        }
        let Some(lob) = state.lobs.get_mut(&lob.0) else {
            return false;
        };
        lob.clob = kind == TempLobKind::Clob;
        lob.data = data.to_vec();
        lob.position = lob.data.len();
        true
    }

    fn lob_write(&self, lob: LobHandle, data: &[u8]) -> Option<usize> {
        let mut state = self.state.borrow_mut();
        let source = state.lob_source(lob);
        if state.injected(Op::LobWrite, source) {
            return None;
        }
        let lob = state.lobs.get_mut(&lob.0)?;
        lob.data.truncate(lob.position);
        lob.data.extend_from_slice(data);
        lob.position = lob.data.len();
        Some(data.len())
    }

    fn lob_flush(&self, lob: LobHandle) -> bool {
        self.state.borrow().lobs.contains_key(&lob.0)
    }

    fn lob_read(&self, lob: LobHandle, count: usize) -> Option<Vec<u8>> {
        let mut state = self.state.borrow_mut();
        let source = state.lob_source(lob);
        if state.injected(Op::LobRead, source) {
            return None;
        }
        let lob = state.lobs.get_mut(&lob.0)?;
        let rest = &lob.data[lob.position.min(lob.data.len())..];
        let len = lob.span(rest, count);
        let chunk = rest[..len].to_vec();
        lob.position += len;
        Some(chunk)
    }

    fn lob_eof(&self, lob: LobHandle) -> bool {
        self.state
            .borrow()
            .lobs
            .get(&lob.0)
            .is_none_or(|v| v.position >= v.data.len())
    }

    fn lob_rewind(&self, lob: LobHandle) -> bool {
        match self.state.borrow_mut().lobs.get_mut(&lob.0) {
            Some(lob) => {
                lob.position = 0;
                true
            }
            None => false,
        }
    }

    fn lob_size(&self, lob: LobHandle) -> Option<u64> {
        let state = self.state.borrow();
        let lob = state.lobs.get(&lob.0)?;
        Some(lob.units(&lob.data))
    }

    fn lob_tell(&self, lob: LobHandle) -> Option<u64> {
        let state = self.state.borrow();
        let lob = state.lobs.get(&lob.0)?;
        Some(lob.units(&lob.data[..lob.position.min(lob.data.len())]))
    }

    fn lob_free(&self, lob: LobHandle) -> bool {
        let mut state = self.state.borrow_mut();
        let source = state.lob_source(lob);
        if state.injected(Op::LobFree, source) {
            return false;
        }
        if state.lobs.remove(&lob.0).is_none() {
            state.invalid_handle(ErrorSource::Global);
            return false;
        }
        state.freed_lobs += 1;
        true
    }
}
