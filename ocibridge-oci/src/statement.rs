use crate::{
    BindTarget, DefineTarget, DescriptorKind, ErrorSource, NativeType, NativeValue,
    OciConnection, OciNative, StatementHandle,
    binding::{ColumnBinding, LobBinding, ResultShape},
    diagnostics::{Diagnostics, Scope, Sentinel},
    handle::Owned,
    lob::{self, LobSlot, charset_width},
    types::{self, BindStrategy},
};
use ocibridge_core::{
    Attribute, AttributeSet, AttributeValue, ClassRef, ClassRegistry, ColumnMeta, ColumnRef,
    DbError, ErrorInfo, FetchArg, FetchArgument, FetchMode, FetchStyle, FetchedRow, OracleNulls,
    Orientation, Param, ParamType, Record, Result, Row, Statement, Stream, Value,
    contains_ignore_ascii_case, fail, populate, truncate_long,
};
use std::{fmt, mem, rc::Rc};

/// Bytes copied per write when a stream feeds an input large object.
pub const LOB_CHUNK_SIZE: usize = 8192;
/// Length hint of scalar binds when the caller gives none.
pub const DEFAULT_BIND_LENGTH: i64 = 4000;

/// Which handle the statement executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// Its own parsed handle.
    Direct,
    /// The cursor a PL/SQL block returned through a cursor parameter. A
    /// promoted statement is never promoted again.
    PromotedToCursor,
}

/// Statement adapter over a native statement handle.
pub struct OciStatement<'c, N: OciNative + 'static> {
    connection: &'c OciConnection<N>,
    query: String,
    handle: Option<Owned<N, StatementHandle>>,
    execution: Execution,
    attributes: AttributeSet,
    fetch_mode: FetchMode,
    lobs: Vec<LobBinding<N>>,
    cursor: Option<Owned<N, StatementHandle>>,
    /// Parameters the execution writes back.
    outputs: Vec<(String, Param)>,
    columns: Vec<ColumnBinding<N>>,
    shape: ResultShape,
    /// Locators of fetched large objects, readable until the cursor closes.
    fetched: Vec<Rc<LobSlot<N>>>,
    /// Output large objects turned into streams, freed with the statement.
    retained: Vec<Rc<LobSlot<N>>>,
    /// Fetched large objects are copied into memory, the cursor closes before
    /// the caller reads them.
    materialize: bool,
    diagnostics: Diagnostics,
}

impl<'c, N: OciNative + 'static> OciStatement<'c, N> {
    pub(crate) fn new(
        connection: &'c OciConnection<N>,
        handle: Owned<N, StatementHandle>,
        query: &str,
        attributes: AttributeSet,
    ) -> Result<Self> {
        let statement = Self {
            connection,
            query: query.to_string(),
            handle: Some(handle),
            execution: Execution::Direct,
            attributes,
            fetch_mode: FetchMode::default(),
            lobs: Vec::new(),
            cursor: None,
            outputs: Vec::new(),
            columns: Vec::new(),
            shape: ResultShape::default(),
            fetched: Vec::new(),
            retained: Vec::new(),
            materialize: false,
            diagnostics: Diagnostics::default(),
        };
        let handle = statement.handle()?;
        let prefetch = statement.attributes.settings().prefetch;
        statement.check(statement.native().set_prefetch(handle, prefetch))?;
        Ok(statement)
    }

    pub fn execution(&self) -> Execution {
        self.execution
    }

    /// Fetched large objects still tracked for their open streams.
    pub fn fetched_lobs(&self) -> usize {
        self.fetched.len()
    }

    pub fn is_closed(&self) -> bool {
        self.handle.as_ref().and_then(Owned::get).is_none()
    }

    fn native(&self) -> &N {
        &self.connection.native
    }

    fn handle(&self) -> Result<StatementHandle> {
        match self.handle.as_ref().and_then(Owned::get) {
            Some(handle) => Ok(handle),
            None => fail(DbError::usage(format!(
                "The statement is closed: {}",
                truncate_long!(self.query)
            ))),
        }
    }

    fn source(&self) -> ErrorSource {
        match self.handle.as_ref().and_then(Owned::get) {
            Some(handle) => ErrorSource::Statement(handle),
            None => ErrorSource::Global,
        }
    }

    /// Raises the pending connection error, then the statement one.
    fn raise_from(&self, source: ErrorSource) -> Result<()> {
        self.connection.raise()?;
        let scope = Scope {
            source,
            mode: self.attributes.settings().error_mode,
            query: Some(&self.query),
        };
        self.diagnostics.raise(self.native(), scope)
    }

    fn check<S: Sentinel>(&self, result: S) -> Result<S> {
        if result.failed() {
            self.raise_from(self.source())?;
        }
        Ok(result)
    }

    /// Like [`Self::check`] for calls whose result the operation cannot go on without.
    fn required<T>(&self, result: Option<T>, what: impl FnOnce() -> String) -> Result<T> {
        match self.check(result)? {
            Some(v) => Ok(v),
            None => fail(DbError::Native {
                code: 0,
                message: what(),
            }),
        }
    }

    /// Stream over `lob`, read into memory when the statement materializes.
    fn lob_stream(&self, lob: Rc<LobSlot<N>>) -> Result<Stream> {
        let stream = lob::open_as_stream(lob)?;
        if self.materialize {
            return Ok(Stream::from_bytes(stream.contents()?));
        }
        Ok(stream)
    }

    fn lob_char_width(&self) -> usize {
        self.attributes
            .settings()
            .lob_char_width
            .unwrap_or_else(|| charset_width(self.connection.dsn().charset()))
    }

    fn new_lob(&self, native_type: NativeType) -> Result<Rc<LobSlot<N>>> {
        let kind = types::descriptor_kind(native_type).unwrap_or(DescriptorKind::Lob);
        let handle = self.required(self.connection.new_descriptor(kind)?, || {
            format!("Could not allocate a {:?} descriptor", kind)
        })?;
        let width = if native_type == NativeType::CLOB {
            self.lob_char_width()
        } else {
            1
        };
        Ok(Rc::new(LobSlot::owned(
            self.connection.native.clone(),
            handle,
            width,
        )))
    }

    fn bind_lob(
        &mut self,
        marker: &str,
        param: &Param,
        native_type: NativeType,
        output: bool,
    ) -> Result<()> {
        let statement = self.handle()?;
        let lob = self.new_lob(native_type)?;
        self.check(self.native().bind_by_name(
            statement,
            marker,
            BindTarget::Lob(lob.handle()),
            -1,
            native_type,
        ))?;
        if !output {
            if let Some(temporary) = types::temporary_kind(native_type) {
                let handle = lob.handle();
                match param.get() {
                    Value::Stream(stream) => {
                        self.check(self.native().lob_write_temporary(handle, b"", temporary))?;
                        while !stream.eof() {
                            let chunk = stream.read_chunk(LOB_CHUNK_SIZE)?;
                            if chunk.is_empty() {
                                break;
                            }
                            self.check(self.native().lob_write(handle, &chunk))?;
                            self.check(self.native().lob_flush(handle))?;
                        }
                    }
                    value => {
                        let data = value.to_bytes()?;
                        self.check(self.native().lob_write_temporary(handle, &data, temporary))?;
                        self.check(self.native().lob_flush(handle))?;
                    }
                }
            }
        }
        self.lobs.push(LobBinding {
            native_type,
            lob,
            param: param.clone(),
            input: !output,
        });
        Ok(())
    }

    fn bind_cursor(&mut self, marker: &str) -> Result<()> {
        let statement = self.handle()?;
        let kind = self.required(self.native().statement_type(statement), || {
            "Could not get the statement type".to_string()
        })?;
        if !matches!(kind.as_str(), "BEGIN" | "DECLARE") {
            return fail(DbError::usage(format!(
                "Bind cursor only in BEGIN or DECLARE statement, found {}",
                kind
            )));
        }
        let cursor = self.required(self.connection.new_cursor()?, || {
            "Could not allocate a cursor".to_string()
        })?;
        let owned = Owned::new(self.connection.native.clone(), cursor, N::free_statement);
        self.check(self.native().bind_by_name(
            statement,
            marker,
            BindTarget::Cursor(cursor),
            -1,
            NativeType::CURSOR,
        ))?;
        self.cursor = Some(owned);
        Ok(())
    }

    /// Executes the current handle and settles what the execution produced.
    fn run(&mut self) -> Result<()> {
        let statement = self.handle()?;
        let mode = self.connection.commit_mode();
        log::debug!(
            "Executing {} ({:?}, {:?})",
            truncate_long!(self.query),
            mode,
            self.execution
        );
        self.check(self.native().execute(statement, mode))?;
        self.scan()?;
        for binding in mem::take(&mut self.lobs) {
            if binding.input {
                let freed = binding.lob.free();
                self.check(freed)?;
            } else {
                log::debug!("Output {} turned into a stream", binding.native_type);
                let stream = lob::open_as_stream(binding.lob.clone())?;
                binding.param.set(Value::Stream(stream));
                self.retained.push(binding.lob);
            }
        }
        for (marker, param) in &self.outputs {
            if let Some(value) = self.native().bound_value(statement, marker) {
                if let Some(value) = value.into_value() {
                    param.set(value);
                }
            }
        }
        Ok(())
    }

    /// Records the labels and the large object columns of the result set.
    fn scan(&mut self) -> Result<()> {
        self.fetched.clear();
        let count = self.column_count()?;
        let width = self.lob_char_width();
        let mut shape = ResultShape::default();
        for column in 0..count {
            let meta = self.column_meta(column)?;
            if meta.is_lob() {
                let width = if meta.native_type == "CLOB" { width } else { 1 };
                shape.lob_columns.push((column, width));
            }
            shape.names.push(meta.name);
        }
        let case = self.attributes.settings().case;
        shape.labels = shape.names.iter().map(|v| case.apply(v)).collect();
        self.shape = shape;
        Ok(())
    }

    fn convert(&mut self, column: usize, value: NativeValue, nulls: OracleNulls) -> Result<Value> {
        let lob_width = self.shape.lob_width(column);
        let value = match value {
            NativeValue::Lob(handle) => {
                let lob = Rc::new(LobSlot::fetched(
                    self.connection.native.clone(),
                    handle,
                    lob_width.unwrap_or(1),
                ));
                let stream = self.lob_stream(lob.clone())?;
                if !self.materialize {
                    // Slots whose streams were dropped
                    self.fetched.retain(|v| Rc::weak_count(v) > 0);
                    self.fetched.push(lob);
                }
                return Ok(Value::Stream(stream));
            }
            value => value.into_value().unwrap_or(Value::Null),
        };
        let value = match (nulls, value) {
            (OracleNulls::EmptyString, Value::Varchar(v)) if v.is_empty() => Value::Null,
            (OracleNulls::ToString, Value::Null) => Value::Varchar(String::new()),
            (_, value) => value,
        };
        if lob_width.is_some() && !value.is_null() {
            return Ok(Value::Stream(Stream::from_bytes(value.to_bytes()?)));
        }
        Ok(value)
    }

    fn convert_row(&mut self, row: Vec<NativeValue>) -> Result<Vec<Value>> {
        let nulls = self.attributes.settings().oracle_nulls;
        let mut result = Vec::with_capacity(row.len());
        for (column, value) in row.into_iter().enumerate() {
            result.push(self.convert(column, value, nulls)?);
        }
        Ok(result)
    }

    /// Next row by position, with bound columns refreshed.
    fn next_values(&mut self) -> Result<Option<Vec<Value>>> {
        let Some(statement) = self.cursor_handle() else {
            return Ok(None);
        };
        let Some(row) = self.check(self.native().fetch_row(statement))? else {
            return Ok(None);
        };
        let values = self.convert_row(row)?;
        for column in &self.columns {
            match (&column.lob, self.shape.position(&column.name)) {
                (Some(lob), _) => column.param.set(Value::Stream(self.lob_stream(lob.clone())?)),
                (None, Some(position)) => column.param.set(values[position].clone()),
                (None, None) => {}
            }
        }
        Ok(Some(values))
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        Ok(self
            .next_values()?
            .map(|values| Row::new(self.shape.labels.clone(), values)))
    }

    /// Handle rows are fetched from, `None` once the cursor is closed.
    fn cursor_handle(&self) -> Option<StatementHandle> {
        let handle = self.handle.as_ref().and_then(Owned::get);
        if handle.is_none() {
            log::debug!(
                "The cursor of {} is closed, no more rows",
                truncate_long!(self.query)
            );
        }
        handle
    }

    /// Every remaining row through the native bulk fetch.
    fn rest(&mut self) -> Result<Vec<Vec<Value>>> {
        let Some(statement) = self.cursor_handle() else {
            return Ok(Vec::new());
        };
        let rows = self
            .check(self.native().fetch_all(statement))?
            .unwrap_or_default();
        rows.into_iter().map(|row| self.convert_row(row)).collect()
    }

    /// Every remaining row in the shape of `style`.
    fn collect_rows(
        &mut self,
        style: Option<FetchStyle>,
        argument: FetchArgument<'_>,
    ) -> Result<Vec<FetchedRow>> {
        let style = style.unwrap_or(self.attributes.settings().default_fetch_style);
        let mut result = Vec::new();
        match (style, argument) {
            (FetchStyle::Assoc, _) => {
                for values in self.rest()? {
                    result.push(FetchedRow::Assoc(Row::new(self.shape.labels.clone(), values)));
                }
            }
            (FetchStyle::Num, _) => {
                result.extend(self.rest()?.into_iter().map(FetchedRow::Num));
            }
            (FetchStyle::Column, argument @ (FetchArgument::None | FetchArgument::Column(..))) => {
                let column = match argument {
                    FetchArgument::Column(column) => column,
                    _ => 0,
                };
                for mut values in self.rest()? {
                    if column >= values.len() {
                        return fail(DbError::usage(format!(
                            "Column {} is out of range, the result set has {} columns",
                            column,
                            values.len()
                        )));
                    }
                    result.push(FetchedRow::Value(values.swap_remove(column)));
                }
            }
            (FetchStyle::Obj, _) => {
                while let Some(row) = self.next_row()? {
                    result.push(FetchedRow::Object(row.into()));
                }
            }
            (FetchStyle::Func, FetchArgument::Func(function)) => {
                while let Some(values) = self.next_values()? {
                    result.push(FetchedRow::Value(function(values)));
                }
            }
            (FetchStyle::Class, argument @ (FetchArgument::None | FetchArgument::Class { .. })) => {
                let (class, args) = match argument {
                    FetchArgument::Class { name, args } => (self.resolve_class(&name)?, args),
                    _ => (self.resolve_class(ClassRegistry::GENERIC)?, Vec::new()),
                };
                while let Some(row) = self.fetch_instance(&class, &args)? {
                    result.push(row);
                }
            }
            (FetchStyle::Column | FetchStyle::Func | FetchStyle::Class, _) => {
                return fail(DbError::usage(format!(
                    "Fetch style {} was given a fetch argument of another style",
                    style
                )));
            }
            (style, _) => {
                return fail(DbError::not_implemented(format!(
                    "Fetch style {} is not implemented in fetch_all",
                    style
                )));
            }
        }
        Ok(result)
    }

    fn resolve_class(&self, name: &str) -> Result<ClassRef> {
        self.connection.classes().resolve(name)
    }

    fn fetch_instance(&mut self, class: &ClassRef, args: &[Value]) -> Result<Option<FetchedRow>> {
        let Some(row) = self.next_row()? else {
            return Ok(None);
        };
        if class.name() == ClassRegistry::GENERIC {
            return Ok(Some(FetchedRow::Object(row.into())));
        }
        let mut instance = class.instantiate(args)?;
        populate(&row, &mut *instance)?;
        Ok(Some(FetchedRow::Instance(instance)))
    }
}

impl<'c, N: OciNative + 'static> Statement for OciStatement<'c, N> {
    fn query_string(&self) -> &str {
        &self.query
    }

    fn bind_param(
        &mut self,
        name: &str,
        param: &Param,
        kind: ParamType,
        max_length: Option<usize>,
    ) -> Result<()> {
        let marker = if name.starts_with(':') {
            name.to_string()
        } else {
            format!(":{}", name)
        };
        if !contains_ignore_ascii_case(&self.query, &marker) {
            log::debug!(
                "Parameter {} does not appear in {}, nothing to bind",
                marker,
                truncate_long!(self.query)
            );
            return Ok(());
        }
        let output = kind.is_input_output();
        let native_type = types::bind_type(kind);
        if native_type == NativeType::CHR && !matches!(*param.borrow(), Value::List(..)) {
            let text = param.borrow().to_text()?;
            param.set(text.map_or(Value::Null, Value::Varchar));
        }
        let strategy = BindStrategy::of(&param.borrow(), native_type);
        let statement = self.handle()?;
        self.outputs.retain(|(k, _)| !k.eq_ignore_ascii_case(&marker));
        let max_length = max_length.map_or(DEFAULT_BIND_LENGTH, |v| v as i64);
        match strategy {
            BindStrategy::Array => {
                let NativeValue::Array(values) = NativeValue::from_value(&param.borrow())? else {
                    return fail(DbError::usage("Array binding requires a list"));
                };
                let count = values.len();
                self.check(self.native().bind_array_by_name(
                    statement,
                    &marker,
                    values,
                    count,
                    max_length,
                    native_type,
                ))?;
                self.outputs.push((marker, param.clone()));
            }
            BindStrategy::Cursor => self.bind_cursor(&marker)?,
            BindStrategy::Lob(..) => self.bind_lob(&marker, param, native_type, output)?,
            BindStrategy::Scalar => {
                let value = NativeValue::from_value(&param.borrow())?;
                self.check(self.native().bind_by_name(
                    statement,
                    &marker,
                    BindTarget::Value(value),
                    max_length,
                    native_type,
                ))?;
                self.outputs.push((marker, param.clone()));
            }
        }
        Ok(())
    }

    fn bind_column(
        &mut self,
        column: ColumnRef,
        param: &Param,
        kind: ParamType,
        _max_length: Option<usize>,
    ) -> Result<()> {
        let statement = self.handle()?;
        let native_type = types::bind_type(kind);
        let name = match column {
            ColumnRef::Name(name) => name,
            ColumnRef::Index(index) => {
                self.required(self.native().field_name(statement, index + 1), || {
                    format!("Column {} does not exist", index)
                })?
            }
        };
        let strategy = BindStrategy::of(&param.borrow(), native_type);
        self.columns.retain(|v| !v.name.eq_ignore_ascii_case(&name));
        match strategy {
            BindStrategy::Array => {
                return fail(DbError::usage(format!(
                    "Column {} cannot be bound to a list, arrays bind to parameters only",
                    name
                )));
            }
            BindStrategy::Cursor => {
                return fail(DbError::usage(format!(
                    "Column {} cannot be bound as a cursor, cursors bind to parameters only",
                    name
                )));
            }
            BindStrategy::Lob(..) => {
                let lob = self.new_lob(native_type)?;
                self.check(self.native().define_by_name(
                    statement,
                    &name,
                    DefineTarget::Lob(lob.handle()),
                    native_type,
                ))?;
                self.columns.push(ColumnBinding {
                    name,
                    param: param.clone(),
                    lob: Some(lob),
                });
            }
            BindStrategy::Scalar => {
                self.check(self.native().define_by_name(
                    statement,
                    &name,
                    DefineTarget::Variable,
                    native_type,
                ))?;
                self.columns.push(ColumnBinding {
                    name,
                    param: param.clone(),
                    lob: None,
                });
            }
        }
        Ok(())
    }

    fn execute_with(&mut self, params: &[(&str, Value)]) -> Result<()> {
        for (name, value) in params {
            self.bind_param(name, &Param::new(value.clone()), ParamType::STR, None)?;
        }
        self.run()?;
        if let Some(cursor) = self.cursor.take() {
            self.close_cursor()?;
            self.handle = Some(cursor);
            self.execution = Execution::PromotedToCursor;
            log::debug!("Statement promoted to its cursor parameter");
            self.run()?;
        }
        Ok(())
    }

    fn fetch(
        &mut self,
        style: Option<FetchStyle>,
        orientation: Orientation,
        offset: i64,
    ) -> Result<Option<FetchedRow>> {
        if orientation != Orientation::Next {
            return fail(DbError::usage(format!(
                "Only the next cursor orientation is allowed, {} requested",
                orientation
            )));
        }
        if offset != 0 {
            return fail(DbError::usage(format!(
                "Only 0 cursor offset is allowed, {} requested",
                offset
            )));
        }
        let style = style.unwrap_or(self.attributes.settings().default_fetch_style);
        match style {
            FetchStyle::Assoc => Ok(self.next_row()?.map(FetchedRow::Assoc)),
            FetchStyle::Num => Ok(self.next_values()?.map(FetchedRow::Num)),
            FetchStyle::Both => Ok(self.next_row()?.map(FetchedRow::Both)),
            FetchStyle::Column => {
                let column = match self.fetch_mode {
                    FetchMode::Column(column) => column,
                    _ => 0,
                };
                Ok(self.fetch_column(column)?.map(FetchedRow::Value))
            }
            FetchStyle::Obj => Ok(self
                .next_row()?
                .map(|row| FetchedRow::Object(Record::from(row)))),
            FetchStyle::Into => {
                let FetchMode::Into(target) = &self.fetch_mode else {
                    return fail(DbError::usage(
                        "The into fetch style needs a target object, set it with set_fetch_mode",
                    ));
                };
                let target = target.clone();
                let Some(row) = self.next_row()? else {
                    return Ok(None);
                };
                populate(&row, &mut *target.borrow_mut())?;
                Ok(Some(FetchedRow::Into(target)))
            }
            FetchStyle::Class => {
                let (class, args) = match &self.fetch_mode {
                    FetchMode::Class { class, args } => (class.clone(), args.clone()),
                    _ => (self.resolve_class(ClassRegistry::GENERIC)?, Vec::new()),
                };
                self.fetch_instance(&class, &args)
            }
            style => fail(DbError::not_implemented(format!(
                "Fetch style {} is not implemented in fetch",
                style
            ))),
        }
    }

    fn fetch_all(
        &mut self,
        style: Option<FetchStyle>,
        argument: FetchArgument<'_>,
    ) -> Result<Vec<FetchedRow>> {
        let materialize = mem::replace(&mut self.materialize, true);
        let result = self.collect_rows(style, argument);
        self.materialize = materialize;
        let result = result?;
        self.close_cursor()?;
        Ok(result)
    }

    fn fetch_column(&mut self, index: usize) -> Result<Option<Value>> {
        Ok(self
            .next_values()?
            .and_then(|values| values.into_iter().nth(index)))
    }

    fn fetch_object(&mut self, class: &str, args: Vec<Value>) -> Result<Option<FetchedRow>> {
        let class = self.resolve_class(class)?;
        self.fetch_instance(&class, &args)
    }

    fn set_fetch_mode(&mut self, args: Vec<FetchArg>) -> Result<()> {
        let mode = FetchMode::from_args(args, &self.connection.classes())?;
        self.attributes
            .set_attribute(Attribute::DefaultFetchMode, mode.style().into());
        self.fetch_mode = mode;
        Ok(())
    }

    fn close_cursor(&mut self) -> Result<()> {
        self.outputs.clear();
        self.fetched.clear();
        self.shape = ResultShape::default();
        self.cursor = None;
        if let Some(mut handle) = self.handle.take() {
            if let Some(statement) = handle.get() {
                if !handle.release().unwrap_or(true) {
                    self.raise_from(ErrorSource::Statement(statement))?;
                }
            }
        }
        for binding in mem::take(&mut self.lobs) {
            let freed = binding.lob.free();
            self.check(freed)?;
        }
        for column in mem::take(&mut self.columns) {
            if let Some(lob) = column.lob {
                let freed = lob.free();
                self.check(freed)?;
            }
        }
        Ok(())
    }

    fn row_count(&self) -> Result<u64> {
        let statement = self.handle()?;
        self.required(self.native().num_rows(statement), || {
            "Could not count the rows".to_string()
        })
    }

    fn column_count(&self) -> Result<usize> {
        let statement = self.handle()?;
        Ok(self
            .check(self.native().num_fields(statement))?
            .unwrap_or_default())
    }

    fn column_meta(&self, index: usize) -> Result<ColumnMeta> {
        let statement = self.handle()?;
        let column = index + 1;
        let describe = || format!("Could not describe column {}", index);
        let native = self.native();
        let native_type = self.required(native.field_type(statement, column), describe)?;
        let decl_type = self.required(native.field_type_raw(statement, column), describe)?;
        let name = self.required(native.field_name(statement, column), describe)?;
        let len = self.required(native.field_size(statement, column), describe)?;
        let precision = self.required(native.field_precision(statement, column), describe)?;
        Ok(ColumnMeta {
            param_type: types::param_type(&native_type),
            native_type,
            decl_type,
            flags: Vec::new(),
            name,
            table: None,
            len,
            precision,
        })
    }

    fn get_attribute(&self, attribute: Attribute) -> Option<AttributeValue> {
        self.attributes.get_attribute(attribute)
    }

    fn set_attribute(&mut self, attribute: Attribute, value: AttributeValue) -> bool {
        self.attributes.set_attribute(attribute, value)
    }

    fn error_info(&self) -> ErrorInfo {
        self.diagnostics.info(self.native(), self.source())
    }
}

impl<'c, N: OciNative + 'static> Drop for OciStatement<'c, N> {
    fn drop(&mut self) {
        if let Err(e) = self.close_cursor() {
            log::warn!("Statement dropped with a release failure: {:#}", e);
        }
        for lob in mem::take(&mut self.retained) {
            let freed = lob.free();
            if let Err(e) = self.check(freed) {
                log::warn!("Statement dropped with a release failure: {:#}", e);
            }
        }
    }
}

impl<'c, N: OciNative + 'static> fmt::Debug for OciStatement<'c, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OciStatement")
            .field("query", &self.query)
            .field("handle", &self.handle)
            .field("execution", &self.execution)
            .field("fetch_mode", &self.fetch_mode)
            .finish()
    }
}
