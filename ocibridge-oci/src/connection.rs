use crate::{
    CommitMode, ConnectParams, ConnectionHandle, DescriptorKind, ErrorSource, LobHandle, NAME,
    OciNative, OciStatement, SessionMode, StatementHandle,
    diagnostics::{Diagnostics, Scope, Sentinel},
    handle::Owned,
    lob::charset_width,
};
use ocibridge_core::{
    Attribute, AttributeSet, AttributeValue, ClassRegistry, Connection, Context, DbError, Dsn,
    ErrorInfo, FetchTarget, ReadOnlyAttributes, Result, Settings, Value, fail, truncate_long,
};
use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

/// Connection adapter owning one native connection handle.
pub struct OciConnection<N: OciNative + 'static> {
    pub(crate) native: Rc<N>,
    handle: RefCell<Option<Owned<N, ConnectionHandle>>>,
    attributes: RefCell<AttributeSet>,
    dsn: Dsn,
    /// Commit mode remembered by the transaction in flight.
    transaction: Cell<Option<CommitMode>>,
    diagnostics: Diagnostics,
    classes: RefCell<ClassRegistry>,
}

impl<N: OciNative + 'static> OciConnection<N> {
    /// Opens a connection described by `dsn`.
    ///
    /// The username `/` with no password authenticates with external
    /// credentials. When the [`Attribute::Strict`] option is disabled a failed
    /// open reports [`DbError::NoConnection`] and keeps the backend detail out.
    pub fn open(
        native: Rc<N>,
        dsn: &str,
        username: Option<&str>,
        password: Option<&str>,
        options: Vec<(Attribute, AttributeValue)>,
    ) -> Result<Self> {
        let dsn = Dsn::parse(dsn).context("While opening an oci connection")?;
        if dsn.driver != NAME {
            return fail(DbError::configuration(format!(
                "You must use the {} driver, the data source name declares `{}`",
                NAME, dsn.driver
            )));
        }
        let mut read_only = ReadOnlyAttributes::new(NAME);
        read_only.client_version = native.client_version();
        let attributes = AttributeSet::with_options(read_only, Settings::default(), options);
        let settings = attributes.settings().clone();
        let session_mode = if username == Some("/") && password.is_none_or(str::is_empty) {
            SessionMode::CredExt
        } else {
            SessionMode::Default
        };
        let params = ConnectParams {
            username,
            password,
            dbname: dsn.dbname(),
            charset: dsn.charset(),
            session_mode,
            persistent: settings.persistent,
        };
        log::debug!(
            "Opening a {} connection to `{}` ({:?})",
            if params.persistent { "persistent" } else { "new" },
            params.dbname,
            params.session_mode,
        );
        let Some(handle) = native.connect(&params) else {
            let record = native.take_error(ErrorSource::Global);
            if !settings.strict {
                return fail(DbError::NoConnection);
            }
            let (code, message) = match record {
                Some(record) => (record.code, record.message),
                None => (0, "The native layer returned no connection".to_string()),
            };
            return fail(DbError::Connection { code, message });
        };
        let connection = Self {
            handle: RefCell::new(Some(Owned::new(native.clone(), handle, N::close))),
            native,
            attributes: RefCell::new(attributes),
            dsn,
            transaction: Cell::new(None),
            diagnostics: Diagnostics::default(),
            classes: RefCell::new(ClassRegistry::new()),
        };
        if let Some(version) = connection.check(connection.native.server_version(handle))? {
            connection
                .attributes
                .borrow_mut()
                .backend_reported(Attribute::ServerVersion, version);
        }
        Ok(connection)
    }

    pub fn dsn(&self) -> &Dsn {
        &self.dsn
    }

    /// Whether the native connection is still open.
    pub fn is_open(&self) -> bool {
        self.handle
            .borrow()
            .as_ref()
            .and_then(Owned::get)
            .is_some()
    }

    /// Effective attributes.
    pub fn settings(&self) -> Settings {
        self.attributes.borrow().settings().clone()
    }

    /// Commit mode each execution uses: the one remembered by the transaction
    /// in flight, otherwise derived from [`Attribute::Autocommit`].
    pub fn commit_mode(&self) -> CommitMode {
        if let Some(mode) = self.transaction.get() {
            return mode;
        }
        if self.attributes.borrow().settings().autocommit {
            CommitMode::CommitOnSuccess
        } else {
            self.no_auto_commit()
        }
    }

    fn no_auto_commit(&self) -> CommitMode {
        if self.native.supports_no_auto_commit() {
            CommitMode::NoAutoCommit
        } else {
            CommitMode::Default
        }
    }

    /// Bytes per character of the character large objects of this connection.
    pub fn lob_char_width(&self) -> usize {
        self.attributes
            .borrow()
            .settings()
            .lob_char_width
            .unwrap_or_else(|| charset_width(self.dsn.charset()))
    }

    /// Makes `name` available to the class fetch styles.
    pub fn register_class<F>(&self, name: &str, factory: F)
    where
        F: Fn(&[Value]) -> Result<Box<dyn FetchTarget>> + 'static,
    {
        self.classes.borrow_mut().register(name, factory);
    }

    pub(crate) fn classes(&self) -> ClassRegistry {
        self.classes.borrow().clone()
    }

    pub(crate) fn handle(&self) -> Result<ConnectionHandle> {
        match self.handle.borrow().as_ref().and_then(Owned::get) {
            Some(handle) => Ok(handle),
            None => fail(DbError::usage("The connection is closed")),
        }
    }

    fn scope(&self) -> Scope<'static> {
        let source = match self.handle.borrow().as_ref().and_then(Owned::get) {
            Some(handle) => ErrorSource::Connection(handle),
            None => ErrorSource::Global,
        };
        Scope {
            source,
            mode: self.attributes.borrow().settings().error_mode,
            query: None,
        }
    }

    /// Raises the pending connection error, if any.
    pub(crate) fn raise(&self) -> Result<()> {
        self.diagnostics.raise(&*self.native, self.scope())
    }

    pub(crate) fn check<S: Sentinel>(&self, result: S) -> Result<S> {
        self.diagnostics.check(&*self.native, self.scope(), result)
    }

    pub(crate) fn new_descriptor(&self, kind: DescriptorKind) -> Result<Option<LobHandle>> {
        let connection = self.handle()?;
        Ok(self.native.new_descriptor(connection, kind))
    }

    pub(crate) fn new_cursor(&self) -> Result<Option<StatementHandle>> {
        let connection = self.handle()?;
        Ok(self.native.new_cursor(connection))
    }
}

impl<N: OciNative + 'static> Connection for OciConnection<N> {
    type Statement<'c>
        = OciStatement<'c, N>
    where
        Self: 'c;

    fn prepare(
        &self,
        sql: &str,
        options: Vec<(Attribute, AttributeValue)>,
    ) -> Result<OciStatement<'_, N>> {
        let connection = self.handle()?;
        log::debug!("Preparing {}", truncate_long!(sql));
        let Some(statement) = self.check(self.native.parse(connection, sql))? else {
            return fail(DbError::Native {
                code: 0,
                message: format!("Could not parse {}", truncate_long!(sql)),
            });
        };
        let statement = Owned::new(self.native.clone(), statement, N::free_statement);
        let attributes = {
            let attributes = self.attributes.borrow();
            AttributeSet::with_options(
                attributes.read_only().clone(),
                attributes.settings().clone(),
                options,
            )
        };
        OciStatement::new(self, statement, sql, attributes)
    }

    fn begin_transaction(&self) -> Result<()> {
        if self.in_transaction() {
            return fail(DbError::usage("Transaction already is active"));
        }
        self.transaction.set(Some(self.no_auto_commit()));
        log::debug!("Transaction started");
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        if !self.in_transaction() {
            return fail(DbError::usage("There is no active transaction"));
        }
        let connection = self.handle()?;
        if self.check(self.native.commit(connection))? {
            self.transaction.set(None);
            log::debug!("Transaction committed");
        }
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        if !self.in_transaction() {
            return fail(DbError::usage("There is no active transaction"));
        }
        let connection = self.handle()?;
        if self.check(self.native.rollback(connection))? {
            self.transaction.set(None);
            log::debug!("Transaction rolled back");
        }
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.transaction.get().is_some()
    }

    fn get_attribute(&self, attribute: Attribute) -> Option<AttributeValue> {
        self.attributes.borrow().get_attribute(attribute)
    }

    fn set_attribute(&self, attribute: Attribute, value: AttributeValue) -> bool {
        self.attributes.borrow_mut().set_attribute(attribute, value)
    }

    fn error_info(&self) -> ErrorInfo {
        self.diagnostics.info(&*self.native, self.scope().source)
    }

    fn close(&self) -> Result<()> {
        let Some(mut handle) = self.handle.borrow_mut().take() else {
            return Ok(());
        };
        let Some(connection) = handle.get() else {
            return Ok(());
        };
        if handle.release().unwrap_or(true) {
            log::debug!("Connection closed");
            return Ok(());
        }
        let scope = Scope {
            source: ErrorSource::Connection(connection),
            ..self.scope()
        };
        self.diagnostics.raise(&*self.native, scope)
    }
}

impl<N: OciNative + 'static> Drop for OciConnection<N> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Connection dropped with a release failure: {:#}", e);
        }
    }
}

impl<N: OciNative + 'static> fmt::Debug for OciConnection<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OciConnection")
            .field("dsn", &self.dsn)
            .field("handle", &self.handle.borrow())
            .field("transaction", &self.transaction.get())
            .finish()
    }
}
