use crate::{
    Attribute, AttributeValue, DbError, ErrorInfo, ParamType, Result, Statement, fail,
};

/// A client connection.
///
/// Every method takes `&self`: statements borrow the connection they were
/// prepared on and share its transaction state.
pub trait Connection {
    type Statement<'c>: Statement
    where
        Self: 'c;

    /// Prepares `sql`. The `options` override the connection attributes for
    /// this statement only.
    fn prepare(
        &self,
        sql: &str,
        options: Vec<(Attribute, AttributeValue)>,
    ) -> Result<Self::Statement<'_>>;

    /// Prepares and executes `sql`, returning the executed statement.
    fn query(&self, sql: &str) -> Result<Self::Statement<'_>> {
        let mut statement = self.prepare(sql, Vec::new())?;
        statement.execute()?;
        Ok(statement)
    }

    /// Executes `sql` and returns the number of rows affected.
    fn exec(&self, sql: &str) -> Result<u64> {
        let mut statement = self.query(sql)?;
        let count = statement.row_count()?;
        statement.close_cursor()?;
        Ok(count)
    }

    /// Quotes a string literal. Any other type must go through bound parameters.
    fn quote(&self, text: &str, kind: ParamType) -> Result<String> {
        if kind != ParamType::STR {
            return fail(DbError::usage(format!(
                "Cannot quote a value of type {}, use prepare and bind parameters",
                kind
            )));
        }
        Ok(format!("'{}'", text.replace('\'', "''")))
    }

    fn last_insert_id(&self, _name: Option<&str>) -> Result<String> {
        fail(DbError::not_implemented("last_insert_id"))
    }

    fn begin_transaction(&self) -> Result<()>;

    fn commit(&self) -> Result<()>;

    fn rollback(&self) -> Result<()>;

    fn in_transaction(&self) -> bool;

    fn get_attribute(&self, attribute: Attribute) -> Option<AttributeValue>;

    /// Returns `false` without changing anything when the key is read only.
    fn set_attribute(&self, attribute: Attribute, value: AttributeValue) -> bool;

    fn error_code(&self) -> &'static str {
        self.error_info().sqlstate
    }

    fn error_info(&self) -> ErrorInfo;

    /// Releases the native connection. Closing twice is a no-op.
    fn close(&self) -> Result<()>;
}
