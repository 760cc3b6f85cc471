use crate::ParamType;

/// Metadata describing one result column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMeta {
    /// Backend type name (`VARCHAR2`, `NUMBER`, `CLOB`, ...).
    pub native_type: String,
    /// Raw backend type code.
    pub decl_type: i64,
    pub flags: Vec<String>,
    pub name: String,
    pub table: Option<String>,
    pub len: i64,
    pub precision: i64,
    /// Abstract type the column maps back to, if any.
    pub param_type: Option<ParamType>,
}

impl ColumnMeta {
    pub fn is_lob(&self) -> bool {
        matches!(self.native_type.as_str(), "BLOB" | "CLOB")
    }
}
