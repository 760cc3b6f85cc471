//! Mapping between the abstract parameter types and the native bind and
//! descriptor constants.

use crate::{DescriptorKind, NativeType, TempLobKind};
use ocibridge_core::{ParamType, Value};

/// Native bind type of an abstract parameter type. The input/output flag is ignored.
pub fn bind_type(kind: ParamType) -> NativeType {
    match kind.without_input_output() {
        ParamType::CLOB => NativeType::CLOB,
        ParamType::BLOB | ParamType::LOB => NativeType::BLOB,
        ParamType::CURSOR => NativeType::CURSOR,
        ParamType::BFILE => NativeType::BFILE,
        ParamType::CFILE => NativeType::CFILE,
        ParamType::ROWID => NativeType::RDD,
        _ => NativeType::CHR,
    }
}

/// Descriptor a bind type needs, `None` for types bound inline.
pub fn descriptor_kind(native_type: NativeType) -> Option<DescriptorKind> {
    match native_type {
        NativeType::BFILE | NativeType::CFILE => Some(DescriptorKind::File),
        NativeType::CLOB | NativeType::BLOB => Some(DescriptorKind::Lob),
        NativeType::RDD => Some(DescriptorKind::Rowid),
        _ => None,
    }
}

/// Temporary LOB flavour used to write input data, `None` for descriptors
/// that carry no content (files, row ids).
pub fn temporary_kind(native_type: NativeType) -> Option<TempLobKind> {
    match native_type {
        NativeType::CLOB => Some(TempLobKind::Clob),
        NativeType::BLOB => Some(TempLobKind::Blob),
        _ => None,
    }
}

/// Abstract type of a result column, from the backend type name.
pub fn param_type(native_type: &str) -> Option<ParamType> {
    Some(match native_type {
        "CHAR" | "NCHAR" | "VARCHAR" | "VARCHAR2" | "NVARCHAR2" | "LONG" | "NUMBER"
        | "FLOAT" | "BINARY_FLOAT" | "BINARY_DOUBLE" | "DATE" | "TIMESTAMP" => ParamType::STR,
        "CLOB" | "NCLOB" => ParamType::CLOB,
        "BLOB" => ParamType::LOB,
        "BFILE" => ParamType::BFILE,
        "CFILE" => ParamType::CFILE,
        "ROWID" | "UROWID" => ParamType::ROWID,
        "REFCURSOR" | "REF CURSOR" => ParamType::CURSOR,
        _ => return None,
    })
}

/// How a parameter is handed to the native layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindStrategy {
    /// The whole collection at once.
    Array,
    /// A nested statement handle filled by a PL/SQL block.
    Cursor,
    Lob(DescriptorKind),
    Scalar,
}

impl BindStrategy {
    pub fn of(value: &Value, native_type: NativeType) -> BindStrategy {
        if matches!(value, Value::List(..)) {
            return BindStrategy::Array;
        }
        if native_type == NativeType::CURSOR {
            return BindStrategy::Cursor;
        }
        match descriptor_kind(native_type) {
            Some(kind) => BindStrategy::Lob(kind),
            None => BindStrategy::Scalar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_types() {
        assert_eq!(bind_type(ParamType::STR), NativeType::CHR);
        assert_eq!(bind_type(ParamType::INT), NativeType::CHR);
        assert_eq!(bind_type(ParamType::BOOL), NativeType::CHR);
        assert_eq!(bind_type(ParamType::LOB), NativeType::BLOB);
        assert_eq!(bind_type(ParamType::BLOB), NativeType::BLOB);
        assert_eq!(bind_type(ParamType::CLOB.input_output()), NativeType::CLOB);
        assert_eq!(bind_type(ParamType::CURSOR), NativeType::CURSOR);
        assert_eq!(bind_type(ParamType(9999)), NativeType::CHR);
    }

    #[test]
    fn descriptors() {
        assert_eq!(descriptor_kind(NativeType::CLOB), Some(DescriptorKind::Lob));
        assert_eq!(descriptor_kind(NativeType::BLOB), Some(DescriptorKind::Lob));
        assert_eq!(descriptor_kind(NativeType::BFILE), Some(DescriptorKind::File));
        assert_eq!(descriptor_kind(NativeType::CFILE), Some(DescriptorKind::File));
        assert_eq!(descriptor_kind(NativeType::RDD), Some(DescriptorKind::Rowid));
        assert_eq!(descriptor_kind(NativeType::CHR), None);
        assert_eq!(descriptor_kind(NativeType::CURSOR), None);
        assert_eq!(temporary_kind(NativeType::BFILE), None);
    }

    #[test]
    fn reverse() {
        assert_eq!(param_type("VARCHAR2"), Some(ParamType::STR));
        assert_eq!(param_type("CLOB"), Some(ParamType::CLOB));
        assert_eq!(param_type("BLOB"), Some(ParamType::LOB));
        assert_eq!(param_type("ROWID"), Some(ParamType::ROWID));
        assert_eq!(param_type("XMLTYPE"), None);
    }

    #[test]
    fn strategies() {
        assert_eq!(
            BindStrategy::of(&Value::List(vec![1.into()]), NativeType::CHR),
            BindStrategy::Array
        );
        assert_eq!(
            BindStrategy::of(&Value::Null, NativeType::CURSOR),
            BindStrategy::Cursor
        );
        assert_eq!(
            BindStrategy::of(&"text".into(), NativeType::CLOB),
            BindStrategy::Lob(DescriptorKind::Lob)
        );
        assert_eq!(
            BindStrategy::of(&1.into(), NativeType::CHR),
            BindStrategy::Scalar
        );
    }
}
