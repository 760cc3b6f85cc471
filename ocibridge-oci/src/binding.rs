use crate::{NativeType, OciNative, lob::LobSlot};
use ocibridge_core::Param;
use std::rc::Rc;

/// Large object bound to a named parameter, alive until the execution
/// resolves it or the statement closes.
pub(crate) struct LobBinding<N: OciNative> {
    pub(crate) native_type: NativeType,
    pub(crate) lob: Rc<LobSlot<N>>,
    pub(crate) param: Param,
    /// Written before the execution and freed right after it. Outputs turn
    /// into streams instead.
    pub(crate) input: bool,
}

/// Result column bound to a caller variable, refreshed by every fetch.
pub(crate) struct ColumnBinding<N: OciNative> {
    pub(crate) name: String,
    pub(crate) param: Param,
    /// Descriptor the native layer defines large object columns into.
    pub(crate) lob: Option<Rc<LobSlot<N>>>,
}

/// Labels and large object columns of the current result set.
#[derive(Debug, Default)]
pub(crate) struct ResultShape {
    /// Names as described by the native layer.
    pub(crate) names: Vec<String>,
    /// Names with the case attribute applied.
    pub(crate) labels: Rc<[String]>,
    /// Position and character width of each large object column.
    pub(crate) lob_columns: Vec<(usize, usize)>,
}

impl ResultShape {
    pub(crate) fn lob_width(&self, column: usize) -> Option<usize> {
        self.lob_columns
            .iter()
            .find(|(index, _)| *index == column)
            .map(|(_, width)| *width)
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|v| v.eq_ignore_ascii_case(name))
    }
}
