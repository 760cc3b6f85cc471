use std::fmt::{self, Display};

/// Abstract parameter and column type.
///
/// The generic vocabulary (`NULL`, `INT`, `STR`, `LOB`, `STMT`, `BOOL`) shares
/// the value space with the backend specific kinds (`CLOB`, `BLOB`, `CURSOR`,
/// ...), so callers may pass either. [`ParamType::INPUT_OUTPUT`] is a modifier
/// bit marking the binding as an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamType(pub u32);

impl ParamType {
    pub const NULL: ParamType = ParamType(0);
    pub const INT: ParamType = ParamType(1);
    pub const STR: ParamType = ParamType(2);
    pub const LOB: ParamType = ParamType(3);
    pub const STMT: ParamType = ParamType(4);
    pub const BOOL: ParamType = ParamType(5);
    pub const ROWID: ParamType = ParamType(104);
    pub const CLOB: ParamType = ParamType(112);
    pub const BLOB: ParamType = ParamType(113);
    pub const BFILE: ParamType = ParamType(114);
    pub const CFILE: ParamType = ParamType(115);
    pub const CURSOR: ParamType = ParamType(116);

    pub const INPUT_OUTPUT: u32 = 0x8000_0000;

    pub const fn is_input_output(self) -> bool {
        self.0 & Self::INPUT_OUTPUT == Self::INPUT_OUTPUT
    }

    /// The type with the input/output modifier removed.
    pub const fn without_input_output(self) -> ParamType {
        ParamType(self.0 & !Self::INPUT_OUTPUT)
    }

    /// The type marked as an output binding.
    pub const fn input_output(self) -> ParamType {
        ParamType(self.0 | Self::INPUT_OUTPUT)
    }
}

impl Default for ParamType {
    fn default() -> Self {
        ParamType::STR
    }
}

impl Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.without_input_output() {
            ParamType::NULL => "NULL",
            ParamType::INT => "INT",
            ParamType::STR => "STR",
            ParamType::LOB => "LOB",
            ParamType::STMT => "STMT",
            ParamType::BOOL => "BOOL",
            ParamType::ROWID => "ROWID",
            ParamType::CLOB => "CLOB",
            ParamType::BLOB => "BLOB",
            ParamType::BFILE => "BFILE",
            ParamType::CFILE => "CFILE",
            ParamType::CURSOR => "CURSOR",
            ParamType(other) => return write!(f, "{}", other),
        };
        f.write_str(name)?;
        if self.is_input_output() {
            f.write_str("|INPUT_OUTPUT")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifier_bit() {
        let kind = ParamType::CLOB.input_output();
        assert!(kind.is_input_output());
        assert!(!ParamType::CLOB.is_input_output());
        assert_eq!(kind.without_input_output(), ParamType::CLOB);
        assert_eq!(kind.to_string(), "CLOB|INPUT_OUTPUT");
        assert_eq!(ParamType(77).to_string(), "77");
    }
}
