//! Connection and statement attributes.
//!
//! Three layers are resolved into one typed [`Settings`] view: read-only values
//! reported by the backend, defaults, and user overrides. Read-only keys can
//! never be written.

use crate::{ErrorMode, FetchStyle};
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Autocommit,
    Case,
    ClientVersion,
    DefaultFetchMode,
    DriverName,
    ErrorMode,
    /// Number of bytes a character of a character large object occupies.
    LobCharWidth,
    OracleNulls,
    Persistent,
    Prefetch,
    ServerVersion,
    /// When disabled, connection failures hide the backend diagnostic.
    Strict,
}

impl Attribute {
    pub const fn is_read_only(self) -> bool {
        matches!(
            self,
            Attribute::DriverName | Attribute::ClientVersion | Attribute::ServerVersion
        )
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Case conversion applied to column labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ColumnCase {
    Natural,
    #[default]
    Upper,
    Lower,
}

impl ColumnCase {
    pub fn apply(self, name: &str) -> String {
        match self {
            ColumnCase::Natural => name.to_string(),
            ColumnCase::Upper => name.to_uppercase(),
            ColumnCase::Lower => name.to_lowercase(),
        }
    }
}

/// Null and empty string conversion applied to fetched values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OracleNulls {
    #[default]
    Natural,
    EmptyString,
    ToString,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Text(String),
    Case(ColumnCase),
    ErrorMode(ErrorMode),
    FetchStyle(FetchStyle),
    Nulls(OracleNulls),
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<ColumnCase> for AttributeValue {
    fn from(value: ColumnCase) -> Self {
        AttributeValue::Case(value)
    }
}

impl From<ErrorMode> for AttributeValue {
    fn from(value: ErrorMode) -> Self {
        AttributeValue::ErrorMode(value)
    }
}

impl From<FetchStyle> for AttributeValue {
    fn from(value: FetchStyle) -> Self {
        AttributeValue::FetchStyle(value)
    }
}

impl From<OracleNulls> for AttributeValue {
    fn from(value: OracleNulls) -> Self {
        AttributeValue::Nulls(value)
    }
}

/// Effective, typed view of the writable attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub autocommit: bool,
    pub case: ColumnCase,
    pub default_fetch_style: FetchStyle,
    pub error_mode: ErrorMode,
    /// `None` derives the width from the connection character set.
    pub lob_char_width: Option<usize>,
    pub oracle_nulls: OracleNulls,
    pub persistent: bool,
    pub prefetch: u32,
    pub strict: bool,
}

impl Settings {
    pub const DEFAULT_PREFETCH: u32 = 100;

    pub fn get(&self, attribute: Attribute) -> Option<AttributeValue> {
        Some(match attribute {
            Attribute::Autocommit => self.autocommit.into(),
            Attribute::Case => self.case.into(),
            Attribute::DefaultFetchMode => self.default_fetch_style.into(),
            Attribute::ErrorMode => self.error_mode.into(),
            Attribute::LobCharWidth => AttributeValue::Int(self.lob_char_width? as i64),
            Attribute::OracleNulls => self.oracle_nulls.into(),
            Attribute::Persistent => self.persistent.into(),
            Attribute::Prefetch => AttributeValue::Int(self.prefetch as i64),
            Attribute::Strict => self.strict.into(),
            Attribute::DriverName | Attribute::ClientVersion | Attribute::ServerVersion => {
                return None;
            }
        })
    }

    /// Writes `value` into `attribute`. Returns `false` when the key is
    /// read-only or the value does not fit the key.
    pub fn apply(&mut self, attribute: Attribute, value: AttributeValue) -> bool {
        match (attribute, value) {
            (Attribute::Autocommit, AttributeValue::Bool(v)) => self.autocommit = v,
            (Attribute::Autocommit, AttributeValue::Int(v)) => self.autocommit = v != 0,
            (Attribute::Case, AttributeValue::Case(v)) => self.case = v,
            (Attribute::DefaultFetchMode, AttributeValue::FetchStyle(v)) => {
                self.default_fetch_style = v
            }
            (Attribute::ErrorMode, AttributeValue::ErrorMode(v)) => self.error_mode = v,
            (Attribute::LobCharWidth, AttributeValue::Int(v)) if v > 0 => {
                self.lob_char_width = Some(v as usize)
            }
            (Attribute::OracleNulls, AttributeValue::Nulls(v)) => self.oracle_nulls = v,
            (Attribute::Persistent, AttributeValue::Bool(v)) => self.persistent = v,
            (Attribute::Prefetch, AttributeValue::Int(v)) if v >= 0 => {
                self.prefetch = v.min(u32::MAX as i64) as u32
            }
            (Attribute::Strict, AttributeValue::Bool(v)) => self.strict = v,
            (attribute, value) => {
                log::warn!(
                    "Attribute {} cannot be set to {:?}",
                    attribute,
                    value
                );
                return false;
            }
        }
        true
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            autocommit: false,
            case: ColumnCase::Upper,
            default_fetch_style: FetchStyle::Assoc,
            error_mode: ErrorMode::Exception,
            lob_char_width: None,
            oracle_nulls: OracleNulls::Natural,
            persistent: false,
            prefetch: Settings::DEFAULT_PREFETCH,
            strict: true,
        }
    }
}

/// Attributes fixed by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOnlyAttributes {
    pub driver_name: String,
    pub client_version: String,
    pub server_version: String,
}

impl ReadOnlyAttributes {
    pub fn new(driver_name: impl Into<String>) -> Self {
        Self {
            driver_name: driver_name.into(),
            ..Default::default()
        }
    }

    pub fn get(&self, attribute: Attribute) -> Option<AttributeValue> {
        match attribute {
            Attribute::DriverName => Some(self.driver_name.clone().into()),
            Attribute::ClientVersion => Some(self.client_version.clone().into()),
            Attribute::ServerVersion => Some(self.server_version.clone().into()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttributeSet {
    read_only: ReadOnlyAttributes,
    defaults: Settings,
    effective: Settings,
}

impl AttributeSet {
    pub fn new(read_only: ReadOnlyAttributes, defaults: Settings) -> Self {
        Self {
            read_only,
            effective: defaults.clone(),
            defaults,
        }
    }

    /// Builds the set and applies `options` as user overrides.
    pub fn with_options<I>(read_only: ReadOnlyAttributes, defaults: Settings, options: I) -> Self
    where
        I: IntoIterator<Item = (Attribute, AttributeValue)>,
    {
        let mut result = Self::new(read_only, defaults);
        for (attribute, value) in options {
            result.set_attribute(attribute, value);
        }
        result
    }

    pub fn get_attribute(&self, attribute: Attribute) -> Option<AttributeValue> {
        self.read_only
            .get(attribute)
            .or_else(|| self.effective.get(attribute))
    }

    pub fn set_attribute(&mut self, attribute: Attribute, value: AttributeValue) -> bool {
        if attribute.is_read_only() {
            log::warn!("Attribute {} is read only", attribute);
            return false;
        }
        self.effective.apply(attribute, value)
    }

    pub fn settings(&self) -> &Settings {
        &self.effective
    }

    pub fn defaults(&self) -> &Settings {
        &self.defaults
    }

    pub fn read_only(&self) -> &ReadOnlyAttributes {
        &self.read_only
    }

    /// Records a value the backend reports about itself (versions).
    pub fn backend_reported(&mut self, attribute: Attribute, value: impl Into<String>) {
        match attribute {
            Attribute::DriverName => self.read_only.driver_name = value.into(),
            Attribute::ClientVersion => self.read_only.client_version = value.into(),
            Attribute::ServerVersion => self.read_only.server_version = value.into(),
            _ => log::warn!("Attribute {} is not reported by the backend", attribute),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attributes() -> AttributeSet {
        AttributeSet::new(ReadOnlyAttributes::new("oci"), Settings::default())
    }

    #[test]
    fn read_only_wins() {
        let mut attributes = attributes();
        assert!(!attributes.set_attribute(Attribute::DriverName, "mysql".into()));
        assert_eq!(
            attributes.get_attribute(Attribute::DriverName),
            Some(AttributeValue::Text("oci".into()))
        );
    }

    #[test]
    fn overrides_then_defaults() {
        let mut attributes = attributes();
        assert_eq!(
            attributes.get_attribute(Attribute::ErrorMode),
            Some(AttributeValue::ErrorMode(ErrorMode::Exception))
        );
        assert!(attributes.set_attribute(Attribute::ErrorMode, ErrorMode::Silent.into()));
        assert_eq!(attributes.settings().error_mode, ErrorMode::Silent);
        assert_eq!(attributes.defaults().error_mode, ErrorMode::Exception);
        assert_eq!(attributes.get_attribute(Attribute::LobCharWidth), None);
    }

    #[test]
    fn mismatched_value() {
        let mut attributes = attributes();
        assert!(!attributes.set_attribute(Attribute::Autocommit, "yes".into()));
        assert!(!attributes.settings().autocommit);
        assert!(attributes.set_attribute(Attribute::Autocommit, AttributeValue::Int(1)));
        assert!(attributes.settings().autocommit);
        assert!(!attributes.set_attribute(Attribute::Prefetch, AttributeValue::Int(-1)));
    }

    #[test]
    fn options() {
        let attributes = AttributeSet::with_options(
            ReadOnlyAttributes::new("oci"),
            Settings::default(),
            [
                (Attribute::Persistent, true.into()),
                (Attribute::ServerVersion, "23ai".into()),
            ],
        );
        assert!(attributes.settings().persistent);
        assert_eq!(
            attributes.get_attribute(Attribute::ServerVersion),
            Some(AttributeValue::Text(String::new()))
        );
    }
}
