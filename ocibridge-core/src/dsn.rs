use crate::{DbError, Error, Result, consume_while, fail};
use std::{collections::BTreeMap, fs};

/// Parsed data source name: `driver:key=value;key=value`.
///
/// `uri:<path>` names a file whose content is the actual data source name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dsn {
    pub driver: String,
    pub params: BTreeMap<String, String>,
}

impl Dsn {
    pub const DEFAULT_CHARSET: &'static str = "AL32UTF8";
    const MAX_INDIRECTIONS: usize = 8;

    pub fn parse(dsn: &str) -> Result<Dsn> {
        Self::parse_nested(dsn, 0)
    }

    fn parse_nested(dsn: &str, depth: usize) -> Result<Dsn> {
        let mut input = dsn.trim();
        let driver = consume_while(&mut input, |c| *c != ':');
        let Some(vars) = input.strip_prefix(':') else {
            return fail(DbError::configuration(format!(
                "The data source name `{}` does not declare a driver",
                dsn
            )));
        };
        if driver == "uri" {
            if depth >= Self::MAX_INDIRECTIONS {
                return fail(DbError::configuration(format!(
                    "Too many `uri:` indirections while resolving `{}`",
                    dsn
                )));
            }
            let content = fs::read_to_string(vars).map_err(|e| {
                let error = Error::new(DbError::configuration(format!(
                    "Cannot read the data source name from `{}`: {}",
                    vars, e
                )));
                log::error!("{:#}", error);
                error
            })?;
            return Self::parse_nested(&content, depth + 1);
        }
        let params = vars
            .split(';')
            .filter(|v| !v.trim().is_empty())
            .map(|v| match v.split_once('=') {
                Some((key, value)) => (key.trim().to_string(), value.to_string()),
                None => (v.trim().to_string(), String::new()),
            })
            .collect();
        Ok(Dsn {
            driver: driver.to_string(),
            params,
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Connection target descriptor (`dbname`).
    pub fn dbname(&self) -> &str {
        self.get("dbname").unwrap_or_default()
    }

    pub fn charset(&self) -> &str {
        self.get("charset")
            .filter(|v| !v.is_empty())
            .unwrap_or(Self::DEFAULT_CHARSET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        let dsn = Dsn::parse("oci:dbname=//localhost:1521/XEPDB1;charset=AL16UTF16").unwrap();
        assert_eq!(dsn.driver, "oci");
        assert_eq!(dsn.dbname(), "//localhost:1521/XEPDB1");
        assert_eq!(dsn.charset(), "AL16UTF16");
    }

    #[test]
    fn default_charset() {
        let dsn = Dsn::parse("oci:dbname=XE").unwrap();
        assert_eq!(dsn.charset(), Dsn::DEFAULT_CHARSET);
    }

    #[test]
    fn keeps_equal_signs_in_values() {
        let dsn = Dsn::parse(
            "oci:dbname=(DESCRIPTION=(ADDRESS=(PROTOCOL=TCP)(HOST=db)(PORT=1521)))",
        )
        .unwrap();
        assert_eq!(
            dsn.dbname(),
            "(DESCRIPTION=(ADDRESS=(PROTOCOL=TCP)(HOST=db)(PORT=1521)))"
        );
    }

    #[test]
    fn missing_driver() {
        let error = Dsn::parse("justanalias").unwrap_err();
        assert!(matches!(
            error.downcast_ref::<DbError>(),
            Some(DbError::Configuration(..))
        ));
    }
}
