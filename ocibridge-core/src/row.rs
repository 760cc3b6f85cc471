use crate::{AsValue, FetchTarget, Result, Value};
use std::{any::Any, ops::Index, rc::Rc};

/// A fetched row: column labels shared across the result set plus the values.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub labels: Rc<[String]>,
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(labels: Rc<[String]>, values: Vec<Value>) -> Self {
        Self { labels, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.labels.iter().position(|v| v == name)
    }

    /// Value of the column labelled `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.position(name).map(|i| &self.values[i])
    }

    /// Value of the column at the 0-based `index`.
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.position(name).map(|i| &mut self.values[i])
    }

    /// Typed access by name.
    pub fn try_get<T: AsValue>(&self, name: &str) -> Result<T> {
        let value = self
            .get(name)
            .ok_or_else(|| crate::Error::msg(format!("The row has no column `{}`", name)))?;
        T::try_from_value(value.clone())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl Index<usize> for Row {
    type Output = Value;
    fn index(&self, index: usize) -> &Value {
        &self.values[index]
    }
}

impl Index<&str> for Row {
    type Output = Value;
    fn index(&self, name: &str) -> &Value {
        self.get(name)
            .unwrap_or_else(|| panic!("The row has no column `{}`", name))
    }
}

/// Generic object produced by the object fetch style: an ordered property bag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        match self.fields.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Row> for Record {
    fn from(row: Row) -> Self {
        Record {
            fields: row
                .labels
                .iter()
                .cloned()
                .zip(row.values)
                .collect(),
        }
    }
}

impl FetchTarget for Record {
    fn set_property(&mut self, name: &str, value: Value) -> Result<()> {
        self.set(name, value);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
