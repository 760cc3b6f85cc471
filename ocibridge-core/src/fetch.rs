//! Fetch styles and the configuration each of them needs.

use crate::{DbError, Record, Result, Row, Value, fail};
use std::{
    any::Any,
    cell::RefCell,
    collections::HashMap,
    fmt::{self, Debug, Display},
    rc::Rc,
};

/// Shape in which a fetched row is materialised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FetchStyle {
    /// Mapping by column label.
    #[default]
    Assoc,
    /// Sequence by position.
    Num,
    /// Both by label and by position.
    Both,
    /// A single column.
    Column,
    /// Generic object ([`Record`]).
    Obj,
    /// Populate an existing object.
    Into,
    /// Populate a new instance of a named class.
    Class,
    /// Apply a function to the positional values (bulk fetch only).
    Func,
    /// Class name taken from the first column.
    ClassType,
    Lazy,
    Bound,
    Named,
    KeyPair,
}

impl Display for FetchStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

/// Object that can be populated with the columns of a row.
pub trait FetchTarget: Any {
    fn set_property(&mut self, name: &str, value: Value) -> Result<()>;
    fn as_any(&self) -> &dyn Any;
}

impl dyn FetchTarget {
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Existing object shared between the caller and the statement.
pub type TargetRef = Rc<RefCell<dyn FetchTarget>>;

/// Copies every column of `row` into `target`.
pub fn populate(row: &Row, target: &mut dyn FetchTarget) -> Result<()> {
    for (name, value) in row.iter() {
        target.set_property(name, value.clone())?;
    }
    Ok(())
}

pub type ClassFactory = Rc<dyn Fn(&[Value]) -> Result<Box<dyn FetchTarget>>>;

/// A class resolved by name, able to build new instances.
#[derive(Clone)]
pub struct ClassRef {
    name: Rc<str>,
    factory: ClassFactory,
}

impl ClassRef {
    pub fn new(name: &str, factory: ClassFactory) -> Self {
        Self {
            name: name.into(),
            factory,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instantiate(&self, args: &[Value]) -> Result<Box<dyn FetchTarget>> {
        (self.factory)(args)
    }
}

impl Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClassRef").field(&self.name).finish()
    }
}

/// Named classes the class fetch styles can instantiate.
#[derive(Clone)]
pub struct ClassRegistry {
    classes: HashMap<String, ClassFactory>,
}

impl ClassRegistry {
    /// Built-in generic class, instantiated as [`Record`].
    pub const GENERIC: &'static str = "stdClass";

    pub fn new() -> Self {
        let mut classes: HashMap<String, ClassFactory> = HashMap::new();
        classes.insert(
            Self::GENERIC.to_string(),
            Rc::new(|_| Ok(Box::new(Record::new()))),
        );
        Self { classes }
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&[Value]) -> Result<Box<dyn FetchTarget>> + 'static,
    {
        self.classes.insert(name.to_string(), Rc::new(factory));
    }

    pub fn resolve(&self, name: &str) -> Result<ClassRef> {
        match self.classes.get(name) {
            Some(factory) => Ok(ClassRef::new(name, factory.clone())),
            None => fail(DbError::usage(format!(
                "Class `{}` is not registered",
                name
            ))),
        }
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// One argument of the overloaded `set_fetch_mode` call.
#[derive(Clone)]
pub enum FetchArg {
    Style(FetchStyle),
    Column(usize),
    Object(TargetRef),
    Class(String),
    CtorArgs(Vec<Value>),
}

impl Debug for FetchArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchArg::Style(v) => f.debug_tuple("Style").field(v).finish(),
            FetchArg::Column(v) => f.debug_tuple("Column").field(v).finish(),
            FetchArg::Object(..) => f.write_str("Object(..)"),
            FetchArg::Class(v) => f.debug_tuple("Class").field(v).finish(),
            FetchArg::CtorArgs(v) => f.debug_tuple("CtorArgs").field(v).finish(),
        }
    }
}

/// Default fetch configuration of a statement: the style plus exactly what it needs.
#[derive(Clone)]
pub enum FetchMode {
    Assoc,
    Num,
    Both,
    Obj,
    Column(usize),
    Into(TargetRef),
    Class { class: ClassRef, args: Vec<Value> },
}

impl FetchMode {
    pub fn style(&self) -> FetchStyle {
        match self {
            FetchMode::Assoc => FetchStyle::Assoc,
            FetchMode::Num => FetchStyle::Num,
            FetchMode::Both => FetchStyle::Both,
            FetchMode::Obj => FetchStyle::Obj,
            FetchMode::Column(..) => FetchStyle::Column,
            FetchMode::Into(..) => FetchStyle::Into,
            FetchMode::Class { .. } => FetchStyle::Class,
        }
    }

    /// Resolves the overloaded argument list of `set_fetch_mode`.
    ///
    /// One argument selects the style, two add the column number, the target
    /// object or the class name, three add the constructor arguments.
    pub fn from_args(args: Vec<FetchArg>, classes: &ClassRegistry) -> Result<FetchMode> {
        let usage = |message: String| fail(DbError::Usage(message));
        let arity = args.len();
        let mut args = args.into_iter();
        let style = match args.next() {
            None => return usage("The fetch mode must be one of the fetch styles".into()),
            Some(FetchArg::Style(style)) => style,
            Some(other) => {
                return usage(format!(
                    "The first argument of the fetch mode must be a fetch style, found {:?}",
                    other
                ));
            }
        };
        match (style, args.next(), args.next(), args.next()) {
            (_, _, _, Some(..)) => usage(format!(
                "The fetch mode accepts at most 3 arguments, {} given",
                arity
            )),
            (_, Some(..), Some(third), None) if !matches!(third, FetchArg::CtorArgs(..)) => {
                usage("The constructor arguments must be a list of values".into())
            }
            (FetchStyle::Assoc, None, ..) => Ok(FetchMode::Assoc),
            (FetchStyle::Num, None, ..) => Ok(FetchMode::Num),
            (FetchStyle::Both, None, ..) => Ok(FetchMode::Both),
            (FetchStyle::Obj, None, ..) => Ok(FetchMode::Obj),
            (FetchStyle::Column, None, ..) => Ok(FetchMode::Column(0)),
            (FetchStyle::Column, Some(FetchArg::Column(index)), None, None) => {
                Ok(FetchMode::Column(index))
            }
            (FetchStyle::Into, None, ..) => {
                usage("The into fetch style requires the target object".into())
            }
            (FetchStyle::Into, Some(FetchArg::Object(target)), None, None) => {
                Ok(FetchMode::Into(target))
            }
            (FetchStyle::Class, None, ..) => Ok(FetchMode::Class {
                class: classes.resolve(ClassRegistry::GENERIC)?,
                args: Vec::new(),
            }),
            (FetchStyle::Class, Some(FetchArg::Class(name)), ctor, None) => {
                let args = match ctor {
                    Some(FetchArg::CtorArgs(args)) => args,
                    _ => Vec::new(),
                };
                Ok(FetchMode::Class {
                    class: classes.resolve(&name)?,
                    args,
                })
            }
            (
                FetchStyle::Func
                | FetchStyle::ClassType
                | FetchStyle::Lazy
                | FetchStyle::Bound
                | FetchStyle::Named
                | FetchStyle::KeyPair,
                ..,
            ) => fail(DbError::not_implemented(format!(
                "Fetch style {} is not implemented in set_fetch_mode",
                style
            ))),
            (style, Some(second), ..) => usage(format!(
                "Fetch style {} does not accept the argument {:?}",
                style, second
            )),
        }
    }
}

impl Default for FetchMode {
    fn default() -> Self {
        FetchMode::Assoc
    }
}

impl Debug for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchMode::Column(index) => f.debug_tuple("Column").field(index).finish(),
            FetchMode::Into(..) => f.write_str("Into(..)"),
            FetchMode::Class { class, args } => f
                .debug_struct("Class")
                .field("class", class)
                .field("args", args)
                .finish(),
            other => Debug::fmt(&other.style(), f),
        }
    }
}

/// Argument of the bulk fetch.
pub enum FetchArgument<'a> {
    None,
    Column(usize),
    Class { name: String, args: Vec<Value> },
    Func(&'a mut dyn FnMut(Vec<Value>) -> Value),
}

/// A materialised row in the requested shape.
pub enum FetchedRow {
    Assoc(Row),
    Num(Vec<Value>),
    Both(Row),
    /// A single value: one column, or the result of a fetch function.
    Value(Value),
    Object(Record),
    Instance(Box<dyn FetchTarget>),
    Into(TargetRef),
}

impl FetchedRow {
    /// Value by column label, for the shapes that carry labels.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            FetchedRow::Assoc(row) | FetchedRow::Both(row) => row.get(name),
            FetchedRow::Object(record) => record.get(name),
            _ => None,
        }
    }

    /// Value by 0-based position, for the shapes that carry positions.
    pub fn at(&self, index: usize) -> Option<&Value> {
        match self {
            FetchedRow::Num(values) => values.get(index),
            FetchedRow::Both(row) => row.at(index),
            _ => None,
        }
    }

    pub fn into_row(self) -> Option<Row> {
        match self {
            FetchedRow::Assoc(row) | FetchedRow::Both(row) => Some(row),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            FetchedRow::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl Debug for FetchedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchedRow::Assoc(v) => f.debug_tuple("Assoc").field(v).finish(),
            FetchedRow::Num(v) => f.debug_tuple("Num").field(v).finish(),
            FetchedRow::Both(v) => f.debug_tuple("Both").field(v).finish(),
            FetchedRow::Value(v) => f.debug_tuple("Value").field(v).finish(),
            FetchedRow::Object(v) => f.debug_tuple("Object").field(v).finish(),
            FetchedRow::Instance(..) => f.write_str("Instance(..)"),
            FetchedRow::Into(..) => f.write_str("Into(..)"),
        }
    }
}
