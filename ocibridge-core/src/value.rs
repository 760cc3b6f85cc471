use crate::{DbError, Error, Result, Stream};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use std::{
    any,
    cell::{Ref, RefCell},
    fmt,
    rc::Rc,
    str::FromStr,
};
use time::{Date, PrimitiveDateTime, macros::format_description};
use uuid::Uuid;

/// Dynamically typed value used for parameters and row cells.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Int64(i64),
    Float64(f64),
    Decimal(Decimal),
    Varchar(String),
    Blob(Box<[u8]>),
    Date(Date),
    Timestamp(PrimitiveDateTime),
    Uuid(Uuid),
    /// Collection bound as a whole (array binding).
    List(Vec<Value>),
    /// Readable stream, produced for large objects.
    Stream(Stream),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Decimal(l), Self::Decimal(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            (Self::List(l), Self::List(r)) => l == r,
            (Self::Stream(l), Self::Stream(r)) => l.same_stream(r),
            _ => false,
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, Value::Stream(..))
    }

    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Value::Stream(v) => Some(v),
            _ => None,
        }
    }

    /// Coerces the value to the textual form bound as a character parameter.
    ///
    /// `Null` stays `None`. Streams are drained, lists cannot be coerced.
    pub fn to_text(&self) -> Result<Option<String>> {
        Ok(Some(match self {
            Value::Null => return Ok(None),
            Value::Boolean(v) => (if *v { "1" } else { "0" }).to_string(),
            Value::Int64(v) => itoa::Buffer::new().format(*v).to_string(),
            Value::Float64(v) => {
                if v.fract() == 0.0 && v.abs() < 1e15 {
                    itoa::Buffer::new().format(*v as i64).to_string()
                } else {
                    ryu::Buffer::new().format(*v).to_string()
                }
            }
            Value::Decimal(v) => v.normalize().to_string(),
            Value::Varchar(v) => v.clone(),
            Value::Blob(v) => hex::encode_upper(v),
            Value::Date(v) => v.format(format_description!("[year]-[month]-[day]"))?,
            Value::Timestamp(v) => v.format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second]"
            ))?,
            Value::Uuid(v) => v.to_string(),
            Value::Stream(v) => String::from_utf8_lossy(&v.contents()?).into_owned(),
            Value::List(..) => {
                return Err(Error::new(DbError::usage(
                    "a list cannot be coerced to a scalar text value",
                )));
            }
        }))
    }

    /// Raw bytes written into a large object.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(match self {
            Value::Blob(v) => v.to_vec(),
            Value::Stream(v) => v.contents()?,
            _ => self.to_text()?.unwrap_or_default().into_bytes(),
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::List(values) => {
                f.write_str("[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str("]")
            }
            Value::Stream(v) => write!(f, "{:?}", v),
            _ => match self.to_text() {
                Ok(Some(v)) => f.write_str(&v),
                _ => Err(fmt::Error),
            },
        }
    }
}

/// Conversion between Rust types and [`Value`].
pub trait AsValue {
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

fn conversion_error<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {:?} to {}",
        value,
        any::type_name::<T>()
    ))
}

fn parse_text<T: FromStr>(value: &Value, text: &str) -> Result<T> {
    text.trim()
        .parse::<T>()
        .map_err(|_| conversion_error::<T>(value))
}

macro_rules! impl_as_value_integer {
    ($($ty:ty),+) => {
        $(
            impl AsValue for $ty {
                fn as_value(self) -> Value {
                    Value::Int64(self as i64)
                }
                fn try_from_value(value: Value) -> Result<Self> {
                    let wide: i64 = match &value {
                        Value::Int64(v) => *v,
                        Value::Boolean(v) => *v as i64,
                        Value::Decimal(v) if v.fract().is_zero() => {
                            v.to_i64().ok_or_else(|| conversion_error::<$ty>(&value))?
                        }
                        Value::Float64(v) if v.fract() == 0.0 => *v as i64,
                        Value::Varchar(v) => parse_text(&value, v)?,
                        _ => return Err(conversion_error::<$ty>(&value)),
                    };
                    <$ty>::try_from(wide).map_err(|_| conversion_error::<$ty>(&value))
                }
            }
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    value.as_value()
                }
            }
        )+
    };
}

impl_as_value_integer!(i8, i16, i32, i64, u8, u16, u32);

impl AsValue for bool {
    fn as_value(self) -> Value {
        Value::Boolean(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Boolean(v) => Ok(*v),
            Value::Int64(v) => Ok(*v != 0),
            Value::Varchar(v) => match v.trim() {
                "1" => Ok(true),
                "0" => Ok(false),
                v if v.eq_ignore_ascii_case("true") => Ok(true),
                v if v.eq_ignore_ascii_case("false") => Ok(false),
                _ => Err(conversion_error::<bool>(&value)),
            },
            _ => Err(conversion_error::<bool>(&value)),
        }
    }
}

impl AsValue for f64 {
    fn as_value(self) -> Value {
        Value::Float64(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Float64(v) => Ok(*v),
            Value::Int64(v) => Ok(*v as f64),
            Value::Decimal(v) => v.to_f64().ok_or_else(|| conversion_error::<f64>(&value)),
            Value::Varchar(v) => parse_text(&value, v),
            _ => Err(conversion_error::<f64>(&value)),
        }
    }
}

impl AsValue for Decimal {
    fn as_value(self) -> Value {
        Value::Decimal(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Decimal(v) => Ok(*v),
            Value::Int64(v) => Ok(Decimal::from(*v)),
            Value::Float64(v) => {
                Decimal::try_from(*v).map_err(|_| conversion_error::<Decimal>(&value))
            }
            Value::Varchar(v) => parse_text(&value, v),
            _ => Err(conversion_error::<Decimal>(&value)),
        }
    }
}

impl AsValue for String {
    fn as_value(self) -> Value {
        Value::Varchar(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Varchar(v) => Ok(v),
            Value::Null | Value::List(..) => Err(conversion_error::<String>(&value)),
            _ => Ok(value.to_text()?.unwrap_or_default()),
        }
    }
}

impl AsValue for Vec<u8> {
    fn as_value(self) -> Value {
        Value::Blob(self.into_boxed_slice())
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(v) => Ok(v.into_vec()),
            Value::Varchar(v) => Ok(v.into_bytes()),
            Value::Stream(v) => v.contents(),
            _ => Err(conversion_error::<Vec<u8>>(&value)),
        }
    }
}

impl AsValue for Date {
    fn as_value(self) -> Value {
        Value::Date(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Date(v) => Ok(*v),
            Value::Timestamp(v) => Ok(v.date()),
            Value::Varchar(v) => Date::parse(v.trim(), format_description!("[year]-[month]-[day]"))
                .map_err(|_| conversion_error::<Date>(&value)),
            _ => Err(conversion_error::<Date>(&value)),
        }
    }
}

impl AsValue for PrimitiveDateTime {
    fn as_value(self) -> Value {
        Value::Timestamp(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Timestamp(v) => Ok(*v),
            Value::Varchar(v) => PrimitiveDateTime::parse(
                v.trim(),
                format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
            )
            .map_err(|_| conversion_error::<PrimitiveDateTime>(&value)),
            _ => Err(conversion_error::<PrimitiveDateTime>(&value)),
        }
    }
}

impl AsValue for Uuid {
    fn as_value(self) -> Value {
        Value::Uuid(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Uuid(v) => Ok(*v),
            Value::Varchar(v) => parse_text(&value, v),
            _ => Err(conversion_error::<Uuid>(&value)),
        }
    }
}

impl AsValue for Stream {
    fn as_value(self) -> Value {
        Value::Stream(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Stream(v) => Ok(v),
            _ => Err(conversion_error::<Stream>(&value)),
        }
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => Value::Null,
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            v => T::try_from_value(v).map(Some),
        }
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    value.as_value()
                }
            }
        )+
    };
}

impl_from_for_value!(bool, f64, Decimal, String, Vec<u8>, Date, PrimitiveDateTime, Uuid, Stream);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(value.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Blob(value.into())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

/// A caller-owned variable a parameter or column is bound to.
///
/// Cloning yields another handle to the same slot, so output bindings written
/// by the adapter are visible to the caller.
#[derive(Clone, Default)]
pub struct Param(Rc<RefCell<Value>>);

impl Param {
    pub fn new(value: impl Into<Value>) -> Self {
        Self(Rc::new(RefCell::new(value.into())))
    }

    pub fn get(&self) -> Value {
        self.0.borrow().clone()
    }

    pub fn borrow(&self) -> Ref<'_, Value> {
        self.0.borrow()
    }

    pub fn set(&self, value: impl Into<Value>) {
        *self.0.borrow_mut() = value.into();
    }

    pub fn replace(&self, value: impl Into<Value>) -> Value {
        self.0.replace(value.into())
    }

    pub fn take(&self) -> Value {
        self.0.take()
    }

    pub fn same_slot(&self, other: &Param) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Param").field(&*self.0.borrow()).finish()
    }
}

impl<T: Into<Value>> From<T> for Param {
    fn from(value: T) -> Self {
        Param::new(value)
    }
}
