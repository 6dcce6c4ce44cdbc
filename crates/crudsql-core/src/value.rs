//! Dynamic SQL values.

use serde::{Deserialize, Serialize};

use crate::error::{Error, TypeError};

/// A dynamically-typed SQL value.
///
/// Property getters produce these and setters consume them; they are also the
/// payload of bound statement parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// NULL value
    Null,

    /// Boolean value
    Bool(bool),

    /// 8-bit signed integer
    TinyInt(i8),

    /// 16-bit signed integer
    SmallInt(i16),

    /// 32-bit signed integer
    Int(i32),

    /// 64-bit signed integer
    BigInt(i64),

    /// 32-bit floating point
    Float(f32),

    /// 64-bit floating point
    Double(f64),

    /// Arbitrary precision decimal (stored as string)
    Decimal(String),

    /// Text string
    Text(String),

    /// Binary data
    Bytes(Vec<u8>),

    /// Date (days since epoch)
    Date(i32),

    /// Time (microseconds since midnight)
    Time(i64),

    /// Timestamp (microseconds since epoch)
    Timestamp(i64),

    /// UUID (as 16 bytes)
    Uuid([u8; 16]),

    /// JSON value
    Json(serde_json::Value),
}

impl Value {
    /// SQL name of the variant, used in type errors.
    pub const fn kind(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::TinyInt(_) => "TINYINT",
            Value::SmallInt(_) => "SMALLINT",
            Value::Int(_) => "INTEGER",
            Value::BigInt(_) => "BIGINT",
            Value::Float(_) => "REAL",
            Value::Double(_) => "DOUBLE",
            Value::Decimal(_) => "DECIMAL",
            Value::Text(_) => "TEXT",
            Value::Bytes(_) => "BLOB",
            Value::Date(_) => "DATE",
            Value::Time(_) => "TIME",
            Value::Timestamp(_) => "TIMESTAMP",
            Value::Uuid(_) => "UUID",
            Value::Json(_) => "JSON",
        }
    }
}

fn mismatch(expected: &'static str, actual: &Value) -> Error {
    Error::Type(TypeError {
        expected,
        actual: actual.kind().to_string(),
        property: None,
    })
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )+
    };
}

value_from! {
    bool => Bool,
    i8 => TinyInt,
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
    f32 => Float,
    f64 => Double,
    String => Text,
    &str => Text,
    Vec<u8> => Bytes,
    [u8; 16] => Uuid,
    serde_json::Value => Json,
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// `TryFrom<Value>` for a Rust type: each arm maps accepted variants to the
/// target, anything else is a mismatch named `$expected`.
macro_rules! value_into {
    ($ty:ty, $expected:literal { $($pat:pat => $out:expr),+ $(,)? }) => {
        impl TryFrom<Value> for $ty {
            type Error = Error;

            fn try_from(value: Value) -> Result<Self, Self::Error> {
                match value {
                    $($pat => Ok($out),)+
                    other => Err(mismatch($expected, &other)),
                }
            }
        }
    };
}

// integers widen, never narrow; booleans read as 0/1
value_into!(bool, "bool" {
    Value::Bool(v) => v,
    Value::TinyInt(v) => v != 0,
    Value::SmallInt(v) => v != 0,
    Value::Int(v) => v != 0,
    Value::BigInt(v) => v != 0,
});
value_into!(i8, "i8" {
    Value::TinyInt(v) => v,
    Value::Bool(v) => i8::from(v),
});
value_into!(i16, "i16" {
    Value::SmallInt(v) => v,
    Value::TinyInt(v) => i16::from(v),
    Value::Bool(v) => i16::from(v),
});
value_into!(i32, "i32" {
    Value::Int(v) | Value::Date(v) => v,
    Value::SmallInt(v) => i32::from(v),
    Value::TinyInt(v) => i32::from(v),
    Value::Bool(v) => i32::from(v),
});
value_into!(i64, "i64" {
    Value::BigInt(v) | Value::Time(v) | Value::Timestamp(v) => v,
    Value::Int(v) => i64::from(v),
    Value::SmallInt(v) => i64::from(v),
    Value::TinyInt(v) => i64::from(v),
    Value::Bool(v) => i64::from(v),
});
value_into!(f32, "f32" {
    Value::Float(v) => v,
    Value::SmallInt(v) => f32::from(v),
    Value::TinyInt(v) => f32::from(v),
});
value_into!(f64, "f64" {
    Value::Double(v) => v,
    Value::Float(v) => f64::from(v),
    Value::Int(v) => f64::from(v),
    Value::SmallInt(v) => f64::from(v),
    Value::TinyInt(v) => f64::from(v),
});
value_into!(String, "String" {
    Value::Text(v) | Value::Decimal(v) => v,
});
value_into!(Vec<u8>, "Vec<u8>" {
    Value::Bytes(v) => v,
    Value::Text(v) => v.into_bytes(),
    Value::Uuid(v) => v.to_vec(),
});

impl TryFrom<Value> for [u8; 16] {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Uuid(v) => Ok(v),
            Value::Bytes(v) => <[u8; 16]>::try_from(v.as_slice())
                .map_err(|_| mismatch("UUID", &Value::Bytes(v))),
            other => Err(mismatch("UUID", &other)),
        }
    }
}

impl TryFrom<Value> for serde_json::Value {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Json(v) => Ok(v),
            Value::Text(s) => serde_json::from_str(&s).map_err(|e| {
                Error::Type(TypeError {
                    expected: "JSON",
                    actual: format!("unparsable text ({e})"),
                    property: None,
                })
            }),
            other => Err(mismatch("JSON", &other)),
        }
    }
}

/// `Null` becomes `None`; anything else must convert into `T`.
impl<T> TryFrom<Value> for Option<T>
where
    T: TryFrom<Value, Error = Error>,
{
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(None),
            v => T::try_from(v).map(Some),
        }
    }
}
