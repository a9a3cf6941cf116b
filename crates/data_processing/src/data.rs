use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// The `Data` enum is the unit of information flowing between pipeline stages.
///
/// It is a small variant type covering the shapes a data-loading pipeline
/// usually passes around before tensors are built: scalars, strings, raw
/// bytes, and nested lists/dicts of those.
///
/// `Data` is move-only: it intentionally does not implement `Clone`, so each
/// value has exactly one owner as it moves from stage to stage.
///
/// # Examples:
/// - A decoded text example: `{"text": "hello", "label": 1}`
/// - A raw audio record: `{"path": "a.wav", "audio": Bytes([...])}`
#[derive(Debug, PartialEq)]
pub enum Data {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Data>),
    Dict(BTreeMap<String, Data>),
}

/// The kind of a [`Data`] value, used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Bool,
    Int,
    Float,
    String,
    Bytes,
    List,
    Dict,
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataKind::Bool => "bool",
            DataKind::Int => "int",
            DataKind::Float => "float",
            DataKind::String => "string",
            DataKind::Bytes => "bytes",
            DataKind::List => "list",
            DataKind::Dict => "dict",
        };
        f.write_str(name)
    }
}

/// Errors raised when a [`Data`] value does not have the expected shape.
#[derive(Debug, Error, PartialEq)]
pub enum DataError {
    #[error("expected {expected} data, found {actual}")]
    TypeMismatch { expected: DataKind, actual: DataKind },

    #[error("key '{0}' not found in dict data")]
    MissingKey(String),

    #[error("float {0} cannot be represented in JSON")]
    NonFiniteFloat(f64),

    #[error("JSON {0} has no data representation")]
    UnsupportedJson(&'static str),
}

impl Data {
    /// Returns the kind of this value.
    pub fn kind(&self) -> DataKind {
        match self {
            Data::Bool(_) => DataKind::Bool,
            Data::Int(_) => DataKind::Int,
            Data::Float(_) => DataKind::Float,
            Data::String(_) => DataKind::String,
            Data::Bytes(_) => DataKind::Bytes,
            Data::List(_) => DataKind::List,
            Data::Dict(_) => DataKind::Dict,
        }
    }

    fn mismatch(&self, expected: DataKind) -> DataError {
        DataError::TypeMismatch {
            expected,
            actual: self.kind(),
        }
    }

    pub fn as_bool(&self) -> Result<bool, DataError> {
        match self {
            Data::Bool(b) => Ok(*b),
            other => Err(other.mismatch(DataKind::Bool)),
        }
    }

    pub fn as_int(&self) -> Result<i64, DataError> {
        match self {
            Data::Int(i) => Ok(*i),
            other => Err(other.mismatch(DataKind::Int)),
        }
    }

    /// Returns the value as `f64`. Integers are widened.
    pub fn as_float(&self) -> Result<f64, DataError> {
        match self {
            Data::Float(f) => Ok(*f),
            Data::Int(i) => Ok(*i as f64),
            other => Err(other.mismatch(DataKind::Float)),
        }
    }

    pub fn as_str(&self) -> Result<&str, DataError> {
        match self {
            Data::String(s) => Ok(s),
            other => Err(other.mismatch(DataKind::String)),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8], DataError> {
        match self {
            Data::Bytes(b) => Ok(b),
            other => Err(other.mismatch(DataKind::Bytes)),
        }
    }

    pub fn as_list(&self) -> Result<&[Data], DataError> {
        match self {
            Data::List(l) => Ok(l),
            other => Err(other.mismatch(DataKind::List)),
        }
    }

    pub fn as_dict(&self) -> Result<&BTreeMap<String, Data>, DataError> {
        match self {
            Data::Dict(d) => Ok(d),
            other => Err(other.mismatch(DataKind::Dict)),
        }
    }

    pub fn into_string(self) -> Result<String, DataError> {
        match self {
            Data::String(s) => Ok(s),
            other => Err(other.mismatch(DataKind::String)),
        }
    }

    pub fn into_bytes(self) -> Result<Vec<u8>, DataError> {
        match self {
            Data::Bytes(b) => Ok(b),
            other => Err(other.mismatch(DataKind::Bytes)),
        }
    }

    pub fn into_list(self) -> Result<Vec<Data>, DataError> {
        match self {
            Data::List(l) => Ok(l),
            other => Err(other.mismatch(DataKind::List)),
        }
    }

    pub fn into_dict(self) -> Result<BTreeMap<String, Data>, DataError> {
        match self {
            Data::Dict(d) => Ok(d),
            other => Err(other.mismatch(DataKind::Dict)),
        }
    }

    /// Looks up `key` in a dict value.
    pub fn get(&self, key: &str) -> Result<&Data, DataError> {
        self.as_dict()?
            .get(key)
            .ok_or_else(|| DataError::MissingKey(key.to_string()))
    }
}

impl From<bool> for Data {
    fn from(value: bool) -> Self {
        Data::Bool(value)
    }
}

impl From<i64> for Data {
    fn from(value: i64) -> Self {
        Data::Int(value)
    }
}

impl From<i32> for Data {
    fn from(value: i32) -> Self {
        Data::Int(value.into())
    }
}

impl From<f64> for Data {
    fn from(value: f64) -> Self {
        Data::Float(value)
    }
}

impl From<String> for Data {
    fn from(value: String) -> Self {
        Data::String(value)
    }
}

impl From<&str> for Data {
    fn from(value: &str) -> Self {
        Data::String(value.to_string())
    }
}

impl From<Vec<u8>> for Data {
    fn from(value: Vec<u8>) -> Self {
        Data::Bytes(value)
    }
}

impl From<Vec<Data>> for Data {
    fn from(value: Vec<Data>) -> Self {
        Data::List(value)
    }
}

impl From<BTreeMap<String, Data>> for Data {
    fn from(value: BTreeMap<String, Data>) -> Self {
        Data::Dict(value)
    }
}

/// Converts a parsed JSON value (e.g. one line of a JSONL file) into `Data`.
///
/// Numbers become `Int` when they fit in `i64` and `Float` otherwise.
/// `null` has no counterpart and is rejected, including inside arrays and objects.
impl TryFrom<serde_json::Value> for Data {
    type Error = DataError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;

        Ok(match value {
            Value::Null => return Err(DataError::UnsupportedJson("null")),
            Value::Bool(b) => Data::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Data::Int(i),
                // u64 beyond i64::MAX or a real float
                None => Data::Float(n.as_f64().ok_or(DataError::UnsupportedJson("number"))?),
            },
            Value::String(s) => Data::String(s),
            Value::Array(items) => Data::List(
                items
                    .into_iter()
                    .map(Data::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => Data::Dict(
                map.into_iter()
                    .map(|(k, v)| Data::try_from(v).map(|d| (k, d)))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}

/// Converts `Data` back into JSON. `Bytes` become an array of numbers.
impl TryFrom<Data> for serde_json::Value {
    type Error = DataError;

    fn try_from(data: Data) -> Result<Self, Self::Error> {
        use serde_json::{Map, Number, Value};

        Ok(match data {
            Data::Bool(b) => Value::Bool(b),
            Data::Int(i) => Value::Number(i.into()),
            Data::Float(f) => {
                Value::Number(Number::from_f64(f).ok_or(DataError::NonFiniteFloat(f))?)
            }
            Data::String(s) => Value::String(s),
            Data::Bytes(b) => Value::Array(b.into_iter().map(Value::from).collect()),
            Data::List(items) => Value::Array(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Data::Dict(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| Value::try_from(v).map(|v| (k, v)))
                    .collect::<Result<Map<_, _>, _>>()?,
            ),
        })
    }
}
