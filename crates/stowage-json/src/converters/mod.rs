//! Value-format converters.
//!
//! A converter owns the stored representation of one serde struct type, matched by the
//! struct name serde passes on both write and read.

use serde_json::{Map, Value};

use crate::ConverterError;

mod timespan;

pub use timespan::TimespanConverter;

pub trait JsonConverter: Send + Sync {
    /// The serde struct name this converter handles, e.g. `"Duration"`.
    fn type_name(&self) -> &'static str;

    /// Rewrites the serialized object into its stored form.
    ///
    /// Returning `None` keeps the object as it is.
    fn write(&self, object: &Map<String, Value>) -> Option<Value>;

    /// Turns a stored value back into the object the struct deserializes from.
    fn read(&self, value: Value) -> Result<Value, ConverterError>;
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
