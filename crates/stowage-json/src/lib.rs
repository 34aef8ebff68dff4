//! JSON serialization for values kept in string-keyed storage.
//!
//! The [`JsonSerializer`] trait is the two-method contract storage layers depend on.
//! [`SerdeJsonSerializer`] implements it on top of `serde_json`, shaped by a
//! [`JsonSerializerOptions`] value that is assembled once and never mutated afterwards.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

pub mod config;
pub mod converters;
mod de;
pub mod error;
mod options;
mod ser;
mod serializer;

pub use self::config::{load_settings, SerializerSettings};
pub use converters::{JsonConverter, TimespanConverter};
pub use error::{ConverterError, SerializerError};
pub use options::JsonSerializerOptions;
pub use serializer::SerdeJsonSerializer;

pub type Result<T> = std::result::Result<T, SerializerError>;

pub trait JsonSerializer: Send + Sync {
    /// Serializes `value` to its JSON text.
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String>;

    /// Deserializes JSON text into a `T`.
    fn deserialize<T: DeserializeOwned>(&self, text: &str) -> Result<T>;

    /// The JSON value `value` would be stored as.
    fn to_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<Value> {
        self.deserialize(&self.serialize(value)?)
    }
}

impl<J: JsonSerializer> JsonSerializer for Arc<J> {
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        (**self).serialize(value)
    }

    fn deserialize<T: DeserializeOwned>(&self, text: &str) -> Result<T> {
        (**self).deserialize(text)
    }

    fn to_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<Value> {
        (**self).to_value(value)
    }
}
