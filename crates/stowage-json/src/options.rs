use std::{fmt, sync::Arc};

use crate::{JsonConverter, SerializerSettings, TimespanConverter};

/// Engine-wide serialization settings.
///
/// Built once by the composition root and shared read-only by every serializer that uses it.
#[derive(Clone, Default)]
pub struct JsonSerializerOptions {
    pub property_name_case_insensitive: bool,
    pub ignore_null_on_write: bool,
    pub write_indented: bool,
    converters: Vec<Arc<dyn JsonConverter>>,
}

impl JsonSerializerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn case_insensitive(mut self, enabled: bool) -> Self {
        self.property_name_case_insensitive = enabled;
        self
    }

    pub fn ignore_null_on_write(mut self, enabled: bool) -> Self {
        self.ignore_null_on_write = enabled;
        self
    }

    pub fn write_indented(mut self, enabled: bool) -> Self {
        self.write_indented = enabled;
        self
    }

    pub fn with_converter<C: JsonConverter + 'static>(mut self, converter: C) -> Self {
        self.add_converter(converter);
        self
    }

    /// Registers `converter` unless one for the same type is already registered.
    ///
    /// Returns whether the converter was added.
    pub fn add_converter<C: JsonConverter + 'static>(&mut self, converter: C) -> bool {
        if self.has_converter_for(converter.type_name()) {
            return false;
        }
        self.converters.push(Arc::new(converter));
        true
    }

    pub fn has_converter_for(&self, type_name: &str) -> bool {
        self.converter_for(type_name).is_some()
    }

    pub fn converters(&self) -> impl Iterator<Item = &dyn JsonConverter> {
        self.converters.iter().map(|converter| converter.as_ref())
    }

    pub(crate) fn converter_for(&self, type_name: &str) -> Option<&dyn JsonConverter> {
        self.converters().find(|converter| converter.type_name() == type_name)
    }

    /// Whether reading needs anything beyond plain `serde_json`.
    pub(crate) fn shapes_reads(&self) -> bool {
        self.property_name_case_insensitive || !self.converters.is_empty()
    }

    /// Whether writing needs anything beyond plain `serde_json`.
    pub(crate) fn shapes_writes(&self) -> bool {
        self.ignore_null_on_write || !self.converters.is_empty()
    }
}

impl fmt::Debug for JsonSerializerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSerializerOptions")
            .field("property_name_case_insensitive", &self.property_name_case_insensitive)
            .field("ignore_null_on_write", &self.ignore_null_on_write)
            .field("write_indented", &self.write_indented)
            .field("converters", &self.converters().map(|c| c.type_name()).collect::<Vec<_>>())
            .finish()
    }
}

impl From<SerializerSettings> for JsonSerializerOptions {
    fn from(settings: SerializerSettings) -> Self {
        JsonSerializerOptions::new()
            .case_insensitive(settings.property_name_case_insensitive)
            .ignore_null_on_write(settings.ignore_null_on_write)
            .write_indented(settings.write_indented)
            .with_converter(TimespanConverter)
    }
}
