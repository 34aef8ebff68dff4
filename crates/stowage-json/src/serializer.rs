use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    de::OptionsDeserializer, ser::OptionsSerializer, JsonSerializer, JsonSerializerOptions, Result, TimespanConverter,
};

/// [`JsonSerializer`] backed by `serde_json`.
///
/// Cloning is cheap; clones share the same options.
#[derive(Clone, Debug, Default)]
pub struct SerdeJsonSerializer {
    options: Arc<JsonSerializerOptions>,
}

impl SerdeJsonSerializer {
    pub fn new(options: JsonSerializerOptions) -> Self {
        Self { options: Arc::new(options) }
    }

    /// Builds a serializer from default options adjusted by `configure`.
    ///
    /// The timespan converter is registered afterwards unless `configure` registered one.
    pub fn configured<F>(configure: F) -> Self
    where
        F: FnOnce(&mut JsonSerializerOptions),
    {
        let mut options = JsonSerializerOptions::new();
        configure(&mut options);
        options.add_converter(TimespanConverter);
        Self::new(options)
    }

    pub fn options(&self) -> &JsonSerializerOptions {
        &self.options
    }
}

impl JsonSerializer for SerdeJsonSerializer {
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        if !self.options.shapes_writes() {
            return Ok(write_text(value, self.options.write_indented)?);
        }

        let value = OptionsSerializer::new(&self.options).to_value(value)?;
        Ok(write_text(&value, self.options.write_indented)?)
    }

    /// Map keys JSON cannot express are rendered as their JSON text here, where `serialize` rejects them.
    fn to_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<Value> {
        Ok(OptionsSerializer::new(&self.options).lenient_keys().to_value(value)?)
    }

    fn deserialize<T: DeserializeOwned>(&self, text: &str) -> Result<T> {
        if !self.options.shapes_reads() {
            return Ok(serde_json::from_str(text)?);
        }

        let value: Value = serde_json::from_str(text)?;
        Ok(T::deserialize(OptionsDeserializer::new(value, &self.options))?)
    }
}

fn write_text<T: Serialize + ?Sized>(value: &T, indented: bool) -> serde_json::Result<String> {
    if indented {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use serde::{Deserialize, Serialize};

    use super::SerdeJsonSerializer;
    use crate::{JsonSerializer, JsonSerializerOptions, SerializerError};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Session {
        user: String,
        refresh_after: Duration,
        theme: Option<String>,
    }

    fn browser_serializer() -> SerdeJsonSerializer {
        SerdeJsonSerializer::configured(|options| {
            options.property_name_case_insensitive = true;
            options.ignore_null_on_write = true;
        })
    }

    #[test]
    fn when_configured_then_timespan_converter_is_always_registered() {
        let serializer = SerdeJsonSerializer::configured(|_| {});

        assert!(serializer.options().has_converter_for("Duration"));
    }

    #[test]
    fn when_serializing_struct_then_duration_and_nulls_follow_options() {
        let session = Session { user: "ada".to_owned(), refresh_after: Duration::from_millis(90_500), theme: None };

        let text = browser_serializer().serialize(&session).expect("session should serialize");

        assert_eq!(text, r#"{"refresh_after":"0.00:01:30:5","user":"ada"}"#);
    }

    #[test]
    fn when_deserializing_with_different_casing_then_struct_is_read() {
        let text = r#"{"User":"ada","Refresh_After":"1.00:00:00:","THEME":"dark"}"#;

        let session: Session = browser_serializer().deserialize(text).expect("session should deserialize");

        assert_eq!(
            session,
            Session { user: "ada".to_owned(), refresh_after: Duration::from_secs(86_400), theme: Some("dark".to_owned()) }
        );
    }

    #[test]
    fn when_value_round_trips_then_it_is_unchanged() {
        let serializer = browser_serializer();
        let session = Session { user: "ada".to_owned(), refresh_after: Duration::from_millis(1_250), theme: None };

        let text = serializer.serialize(&session).expect("session should serialize");
        let read: Session = serializer.deserialize(&text).expect("session should deserialize");

        assert_eq!(read, session);
    }

    #[test]
    fn when_options_are_plain_then_serde_json_output_is_unchanged() {
        let serializer = SerdeJsonSerializer::default();

        let text = serializer.serialize(&Duration::from_secs(3)).expect("duration should serialize");

        assert_eq!(text, r#"{"nanos":0,"secs":3}"#);
    }

    #[test]
    fn when_indented_then_output_spans_lines() {
        let serializer = SerdeJsonSerializer::new(JsonSerializerOptions::new().write_indented(true));

        let text = serializer.serialize(&vec![1, 2]).expect("list should serialize");

        assert_eq!(text, "[\n  1,\n  2\n]");
    }

    #[test]
    fn when_text_is_not_json_then_format_error_is_returned() {
        let result = browser_serializer().deserialize::<String>("plain text");

        assert!(matches!(result, Err(SerializerError::Format(_))));
    }

    #[test]
    fn when_stored_timespan_is_malformed_then_format_error_mentions_expected_format() {
        let result = browser_serializer().deserialize::<Duration>("\"ten seconds\"");

        assert!(matches!(&result, Err(SerializerError::Format(_))));
        assert!(result.unwrap_err().to_string().contains("d.hh:mm:ss:FFF"));
    }
}
