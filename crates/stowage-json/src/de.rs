//! A `serde_json::Value` deserializer that honours [`JsonSerializerOptions`] on read.
//!
//! Struct requests are the only place serde tells us the target's name and field list, so
//! converters and case-insensitive member matching both hook into `deserialize_struct`.
//! Enum payloads are read through the same options; variant names and the fields of struct
//! variants are matched exactly.

use serde::{
    de::{
        self, value::StringDeserializer, DeserializeSeed, EnumAccess, IntoDeserializer, MapAccess, SeqAccess,
        Unexpected, VariantAccess, Visitor,
    },
    forward_to_deserialize_any, Deserializer,
};
use serde_json::{Map, Value};

use crate::{converters::kind_of, JsonSerializerOptions};

type Error = serde_json::Error;

pub(crate) struct OptionsDeserializer<'o> {
    value: Value,
    options: &'o JsonSerializerOptions,
}

impl<'o> OptionsDeserializer<'o> {
    pub(crate) fn new(value: Value, options: &'o JsonSerializerOptions) -> Self {
        Self { value, options }
    }
}

impl<'de, 'o> Deserializer<'de> for OptionsDeserializer<'o> {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::Array(items) => visit_array(items, self.options, visitor),
            Value::Object(object) => visit_object(object, self.options, visitor),
            other => other.deserialize_any(visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        let value = match self.options.converter_for(name) {
            Some(converter) => converter.read(self.value).map_err(<Error as de::Error>::custom)?,
            None => self.value,
        };

        match value {
            Value::Object(object) if self.options.property_name_case_insensitive => {
                visit_object(match_field_names(object, fields), self.options, visitor)
            }
            Value::Object(object) => visit_object(object, self.options, visitor),
            Value::Array(items) => visit_array(items, self.options, visitor),
            other => other.deserialize_any(visitor),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        let (variant, payload) = match self.value {
            Value::String(variant) => (variant, None),
            Value::Object(object) => {
                let mut members = object.into_iter();
                match (members.next(), members.next()) {
                    (Some((variant, payload)), None) => (variant, Some(payload)),
                    _ => return Err(de::Error::invalid_value(Unexpected::Map, &"map with a single key")),
                }
            }
            other => return Err(de::Error::invalid_type(Unexpected::Other(kind_of(&other)), &"string or map")),
        };

        visitor.visit_enum(EnumAccessor { variant, payload, options: self.options })
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map identifier ignored_any
    }
}

/// Renames members that differ from a declared field only by case onto that field.
fn match_field_names(object: Map<String, Value>, fields: &'static [&'static str]) -> Map<String, Value> {
    let mut matched = Map::with_capacity(object.len());
    for (name, member) in object {
        let name = if fields.contains(&name.as_str()) {
            name
        } else {
            let lowered = name.to_lowercase();
            fields
                .iter()
                .find(|field| field.to_lowercase() == lowered)
                .map(|field| (*field).to_owned())
                .unwrap_or(name)
        };
        matched.entry(name).or_insert(member);
    }
    matched
}

fn visit_array<'de, V: Visitor<'de>>(
    items: Vec<Value>,
    options: &JsonSerializerOptions,
    visitor: V,
) -> Result<V::Value, Error> {
    let len = items.len();
    let mut access = SeqAccessor { items: items.into_iter(), options };
    let value = visitor.visit_seq(&mut access)?;
    if access.items.len() == 0 {
        Ok(value)
    } else {
        Err(de::Error::invalid_length(len, &"fewer elements in array"))
    }
}

fn visit_object<'de, V: Visitor<'de>>(
    object: Map<String, Value>,
    options: &JsonSerializerOptions,
    visitor: V,
) -> Result<V::Value, Error> {
    let len = object.len();
    let members = object.into_iter().collect::<Vec<_>>().into_iter();
    let mut access = MapAccessor { members, pending: None, options };
    let value = visitor.visit_map(&mut access)?;
    if access.members.len() == 0 {
        Ok(value)
    } else {
        Err(de::Error::invalid_length(len, &"fewer elements in map"))
    }
}

struct SeqAccessor<'o> {
    items: std::vec::IntoIter<Value>,
    options: &'o JsonSerializerOptions,
}

impl<'de, 'o> SeqAccess<'de> for SeqAccessor<'o> {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<Option<T::Value>, Error> {
        match self.items.next() {
            Some(value) => seed.deserialize(OptionsDeserializer::new(value, self.options)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

struct MapAccessor<'o> {
    members: std::vec::IntoIter<(String, Value)>,
    pending: Option<Value>,
    options: &'o JsonSerializerOptions,
}

impl<'de, 'o> MapAccess<'de> for MapAccessor<'o> {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>, Error> {
        match self.members.next() {
            Some((name, member)) => {
                self.pending = Some(member);
                seed.deserialize(KeyDeserializer(name)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<T: DeserializeSeed<'de>>(&mut self, seed: T) -> Result<T::Value, Error> {
        let value = self.pending.take().ok_or_else(|| <Error as de::Error>::custom("value is missing"))?;
        seed.deserialize(OptionsDeserializer::new(value, self.options))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.members.len())
    }
}

struct EnumAccessor<'o> {
    variant: String,
    payload: Option<Value>,
    options: &'o JsonSerializerOptions,
}

impl<'de, 'o> EnumAccess<'de> for EnumAccessor<'o> {
    type Error = Error;
    type Variant = VariantAccessor<'o>;

    fn variant_seed<S: DeserializeSeed<'de>>(self, seed: S) -> Result<(S::Value, VariantAccessor<'o>), Error> {
        let variant: StringDeserializer<Error> = self.variant.into_deserializer();
        let value = seed.deserialize(variant)?;
        Ok((value, VariantAccessor { payload: self.payload, options: self.options }))
    }
}

struct VariantAccessor<'o> {
    payload: Option<Value>,
    options: &'o JsonSerializerOptions,
}

fn unexpected_payload(payload: &Option<Value>) -> Unexpected<'static> {
    match payload {
        Some(value) => Unexpected::Other(kind_of(value)),
        None => Unexpected::UnitVariant,
    }
}

impl<'de, 'o> VariantAccess<'de> for VariantAccessor<'o> {
    type Error = Error;

    fn unit_variant(self) -> Result<(), Error> {
        match self.payload {
            None | Some(Value::Null) => Ok(()),
            payload => Err(de::Error::invalid_type(unexpected_payload(&payload), &"unit variant")),
        }
    }

    fn newtype_variant_seed<S: DeserializeSeed<'de>>(self, seed: S) -> Result<S::Value, Error> {
        match self.payload {
            Some(value) => seed.deserialize(OptionsDeserializer::new(value, self.options)),
            None => Err(de::Error::invalid_type(Unexpected::UnitVariant, &"newtype variant")),
        }
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Error> {
        match self.payload {
            Some(Value::Array(items)) => visit_array(items, self.options, visitor),
            payload => Err(de::Error::invalid_type(unexpected_payload(&payload), &"tuple variant")),
        }
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        match self.payload {
            Some(Value::Object(object)) => visit_object(object, self.options, visitor),
            payload => Err(de::Error::invalid_type(unexpected_payload(&payload), &"struct variant")),
        }
    }
}

/// Object member names; numeric and boolean map keys arrive quoted.
struct KeyDeserializer(String);

macro_rules! deserialize_parsed_key {
    ($($method:ident => $visit:ident),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
                visitor.$visit(self.0.parse().map_err(<Error as de::Error>::custom)?)
            }
        )*
    };
}

impl<'de> Deserializer<'de> for KeyDeserializer {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_string(self.0)
    }

    deserialize_parsed_key! {
        deserialize_bool => visit_bool,
        deserialize_i8 => visit_i8,
        deserialize_i16 => visit_i16,
        deserialize_i32 => visit_i32,
        deserialize_i64 => visit_i64,
        deserialize_i128 => visit_i128,
        deserialize_u8 => visit_u8,
        deserialize_u16 => visit_u16,
        deserialize_u32 => visit_u32,
        deserialize_u64 => visit_u64,
        deserialize_u128 => visit_u128,
        deserialize_f32 => visit_f32,
        deserialize_f64 => visit_f64,
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        let variant: StringDeserializer<Error> = self.0.into_deserializer();
        visitor.visit_enum(variant)
    }

    forward_to_deserialize_any! {
        char str string bytes byte_buf unit unit_struct seq tuple tuple_struct map struct identifier ignored_any
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use serde::Deserialize;
    use serde_json::json;

    use super::OptionsDeserializer;
    use crate::{converters::kind_of, JsonSerializerOptions};

    #[derive(Deserialize, Debug, PartialEq)]
    struct Profile {
        display_name: String,
        address: Address,
        tags: Vec<String>,
        nickname: Option<String>,
    }

    #[derive(Deserialize, Debug, PartialEq)]
    struct Address {
        city: String,
    }

    #[test]
    fn when_case_insensitive_then_nested_members_match_declared_fields() {
        let options = JsonSerializerOptions::new().case_insensitive(true);
        let value = json!({ "Display_Name": "Ada", "ADDRESS": { "City": "London" }, "tags": ["a"], "NickName": null });

        let profile = Profile::deserialize(OptionsDeserializer::new(value, &options)).expect("profile should read");

        assert_eq!(
            profile,
            Profile {
                display_name: "Ada".to_owned(),
                address: Address { city: "London".to_owned() },
                tags: vec!["a".to_owned()],
                nickname: None,
            }
        );
    }

    #[test]
    fn when_case_sensitive_then_differently_cased_members_are_missing() {
        let options = JsonSerializerOptions::new();
        let value = json!({ "City": "London" });

        let result = Address::deserialize(OptionsDeserializer::new(value, &options));

        assert!(result.is_err());
    }

    #[test]
    fn when_exact_and_differently_cased_members_collide_then_first_member_wins() {
        let options = JsonSerializerOptions::new().case_insensitive(true);
        let value = json!({ "CITY": "Paris", "city": "London" });

        let address = Address::deserialize(OptionsDeserializer::new(value, &options)).expect("address should read");

        // serde_json maps iterate in key order, so "CITY" comes first
        assert_eq!(address.city, "Paris");
    }

    #[test]
    fn when_map_has_numeric_keys_then_keys_are_parsed() {
        let options = JsonSerializerOptions::new().case_insensitive(true);
        let value = json!({ "1": "one", "2": "two" });

        let map = BTreeMap::<u32, String>::deserialize(OptionsDeserializer::new(value, &options))
            .expect("map should read");

        assert_eq!(map.get(&2).map(String::as_str), Some("two"));
    }

    #[test]
    fn when_target_is_untyped_then_value_is_rebuilt_unchanged() {
        let options = JsonSerializerOptions::new().case_insensitive(true);
        let value = json!({ "A": [1, "two", null, { "b": true }] });

        let rebuilt = serde_json::Value::deserialize(OptionsDeserializer::new(value.clone(), &options))
            .expect("value should read");

        assert_eq!(rebuilt, value);
    }

    #[derive(Deserialize, Debug, PartialEq)]
    enum Timer {
        Off,
        After(std::time::Duration),
        Between(std::time::Duration, std::time::Duration),
        Every { period: std::time::Duration },
    }

    #[test]
    fn when_enum_payload_holds_timespans_then_converter_reads_them() {
        let options = JsonSerializerOptions::new().case_insensitive(true).with_converter(crate::TimespanConverter);
        let read = |value| Timer::deserialize(OptionsDeserializer::new(value, &options)).expect("timer should read");

        assert_eq!(read(json!("Off")), Timer::Off);
        assert_eq!(read(json!({ "After": "0.00:00:03:" })), Timer::After(std::time::Duration::from_secs(3)));
        assert_eq!(
            read(json!({ "Between": ["0.00:00:01:", "0.00:00:02:5"] })),
            Timer::Between(std::time::Duration::from_secs(1), std::time::Duration::from_millis(2_500))
        );
        assert_eq!(
            read(json!({ "Every": { "period": "0.01:00:00:" } })),
            Timer::Every { period: std::time::Duration::from_secs(3_600) }
        );
    }

    #[test]
    fn when_enum_map_has_several_keys_then_it_is_rejected() {
        let options = JsonSerializerOptions::new();

        let result = Timer::deserialize(OptionsDeserializer::new(json!({ "Off": null, "After": "x" }), &options));

        assert!(result.is_err());
    }
}
