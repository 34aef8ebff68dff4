//! Builds a `serde_json::Value` that honours [`JsonSerializerOptions`] on write.
//!
//! The write-side twin of `de.rs`: converters are picked by the struct name serde hands to
//! `serialize_struct`, so only the type a converter was registered for is ever rewritten.
//! Null handling applies to struct fields; map entries are written as they are.

use serde::{
    ser::{
        self, SerializeMap, SerializeSeq, SerializeStruct, SerializeStructVariant, SerializeTuple,
        SerializeTupleStruct, SerializeTupleVariant,
    },
    Serialize, Serializer,
};
use serde_json::{value::Serializer as ValueSerializer, Map, Value};

use crate::{converters::kind_of, JsonSerializerOptions};

type Error = serde_json::Error;

#[derive(Clone, Copy)]
pub(crate) struct OptionsSerializer<'o> {
    options: &'o JsonSerializerOptions,
    lenient_keys: bool,
}

impl<'o> OptionsSerializer<'o> {
    pub(crate) fn new(options: &'o JsonSerializerOptions) -> Self {
        Self { options, lenient_keys: false }
    }

    /// Writes map keys JSON cannot express (tuples, structs, ..) as their JSON text instead of failing.
    pub(crate) fn lenient_keys(mut self) -> Self {
        self.lenient_keys = true;
        self
    }

    pub(crate) fn to_value<T: Serialize + ?Sized>(self, value: &T) -> Result<Value, Error> {
        value.serialize(self)
    }

    fn map_key(self, key: Value) -> Result<String, Error> {
        match key {
            Value::String(key) => Ok(key),
            Value::Number(number) => Ok(number.to_string()),
            Value::Bool(flag) => Ok(flag.to_string()),
            other if self.lenient_keys => Ok(other.to_string()),
            other => Err(<Error as ser::Error>::custom(format!("map key must be a string, found {}", kind_of(&other)))),
        }
    }
}

macro_rules! delegate_to_value_serializer {
    ($($method:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method(self, v: $ty) -> Result<Value, Error> {
                ValueSerializer.$method(v)
            }
        )*
    };
}

impl<'o> Serializer for OptionsSerializer<'o> {
    type Ok = Value;
    type Error = Error;
    type SerializeSeq = SeqBuilder<'o>;
    type SerializeTuple = SeqBuilder<'o>;
    type SerializeTupleStruct = SeqBuilder<'o>;
    type SerializeTupleVariant = SeqBuilder<'o>;
    type SerializeMap = MapBuilder<'o>;
    type SerializeStruct = StructBuilder<'o>;
    type SerializeStructVariant = StructBuilder<'o>;

    delegate_to_value_serializer! {
        serialize_bool: bool,
        serialize_i8: i8,
        serialize_i16: i16,
        serialize_i32: i32,
        serialize_i64: i64,
        serialize_i128: i128,
        serialize_u8: u8,
        serialize_u16: u16,
        serialize_u32: u32,
        serialize_u64: u64,
        serialize_u128: u128,
        serialize_f32: f32,
        serialize_f64: f64,
        serialize_char: char,
        serialize_str: &str,
        serialize_bytes: &[u8],
    }

    fn serialize_none(self) -> Result<Value, Error> {
        Ok(Value::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Value, Error> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value, Error> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, Error> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(self, _name: &'static str, _index: u32, variant: &'static str) -> Result<Value, Error> {
        Ok(Value::String(variant.to_owned()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(self, _name: &'static str, value: &T) -> Result<Value, Error> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, Error> {
        Ok(tagged(Some(variant), value.serialize(self)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder<'o>, Error> {
        Ok(SeqBuilder { serializer: self, variant: None, items: Vec::with_capacity(len.unwrap_or(0)) })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder<'o>, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SeqBuilder<'o>, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SeqBuilder<'o>, Error> {
        Ok(SeqBuilder { serializer: self, variant: Some(variant), items: Vec::with_capacity(len) })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapBuilder<'o>, Error> {
        Ok(MapBuilder { serializer: self, members: Map::new(), pending_key: None })
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<StructBuilder<'o>, Error> {
        Ok(StructBuilder { serializer: self, name, variant: None, members: Map::new() })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<StructBuilder<'o>, Error> {
        Ok(StructBuilder { serializer: self, name, variant: Some(variant), members: Map::new() })
    }
}

/// Externally tagged enum form, `{"Variant": payload}`.
fn tagged(variant: Option<&'static str>, payload: Value) -> Value {
    match variant {
        Some(variant) => {
            let mut object = Map::with_capacity(1);
            object.insert(variant.to_owned(), payload);
            Value::Object(object)
        }
        None => payload,
    }
}

pub(crate) struct SeqBuilder<'o> {
    serializer: OptionsSerializer<'o>,
    variant: Option<&'static str>,
    items: Vec<Value>,
}

impl SeqBuilder<'_> {
    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        self.items.push(value.serialize(self.serializer)?);
        Ok(())
    }

    fn finish(self) -> Value {
        tagged(self.variant, Value::Array(self.items))
    }
}

impl SerializeSeq for SeqBuilder<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        self.push(value)
    }

    fn end(self) -> Result<Value, Error> {
        Ok(self.finish())
    }
}

impl SerializeTuple for SeqBuilder<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        self.push(value)
    }

    fn end(self) -> Result<Value, Error> {
        Ok(self.finish())
    }
}

impl SerializeTupleStruct for SeqBuilder<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        self.push(value)
    }

    fn end(self) -> Result<Value, Error> {
        Ok(self.finish())
    }
}

impl SerializeTupleVariant for SeqBuilder<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        self.push(value)
    }

    fn end(self) -> Result<Value, Error> {
        Ok(self.finish())
    }
}

pub(crate) struct MapBuilder<'o> {
    serializer: OptionsSerializer<'o>,
    members: Map<String, Value>,
    pending_key: Option<String>,
}

impl SerializeMap for MapBuilder<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), Error> {
        let key = key.serialize(self.serializer)?;
        self.pending_key = Some(self.serializer.map_key(key)?);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        let key = self.pending_key.take().ok_or_else(|| <Error as ser::Error>::custom("map value without a key"))?;
        self.members.insert(key, value.serialize(self.serializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::Object(self.members))
    }
}

pub(crate) struct StructBuilder<'o> {
    serializer: OptionsSerializer<'o>,
    name: &'static str,
    variant: Option<&'static str>,
    members: Map<String, Value>,
}

impl StructBuilder<'_> {
    fn field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<(), Error> {
        let value = value.serialize(self.serializer)?;
        if !(value.is_null() && self.serializer.options.ignore_null_on_write) {
            self.members.insert(key.to_owned(), value);
        }
        Ok(())
    }
}

impl SerializeStruct for StructBuilder<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<(), Error> {
        self.field(key, value)
    }

    fn end(self) -> Result<Value, Error> {
        let converter = self.serializer.options.converter_for(self.name);
        let converted = converter.and_then(|converter| converter.write(&self.members));
        Ok(converted.unwrap_or(Value::Object(self.members)))
    }
}

impl SerializeStructVariant for StructBuilder<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<(), Error> {
        self.field(key, value)
    }

    fn end(self) -> Result<Value, Error> {
        Ok(tagged(self.variant, Value::Object(self.members)))
    }
}
