//! Mapping between messages and `serde_json` value trees.
//!
//! Integers are read back as the bit pattern they denote, so `-1` and
//! `18446744073709551615` both name the all-ones `uint64`. Unknown fields are
//! written under their decimal field number as `[typeName, value, ...]`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde_json::{Map, Number, Value};

use crate::binding::TagBindingTable;
use crate::error::JsonError;
use crate::message::{Message, MessageBuilder};
use crate::unknown::{UnknownFieldStore, UnknownValue};
use crate::wire::{is_valid_tag, WireType};

/// Reads an integer as a 64-bit pattern, signed or unsigned.
fn integer_from_json(json: &Value) -> Option<Number> {
    match json {
        Value::Number(n) if n.is_u64() || n.is_i64() => Some(n.clone()),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .map(Number::from)
                .or_else(|_| s.parse::<i64>().map(Number::from))
                .ok()
        }
        _ => None,
    }
}

/// Reads a 32-bit integer in either its signed or unsigned reading.
pub(crate) fn bits32_from_json(json: &Value) -> Result<u32, JsonError> {
    let n = integer_from_json(json).ok_or_else(|| JsonError::invalid_value("a 32-bit integer"))?;
    if let Some(v) = n.as_u64() {
        return u32::try_from(v).map_err(|_| JsonError::invalid_value("a 32-bit integer"));
    }
    match n.as_i64().map(i32::try_from) {
        Some(Ok(v)) => Ok(v as u32),
        _ => Err(JsonError::invalid_value("a 32-bit integer")),
    }
}

/// Reads a 64-bit integer in either its signed or unsigned reading.
pub(crate) fn bits64_from_json(json: &Value) -> Result<u64, JsonError> {
    let n = integer_from_json(json).ok_or_else(|| JsonError::invalid_value("a 64-bit integer"))?;
    match (n.as_u64(), n.as_i64()) {
        (Some(v), _) => Ok(v),
        (None, Some(v)) => Ok(v as u64),
        (None, None) => Err(JsonError::invalid_value("a 64-bit integer")),
    }
}

/// JSON spelling of the non-finite floating point values.
pub(crate) fn non_finite_name(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some("NaN")
    } else if value == f64::INFINITY {
        Some("Infinity")
    } else if value == f64::NEG_INFINITY {
        Some("-Infinity")
    } else {
        None
    }
}

pub(crate) fn double_to_json(value: f64) -> Value {
    match non_finite_name(value) {
        Some(name) => Value::String(name.to_string()),
        None => Value::from(value),
    }
}

pub(crate) fn double_from_json(json: &Value) -> Result<f64, JsonError> {
    let value = match json {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match s.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            other => other.trim().parse::<f64>().ok(),
        },
        _ => None,
    };
    value.ok_or_else(|| JsonError::invalid_value("a number"))
}

fn unknown_value_to_json(value: &UnknownValue) -> Value {
    match value {
        UnknownValue::Varint(v) | UnknownValue::Fixed64(v) => Value::from(*v),
        UnknownValue::Fixed32(v) => Value::from(*v),
        UnknownValue::LengthDelimited(b) => Value::String(STANDARD.encode(b)),
    }
}

fn unknown_value_from_json(wire_type: WireType, json: &Value) -> Result<UnknownValue, JsonError> {
    let value = match wire_type {
        WireType::Varint => UnknownValue::Varint(bits64_from_json(json)?),
        WireType::I32 => UnknownValue::Fixed32(bits32_from_json(json)?),
        WireType::I64 => UnknownValue::Fixed64(bits64_from_json(json)?),
        WireType::Len => {
            let text = json
                .as_str()
                .ok_or_else(|| JsonError::invalid_value("a base64 string"))?;
            UnknownValue::LengthDelimited(Bytes::from(STANDARD.decode(text)?))
        }
    };
    Ok(value)
}

/// Writes the occurrences of one unknown field number, naming the wire type
/// first and again whenever it changes.
fn unknown_group_to_json(values: &[&UnknownValue]) -> Value {
    let mut items = Vec::with_capacity(values.len() + 1);
    let mut current = None;
    for value in values {
        let wire_type = value.wire_type();
        if current != Some(wire_type) {
            items.push(Value::String(wire_type.name().to_string()));
            current = Some(wire_type);
        }
        items.push(unknown_value_to_json(value));
    }
    Value::Array(items)
}

fn unknown_group_from_json(
    tag: u32,
    json: &Value,
    store: &mut UnknownFieldStore,
) -> Result<(), JsonError> {
    let items = json
        .as_array()
        .ok_or_else(|| JsonError::invalid_value("an array"))?;

    let mut current = None;
    for item in items {
        if let Value::String(name) = item {
            if let Some(wire_type) = WireType::from_name(name) {
                current = Some(wire_type);
                continue;
            }
            // Any other string is a value of the type in effect.
            if current.is_none() {
                return Err(JsonError::UnknownFieldType { name: name.clone() });
            }
        }
        let wire_type = current.ok_or_else(|| JsonError::invalid_value("a field type name"))?;
        store.push(tag, unknown_value_from_json(wire_type, item)?);
    }
    Ok(())
}

fn parse_field_number(name: &str) -> Result<u32, JsonError> {
    name.parse::<u32>()
        .ok()
        .filter(|tag| is_valid_tag(*tag))
        .ok_or_else(|| JsonError::InvalidFieldNumber {
            name: name.to_string(),
        })
}

impl<M: Message> TagBindingTable<M> {
    /// Maps `message` to a JSON object.
    pub fn to_json(&self, message: &M) -> Value {
        let mut object = Map::new();
        for binding in self.bindings() {
            if let Some(value) = binding.codec.to_json(message) {
                object.insert(binding.name().to_string(), value);
            }
        }
        for (tag, values) in message.unknown_fields().grouped() {
            object.insert(tag.to_string(), unknown_group_to_json(&values));
        }
        Value::Object(object)
    }

    /// Reads a message from a JSON object.
    pub fn from_json(&self, json: &Value) -> Result<M, JsonError> {
        let object = json
            .as_object()
            .ok_or(JsonError::ExpectedObject { message: M::NAME })?;

        let mut builder = M::Builder::default();
        for (name, value) in object {
            if value.is_null() {
                continue;
            }
            match self.get_by_name(name) {
                Some(binding) => binding
                    .codec
                    .from_json(value, &mut builder)
                    .map_err(|err| err.in_field(name.as_str()))?,
                None => {
                    let tag = parse_field_number(name)?;
                    unknown_group_from_json(tag, value, builder.unknown_fields_mut())
                        .map_err(|err| err.in_field(name.as_str()))?;
                }
            }
        }
        Ok(builder.build())
    }
}
