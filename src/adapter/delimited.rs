//! Length-delimited `string` and `bytes` adapters.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::{BufMut, Bytes};
use serde_json::Value;

use super::private::Sealed;
use super::{Datatype, ValueAdapter};
use crate::error::{DecodeError, JsonError};
use crate::reader::ProtoReader;
use crate::wire::utf8_len;

/// `string`, UTF-8 text validated on decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ProtoString;

impl Sealed for ProtoString {}

impl ValueAdapter for ProtoString {
    type Value = String;

    fn datatype(&self) -> Datatype {
        Datatype::String
    }

    #[inline]
    fn encoded_len(&self, value: &String) -> usize {
        utf8_len(value)
    }

    #[inline]
    fn encode<B: BufMut + ?Sized>(&self, value: &String, buf: &mut B) {
        buf.put_slice(value.as_bytes());
    }

    fn decode(&self, reader: &mut ProtoReader) -> Result<String, DecodeError> {
        reader.read_string()
    }

    fn display(&self, value: &String) -> String {
        value.clone()
    }

    fn to_json(&self, value: &String) -> Value {
        Value::String(value.clone())
    }

    fn from_json(&self, json: &Value) -> Result<String, JsonError> {
        json.as_str()
            .map(str::to_string)
            .ok_or_else(|| JsonError::invalid_value("a string"))
    }
}

/// `bytes`, an opaque byte string. Written to JSON as standard base64.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ProtoBytes;

impl Sealed for ProtoBytes {}

impl ValueAdapter for ProtoBytes {
    type Value = Bytes;

    fn datatype(&self) -> Datatype {
        Datatype::Bytes
    }

    #[inline]
    fn encoded_len(&self, value: &Bytes) -> usize {
        value.len()
    }

    #[inline]
    fn encode<B: BufMut + ?Sized>(&self, value: &Bytes, buf: &mut B) {
        buf.put_slice(value);
    }

    fn decode(&self, reader: &mut ProtoReader) -> Result<Bytes, DecodeError> {
        reader.read_length_delimited()
    }

    fn display(&self, value: &Bytes) -> String {
        let mut out = String::with_capacity(6 + value.len() * 2);
        out.push_str("[hex=");
        for byte in value.iter() {
            out.push_str(&format!("{byte:02x}"));
        }
        out.push(']');
        out
    }

    fn to_json(&self, value: &Bytes) -> Value {
        Value::String(STANDARD.encode(value))
    }

    fn from_json(&self, json: &Value) -> Result<Bytes, JsonError> {
        let text = json
            .as_str()
            .ok_or_else(|| JsonError::invalid_value("a base64 string"))?;
        Ok(Bytes::from(STANDARD.decode(text)?))
    }
}
