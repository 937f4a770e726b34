//! Storage for fields a message's schema does not know about.

use bytes::{BufMut, Bytes};
use tracing::trace;

use crate::error::{DecodeError, TagOutOfRange};
use crate::leb128::LebCodec;
use crate::reader::ProtoReader;
use crate::wire::{encode_key, encoded_key_len, is_valid_tag, WireType};

/// Raw value of an unknown field, kept in its wire form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UnknownValue {
    Varint(u64),
    Fixed32(u32),
    Fixed64(u64),
    LengthDelimited(Bytes),
}

impl UnknownValue {
    pub fn wire_type(&self) -> WireType {
        match self {
            UnknownValue::Varint(_) => WireType::Varint,
            UnknownValue::Fixed32(_) => WireType::I32,
            UnknownValue::Fixed64(_) => WireType::I64,
            UnknownValue::LengthDelimited(_) => WireType::Len,
        }
    }

    /// Size of the value, including the length prefix of delimited values.
    pub fn encoded_len(&self) -> usize {
        match self {
            UnknownValue::Varint(v) => v.encoded_leb128_len(),
            UnknownValue::Fixed32(_) => 4,
            UnknownValue::Fixed64(_) => 8,
            UnknownValue::LengthDelimited(b) => (b.len() as u64).encoded_leb128_len() + b.len(),
        }
    }

    pub fn encode<B: BufMut + ?Sized>(&self, buf: &mut B) {
        match self {
            UnknownValue::Varint(v) => {
                v.encode_leb128(buf);
            }
            UnknownValue::Fixed32(v) => buf.put_u32_le(*v),
            UnknownValue::Fixed64(v) => buf.put_u64_le(*v),
            UnknownValue::LengthDelimited(b) => {
                (b.len() as u64).encode_leb128(buf);
                buf.put_slice(b);
            }
        }
    }

    fn read(wire_type: WireType, reader: &mut ProtoReader) -> Result<Self, DecodeError> {
        let value = match wire_type {
            WireType::Varint => UnknownValue::Varint(reader.read_varint64()?),
            WireType::I32 => UnknownValue::Fixed32(reader.read_fixed32()?),
            WireType::I64 => UnknownValue::Fixed64(reader.read_fixed64()?),
            WireType::Len => UnknownValue::LengthDelimited(reader.read_length_delimited()?),
        };
        Ok(value)
    }
}

/// A single unknown occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnknownField {
    pub tag: u32,
    pub value: UnknownValue,
}

/// Unknown fields of a message, in the order they were read or added.
///
/// Written back after the known fields when the message is encoded, so data
/// written by a newer schema survives a decode/encode cycle through an older
/// one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct UnknownFieldStore {
    fields: Vec<UnknownField>,
}

impl UnknownFieldStore {
    pub const fn new() -> Self {
        UnknownFieldStore { fields: Vec::new() }
    }

    /// Appends an occurrence of field number `tag`.
    ///
    /// Fails if `tag` could not be written in a key.
    pub fn add(&mut self, tag: u32, value: UnknownValue) -> Result<(), TagOutOfRange> {
        if !is_valid_tag(tag) {
            return Err(TagOutOfRange { tag });
        }
        self.push(tag, value);
        Ok(())
    }

    pub fn add_varint(&mut self, tag: u32, value: u64) -> Result<(), TagOutOfRange> {
        self.add(tag, UnknownValue::Varint(value))
    }

    pub fn add_fixed32(&mut self, tag: u32, value: u32) -> Result<(), TagOutOfRange> {
        self.add(tag, UnknownValue::Fixed32(value))
    }

    pub fn add_fixed64(&mut self, tag: u32, value: u64) -> Result<(), TagOutOfRange> {
        self.add(tag, UnknownValue::Fixed64(value))
    }

    pub fn add_length_delimited(
        &mut self,
        tag: u32,
        value: impl Into<Bytes>,
    ) -> Result<(), TagOutOfRange> {
        self.add(tag, UnknownValue::LengthDelimited(value.into()))
    }

    /// Appends without checking `tag`, for field numbers already validated.
    pub(crate) fn push(&mut self, tag: u32, value: UnknownValue) {
        debug_assert!(is_valid_tag(tag));
        self.fields.push(UnknownField { tag, value });
    }

    /// Every value stored for field number `tag`, in order.
    pub fn get(&self, tag: u32) -> impl Iterator<Item = &UnknownValue> + '_ {
        self.fields
            .iter()
            .filter(move |field| field.tag == tag)
            .map(|field| &field.value)
    }

    /// Values grouped by field number, groups ordered by first appearance.
    pub fn grouped(&self) -> Vec<(u32, Vec<&UnknownValue>)> {
        let mut groups: Vec<(u32, Vec<&UnknownValue>)> = Vec::new();
        for field in &self.fields {
            match groups.iter_mut().find(|(tag, _)| *tag == field.tag) {
                Some((_, values)) => values.push(&field.value),
                None => groups.push((field.tag, vec![&field.value])),
            }
        }
        groups
    }

    /// Reads the value of an occurrence whose key has already been consumed.
    pub(crate) fn read(
        &mut self,
        tag: u32,
        wire_type: WireType,
        reader: &mut ProtoReader,
    ) -> Result<(), DecodeError> {
        let value = UnknownValue::read(wire_type, reader)?;
        trace!(tag, %wire_type, "stored unknown field");
        self.push(tag, value);
        Ok(())
    }

    /// Size of every stored field, keys included.
    pub fn encoded_len(&self) -> usize {
        self.fields
            .iter()
            .map(|field| encoded_key_len(field.tag) + field.value.encoded_len())
            .sum()
    }

    pub fn encode<B: BufMut + ?Sized>(&self, buf: &mut B) {
        for field in &self.fields {
            encode_key(field.value.wire_type(), field.tag, buf);
            field.value.encode(buf);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnknownField> + '_ {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }
}
