//! Packed and repeated framing for sequences of values.

use bytes::BufMut;

use super::private::Sealed;
use super::ValueAdapter;
use crate::binding::FieldLabel;
use crate::error::SchemaError;
use crate::leb128::LebCodec;
use crate::wire::{encode_key, encoded_key_len, WireType};

/// Adapters that can only write a sequence of values under a field key.
///
/// There is no untagged encode and no decode here: repeated and packed fields
/// are decoded by the message codec, which loops the [`TaggedAdapter::element`]
/// adapter over each occurrence or packed blob.
pub trait TaggedAdapter: Sealed + Send + Sync + 'static {
    /// Adapter for a single element of the sequence.
    type Element: ValueAdapter;

    /// Returns the element adapter.
    fn element(&self) -> &Self::Element;

    /// Label a field using this framing is bound with.
    fn label(&self) -> FieldLabel;

    /// The [`WireType`] this framing writes.
    fn wire_type(&self) -> WireType;

    /// Size of every key, length prefix and payload written for `values`.
    fn encoded_len_tagged(
        &self,
        tag: u32,
        values: &[<Self::Element as ValueAdapter>::Value],
    ) -> usize;

    /// Write `values` under `tag`. An empty sequence writes nothing.
    fn encode_tagged<B: BufMut + ?Sized>(
        &self,
        tag: u32,
        values: &[<Self::Element as ValueAdapter>::Value],
        buf: &mut B,
    );

    /// A redacted sequence is always empty, never absent.
    fn redact(
        &self,
        _values: &[<Self::Element as ValueAdapter>::Value],
    ) -> Vec<<Self::Element as ValueAdapter>::Value> {
        Vec::new()
    }
}

/// Packed framing: one length-delimited occurrence holding every element
/// back to back without keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packed<A> {
    element: A,
}

impl<A: ValueAdapter> Packed<A> {
    /// Wrap `element` for packed framing.
    ///
    /// Length-delimited elements cannot be told apart once concatenated, so
    /// `string`, `bytes` and message adapters are rejected.
    pub fn new(element: A) -> Result<Self, SchemaError> {
        if element.wire_type() == WireType::Len {
            return Err(SchemaError::PackedLengthDelimited {
                datatype: element.datatype(),
            });
        }
        Ok(Packed { element })
    }

    /// Size of the packed payload, excluding the key and length prefix.
    pub fn encoded_len(&self, values: &[A::Value]) -> usize {
        values.iter().map(|v| self.element.encoded_len(v)).sum()
    }

    /// Write the packed payload, without the key or length prefix.
    pub fn encode<B: BufMut + ?Sized>(&self, values: &[A::Value], buf: &mut B) {
        for value in values {
            self.element.encode(value, buf);
        }
    }
}

impl<A> Sealed for Packed<A> {}

impl<A: ValueAdapter> TaggedAdapter for Packed<A> {
    type Element = A;

    fn element(&self) -> &A {
        &self.element
    }

    fn label(&self) -> FieldLabel {
        FieldLabel::Packed
    }

    fn wire_type(&self) -> WireType {
        WireType::Len
    }

    fn encoded_len_tagged(&self, tag: u32, values: &[A::Value]) -> usize {
        if values.is_empty() {
            return 0;
        }
        let len = self.encoded_len(values);
        encoded_key_len(tag) + (len as u64).encoded_leb128_len() + len
    }

    fn encode_tagged<B: BufMut + ?Sized>(&self, tag: u32, values: &[A::Value], buf: &mut B) {
        if values.is_empty() {
            return;
        }
        encode_key(WireType::Len, tag, buf);
        (self.encoded_len(values) as u64).encode_leb128(buf);
        self.encode(values, buf);
    }
}

/// Unpacked framing: every element is its own keyed occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repeated<A> {
    element: A,
}

impl<A: ValueAdapter> Repeated<A> {
    pub fn new(element: A) -> Self {
        Repeated { element }
    }
}

impl<A> Sealed for Repeated<A> {}

impl<A: ValueAdapter> TaggedAdapter for Repeated<A> {
    type Element = A;

    fn element(&self) -> &A {
        &self.element
    }

    fn label(&self) -> FieldLabel {
        FieldLabel::Repeated
    }

    fn wire_type(&self) -> WireType {
        self.element.wire_type()
    }

    fn encoded_len_tagged(&self, tag: u32, values: &[A::Value]) -> usize {
        values
            .iter()
            .map(|v| self.element.encoded_len_tagged(tag, v))
            .sum()
    }

    fn encode_tagged<B: BufMut + ?Sized>(&self, tag: u32, values: &[A::Value], buf: &mut B) {
        for value in values {
            self.element.encode_tagged(tag, value, buf);
        }
    }
}
