//! Tag binding tables: the per-message list of fields.
//!
//! A [`TagBindingTable`] is built once per message type from
//! [`Message::describe`](crate::Message::describe) and shared by the binary
//! codec, the JSON bridge, redaction and display.

use std::collections::HashMap;
use std::fmt;

use bytes::BufMut;
use serde_json::Value;
use tracing::trace;

use crate::adapter::{Datatype, FieldAdapter, Packed, Repeated, TaggedAdapter, ValueAdapter};
use crate::error::{DecodeError, JsonError, SchemaError};
use crate::message::{Message, MessageBuilder};
use crate::reader::ProtoReader;
use crate::registry::Resolver;
use crate::unknown::UnknownValue;
use crate::wire::{is_valid_tag, WireType, RESERVED_TAG_RANGE};

/// How many values a field holds and how repeated values are framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldLabel {
    Required,
    Optional,
    Repeated,
    Packed,
}

impl FieldLabel {
    /// Whether the field holds a sequence of values.
    pub const fn is_repeated(self) -> bool {
        matches!(self, FieldLabel::Repeated | FieldLabel::Packed)
    }
}

/// Type-erased codec for one field of `M`, pairing an adapter with the
/// accessor and mutator of the field's slot.
pub(crate) trait FieldCodec<M: Message>: Send + Sync {
    fn is_present(&self, message: &M) -> bool;

    fn encoded_len(&self, tag: u32, message: &M) -> usize;

    fn encode(&self, tag: u32, message: &M, buf: &mut dyn BufMut);

    /// Whether an occurrence with `wire_type` can be decoded by this field.
    fn accepts(&self, wire_type: WireType) -> bool;

    fn decode(
        &self,
        tag: u32,
        wire_type: WireType,
        reader: &mut ProtoReader,
        builder: &mut M::Builder,
    ) -> Result<(), DecodeError>;

    /// `None` when the field is absent or an empty sequence.
    fn to_json(&self, message: &M) -> Option<Value>;

    fn from_json(&self, json: &Value, builder: &mut M::Builder) -> Result<(), JsonError>;

    /// Copy the field into `builder`, replacing it by its redacted form when
    /// `redact` is set and redacting nested messages otherwise.
    fn copy_redacted(&self, redact: bool, message: &M, builder: &mut M::Builder);

    fn display(&self, message: &M) -> Option<String>;

    fn resolve(&self, resolver: &mut Resolver<'_>) -> Result<(), SchemaError>;
}

/// Storage of a singular field.
///
/// Implemented for `Option<V>` and, so recursive messages can hold
/// themselves, `Option<Box<V>>`.
pub(crate) trait SingularSlot<V>: Send + Sync + 'static {
    fn value(&self) -> Option<&V>;

    fn store(&mut self, value: Option<V>);
}

impl<V: Send + Sync + 'static> SingularSlot<V> for Option<V> {
    fn value(&self) -> Option<&V> {
        self.as_ref()
    }

    fn store(&mut self, value: Option<V>) {
        *self = value;
    }
}

impl<V: Send + Sync + 'static> SingularSlot<V> for Option<Box<V>> {
    fn value(&self) -> Option<&V> {
        self.as_deref()
    }

    fn store(&mut self, value: Option<V>) {
        *self = value.map(Box::new);
    }
}

/// Enum numbers this build does not know are kept as unknown varints.
fn preserve_unknown_enum<B: MessageBuilder>(
    tag: u32,
    result: Result<(), DecodeError>,
    builder: &mut B,
) -> Result<(), DecodeError> {
    match result {
        Err(DecodeError::UnknownEnumValue { value }) => {
            trace!(tag, value, "keeping unknown enum value as an unknown field");
            builder
                .unknown_fields_mut()
                .push(tag, UnknownValue::Varint(value));
            Ok(())
        }
        other => other,
    }
}

struct Singular<M: Message, A: ValueAdapter, S> {
    adapter: A,
    get: fn(&M) -> &S,
    set: fn(&mut M::Builder) -> &mut S,
}

impl<M, A, S> FieldCodec<M> for Singular<M, A, S>
where
    M: Message,
    A: ValueAdapter,
    S: SingularSlot<A::Value>,
{
    fn is_present(&self, message: &M) -> bool {
        (self.get)(message).value().is_some()
    }

    fn encoded_len(&self, tag: u32, message: &M) -> usize {
        (self.get)(message)
            .value()
            .map_or(0, |value| self.adapter.encoded_len_tagged(tag, value))
    }

    fn encode(&self, tag: u32, message: &M, buf: &mut dyn BufMut) {
        if let Some(value) = (self.get)(message).value() {
            self.adapter.encode_tagged(tag, value, buf);
        }
    }

    fn accepts(&self, wire_type: WireType) -> bool {
        wire_type == self.adapter.wire_type()
    }

    fn decode(
        &self,
        tag: u32,
        _wire_type: WireType,
        reader: &mut ProtoReader,
        builder: &mut M::Builder,
    ) -> Result<(), DecodeError> {
        let result = self
            .adapter
            .decode(reader)
            .map(|value| (self.set)(builder).store(Some(value)));
        preserve_unknown_enum(tag, result, builder)
    }

    fn to_json(&self, message: &M) -> Option<Value> {
        (self.get)(message)
            .value()
            .map(|value| self.adapter.to_json(value))
    }

    fn from_json(&self, json: &Value, builder: &mut M::Builder) -> Result<(), JsonError> {
        let value = self.adapter.from_json(json)?;
        (self.set)(builder).store(Some(value));
        Ok(())
    }

    fn copy_redacted(&self, redact: bool, message: &M, builder: &mut M::Builder) {
        if let Some(value) = (self.get)(message).value() {
            let copy = if redact {
                self.adapter.redact(value)
            } else {
                Some(self.adapter.redact_nested(value))
            };
            (self.set)(builder).store(copy);
        }
    }

    fn display(&self, message: &M) -> Option<String> {
        (self.get)(message)
            .value()
            .map(|value| self.adapter.display(value))
    }

    fn resolve(&self, resolver: &mut Resolver<'_>) -> Result<(), SchemaError> {
        self.adapter.resolve(resolver)
    }
}

type ElementValue<T> = <<T as TaggedAdapter>::Element as ValueAdapter>::Value;

type FieldValue<A> = <<A as FieldAdapter>::Adapter as ValueAdapter>::Value;

struct Sequence<M: Message, T: TaggedAdapter> {
    adapter: T,
    get: fn(&M) -> &Vec<ElementValue<T>>,
    set: fn(&mut M::Builder) -> &mut Vec<ElementValue<T>>,
}

impl<M: Message, T: TaggedAdapter> Sequence<M, T> {
    fn push(
        &self,
        tag: u32,
        reader: &mut ProtoReader,
        builder: &mut M::Builder,
    ) -> Result<(), DecodeError> {
        let result = self
            .adapter
            .element()
            .decode(reader)
            .map(|value| (self.set)(builder).push(value));
        preserve_unknown_enum(tag, result, builder)
    }
}

impl<M: Message, T: TaggedAdapter> FieldCodec<M> for Sequence<M, T> {
    fn is_present(&self, message: &M) -> bool {
        !(self.get)(message).is_empty()
    }

    fn encoded_len(&self, tag: u32, message: &M) -> usize {
        self.adapter.encoded_len_tagged(tag, (self.get)(message))
    }

    fn encode(&self, tag: u32, message: &M, buf: &mut dyn BufMut) {
        self.adapter.encode_tagged(tag, (self.get)(message), buf);
    }

    fn accepts(&self, wire_type: WireType) -> bool {
        let element = self.adapter.element();
        wire_type == element.wire_type()
            || (wire_type == WireType::Len && element.datatype().is_packable())
    }

    fn decode(
        &self,
        tag: u32,
        wire_type: WireType,
        reader: &mut ProtoReader,
        builder: &mut M::Builder,
    ) -> Result<(), DecodeError> {
        let element_wire_type = self.adapter.element().wire_type();
        if wire_type != WireType::Len || element_wire_type == WireType::Len {
            return self.push(tag, reader, builder);
        }

        // A packed blob, accepted whether or not the field is declared packed.
        let blob = reader.read_length_delimited()?;
        if let Some(width) = element_wire_type.fixed_size() {
            if blob.len() % width != 0 {
                return Err(DecodeError::InvalidPackedLength {
                    expected_multiple: width as u8,
                    actual: blob.len(),
                });
            }
        }
        trace!(tag, len = blob.len(), "decoding packed blob");

        let mut packed = reader.packed(blob);
        while packed.has_remaining() {
            self.push(tag, &mut packed, builder)?;
        }
        Ok(())
    }

    fn to_json(&self, message: &M) -> Option<Value> {
        let values = (self.get)(message);
        if values.is_empty() {
            return None;
        }
        let element = self.adapter.element();
        Some(Value::Array(
            values.iter().map(|value| element.to_json(value)).collect(),
        ))
    }

    fn from_json(&self, json: &Value, builder: &mut M::Builder) -> Result<(), JsonError> {
        let items = json
            .as_array()
            .ok_or_else(|| JsonError::invalid_value("an array"))?;
        let element = self.adapter.element();
        let values = items
            .iter()
            .map(|item| element.from_json(item))
            .collect::<Result<Vec<_>, _>>()?;
        (self.set)(builder).extend(values);
        Ok(())
    }

    fn copy_redacted(&self, redact: bool, message: &M, builder: &mut M::Builder) {
        let values = (self.get)(message);
        let copy = if redact {
            self.adapter.redact(values)
        } else {
            let element = self.adapter.element();
            values.iter().map(|v| element.redact_nested(v)).collect()
        };
        *(self.set)(builder) = copy;
    }

    fn display(&self, message: &M) -> Option<String> {
        let values = (self.get)(message);
        if values.is_empty() {
            return None;
        }
        let element = self.adapter.element();
        let items: Vec<String> = values.iter().map(|v| element.display(v)).collect();
        Some(format!("[{}]", items.join(", ")))
    }

    fn resolve(&self, resolver: &mut Resolver<'_>) -> Result<(), SchemaError> {
        self.adapter.element().resolve(resolver)
    }
}

/// One field of message `M`.
pub struct TagBinding<M: Message> {
    tag: u32,
    name: &'static str,
    datatype: Datatype,
    label: FieldLabel,
    wire_type: WireType,
    redacted: bool,
    pub(crate) codec: Box<dyn FieldCodec<M>>,
}

impl<M: Message> TagBinding<M> {
    /// The field number.
    pub fn tag(&self) -> u32 {
        self.tag
    }

    /// The field name, used as the JSON member name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    pub fn label(&self) -> FieldLabel {
        self.label
    }

    /// The wire type this field is written with.
    pub fn wire_type(&self) -> WireType {
        self.wire_type
    }

    /// Whether the field is hidden by redaction and display.
    pub fn is_redacted(&self) -> bool {
        self.redacted
    }

    /// Whether `message` has a value (or a non-empty sequence) for this field.
    pub fn is_present(&self, message: &M) -> bool {
        self.codec.is_present(message)
    }
}

impl<M: Message> fmt::Debug for TagBinding<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagBinding")
            .field("tag", &self.tag)
            .field("name", &self.name)
            .field("datatype", &self.datatype)
            .field("label", &self.label)
            .field("redacted", &self.redacted)
            .finish()
    }
}

/// The fields of message `M`, sorted by field number.
pub struct TagBindingTable<M: Message> {
    bindings: Vec<TagBinding<M>>,
    by_name: HashMap<&'static str, usize>,
}

impl<M: Message> TagBindingTable<M> {
    /// Name of the message type this table describes.
    pub fn message_name(&self) -> &'static str {
        M::NAME
    }

    /// Every binding, in ascending field number order.
    pub fn bindings(&self) -> &[TagBinding<M>] {
        &self.bindings
    }

    /// The binding for field number `tag`.
    pub fn get(&self, tag: u32) -> Option<&TagBinding<M>> {
        self.bindings
            .binary_search_by_key(&tag, |binding| binding.tag)
            .ok()
            .map(|idx| &self.bindings[idx])
    }

    /// The binding whose field is called `name`.
    pub fn get_by_name(&self, name: &str) -> Option<&TagBinding<M>> {
        self.by_name.get(name).map(|idx| &self.bindings[*idx])
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<M: Message> fmt::Debug for TagBindingTable<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagBindingTable")
            .field("message", &M::NAME)
            .field("bindings", &self.bindings)
            .finish()
    }
}

/// Collects the fields of a message type, see [`Message::describe`].
///
/// Accessors and mutators are plain functions (non-capturing closures work)
/// returning the field's slot: `Option<V>` for singular fields and `Vec<V>`
/// for repeated ones.
///
/// Invalid declarations (bad or duplicate field numbers, duplicate names,
/// packing a length-delimited type) are reported when the table is built.
pub struct TableBuilder<M: Message> {
    bindings: Vec<TagBinding<M>>,
    error: Option<SchemaError>,
}

impl<M: Message> TableBuilder<M> {
    pub(crate) fn new() -> Self {
        TableBuilder {
            bindings: Vec::new(),
            error: None,
        }
    }

    /// A field that is expected to be set. Presence is not enforced.
    pub fn required<A: FieldAdapter>(
        self,
        tag: u32,
        name: &'static str,
        adapter: A,
        get: fn(&M) -> &Option<FieldValue<A>>,
        set: fn(&mut M::Builder) -> &mut Option<FieldValue<A>>,
    ) -> Self {
        self.singular(FieldLabel::Required, tag, name, adapter.into_adapter(), get, set)
    }

    /// A field that may be absent.
    pub fn optional<A: FieldAdapter>(
        self,
        tag: u32,
        name: &'static str,
        adapter: A,
        get: fn(&M) -> &Option<FieldValue<A>>,
        set: fn(&mut M::Builder) -> &mut Option<FieldValue<A>>,
    ) -> Self {
        self.singular(FieldLabel::Optional, tag, name, adapter.into_adapter(), get, set)
    }

    /// An optional field stored boxed, for messages that contain themselves.
    pub fn optional_boxed<A: FieldAdapter>(
        self,
        tag: u32,
        name: &'static str,
        adapter: A,
        get: fn(&M) -> &Option<Box<FieldValue<A>>>,
        set: fn(&mut M::Builder) -> &mut Option<Box<FieldValue<A>>>,
    ) -> Self {
        self.singular(FieldLabel::Optional, tag, name, adapter.into_adapter(), get, set)
    }

    /// A repeated field written with one key per element.
    pub fn repeated<A: FieldAdapter>(
        self,
        tag: u32,
        name: &'static str,
        adapter: A,
        get: fn(&M) -> &Vec<FieldValue<A>>,
        set: fn(&mut M::Builder) -> &mut Vec<FieldValue<A>>,
    ) -> Self {
        self.sequence(tag, name, Repeated::new(adapter.into_adapter()), get, set)
    }

    /// A repeated field written as a single packed blob.
    pub fn packed<A: FieldAdapter>(
        mut self,
        tag: u32,
        name: &'static str,
        adapter: A,
        get: fn(&M) -> &Vec<FieldValue<A>>,
        set: fn(&mut M::Builder) -> &mut Vec<FieldValue<A>>,
    ) -> Self {
        match Packed::new(adapter.into_adapter()) {
            Ok(packed) => self.sequence(tag, name, packed, get, set),
            Err(err) => {
                self.fail(err);
                self
            }
        }
    }

    /// Marks the most recently added field as redacted.
    pub fn redacted(mut self) -> Self {
        if let Some(binding) = self.bindings.last_mut() {
            binding.redacted = true;
        }
        self
    }

    fn singular<A, S>(
        mut self,
        label: FieldLabel,
        tag: u32,
        name: &'static str,
        adapter: A,
        get: fn(&M) -> &S,
        set: fn(&mut M::Builder) -> &mut S,
    ) -> Self
    where
        A: ValueAdapter,
        S: SingularSlot<A::Value>,
    {
        self.bindings.push(TagBinding {
            tag,
            name,
            datatype: adapter.datatype(),
            label,
            wire_type: adapter.wire_type(),
            redacted: false,
            codec: Box::new(Singular { adapter, get, set }),
        });
        self
    }

    fn sequence<T: TaggedAdapter>(
        mut self,
        tag: u32,
        name: &'static str,
        adapter: T,
        get: fn(&M) -> &Vec<ElementValue<T>>,
        set: fn(&mut M::Builder) -> &mut Vec<ElementValue<T>>,
    ) -> Self {
        self.bindings.push(TagBinding {
            tag,
            name,
            datatype: adapter.element().datatype(),
            label: adapter.label(),
            wire_type: adapter.wire_type(),
            redacted: false,
            codec: Box::new(Sequence { adapter, get, set }),
        });
        self
    }

    fn fail(&mut self, err: SchemaError) {
        self.error.get_or_insert(err);
    }

    /// Validate the collected fields and index them.
    pub(crate) fn build(self) -> Result<TagBindingTable<M>, SchemaError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let mut bindings = self.bindings;
        for binding in &bindings {
            let tag = binding.tag;
            if !is_valid_tag(tag) {
                return Err(SchemaError::TagOutOfRange {
                    message: M::NAME,
                    tag,
                });
            }
            if RESERVED_TAG_RANGE.contains(&tag) {
                return Err(SchemaError::ReservedTag {
                    message: M::NAME,
                    tag,
                });
            }
        }

        bindings.sort_by_key(|binding| binding.tag);
        if let Some(pair) = bindings.windows(2).find(|pair| pair[0].tag == pair[1].tag) {
            return Err(SchemaError::DuplicateTag {
                message: M::NAME,
                tag: pair[0].tag,
            });
        }

        let mut by_name = HashMap::with_capacity(bindings.len());
        for (idx, binding) in bindings.iter().enumerate() {
            if by_name.insert(binding.name, idx).is_some() {
                return Err(SchemaError::DuplicateName {
                    message: M::NAME,
                    name: binding.name,
                });
            }
        }

        Ok(TagBindingTable { bindings, by_name })
    }
}
