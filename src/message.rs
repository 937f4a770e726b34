//! Message traits and the binary message codec.

use core::fmt;

use bytes::BufMut;
use tracing::{debug, trace};

use crate::binding::{TableBuilder, TagBindingTable};
use crate::config::MismatchPolicy;
use crate::error::DecodeError;
use crate::reader::ProtoReader;
use crate::unknown::UnknownFieldStore;

/// A protobuf message type.
///
/// Messages are immutable values. Decoding goes through the associated
/// [`Message::Builder`], which owns the fields while they are being filled in.
///
/// # Example
/// ```
/// use protowire::adapter::{Int32, ProtoString};
/// use protowire::{Message, MessageBuilder, Registry, TableBuilder, UnknownFieldStore};
///
/// #[derive(Debug, Clone, Default, PartialEq)]
/// struct Greeting {
///     text: Option<String>,
///     count: Option<i32>,
///     unknown: UnknownFieldStore,
/// }
///
/// impl Message for Greeting {
///     type Builder = Greeting;
///     const NAME: &'static str = "Greeting";
///
///     fn describe(table: TableBuilder<Self>) -> TableBuilder<Self> {
///         table
///             .optional(1, "text", ProtoString, |m| &m.text, |b| &mut b.text)
///             .optional(2, "count", Int32, |m| &m.count, |b| &mut b.count)
///     }
///
///     fn unknown_fields(&self) -> &UnknownFieldStore {
///         &self.unknown
///     }
/// }
///
/// impl MessageBuilder for Greeting {
///     type Message = Greeting;
///
///     fn unknown_fields_mut(&mut self) -> &mut UnknownFieldStore {
///         &mut self.unknown
///     }
///
///     fn build(self) -> Greeting {
///         self
///     }
/// }
///
/// let registry = Registry::new();
/// let greeting = Greeting { text: Some("hi".into()), count: Some(3), ..Default::default() };
/// let bytes = registry.encode(&greeting).unwrap();
/// assert_eq!(bytes, [0x0a, 2, b'h', b'i', 0x10, 3]);
/// assert_eq!(registry.decode::<Greeting, _>(&bytes[..]).unwrap(), greeting);
/// ```
pub trait Message: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Mutable form of the message used while decoding.
    type Builder: MessageBuilder<Message = Self>;

    /// Name of the message, used in display output and errors.
    const NAME: &'static str;

    /// List the fields of this message.
    fn describe(table: TableBuilder<Self>) -> TableBuilder<Self>;

    /// Fields that were read but are not part of this message's schema.
    fn unknown_fields(&self) -> &UnknownFieldStore;
}

/// Mutable form of a [`Message`].
pub trait MessageBuilder: Default + Send + 'static {
    type Message;

    fn unknown_fields_mut(&mut self) -> &mut UnknownFieldStore;

    /// Consume the builder, producing the message.
    fn build(self) -> Self::Message;
}

impl<M: Message> TagBindingTable<M> {
    /// Size of `message` when encoded.
    pub fn encoded_len(&self, message: &M) -> usize {
        let known: usize = self
            .bindings()
            .iter()
            .map(|binding| binding.codec.encoded_len(binding.tag(), message))
            .sum();
        known + message.unknown_fields().encoded_len()
    }

    /// Writes every present field in field number order, then every unknown
    /// field in the order it was read.
    pub fn encode(&self, message: &M, buf: &mut dyn BufMut) {
        for binding in self.bindings() {
            binding.codec.encode(binding.tag(), message, buf);
        }
        message.unknown_fields().encode(buf);
    }

    /// Reads a message until `reader` is exhausted.
    pub fn decode(&self, reader: &mut ProtoReader) -> Result<M, DecodeError> {
        let mut builder = M::Builder::default();

        while reader.has_remaining() {
            let (wire_type, tag) = reader.read_key()?.into_parts();

            let Some(binding) = self.get(tag) else {
                trace!(message = M::NAME, tag, %wire_type, "unknown field");
                builder
                    .unknown_fields_mut()
                    .read(tag, wire_type, reader)?;
                continue;
            };

            if binding.codec.accepts(wire_type) {
                binding
                    .codec
                    .decode(tag, wire_type, reader, &mut builder)
                    .map_err(|err| err.in_field(tag))?;
                continue;
            }

            match reader.config().wire_type_mismatch {
                MismatchPolicy::PreserveUnknown => {
                    debug!(
                        message = M::NAME,
                        field = binding.name(),
                        tag,
                        expected = %binding.wire_type(),
                        actual = %wire_type,
                        "wire type mismatch, keeping occurrence as an unknown field",
                    );
                    builder
                        .unknown_fields_mut()
                        .read(tag, wire_type, reader)
                        .map_err(|err| err.in_field(tag))?;
                }
                MismatchPolicy::Reject => {
                    let err = DecodeError::WireTypeMismatch {
                        expected: binding.wire_type(),
                        actual: wire_type,
                    };
                    return Err(err.in_field(tag));
                }
            }
        }

        Ok(builder.build())
    }

    /// Copy of `message` with redacted fields replaced by their redacted
    /// form, nested messages redacted and unknown fields dropped.
    pub fn redact(&self, message: &M) -> M {
        let mut builder = M::Builder::default();
        for binding in self.bindings() {
            binding
                .codec
                .copy_redacted(binding.is_redacted(), message, &mut builder);
        }
        builder.build()
    }

    /// Renders `message` as `Name{field=value, ...}`.
    pub fn display(&self, message: &M) -> String {
        let mut out = String::from(M::NAME);
        out.push('{');
        let mut first = true;
        for binding in self.bindings() {
            let Some(text) = binding.codec.display(message) else {
                continue;
            };
            if !first {
                out.push_str(", ");
            }
            first = false;
            out.push_str(binding.name());
            out.push('=');
            if binding.is_redacted() {
                out.push_str("██");
            } else {
                out.push_str(&text);
            }
        }
        out.push('}');
        out
    }
}
