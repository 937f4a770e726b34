//! Type adapters: one per protobuf datatype.
//!
//! A [`ValueAdapter`] knows how to size, encode, decode, redact, display and
//! map to JSON a single value of its datatype. [`Packed`] and [`Repeated`]
//! wrap an element adapter to change how a sequence of values is framed on
//! the wire, they implement [`TaggedAdapter`] only.

mod composite;
mod delimited;
mod enumeration;
mod message;
mod scalar;

use core::fmt;
use core::marker::PhantomData;

use bytes::BufMut;

use crate::error::{DecodeError, JsonError, SchemaError};
use crate::leb128::LebCodec;
use crate::message::Message;
use crate::reader::ProtoReader;
use crate::registry::Resolver;
use crate::wire::{encode_key, encoded_key_len, WireType};

pub use composite::{Packed, Repeated, TaggedAdapter};
pub use delimited::{ProtoBytes, ProtoString};
pub use enumeration::{EnumAdapter, ProtoEnum};
pub use message::MessageAdapter;
pub(crate) use message::TableSlot;
pub use scalar::{
    Bool, Double, Fixed32, Fixed64, Float, Int32, Int64, Sfixed32, Sfixed64, Sint32, Sint64,
    Uint32, Uint64,
};

static_assertions::assert_impl_all!(Packed<Int32>: TaggedAdapter, Send, Sync);
static_assertions::assert_impl_all!(Repeated<ProtoString>: TaggedAdapter, Send, Sync);

/// The protobuf scalar, string, bytes, enum and message datatypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Datatype {
    Bool,
    Int32,
    Uint32,
    Sint32,
    Fixed32,
    Sfixed32,
    Int64,
    Uint64,
    Sint64,
    Fixed64,
    Sfixed64,
    Float,
    Double,
    String,
    Bytes,
    Enum,
    Message,
}

impl Datatype {
    /// The [`WireType`] a single value of this datatype is framed with.
    pub const fn wire_type(self) -> WireType {
        match self {
            Datatype::Bool
            | Datatype::Int32
            | Datatype::Uint32
            | Datatype::Sint32
            | Datatype::Int64
            | Datatype::Uint64
            | Datatype::Sint64
            | Datatype::Enum => WireType::Varint,
            Datatype::Fixed32 | Datatype::Sfixed32 | Datatype::Float => WireType::I32,
            Datatype::Fixed64 | Datatype::Sfixed64 | Datatype::Double => WireType::I64,
            Datatype::String | Datatype::Bytes | Datatype::Message => WireType::Len,
        }
    }

    /// Name of the datatype as written in a `.proto` file.
    pub const fn name(self) -> &'static str {
        match self {
            Datatype::Bool => "bool",
            Datatype::Int32 => "int32",
            Datatype::Uint32 => "uint32",
            Datatype::Sint32 => "sint32",
            Datatype::Fixed32 => "fixed32",
            Datatype::Sfixed32 => "sfixed32",
            Datatype::Int64 => "int64",
            Datatype::Uint64 => "uint64",
            Datatype::Sint64 => "sint64",
            Datatype::Fixed64 => "fixed64",
            Datatype::Sfixed64 => "sfixed64",
            Datatype::Float => "float",
            Datatype::Double => "double",
            Datatype::String => "string",
            Datatype::Bytes => "bytes",
            Datatype::Enum => "enum",
            Datatype::Message => "message",
        }
    }

    /// Whether repeated values of this datatype may use packed framing.
    pub const fn is_packable(self) -> bool {
        !matches!(self.wire_type(), WireType::Len)
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub(crate) mod private {
    /// Closes the set of adapters to the ones defined in this crate.
    pub trait Sealed {}
}

/// Encodes, decodes and describes single values of one protobuf datatype.
///
/// Implementations are stateless (message adapters hold a resolved, immutable
/// table) and can be shared freely between threads.
pub trait ValueAdapter: private::Sealed + Send + Sync + 'static {
    /// The in-memory representation of a value.
    type Value: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;

    /// The datatype this adapter handles.
    fn datatype(&self) -> Datatype;

    /// The [`WireType`] a single value is framed with.
    fn wire_type(&self) -> WireType {
        self.datatype().wire_type()
    }

    /// Size of `value`'s payload, excluding any length prefix.
    fn encoded_len(&self, value: &Self::Value) -> usize;

    /// Size of the key, the length prefix (for length-delimited types) and
    /// the payload of `value`.
    fn encoded_len_tagged(&self, tag: u32, value: &Self::Value) -> usize {
        let len = self.encoded_len(value);
        let prefix = match self.wire_type() {
            WireType::Len => (len as u64).encoded_leb128_len(),
            _ => 0,
        };
        encoded_key_len(tag) + prefix + len
    }

    /// Write the payload of `value`, without a key or length prefix.
    fn encode<B: BufMut + ?Sized>(&self, value: &Self::Value, buf: &mut B);

    /// Write the key, then the length prefix for length-delimited types,
    /// then the payload.
    fn encode_tagged<B: BufMut + ?Sized>(&self, tag: u32, value: &Self::Value, buf: &mut B) {
        let wire_type = self.wire_type();
        encode_key(wire_type, tag, buf);
        if wire_type == WireType::Len {
            (self.encoded_len(value) as u64).encode_leb128(buf);
        }
        self.encode(value, buf);
    }

    /// Read one value. Length-delimited types read their length prefix first.
    fn decode(&self, reader: &mut ProtoReader) -> Result<Self::Value, DecodeError>;

    /// The value a field marked as redacted takes. `None` leaves it absent.
    fn redact(&self, _value: &Self::Value) -> Option<Self::Value> {
        None
    }

    /// Copy of `value` with redaction applied to anything nested inside it.
    ///
    /// Only messages have nested fields, every other adapter returns a clone.
    fn redact_nested(&self, value: &Self::Value) -> Self::Value {
        value.clone()
    }

    /// Human readable rendering of `value`.
    fn display(&self, value: &Self::Value) -> String;

    /// JSON representation of `value`.
    fn to_json(&self, value: &Self::Value) -> serde_json::Value;

    /// Parse a value from its JSON representation.
    fn from_json(&self, json: &serde_json::Value) -> Result<Self::Value, JsonError>;

    /// Link any message tables this adapter depends on.
    #[doc(hidden)]
    fn resolve(&self, _resolver: &mut Resolver<'_>) -> Result<(), SchemaError> {
        Ok(())
    }

    /// Wrap this adapter for packed repeated framing.
    ///
    /// Fails for length-delimited datatypes, which cannot be packed.
    fn packed(self) -> Result<Packed<Self>, SchemaError>
    where
        Self: Sized,
    {
        Packed::new(self)
    }

    /// Wrap this adapter for unpacked repeated framing.
    fn repeated(self) -> Repeated<Self>
    where
        Self: Sized,
    {
        Repeated::new(self)
    }
}

/// Anything [`TableBuilder`](crate::TableBuilder) accepts as the adapter of a
/// field: every [`ValueAdapter`], and [`MessageField`] for embedded messages.
pub trait FieldAdapter: private::Sealed {
    /// The adapter the field is bound with.
    type Adapter: ValueAdapter;

    fn into_adapter(self) -> Self::Adapter;
}

impl<A: ValueAdapter> FieldAdapter for A {
    type Adapter = A;

    fn into_adapter(self) -> A {
        self
    }
}

/// An embedded message field of type `M`, returned by [`message`].
///
/// It only names the message type. The [`MessageAdapter`] it becomes is
/// linked to `M`'s table when a [`Registry`](crate::Registry) builds the
/// enclosing table, so there is no way to encode with an unlinked one.
///
/// ```compile_fail
/// use protowire::adapter::{message, ValueAdapter};
/// use protowire::Message;
///
/// fn size_of<M: Message>(value: &M) -> usize {
///     message::<M>().encoded_len(value)
/// }
/// ```
pub struct MessageField<M> {
    _message: PhantomData<fn() -> M>,
}

impl<M> fmt::Debug for MessageField<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageField<{}>", core::any::type_name::<M>())
    }
}

impl<M> private::Sealed for MessageField<M> {}

impl<M: Message> FieldAdapter for MessageField<M> {
    type Adapter = MessageAdapter<M>;

    fn into_adapter(self) -> MessageAdapter<M> {
        MessageAdapter::new()
    }
}

/// Embedded message `M`, for use in [`Message::describe`].
///
/// Outside of a table, get a linked adapter from
/// [`Registry::message_adapter`](crate::Registry::message_adapter).
pub const fn message<M: Message>() -> MessageField<M> {
    MessageField {
        _message: PhantomData,
    }
}

/// Adapter for the enum `E`.
pub const fn enumeration<E: ProtoEnum>() -> EnumAdapter<E> {
    EnumAdapter::new()
}
