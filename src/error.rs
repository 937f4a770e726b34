//! Error types for decoding, encoding, schema registration and the JSON bridge.

use core::fmt;

use thiserror::Error;

use crate::adapter::Datatype;
use crate::wire::WireType;

/// Malformed input encountered while decoding the binary wire format.
///
/// Decode errors are fatal for the call that produced them, no partially
/// decoded message is ever returned.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("invalid 'wire type' value: {value}")]
    InvalidWireType { value: u8 },
    #[error("invalid key: '{reason}'")]
    InvalidKey { reason: InvalidKeyReason },
    #[error("invalid leb128 varint")]
    InvalidVarint,
    #[error("unexpected end of buffer")]
    UnexpectedEndOfBuffer,
    #[error("invalid boolean value {value:#04x}")]
    InvalidBool { value: u64 },
    #[error("invalid UTF-8 in string field")]
    InvalidUtf8,
    #[error("length prefix {value} exceeds platform addressable memory")]
    LengthOverflow { value: u64 },
    #[error("invalid packed field length: {actual} is not a multiple of {expected_multiple}")]
    InvalidPackedLength { expected_multiple: u8, actual: usize },
    #[error("wire type mismatch: expected {expected}, found {actual}")]
    WireTypeMismatch {
        expected: WireType,
        actual: WireType,
    },
    /// The raw varint, so it can be kept unchanged as an unknown field.
    #[error("unknown enum value {value}")]
    UnknownEnumValue { value: u64 },
    #[error("nested messages exceed the depth limit of {limit}")]
    RecursionLimitExceeded { limit: u32 },
    #[error("field {tag}: {source}")]
    Field {
        tag: u32,
        #[source]
        source: Box<DecodeError>,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    #[cold]
    pub fn invalid_wire_type(value: u8) -> Self {
        DecodeError::InvalidWireType { value }
    }

    #[cold]
    pub fn invalid_key(reason: InvalidKeyReason) -> Self {
        DecodeError::InvalidKey { reason }
    }

    #[cold]
    pub fn invalid_varint() -> Self {
        DecodeError::InvalidVarint
    }

    #[cold]
    pub fn unexpected_end_of_buffer() -> Self {
        DecodeError::UnexpectedEndOfBuffer
    }

    #[cold]
    pub fn length_overflow(value: u64) -> Self {
        DecodeError::LengthOverflow { value }
    }

    /// Attributes this error to the field with number `tag`.
    #[cold]
    pub fn in_field(self, tag: u32) -> Self {
        DecodeError::Field {
            tag,
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, looking through any [`DecodeError::Field`] context.
    pub fn root_cause(&self) -> &DecodeError {
        let mut error = self;
        while let DecodeError::Field { source, .. } = error {
            error = source;
        }
        error
    }

    /// Returns the chain of field numbers leading to the failure, outermost first.
    pub fn field_path(&self) -> Vec<u32> {
        let mut path = Vec::new();
        let mut error = self;
        while let DecodeError::Field { tag, source } = error {
            path.push(*tag);
            error = source;
        }
        path
    }
}

/// Reason a field key failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidKeyReason {
    /// There were no bytes left to read a key from.
    EmptyBuffer,
    /// The field number was zero or larger than `2^29 - 1`.
    TagOutOfRange,
}

impl fmt::Display for InvalidKeyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidKeyReason::EmptyBuffer => write!(f, "empty buffer"),
            InvalidKeyReason::TagOutOfRange => write!(f, "tag out of range"),
        }
    }
}

/// A field number outside `1..=2^29 - 1` was given where a key will be
/// written for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("field number {tag} is outside 1..=536870911")]
pub struct TagOutOfRange {
    pub tag: u32,
}

/// A message type's field table could not be constructed.
///
/// These are programming errors in a schema description. They surface when a
/// message type is first registered, never while encoding or decoding data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SchemaError {
    #[error("unable to pack a length-delimited type ({datatype})")]
    PackedLengthDelimited { datatype: Datatype },
    #[error("{message}: field number {tag} is outside 1..=536870911")]
    TagOutOfRange { message: &'static str, tag: u32 },
    #[error("{message}: field number {tag} is in the reserved range 19000..=19999")]
    ReservedTag { message: &'static str, tag: u32 },
    #[error("{message}: field number {tag} is bound more than once")]
    DuplicateTag { message: &'static str, tag: u32 },
    #[error("{message}: field name '{name}' is bound more than once")]
    DuplicateName {
        message: &'static str,
        name: &'static str,
    },
}

/// Failure while encoding a message.
///
/// Encoding an in-memory value into memory cannot fail. Errors come from the
/// output sink or from registering the message type on first use.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EncodeError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while mapping a message to or from JSON.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum JsonError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("expected a JSON object for message '{message}'")]
    ExpectedObject { message: &'static str },
    #[error("expected {expected}")]
    InvalidValue { expected: &'static str },
    #[error("'{name}' is neither a known field name nor a valid field number")]
    InvalidFieldNumber { name: String },
    #[error("unknown field type '{name}'")]
    UnknownFieldType { name: String },
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("field '{field}': {source}")]
    Field {
        field: String,
        #[source]
        source: Box<JsonError>,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl JsonError {
    #[cold]
    pub(crate) fn invalid_value(expected: &'static str) -> Self {
        JsonError::InvalidValue { expected }
    }

    /// Attributes this error to the member named `field`.
    #[cold]
    pub fn in_field(self, field: impl Into<String>) -> Self {
        JsonError::Field {
            field: field.into(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, looking through any [`JsonError::Field`] context.
    pub fn root_cause(&self) -> &JsonError {
        let mut error = self;
        while let JsonError::Field { source, .. } = error {
            error = source;
        }
        error
    }
}
