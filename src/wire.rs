//! Protobuf wire primitives: field keys, length prefixes and zigzag.
//!
//! See <https://protobuf.dev/programming-guides/encoding> for the format.

use core::fmt;
use core::ops::RangeInclusive;

use bytes::{Buf, BufMut};

use crate::error::{DecodeError, InvalidKeyReason};
use crate::leb128::LebCodec;
use crate::util::{likely, unlikely};

/// Smallest valid field number.
pub const MINIMUM_TAG_VAL: u32 = 1;
/// Largest valid field number, 2^29 - 1.
pub const MAXIMUM_TAG_VAL: u32 = (1 << 29) - 1;
/// Field numbers schemas may not use.
pub const RESERVED_TAG_RANGE: RangeInclusive<u32> = 19000..=19999;

/// Whether `tag` can be written in a key.
#[inline(always)]
pub const fn is_valid_tag(tag: u32) -> bool {
    tag >= MINIMUM_TAG_VAL && tag <= MAXIMUM_TAG_VAL
}

/// Field key read off the wire: `(tag << 3) | wire type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProtoKey {
    wire_type: WireType,
    tag: u32,
}

impl ProtoKey {
    #[inline(always)]
    fn try_from_raw(raw: u64) -> Result<Self, DecodeError> {
        #[allow(clippy::as_conversions)]
        let wire_type = WireType::try_from_val((raw & 0b111) as u8)?;

        let tag = u32::try_from(raw >> 3)
            .ok()
            .filter(|tag| likely(is_valid_tag(*tag)))
            .ok_or(DecodeError::invalid_key(InvalidKeyReason::TagOutOfRange))?;

        Ok(ProtoKey { wire_type, tag })
    }

    #[inline(always)]
    pub const fn wire_type(self) -> WireType {
        self.wire_type
    }

    /// The field number.
    #[inline(always)]
    pub const fn tag(self) -> u32 {
        self.tag
    }

    #[inline(always)]
    pub const fn into_parts(self) -> (WireType, u32) {
        (self.wire_type, self.tag)
    }
}

/// Writes the key for field `tag` framed as `wire_type`.
///
/// `tag` must satisfy [`is_valid_tag`]. Tables check this when they are built
/// and [`UnknownFieldStore`](crate::UnknownFieldStore) when a field is added.
#[inline(always)]
pub fn encode_key<B: BufMut + ?Sized>(wire_type: WireType, tag: u32, buf: &mut B) {
    ((tag << 3) | u32::from(wire_type.into_val())).encode_leb128(buf);
}

/// Bytes [`encode_key`] writes for `tag`, whatever the wire type.
#[inline(always)]
pub fn encoded_key_len(tag: u32) -> usize {
    (tag << 3).encoded_leb128_len()
}

/// Reads a field key.
///
/// The key is read as a 64-bit varint, so padded encodings of a valid key
/// are accepted.
#[inline]
pub fn decode_key<B: Buf + ?Sized>(buf: &mut B) -> Result<ProtoKey, DecodeError> {
    if unlikely(!buf.has_remaining()) {
        return Err(DecodeError::invalid_key(InvalidKeyReason::EmptyBuffer));
    }
    let (raw, _) = u64::decode_leb128_buf(buf)?;
    ProtoKey::try_from_raw(raw)
}

/// Reads the length prefix of a length-delimited value.
///
/// The caller checks that the payload is actually there.
#[inline(always)]
pub fn decode_len<B: Buf + ?Sized>(buf: &mut B) -> Result<usize, DecodeError> {
    match buf.chunk().first() {
        Some(&byte) if likely(byte < 0x80) => {
            buf.advance(1);
            Ok(usize::from(byte))
        }
        _ => {
            let (len, _) = u64::decode_leb128_buf(buf)?;
            usize::try_from(len).map_err(|_| DecodeError::length_overflow(len))
        }
    }
}

/// Maps signed values onto unsigned ones so small magnitudes get short
/// varints: 0, -1, 1, -2 become 0, 1, 2, 3.
#[inline(always)]
pub const fn encode_zigzag32(n: i32) -> u32 {
    #[allow(clippy::as_conversions)]
    let zigzag = ((n << 1) ^ (n >> 31)) as u32;
    zigzag
}

#[inline(always)]
pub const fn decode_zigzag32(n: u32) -> i32 {
    #[allow(clippy::as_conversions)]
    let value = ((n >> 1) as i32) ^ -((n & 1) as i32);
    value
}

/// 64-bit form of [`encode_zigzag32`].
#[inline(always)]
pub const fn encode_zigzag64(n: i64) -> u64 {
    #[allow(clippy::as_conversions)]
    let zigzag = ((n << 1) ^ (n >> 63)) as u64;
    zigzag
}

#[inline(always)]
pub const fn decode_zigzag64(n: u64) -> i64 {
    #[allow(clippy::as_conversions)]
    let value = ((n >> 1) as i64) ^ -((n & 1) as i64);
    value
}

/// Varint size of an `int32`. Negative values are sign-extended to 64 bits,
/// so they always take 10 bytes.
#[inline(always)]
pub fn int32_size(value: i32) -> usize {
    match u32::try_from(value) {
        Ok(value) => value.encoded_leb128_len(),
        Err(_) => 10,
    }
}

/// Encoded size of a string payload.
#[inline(always)]
pub fn utf8_len(s: &str) -> usize {
    s.len()
}

/// How the payload after a key is framed.
///
/// The group codes 3 and 4 are not supported and are rejected along with the
/// unassigned codes 6 and 7.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum WireType {
    /// LEB128 varint: integer types, `bool` and `enum`.
    Varint = 0,
    /// Eight little-endian bytes: `fixed64`, `sfixed64` and `double`.
    I64 = 1,
    /// Varint length then payload: `string`, `bytes`, messages and packed
    /// sequences.
    Len = 2,
    /// Four little-endian bytes: `fixed32`, `sfixed32` and `float`.
    I32 = 5,
}

// Keeps `Option<WireType>` a single byte.
static_assertions::assert_eq_size!(WireType, Option<WireType>);

impl WireType {
    #[inline(always)]
    pub fn try_from_val(value: u8) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::I64),
            2 => Ok(WireType::Len),
            5 => Ok(WireType::I32),
            _ => Err(DecodeError::invalid_wire_type(value)),
        }
    }

    /// The 3-bit code written in keys.
    #[inline(always)]
    pub const fn into_val(self) -> u8 {
        #[allow(clippy::as_conversions)]
        let code = self as u8;
        code
    }

    /// Name used for this wire type in the JSON form of unknown fields.
    pub const fn name(self) -> &'static str {
        match self {
            WireType::Varint => "varint",
            WireType::I32 => "fixed32",
            WireType::I64 => "fixed64",
            WireType::Len => "length-delimited",
        }
    }

    /// Inverse of [`WireType::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "varint" => Some(WireType::Varint),
            "fixed32" => Some(WireType::I32),
            "fixed64" => Some(WireType::I64),
            "length-delimited" => Some(WireType::Len),
            _ => None,
        }
    }

    /// Payload width of the fixed-size wire types.
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            WireType::I32 => Some(4),
            WireType::I64 => Some(8),
            WireType::Varint | WireType::Len => None,
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for WireType {
    type Error = DecodeError;

    #[inline(always)]
    fn try_from(value: u8) -> Result<Self, DecodeError> {
        WireType::try_from_val(value)
    }
}
