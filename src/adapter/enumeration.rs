//! Adapter for protobuf `enum` fields.

use core::fmt;
use core::marker::PhantomData;

use bytes::BufMut;
use serde_json::Value;

use super::private::Sealed;
use super::{Datatype, ValueAdapter};
use crate::error::{DecodeError, JsonError};
use crate::json::bits32_from_json;
use crate::leb128::LebCodec;
use crate::reader::ProtoReader;
use crate::wire::int32_size;

/// A Rust enum mirroring a protobuf `enum` declaration.
///
/// # Example
/// ```
/// use protowire::ProtoEnum;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// enum PhoneType {
///     Mobile,
///     Home,
/// }
///
/// impl ProtoEnum for PhoneType {
///     const VALUES: &'static [Self] = &[PhoneType::Mobile, PhoneType::Home];
///
///     fn value(self) -> i32 {
///         match self {
///             PhoneType::Mobile => 0,
///             PhoneType::Home => 1,
///         }
///     }
///
///     fn name(self) -> &'static str {
///         match self {
///             PhoneType::Mobile => "MOBILE",
///             PhoneType::Home => "HOME",
///         }
///     }
/// }
///
/// assert_eq!(PhoneType::from_name("HOME"), Some(PhoneType::Home));
/// assert_eq!(PhoneType::from_value(1), Some(PhoneType::Home));
/// ```
pub trait ProtoEnum: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Every constant of the enum.
    const VALUES: &'static [Self];

    /// The number this constant is encoded as.
    fn value(self) -> i32;

    /// The constant's name as declared in the schema.
    fn name(self) -> &'static str;

    /// The constant for `value`, or `None` if this build does not know it.
    fn from_value(value: i32) -> Option<Self> {
        Self::VALUES
            .iter()
            .copied()
            .find(|constant| constant.value() == value)
    }

    /// The constant named `name`.
    fn from_name(name: &str) -> Option<Self> {
        Self::VALUES
            .iter()
            .copied()
            .find(|constant| constant.name() == name)
    }
}

/// `enum`, framed as an `int32` varint.
///
/// Numbers the enum does not know are reported as
/// [`DecodeError::UnknownEnumValue`] carrying the varint as read. The message
/// codec catches that error and keeps the varint in the unknown-field store
/// instead of failing.
pub struct EnumAdapter<E> {
    _enum: PhantomData<fn() -> E>,
}

impl<E: ProtoEnum> EnumAdapter<E> {
    pub const fn new() -> Self {
        EnumAdapter { _enum: PhantomData }
    }
}

impl<E: ProtoEnum> Default for EnumAdapter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for EnumAdapter<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for EnumAdapter<E> {}

impl<E> fmt::Debug for EnumAdapter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnumAdapter<{}>", core::any::type_name::<E>())
    }
}

impl<E> Sealed for EnumAdapter<E> {}

impl<E: ProtoEnum> ValueAdapter for EnumAdapter<E> {
    type Value = E;

    fn datatype(&self) -> Datatype {
        Datatype::Enum
    }

    #[inline]
    fn encoded_len(&self, value: &E) -> usize {
        int32_size(value.value())
    }

    #[inline]
    fn encode<B: BufMut + ?Sized>(&self, value: &E, buf: &mut B) {
        (i64::from(value.value()) as u64).encode_leb128(buf);
    }

    fn decode(&self, reader: &mut ProtoReader) -> Result<E, DecodeError> {
        let raw = reader.read_varint64()?;
        // Like any int32, the number is the low 32 bits of the varint.
        E::from_value(raw as u32 as i32).ok_or(DecodeError::UnknownEnumValue { value: raw })
    }

    fn display(&self, value: &E) -> String {
        value.name().to_string()
    }

    fn to_json(&self, value: &E) -> Value {
        Value::String(value.name().to_string())
    }

    fn from_json(&self, json: &Value) -> Result<E, JsonError> {
        let constant = match json {
            Value::String(name) => E::from_name(name),
            other => E::from_value(bits32_from_json(other)? as i32),
        };
        constant.ok_or_else(|| JsonError::invalid_value("a known enum constant name or number"))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::Color;

    #[test]
    fn test_encode_decode() {
        let adapter = EnumAdapter::<Color>::new();
        let mut buf = Vec::new();
        adapter.encode(&Color::Blue, &mut buf);
        assert_eq!(buf, [2]);
        assert_eq!(adapter.encoded_len(&Color::Blue), 1);
        assert_eq!(adapter.decode(&mut ProtoReader::new(buf)).unwrap(), Color::Blue);
    }

    #[test]
    fn test_unknown_value() {
        let adapter = EnumAdapter::<Color>::new();
        let mut reader = ProtoReader::new(vec![9]);
        assert!(matches!(
            adapter.decode(&mut reader),
            Err(DecodeError::UnknownEnumValue { value: 9 })
        ));
    }

    #[test]
    fn test_unknown_value_keeps_high_bits() {
        let adapter = EnumAdapter::<Color>::new();
        // 2^32 + 9
        let mut reader = ProtoReader::new(vec![0x89, 0x80, 0x80, 0x80, 0x10]);
        assert!(matches!(
            adapter.decode(&mut reader),
            Err(DecodeError::UnknownEnumValue { value }) if value == (1 << 32) + 9
        ));

        // -1, sign-extended.
        let mut reader = ProtoReader::new(vec![0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01]);
        assert!(matches!(
            adapter.decode(&mut reader),
            Err(DecodeError::UnknownEnumValue { value: u64::MAX })
        ));

        // 2^32 + 1 reads as 1 in its low 32 bits.
        let mut reader = ProtoReader::new(vec![0x81, 0x80, 0x80, 0x80, 0x10]);
        assert_eq!(adapter.decode(&mut reader).unwrap(), Color::Green);
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Level {
        Low,
        High,
        Negative,
    }

    impl ProtoEnum for Level {
        const VALUES: &'static [Self] = &[Level::Low, Level::High, Level::Negative];

        fn value(self) -> i32 {
            match self {
                Level::Low => 1,
                Level::High => 5000,
                Level::Negative => -70000,
            }
        }

        fn name(self) -> &'static str {
            match self {
                Level::Low => "LOW",
                Level::High => "HIGH",
                Level::Negative => "NEGATIVE",
            }
        }
    }

    #[test]
    fn test_sparse_values_json() {
        let adapter = EnumAdapter::<Level>::new();
        for level in Level::VALUES.iter().copied() {
            let json = adapter.to_json(&level);
            assert_eq!(adapter.from_json(&json).unwrap(), level);
            assert_eq!(adapter.from_json(&json!(level.value())).unwrap(), level);

            let mut buf = Vec::new();
            adapter.encode(&level, &mut buf);
            assert_eq!(adapter.decode(&mut ProtoReader::new(buf)).unwrap(), level);
        }
        assert_eq!(adapter.to_json(&Level::High), json!("HIGH"));
        assert_eq!(Level::from_value(0), None);
    }

    #[test]
    fn test_json() {
        let adapter = EnumAdapter::<Color>::new();
        assert_eq!(adapter.to_json(&Color::Green), json!("GREEN"));
        assert_eq!(adapter.from_json(&json!("RED")).unwrap(), Color::Red);
        assert_eq!(adapter.from_json(&json!(2)).unwrap(), Color::Blue);
        assert!(adapter.from_json(&json!("PURPLE")).is_err());
        assert!(adapter.from_json(&json!(77)).is_err());
        assert_eq!(adapter.display(&Color::Red), "RED");
    }
}
