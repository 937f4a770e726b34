//! Scalar protobuf types and their encoding/decoding implementations.

use bytes::BufMut;
use serde_json::Value;

use super::private::Sealed;
use super::{Datatype, ValueAdapter};
use crate::error::{DecodeError, JsonError};
use crate::json::{
    bits32_from_json, bits64_from_json, double_from_json, double_to_json, non_finite_name,
};
use crate::leb128::LebCodec;
use crate::reader::ProtoReader;
use crate::wire::{
    decode_zigzag32, decode_zigzag64, encode_zigzag32, encode_zigzag64, int32_size,
};

/// Defines a unit-struct adapter for a fixed-size or varint scalar.
macro_rules! scalar_adapter {
    (
        $(#[$meta:meta])*
        $name:ident($value:ty) => $datatype:ident,
        len: |$lv:ident| $len:expr,
        encode: |$ev:ident, $buf:ident| $encode:expr,
        decode: |$reader:ident| $decode:expr,
        to_json: |$jv:ident| $to_json:expr,
        from_json: |$json:ident| $from_json:expr $(,)?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $name;

        impl Sealed for $name {}

        impl ValueAdapter for $name {
            type Value = $value;

            #[inline]
            fn datatype(&self) -> Datatype {
                Datatype::$datatype
            }

            #[inline]
            fn encoded_len(&self, $lv: &$value) -> usize {
                $len
            }

            #[inline]
            fn encode<B: BufMut + ?Sized>(&self, $ev: &$value, $buf: &mut B) {
                $encode
            }

            #[inline]
            fn decode(&self, $reader: &mut ProtoReader) -> Result<$value, DecodeError> {
                $decode
            }

            fn display(&self, value: &$value) -> String {
                value.display_scalar()
            }

            fn to_json(&self, $jv: &$value) -> Value {
                $to_json
            }

            fn from_json(&self, $json: &Value) -> Result<$value, JsonError> {
                $from_json
            }
        }
    };
}

scalar_adapter! {
    /// `bool`, a varint that must be `0` or `1`.
    Bool(bool) => Bool,
    len: |_v| 1,
    encode: |v, buf| buf.put_u8(u8::from(*v)),
    decode: |reader| match reader.read_varint64()? {
        0 => Ok(false),
        1 => Ok(true),
        value => Err(DecodeError::InvalidBool { value }),
    },
    to_json: |v| Value::Bool(*v),
    from_json: |json| json.as_bool().ok_or_else(|| JsonError::invalid_value("a boolean")),
}

scalar_adapter! {
    /// `int32`, negative values are sign-extended to a 10-byte varint.
    Int32(i32) => Int32,
    len: |v| int32_size(*v),
    encode: |v, buf| {
        (i64::from(*v) as u64).encode_leb128(buf);
    },
    decode: |reader| Ok(reader.read_varint32()? as i32),
    to_json: |v| Value::from(*v),
    from_json: |json| Ok(bits32_from_json(json)? as i32),
}

scalar_adapter! {
    /// `uint32`.
    Uint32(u32) => Uint32,
    len: |v| v.encoded_leb128_len(),
    encode: |v, buf| {
        v.encode_leb128(buf);
    },
    decode: |reader| reader.read_varint32(),
    to_json: |v| Value::from(*v),
    from_json: |json| bits32_from_json(json),
}

scalar_adapter! {
    /// `sint32`, zigzag encoded so small negative values stay small.
    Sint32(i32) => Sint32,
    len: |v| encode_zigzag32(*v).encoded_leb128_len(),
    encode: |v, buf| {
        encode_zigzag32(*v).encode_leb128(buf);
    },
    decode: |reader| Ok(decode_zigzag32(reader.read_varint32()?)),
    to_json: |v| Value::from(*v),
    from_json: |json| Ok(bits32_from_json(json)? as i32),
}

scalar_adapter! {
    /// `fixed32`, four bytes little endian.
    Fixed32(u32) => Fixed32,
    len: |_v| 4,
    encode: |v, buf| buf.put_u32_le(*v),
    decode: |reader| reader.read_fixed32(),
    to_json: |v| Value::from(*v),
    from_json: |json| bits32_from_json(json),
}

scalar_adapter! {
    /// `sfixed32`, the `fixed32` layout viewed as signed.
    Sfixed32(i32) => Sfixed32,
    len: |_v| 4,
    encode: |v, buf| buf.put_i32_le(*v),
    decode: |reader| Ok(reader.read_fixed32()? as i32),
    to_json: |v| Value::from(*v),
    from_json: |json| Ok(bits32_from_json(json)? as i32),
}

scalar_adapter! {
    /// `int64`.
    Int64(i64) => Int64,
    len: |v| (*v as u64).encoded_leb128_len(),
    encode: |v, buf| {
        (*v as u64).encode_leb128(buf);
    },
    decode: |reader| Ok(reader.read_varint64()? as i64),
    to_json: |v| Value::from(*v),
    from_json: |json| Ok(bits64_from_json(json)? as i64),
}

scalar_adapter! {
    /// `uint64`, written to JSON as its unsigned decimal value.
    Uint64(u64) => Uint64,
    len: |v| v.encoded_leb128_len(),
    encode: |v, buf| {
        v.encode_leb128(buf);
    },
    decode: |reader| reader.read_varint64(),
    to_json: |v| Value::from(*v),
    from_json: |json| bits64_from_json(json),
}

scalar_adapter! {
    /// `sint64`, zigzag encoded so small negative values stay small.
    Sint64(i64) => Sint64,
    len: |v| encode_zigzag64(*v).encoded_leb128_len(),
    encode: |v, buf| {
        encode_zigzag64(*v).encode_leb128(buf);
    },
    decode: |reader| Ok(decode_zigzag64(reader.read_varint64()?)),
    to_json: |v| Value::from(*v),
    from_json: |json| Ok(bits64_from_json(json)? as i64),
}

scalar_adapter! {
    /// `fixed64`, eight bytes little endian.
    Fixed64(u64) => Fixed64,
    len: |_v| 8,
    encode: |v, buf| buf.put_u64_le(*v),
    decode: |reader| reader.read_fixed64(),
    to_json: |v| Value::from(*v),
    from_json: |json| bits64_from_json(json),
}

scalar_adapter! {
    /// `sfixed64`, the `fixed64` layout viewed as signed.
    Sfixed64(i64) => Sfixed64,
    len: |_v| 8,
    encode: |v, buf| buf.put_i64_le(*v),
    decode: |reader| Ok(reader.read_fixed64()? as i64),
    to_json: |v| Value::from(*v),
    from_json: |json| Ok(bits64_from_json(json)? as i64),
}

scalar_adapter! {
    /// `float`, IEEE-754 single precision bits through `fixed32`.
    Float(f32) => Float,
    len: |_v| 4,
    encode: |v, buf| buf.put_u32_le(v.to_bits()),
    decode: |reader| Ok(f32::from_bits(reader.read_fixed32()?)),
    // Widen through the shortest decimal form so `1.1f32` writes as `1.1`.
    to_json: |v| double_to_json(v.to_string().parse::<f64>().unwrap_or(f64::from(*v))),
    from_json: |json| Ok(double_from_json(json)? as f32),
}

scalar_adapter! {
    /// `double`, IEEE-754 double precision bits through `fixed64`.
    Double(f64) => Double,
    len: |_v| 8,
    encode: |v, buf| buf.put_u64_le(v.to_bits()),
    decode: |reader| Ok(f64::from_bits(reader.read_fixed64()?)),
    to_json: |v| double_to_json(*v),
    from_json: |json| double_from_json(json),
}

/// Textual form of scalar values used by [`ValueAdapter::display`].
trait DisplayScalar {
    fn display_scalar(&self) -> String;
}

macro_rules! display_with_to_string {
    ($($ty:ty),*) => {
        $(
            impl DisplayScalar for $ty {
                fn display_scalar(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

display_with_to_string!(bool, i32, u32, i64, u64);

impl DisplayScalar for f32 {
    fn display_scalar(&self) -> String {
        non_finite_name(f64::from(*self)).map_or_else(|| self.to_string(), str::to_string)
    }
}

impl DisplayScalar for f64 {
    fn display_scalar(&self) -> String {
        non_finite_name(*self).map_or_else(|| self.to_string(), str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use proptest::property_test;
    use serde_json::json;

    use super::*;
    use crate::wire::WireType;

    #[track_caller]
    fn roundtrip<A: ValueAdapter>(adapter: A, value: A::Value) -> Vec<u8> {
        let mut buf = Vec::new();
        adapter.encode(&value, &mut buf);
        assert_eq!(buf.len(), adapter.encoded_len(&value));

        let mut reader = ProtoReader::new(buf.clone());
        let decoded = adapter.decode(&mut reader).unwrap();
        assert_eq!(decoded, value);
        assert!(!reader.has_remaining());
        buf
    }

    #[test]
    fn test_bool() {
        assert_eq!(roundtrip(Bool, true), [1]);
        assert_eq!(roundtrip(Bool, false), [0]);

        let mut reader = ProtoReader::new(vec![2]);
        assert!(matches!(
            Bool.decode(&mut reader),
            Err(DecodeError::InvalidBool { value: 2 })
        ));
    }

    #[test]
    fn test_int32_negative_is_ten_bytes() {
        let encoded = roundtrip(Int32, -1);
        assert_eq!(
            encoded,
            [0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01]
        );
        assert_eq!(roundtrip(Int32, i32::MIN).len(), 10);
        assert_eq!(roundtrip(Int32, 150), [0x96, 0x01]);
    }

    #[test]
    fn test_sint32_is_compact() {
        assert_eq!(roundtrip(Sint32, -1), [0x01]);
        assert_eq!(roundtrip(Sint32, 1), [0x02]);
        assert_eq!(roundtrip(Sint64, -2), [0x03]);
    }

    #[test]
    fn test_fixed_layout() {
        assert_eq!(roundtrip(Fixed32, 1), [1, 0, 0, 0]);
        assert_eq!(roundtrip(Sfixed32, -1), [0xff; 4]);
        assert_eq!(roundtrip(Fixed64, 1), [1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(roundtrip(Sfixed64, -1), [0xff; 8]);
        assert_eq!(roundtrip(Float, 1.0), 1.0f32.to_bits().to_le_bytes());
        assert_eq!(roundtrip(Double, -2.5), (-2.5f64).to_bits().to_le_bytes());
    }

    #[test]
    fn test_int64_and_uint64_share_wire_form() {
        let mut a = Vec::new();
        Int64.encode(&-1, &mut a);
        let mut b = Vec::new();
        Uint64.encode(&u64::MAX, &mut b);
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
    }

    #[test]
    fn test_wire_types() {
        assert_eq!(Bool.wire_type(), WireType::Varint);
        assert_eq!(Sint64.wire_type(), WireType::Varint);
        assert_eq!(Fixed32.wire_type(), WireType::I32);
        assert_eq!(Float.wire_type(), WireType::I32);
        assert_eq!(Sfixed64.wire_type(), WireType::I64);
        assert_eq!(Double.wire_type(), WireType::I64);
    }

    #[test]
    fn test_encode_tagged() {
        let mut buf = Vec::new();
        Int32.encode_tagged(1, &150, &mut buf);
        assert_eq!(buf, [0x08, 0x96, 0x01]);
        assert_eq!(Int32.encoded_len_tagged(1, &150), 3);
    }

    #[test]
    fn test_json_bit_patterns() {
        assert_eq!(Uint64.to_json(&u64::MAX), json!(18446744073709551615u64));
        assert_eq!(Uint64.from_json(&json!(-1)).unwrap(), u64::MAX);
        assert_eq!(
            Uint64.from_json(&json!(18446744073709551615u64)).unwrap(),
            u64::MAX
        );
        assert_eq!(Uint64.to_json(&0), json!(0));
        assert_eq!(Int64.from_json(&json!(18446744073709551615u64)).unwrap(), -1);
        assert_eq!(Int32.from_json(&json!(4294967295u64)).unwrap(), -1);
        assert_eq!(Uint32.from_json(&json!(-1)).unwrap(), u32::MAX);
        assert!(Int32.from_json(&json!(4294967296u64)).is_err());
        assert!(Bool.from_json(&json!(1)).is_err());
    }

    #[test]
    fn test_json_floats() {
        assert_eq!(Float.to_json(&1.1), json!(1.1));
        assert_eq!(Double.to_json(&f64::NAN), json!("NaN"));
        assert_eq!(Double.to_json(&f64::INFINITY), json!("Infinity"));
        assert_eq!(Float.to_json(&f32::NEG_INFINITY), json!("-Infinity"));
        assert!(Double.from_json(&json!("NaN")).unwrap().is_nan());
        assert_eq!(Float.from_json(&json!("-Infinity")).unwrap(), f32::NEG_INFINITY);
        assert_eq!(Float.from_json(&json!(1.1)).unwrap(), 1.1f32);
    }

    #[test]
    fn test_display() {
        assert_eq!(Int32.display(&-7), "-7");
        assert_eq!(Bool.display(&true), "true");
        assert_eq!(Double.display(&f64::INFINITY), "Infinity");
        assert_eq!(Float.display(&f32::NAN), "NaN");
        assert_eq!(Float.display(&0.5), "0.5");
    }

    #[test]
    fn test_redact_is_absent() {
        assert_eq!(Int32.redact(&5), None);
        assert_eq!(Double.redact(&1.0), None);
    }

    #[property_test]
    fn proptest_int32(value: i32) {
        roundtrip(Int32, value);
        prop_assert_eq!(Int32.from_json(&Int32.to_json(&value)).unwrap(), value);
    }

    #[property_test]
    fn proptest_uint32(value: u32) {
        roundtrip(Uint32, value);
    }

    #[property_test]
    fn proptest_sint32(value: i32) {
        roundtrip(Sint32, value);
    }

    #[property_test]
    fn proptest_fixed32(value: u32) {
        roundtrip(Fixed32, value);
        roundtrip(Sfixed32, value as i32);
    }

    #[property_test]
    fn proptest_int64(value: i64) {
        roundtrip(Int64, value);
        prop_assert_eq!(Int64.from_json(&Int64.to_json(&value)).unwrap(), value);
    }

    #[property_test]
    fn proptest_uint64(value: u64) {
        roundtrip(Uint64, value);
        prop_assert_eq!(Uint64.from_json(&Uint64.to_json(&value)).unwrap(), value);
    }

    #[property_test]
    fn proptest_sint64(value: i64) {
        roundtrip(Sint64, value);
    }

    #[property_test]
    fn proptest_fixed64(value: u64) {
        roundtrip(Fixed64, value);
        roundtrip(Sfixed64, value as i64);
    }

    #[property_test]
    fn proptest_float_bits(bits: u32) {
        let value = f32::from_bits(bits);
        let mut buf = Vec::new();
        Float.encode(&value, &mut buf);
        let decoded = Float.decode(&mut ProtoReader::new(buf)).unwrap();
        prop_assert_eq!(decoded.to_bits(), bits);
    }

    #[property_test]
    fn proptest_double_bits(bits: u64) {
        let value = f64::from_bits(bits);
        let mut buf = Vec::new();
        Double.encode(&value, &mut buf);
        let decoded = Double.decode(&mut ProtoReader::new(buf)).unwrap();
        prop_assert_eq!(decoded.to_bits(), bits);
    }
}
