//! Message types shared by the integration tests.

#![allow(dead_code)]

use bytes::Bytes;
use protowire::adapter::{
    enumeration, message, Bool, Double, Fixed32, Fixed64, Float, Int32, Int64, ProtoBytes,
    ProtoString, Sfixed32, Sfixed64, Sint32, Sint64, Uint32, Uint64,
};
use protowire::{Message, MessageBuilder, ProtoEnum, TableBuilder, UnknownFieldStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneType {
    Mobile,
    Home,
    Work,
}

impl ProtoEnum for PhoneType {
    const VALUES: &'static [Self] = &[PhoneType::Mobile, PhoneType::Home, PhoneType::Work];

    fn value(self) -> i32 {
        match self {
            PhoneType::Mobile => 0,
            PhoneType::Home => 1,
            PhoneType::Work => 2,
        }
    }

    fn from_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(PhoneType::Mobile),
            1 => Some(PhoneType::Home),
            2 => Some(PhoneType::Work),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            PhoneType::Mobile => "MOBILE",
            PhoneType::Home => "HOME",
            PhoneType::Work => "WORK",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhoneNumber {
    pub number: Option<String>,
    pub kind: Option<PhoneType>,
    pub unknown: UnknownFieldStore,
}

impl Message for PhoneNumber {
    type Builder = PhoneNumber;
    const NAME: &'static str = "PhoneNumber";

    fn describe(table: TableBuilder<Self>) -> TableBuilder<Self> {
        table
            .optional(1, "number", ProtoString, |m| &m.number, |b| &mut b.number)
            .optional(2, "kind", enumeration::<PhoneType>(), |m| &m.kind, |b| &mut b.kind)
    }

    fn unknown_fields(&self) -> &UnknownFieldStore {
        &self.unknown
    }
}

impl MessageBuilder for PhoneNumber {
    type Message = PhoneNumber;

    fn unknown_fields_mut(&mut self) -> &mut UnknownFieldStore {
        &mut self.unknown
    }

    fn build(self) -> PhoneNumber {
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    pub name: Option<String>,
    pub id: Option<i32>,
    pub email: Option<String>,
    pub phones: Vec<PhoneNumber>,
    pub unknown: UnknownFieldStore,
}

impl Message for Person {
    type Builder = Person;
    const NAME: &'static str = "Person";

    fn describe(table: TableBuilder<Self>) -> TableBuilder<Self> {
        table
            .required(1, "name", ProtoString, |m| &m.name, |b| &mut b.name)
            .required(2, "id", Int32, |m| &m.id, |b| &mut b.id)
            .optional(3, "email", ProtoString, |m| &m.email, |b| &mut b.email)
            .redacted()
            .repeated(4, "phones", message::<PhoneNumber>(), |m| &m.phones, |b| &mut b.phones)
    }

    fn unknown_fields(&self) -> &UnknownFieldStore {
        &self.unknown
    }
}

impl MessageBuilder for Person {
    type Message = Person;

    fn unknown_fields_mut(&mut self) -> &mut UnknownFieldStore {
        &mut self.unknown
    }

    fn build(self) -> Person {
        self
    }
}

pub fn alice() -> Person {
    Person {
        name: Some("Alice".to_string()),
        id: Some(42),
        email: Some("alice@example.com".to_string()),
        phones: vec![
            PhoneNumber {
                number: Some("555-0100".to_string()),
                kind: Some(PhoneType::Home),
                ..Default::default()
            },
            PhoneNumber {
                number: Some("555-0199".to_string()),
                kind: Some(PhoneType::Mobile),
                ..Default::default()
            },
        ],
        ..Default::default()
    }
}

/// One field of every datatype, plus packed and unpacked sequences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllTypes {
    pub opt_bool: Option<bool>,
    pub opt_int32: Option<i32>,
    pub opt_uint32: Option<u32>,
    pub opt_sint32: Option<i32>,
    pub opt_fixed32: Option<u32>,
    pub opt_sfixed32: Option<i32>,
    pub opt_int64: Option<i64>,
    pub opt_uint64: Option<u64>,
    pub opt_sint64: Option<i64>,
    pub opt_fixed64: Option<u64>,
    pub opt_sfixed64: Option<i64>,
    pub opt_float: Option<f32>,
    pub opt_double: Option<f64>,
    pub opt_string: Option<String>,
    pub opt_bytes: Option<Bytes>,
    pub opt_enum: Option<PhoneType>,
    pub opt_message: Option<PhoneNumber>,
    pub packed_int32: Vec<i32>,
    pub unpacked_int32: Vec<i32>,
    pub packed_double: Vec<f64>,
    pub packed_sint64: Vec<i64>,
    pub repeated_bytes: Vec<Bytes>,
    pub unknown: UnknownFieldStore,
}

impl Message for AllTypes {
    type Builder = AllTypes;
    const NAME: &'static str = "AllTypes";

    fn describe(table: TableBuilder<Self>) -> TableBuilder<Self> {
        table
            .optional(1, "opt_bool", Bool, |m| &m.opt_bool, |b| &mut b.opt_bool)
            .optional(2, "opt_int32", Int32, |m| &m.opt_int32, |b| &mut b.opt_int32)
            .optional(3, "opt_uint32", Uint32, |m| &m.opt_uint32, |b| &mut b.opt_uint32)
            .optional(4, "opt_sint32", Sint32, |m| &m.opt_sint32, |b| &mut b.opt_sint32)
            .optional(5, "opt_fixed32", Fixed32, |m| &m.opt_fixed32, |b| &mut b.opt_fixed32)
            .optional(6, "opt_sfixed32", Sfixed32, |m| &m.opt_sfixed32, |b| &mut b.opt_sfixed32)
            .optional(7, "opt_int64", Int64, |m| &m.opt_int64, |b| &mut b.opt_int64)
            .optional(8, "opt_uint64", Uint64, |m| &m.opt_uint64, |b| &mut b.opt_uint64)
            .optional(9, "opt_sint64", Sint64, |m| &m.opt_sint64, |b| &mut b.opt_sint64)
            .optional(10, "opt_fixed64", Fixed64, |m| &m.opt_fixed64, |b| &mut b.opt_fixed64)
            .optional(11, "opt_sfixed64", Sfixed64, |m| &m.opt_sfixed64, |b| &mut b.opt_sfixed64)
            .optional(12, "opt_float", Float, |m| &m.opt_float, |b| &mut b.opt_float)
            .optional(13, "opt_double", Double, |m| &m.opt_double, |b| &mut b.opt_double)
            .optional(14, "opt_string", ProtoString, |m| &m.opt_string, |b| &mut b.opt_string)
            .optional(15, "opt_bytes", ProtoBytes, |m| &m.opt_bytes, |b| &mut b.opt_bytes)
            .optional(16, "opt_enum", enumeration::<PhoneType>(), |m| &m.opt_enum, |b| &mut b.opt_enum)
            .optional(17, "opt_message", message::<PhoneNumber>(), |m| &m.opt_message, |b| &mut b.opt_message)
            .packed(20, "packed_int32", Int32, |m| &m.packed_int32, |b| &mut b.packed_int32)
            .repeated(21, "unpacked_int32", Int32, |m| &m.unpacked_int32, |b| &mut b.unpacked_int32)
            .packed(22, "packed_double", Double, |m| &m.packed_double, |b| &mut b.packed_double)
            .packed(23, "packed_sint64", Sint64, |m| &m.packed_sint64, |b| &mut b.packed_sint64)
            .repeated(24, "repeated_bytes", ProtoBytes, |m| &m.repeated_bytes, |b| &mut b.repeated_bytes)
    }

    fn unknown_fields(&self) -> &UnknownFieldStore {
        &self.unknown
    }
}

impl MessageBuilder for AllTypes {
    type Message = AllTypes;

    fn unknown_fields_mut(&mut self) -> &mut UnknownFieldStore {
        &mut self.unknown
    }

    fn build(self) -> AllTypes {
        self
    }
}

pub fn all_types() -> AllTypes {
    AllTypes {
        opt_bool: Some(true),
        opt_int32: Some(-7),
        opt_uint32: Some(u32::MAX),
        opt_sint32: Some(-300),
        opt_fixed32: Some(0xdead_beef),
        opt_sfixed32: Some(-1),
        opt_int64: Some(i64::MIN),
        opt_uint64: Some(u64::MAX),
        opt_sint64: Some(-1),
        opt_fixed64: Some(1 << 40),
        opt_sfixed64: Some(-42),
        opt_float: Some(1.5),
        opt_double: Some(-2.25),
        opt_string: Some("héllo".to_string()),
        opt_bytes: Some(Bytes::from_static(&[0, 1, 2, 0xff])),
        opt_enum: Some(PhoneType::Work),
        opt_message: Some(PhoneNumber {
            number: Some("1".to_string()),
            kind: None,
            ..Default::default()
        }),
        packed_int32: vec![1, -1, 300],
        unpacked_int32: vec![5, 6],
        packed_double: vec![0.5, -0.0],
        packed_sint64: vec![-2, 2],
        repeated_bytes: vec![Bytes::from_static(b"a"), Bytes::new()],
        ..Default::default()
    }
}
