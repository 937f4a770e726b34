//! A protocol buffer wire-format runtime.
//!
//! Message types describe their fields once, in [`Message::describe`], by
//! binding field numbers to [`adapter`]s. A [`Registry`] turns that
//! description into a [`TagBindingTable`] which drives the binary codec, the
//! JSON bridge, redaction and display. Fields a schema does not know about are
//! kept in an [`UnknownFieldStore`] and written back unchanged.

mod binding;
mod config;
mod error;
mod json;
mod message;
mod reader;
mod registry;
mod unknown;
mod util;

pub mod adapter;
// Publically export `leb128` because the functions are useful on their own.
pub mod leb128;
// Publically export `wire` for keys, zigzag and the other wire primitives.
pub mod wire;

#[cfg(test)]
mod testing;

pub use adapter::{Datatype, ProtoEnum, ValueAdapter};
pub use binding::{FieldLabel, TableBuilder, TagBinding, TagBindingTable};
pub use config::{Config, MismatchPolicy};
pub use error::{
    DecodeError, EncodeError, InvalidKeyReason, JsonError, SchemaError, TagOutOfRange,
};
pub use message::{Message, MessageBuilder};
pub use reader::ProtoReader;
pub use registry::Registry;
pub use unknown::{UnknownField, UnknownFieldStore, UnknownValue};
pub use wire::WireType;
