//! Adapter for embedded messages.

use core::fmt;
use std::sync::{Arc, OnceLock};

use bytes::BufMut;
use serde_json::Value;

use super::private::Sealed;
use super::{Datatype, ValueAdapter};
use crate::binding::TagBindingTable;
use crate::error::{DecodeError, JsonError, SchemaError};
use crate::message::Message;
use crate::reader::ProtoReader;
use crate::registry::Resolver;

/// Shared cell a message type's table is published through.
///
/// Handed out before the table is built so that recursive message types can
/// link to themselves.
pub(crate) type TableSlot<M> = Arc<OnceLock<Arc<TagBindingTable<M>>>>;

/// Embedded message `M`, framed as a length-delimited payload.
///
/// Tables get one from [`message`](crate::adapter::message) and link it when
/// a [`Registry`](crate::Registry) builds them. Outside of a table,
/// [`Registry::message_adapter`](crate::Registry::message_adapter) returns a
/// linked adapter.
pub struct MessageAdapter<M: Message> {
    slot: OnceLock<TableSlot<M>>,
}

impl<M: Message> MessageAdapter<M> {
    pub(crate) const fn new() -> Self {
        MessageAdapter {
            slot: OnceLock::new(),
        }
    }

    pub(crate) fn linked(slot: TableSlot<M>) -> Self {
        let adapter = Self::new();
        let _ = adapter.slot.set(slot);
        adapter
    }

    /// The table of `M`.
    pub fn table(&self) -> &TagBindingTable<M> {
        // Adapters are linked before any table holding them is published.
        match self.slot.get().and_then(|slot| slot.get()) {
            Some(table) => table,
            None => unreachable!("MessageAdapter<{}> was not linked to its table", M::NAME),
        }
    }
}

impl<M: Message> Clone for MessageAdapter<M> {
    fn clone(&self) -> Self {
        MessageAdapter {
            slot: self.slot.clone(),
        }
    }
}

impl<M: Message> fmt::Debug for MessageAdapter<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageAdapter")
            .field("message", &M::NAME)
            .field("linked", &self.slot.get().is_some())
            .finish()
    }
}

impl<M: Message> Sealed for MessageAdapter<M> {}

impl<M: Message> ValueAdapter for MessageAdapter<M> {
    type Value = M;

    fn datatype(&self) -> Datatype {
        Datatype::Message
    }

    fn encoded_len(&self, value: &M) -> usize {
        self.table().encoded_len(value)
    }

    fn encode<B: BufMut + ?Sized>(&self, value: &M, buf: &mut B) {
        // `&mut B` is sized even when `B` is not, which lets it become a `dyn BufMut`.
        let mut buf = buf;
        self.table().encode(value, &mut buf);
    }

    fn decode(&self, reader: &mut ProtoReader) -> Result<M, DecodeError> {
        let body = reader.read_length_delimited()?;
        let mut nested = reader.nested(body)?;
        self.table().decode(&mut nested)
    }

    fn redact_nested(&self, value: &M) -> M {
        self.table().redact(value)
    }

    fn display(&self, value: &M) -> String {
        self.table().display(value)
    }

    fn to_json(&self, value: &M) -> Value {
        self.table().to_json(value)
    }

    fn from_json(&self, json: &Value) -> Result<M, JsonError> {
        self.table().from_json(json)
    }

    fn resolve(&self, resolver: &mut Resolver<'_>) -> Result<(), SchemaError> {
        let slot = resolver.resolve::<M>()?;
        let _ = self.slot.set(slot);
        Ok(())
    }
}
