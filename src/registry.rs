//! Lazily populated cache of tag binding tables.

use std::any::{Any, TypeId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use bytes::{Buf, BufMut};
use serde_json::Value;
use tracing::{debug, warn};

use crate::adapter::{MessageAdapter, TableSlot};
use crate::binding::{TableBuilder, TagBindingTable};
use crate::config::Config;
use crate::error::{DecodeError, EncodeError, JsonError, SchemaError};
use crate::message::Message;
use crate::reader::ProtoReader;

type Erased = Arc<dyn Any + Send + Sync>;

fn downcast_table<M: Message>(erased: Erased) -> Arc<TagBindingTable<M>> {
    match erased.downcast::<TagBindingTable<M>>() {
        Ok(table) => table,
        Err(_) => unreachable!("table cached under the TypeId of {}", M::NAME),
    }
}

fn downcast_slot<M: Message>(erased: Erased) -> TableSlot<M> {
    match erased.downcast::<OnceLock<Arc<TagBindingTable<M>>>>() {
        Ok(slot) => slot,
        Err(_) => unreachable!("slot pending under the TypeId of {}", M::NAME),
    }
}

struct Inner {
    config: Config,
    tables: RwLock<HashMap<TypeId, Erased>>,
}

/// Entry point for encoding, decoding and mapping messages.
///
/// Holds one [`TagBindingTable`] per message type, built from
/// [`Message::describe`] the first time the type is used and shared from then
/// on. A `Registry` is a cheap handle, clones share the same cache.
///
/// Most programs can use [`Registry::global`]. Construct one explicitly to
/// use a non-default [`Config`] or to keep caches apart.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

static_assertions::assert_impl_all!(Registry: Send, Sync, Clone);

impl Registry {
    /// The process wide registry, created with the default [`Config`].
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Registry {
            inner: Arc::new(Inner {
                config,
                tables: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Configuration every decode through this registry uses.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    fn cached<M: Message>(&self) -> Option<Arc<TagBindingTable<M>>> {
        let tables = self
            .inner
            .tables
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        tables.get(&TypeId::of::<M>()).cloned().map(downcast_table::<M>)
    }

    /// Whether the table for `M` has already been built.
    pub fn contains<M: Message>(&self) -> bool {
        self.cached::<M>().is_some()
    }

    /// The table for `M`, building it and every message type it reaches on
    /// first use.
    ///
    /// Tables are built without holding the cache lock. When two threads
    /// build the same table concurrently the first one to finish wins and
    /// both get its result. If any reachable type fails to build, nothing is
    /// cached.
    pub fn table<M: Message>(&self) -> Result<Arc<TagBindingTable<M>>, SchemaError> {
        if let Some(table) = self.cached::<M>() {
            return Ok(table);
        }

        let mut resolver = Resolver {
            registry: self,
            pending: HashMap::new(),
            built: Vec::new(),
        };
        resolver.resolve::<M>()?;

        let mut tables = self
            .inner
            .tables
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for (id, name, table) in resolver.built {
            match tables.entry(id) {
                Entry::Vacant(entry) => {
                    entry.insert(table);
                }
                Entry::Occupied(_) => {
                    warn!(message = name, "table was built concurrently, keeping the first");
                }
            }
        }

        match tables.get(&TypeId::of::<M>()) {
            Some(table) => Ok(downcast_table(Arc::clone(table))),
            None => unreachable!("{} was resolved but not cached", M::NAME),
        }
    }

    /// An adapter for `M` linked to this registry's table, for use outside of
    /// a [`Message::describe`] implementation.
    pub fn message_adapter<M: Message>(&self) -> Result<MessageAdapter<M>, SchemaError> {
        let table = self.table::<M>()?;
        Ok(MessageAdapter::linked(Arc::new(OnceLock::from(table))))
    }

    /// Size of `message` when encoded.
    pub fn encoded_len<M: Message>(&self, message: &M) -> Result<usize, SchemaError> {
        Ok(self.table::<M>()?.encoded_len(message))
    }

    /// Encodes `message` into a new buffer.
    pub fn encode<M: Message>(&self, message: &M) -> Result<Vec<u8>, EncodeError> {
        let table = self.table::<M>()?;
        let mut buf = Vec::with_capacity(table.encoded_len(message));
        table.encode(message, &mut buf);
        Ok(buf)
    }

    /// Appends the encoding of `message` to `buf`.
    pub fn encode_to_buf<M: Message, B: BufMut>(
        &self,
        message: &M,
        buf: &mut B,
    ) -> Result<(), EncodeError> {
        self.table::<M>()?.encode(message, buf);
        Ok(())
    }

    /// Writes the encoding of `message` to `writer`.
    pub fn encode_to_writer<M: Message, W: io::Write>(
        &self,
        message: &M,
        mut writer: W,
    ) -> Result<(), EncodeError> {
        let buf = self.encode(message)?;
        writer.write_all(&buf)?;
        Ok(())
    }

    /// Decodes an `M` from the whole of `buf`.
    pub fn decode<M: Message, B: Buf>(&self, mut buf: B) -> Result<M, DecodeError> {
        let table = self.table::<M>()?;
        let bytes = buf.copy_to_bytes(buf.remaining());
        let mut reader = ProtoReader::with_config(bytes, self.inner.config);
        table.decode(&mut reader)
    }

    /// Reads `reader` to the end and decodes an `M` from it.
    pub fn decode_from_reader<M: Message, R: io::Read>(
        &self,
        mut reader: R,
    ) -> Result<M, DecodeError> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        self.decode(&buf[..])
    }

    pub fn to_json_value<M: Message>(&self, message: &M) -> Result<Value, SchemaError> {
        Ok(self.table::<M>()?.to_json(message))
    }

    pub fn to_json<M: Message>(&self, message: &M) -> Result<String, JsonError> {
        let value = self.to_json_value(message)?;
        Ok(serde_json::to_string(&value)?)
    }

    pub fn to_json_pretty<M: Message>(&self, message: &M) -> Result<String, JsonError> {
        let value = self.to_json_value(message)?;
        Ok(serde_json::to_string_pretty(&value)?)
    }

    pub fn from_json_value<M: Message>(&self, json: &Value) -> Result<M, JsonError> {
        self.table::<M>()?.from_json(json)
    }

    pub fn from_json<M: Message>(&self, json: &str) -> Result<M, JsonError> {
        let value: Value = serde_json::from_str(json)?;
        self.from_json_value(&value)
    }

    /// Copy of `message` with fields marked redacted hidden, see
    /// [`TableBuilder::redacted`].
    pub fn redact<M: Message>(&self, message: &M) -> Result<M, SchemaError> {
        Ok(self.table::<M>()?.redact(message))
    }

    /// Renders `message` as `Name{field=value, ...}`.
    pub fn display<M: Message>(&self, message: &M) -> Result<String, SchemaError> {
        Ok(self.table::<M>()?.display(message))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables = self
            .inner
            .tables
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Registry")
            .field("config", &self.inner.config)
            .field("tables", &tables.len())
            .finish()
    }
}

/// Builds the tables reachable from one message type.
///
/// Each type gets a [`TableSlot`] before its table is built, so message
/// adapters referring back to a type that is still being built (directly or
/// through other types) link to the slot and see the table once it is set.
#[doc(hidden)]
pub struct Resolver<'a> {
    registry: &'a Registry,
    pending: HashMap<TypeId, Erased>,
    built: Vec<(TypeId, &'static str, Erased)>,
}

impl fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("pending", &self.pending.len())
            .field("built", &self.built.len())
            .finish()
    }
}

impl Resolver<'_> {
    pub(crate) fn resolve<M: Message>(&mut self) -> Result<TableSlot<M>, SchemaError> {
        if let Some(table) = self.registry.cached::<M>() {
            return Ok(Arc::new(OnceLock::from(table)));
        }

        let id = TypeId::of::<M>();
        if let Some(slot) = self.pending.get(&id) {
            return Ok(downcast_slot(Arc::clone(slot)));
        }

        let slot: TableSlot<M> = Arc::new(OnceLock::new());
        let erased: Erased = slot.clone();
        self.pending.insert(id, erased);

        let table = M::describe(TableBuilder::new()).build()?;
        for binding in table.bindings() {
            binding.codec.resolve(self)?;
        }
        debug!(message = M::NAME, fields = table.len(), "built tag binding table");

        let table = Arc::new(table);
        // Only this call sets the slot.
        let _ = slot.set(Arc::clone(&table));
        let erased: Erased = table;
        self.built.push((id, M::NAME, erased));
        Ok(slot)
    }
}
