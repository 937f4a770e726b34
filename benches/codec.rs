use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use protowire::adapter::{enumeration, message, Int32, ProtoString, Uint64};
use protowire::{Message, MessageBuilder, ProtoEnum, Registry, TableBuilder, UnknownFieldStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Small,
    Large,
}

impl ProtoEnum for Kind {
    const VALUES: &'static [Self] = &[Kind::Small, Kind::Large];

    fn value(self) -> i32 {
        match self {
            Kind::Small => 0,
            Kind::Large => 1,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Kind::Small => "SMALL",
            Kind::Large => "LARGE",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Item {
    id: Option<u64>,
    label: Option<String>,
    kind: Option<Kind>,
    unknown: UnknownFieldStore,
}

impl Message for Item {
    type Builder = Item;
    const NAME: &'static str = "Item";

    fn describe(table: TableBuilder<Self>) -> TableBuilder<Self> {
        table
            .optional(1, "id", Uint64, |m| &m.id, |b| &mut b.id)
            .optional(2, "label", ProtoString, |m| &m.label, |b| &mut b.label)
            .optional(3, "kind", enumeration::<Kind>(), |m| &m.kind, |b| &mut b.kind)
    }

    fn unknown_fields(&self) -> &UnknownFieldStore {
        &self.unknown
    }
}

impl MessageBuilder for Item {
    type Message = Item;

    fn unknown_fields_mut(&mut self) -> &mut UnknownFieldStore {
        &mut self.unknown
    }

    fn build(self) -> Item {
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Batch {
    items: Vec<Item>,
    counts: Vec<i32>,
    unknown: UnknownFieldStore,
}

impl Message for Batch {
    type Builder = Batch;
    const NAME: &'static str = "Batch";

    fn describe(table: TableBuilder<Self>) -> TableBuilder<Self> {
        table
            .repeated(1, "items", message::<Item>(), |m| &m.items, |b| &mut b.items)
            .packed(2, "counts", Int32, |m| &m.counts, |b| &mut b.counts)
    }

    fn unknown_fields(&self) -> &UnknownFieldStore {
        &self.unknown
    }
}

impl MessageBuilder for Batch {
    type Message = Batch;

    fn unknown_fields_mut(&mut self) -> &mut UnknownFieldStore {
        &mut self.unknown
    }

    fn build(self) -> Batch {
        self
    }
}

fn batch(len: usize) -> Batch {
    let items = (0..len)
        .map(|i| Item {
            id: Some(i as u64 * 7919),
            label: Some(format!("item-{i}")),
            kind: Some(if i % 2 == 0 { Kind::Small } else { Kind::Large }),
            ..Default::default()
        })
        .collect();
    let counts = (0..len).map(|i| i as i32 - 50).collect();
    Batch {
        items,
        counts,
        ..Default::default()
    }
}

fn codec(c: &mut Criterion) {
    let registry = Registry::new();

    let mut group = c.benchmark_group("batch");
    for len in [1, 16, 256] {
        let message = batch(len);
        let bytes = registry.encode(&message).unwrap();

        group.bench_with_input(BenchmarkId::new("encode", len), &message, |b, message| {
            b.iter(|| std::hint::black_box(registry.encode(message).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("decode", len), &bytes, |b, bytes| {
            b.iter(|| std::hint::black_box(registry.decode::<Batch, _>(&bytes[..]).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("to_json", len), &message, |b, message| {
            b.iter(|| std::hint::black_box(registry.to_json_value(message).unwrap()))
        });
    }
}

criterion_group!(benches, codec);

criterion_main!(benches);
