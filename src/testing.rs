//! Message and enum types shared by the unit tests.

use crate::adapter::{message, EnumAdapter, Int32, ProtoEnum, ProtoString};
use crate::binding::{TableBuilder, TagBindingTable};
use crate::message::{Message, MessageBuilder};
use crate::unknown::UnknownFieldStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Color {
    Red,
    Green,
    Blue,
}

impl ProtoEnum for Color {
    const VALUES: &'static [Self] = &[Color::Red, Color::Green, Color::Blue];

    fn value(self) -> i32 {
        match self {
            Color::Red => 0,
            Color::Green => 1,
            Color::Blue => 2,
        }
    }

    fn from_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(Color::Red),
            1 => Some(Color::Green),
            2 => Some(Color::Blue),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Color::Red => "RED",
            Color::Green => "GREEN",
            Color::Blue => "BLUE",
        }
    }
}

/// `x = 1`, `y = 2`, `labels = 3` (repeated), `color = 4`, `label = 5`
/// (redacted).
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Point {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub labels: Vec<String>,
    pub color: Option<Color>,
    pub label: Option<String>,
    pub unknown: UnknownFieldStore,
}

impl Message for Point {
    type Builder = Point;
    const NAME: &'static str = "Point";

    fn describe(table: TableBuilder<Self>) -> TableBuilder<Self> {
        table
            .optional(1, "x", Int32, |p| &p.x, |p| &mut p.x)
            .optional(2, "y", Int32, |p| &p.y, |p| &mut p.y)
            .repeated(3, "labels", ProtoString, |p| &p.labels, |p| &mut p.labels)
            .optional(4, "color", EnumAdapter::<Color>::new(), |p| &p.color, |p| &mut p.color)
            .optional(5, "label", ProtoString, |p| &p.label, |p| &mut p.label)
            .redacted()
    }

    fn unknown_fields(&self) -> &UnknownFieldStore {
        &self.unknown
    }
}

impl MessageBuilder for Point {
    type Message = Point;

    fn unknown_fields_mut(&mut self) -> &mut UnknownFieldStore {
        &mut self.unknown
    }

    fn build(self) -> Point {
        self
    }
}

/// A message holding itself: `value = 1`, `child = 2`.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Node {
    pub value: Option<i32>,
    pub child: Option<Box<Node>>,
    pub unknown: UnknownFieldStore,
}

impl Message for Node {
    type Builder = Node;
    const NAME: &'static str = "Node";

    fn describe(table: TableBuilder<Self>) -> TableBuilder<Self> {
        table
            .optional(1, "value", Int32, |n| &n.value, |n| &mut n.value)
            .optional_boxed(2, "child", message::<Node>(), |n| &n.child, |n| &mut n.child)
    }

    fn unknown_fields(&self) -> &UnknownFieldStore {
        &self.unknown
    }
}

impl MessageBuilder for Node {
    type Message = Node;

    fn unknown_fields_mut(&mut self) -> &mut UnknownFieldStore {
        &mut self.unknown
    }

    fn build(self) -> Node {
        self
    }
}

static_assertions::assert_impl_all!(TagBindingTable<Point>: Send, Sync);
static_assertions::assert_impl_all!(TagBindingTable<Node>: Send, Sync);
