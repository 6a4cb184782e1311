//! Observed container nodes.
//!
//! A [`Node`] wraps one map or sequence and carries the subscription table
//! for every observer that currently reaches it. Cloning a `Node` clones the
//! handle, not the container: two handles are the same node only when
//! [`Node::ptr_eq`] holds.
//!
//! Reads live here; mutations are in `mutation`.

mod mutation;

use crate::config::TreeConfig;
use crate::factory::Factory;
use crate::subscriptions::SubscriptionTable;
use crate::types::{Key, NodeKind, Value};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Container storage, dispatched on the node kind.
pub(crate) enum Storage {
    Map(BTreeMap<String, Value>),
    Seq(Vec<Value>),
}

impl Storage {
    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            Storage::Map(_) => NodeKind::Map,
            Storage::Seq(_) => NodeKind::Seq,
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Storage::Map(map) => map.len(),
            Storage::Seq(seq) => seq.len(),
        }
    }

    pub(crate) fn get(&self, key: &Key) -> Option<&Value> {
        match (self, key) {
            (Storage::Map(map), Key::Name(name)) => map.get(name),
            (Storage::Seq(seq), Key::Index(index)) => seq.get(*index),
            _ => None,
        }
    }

    pub(crate) fn keys(&self) -> Vec<Key> {
        match self {
            Storage::Map(map) => map.keys().cloned().map(Key::Name).collect(),
            Storage::Seq(seq) => (0..seq.len()).map(Key::Index).collect(),
        }
    }

    pub(crate) fn values(&self) -> Vec<Value> {
        match self {
            Storage::Map(map) => map.values().cloned().collect(),
            Storage::Seq(seq) => seq.clone(),
        }
    }

    /// Children that are themselves nodes, with the key leading to each.
    pub(crate) fn child_nodes(&self) -> Vec<(Key, Node)> {
        match self {
            Storage::Map(map) => map
                .iter()
                .filter_map(|(k, v)| v.as_node().map(|n| (Key::Name(k.clone()), n.clone())))
                .collect(),
            Storage::Seq(seq) => seq
                .iter()
                .enumerate()
                .filter_map(|(i, v)| v.as_node().map(|n| (Key::Index(i), n.clone())))
                .collect(),
        }
    }
}

pub(crate) struct NodeInner {
    pub(crate) storage: Storage,
    pub(crate) table: SubscriptionTable,
    pub(crate) config: Rc<TreeConfig>,
}

/// Weak handle stored in subscription entries for the observer root.
pub(crate) type WeakNode = Weak<RefCell<NodeInner>>;

/// A wrapped container participating in an observed tree.
#[derive(Clone)]
pub struct Node {
    inner: Rc<RefCell<NodeInner>>,
}

impl Node {
    /// Create an empty node of the given kind with the default config.
    pub fn new(kind: NodeKind) -> Self {
        let factory = Factory::default();
        match kind {
            NodeKind::Map => factory.map(),
            NodeKind::Seq => factory.seq(),
        }
    }

    pub(crate) fn from_parts(storage: Storage, config: Rc<TreeConfig>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(NodeInner {
                storage,
                table: SubscriptionTable::new(),
                config,
            })),
        }
    }

    pub(crate) fn from_weak(weak: &WeakNode) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub(crate) fn downgrade(&self) -> WeakNode {
        Rc::downgrade(&self.inner)
    }

    pub(crate) fn is_weak(&self, weak: &WeakNode) -> bool {
        std::ptr::eq(Rc::as_ptr(&self.inner), weak.as_ptr())
    }

    /// Identity of this node, stable for its lifetime.
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }

    pub(crate) fn borrow(&self) -> Ref<'_, NodeInner> {
        self.inner.borrow()
    }

    pub(crate) fn borrow_mut(&self) -> RefMut<'_, NodeInner> {
        self.inner.borrow_mut()
    }

    /// True when both handles refer to the same node.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn kind(&self) -> NodeKind {
        self.borrow().storage.kind()
    }

    pub fn len(&self) -> usize {
        self.borrow().storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The value at `key`, if present.
    pub fn get(&self, key: impl Into<Key>) -> Option<Value> {
        self.borrow().storage.get(&key.into()).cloned()
    }

    pub fn contains_key(&self, key: impl Into<Key>) -> bool {
        self.borrow().storage.get(&key.into()).is_some()
    }

    /// Keys in iteration order (sorted names for maps, indices for sequences).
    pub fn keys(&self) -> Vec<Key> {
        self.borrow().storage.keys()
    }

    pub fn values(&self) -> Vec<Value> {
        self.borrow().storage.values()
    }

    /// Walk `path` from this node.
    ///
    /// Returns `None` as soon as a key is absent or a scalar is reached
    /// before the path ends. The empty path resolves to this node.
    pub fn resolve(&self, path: &[Key]) -> Option<Value> {
        let mut current = Value::Node(self.clone());
        for key in path {
            let next = match &current {
                Value::Node(node) => node.get(key)?,
                _ => return None,
            };
            current = next;
        }
        Some(current)
    }

    /// The config this node was built with.
    pub fn config(&self) -> TreeConfig {
        (*self.borrow().config).clone()
    }

    /// A factory producing nodes with this node's config.
    pub fn factory(&self) -> Factory {
        Factory::from_shared(self.borrow().config.clone())
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    // Shallow on purpose: nodes may contain themselves.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("Node")
                .field("addr", &format_args!("{:#x}", self.addr()))
                .field("kind", &inner.storage.kind())
                .field("len", &inner.storage.len())
                .field("subscriptions", &inner.table.len())
                .finish(),
            Err(_) => f
                .debug_struct("Node")
                .field("addr", &format_args!("{:#x}", self.addr()))
                .finish_non_exhaustive(),
        }
    }
}
