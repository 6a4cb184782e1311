//! Mutating operations on nodes.
//!
//! Every mutation commits first, then brings subscription tables up to date
//! (detach whatever was displaced, attach whatever was stored), and only
//! then notifies. Callbacks therefore always observe a tree whose tables
//! already match its shape, even when they mutate it again.

use super::{Node, Storage};
use crate::error::{Result, TreeError};
use crate::subscriptions::{anchor_child, check_reentrancy, notify, release_child};
use crate::types::{Action, Key, NodeKind, Raw, Value};
use tracing::trace;

impl Node {
    /// Store `value` under `key`.
    ///
    /// Raw containers are wrapped into fresh nodes; existing nodes are
    /// stored as-is. Writing a value identical to the current one (the same
    /// node, or an equal scalar) does nothing and notifies no one.
    ///
    /// On a sequence, `key` must be an index no greater than the length;
    /// the length itself appends.
    ///
    /// If a callback fails, its error is returned after the write and all
    /// table updates have been committed.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Raw>) -> Result<()> {
        let key = key.into();
        let raw = value.into();
        check_reentrancy(self)?;

        let fresh = raw.needs_wrapping();
        let value = self.factory().wrap(raw);
        if !fresh && self.borrow().storage.get(&key) == Some(&value) {
            trace!(key = %key, "identical write skipped");
            return Ok(());
        }

        let previous = self.commit(&key, value.clone())?;

        let entries = self.borrow().table.snapshot();
        if let Some(Value::Node(old)) = &previous {
            if value.as_node().map_or(true, |new| !new.ptr_eq(old)) {
                release_child(&entries, &key, old);
            }
        }
        if let Value::Node(new) = &value {
            anchor_child(&entries, &key, new);
        }

        notify(self, &key, &value, Action::Set)
    }

    /// Remove `key` and return its value.
    ///
    /// Fails with `MissingKey` if absent, without notifying. Removing from a
    /// sequence shifts later items down: each shifted index is reported as a
    /// `Set` of its new value, then the old last index as a `Delete`.
    pub fn delete(&self, key: impl Into<Key>) -> Result<Value> {
        let key = key.into();
        check_reentrancy(self)?;

        match (self.kind(), &key) {
            (NodeKind::Map, Key::Name(_)) => self.delete_entry(key),
            (NodeKind::Seq, Key::Index(index)) => self.remove_index(*index),
            (kind, _) => Err(TreeError::InvalidKey { key, kind }),
        }
    }

    /// Append to a sequence, as a `set` at the current length.
    pub fn append(&self, value: impl Into<Raw>) -> Result<()> {
        let index = self.len();
        self.set(index, value)
    }

    /// Append each item in turn; each one is its own `Set`.
    pub fn extend<I>(&self, items: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<Raw>,
    {
        for item in items {
            self.append(item)?;
        }
        Ok(())
    }

    /// Remove and return the last item of a sequence.
    pub fn pop(&self) -> Result<Value> {
        let len = self.len();
        if self.kind() == NodeKind::Seq && len == 0 {
            return Err(TreeError::IndexOutOfRange { index: 0, len: 0 });
        }
        self.delete(len.saturating_sub(1))
    }

    /// Write `value` into storage, returning what it replaced.
    fn commit(&self, key: &Key, value: Value) -> Result<Option<Value>> {
        let mut inner = self.borrow_mut();
        let kind = inner.storage.kind();
        match (&mut inner.storage, key) {
            (Storage::Map(map), Key::Name(name)) => Ok(map.insert(name.clone(), value)),
            (Storage::Seq(seq), Key::Index(index)) => {
                let len = seq.len();
                if *index < len {
                    Ok(Some(std::mem::replace(&mut seq[*index], value)))
                } else if *index == len {
                    seq.push(value);
                    Ok(None)
                } else {
                    Err(TreeError::IndexOutOfRange { index: *index, len })
                }
            }
            _ => Err(TreeError::InvalidKey {
                key: key.clone(),
                kind,
            }),
        }
    }

    fn delete_entry(&self, key: Key) -> Result<Value> {
        let removed = {
            let mut inner = self.borrow_mut();
            match (&mut inner.storage, &key) {
                (Storage::Map(map), Key::Name(name)) => map.remove(name),
                _ => None,
            }
        };
        let removed = removed.ok_or_else(|| TreeError::MissingKey(key.clone()))?;

        if let Value::Node(old) = &removed {
            let entries = self.borrow().table.snapshot();
            release_child(&entries, &key, old);
        }

        notify(self, &key, &Value::Null, Action::Delete)?;
        Ok(removed)
    }

    fn remove_index(&self, index: usize) -> Result<Value> {
        let (removed, shifted) = {
            let mut inner = self.borrow_mut();
            let Storage::Seq(seq) = &mut inner.storage else {
                return Err(TreeError::InvalidKey {
                    key: Key::Index(index),
                    kind: NodeKind::Map,
                });
            };
            if index >= seq.len() {
                return Err(TreeError::MissingKey(Key::Index(index)));
            }
            let removed = seq.remove(index);
            let shifted: Vec<(usize, Value)> = seq[index..]
                .iter()
                .cloned()
                .enumerate()
                .map(|(offset, v)| (index + offset, v))
                .collect();
            (removed, shifted)
        };
        let vacated = index + shifted.len();

        let entries = self.borrow().table.snapshot();
        if let Value::Node(old) = &removed {
            release_child(&entries, &Key::Index(index), old);
        }
        for (i, value) in &shifted {
            if let Value::Node(child) = value {
                anchor_child(&entries, &Key::Index(*i), child);
            }
        }

        for (i, value) in &shifted {
            notify(self, &Key::Index(*i), value, Action::Set)?;
        }
        notify(self, &Key::Index(vacated), &Value::Null, Action::Delete)?;
        Ok(removed)
    }
}
