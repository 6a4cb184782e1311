//! Attach/detach walks that keep subscription tables in step with the tree.
//!
//! Both walks are iterative and carry a visited set keyed by node identity,
//! so a subtree that contains itself (directly or through a longer cycle) is
//! visited once per call. Each call is O(nodes reachable from the start).

use super::table::Entry;
use super::types::SubscriptionId;
use crate::node::{Node, WeakNode};
use crate::types::{format_path, Key};
use std::collections::HashSet;
use tracing::trace;

/// Which entries a detach walk removes.
#[derive(Clone, Copy, Debug)]
pub(crate) enum DetachScope<'a> {
    /// Every entry for the id (unsubscribe).
    All,
    /// Only entries established through `prefix` from `root` (displacement).
    /// The observer root is neither cleared nor walked through.
    Anchored {
        root: &'a WeakNode,
        prefix: &'a [Key],
    },
}

/// Install `entry` for `id` on `start` and everything reachable below it,
/// extending the path one key per level.
///
/// Overwrites any entry the id already had on a visited node, except when
/// that entry's path is a prefix of the new one: the new route then runs
/// through the node itself, so the node (and what hangs below it) is
/// already anchored and the walk stops there. The observer root, whose path
/// is empty, is the common case of this.
pub(crate) fn attach(start: &Node, id: SubscriptionId, entry: &Entry) -> usize {
    let mut visited = HashSet::new();
    let mut stack = vec![(start.clone(), entry.path.clone())];
    let mut attached = 0;

    while let Some((node, path)) = stack.pop() {
        if !visited.insert(node.addr()) {
            continue;
        }

        let children = {
            let mut inner = node.borrow_mut();
            let anchored_upstream = inner
                .table
                .get(id)
                .map_or(false, |e| e.root.ptr_eq(&entry.root) && path.starts_with(&e.path));
            if anchored_upstream {
                continue;
            }
            inner.table.insert(
                id,
                Entry {
                    root: entry.root.clone(),
                    path: path.clone(),
                    callback: entry.callback.clone(),
                },
            );
            inner.storage.child_nodes()
        };
        attached += 1;

        for (key, child) in children.into_iter().rev() {
            if visited.contains(&child.addr()) {
                continue;
            }
            let mut child_path = path.clone();
            child_path.push(key);
            stack.push((child, child_path));
        }
    }

    trace!(
        subscription = %id,
        path = %format_path(&entry.path),
        nodes = attached,
        "attached"
    );
    attached
}

/// Remove `id` from `start` and everything reachable below it, per `scope`.
pub(crate) fn detach(start: &Node, id: SubscriptionId, scope: DetachScope<'_>) -> usize {
    let mut visited = HashSet::new();
    let mut stack = vec![start.clone()];
    let mut removed = 0;

    while let Some(node) = stack.pop() {
        if !visited.insert(node.addr()) {
            continue;
        }

        let children = {
            let mut inner = node.borrow_mut();
            let owned = match scope {
                DetachScope::All => true,
                DetachScope::Anchored { root, prefix } => {
                    if node.is_weak(root) {
                        continue;
                    }
                    inner
                        .table
                        .get(id)
                        .map_or(false, |e| e.is_under(root, prefix))
                }
            };
            if owned && inner.table.remove(id).is_some() {
                removed += 1;
            }
            inner.storage.child_nodes()
        };

        stack.extend(
            children
                .into_iter()
                .map(|(_, child)| child)
                .filter(|child| !visited.contains(&child.addr())),
        );
    }

    trace!(subscription = %id, nodes = removed, "detached");
    removed
}

/// Anchor `child`, just stored under `key`, for every subscription in
/// `entries` (the parent's table).
pub(crate) fn anchor_child(entries: &[(SubscriptionId, Entry)], key: &Key, child: &Node) {
    for (id, entry) in entries {
        attach(child, *id, &entry.child(key.clone()));
    }
}

/// Sever `displaced`, which used to live under `key`, for each subscription
/// whose current anchor on it runs through that slot. Anchors the same id
/// has since established elsewhere are left alone.
///
/// Callers attach the replacement afterwards, which restores any anchor
/// through the slot that is still reachable.
pub(crate) fn release_child(entries: &[(SubscriptionId, Entry)], key: &Key, displaced: &Node) {
    for (id, entry) in entries {
        let mut anchor = entry.path.clone();
        anchor.push(key.clone());

        let matches = displaced
            .borrow()
            .table
            .get(*id)
            .map_or(false, |e| e.is_under(&entry.root, &anchor));
        if matches {
            detach(
                displaced,
                *id,
                DetachScope::Anchored {
                    root: &entry.root,
                    prefix: &anchor,
                },
            );
        }
    }
}
