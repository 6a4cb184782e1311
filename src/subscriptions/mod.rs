//! Subscriptions on nested trees.
//!
//! A subscription is attached to one node (its root) and reaches everything
//! below it. Each reached node stores, per subscription id, the single path
//! from the root that currently leads to it; a mutation on that node reports
//! `path + [key]`. When a value is reassigned or shared, the most recently
//! established path wins.
//!
//! Subscriptions are either callbacks or bounded channels:
//!
//! ```
//! use nestwatch::{wrap, Action, Key, SubscriptionConfig};
//! use serde_json::json;
//!
//! let tree = wrap(json!({"A": {"B": 1}})).unwrap();
//! let handle = tree.subscribe_channel(SubscriptionConfig::default());
//!
//! let a = tree.get("A").unwrap().as_node().unwrap().clone();
//! a.set("B", 10).unwrap();
//!
//! let event = handle.try_recv().unwrap();
//! assert_eq!(event.path, vec![Key::from("A"), Key::from("B")]);
//! assert_eq!(event.action, Action::Set);
//! ```

mod manager;
mod propagate;
mod table;
mod types;

pub(crate) use manager::{check_reentrancy, notify};
pub(crate) use propagate::{anchor_child, release_child};
pub(crate) use table::SubscriptionTable;
pub use types::{Callback, ChangeEvent, SubscriptionConfig, SubscriptionHandle, SubscriptionId};
