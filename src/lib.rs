//! # nestwatch
//!
//! Observable nested maps and sequences. Every mutation, at any depth, is
//! reported to subscribers with the path from their attachment point to the
//! mutated key.
//!
//! ## Core Concepts
//!
//! - **Nodes**: wrapped containers (maps or sequences), compared by identity
//! - **Factory**: wraps raw containers (`serde_json::Value` or [`Raw`]) into nodes
//! - **Subscriptions**: callbacks or channels attached at any node
//! - **Propagation**: attach/detach walks that keep paths valid as
//!   substructures move, are shared, or contain themselves
//!
//! ## Example
//!
//! ```
//! use nestwatch::{wrap, Action, Key, Value};
//! use serde_json::json;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let x = wrap(json!({"A": {"B": 1}})).unwrap();
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = seen.clone();
//! let id = x.subscribe(move |_root, path, value, action| {
//!     sink.borrow_mut().push((path.to_vec(), value.clone(), action));
//!     Ok(())
//! });
//!
//! let a = x.get("A").unwrap().as_node().unwrap().clone();
//! a.set("B", 10).unwrap();
//!
//! assert_eq!(
//!     seen.borrow()[0],
//!     (vec![Key::from("A"), Key::from("B")], Value::Int(10), Action::Set)
//! );
//!
//! x.unsubscribe(id);
//! ```
//!
//! Trees are single-threaded (`Node` is `!Send`). A tree that contains
//! itself is a reference cycle and is never freed.

pub mod config;
pub mod error;
pub mod factory;
pub mod node;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use config::TreeConfig;
pub use error::{CallbackFault, Result, TreeError};
pub use factory::{wrap, Factory, Shape};
pub use node::Node;
pub use subscriptions::{
    Callback, ChangeEvent, SubscriptionConfig, SubscriptionHandle, SubscriptionId,
};
pub use types::{format_path, Action, Key, NodeKind, Path, Raw, Value};
