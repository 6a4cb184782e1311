//! Wrapping raw containers into node trees.
//!
//! Every container reachable from a tree is wrapped before it is stored, so
//! traversal never meets an unwrapped map or sequence.

use crate::config::TreeConfig;
use crate::error::{Result, TreeError};
use crate::node::{Node, Storage};
use crate::types::{Raw, Value};
use std::collections::BTreeMap;
use std::rc::Rc;

/// How the factory classifies a raw value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// Stored as-is (scalars and already-wrapped nodes).
    Scalar,
    /// Wrapped into a map node.
    Map,
    /// Wrapped into a sequence node.
    Seq,
}

/// Builds nodes sharing one [`TreeConfig`].
#[derive(Clone, Debug, Default)]
pub struct Factory {
    config: Rc<TreeConfig>,
}

impl Factory {
    /// Create a factory after validating the config.
    pub fn new(config: TreeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Rc::new(config),
        })
    }

    pub(crate) fn from_shared(config: Rc<TreeConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Classify a raw value without consuming it.
    pub fn classify(raw: &Raw) -> Shape {
        match raw {
            Raw::Value(_) => Shape::Scalar,
            Raw::Json(serde_json::Value::Object(_)) | Raw::Map(_) => Shape::Map,
            Raw::Json(serde_json::Value::Array(_)) | Raw::Seq(_) => Shape::Seq,
            Raw::Json(_) => Shape::Scalar,
        }
    }

    /// Convert a raw value into a committed value, recursively wrapping
    /// containers. Existing nodes are passed through untouched.
    pub fn wrap(&self, raw: impl Into<Raw>) -> Value {
        match raw.into() {
            Raw::Value(value) => value,
            Raw::Json(json) => self.wrap_json(json),
            Raw::Map(entries) => {
                let storage = entries
                    .into_iter()
                    .map(|(k, v)| (k, self.wrap(v)))
                    .collect::<BTreeMap<_, _>>();
                Value::Node(self.node(Storage::Map(storage)))
            }
            Raw::Seq(items) => {
                let storage = items.into_iter().map(|v| self.wrap(v)).collect();
                Value::Node(self.node(Storage::Seq(storage)))
            }
        }
    }

    /// Wrap a raw container, failing for scalars.
    pub fn wrap_node(&self, raw: impl Into<Raw>) -> Result<Node> {
        match self.wrap(raw) {
            Value::Node(node) => Ok(node),
            _ => Err(TreeError::NotContainer),
        }
    }

    /// An empty map node.
    pub fn map(&self) -> Node {
        self.node(Storage::Map(BTreeMap::new()))
    }

    /// An empty sequence node.
    pub fn seq(&self) -> Node {
        self.node(Storage::Seq(Vec::new()))
    }

    fn wrap_json(&self, json: serde_json::Value) -> Value {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::Str(s),
            Json::Array(items) => {
                let storage = items.into_iter().map(|v| self.wrap_json(v)).collect();
                Value::Node(self.node(Storage::Seq(storage)))
            }
            Json::Object(fields) => {
                let storage = fields
                    .into_iter()
                    .map(|(k, v)| (k, self.wrap_json(v)))
                    .collect::<BTreeMap<_, _>>();
                Value::Node(self.node(Storage::Map(storage)))
            }
        }
    }

    fn node(&self, storage: Storage) -> Node {
        Node::from_parts(storage, self.config.clone())
    }
}

/// Wrap a raw container with the default config.
pub fn wrap(raw: impl Into<Raw>) -> Result<Node> {
    Factory::default().wrap_node(raw)
}
