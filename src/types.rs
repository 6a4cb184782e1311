//! Core types for observed trees.

use crate::node::Node;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of a path: a map key or a sequence index.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Name(String),
    Index(usize),
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => write!(f, "{:?}", name),
            Key::Index(index) => write!(f, "{}", index),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => write!(f, "{}", name),
            Key::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<&String> for Key {
    fn from(name: &String) -> Self {
        Key::Name(name.clone())
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

/// Keys leading from an observer root to a value.
pub type Path = Vec<Key>;

/// Render a path as `A.B.0`, or `<root>` when empty.
pub fn format_path(path: &[Key]) -> String {
    if path.is_empty() {
        return "<root>".to_string();
    }
    path.iter()
        .map(|key| key.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// What happened at the reported path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// A key was created or its value replaced.
    Set,
    /// A key was removed.
    Delete,
}

/// Container flavor of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Map,
    Seq,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Map => write!(f, "map"),
            NodeKind::Seq => write!(f, "seq"),
        }
    }
}

/// A committed value inside a tree.
///
/// Nodes compare by identity; scalars compare by value.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Node(Node),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::Node(node)
    }
}

impl From<&Node> for Value {
    fn from(node: &Node) -> Self {
        Value::Node(node.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// An input value before the factory has wrapped it.
///
/// `Json` and the native `Map`/`Seq` variants are raw containers; anything
/// already a [`Value`] (including existing nodes) is stored as-is.
#[derive(Clone, Debug)]
pub enum Raw {
    Value(Value),
    Json(serde_json::Value),
    Map(Vec<(String, Raw)>),
    Seq(Vec<Raw>),
}

impl Raw {
    /// Build a raw map from key/value pairs.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Raw>,
        I: IntoIterator<Item = (K, V)>,
    {
        Raw::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a raw sequence from items.
    pub fn seq<V, I>(items: I) -> Self
    where
        V: Into<Raw>,
        I: IntoIterator<Item = V>,
    {
        Raw::Seq(items.into_iter().map(Into::into).collect())
    }

    /// True when the factory would build a fresh node from this value.
    pub fn needs_wrapping(&self) -> bool {
        match self {
            Raw::Value(_) => false,
            Raw::Json(json) => json.is_object() || json.is_array(),
            Raw::Map(_) | Raw::Seq(_) => true,
        }
    }
}

impl From<Value> for Raw {
    fn from(v: Value) -> Self {
        Raw::Value(v)
    }
}

impl From<&Value> for Raw {
    fn from(v: &Value) -> Self {
        Raw::Value(v.clone())
    }
}

impl From<serde_json::Value> for Raw {
    fn from(json: serde_json::Value) -> Self {
        Raw::Json(json)
    }
}

impl From<Node> for Raw {
    fn from(node: Node) -> Self {
        Raw::Value(Value::Node(node))
    }
}

impl From<&Node> for Raw {
    fn from(node: &Node) -> Self {
        Raw::Value(Value::Node(node.clone()))
    }
}

impl From<bool> for Raw {
    fn from(b: bool) -> Self {
        Raw::Value(Value::Bool(b))
    }
}

impl From<i64> for Raw {
    fn from(v: i64) -> Self {
        Raw::Value(Value::Int(v))
    }
}

impl From<i32> for Raw {
    fn from(v: i32) -> Self {
        Raw::Value(Value::Int(v as i64))
    }
}

impl From<f64> for Raw {
    fn from(v: f64) -> Self {
        Raw::Value(Value::Float(v))
    }
}

impl From<&str> for Raw {
    fn from(s: &str) -> Self {
        Raw::Value(Value::Str(s.to_string()))
    }
}

impl From<String> for Raw {
    fn from(s: String) -> Self {
        Raw::Value(Value::Str(s))
    }
}

impl From<()> for Raw {
    fn from(_: ()) -> Self {
        Raw::Value(Value::Null)
    }
}
