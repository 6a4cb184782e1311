//! Subscription types.

use crate::error::Result;
use crate::node::Node;
use crate::types::{Action, Key, Path, Value};
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

/// Unique identifier for a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Observer invoked as `(observer_root, path, value, action)`.
///
/// Returning an error aborts delivery for the current mutation and surfaces
/// the error to whoever performed it.
pub type Callback = Rc<dyn Fn(&Node, &[Key], &Value, Action) -> Result<()>>;

/// Configuration for a channel subscription.
#[derive(Clone, Debug, Deserialize)]
pub struct SubscriptionConfig {
    /// Max buffered events before the subscription drops itself.
    /// Default: 1000
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_buffer_size() -> usize {
    1000
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
        }
    }
}

/// A change delivered through a channel subscription.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeEvent {
    /// Path from the subscribed node to the mutated key.
    pub path: Path,
    /// Committed value, or `Null` for deletions.
    pub value: Value,
    pub action: Action,
}

/// Handle to a channel subscription.
///
/// Dropping the handle ends the subscription at the next change it would
/// have received.
pub struct SubscriptionHandle {
    pub id: SubscriptionId,
    /// Channel to receive events.
    pub receiver: Receiver<ChangeEvent>,
}

impl SubscriptionHandle {
    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> std::result::Result<ChangeEvent, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> std::result::Result<ChangeEvent, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Take every event buffered so far.
    pub fn drain(&self) -> Vec<ChangeEvent> {
        self.receiver.try_iter().collect()
    }
}
