use crate::prelude::*;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

mod packet;

pub use packet::Packet;

/// Index of a connection in the world's connection slot map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub usize);

/// A logged-in player's outgoing side.
///
/// Packets queue up here from the tick thread; whatever owns the socket drains
/// them on its own schedule. Encoding happens after `drain`, not here.
pub struct Connection {
    id: ConnectionId,
    name: Name,
    queue: Mutex<VecDeque<Packet>>,
}
impl Connection {
    pub fn new(id: ConnectionId, name: Name) -> Self {
        Self {
            id,
            name,
            queue: Mutex::new(VecDeque::new()),
        }
    }
    pub fn id(&self) -> ConnectionId {
        self.id
    }
    pub fn name(&self) -> Name {
        self.name
    }
    pub fn send(&self, packet: Packet) {
        log::trace!("queueing {packet:?} for {}", self.name);
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(packet);
    }
    /// Takes everything queued so far, oldest first.
    pub fn drain(&self) -> Vec<Packet> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id.0)
            .field("name", &self.name)
            .field("pending", &self.pending())
            .finish()
    }
}
