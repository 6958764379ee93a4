//! Who gets told about an entity.
//!
//! Membership changes come from whatever tracks connection visibility, which
//! need not be the thread running the tick. Broadcasts always iterate a copy
//! of the membership taken under the read lock, so a viewer joining mid-send
//! may miss that packet but never corrupts the iteration.

use crate::prelude::*;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
pub struct Viewers {
    set: RwLock<HashMap<ConnectionId, Arc<Connection>>>,
}

/// Whether an entity can be sent its own packets. Decided when the entity is
/// built; only players carry a connection.
#[derive(Debug, Clone)]
pub enum SelfAddress {
    Connection(Arc<Connection>),
    Unaddressable,
}

impl Viewers {
    pub fn new() -> Self {
        Self::default()
    }
    fn read(&self) -> RwLockReadGuard<'_, HashMap<ConnectionId, Arc<Connection>>> {
        self.set.read().unwrap_or_else(|poisoned| {
            log::warn!("viewer set poisoned, reading anyway");
            poisoned.into_inner()
        })
    }
    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ConnectionId, Arc<Connection>>> {
        self.set.write().unwrap_or_else(|poisoned| {
            log::warn!("viewer set poisoned, writing anyway");
            poisoned.into_inner()
        })
    }

    /// `false` if `viewer` was already present; nothing changes in that case.
    pub fn add(&self, viewer: &Arc<Connection>) -> bool {
        use std::collections::hash_map::Entry;
        match self.write().entry(viewer.id()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(viewer));
                true
            }
        }
    }
    pub fn remove(&self, viewer: ConnectionId) -> bool {
        self.write().remove(&viewer).is_some()
    }
    pub fn contains(&self, viewer: ConnectionId) -> bool {
        self.read().contains_key(&viewer)
    }
    pub fn len(&self) -> usize {
        self.read().len()
    }
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
    /// A copy of the current membership. It goes stale as soon as the lock is released.
    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.read().values().cloned().collect()
    }

    pub fn broadcast(&self, packet: &Packet) {
        deliver(&self.snapshot(), packet);
    }
    /// One broadcast per packet, in order.
    pub fn broadcast_all(&self, packets: &[Packet]) {
        for packet in packets {
            self.broadcast(packet);
        }
    }
    /// Like [`broadcast`](Self::broadcast), but `own` receives the packet too,
    /// exactly once.
    pub fn broadcast_with(&self, own: &Arc<Connection>, packet: &Packet) {
        let recipients = {
            let set = self.read();
            if set.is_empty() {
                None
            } else {
                let mut recipients = Vec::with_capacity(set.len() + 1);
                recipients.extend(set.values().cloned());
                if !set.contains_key(&own.id()) {
                    recipients.push(Arc::clone(own));
                }
                Some(recipients)
            }
        };
        match recipients {
            None => own.send(packet.clone()),
            Some(recipients) => deliver(&recipients, packet),
        }
    }
}

impl SelfAddress {
    pub fn connection(&self) -> Option<&Arc<Connection>> {
        match self {
            SelfAddress::Connection(conn) => Some(conn),
            SelfAddress::Unaddressable => None,
        }
    }
}

fn deliver(recipients: &[Arc<Connection>], packet: &Packet) {
    for conn in recipients {
        conn.send(packet.clone());
    }
}
