//! Entity simulation for a block world: projectiles flying, landing and
//! sticking into things, and the packets that tell nearby players about it.

mod collections;
pub mod config;
pub mod entity;
pub mod metadata;
pub mod network;
pub mod types;
pub mod viewers;
pub mod world;

pub use config::Config;
pub use world::World;

mod prelude {
    pub(crate) use crate::collections::*;
    pub(crate) use crate::network::{Connection, ConnectionId, Packet};
    pub(crate) use crate::types::*;
    pub(crate) use std::sync::Arc;
}
