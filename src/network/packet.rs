use crate::metadata::MetaValue;
use crate::prelude::*;

/// What the simulation tells clients about entities. The byte layout belongs
/// to whoever drains the connection.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    SpawnEntity {
        id: EntityId,
        kind: crate::entity::EntityType,
        position: Position,
        velocity: Vector,
        /// Spawn datum. For arrows, the shooter's id plus one.
        data: i32,
    },
    EntityVelocity {
        id: EntityId,
        velocity: Vector,
    },
    EntityTeleport {
        id: EntityId,
        position: Position,
        on_ground: bool,
    },
    EntityMetadata {
        id: EntityId,
        entries: Vec<(u8, MetaValue)>,
    },
    DestroyEntities(Vec<EntityId>),
}
