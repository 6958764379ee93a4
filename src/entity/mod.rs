use crate::metadata::{index, Metadata};
use crate::prelude::*;
use crate::viewers::{SelfAddress, Viewers};
use crate::world::WorldQuery;

mod projectile;
pub mod sweep;

pub use projectile::{Arrow, ArrowMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Player,
    Zombie,
    Endermite,
    Arrow,
    Potion,
}
impl EntityType {
    pub fn is_living(self) -> bool {
        matches!(self, EntityType::Player | EntityType::Zombie | EntityType::Endermite)
    }
    fn bounding_box(self) -> BoundingBox {
        match self {
            EntityType::Player => BoundingBox::new(0.3, 0.9, 0.3),
            EntityType::Zombie => BoundingBox::new(0.3, 0.975, 0.3),
            EntityType::Endermite => BoundingBox::new(0.2, 0.15, 0.2),
            EntityType::Arrow => BoundingBox::new(0.5, 0.5, 0.5),
            EntityType::Potion => BoundingBox::new(0.25, 0.25, 0.25),
        }
    }
}

/// Living entities the world can spawn without a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mob {
    Zombie,
    Endermite,
}

#[derive(Debug)]
pub enum Kind {
    Player,
    Zombie,
    Endermite,
    Arrow(Arrow),
    Potion,
}
impl Kind {
    pub fn entity_type(&self) -> EntityType {
        match self {
            Kind::Player => EntityType::Player,
            Kind::Zombie => EntityType::Zombie,
            Kind::Endermite => EntityType::Endermite,
            Kind::Arrow(_) => EntityType::Arrow,
            Kind::Potion => EntityType::Potion,
        }
    }
}

/// Per-tick motion applied before anything else looks at the entity.
#[derive(Debug, Clone, Copy)]
struct Motion {
    drag: f64,
    gravity: f64,
}
const PROJECTILE_MOTION: Motion = Motion { drag: 0.99, gravity: 0.05 };

#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    kind: Kind,
    position: Position,
    velocity: Vector,
    bounding_box: BoundingBox,
    on_ground: bool,
    no_gravity: bool,
    /// Ticks since spawn.
    age: u64,
    /// Weak: resolve through `World::shooter_of`.
    shooter: Option<EntityId>,
    metadata: Metadata,
    viewers: Viewers,
    address: SelfAddress,
    removed: bool,
}

impl Entity {
    fn new(id: EntityId, kind: Kind, position: Position, address: SelfAddress) -> Self {
        Self {
            id,
            bounding_box: kind.entity_type().bounding_box(),
            kind,
            position,
            velocity: Vector::ZERO,
            on_ground: false,
            no_gravity: false,
            age: 0,
            shooter: None,
            metadata: Metadata::new(),
            viewers: Viewers::new(),
            address,
            removed: false,
        }
    }
    pub(crate) fn player(id: EntityId, conn: Arc<Connection>, position: Position) -> Self {
        Self::new(id, Kind::Player, position, SelfAddress::Connection(conn))
    }
    pub(crate) fn mob(id: EntityId, mob: Mob, position: Position) -> Self {
        let kind = match mob {
            Mob::Zombie => Kind::Zombie,
            Mob::Endermite => Kind::Endermite,
        };
        Self::new(id, kind, position, SelfAddress::Unaddressable)
    }
    pub(crate) fn arrow(id: EntityId, shooter: Option<EntityId>, position: Position, velocity: Vector) -> Self {
        let mut arrow = Self::new(id, Kind::Arrow(Arrow::default()), position, SelfAddress::Unaddressable);
        arrow.shooter = shooter;
        arrow.velocity = velocity;
        arrow
    }
    pub(crate) fn potion(
        id: EntityId,
        shooter: Option<EntityId>,
        position: Position,
        velocity: Vector,
        item: ItemStack,
    ) -> Self {
        let mut potion = Self::new(id, Kind::Potion, position, SelfAddress::Unaddressable);
        potion.shooter = shooter;
        potion.velocity = velocity;
        potion.set_potion(item);
        potion
    }

    pub fn id(&self) -> EntityId {
        self.id
    }
    pub fn kind(&self) -> &Kind {
        &self.kind
    }
    pub fn entity_type(&self) -> EntityType {
        self.kind.entity_type()
    }
    pub fn is_living(&self) -> bool {
        self.entity_type().is_living()
    }
    pub fn position(&self) -> Position {
        self.position
    }
    /// Moves without broadcasting; the world syncs changed positions after each tick.
    pub fn teleport(&mut self, position: Position) {
        self.position = position;
    }
    pub fn velocity(&self) -> Vector {
        self.velocity
    }
    pub fn set_velocity(&mut self, velocity: Vector) {
        self.velocity = velocity;
    }
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }
    pub fn chunk(&self) -> ChunkPos {
        self.position.chunk()
    }
    pub fn on_ground(&self) -> bool {
        self.on_ground
    }
    pub fn has_no_gravity(&self) -> bool {
        self.no_gravity
    }
    pub fn set_no_gravity(&mut self, no_gravity: bool) {
        if self.no_gravity != no_gravity {
            self.no_gravity = no_gravity;
            self.metadata.set(index::NO_GRAVITY, no_gravity);
        }
    }
    pub fn age(&self) -> u64 {
        self.age
    }
    pub fn shooter(&self) -> Option<EntityId> {
        self.shooter
    }
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
    pub fn viewers(&self) -> &Viewers {
        &self.viewers
    }
    pub fn connection(&self) -> Option<&Arc<Connection>> {
        self.address.connection()
    }
    pub fn is_removed(&self) -> bool {
        self.removed
    }
    /// Marks the entity for despawn at the end of its tick.
    pub fn remove(&mut self) {
        self.removed = true;
    }

    /// Arrows stuck in this entity. Always 0 for non-living kinds.
    pub fn arrow_count(&self) -> i32 {
        self.metadata.get(index::ARROW_COUNT, 0i32)
    }
    /// Returns `false`, changing nothing, for entities that cannot be stuck.
    pub fn add_stuck_arrow(&mut self) -> bool {
        if !self.is_living() {
            return false;
        }
        let count = self.arrow_count();
        self.metadata.set(index::ARROW_COUNT, count + 1);
        true
    }

    pub fn potion_item(&self) -> Option<ItemStack> {
        match self.kind {
            Kind::Potion => self.metadata.get(index::POTION_ITEM, None),
            _ => None,
        }
    }
    pub fn set_potion(&mut self, item: ItemStack) {
        if let Kind::Potion = self.kind {
            self.metadata.set(index::POTION_ITEM, Some(item));
        }
    }

    /// Number clients read from the spawn packet to resolve ownership.
    pub fn spawn_data(&self) -> i32 {
        match self.kind {
            Kind::Arrow(_) => self
                .shooter
                .and_then(|shooter| i32::try_from(shooter.0).ok()?.checked_add(1))
                .unwrap_or(0),
            _ => 0,
        }
    }
    pub fn spawn_packet(&self) -> Packet {
        Packet::SpawnEntity {
            id: self.id,
            kind: self.entity_type(),
            position: self.position,
            velocity: self.velocity,
            data: self.spawn_data(),
        }
    }
    pub fn velocity_packet(&self) -> Packet {
        Packet::EntityVelocity { id: self.id, velocity: self.velocity }
    }
    pub fn teleport_packet(&self) -> Packet {
        Packet::EntityTeleport { id: self.id, position: self.position, on_ground: self.on_ground }
    }
    /// Every entry, for a viewer that has never seen this entity.
    pub fn full_metadata_packet(&self) -> Packet {
        Packet::EntityMetadata { id: self.id, entries: self.metadata.entries() }
    }
    pub(crate) fn take_metadata_packet(&mut self) -> Option<Packet> {
        if !self.metadata.is_dirty() {
            return None;
        }
        Some(Packet::EntityMetadata { id: self.id, entries: self.metadata.take_changes() })
    }

    /// Viewers, plus the entity itself when it has a connection of its own.
    pub fn broadcast_to_viewers_and_self(&self, packet: &Packet) {
        match &self.address {
            SelfAddress::Connection(own) => self.viewers.broadcast_with(own, packet),
            SelfAddress::Unaddressable => self.viewers.broadcast(packet),
        }
    }

    pub(crate) fn tick(&mut self, world: &mut impl WorldQuery) {
        match self.kind {
            Kind::Arrow(_) => projectile::tick_arrow(self, world),
            Kind::Potion => self.integrate(PROJECTILE_MOTION),
            Kind::Player | Kind::Zombie | Kind::Endermite => {}
        }
        self.age += 1;
    }

    fn integrate(&mut self, motion: Motion) {
        self.position.add(self.velocity);
        self.velocity = self.velocity * motion.drag;
        if !self.no_gravity {
            self.velocity.y -= motion.gravity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_datum_is_shooter_plus_one() {
        let origin = Position::new(0.0, 64.0, 0.0);
        assert_eq!(Entity::arrow(EntityId(1), None, origin, Vector::ZERO).spawn_data(), 0);
        assert_eq!(Entity::arrow(EntityId(1), Some(EntityId(41)), origin, Vector::ZERO).spawn_data(), 42);
    }

    #[test]
    fn spawn_datum_does_not_overflow() {
        let origin = Position::new(0.0, 64.0, 0.0);
        let datum = |shooter: u32| Entity::arrow(EntityId(1), Some(EntityId(shooter)), origin, Vector::ZERO).spawn_data();
        assert_eq!(datum(i32::MAX as u32 - 1), i32::MAX);
        assert_eq!(datum(i32::MAX as u32), 0);
        assert_eq!(datum(u32::MAX), 0);
    }

    #[test]
    fn potions_never_carry_shooter_in_spawn_datum() {
        let item = ItemStack::new(Item::SPLASH_POTION, 1);
        let potion = Entity::potion(EntityId(2), Some(EntityId(9)), Position::default(), Vector::ZERO, item.clone());
        assert_eq!(potion.spawn_data(), 0);
        assert_eq!(potion.shooter(), Some(EntityId(9)));
        assert_eq!(potion.potion_item(), Some(item));
    }

    #[test]
    fn only_living_entities_collect_arrows() {
        let mut zombie = Entity::mob(EntityId(1), Mob::Zombie, Position::default());
        assert!(zombie.add_stuck_arrow());
        assert!(zombie.add_stuck_arrow());
        assert_eq!(zombie.arrow_count(), 2);

        let mut arrow = Entity::arrow(EntityId(2), None, Position::default(), Vector::ZERO);
        assert!(!arrow.add_stuck_arrow());
        assert_eq!(arrow.arrow_count(), 0);
    }

    #[test]
    fn unaddressable_entities_only_reach_viewers() {
        let zombie = Entity::mob(EntityId(5), Mob::Zombie, Position::default());
        let viewer = Arc::new(Connection::new(ConnectionId(0), Name::new("watcher").unwrap()));
        zombie.viewers().add(&viewer);
        let packet = zombie.velocity_packet();
        zombie.broadcast_to_viewers_and_self(&packet);
        assert_eq!(viewer.drain(), vec![packet]);
    }

    #[test]
    fn players_hear_their_own_broadcasts() {
        let own = Arc::new(Connection::new(ConnectionId(0), Name::new("self").unwrap()));
        let player = Entity::player(EntityId(1), Arc::clone(&own), Position::default());
        let packet = player.velocity_packet();

        player.broadcast_to_viewers_and_self(&packet);
        assert_eq!(own.drain(), vec![packet.clone()]);

        let other = Arc::new(Connection::new(ConnectionId(1), Name::new("other").unwrap()));
        player.viewers().add(&other);
        player.broadcast_to_viewers_and_self(&packet);
        assert_eq!(own.drain(), vec![packet.clone()]);
        assert_eq!(other.drain(), vec![packet]);
    }

    #[test]
    fn no_gravity_is_mirrored_into_metadata() {
        let mut arrow = Entity::arrow(EntityId(1), None, Position::default(), Vector::ZERO);
        arrow.set_no_gravity(false);
        assert!(!arrow.metadata().is_dirty());
        arrow.set_no_gravity(true);
        assert!(arrow.metadata().get(index::NO_GRAVITY, false));
    }
}
