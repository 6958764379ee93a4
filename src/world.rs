use crate::entity::{Entity, Mob};
use crate::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};

const MIN_Y: i32 = -64;
const HEIGHT: i32 = 384;
const SECTIONS: usize = (HEIGHT / 16) as usize;
const BLOCK_BITS: u32 = 15;
const BLOCK_MASK: u64 = 0b11111_11111_11111;

/// What the projectile sweep needs from the world it flies through.
pub trait WorldQuery {
    /// Missing chunks read as air.
    fn block_at(&self, pos: V3<i32>) -> Block;
    /// A snapshot; an empty chunk is an empty list.
    fn living_entities_in(&self, chunk: ChunkPos) -> Vec<Target>;
    /// Record one more arrow stuck in `target`.
    fn stick_into(&mut self, target: EntityId);
    fn emit(&mut self, event: Event);
}

/// A living entity as seen by a sweep: where it is and how big.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub id: EntityId,
    pub position: Vector,
    pub bounds: BoundingBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    EntitySpawn { id: EntityId },
    EntityRemoved { id: EntityId },
    Attack { attacker: EntityId, target: EntityId },
}

/// One 16x16 column, y -64..320. Four 15-bit block states per long, the same
/// packing the chunk data packet uses, with a non-air count per 16-high section.
pub struct Chunk {
    nonaircounts: [u16; SECTIONS],
    blocks: Box<[u64]>,
}
impl Chunk {
    fn empty() -> Self {
        Self {
            nonaircounts: [0; SECTIONS],
            blocks: vec![0u64; (16 * 16 * HEIGHT as usize) / 4].into_boxed_slice(),
        }
    }
    fn index(pos: V3<i32>) -> Option<usize> {
        if !(MIN_Y..MIN_Y + HEIGHT).contains(&pos.y) {
            return None;
        }
        Some(((pos.y - MIN_Y) * 16 * 16 + pos.z.rem_euclid(16) * 16 + pos.x.rem_euclid(16)) as usize)
    }
    pub fn block(&self, pos: V3<i32>) -> Block {
        match Self::index(pos) {
            Some(idx) => {
                let shift = (idx % 4) as u32 * BLOCK_BITS;
                Block::from_net_id(((self.blocks[idx / 4] >> shift) & BLOCK_MASK) as u16)
            }
            None => Block::AIR,
        }
    }
    /// Out-of-height writes are dropped. Returns the block replaced.
    fn set(&mut self, pos: V3<i32>, block: Block) -> Block {
        let Some(idx) = Self::index(pos) else {
            return Block::AIR;
        };
        let shift = (idx % 4) as u32 * BLOCK_BITS;
        let long = &mut self.blocks[idx / 4];
        let old = (*long >> shift) & BLOCK_MASK;
        let id = block.net_id() as u64;
        *long = (*long & !(BLOCK_MASK << shift)) | id << shift;
        let section = ((pos.y - MIN_Y) / 16) as usize;
        if old == 0 && id != 0 {
            self.nonaircounts[section] += 1;
        } else if old != 0 && id == 0 {
            self.nonaircounts[section] -= 1;
        }
        Block::from_net_id(old as u16)
    }
    /// Non-air blocks in the section containing `y`.
    pub fn non_air(&self, y: i32) -> u16 {
        if !(MIN_Y..MIN_Y + HEIGHT).contains(&y) {
            return 0;
        }
        self.nonaircounts[((y - MIN_Y) / 16) as usize]
    }
}

pub struct World {
    view_distance: u8,
    tick: u32,
    chunks: HashMap<ChunkPos, Chunk>,

    next_entity_id: u32,
    entities: BTreeMap<EntityId, Entity>,
    // The chunk index is brought up to date after each entity's tick.
    // Something moved through `entity_mut` is found in its old chunk until then.
    by_chunk: HashMap<ChunkPos, BTreeSet<EntityId>>,
    located: HashMap<EntityId, ChunkPos>,

    connections: SlotMap<Arc<Connection>>,
    players: HashMap<ConnectionId, EntityId>,
    events: Vec<Event>,
}

impl World {
    pub fn new(config: &crate::Config) -> Self {
        Self {
            view_distance: config.view_distance,
            tick: 0,
            chunks: HashMap::new(),
            next_entity_id: 1,
            entities: BTreeMap::new(),
            by_chunk: HashMap::new(),
            located: HashMap::new(),
            connections: SlotMap::new(),
            players: HashMap::new(),
            events: vec![],
        }
    }
    pub fn tick_count(&self) -> u32 {
        self.tick
    }
    pub fn next_tick(&self) -> u32 {
        self.tick + 1
    }

    pub fn chunk(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunks.get(&pos)
    }
    /// Creates the chunk if it isn't loaded yet.
    pub fn set_block(&mut self, pos: V3<i32>, block: Block) -> Block {
        self.chunks
            .entry(ChunkPos::of_block(pos))
            .or_insert_with(Chunk::empty)
            .set(pos, block)
    }
    /// Every block in the inclusive box.
    pub fn fill(&mut self, min: V3<i32>, max: V3<i32>, block: Block) {
        for x in min.x..=max.x {
            for z in min.z..=max.z {
                for y in min.y..=max.y {
                    self.set_block(V3(x, y, z), block);
                }
            }
        }
    }
    /// `block` from the bottom of the world up to `top`, over every chunk within `radius` of the origin.
    pub fn generate_flat(&mut self, radius: i32, top: i32, block: Block) {
        let extent = (radius + 1) * 16 - 1;
        self.fill(V3(-radius * 16, MIN_Y, -radius * 16), V3(extent, top, extent), block);
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }
    /// The entity that fired `projectile`, if both still exist.
    pub fn shooter_of(&self, projectile: EntityId) -> Option<&Entity> {
        let shooter = self.entities.get(&projectile)?.shooter()?;
        self.entities.get(&shooter)
    }
    pub fn connection(&self, id: ConnectionId) -> Option<&Arc<Connection>> {
        self.connections.get(id.0)
    }
    /// Every logged-in connection, in slot order.
    pub fn connections(&self) -> impl Iterator<Item = &Arc<Connection>> + '_ {
        self.connections.iter().map(|(_, conn)| conn)
    }
    pub fn online(&self) -> usize {
        self.connections.len()
    }
    pub fn player_entity(&self, id: ConnectionId) -> Option<EntityId> {
        self.players.get(&id).copied()
    }
    /// Events since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event> {
        core::mem::take(&mut self.events)
    }

    pub fn login(&mut self, name: Name, position: Position) -> (ConnectionId, EntityId) {
        let conn_id = ConnectionId(self.connections.next_idx());
        let conn = Arc::new(Connection::new(conn_id, name));
        self.connections.insert(Arc::clone(&conn));
        let id = self.insert(|id| Entity::player(id, conn, position));
        self.players.insert(conn_id, id);
        self.refresh_viewers();
        log::info!("{name} logged in as connection {} (entity {})", conn_id.0, id.0);
        (conn_id, id)
    }
    pub fn logout(&mut self, conn_id: ConnectionId) -> bool {
        let Some(conn) = self.connections.release(conn_id.0) else {
            return false;
        };
        for entity in self.entities.values() {
            entity.viewers().remove(conn_id);
        }
        if let Some(id) = self.players.remove(&conn_id) {
            if let Some(entity) = self.entities.remove(&id) {
                self.despawn(entity);
            }
        }
        log::info!("{} logged out", conn.name());
        true
    }

    pub fn spawn_mob(&mut self, mob: Mob, position: Position) -> EntityId {
        self.insert(|id| Entity::mob(id, mob, position))
    }
    pub fn spawn_arrow(&mut self, shooter: Option<EntityId>, position: Position, velocity: Vector) -> EntityId {
        self.insert(|id| Entity::arrow(id, shooter, position, velocity))
    }
    pub fn spawn_potion(
        &mut self,
        shooter: Option<EntityId>,
        position: Position,
        velocity: Vector,
        potion: ItemStack,
    ) -> EntityId {
        self.insert(|id| Entity::potion(id, shooter, position, velocity, potion))
    }
    fn insert(&mut self, build: impl FnOnce(EntityId) -> Entity) -> EntityId {
        let id = EntityId(self.next_entity_id);
        self.next_entity_id = self.next_entity_id.checked_add(1).expect("entity id overflow");
        let mut entity = build(id);
        // Initial metadata reaches viewers with the spawn, not as a later change.
        entity.take_metadata_packet();
        self.index(id, entity.chunk());
        sync_viewers(&entity, &self.observers(), self.view_distance as i32);
        log::debug!("spawned {:?} {} at {:?}", entity.entity_type(), id.0, entity.position().block());
        self.entities.insert(id, entity);
        self.events.push(Event::EntitySpawn { id });
        id
    }

    /// Moves an entity and tells its viewers straight away.
    pub fn teleport_entity(&mut self, id: EntityId, position: Position) -> bool {
        let Some(entity) = self.entities.get_mut(&id) else {
            return false;
        };
        entity.teleport(position);
        entity.viewers().broadcast(&entity.teleport_packet());
        self.relocate(id);
        true
    }
    /// Despawns immediately. Removing a player logs its connection out.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        if let Some(conn) = self.entities.get(&id).and_then(Entity::connection).map(|c| c.id()) {
            return self.logout(conn);
        }
        match self.entities.remove(&id) {
            Some(entity) => {
                self.despawn(entity);
                true
            }
            None => false,
        }
    }

    pub fn tick(&mut self) {
        // Entities spawned during this loop wait for the next tick.
        let ids: Vec<EntityId> = self.entities.keys().copied().collect();
        for id in ids {
            let Some(mut entity) = self.entities.remove(&id) else {
                continue;
            };
            let before = entity.position();
            entity.tick(self);
            if entity.is_removed() {
                self.despawn(entity);
                continue;
            }
            if entity.position() != before {
                entity.viewers().broadcast(&entity.teleport_packet());
            }
            self.entities.insert(id, entity);
            self.relocate(id);
        }
        self.refresh_viewers();
        for entity in self.entities.values_mut() {
            if let Some(packet) = entity.take_metadata_packet() {
                entity.broadcast_to_viewers_and_self(&packet);
            }
        }
        self.tick += 1;
    }

    fn despawn(&mut self, entity: Entity) {
        let id = entity.id();
        entity.viewers().broadcast(&Packet::DestroyEntities(vec![id]));
        self.unindex(id);
        self.events.push(Event::EntityRemoved { id });
        log::debug!("removed {:?} {}", entity.entity_type(), id.0);
    }

    fn index(&mut self, id: EntityId, chunk: ChunkPos) {
        debug_assert!(!self.located.contains_key(&id), "{id:?} indexed twice");
        self.by_chunk.entry(chunk).or_default().insert(id);
        self.located.insert(id, chunk);
    }
    fn unindex(&mut self, id: EntityId) {
        let Some(chunk) = self.located.remove(&id) else {
            return;
        };
        if let Some(set) = self.by_chunk.get_mut(&chunk) {
            set.remove(&id);
            if set.is_empty() {
                self.by_chunk.remove(&chunk);
            }
        }
    }
    fn relocate(&mut self, id: EntityId) {
        let Some(chunk) = self.entities.get(&id).map(Entity::chunk) else {
            return;
        };
        if self.located.get(&id) != Some(&chunk) {
            self.unindex(id);
            self.index(id, chunk);
        }
    }

    /// Each logged-in player's connection, entity and chunk.
    fn observers(&self) -> Vec<Observer> {
        self.players
            .iter()
            .filter_map(|(conn_id, id)| {
                Some(Observer {
                    conn: Arc::clone(self.connections.get(conn_id.0)?),
                    entity: *id,
                    chunk: self.entities.get(id)?.chunk(),
                })
            })
            .collect()
    }
    fn refresh_viewers(&self) {
        let observers = self.observers();
        for entity in self.entities.values() {
            sync_viewers(entity, &observers, self.view_distance as i32);
        }
    }
}

struct Observer {
    conn: Arc<Connection>,
    entity: EntityId,
    chunk: ChunkPos,
}

/// Adds or drops each observer as a viewer of `entity` depending on range,
/// sending the spawn or destroy that goes with the change.
fn sync_viewers(entity: &Entity, observers: &[Observer], view_distance: i32) {
    for observer in observers {
        if observer.entity == entity.id() {
            continue;
        }
        if entity.chunk().distance(observer.chunk) <= view_distance {
            if entity.viewers().add(&observer.conn) {
                observer.conn.send(entity.spawn_packet());
                if !entity.metadata().entries().is_empty() {
                    observer.conn.send(entity.full_metadata_packet());
                }
            }
        } else if entity.viewers().remove(observer.conn.id()) {
            observer.conn.send(Packet::DestroyEntities(vec![entity.id()]));
        }
    }
}

impl WorldQuery for World {
    fn block_at(&self, pos: V3<i32>) -> Block {
        self.chunks
            .get(&ChunkPos::of_block(pos))
            .map_or(Block::AIR, |chunk| chunk.block(pos))
    }
    fn living_entities_in(&self, chunk: ChunkPos) -> Vec<Target> {
        self.by_chunk
            .get(&chunk)
            .into_iter()
            .flatten()
            .filter_map(|id| self.entities.get(id))
            .filter(|entity| entity.is_living() && !entity.is_removed())
            .map(|entity| Target {
                id: entity.id(),
                position: entity.position().to_vector(),
                bounds: entity.bounding_box(),
            })
            .collect()
    }
    fn stick_into(&mut self, target: EntityId) {
        match self.entities.get_mut(&target) {
            Some(entity) => {
                entity.add_stuck_arrow();
            }
            None => log::warn!("arrow struck {target:?}, which is gone"),
        }
    }
    fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}
