use std::ops::{Add, Mul, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct V3<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}
#[allow(non_snake_case)]
pub const fn V3<T>(x: T, y: T, z: T) -> V3<T> {
    V3 { x, y, z }
}

/// Displacement in blocks. Velocities are stored per tick.
pub type Vector = V3<f64>;

impl V3<f64> {
    pub const ZERO: Self = V3(0.0, 0.0, 0.0);

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
    /// The zero vector normalizes to itself instead of NaN.
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            self
        } else {
            self * (1.0 / len)
        }
    }
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
    pub fn block(self) -> V3<i32> {
        V3(self.x.floor() as i32, self.y.floor() as i32, self.z.floor() as i32)
    }
}
impl Add for V3<f64> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        V3(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}
impl Sub for V3<f64> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        V3(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}
impl Mul<f64> for V3<f64> {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        V3(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// An entity's location: feet coordinates plus facing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
}
impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z, yaw: 0.0, pitch: 0.0 }
    }
    pub fn to_vector(self) -> Vector {
        V3(self.x, self.y, self.z)
    }
    /// Same point in space, facing ignored.
    pub fn is_similar(&self, other: &Position) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z
    }
    pub fn add(&mut self, v: Vector) {
        self.x += v.x;
        self.y += v.y;
        self.z += v.z;
    }
    pub fn set_coords(&mut self, v: Vector) {
        self.x = v.x;
        self.y = v.y;
        self.z = v.z;
    }
    pub fn block(&self) -> V3<i32> {
        self.to_vector().block()
    }
    pub fn chunk(&self) -> ChunkPos {
        ChunkPos::of_block(self.block())
    }
}

/// A 16x16 column of the world. Entity lookups are bucketed by these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}
impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
    pub fn of_block(pos: V3<i32>) -> Self {
        Self { x: pos.x.div_euclid(16), z: pos.z.div_euclid(16) }
    }
    /// Chebyshev distance in chunks.
    pub fn distance(self, other: ChunkPos) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }
}

/// Symmetric half-extents around an entity's position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}
impl BoundingBox {
    pub const fn new(width: f64, height: f64, depth: f64) -> Self {
        Self { width, height, depth }
    }
    pub fn contains(&self, center: Vector, point: Vector) -> bool {
        (point.x - center.x).abs() <= self.width
            && (point.y - center.y).abs() <= self.height
            && (point.z - center.z).abs() <= self.depth
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// Block state ids, in the 1.19 global palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block(u16);
impl Block {
    pub const AIR: Block = Block(0);
    pub const STONE: Block = Block(1);
    pub const ANDESITE: Block = Block(6);
    pub const WATER: Block = Block(75);
    pub const LAVA: Block = Block(91);

    pub const fn from_net_id(id: u16) -> Self {
        Self(id)
    }
    pub const fn net_id(self) -> u16 {
        self.0
    }
    pub fn is_air(self) -> bool {
        self.0 == 0
    }
    /// Every water and lava level state.
    pub fn is_liquid(self) -> bool {
        (75..=106).contains(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Item(u16);
impl Item {
    pub const SPLASH_POTION: Item = Item(948);

    pub const fn net_id(self) -> u16 {
        self.0
    }
}

/// An item payload as it travels in entity metadata. The tag is opaque to the simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemStack {
    pub item: Item,
    pub count: u8,
    pub nbt: Option<fastnbt::Value>,
}
impl ItemStack {
    pub fn new(item: Item, count: u8) -> Self {
        Self { item, count, nbt: None }
    }
    pub fn with_nbt(mut self, nbt: fastnbt::Value) -> Self {
        self.nbt = Some(nbt);
        self
    }
}

/// Player names are at most 16 bytes, padded with 0xFF.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Name([u8; 16]);
impl Name {
    pub fn new(name: &str) -> Option<Self> {
        let mut buf = [0xFF; 16];
        buf.get_mut(..name.len())?.copy_from_slice(name.as_bytes());
        Some(Self(buf))
    }
    pub fn as_str(&self) -> &str {
        let len = self.0.iter().position(|&b| b == 0xFF).unwrap_or(16);
        core::str::from_utf8(&self.0[..len]).unwrap_or("")
    }
}
impl std::fmt::Debug for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_of_negative_blocks_rounds_down() {
        assert_eq!(ChunkPos::of_block(V3(-1, 70, -16)), ChunkPos::new(-1, -1));
        assert_eq!(ChunkPos::of_block(V3(-17, 0, 15)), ChunkPos::new(-2, 0));
        assert_eq!(Position::new(15.9, 64.0, 16.0).chunk(), ChunkPos::new(0, 1));
    }

    #[test]
    fn bounding_box_is_symmetric() {
        let bb = BoundingBox::new(0.3, 0.9, 0.3);
        let center = V3(10.0, 64.0, 10.0);
        assert!(bb.contains(center, V3(10.25, 63.1, 9.75)));
        assert!(!bb.contains(center, V3(10.31, 64.0, 10.0)));
        assert!(!bb.contains(center, V3(10.0, 62.9, 10.0)));
    }

    #[test]
    fn bounding_box_edges_are_inclusive() {
        let bb = BoundingBox::new(0.5, 1.0, 0.5);
        assert!(bb.contains(V3(8.0, 64.0, 8.0), V3(8.5, 63.0, 7.5)));
        assert!(!bb.contains(V3(8.0, 64.0, 8.0), V3(8.5, 62.875, 7.5)));
    }

    #[test]
    fn liquids_are_not_air() {
        assert!(Block::WATER.is_liquid() && !Block::WATER.is_air());
        assert!(Block::LAVA.is_liquid());
        assert!(!Block::STONE.is_liquid());
        assert!(Block::AIR.is_air() && !Block::AIR.is_liquid());
    }

    #[test]
    fn names_round_trip_and_reject_long() {
        assert_eq!(Name::new("Notch").unwrap().as_str(), "Notch");
        assert!(Name::new("a_name_that_is_way_too_long").is_none());
    }
}
