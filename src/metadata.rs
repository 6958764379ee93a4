//! Protocol-indexed per-entity values.
//!
//! Entries are addressed by the index the client expects them under. Every
//! write is remembered until [`Metadata::take_changes`] collects it, which is
//! how the world knows what to resend.

use crate::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

/// Well-known indices.
pub mod index {
    pub const NO_GRAVITY: u8 = 5;
    /// Packed critical/no-clip bits on arrows.
    pub const ARROW_FLAGS: u8 = 7;
    pub const PIERCING_LEVEL: u8 = 8;
    /// Item payload on thrown potions.
    pub const POTION_ITEM: u8 = 7;
    /// Arrows stuck in a living entity.
    pub const ARROW_COUNT: u8 = 11;
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Byte(u8),
    VarInt(i32),
    Bool(bool),
    Slot(Option<ItemStack>),
}

pub trait MetaType: Sized {
    fn into_meta(self) -> MetaValue;
    fn from_meta(value: &MetaValue) -> Option<Self>;
}
macro_rules! meta_type {
    {$($t:ty => $variant:ident),* $(,)?} => {
        $(
            impl MetaType for $t {
                fn into_meta(self) -> MetaValue {
                    MetaValue::$variant(self)
                }
                fn from_meta(value: &MetaValue) -> Option<Self> {
                    match value {
                        MetaValue::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }
            }
        )*
    }
}
meta_type! {
    u8 => Byte,
    i32 => VarInt,
    bool => Bool,
    Option<ItemStack> => Slot,
}

#[derive(Debug, Default, Clone)]
pub struct Metadata {
    entries: BTreeMap<u8, MetaValue>,
    dirty: BTreeSet<u8>,
}
impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }
    /// A missing entry, or one holding a different type, reads as `default`.
    pub fn get<T: MetaType>(&self, index: u8, default: T) -> T {
        self.entries
            .get(&index)
            .and_then(T::from_meta)
            .unwrap_or(default)
    }
    pub fn set<T: MetaType>(&mut self, index: u8, value: T) {
        self.entries.insert(index, value.into_meta());
        self.dirty.insert(index);
    }
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }
    /// Entries written since the last call.
    pub fn take_changes(&mut self) -> Vec<(u8, MetaValue)> {
        let dirty = core::mem::take(&mut self.dirty);
        dirty
            .into_iter()
            .filter_map(|i| self.entries.get(&i).map(|v| (i, v.clone())))
            .collect()
    }
    pub fn entries(&self) -> Vec<(u8, MetaValue)> {
        self.entries.iter().map(|(i, v)| (*i, v.clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_mistyped_entries_read_as_default() {
        let mut meta = Metadata::new();
        assert_eq!(meta.get(index::PIERCING_LEVEL, 0u8), 0);
        meta.set(index::PIERCING_LEVEL, 4u8);
        assert_eq!(meta.get(index::PIERCING_LEVEL, 0u8), 4);
        assert_eq!(meta.get(index::PIERCING_LEVEL, -1i32), -1);
    }

    #[test]
    fn changes_are_taken_once() {
        let mut meta = Metadata::new();
        meta.set(index::NO_GRAVITY, true);
        meta.set(index::ARROW_COUNT, 2i32);
        meta.set(index::ARROW_COUNT, 3i32);
        assert!(meta.is_dirty());
        assert_eq!(
            meta.take_changes(),
            vec![(index::NO_GRAVITY, MetaValue::Bool(true)), (index::ARROW_COUNT, MetaValue::VarInt(3))]
        );
        assert!(!meta.is_dirty());
        assert!(meta.take_changes().is_empty());
        assert_eq!(meta.entries().len(), 2);
    }

    #[test]
    fn slots_carry_nbt() {
        let mut meta = Metadata::new();
        let potion = ItemStack::new(Item::SPLASH_POTION, 1)
            .with_nbt(fastnbt::nbt!({ "Potion": "minecraft:healing" }));
        meta.set(index::POTION_ITEM, Some(potion.clone()));
        assert_eq!(meta.get::<Option<ItemStack>>(index::POTION_ITEM, None), Some(potion));
    }
}
