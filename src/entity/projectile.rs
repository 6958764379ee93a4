use super::sweep::{self, Contact};
use super::{Entity, Kind, PROJECTILE_MOTION};
use crate::metadata::{index, Metadata};
use crate::prelude::*;
use crate::world::WorldQuery;

const CRITICAL_BIT: u8 = 0x01;
const NO_CLIP_BIT: u8 = 0x02;

/// Arrow-only state. The two flags reach clients packed into one metadata byte.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Arrow {
    critical: bool,
    no_clip: bool,
    piercing_level: u8,
}
impl Arrow {
    pub fn is_critical(&self) -> bool {
        self.critical
    }
    pub fn is_no_clip(&self) -> bool {
        self.no_clip
    }
    pub fn piercing_level(&self) -> u8 {
        self.piercing_level
    }
    fn mask(&self) -> u8 {
        let mut mask = 0;
        if self.critical {
            mask |= CRITICAL_BIT;
        }
        if self.no_clip {
            mask |= NO_CLIP_BIT;
        }
        mask
    }
}

/// Mutable access to an arrow, keeping its metadata in step.
pub struct ArrowMut<'a> {
    arrow: &'a mut Arrow,
    metadata: &'a mut Metadata,
}
impl core::ops::Deref for ArrowMut<'_> {
    type Target = Arrow;
    fn deref(&self) -> &Arrow {
        self.arrow
    }
}
impl ArrowMut<'_> {
    pub fn set_critical(&mut self, critical: bool) {
        if self.arrow.critical != critical {
            self.arrow.critical = critical;
            self.metadata.set(index::ARROW_FLAGS, self.arrow.mask());
        }
    }
    pub fn set_no_clip(&mut self, no_clip: bool) {
        if self.arrow.no_clip != no_clip {
            self.arrow.no_clip = no_clip;
            self.metadata.set(index::ARROW_FLAGS, self.arrow.mask());
        }
    }
    pub fn set_piercing_level(&mut self, level: u8) {
        self.arrow.piercing_level = level;
        self.metadata.set(index::PIERCING_LEVEL, level);
    }
}

impl Entity {
    pub fn as_arrow(&self) -> Option<&Arrow> {
        match &self.kind {
            Kind::Arrow(arrow) => Some(arrow),
            _ => None,
        }
    }
    pub fn as_arrow_mut(&mut self) -> Option<ArrowMut<'_>> {
        match &mut self.kind {
            Kind::Arrow(arrow) => Some(ArrowMut { arrow, metadata: &mut self.metadata }),
            _ => None,
        }
    }
}

// Flying and embedded are told apart by `on_ground` alone.
pub(super) fn tick_arrow(arrow: &mut Entity, world: &mut impl WorldQuery) {
    let before = arrow.position;
    arrow.integrate(PROJECTILE_MOTION);
    let now = arrow.position;

    match sweep::sweep(world, arrow, before, now) {
        Contact::Struck(target) => {
            log::debug!("arrow {:?} struck {target:?}", arrow.id);
        }
        Contact::Embedded => {
            if arrow.on_ground {
                return;
            }
            arrow.on_ground = true;
            arrow.velocity = Vector::ZERO;
            arrow.broadcast_to_viewers_and_self(&arrow.velocity_packet());
            arrow.set_no_gravity(true);
            log::debug!("arrow {:?} embedded at {:?}", arrow.id, arrow.position.block());
        }
        Contact::Clear => {
            // Something moved an embedded arrow off its surface. It flies again.
            if !arrow.on_ground {
                return;
            }
            arrow.on_ground = false;
            arrow.set_no_gravity(false);
        }
    }
}
