//! Swept collision for small fast entities.
//!
//! A projectile can cover several blocks in one tick, so checking only where it
//! ends up would let it pass through floors and targets. Instead the segment
//! from last tick's position to this tick's is walked in fixed steps, and each
//! sample is checked against the block under it and the living entities of
//! the chunk it is in.
//!
//! The step is a quarter of the projectile's box, independent of speed, so a
//! fast enough projectile still tunnels through thin geometry.

use super::Entity;
use crate::prelude::*;
use crate::world::{Event, Target, WorldQuery};

/// Ticks after spawn during which a projectile cannot hit anything alive. It
/// starts inside its shooter.
pub const GRACE_TICKS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    Clear,
    /// Resting on a surface. The projectile has been moved to the contact point.
    Embedded,
    /// Hit a living entity. The projectile has been removed.
    Struck(EntityId),
}

/// Living entities of the chunk last sampled. Only refetched when a sample
/// crosses into another chunk.
#[derive(Default)]
struct ChunkCache {
    chunk: Option<ChunkPos>,
    targets: Vec<Target>,
}
impl ChunkCache {
    fn targets_in<W: WorldQuery + ?Sized>(&mut self, world: &W, chunk: ChunkPos) -> &[Target] {
        if self.chunk != Some(chunk) {
            self.targets = world.living_entities_in(chunk);
            self.chunk = Some(chunk);
        }
        &self.targets
    }
}

pub fn step_length(projectile: &Entity) -> f64 {
    projectile.bounding_box().width / 2.0
}

/// Walks `projectile` from `start` to `end` and reports the first contact.
pub fn sweep<W: WorldQuery + ?Sized>(
    world: &mut W,
    projectile: &mut Entity,
    start: Position,
    end: Position,
) -> Contact {
    if start.is_similar(&end) {
        return Contact::Embedded;
    }
    debug_assert!(
        start.to_vector().is_finite() && end.to_vector().is_finite(),
        "sweeping {:?} from {start:?} to {end:?}",
        projectile.id()
    );

    let step = step_length(projectile);
    let direction = end.to_vector() - start.to_vector();
    let steps = (direction.length() / step).ceil() as usize;
    let stride = direction.normalize() * step;

    let mut cache = ChunkCache::default();
    let mut sample = start;
    for i in 0..steps {
        // Adding the stride on the last step could overshoot the end point.
        if i == steps - 1 {
            sample.set_coords(end.to_vector());
        } else {
            sample.add(stride);
        }

        let feet = sample.block();
        let below = world.block_at(V3(feet.x, feet.y - 1, feet.z));
        if !below.is_air() && !below.is_liquid() {
            projectile.teleport(sample);
            return Contact::Embedded;
        }

        let targets = cache.targets_in(&*world, sample.chunk());
        if projectile.age() < GRACE_TICKS {
            continue;
        }
        let point = sample.to_vector();
        let hit = targets
            .iter()
            .find(|target| target.bounds.contains(target.position, point))
            .map(|target| target.id);
        if let Some(target) = hit {
            world.stick_into(target);
            world.emit(Event::Attack { attacker: projectile.id(), target });
            projectile.remove();
            return Contact::Struck(target);
        }
    }
    Contact::Clear
}
