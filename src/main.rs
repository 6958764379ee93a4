use std::io;
use std::time::{Duration, Instant};
use volley::entity::Mob;
use volley::types::*;
use volley::world::Event;
use volley::{Config, World};

const ARCHER: Position = Position::new(-8.5, 64.0, 0.5);
const ARROW_SPEED: f64 = 1.6;

/// One arrow at each target, one lobbed at the ground, and a splash potion.
fn volley(world: &mut World, archer: EntityId, targets: &[EntityId], critical: bool) {
    let eye = Position::new(ARCHER.x, ARCHER.y + 1.5, ARCHER.z);
    for target in targets {
        let Some(target) = world.entity(*target) else { continue };
        let aim = (target.position().to_vector() + V3(0.0, 0.9, 0.0) - eye.to_vector()).normalize();
        let arrow = world.spawn_arrow(Some(archer), eye, aim * ARROW_SPEED + V3(0.0, 0.1, 0.0));
        if let Some(mut arrow) = world.entity_mut(arrow).and_then(|e| e.as_arrow_mut()) {
            arrow.set_critical(critical);
        }
    }
    world.spawn_arrow(Some(archer), eye, V3(0.4, 0.6, 0.4));

    let potion = ItemStack::new(Item::SPLASH_POTION, 1)
        .with_nbt(fastnbt::nbt!({ "Potion": "minecraft:healing" }));
    world.spawn_potion(Some(archer), eye, V3(0.5, 0.5, -0.2), potion);
}

fn main() -> io::Result<()> {
    env_logger::init();
    let mut args = std::env::args_os();
    let config = match args.nth(1) {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };
    log::info!("{config:?}");

    let mut world = World::new(&config);
    world.generate_flat(config.view_distance as i32 + 1, 63, Block::STONE);
    world.fill(V3(-2, 63, -6), V3(2, 63, -2), Block::WATER);

    let name = Name::new("observer").ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "bad name"))?;
    let (observer, _) = world.login(name, Position::new(0.5, 64.0, 8.5));
    let archer = world.spawn_mob(Mob::Zombie, ARCHER);
    let targets = [
        world.spawn_mob(Mob::Zombie, Position::new(6.5, 64.0, 0.5)),
        world.spawn_mob(Mob::Endermite, Position::new(10.5, 64.0, 3.5)),
    ];

    let tick_length = Duration::from_millis(config.tick_millis);
    let interval = config.volley_interval.max(1);
    let starttime = Instant::now();
    while world.tick_count() < config.run_ticks {
        if world.tick_count() % interval == 0 {
            let critical = world.tick_count() / interval % 2 == 1;
            volley(&mut world, archer, &targets, critical);
        }

        let next_tick_due = starttime + world.next_tick() * tick_length;
        if let Some(wait) = next_tick_due.checked_duration_since(Instant::now()) {
            std::thread::sleep(wait);
        }
        world.tick();

        for event in world.drain_events() {
            match event {
                Event::Attack { attacker, target } => log::info!("{attacker:?} hit {target:?}"),
                event => log::trace!("{event:?}"),
            }
        }
        for conn in world.connections() {
            let packets = conn.drain();
            if !packets.is_empty() {
                log::debug!("tick {}: {} packets for {}", world.tick_count(), packets.len(), conn.name());
            }
        }
    }

    for target in targets {
        if let Some(target) = world.entity(target) {
            log::info!("{:?} {:?} has {} arrows in it", target.entity_type(), target.id(), target.arrow_count());
        }
    }
    world.logout(observer);
    debug_assert_eq!(world.online(), 0);
    Ok(())
}
