use volley::entity::sweep::GRACE_TICKS;
use volley::entity::Mob;
use volley::metadata::{index, MetaValue};
use volley::network::{ConnectionId, Packet};
use volley::types::*;
use volley::world::Event;
use volley::{Config, World};

fn setup() -> (World, ConnectionId) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut world = World::new(&Config::default());
    let (observer, _) = world.login(Name::new("observer").unwrap(), Position::new(0.5, 64.0, 8.5));
    (world, observer)
}

fn drain(world: &World, conn: ConnectionId) -> Vec<Packet> {
    world.connection(conn).unwrap().drain()
}

#[test]
fn arrow_embeds_in_the_floor_and_stays() {
    let (mut world, observer) = setup();
    world.fill(V3(-4, 63, -4), V3(4, 63, 4), Block::STONE);
    let arrow = world.spawn_arrow(None, Position::new(0.5, 66.0, 0.5), V3(0.0, -1.0, 0.0));
    assert!(matches!(drain(&world, observer)[..], [Packet::SpawnEntity { id, data: 0, .. }] if id == arrow));

    world.tick();
    assert!(!world.entity(arrow).unwrap().on_ground());
    drain(&world, observer);

    world.tick();
    let entity = world.entity(arrow).unwrap();
    assert!(entity.on_ground());
    assert!(entity.has_no_gravity());
    assert_eq!(entity.velocity(), Vector::ZERO);
    assert_eq!(entity.position().y, 64.75);
    assert_eq!(
        drain(&world, observer),
        vec![
            Packet::EntityVelocity { id: arrow, velocity: Vector::ZERO },
            Packet::EntityTeleport { id: arrow, position: entity.position(), on_ground: true },
            Packet::EntityMetadata { id: arrow, entries: vec![(index::NO_GRAVITY, MetaValue::Bool(true))] },
        ]
    );

    // Embedded and unmoved: nothing more to say.
    let rest = entity.position();
    world.tick();
    world.tick();
    assert_eq!(world.entity(arrow).unwrap().position(), rest);
    assert!(drain(&world, observer).is_empty());
}

#[test]
fn dislodged_arrow_flies_again() {
    let (mut world, observer) = setup();
    world.fill(V3(-4, 63, -4), V3(4, 63, 4), Block::STONE);
    let arrow = world.spawn_arrow(None, Position::new(0.5, 66.0, 0.5), V3(0.0, -1.0, 0.0));
    world.tick();
    world.tick();
    assert!(world.entity(arrow).unwrap().on_ground());
    drain(&world, observer);

    world.entity_mut(arrow).unwrap().set_velocity(V3(0.0, 0.5, 0.0));
    world.tick();
    let entity = world.entity(arrow).unwrap();
    assert!(!entity.on_ground());
    assert!(!entity.has_no_gravity());
    assert!(drain(&world, observer).contains(&Packet::EntityMetadata {
        id: arrow,
        entries: vec![(index::NO_GRAVITY, MetaValue::Bool(false))],
    }));

    for _ in 0..40 {
        world.tick();
        if world.entity(arrow).unwrap().on_ground() {
            break;
        }
    }
    assert!(world.entity(arrow).unwrap().on_ground());
}

#[test]
fn arrow_sticks_into_a_zombie() {
    let (mut world, observer) = setup();
    let zombie = world.spawn_mob(Mob::Zombie, Position::new(6.5, 64.0, 0.5));
    let arrow = world.spawn_arrow(None, Position::new(0.5, 64.5, 0.5), V3(1.0, 0.0, 0.0));
    world.entity_mut(arrow).unwrap().set_no_gravity(true);
    world.drain_events();
    drain(&world, observer);

    for _ in 0..10 {
        world.tick();
        if world.entity(arrow).is_none() {
            break;
        }
    }
    assert!(world.entity(arrow).is_none());
    assert_eq!(world.entity(zombie).unwrap().arrow_count(), 1);

    let events = world.drain_events();
    let attacks: Vec<_> = events.iter().filter(|e| matches!(e, Event::Attack { .. })).collect();
    assert_eq!(attacks, vec![&Event::Attack { attacker: arrow, target: zombie }]);
    assert!(events.contains(&Event::EntityRemoved { id: arrow }));

    let packets = drain(&world, observer);
    assert!(packets.contains(&Packet::DestroyEntities(vec![arrow])));
    assert!(packets.contains(&Packet::EntityMetadata {
        id: zombie,
        entries: vec![(index::ARROW_COUNT, MetaValue::VarInt(1))],
    }));
}

#[test]
fn fresh_arrows_do_not_hit_their_shooter() {
    let (mut world, _) = setup();
    let shooter = world.spawn_mob(Mob::Zombie, Position::new(0.5, 64.0, 0.5));
    let arrow = world.spawn_arrow(Some(shooter), Position::new(0.5, 64.5, 0.5), V3(0.1, 0.0, 0.0));
    world.entity_mut(arrow).unwrap().set_no_gravity(true);

    for _ in 0..GRACE_TICKS + 5 {
        world.tick();
    }
    assert!(world.entity(arrow).is_some());
    assert_eq!(world.entity(shooter).unwrap().arrow_count(), 0);
    assert!(!world.drain_events().iter().any(|e| matches!(e, Event::Attack { .. })));
    assert_eq!(world.shooter_of(arrow).map(|e| e.id()), Some(shooter));
}

#[test]
fn potions_fly_through_entities() {
    let (mut world, _) = setup();
    let zombie = world.spawn_mob(Mob::Zombie, Position::new(3.5, 64.0, 0.5));
    let potion = ItemStack::new(Item::SPLASH_POTION, 1);
    let id = world.spawn_potion(None, Position::new(0.5, 64.5, 0.5), V3(1.0, 0.0, 0.0), potion.clone());

    for _ in 0..8 {
        world.tick();
    }
    let entity = world.entity(id).unwrap();
    assert!(entity.position().x > 4.0);
    assert_eq!(entity.potion_item(), Some(potion));
    assert_eq!(world.entity(zombie).unwrap().arrow_count(), 0);
}
