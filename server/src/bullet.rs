use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use arena_shared::config::GameConfig;
use arena_shared::protocol::BulletWire;
use arena_shared::vec2::{advance, distance, Vec2};

use crate::map::WorldMap;
use crate::player::SlotId;
use crate::protocol::RoomEvent;
use crate::room::Room;

/// In-flight projectile. Rotation is fixed at spawn.
#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    pub id: u64,
    pub position: Vec2,
    pub rotation: f64,
    pub expired: bool,
}

impl Bullet {
    pub fn new(id: u64, position: Vec2, rotation: f64) -> Self {
        Self {
            id,
            position,
            rotation,
            expired: false,
        }
    }

    pub fn to_wire(&self) -> BulletWire {
        BulletWire {
            id: self.id as f64,
            position: self.position,
            rotation: self.rotation,
            expired: self.expired,
        }
    }
}

/// Hands out bullet ids from the wall clock (microseconds), bumped so they
/// stay strictly increasing. Microseconds keep ids exact as `f64` on the wire.
#[derive(Debug, Default)]
pub struct BulletIds {
    last: AtomicU64,
}

impl BulletIds {
    pub fn next(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or_default();
        let prev = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(prev + 1)
    }
}

/// Result of one simulation tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Flying,
    Blocked,
    Hit(SlotId),
}

/// Advance `bullet` one tick.
///
/// `targets` are the living players other than the shooter in ascending slot
/// order; the first one within `player_size` of the new position is hit.
/// An expired bullet keeps its last in-flight position. The wall check and the
/// hit scan only read the map and the target list, so their order is irrelevant.
pub fn step(
    bullet: &mut Bullet,
    map: &WorldMap,
    config: &GameConfig,
    targets: &[(SlotId, Vec2)],
) -> TickOutcome {
    let candidate = advance(bullet.position, bullet.rotation, config.bullet_speed);

    let collided = map.collides(candidate, config.bullet_size);
    let hit = targets
        .iter()
        .find(|(_, pos)| distance(*pos, candidate) < config.player_size)
        .map(|(id, _)| *id);

    match hit {
        Some(victim) => {
            bullet.expired = true;
            TickOutcome::Hit(victim)
        }
        None if collided => {
            bullet.expired = true;
            TickOutcome::Blocked
        }
        None => {
            bullet.position = candidate;
            TickOutcome::Flying
        }
    }
}

/// Simulate one bullet until it hits something or the room runs out of players.
///
/// Hits and per-tick snapshots go through the room's mailbox.
pub async fn run(room: Arc<Room>, shooter: SlotId, mut bullet: Bullet) {
    let mut ticker = tokio::time::interval(Duration::from_millis(room.config().bullet_tick_ms));

    loop {
        ticker.tick().await;

        let targets = room.targets_excluding(shooter).await;
        let outcome = step(&mut bullet, room.map(), room.config(), &targets);
        if let TickOutcome::Hit(victim) = outcome {
            room.post(RoomEvent::Hit { shooter, victim });
        }

        if room.connected_count().await <= 1 {
            tracing::debug!("Room {} depleted, dropping bullet {}", room.id(), bullet.id);
            return;
        }

        room.post(RoomEvent::BulletRelay(bullet.to_wire()));
        if bullet.expired {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::GrassPatch;
    use arena_shared::vec2::vec2;
    use std::f64::consts::PI;

    fn slot(i: usize) -> SlotId {
        SlotId::new(i).unwrap()
    }

    fn open_map() -> WorldMap {
        WorldMap::new(
            2000.0,
            1500.0,
            crate::map::fixed_obstacles(2000, 1500),
            Vec::<GrassPatch>::new(),
        )
    }

    #[test]
    fn flies_until_map_edge() {
        let config = GameConfig::default();
        let map = open_map();
        let mut bullet = Bullet::new(1, vec2(1804.0, 1300.0), 0.0);

        let mut ticks = 0;
        while !bullet.expired {
            ticks += 1;
            let outcome = step(&mut bullet, &map, &config, &[]);
            if !bullet.expired {
                assert_eq!(outcome, TickOutcome::Flying);
            } else {
                assert_eq!(outcome, TickOutcome::Blocked);
            }
        }
        // 1804 + 7k + 4 > 2000 first holds at k = 28
        assert_eq!(ticks, 28);
        assert!((bullet.position.x - 1993.0).abs() < 1e-9);
    }

    #[test]
    fn every_direction_terminates() {
        let config = GameConfig::default();
        let map = open_map();
        let max_ticks = (2500.0 / config.bullet_speed) as usize + 2;

        for i in 0..64 {
            let angle = i as f64 * PI / 32.0;
            let mut bullet = Bullet::new(i, vec2(600.0, 400.0), angle);
            let mut ticks = 0;
            while !bullet.expired {
                step(&mut bullet, &map, &config, &[]);
                ticks += 1;
                assert!(ticks <= max_ticks, "bullet at angle {} never expired", angle);
            }
        }
    }

    #[test]
    fn stops_at_obstacle() {
        let config = GameConfig::default();
        let map = open_map();
        // Heading straight at the center block (x starts at 900)
        let mut bullet = Bullet::new(1, vec2(800.0, 750.0), 0.0);
        while !bullet.expired {
            step(&mut bullet, &map, &config, &[]);
        }
        assert!(bullet.position.x + config.bullet_size <= 900.0);
        assert!(bullet.position.x > 880.0);
    }

    #[test]
    fn hits_first_target_in_slot_order() {
        let config = GameConfig::default();
        let map = open_map();
        let mut bullet = Bullet::new(1, vec2(500.0, 400.0), 0.0);
        // Both within 20 units of (507, 400); slot 2 is closer but slot 1 comes first.
        let targets = [(slot(1), vec2(520.0, 400.0)), (slot(2), vec2(507.0, 400.0))];
        let outcome = step(&mut bullet, &map, &config, &targets);
        assert_eq!(outcome, TickOutcome::Hit(slot(1)));
        assert!(bullet.expired);
        assert_eq!(bullet.position, vec2(500.0, 400.0));
    }

    #[test]
    fn target_outside_radius_is_missed() {
        let config = GameConfig::default();
        let map = open_map();
        let mut bullet = Bullet::new(1, vec2(500.0, 400.0), 0.0);
        let targets = [(slot(1), vec2(527.0, 400.0))];
        assert_eq!(step(&mut bullet, &map, &config, &targets), TickOutcome::Flying);
        assert_eq!(step(&mut bullet, &map, &config, &targets), TickOutcome::Hit(slot(1)));
    }

    #[test]
    fn bullet_ids_strictly_increase() {
        let ids = BulletIds::default();
        let mut prev = ids.next();
        for _ in 0..1000 {
            let id = ids.next();
            assert!(id > prev);
            prev = id;
        }
        // Exact as f64
        assert_eq!(prev as f64 as u64, prev);
    }

    #[test]
    fn wire_snapshot_carries_expiry() {
        let mut bullet = Bullet::new(42, vec2(1.0, 2.0), 0.5);
        bullet.expired = true;
        let wire = bullet.to_wire();
        assert_eq!(wire.id, 42.0);
        assert!(wire.expired);
        assert_eq!(wire.rotation, 0.5);
    }
}
