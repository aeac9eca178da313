use arena_shared::config::GameConfig;
use arena_shared::protocol::{PlayerProfile, PlayerWire};
use arena_shared::vec2::{advance, heading, Vec2};
use bytes::Bytes;
use tokio::sync::{mpsc, Mutex, MutexGuard};

use crate::map::WorldMap;

/// Roster capacity of every room
pub const MAX_PLAYERS: usize = 6;

/// Roster position, doubling as the player's id for the room's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u8);

impl SlotId {
    /// Slot 0 belongs to whoever created the room.
    pub const OWNER: SlotId = SlotId(0);

    pub fn new(index: usize) -> Option<Self> {
        (index < MAX_PLAYERS).then_some(Self(index as u8))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn wire_id(self) -> i32 {
        self.0 as i32
    }

    pub fn is_owner(self) -> bool {
        self == Self::OWNER
    }

    pub fn all() -> impl Iterator<Item = SlotId> {
        (0..MAX_PLAYERS as u8).map(SlotId)
    }
}

impl TryFrom<i32> for SlotId {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(SlotId::new)
            .ok_or(value)
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a connection's writer half is asked to do.
#[derive(Debug, Clone)]
pub enum Outbound {
    Frame(Bytes),
    Close,
}

/// Exclusive handle to one player's connection.
pub type PlayerConn = mpsc::Sender<Outbound>;

/// Identifies one attached connection, so a late disconnect from an old
/// socket cannot remove whoever holds the slot afterwards.
pub type SessionId = u64;

/// Mutable fields of a player, guarded by the player's own lock.
#[derive(Debug)]
pub struct PlayerState {
    pub health: i32,
    pub kills: i32,
    pub position: Vec2,
    pub rotation: f64,
    pub is_ready: bool,
    pub in_grass: bool,
    pub conn: Option<PlayerConn>,
    /// Set together with `conn` on attach
    pub session: Option<SessionId>,
}

impl PlayerState {
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }
}

/// A seated player. Name and color never change after join.
#[derive(Debug)]
pub struct Player {
    pub id: SlotId,
    pub name: String,
    pub color: String,
    state: Mutex<PlayerState>,
}

impl Player {
    pub fn new(id: SlotId, profile: PlayerProfile, config: &GameConfig) -> Self {
        let color = if profile.color.is_empty() {
            color_from_id(id)
        } else {
            profile.color
        };
        Self {
            id,
            name: profile.name,
            color,
            state: Mutex::new(PlayerState {
                health: config.max_health,
                kills: 0,
                position: spawn_position(id, config),
                rotation: 0.0,
                is_ready: false,
                in_grass: false,
                conn: None,
                session: None,
            }),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, PlayerState> {
        self.state.lock().await
    }

    pub async fn snapshot(&self) -> PlayerWire {
        let state = self.lock().await;
        PlayerWire {
            id: self.id.wire_id(),
            health: state.health,
            is_ready: state.is_ready,
            kills: state.kills,
            rotation: state.rotation,
            position: state.position,
            name: self.name.clone(),
            color: self.color.clone(),
            in_grass: state.in_grass,
        }
    }
}

/// Starting position for a slot, staggered toward the top-left as the slot grows.
///
/// Slot 5 lands at (133, 50) on the default map, overlapping the top-left
/// corner block, so every move it makes collides.
pub fn spawn_position(id: SlotId, config: &GameConfig) -> Vec2 {
    let div = id.index() as u32 + 1;
    Vec2::new(
        (config.map_width / div) as f64 - 200.0,
        (config.map_height / div) as f64 - 200.0,
    )
}

/// Resolved result of one movement input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Movement {
    pub position: Vec2,
    pub rotation: f64,
    pub in_grass: bool,
    pub collided: bool,
}

/// Step `speed` units toward `direction` from `from`.
///
/// A colliding step keeps `from` but still turns the player. Grass membership
/// is taken from the attempted position either way. Both checks are pure reads
/// of the map, so running them one after the other is the same as in parallel.
pub fn resolve_move(map: &WorldMap, config: &GameConfig, from: Vec2, direction: Vec2) -> Movement {
    let rotation = heading(direction);
    let candidate = advance(from, rotation, config.player_speed);

    let collided = map.collides(candidate, config.player_size);
    let in_grass = map.in_grass(candidate);

    Movement {
        position: if collided { from } else { candidate },
        rotation,
        in_grass,
        collided,
    }
}

/// Fallback color for players that joined without one, using golden angle hue distribution.
pub fn color_from_id(id: SlotId) -> String {
    let hue = ((id.index() as u32 + 1).wrapping_mul(137)) % 360;
    format!("#{:06x}", hsv_to_rgb(hue as f64, 0.55, 0.95))
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> u32 {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    let ri = ((r + m) * 255.0).round() as u32;
    let gi = ((g + m) * 255.0).round() as u32;
    let bi = ((b + m) * 255.0).round() as u32;

    (ri << 16) | (gi << 8) | bi
}
