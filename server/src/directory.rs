//! Process-wide registry of live rooms.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use arena_shared::config::GameConfig;
use arena_shared::protocol::PlayerProfile;
use tokio::sync::RwLock;
use tracing::info;

use crate::map::WorldMap;
use crate::player::SlotId;
use crate::room::{JoinError, Room, RoomId};

pub struct RoomDirectory {
    config: Arc<GameConfig>,
    map: Arc<WorldMap>,
    next_id: AtomicU32,
    rooms: RwLock<HashMap<RoomId, Arc<Room>>>,
}

impl RoomDirectory {
    pub fn new(config: Arc<GameConfig>, map: Arc<WorldMap>) -> Arc<Self> {
        Arc::new(Self {
            config,
            map,
            next_id: AtomicU32::new(1),
            rooms: RwLock::new(HashMap::new()),
        })
    }

    /// Open a room with `owner` in slot 0 and start its mailbox task.
    /// The room is dropped from the directory once it terminates.
    pub async fn create(self: &Arc<Self>, owner: PlayerProfile) -> Result<(RoomId, SlotId), JoinError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (room, mailbox) = Room::new(id, Arc::clone(&self.config), Arc::clone(&self.map));
        let slot = room.join(owner).await?;

        self.rooms.write().await.insert(id, Arc::clone(&room));
        info!("Room {} created", id);

        let directory = Arc::clone(self);
        tokio::spawn(async move {
            room.run(mailbox).await;
            directory.rooms.write().await.remove(&id);
        });
        Ok((id, slot))
    }

    pub async fn join(&self, id: RoomId, profile: PlayerProfile) -> Result<SlotId, JoinError> {
        let room = self.get(id).await.ok_or(JoinError::RoomNotFound(id))?;
        room.join(profile).await
    }

    pub async fn get(&self, id: RoomId) -> Option<Arc<Room>> {
        self.rooms.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RoomEvent;
    use std::time::Duration;

    fn directory() -> Arc<RoomDirectory> {
        let config = GameConfig::default();
        let map = WorldMap::new(2000.0, 1500.0, crate::map::fixed_obstacles(2000, 1500), Vec::new());
        RoomDirectory::new(Arc::new(config), Arc::new(map))
    }

    fn profile(name: &str) -> PlayerProfile {
        PlayerProfile {
            name: name.to_string(),
            color: String::new(),
        }
    }

    #[tokio::test]
    async fn create_seats_owner_in_slot_zero() {
        let dir = directory();
        let (first, owner) = dir.create(profile("host")).await.unwrap();
        let (second, _) = dir.create(profile("other host")).await.unwrap();
        assert!(owner.is_owner());
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(dir.len().await, 2);
    }

    #[tokio::test]
    async fn join_assigns_next_slot() {
        let dir = directory();
        let (id, _) = dir.create(profile("host")).await.unwrap();
        assert_eq!(dir.join(id, profile("a")).await.unwrap().index(), 1);
        assert_eq!(dir.join(id, profile("b")).await.unwrap().index(), 2);
    }

    #[tokio::test]
    async fn join_unknown_room_fails() {
        let dir = directory();
        assert_eq!(
            dir.join(42, profile("a")).await,
            Err(JoinError::RoomNotFound(42))
        );
    }

    #[tokio::test]
    async fn join_full_room_fails() {
        let dir = directory();
        let (id, _) = dir.create(profile("host")).await.unwrap();
        for _ in 1..crate::player::MAX_PLAYERS {
            dir.join(id, profile("p")).await.unwrap();
        }
        assert_eq!(dir.join(id, profile("late")).await, Err(JoinError::RoomFull));
    }

    #[tokio::test]
    async fn terminated_room_is_removed() {
        let dir = directory();
        let (id, _) = dir.create(profile("host")).await.unwrap();
        let room = dir.get(id).await.unwrap();
        room.post(RoomEvent::Delete);

        for _ in 0..50 {
            if dir.is_empty().await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(dir.get(id).await.is_none());
        assert_eq!(
            dir.join(id, profile("a")).await,
            Err(JoinError::RoomNotFound(id))
        );
    }
}
