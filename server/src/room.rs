//! Room engine.
//!
//! Each room is an actor: one task drains the mailbox and handles every event
//! to completion before taking the next. Bullet tasks run beside it and only
//! read player state or post events back into the mailbox.
//!
//! Lock order is roster before player. No player lock is held while taking
//! another, and frames are only queued after every lock is released.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arena_shared::config::GameConfig;
use arena_shared::protocol::{Envelope, EventTag, Payload, PlayerProfile, PlayerWire, RELAY_ID};
use arena_shared::vec2::Vec2;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use crate::broadcast;
use crate::bullet::{self, Bullet, BulletIds};
use crate::map::WorldMap;
use crate::player::{resolve_move, Player, PlayerConn, SessionId, SlotId, MAX_PLAYERS};
use crate::protocol::RoomEvent;

pub type RoomId = u32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoomPhase {
    #[default]
    Lobby,
    Active,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("room {0} does not exist")]
    RoomNotFound(RoomId),
    #[error("game already started")]
    AlreadyStarted,
    #[error("room is full")]
    RoomFull,
}

/// Phase and slots, guarded together by the room-wide lock.
#[derive(Default)]
struct Roster {
    phase: RoomPhase,
    slots: [Option<Arc<Player>>; MAX_PLAYERS],
}

impl Roster {
    fn get(&self, slot: SlotId) -> Option<Arc<Player>> {
        self.slots[slot.index()].clone()
    }

    fn occupied(&self) -> impl Iterator<Item = &Arc<Player>> {
        self.slots.iter().flatten()
    }
}

pub struct Room {
    id: RoomId,
    config: Arc<GameConfig>,
    map: Arc<WorldMap>,
    roster: RwLock<Roster>,
    mailbox: mpsc::UnboundedSender<RoomEvent>,
    bullet_ids: BulletIds,
    next_session: AtomicU64,
}

impl Room {
    /// Create a room in the lobby. The receiver must be handed to [`Room::run`].
    pub fn new(
        id: RoomId,
        config: Arc<GameConfig>,
        map: Arc<WorldMap>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<RoomEvent>) {
        let (mailbox, rx) = mpsc::unbounded_channel();
        let room = Arc::new(Self {
            id,
            config,
            map,
            roster: RwLock::new(Roster::default()),
            mailbox,
            bullet_ids: BulletIds::default(),
            next_session: AtomicU64::new(1),
        });
        (room, rx)
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn map(&self) -> &WorldMap {
        &self.map
    }

    pub async fn phase(&self) -> RoomPhase {
        self.roster.read().await.phase
    }

    /// Queue an event. Returns false once the room has terminated.
    pub fn post(&self, event: RoomEvent) -> bool {
        self.mailbox.send(event).is_ok()
    }

    /// Seat a new player in the lowest free slot.
    pub async fn join(&self, profile: PlayerProfile) -> Result<SlotId, JoinError> {
        let mut roster = self.roster.write().await;
        match roster.phase {
            RoomPhase::Lobby => {}
            RoomPhase::Active => return Err(JoinError::AlreadyStarted),
            RoomPhase::Terminated => return Err(JoinError::RoomNotFound(self.id)),
        }
        let slot = SlotId::all()
            .find(|s| roster.slots[s.index()].is_none())
            .ok_or(JoinError::RoomFull)?;

        roster.slots[slot.index()] = Some(Arc::new(Player::new(slot, profile, &self.config)));
        info!("Player {} seated in room {}", slot, self.id);
        Ok(slot)
    }

    /// Give a seated player its connection and return the session it is
    /// known by. Fails if the slot is empty or already has a connection.
    pub async fn attach(&self, slot: SlotId, conn: PlayerConn) -> Option<SessionId> {
        let roster = self.roster.read().await;
        let player = roster.get(slot)?;
        let mut state = player.lock().await;
        if state.conn.is_some() {
            return None;
        }
        let session = self.next_session.fetch_add(1, Ordering::Relaxed);
        state.conn = Some(conn);
        state.session = Some(session);
        Some(session)
    }

    pub async fn is_seated(&self, slot: SlotId) -> bool {
        self.roster.read().await.get(slot).is_some()
    }

    /// Seated players that currently hold a connection
    pub async fn connected_count(&self) -> usize {
        let roster = self.roster.read().await;
        let mut count = 0;
        for player in roster.occupied() {
            if player.lock().await.conn.is_some() {
                count += 1;
            }
        }
        count
    }

    /// Positions of living players other than `shooter`, in slot order.
    pub async fn targets_excluding(&self, shooter: SlotId) -> Vec<(SlotId, Vec2)> {
        let roster = self.roster.read().await;
        let mut targets = Vec::new();
        for player in roster.occupied().filter(|p| p.id != shooter) {
            let state = player.lock().await;
            if state.is_alive() {
                targets.push((player.id, state.position));
            }
        }
        targets
    }

    pub async fn players_snapshot(&self) -> Vec<PlayerWire> {
        let roster = self.roster.read().await;
        let mut players = Vec::with_capacity(MAX_PLAYERS);
        for player in roster.occupied() {
            players.push(player.snapshot().await);
        }
        players
    }

    /// Drain the mailbox until the room terminates.
    pub async fn run(self: Arc<Self>, mut mailbox: mpsc::UnboundedReceiver<RoomEvent>) {
        info!("Room {} opened", self.id);
        while let Some(event) = mailbox.recv().await {
            if self.handle(event).await.is_break() {
                break;
            }
        }
        mailbox.close();
        info!("Room {} terminated", self.id);
    }

    async fn handle(self: &Arc<Self>, event: RoomEvent) -> ControlFlow<()> {
        match event {
            RoomEvent::Join { slot } => self.on_join(slot).await,
            RoomEvent::Ready { slot, is_ready } => self.on_ready(slot, is_ready).await,
            RoomEvent::Start { slot } => self.on_start(slot).await,
            RoomEvent::Move { slot, direction } => self.on_move(slot, direction).await,
            RoomEvent::Shoot { slot } => self.on_shoot(slot).await,
            RoomEvent::BulletRelay(bullet) => {
                let msg = Envelope::new(EventTag::Shoot)
                    .with_id(RELAY_ID)
                    .with_payload(Payload {
                        bullet: Some(bullet),
                        ..Default::default()
                    });
                self.broadcast(&msg).await;
            }
            RoomEvent::Hit { shooter, victim } => self.on_hit(shooter, victim).await,
            RoomEvent::Kills { slot } => self.on_kills(slot).await,
            RoomEvent::Kick { slot } => return self.on_kick(slot).await,
            RoomEvent::Disconnect { slot, session } => {
                return self.on_disconnect(slot, session).await
            }
            RoomEvent::Delete => return self.shutdown().await,
        }
        ControlFlow::Continue(())
    }

    async fn player(&self, slot: SlotId) -> Option<Arc<Player>> {
        self.roster.read().await.get(slot)
    }

    async fn on_join(&self, slot: SlotId) {
        if !self.is_seated(slot).await {
            return;
        }
        let msg = Envelope::new(EventTag::Join)
            .with_id(slot.wire_id())
            .with_payload(Payload {
                players: self.players_snapshot().await,
                ..Default::default()
            });
        self.broadcast(&msg).await;
    }

    async fn on_ready(&self, slot: SlotId, is_ready: Option<bool>) {
        let Some(player) = self.player(slot).await else {
            return;
        };
        let is_ready = {
            let mut state = player.lock().await;
            state.is_ready = is_ready.unwrap_or(!state.is_ready);
            state.is_ready
        };
        let msg = Envelope::new(EventTag::Ready)
            .with_id(slot.wire_id())
            .with_payload(Payload {
                is_ready: Some(is_ready),
                ..Default::default()
            });
        self.broadcast(&msg).await;
    }

    async fn on_start(&self, slot: SlotId) {
        {
            let mut roster = self.roster.write().await;
            if roster.get(slot).is_none() {
                return;
            }
            if roster.phase != RoomPhase::Lobby {
                warn!("Room {} ignoring start from {} in {:?}", self.id, slot, roster.phase);
                return;
            }
            roster.phase = RoomPhase::Active;
        }
        info!("Room {} started by player {}", self.id, slot);

        self.broadcast(&Envelope::new(EventTag::Start).with_id(slot.wire_id()))
            .await;

        let spawn = Envelope::new(EventTag::Spawn).with_payload(Payload {
            players: self.players_snapshot().await,
            map: Some(self.map.to_wire()),
            ..Default::default()
        });
        self.broadcast(&spawn).await;
    }

    async fn on_move(&self, slot: SlotId, direction: Vec2) {
        let Some(player) = self.player(slot).await else {
            return;
        };
        let movement = {
            let mut state = player.lock().await;
            if state.conn.is_none() {
                return;
            }
            let m = resolve_move(&self.map, &self.config, state.position, direction);
            state.position = m.position;
            state.rotation = m.rotation;
            state.in_grass = m.in_grass;
            m
        };
        if movement.collided {
            debug!("Room {} player {} blocked at {:?}", self.id, slot, movement.position);
        }

        let msg = Envelope::new(EventTag::Move)
            .with_id(slot.wire_id())
            .with_payload(Payload {
                position: Some(movement.position),
                rotation: Some(movement.rotation),
                in_grass: Some(movement.in_grass),
                ..Default::default()
            });
        self.broadcast(&msg).await;
    }

    async fn on_shoot(self: &Arc<Self>, slot: SlotId) {
        let Some(player) = self.player(slot).await else {
            return;
        };
        let (position, rotation) = {
            let state = player.lock().await;
            if !state.is_alive() {
                return;
            }
            (state.position, state.rotation)
        };

        let bullet = Bullet::new(self.bullet_ids.next(), position, rotation);
        let msg = Envelope::new(EventTag::Shoot)
            .with_id(slot.wire_id())
            .with_payload(Payload {
                bullet: Some(bullet.to_wire()),
                ..Default::default()
            });
        self.broadcast(&msg).await;

        debug!("Room {} bullet {} fired by {}", self.id, bullet.id, slot);
        tokio::spawn(bullet::run(Arc::clone(self), slot, bullet));
    }

    async fn on_hit(&self, shooter: SlotId, victim: SlotId) {
        let Some(player) = self.player(victim).await else {
            return;
        };
        let health = {
            let mut state = player.lock().await;
            if !state.is_alive() {
                return;
            }
            state.health = (state.health - self.config.bullet_damage).max(0);
            state.health
        };

        if health == 0 {
            info!("Room {} player {} eliminated by {}", self.id, victim, shooter);
            // Credit first so a game-over triggered by the kick still reports it.
            self.post(RoomEvent::Kills { slot: shooter });
            self.post(RoomEvent::Kick { slot: victim });
        } else {
            let msg = Envelope::new(EventTag::Hit)
                .with_id(victim.wire_id())
                .with_payload(Payload {
                    health: Some(health),
                    ..Default::default()
                });
            self.broadcast(&msg).await;
        }
    }

    async fn on_kills(&self, slot: SlotId) {
        let Some(player) = self.player(slot).await else {
            return;
        };
        let (kills, conn) = {
            let mut state = player.lock().await;
            state.kills += 1;
            (state.kills, state.conn.clone())
        };

        let msg = Envelope::new(EventTag::Kills)
            .with_id(slot.wire_id())
            .with_payload(Payload {
                kills: Some(kills),
                ..Default::default()
            });
        if let (Some(conn), Some(frame)) = (conn, broadcast::encode(&msg)) {
            broadcast::deliver(slot, &conn, frame);
        }
    }

    async fn on_kick(&self, slot: SlotId) -> ControlFlow<()> {
        if !self.remove_player(slot).await {
            return ControlFlow::Continue(());
        }
        info!("Room {} player {} removed", self.id, slot);
        self.broadcast(&Envelope::new(EventTag::Kick).with_id(slot.wire_id()))
            .await;

        let phase = self.phase().await;
        if slot.is_owner() && phase == RoomPhase::Lobby {
            info!("Room {} owner left the lobby, closing", self.id);
            return self.shutdown().await;
        }
        if phase == RoomPhase::Active && self.connected_count().await <= 1 {
            info!("Room {} game over", self.id);
            return self.shutdown().await;
        }
        ControlFlow::Continue(())
    }

    async fn on_disconnect(&self, slot: SlotId, session: SessionId) -> ControlFlow<()> {
        let current = match self.player(slot).await {
            Some(player) => player.lock().await.session,
            None => None,
        };
        if current != Some(session) {
            debug!(
                "Room {} ignoring stale disconnect of session {} in slot {}",
                self.id, session, slot
            );
            return ControlFlow::Continue(());
        }
        self.on_kick(slot).await
    }

    /// Clear a slot and close its connection with a final `Kick` carrying
    /// the player's kills. Returns false if the slot was already empty.
    async fn remove_player(&self, slot: SlotId) -> bool {
        let (conn, kills) = {
            let mut roster = self.roster.write().await;
            let Some(player) = roster.get(slot) else {
                return false;
            };
            let taken = {
                let mut state = player.lock().await;
                (state.conn.take(), state.kills)
            };
            roster.slots[slot.index()] = None;
            taken
        };

        if let Some(conn) = conn {
            let last = Envelope::new(EventTag::Kick)
                .with_id(slot.wire_id())
                .with_payload(Payload {
                    kills: Some(kills),
                    ..Default::default()
                });
            broadcast::close(slot, conn, broadcast::encode(&last));
        }
        true
    }

    /// Remove everyone and stop the mailbox.
    async fn shutdown(&self) -> ControlFlow<()> {
        self.roster.write().await.phase = RoomPhase::Terminated;
        for slot in SlotId::all() {
            self.remove_player(slot).await;
        }
        ControlFlow::Break(())
    }

    /// Encode once and queue for every connected player.
    pub async fn broadcast(&self, envelope: &Envelope) {
        let Some(frame) = broadcast::encode(envelope) else {
            return;
        };
        let recipients = self.recipients().await;
        let delivered = broadcast::fan_out(&frame, &recipients);
        if delivered < recipients.len() {
            debug!(
                "Room {} {:?} reached {} of {} players",
                self.id,
                envelope.event,
                delivered,
                recipients.len()
            );
        }
    }

    async fn recipients(&self) -> Vec<(SlotId, PlayerConn)> {
        let roster = self.roster.read().await;
        let mut recipients = Vec::with_capacity(MAX_PLAYERS);
        for player in roster.occupied() {
            if let Some(conn) = player.lock().await.conn.clone() {
                recipients.push((player.id, conn));
            }
        }
        recipients
    }
}
