//! Room events and their translation from client envelopes.

use arena_shared::protocol::{BulletWire, Envelope, EventTag};
use arena_shared::vec2::Vec2;

use crate::player::{SessionId, SlotId};

/// Work items in a room's mailbox.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    /// A connection was attached to `slot`
    Join { slot: SlotId },
    /// `None` flips the current flag
    Ready { slot: SlotId, is_ready: Option<bool> },
    Start { slot: SlotId },
    Move { slot: SlotId, direction: Vec2 },
    Shoot { slot: SlotId },
    /// Server-originated bullet snapshot; goes out as `Shoot` with the relay id.
    BulletRelay(BulletWire),
    Hit { shooter: SlotId, victim: SlotId },
    Kills { slot: SlotId },
    Kick { slot: SlotId },
    /// The socket of `session` went away without the room closing it.
    Disconnect { slot: SlotId, session: SessionId },
    Delete,
}

impl RoomEvent {
    /// Translate an envelope read from the connection seated at `own`.
    ///
    /// A missing id means the sender itself. Events only the server may
    /// produce are dropped, as are ids outside the roster.
    pub fn from_client(envelope: Envelope, own: SlotId) -> Option<Self> {
        let slot = match envelope.id {
            None => own,
            Some(id) => SlotId::try_from(id).ok()?,
        };
        let payload = envelope.payload.unwrap_or_default();

        let event = match envelope.event {
            EventTag::Ready => RoomEvent::Ready {
                slot,
                is_ready: payload.is_ready,
            },
            EventTag::Start => RoomEvent::Start { slot },
            EventTag::Move => RoomEvent::Move {
                slot,
                direction: payload.position?,
            },
            EventTag::Shoot => RoomEvent::Shoot { slot },
            EventTag::Kick | EventTag::Leave => RoomEvent::Kick { slot },
            EventTag::Join
            | EventTag::Spawn
            | EventTag::Hit
            | EventTag::Kills
            | EventTag::Delete
            | EventTag::GameOver => return None,
        };
        Some(event)
    }
}

/// Parse one inbound frame. Malformed frames yield `None`.
pub fn decode(frame: &[u8]) -> Option<Envelope> {
    match serde_json::from_slice(frame) {
        Ok(envelope) => Some(envelope),
        Err(e) => {
            tracing::debug!("Discarding malformed frame: {}", e);
            None
        }
    }
}
