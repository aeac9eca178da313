//! Serialize-once fan-out to player connections.
//!
//! Delivery is a non-blocking enqueue on each player's outbound queue, so a
//! stalled connection only ever loses its own frames.

use arena_shared::protocol::Envelope;
use bytes::Bytes;
use tokio::sync::mpsc::error::TrySendError;

use crate::player::{Outbound, PlayerConn, SlotId};

/// Encode an envelope into a frame that can be cloned cheaply per recipient.
pub fn encode(envelope: &Envelope) -> Option<Bytes> {
    match serde_json::to_vec(envelope) {
        Ok(buf) => Some(Bytes::from(buf)),
        Err(e) => {
            tracing::warn!("Dropping {:?} event, encode failed: {}", envelope.event, e);
            None
        }
    }
}

/// Queue `frame` for one player. Returns false if it was dropped.
pub fn deliver(slot: SlotId, conn: &PlayerConn, frame: Bytes) -> bool {
    match conn.try_send(Outbound::Frame(frame)) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            tracing::debug!("Player {} outbound queue full, frame dropped", slot);
            false
        }
        Err(TrySendError::Closed(_)) => {
            tracing::debug!("Player {} connection closed, frame dropped", slot);
            false
        }
    }
}

/// Queue the same frame for every recipient. Returns how many accepted it.
pub fn fan_out(frame: &Bytes, recipients: &[(SlotId, PlayerConn)]) -> usize {
    recipients
        .iter()
        .filter(|(slot, conn)| deliver(*slot, conn, frame.clone()))
        .count()
}

/// Send a last frame, then ask the writer to close the connection.
///
/// Consumes the handle: once every sender is gone the writer drains its
/// queue and stops, so a full queue still ends in a close.
pub fn close(slot: SlotId, conn: PlayerConn, last: Option<Bytes>) {
    if let Some(frame) = last {
        deliver(slot, &conn, frame);
    }
    if conn.try_send(Outbound::Close).is_err() {
        tracing::debug!("Player {} close deferred to queue drain", slot);
    }
}
