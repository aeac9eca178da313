use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::vec2::Vec2;

/// Wire id used on server-relayed bullet snapshots, which have no acting player.
pub const RELAY_ID: i32 = 255;

// === WebSocket envelope (both directions) ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../frontend/src/types/generated/")]
pub enum EventTag {
    Join,
    Ready,
    Leave,
    Spawn,
    Move,
    Shoot,
    Hit,
    Kick,
    Start,
    Delete,
    Kills,
    #[serde(rename = "Game Over")]
    GameOver,
}

/// One message per frame. `id` is the acting or target slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../frontend/src/types/generated/")]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    pub event: EventTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

impl Envelope {
    pub fn new(event: EventTag) -> Self {
        Self {
            id: None,
            event,
            payload: None,
        }
    }

    pub fn with_id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Carries exactly the fields relevant to the event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../frontend/src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub players: Vec<PlayerWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullet: Option<BulletWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kills: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_ready: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<MapWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_grass: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../frontend/src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PlayerWire {
    pub id: i32,
    pub health: i32,
    pub is_ready: bool,
    pub kills: i32,
    pub rotation: f64,
    pub position: Vec2,
    pub name: String,
    pub color: String,
    pub in_grass: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../frontend/src/types/generated/")]
pub struct BulletWire {
    pub id: f64,
    pub position: Vec2,
    pub rotation: f64,
    #[serde(default)]
    pub expired: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../frontend/src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct MapWire {
    pub obstacles: Vec<ObstacleWire>,
    pub grass_patches: Vec<GrassPatchWire>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../frontend/src/types/generated/")]
pub struct ObstacleWire {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../frontend/src/types/generated/")]
pub struct GrassPatchWire {
    pub x: u32,
    pub y: u32,
    pub radius: u32,
}

// === HTTP room API ===

/// Body of both the create and the join request.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../frontend/src/types/generated/")]
pub struct PlayerProfile {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Color")]
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../frontend/src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    pub room_id: u32,
    pub player_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../frontend/src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomResponse {
    pub player_id: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_over_tag_has_space() {
        let json = serde_json::to_string(&Envelope::new(EventTag::GameOver)).unwrap();
        assert_eq!(json, r#"{"event":"Game Over"}"#);
    }

    #[test]
    fn empty_payload_fields_are_omitted() {
        let msg = Envelope::new(EventTag::Hit).with_id(1).with_payload(Payload {
            health: Some(90),
            ..Default::default()
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"id":1,"event":"Hit","payload":{"health":90}}"#);
    }

    #[test]
    fn client_move_parses_without_id() {
        let json = r#"{"event":"Move","payload":{"position":{"x":1.0,"y":-1.0},"players":[]}}"#;
        let msg: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, None);
        assert_eq!(msg.event, EventTag::Move);
        let position = msg.payload.unwrap().position.unwrap();
        assert_eq!(position, Vec2::new(1.0, -1.0));
    }

    #[test]
    fn ready_payload_uses_camel_case() {
        let json = r#"{"event":"Ready","payload":{"isReady":true}}"#;
        let msg: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(msg.payload.unwrap().is_ready, Some(true));
    }

    #[test]
    fn unknown_event_is_rejected() {
        let json = r#"{"event":"Teleport"}"#;
        assert!(serde_json::from_str::<Envelope>(json).is_err());
    }

    #[test]
    fn spawn_map_uses_grass_patches_key() {
        let msg = Envelope::new(EventTag::Spawn).with_payload(Payload {
            map: Some(MapWire {
                obstacles: vec![ObstacleWire {
                    x: 900,
                    y: 650,
                    width: 200,
                    height: 200,
                }],
                grass_patches: vec![GrassPatchWire {
                    x: 10,
                    y: 20,
                    radius: 30,
                }],
            }),
            ..Default::default()
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"grassPatches\":[{\"x\":10,\"y\":20,\"radius\":30}]"));
    }

    #[test]
    fn player_snapshot_roundtrip() {
        let player = PlayerWire {
            id: 1,
            health: 90,
            is_ready: true,
            kills: 2,
            rotation: 0.5,
            position: Vec2::new(800.0, 550.0),
            name: "ash".to_string(),
            color: "#ff6600".to_string(),
            in_grass: false,
        };
        let json = serde_json::to_string(&player).unwrap();
        assert!(json.contains("\"isReady\":true"));
        assert!(json.contains("\"inGrass\":false"));
        let parsed: PlayerWire = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, player);
    }

    #[test]
    fn profile_accepts_capitalized_keys() {
        let profile: PlayerProfile =
            serde_json::from_str(r##"{"Name":"ash","Color":"#00ff00"}"##).unwrap();
        assert_eq!(profile.name, "ash");
        assert_eq!(profile.color, "#00ff00");
    }
}
