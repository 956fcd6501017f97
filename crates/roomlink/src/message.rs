use crate::room::{ClientId, Orientation, RoomState, WebScene};
use crate::{Error, Result};

use ewebsock::{WsEvent, WsMessage};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages sent by the server over `/live`
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    SetClientId(ClientId),
    RoomStateUpdate(RoomState),
    RefreshGenerator(Value),
    Broadcast(Value),
    /// A message type this client doesn't know about yet
    Unknown(String),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

impl ServerMessage {
    pub fn from_json(msg: &str) -> Result<ServerMessage> {
        if msg.is_empty() {
            return Err(Error::Empty);
        }

        let envelope: Envelope = serde_json::from_str(msg)?;
        Ok(match envelope.kind.as_str() {
            "Server-SetClientID" => {
                ServerMessage::SetClientId(serde_json::from_value(envelope.data)?)
            }
            "Server-RoomStateUpdate" => {
                ServerMessage::RoomStateUpdate(serde_json::from_value(envelope.data)?)
            }
            "Server-RefreshGenerator" => ServerMessage::RefreshGenerator(envelope.data),
            "Server-Broadcast" => ServerMessage::Broadcast(envelope.data),
            _ => ServerMessage::Unknown(envelope.kind),
        })
    }
}

/// Messages sent by clients, received by the room hub
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    #[serde(rename = "Client-SetOrientation")]
    SetOrientation(Orientation),
    #[serde(rename = "Client-SetScene")]
    SetScene(WebScene),
}

impl ClientMessage {
    pub fn orientation(orientation: Orientation) -> Self {
        ClientMessage::SetOrientation(orientation)
    }

    pub fn scene(scene: WebScene) -> Self {
        ClientMessage::SetScene(scene)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Everything a live transport can hand back to the session
#[derive(Debug)]
pub enum LiveEvent {
    Opened,
    Closed,
    Error(Error),
    Message(ServerMessage),
}

impl From<WsEvent> for LiveEvent {
    fn from(event: WsEvent) -> LiveEvent {
        match event {
            WsEvent::Opened => LiveEvent::Opened,
            WsEvent::Closed => LiveEvent::Closed,
            WsEvent::Error(s) => LiveEvent::Error(Error::Generic(s)),
            WsEvent::Message(msg) => msg.into(),
        }
    }
}

impl From<WsMessage> for LiveEvent {
    fn from(msg: WsMessage) -> LiveEvent {
        match msg {
            WsMessage::Text(s) => match ServerMessage::from_json(&s) {
                Ok(msg) => LiveEvent::Message(msg),
                Err(err) => LiveEvent::Error(err),
            },
            WsMessage::Binary(_) => LiveEvent::Error(Error::Binary),
            other => LiveEvent::Error(Error::Generic(format!("unhandled frame {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::{Quaternion, Vector3};
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_client_id() {
        let msg = ServerMessage::from_json(r#"{"type":"Server-SetClientID","data":"abc"}"#);
        assert_eq!(msg.unwrap(), ServerMessage::SetClientId(ClientId::new("abc")));
    }

    #[test]
    fn parses_room_state_update() {
        let msg = ServerMessage::from_json(
            r#"{"type":"Server-RoomStateUpdate","data":{"ModelVersion":2,"Players":{}}}"#,
        )
        .unwrap();

        let ServerMessage::RoomStateUpdate(state) = msg else {
            panic!("expected room state");
        };
        assert_eq!(state.model_version, 2);
        assert!(state.web_scene.is_none());
    }

    #[test]
    fn extension_messages_dispatch_without_data() {
        assert_eq!(
            ServerMessage::from_json(r#"{"type":"Server-RefreshGenerator"}"#).unwrap(),
            ServerMessage::RefreshGenerator(Value::Null)
        );
        assert_eq!(
            ServerMessage::from_json(r#"{"type":"Server-Broadcast","data":{"hi":1}}"#).unwrap(),
            ServerMessage::Broadcast(serde_json::json!({"hi": 1}))
        );
        assert_eq!(
            ServerMessage::from_json(r#"{"type":"Server-Whatever"}"#).unwrap(),
            ServerMessage::Unknown("Server-Whatever".to_string())
        );
    }

    #[test]
    fn empty_and_garbage_messages_error() {
        assert!(matches!(ServerMessage::from_json(""), Err(Error::Empty)));
        assert!(matches!(
            ServerMessage::from_json("not json"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn orientation_serializes_with_type_tag() {
        let msg = ClientMessage::orientation(Orientation {
            position: Vector3 {
                x: 1.0,
                y: 2.0,
                z: 3.0,
            },
            rotation: Quaternion::default(),
        });

        let json: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "Client-SetOrientation",
                "data": {
                    "position": {"x": 1.0, "y": 2.0, "z": 3.0},
                    "rotation": {"x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0}
                }
            })
        );
    }

    #[test]
    fn scene_serializes_viewport_keys() {
        let json: Value =
            serde_json::from_str(&ClientMessage::scene(WebScene::default()).to_json().unwrap())
                .unwrap();
        assert_eq!(json["type"], "Client-SetScene");
        assert_eq!(json["data"]["renderWireframe"], false);
        assert_eq!(json["data"]["fog"]["near"], 10.0);
    }
}
