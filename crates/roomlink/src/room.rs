//! Room state as broadcast by the generator server.
//!
//! Field names follow the server's JSON exactly, which mixes Go-style
//! `ModelVersion` keys on the room envelope with the browser's camelCase
//! keys inside the web scene.

use std::collections::HashMap;
use std::fmt;

use glam::{Quat, Vec3};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier the server assigns to each connected client.
///
/// Older servers send it as a number, newer ones as a string. Roster keys
/// are always strings, so both forms are normalized to text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ClientId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => ClientId(s),
            Raw::Number(n) => ClientId(n.to_string()),
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vector3> for Vec3 {
    fn from(v: Vector3) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

impl From<Vec3> for Vector3 {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quaternion {
    fn default() -> Self {
        Quat::IDENTITY.into()
    }
}

impl From<Quaternion> for Quat {
    fn from(q: Quaternion) -> Self {
        Quat::from_xyzw(q.x, q.y, q.z, q.w)
    }
}

impl From<Quat> for Quaternion {
    fn from(q: Quat) -> Self {
        Self {
            x: q.x,
            y: q.y,
            z: q.z,
            w: q.w,
        }
    }
}

/// Pose of a client's camera, sent several times per second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub position: Vector3,
    pub rotation: Quaternion,
}

/// A remote participant as it appears in the roster.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Player {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: Vector3,
    #[serde(default)]
    pub rotation: Quaternion,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fog {
    pub color: String,
    pub near: f32,
    pub far: f32,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            color: "0xa0a0a0".to_string(),
            near: 10.0,
            far: 50.0,
        }
    }
}

/// Viewport settings shared by everyone in the room.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WebScene {
    #[serde(rename = "renderWireframe", default)]
    pub render_wireframe: bool,
    #[serde(default)]
    pub fog: Fog,
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_lighting")]
    pub lighting: String,
    #[serde(default = "default_ground")]
    pub ground: String,
}

fn default_background() -> String {
    "0xa0a0a0".to_string()
}

fn default_lighting() -> String {
    "0xffffff".to_string()
}

fn default_ground() -> String {
    "0xcbcbcb".to_string()
}

impl Default for WebScene {
    fn default() -> Self {
        Self {
            render_wireframe: false,
            fog: Fog::default(),
            background: default_background(),
            lighting: default_lighting(),
            ground: default_ground(),
        }
    }
}

/// Snapshot pushed on every room tick.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RoomState {
    #[serde(rename = "ModelVersion", default)]
    pub model_version: u64,
    #[serde(rename = "WebScene", default)]
    pub web_scene: Option<WebScene>,
    /// Null entries are players that are mid-join on the server.
    #[serde(rename = "Players", default)]
    pub players: HashMap<String, Option<Player>>,
}
