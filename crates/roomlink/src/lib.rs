mod connection;
mod error;
mod message;
mod room;

pub use connection::{live_url, Backoff, LinkStatus, LiveConnection, LiveTransport};
pub use error::Error;
pub use ewebsock;
pub use message::{ClientMessage, LiveEvent, ServerMessage};
pub use room::{ClientId, Fog, Orientation, Player, Quaternion, RoomState, Vector3, WebScene};

pub type Result<T> = std::result::Result<T, error::Error>;
