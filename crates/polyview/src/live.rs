use std::time::Instant;

use roomlink::{
    ClientId, ClientMessage, LinkStatus, LiveEvent, LiveTransport, Orientation, RoomState,
    ServerMessage,
};
use tracing::{debug, error, info, warn};

use crate::interval::Interval;
use crate::presence::PresenceManager;
use crate::schema_manager::SchemaManager;
use crate::viewport::ViewportManager;
use crate::AppContext;

/// Seconds between outbound syncs.
pub const SYNC_PERIOD: f64 = 0.2;

/// The room session over `/live`: applies room-state ticks to the viewport,
/// presence and schema, and reports our camera (and any viewport edit)
/// back on a fixed cadence.
pub struct LiveManager {
    transport: Option<Box<dyn LiveTransport>>,
    client_id: Option<ClientId>,
    last_model_version: Option<u64>,
    presence: PresenceManager,
    sync: Interval,
}

impl Default for LiveManager {
    fn default() -> Self {
        Self::new(None)
    }
}

impl LiveManager {
    pub fn new(transport: Option<Box<dyn LiveTransport>>) -> Self {
        Self {
            transport,
            client_id: None,
            last_model_version: None,
            presence: PresenceManager::new(),
            sync: Interval::new(SYNC_PERIOD),
        }
    }

    pub fn client_id(&self) -> Option<&ClientId> {
        self.client_id.as_ref()
    }

    pub fn presence(&self) -> &PresenceManager {
        &self.presence
    }

    pub fn last_model_version(&self) -> Option<u64> {
        self.last_model_version
    }

    pub fn status(&self) -> LinkStatus {
        self.transport
            .as_ref()
            .map(|t| t.status())
            .unwrap_or(LinkStatus::Disconnected)
    }

    pub fn update(
        &mut self,
        now: Instant,
        time: f64,
        dt: f32,
        ctx: &mut AppContext<'_>,
        viewport: &mut ViewportManager,
        schema: &mut SchemaManager,
    ) {
        if let Some(transport) = self.transport.as_mut() {
            transport.keepalive(now);
        }

        // messages are handled strictly in arrival order
        while let Some(event) = self.transport.as_mut().and_then(|t| t.try_recv()) {
            self.handle_event(event, ctx, viewport, schema);
        }

        if self.sync.tick(time) {
            self.send_sync(ctx, viewport);
        }

        self.presence.interpolate(dt, ctx.surface);
    }

    fn handle_event(
        &mut self,
        event: LiveEvent,
        ctx: &mut AppContext<'_>,
        viewport: &mut ViewportManager,
        schema: &mut SchemaManager,
    ) {
        match event {
            LiveEvent::Opened => info!("live session opened"),
            LiveEvent::Closed => {
                warn!("live session closed");
                self.presence.clear(ctx.surface);
            }
            // the link drops without a Closed event on errors
            LiveEvent::Error(err) => {
                error!("live session: {err}");
                self.presence.clear(ctx.surface);
            }
            LiveEvent::Message(msg) => match msg {
                ServerMessage::SetClientId(id) => {
                    info!("assigned client id {id}");
                    self.client_id = Some(id);
                }
                ServerMessage::RoomStateUpdate(state) => {
                    self.apply_room_state(state, ctx, viewport, schema)
                }
                ServerMessage::RefreshGenerator(data) => debug!("refresh generator: {data}"),
                ServerMessage::Broadcast(data) => debug!("broadcast: {data}"),
                ServerMessage::Unknown(kind) => warn!("unknown live message type {kind}"),
            },
        }
    }

    fn apply_room_state(
        &mut self,
        state: RoomState,
        ctx: &mut AppContext<'_>,
        viewport: &mut ViewportManager,
        schema: &mut SchemaManager,
    ) {
        if self.last_model_version != Some(state.model_version) {
            debug!(
                "model version {:?} -> {}, refetching schema",
                self.last_model_version, state.model_version
            );
            self.last_model_version = Some(state.model_version);
            schema.refresh(ctx.requests);
        }

        if let Some(scene) = &state.web_scene {
            viewport.apply_remote(scene, ctx.panel, ctx.surface);
        }

        self.presence
            .reconcile(&state.players, self.client_id.as_ref(), ctx.surface);
    }

    fn send_sync(&mut self, ctx: &mut AppContext<'_>, viewport: &mut ViewportManager) {
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        if transport.status() != LinkStatus::Connected {
            return;
        }

        let pose = ctx.surface.camera_pose();
        transport.send(&ClientMessage::orientation(Orientation {
            position: pose.position.into(),
            rotation: pose.rotation.into(),
        }));

        if let Some(scene) = viewport.take_outbound() {
            debug!("sending viewport settings");
            transport.send(&ClientMessage::scene(scene));
        }
    }
}
