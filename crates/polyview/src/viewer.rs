use std::sync::Arc;
use std::time::Instant;

use roomlink::{LiveTransport, WebScene};
use tracing::{error, info};

use crate::file_controls::{parse_profile, FileControls};
use crate::live::LiveManager;
use crate::nodes::NodeManager;
use crate::observer::Subscription;
use crate::profile_panel::ProfilePanel;
use crate::refresh::SchemaRefreshManager;
use crate::restart::StartedWatcher;
use crate::schema_manager::{SchemaEvent, SchemaManager};
use crate::viewport::ViewportManager;
use crate::{AppContext, Profile, RequestManager, Result, Schema, ViewerOptions};

/// Things only the host can do for the viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerAction {
    /// Hand these bytes to the user as a download.
    SaveFile { name: String, bytes: Vec<u8> },
    /// Ask the user for a profile to import.
    PickProfileFile,
    OpenUrl(String),
    /// Throw everything away and start over.
    Reload,
}

pub struct Viewer {
    options: ViewerOptions,
    schema: SchemaManager,
    merged: Subscription<Arc<Schema>>,
    refresh: SchemaRefreshManager,
    viewport: ViewportManager,
    live: LiveManager,
    nodes: NodeManager,
    profile_panel: ProfilePanel,
    files: FileControls,
    restart: StartedWatcher,
}

impl Viewer {
    pub fn new(live: Option<Box<dyn LiveTransport>>, options: ViewerOptions) -> Self {
        let mut schema = SchemaManager::new();
        let mut refresh = SchemaRefreshManager::new();
        let merged = schema.subscribe();
        let nodes = NodeManager::new(schema.subscribe(), refresh.subscribe_images());

        let live = if options.contains(ViewerOptions::LiveSession) {
            live
        } else {
            None
        };

        Self {
            options,
            schema,
            merged,
            refresh,
            viewport: ViewportManager::new(WebScene::default()),
            live: LiveManager::new(live),
            nodes,
            profile_panel: ProfilePanel::new(),
            files: FileControls::new(),
            restart: StartedWatcher::new(),
        }
    }

    pub fn options(&self) -> ViewerOptions {
        self.options
    }

    pub fn schema(&self) -> &SchemaManager {
        &self.schema
    }

    pub fn refresh(&self) -> &SchemaRefreshManager {
        &self.refresh
    }

    pub fn viewport(&self) -> &ViewportManager {
        &self.viewport
    }

    pub fn live(&self) -> &LiveManager {
        &self.live
    }

    pub fn nodes(&self) -> &NodeManager {
        &self.nodes
    }

    pub fn profile_panel(&self) -> &ProfilePanel {
        &self.profile_panel
    }

    /// Build the static panel folders, push the initial viewport settings
    /// into the scene and kick off the first schema load.
    pub fn start(&mut self, ctx: &mut AppContext<'_>) {
        info!("starting viewer against {}", ctx.requests.base());
        self.viewport.register_controls(ctx.panel);
        self.files.register_controls(ctx.panel);
        self.viewport.apply_all(ctx.surface);
        self.schema.load(ctx.requests);
    }

    /// Import a profile the user picked. The viewer asks for a reload once
    /// the server has accepted it.
    pub fn load_profile(&mut self, requests: &RequestManager, bytes: &[u8]) -> Result<()> {
        self.import_profile(requests, parse_profile(bytes)?);
        Ok(())
    }

    pub fn import_profile(&mut self, requests: &RequestManager, profile: Profile) {
        self.schema.replace_profile(requests, profile);
    }

    pub fn update(
        &mut self,
        ctx: &mut AppContext<'_>,
        now: Instant,
        time: f64,
        dt: f32,
    ) -> Vec<ViewerAction> {
        let mut actions = Vec::new();

        self.route_panel_events(ctx, &mut actions);

        for event in self.schema.poll(ctx.requests) {
            match event {
                // subscribers pick these up below
                SchemaEvent::Merged(_) => {}
                SchemaEvent::ReloadRequested => actions.push(ViewerAction::Reload),
                SchemaEvent::Failed(err) => {
                    ctx.banners.show_error(err.user_message());
                }
            }
        }

        if let Some(schema) = self.merged.latest() {
            self.refresh.new_schema(ctx, schema);
        }
        self.refresh
            .set_wireframe(self.viewport.settings().render_wireframe);
        self.refresh.poll(ctx);

        self.live
            .update(now, time, dt, ctx, &mut self.viewport, &mut self.schema);

        actions.extend(self.nodes.update(ctx, &mut self.schema));

        if let Err(err) = self.profile_panel.sync(ctx.panel, &self.schema) {
            error!("building profile controls: {err}");
            ctx.banners.show_error(err.user_message());
        }

        actions.extend(self.files.poll(ctx));

        if self.options.contains(ViewerOptions::RestartWatch)
            && self.restart.poll(ctx.requests, time)
        {
            actions.push(ViewerAction::Reload);
        }

        actions
    }

    fn route_panel_events(&mut self, ctx: &mut AppContext<'_>, actions: &mut Vec<ViewerAction>) {
        while let Some(event) = ctx.panel.poll_event() {
            if self.viewport.on_panel_event(&event, ctx.surface) {
                continue;
            }

            match self
                .profile_panel
                .on_panel_event(&event, ctx.requests, &mut self.schema)
            {
                Ok(true) => continue,
                Ok(false) => {}
                Err(err) => {
                    ctx.banners.show_error(err.user_message());
                    continue;
                }
            }

            if let Some(action) = self.files.on_panel_event(&event, ctx, self.schema.profile()) {
                actions.push(action);
            }
        }
    }
}
