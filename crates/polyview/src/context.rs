use crate::banners::Banners;
use crate::nodes::GraphEditor;
use crate::panel::ControlPanel;
use crate::request::RequestManager;
use crate::surface::RenderSurface;

/// Flags shared between components for the duration of a frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncFlags {
    /// Set while the node manager mirrors server-side connections into the
    /// graph editor. Connection events seen while set are echoes.
    pub server_updating_node_connections: bool,
}

// This is exposed to every component of the viewer
pub struct AppContext<'a> {
    pub requests: &'a RequestManager,
    pub surface: &'a mut dyn RenderSurface,
    pub panel: &'a mut dyn ControlPanel,
    pub editor: &'a mut dyn GraphEditor,
    pub banners: &'a mut Banners,
    pub flags: &'a mut SyncFlags,
}
