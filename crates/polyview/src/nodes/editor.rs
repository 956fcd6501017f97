use crate::nodes::parameter::ParameterWidget;
use crate::request::ParameterValue;

/// One end of a connection: a node and the name of one of its ports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortRef {
    pub node: String,
    pub port: String,
}

impl PortRef {
    pub fn new(node: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            port: port.into(),
        }
    }
}

/// Everything the editor needs to draw a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeView {
    pub title: String,
    pub node_type: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub widget: Option<ParameterWidget>,
    /// Producer file this node writes; shows the Download action.
    pub producer: Option<String>,
}

/// What the user did in the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// The user asked for a new node. The node itself shows up once the
    /// server has created it and the schema comes back.
    NodeAdded { node_type: String },
    NodeRemoved { node_id: String },
    ConnectionAdded { from: PortRef, to: PortRef },
    /// An input port lost its connection.
    ConnectionRemoved { to: PortRef },
    ParameterChanged { node_id: String, value: ParameterValue },
    DownloadRequested { node_id: String },
}

/// The node-graph editor widget.
///
/// Editors report programmatic connection changes the same way as user
/// ones, so everything the node manager does here comes back as events.
pub trait GraphEditor {
    fn add_node(&mut self, id: &str, view: &NodeView);
    fn update_node(&mut self, id: &str, view: &NodeView);
    fn remove_node(&mut self, id: &str);
    fn connect(&mut self, from: &PortRef, to: &PortRef);
    fn disconnect(&mut self, to: &PortRef);
    fn set_preview(&mut self, id: &str, url: &str, bytes: &[u8]);
    fn poll_event(&mut self) -> Option<EditorEvent>;
}
