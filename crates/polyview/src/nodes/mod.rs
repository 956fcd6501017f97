//! Mirrors the generator's node graph into the graph editor and turns user
//! edits in the editor back into server mutations.

mod controller;
mod editor;
mod parameter;

pub use controller::PolyNodeController;
pub use editor::{EditorEvent, GraphEditor, NodeView, PortRef};
pub use parameter::{build_parameter, ParameterWidget};

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use poll_promise::Promise;
use regex::Regex;
use tracing::{debug, error, info};

use crate::observer::Subscription;
use crate::refresh::ProducerImage;
use crate::request::{take_ready, CreatedNode, NodeConnection, NodeInput};
use crate::schema_manager::SchemaManager;
use crate::viewer::ViewerAction;
use crate::{AppContext, Error, Result, Schema};

fn title_rules() -> &'static [(Regex, &'static str)] {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (r"(_)+", " "),
            (r"([a-z])([A-Z][a-z])", "${1} ${2}"),
            (r"([A-Z][a-z])([A-Z])", "${1} ${2}"),
            (r"([a-z])([A-Z]+[a-z])", "${1} ${2}"),
            (r"([A-Z]+)([A-Z][a-z][a-z])", "${1} ${2}"),
            (r"([a-z]+)([A-Z0-9]+)", "${1} ${2}"),
            (r"([A-Z]+)([A-Z][a-rt-z][a-z]*)", "${1} ${2}"),
            (r"([0-9])([A-Z][a-z]+)", "${1} ${2}"),
            (r"([A-Z]{2,})([0-9]{2,})", "${1} ${2}"),
            (r"([0-9]{2,})([A-Z]{2,})", "${1} ${2}"),
        ]
        .into_iter()
        .filter_map(|(pattern, rep)| Regex::new(pattern).ok().map(|re| (re, rep)))
        .collect()
    })
}

/// Split a camelCase or snake_case identifier into capitalized words.
pub fn words(name: &str) -> String {
    let mut out = name.to_owned();
    for (re, rep) in title_rules() {
        out = re.replace_all(&out, *rep).into_owned();
    }

    let out = out.trim();
    let mut chars = out.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Display title for a node type such as `basics.TextNodeData` or
/// `parameter.Value[float64]`.
pub fn node_title(node_type: &str) -> String {
    let (base, generic) = match node_type.split_once('[') {
        Some((base, rest)) => (base, rest.strip_suffix(']').unwrap_or(rest)),
        None => (node_type, ""),
    };
    let short = base.rsplit('.').next().unwrap_or(base);

    let mut title = words(short);
    for suffix in [" Node Data", " Node", "NodeData"] {
        if let Some(stripped) = title.strip_suffix(suffix) {
            title = stripped.to_owned();
            break;
        }
    }

    if generic.is_empty() {
        title
    } else {
        let generic_short = generic.rsplit('.').next().unwrap_or(generic);
        format!("{title} ({generic_short})")
    }
}

/// Owns one [`PolyNodeController`] per schema node.
pub struct NodeManager {
    controllers: IndexMap<String, PolyNodeController>,
    /// Server-side connections, input port -> upstream output port.
    connections: BTreeMap<PortRef, PortRef>,
    deferred: VecDeque<EditorEvent>,
    schemas: Subscription<Arc<Schema>>,
    images: Subscription<ProducerImage>,
    mutations: Vec<Option<Promise<Result<()>>>>,
    creations: Vec<Option<Promise<Result<CreatedNode>>>>,
    downloads: Vec<(String, Option<Promise<Result<Vec<u8>>>>)>,
}

impl NodeManager {
    pub fn new(schemas: Subscription<Arc<Schema>>, images: Subscription<ProducerImage>) -> Self {
        Self {
            controllers: IndexMap::new(),
            connections: BTreeMap::new(),
            deferred: VecDeque::new(),
            schemas,
            images,
            mutations: Vec::new(),
            creations: Vec::new(),
            downloads: Vec::new(),
        }
    }

    pub fn controller(&self, id: &str) -> Option<&PolyNodeController> {
        self.controllers.get(id)
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn connections(&self) -> &BTreeMap<PortRef, PortRef> {
        &self.connections
    }

    /// Run once per frame.
    pub fn update(
        &mut self,
        ctx: &mut AppContext<'_>,
        schema: &mut SchemaManager,
    ) -> Vec<ViewerAction> {
        self.poll_editor(ctx, schema);

        if let Some(latest) = self.schemas.latest() {
            if let Err(err) = self.apply_schema(ctx, &latest) {
                error!("mirroring node graph: {err}");
                ctx.banners.show_error(err.user_message());
            }
        }

        for image in self.images.drain() {
            let target = self
                .controllers
                .values()
                .find(|c| c.producer() == Some(image.name.as_str()));
            if let Some(controller) = target {
                ctx.editor.set_preview(controller.id(), &image.url, &image.bytes);
            }
        }

        self.poll_requests(ctx, schema)
    }

    /// Bring the editor in line with `schema`. Connection events the editor
    /// raises while this runs are our own changes coming back and are
    /// dropped.
    pub fn apply_schema(&mut self, ctx: &mut AppContext<'_>, schema: &Schema) -> Result<()> {
        ctx.flags.server_updating_node_connections = true;
        let result = self.mirror(ctx, schema);

        while let Some(event) = ctx.editor.poll_event() {
            match event {
                EditorEvent::ConnectionAdded { .. } | EditorEvent::ConnectionRemoved { .. } => {
                    debug!("ignoring echoed {event:?}");
                }
                other => self.deferred.push_back(other),
            }
        }

        ctx.flags.server_updating_node_connections = false;
        result
    }

    /// Every controller is built before the editor is touched, so a node
    /// that fails to build leaves the editor and `connections` unchanged.
    fn mirror(&mut self, ctx: &mut AppContext<'_>, schema: &Schema) -> Result<()> {
        let mut rebuilt = Vec::with_capacity(schema.nodes.len());
        for (id, node) in &schema.nodes {
            let producer = schema.producer_name(id, &node.name);
            rebuilt.push(PolyNodeController::new(id, node, producer)?);
        }

        let mut wanted = BTreeMap::new();
        for (id, node) in &schema.nodes {
            for dep in &node.dependencies {
                wanted.insert(
                    PortRef::new(id.as_str(), dep.name.as_str()),
                    PortRef::new(dep.dependency_id.as_str(), dep.dependency_port.as_str()),
                );
            }
        }

        for (to, from) in &self.connections {
            if wanted.get(to) != Some(from) {
                ctx.editor.disconnect(to);
            }
        }

        let gone: Vec<String> = self
            .controllers
            .keys()
            .filter(|id| !schema.nodes.contains_key(*id))
            .cloned()
            .collect();
        for id in gone {
            debug!("removing node {id}");
            ctx.editor.remove_node(&id);
            self.controllers.shift_remove(&id);
        }

        for controller in rebuilt {
            match self.controllers.get_mut(controller.id()) {
                Some(existing) => {
                    if existing.update(controller) {
                        ctx.editor.update_node(existing.id(), existing.view());
                    }
                }
                None => {
                    ctx.editor.add_node(controller.id(), controller.view());
                    self.controllers
                        .insert(controller.id().to_owned(), controller);
                }
            }
        }

        for (to, from) in &wanted {
            if self.connections.get(to) != Some(from) {
                ctx.editor.connect(from, to);
            }
        }
        self.connections = wanted;

        Ok(())
    }

    fn poll_editor(&mut self, ctx: &mut AppContext<'_>, schema: &mut SchemaManager) {
        while let Some(event) = self
            .deferred
            .pop_front()
            .or_else(|| ctx.editor.poll_event())
        {
            self.handle_event(event, ctx, schema);
        }
    }

    fn handle_event(
        &mut self,
        event: EditorEvent,
        ctx: &mut AppContext<'_>,
        schema: &mut SchemaManager,
    ) {
        let is_connection = matches!(
            event,
            EditorEvent::ConnectionAdded { .. } | EditorEvent::ConnectionRemoved { .. }
        );
        if is_connection && ctx.flags.server_updating_node_connections {
            debug!("ignoring {event:?} during server update");
            return;
        }

        match event {
            EditorEvent::NodeAdded { node_type } => {
                info!("creating {node_type} node");
                self.creations.push(Some(ctx.requests.create_node(&node_type)));
            }

            EditorEvent::NodeRemoved { node_id } => {
                info!("deleting node {node_id}");
                self.connections
                    .retain(|to, from| to.node != node_id && from.node != node_id);
                self.mutations.push(Some(ctx.requests.delete_node(&node_id)));
            }

            EditorEvent::ConnectionAdded { from, to } => {
                if self.connections.get(&to) == Some(&from) {
                    return;
                }
                let connection = NodeConnection {
                    out_node: from.node.clone(),
                    out_port: from.port.clone(),
                    in_node: to.node.clone(),
                    in_port: to.port.clone(),
                };
                self.connections.insert(to, from);
                self.mutations
                    .push(Some(ctx.requests.set_node_input_connection(&connection)));
            }

            EditorEvent::ConnectionRemoved { to } => {
                if self.connections.remove(&to).is_none() {
                    return;
                }
                let input = NodeInput {
                    node: to.node,
                    in_port: to.port,
                };
                self.mutations.push(Some(ctx.requests.delete_node_input(&input)));
            }

            EditorEvent::ParameterChanged { node_id, value } => {
                schema.set_profile_key(ctx.requests, &node_id, value);
            }

            EditorEvent::DownloadRequested { node_id } => {
                let download = self.controllers.get(&node_id).and_then(|c| {
                    c.download(ctx.requests)
                        .map(|promise| (c.producer().unwrap_or_default().to_owned(), promise))
                });
                match download {
                    Some((name, promise)) => self.downloads.push((name, Some(promise))),
                    None => {
                        let err = Error::UnknownNode(node_id);
                        error!("download: {err}");
                        ctx.banners.show_error(err.user_message());
                    }
                }
            }
        }
    }

    fn poll_requests(
        &mut self,
        ctx: &mut AppContext<'_>,
        schema: &mut SchemaManager,
    ) -> Vec<ViewerAction> {
        let mut changed = false;

        for slot in self.mutations.iter_mut() {
            match take_ready(slot) {
                Some(Ok(())) => changed = true,
                Some(Err(err)) => {
                    ctx.banners.show_error(err.user_message());
                }
                None => {}
            }
        }
        self.mutations.retain(Option::is_some);

        for slot in self.creations.iter_mut() {
            match take_ready(slot) {
                Some(Ok(created)) => {
                    info!("server created node {}", created.node_id);
                    changed = true;
                }
                Some(Err(err)) => {
                    ctx.banners.show_error(err.user_message());
                }
                None => {}
            }
        }
        self.creations.retain(Option::is_some);

        let mut actions = Vec::new();
        for (name, slot) in self.downloads.iter_mut() {
            match take_ready(slot) {
                Some(Ok(bytes)) => actions.push(ViewerAction::SaveFile {
                    name: name.clone(),
                    bytes,
                }),
                Some(Err(err)) => {
                    ctx.banners.show_error(err.user_message());
                }
                None => {}
            }
        }
        self.downloads.retain(|(_, slot)| slot.is_some());

        if changed {
            schema.refresh(ctx.requests);
        }

        actions
    }
}
