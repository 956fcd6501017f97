//! In-memory stand-ins for the generator server, the renderer, the control
//! panel, the graph editor and the live socket.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use glam::{Quat, Vec3};
use roomlink::{ClientMessage, LinkStatus, LiveEvent, LiveTransport, ServerMessage};
use serde_json::{json, Map, Value};

use crate::banners::Banners;
use crate::nodes::{EditorEvent, GraphEditor, NodeView, PortRef};
use crate::panel::{ControlId, ControlPanel, ControlValue, FolderId, PanelEvent};
use crate::request::{HttpClient, HttpRequest, HttpResponse, Method, OnResponse};
use crate::schema::Producers;
use crate::surface::{
    Aabb, AvatarHandle, CameraFraming, CameraPose, GroupId, MeshStyle, ObjectId, RenderSurface,
    SplatId, ViewportCommand,
};
use crate::{AppContext, Error, RequestManager, Result, Schema, SyncFlags};

const BASE: &str = "http://fake";
const ZIP_BYTES: &[u8] = b"PK\x03\x04model";
const MERMAID: &str = "graph TD; X-->Node-1";

struct ServerState {
    schema: Value,
    started: String,
    producers: HashMap<String, Vec<u8>>,
    failures: HashMap<String, (u16, String)>,
    requests: Vec<HttpRequest>,
    defer: bool,
    deferred: Vec<(HttpResponse, OnResponse)>,
    next_node: u64,
}

/// A generator server held in memory. Responses are computed when the
/// request is made; with `defer` on they are only delivered by `flush`.
#[derive(Clone)]
pub struct FakeServer {
    state: Arc<Mutex<ServerState>>,
}

fn respond(status: u16, body: Value) -> HttpResponse {
    HttpResponse {
        status,
        bytes: serde_json::to_vec(&body).unwrap(),
    }
}

fn ok_empty() -> HttpResponse {
    HttpResponse {
        status: 200,
        bytes: Vec::new(),
    }
}

fn not_found(what: &str) -> HttpResponse {
    respond(404, json!({ "error": format!("{what} not found") }))
}

/// Copy a posted profile's values into the schema's `currentValue`s.
fn apply_profile(schema: &mut Value, profile: &Value) {
    if let (Some(params), Some(values)) = (
        schema.pointer_mut("/parameters/parameters"),
        profile.get("Parameters"),
    ) {
        apply_group(params, values);
    }

    if let (Some(subs), Some(values)) = (
        schema.get_mut("subGenerators").and_then(Value::as_object_mut),
        profile.get("subGenerators").and_then(Value::as_object),
    ) {
        for (key, sub_profile) in values {
            if let Some(sub) = subs.get_mut(key) {
                apply_profile(sub, sub_profile);
            }
        }
    }
}

fn apply_group(params: &mut Value, values: &Value) {
    let Some(params) = params.as_array_mut() else {
        return;
    };
    for param in params {
        let name = param["name"].as_str().unwrap_or_default().to_owned();
        let Some(value) = values.get(&name) else {
            continue;
        };
        if param["type"] == "group" {
            if let Some(children) = param.get_mut("parameters") {
                apply_group(children, value);
            }
        } else {
            param["currentValue"] = value.clone();
        }
    }
}

impl ServerState {
    fn nodes(&mut self) -> &mut Map<String, Value> {
        if !self.schema["nodes"].is_object() {
            self.schema["nodes"] = json!({});
        }
        self.schema["nodes"].as_object_mut().unwrap()
    }

    fn handle(&mut self, request: &HttpRequest, path: &str) -> HttpResponse {
        if let Some((status, message)) = self.failures.get(path) {
            return respond(*status, json!({ "error": message }));
        }

        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);

        match (request.method, path) {
            (Method::Get, "/schema") => respond(200, self.schema.clone()),
            (Method::Get, "/started") => respond(200, json!({ "time": self.started })),
            (Method::Get, "/zip") => HttpResponse {
                status: 200,
                bytes: ZIP_BYTES.to_vec(),
            },
            (Method::Get, "/mermaid") => HttpResponse {
                status: 200,
                bytes: MERMAID.as_bytes().to_vec(),
            },
            (Method::Post, "/profile") => {
                apply_profile(&mut self.schema, &body);
                ok_empty()
            }
            (Method::Post, "/node") => {
                let id = format!("Node-{}", self.next_node);
                self.next_node += 1;
                let node_type = body["nodeType"].clone();
                self.nodes().insert(
                    id.clone(),
                    json!({ "type": node_type, "name": "", "version": 0 }),
                );
                respond(200, json!({ "nodeID": id }))
            }
            (Method::Delete, "/node") => {
                let id = body["nodeID"].as_str().unwrap_or_default().to_owned();
                let nodes = self.nodes();
                if !nodes.contains_key(&id) {
                    return not_found(&id);
                }
                let kept: Map<String, Value> = nodes
                    .iter()
                    .filter(|(key, _)| **key != id)
                    .map(|(key, node)| (key.clone(), node.clone()))
                    .collect();
                *nodes = kept;
                for node in nodes.values_mut() {
                    if let Some(deps) = node["dependencies"].as_array_mut() {
                        deps.retain(|d| d["dependencyID"] != id.as_str());
                    }
                }
                ok_empty()
            }
            (Method::Post, "/node/connection") => {
                let in_node = body["nodeInId"].as_str().unwrap_or_default().to_owned();
                let in_port = body["inPortName"].clone();
                let Some(node) = self.nodes().get_mut(&in_node) else {
                    return not_found(&in_node);
                };
                if !node["dependencies"].is_array() {
                    node["dependencies"] = json!([]);
                }
                let deps = node["dependencies"].as_array_mut().unwrap();
                deps.retain(|d| d["name"] != in_port);
                deps.push(json!({
                    "dependencyID": body["nodeOutId"],
                    "dependencyPort": body["outPortName"],
                    "name": in_port,
                }));
                ok_empty()
            }
            (Method::Delete, "/node/connection") => {
                let node_id = body["nodeId"].as_str().unwrap_or_default().to_owned();
                let in_port = body["inPortName"].clone();
                let Some(node) = self.nodes().get_mut(&node_id) else {
                    return not_found(&node_id);
                };
                if let Some(deps) = node["dependencies"].as_array_mut() {
                    deps.retain(|d| d["name"] != in_port);
                }
                ok_empty()
            }
            (Method::Post, path) if path.starts_with("/parameter/value/") => {
                let id = &path["/parameter/value/".len()..];
                let json_body = request.content_type == Some("application/json");
                let Some(node) = self.nodes().get_mut(id) else {
                    return not_found(id);
                };
                if json_body {
                    node["parameter"]["currentValue"] = body;
                }
                let version = node["version"].as_u64().unwrap_or_default();
                node["version"] = json!(version + 1);
                ok_empty()
            }
            (Method::Get, path) if path.starts_with("/producer/value/") => {
                let name = &path["/producer/value/".len()..];
                match self.producers.get(name) {
                    Some(bytes) => HttpResponse {
                        status: 200,
                        bytes: bytes.clone(),
                    },
                    None => not_found(name),
                }
            }
            _ => not_found(path),
        }
    }
}

fn path_of(url: &str) -> String {
    let raw = url.strip_prefix(BASE).unwrap_or(url);
    urlencoding::decode(raw).unwrap().into_owned()
}

impl FakeServer {
    pub fn new() -> Self {
        Self::with_schema(Schema::default())
    }

    pub fn with_schema(schema: Schema) -> Self {
        Self {
            state: Arc::new(Mutex::new(ServerState {
                schema: serde_json::to_value(schema).unwrap(),
                started: "2024-01-01 00:00:00".to_owned(),
                producers: HashMap::new(),
                failures: HashMap::new(),
                requests: Vec::new(),
                defer: false,
                deferred: Vec::new(),
                next_node: 100,
            })),
        }
    }

    pub fn request_manager(&self) -> RequestManager {
        RequestManager::new(BASE, Arc::new(self.clone()))
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// How many requests, of any method, went to `path`.
    pub fn count(&self, path: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| path_of(&r.url) == path)
            .count()
    }

    pub fn set_schema(&self, schema: Schema) {
        self.state.lock().unwrap().schema = serde_json::to_value(schema).unwrap();
    }

    pub fn schema(&self) -> Value {
        self.state.lock().unwrap().schema.clone()
    }

    pub fn set_started(&self, time: &str) {
        self.state.lock().unwrap().started = time.to_owned();
    }

    pub fn add_producer(&self, name: &str, bytes: Vec<u8>) {
        self.state
            .lock()
            .unwrap()
            .producers
            .insert(name.to_owned(), bytes);
    }

    pub fn fail(&self, path: &str, status: u16, message: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(path.to_owned(), (status, message.to_owned()));
    }

    pub fn zip_bytes(&self) -> Vec<u8> {
        ZIP_BYTES.to_vec()
    }

    pub fn defer(&self, defer: bool) {
        self.state.lock().unwrap().defer = defer;
    }

    /// Deliver every held response, oldest first.
    pub fn flush(&self) {
        let deferred = std::mem::take(&mut self.state.lock().unwrap().deferred);
        for (response, on_done) in deferred {
            on_done(Ok(response));
        }
    }
}

impl HttpClient for FakeServer {
    fn fetch(&self, request: HttpRequest, on_done: OnResponse) {
        let response = {
            let mut state = self.state.lock().unwrap();
            let path = path_of(&request.url);
            let response = state.handle(&request, &path);
            state.requests.push(request);
            if state.defer {
                state.deferred.push((response, on_done));
                return;
            }
            response
        };
        on_done(Ok(response));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    CreateGroup(GroupId),
    DetachGroup(GroupId),
    AddGltf { group: GroupId, name: String },
    ContainerOffset(Vec3),
    FrameCamera(CameraFraming),
    PixelRatio(f32),
    LoadSplat(String),
    SplatOffset(SplatId, Vec3),
    DisposeSplat(SplatId),
    Viewport(ViewportCommand),
    SpawnAvatar(String),
    AvatarPose(ObjectId, Vec3, Quat),
    DetachLabel(ObjectId),
    RemoveAvatar(ObjectId),
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub calls: Vec<SurfaceCall>,
    pub avatars: Vec<AvatarHandle>,
    pub camera: CameraPose,
    next_id: u64,
}

impl RecordingSurface {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn loaded_gltfs(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SurfaceCall::AddGltf { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl RenderSurface for RecordingSurface {
    fn create_group(&mut self) -> GroupId {
        let group = GroupId(self.next());
        self.calls.push(SurfaceCall::CreateGroup(group));
        group
    }

    fn detach_group(&mut self, group: GroupId) {
        self.calls.push(SurfaceCall::DetachGroup(group));
    }

    fn add_gltf(
        &mut self,
        group: GroupId,
        name: &str,
        bytes: &[u8],
        _style: &MeshStyle,
    ) -> Result<Aabb> {
        if bytes.is_empty() {
            return Err(Error::Generic(format!("{name}: empty document")));
        }
        self.calls.push(SurfaceCall::AddGltf {
            group,
            name: name.to_owned(),
        });
        Ok(Aabb {
            min: Vec3::new(-1.0, 0.0, -1.0),
            max: Vec3::new(1.0, 2.0, 1.0),
        })
    }

    fn set_container_offset(&mut self, offset: Vec3) {
        self.calls.push(SurfaceCall::ContainerOffset(offset));
    }

    fn frame_camera(&mut self, framing: &CameraFraming) {
        self.calls.push(SurfaceCall::FrameCamera(*framing));
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.calls.push(SurfaceCall::PixelRatio(ratio));
    }

    fn load_splat(&mut self, name: &str, _bytes: &[u8]) -> Result<SplatId> {
        self.calls.push(SurfaceCall::LoadSplat(name.to_owned()));
        Ok(SplatId(self.next()))
    }

    fn splat_bounds(&mut self, _splat: SplatId) -> Option<Aabb> {
        Some(Aabb {
            min: Vec3::splat(-2.0),
            max: Vec3::splat(2.0),
        })
    }

    fn set_splat_offset(&mut self, splat: SplatId, offset: Vec3) {
        self.calls.push(SurfaceCall::SplatOffset(splat, offset));
    }

    fn dispose_splat(&mut self, splat: SplatId) {
        self.calls.push(SurfaceCall::DisposeSplat(splat));
    }

    fn apply_viewport(&mut self, command: &ViewportCommand) {
        self.calls.push(SurfaceCall::Viewport(command.clone()));
    }

    fn spawn_avatar(&mut self, label: &str, _position: Vec3, _rotation: Quat) -> AvatarHandle {
        let avatar = AvatarHandle {
            object: ObjectId(self.next()),
            label: ObjectId(self.next()),
        };
        self.calls.push(SurfaceCall::SpawnAvatar(label.to_owned()));
        self.avatars.push(avatar);
        avatar
    }

    fn set_avatar_pose(&mut self, avatar: &AvatarHandle, position: Vec3, rotation: Quat) {
        self.calls
            .push(SurfaceCall::AvatarPose(avatar.object, position, rotation));
    }

    fn detach_label(&mut self, avatar: &AvatarHandle) {
        self.calls.push(SurfaceCall::DetachLabel(avatar.label));
    }

    fn remove_avatar(&mut self, avatar: AvatarHandle) {
        self.calls.push(SurfaceCall::RemoveAvatar(avatar.object));
        self.avatars.retain(|a| *a != avatar);
    }

    fn camera_pose(&self) -> CameraPose {
        self.camera
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeFolder {
    pub id: FolderId,
    pub parent: Option<FolderId>,
    pub name: String,
    pub open: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FakeControl {
    pub id: ControlId,
    pub folder: FolderId,
    pub label: String,
    pub value: ControlValue,
}

#[derive(Debug, Default)]
pub struct FakePanel {
    pub folders: Vec<FakeFolder>,
    pub controls: Vec<FakeControl>,
    pub buttons: Vec<FakeControl>,
    events: VecDeque<PanelEvent>,
    next_id: u64,
}

impl FakePanel {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn folder_names(&self) -> Vec<&str> {
        self.folders.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn control(&self, id: ControlId) -> Option<&FakeControl> {
        self.controls.iter().find(|c| c.id == id)
    }

    /// Controls and buttons both.
    pub fn control_by_label(&self, label: &str) -> Option<&FakeControl> {
        self.controls
            .iter()
            .chain(&self.buttons)
            .find(|c| c.label == label)
    }

    /// The user edits a control.
    pub fn change(&mut self, id: ControlId, value: ControlValue) {
        if let Some(control) = self.controls.iter_mut().find(|c| c.id == id) {
            control.value = value.clone();
        }
        self.events.push_back(PanelEvent::Changed { control: id, value });
    }

    pub fn click(&mut self, id: ControlId) {
        self.events.push_back(PanelEvent::Clicked(id));
    }
}

impl ControlPanel for FakePanel {
    fn add_folder(&mut self, parent: Option<FolderId>, name: &str, open: bool) -> FolderId {
        let id = FolderId(self.next());
        self.folders.push(FakeFolder {
            id,
            parent,
            name: name.to_owned(),
            open,
        });
        id
    }

    fn remove_folder(&mut self, folder: FolderId) {
        let mut doomed = vec![folder];
        let mut i = 0;
        while i < doomed.len() {
            let parent = doomed[i];
            doomed.extend(
                self.folders
                    .iter()
                    .filter(|f| f.parent == Some(parent))
                    .map(|f| f.id),
            );
            i += 1;
        }

        self.folders.retain(|f| !doomed.contains(&f.id));
        self.controls.retain(|c| !doomed.contains(&c.folder));
        self.buttons.retain(|c| !doomed.contains(&c.folder));
    }

    fn add_control(&mut self, folder: FolderId, label: &str, value: ControlValue) -> ControlId {
        let id = ControlId(self.next());
        self.controls.push(FakeControl {
            id,
            folder,
            label: label.to_owned(),
            value,
        });
        id
    }

    fn add_button(&mut self, folder: FolderId, label: &str) -> ControlId {
        let id = ControlId(self.next());
        self.buttons.push(FakeControl {
            id,
            folder,
            label: label.to_owned(),
            value: ControlValue::Text(label.to_owned()),
        });
        id
    }

    fn update_display(&mut self, control: ControlId, value: &ControlValue) {
        if let Some(c) = self.controls.iter_mut().find(|c| c.id == control) {
            c.value = value.clone();
        }
    }

    fn poll_event(&mut self) -> Option<PanelEvent> {
        self.events.pop_front()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorCall {
    Add(String),
    Update(String),
    Remove(String),
    Connect(PortRef, PortRef),
    Disconnect(PortRef),
    Preview(String, String),
}

/// Graph editor that, like the real one, reports programmatic connection
/// changes back as events.
#[derive(Debug, Default)]
pub struct FakeEditor {
    pub nodes: BTreeMap<String, NodeView>,
    pub calls: Vec<EditorCall>,
    links: BTreeMap<PortRef, PortRef>,
    events: VecDeque<EditorEvent>,
}

impl FakeEditor {
    /// Current links as `(from, to)` pairs.
    pub fn connections(&self) -> Vec<(PortRef, PortRef)> {
        self.links
            .iter()
            .map(|(to, from)| (from.clone(), to.clone()))
            .collect()
    }

    /// Something the user did in the editor.
    pub fn user(&mut self, event: EditorEvent) {
        match &event {
            EditorEvent::ConnectionAdded { from, to } => {
                self.links.insert(to.clone(), from.clone());
            }
            EditorEvent::ConnectionRemoved { to } => {
                self.links.remove(to);
            }
            _ => {}
        }
        self.events.push_back(event);
    }
}

impl GraphEditor for FakeEditor {
    fn add_node(&mut self, id: &str, view: &NodeView) {
        self.calls.push(EditorCall::Add(id.to_owned()));
        self.nodes.insert(id.to_owned(), view.clone());
    }

    fn update_node(&mut self, id: &str, view: &NodeView) {
        self.calls.push(EditorCall::Update(id.to_owned()));
        self.nodes.insert(id.to_owned(), view.clone());
    }

    fn remove_node(&mut self, id: &str) {
        self.calls.push(EditorCall::Remove(id.to_owned()));
        self.nodes.remove(id);
        self.links.retain(|to, from| to.node != id && from.node != id);
    }

    fn connect(&mut self, from: &PortRef, to: &PortRef) {
        self.calls.push(EditorCall::Connect(from.clone(), to.clone()));
        self.links.insert(to.clone(), from.clone());
        self.events.push_back(EditorEvent::ConnectionAdded {
            from: from.clone(),
            to: to.clone(),
        });
    }

    fn disconnect(&mut self, to: &PortRef) {
        self.calls.push(EditorCall::Disconnect(to.clone()));
        if self.links.remove(to).is_some() {
            self.events
                .push_back(EditorEvent::ConnectionRemoved { to: to.clone() });
        }
    }

    fn set_preview(&mut self, id: &str, url: &str, _bytes: &[u8]) {
        self.calls
            .push(EditorCall::Preview(id.to_owned(), url.to_owned()));
    }

    fn poll_event(&mut self) -> Option<EditorEvent> {
        self.events.pop_front()
    }
}

struct Script {
    inbound: VecDeque<LiveEvent>,
    sent: Vec<ClientMessage>,
    status: LinkStatus,
}

/// Live transport fed by the test through a [`ScriptHandle`].
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

#[derive(Clone)]
pub struct ScriptHandle {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn connected() -> (ScriptedTransport, ScriptHandle) {
        let script = Arc::new(Mutex::new(Script {
            inbound: VecDeque::new(),
            sent: Vec::new(),
            status: LinkStatus::Connected,
        }));
        (
            ScriptedTransport {
                script: script.clone(),
            },
            ScriptHandle { script },
        )
    }
}

impl ScriptHandle {
    pub fn push(&self, msg: ServerMessage) {
        self.push_event(LiveEvent::Message(msg));
    }

    pub fn push_event(&self, event: LiveEvent) {
        self.script.lock().unwrap().inbound.push_back(event);
    }

    pub fn sent(&self) -> Vec<ClientMessage> {
        self.script.lock().unwrap().sent.clone()
    }

    pub fn set_status(&self, status: LinkStatus) {
        self.script.lock().unwrap().status = status;
    }
}

impl LiveTransport for ScriptedTransport {
    fn send(&mut self, msg: &ClientMessage) {
        self.script.lock().unwrap().sent.push(msg.clone());
    }

    fn try_recv(&mut self) -> Option<LiveEvent> {
        self.script.lock().unwrap().inbound.pop_front()
    }

    fn keepalive(&mut self, _now: Instant) {}

    fn status(&self) -> LinkStatus {
        self.script.lock().unwrap().status
    }
}

/// Everything an [`AppContext`] borrows, owned in one place.
pub struct Harness {
    pub requests: RequestManager,
    pub surface: RecordingSurface,
    pub panel: FakePanel,
    pub editor: FakeEditor,
    pub banners: Banners,
    pub flags: SyncFlags,
}

impl Harness {
    pub fn new(server: &FakeServer) -> Self {
        Self {
            requests: server.request_manager(),
            surface: RecordingSurface::default(),
            panel: FakePanel::default(),
            editor: FakeEditor::default(),
            banners: Banners::new(),
            flags: SyncFlags::default(),
        }
    }

    pub fn ctx(&mut self) -> AppContext<'_> {
        AppContext {
            requests: &self.requests,
            surface: &mut self.surface,
            panel: &mut self.panel,
            editor: &mut self.editor,
            banners: &mut self.banners,
            flags: &mut self.flags,
        }
    }
}

/// A profile-driven generator: root parameters, one group, one
/// sub-generator and a vector the panel doesn't show.
pub fn legacy_schema(height: f64) -> Schema {
    serde_json::from_value(json!({
        "parameters": {
            "name": "",
            "type": "group",
            "parameters": [
                { "name": "Height", "type": "float", "currentValue": height },
                { "name": "Segments", "type": "int", "currentValue": 8 },
                {
                    "name": "Base",
                    "type": "group",
                    "parameters": [
                        { "name": "Color", "type": "color", "currentValue": "#ff0000" },
                        { "name": "Smooth", "type": "bool", "currentValue": true }
                    ]
                },
                { "name": "Offset", "type": "vector3", "currentValue": { "x": 0, "y": 0, "z": 0 } }
            ]
        },
        "subGenerators": {
            "Stem": {
                "parameters": {
                    "name": "",
                    "type": "group",
                    "parameters": [
                        { "name": "Length", "type": "float", "currentValue": 2.0 }
                    ]
                }
            }
        },
        "producers": []
    }))
    .unwrap()
}

/// A node graph: parameter node `X` wired into a text node that produces
/// `out.txt`.
pub fn node_schema() -> Schema {
    serde_json::from_value(json!({
        "nodes": {
            "X": {
                "type": "parameter.Value[float64]",
                "name": "X",
                "version": 1,
                "parameter": { "name": "X", "type": "float64", "currentValue": 1.0 },
                "outputs": [{ "name": "Out", "type": "float64" }]
            },
            "Node-1": {
                "type": "basics.TextNodeData",
                "name": "",
                "version": 1,
                "dependencies": [
                    { "dependencyID": "X", "dependencyPort": "Out", "name": "In" }
                ],
                "outputs": [{ "name": "Out", "type": "string" }]
            }
        },
        "producers": {
            "out.txt": { "nodeID": "Node-1", "port": "Out" }
        }
    }))
    .unwrap()
}

pub fn producer_schema(names: &[&str]) -> Schema {
    Schema {
        producers: Producers::Named(names.iter().map(|n| (*n).to_owned()).collect()),
        ..Schema::default()
    }
}
