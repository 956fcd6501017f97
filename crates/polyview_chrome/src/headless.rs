//! A viewer host without a window: the scene, panel and graph editor are
//! kept as plain state and reported through the log.

use std::collections::{BTreeMap, HashMap};

use glam::{Quat, Vec3};
use polyview::nodes::{EditorEvent, GraphEditor, NodeView, PortRef};
use polyview::panel::{ControlId, ControlPanel, ControlValue, FolderId, PanelEvent};
use polyview::surface::{
    Aabb, AvatarHandle, CameraFraming, CameraPose, GroupId, MeshStyle, ObjectId, RenderSurface,
    SplatId, ViewportCommand,
};
use polyview::{Error, Result};
use tracing::{debug, info};

/// Bytes per record in a `.splat` file; position is the first three
/// little-endian f32s.
const SPLAT_RECORD: usize = 32;

/// Bounds of every mesh primitive in a glTF/GLB document, read from the
/// position accessors' declared min/max.
pub fn gltf_bounds(bytes: &[u8]) -> Result<Aabb> {
    let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| Error::Generic(e.to_string()))?;

    let mut bounds: Option<Aabb> = None;
    for mesh in gltf.meshes() {
        for primitive in mesh.primitives() {
            let Some(positions) = primitive.get(&gltf::Semantic::Positions) else {
                continue;
            };
            let (Some(min), Some(max)) = (
                positions.min().as_ref().and_then(json_vec3),
                positions.max().as_ref().and_then(json_vec3),
            ) else {
                continue;
            };
            let aabb = Aabb { min, max };
            bounds = Some(match bounds {
                Some(b) => b.union(&aabb),
                None => aabb,
            });
        }
    }

    bounds.ok_or_else(|| Error::Generic("model has no positioned geometry".to_owned()))
}

fn json_vec3(value: &gltf::json::Value) -> Option<Vec3> {
    let v = value.as_array()?;
    if v.len() < 3 {
        return None;
    }
    Some(Vec3::new(
        v[0].as_f64()? as f32,
        v[1].as_f64()? as f32,
        v[2].as_f64()? as f32,
    ))
}

pub fn splat_bounds(bytes: &[u8]) -> Result<Aabb> {
    if bytes.is_empty() || bytes.len() % SPLAT_RECORD != 0 {
        return Err(Error::Generic(format!(
            "splat data is {} bytes, not a multiple of {SPLAT_RECORD}",
            bytes.len()
        )));
    }

    let positions = bytes.chunks_exact(SPLAT_RECORD).map(|record| {
        let f = |i: usize| {
            let mut le = [0u8; 4];
            le.copy_from_slice(&record[i * 4..i * 4 + 4]);
            f32::from_le_bytes(le)
        };
        Vec3::new(f(0), f(1), f(2))
    });

    Aabb::from_points(positions).ok_or_else(|| Error::Generic("empty splat".to_owned()))
}

#[derive(Debug, Default)]
pub struct HeadlessSurface {
    next_id: u64,
    groups: HashMap<GroupId, Vec<(String, Aabb)>>,
    splats: HashMap<SplatId, Aabb>,
    avatars: HashMap<ObjectId, String>,
    container_offset: Vec3,
    camera: CameraPose,
}

impl HeadlessSurface {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn model_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

impl RenderSurface for HeadlessSurface {
    fn create_group(&mut self) -> GroupId {
        let group = GroupId(self.next());
        self.groups.insert(group, Vec::new());
        group
    }

    fn detach_group(&mut self, group: GroupId) {
        self.groups.remove(&group);
    }

    fn add_gltf(
        &mut self,
        group: GroupId,
        name: &str,
        bytes: &[u8],
        style: &MeshStyle,
    ) -> Result<Aabb> {
        let aabb = gltf_bounds(bytes)?;
        info!(
            "loaded {name}: {:?} .. {:?} (wireframe: {})",
            aabb.min, aabb.max, style.wireframe
        );
        self.groups
            .entry(group)
            .or_default()
            .push((name.to_owned(), aabb));
        Ok(aabb)
    }

    fn set_container_offset(&mut self, offset: Vec3) {
        self.container_offset = offset;
    }

    fn frame_camera(&mut self, framing: &CameraFraming) {
        self.camera.position = Vec3::new(0.0, framing.height, framing.distance);
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        debug!("pixel ratio {ratio}");
    }

    fn load_splat(&mut self, name: &str, bytes: &[u8]) -> Result<SplatId> {
        let aabb = splat_bounds(bytes)?;
        let splat = SplatId(self.next());
        info!("loaded splat {name} ({} points)", bytes.len() / SPLAT_RECORD);
        self.splats.insert(splat, aabb);
        Ok(splat)
    }

    fn splat_bounds(&mut self, splat: SplatId) -> Option<Aabb> {
        self.splats.get(&splat).copied()
    }

    fn set_splat_offset(&mut self, _splat: SplatId, _offset: Vec3) {}

    fn dispose_splat(&mut self, splat: SplatId) {
        self.splats.remove(&splat);
    }

    fn apply_viewport(&mut self, command: &ViewportCommand) {
        debug!("viewport: {command:?}");
    }

    fn spawn_avatar(&mut self, label: &str, _position: Vec3, _rotation: Quat) -> AvatarHandle {
        let avatar = AvatarHandle {
            object: ObjectId(self.next()),
            label: ObjectId(self.next()),
        };
        info!("{label} joined");
        self.avatars.insert(avatar.object, label.to_owned());
        avatar
    }

    fn set_avatar_pose(&mut self, _avatar: &AvatarHandle, _position: Vec3, _rotation: Quat) {}

    fn detach_label(&mut self, _avatar: &AvatarHandle) {}

    fn remove_avatar(&mut self, avatar: AvatarHandle) {
        if let Some(label) = self.avatars.remove(&avatar.object) {
            info!("{label} left");
        }
    }

    fn camera_pose(&self) -> CameraPose {
        self.camera
    }
}

/// Panel state with no one to click on it.
#[derive(Debug, Default)]
pub struct HeadlessPanel {
    next_id: u64,
    folders: BTreeMap<u64, (Option<FolderId>, String)>,
    controls: BTreeMap<u64, (FolderId, String, Option<ControlValue>)>,
}

impl HeadlessPanel {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl ControlPanel for HeadlessPanel {
    fn add_folder(&mut self, parent: Option<FolderId>, name: &str, _open: bool) -> FolderId {
        let id = self.next();
        self.folders.insert(id, (parent, name.to_owned()));
        FolderId(id)
    }

    fn remove_folder(&mut self, folder: FolderId) {
        let mut doomed = vec![folder];
        let mut i = 0;
        while i < doomed.len() {
            let parent = doomed[i];
            doomed.extend(
                self.folders
                    .iter()
                    .filter(|(_, (p, _))| *p == Some(parent))
                    .map(|(id, _)| FolderId(*id)),
            );
            i += 1;
        }

        self.folders.retain(|id, _| !doomed.contains(&FolderId(*id)));
        self.controls
            .retain(|_, (folder, _, _)| !doomed.contains(folder));
    }

    fn add_control(&mut self, folder: FolderId, label: &str, value: ControlValue) -> ControlId {
        debug!("{label} = {value:?}");
        let id = self.next();
        self.controls
            .insert(id, (folder, label.to_owned(), Some(value)));
        ControlId(id)
    }

    fn add_button(&mut self, folder: FolderId, label: &str) -> ControlId {
        let id = self.next();
        self.controls.insert(id, (folder, label.to_owned(), None));
        ControlId(id)
    }

    fn update_display(&mut self, control: ControlId, value: &ControlValue) {
        if let Some((_, label, slot)) = self.controls.get_mut(&control.0) {
            debug!("{label} -> {value:?}");
            *slot = Some(value.clone());
        }
    }

    fn poll_event(&mut self) -> Option<PanelEvent> {
        None
    }
}

#[derive(Debug, Default)]
pub struct HeadlessEditor {
    nodes: BTreeMap<String, NodeView>,
    links: BTreeMap<PortRef, PortRef>,
}

impl HeadlessEditor {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

impl GraphEditor for HeadlessEditor {
    fn add_node(&mut self, id: &str, view: &NodeView) {
        debug!("node {id}: {}", view.title);
        self.nodes.insert(id.to_owned(), view.clone());
    }

    fn update_node(&mut self, id: &str, view: &NodeView) {
        self.nodes.insert(id.to_owned(), view.clone());
    }

    fn remove_node(&mut self, id: &str) {
        self.nodes.remove(id);
        self.links.retain(|to, from| to.node != id && from.node != id);
    }

    fn connect(&mut self, from: &PortRef, to: &PortRef) {
        self.links.insert(to.clone(), from.clone());
    }

    fn disconnect(&mut self, to: &PortRef) {
        self.links.remove(to);
    }

    fn set_preview(&mut self, id: &str, url: &str, bytes: &[u8]) {
        debug!("preview for {id} from {url} ({} bytes)", bytes.len());
    }

    fn poll_event(&mut self) -> Option<EditorEvent> {
        None
    }
}
