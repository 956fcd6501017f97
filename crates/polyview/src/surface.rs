use glam::{Quat, Vec3};

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SplatId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub u64);

/// A remote peer's scene object plus its floating name label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvatarHandle {
    pub object: ObjectId,
    pub label: ObjectId,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 2.0, 3.0),
            rotation: Quat::IDENTITY,
        }
    }
}

/// How meshes from a producer should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshStyle {
    pub cast_shadows: bool,
    pub receive_shadows: bool,
    pub wireframe: bool,
    pub environment_map: bool,
}

impl MeshStyle {
    pub fn producer(wireframe: bool) -> Self {
        Self {
            cast_shadows: true,
            receive_shadows: true,
            wireframe,
            environment_map: true,
        }
    }
}

/// Where to put the camera and orbit target to frame a freshly loaded model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFraming {
    /// Camera height.
    pub height: f32,
    /// Camera distance along +z.
    pub distance: f32,
    pub target: Vec3,
}

/// Mutations of the live scene driven by viewport settings.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewportCommand {
    Wireframe(bool),
    Background(String),
    Lighting(String),
    Ground(String),
    FogColor(String),
    FogNear(f32),
    FogFar(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut aabb = Self::empty();
        let mut any = false;
        for p in points {
            aabb.include_point(p);
            any = true;
        }
        any.then_some(aabb)
    }

    pub fn include_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Vertical center.
    pub fn mid_y(&self) -> f32 {
        (self.max.y + self.min.y) / 2.0
    }

    /// Offset that moves a model whose pivot isn't its bounding-box center so
    /// it sits on the ground plane.
    pub fn pivot_offset(&self) -> Vec3 {
        let half_height = self.size().y / 2.0;
        Vec3::new(0.0, -self.mid_y() + half_height, 0.0)
    }

    pub fn framing(&self) -> CameraFraming {
        let mid = self.mid_y();
        CameraFraming {
            height: mid * 1.5,
            distance: self.size().length() / 2.0,
            target: Vec3::new(0.0, mid, 0.0),
        }
    }
}

/// The 3D scene the viewer drives. Rendering itself lives behind this.
pub trait RenderSurface {
    /// New empty group for producer output, attached to the viewer container.
    fn create_group(&mut self) -> GroupId;
    fn detach_group(&mut self, group: GroupId);

    /// Parse a glTF/GLB document into `group`. Returns the model's bounds.
    fn add_gltf(&mut self, group: GroupId, name: &str, bytes: &[u8], style: &MeshStyle)
        -> Result<Aabb>;

    fn set_container_offset(&mut self, offset: Vec3);
    fn frame_camera(&mut self, framing: &CameraFraming);
    fn set_pixel_ratio(&mut self, ratio: f32);

    fn load_splat(&mut self, name: &str, bytes: &[u8]) -> Result<SplatId>;
    /// `None` until the splat's spatial index has been built.
    fn splat_bounds(&mut self, splat: SplatId) -> Option<Aabb>;
    fn set_splat_offset(&mut self, splat: SplatId, offset: Vec3);
    fn dispose_splat(&mut self, splat: SplatId);

    fn apply_viewport(&mut self, command: &ViewportCommand);

    fn spawn_avatar(&mut self, label: &str, position: Vec3, rotation: Quat) -> AvatarHandle;
    fn set_avatar_pose(&mut self, avatar: &AvatarHandle, position: Vec3, rotation: Quat);
    fn detach_label(&mut self, avatar: &AvatarHandle);
    fn remove_avatar(&mut self, avatar: AvatarHandle);

    fn camera_pose(&self) -> CameraPose;
}
