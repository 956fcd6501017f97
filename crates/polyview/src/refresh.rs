//! Producer output refresh, gated by a loading barrier.
//!
//! A schema that arrives while producer loads are still in flight is held
//! back (only the newest one) until the last load finishes, so the output
//! group is never rebuilt underneath an outstanding rebuild.

use std::sync::Arc;

use poll_promise::Promise;
use tracing::{debug, error, info, warn};

use crate::observer::{Subscribers, Subscription};
use crate::request::{producer_path, take_ready};
use crate::surface::{Aabb, GroupId, MeshStyle, RenderSurface, SplatId};
use crate::{AppContext, Result, Schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerKind {
    Text,
    Gltf,
    Splat,
    Image,
}

impl ProducerKind {
    /// Pick a loader from a producer's file extension.
    pub fn from_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "txt" => Some(ProducerKind::Text),
            "gltf" | "glb" => Some(ProducerKind::Gltf),
            "splat" => Some(ProducerKind::Splat),
            "png" | "jpg" | "jpeg" => Some(ProducerKind::Image),
            _ => None,
        }
    }
}

/// Reference count of in-flight producer loads, plus the one schema waiting
/// for them to finish.
#[derive(Debug, Default)]
pub struct LoadingBarrier {
    count: usize,
    cached: Option<Arc<Schema>>,
}

impl LoadingBarrier {
    pub fn add_loading(&mut self) {
        self.count += 1;
    }

    /// Release one load. When the count drains to zero the cached schema,
    /// if any, is handed back to be refreshed with.
    ///
    /// # Panics
    ///
    /// Releasing more loads than were added is a bug and panics.
    pub fn remove_loading(&mut self) -> Option<Arc<Schema>> {
        if self.count == 0 {
            panic!("loading count already 0");
        }
        self.count -= 1;

        if self.count == 0 {
            self.cached.take()
        } else {
            None
        }
    }

    pub fn currently_loading(&self) -> bool {
        self.count > 0
    }

    /// Offer a new schema. Returns it straight back when nothing is loading;
    /// otherwise it replaces whatever was cached.
    pub fn new_schema(&mut self, schema: Arc<Schema>) -> Option<Arc<Schema>> {
        if self.currently_loading() {
            if self.cached.is_some() {
                debug!("dropping superseded cached schema");
            }
            self.cached = Some(schema);
            return None;
        }
        Some(schema)
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn cached(&self) -> Option<&Arc<Schema>> {
        self.cached.as_ref()
    }
}

/// Frames the camera on the first model loaded, and never again.
#[derive(Debug, Default)]
pub struct CameraFramer {
    framed: bool,
}

impl CameraFramer {
    pub fn frame(&mut self, surface: &mut dyn RenderSurface, aabb: &Aabb) -> bool {
        if self.framed {
            return false;
        }
        self.framed = true;

        let framing = aabb.framing();
        info!(
            "framing camera at height {} distance {}",
            framing.height, framing.distance
        );
        surface.frame_camera(&framing);
        true
    }

    pub fn has_framed(&self) -> bool {
        self.framed
    }
}

/// An image producer's bytes, published to whoever shows previews.
#[derive(Debug, Clone, PartialEq)]
pub struct ProducerImage {
    pub name: String,
    pub url: String,
    pub bytes: Arc<Vec<u8>>,
}

struct ProducerLoad {
    name: String,
    kind: ProducerKind,
    generation: u64,
    promise: Option<Promise<Result<Vec<u8>>>>,
}

pub struct SchemaRefreshManager {
    barrier: LoadingBarrier,
    framer: CameraFramer,
    group: Option<GroupId>,
    generation: u64,
    loads: Vec<ProducerLoad>,
    splat: Option<SplatId>,
    splat_index: Option<(SplatId, u64)>,
    wireframe: bool,
    images: Subscribers<ProducerImage>,
}

impl Default for SchemaRefreshManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRefreshManager {
    pub fn new() -> Self {
        Self {
            barrier: LoadingBarrier::default(),
            framer: CameraFramer::default(),
            group: None,
            generation: 0,
            loads: Vec::new(),
            splat: None,
            splat_index: None,
            wireframe: false,
            images: Subscribers::new(),
        }
    }

    pub fn barrier(&self) -> &LoadingBarrier {
        &self.barrier
    }

    pub fn framer(&self) -> &CameraFramer {
        &self.framer
    }

    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    /// Wireframe flag applied to meshes loaded from now on.
    pub fn set_wireframe(&mut self, wireframe: bool) {
        self.wireframe = wireframe;
    }

    pub fn subscribe_images(&mut self) -> Subscription<ProducerImage> {
        self.images.subscribe()
    }

    pub fn new_schema(&mut self, ctx: &mut AppContext<'_>, schema: Arc<Schema>) {
        if let Some(schema) = self.barrier.new_schema(schema) {
            self.refresh(ctx, &schema);
        } else {
            debug!(
                "{} producer loads in flight, caching schema",
                self.barrier.count()
            );
        }
    }

    /// Tear down the displayed output and start loading every producer in
    /// `schema`.
    pub fn refresh(&mut self, ctx: &mut AppContext<'_>, schema: &Schema) {
        ctx.banners.clear_errors();
        ctx.banners.clear_info();

        if let Some(group) = self.group.take() {
            ctx.surface.detach_group(group);
        }
        self.group = Some(ctx.surface.create_group());
        self.generation += 1;

        for name in schema.producer_names() {
            let Some(kind) = ProducerKind::from_name(name) else {
                debug!("no loader for producer {name}, skipping");
                continue;
            };

            if kind == ProducerKind::Splat {
                if let Some(previous) = self.splat.take() {
                    ctx.surface.dispose_splat(previous);
                }
                self.splat_index = None;
                ctx.surface.set_pixel_ratio(1.0);
            }

            self.barrier.add_loading();
            self.loads.push(ProducerLoad {
                name: name.to_owned(),
                kind,
                generation: self.generation,
                promise: Some(ctx.requests.producer(name)),
            });
        }
    }

    pub fn poll(&mut self, ctx: &mut AppContext<'_>) {
        let mut i = 0;
        while i < self.loads.len() {
            let Some(result) = take_ready(&mut self.loads[i].promise) else {
                i += 1;
                continue;
            };
            let load = self.loads.remove(i);

            if load.generation == self.generation {
                self.finish(ctx, &load, result);
            } else {
                debug!("discarding stale load of {}", load.name);
            }

            if let Some(schema) = self.barrier.remove_loading() {
                self.refresh(ctx, &schema);
            }
        }

        self.poll_splat_index(ctx);
    }

    fn finish(&mut self, ctx: &mut AppContext<'_>, load: &ProducerLoad, result: Result<Vec<u8>>) {
        let bytes = match result {
            Ok(bytes) => bytes,
            Err(err) => {
                if load.kind == ProducerKind::Gltf {
                    ctx.banners.show_error(err.user_message());
                } else {
                    error!("failed to load producer {}: {err}", load.name);
                }
                return;
            }
        };

        match load.kind {
            ProducerKind::Text => {
                ctx.banners
                    .show_info(String::from_utf8_lossy(&bytes).into_owned());
            }

            ProducerKind::Gltf => {
                let Some(group) = self.group else {
                    return;
                };
                let style = MeshStyle::producer(self.wireframe);
                match ctx.surface.add_gltf(group, &load.name, &bytes, &style) {
                    Ok(aabb) => {
                        ctx.surface.set_container_offset(aabb.pivot_offset());
                        self.framer.frame(ctx.surface, &aabb);
                    }
                    Err(err) => {
                        ctx.banners.show_error(err.user_message());
                    }
                }
            }

            ProducerKind::Splat => match ctx.surface.load_splat(&load.name, &bytes) {
                Ok(splat) => {
                    self.splat = Some(splat);
                    self.splat_index = Some((splat, self.generation));
                }
                Err(err) => error!("failed to load splat {}: {err}", load.name),
            },

            ProducerKind::Image => {
                self.images.publish(ProducerImage {
                    name: load.name.clone(),
                    url: ctx.requests.url(&producer_path(&load.name)),
                    bytes: Arc::new(bytes),
                });
            }
        }
    }

    /// Splat bounds only exist once the renderer has built its spatial
    /// index, which can be frames after the load itself resolved.
    fn poll_splat_index(&mut self, ctx: &mut AppContext<'_>) {
        let Some((splat, generation)) = self.splat_index else {
            return;
        };
        if generation != self.generation {
            self.splat_index = None;
            return;
        }
        let Some(aabb) = ctx.surface.splat_bounds(splat) else {
            return;
        };
        self.splat_index = None;

        let offset = aabb.pivot_offset();
        ctx.surface.set_splat_offset(splat, offset);
        ctx.surface.set_container_offset(offset);
        if !self.framer.frame(ctx.surface, &aabb) {
            warn!("splat index ready after camera was already framed");
        }
    }
}
