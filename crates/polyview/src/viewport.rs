use std::collections::HashMap;

use roomlink::WebScene;
use tracing::{debug, warn};

use crate::panel::{ControlId, ControlPanel, ControlValue, PanelEvent};
use crate::surface::{RenderSurface, ViewportCommand};

/// The viewport settings shared with the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewportSetting {
    RenderWireframe,
    Background,
    Lighting,
    Ground,
    FogColor,
    FogNear,
    FogFar,
}

impl ViewportSetting {
    pub const ALL: [ViewportSetting; 7] = [
        ViewportSetting::RenderWireframe,
        ViewportSetting::Background,
        ViewportSetting::Lighting,
        ViewportSetting::Ground,
        ViewportSetting::FogColor,
        ViewportSetting::FogNear,
        ViewportSetting::FogFar,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ViewportSetting::RenderWireframe => "renderWireframe",
            ViewportSetting::Background => "background",
            ViewportSetting::Lighting => "lighting",
            ViewportSetting::Ground => "ground",
            ViewportSetting::FogColor => "fog/color",
            ViewportSetting::FogNear => "fog/near",
            ViewportSetting::FogFar => "fog/far",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ViewportSetting::RenderWireframe => "Render Wireframe",
            ViewportSetting::Background => "Background",
            ViewportSetting::Lighting => "Lighting",
            ViewportSetting::Ground => "Ground",
            ViewportSetting::FogColor => "Color",
            ViewportSetting::FogNear => "Near",
            ViewportSetting::FogFar => "Far",
        }
    }

    pub fn is_fog(&self) -> bool {
        matches!(
            self,
            ViewportSetting::FogColor | ViewportSetting::FogNear | ViewportSetting::FogFar
        )
    }

    pub fn read(&self, scene: &WebScene) -> ControlValue {
        match self {
            ViewportSetting::RenderWireframe => ControlValue::Bool(scene.render_wireframe),
            ViewportSetting::Background => ControlValue::Color(scene.background.clone()),
            ViewportSetting::Lighting => ControlValue::Color(scene.lighting.clone()),
            ViewportSetting::Ground => ControlValue::Color(scene.ground.clone()),
            ViewportSetting::FogColor => ControlValue::Color(scene.fog.color.clone()),
            ViewportSetting::FogNear => ControlValue::Number(scene.fog.near as f64),
            ViewportSetting::FogFar => ControlValue::Number(scene.fog.far as f64),
        }
    }

    /// Store `value` into `scene`. Returns false if the value has the wrong
    /// shape for this setting.
    pub fn write(&self, scene: &mut WebScene, value: &ControlValue) -> bool {
        match self {
            ViewportSetting::RenderWireframe => {
                let Some(b) = value.as_bool() else {
                    return false;
                };
                scene.render_wireframe = b;
            }
            ViewportSetting::Background
            | ViewportSetting::Lighting
            | ViewportSetting::Ground
            | ViewportSetting::FogColor => {
                let Some(s) = value.as_str() else {
                    return false;
                };
                let slot = match self {
                    ViewportSetting::Background => &mut scene.background,
                    ViewportSetting::Lighting => &mut scene.lighting,
                    ViewportSetting::Ground => &mut scene.ground,
                    _ => &mut scene.fog.color,
                };
                *slot = s.to_owned();
            }
            ViewportSetting::FogNear | ViewportSetting::FogFar => {
                let Some(n) = value.as_f64() else {
                    return false;
                };
                if *self == ViewportSetting::FogNear {
                    scene.fog.near = n as f32;
                } else {
                    scene.fog.far = n as f32;
                }
            }
        }
        true
    }

    /// The scene mutation that makes the renderer reflect this setting.
    pub fn command(&self, scene: &WebScene) -> ViewportCommand {
        match self {
            ViewportSetting::RenderWireframe => ViewportCommand::Wireframe(scene.render_wireframe),
            ViewportSetting::Background => ViewportCommand::Background(scene.background.clone()),
            ViewportSetting::Lighting => ViewportCommand::Lighting(scene.lighting.clone()),
            ViewportSetting::Ground => ViewportCommand::Ground(scene.ground.clone()),
            ViewportSetting::FogColor => ViewportCommand::FogColor(scene.fog.color.clone()),
            ViewportSetting::FogNear => ViewportCommand::FogNear(scene.fog.near),
            ViewportSetting::FogFar => ViewportCommand::FogFar(scene.fog.far),
        }
    }
}

/// Local viewport settings mirrored with the room.
///
/// A local edit marks the settings dirty; while dirty, remote values are
/// ignored so a stale echo from the server can't undo the edit. The flag is
/// cleared when the settings are taken for sending.
#[derive(Debug, Default)]
pub struct ViewportManager {
    settings: WebScene,
    dirty: bool,
    controls: HashMap<ControlId, ViewportSetting>,
    by_setting: HashMap<ViewportSetting, ControlId>,
}

impl ViewportManager {
    pub fn new(settings: WebScene) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn settings(&self) -> &WebScene {
        &self.settings
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Add the "Rendering" folder (with its "Fog" subfolder) to the panel.
    pub fn register_controls(&mut self, panel: &mut dyn ControlPanel) {
        let rendering = panel.add_folder(None, "Rendering", false);
        let fog = panel.add_folder(Some(rendering), "Fog", false);

        for setting in ViewportSetting::ALL {
            let folder = if setting.is_fog() { fog } else { rendering };
            let control = panel.add_control(folder, setting.label(), setting.read(&self.settings));
            self.controls.insert(control, setting);
            self.by_setting.insert(setting, control);
        }
    }

    /// Push every setting to the renderer.
    pub fn apply_all(&self, surface: &mut dyn RenderSurface) {
        for setting in ViewportSetting::ALL {
            surface.apply_viewport(&setting.command(&self.settings));
        }
    }

    pub fn local_edit(
        &mut self,
        setting: ViewportSetting,
        value: &ControlValue,
        surface: &mut dyn RenderSurface,
    ) -> bool {
        if !setting.write(&mut self.settings, value) {
            warn!("ignoring {value:?} for viewport setting {}", setting.key());
            return false;
        }
        self.dirty = true;
        surface.apply_viewport(&setting.command(&self.settings));
        true
    }

    /// Handle a panel change if it belongs to one of our controls.
    pub fn on_panel_event(&mut self, event: &PanelEvent, surface: &mut dyn RenderSurface) -> bool {
        let PanelEvent::Changed { control, value } = event else {
            return false;
        };
        let Some(setting) = self.controls.get(control).copied() else {
            return false;
        };
        self.local_edit(setting, value, surface);
        true
    }

    /// Apply a room-state scene. Skipped entirely while a local edit is
    /// waiting to be sent. Returns how many settings changed.
    pub fn apply_remote(
        &mut self,
        remote: &WebScene,
        panel: &mut dyn ControlPanel,
        surface: &mut dyn RenderSurface,
    ) -> usize {
        if self.dirty {
            return 0;
        }

        let mut changed = 0;
        for setting in ViewportSetting::ALL {
            let theirs = setting.read(remote);
            if setting.read(&self.settings) == theirs {
                continue;
            }

            debug!("remote viewport change: {}", setting.key());
            setting.write(&mut self.settings, &theirs);
            if let Some(control) = self.by_setting.get(&setting) {
                panel.update_display(*control, &theirs);
            }
            surface.apply_viewport(&setting.command(&self.settings));
            changed += 1;
        }
        changed
    }

    /// The settings to send, if a local edit is pending. Clears the flag.
    pub fn take_outbound(&mut self) -> Option<WebScene> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.settings.clone())
    }
}
