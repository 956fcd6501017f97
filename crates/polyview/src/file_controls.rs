//! The "File" folder: profile export/import, model download and the
//! generator graph diagram.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use base64::Engine;
use poll_promise::Promise;
use tracing::{error, info};

use crate::panel::{ControlId, ControlPanel, PanelEvent};
use crate::request::take_ready;
use crate::viewer::ViewerAction;
use crate::{AppContext, Profile, Result};

pub const PROFILE_FILE_NAME: &str = "profile.json";
pub const MODEL_FILE_NAME: &str = "model.zip";

const MERMAID_EDITOR: &str = "https://mermaid.live/edit#";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAction {
    SaveProfile,
    LoadProfile,
    DownloadModel,
    ViewProgram,
}

impl FileAction {
    pub const ALL: [FileAction; 4] = [
        FileAction::SaveProfile,
        FileAction::LoadProfile,
        FileAction::DownloadModel,
        FileAction::ViewProgram,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FileAction::SaveProfile => "Save Profile",
            FileAction::LoadProfile => "Load Profile",
            FileAction::DownloadModel => "Download Model",
            FileAction::ViewProgram => "View Program",
        }
    }
}

#[derive(Default)]
pub struct FileControls {
    buttons: HashMap<ControlId, FileAction>,
    zip: Option<Promise<Result<Vec<u8>>>>,
    mermaid: Option<Promise<Result<String>>>,
}

impl FileControls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_controls(&mut self, panel: &mut dyn ControlPanel) {
        let folder = panel.add_folder(None, "File", false);
        for action in FileAction::ALL {
            let button = panel.add_button(folder, action.label());
            self.buttons.insert(button, action);
        }
    }

    pub fn action_for(&self, control: ControlId) -> Option<FileAction> {
        self.buttons.get(&control).copied()
    }

    /// Handle a button click. Returns `None` when the click wasn't ours or
    /// the result arrives on a later frame through [`FileControls::poll`].
    pub fn on_panel_event(
        &mut self,
        event: &PanelEvent,
        ctx: &mut AppContext<'_>,
        profile: &Profile,
    ) -> Option<ViewerAction> {
        let PanelEvent::Clicked(control) = event else {
            return None;
        };
        let action = self.action_for(*control)?;

        match action {
            FileAction::SaveProfile => match profile_json(profile) {
                Ok(bytes) => Some(ViewerAction::SaveFile {
                    name: PROFILE_FILE_NAME.to_owned(),
                    bytes,
                }),
                Err(err) => {
                    ctx.banners.show_error(err.user_message());
                    None
                }
            },
            FileAction::LoadProfile => Some(ViewerAction::PickProfileFile),
            FileAction::DownloadModel => {
                if self.zip.is_none() {
                    self.zip = Some(ctx.requests.zip());
                }
                None
            }
            FileAction::ViewProgram => {
                if self.mermaid.is_none() {
                    self.mermaid = Some(ctx.requests.mermaid());
                }
                None
            }
        }
    }

    pub fn poll(&mut self, ctx: &mut AppContext<'_>) -> Vec<ViewerAction> {
        let mut actions = Vec::new();

        if let Some(result) = take_ready(&mut self.zip) {
            match result {
                Ok(bytes) => {
                    info!("downloaded model ({} bytes)", bytes.len());
                    actions.push(ViewerAction::SaveFile {
                        name: MODEL_FILE_NAME.to_owned(),
                        bytes,
                    });
                }
                Err(err) => {
                    ctx.banners.show_error(err.user_message());
                }
            }
        }

        if let Some(result) = take_ready(&mut self.mermaid) {
            match result.and_then(|code| mermaid_url(&code)) {
                Ok(url) => actions.push(ViewerAction::OpenUrl(url)),
                Err(err) => error!("fetching program diagram: {err}"),
            }
        }

        actions
    }
}

/// Link that opens `code` in the mermaid.live editor.
pub fn mermaid_url(code: &str) -> Result<String> {
    let state = serde_json::json!({
        "code": code,
        "mermaid": { "securityLevel": "strict" },
    });
    let encoded = base64::engine::general_purpose::STANDARD.encode(serde_json::to_vec(&state)?);
    Ok(format!("{MERMAID_EDITOR}{encoded}"))
}

pub fn profile_json(profile: &Profile) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(profile)?)
}

pub fn parse_profile(bytes: &[u8]) -> Result<Profile> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn save_profile(path: &Path, profile: &Profile) -> Result<()> {
    fs::write(path, profile_json(profile)?)?;
    Ok(())
}

pub fn load_profile(path: &Path) -> Result<Profile> {
    parse_profile(&fs::read(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfilePath;
    use crate::test_utils::{legacy_schema, FakeServer, Harness};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn clicked(harness: &Harness, label: &str) -> PanelEvent {
        PanelEvent::Clicked(harness.panel.control_by_label(label).unwrap().id)
    }

    #[test]
    fn profiles_survive_a_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROFILE_FILE_NAME);

        let mut profile = Profile::from_schema(&legacy_schema(2.5));
        profile
            .set(&ProfilePath::root(&["Height"]), json!(7.0))
            .unwrap();
        save_profile(&path, &profile).unwrap();

        let loaded = load_profile(&path).unwrap();
        assert_eq!(loaded, profile);

        let raw: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["Parameters"]["Height"], json!(7.0));
    }

    #[test]
    fn garbage_profiles_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, b"{ not json").unwrap();

        assert!(load_profile(&path).is_err());
        assert!(load_profile(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn mermaid_link_encodes_the_diagram() {
        let url = mermaid_url("graph TD; A-->B").unwrap();
        let encoded = url.strip_prefix(MERMAID_EDITOR).unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        let state: Value = serde_json::from_slice(&decoded).unwrap();

        assert_eq!(
            state,
            json!({ "code": "graph TD; A-->B", "mermaid": { "securityLevel": "strict" } })
        );
    }

    #[test]
    fn buttons_map_to_actions() {
        let server = FakeServer::with_schema(legacy_schema(1.0));
        let mut harness = Harness::new(&server);
        let mut files = FileControls::new();
        files.register_controls(&mut harness.panel);
        let profile = Profile::from_schema(&legacy_schema(1.0));

        let save = clicked(&harness, "Save Profile");
        match files.on_panel_event(&save, &mut harness.ctx(), &profile) {
            Some(ViewerAction::SaveFile { name, bytes }) => {
                assert_eq!(name, PROFILE_FILE_NAME);
                assert_eq!(parse_profile(&bytes).unwrap(), profile);
            }
            other => panic!("unexpected {other:?}"),
        }

        let load = clicked(&harness, "Load Profile");
        assert_eq!(
            files.on_panel_event(&load, &mut harness.ctx(), &profile),
            Some(ViewerAction::PickProfileFile)
        );

        let download = clicked(&harness, "Download Model");
        let view = clicked(&harness, "View Program");
        assert_eq!(files.on_panel_event(&download, &mut harness.ctx(), &profile), None);
        assert_eq!(files.on_panel_event(&view, &mut harness.ctx(), &profile), None);

        let actions = files.poll(&mut harness.ctx());
        assert_eq!(actions.len(), 2);
        assert_eq!(
            actions[0],
            ViewerAction::SaveFile {
                name: MODEL_FILE_NAME.to_owned(),
                bytes: server.zip_bytes(),
            }
        );
        assert!(matches!(&actions[1], ViewerAction::OpenUrl(url) if url.starts_with(MERMAID_EDITOR)));
    }

    #[test]
    fn failed_downloads_show_a_banner() {
        let server = FakeServer::with_schema(legacy_schema(1.0));
        server.fail("/zip", 500, "nothing generated yet");
        let mut harness = Harness::new(&server);
        let mut files = FileControls::new();
        files.register_controls(&mut harness.panel);
        let profile = Profile::default();

        let download = clicked(&harness, "Download Model");
        files.on_panel_event(&download, &mut harness.ctx(), &profile);
        assert!(files.poll(&mut harness.ctx()).is_empty());

        let errors: Vec<&str> = harness.banners.errors().map(|b| b.text.as_str()).collect();
        assert_eq!(errors, vec!["nothing generated yet"]);
    }
}
