//! Panel controls for the generator's profile parameters.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::panel::{ControlId, ControlPanel, ControlValue, FolderId, PanelEvent};
use crate::profile::ProfilePath;
use crate::schema::ParameterKind;
use crate::schema_manager::SchemaManager;
use crate::{ParameterSchema, RequestManager, Result, Schema};

const ROOT_FOLDER: &str = "Parameters";

/// One control's place in the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutEntry {
    /// Folder names below the root folder, outermost first.
    pub folders: Vec<String>,
    pub path: ProfilePath,
    pub kind: ParameterKind,
}

/// Work out which profile leaves get a control and where they go. Groups
/// and sub-generators become folders. Kinds without a plain control are
/// edited on their graph node instead.
pub fn layout(schema: &Schema) -> Result<Vec<LayoutEntry>> {
    let mut out = Vec::new();
    walk_generator(schema, &mut Vec::new(), &mut Vec::new(), &mut out)?;
    Ok(out)
}

fn walk_generator(
    schema: &Schema,
    generators: &mut Vec<String>,
    folders: &mut Vec<String>,
    out: &mut Vec<LayoutEntry>,
) -> Result<()> {
    if let Some(root) = &schema.parameters {
        walk_group(root, generators, &mut Vec::new(), folders, out)?;
    }

    for (key, sub) in &schema.sub_generators {
        generators.push(key.clone());
        folders.push(key.clone());
        walk_generator(sub, generators, folders, out)?;
        folders.pop();
        generators.pop();
    }

    Ok(())
}

fn walk_group(
    group: &ParameterSchema,
    generators: &[String],
    groups: &mut Vec<String>,
    folders: &mut Vec<String>,
    out: &mut Vec<LayoutEntry>,
) -> Result<()> {
    for param in &group.parameters {
        let kind = param.kind()?;
        if kind == ParameterKind::Group {
            groups.push(param.name.clone());
            folders.push(param.name.clone());
            walk_group(param, generators, groups, folders, out)?;
            folders.pop();
            groups.pop();
            continue;
        }

        if !kind.is_basic() {
            debug!("no panel control for {} ({kind:?})", param.name);
            continue;
        }

        let mut parameter = groups.clone();
        parameter.push(param.name.clone());
        out.push(LayoutEntry {
            folders: folders.clone(),
            path: ProfilePath::new(generators.to_vec(), parameter),
            kind,
        });
    }

    Ok(())
}

#[derive(Debug, Default)]
pub struct ProfilePanel {
    root: Option<FolderId>,
    layout: Vec<LayoutEntry>,
    controls: HashMap<ControlId, (ProfilePath, ParameterKind)>,
    by_path: HashMap<ProfilePath, ControlId>,
    revision: u64,
}

impl ProfilePanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn control_for(&self, path: &ProfilePath) -> Option<ControlId> {
        self.by_path.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Bring the panel up to date after a merge. Controls are rebuilt only
    /// when the schema's shape changed; otherwise just the displayed values
    /// are refreshed.
    pub fn sync(&mut self, panel: &mut dyn ControlPanel, schema: &SchemaManager) -> Result<()> {
        if schema.revision() == self.revision {
            return Ok(());
        }
        self.revision = schema.revision();

        let Some(current) = schema.schema() else {
            return Ok(());
        };

        let layout = layout(current)?;
        if layout != self.layout || self.root.is_none() {
            self.rebuild(panel, layout, schema);
            return Ok(());
        }

        for (control, (path, kind)) in &self.controls {
            if let Some(value) = schema
                .profile()
                .get(path)
                .and_then(|v| ControlValue::from_json(*kind, v))
            {
                panel.update_display(*control, &value);
            }
        }
        Ok(())
    }

    fn rebuild(&mut self, panel: &mut dyn ControlPanel, layout: Vec<LayoutEntry>, schema: &SchemaManager) {
        if let Some(root) = self.root.take() {
            panel.remove_folder(root);
        }
        self.controls.clear();
        self.by_path.clear();

        let root = panel.add_folder(None, ROOT_FOLDER, true);
        let mut folders: HashMap<Vec<String>, FolderId> = HashMap::new();

        for entry in &layout {
            let mut parent = root;
            for depth in 1..=entry.folders.len() {
                let chain = &entry.folders[..depth];
                parent = match folders.get(chain) {
                    Some(folder) => *folder,
                    None => {
                        let folder = panel.add_folder(Some(parent), &chain[depth - 1], false);
                        folders.insert(chain.to_vec(), folder);
                        folder
                    }
                };
            }

            let Some(value) = schema
                .profile()
                .get(&entry.path)
                .and_then(|v| ControlValue::from_json(entry.kind, v))
            else {
                warn!("profile has no usable value for {}", entry.path);
                continue;
            };

            let control = panel.add_control(parent, entry.path.name(), value);
            self.controls.insert(control, (entry.path.clone(), entry.kind));
            self.by_path.insert(entry.path.clone(), control);
        }

        debug!("built {} profile controls", self.controls.len());
        self.root = Some(root);
        self.layout = layout;
    }

    /// Route a panel change to the profile. Returns false if the control
    /// isn't one of ours.
    pub fn on_panel_event(
        &mut self,
        event: &PanelEvent,
        requests: &RequestManager,
        schema: &mut SchemaManager,
    ) -> Result<bool> {
        let PanelEvent::Changed { control, value } = event else {
            return Ok(false);
        };
        let Some((path, _)) = self.controls.get(control) else {
            return Ok(false);
        };

        schema.edit(path, value.to_json())?;
        schema.push_profile(requests);
        Ok(true)
    }
}
