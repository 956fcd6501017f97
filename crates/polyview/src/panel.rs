use serde_json::Value;

use crate::ParameterKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FolderId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlId(pub u64);

/// The value a panel control shows or reports.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlValue {
    Bool(bool),
    Number(f64),
    Integer(i64),
    Text(String),
    Color(String),
}

impl ControlValue {
    /// Interpret a profile value as a control of the given kind. Only the
    /// plain kinds have a panel control.
    pub fn from_json(kind: ParameterKind, value: &Value) -> Option<Self> {
        match kind {
            ParameterKind::Float => value.as_f64().map(ControlValue::Number),
            ParameterKind::Int => value
                .as_i64()
                .or_else(|| value.as_f64().map(|f| f.round() as i64))
                .map(ControlValue::Integer),
            ParameterKind::Bool => value.as_bool().map(ControlValue::Bool),
            ParameterKind::String => value.as_str().map(|s| ControlValue::Text(s.to_owned())),
            ParameterKind::Color => value.as_str().map(|s| ControlValue::Color(s.to_owned())),
            ParameterKind::Group
            | ParameterKind::Vector2
            | ParameterKind::Vector3
            | ParameterKind::Vector3Array
            | ParameterKind::Image
            | ParameterKind::File
            | ParameterKind::Aabb => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ControlValue::Bool(b) => Value::Bool(*b),
            ControlValue::Number(n) => serde_json::json!(n),
            ControlValue::Integer(i) => Value::from(*i),
            ControlValue::Text(s) | ControlValue::Color(s) => Value::String(s.clone()),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ControlValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ControlValue::Number(n) => Some(*n),
            ControlValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ControlValue::Text(s) | ControlValue::Color(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    Changed { control: ControlId, value: ControlValue },
    Clicked(ControlId),
}

impl PanelEvent {
    pub fn control(&self) -> ControlId {
        match self {
            PanelEvent::Changed { control, .. } => *control,
            PanelEvent::Clicked(control) => *control,
        }
    }
}

/// GUI control panel: folders of labelled controls and buttons. Changes
/// come back as events the viewer polls once per frame.
pub trait ControlPanel {
    fn add_folder(&mut self, parent: Option<FolderId>, name: &str, open: bool) -> FolderId;
    fn remove_folder(&mut self, folder: FolderId);
    fn add_control(&mut self, folder: FolderId, label: &str, value: ControlValue) -> ControlId;
    fn add_button(&mut self, folder: FolderId, label: &str) -> ControlId;
    /// Show a new value without reporting it as a change.
    fn update_display(&mut self, control: ControlId, value: &ControlValue);
    fn poll_event(&mut self) -> Option<PanelEvent>;
}
