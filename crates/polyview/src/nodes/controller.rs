use poll_promise::Promise;

use crate::nodes::editor::NodeView;
use crate::nodes::node_title;
use crate::nodes::parameter::build_parameter;
use crate::request::RequestManager;
use crate::schema::NodeSchema;
use crate::Result;

/// Keeps one editor node in step with its schema node.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyNodeController {
    id: String,
    version: u64,
    view: NodeView,
}

fn build_view(node: &NodeSchema, producer: Option<&str>) -> Result<NodeView> {
    let widget = node.parameter.as_ref().map(build_parameter).transpose()?;

    // parameter nodes are better known by the name the user gave them
    let title = match &node.parameter {
        Some(_) if !node.name.is_empty() => node.name.clone(),
        _ => node_title(&node.node_type),
    };

    Ok(NodeView {
        title,
        node_type: node.node_type.clone(),
        inputs: node.dependencies.iter().map(|d| d.name.clone()).collect(),
        outputs: node.outputs.iter().map(|o| o.name.clone()).collect(),
        widget,
        producer: producer.map(str::to_owned),
    })
}

impl PolyNodeController {
    pub fn new(id: &str, node: &NodeSchema, producer: Option<&str>) -> Result<Self> {
        Ok(Self {
            id: id.to_owned(),
            version: node.version,
            view: build_view(node, producer)?,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn view(&self) -> &NodeView {
        &self.view
    }

    pub fn producer(&self) -> Option<&str> {
        self.view.producer.as_deref()
    }

    /// Take over a controller rebuilt from a newer schema node. Returns true
    /// if the editor needs redrawing.
    pub fn update(&mut self, rebuilt: PolyNodeController) -> bool {
        self.version = rebuilt.version;
        if rebuilt.view == self.view {
            return false;
        }
        self.view = rebuilt.view;
        true
    }

    /// The Download action: fetch this node's producer output.
    pub fn download(&self, requests: &RequestManager) -> Option<Promise<Result<Vec<u8>>>> {
        self.producer().map(|name| requests.producer(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::parameter::ParameterWidget;
    use crate::test_utils::node_schema;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn ports_mirror_dependencies_and_outputs() {
        let schema = node_schema();
        let text = PolyNodeController::new("Node-1", &schema.nodes["Node-1"], Some("out.txt")).unwrap();

        assert_eq!(text.view().title, "Text");
        assert_eq!(text.view().inputs, vec!["In"]);
        assert_eq!(text.producer(), Some("out.txt"));

        let x = PolyNodeController::new("X", &schema.nodes["X"], None).unwrap();
        assert_eq!(x.view().title, "X");
        assert_eq!(x.view().outputs, vec!["Out"]);
        assert_eq!(
            x.view().widget,
            Some(ParameterWidget::Number {
                value: 1.0,
                integer: false
            })
        );
    }

    #[test]
    fn update_reports_real_changes_only() {
        let schema = node_schema();
        let mut node = schema.nodes["X"].clone();
        let mut x = PolyNodeController::new("X", &node, None).unwrap();

        let same = PolyNodeController::new("X", &node, None).unwrap();
        assert!(!x.update(same));

        node.version += 1;
        node.parameter.as_mut().unwrap().current_value = json!(2.0);
        let changed = PolyNodeController::new("X", &node, None).unwrap();
        assert!(x.update(changed));
        assert_eq!(x.version(), node.version);
    }

    #[test]
    fn unknown_parameter_types_fail_construction() {
        let mut node = node_schema().nodes["X"].clone();
        node.parameter.as_mut().unwrap().type_tag = "quaternion.Quaternion".to_owned();

        assert!(PolyNodeController::new("X", &node, None).is_err());
    }
}
