//! Visual graph representation used by the editor.
//!
//! Nodes and edges follow the React Flow shape the front-end renders: a node
//! carries its component in `data`, an edge points at an input through its
//! `targetHandle`. A handle is either an input key (`"text"`) or an input key
//! and template variable (`"prompt.topic"`).

use std::collections::HashMap;

use lunarflow_config::{ComponentDependency, ComponentModel, ComponentPosition, Workflow};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const EDGE_TYPE: &str = "smoothstep";

fn default_edge_type() -> String {
  EDGE_TYPE.to_string()
}

/// A component placed on the canvas. `id` is the component label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewNode {
  pub id: String,
  #[serde(default)]
  pub position: ComponentPosition,
  pub data: ComponentModel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
  pub stroke_width: u32,
  pub stroke: String,
}

impl Default for EdgeStyle {
  fn default() -> Self {
    Self {
      stroke_width: 3,
      stroke: "#ccc".to_string(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerType {
  #[default]
  Arrow,
  ArrowClosed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerEnd {
  #[serde(rename = "type")]
  pub marker_type: MarkerType,
  pub width: u32,
  pub height: u32,
}

impl Default for MarkerEnd {
  fn default() -> Self {
    Self {
      marker_type: MarkerType::Arrow,
      width: 16,
      height: 16,
    }
  }
}

/// A connection from one component's output to another component's input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewEdge {
  pub id: String,
  pub source: String,
  pub target: String,
  #[serde(default)]
  pub target_handle: Option<String>,
  #[serde(rename = "type", default = "default_edge_type")]
  pub edge_type: String,
  #[serde(default)]
  pub style: EdgeStyle,
  #[serde(default)]
  pub marker_end: MarkerEnd,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data: Option<ComponentDependency>,
}

impl ViewEdge {
  /// Edge with the editor's fixed presentation.
  pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      source: source.into(),
      target: target.into(),
      target_handle: None,
      edge_type: default_edge_type(),
      style: EdgeStyle::default(),
      marker_end: MarkerEnd::default(),
      data: None,
    }
  }

  pub fn with_target_handle(mut self, handle: impl Into<String>) -> Self {
    self.target_handle = Some(handle.into());
    self
  }

  /// Input key and, when present, canonical template variable key targeted
  /// by this edge.
  pub fn target_slots(&self) -> (Option<String>, Option<String>) {
    let Some(handle) = self.target_handle.as_deref() else {
      return (None, None);
    };

    let mut parts = handle.split('.');
    let input_key = parts.next().filter(|k| !k.is_empty());
    let template = parts.next().filter(|t| !t.is_empty());

    match (input_key, template) {
      (Some(input), Some(template)) => (
        Some(input.to_string()),
        Some(format!("{}.{}", input, template)),
      ),
      (Some(input), None) => (Some(input.to_string()), None),
      _ => (None, None),
    }
  }
}

/// Receives workflow metadata whenever a workflow is loaded into the editor.
pub trait EditorState {
  fn set_values(&mut self, name: &str, description: &str);

  fn set_errors(&mut self, _errors: &[String]) {}

  fn set_results(&mut self, _results: &HashMap<String, ComponentModel>) {}
}

/// The editor's in-memory graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphView {
  nodes: Vec<ViewNode>,
  edges: Vec<ViewEdge>,
}

impl GraphView {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn nodes(&self) -> &[ViewNode] {
    &self.nodes
  }

  pub fn edges(&self) -> &[ViewEdge] {
    &self.edges
  }

  pub fn node(&self, label: &str) -> Option<&ViewNode> {
    self.nodes.iter().find(|n| n.id == label)
  }

  pub fn set_nodes(&mut self, nodes: Vec<ViewNode>) {
    self.nodes = nodes;
  }

  pub fn set_edges(&mut self, edges: Vec<ViewEdge>) {
    self.edges = edges;
  }

  /// Remove a node and every edge touching it.
  pub fn delete_node(&mut self, label: &str) {
    self.nodes.retain(|n| n.id != label);
    self
      .edges
      .retain(|e| e.source != label && e.target != label);
  }

  /// Snapshot the current graph as a workflow document.
  pub fn to_workflow(
    &self,
    id: &str,
    name: &str,
    description: &str,
    user_id: Option<&str>,
  ) -> Workflow {
    workflow_from_view(id, name, description, &self.nodes, &self.edges, user_id)
  }
}

/// Build a workflow document from the editor's nodes and edges.
///
/// Node ids become component labels. `user_id` is only recorded in traces.
pub fn workflow_from_view(
  id: &str,
  name: &str,
  description: &str,
  nodes: &[ViewNode],
  edges: &[ViewEdge],
  user_id: Option<&str>,
) -> Workflow {
  let components = nodes
    .iter()
    .map(|node| {
      let mut component = node.data.clone();
      component.group = component.group.replace(' ', "_");
      component.label = Some(node.id.clone());
      component.position = Some(node.position);
      component.workflow_id = Some(id.to_string());
      component
    })
    .collect();

  let dependencies = edges
    .iter()
    .map(|edge| {
      let (component_input_key, template_variable_key) = edge.target_slots();
      ComponentDependency {
        id: None,
        component_input_key,
        template_variable_key,
        source_label: edge.source.clone(),
        target_label: edge.target.clone(),
      }
    })
    .collect();

  debug!(
    workflow_id = %id,
    user_id = user_id.unwrap_or("anonymous"),
    nodes = nodes.len(),
    edges = edges.len(),
    "workflow_from_view"
  );

  let mut workflow = Workflow::new(id, name);
  workflow.description = description.to_string();
  workflow.components = components;
  workflow.dependencies = dependencies;
  workflow
}

/// Replace the editor's graph with the given workflow.
///
/// Components without a label are placed under an empty id.
pub fn load_workflow(graph: &mut GraphView, workflow: &Workflow, state: &mut impl EditorState) {
  state.set_values(&workflow.name, &workflow.description);
  if !workflow.invalid_errors.is_empty() {
    state.set_errors(&workflow.invalid_errors);
  }

  graph.set_nodes(
    workflow
      .components
      .iter()
      .map(|component| ViewNode {
        id: component.label.clone().unwrap_or_default(),
        position: component.position.unwrap_or_default(),
        data: component.clone(),
      })
      .collect(),
  );

  graph.set_edges(
    workflow
      .dependencies
      .iter()
      .enumerate()
      .map(|(index, dependency)| {
        let mut edge = ViewEdge::new(
          index.to_string(),
          &dependency.source_label,
          &dependency.target_label,
        );
        edge.target_handle = dependency.target_slot().map(str::to_string);
        edge.data = Some(dependency.clone());
        edge
      })
      .collect(),
  );

  debug!(
    workflow_id = %workflow.id,
    nodes = graph.nodes.len(),
    edges = graph.edges.len(),
    "workflow_loaded"
  );
}

pub fn delete_node_by_label(graph: &mut GraphView, label: &str) {
  graph.delete_node(label);
}

/// The component behind `label` with every input that an incoming edge
/// targets filled from the upstream node's output value.
///
/// Returns `None` when no node has that label. Edges from unknown nodes or
/// into unknown inputs are ignored.
pub fn bind_upstream_outputs(graph: &GraphView, label: &str) -> Option<ComponentModel> {
  let mut component = graph.node(label)?.data.clone();

  for edge in graph.edges.iter().filter(|e| e.target == label) {
    let Some(upstream) = graph.node(&edge.source) else {
      continue;
    };
    let value = upstream.data.output.value.clone();

    match edge.target_slots() {
      (Some(input_key), Some(template_key)) => {
        if let Some(input) = component.input_mut(&input_key) {
          input.template_variables.insert(template_key, value);
        }
      }
      (Some(input_key), None) => {
        if let Some(input) = component.input_mut(&input_key) {
          input.value = value;
        }
      }
      _ => {}
    }
  }

  Some(component)
}

#[cfg(test)]
mod tests {
  use super::*;
  use lunarflow_config::{ComponentDataType, ComponentInput, ComponentOutput};
  use serde_json::json;

  #[derive(Default)]
  struct RecordingState {
    name: String,
    description: String,
    errors: Vec<String>,
  }

  impl EditorState for RecordingState {
    fn set_values(&mut self, name: &str, description: &str) {
      self.name = name.to_string();
      self.description = description.to_string();
    }

    fn set_errors(&mut self, errors: &[String]) {
      self.errors = errors.to_vec();
    }
  }

  fn node(id: &str, x: f64, y: f64) -> ViewNode {
    ViewNode {
      id: id.to_string(),
      position: ComponentPosition::new(x, y),
      data: ComponentModel::new("Comp", "Comp")
        .with_group("Text Processing")
        .with_input(ComponentInput::new("text", ComponentDataType::Text))
        .with_input(
          ComponentInput::new("prompt", ComponentDataType::Template)
            .with_value("{topic}")
            .with_template_variable("prompt.topic", ""),
        ),
    }
  }

  fn sample_workflow() -> Workflow {
    let nodes = vec![node("A", 0.0, 0.0), node("B", 100.0, 50.0), node("C", 200.0, 0.0)];
    let edges = vec![
      ViewEdge::new("0", "A", "B").with_target_handle("text"),
      ViewEdge::new("1", "B", "C").with_target_handle("prompt.topic"),
    ];
    workflow_from_view("wf-1", "Flow", "Demo", &nodes, &edges, Some("user"))
  }

  #[test]
  fn test_workflow_from_view() {
    let workflow = sample_workflow();

    assert_eq!(workflow.id, "wf-1");
    assert!(workflow.invalid_errors.is_empty());
    assert_eq!(workflow.components.len(), 3);

    let b = workflow.component("B").unwrap();
    assert_eq!(b.group, "Text_Processing");
    assert_eq!(b.workflow_id.as_deref(), Some("wf-1"));
    assert_eq!(b.position, Some(ComponentPosition::new(100.0, 50.0)));

    let plain = &workflow.dependencies[0];
    assert_eq!(plain.component_input_key.as_deref(), Some("text"));
    assert_eq!(plain.template_variable_key, None);

    let templated = &workflow.dependencies[1];
    assert_eq!(templated.component_input_key.as_deref(), Some("prompt"));
    assert_eq!(templated.template_variable_key.as_deref(), Some("prompt.topic"));
  }

  #[test]
  fn test_group_replaces_every_space() {
    let mut n = node("A", 0.0, 0.0);
    n.data.group = "Large Language Models".to_string();
    let workflow = workflow_from_view("wf", "n", "d", &[n], &[], None);
    assert_eq!(workflow.components[0].group, "Large_Language_Models");
  }

  #[test]
  fn test_edge_without_handle_targets_nothing() {
    let nodes = vec![node("A", 0.0, 0.0), node("B", 0.0, 0.0)];
    let edges = vec![ViewEdge::new("0", "A", "B")];
    let workflow = workflow_from_view("wf", "n", "d", &nodes, &edges, None);

    assert_eq!(workflow.dependencies[0].component_input_key, None);
    assert_eq!(workflow.dependencies[0].template_variable_key, None);
  }

  #[test]
  fn test_load_workflow() {
    let workflow = sample_workflow();
    let mut graph = GraphView::new();
    let mut state = RecordingState::default();

    load_workflow(&mut graph, &workflow, &mut state);

    assert_eq!(state.name, "Flow");
    assert_eq!(state.description, "Demo");
    assert!(state.errors.is_empty());
    assert_eq!(graph.nodes().len(), 3);
    assert_eq!(graph.node("B").unwrap().position, ComponentPosition::new(100.0, 50.0));

    let edge = &graph.edges()[1];
    assert_eq!(edge.id, "1");
    assert_eq!(edge.target_handle.as_deref(), Some("prompt.topic"));
    assert_eq!(edge.edge_type, EDGE_TYPE);
    assert_eq!(edge.style, EdgeStyle::default());
    assert_eq!(edge.marker_end.marker_type, MarkerType::Arrow);
    assert_eq!(edge.data.as_ref(), Some(&workflow.dependencies[1]));
  }

  #[test]
  fn test_load_workflow_defaults_position_and_reports_errors() {
    let mut workflow = Workflow::new("wf", "n");
    workflow.components = vec![ComponentModel::new("Comp", "Comp").with_label("A")];
    workflow.invalid_errors = vec!["broken".to_string()];

    let mut graph = GraphView::new();
    let mut state = RecordingState::default();
    load_workflow(&mut graph, &workflow, &mut state);

    assert_eq!(graph.nodes()[0].position, ComponentPosition::default());
    assert_eq!(state.errors, vec!["broken".to_string()]);
  }

  #[test]
  fn test_load_is_idempotent() {
    let workflow = sample_workflow();
    let mut graph = GraphView::new();
    let mut state = RecordingState::default();

    load_workflow(&mut graph, &workflow, &mut state);
    let first = graph.clone();
    load_workflow(&mut graph, &workflow, &mut state);

    assert_eq!(graph, first);
  }

  #[test]
  fn test_round_trip_preserves_workflow() {
    let workflow = sample_workflow();
    let mut graph = GraphView::new();
    load_workflow(&mut graph, &workflow, &mut RecordingState::default());

    let rebuilt = graph.to_workflow(&workflow.id, &workflow.name, &workflow.description, None);
    assert_eq!(rebuilt, workflow);
  }

  #[test]
  fn test_delete_node_by_label() {
    let workflow = sample_workflow();
    let mut graph = GraphView::new();
    load_workflow(&mut graph, &workflow, &mut RecordingState::default());

    delete_node_by_label(&mut graph, "B");

    assert_eq!(graph.nodes().len(), 2);
    assert!(graph.node("B").is_none());
    assert!(graph.edges().is_empty());

    delete_node_by_label(&mut graph, "missing");
    assert_eq!(graph.nodes().len(), 2);
  }

  #[test]
  fn test_edge_serializes_react_flow_shape() {
    let edge = ViewEdge::new("0", "A", "B").with_target_handle("text");
    let value = serde_json::to_value(&edge).unwrap();

    assert_eq!(value["type"], json!("smoothstep"));
    assert_eq!(value["targetHandle"], json!("text"));
    assert_eq!(value["style"], json!({ "strokeWidth": 3, "stroke": "#ccc" }));
    assert_eq!(
      value["markerEnd"],
      json!({ "type": "arrow", "width": 16, "height": 16 })
    );
  }

  #[test]
  fn test_bind_upstream_outputs() {
    let mut a = node("A", 0.0, 0.0);
    a.data.output = ComponentOutput::new(ComponentDataType::Text);
    a.data.output.value = json!("upstream text");
    let mut b = node("B", 0.0, 0.0);
    b.data.output.value = json!("topic value");

    let mut graph = GraphView::new();
    graph.set_nodes(vec![a, b, node("C", 0.0, 0.0)]);
    graph.set_edges(vec![
      ViewEdge::new("0", "A", "C").with_target_handle("text"),
      ViewEdge::new("1", "B", "C").with_target_handle("prompt.topic"),
      ViewEdge::new("2", "ghost", "C").with_target_handle("text"),
    ]);

    let bound = bind_upstream_outputs(&graph, "C").unwrap();
    assert_eq!(bound.input("text").unwrap().value, json!("upstream text"));
    assert_eq!(
      bound.input("prompt").unwrap().template_variables["prompt.topic"],
      json!("topic value")
    );

    assert!(bind_upstream_outputs(&graph, "missing").is_none());
  }
}
