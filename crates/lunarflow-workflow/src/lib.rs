//! Lunarflow Workflow
//!
//! The client-side workflow graph model. It translates between the editor's
//! visual graph (nodes and edges) and the serializable [`Workflow`] document,
//! and answers questions about a workflow without talking to the backend:
//!
//! - which component inputs the caller still has to supply ([`workflow_inputs`])
//! - which component produces the workflow's output ([`workflow_output`])
//! - which template variables an input declares and how they render
//!
//! All of these tolerate malformed graphs and resolve unknown labels to
//! `None` or an empty result. [`validate`] reports structural problems
//! explicitly.
//!
//! [`Workflow`]: lunarflow_config::Workflow

mod error;
mod graph;
mod inputs;
mod output;
mod template;
mod validate;
mod view;

pub use error::{TemplateError, WorkflowError};
pub use graph::{DependencyGraph, output_candidates};
pub use inputs::{
  FreeInput, FreeInputKey, UNLABELED_GROUP, apply_free_input, free_inputs, workflow_inputs,
};
pub use output::{output_component, workflow_output, workflow_output_label};
pub use template::{TemplateInput, empty_template_variables, template_parameters};
pub use validate::validate;
pub use view::{
  EDGE_TYPE, EdgeStyle, EditorState, GraphView, MarkerEnd, MarkerType, ViewEdge, ViewNode,
  bind_upstream_outputs, delete_node_by_label, load_workflow, workflow_from_view,
};
