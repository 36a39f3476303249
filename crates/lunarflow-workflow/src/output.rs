//! Output inference.
//!
//! A workflow's output is the component at its unique sink. When dependencies
//! exist, the sink is the single label that is a dependency target but never
//! a source. Without dependencies, a workflow has an output only if it holds
//! exactly one component. Anything else is ambiguous and yields `None` rather
//! than an arbitrary pick.

use lunarflow_config::{ComponentModel, ComponentOutput, Workflow};

use crate::graph::output_candidates;

/// The component producing the workflow's output, if it is unique.
pub fn output_component(workflow: &Workflow) -> Option<&ComponentModel> {
  if workflow.dependencies.is_empty() {
    return match workflow.components.as_slice() {
      [only] => Some(only),
      _ => None,
    };
  }

  match output_candidates(&workflow.dependencies).as_slice() {
    [label] => workflow.component(label),
    _ => None,
  }
}

/// Output slot of the workflow's terminal component.
pub fn workflow_output(workflow: &Workflow) -> Option<&ComponentOutput> {
  output_component(workflow).map(|c| &c.output)
}

/// Label of the workflow's terminal component.
pub fn workflow_output_label(workflow: &Workflow) -> Option<&str> {
  output_component(workflow).and_then(|c| c.label.as_deref())
}
