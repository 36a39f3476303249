use std::collections::{HashMap, HashSet};

use lunarflow_config::Workflow;
use tracing::warn;

use crate::error::WorkflowError;
use crate::graph::DependencyGraph;

/// Check a workflow's structure and report every problem found.
///
/// The graph operations in this crate tolerate all of these problems; this is
/// the place to reject them before saving or running.
pub fn validate(workflow: &Workflow) -> Result<(), Vec<WorkflowError>> {
  let mut errors = Vec::new();

  let mut labels = HashSet::new();
  for component in &workflow.components {
    match component.label.as_deref() {
      None | Some("") => errors.push(WorkflowError::MissingLabel {
        name: component.name.clone(),
      }),
      Some(label) => {
        if !labels.insert(label) {
          errors.push(WorkflowError::DuplicateLabel(label.to_string()));
        }
      }
    }
  }

  for dependency in &workflow.dependencies {
    let from = &dependency.source_label;
    let to = &dependency.target_label;

    if !labels.contains(from.as_str()) || !labels.contains(to.as_str()) {
      errors.push(WorkflowError::InvalidDependency {
        from: from.clone(),
        to: to.clone(),
      });
      continue;
    }

    let Some(input_key) = dependency.component_input_key.as_deref() else {
      if dependency.template_variable_key.is_none() {
        errors.push(WorkflowError::UntargetedDependency {
          from: from.clone(),
          to: to.clone(),
        });
      }
      continue;
    };

    let has_input = workflow
      .component(to)
      .is_some_and(|c| c.input(input_key).is_some());
    if !has_input {
      errors.push(WorkflowError::InputNotFound {
        label: to.clone(),
        input: input_key.to_string(),
      });
    }
  }

  if has_cycle(&DependencyGraph::new(workflow)) {
    errors.push(WorkflowError::CycleDetected);
  }

  if errors.is_empty() {
    Ok(())
  } else {
    warn!(workflow_id = %workflow.id, errors = errors.len(), "workflow_invalid");
    Err(errors)
  }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
  Unvisited,
  InProgress,
  Done,
}

/// DFS colouring: reaching an in-progress label again is a back edge.
fn has_cycle(graph: &DependencyGraph) -> bool {
  let mut marks: HashMap<&str, Mark> = graph.labels().map(|l| (l, Mark::Unvisited)).collect();

  fn visit<'a>(
    label: &'a str,
    graph: &'a DependencyGraph,
    marks: &mut HashMap<&'a str, Mark>,
  ) -> bool {
    marks.insert(label, Mark::InProgress);

    for next in graph.downstream(label) {
      match marks.get(next.as_str()).copied().unwrap_or(Mark::Unvisited) {
        Mark::InProgress => return true,
        Mark::Unvisited => {
          if visit(next, graph, marks) {
            return true;
          }
        }
        Mark::Done => {}
      }
    }

    marks.insert(label, Mark::Done);
    false
  }

  let labels: Vec<&str> = graph.labels().collect();
  labels.into_iter().any(|label| {
    marks.get(label) == Some(&Mark::Unvisited) && visit(label, graph, &mut marks)
  })
}
