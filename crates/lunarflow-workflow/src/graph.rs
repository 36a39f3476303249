use std::collections::{HashMap, HashSet};

use lunarflow_config::{ComponentDependency, Workflow};

/// Label-level view of a workflow's dependencies for traversal and analysis.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
  /// Adjacency list: label -> list of downstream labels.
  adjacency: HashMap<String, Vec<String>>,
  /// Reverse adjacency: label -> list of upstream labels.
  reverse_adjacency: HashMap<String, Vec<String>>,
  /// Components with no incoming dependencies, in component order.
  entry_points: Vec<String>,
  /// Components with multiple incoming dependencies.
  join_points: HashSet<String>,
}

impl DependencyGraph {
  /// Build a graph from a workflow. Components without a label are skipped.
  pub fn new(workflow: &Workflow) -> Self {
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut reverse_adjacency: HashMap<String, Vec<String>> = HashMap::new();

    let labels: Vec<&str> = workflow
      .components
      .iter()
      .filter_map(|c| c.label.as_deref())
      .collect();

    for label in &labels {
      adjacency.entry(label.to_string()).or_default();
      reverse_adjacency.entry(label.to_string()).or_default();
    }

    for dependency in &workflow.dependencies {
      adjacency
        .entry(dependency.source_label.clone())
        .or_default()
        .push(dependency.target_label.clone());
      reverse_adjacency
        .entry(dependency.target_label.clone())
        .or_default()
        .push(dependency.source_label.clone());
    }

    let entry_points: Vec<String> = labels
      .iter()
      .filter(|label| reverse_adjacency.get(**label).is_none_or(|v| v.is_empty()))
      .map(|label| label.to_string())
      .collect();

    let join_points: HashSet<String> = reverse_adjacency
      .iter()
      .filter(|(_, incoming)| incoming.len() > 1)
      .map(|(label, _)| label.clone())
      .collect();

    Self {
      adjacency,
      reverse_adjacency,
      entry_points,
      join_points,
    }
  }

  /// Components with no incoming dependencies.
  pub fn entry_points(&self) -> &[String] {
    &self.entry_points
  }

  /// Downstream labels of a component.
  pub fn downstream(&self, label: &str) -> &[String] {
    self
      .adjacency
      .get(label)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Upstream labels of a component.
  pub fn upstream(&self, label: &str) -> &[String] {
    self
      .reverse_adjacency
      .get(label)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  pub fn is_join_point(&self, label: &str) -> bool {
    self.join_points.contains(label)
  }

  pub fn join_points(&self) -> &HashSet<String> {
    &self.join_points
  }

  /// Every label known to the graph, including labels only mentioned by
  /// dependencies.
  pub fn labels(&self) -> impl Iterator<Item = &str> {
    self.adjacency.keys().map(String::as_str)
  }
}

/// Labels that are the target of some dependency but never a source.
///
/// Each label appears once, in order of first appearance as a target.
pub fn output_candidates(dependencies: &[ComponentDependency]) -> Vec<&str> {
  let sources: HashSet<&str> = dependencies
    .iter()
    .map(|d| d.source_label.as_str())
    .collect();

  let mut seen = HashSet::new();
  dependencies
    .iter()
    .map(|d| d.target_label.as_str())
    .filter(|target| !sources.contains(target) && seen.insert(*target))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use lunarflow_config::ComponentModel;

  fn workflow(labels: &[&str], edges: &[(&str, &str)]) -> Workflow {
    let mut workflow = Workflow::new("wf", "Test");
    workflow.components = labels
      .iter()
      .map(|l| ComponentModel::new("Comp", "Comp").with_label(*l))
      .collect();
    workflow.dependencies = edges
      .iter()
      .map(|(from, to)| ComponentDependency::to_input(*from, *to, "text"))
      .collect();
    workflow
  }

  #[test]
  fn test_entry_and_join_points() {
    let workflow = workflow(&["a", "b", "c"], &[("a", "c"), ("b", "c")]);
    let graph = DependencyGraph::new(&workflow);

    assert_eq!(graph.entry_points(), &["a".to_string(), "b".to_string()]);
    assert!(graph.is_join_point("c"));
    assert_eq!(graph.upstream("c").len(), 2);
    assert_eq!(graph.downstream("a"), &["c".to_string()]);
    assert!(graph.downstream("missing").is_empty());
  }

  #[test]
  fn test_output_candidates_are_deduplicated() {
    let workflow = workflow(&["a", "b", "c"], &[("a", "c"), ("b", "c")]);
    assert_eq!(output_candidates(&workflow.dependencies), vec!["c"]);
  }

  #[test]
  fn test_output_candidates_for_cycle_are_empty() {
    let workflow = workflow(&["a", "b"], &[("a", "b"), ("b", "a")]);
    assert!(output_candidates(&workflow.dependencies).is_empty());
  }
}
