use serde::{Deserialize, Serialize};

/// A directed edge between two components of a workflow.
///
/// The edge feeds the output of `source_label` into `target_label`. Exactly one
/// of the key fields is meant to be the destination slot:
/// - `component_input_key` alone: the whole input named by the key.
/// - `template_variable_key` set: the template slot `"<input>.<variable>"`,
///   in which case `component_input_key` names the owning input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDependency {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  pub component_input_key: Option<String>,
  pub template_variable_key: Option<String>,
  pub source_label: String,
  pub target_label: String,
}

impl ComponentDependency {
  /// Dependency feeding a whole input.
  pub fn to_input(
    source_label: impl Into<String>,
    target_label: impl Into<String>,
    input_key: impl Into<String>,
  ) -> Self {
    Self {
      id: None,
      component_input_key: Some(input_key.into()),
      template_variable_key: None,
      source_label: source_label.into(),
      target_label: target_label.into(),
    }
  }

  /// Dependency feeding a template variable of an input.
  pub fn to_template_variable(
    source_label: impl Into<String>,
    target_label: impl Into<String>,
    input_key: impl Into<String>,
    variable: &str,
  ) -> Self {
    let input_key = input_key.into();
    Self {
      id: None,
      template_variable_key: Some(format!("{}.{}", input_key, variable)),
      component_input_key: Some(input_key),
      source_label: source_label.into(),
      target_label: target_label.into(),
    }
  }

  /// The slot this dependency binds on its target: the template variable key
  /// when present, otherwise the input key.
  pub fn target_slot(&self) -> Option<&str> {
    self
      .template_variable_key
      .as_deref()
      .or(self.component_input_key.as_deref())
  }
}
