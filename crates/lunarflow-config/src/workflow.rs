use serde::{Deserialize, Serialize};

use crate::component::ComponentModel;
use crate::dependency::ComponentDependency;

/// A named workflow document: components and the dependencies between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
  pub id: String,
  pub name: String,
  #[serde(default, deserialize_with = "crate::serde_ext::null_as_default")]
  pub description: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  #[serde(default)]
  pub components: Vec<ComponentModel>,
  #[serde(default)]
  pub dependencies: Vec<ComponentDependency>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout: Option<u64>,
  #[serde(default, deserialize_with = "crate::serde_ext::null_as_default")]
  pub invalid_errors: Vec<String>,
}

impl Workflow {
  /// Create an empty workflow.
  pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      description: String::new(),
      version: None,
      components: Vec::new(),
      dependencies: Vec::new(),
      timeout: None,
      invalid_errors: Vec::new(),
    }
  }

  /// Get a component by label.
  pub fn component(&self, label: &str) -> Option<&ComponentModel> {
    self
      .components
      .iter()
      .find(|c| c.label.as_deref() == Some(label))
  }

  /// Get a mutable component by label.
  pub fn component_mut(&mut self, label: &str) -> Option<&mut ComponentModel> {
    self
      .components
      .iter_mut()
      .find(|c| c.label.as_deref() == Some(label))
  }

  /// Dependencies whose target is the given label.
  pub fn dependencies_into<'a>(
    &'a self,
    label: &'a str,
  ) -> impl Iterator<Item = &'a ComponentDependency> + 'a {
    self.dependencies.iter().filter(move |d| d.target_label == label)
  }

  /// Short reference for listings.
  pub fn reference(&self) -> WorkflowReference {
    WorkflowReference {
      id: self.id.clone(),
      name: self.name.clone(),
      description: self.description.clone(),
      invalid_errors: self.invalid_errors.clone(),
    }
  }
}

/// Short listing entry for a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowReference {
  pub id: String,
  pub name: String,
  #[serde(default, deserialize_with = "crate::serde_ext::null_as_default")]
  pub description: String,
  #[serde(default, deserialize_with = "crate::serde_ext::null_as_default")]
  pub invalid_errors: Vec<String>,
}
