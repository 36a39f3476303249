use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::data_type::ComponentDataType;
use crate::input::{ComponentInput, undefined_value};

/// Position of a component on the editor canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentPosition {
  pub x: f64,
  pub y: f64,
}

impl ComponentPosition {
  pub fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }
}

/// Output slot of a component. Filled by the backend after a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentOutput {
  pub data_type: ComponentDataType,
  #[serde(default = "undefined_value")]
  pub value: serde_json::Value,
}

impl ComponentOutput {
  pub fn new(data_type: ComponentDataType) -> Self {
    Self {
      data_type,
      value: undefined_value(),
    }
  }
}

/// A single pipeline node.
///
/// `label` identifies the component inside one workflow graph and is what
/// dependencies refer to. `id` is the global identifier used by the
/// component library and is absent for components that were never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentModel {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub workflow_id: Option<String>,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
  pub class_name: String,
  #[serde(default, deserialize_with = "crate::serde_ext::null_as_default")]
  pub description: String,
  #[serde(default, deserialize_with = "crate::serde_ext::null_as_default")]
  pub group: String,
  #[serde(default)]
  pub inputs: Vec<ComponentInput>,
  pub output: ComponentOutput,
  #[serde(default, deserialize_with = "crate::serde_ext::null_as_default")]
  pub configuration: HashMap<String, String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  #[serde(default)]
  pub is_custom: bool,
  #[serde(default)]
  pub is_terminal: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub position: Option<ComponentPosition>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout: Option<u64>,
  #[serde(default)]
  pub component_code: Option<String>,
  #[serde(default, deserialize_with = "crate::serde_ext::null_as_default")]
  pub component_code_requirements: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub component_example_path: Option<String>,
  #[serde(default, deserialize_with = "crate::serde_ext::null_as_default")]
  pub invalid_errors: Vec<String>,
}

impl ComponentModel {
  /// Create a component with no inputs, a TEXT output and default settings.
  pub fn new(name: impl Into<String>, class_name: impl Into<String>) -> Self {
    Self {
      id: None,
      workflow_id: None,
      name: name.into(),
      label: None,
      class_name: class_name.into(),
      description: String::new(),
      group: String::new(),
      inputs: Vec::new(),
      output: ComponentOutput::new(ComponentDataType::Text),
      configuration: HashMap::new(),
      version: None,
      is_custom: false,
      is_terminal: false,
      position: None,
      timeout: None,
      component_code: None,
      component_code_requirements: Vec::new(),
      component_example_path: None,
      invalid_errors: Vec::new(),
    }
  }

  pub fn with_label(mut self, label: impl Into<String>) -> Self {
    self.label = Some(label.into());
    self
  }

  pub fn with_input(mut self, input: ComponentInput) -> Self {
    self.inputs.push(input);
    self
  }

  pub fn with_output(mut self, output: ComponentOutput) -> Self {
    self.output = output;
    self
  }

  pub fn with_group(mut self, group: impl Into<String>) -> Self {
    self.group = group.into();
    self
  }

  pub fn with_position(mut self, x: f64, y: f64) -> Self {
    self.position = Some(ComponentPosition::new(x, y));
    self
  }

  /// Get an input by key.
  pub fn input(&self, key: &str) -> Option<&ComponentInput> {
    self.inputs.iter().find(|input| input.key == key)
  }

  /// Get a mutable input by key.
  pub fn input_mut(&mut self, key: &str) -> Option<&mut ComponentInput> {
    self.inputs.iter_mut().find(|input| input.key == key)
  }
}
