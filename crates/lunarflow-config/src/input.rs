//! Component input values.
//!
//! An input carries a value and, for templated data types, a map of template
//! variables. The value of a templated input is a string containing
//! `{parameter}` markers; each marker has a canonical slot in
//! `templateVariables` keyed by `"<input key>.<parameter>"`:
//!
//! ```json
//! {
//!   "key": "prompt",
//!   "dataType": "TEMPLATE",
//!   "value": "Summarize {topic} in {words} words",
//!   "templateVariables": { "prompt.topic": "", "prompt.words": "50" }
//! }
//! ```
//!
//! A slot is filled either by the user or by an upstream component whose
//! dependency targets that template variable key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data_type::ComponentDataType;

/// Marker the backend uses for a value that has not been provided.
pub const UNDEFINED: &str = ":undef:";

pub(crate) fn undefined_value() -> serde_json::Value {
  serde_json::Value::String(UNDEFINED.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInput {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  pub key: String,
  #[serde(default = "undefined_value")]
  pub value: serde_json::Value,
  pub data_type: ComponentDataType,
  #[serde(default, deserialize_with = "crate::serde_ext::null_as_default")]
  pub template_variables: BTreeMap<String, serde_json::Value>,
  #[serde(default)]
  pub component_id: Option<String>,
}

impl ComponentInput {
  /// Create an input with an undefined value and no template variables.
  pub fn new(key: impl Into<String>, data_type: ComponentDataType) -> Self {
    Self {
      id: None,
      key: key.into(),
      value: undefined_value(),
      data_type,
      template_variables: BTreeMap::new(),
      component_id: None,
    }
  }

  pub fn with_value(mut self, value: impl Into<serde_json::Value>) -> Self {
    self.value = value.into();
    self
  }

  pub fn with_template_variable(
    mut self,
    key: impl Into<String>,
    value: impl Into<serde_json::Value>,
  ) -> Self {
    self.template_variables.insert(key.into(), value.into());
    self
  }

  /// Whether the value is still the backend's undefined marker.
  pub fn is_undefined(&self) -> bool {
    self.value.as_str() == Some(UNDEFINED)
  }

  /// Canonical template variable key for a parameter of this input.
  pub fn template_variable_key(&self, parameter: &str) -> String {
    format!("{}.{}", self.key, parameter)
  }
}
