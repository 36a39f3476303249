//! Free input resolution.
//!
//! A component input is *bound* when some dependency targets it (by input key
//! or by template variable key) and *free* otherwise. Free inputs and free
//! template variables must be supplied by whoever runs the workflow.
//!
//! Each free value is addressed by a [`FreeInputKey`]. Its string form is the
//! one the backend and existing clients use for form fields:
//! - `"<label>:<input>"` for a whole input
//! - `"<label>:<input>$<variable>"` for a template variable of an input
//!
//! Labels may contain `:`. Input keys may not contain `:` or `$`, and labels
//! may not contain `$`; keys with those characters do not parse back.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use lunarflow_config::{ComponentDataType, ComponentInput, Workflow};

use crate::error::WorkflowError;

/// Group used for components that have no label.
pub const UNLABELED_GROUP: &str = "EXTRA";

/// Structured address of a value a workflow caller must supply.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FreeInputKey {
  pub label: String,
  pub input_key: String,
  pub variable: Option<String>,
}

impl FreeInputKey {
  pub fn input(label: impl Into<String>, input_key: impl Into<String>) -> Self {
    Self {
      label: label.into(),
      input_key: input_key.into(),
      variable: None,
    }
  }

  pub fn template_variable(
    label: impl Into<String>,
    input_key: impl Into<String>,
    variable: impl Into<String>,
  ) -> Self {
    Self {
      label: label.into(),
      input_key: input_key.into(),
      variable: Some(variable.into()),
    }
  }

  /// Canonical `templateVariables` key this address writes to, if it names a
  /// template variable.
  pub fn template_variable_key(&self) -> Option<String> {
    self
      .variable
      .as_ref()
      .map(|variable| format!("{}.{}", self.input_key, variable))
  }
}

impl fmt::Display for FreeInputKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.variable {
      Some(variable) => write!(f, "{}:{}${}", self.label, self.input_key, variable),
      None => write!(f, "{}:{}", self.label, self.input_key),
    }
  }
}

impl FromStr for FreeInputKey {
  type Err = WorkflowError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || WorkflowError::InvalidInputKey(s.to_string());

    let (head, variable) = match s.split_once('$') {
      Some((head, variable)) => (head, Some(variable)),
      None => (s, None),
    };
    let (label, input_key) = head.rsplit_once(':').ok_or_else(invalid)?;

    if label.is_empty() || input_key.is_empty() || variable.is_some_and(str::is_empty) {
      return Err(invalid());
    }

    Ok(Self {
      label: label.to_string(),
      input_key: input_key.to_string(),
      variable: variable.map(str::to_string),
    })
  }
}

/// A value the caller must supply, with the input describing its type and
/// current value.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeInput {
  pub key: FreeInputKey,
  pub input: ComponentInput,
}

/// Every free input of a workflow, in component and input order.
///
/// Whole inputs keep their own key inside `input`; template variables are
/// turned into synthetic TEXT inputs keyed by the string form of their
/// [`FreeInputKey`].
pub fn free_inputs(workflow: &Workflow) -> Vec<FreeInput> {
  let mut free = Vec::new();

  for component in &workflow.components {
    // No dependency can target a component without a label.
    let bound: HashSet<&str> = match component.label.as_deref() {
      Some(label) => workflow
        .dependencies_into(label)
        .flat_map(|d| {
          d.component_input_key
            .as_deref()
            .into_iter()
            .chain(d.template_variable_key.as_deref())
        })
        .collect(),
      None => HashSet::new(),
    };
    let label = component.label.as_deref().unwrap_or(UNLABELED_GROUP);

    for input in &component.inputs {
      if !bound.contains(input.key.as_str()) {
        free.push(FreeInput {
          key: FreeInputKey::input(label, &input.key),
          input: input.clone(),
        });
      }

      for (template_key, value) in &input.template_variables {
        if bound.contains(template_key.as_str()) {
          continue;
        }

        let variable = template_key
          .split_once('.')
          .map(|(_, variable)| variable)
          .unwrap_or(template_key);
        let key = FreeInputKey::template_variable(label, &input.key, variable.replace('.', "$"));

        let mut synthetic = ComponentInput::new(key.to_string(), ComponentDataType::Text);
        synthetic.value = value.clone();
        free.push(FreeInput {
          key,
          input: synthetic,
        });
      }
    }
  }

  free
}

/// Free inputs grouped by component label.
///
/// Every component has an entry, empty when all its inputs are bound.
pub fn workflow_inputs(workflow: &Workflow) -> BTreeMap<String, Vec<ComponentInput>> {
  let mut inputs: BTreeMap<String, Vec<ComponentInput>> = workflow
    .components
    .iter()
    .map(|c| {
      (
        c.label.clone().unwrap_or_else(|| UNLABELED_GROUP.to_string()),
        Vec::new(),
      )
    })
    .collect();

  for free in free_inputs(workflow) {
    inputs.entry(free.key.label).or_default().push(free.input);
  }

  inputs
}

/// Write a caller-supplied value into the workflow at the given address.
///
/// An [`UNLABELED_GROUP`] address that matches no labeled component writes to
/// every unlabeled component carrying the input.
pub fn apply_free_input(
  workflow: &mut Workflow,
  key: &FreeInputKey,
  value: serde_json::Value,
) -> Result<(), WorkflowError> {
  if workflow.component(&key.label).is_none() && key.label == UNLABELED_GROUP {
    let mut unlabeled = workflow
      .components
      .iter_mut()
      .filter(|c| c.label.is_none())
      .peekable();
    if unlabeled.peek().is_none() {
      return Err(WorkflowError::ComponentNotFound(key.label.clone()));
    }

    let mut written = false;
    for component in unlabeled {
      if let Some(input) = component.input_mut(&key.input_key) {
        write_value(input, key, value.clone());
        written = true;
      }
    }
    if !written {
      return Err(input_not_found(key));
    }
    return Ok(());
  }

  let component = workflow
    .component_mut(&key.label)
    .ok_or_else(|| WorkflowError::ComponentNotFound(key.label.clone()))?;
  let input = component
    .input_mut(&key.input_key)
    .ok_or_else(|| input_not_found(key))?;
  write_value(input, key, value);

  Ok(())
}

fn input_not_found(key: &FreeInputKey) -> WorkflowError {
  WorkflowError::InputNotFound {
    label: key.label.clone(),
    input: key.input_key.clone(),
  }
}

fn write_value(input: &mut ComponentInput, key: &FreeInputKey, value: serde_json::Value) {
  match key.template_variable_key() {
    Some(template_key) => {
      input.template_variables.insert(template_key, value);
    }
    None => input.value = value,
  }
}
