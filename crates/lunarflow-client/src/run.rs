use std::collections::HashMap;

use lunarflow_config::ComponentModel;
use serde::{Deserialize, Serialize};

/// Result of running one component: the component with its output filled in,
/// or the error message the backend reported for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunOutcome {
  Component(ComponentModel),
  Error(String),
}

impl RunOutcome {
  pub fn component(&self) -> Option<&ComponentModel> {
    match self {
      RunOutcome::Component(component) => Some(component),
      RunOutcome::Error(_) => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      RunOutcome::Component(_) => None,
      RunOutcome::Error(message) => Some(message),
    }
  }
}

/// Per-label outcomes of a workflow or component run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunResults(HashMap<String, RunOutcome>);

impl RunResults {
  pub fn get(&self, label: &str) -> Option<&RunOutcome> {
    self.0.get(label)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &RunOutcome)> {
    self.0.iter()
  }

  /// Separate successes from failures. Failures are rendered as
  /// `"<label>: <message>"`, ordered by label.
  pub fn split(self) -> (HashMap<String, ComponentModel>, Vec<String>) {
    let mut components = HashMap::new();
    let mut errors = Vec::new();

    for (label, outcome) in self.0 {
      match outcome {
        RunOutcome::Component(component) => {
          components.insert(label, component);
        }
        RunOutcome::Error(message) => errors.push(format!("{}: {}", label, message)),
      }
    }

    errors.sort();
    (components, errors)
  }
}

impl From<HashMap<String, RunOutcome>> for RunResults {
  fn from(outcomes: HashMap<String, RunOutcome>) -> Self {
    Self(outcomes)
  }
}

impl FromIterator<(String, RunOutcome)> for RunResults {
  fn from_iter<I: IntoIterator<Item = (String, RunOutcome)>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_deserialize_mixed_results() {
    let results: RunResults = serde_json::from_value(json!({
      "A": {
        "label": "A",
        "name": "Reader",
        "className": "Reader",
        "output": { "dataType": "TEXT", "value": "hello" }
      },
      "B": "component failed: timeout"
    }))
    .unwrap();

    assert_eq!(results.len(), 2);
    let a = results.get("A").and_then(RunOutcome::component).unwrap();
    assert_eq!(a.output.value, json!("hello"));
    assert_eq!(
      results.get("B").and_then(RunOutcome::error),
      Some("component failed: timeout")
    );
  }

  #[test]
  fn test_split() {
    let results: RunResults = [
      ("b".to_string(), RunOutcome::Error("boom".to_string())),
      ("a".to_string(), RunOutcome::Error("bad input".to_string())),
      (
        "c".to_string(),
        RunOutcome::Component(ComponentModel::new("C", "C").with_label("c")),
      ),
    ]
    .into_iter()
    .collect();

    let (components, errors) = results.split();
    assert_eq!(components.len(), 1);
    assert!(components.contains_key("c"));
    assert_eq!(errors, vec!["a: bad input".to_string(), "b: boom".to_string()]);
  }
}
