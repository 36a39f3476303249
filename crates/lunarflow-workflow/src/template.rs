//! Template variables of component inputs.
//!
//! A templated input (TEMPLATE, CODE, SQL, ...) carries a string value with
//! `{name}` markers. Each marker has a slot in the input's `templateVariables`
//! under `"<inputKey>.<name>"`. Double-braced text such as `{{name}}` is left
//! alone, and `{map(name)}` refers to the variable `name`.
//!
//! Rendering never hands the input text to the template parser. The value is
//! split into literal runs and markers, and the template that minijinja
//! compiles only references those pieces by position:
//! ```text
//! "Keep {{raw}} and {topic}"  ->  "{{ literals[0] }}{{ vars[\"topic\"] }}"
//! ```

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use lunarflow_config::{ComponentInput, Workflow};
use minijinja::{Environment, context};
use regex::{Captures, Regex};

use crate::error::TemplateError;

static PARAMETER: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\{+([\w()]+)\}+").expect("parameter pattern is valid"));

static MAPPED: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^map\((\w+)\)$").expect("map pattern is valid"));

/// Parameter name of a single-braced marker, or `None` for `{{...}}` runs.
fn marker_name(caps: &Captures<'_>) -> Option<String> {
  let whole = caps.get(0)?.as_str();
  if whole.starts_with("{{") || whole.ends_with("}}") {
    return None;
  }

  let inner = caps.get(1)?.as_str();
  let name = MAPPED
    .captures(inner)
    .and_then(|m| m.get(1))
    .map_or(inner, |m| m.as_str());
  Some(name.to_string())
}

/// Parameter names referenced by `{name}` markers, first-seen order, no repeats.
pub fn template_parameters(value: &str) -> Vec<String> {
  let mut seen = HashSet::new();
  PARAMETER
    .captures_iter(value)
    .filter_map(|caps| marker_name(&caps))
    .filter(|name| seen.insert(name.clone()))
    .collect()
}

/// Template-variable operations on a [`ComponentInput`].
pub trait TemplateInput {
  /// Rebuild `templateVariables` from the markers in the current value.
  ///
  /// Surviving variables keep their value, new ones start as empty strings
  /// and stale ones are dropped. Non-string values have no variables.
  fn sync_template_variables(&mut self);

  /// The value with every template variable substituted.
  ///
  /// Inputs whose data type is not templated, or that have no variables, are
  /// returned unchanged.
  fn resolve_template_variables(&self) -> Result<serde_json::Value, TemplateError>;
}

impl TemplateInput for ComponentInput {
  fn sync_template_variables(&mut self) {
    let parameters = match self.value.as_str() {
      Some(value) => template_parameters(value),
      None => Vec::new(),
    };

    let previous = std::mem::take(&mut self.template_variables);
    self.template_variables = parameters
      .iter()
      .map(|parameter| {
        let key = self.template_variable_key(parameter);
        let value = previous
          .get(&key)
          .cloned()
          .unwrap_or_else(|| serde_json::Value::String(String::new()));
        (key, value)
      })
      .collect();
  }

  fn resolve_template_variables(&self) -> Result<serde_json::Value, TemplateError> {
    if !self.data_type.is_templated() || self.template_variables.is_empty() {
      return Ok(self.value.clone());
    }

    let source = self
      .value
      .as_str()
      .ok_or_else(|| TemplateError::NonStringValue {
        key: self.key.clone(),
      })?;

    let mut jinja = String::new();
    let mut literals: Vec<&str> = Vec::new();
    let mut last = 0;
    for caps in PARAMETER.captures_iter(source) {
      let (Some(whole), Some(name)) = (caps.get(0), marker_name(&caps)) else {
        continue;
      };
      push_literal(&mut jinja, &mut literals, &source[last..whole.start()]);
      jinja.push_str(&format!("{{{{ vars[\"{}\"] }}}}", name));
      last = whole.end();
    }
    push_literal(&mut jinja, &mut literals, &source[last..]);

    let vars: BTreeMap<&str, &serde_json::Value> = self
      .template_variables
      .iter()
      .map(|(key, value)| {
        let name = key.split_once('.').map_or(key.as_str(), |(_, name)| name);
        (name, value)
      })
      .collect();

    let env = Environment::new();
    let rendered = env
      .render_str(&jinja, context! { vars, literals })
      .map_err(|source| TemplateError::Render {
        key: self.key.clone(),
        source,
      })?;

    Ok(serde_json::Value::String(rendered))
  }
}

/// Reference a literal run of the input text from the compiled template.
fn push_literal<'a>(jinja: &mut String, literals: &mut Vec<&'a str>, text: &'a str) {
  if !text.is_empty() {
    jinja.push_str(&format!("{{{{ literals[{}] }}}}", literals.len()));
    literals.push(text);
  }
}

/// Template-variable keys across the workflow whose value is an empty string.
pub fn empty_template_variables(workflow: &Workflow) -> Vec<String> {
  let mut seen = HashSet::new();
  workflow
    .components
    .iter()
    .flat_map(|c| &c.inputs)
    .flat_map(|i| &i.template_variables)
    .filter(|(_, value)| value.as_str().is_some_and(str::is_empty))
    .filter(|&(key, _)| seen.insert(key.as_str()))
    .map(|(key, _)| key.clone())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use lunarflow_config::{ComponentDataType, ComponentModel};
  use serde_json::json;

  #[test]
  fn test_template_parameters() {
    assert_eq!(
      template_parameters("a {x} {{y}} {map(z)} {x}"),
      vec!["x".to_string(), "z".to_string()]
    );
    assert!(template_parameters("no markers here").is_empty());
    assert!(template_parameters("{{only_jinja}}").is_empty());
  }

  #[test]
  fn test_sync_keeps_existing_and_drops_stale() {
    let mut input = ComponentInput::new("prompt", ComponentDataType::Template)
      .with_value("Write about {topic} for {audience}")
      .with_template_variable("prompt.topic", "rust")
      .with_template_variable("prompt.stale", "old");

    input.sync_template_variables();

    assert_eq!(input.template_variables.len(), 2);
    assert_eq!(input.template_variables["prompt.topic"], json!("rust"));
    assert_eq!(input.template_variables["prompt.audience"], json!(""));
    assert!(!input.template_variables.contains_key("prompt.stale"));
  }

  #[test]
  fn test_sync_non_string_value_clears_variables() {
    let mut input = ComponentInput::new("data", ComponentDataType::Json)
      .with_value(json!({ "a": 1 }))
      .with_template_variable("data.a", "x");

    input.sync_template_variables();
    assert!(input.template_variables.is_empty());
  }

  #[test]
  fn test_resolve_template_variables() {
    let input = ComponentInput::new("prompt", ComponentDataType::Template)
      .with_value("Summarize {topic} in {words} words")
      .with_template_variable("prompt.topic", "graphs")
      .with_template_variable("prompt.words", "20");

    assert_eq!(
      input.resolve_template_variables().unwrap(),
      json!("Summarize graphs in 20 words")
    );
  }

  #[test]
  fn test_resolve_keeps_jinja_looking_text() {
    let input = ComponentInput::new("prompt", ComponentDataType::Template)
      .with_value("Keep {{literal}} and {x}, {% if %} too")
      .with_template_variable("prompt.x", "1");

    assert_eq!(
      input.resolve_template_variables().unwrap(),
      json!("Keep {{literal}} and 1, {% if %} too")
    );
  }

  #[test]
  fn test_resolve_code_with_comment_opener() {
    let input = ComponentInput::new("code", ComponentDataType::Code)
      .with_value("s = \"{#\"\nprint({x})")
      .with_template_variable("code.x", "42");

    assert_eq!(
      input.resolve_template_variables().unwrap(),
      json!("s = \"{#\"\nprint(42)")
    );
  }

  #[test]
  fn test_resolve_leaves_plain_inputs_alone() {
    let input = ComponentInput::new("text", ComponentDataType::Text)
      .with_value("keep {this}")
      .with_template_variable("text.this", "changed");

    assert_eq!(input.resolve_template_variables().unwrap(), json!("keep {this}"));
  }

  #[test]
  fn test_resolve_rejects_non_string_template() {
    let input = ComponentInput::new("prompt", ComponentDataType::Template)
      .with_value(json!(42))
      .with_template_variable("prompt.x", "1");

    let result = input.resolve_template_variables();
    assert!(matches!(result, Err(TemplateError::NonStringValue { .. })));
  }

  #[test]
  fn test_empty_template_variables() {
    let mut workflow = Workflow::new("wf", "Test");
    workflow.components = vec![
      ComponentModel::new("P", "P").with_label("a").with_input(
        ComponentInput::new("prompt", ComponentDataType::Template)
          .with_value("{x} {y}")
          .with_template_variable("prompt.x", "")
          .with_template_variable("prompt.y", "set"),
      ),
      ComponentModel::new("P", "P").with_label("b").with_input(
        ComponentInput::new("prompt", ComponentDataType::Template)
          .with_value("{x}")
          .with_template_variable("prompt.x", ""),
      ),
    ];

    assert_eq!(empty_template_variables(&workflow), vec!["prompt.x".to_string()]);
  }
}
