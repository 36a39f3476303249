use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
  #[error("component not found: {0}")]
  ComponentNotFound(String),

  #[error("component '{name}' has no label")]
  MissingLabel { name: String },

  #[error("duplicate component label: {0}")]
  DuplicateLabel(String),

  #[error("dependency references unknown component: from={from}, to={to}")]
  InvalidDependency { from: String, to: String },

  #[error("dependency {from} -> {to} targets no input")]
  UntargetedDependency { from: String, to: String },

  #[error("input '{input}' not found on component '{label}'")]
  InputNotFound { label: String, input: String },

  #[error("cycle detected in dependency graph")]
  CycleDetected,

  #[error("invalid free input key: {0}")]
  InvalidInputKey(String),
}

/// Errors raised while rendering template variables into an input value.
#[derive(Debug, Error)]
pub enum TemplateError {
  #[error("template input '{key}' has a non-string value")]
  NonStringValue { key: String },

  #[error("failed to render template for input '{key}': {source}")]
  Render {
    key: String,
    #[source]
    source: minijinja::Error,
  },
}
