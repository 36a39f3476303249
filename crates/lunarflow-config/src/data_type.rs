use std::fmt;

use serde::{Deserialize, Serialize};

/// Data type of a component input or output.
///
/// Serialized as the backend's SCREAMING_SNAKE_CASE names. Types this client
/// does not know about are preserved in [`ComponentDataType::Other`] so that a
/// load/save cycle never rewrites them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComponentDataType {
  File,
  Datasource,
  Text,
  Code,
  RCode,
  Embeddings,
  Json,
  Image,
  Report,
  Template,
  List,
  Aggregated,
  PropertySelector,
  PropertyGetter,
  Graphql,
  Sql,
  Sparql,
  Workflow,
  Password,
  Stream,
  Csv,
  LineChart,
  BarChart,
  Other(String),
}

impl ComponentDataType {
  pub fn as_str(&self) -> &str {
    match self {
      Self::File => "FILE",
      Self::Datasource => "DATASOURCE",
      Self::Text => "TEXT",
      Self::Code => "CODE",
      Self::RCode => "R_CODE",
      Self::Embeddings => "EMBEDDINGS",
      Self::Json => "JSON",
      Self::Image => "IMAGE",
      Self::Report => "REPORT",
      Self::Template => "TEMPLATE",
      Self::List => "LIST",
      Self::Aggregated => "AGGREGATED",
      Self::PropertySelector => "PROPERTY_SELECTOR",
      Self::PropertyGetter => "PROPERTY_GETTER",
      Self::Graphql => "GRAPHQL",
      Self::Sql => "SQL",
      Self::Sparql => "SPARQL",
      Self::Workflow => "WORKFLOW",
      Self::Password => "PASSWORD",
      Self::Stream => "STREAM",
      Self::Csv => "CSV",
      Self::LineChart => "LINE_CHART",
      Self::BarChart => "BAR_CHART",
      Self::Other(name) => name,
    }
  }

  /// Whether values of this type may carry `{parameter}` template markers
  /// that the backend substitutes from `templateVariables`.
  pub fn is_templated(&self) -> bool {
    matches!(
      self,
      Self::Template | Self::Code | Self::RCode | Self::Graphql | Self::Sql | Self::Sparql
    )
  }
}

impl From<String> for ComponentDataType {
  fn from(value: String) -> Self {
    match value.as_str() {
      "FILE" => Self::File,
      "DATASOURCE" => Self::Datasource,
      "TEXT" => Self::Text,
      "CODE" => Self::Code,
      "R_CODE" => Self::RCode,
      "EMBEDDINGS" => Self::Embeddings,
      "JSON" => Self::Json,
      "IMAGE" => Self::Image,
      "REPORT" => Self::Report,
      "TEMPLATE" => Self::Template,
      "LIST" => Self::List,
      "AGGREGATED" => Self::Aggregated,
      "PROPERTY_SELECTOR" => Self::PropertySelector,
      "PROPERTY_GETTER" => Self::PropertyGetter,
      "GRAPHQL" => Self::Graphql,
      "SQL" => Self::Sql,
      "SPARQL" => Self::Sparql,
      "WORKFLOW" => Self::Workflow,
      "PASSWORD" => Self::Password,
      "STREAM" => Self::Stream,
      "CSV" => Self::Csv,
      "LINE_CHART" => Self::LineChart,
      "BAR_CHART" => Self::BarChart,
      _ => Self::Other(value),
    }
  }
}

impl From<ComponentDataType> for String {
  fn from(value: ComponentDataType) -> Self {
    match value {
      ComponentDataType::Other(name) => name,
      known => known.as_str().to_string(),
    }
  }
}

impl fmt::Display for ComponentDataType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
