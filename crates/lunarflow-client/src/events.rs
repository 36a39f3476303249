//! Agent events produced while a workflow streams its results.
//!
//! These are the events the chat front-end renders as a reasoning chain:
//! one invocation and one result per finished component, an error for each
//! failed component, and a final agent result with the running time.

use lunarflow_config::ComponentDataType;
use serde::{Deserialize, Serialize};

/// Reasoning type shown while a component is running.
pub const REASONING_COMPONENT: &str = "Lunar component";
/// Reasoning type shown once a component has produced its output.
pub const REASONING_WORKFLOW: &str = "workflow";
pub const REASONING_ICON: &str = "Reasoning over facts";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningOutput {
  #[serde(rename = "type")]
  pub data_type: ComponentDataType,
  pub content: serde_json::Value,
}

/// One step of the reasoning chain. `output` is `None` for invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReasoningStep {
  pub id: String,
  pub reasoning_type: String,
  pub reasoning_type_icon: String,
  pub reasoning_description: String,
  /// Seconds.
  pub execution_time: f64,
  pub output: Option<ReasoningOutput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentError {
  pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AgentEvent {
  #[serde(rename = "lunar-component-invocation", rename_all = "camelCase")]
  ComponentInvocation {
    tool_call_id: String,
    reasoning_chain_component: ReasoningStep,
  },

  #[serde(rename = "lunar-component-result", rename_all = "camelCase")]
  ComponentResult {
    tool_call_id: String,
    reasoning_chain_component: ReasoningStep,
  },

  #[serde(rename = "lunar-component-error", rename_all = "camelCase")]
  ComponentError {
    tool_call_id: String,
    lunar_agent_error: AgentError,
  },

  #[serde(rename = "lunar-agent-result", rename_all = "camelCase")]
  AgentResult {
    tool_call_id: String,
    /// Seconds.
    running_time: f64,
    #[serde(default, rename = "manualtime")]
    manual_time: Option<f64>,
  },
}

impl AgentEvent {
  pub fn tool_call_id(&self) -> &str {
    match self {
      AgentEvent::ComponentInvocation { tool_call_id, .. }
      | AgentEvent::ComponentResult { tool_call_id, .. }
      | AgentEvent::ComponentError { tool_call_id, .. }
      | AgentEvent::AgentResult { tool_call_id, .. } => tool_call_id,
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      AgentEvent::ComponentInvocation { .. } => "lunar-component-invocation",
      AgentEvent::ComponentResult { .. } => "lunar-component-result",
      AgentEvent::ComponentError { .. } => "lunar-component-error",
      AgentEvent::AgentResult { .. } => "lunar-agent-result",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_result_event_wire_format() {
    let event = AgentEvent::ComponentResult {
      tool_call_id: "call-1".to_string(),
      reasoning_chain_component: ReasoningStep {
        id: "wf-1".to_string(),
        reasoning_type: REASONING_WORKFLOW.to_string(),
        reasoning_type_icon: REASONING_ICON.to_string(),
        reasoning_description: "Summarizer".to_string(),
        execution_time: 0.0,
        output: Some(ReasoningOutput {
          data_type: ComponentDataType::Text,
          content: json!("done"),
        }),
      },
    };

    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["type"], json!("lunar-component-result"));
    assert_eq!(value["toolCallId"], json!("call-1"));
    assert_eq!(
      value["reasoningChainComponent"]["output"],
      json!({ "type": "TEXT", "content": "done" })
    );
    assert_eq!(event.kind(), "lunar-component-result");
  }

  #[test]
  fn test_agent_result_wire_format() {
    let event = AgentEvent::AgentResult {
      tool_call_id: "call-1".to_string(),
      running_time: 1.5,
      manual_time: None,
    };

    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(
      value,
      json!({
        "type": "lunar-agent-result",
        "toolCallId": "call-1",
        "runningTime": 1.5,
        "manualtime": null
      })
    );

    let parsed: AgentEvent = serde_json::from_value(value).unwrap();
    assert_eq!(parsed, event);
  }

  #[test]
  fn test_invocation_has_null_output() {
    let event = AgentEvent::ComponentInvocation {
      tool_call_id: "call-1".to_string(),
      reasoning_chain_component: ReasoningStep {
        id: "wf-1".to_string(),
        reasoning_type: REASONING_COMPONENT.to_string(),
        reasoning_type_icon: REASONING_ICON.to_string(),
        reasoning_description: "Reader".to_string(),
        execution_time: 0.0,
        output: None,
      },
    };

    let value = serde_json::to_value(&event).unwrap();
    assert!(value["reasoningChainComponent"]["output"].is_null());
  }
}
