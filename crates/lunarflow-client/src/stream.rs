//! Workflow result streaming.
//!
//! `POST /workflow/stream` answers with newline-delimited JSON, one
//! [`WorkflowEvent`] per line, each holding the outputs of the components
//! that have finished so far. Lines are turned into [`AgentEvent`]s: a failed
//! component becomes an error event, a finished component an invocation
//! followed by a result. Each label is reported once. A closing agent result
//! carries the total running time.

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use async_stream::try_stream;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::events::{
  AgentError, AgentEvent, REASONING_COMPONENT, REASONING_ICON, REASONING_WORKFLOW, ReasoningOutput,
  ReasoningStep,
};
use crate::run::RunOutcome;

/// One line of the stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkflowEvent {
  pub workflow_id: String,
  #[serde(default)]
  pub outputs: BTreeMap<String, RunOutcome>,
}

/// Splits a byte stream into lines, keeping partial lines across chunks.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
  buffer: Vec<u8>,
}

impl NdjsonDecoder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Feed a chunk and take every complete, non-blank line it finishes.
  pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
    self.buffer.extend_from_slice(chunk);

    let mut lines = Vec::new();
    while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
      let line: Vec<u8> = self.buffer.drain(..=newline).collect();
      let line = String::from_utf8_lossy(&line[..newline]);
      if !line.trim().is_empty() {
        lines.push(line.into_owned());
      }
    }
    lines
  }

  /// Take whatever is left once the body has ended.
  pub fn finish(&mut self) -> Option<String> {
    let rest = String::from_utf8_lossy(&self.buffer).into_owned();
    self.buffer.clear();
    (!rest.trim().is_empty()).then_some(rest)
  }
}

/// Turns stream lines into agent events for one tool call.
#[derive(Debug)]
pub struct EventTranslator {
  tool_call_id: String,
  seen: HashSet<String>,
  started: Instant,
  last_output: Instant,
}

impl EventTranslator {
  pub fn new(tool_call_id: impl Into<String>) -> Self {
    let now = Instant::now();
    Self {
      tool_call_id: tool_call_id.into(),
      seen: HashSet::new(),
      started: now,
      last_output: now,
    }
  }

  /// Events for one raw line. Malformed lines are logged and skipped.
  pub fn translate_line(&mut self, line: &str) -> Vec<AgentEvent> {
    match serde_json::from_str::<WorkflowEvent>(line) {
      Ok(event) => self.translate(event),
      Err(e) => {
        warn!(error = %e, line = %line, "stream_line_skipped");
        Vec::new()
      }
    }
  }

  pub fn translate(&mut self, event: WorkflowEvent) -> Vec<AgentEvent> {
    let mut events = Vec::new();

    for (label, outcome) in event.outputs {
      if !self.seen.insert(label.clone()) {
        continue;
      }

      match outcome {
        RunOutcome::Error(message) => {
          debug!(workflow_id = %event.workflow_id, label = %label, "component_failed");
          events.push(AgentEvent::ComponentError {
            tool_call_id: self.tool_call_id.clone(),
            lunar_agent_error: AgentError { message },
          });
        }
        RunOutcome::Component(component) => {
          let now = Instant::now();
          let execution_time = now.duration_since(self.last_output).as_secs_f64();
          self.last_output = now;

          debug!(workflow_id = %event.workflow_id, label = %label, "component_finished");
          events.push(AgentEvent::ComponentInvocation {
            tool_call_id: self.tool_call_id.clone(),
            reasoning_chain_component: ReasoningStep {
              id: event.workflow_id.clone(),
              reasoning_type: REASONING_COMPONENT.to_string(),
              reasoning_type_icon: REASONING_ICON.to_string(),
              reasoning_description: component.name.clone(),
              execution_time: 0.0,
              output: None,
            },
          });
          events.push(AgentEvent::ComponentResult {
            tool_call_id: self.tool_call_id.clone(),
            reasoning_chain_component: ReasoningStep {
              id: event.workflow_id.clone(),
              reasoning_type: REASONING_WORKFLOW.to_string(),
              reasoning_type_icon: REASONING_ICON.to_string(),
              reasoning_description: component.name,
              execution_time,
              output: Some(ReasoningOutput {
                data_type: component.output.data_type,
                content: component.output.value,
              }),
            },
          });
        }
      }
    }

    events
  }

  /// Closing event with the time since the translator was created.
  pub fn finish(&self) -> AgentEvent {
    AgentEvent::AgentResult {
      tool_call_id: self.tool_call_id.clone(),
      running_time: self.started.elapsed().as_secs_f64(),
      manual_time: None,
    }
  }
}

/// Agent events from a streaming response body.
///
/// Cancelling the token stops reading and ends the stream without the closing
/// agent result. It does not cancel the run on the backend.
pub fn agent_events(
  response: reqwest::Response,
  tool_call_id: String,
  cancel: CancellationToken,
) -> impl Stream<Item = Result<AgentEvent, ClientError>> {
  try_stream! {
    let mut body = response.bytes_stream();
    let mut decoder = NdjsonDecoder::new();
    let mut translator = EventTranslator::new(tool_call_id);
    let mut cancelled = false;

    loop {
      let chunk = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
          debug!("workflow_stream_cancelled");
          cancelled = true;
          break;
        }
        chunk = body.next() => chunk,
      };

      let Some(chunk) = chunk else {
        break;
      };
      let chunk = chunk.map_err(ClientError::from)?;

      for line in decoder.push(&chunk) {
        for event in translator.translate_line(&line) {
          yield event;
        }
      }
    }

    if !cancelled {
      if let Some(line) = decoder.finish() {
        for event in translator.translate_line(&line) {
          yield event;
        }
      }
      yield translator.finish();
    }
  }
}
