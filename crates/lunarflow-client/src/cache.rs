//! Per-user workflow caching.
//!
//! Workflow listings and documents are cached per user id. Anything that
//! changes a workflow on the backend must invalidate the affected entries.

use std::collections::HashMap;
use std::sync::Arc;

use lunarflow_config::{Workflow, WorkflowReference};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct UserEntry {
  references: Option<Vec<WorkflowReference>>,
  workflows: HashMap<String, Workflow>,
}

/// Shared cache of workflow listings and documents, keyed by user id.
#[derive(Debug, Clone, Default)]
pub struct WorkflowCache {
  entries: Arc<RwLock<HashMap<String, UserEntry>>>,
}

impl WorkflowCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn references(&self, user_id: &str) -> Option<Vec<WorkflowReference>> {
    let entries = self.entries.read().await;
    entries.get(user_id)?.references.clone()
  }

  pub async fn set_references(&self, user_id: &str, references: Vec<WorkflowReference>) {
    let mut entries = self.entries.write().await;
    entries.entry(user_id.to_string()).or_default().references = Some(references);
  }

  pub async fn workflow(&self, user_id: &str, workflow_id: &str) -> Option<Workflow> {
    let entries = self.entries.read().await;
    entries.get(user_id)?.workflows.get(workflow_id).cloned()
  }

  pub async fn insert_workflow(&self, user_id: &str, workflow: Workflow) {
    let mut entries = self.entries.write().await;
    entries
      .entry(user_id.to_string())
      .or_default()
      .workflows
      .insert(workflow.id.clone(), workflow);
  }

  /// Drop one workflow and the user's listing, which may mention it.
  pub async fn invalidate_workflow(&self, user_id: &str, workflow_id: &str) {
    let mut entries = self.entries.write().await;
    if let Some(entry) = entries.get_mut(user_id) {
      entry.workflows.remove(workflow_id);
      entry.references = None;
    }
  }

  /// Drop the user's listing only.
  pub async fn invalidate_references(&self, user_id: &str) {
    let mut entries = self.entries.write().await;
    if let Some(entry) = entries.get_mut(user_id) {
      entry.references = None;
    }
  }

  /// Drop everything cached for a user.
  pub async fn invalidate(&self, user_id: &str) {
    self.entries.write().await.remove(user_id);
  }

  pub async fn clear(&self) {
    self.entries.write().await.clear();
  }
}
