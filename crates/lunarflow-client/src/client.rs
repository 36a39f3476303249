use futures::StreamExt;
use futures::stream::BoxStream;
use lunarflow_config::{ComponentModel, Workflow, WorkflowReference};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::cache::WorkflowCache;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::events::AgentEvent;
use crate::run::RunResults;
use crate::stream::agent_events;

/// Client for the Lunar backend REST API.
///
/// Every request carries the configured user id as the `user_id` query
/// parameter. Workflow listings and documents are cached per user and
/// invalidated by the calls that change them.
#[derive(Debug, Clone)]
pub struct LunarClient {
  http: Client,
  base_url: Url,
  user_id: String,
  cache: WorkflowCache,
}

impl LunarClient {
  pub fn new(config: &ClientConfig) -> Result<Self> {
    Self::with_cache(config, WorkflowCache::new())
  }

  /// Build a client sharing an existing cache.
  pub fn with_cache(config: &ClientConfig, cache: WorkflowCache) -> Result<Self> {
    let base_url = config.validate()?;
    let http = Client::builder().timeout(config.timeout()).build()?;

    debug!(base_url = %base_url, user_id = %config.user_id, "client_created");

    Ok(Self {
      http,
      base_url,
      user_id: config.user_id.clone(),
      cache,
    })
  }

  pub fn user_id(&self) -> &str {
    &self.user_id
  }

  pub fn cache(&self) -> &WorkflowCache {
    &self.cache
  }

  fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
    let mut url = self.base_url.join(path.trim_start_matches('/'))?;
    {
      let mut pairs = url.query_pairs_mut();
      pairs.append_pair("user_id", &self.user_id);
      for (key, value) in query {
        pairs.append_pair(key, value);
      }
    }
    Ok(url)
  }

  fn request(&self, method: Method, path: &str, query: &[(&str, &str)]) -> Result<RequestBuilder> {
    Ok(self.http.request(method, self.url(path, query)?))
  }

  async fn send(&self, request: RequestBuilder) -> Result<Response> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
      .ok()
      .and_then(|v| {
        v.get("detail")
          .map(|d| d.as_str().map_or_else(|| d.to_string(), str::to_string))
      })
      .unwrap_or(body);

    warn!(status = status.as_u16(), message = %message, "request_failed");
    Err(ClientError::Status {
      status: status.as_u16(),
      message,
    })
  }

  async fn send_json<T: DeserializeOwned>(
    &self,
    request: RequestBuilder,
    endpoint: &str,
  ) -> Result<T> {
    let response = self.send(request).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|source| ClientError::Decode {
      endpoint: endpoint.to_string(),
      source,
    })
  }

  async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
    self.send(request).await?;
    Ok(())
  }

  async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, &str)],
    body: &B,
  ) -> Result<T> {
    let request = self.request(Method::POST, path, query)?.json(body);
    self.send_json(request, path).await
  }

  // Workflows

  #[instrument(skip(self), fields(user_id = %self.user_id))]
  pub async fn get_workflow(&self, workflow_id: &str) -> Result<Workflow> {
    if let Some(workflow) = self.cache.workflow(&self.user_id, workflow_id).await {
      debug!(workflow_id = %workflow_id, "workflow_cache_hit");
      return Ok(workflow);
    }

    let path = format!("workflow/{}", workflow_id);
    let request = self.request(Method::GET, &path, &[])?;
    let workflow: Workflow = self.send_json(request, &path).await?;

    self.cache.insert_workflow(&self.user_id, workflow.clone()).await;
    Ok(workflow)
  }

  #[instrument(skip(self), fields(user_id = %self.user_id))]
  pub async fn list_workflows(&self) -> Result<Vec<WorkflowReference>> {
    if let Some(references) = self.cache.references(&self.user_id).await {
      return Ok(references);
    }

    let request = self.request(Method::GET, "workflow/short_list", &[])?;
    let references: Vec<WorkflowReference> = self.send_json(request, "workflow/short_list").await?;

    self
      .cache
      .set_references(&self.user_id, references.clone())
      .await;
    Ok(references)
  }

  #[instrument(skip(self), fields(user_id = %self.user_id))]
  pub async fn list_demos(&self) -> Result<Vec<WorkflowReference>> {
    let request = self.request(Method::GET, "demo/list", &[])?;
    self.send_json(request, "demo/list").await
  }

  #[instrument(skip(self, description), fields(user_id = %self.user_id))]
  pub async fn create_workflow(&self, name: &str, description: &str) -> Result<Workflow> {
    let body = json!({ "name": name, "description": description, "userId": self.user_id });
    let workflow: Workflow = self.post_json("workflow", &[], &body).await?;

    self.cache.invalidate_references(&self.user_id).await;
    info!(workflow_id = %workflow.id, "workflow_created");
    Ok(workflow)
  }

  #[instrument(skip(self), fields(user_id = %self.user_id))]
  pub async fn create_workflow_from_template(&self, template_id: &str) -> Result<Workflow> {
    let request = self.request(Method::POST, "workflow", &[("template_id", template_id)])?;
    let workflow: Workflow = self.send_json(request, "workflow").await?;

    self.cache.invalidate_references(&self.user_id).await;
    info!(workflow_id = %workflow.id, template_id = %template_id, "workflow_created");
    Ok(workflow)
  }

  #[instrument(skip(self, workflow), fields(user_id = %self.user_id, workflow_id = %workflow.id))]
  pub async fn save_workflow(&self, workflow: &Workflow) -> Result<()> {
    let request = self.request(Method::PUT, "workflow", &[])?.json(workflow);
    self.send_empty(request).await?;

    self.cache.invalidate_workflow(&self.user_id, &workflow.id).await;
    info!("workflow_saved");
    Ok(())
  }

  #[instrument(skip(self), fields(user_id = %self.user_id))]
  pub async fn delete_workflow(&self, workflow_id: &str) -> Result<()> {
    let path = format!("workflow/{}", workflow_id);
    let request = self.request(Method::DELETE, &path, &[])?;
    self.send_empty(request).await?;

    self.cache.invalidate_workflow(&self.user_id, workflow_id).await;
    info!(workflow_id = %workflow_id, "workflow_deleted");
    Ok(())
  }

  #[instrument(skip(self, workflow), fields(user_id = %self.user_id, workflow_id = %workflow.id))]
  pub async fn run_workflow(&self, workflow: &Workflow) -> Result<RunResults> {
    info!(components = workflow.components.len(), "workflow_run_started");
    let results: RunResults = self.post_json("workflow/run", &[], workflow).await?;
    info!(outcomes = results.len(), "workflow_run_completed");
    Ok(results)
  }

  #[instrument(skip(self), fields(user_id = %self.user_id))]
  pub async fn cancel_workflow(&self, workflow_id: &str) -> Result<RunResults> {
    let path = format!("workflow/{}/cancel", workflow_id);
    let request = self.request(Method::POST, &path, &[])?;
    let results = self.send_json(request, &path).await?;
    info!(workflow_id = %workflow_id, "workflow_cancelled");
    Ok(results)
  }

  /// Ask the backend to rewrite a workflow according to an instruction.
  #[instrument(skip(self, workflow), fields(user_id = %self.user_id, workflow_id = %workflow.id))]
  pub async fn modify_workflow(&self, workflow: &Workflow, instruction: &str) -> Result<Workflow> {
    let body = json!({ "workflow": workflow });
    self
      .post_json(
        "auto_workflow_modification",
        &[("modification_instruction", instruction)],
        &body,
      )
      .await
  }

  /// Ask the backend to generate a new workflow from an intent.
  #[instrument(skip(self), fields(user_id = %self.user_id))]
  pub async fn auto_workflow(&self, intent: &str) -> Result<Workflow> {
    let request = self.request(Method::POST, "auto_workflow", &[("intent", intent)])?;
    let workflow: Workflow = self.send_json(request, "auto_workflow").await?;

    self.cache.invalidate_references(&self.user_id).await;
    Ok(workflow)
  }

  /// Stream a stored workflow's results as agent events.
  ///
  /// The returned stream ends after the closing agent result, on the first
  /// transport error, or when `cancel` fires.
  #[instrument(skip(self, cancel), fields(user_id = %self.user_id))]
  pub async fn stream_workflow(
    &self,
    workflow_id: &str,
    tool_call_id: &str,
    cancel: CancellationToken,
  ) -> Result<BoxStream<'static, Result<AgentEvent>>> {
    let request = self
      .request(Method::POST, "workflow/stream", &[("workflow_id", workflow_id)])?
      .json(&json!({ "inputs": [] }));
    let response = self.send(request).await?;

    info!(workflow_id = %workflow_id, "workflow_stream_opened");
    Ok(agent_events(response, tool_call_id.to_string(), cancel).boxed())
  }

  // Components

  #[instrument(skip(self), fields(user_id = %self.user_id))]
  pub async fn list_components(&self) -> Result<Vec<ComponentModel>> {
    let request = self.request(Method::GET, "component/list", &[])?;
    self.send_json(request, "component/list").await
  }

  #[instrument(skip(self, component), fields(user_id = %self.user_id, component = %component.name))]
  pub async fn save_component(&self, component: &ComponentModel) -> Result<()> {
    let request = self.request(Method::POST, "component", &[])?.json(component);
    self.send_empty(request).await
  }

  #[instrument(skip(self, component), fields(user_id = %self.user_id, component = %component.name))]
  pub async fn update_component(&self, component: &ComponentModel) -> Result<()> {
    let request = self.request(Method::PUT, "component", &[])?.json(component);
    self.send_empty(request).await
  }

  /// Run a single component. Its inputs should already hold upstream values.
  #[instrument(skip(self, component), fields(user_id = %self.user_id, component = %component.name))]
  pub async fn run_component(&self, component: &ComponentModel) -> Result<RunResults> {
    self.post_json("component/run", &[], component).await
  }

  #[instrument(skip(self), fields(user_id = %self.user_id))]
  pub async fn delete_component(&self, component_id: &str) -> Result<()> {
    let path = format!("component/{}", component_id);
    let request = self.request(Method::DELETE, &path, &[])?;
    self.send_empty(request).await
  }

  /// Example workflow showing how a component is used.
  #[instrument(skip(self), fields(user_id = %self.user_id))]
  pub async fn component_example(&self, component_id: &str) -> Result<Workflow> {
    let path = format!("component/{}/example", component_id);
    let request = self.request(Method::GET, &path, &[])?;
    self.send_json(request, &path).await
  }
}
