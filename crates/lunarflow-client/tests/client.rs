//! Client tests against a mocked backend.

use futures::StreamExt;
use lunarflow_client::{AgentEvent, ClientConfig, ClientError, LunarClient, RunOutcome};
use lunarflow_config::Workflow;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER: &str = "tester@example.com";

fn client(server: &MockServer) -> LunarClient {
  LunarClient::new(&ClientConfig::new(server.uri(), USER)).unwrap()
}

fn workflow_json(id: &str) -> serde_json::Value {
  json!({
    "id": id,
    "name": "Summarizer",
    "description": "",
    "components": [{
      "label": "A",
      "name": "Reader",
      "className": "Reader",
      "output": { "dataType": "TEXT", "value": ":undef:" }
    }],
    "dependencies": [],
    "invalidErrors": []
  })
}

#[tokio::test]
async fn test_get_workflow_sends_user_id_and_caches() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/workflow/wf-1"))
    .and(query_param("user_id", USER))
    .respond_with(ResponseTemplate::new(200).set_body_json(workflow_json("wf-1")))
    .expect(1)
    .mount(&server)
    .await;

  let client = client(&server);
  let first = client.get_workflow("wf-1").await.unwrap();
  let second = client.get_workflow("wf-1").await.unwrap();

  assert_eq!(first.name, "Summarizer");
  assert_eq!(first, second);
}

#[tokio::test]
async fn test_save_invalidates_cached_workflow() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/workflow/wf-1"))
    .respond_with(ResponseTemplate::new(200).set_body_json(workflow_json("wf-1")))
    .expect(2)
    .mount(&server)
    .await;
  Mock::given(method("PUT"))
    .and(path("/workflow"))
    .and(query_param("user_id", USER))
    .respond_with(ResponseTemplate::new(200))
    .expect(1)
    .mount(&server)
    .await;

  let client = client(&server);
  let workflow = client.get_workflow("wf-1").await.unwrap();
  client.save_workflow(&workflow).await.unwrap();
  client.get_workflow("wf-1").await.unwrap();
}

#[tokio::test]
async fn test_create_workflow_posts_name_and_user() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/workflow"))
    .and(query_param("user_id", USER))
    .and(body_json(json!({ "name": "New", "description": "Fresh", "userId": USER })))
    .respond_with(ResponseTemplate::new(200).set_body_json(workflow_json("wf-new")))
    .mount(&server)
    .await;

  let workflow = client(&server).create_workflow("New", "Fresh").await.unwrap();
  assert_eq!(workflow.id, "wf-new");
}

#[tokio::test]
async fn test_run_workflow_returns_outcomes() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/workflow/run"))
    .and(query_param("user_id", USER))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "A": {
        "label": "A",
        "name": "Reader",
        "className": "Reader",
        "output": { "dataType": "TEXT", "value": "page text" }
      },
      "B": "B: connection refused"
    })))
    .mount(&server)
    .await;

  let workflow = Workflow::new("wf-1", "Summarizer");
  let results = client(&server).run_workflow(&workflow).await.unwrap();

  assert!(matches!(results.get("A"), Some(RunOutcome::Component(_))));
  let (components, errors) = results.split();
  assert_eq!(components["A"].output.value, json!("page text"));
  assert_eq!(errors, vec!["B: B: connection refused".to_string()]);
}

#[tokio::test]
async fn test_error_status_carries_backend_detail() {
  let server = MockServer::start().await;
  Mock::given(method("DELETE"))
    .and(path("/workflow/missing"))
    .respond_with(
      ResponseTemplate::new(404).set_body_json(json!({ "detail": "Workflow not found" })),
    )
    .mount(&server)
    .await;

  let result = client(&server).delete_workflow("missing").await;
  match result {
    Err(ClientError::Status { status, message }) => {
      assert_eq!(status, 404);
      assert_eq!(message, "Workflow not found");
    }
    other => panic!("unexpected result: {:?}", other),
  }
}

#[tokio::test]
async fn test_modify_workflow_sends_instruction() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/auto_workflow_modification"))
    .and(query_param("user_id", USER))
    .and(query_param("modification_instruction", "add a translator"))
    .respond_with(ResponseTemplate::new(200).set_body_json(workflow_json("wf-1")))
    .mount(&server)
    .await;

  let workflow = Workflow::new("wf-1", "Summarizer");
  let modified = client(&server)
    .modify_workflow(&workflow, "add a translator")
    .await
    .unwrap();
  assert_eq!(modified.components.len(), 1);
}

#[tokio::test]
async fn test_stream_workflow_yields_agent_events() {
  let server = MockServer::start().await;
  let body = [
    json!({ "workflow_id": "wf-1", "outputs": {} }).to_string(),
    json!({ "workflow_id": "wf-1", "outputs": {
      "A": { "label": "A", "name": "Reader", "className": "Reader",
             "output": { "dataType": "TEXT", "value": "page" } }
    }})
    .to_string(),
    json!({ "workflow_id": "wf-1", "outputs": { "B": "B failed" } }).to_string(),
  ]
  .join("\n");

  Mock::given(method("POST"))
    .and(path("/workflow/stream"))
    .and(query_param("workflow_id", "wf-1"))
    .and(query_param("user_id", USER))
    .and(body_json(json!({ "inputs": [] })))
    .respond_with(ResponseTemplate::new(200).set_body_string(body))
    .mount(&server)
    .await;

  let stream = client(&server)
    .stream_workflow("wf-1", "call-1", CancellationToken::new())
    .await
    .unwrap();
  let events: Vec<AgentEvent> = stream.map(|e| e.unwrap()).collect().await;

  let kinds: Vec<&str> = events.iter().map(AgentEvent::kind).collect();
  assert_eq!(
    kinds,
    vec![
      "lunar-component-invocation",
      "lunar-component-result",
      "lunar-component-error",
      "lunar-agent-result",
    ]
  );
}

#[tokio::test]
async fn test_cancelled_stream_ends_without_agent_result() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/workflow/stream"))
    .respond_with(
      ResponseTemplate::new(200)
        .set_body_string(json!({ "workflow_id": "wf-1", "outputs": {} }).to_string()),
    )
    .mount(&server)
    .await;

  let cancel = CancellationToken::new();
  cancel.cancel();

  let stream = client(&server)
    .stream_workflow("wf-1", "call-1", cancel)
    .await
    .unwrap();
  let events: Vec<_> = stream.collect().await;
  assert!(events.is_empty());
}
