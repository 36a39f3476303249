use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use lunarflow_client::{ClientConfig, LunarClient, RunResults};
use lunarflow_config::{ComponentModel, Workflow, WorkflowReference};
use lunarflow_workflow::{
  DependencyGraph, EditorState, FreeInputKey, GraphView, apply_free_input, bind_upstream_outputs,
  empty_template_variables, free_inputs, load_workflow, validate, workflow_output_label,
};

/// Lunarflow - build and run component workflows against a Lunar backend
#[derive(Parser)]
#[command(name = "lunarflow")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.lunarflow)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Backend base URL, overrides config.json
  #[arg(long, global = true, env = "LUNARBASE_URL")]
  base_url: Option<String>,

  /// User id sent with every request, overrides config.json
  #[arg(long, global = true, env = "LUNAR_USER_ID")]
  user_id: Option<String>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Check a workflow file locally without contacting the backend
  Inspect {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
  },

  /// Manage and run workflows on the backend
  Workflow {
    #[command(subcommand)]
    action: WorkflowAction,
  },

  /// Manage and run components on the backend
  Component {
    #[command(subcommand)]
    action: ComponentAction,
  },
}

#[derive(Subcommand)]
enum WorkflowAction {
  /// Print a stored workflow as JSON
  Get { workflow_id: String },

  /// List the user's workflows
  List,

  /// List the demo workflows
  Demos,

  /// Create an empty workflow, or copy a template
  Create {
    name: String,

    #[arg(long, default_value = "")]
    description: String,

    /// Copy this template workflow instead of starting empty
    #[arg(long)]
    template: Option<String>,
  },

  /// Generate a workflow from a plain-language intent
  Auto { intent: String },

  /// Ask the backend to change a workflow
  Modify {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
    instruction: String,
  },

  /// Save a workflow file to the backend
  Save {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
  },

  /// Delete a stored workflow
  Delete { workflow_id: String },

  /// Run a workflow file, filling free inputs first
  Run {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    /// Free input as `<key>=<value>`, key as printed by `inspect`
    #[arg(long = "input", value_name = "KEY=VALUE")]
    inputs: Vec<String>,
  },

  /// Cancel a running workflow
  Cancel { workflow_id: String },

  /// Stream a stored workflow's results as agent events (Ctrl-C stops)
  Stream {
    workflow_id: String,

    #[arg(long, default_value = "cli")]
    tool_call_id: String,
  },
}

#[derive(Subcommand)]
enum ComponentAction {
  /// List the available components
  List,

  /// Run one component of a workflow file with its upstream outputs bound
  Run {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    #[arg(long)]
    label: String,
  },

  /// Save a component definition file to the backend
  Save {
    component_file: PathBuf,

    /// Update an existing component instead of creating one
    #[arg(long)]
    update: bool,
  },

  /// Delete a custom component
  Delete { component_id: String },

  /// Print the example workflow for a component
  Example { component_id: String },
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing()?;

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".lunarflow"),
  };

  match cli.command {
    Some(Commands::Inspect { workflow_file }) => inspect(&workflow_file),
    Some(Commands::Workflow { action }) => {
      let client = connect(&data_dir, cli.base_url, cli.user_id)?;
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(async { workflow_command(&client, action).await })
    }
    Some(Commands::Component { action }) => {
      let client = connect(&data_dir, cli.base_url, cli.user_id)?;
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(async { component_command(&client, action).await })
    }
    None => {
      println!("lunarflow - use --help to see available commands");
      Ok(())
    }
  }
}

fn init_tracing() -> Result<()> {
  let env_filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new("info"))
    .map_err(|e| anyhow::anyhow!("failed to create env filter: {e}"))?;

  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
    .with(env_filter)
    .try_init()
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))
}

fn connect(
  data_dir: &Path,
  base_url: Option<String>,
  user_id: Option<String>,
) -> Result<LunarClient> {
  let config = ClientConfig::load(data_dir)
    .context("failed to load client config")?
    .with_overrides(base_url, user_id);
  LunarClient::new(&config).context("failed to create client")
}

fn read_workflow(path: &Path) -> Result<Workflow> {
  let content = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read workflow file: {}", path.display()))?;
  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse workflow file: {}", path.display()))
}

fn read_component(path: &Path) -> Result<ComponentModel> {
  let content = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read component file: {}", path.display()))?;
  serde_json::from_str(&content)
    .with_context(|| format!("failed to parse component file: {}", path.display()))
}

fn print_workflow(workflow: &Workflow) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(workflow)?);
  Ok(())
}

fn print_references(references: &[WorkflowReference]) {
  for reference in references {
    if reference.invalid_errors.is_empty() {
      println!("{}\t{}", reference.id, reference.name);
    } else {
      println!("{}\t{}\t(invalid)", reference.id, reference.name);
    }
  }
}

/// Editor state that reports to the terminal.
#[derive(Default)]
struct TerminalState {
  errors: Vec<String>,
}

impl EditorState for TerminalState {
  fn set_values(&mut self, name: &str, description: &str) {
    if description.is_empty() {
      eprintln!("Workflow: {}", name);
    } else {
      eprintln!("Workflow: {} - {}", name, description);
    }
  }

  fn set_errors(&mut self, errors: &[String]) {
    self.errors = errors.to_vec();
  }

  fn set_results(&mut self, results: &HashMap<String, ComponentModel>) {
    let mut labels: Vec<&String> = results.keys().collect();
    labels.sort();
    for label in labels {
      println!("{}: {}", label, results[label].output.value);
    }
  }
}

fn inspect(workflow_file: &Path) -> Result<()> {
  let workflow = read_workflow(workflow_file)?;

  let mut graph = GraphView::new();
  let mut state = TerminalState::default();
  load_workflow(&mut graph, &workflow, &mut state);
  eprintln!(
    "Loaded {} nodes, {} edges",
    graph.nodes().len(),
    graph.edges().len()
  );
  for error in &state.errors {
    eprintln!("  stored error: {}", error);
  }

  let deps = DependencyGraph::new(&workflow);
  println!("Entry points: {}", deps.entry_points().join(", "));
  let mut joins: Vec<&String> = deps.join_points().iter().collect();
  joins.sort();
  if !joins.is_empty() {
    let joins: Vec<&str> = joins.into_iter().map(String::as_str).collect();
    println!("Join points: {}", joins.join(", "));
  }
  match workflow_output_label(&workflow) {
    Some(label) => println!("Output: {}", label),
    None => println!("Output: (ambiguous)"),
  }

  println!("Free inputs:");
  for free in free_inputs(&workflow) {
    println!("  {}\t{}\t{}", free.key, free.input.data_type, free.input.value);
  }

  let empty = empty_template_variables(&workflow);
  if !empty.is_empty() {
    println!("Empty template variables: {}", empty.join(", "));
  }

  if let Err(errors) = validate(&workflow) {
    for error in &errors {
      println!("Invalid: {}", error);
    }
    bail!("workflow has {} problem(s)", errors.len());
  }

  Ok(())
}

fn parse_input(raw: &str) -> Result<(FreeInputKey, serde_json::Value)> {
  let (key, value) = raw
    .split_once('=')
    .with_context(|| format!("input '{}' is not <key>=<value>", raw))?;
  let key: FreeInputKey = key
    .parse()
    .with_context(|| format!("invalid input key '{}'", key))?;
  // Bare text is taken as a string, anything that parses as JSON as JSON.
  let value = serde_json::from_str(value).unwrap_or_else(|_| serde_json::Value::from(value));
  Ok((key, value))
}

fn report_results(results: RunResults) -> Result<()> {
  let (components, errors) = results.split();
  let mut state = TerminalState::default();
  state.set_results(&components);

  if !errors.is_empty() {
    for error in &errors {
      eprintln!("Error: {}", error);
    }
    bail!("{} component(s) failed", errors.len());
  }
  Ok(())
}

async fn workflow_command(client: &LunarClient, action: WorkflowAction) -> Result<()> {
  match action {
    WorkflowAction::Get { workflow_id } => {
      let workflow = client
        .get_workflow(&workflow_id)
        .await
        .with_context(|| format!("failed to get workflow '{}'", workflow_id))?;
      print_workflow(&workflow)
    }
    WorkflowAction::List => {
      let references = client.list_workflows().await.context("failed to list workflows")?;
      print_references(&references);
      Ok(())
    }
    WorkflowAction::Demos => {
      let references = client.list_demos().await.context("failed to list demos")?;
      print_references(&references);
      Ok(())
    }
    WorkflowAction::Create {
      name,
      description,
      template,
    } => {
      let workflow = match template {
        Some(template_id) => client
          .create_workflow_from_template(&template_id)
          .await
          .with_context(|| format!("failed to copy template '{}'", template_id))?,
        None => client
          .create_workflow(&name, &description)
          .await
          .context("failed to create workflow")?,
      };
      eprintln!("Created workflow: {}", workflow.id);
      print_workflow(&workflow)
    }
    WorkflowAction::Auto { intent } => {
      let workflow = client
        .auto_workflow(&intent)
        .await
        .context("failed to generate workflow")?;
      print_workflow(&workflow)
    }
    WorkflowAction::Modify {
      workflow_file,
      instruction,
    } => {
      let workflow = read_workflow(&workflow_file)?;
      let modified = client
        .modify_workflow(&workflow, &instruction)
        .await
        .context("failed to modify workflow")?;
      print_workflow(&modified)
    }
    WorkflowAction::Save { workflow_file } => {
      let workflow = read_workflow(&workflow_file)?;
      if let Err(errors) = validate(&workflow) {
        for error in &errors {
          eprintln!("Warning: {}", error);
        }
      }
      client
        .save_workflow(&workflow)
        .await
        .with_context(|| format!("failed to save workflow '{}'", workflow.id))?;
      eprintln!("Saved workflow: {}", workflow.id);
      Ok(())
    }
    WorkflowAction::Delete { workflow_id } => {
      client
        .delete_workflow(&workflow_id)
        .await
        .with_context(|| format!("failed to delete workflow '{}'", workflow_id))?;
      eprintln!("Deleted workflow: {}", workflow_id);
      Ok(())
    }
    WorkflowAction::Run {
      workflow_file,
      inputs,
    } => {
      let mut workflow = read_workflow(&workflow_file)?;
      for raw in &inputs {
        let (key, value) = parse_input(raw)?;
        apply_free_input(&mut workflow, &key, value)
          .with_context(|| format!("failed to apply input '{}'", key))?;
      }

      let empty = empty_template_variables(&workflow);
      if !empty.is_empty() {
        eprintln!("Empty template variables: {}", empty.join(", "));
      }

      eprintln!("Running workflow: {}", workflow.name);
      let results = client
        .run_workflow(&workflow)
        .await
        .context("workflow execution failed")?;
      report_results(results)
    }
    WorkflowAction::Cancel { workflow_id } => {
      let results = client
        .cancel_workflow(&workflow_id)
        .await
        .with_context(|| format!("failed to cancel workflow '{}'", workflow_id))?;
      eprintln!("Cancelled workflow: {}", workflow_id);
      report_results(results)
    }
    WorkflowAction::Stream {
      workflow_id,
      tool_call_id,
    } => stream_workflow(client, &workflow_id, &tool_call_id).await,
  }
}

async fn stream_workflow(
  client: &LunarClient,
  workflow_id: &str,
  tool_call_id: &str,
) -> Result<()> {
  let cancel = CancellationToken::new();
  let ctrl_c = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      ctrl_c.cancel();
    }
  });

  let mut events = client
    .stream_workflow(workflow_id, tool_call_id, cancel.clone())
    .await
    .with_context(|| format!("failed to stream workflow '{}'", workflow_id))?;

  while let Some(event) = events.next().await {
    let event = event.context("workflow stream failed")?;
    println!("{}", serde_json::to_string(&event)?);
  }

  if cancel.is_cancelled() {
    eprintln!("Stream cancelled");
  }
  Ok(())
}

async fn component_command(client: &LunarClient, action: ComponentAction) -> Result<()> {
  match action {
    ComponentAction::List => {
      let components = client
        .list_components()
        .await
        .context("failed to list components")?;
      for component in components {
        println!(
          "{}\t{}\t{}",
          component.id.as_deref().unwrap_or("-"),
          component.class_name,
          component.name
        );
      }
      Ok(())
    }
    ComponentAction::Run {
      workflow_file,
      label,
    } => {
      let workflow = read_workflow(&workflow_file)?;
      let mut graph = GraphView::new();
      load_workflow(&mut graph, &workflow, &mut TerminalState::default());

      let component = bind_upstream_outputs(&graph, &label)
        .with_context(|| format!("component '{}' not found in workflow", label))?;

      eprintln!("Running component: {} ({})", label, component.class_name);
      let results = client
        .run_component(&component)
        .await
        .context("component execution failed")?;
      report_results(results)
    }
    ComponentAction::Save {
      component_file,
      update,
    } => {
      let component = read_component(&component_file)?;
      if update {
        client
          .update_component(&component)
          .await
          .context("failed to update component")?;
      } else {
        client
          .save_component(&component)
          .await
          .context("failed to save component")?;
      }
      eprintln!("Saved component: {}", component.name);
      Ok(())
    }
    ComponentAction::Delete { component_id } => {
      client
        .delete_component(&component_id)
        .await
        .with_context(|| format!("failed to delete component '{}'", component_id))?;
      eprintln!("Deleted component: {}", component_id);
      Ok(())
    }
    ComponentAction::Example { component_id } => {
      let workflow = client
        .component_example(&component_id)
        .await
        .with_context(|| format!("failed to get example for '{}'", component_id))?;
      print_workflow(&workflow)
    }
  }
}
