// crates/pdfcli/src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pdfcore::{Action, ExecutionEvent, InputMode, PdfFile, Workflow, WorkflowSettings};
use pdfops::{standard_registry, DryRunOperations};
use pdfruntime::{HandlerRegistry, PdfRuntime, Plan, RuntimeConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pdfflow")]
#[command(about = "PDF workflow runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow file against input documents
    Run {
        /// Path to workflow JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Input document; repeat for several
        #[arg(short, long = "input", required = true)]
        inputs: Vec<PathBuf>,

        /// Route every input through the graph on its own
        #[arg(long)]
        per_artifact: bool,

        /// Abort the execution after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Maximum number of branches running at once
        #[arg(long)]
        max_parallel: Option<usize>,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate a workflow file
    Validate {
        /// Path to workflow JSON file
        file: PathBuf,
    },

    /// List available action types
    Actions,

    /// Create a new example workflow
    Init {
        /// Output file path
        #[arg(short, long, default_value = "workflow.json")]
        output: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

fn registry() -> HandlerRegistry {
    standard_registry(Arc::new(DryRunOperations))
}

fn load_workflow(file: &Path) -> Result<Workflow> {
    let workflow_json = std::fs::read_to_string(file)
        .with_context(|| format!("reading workflow {}", file.display()))?;
    let workflow = serde_json::from_str(&workflow_json)
        .with_context(|| format!("parsing workflow {}", file.display()))?;
    Ok(workflow)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            inputs,
            per_artifact,
            timeout_ms,
            max_parallel,
            verbose,
        } => {
            init_logging(verbose);

            let mut workflow = load_workflow(&file)?;
            if per_artifact {
                workflow.settings.input_mode = InputMode::PerArtifact;
            }
            if timeout_ms.is_some() {
                workflow.settings.max_execution_time_ms = timeout_ms;
            }
            if max_parallel.is_some() {
                workflow.settings.max_parallel_branches = max_parallel;
            }

            run_workflow(workflow, &inputs).await?;
        }

        Commands::Validate { file } => {
            init_logging(false);
            validate_workflow(&file)?;
        }

        Commands::Actions => {
            list_actions();
        }

        Commands::Init { output } => {
            create_example_workflow(&output)?;
        }
    }

    Ok(())
}

async fn run_workflow(workflow: Workflow, inputs: &[PathBuf]) -> Result<()> {
    println!("🚀 Workflow: {}", workflow.name);
    println!("   Nodes: {}", workflow.node_count());
    println!("   Inputs: {}", inputs.len());
    println!();

    let mut files = Vec::with_capacity(inputs.len());
    for path in inputs {
        let content = std::fs::read(path).with_context(|| format!("reading input {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        files.push(PdfFile::new(name, content));
    }

    let runtime = PdfRuntime::with_registry(Arc::new(registry()), RuntimeConfig::default());
    let mut handle = runtime.spawn(workflow, files);

    let cancellation = handle.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling execution");
            cancellation.cancel();
        }
    });

    while let Some(event) = handle.next_event().await {
        match event {
            ExecutionEvent::ExecutionStarted { execution_id, .. } => {
                println!("▶️  Execution {} started", execution_id);
            }
            ExecutionEvent::NodeStarting {
                action_type, branch, ..
            } => {
                println!("  ⚡ [{}] {}", branch, action_type);
            }
            ExecutionEvent::NodeCompleted {
                action_type,
                branch,
                outputs,
                duration_ms,
                ..
            } => {
                println!(
                    "  ✅ [{}] {} -> {} in {}ms",
                    branch,
                    action_type,
                    outputs.join(", "),
                    duration_ms
                );
            }
            ExecutionEvent::NodeFailed {
                action_type,
                branch,
                error,
                ..
            } => {
                println!("  ❌ [{}] {} failed: {}", branch, action_type, error);
            }
            ExecutionEvent::JoinArrived {
                join,
                branch,
                remaining,
                ..
            } => {
                println!("  ⏳ [{}] arrived at '{}', {} to go", branch, join, remaining);
            }
            ExecutionEvent::JoinFired { join, artifacts, .. } => {
                println!("  🔗 '{}' fired with {}", join, artifacts.join(", "));
            }
            ExecutionEvent::ExecutionCompleted {
                success, duration_ms, ..
            } => {
                if success {
                    println!("✨ Execution completed in {}ms", duration_ms);
                } else {
                    println!("💥 Execution failed after {}ms", duration_ms);
                }
            }
        }
    }

    let result = handle.wait().await?;

    println!();
    println!("📊 Execution Summary:");
    println!("   Execution ID: {}", result.execution_id);
    println!("   Steps run: {} ({} nodes)", result.steps_run, result.total_nodes);
    println!("   Joins fired: {}", result.joins_fired);
    println!();
    println!("📤 Results:");
    for file in &result.files {
        println!("   {} ({} bytes)", file.name, file.content().len());
    }

    Ok(())
}

fn validate_workflow(file: &Path) -> Result<()> {
    println!("🔍 Validating workflow: {}", file.display());

    let workflow = load_workflow(file)?;
    // thresholds scale with the root branch count; one branch checks the same structure
    let plan = Plan::compile(&workflow.actions, &registry(), 1)?;

    println!("✅ Workflow is valid:");
    println!("   Name: {}", workflow.name);
    println!("   Nodes: {}", plan.len());
    let mut joins: Vec<_> = plan.joins().iter().collect();
    joins.sort_by(|a, b| a.0.cmp(b.0));
    for (join, spec) in joins {
        println!("   Join '{}': {} arrival(s) per root branch", join, spec.expected);
    }

    Ok(())
}

fn list_actions() {
    println!("📦 Available Action Types:");
    println!();

    let registry = registry();
    for action_type in registry.list_action_types() {
        let Some(handler) = registry.get(action_type) else {
            continue;
        };
        let metadata = handler.metadata();
        println!("  • {} ({})", action_type, handler.cardinality());
        println!("    {}", metadata.description);
        if !metadata.required_values.is_empty() {
            println!("    values: {}", metadata.required_values.join(", "));
        }
    }
    println!("  • wait / done (structural)");
}

fn create_example_workflow(output: &Path) -> Result<()> {
    let mut workflow = Workflow::new(
        "Example PDF Workflow",
        vec![
            Action::new("extract")
                .with_value("pagesToExtractArray", vec![0, 1])
                .then(vec![Action::wait("cover")]),
            Action::new("rotate")
                .with_value("rotation", 90)
                .then(vec![Action::wait("cover")]),
            Action::join(
                "cover",
                vec![Action::new("merge").then(vec![Action::done()])],
            ),
        ],
    )
    .with_settings(WorkflowSettings {
        max_execution_time_ms: Some(60_000),
        ..WorkflowSettings::default()
    });
    workflow.description =
        Some("Extracts the first pages and a rotated copy, then merges both".to_string());

    let json = serde_json::to_string_pretty(&workflow)?;
    std::fs::write(output, json)?;

    println!("✨ Created example workflow: {}", output.display());
    println!();
    println!("Run it with:");
    println!("  pdfflow run --file {} --input document.pdf", output.display());

    Ok(())
}
