//! kshow CLI
//!
//! A command-line tool for Kubernetes cluster reports: deployments and
//! their placement across on-demand and spot capacity, pods, nodes,
//! current resource usage and namespace utilization.

mod commands;
mod config;
mod inventory;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{get, stats, CommandContext};
use kshow_lib::{FailurePolicy, ReportAssembler, ReportLogger};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// kshow CLI
#[derive(Parser)]
#[command(name = "kshow")]
#[command(author, version, about = "A command-line tool for Kubernetes cluster reports", long_about = None)]
pub struct Cli {
    /// Path to kubeconfig file (uses KUBECONFIG or ~/.kube/config if not specified)
    #[arg(long)]
    pub kubeconfig: Option<String>,

    /// Kubeconfig context to use
    #[arg(long)]
    pub context: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<output::OutputFormat>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    /// Treat collections the API server refuses to list as empty
    #[arg(long)]
    pub ignore_unavailable: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List deployments, pods or nodes
    Get {
        /// Object kind (deployment, pods, nodes)
        object: get::Object,

        /// Filter by namespace (all namespaces if not specified)
        #[arg(long, short)]
        namespace: Option<String>,

        /// Show detailed view
        #[arg(long)]
        detailed: bool,

        /// Show deployment tolerations
        #[arg(long)]
        show_tolerations: bool,
    },

    /// Show current CPU and memory usage per pod
    ResourceStats {
        /// Filter by namespace (all namespaces if not specified)
        #[arg(long, short)]
        namespace: Option<String>,

        /// Break usage down per container
        #[arg(long)]
        detailed: bool,
    },

    /// Show namespace consumption against cluster capacity
    Utilization {
        /// Filter by namespace (all namespaces if not specified)
        #[arg(long, short)]
        namespace: Option<String>,
    },
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let json_layer = json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let plain_layer = (!json).then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(plain_layer)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let settings = config::Settings::load()?;

    let format = cli.format.or(settings.format).unwrap_or_default();
    let kubeconfig = cli.kubeconfig.or(settings.kubeconfig);
    let context = cli.context.or(settings.context);
    let policy = if cli.ignore_unavailable {
        FailurePolicy::TreatAsEmpty
    } else {
        FailurePolicy::Propagate
    };

    let client = inventory::connect(kubeconfig.as_deref(), context.as_deref()).await?;
    tracing::debug!(
        context = context.as_deref().unwrap_or("current"),
        ?policy,
        "Connected to cluster"
    );

    let logger = ReportLogger::new(context.as_deref().unwrap_or("current"));
    let ctx = CommandContext {
        inventory: Box::new(inventory::KubeInventory::new(client, logger.clone())),
        assembler: ReportAssembler::new(logger.clone(), settings.label_keys),
        logger,
        policy,
        format,
    };

    let default_namespace = settings.default_namespace;
    let resolve = |namespace: Option<String>| namespace.or_else(|| default_namespace.clone());

    match cli.command {
        Commands::Get {
            object,
            namespace,
            detailed,
            show_tolerations,
        } => {
            let namespace = resolve(namespace);
            get::get_object(&ctx, object, namespace.as_deref(), detailed, show_tolerations)
                .await?;
        }
        Commands::ResourceStats {
            namespace,
            detailed,
        } => {
            let namespace = resolve(namespace);
            stats::resource_stats(&ctx, namespace.as_deref(), detailed).await?;
        }
        Commands::Utilization { namespace } => {
            let namespace = resolve(namespace);
            stats::utilization(&ctx, namespace.as_deref()).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
