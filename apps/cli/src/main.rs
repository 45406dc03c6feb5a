use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

use forge_core::{
    ArtifactType, ConflictStrategy, ForgeError, ForgeService, InstallOptions, ListScope,
};

#[derive(Parser)]
#[command(name = "forge")]
#[command(about = "Package manager for AI-agent artifacts", long_about = None)]
struct Cli {
    /// Workspace directory (defaults to the current directory)
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Declare artifacts in the workspace config
    Add {
        /// References like `developer`, `agent:reviewer@^1.0`
        refs: Vec<String>,
    },
    /// Remove declared artifacts
    Remove { refs: Vec<String> },
    /// Resolve, compile and merge everything declared
    Install {
        /// Compile target
        #[arg(long, default_value = "claude")]
        target: String,
        /// Plan only, touch nothing
        #[arg(long)]
        dry_run: bool,
        /// overwrite | backup | skip | prompt
        #[arg(long, default_value = "skip")]
        on_conflict: String,
    },
    /// Search the configured registries
    Search {
        query: String,
        /// Narrow to one artifact type
        #[arg(long, value_name = "TYPE")]
        artifact_type: Option<String>,
    },
    /// List artifacts from the registries or the workspace lockfile
    List {
        /// registry | workspace
        #[arg(long, default_value = "registry")]
        scope: String,
        #[arg(long, value_name = "TYPE")]
        artifact_type: Option<String>,
    },
    /// Show the install order for one reference
    Resolve { reference: String },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", console::style("Error:").red().bold(), e);
        if let Some(hint) = suggestion_for(&e) {
            eprintln!("{} {}", console::style("  help:").dim(), hint);
        }
        std::process::exit(1);
    }
}

fn suggestion_for(error: &anyhow::Error) -> Option<String> {
    error.downcast_ref::<ForgeError>().and_then(|e| e.suggestion())
}

fn parse_type(s: Option<&str>) -> Result<Option<ArtifactType>, ForgeError> {
    s.map(ArtifactType::parse).transpose()
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let workspace = match cli.workspace {
        Some(path) => path,
        None => std::env::current_dir().context("cannot determine the current directory")?,
    };
    let service = ForgeService::new(workspace);

    match cli.command {
        Commands::Add { refs } => {
            service.add(&refs).await?;
            println!("Added {} artifact(s) to forge.yaml", refs.len());
        }
        Commands::Remove { refs } => {
            service.remove(&refs).await?;
            println!("Removed {} artifact(s) from forge.yaml", refs.len());
        }
        Commands::Install {
            target,
            dry_run,
            on_conflict,
        } => {
            let options = InstallOptions {
                target,
                dry_run,
                conflict_strategy: ConflictStrategy::from_str(&on_conflict)?,
            };
            let report = service.install(options).await?;

            if report.dry_run {
                println!("Would install {} artifact(s):", report.installed.len());
                for path in &report.planned {
                    println!("  {}", path);
                }
            } else {
                println!(
                    "Installed {} artifact(s): {} written, {} skipped, {} backed up",
                    report.installed.len(),
                    report.merge.written.len(),
                    report.merge.skipped.len(),
                    report.merge.backed_up.len()
                );
                for conflict in &report.merge.conflicts {
                    println!("  conflict: {} ({})", conflict.path, conflict.resolution);
                }
            }
        }
        Commands::Search {
            query,
            artifact_type,
        } => {
            let results = service
                .search(&query, parse_type(artifact_type.as_deref())?)
                .await?;
            for hit in results {
                println!(
                    "{:>4}  {}  {}  [{}]",
                    hit.score,
                    hit.reference,
                    hit.description,
                    hit.matched.join(",")
                );
            }
        }
        Commands::List {
            scope,
            artifact_type,
        } => {
            let scope = match scope.as_str() {
                "registry" => ListScope::Registry,
                "workspace" => ListScope::Workspace,
                other => anyhow::bail!("unknown scope '{}' (expected registry|workspace)", other),
            };
            for summary in service.list(scope, parse_type(artifact_type.as_deref())?).await? {
                println!("{}  {}", summary.reference, summary.description);
            }
        }
        Commands::Resolve { reference } => {
            for (index, r) in service.resolve(&reference).await?.iter().enumerate() {
                println!("{:>3}. {}", index + 1, r);
            }
        }
    }

    Ok(())
}
