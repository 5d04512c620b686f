use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use cartograph::storage::GraphStore;
use cartograph::{EdgeType, MemoryStore, Orchestrator, Settings};

#[derive(Parser)]
#[command(name = "cartograph")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Incremental code property graph indexing")]
struct Cli {
    /// Path to a cartograph.toml (defaults to ./cartograph.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Index a repository and print run statistics
    Index {
        /// Repository root
        path: PathBuf,

        /// Worker threads (overrides config)
        #[arg(short, long)]
        threads: Option<usize>,

        /// List discovered files without indexing
        #[arg(long)]
        dry_run: bool,

        /// Emit run statistics as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    cartograph::logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Init { force } => {
            let path = PathBuf::from("cartograph.toml");
            if path.exists() && !force {
                anyhow::bail!("cartograph.toml already exists (use --force to overwrite)");
            }
            std::fs::write(&path, toml_template(&settings)?)?;
            println!("wrote {}", path.display());
        }
        Commands::Index {
            path,
            threads,
            dry_run,
            json,
        } => {
            if let Some(threads) = threads {
                settings.indexing.parallel_threads = threads;
            }
            let settings = Arc::new(settings);
            let root = path.canonicalize()?;

            if dry_run {
                let files = cartograph::pipeline::FileWalker::new(settings).discover(&root)?;
                for file in &files {
                    println!("{}\t{}", file.language, file.rel_path);
                }
                println!("{} files", files.len());
                return Ok(());
            }

            let store = MemoryStore::new();
            let orchestrator = Orchestrator::new(settings, &store, &root);
            let project = orchestrator.project().to_string();
            let stats = orchestrator.run()?;

            if json {
                let mut edge_counts = serde_json::Map::new();
                for edge_type in EdgeType::ALL {
                    let count = store.count_edges_by_type(&project, edge_type)?;
                    if count > 0 {
                        edge_counts.insert(edge_type.as_str().to_string(), count.into());
                    }
                }
                let report = serde_json::json!({
                    "project": stats.project,
                    "files": stats.files_seen,
                    "indexed": stats.files_indexed,
                    "nodes": stats.nodes,
                    "edges": stats.edges,
                    "noop": stats.noop,
                    "duration_ms": stats.duration.as_millis() as u64,
                    "edge_counts": edge_counts,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            println!(
                "indexed {} ({} files, {} nodes, {} edges) in {:.2}s",
                stats.project,
                stats.files_seen,
                stats.nodes,
                stats.edges,
                stats.duration.as_secs_f64()
            );
            for edge_type in EdgeType::ALL {
                let count = store.count_edges_by_type(&project, edge_type)?;
                if count > 0 {
                    println!("  {edge_type}: {count}");
                }
            }
        }
    }
    Ok(())
}

fn toml_template(settings: &Settings) -> anyhow::Result<String> {
    Ok(toml::to_string_pretty(settings)?)
}
