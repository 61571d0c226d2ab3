use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;

use stacks_pipeline::config::PipelineConfig;
use stacks_pipeline::pipeline::{run_pipeline, run_stage, Stage};
use stacks_pipeline::{logging, Result};

#[derive(Parser)]
#[command(name = "stacks_pipeline")]
#[command(about = "Batch cleaning pipeline for library operational datasets")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a TOML config file (default: config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the raw input extracts
    #[arg(long, global = true)]
    bronze: Option<PathBuf>,

    /// Directory the cleaned output is written to
    #[arg(long, global = true)]
    silver: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured cleaning stages in sequence
    Run {
        /// Specific stages to run (comma-separated). Available: circulation, events, catalogue, feedback
        #[arg(long)]
        stages: Option<String>,
    },
    /// Run a single stage, whether or not it is in the configured list
    Stage {
        /// Stage name. Available: circulation, events, catalogue, feedback
        name: String,
    },
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::load(cli.config.as_deref())?;
    if let Some(bronze) = &cli.bronze {
        config.bronze_dir = bronze.clone();
    }
    if let Some(silver) = &cli.silver {
        config.silver_dir = silver.clone();
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::Run { stages } => {
            if let Some(stage_list) = stages {
                config.stages = stage_list
                    .split(',')
                    .map(|s| s.trim().parse::<Stage>())
                    .collect::<Result<Vec<_>>>()?;
            }
            run_pipeline(&config)?;
        }
        Commands::Stage { name } => {
            let stage: Stage = name.parse()?;
            run_stage(stage, &config)?;
            println!("\n✅ {stage} stage completed successfully");
        }
    }
    Ok(())
}

fn main() {
    logging::init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("pipeline failed: {e}");
        println!("❌ Pipeline failed: {e}");
        std::process::exit(1);
    }
}
