// Copyright 2025 Servus Altissimi (Pseudonym)

// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use swarmsim::prelude::*;
use swarmsim::metrics::analyzer;

use clap::{Parser, Subcommand};
use anyhow::Result;
use std::path::PathBuf;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one simulation; flags override the JSON config when both are given
    Run {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short = 'e', long)]
        events: Option<PathBuf>,
        #[arg(long)]
        name: Option<String>,
        #[arg(short = 'n', long)]
        agents: Option<u32>,
        #[arg(short = 't', long)]
        timesteps: Option<u64>,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        #[arg(short, long)]
        framerate: Option<u32>,
        #[arg(long)]
        window_pad: Option<u32>,
        #[arg(short, long)]
        radius: Option<u32>,
        #[arg(short = 'a', long)]
        agent_type: Option<String>,
        #[arg(short, long)]
        boundary: Option<String>,
        #[arg(long)]
        collisions: bool,
        /// Record and draw this many trail samples per agent
        #[arg(long)]
        trails: Option<usize>,
        #[arg(short, long)]
        seed: Option<u64>,
        #[arg(long)]
        headless: bool,
        #[arg(long)]
        frame_every: Option<u64>,
        #[arg(long)]
        save: bool,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// 15 agents, 150 timesteps
    Smoke,

    Compare {
        #[arg(short = 'a', long, default_value = "ballistic,brownian")]
        agent_types: String,
        #[arg(short = 'n', long, default_value_t = 50)]
        agents: u32,
        #[arg(short = 't', long, default_value_t = 1000)]
        timesteps: u64,
        #[arg(short, long, default_value_t = 3)]
        repetitions: u32,
        #[arg(long)]
        collisions: bool,
        #[arg(short, long, default_value = "results")]
        output_dir: PathBuf,
    },

    Analyze {
        #[arg(default_value = "results")]
        path: PathBuf,
    },

    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let program_start = Instant::now();

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    match cli.command {
        Commands::Run {
            config,
            events,
            name,
            agents,
            timesteps,
            width,
            height,
            framerate,
            window_pad,
            radius,
            agent_type,
            boundary,
            collisions,
            trails,
            seed,
            headless,
            frame_every,
            save,
            output_dir,
        } => {
            let mut sim_config = match config {
                Some(path) => SimConfig::from_json_file(path)?,
                None => SimConfig::default(),
            };

            if let Some(v) = name { sim_config.name = v; }
            if let Some(v) = agents { sim_config.num_agents = v; }
            if let Some(v) = timesteps { sim_config.duration = v; }
            if let Some(v) = width { sim_config.width = v; }
            if let Some(v) = height { sim_config.height = v; }
            if let Some(v) = framerate { sim_config.framerate = v; }
            if let Some(v) = window_pad { sim_config.window_pad = v; }
            if let Some(v) = radius { sim_config.agent_radius = v; }
            if let Some(v) = agent_type { sim_config.agent_type = v; }
            if let Some(v) = boundary { sim_config.boundary = v.parse()?; }
            if collisions { sim_config.physical_collision_avoidance = true; }
            if let Some(v) = trails { sim_config = sim_config.with_trails(v); }
            if let Some(v) = seed { sim_config.seed = Some(v); }
            if headless { sim_config.with_visualization = false; }
            if let Some(v) = frame_every { sim_config.frame_every = v; }
            if save { sim_config.save_results = true; }
            if let Some(v) = output_dir { sim_config.output_dir = v; }

            let events = match events {
                Some(path) => ScriptedInput::from_json_file(path)?,
                None => ScriptedInput::new(),
            };

            run_single_simulation(sim_config, events, shutdown).await?;
        }

        Commands::Smoke => {
            let config = SimConfig::smoke();
            run_single_simulation(config, ScriptedInput::new(), shutdown).await?;
        }

        Commands::Compare {
            agent_types,
            agents,
            timesteps,
            repetitions,
            collisions,
            output_dir,
        } => {
            compare_agent_types(
                &agent_types,
                agents,
                timesteps,
                repetitions,
                collisions,
                output_dir,
                program_start,
                shutdown,
            ).await?;
        }

        Commands::Analyze { path } => {
            analyze_results(&path)?;
        }

        Commands::List => {
            println!("\nAvailable Agent Types");

            for name in BehaviorRegistry::global().list() {
                println!("  - {}", name);
            }

            println!("\nUsage: cargo run -- run --agent-type <name>");
            println!("Example: cargo run -- run --agent-type brownian -n 30 --trails 40\n");
        }
    }

    let total_time = program_start.elapsed();
    info!("Total runtime: {:.2}s", total_time.as_secs_f64());

    Ok(())
}

async fn run_single_simulation(
    config: SimConfig,
    events: ScriptedInput,
    shutdown: CancellationToken,
) -> Result<()> {
    info!("swarmsim: Single Run");

    let mut sim = Simulation::new(config)?
        .with_events(events)
        .with_shutdown(shutdown);
    let report = sim.start().await?;

    info!(
        "{:?} after {} timesteps ({} frames) in {:.2}s",
        report.outcome,
        report.steps,
        report.frames,
        report.elapsed.as_secs_f64()
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn compare_agent_types(
    agent_types: &str,
    agents: u32,
    timesteps: u64,
    repetitions: u32,
    collisions: bool,
    output_dir: PathBuf,
    global_start: Instant,
    shutdown: CancellationToken,
) -> Result<()> {
    let names: Vec<&str> = agent_types.split(',').map(|s| s.trim()).collect();

    info!("swarmsim: Comparison");
    info!("Agent types: {}", names.join(", "));
    info!("Repetitions: {}", repetitions);
    info!("Timesteps per run: {}", timesteps);

    let mut all_reports = Vec::new();

    for agent_type in names {
        info!("Testing: {}", agent_type);

        let mut type_reports = Vec::new();

        for rep in 1..=repetitions {
            let elapsed = global_start.elapsed();
            info!("  Run {}/{} - Elapsed: {:.1}s", rep, repetitions, elapsed.as_secs_f64());

            let config = SimConfig::new(agents, timesteps)
                .headless()
                .with_name(format!("{}_{}", agent_type, rep))
                .with_agent_type(agent_type)
                .with_collisions(collisions)
                .with_seed(rep as u64);

            let mut sim = Simulation::new(config)?.with_shutdown(shutdown.clone());
            let report = sim.start().await?;
            if report.outcome == Outcome::Quit {
                anyhow::bail!("Comparison interrupted");
            }
            type_reports.push(report.analysis);
        }

        if let Some(avg) = analyzer::average_reports(&type_reports) {
            all_reports.push(avg);
        }
    }

    analyzer::comparison_table(&all_reports);

    std::fs::create_dir_all(&output_dir)?;
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let comparison_path = output_dir.join(format!("comparison_{}.json", timestamp));
    std::fs::write(&comparison_path, serde_json::to_string_pretty(&all_reports)?)?;
    info!("Comparison saved to: {}", comparison_path.display());

    Ok(())
}

fn analyze_results(path: &std::path::Path) -> Result<()> {
    info!("Analyzing results in: {}", path.display());

    let reports = analyzer::load_summaries(path)?;
    if reports.is_empty() {
        info!("No summary files found.");
        return Ok(());
    }

    analyzer::comparison_table(&reports);

    Ok(())
}
