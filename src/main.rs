//! Headless multiverse host: bootstraps worlds from config, plays a session
//! script against them and writes the event journal as JSONL.

mod config;
mod session_script;

use anyhow::{Context, Result};
use clap::Parser;
use config::{MultiverseConfig, DEFAULT_CONFIG_PATH};
use multiverse_core::EventBus;
use multiverse_server::{Multiverse, OwnershipLedger};
use multiverse_testkit::{JsonlSink, SessionReport, StepTally};
use session_script::{apply_step, SessionScript};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run a scripted multiverse session", long_about = None)]
struct Args {
    /// Host configuration (TOML)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Session script (JSON) to play
    #[arg(long)]
    script: Option<PathBuf>,
    /// Write committed events here as JSONL
    #[arg(long)]
    events: Option<PathBuf>,
    /// Keep the clock running until at least this tick
    #[arg(long, default_value_t = 0)]
    ticks: u64,
    /// Write a JSON session report here
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = MultiverseConfig::load_from_path(&args.config);

    // RUST_LOG wins over the configured filter.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    let events = match config.event_journal_capacity {
        Some(capacity) => EventBus::with_capacity(capacity),
        None => EventBus::new(),
    };
    let mut host = Multiverse::with_events(config.role_table(), OwnershipLedger::new(), events);
    let worlds = host
        .bootstrap(config.admin, &config.worlds, config.square_world_size)
        .context("failed to bootstrap configured worlds")?;
    info!(worlds = worlds.len(), "multiverse bootstrapped");

    let mut sink = args.events.as_ref().map(JsonlSink::create).transpose()?;
    let mut script = args
        .script
        .as_deref()
        .map(SessionScript::from_path)
        .transpose()?;
    let end = script
        .as_ref()
        .map_or(args.ticks, |script| script.last_tick().0.max(args.ticks));

    let mut tally = StepTally::default();
    let mut journal = Vec::new();
    loop {
        if let Some(script) = script.as_mut() {
            for step in script.drain_ready_steps(host.now()) {
                match apply_step(&mut host, &step, config.square_world_size) {
                    Ok(()) => tally.committed += 1,
                    Err(err) => {
                        warn!(tick = step.tick, caller = %step.caller, "step rejected: {err:#}");
                        tally.rejected += 1;
                    }
                }
            }
        }

        let committed = host.drain_events();
        if let Some(sink) = sink.as_mut() {
            sink.write_all(&committed)?;
        }
        journal.extend(committed);

        let script_done = script.as_ref().map_or(true, SessionScript::is_finished);
        if script_done && host.now().0 >= end {
            break;
        }
        host.advance(1);
    }

    if let Some(sink) = sink.as_mut() {
        sink.flush()?;
    }

    let name = script.as_ref().map_or("session", |script| script.name());
    let report = SessionReport::new(name, host.now(), tally, &journal, host.world_ids().count());
    info!(
        tick = %report.final_tick,
        committed = report.steps.committed,
        rejected = report.steps.rejected,
        events = report.event_count(),
        "session finished"
    );
    if let Some(path) = &args.report {
        report
            .write_to(path)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
    }
    Ok(())
}
