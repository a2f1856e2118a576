mod app;
mod aws;
mod cache;
mod collectors;
mod config;
mod graph;
mod logging;
mod output;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "cloudgraph")]
#[command(about = "Inventory an AWS account into a dependency graph")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./cloudgraph.yaml, then $XDG_CONFIG_HOME/cloudgraph/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Region to scan; repeat to scan several (replaces the configured list)
  #[arg(short, long = "region")]
  regions: Vec<String>,

  /// Ignore cached responses and refetch everything
  #[arg(long)]
  refresh: bool,

  /// Where nodes.csv, edges.csv and graph.json are written
  #[arg(long)]
  output_dir: Option<PathBuf>,

  #[arg(long)]
  cache_dir: Option<PathBuf>,

  /// AWS CLI profile
  #[arg(long)]
  profile: Option<String>,

  /// Collector invocations to run at once
  #[arg(long)]
  concurrency: Option<usize>,
}

impl Args {
  fn apply(self, mut config: config::Config) -> Result<config::Config> {
    if !self.regions.is_empty() {
      config.regions = self.regions;
    }
    if let Some(dir) = self.output_dir {
      config.output_dir = dir;
    }
    if let Some(dir) = self.cache_dir {
      config.cache_dir = dir;
    }
    if let Some(profile) = self.profile {
      config.aws.profile = Some(profile);
    }
    if let Some(concurrency) = self.concurrency {
      config.concurrency = concurrency;
    }
    config.validate()?;
    Ok(config)
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let refresh = args.refresh;

  let config = config::Config::load(args.config.as_deref())?;
  let config = args.apply(config)?;

  // Held until exit so the file writer flushes
  let _log_guard = logging::init(&config.logging)?;

  let app = app::App::new(config, refresh)?;

  let summary = tokio::select! {
    summary = app.run() => summary?,
    _ = tokio::signal::ctrl_c() => {
      warn!("interrupted, no graph written");
      return Err(eyre!("Interrupted"));
    }
  };

  info!(
    account = summary.account_id.as_deref().unwrap_or("unknown"),
    nodes = summary.nodes,
    edges = summary.edges,
    failed = summary.failed.len(),
    "run complete"
  );
  if !summary.failed.is_empty() {
    warn!(collectors = %summary.failed.join(", "), "some collectors were skipped");
  }
  for file in &summary.files {
    println!("{}", file.display());
  }

  Ok(())
}
