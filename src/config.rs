use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Regions scanned by the regional collectors
  pub regions: Vec<String>,
  /// Region used to call the global services (Route53, CloudFront, S3)
  pub global_region: String,
  pub cache_dir: PathBuf,
  pub output_dir: PathBuf,
  /// Collector invocations allowed to run at once
  pub concurrency: usize,
  /// Abort the run on the first collector failure instead of skipping it
  pub fail_fast: bool,
  pub aws: AwsConfig,
  pub fetch: FetchConfig,
  pub logging: LoggingConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      regions: ["us-west-1", "us-west-2", "us-east-1", "us-east-2", "ap-southeast-2"]
        .into_iter()
        .map(String::from)
        .collect(),
      global_region: "us-east-1".to_string(),
      cache_dir: PathBuf::from("cache"),
      output_dir: PathBuf::from("data"),
      concurrency: 4,
      fail_fast: false,
      aws: AwsConfig::default(),
      fetch: FetchConfig::default(),
      logging: LoggingConfig::default(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
  /// AWS CLI executable
  pub cli: String,
  /// Named profile passed as `--profile`
  pub profile: Option<String>,
}

impl Default for AwsConfig {
  fn default() -> Self {
    Self {
      cli: "aws".to_string(),
      profile: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
  pub timeout_secs: u64,
  pub max_retries: u32,
  pub retry_backoff_ms: u64,
}

impl Default for FetchConfig {
  fn default() -> Self {
    Self {
      timeout_secs: 60,
      max_retries: 3,
      retry_backoff_ms: 500,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
  /// Filter directive used when RUST_LOG is unset
  pub level: String,
  /// Directory for a daily rotated log file, in addition to stderr
  pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      file: None,
    }
  }
}

impl Config {
  /// Load configuration from file, falling back to built-in defaults.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./cloudgraph.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/cloudgraph/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };
    config.validate()?;

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("cloudgraph.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("cloudgraph").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    // an empty document means "all defaults"
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  pub fn validate(&self) -> Result<()> {
    if self.concurrency == 0 {
      return Err(eyre!("concurrency must be at least 1"));
    }
    if !is_region_name(&self.global_region) {
      return Err(eyre!("invalid global_region {:?}", self.global_region));
    }
    if let Some(region) = self.regions.iter().find(|r| !is_region_name(r)) {
      return Err(eyre!("invalid region {:?}", region));
    }
    Ok(())
  }
}

// Regions end up in cache file names, so only [a-z0-9-] is accepted.
fn is_region_name(region: &str) -> bool {
  !region.is_empty()
    && region
      .bytes()
      .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}
