use clap::{Parser, Subcommand};
use std::path::PathBuf;

use marquee_core::{FailurePolicy, FileConfig, HarvestConfig, HttpConfig};

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "marquee")]
#[command(
    author,
    version,
    about = "Checkpointed movie catalog harvester for the TMDB API"
)]
#[command(after_help = "Examples:
  marquee run                      # 10 cycles, 5 minutes apart
  marquee run --cycles 3 --pause-secs 60
  marquee cycle                    # a single Discovery -> Credits -> Movies pass
  marquee status                   # show progress without calling the API

The API token is read from MOVIE_API_TOKEN at the start of every cycle
(a .env file is loaded if present). --api-token pins it for the whole run.")]
pub struct Config {
    /// TMDB API read access token, used instead of MOVIE_API_TOKEN
    #[arg(long, value_name = "TOKEN")]
    pub api_token: Option<String>,

    /// Base URL of the TMDB v3 API
    #[arg(long, env = "MOVIE_API_URL")]
    pub api_url: Option<String>,

    /// Directory holding movies_ids.json, movies.json and credits.json
    #[arg(long, env = "MARQUEE_DATA_DIR", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Custom path to marquee.toml configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// What to do with an id whose fetch failed: retry (default) or placeholder
    #[arg(long, value_name = "POLICY")]
    pub failure_policy: Option<FailurePolicy>,

    /// Save detail collections every N appended records (0 saves once per stage)
    #[arg(long, value_name = "N")]
    pub flush_every: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the scheduled harvest: a fixed number of cycles with a pause in between
    Run {
        /// Number of cycles to run
        #[arg(long)]
        cycles: Option<u32>,
        /// Seconds to sleep between cycles
        #[arg(long, value_name = "SECS")]
        pause_secs: Option<u64>,
    },
    /// Run exactly one cycle
    Cycle,
    /// Show checkpoint and collection counts
    Status,
}

/// Settings resolved from defaults, the config file and the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub data_dir: PathBuf,
    pub http: HttpConfig,
    pub harvest: HarvestConfig,
}

impl Config {
    /// Layers the command line on top of the config file and the defaults.
    pub fn resolve(&self, file: Option<&FileConfig>) -> Settings {
        let mut harvest = HarvestConfig::default();
        let mut http = HttpConfig::default();
        let mut api_url = marquee_core::DEFAULT_API_URL.to_string();
        let mut data_dir = PathBuf::from(marquee_core::DEFAULT_DATA_DIR);

        if let Some(file) = file {
            harvest = file.apply(harvest);
            http = file.http_config();
            if let Some(url) = &file.api_url {
                api_url = url.clone();
            }
            if let Some(dir) = &file.data_dir {
                data_dir = dir.clone();
            }
        }

        if let Some(url) = &self.api_url {
            api_url = url.clone();
        }
        if let Some(dir) = &self.data_dir {
            data_dir = dir.clone();
        }
        if let Some(policy) = self.failure_policy {
            harvest = harvest.with_failure_policy(policy);
        }
        if let Some(every) = self.flush_every {
            harvest = harvest.with_flush_every(Some(every));
        }
        if let Command::Run { cycles, pause_secs } = &self.command {
            if let Some(cycles) = cycles {
                harvest = harvest.with_cycles(*cycles);
            }
            if let Some(secs) = pause_secs {
                harvest = harvest.with_pause(std::time::Duration::from_secs(*secs));
            }
        }

        Settings {
            api_url,
            data_dir,
            http,
            harvest,
        }
    }
}
