use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use msql::engine::{Engine, EngineConfig};

mod cache;
mod config;
mod info;
mod parse;
mod query;

pub use config::Config;

/// msql - Query language for mass spectrometry runs
#[derive(Parser)]
#[command(name = "msql")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Engine settings shared by every command that reads a run.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct EngineArgs {
    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Worker threads for variable expansion (0 = one per CPU)
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Neither read nor write the Parquet table cache
    #[arg(long)]
    no_cache: bool,
}

impl EngineArgs {
    /// Merge defaults, the config file and the flags, in that order.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let file = Config::load(self.config.as_deref())?;
        let mut config = file.apply(EngineConfig::default());
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if self.no_cache {
            config.use_disk_cache = false;
        }
        Ok(config)
    }

    /// Build an engine reading mzML runs.
    pub fn build_engine(&self) -> Result<Engine> {
        let config = self.engine_config()?;
        new_engine(config)
    }
}

#[cfg(feature = "mzml")]
fn new_engine(config: EngineConfig) -> Result<Engine> {
    Ok(Engine::new(config)?)
}

#[cfg(not(feature = "mzml"))]
fn new_engine(_config: EngineConfig) -> Result<Engine> {
    anyhow::bail!("msql was built without mzML support (enable the `mzml` feature)")
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a query against a run and write the result as TSV
    Query {
        /// Input mzML file path
        #[arg(value_name = "RUN")]
        input: PathBuf,

        /// Query text, e.g. "QUERY scaninfo(MS2DATA) WHERE MS2PROD=226.18"
        #[arg(value_name = "QUERY")]
        query: String,

        /// Treat QUERY as the path of a JSON query tree
        #[arg(long)]
        json: bool,

        /// Output TSV file (defaults to stdout)
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Parse a query and print its tree as JSON
    Parse {
        /// Query text
        #[arg(value_name = "QUERY")]
        query: String,

        /// Print on a single line
        #[arg(long)]
        compact: bool,
    },

    /// Build the Parquet table cache of one or more runs
    Cache {
        /// Input mzML file paths
        #[arg(value_name = "RUN", required = true)]
        inputs: Vec<PathBuf>,

        /// Discard existing caches and rebuild them
        #[arg(short, long)]
        force: bool,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Display the peak tables of a run
    Info {
        /// Input mzML file path
        #[arg(value_name = "RUN")]
        input: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Query {
            input,
            query,
            json,
            output,
            engine,
        } => query::run(&input, &query, json, output.as_deref(), &engine),
        Commands::Parse { query, compact } => parse::run(&query, compact),
        Commands::Cache {
            inputs,
            force,
            config,
        } => cache::run(&inputs, force, config),
        Commands::Info { input, engine } => info::run(&input, &engine),
    }
}

/// Fail early with a readable message when the run does not exist.
fn ensure_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("File does not exist: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_config() {
        let args = EngineArgs {
            config: None,
            threads: Some(3),
            no_cache: true,
        };
        let config = args.engine_config().unwrap();
        assert_eq!(config.threads, 3);
        assert!(!config.use_disk_cache);
    }

    #[test]
    fn test_parse_query_command() {
        let cli = Cli::try_parse_from([
            "msql",
            "-vv",
            "query",
            "run.mzML",
            "QUERY MS1DATA",
            "-o",
            "out.tsv",
            "--threads",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.verbosity(), 2);
        match cli.command {
            Commands::Query {
                input,
                query,
                json,
                output,
                engine,
            } => {
                assert_eq!(input, PathBuf::from("run.mzML"));
                assert_eq!(query, "QUERY MS1DATA");
                assert!(!json);
                assert_eq!(output, Some(PathBuf::from("out.tsv")));
                assert_eq!(engine.threads, Some(2));
                assert!(!engine.no_cache);
            }
            _ => panic!("expected query command"),
        }
    }

    #[test]
    fn test_cache_accepts_many_runs() {
        let cli = Cli::try_parse_from(["msql", "cache", "a.mzML", "b.mzML", "--force"]).unwrap();
        match cli.command {
            Commands::Cache { inputs, force, .. } => {
                assert_eq!(inputs.len(), 2);
                assert!(force);
            }
            _ => panic!("expected cache command"),
        }
        assert!(Cli::try_parse_from(["msql", "cache"]).is_err());
    }
}
