use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};
use std::time::Instant;

use msql::engine::Engine;
use msql::provider::CachePaths;

use super::{ensure_exists, EngineArgs};

/// Build (or rebuild) the table caches of the given runs
pub fn run(inputs: &[PathBuf], force: bool, config: Option<PathBuf>) -> Result<()> {
    for input in inputs {
        ensure_exists(input)?;
    }

    let args = EngineArgs {
        config,
        threads: Some(1),
        no_cache: false,
    };
    // Runs are loaded once each
    let mut engine_config = args.engine_config()?;
    engine_config.memoize = false;
    engine_config.use_disk_cache = true;
    let engine = super::new_engine(engine_config)?;

    for input in inputs {
        warm(&engine, input, force)?;
    }
    Ok(())
}

fn warm(engine: &Engine, input: &Path, force: bool) -> Result<()> {
    let paths = CachePaths::for_run(input);
    if paths.exists() {
        if !force {
            println!("{}: cache already present", input.display());
            return Ok(());
        }
        info!("Removing existing cache for {}", input.display());
        paths.remove().context("Failed to remove existing cache")?;
    }

    let start = Instant::now();
    let tables = engine
        .provider()
        .load(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    if !paths.exists() {
        anyhow::bail!("Cache files were not written next to {}", input.display());
    }

    println!(
        "{}: cache written in {:.2}s",
        input.display(),
        start.elapsed().as_secs_f64()
    );
    println!("  {} ({} rows)", paths.ms1.display(), tables.ms1.len());
    println!("  {} ({} rows)", paths.ms2.display(), tables.ms2.len());
    Ok(())
}
