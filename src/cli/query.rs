use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;
use std::time::Instant;

use msql::query::{parse, Query};

use super::{ensure_exists, EngineArgs};

/// Execute a query and write the result as TSV
pub fn run(
    input: &Path,
    query: &str,
    json: bool,
    output: Option<&Path>,
    args: &EngineArgs,
) -> Result<()> {
    ensure_exists(input)?;
    let query = if json {
        load_json(Path::new(query))?
    } else {
        parse(query).context("Failed to parse query")?
    };

    let engine = args.build_engine()?;

    let start = Instant::now();
    let result = engine
        .execute_query(&query, input)
        .with_context(|| format!("Query failed on {}", input.display()))?;
    info!(
        "{} rows ({}) in {:.2}s",
        result.len(),
        result.shape(),
        start.elapsed().as_secs_f64()
    );

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            result
                .write_tsv(BufWriter::new(file))
                .context("Failed to write result")?;
            info!("Wrote result to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            result
                .write_tsv(stdout.lock())
                .context("Failed to write result")?;
        }
    }

    engine.shutdown();
    Ok(())
}

/// Read a query tree from a JSON file
fn load_json(path: &Path) -> Result<Query> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open query file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse query tree: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_json_tree() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("query.json");
        let query = parse("QUERY scannum(MS2DATA) WHERE MS2PROD=150.0:TOLERANCEMZ=0.05").unwrap();
        std::fs::write(&path, serde_json::to_string(&query).unwrap()).unwrap();

        assert_eq!(load_json(&path).unwrap(), query);
    }

    #[test]
    fn test_load_json_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("query.json");
        std::fs::write(&path, "{\"conditions\": 3}").unwrap();

        assert!(load_json(&path).is_err());
    }
}
