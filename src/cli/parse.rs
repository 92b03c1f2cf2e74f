use anyhow::{Context, Result};

/// Parse a query and print its tree as JSON
pub fn run(query: &str, compact: bool) -> Result<()> {
    let tree = msql::query::parse(query).context("Failed to parse query")?;
    let json = if compact {
        serde_json::to_string(&tree)?
    } else {
        serde_json::to_string_pretty(&tree)?
    };
    println!("{}", json);
    Ok(())
}
