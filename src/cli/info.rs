use anyhow::{Context, Result};
use std::path::Path;

use msql::provider::CachePaths;
use msql::table::{PeakRow, PeakTable, RunTables};

#[cfg(feature = "colorized_output")]
use console::style;

use super::{ensure_exists, EngineArgs};

/// Display a summary of the peak tables of a run
pub fn run(input: &Path, args: &EngineArgs) -> Result<()> {
    ensure_exists(input)?;

    let cached = CachePaths::for_run(input).exists();
    let engine = args.build_engine()?;
    let tables = engine
        .provider()
        .load(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    println!("{}", heading("msql Run Information"));
    println!("{}", heading("===================="));
    println!("File: {}", input.display());
    println!(
        "Cache: {}",
        if cached { "present" } else { "not present before this run" }
    );
    println!();

    print_table("MS1", &tables.ms1);
    print_table("MS2", &tables.ms2);
    print_precursors(&tables);

    Ok(())
}

fn print_table<T: PeakRow>(label: &str, table: &PeakTable<T>) {
    println!("{} Table:", heading(label));
    println!("  Peaks: {}", table.len());
    println!("  Scans: {}", table.scans().len());

    let rts = table.iter().map(T::retention_time);
    if let Some((min, max)) = min_max(rts) {
        println!("  Retention time: {:.3} - {:.3} min", min, max);
    }
    if let Some((min, max)) = min_max(table.iter().map(T::mz)) {
        println!("  m/z: {:.4} - {:.4}", min, max);
    }
    println!();
}

fn print_precursors(tables: &RunTables) {
    if let Some((min, max)) = min_max(tables.ms2.iter().map(|p| p.precursor_mz)) {
        println!("{}", heading("Precursors:"));
        println!("  m/z: {:.4} - {:.4}", min, max);
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[cfg(feature = "colorized_output")]
fn heading(text: &str) -> String {
    style(text).bold().cyan().to_string()
}

#[cfg(not(feature = "colorized_output"))]
fn heading(text: &str) -> String {
    text.to_string()
}
