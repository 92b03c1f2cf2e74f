//! # msql
//!
//! A command-line tool for querying mass spectrometry runs.
//!
//! ## Usage
//!
//! ```bash
//! # Scans whose MS2 spectrum contains a 226.18 product ion
//! msql query sample.mzML "QUERY scaninfo(MS2DATA) WHERE MS2PROD=226.18:TOLERANCEPPM=5"
//!
//! # Write the result to a file
//! msql query sample.mzML "QUERY scanmz(MS2DATA) WHERE MS2NL=163" -o precursors.tsv
//!
//! # Inspect the parsed query tree
//! msql parse "QUERY MS1DATA WHERE MS2PREC=X FILTER MS1MZ=X"
//!
//! # Pre-build the table cache
//! msql cache sample.mzML other.mzML
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
