mod cli;
mod extractor;
mod pdf_reader;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use extractor::SummaryExtractor;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    let mut extractor = SummaryExtractor::new(&cli.input);

    let total = extractor
        .summaries()
        .with_context(|| format!("Failed to extract summaries from {}", cli.input.display()))?
        .len();
    eprintln!("Extracted {} summaries from {}", total, cli.input.display());

    if cli.all {
        for (i, summary) in extractor.summaries()?.iter().enumerate() {
            println!("{}. {}", i + 1, summary);
        }
    } else {
        for _ in 0..cli.count {
            println!("{}", extractor.random_summary()?);
        }
    }

    Ok(())
}
