use clap::Parser;
use std::path::PathBuf;

/// Extract book summaries from a PDF and pick one at random
#[derive(Parser, Debug)]
#[command(name = "booksum", version, about)]
pub struct Cli {
    /// Path to the input PDF file
    pub input: PathBuf,

    /// Print every extracted summary instead of a random pick
    #[arg(short, long, default_value_t = false)]
    pub all: bool,

    /// Number of random summaries to print
    #[arg(short, long, default_value_t = 1, conflicts_with = "all")]
    pub count: usize,
}
