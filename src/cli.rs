use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::DEFAULT_PART_COUNT;

#[derive(Parser, Debug)]
#[command(version, about = "A concurrent range-splitting downloader", long_about = None)]
pub struct Cli {
    /// URL to download
    #[arg(required = true, index = 1)]
    pub url: String,

    /// Output file name (defaults to the server-provided or URL-derived name)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<String>,

    /// Output directory (defaults to the current directory)
    #[arg(short = 'd', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Number of parts downloaded concurrently
    #[arg(short, long, value_name = "NUM", default_value_t = DEFAULT_PART_COUNT)]
    pub parts: usize,

    /// Expected SHA-256 of the merged file, as hex; omit to skip verification
    #[arg(long, value_name = "HEX")]
    pub sha256: Option<String>,

    /// Quiet mode - only errors
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub quiet: bool,

    /// Verbose output
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub verbose: bool,
}
