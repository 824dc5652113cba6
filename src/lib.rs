pub mod cli;
pub mod downloader;
pub mod error;
pub mod models;
pub mod utils;

pub const DEFAULT_PART_COUNT: usize = 10;
pub const USER_AGENT: &str = concat!("partfetch/", env!("CARGO_PKG_VERSION"));
