use clap::Parser;
use console::style;
use partfetch::{
    cli::Cli,
    downloader::Downloader,
    models::DownloadJob,
    utils::{format_bytes, format_duration, format_speed},
};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let output_dir = match cli.output_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let job = DownloadJob {
        url: cli.url,
        output_dir,
        output_file_name: cli.output,
        part_count: cli.parts,
        expected_sha256: cli.sha256,
    };

    if cli.verbose {
        println!("{}", style("partfetch").bold().cyan());
        println!("URL: {}", job.url);
        println!("Output dir: {}", job.output_dir.display());
        println!("Parts: {}", job.part_count);
        println!(
            "Verification: {}",
            job.expected_sha256.as_deref().unwrap_or("off")
        );
        println!();
    }

    let start_time = Instant::now();
    let downloader = Downloader::new(job)?;

    match downloader.run().await {
        Ok(dest) => {
            let elapsed = start_time.elapsed();
            let size = std::fs::metadata(&dest)?.len();

            if !cli.quiet {
                println!();
                println!(
                    "{}",
                    style("Download completed successfully!").green().bold()
                );
                println!("File: {}", dest.display());
                println!("Size: {}", format_bytes(size));
                println!("Time: {}", format_duration(elapsed.as_secs()));
                println!(
                    "Average speed: {}",
                    format_speed(size as f64 / elapsed.as_secs_f64())
                );
            }
            Ok(())
        }
        Err(e) => {
            if !cli.quiet {
                println!();
                eprintln!("{} {}", style("Error:").red().bold(), e);
            }
            std::process::exit(1);
        }
    }
}
