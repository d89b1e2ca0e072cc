//! Download an HLS stream from the command line
//!
//! ```bash
//! RUST_LOG=hls_dl=debug cargo run --example download -- \
//!     https://example.com/stream/index.m3u8 video.mp4 --remux
//! ```
//!
//! This example demonstrates:
//! - Building a job configuration
//! - Subscribing to progress events
//! - Canceling cleanly on Ctrl+C

use hls_dl::{Event, HlsJob, JobConfig, JobStatus, run_until_signal};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "hls_dl=info".into()))
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(url), Some(output)) = (args.next(), args.next()) else {
        eprintln!("usage: download <playlist-url> <output> [--remux]");
        std::process::exit(2);
    };
    let remux = args.any(|a| a == "--remux");

    let config = JobConfig {
        concurrency: 8,
        remux,
        ..Default::default()
    };
    let job = HlsJob::new(url, output, config)?;

    let mut events = job.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::Progress(p) => println!("[{}/{}] {}", p.completed, p.total, p.path.display()),
                Event::Converted { output } => println!("remuxed into {}", output.display()),
                Event::Error { message } => eprintln!("error: {message}"),
                _ => {}
            }
        }
    });

    match run_until_signal(job).await? {
        JobStatus::Completed => println!("done"),
        other => println!("stopped: {other}"),
    }
    Ok(())
}
