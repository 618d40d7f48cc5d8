//! Queue listing URLs and drain the queue until done or interrupted
//!
//! ```bash
//! cargo run --example process_queue -- [--config closet-dl.json] <url>...
//! ```
//!
//! Set `RUST_LOG=closet_dl=debug` for per-file detail.

use closet_dl::{Config, Event, Pipeline, process_until_shutdown};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("closet_dl=info")),
        )
        .init();

    let mut args = std::env::args().skip(1).peekable();
    let config = if args.peek().map(String::as_str) == Some("--config") {
        args.next();
        let path = PathBuf::from(args.next().ok_or("--config needs a path")?);
        Config::from_file(&path)?
    } else {
        Config::default()
    };

    let pipeline = Pipeline::new(config).await?;

    let mut events = pipeline.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::Started { label, .. } => println!("-> {label}"),
                Event::Skipped { url } => println!("   already downloaded: {url}"),
                Event::FetchFailed { error, .. } => println!("   download failed: {error}"),
                Event::Organized {
                    location, moved, ..
                } => println!("   {moved} photos in {}", location.display()),
                Event::OrganizeFailed { errors, .. } => {
                    println!("   left unorganized: {}", errors.join("; "))
                }
                _ => {}
            }
        }
    });

    for url in args {
        pipeline.enqueue(&url).await?;
    }

    println!(
        "{} pending of {} queued",
        pipeline.queue().count_pending().await,
        pipeline.queue().count().await
    );

    let summary = process_until_shutdown(&pipeline).await;
    println!(
        "done: {} completed, {} downloaded, {} skipped, {} failed{}",
        summary.completed,
        summary.downloaded,
        summary.skipped,
        summary.failed,
        if summary.cancelled { " (interrupted)" } else { "" }
    );

    let stats = pipeline.ledger().get_global_stats().await;
    println!(
        "closet: {} sellers, {} listings, {} images",
        stats.total_users, stats.total_articles, stats.total_images
    );

    Ok(())
}
