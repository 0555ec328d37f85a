use data_loader::{Dataset, DatasetPaths};
use std::path::Path;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let data_dir = Path::new("data");

    println!("Loading rating tables from {}...\n", data_dir.display());

    let start = Instant::now();
    let dataset = Dataset::load(&DatasetPaths::in_dir(data_dir), "me")?;
    let elapsed = start.elapsed();

    let (movies, community, target) = dataset.counts();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Movies: {}", movies);
    println!("Community ratings: {}", community);
    println!("Target ratings: {}", target);
    println!("\nPerformance: {:.0} ratings/second",
             (community + target) as f64 / elapsed.as_secs_f64());

    Ok(())
}
