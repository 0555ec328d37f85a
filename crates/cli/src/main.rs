mod output;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use data_loader::{Dataset, DatasetPaths};
use output::{OutputFormat, write_neighbors, write_recommendations};
use pipeline::{RecommendationRun, Recommender, RecommenderConfig};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing::debug;

/// Neighbor Recs - user-based collaborative filtering for movie ratings
#[derive(Parser)]
#[command(name = "neighbor-recs")]
#[command(about = "Recommend movies from the ratings of your most similar users", long_about = None)]
struct Cli {
    /// Directory holding the three CSV tables
    #[arg(short, long, default_value = "data", global = true)]
    data_dir: PathBuf,

    /// Community ratings CSV (user_id,movie_id,rating_val)
    #[arg(long, global = true)]
    ratings: Option<PathBuf>,

    /// Movie catalog CSV (movie_id,tmdb_id,movie_title,year_released)
    #[arg(long, global = true)]
    movies: Option<PathBuf>,

    /// Your own ratings CSV (id,Rating)
    #[arg(long, global = true)]
    target: Option<PathBuf>,

    /// User id your ratings are recorded under
    #[arg(short, long, default_value = "me", global = true)]
    username: String,

    #[command(subcommand)]
    command: Commands,
}

/// Knobs shared by the commands that select neighbors
#[derive(Args, Debug, Clone, Copy)]
struct NeighborArgs {
    /// Items a user must have co-rated with you to count as a neighbor
    #[arg(long, default_value_t = RecommenderConfig::default().min_overlap)]
    min_overlap: usize,

    /// Number of neighbors to keep
    #[arg(long, default_value_t = RecommenderConfig::default().neighbors)]
    neighbors: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Get movie recommendations
    Recommend {
        #[command(flatten)]
        neighbor: NeighborArgs,

        /// Number of recommendations to return
        #[arg(long, default_value_t = RecommenderConfig::default().max_recommendations)]
        limit: usize,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show the neighbors behind each recommendation
        #[arg(long)]
        explain: bool,
    },

    /// Show your nearest neighbors
    Neighbors {
        #[command(flatten)]
        neighbor: NeighborArgs,
    },

    /// Show a summary of your ratings
    Profile {
        /// Number of top rated titles to list
        #[arg(long, default_value = "10")]
        top: usize,
    },
}

impl Cli {
    fn dataset_paths(&self) -> DatasetPaths {
        let defaults = DatasetPaths::in_dir(&self.data_dir);
        DatasetPaths {
            ratings: self.ratings.clone().unwrap_or(defaults.ratings),
            movies: self.movies.clone().unwrap_or(defaults.movies),
            target: self.target.clone().unwrap_or(defaults.target),
        }
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let paths = cli.dataset_paths();

    // Load and join the input tables
    eprintln!("Loading rating tables from {}...", cli.data_dir.display());
    let start = Instant::now();
    let dataset = Dataset::load(&paths, &cli.username).with_context(|| {
        format!(
            "Failed to load dataset ({}, {}, {})",
            paths.ratings.display(),
            paths.movies.display(),
            paths.target.display()
        )
    })?;
    eprintln!("{} Loaded dataset in {:?}", "✓".green(), start.elapsed());

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            neighbor,
            limit,
            format,
            output,
            explain,
        } => handle_recommend(&dataset, neighbor, limit, format, output, explain)?,
        Commands::Neighbors { neighbor } => handle_neighbors(&dataset, neighbor)?,
        Commands::Profile { top } => handle_profile(&dataset, top)?,
    }

    Ok(())
}

fn recommender(args: NeighborArgs) -> Recommender {
    Recommender::new()
        .with_min_overlap(args.min_overlap)
        .with_neighbors(args.neighbors)
}

/// Handle the 'recommend' command
fn handle_recommend(
    dataset: &Dataset,
    neighbor: NeighborArgs,
    limit: usize,
    format: OutputFormat,
    output: Option<PathBuf>,
    explain: bool,
) -> Result<()> {
    let recommender = recommender(neighbor).with_max_recommendations(limit);
    debug!("Recommender config: {:?}", recommender.config());

    let run = recommender
        .recommend(&dataset.log, &dataset.catalog)
        .context("Failed to compute recommendations")?;

    print_summary(&run);

    match output {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_recommendations(BufWriter::new(file), &run.recommendations, format, explain)?;
            eprintln!(
                "{} Wrote {} recommendations to {}",
                "✓".green(),
                run.recommendations.len(),
                path.display()
            );
        }
        None => {
            if format == OutputFormat::Text && !run.recommendations.is_empty() {
                println!("{}", "Movie Recommendations:".bold().blue());
            }
            write_recommendations(io::stdout().lock(), &run.recommendations, format, explain)?;
        }
    }

    Ok(())
}

/// Handle the 'neighbors' command
fn handle_neighbors(dataset: &Dataset, args: NeighborArgs) -> Result<()> {
    let neighbors = recommender(args)
        .find_neighbors(&dataset.log)
        .context("Failed to select neighbors")?;

    if neighbors.is_empty() {
        println!(
            "{}",
            format!(
                "No user shares at least {} rated movies with {}",
                args.min_overlap, dataset.log.target_user()
            )
            .yellow()
        );
        return Ok(());
    }

    println!("{}", format!("Nearest neighbors of {}:", dataset.log.target_user()).bold().blue());
    write_neighbors(io::stdout().lock(), &neighbors)
}

/// Handle the 'profile' command
fn handle_profile(dataset: &Dataset, top: usize) -> Result<()> {
    let ratings = dataset.log.target();

    println!("{}", format!("Profile: {}", dataset.log.target_user()).bold().blue());
    println!("{}Ratings: {}", "• ".green(), ratings.len());

    if ratings.is_empty() {
        return Ok(());
    }

    let mean = ratings.iter().map(|r| r.rating).sum::<f64>() / ratings.len() as f64;
    println!("{}Mean rating: {:.2}", "• ".green(), mean);

    let mut rated: Vec<(&str, f64)> = ratings
        .iter()
        .filter_map(|r| dataset.catalog.title(r.item_id).map(|title| (title, r.rating)))
        .collect();
    rated.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    println!("{}", "Top rated:".bold());
    let mut stdout = io::stdout().lock();
    for (rank, (title, rating)) in rated.iter().take(top).enumerate() {
        writeln!(stdout, "{:>4}. {} ({:.1})", (rank + 1).to_string().green(), title, rating)?;
    }

    Ok(())
}

/// Run counters on stderr so stdout stays clean for the output sink
fn print_summary(run: &RecommendationRun) {
    let stats = &run.stats;
    eprintln!(
        "{} {} users, {} movies, {} ratings ({} yours)",
        "•".green(),
        stats.users,
        stats.items,
        stats.ratings,
        stats.target_ratings
    );
    eprintln!(
        "{} {} eligible users, {} neighbors, {} candidates",
        "•".green(),
        stats.eligible_users,
        run.neighbors.len(),
        stats.candidates
    );
    if stats.skipped_items > 0 {
        eprintln!(
            "{} {} items skipped for missing titles",
            "!".yellow(),
            stats.skipped_items
        );
    }
}
