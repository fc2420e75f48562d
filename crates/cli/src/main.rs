use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use model_store::{ModelStore, TimestampMs, UserId};
use service::{EngineConfig, RecommendRequest, RecommendationItem, RecommendationService};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::info;

/// news-recs - Hybrid News Recommendation Engine
#[derive(Parser)]
#[command(name = "news-recs")]
#[command(about = "News recommendations from collaborative, content and temporal signals", long_about = None)]
struct Cli {
    /// Path to the model artifact directory
    #[arg(short, long, default_value = "data/news")]
    data_dir: PathBuf,

    /// Optional JSON engine configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get article recommendations for a user
    Recommend {
        /// User ID to get recommendations for
        #[arg(long)]
        user_id: UserId,

        /// Number of recommendations to return
        #[arg(long, default_value = "5")]
        limit: usize,

        /// Collaborative weight (config default when omitted)
        #[arg(long)]
        collab: Option<f64>,

        /// Content weight (config default when omitted)
        #[arg(long)]
        content: Option<f64>,

        /// Trend weight (config default when omitted)
        #[arg(long)]
        trend: Option<f64>,

        /// Plain top-N instead of category round-robin
        #[arg(long)]
        no_diversity: bool,

        /// Reference timestamp in epoch milliseconds (default: now)
        #[arg(long)]
        at: Option<TimestampMs>,

        /// Hype window in days (config default when omitted)
        #[arg(long)]
        max_age_days: Option<f64>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show a user's reading history and category profile
    User {
        /// User ID to display
        #[arg(long)]
        user_id: UserId,
    },

    /// List trending articles (non-personalized)
    Trending {
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Reference timestamp in epoch milliseconds (default: now)
        #[arg(long)]
        at: Option<TimestampMs>,

        /// Hype window in days (config default when omitted)
        #[arg(long)]
        max_age_days: Option<f64>,
    },

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            info!("Using engine configuration from {}", path.display());
            EngineConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };

    // Load model artifacts (this may take a moment)
    println!("Loading model artifacts from {}...", cli.data_dir.display());
    let start = Instant::now();
    let service = Arc::new(
        RecommendationService::load(&cli.data_dir, config).context("Failed to load model artifacts")?,
    );
    println!("{} Loaded model in {:?}", "✓".green(), start.elapsed());

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            user_id,
            limit,
            collab,
            content,
            trend,
            no_diversity,
            at,
            max_age_days,
            json,
        } => {
            let defaults = service.config().default_weights;
            let mut request = RecommendRequest::new(user_id)
                .with_count(limit)
                .with_weights(
                    collab.unwrap_or(defaults.collab),
                    content.unwrap_or(defaults.content),
                    trend.unwrap_or(defaults.trend),
                )
                .with_diversity(!no_diversity);
            if let Some(at) = at {
                request = request.at(at);
            }
            if let Some(max_age_days) = max_age_days {
                request = request.with_max_age_days(max_age_days);
            }
            handle_recommend(&service, &request, json)?
        }
        Commands::User { user_id } => handle_user(&service, user_id)?,
        Commands::Trending {
            limit,
            at,
            max_age_days,
        } => handle_trending(&service, limit, at, max_age_days)?,
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(service, requests, concurrent).await?,
    }

    Ok(())
}

/// Handle the 'recommend' command
fn handle_recommend(service: &RecommendationService, request: &RecommendRequest, json: bool) -> Result<()> {
    let start = Instant::now();
    let recommendations = service
        .recommend(request)
        .with_context(|| format!("Failed to recommend for user {}", request.user_id))?;
    let elapsed = start.elapsed();

    if json {
        let output = serde_json::to_string_pretty(&recommendations).context("Failed to serialize recommendations")?;
        println!("{}", output);
        return Ok(());
    }

    let store = service.store()?;
    let cold = store.profile(request.user_id).is_none_or(|p| p.is_empty());
    let header = format!(
        "Recommendations for user {} ({}, {:.2?}):",
        request.user_id,
        if cold { "cold start" } else { "personalized" },
        elapsed
    );
    println!("{}", header.bold().blue());
    print_items(&recommendations);
    Ok(())
}

/// Handle the 'user' command
fn handle_user(service: &RecommendationService, user_id: UserId) -> Result<()> {
    let store = service.store()?;
    let profile = store
        .profile(user_id)
        .ok_or_else(|| anyhow!("User {} has no recorded history", user_id))?;

    println!("{}", format!("User ID: {}", user_id).bold().blue());
    println!("{}Articles read: {}", "• ".green(), profile.history.len());
    println!(
        "{}In interaction matrix: {}",
        "• ".green(),
        store.user_index().index_of(user_id).is_some()
    );

    // Category preferences, most frequent first
    let mut frequencies: Vec<_> = profile
        .category_frequencies(|id| store.article_category(id))
        .into_iter()
        .collect();
    frequencies.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    println!("Category preferences:");
    for (category_id, frequency) in frequencies.iter().take(10) {
        println!("  - category {}: {:.1}%", category_id, frequency * 100.0);
    }

    println!("Most recent reads:");
    for &article_id in profile.history.iter().rev().take(10) {
        match store.article(article_id) {
            Some(meta) => println!(
                "  - {} [category {}] {} words, published {} (weight {:.2})",
                article_id,
                meta.category_id,
                meta.words_count,
                format_timestamp(meta.created_at_ts),
                profile.weight_of(article_id)
            ),
            None => println!("  - {} (no metadata)", article_id),
        }
    }
    Ok(())
}

/// Handle the 'trending' command
fn handle_trending(
    service: &RecommendationService,
    limit: usize,
    at: Option<TimestampMs>,
    max_age_days: Option<f64>,
) -> Result<()> {
    let items = service
        .trending(limit, at, max_age_days)
        .context("Failed to compute trending articles")?;

    let window = max_age_days.unwrap_or(service.config().max_article_age_days);
    println!("{}", format!("Trending articles (last {} days):", window).bold().blue());
    print_items(&items);
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(service: Arc<RecommendationService>, requests: usize, concurrent: usize) -> Result<()> {
    let store: Arc<ModelStore> = service.store()?;
    let users = store.known_users();
    if users.is_empty() {
        return Err(anyhow!("No users with history to benchmark"));
    }
    if requests == 0 {
        return Err(anyhow!("--requests must be at least 1"));
    }

    // Random known users
    let user_ids: Vec<UserId> = (0..requests)
        .map(|_| users[rand::random::<u32>() as usize % users.len()])
        .collect();

    // Scoring is CPU-bound: run each request on the blocking pool, at most
    // `concurrent` at a time
    let semaphore = Arc::new(Semaphore::new(concurrent.max(1)));
    let wall_clock = Instant::now();
    let mut handles = Vec::with_capacity(requests);
    for user_id in user_ids {
        let service = Arc::clone(&service);
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .context("Benchmark semaphore closed")?;
        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let start = Instant::now();
            service.recommend(&RecommendRequest::new(user_id))?;
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }

    let mut timings: Vec<Duration> = Vec::with_capacity(requests);
    for handle in handles {
        let elapsed = handle.await.context("Benchmark task panicked")??;
        timings.push(elapsed);
    }
    let wall_time = wall_clock.elapsed();

    let total: Duration = timings.iter().sum();
    let avg_latency = total / (timings.len() as u32);
    timings.sort();
    let percentile = |p: f64| timings[((timings.len() as f64 * p) as usize).min(timings.len() - 1)];
    let throughput = requests as f64 / wall_time.as_secs_f64();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Requests: {} ({} concurrent)", requests, concurrent.max(1));
    println!("Total time: {:?}", wall_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);

    Ok(())
}

/// Helper function to format and print recommendation items
fn print_items(items: &[RecommendationItem]) {
    if items.is_empty() {
        println!("  (no articles)");
        return;
    }
    for (rank, item) in items.iter().enumerate() {
        println!(
            "{}. article {} [category {}, publisher {}] {} words, published {} - Score: {:.3}",
            (rank + 1).to_string().green(),
            item.article_id,
            item.category_id,
            item.publisher_id,
            item.words_count,
            format_timestamp(item.created_at_ts),
            item.score
        );
    }
}

fn format_timestamp(ts: TimestampMs) -> String {
    DateTime::<Utc>::from_timestamp_millis(ts)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
