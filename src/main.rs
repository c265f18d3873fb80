use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use footfall::analytics::VisitorLedger;
use footfall::config::{Config, DatabaseBackend};
use footfall::content::ContentStore;
use footfall::storage::{KeyValueStore, MemoryStore, PostgresStore, SqliteStore};
use footfall::tracker::{EnvironmentInfo, SystemClock, VisitTracker};

#[derive(Parser)]
#[command(name = "footfall")]
#[command(about = "Unique-visitor tracking CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one tracking pass and update the daily visitor ledger
    Track {
        /// User agent string of the visiting client
        #[arg(long, default_value = "footfall-cli")]
        user_agent: String,
        /// BCP-47 language tag
        #[arg(long, default_value = "en-US")]
        language: String,
        /// IANA timezone name
        #[arg(long, default_value = "UTC")]
        timezone: String,
        /// Screen resolution as WIDTHxHEIGHT
        #[arg(long, default_value = "1920x1080")]
        resolution: String,
        /// Color depth in bits
        #[arg(long, default_value_t = 24)]
        color_depth: u8,
    },
    /// Print the daily visitor counts
    Stats,
    /// Prune expired fingerprints from the durable map
    Prune,
    /// Show stored site content
    Content,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let durable: Arc<dyn KeyValueStore> = match config.database.backend {
        DatabaseBackend::Sqlite => {
            info!("Using SQLite storage: {}", config.database.url);
            Arc::new(SqliteStore::new(&config.database.url, 5).await?)
        }
        DatabaseBackend::Postgres => {
            info!("Using PostgreSQL storage: {}", config.database.url);
            Arc::new(PostgresStore::new(&config.database.url).await?)
        }
    };

    durable.init().await?;

    match cli.command {
        Commands::Track {
            user_agent,
            language,
            timezone,
            resolution,
            color_depth,
        } => {
            let environment = EnvironmentInfo {
                user_agent,
                language,
                timezone,
                screen_resolution: resolution,
                color_depth,
            };

            // Each invocation is its own browsing context, so the
            // tab-scoped store starts empty.
            let session_store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

            let tracker = VisitTracker::new(
                Arc::clone(&durable),
                session_store,
                Arc::new(SystemClock),
                environment,
                config.tracking.clone(),
            );

            if tracker.track_unique_visit().await {
                let ledger = VisitorLedger::new(Arc::clone(&durable));
                let today = chrono::Utc::now().date_naive();
                let total = ledger.record_visit(today).await?;
                println!("✓ Counted a new unique visit ({}: {} today)", today, total);
            } else {
                println!("Visit already counted within the current window");
            }
        }
        Commands::Stats => {
            let ledger = VisitorLedger::new(Arc::clone(&durable));
            let counts = ledger.counts().await?;

            if counts.is_empty() {
                println!("No visits recorded yet.");
            } else {
                println!("{:<12} {}", "Date", "Visitors");
                println!("{}", "-".repeat(24));
                let mut total = 0;
                for entry in &counts {
                    println!("{:<12} {}", entry.date, entry.visitors);
                    total += entry.visitors;
                }
                println!("{}", "-".repeat(24));
                println!("{:<12} {}", "Total", total);
            }
        }
        Commands::Prune => {
            let tracker = VisitTracker::new(
                Arc::clone(&durable),
                Arc::new(MemoryStore::new()),
                Arc::new(SystemClock),
                EnvironmentInfo::default(),
                config.tracking.clone(),
            );

            let removed = tracker.prune_recent_fingerprints().await;
            println!("✓ Pruned {} expired fingerprint(s)", removed);
        }
        Commands::Content => {
            let content = ContentStore::new(Arc::clone(&durable));

            let services = content.services().await?;
            println!("Services ({}):", services.len());
            for service in &services {
                println!("  [{}] {}: {}", service.category, service.title, service.description);
            }

            let testimonials = content.testimonials().await?;
            println!("Testimonials ({}):", testimonials.len());
            for testimonial in &testimonials {
                println!(
                    "  {} ({}/5): {}",
                    testimonial.name, testimonial.rating, testimonial.comment
                );
            }

            let contact = content.contact_info().await?;
            if !contact.email.is_empty() || !contact.phone.is_empty() {
                println!("Contact: {} / {}", contact.email, contact.phone);
            }
        }
    }

    Ok(())
}
