use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use veil::config::Config;
use veil::filtering::composer;
use veil::filtering::strategy::Strategy;
use veil::filtering::types::ContentType;
use veil::output::terminal;
use veil::rules;

/// Veil: content visibility and moderation policy engine.
///
/// Inspect the moderation policy and the SQL predicates it produces for a
/// given viewing context.
#[derive(Parser)]
#[command(name = "veil", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the SQLite schema at VEIL_DB_PATH
    Init,

    /// Show severity levels and the threshold table
    Config,

    /// Show the action table of a viewing context
    Strategy {
        /// own_profile, search_by_id, meta_search, feed or hide_all
        name: String,
    },

    /// Print the composed WHERE clause of the standard listing rule set
    Predicate {
        /// Viewing context (see `veil strategy`)
        #[arg(long, default_value = "feed")]
        strategy: String,

        /// Content type being listed: user, post or comment
        #[arg(long, default_value = "post")]
        showing: String,

        /// Viewer user id (empty for anonymous)
        #[arg(long, default_value = "")]
        viewer: String,

        /// Viewer's severity preference (defaults to the strictest level)
        #[arg(long)]
        severity: Option<String>,

        /// Print the predicate and parameters as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("veil=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            let config = Config::load()?;
            init_database(&config)?;
        }

        Commands::Config => {
            let config = Config::load()?;
            terminal::display_policy(&config.policy);
        }

        Commands::Strategy { name } => {
            let strategy: Strategy = name.parse()?;
            terminal::display_strategy_table(strategy);
        }

        Commands::Predicate {
            strategy,
            showing,
            viewer,
            severity,
            json,
        } => {
            let config = Config::load()?;
            let strategy: Strategy = strategy.parse()?;
            let showing: ContentType = showing.parse()?;
            let severity = severity.or_else(|| config.policy.severity.strictest().map(str::to_string));

            let rule_set = rules::listing_rules(&config.policy, strategy, &viewer, severity.as_deref());
            let combined = composer::combine(&rule_set, showing)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&combined)?);
            } else {
                terminal::display_predicate(showing, &combined);
            }
        }
    }

    Ok(())
}

#[cfg(feature = "sqlite")]
fn init_database(config: &Config) -> Result<()> {
    info!("Initializing Veil database...");
    let conn = veil::db::initialize(&config.db_path)?;
    let table_count = veil::db::schema::table_count(&conn)?;
    println!("Database initialized at: {}", config.db_path);
    println!("Tables created: {table_count}");
    println!("\n{}", "Veil is ready.".bold());
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
fn init_database(_config: &Config) -> Result<()> {
    info!("SQLite support not compiled in");
    anyhow::bail!("`veil init` needs the `sqlite` feature. Rebuild with --features sqlite.")
}
