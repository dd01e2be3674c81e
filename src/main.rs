use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::sync::Arc;
use tracing::{info, warn};

use groupguard::classifier::gemini::GeminiGenerator;
use groupguard::classifier::traits::DisabledGenerator;
use groupguard::classifier::{ClassificationClient, CooldownTracker, TextGenerator};
use groupguard::config::Config;
use groupguard::db::{self, Database};
use groupguard::filter::ProfanityFilter;
use groupguard::knowledge::{QaDocument, MATCH_THRESHOLD, NOT_FOUND_REPLY};
use groupguard::moderation::{CommandContext, Moderator};
use groupguard::search::google::GoogleSearch;
use groupguard::search::youtube::YouTubeSearch;
use groupguard::search::SearchProvider;
use groupguard::transport::gateway::GatewayTransport;
use groupguard::web::{self, AppState};

/// GroupGuard: strike-based moderation for WhatsApp groups.
///
/// Deletes profanity and stickers, warns and eventually removes repeat
/// offenders, blocks abusive private senders, and answers a few group
/// commands.
#[derive(Parser)]
#[command(name = "groupguard", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the store (SQLite database or JSON document)
    Init,

    /// Run the bot: webhook receiver, QR login page and dashboard
    Run {
        /// Address to bind (default: all interfaces)
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
    },

    /// Serve the read-only dashboard as a separate process
    Dashboard {
        /// Address to bind (default: all interfaces)
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,
    },

    /// Show store status (size, action counts, last action)
    Status,

    /// Print the moderation audit log, newest first
    Log {
        /// Number of entries to show (default: 20)
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Clear a user's strikes in a group
    Pardon {
        /// Group chat id (e.g. 120363000000000000@g.us)
        group: String,
        /// User id (e.g. 923001234567@c.us)
        user: String,
    },

    /// Look up a question in the Q&A document without the bot
    Info {
        /// The question to look up
        query: Vec<String>,
    },

    /// List Gemini models that support generateContent
    Models,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("groupguard=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing GroupGuard store...");
            let config = Config::load()?;
            init_store(&config).await?;
            println!("\nGroupGuard is ready. Next step: set up your .env file");
            println!("  (see .env.example for required variables)");
            println!("\nThen start your WhatsApp gateway and run: cargo run -- run");
        }

        Commands::Run { bind } => {
            let config = Config::load()?;
            let db = db::open(&config.db_path).await?;
            let moderator = build_moderator(&config, db)?;

            println!(
                "Open {} to link WhatsApp, then watch actions at {}",
                format!("http://localhost:{}/qr", config.port).bold(),
                format!("http://localhost:{}/", config.port).bold(),
            );

            let state = AppState::bot(Arc::new(moderator), config.gateway_token.clone());
            web::run_server(state, config.port, &bind).await?;
        }

        Commands::Dashboard { bind } => {
            let config = Config::load()?;
            let db = db::open(&config.db_path).await?;
            web::run_server(AppState::dashboard(db), config.dashboard_port, &bind).await?;
        }

        Commands::Status => {
            let config = Config::load()?;
            let db = db::open(&config.db_path).await?;
            groupguard::status::show(&db, &config.db_path, backend_name(&config.db_path)).await?;
        }

        Commands::Log { limit } => {
            let config = Config::load()?;
            let db = db::open(&config.db_path).await?;
            let actions = db.recent_actions(limit).await?;
            groupguard::output::terminal::display_actions(&actions);
        }

        Commands::Pardon { group, user } => {
            let config = Config::load()?;
            let db = db::open(&config.db_path).await?;
            if db.reset_strikes(&group, &user).await? {
                println!("Strikes cleared for {} in {}", user.bold(), group);
            } else {
                println!("{} has no strikes in {}", user, group);
            }
        }

        Commands::Info { query } => {
            let config = Config::load()?;
            let query = query.join(" ");
            if query.trim().is_empty() {
                anyhow::bail!("Usage: groupguard info <question>");
            }
            let doc = QaDocument::load(&config.qa_path)?;
            let best = doc.best_candidate(&query);
            groupguard::output::terminal::display_qa_match(&query, best.as_ref(), MATCH_THRESHOLD);
            if doc.find_best_match(&query).is_none() {
                println!("\n  Bot reply: {}", NOT_FOUND_REPLY.dimmed());
            }
        }

        Commands::Models => {
            let config = Config::load()?;
            config.require_gemini()?;
            let gemini = GeminiGenerator::new(
                &config.gemini_api_url,
                config.gemini_api_key.clone(),
                &config.gemini_model,
                config.http_timeout,
            )?;
            let models = gemini.list_models().await?;
            groupguard::output::terminal::display_models(&models, &config.gemini_model);
        }
    }

    Ok(())
}

fn backend_name(db_path: &str) -> &'static str {
    if db::is_json_path(db_path) {
        "JSON document"
    } else {
        "SQLite"
    }
}

/// Create the store and report what was created.
async fn init_store(config: &Config) -> Result<()> {
    if db::is_json_path(&config.db_path) {
        db::json::JsonDatabase::open(&config.db_path).await?;
        println!("JSON store initialized at: {}", config.db_path);
        return Ok(());
    }
    init_sqlite(config).await
}

#[cfg(feature = "sqlite")]
async fn init_sqlite(config: &Config) -> Result<()> {
    let db = db::initialize_sqlite(&config.db_path)?;
    let table_count = db.table_count().await?;
    println!("Database initialized at: {}", config.db_path);
    println!("Tables created: {table_count}");
    Ok(())
}

#[cfg(not(feature = "sqlite"))]
async fn init_sqlite(config: &Config) -> Result<()> {
    // Fails with the "rebuild with --features sqlite" message.
    db::open(&config.db_path).await.map(|_| ())
}

/// Wire the gateway, the model, the search clients and the store into a Moderator.
fn build_moderator(config: &Config, db: Arc<dyn Database>) -> Result<Moderator> {
    let generator: Arc<dyn TextGenerator> = if config.gemini_api_key.is_empty() {
        warn!("GEMINI_API_KEY not set: safety screening and !bot are disabled");
        Arc::new(DisabledGenerator)
    } else {
        info!(model = config.gemini_model, "Using Gemini");
        Arc::new(GeminiGenerator::new(
            &config.gemini_api_url,
            config.gemini_api_key.clone(),
            &config.gemini_model,
            config.http_timeout,
        )?)
    };

    let cooldown = Arc::new(CooldownTracker::new(config.cooldown));
    let classifier = Arc::new(
        ClassificationClient::new(generator, cooldown).with_base_delay(config.retry_base_delay),
    );

    let knowledge = Arc::new(QaDocument::load_or_empty(&config.qa_path));

    let mut commands = CommandContext::new(classifier, knowledge);
    if let Some(owner) = &config.owner_info {
        commands.owner_info = owner.clone();
    }
    if config.has_web_search() {
        let google: Arc<dyn SearchProvider> = Arc::new(GoogleSearch::new(
            config.google_api_key.clone(),
            config.google_cse_id.clone(),
            config.http_timeout,
        )?);
        commands.web_search = Some(google);
    } else {
        info!("GOOGLE_API_KEY / GOOGLE_CSE_ID not set: !google is disabled");
    }
    if config.has_video_search() {
        let youtube: Arc<dyn SearchProvider> = Arc::new(YouTubeSearch::new(
            config.youtube_api_key.clone(),
            config.http_timeout,
        )?);
        commands.video_search = Some(youtube);
    } else {
        info!("YOUTUBE_API_KEY not set: !yt is disabled");
    }

    let transport = Arc::new(GatewayTransport::new(
        &config.gateway_url,
        config.gateway_token.clone(),
        config.http_timeout,
    )?);
    info!(gateway = config.gateway_url, "Using WhatsApp gateway");

    let filter = ProfanityFilter::new(config.extra_terms.iter().cloned());

    Ok(Moderator::new(transport, db, filter, commands))
}
