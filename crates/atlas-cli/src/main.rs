//! Atlas CLI - enterprise architecture catalogue

use std::sync::Arc;

use atlas_core::config::Config;
use atlas_core::domain::{Role, UserRoleService};
use atlas_core::search::{SearchHit, SearchOptions, SearchServices};
use atlas_core::storage::Database;
use atlas_core::web::{self, AppState};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "atlas")]
#[command(author, version, about = "Enterprise architecture catalogue", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum SearchTarget {
    Application,
    Measurable,
    All,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Address to bind (overrides server.bind_address)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Search the catalogue
    Search {
        /// Entity kind to search
        #[arg(value_enum)]
        target: SearchTarget,
        /// Free-text query
        query: String,
        /// Maximum results per kind
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Apply pending database migrations
    Migrate,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Manage user roles
    Roles {
        #[command(subcommand)]
        action: RoleAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

#[derive(Subcommand)]
enum RoleAction {
    /// Grant a role to a user
    Grant {
        user: String,
        /// ADMIN, APP_EDITOR, LOGICAL_DATA_FLOW_EDITOR or ANONYMOUS
        role: String,
    },
    /// List the roles a user holds
    List { user: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("atlas=info".parse()?)
                .add_directive("atlas_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let result = run(cli).await;
    if let Err(err) = &result {
        if let Some(suggestion) = err
            .downcast_ref::<atlas_core::Error>()
            .and_then(|e| e.suggestion())
        {
            eprintln!("hint: {}", suggestion);
        }
    }
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { bind } => cmd_serve(bind).await,

        Commands::Search {
            target,
            query,
            limit,
        } => cmd_search(target, &query, limit, cli.format).await,

        Commands::Migrate => cmd_migrate(cli.quiet).await,

        Commands::Config { action } => cmd_config(action, cli.quiet),

        Commands::Roles { action } => cmd_roles(action, cli.format, cli.quiet).await,
    }
}

async fn open_database(config: &Config) -> anyhow::Result<Database> {
    Database::new(config.database.to_database_config()).await
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_serve(bind: Option<String>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let db = open_database(&config).await?;
    let search = SearchServices::from_config(&config, db.pool()).await?;

    let addr = bind.unwrap_or_else(|| config.server.bind_address.clone());
    info!(version = env!("CARGO_PKG_VERSION"), "Starting Atlas");

    let state = Arc::new(AppState::new(config, db.pool().clone(), search));
    web::serve(state, &addr).await?;

    db.close().await;
    Ok(())
}

async fn cmd_search(
    target: SearchTarget,
    query: &str,
    limit: Option<usize>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let db = open_database(&config).await?;
    let services = SearchServices::from_config(&config, db.pool()).await?;
    let options = SearchOptions::with_limit(limit.unwrap_or(config.search.default_limit));

    let hits: Vec<SearchHit> = match target {
        SearchTarget::Application => services
            .applications
            .search(query, &options)
            .await?
            .into_iter()
            .map(SearchHit::from)
            .collect(),
        SearchTarget::Measurable => services
            .measurables
            .search(query, &options)
            .await?
            .into_iter()
            .map(SearchHit::from)
            .collect(),
        SearchTarget::All => services.search_all(query, &options).await?,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&hits)?),
        OutputFormat::Text => {
            if hits.is_empty() {
                println!("No results.");
            }
            for hit in &hits {
                let (kind, id) = hit.identity();
                println!("{:<12} {:>8}  {}", kind.as_str(), id, hit.name());
            }
        }
    }

    Ok(())
}

async fn cmd_migrate(quiet: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let db = Database::new(config.database.to_database_config().no_migrate()).await?;

    let before = db.migration_status().await?;
    db.migrate().await?;
    let after = db.migration_status().await?;

    if !quiet {
        if before.needs_migration {
            println!(
                "Migrated {} from v{} to v{}",
                db.path().display(),
                before.current_version,
                after.current_version
            );
        } else {
            println!("Database is up to date (v{})", after.current_version);
        }
    }

    db.close().await;
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            println!("{}", config.get(&key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            for (key, value) in config.list()? {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            println!("{}", Config::config_path()?.display());
        }
    }
    Ok(())
}

async fn cmd_roles(action: RoleAction, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let db = open_database(&config).await?;
    let roles = UserRoleService::new(db.pool().clone());

    match action {
        RoleAction::Grant { user, role } => {
            let role = Role::parse(&role)
                .ok_or_else(|| atlas_core::Error::InvalidInput(format!("Unknown role: {}", role)))?;
            roles.grant(&user, role).await?;
            if !quiet {
                println!("Granted {} to {}", role, user);
            }
        }
        RoleAction::List { user } => {
            let held = roles.get_roles(&user).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&held)?),
                OutputFormat::Text => {
                    for role in held {
                        println!("{}", role);
                    }
                }
            }
        }
    }

    db.close().await;
    Ok(())
}
