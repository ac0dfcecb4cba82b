//! Shop search CLI - migrations, reindexing and ad-hoc queries.
//!
//! # Usage
//!
//! ```bash
//! # Create the shop and search schemas
//! shop-search migrate
//!
//! # Rebuild one search collection, or all of them
//! shop-search reindex products
//! shop-search reindex all
//!
//! # Search as a caller holding the given permissions
//! shop-search search orders "bill name" --shop shop-1 --permission read_orders
//!
//! # Check account fields against the registration rules
//! shop-search validate username tenten
//! shop-search validate email "" --optional
//! ```
//!
//! # Environment Variables
//!
//! See [`shop_search::config`]. `RUST_LOG` overrides the default
//! `shop_search=info` filter.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shop_search::{LogFormat, SearchConfig};
use shop_search_core::{Permission, SearchCollection};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "shop-search")]
#[command(author, version, about = "Shop search CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Rebuild search collections from the source entities
    Reindex {
        #[command(subcommand)]
        target: ReindexTarget,
    },
    /// Search a collection on behalf of a caller
    Search {
        /// Collection to search (`products`, `accounts`, `orders`)
        collection: SearchCollection,

        /// Free-text term; blank matches everything
        #[arg(default_value = "")]
        term: String,

        /// Shop to search in (defaults to `SEARCH_DEFAULT_SHOP_ID`)
        #[arg(short, long)]
        shop: Option<String>,

        /// Permissions held by the caller (repeatable)
        #[arg(short, long = "permission")]
        permissions: Vec<Permission>,

        /// Maximum number of records to print
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Validate account fields
    Validate {
        #[command(subcommand)]
        field: ValidateField,
    },
}

#[derive(Subcommand)]
enum ReindexTarget {
    /// Rebuild the product search collection
    Products,
    /// Rebuild the account search collection
    Accounts,
    /// Rebuild the order search collection
    Orders,
    /// Rebuild every search collection
    All,
}

impl ReindexTarget {
    const fn collections(&self) -> &'static [SearchCollection] {
        match self {
            Self::Products => &[SearchCollection::Products],
            Self::Accounts => &[SearchCollection::Accounts],
            Self::Orders => &[SearchCollection::Orders],
            Self::All => &SearchCollection::ALL,
        }
    }
}

#[derive(Subcommand)]
enum ValidateField {
    /// Validate a username
    Username { value: String },
    /// Validate an email address
    Email {
        value: String,

        /// Accept a blank value
        #[arg(long)]
        optional: bool,
    },
    /// Validate a password
    Password {
        value: String,

        /// Only require a non-empty password (login rather than signup)
        #[arg(long)]
        exists: bool,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &SearchConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(log_format: LogFormat, with_sentry: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shop_search=info,shop_search_cli=info".into());

    let is_json = log_format == LogFormat::Json;
    let json_layer = is_json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_json).then(tracing_subscriber::fmt::layer);
    let sentry_layer =
        with_sentry.then(|| sentry_tracing::layer().event_filter(sentry_event_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_layer)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match SearchConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LogFormat::default(), false);
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let sentry_guard = init_sentry(&config);
    init_tracing(config.log_format, sentry_guard.is_some());
    if sentry_guard.is_some() {
        tracing::info!("Sentry initialized");
    }

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &SearchConfig) -> Result<(), CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run(config).await?,
        Commands::Reindex { target } => {
            commands::reindex::run(config, target.collections()).await?;
        }
        Commands::Search {
            collection,
            term,
            shop,
            permissions,
            limit,
        } => {
            let request = commands::search::SearchRequest {
                collection,
                term,
                shop,
                permissions,
                limit,
            };
            commands::search::run(config, request).await?;
        }
        Commands::Validate { field } => match field {
            ValidateField::Username { value } => commands::validate::username(&value)?,
            ValidateField::Email { value, optional } => {
                commands::validate::email(&value, optional)?;
            }
            ValidateField::Password { value, exists } => {
                commands::validate::password(&value, exists)?;
            }
        },
    }
    Ok(())
}
