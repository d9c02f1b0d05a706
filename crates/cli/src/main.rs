//! Verdant CLI - drive the storefront engine from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Begin a login (prints the authorization URL)
//! verdant login
//!
//! # Complete the login with the values from the provider callback
//! verdant callback --code <code> --state <state>
//!
//! # Show the session and store status
//! verdant status
//!
//! # Cart operations
//! verdant cart show
//! verdant cart add --product p-42 --title "Ceramic mug" --price 18.50 --quantity 2
//! verdant cart coupon WELCOME10
//!
//! # Wishlist operations
//! verdant wishlist add --product p-42 --title "Ceramic mug" --price 18.50
//! ```
//!
//! Each invocation is one bootstrap cycle: load the boot cache, rehydrate
//! the session, run the command. State is persisted as it changes, so there
//! is nothing to flush on exit.

#![cfg_attr(not(test), forbid(unsafe_code))]
// A CLI talks to its user on stdout/stderr
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use verdant_client::ClientConfig;

mod commands;

use commands::Engine;

#[derive(Parser)]
#[command(name = "verdant")]
#[command(author, version, about = "Verdant storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Begin a login and print the authorization URL
    Login,
    /// Complete a login from the provider callback values
    Callback {
        /// Authorization code from the callback
        #[arg(long)]
        code: String,
        /// Anti-forgery state from the callback
        #[arg(long)]
        state: String,
    },
    /// Show session and store status
    Status,
    /// End the session
    Logout,
    /// Cart operations
    Cart {
        #[command(subcommand)]
        action: commands::cart::CartAction,
    },
    /// Wishlist operations
    Wishlist {
        #[command(subcommand)]
        action: commands::wishlist::WishlistAction,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let _sentry_guard = init_sentry(&config);

    // Default to warn so command output stays readable; RUST_LOG overrides
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "verdant_cli=warn,verdant_client=warn".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let engine = Engine::bootstrap(&config).await;

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &engine).await;

    if let Err(e) = result {
        eprintln!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, engine: &Engine) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Login => commands::auth::login(engine).await?,
        Commands::Callback { code, state } => {
            commands::auth::callback(engine, &code, &state).await?;
        }
        Commands::Status => commands::auth::status(engine).await,
        Commands::Logout => commands::auth::logout(engine).await,
        Commands::Cart { action } => commands::cart::run(engine, action).await?,
        Commands::Wishlist { action } => commands::wishlist::run(engine, action).await?,
    }
    Ok(())
}
