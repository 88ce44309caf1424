// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! cardkeep - password hashing and protected card storage toolkit.
//!
//! This is the binary entry point.

mod doctor;
mod prompt;

use std::process::ExitCode;

use cardkeep_config::CardkeepConfig;
use cardkeep_crypto::{HashParams, PasswordHasher, verify_password};
use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;
use tracing::debug;

/// cardkeep - password hashing and protected card storage toolkit.
#[derive(Parser, Debug)]
#[command(name = "cardkeep", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Hash a password with the configured Argon2id parameters.
    Hash,
    /// Check a password against an encoded hash. Exits 0 on match, 1 otherwise.
    Verify {
        /// The `$argon2id$v=19$...` string to check against.
        encoded_hash: String,
    },
    /// Validate and print the effective configuration.
    Config,
    /// Run an in-memory self check of every layer.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cardkeep_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            cardkeep_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.logging.level);
    debug!(command = ?cli.command, "starting");

    match cli.command {
        Commands::Hash => run_hash(&config).await,
        Commands::Verify { encoded_hash } => run_verify(&encoded_hash).await,
        Commands::Config => run_config(&config),
        Commands::Doctor { plain } => {
            if doctor::run_doctor(&config, plain).await {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run_hash(config: &CardkeepConfig) -> ExitCode {
    let password = match prompt::read_password("Password") {
        Ok(password) => password,
        Err(e) => return report(e),
    };
    let hasher = match PasswordHasher::new(HashParams::from(&config.hashing)) {
        Ok(hasher) => hasher,
        Err(e) => return report(e),
    };

    let hashed = tokio::task::spawn_blocking(move || hasher.hash(password.expose_secret())).await;
    match hashed {
        Ok(Ok(encoded)) => {
            println!("{encoded}");
            ExitCode::SUCCESS
        }
        Ok(Err(e)) => report(e),
        Err(e) => {
            eprintln!("error: hashing task failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run_verify(encoded_hash: &str) -> ExitCode {
    let password = match prompt::read_password("Password") {
        Ok(password) => password,
        Err(e) => return report(e),
    };

    let encoded = encoded_hash.to_string();
    let matched =
        tokio::task::spawn_blocking(move || verify_password(password.expose_secret(), &encoded))
            .await
            .unwrap_or(false);

    if matched {
        println!("match");
        ExitCode::SUCCESS
    } else {
        println!("no match");
        ExitCode::FAILURE
    }
}

fn run_config(config: &CardkeepConfig) -> ExitCode {
    match config.to_toml_string() {
        Ok(toml) => {
            print!("{toml}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to serialize configuration: {e}");
            ExitCode::FAILURE
        }
    }
}

fn report(error: cardkeep_core::CardkeepError) -> ExitCode {
    eprintln!("error: {error}");
    ExitCode::FAILURE
}

/// Initialize the tracing subscriber with an env filter.
///
/// `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cardkeep={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
