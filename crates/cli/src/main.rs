//! Order intake CLI - operator tools for the order intake service.
//!
//! # Usage
//!
//! ```bash
//! # Which carrier/service would an order get?
//! oi-cli shipping domestic --speed fastest --fulfillment automated
//!
//! # Check a coupon code against a table file
//! oi-cli coupon check welcome10 --table config/coupons.example.json
//!
//! # Validate a coupon table before deploying it
//! oi-cli coupon lint config/coupons.example.json
//!
//! # Print the embed snippet for a form
//! oi-cli embed 241234567890
//! ```
//!
//! Results go to stdout as JSON (or HTML for `embed`); logs go to stderr.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "oi-cli")]
#[command(author, version, about = "Order intake CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the carrier and service for an order
    Shipping {
        /// Shipping category (`domestic`, `international`, `military`)
        category: String,

        /// Requested speed (`fastest`, `fast`, `standard`)
        #[arg(short, long, default_value = "standard")]
        speed: String,

        /// Fulfillment type (`automated`, `manual`)
        #[arg(short, long, default_value = "manual")]
        fulfillment: String,
    },
    /// Work with coupon tables
    Coupon {
        #[command(subcommand)]
        action: CouponAction,
    },
    /// Print the embed snippet for a form widget
    Embed {
        /// Form id
        form_id: String,

        /// Script URL prefix
        #[arg(long, default_value = order_intake_core::embed::DEFAULT_SCRIPT_BASE)]
        script_base: String,

        /// Container element id
        #[arg(long, default_value = "order-form")]
        container: String,
    },
}

#[derive(Subcommand)]
enum CouponAction {
    /// Validate a code against a coupon table
    Check {
        /// Coupon code as a customer would type it
        code: String,

        /// Coupon table JSON file
        #[arg(short, long)]
        table: PathBuf,

        /// Evaluate as of this instant (RFC 3339, default: now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Load a coupon table and report problems
    Lint {
        /// Coupon table JSON file
        table: PathBuf,
    },
}

fn main() {
    // Logs on stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "order_intake_cli=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => emit(&output),
        Err(e) => {
            tracing::error!("Command failed: {e}");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<String, commands::CliError> {
    match cli.command {
        Commands::Shipping {
            category,
            speed,
            fulfillment,
        } => commands::shipping::resolve(&category, &speed, &fulfillment),
        Commands::Coupon { action } => match action {
            CouponAction::Check { code, table, at } => {
                commands::coupon::check(&code, &table, at.unwrap_or_else(Utc::now))
            }
            CouponAction::Lint { table } => commands::coupon::lint(&table),
        },
        Commands::Embed {
            form_id,
            script_base,
            container,
        } => commands::embed::snippet(&form_id, &script_base, &container),
    }
}

#[allow(clippy::print_stdout)]
fn emit(output: &str) {
    println!("{output}");
}
