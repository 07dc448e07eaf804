//! CLI definition using clap

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use triplog_domain::RouteSegment;
use triplog_types::OutputFormat;

#[derive(Parser)]
#[command(name = "triplog")]
#[command(author = "yuuji")]
#[command(version)]
#[command(about = "Record freight trips and browse vehicle and party totals")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Store directory. Uses config value if not specified.
    #[arg(long, global = true)]
    pub store_dir: Option<PathBuf>,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a trip
    Record {
        /// Driver name
        #[arg(long, short = 'd')]
        driver: String,

        /// Vehicle number (e.g., "MH12AB1234")
        #[arg(long = "vehicle", short = 'n')]
        vehicle_no: String,

        /// Route as "FROM->TO". Repeat for multi-stop trips; the first one counts toward totals.
        #[arg(long = "route", short = 'r', value_parser = parse_route)]
        routes: Vec<RouteSegment>,

        /// Trip date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List vehicles, most recent trip first
    Vehicles {
        #[arg(long, short = 'l')]
        limit: Option<usize>,
    },

    /// List parties, most recent trip first
    Parties {
        #[arg(long, short = 'l')]
        limit: Option<usize>,
    },

    /// List trips of a vehicle or a party
    Trips {
        /// Vehicle number
        #[arg(long, conflicts_with = "party", required_unless_present = "party")]
        vehicle: Option<String>,

        /// Party name
        #[arg(long)]
        party: Option<String>,
    },

    /// Show a single trip
    Trip {
        /// Trip key
        key: String,
    },

    /// Suggest party names starting with a prefix
    Suggest {
        /// Text typed so far
        text: String,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set store directory
        #[arg(long)]
        set_store_dir: Option<PathBuf>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Set suggestion debounce in milliseconds
        #[arg(long)]
        set_debounce: Option<u64>,

        /// Set maximum number of suggestions
        #[arg(long)]
        set_suggestion_limit: Option<usize>,

        /// Set retries after a conflicting commit
        #[arg(long)]
        set_conflict_retries: Option<u32>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}

/// Parse "FROM->TO". Blank ends are left for trip validation to report.
fn parse_route(s: &str) -> Result<RouteSegment, String> {
    let (from, to) = s
        .split_once("->")
        .ok_or_else(|| format!("route '{}' must look like FROM->TO", s))?;
    Ok(RouteSegment::new(from.trim(), to.trim()))
}
