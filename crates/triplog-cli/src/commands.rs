//! Command handlers

use std::time::Duration;

use chrono::Local;
use tokio::sync::watch;
use tracing::debug;
use triplog_app::app::query_service;
use triplog_app::config::Config;
use triplog_app::repository::{open_file_repository, FileRepository};
use triplog_app::{FieldKey, NameSuggester, TripRecorder};
use triplog_domain::{RouteSegment, TripDraft};
use triplog_types::{OutputFormat, Result};

use crate::cli::{Cli, Commands};
use crate::output::{
    output_parties, output_recorded, output_suggestions, output_trip, output_trips,
    output_vehicles,
};

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;

    // Override from CLI args
    if let Some(ref dir) = cli.store_dir {
        config.store_dir = Some(dir.clone());
    }
    let output_format = cli.format.unwrap_or(config.output_format);

    match cli.command {
        Commands::Record {
            driver,
            vehicle_no,
            routes,
            date,
        } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            cmd_record(&config, output_format, date, driver, vehicle_no, routes).await
        }

        Commands::Vehicles { limit } => {
            let repo = open_repo(&config)?;
            let vehicles = query_service::get_vehicles(&repo, limit).await?;
            output_vehicles(output_format, &vehicles)
        }

        Commands::Parties { limit } => {
            let repo = open_repo(&config)?;
            let parties = query_service::get_parties(&repo, limit).await?;
            output_parties(output_format, &parties)
        }

        Commands::Trips { vehicle, party } => {
            let repo = open_repo(&config)?;
            let trips = match (vehicle, party) {
                (Some(vehicle), _) => query_service::get_trips_for_vehicle(&repo, &vehicle).await?,
                (None, Some(party)) => query_service::get_trips_for_party(&repo, &party).await?,
                (None, None) => Vec::new(),
            };
            output_trips(output_format, &trips)
        }

        Commands::Trip { key } => {
            let repo = open_repo(&config)?;
            let trip = query_service::get_trip(&repo, &key).await?;
            output_trip(output_format, &trip)
        }

        Commands::Suggest { text } => cmd_suggest(&config, output_format, &text).await,

        Commands::Config {
            show,
            set_store_dir,
            set_output,
            set_debounce,
            set_suggestion_limit,
            set_conflict_retries,
            reset,
        } => cmd_config(
            show,
            set_store_dir,
            set_output,
            set_debounce,
            set_suggestion_limit,
            set_conflict_retries,
            reset,
        ),
    }
}

fn open_repo(config: &Config) -> Result<FileRepository> {
    let repo = open_file_repository(config)?;
    debug!(dir = %repo.store().store_dir().display(), "store opened");
    Ok(repo)
}

async fn cmd_record(
    config: &Config,
    output_format: OutputFormat,
    date: chrono::NaiveDate,
    driver: String,
    vehicle_no: String,
    routes: Vec<RouteSegment>,
) -> Result<()> {
    let draft = TripDraft {
        date,
        driver,
        vehicle_no,
        routes,
    };

    let recorder = TripRecorder::new(open_repo(config)?).with_conflict_retries(config.conflict_retries);
    let recorded = recorder.record(&draft).await?;
    output_recorded(output_format, &recorded)
}

async fn cmd_suggest(config: &Config, output_format: OutputFormat, text: &str) -> Result<()> {
    let suggester = NameSuggester::new(
        open_repo(config)?,
        config.suggestion_debounce(),
        config.suggestion_limit,
    );
    let field = FieldKey::from_end(1);
    let mut updates = suggester.subscribe(field);

    suggester.on_text_changed(field, text);
    if !text.trim().is_empty() {
        let wait = config.suggestion_debounce() + Duration::from_secs(5);
        wait_for_suggestions(&mut updates, wait).await;
    }

    output_suggestions(output_format, &suggester.suggestions(field))
}

/// Wait for the next suggestion list. False if none arrived within `wait`.
async fn wait_for_suggestions(updates: &mut watch::Receiver<Vec<String>>, wait: Duration) -> bool {
    match tokio::time::timeout(wait, updates.changed()).await {
        Ok(Ok(())) => true,
        Ok(Err(_)) => {
            debug!("suggestion channel closed before a lookup finished");
            false
        }
        Err(_) => {
            debug!(wait_ms = wait.as_millis() as u64, "no suggestions before timeout");
            false
        }
    }
}

fn cmd_config(
    show: bool,
    set_store_dir: Option<std::path::PathBuf>,
    set_output: Option<OutputFormat>,
    set_debounce: Option<u64>,
    set_suggestion_limit: Option<usize>,
    set_conflict_retries: Option<u32>,
    reset: bool,
) -> Result<()> {
    if reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        return Ok(());
    }

    let mut config = Config::load()?;
    let mut changed = false;

    if let Some(dir) = set_store_dir {
        config.store_dir = Some(dir);
        changed = true;
    }
    if let Some(format) = set_output {
        config.output_format = format;
        changed = true;
    }
    if let Some(ms) = set_debounce {
        config.suggestion_debounce_ms = ms;
        changed = true;
    }
    if let Some(limit) = set_suggestion_limit {
        config.suggestion_limit = limit.max(1);
        changed = true;
    }
    if let Some(retries) = set_conflict_retries {
        config.conflict_retries = retries;
        changed = true;
    }

    if changed {
        config.save()?;
        println!("Configuration saved");
    }

    if show || !changed {
        println!("{}", config);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_for_suggestions_sees_published_list() {
        let (tx, mut rx) = watch::channel(Vec::new());
        tx.send_replace(vec!["Acme Traders".to_string()]);
        assert!(wait_for_suggestions(&mut rx, Duration::from_millis(50)).await);
        assert_eq!(*rx.borrow(), vec!["Acme Traders".to_string()]);
    }

    #[tokio::test]
    async fn test_wait_for_suggestions_times_out_quietly() {
        let (_tx, mut rx) = watch::channel(Vec::<String>::new());
        assert!(!wait_for_suggestions(&mut rx, Duration::from_millis(20)).await);
    }

    #[tokio::test]
    async fn test_wait_for_suggestions_handles_closed_channel() {
        let (tx, mut rx) = watch::channel(Vec::<String>::new());
        drop(tx);
        assert!(!wait_for_suggestions(&mut rx, Duration::from_millis(20)).await);
    }
}
