pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod processing;
pub mod progress;
pub mod render;
pub mod session;
pub mod stats;
pub mod types;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::{HttpMapService, SelectedFile};
use crate::config::{AppConfig, GeneratorConfig};
use crate::session::UploadSession;
use crate::types::{ActiveTab, SampleRow, ServiceStatus};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the synthetic regional health dataset
    Generate {
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Overrides generator.output
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Overrides generator.seed
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Check whether the map service is up
    Health {
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Upload a CSV file and show the generated map and analysis
    Upload {
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Tab to display once results are in
        #[arg(short, long, value_enum, default_value_t = ActiveTab::Map)]
        tab: ActiveTab,
        file: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { config, output, seed } => {
            let mut app_config = AppConfig::load_or_default(config.as_deref())?;
            if let Some(output) = output {
                app_config.generator.output = output;
            }
            if let Some(seed) = seed {
                app_config.generator.seed = seed;
            }

            let today = chrono::Local::now().date_naive();
            let rows = generate(&app_config.generator, today)?;

            println!("Generated {} rows of data", rows.len());
            println!("\nFirst few rows:");
            print!("{}", render::preview(&rows, app_config.generator.preview_rows));
            println!("\nSummary statistics:");
            print!("{}", render::summary(&stats::describe(&rows)));
        }
        Commands::Health { config } => {
            let app_config = AppConfig::load_or_default(config.as_deref())?;
            let mut session = UploadSession::new(HttpMapService::new(&app_config.client)?, app_config.client);
            session.mount().await;
            println!("{}", render::status_badge(session.status()));
            if session.status() != ServiceStatus::Ready {
                bail!("Map service is unavailable");
            }
        }
        Commands::Upload { config, tab, file } => {
            let app_config = AppConfig::load_or_default(config.as_deref())?;
            upload(app_config, &file, tab).await?;
        }
    }

    Ok(())
}

/// Generates the dataset and writes it to `config.output`.
fn generate(config: &GeneratorConfig, today: NaiveDate) -> Result<Vec<SampleRow>> {
    info!("Generating samples with seed {}", config.seed);
    let rows = processing::generate_samples(config, today)?;
    data::write_samples(&config.output, &rows)?;
    info!("Wrote {} rows to {:?}", rows.len(), config.output);
    Ok(rows)
}

async fn upload(app_config: AppConfig, path: &Path, tab: ActiveTab) -> Result<()> {
    let service = HttpMapService::new(&app_config.client)?;
    let mut session = UploadSession::new(service, app_config.client);

    info!("Checking map service...");
    session.mount().await;
    println!("{}", render::status_badge(session.status()));

    let picked = match SelectedFile::from_path(path) {
        Ok(file) => Some(file),
        Err(e) => {
            warn!("{:#}", e);
            None
        }
    };
    if let Err(e) = session.select_file(picked) {
        print!("{}", render::session_view(&session));
        bail!(e);
    }

    let mut progress = session.subscribe_progress();
    let printer = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let percent = *progress.borrow_and_update();
            eprint!("\rProcessing... {:>3}% Complete", percent);
        }
    });

    let result = session.submit().await;
    printer.abort();
    eprintln!();

    session.select_tab(tab);
    print!("{}", render::session_view(&session));

    result.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::COLUMNS;
    use csv::ReaderBuilder;

    #[test]
    fn generate_writes_sorted_file_with_documented_header() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            output: dir.path().join("health_data_sample.csv"),
            ..GeneratorConfig::default()
        };
        let today = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let rows = generate(&config, today).unwrap();

        let mut rdr = ReaderBuilder::new().from_path(&config.output).unwrap();
        let headers: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, COLUMNS);

        let keys: Vec<(String, String)> = rdr
            .records()
            .map(|r| {
                let r = r.unwrap();
                (r[0].to_string(), r[3].to_string())
            })
            .collect();
        assert_eq!(keys.len(), rows.len());
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn cli_parses_upload_with_tab() {
        let cli = Cli::try_parse_from(["healthmap", "upload", "--tab", "analysis", "data.csv"]).unwrap();
        match cli.command {
            Commands::Upload { tab, file, config } => {
                assert_eq!(tab, ActiveTab::Analysis);
                assert_eq!(file, PathBuf::from("data.csv"));
                assert!(config.is_none());
            }
            _ => panic!("expected upload"),
        }
    }
}
