use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod calculator;
mod config;
mod db;
mod models;
mod pages;
mod report;
mod server;
mod share;
mod store;

use config::Config;
use models::{AttendanceRecord, Target};
use store::{FileStore, RecordStore};

#[derive(Parser)]
#[command(name = "attendance-tracker")]
#[command(about = "Track class attendance against a target percentage", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web form and share-link pages
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create or upgrade the Postgres schema (requires DATABASE_URL)
    InitDb,
    /// Print the attendance report for a record
    Calc {
        #[arg(long, allow_negative_numbers = true)]
        total: i64,
        #[arg(long, allow_negative_numbers = true)]
        attended: i64,
        #[arg(long)]
        target: Option<i64>,
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a share token, or a full link when a base URL is known
    Share {
        #[arg(long, allow_negative_numbers = true)]
        total: i64,
        #[arg(long, allow_negative_numbers = true)]
        attended: i64,
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Print the report a share token resolves to
    Check { token: String },
    /// Forget the saved record
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    init_logging();

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            match config.database_url.clone() {
                Some(url) => {
                    let store = db::PgStore::connect(&url).await?;
                    server::serve(config, store).await?;
                }
                None => {
                    let store = FileStore::new(&config.data_file);
                    server::serve(config, store).await?;
                }
            }
        }
        Commands::InitDb => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set to a Postgres instance")?;
            let store = db::PgStore::connect(url).await?;
            db::init_db(store.pool()).await?;
            println!("Schema ready.");
        }
        Commands::Calc {
            total,
            attended,
            target,
            json,
        } => {
            let record = AttendanceRecord::new(total, attended)?;
            let target = match target {
                Some(percent) => Target::new(percent)?,
                None => config.target,
            };
            match calculator::calculate(&record, target) {
                Some(report) if json => println!("{}", serde_json::to_string_pretty(&report)?),
                Some(report) => print!("{}", report::build_report(&report)),
                None => println!("No classes recorded yet."),
            }
        }
        Commands::Share {
            total,
            attended,
            base_url,
        } => {
            let record = AttendanceRecord::new(total, attended)?;
            let token = share::encode(&record);
            match base_url.or(config.base_url) {
                Some(base) => println!("{}", share::share_url(&base, &token)),
                None => println!("{token}"),
            }
        }
        Commands::Check { token } => {
            let (total, attended) = share::decode(&token);
            let report = if total == 0 {
                None
            } else {
                let record = AttendanceRecord::new(i64::from(total), i64::from(attended))?;
                calculator::calculate(&record, config.target)
            };
            match report {
                Some(report) => print!("{}", report::build_report(&report)),
                None => println!("Invalid link."),
            }
        }
        Commands::Clear => {
            match config.database_url.as_deref() {
                Some(url) => clear_saved(&db::PgStore::connect(url).await?).await?,
                None => clear_saved(&FileStore::new(&config.data_file)).await?,
            }
            println!("Saved record cleared.");
        }
    }

    Ok(())
}

async fn clear_saved<S: RecordStore>(store: &S) -> anyhow::Result<()> {
    store.clear().await.context("failed to clear saved record")
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new("attendance_tracker=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
