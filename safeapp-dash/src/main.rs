//! safeapp-dash - SafeApp dashboard command line
//!
//! Drives the dashboard core against the configured webhook host: overview,
//! tasks, calendar, stock edits and field records.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use safeapp_common::config::{DashConfig, LoggingConfig};
use safeapp_dash::capture::PhotoFile;
use safeapp_dash::models::RowId;
use safeapp_dash::panels::{CalendarPanel, Overview, TasksPanel};
use safeapp_dash::{RecordStore, StockBoard, WebhookClient};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for safeapp-dash
#[derive(Parser, Debug)]
#[command(name = "safeapp-dash")]
#[command(about = "SafeApp back-office dashboard")]
#[command(version)]
struct Args {
    /// Configuration file (overrides SAFEAPP_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open tasks, upcoming events and low stock at a glance
    Overview,
    #[command(subcommand)]
    Tasks(TasksCommand),
    /// Calendar events
    Calendar,
    #[command(subcommand)]
    Stock(StockCommand),
    #[command(subcommand)]
    Fiches(FichesCommand),
}

/// Task list
#[derive(Subcommand, Debug)]
enum TasksCommand {
    List,
    Add { title: String },
    /// Flip a task between done and open
    Toggle { id: String },
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
}

/// Inventory
#[derive(Subcommand, Debug)]
enum StockCommand {
    List,
    /// Set the remaining quantity of a row
    Set { row: String, quantity: u32 },
}

/// Field records
#[derive(Subcommand, Debug)]
enum FichesCommand {
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Create {
        #[arg(long)]
        marque: String,
        #[arg(long)]
        modele: String,
        #[arg(long, default_value = "")]
        cotes: String,
        #[arg(long, default_value = "")]
        notes: String,
        /// Photo file to attach, repeatable
        #[arg(long = "photo")]
        photos: Vec<PathBuf>,
    },
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
    /// Email a record to the configured recipient
    Notify { id: String },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (config, report) = DashConfig::load_with_report(args.config.as_deref())
        .context("Failed to load configuration")?;
    init_tracing(&config.logging)?;
    report.log();

    info!("Starting safeapp-dash v{}", env!("CARGO_PKG_VERSION"));
    info!(base_url = %config.base_url, "Webhook host");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build runtime")?;

    runtime.block_on(run(args.command, config))
}

/// `RUST_LOG` wins over the configured level; a configured file replaces stderr
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Arc::new(file)),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

async fn run(command: Command, config: DashConfig) -> Result<()> {
    let recipient = config.notification_recipient.clone();
    let client = Arc::new(WebhookClient::new(config).context("Failed to create webhook client")?);

    match command {
        Command::Overview => {
            let overview = Overview::load(&*client, &*client, &*client).await;

            println!("Open tasks");
            for task in &overview.open_tasks {
                println!("  [{}] {}", task.id, task.title);
            }
            println!("Upcoming events");
            for event in &overview.upcoming_events {
                println!("  {}  {}", event.start_label(), event.summary);
            }
            println!("Low stock");
            for row in &overview.low_stock {
                println!(
                    "  {} ({}): {} / min {}",
                    row.label(),
                    row.reference,
                    row.quantity_remaining,
                    row.min_quantity
                );
            }
            for (section, error) in &overview.errors {
                eprintln!("{} unavailable: {}", section, error);
            }
        }

        Command::Tasks(cmd) => {
            let mut panel = TasksPanel::new(client.clone());
            panel.load().await.context("Failed to load tasks")?;

            match cmd {
                TasksCommand::List => {}
                TasksCommand::Add { title } => {
                    if !panel.add(&title).await.context("Failed to create task")? {
                        bail!("Task title is empty");
                    }
                }
                TasksCommand::Toggle { id } => {
                    let task = panel
                        .find(&id)
                        .cloned()
                        .with_context(|| format!("No task with id {}", id))?;
                    panel.toggle(&task).await.context("Failed to update task")?;
                }
                TasksCommand::Delete { id, yes } => {
                    let task = panel
                        .find(&id)
                        .cloned()
                        .with_context(|| format!("No task with id {}", id))?;
                    if !panel.delete(&task, yes).await.context("Failed to delete task")? {
                        bail!("Refusing to delete task {} without --yes", id);
                    }
                }
            }

            for task in panel.tasks() {
                let mark = if task.is_completed() { "x" } else { " " };
                println!("[{}] {}  {}", mark, task.id, task.title);
            }
        }

        Command::Calendar => {
            let mut panel = CalendarPanel::new(client.clone());
            panel.load().await.context("Failed to load calendar")?;
            for event in panel.events() {
                let location = event.location.as_deref().unwrap_or("");
                println!("{}  {}  {}", event.start_label(), event.summary, location);
            }
        }

        Command::Stock(cmd) => {
            let mut board = StockBoard::new(client.clone());
            board.reload().await.context("Failed to load stock")?;

            if let StockCommand::Set { row, quantity } = cmd {
                let row_id = RowId(row);
                board.begin(&row_id)?;
                let current = board
                    .editing()
                    .map(|e| e.buffer())
                    .unwrap_or_default();
                board.adjust(i64::from(quantity) - i64::from(current))?;
                board
                    .commit()
                    .await
                    .with_context(|| format!("Failed to update stock row {}", row_id))?;
            }

            for row in board.rows() {
                let flag = if row.is_low_stock() { "!" } else { " " };
                println!(
                    "{} {:>4}  {:<12} {:<30} {:>4} / min {}",
                    flag,
                    row.row_id,
                    row.reference,
                    row.label(),
                    row.quantity_remaining,
                    row.min_quantity
                );
            }
        }

        Command::Fiches(cmd) => {
            let mut store = RecordStore::new(client.clone(), recipient);
            store.load().await.context("Failed to load field records")?;

            match cmd {
                FichesCommand::List { search } => {
                    let term = search.unwrap_or_default();
                    for record in store.search(&term) {
                        println!(
                            "{}  {} {}  ({} photos)  {}",
                            record.id,
                            record.marque,
                            record.modele,
                            record.photos.len(),
                            record.updated_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
                FichesCommand::Create {
                    marque,
                    modele,
                    cotes,
                    notes,
                    photos,
                } => {
                    let files = read_photos(&photos).await?;
                    let session = store.open_new();
                    session.marque = marque;
                    session.modele = modele;
                    session.cotes = cotes;
                    session.notes = notes;
                    let added = session.add_photos(files).await;
                    let pending = session.photos().iter().filter(|p| p.is_pending()).count();
                    info!(added, pending, "Photos attached");

                    let record = store.save().await.context("Failed to save field record")?;
                    println!("Saved {} ({} photos)", record.id, record.photos.len());
                }
                FichesCommand::Delete { id, yes } => {
                    if !store.delete(&id, yes).await.context("Failed to delete field record")? {
                        bail!("Refusing to delete field record {} without --yes", id);
                    }
                    println!("Deleted {}", id);
                }
                FichesCommand::Notify { id } => {
                    let record = store
                        .get(&id)
                        .cloned()
                        .with_context(|| format!("No field record with id {}", id))?;
                    store.notify(&record).await.context("Failed to send notification")?;
                    println!("Sent {}", id);
                }
            }
        }
    }

    Ok(())
}

async fn read_photos(paths: &[PathBuf]) -> Result<Vec<PhotoFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read photo {}", path.display()))?;
        files.push(PhotoFile::new(file_name(path), bytes));
    }
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photo".to_string())
}
