use std::{io::Write, net::SocketAddr, path::PathBuf};

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use speedo_data_management::{DataManager, FuelSummary};
use speedo_lib::{fuel_entry::FuelEntry, trip_record::TripRecord, DEFAULT_MILEAGE_KMPL};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod calculator;
mod source;
mod tracker;

use source::{gpsd::GpsdSource, replay::ReplaySource, PositionSource};
use tracker::TripTracker;

#[derive(Parser)]
#[command(name = "Speedo")]
#[command(about = "Speedometer, trip log and fuel ledger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track a trip live, showing the gauge until Ctrl-C
    Track {
        /// Mileage to assume, in km per liter
        #[arg(long, default_value_t = DEFAULT_MILEAGE_KMPL)]
        mileage: f64,
        /// gpsd endpoint to read positions from
        #[arg(long, default_value = "127.0.0.1:2947")]
        gpsd: SocketAddr,
        /// Replay a recorded JSONL ride instead of reading gpsd
        #[arg(long)]
        replay: Option<PathBuf>,
    },
    /// Record a fuel purchase
    Fuel {
        amount: f64,
        price_per_liter: f64,
    },
    /// Show fuel entries and finished trips, newest first
    History,
    /// Show the fuel balance and estimated range
    Status {
        /// Mileage to assume, in km per liter
        #[arg(long, default_value_t = DEFAULT_MILEAGE_KMPL)]
        mileage: f64,
    },
    /// Fuel arithmetic without touching the ledger
    #[command(subcommand)]
    Calc(CalcCommands),
}

#[derive(Subcommand)]
enum CalcCommands {
    /// Liters a given amount of money buys
    Liters { price_per_liter: f64, amount: f64 },
    /// Cost of filling a given number of liters
    Cost { price_per_liter: f64, liters: f64 },
    /// Fuel needed to cover a distance
    Fuel { mileage: f64, distance_km: f64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Track { mileage, gpsd, replay } => track(mileage, gpsd, replay).await,
        Commands::Fuel { amount, price_per_liter } => add_fuel(amount, price_per_liter).await,
        Commands::History => history().await,
        Commands::Status { mileage } => status(mileage).await,
        Commands::Calc(command) => {
            run_calc(command);
            Ok(())
        }
    }
}

async fn track(mileage: f64, gpsd: SocketAddr, replay: Option<PathBuf>) -> anyhow::Result<()> {
    let data_manager = DataManager::start().await?;
    let summary = data_manager.fuel_summary().await?;
    let mut tracker = TripTracker::new(data_manager, mileage);

    let source: Box<dyn PositionSource> = match replay {
        Some(path) => Box::new(ReplaySource::new(path)),
        None => Box::new(GpsdSource::new(gpsd)),
    };

    tracker.start(source.as_ref()).await?;
    tracing::info!("Trip started");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = tracker.next_event() => match event {
                Some(event) => {
                    tracker.handle_event(event);
                    render_gauge(&tracker, &summary, mileage);
                }
                None => {
                    tracing::info!("Position stream ended");
                    break;
                }
            }
        }
    }

    println!();
    match tracker.stop().await? {
        Some(record) => println!(
            "Trip saved: {:.2} km, ~{:.2} L used",
            record.distance_km, record.fuel_consumed_l
        ),
        None => println!("Trip too short to record"),
    }

    Ok(())
}

/// One carriage-returned gauge line. Fuel left and range floor at zero
/// here only; the underlying balance is allowed to go negative.
fn render_gauge(tracker: &TripTracker, summary: &FuelSummary, mileage: f64) {
    let fuel_remaining = summary.fuel_remaining_l() - tracker.fuel_consumed_l();
    let range = fuel_remaining * mileage;
    let marker = if tracker.last_error().is_some() { "[no fix] " } else { "" };

    print!(
        "\r{:5.1} km/h | {:6.2} km | range {:4.0} km | fuel {:4.1} L {}",
        tracker.speed_kmh(),
        tracker.distance_km(),
        display_floor(range),
        display_floor(fuel_remaining),
        marker,
    );
    let _ = std::io::stdout().flush();
}

fn display_floor(value: f64) -> f64 {
    value.max(0.0)
}

fn fuel_input_valid(amount: f64, price_per_liter: f64) -> bool {
    amount > 0.0 && price_per_liter > 0.0
}

async fn add_fuel(amount: f64, price_per_liter: f64) -> anyhow::Result<()> {
    // Rejected locally, before the ledger is touched.
    if !fuel_input_valid(amount, price_per_liter) {
        anyhow::bail!("amount and price per liter must be positive numbers");
    }

    let data_manager = DataManager::start().await?;
    let entry = data_manager.add_fuel_entry(amount, price_per_liter, Utc::now()).await?;
    println!(
        "Added {:.2} L ({:.2} at {:.2}/L)",
        entry.liters, entry.amount, entry.price_per_liter
    );

    Ok(())
}

enum HistoryItem {
    Fuel(FuelEntry),
    Trip(TripRecord),
}

impl HistoryItem {
    fn timestamp(&self) -> DateTime<Utc> {
        match self {
            HistoryItem::Fuel(entry) => entry.timestamp,
            HistoryItem::Trip(record) => record.timestamp,
        }
    }
}

async fn history() -> anyhow::Result<()> {
    let data_manager = DataManager::start().await?;

    let mut items: Vec<HistoryItem> = data_manager.get_fuel_entries().await?
        .into_iter()
        .map(HistoryItem::Fuel)
        .chain(data_manager.get_trip_records().await?.into_iter().map(HistoryItem::Trip))
        .collect();
    items.sort_by_key(|item| std::cmp::Reverse(item.timestamp()));

    if items.is_empty() {
        println!("No history yet");
        return Ok(());
    }

    for item in items {
        let when = item.timestamp().format("%Y-%m-%d %H:%M");
        match item {
            HistoryItem::Fuel(entry) => println!(
                "{when}  fuel  {:6.2} L   ({:.2} at {:.2}/L)",
                entry.liters, entry.amount, entry.price_per_liter
            ),
            HistoryItem::Trip(record) => println!(
                "{when}  trip  {:6.2} km  ~{:.2} L used",
                record.distance_km, record.fuel_consumed_l
            ),
        }
    }

    Ok(())
}

async fn status(mileage: f64) -> anyhow::Result<()> {
    let data_manager = DataManager::start().await?;
    let summary = data_manager.fuel_summary().await?;

    println!("Filled:    {:6.2} L", summary.total_filled_l);
    println!("Consumed:  {:6.2} L", summary.total_consumed_l);
    println!("Remaining: {:6.2} L", display_floor(summary.fuel_remaining_l()));
    println!("Range:     {:6.0} km (at {:.1} km/L)", display_floor(summary.estimated_range_km(mileage)), mileage);
    if summary.fuel_remaining_l() < 0.0 {
        println!("Note: logged trips consumed {:.2} L more than was ever filled", -summary.fuel_remaining_l());
    }

    Ok(())
}

fn run_calc(command: CalcCommands) {
    match command {
        CalcCommands::Liters { price_per_liter, amount } => {
            println!("{:.2} L", calculator::liters_for_amount(price_per_liter, amount));
        }
        CalcCommands::Cost { price_per_liter, liters } => {
            println!("{:.2}", calculator::cost_for_liters(price_per_liter, liters));
        }
        CalcCommands::Fuel { mileage, distance_km } => {
            println!("{:.2} L", calculator::fuel_for_distance(mileage, distance_km));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_floors_negative_values_only() {
        assert_eq!(display_floor(-3.2), 0.0);
        assert_eq!(display_floor(7.5), 7.5);
    }

    #[test]
    fn fuel_input_requires_positive_numbers() {
        assert!(fuel_input_valid(500.0, 100.0));
        assert!(!fuel_input_valid(0.0, 100.0));
        assert!(!fuel_input_valid(500.0, -1.0));
        assert!(!fuel_input_valid(f64::NAN, 100.0));
    }
}
