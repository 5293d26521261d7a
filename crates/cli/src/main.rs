//! Hangout CLI - RSVPs and carpools for events.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use hangout_core::{Attendance, CarpoolMode, DriverId, Event, EventId, RsvpStatus, Time};
use hangout_storage::JsonStorage;
use hangout_carpool::{
    AssignmentEngine, CarpoolConfig, DriverRequest, EventService, ManualCarpool, NewEvent,
    RsvpRequest, RsvpService,
};

#[derive(Parser)]
#[command(name = "hangout")]
#[command(about = "Event RSVPs and carpool assignment", long_about = None)]
struct Cli {
    /// Directory holding the record store
    #[arg(long, global = true, default_value = ".hangout")]
    data_dir: PathBuf,

    /// Seats assumed for drivers who did not state an offer
    #[arg(long, global = true, default_value = "4")]
    default_seats: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage events
    Event {
        #[command(subcommand)]
        command: EventCommands,
    },
    /// Submit or update an RSVP
    Rsvp {
        /// Event ID
        event: EventId,
        /// Display name
        #[arg(long)]
        name: String,
        /// Contact (email)
        #[arg(long)]
        contact: String,
        /// confirmed, declined or tentative
        #[arg(long, default_value = "confirmed")]
        status: RsvpStatus,
        /// Willing to drive
        #[arg(long)]
        drive: bool,
        /// Seats offered, including the driver's
        #[arg(long)]
        seats: Option<u32>,
        /// Arrival or departure time (RFC 3339 or YYYY-MM-DDTHH:MM, UTC)
        #[arg(long, value_parser = parse_time)]
        arrival: Option<Time>,
        /// Note to the organizer
        #[arg(long)]
        message: Option<String>,
    },
    /// List RSVPs of an event
    Rsvps {
        /// Event ID
        event: EventId,
    },
    /// Show the cars of an event
    Drivers {
        /// Event ID
        event: EventId,
    },
    /// Manage manual-mode cars
    Driver {
        #[command(subcommand)]
        command: DriverCommands,
    },
    /// Join a car (manual mode)
    Join {
        /// Driver ID
        driver: DriverId,
        /// Contact of the rider
        contact: String,
    },
    /// Leave a car (manual mode)
    Leave {
        /// Driver ID
        driver: DriverId,
        /// Contact of the rider
        contact: String,
    },
    /// Rebuild carpools of an auto-mode event
    Recompute {
        /// Event ID
        event: EventId,
    },
}

#[derive(Subcommand)]
enum EventCommands {
    /// Create an event
    Create {
        /// Title
        #[arg(long)]
        title: String,
        /// Start time (RFC 3339 or YYYY-MM-DDTHH:MM, UTC)
        #[arg(long, value_parser = parse_time)]
        starts_at: Time,
        /// Location
        #[arg(long)]
        location: String,
        /// Description
        #[arg(long)]
        description: Option<String>,
        /// off, manual or auto
        #[arg(long, default_value = "off")]
        mode: CarpoolMode,
    },
    /// List events
    List,
    /// Show an event with its RSVPs and cars
    Show {
        /// Event ID
        id: EventId,
    },
    /// Change the carpool mode
    Mode {
        /// Event ID
        id: EventId,
        /// off, manual or auto
        mode: CarpoolMode,
    },
}

#[derive(Subcommand)]
enum DriverCommands {
    /// Offer a car
    Add {
        /// Event ID
        event: EventId,
        /// Driver name
        #[arg(long)]
        name: String,
        /// Driver contact
        #[arg(long)]
        contact: String,
        /// Departure time (RFC 3339 or YYYY-MM-DDTHH:MM, UTC)
        #[arg(long, value_parser = parse_time)]
        departure: Time,
        /// Seats including the driver's
        #[arg(long, default_value = "4")]
        capacity: u32,
        /// Vehicle description
        #[arg(long)]
        vehicle: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Open storage
    let storage = JsonStorage::new(&cli.data_dir).await?;
    debug!("Using store at {}", storage.root().display());

    let config = CarpoolConfig::default().with_default_seats(cli.default_seats);
    let engine = Arc::new(AssignmentEngine::new(Arc::new(storage)).with_config(config));
    let events = EventService::new(engine.clone());
    let rsvps = RsvpService::new(engine.clone());
    let manual = ManualCarpool::new(engine.clone());

    match cli.command {
        Commands::Event { command } => match command {
            EventCommands::Create { title, starts_at, location, description, mode } => {
                let event = events
                    .create(NewEvent { title, description, starts_at, location, carpool_mode: mode })
                    .await?;
                println!("Created event: {} - {}", event.id, event.title);
            }
            EventCommands::List => {
                let all = events.list().await?;
                println!("Events ({})", all.len());
                for event in all {
                    print_event_line(&event);
                }
            }
            EventCommands::Show { id } => {
                let event = events.get(id).await?;
                println!("Event: {}", event.id);
                println!("  Title: {}", event.title);
                if let Some(description) = &event.description {
                    println!("  Description: {}", description);
                }
                println!("  Starts: {}", event.starts_at);
                println!("  Location: {}", event.location);
                println!("  Carpool mode: {}", event.carpool_mode);

                let attendance = rsvps.list(id).await?;
                println!("  RSVPs ({})", attendance.len());
                for a in &attendance {
                    print_rsvp_line(a);
                }
                print_roster(&manual, id).await?;
            }
            EventCommands::Mode { id, mode } => {
                let event = events.set_mode(id, mode).await?;
                println!("Event {} carpool mode: {}", event.id, event.carpool_mode);
            }
        },
        Commands::Rsvp { event, name, contact, status, drive, seats, arrival, message } => {
            let attendance = rsvps
                .submit(RsvpRequest {
                    event_id: event,
                    name,
                    contact,
                    status,
                    message,
                    will_drive: drive,
                    arrival,
                    seats,
                })
                .await?;
            println!("Recorded RSVP: {}", attendance.id);
            print_rsvp_line(&attendance);
        }
        Commands::Rsvps { event } => {
            let attendance = rsvps.list(event).await?;
            println!("RSVPs ({})", attendance.len());
            for a in &attendance {
                print_rsvp_line(a);
            }
        }
        Commands::Drivers { event } => {
            print_roster(&manual, event).await?;
        }
        Commands::Driver { command } => match command {
            DriverCommands::Add { event, name, contact, departure, capacity, vehicle } => {
                let driver = manual
                    .create_driver(DriverRequest { event_id: event, name, contact, departure, capacity, vehicle })
                    .await?;
                println!("Added driver: {} - {} ({} seats)", driver.id, driver.name, driver.capacity);
            }
        },
        Commands::Join { driver, contact } => {
            manual.join(driver, &contact).await?;
            println!("{} joined car {}", contact, driver);
        }
        Commands::Leave { driver, contact } => {
            manual.leave(driver, &contact).await?;
            println!("{} left car {}", contact, driver);
        }
        Commands::Recompute { event } => {
            let assignment = events.recompute(event).await?;
            println!(
                "Recomputed: {} drivers, {} passengers without a car",
                assignment.drivers.len(),
                assignment.unassigned.len()
            );
            print_roster(&manual, event).await?;
        }
    }

    Ok(())
}

async fn print_roster(manual: &ManualCarpool<JsonStorage>, event: EventId) -> Result<()> {
    let roster = manual.roster(event).await?;
    println!("Cars ({})", roster.len());
    for car in roster {
        println!(
            "  {} | {} | departs {} | {}/{} free | {}",
            car.driver.id,
            car.driver.name,
            car.driver.departure.format("%Y-%m-%d %H:%M"),
            car.spots_available,
            car.driver.capacity,
            car.driver.vehicle.as_deref().unwrap_or("-"),
        );
        for p in car.passengers {
            println!("      {} <{}>", p.name, p.contact);
        }
    }
    Ok(())
}

fn print_event_line(event: &Event) {
    println!(
        "  {} | {} | {} | {} - {}",
        event.id,
        event.starts_at.format("%Y-%m-%d %H:%M"),
        event.carpool_mode,
        event.title,
        event.location,
    );
}

fn print_rsvp_line(a: &Attendance) {
    println!(
        "  {} | {} | {} <{}> | {} | {}",
        a.id,
        format_status(a.status),
        a.name,
        a.contact,
        a.arrival.map(|t| t.format("%H:%M").to_string()).unwrap_or_else(|| "--:--".to_string()),
        match (a.will_drive, a.driver_id) {
            (true, Some(d)) => format!("drives {}", d),
            (false, Some(d)) => format!("rides {}", d),
            (_, None) => "no car".to_string(),
        },
    );
}

fn format_status(status: RsvpStatus) -> &'static str {
    match status {
        RsvpStatus::Confirmed => "YES",
        RsvpStatus::Declined => "NO",
        RsvpStatus::Tentative => "MAYBE",
    }
}

fn parse_time(s: &str) -> std::result::Result<Time, String> {
    if let Ok(t) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&chrono::Utc));
    }
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(format!("invalid time '{}': use RFC 3339 or YYYY-MM-DDTHH:MM", s))
}
