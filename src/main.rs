// ABOUTME: CLI entry point for fleet-records
// ABOUTME: Parses commands and routes them to the aircraft and user repositories

use anyhow::Context;
use clap::{Parser, Subcommand};
use fleet_records::config::load_config_from_file;
use fleet_records::repository::{AircraftRepository, NewUser, UserRepository, UserUpdate};
use fleet_records::validation::AircraftInput;
use fleet_records::DataError;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "fleet-records")]
#[command(about = "Manage airline fleet and user records in PostgreSQL", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = "config.toml")]
    config: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aircraft records
    Aircraft {
        #[command(subcommand)]
        action: AircraftCommand,
    },
    /// User accounts and roles
    Users {
        #[command(subcommand)]
        action: UserCommand,
    },
    /// Check a user id and password
    Login {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        password: String,
    },
}

#[derive(clap::Args)]
struct AircraftFields {
    #[arg(long)]
    id: String,
    #[arg(long)]
    icao: String,
    #[arg(long)]
    registration: String,
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    manufacturer: String,
    #[arg(long, default_value = "")]
    model: String,
}

impl From<AircraftFields> for AircraftInput {
    fn from(fields: AircraftFields) -> Self {
        AircraftInput {
            aircraft_id: fields.id,
            icao_code: fields.icao,
            registration: fields.registration,
            name: fields.name,
            manufacturer: fields.manufacturer,
            model: fields.model,
        }
    }
}

#[derive(Subcommand)]
enum AircraftCommand {
    /// List every aircraft
    List,
    /// Show one aircraft
    Get { id: i64 },
    /// Add an aircraft
    Add(AircraftFields),
    /// Replace an aircraft's fields
    Update(AircraftFields),
    /// Delete an aircraft
    Delete { id: i64 },
    /// Aircraft count per manufacturer
    Summary,
    /// Search by attribute, e.g. `search manufacturer LIKE boe`
    Search {
        attribute: String,
        operator: String,
        value: String,
    },
}

#[derive(Subcommand)]
enum UserCommand {
    /// List every user
    List,
    /// List user roles
    Roles,
    /// Show one user
    Get { user_id: String },
    /// Users joined with their roles
    Consolidated,
    /// User count per role
    Stats,
    /// Search by attribute, e.g. `search lastname = smith`
    Search {
        attribute: String,
        operator: String,
        value: String,
    },
    /// Add a user
    Add {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        role: i64,
        #[arg(long)]
        password: String,
    },
    /// Change selected fields of a user
    Update {
        user_id: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        role: Option<i64>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Delete a user
    Delete { user_id: String },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to render result as JSON")?
    );
    Ok(())
}

/// Print every validation message rather than only the first
fn report(err: DataError) -> anyhow::Error {
    if let Some(violations) = err.violations() {
        for violation in violations {
            eprintln!("  - {}", violation);
        }
    }
    anyhow::Error::new(err)
}

async fn run_aircraft(repo: AircraftRepository, action: AircraftCommand) -> anyhow::Result<()> {
    match action {
        AircraftCommand::List => {
            let aircraft = repo.list().await.map_err(report)?;
            if aircraft.is_empty() {
                println!("No aircraft found");
            }
            print_json(&aircraft)
        }
        AircraftCommand::Get { id } => match repo.get_by_id(id).await.map_err(report)? {
            Some(aircraft) => print_json(&aircraft),
            None => {
                println!("Aircraft with ID {} not found", id);
                Ok(())
            }
        },
        AircraftCommand::Add(fields) => {
            let input = AircraftInput::from(fields);
            repo.add(&input).await.map_err(report)?;
            println!("Aircraft {} added", input.aircraft_id);
            Ok(())
        }
        AircraftCommand::Update(fields) => {
            let input = AircraftInput::from(fields);
            let updated = repo.update(&input).await.map_err(report)?;
            if updated == 0 {
                println!("Aircraft with ID {} not found", input.aircraft_id);
            } else {
                println!("Aircraft {} updated", input.aircraft_id);
            }
            Ok(())
        }
        AircraftCommand::Delete { id } => {
            repo.delete(id).await.map_err(report)?;
            println!("Aircraft {} deleted", id);
            Ok(())
        }
        AircraftCommand::Summary => {
            print_json(&repo.summary_by_manufacturer().await.map_err(report)?)
        }
        AircraftCommand::Search {
            attribute,
            operator,
            value,
        } => print_json(
            &repo
                .search(&attribute, &operator, &value)
                .await
                .map_err(report)?,
        ),
    }
}

async fn run_users(repo: UserRepository, action: UserCommand) -> anyhow::Result<()> {
    match action {
        UserCommand::List => print_json(&repo.list().await.map_err(report)?),
        UserCommand::Roles => print_json(&repo.list_roles().await.map_err(report)?),
        UserCommand::Get { user_id } => match repo.get_by_id(&user_id).await.map_err(report)? {
            Some(user) => print_json(&user),
            None => {
                println!("User {} not found", user_id);
                Ok(())
            }
        },
        UserCommand::Consolidated => print_json(&repo.list_consolidated().await.map_err(report)?),
        UserCommand::Stats => print_json(&repo.count_by_role().await.map_err(report)?),
        UserCommand::Search {
            attribute,
            operator,
            value,
        } => print_json(
            &repo
                .search(&attribute, &operator, &value)
                .await
                .map_err(report)?,
        ),
        UserCommand::Add {
            user_id,
            first_name,
            last_name,
            role,
            password,
        } => {
            let user = NewUser {
                user_id,
                first_name,
                last_name,
                user_role_id: role,
                password,
            };
            repo.add(&user).await.map_err(report)?;
            println!("User {} added", user.user_id);
            Ok(())
        }
        UserCommand::Update {
            user_id,
            first_name,
            last_name,
            role,
            password,
        } => {
            let update = UserUpdate {
                first_name,
                last_name,
                user_role_id: role,
                password,
            };
            let updated = repo.update(&user_id, &update).await.map_err(report)?;
            println!("{} user record(s) updated", updated);
            Ok(())
        }
        UserCommand::Delete { user_id } => {
            repo.delete(&user_id).await.map_err(report)?;
            println!("User {} deleted", user_id);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - default to INFO level if RUST_LOG not set
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config_from_file(&cli.config)?;

    match cli.command {
        Commands::Aircraft { action } => {
            run_aircraft(AircraftRepository::new(config.database), action).await
        }
        Commands::Users { action } => {
            run_users(UserRepository::new(config.database), action).await
        }
        Commands::Login { user_id, password } => {
            let repo = UserRepository::new(config.database);
            let user = repo.login(&user_id, &password).await.map_err(report)?;
            print_json(&user)
        }
    }
}
