use clap::{Args, Parser, Subcommand};
use color_eyre::Result;
use log::LevelFilter;
use simplelog::{ColorChoice, TermLogger, TerminalMode};

use console_app::{
    api::Api,
    auth::{Authenticator, NewUser},
    config::{Config, DEFAULT_SERVER},
    coordinator::Coordinator,
    Error,
};
use shared::forms::{CarChanges, CarDraft, RegistrationChanges, RegistrationDraft};
use view::Outcome;

mod view;

/// Manage cars and their registrations.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Address of the server hosting the collections.
    #[arg(long, env = "VEHIKULAR_SERVER", default_value = DEFAULT_SERVER)]
    server: String,
    /// Bearer token obtained with `login`.
    #[arg(long, env = "VEHIKULAR_TOKEN", hide_env_values = true)]
    token: Option<String>,
    /// Log every request and state change.
    #[arg(long)]
    debug: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and print a token.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create a new account.
    Register(RegisterArgs),
    #[command(subcommand)]
    Cars(CarCommand),
    #[command(subcommand)]
    Registrations(RegistrationCommand),
    /// Look up the registration of a car.
    FindRegistration { plate: String },
    /// Look up the car a registration belongs to.
    FindCar { plate: String },
    /// Show unregistered cars and orphan registrations.
    Status,
}

#[derive(Debug, Args)]
struct RegisterArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    confirm_password: String,
}

#[derive(Debug, Subcommand)]
enum CarCommand {
    List,
    Search {
        query: String,
    },
    Add {
        #[arg(long)]
        make: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        plate: String,
    },
    Update {
        plate: String,
        #[arg(long)]
        make: Option<String>,
        #[arg(long)]
        model: Option<String>,
    },
    /// Delete a car and its registration.
    Delete {
        plate: String,
    },
}

#[derive(Debug, Subcommand)]
enum RegistrationCommand {
    List,
    Search {
        query: String,
    },
    Add {
        #[arg(long)]
        plate: String,
        #[arg(long)]
        owner_name: String,
        #[arg(long)]
        owner_address: String,
        #[arg(long)]
        year: String,
    },
    Update {
        plate: String,
        #[arg(long)]
        owner_name: Option<String>,
        #[arg(long)]
        owner_address: Option<String>,
        #[arg(long)]
        year: Option<String>,
    },
    /// Delete a registration. The car is kept.
    Delete {
        plate: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let level = if cli.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let config = Config::new(&cli.server, cli.token)?;
    match run(cli.command, &config).await {
        Ok(outcome) => {
            view::render(&outcome);
            Ok(())
        }
        Err(err) => {
            view::explain(&err);
            Err(err.into())
        }
    }
}

async fn run(command: Command, config: &Config) -> Result<Outcome, Error> {
    let outcome = match command {
        Command::Login { email, password } => {
            let session = Authenticator::new(config)?
                .login(&email, &password)
                .await?;
            Outcome::LoggedIn(session)
        }
        Command::Register(args) => {
            let user = NewUser {
                first_name: args.first_name,
                last_name: args.last_name,
                email: args.email,
                password: args.password,
                confirm_password: args.confirm_password,
            };
            Authenticator::new(config)?.register(&user).await?;
            Outcome::Registered(user.email)
        }
        Command::Cars(command) => run_cars(command, &coordinator(config)?).await?,
        Command::Registrations(command) => {
            run_registrations(command, &coordinator(config)?).await?
        }
        Command::FindRegistration { plate } => {
            let registration = coordinator(config)?
                .resolver()
                .registration_for_car(&plate)
                .await
                .into_result()?;
            Outcome::RegistrationLookup {
                plate,
                registration,
            }
        }
        Command::FindCar { plate } => {
            let car = coordinator(config)?
                .resolver()
                .car_for_registration(&plate)
                .await
                .into_result()?;
            Outcome::CarLookup { plate, car }
        }
        Command::Status => Outcome::Status(coordinator(config)?.status().await?),
    };
    Ok(outcome)
}

fn coordinator(config: &Config) -> Result<Coordinator, Error> {
    Ok(Coordinator::new(&Api::new(config)?))
}

async fn run_cars(command: CarCommand, coordinator: &Coordinator) -> Result<Outcome, Error> {
    let outcome = match command {
        CarCommand::List => Outcome::Cars(coordinator.cars().list().await?),
        CarCommand::Search { query } => {
            let cars = coordinator.cars().search(&query).await?;
            Outcome::CarSearch { query, cars }
        }
        CarCommand::Add { make, model, plate } => {
            let draft = CarDraft {
                make,
                model,
                license_plate: plate,
            };
            let applied = coordinator.add_car(&draft).await?;
            Outcome::CarsChanged {
                message: format!("Added car {}.", draft.license_plate),
                listing: applied.listing,
            }
        }
        CarCommand::Update { plate, make, model } => {
            let changes = CarChanges { make, model };
            let applied = coordinator.update_car(&plate, &changes).await?;
            Outcome::CarsChanged {
                message: format!("Updated car {plate}."),
                listing: applied.listing,
            }
        }
        CarCommand::Delete { plate } => {
            let deleted = coordinator.delete_car(&plate).await?;
            let snapshot = coordinator.snapshot().await;
            Outcome::CarDeleted { deleted, snapshot }
        }
    };
    Ok(outcome)
}

async fn run_registrations(
    command: RegistrationCommand,
    coordinator: &Coordinator,
) -> Result<Outcome, Error> {
    let outcome = match command {
        RegistrationCommand::List => {
            Outcome::Registrations(coordinator.registrations().list().await?)
        }
        RegistrationCommand::Search { query } => {
            let registrations = coordinator.registrations().search(&query).await?;
            Outcome::RegistrationSearch {
                query,
                registrations,
            }
        }
        RegistrationCommand::Add {
            plate,
            owner_name,
            owner_address,
            year,
        } => {
            let draft = RegistrationDraft {
                license_plate: plate,
                owner_name,
                owner_address,
                year_of_manufacture: year,
            };
            let applied = coordinator.add_registration(&draft).await?;
            Outcome::RegistrationsChanged {
                message: format!("Added registration {}.", draft.license_plate),
                listing: applied.listing,
            }
        }
        RegistrationCommand::Update {
            plate,
            owner_name,
            owner_address,
            year,
        } => {
            let changes = RegistrationChanges {
                owner_name,
                owner_address,
                year_of_manufacture: year,
            };
            let applied = coordinator.update_registration(&plate, &changes).await?;
            Outcome::RegistrationsChanged {
                message: format!("Updated registration {plate}."),
                listing: applied.listing,
            }
        }
        RegistrationCommand::Delete { plate } => {
            let applied = coordinator.delete_registration(&plate).await?;
            Outcome::RegistrationsChanged {
                message: format!("Deleted registration {plate}. The car was kept."),
                listing: applied.listing,
            }
        }
    };
    Ok(outcome)
}
