//! Prints the results of console actions. Holds no state of its own: everything shown comes from
//! the [`Outcome`] of the action that just ran.

use console_app::{
    auth::Session,
    coordinator::{DeletedCar, Snapshot},
    reconcile::Reconciliation,
    Error,
};
use shared::data::{Car, Registration};

pub enum Outcome {
    LoggedIn(Session),
    Registered(String),
    Cars(Vec<Car>),
    /// A car was changed. `listing` is the refresh that followed, which may have failed.
    CarsChanged {
        message: String,
        listing: Result<Vec<Car>, Error>,
    },
    CarSearch {
        query: String,
        cars: Vec<Car>,
    },
    Registrations(Vec<Registration>),
    RegistrationsChanged {
        message: String,
        listing: Result<Vec<Registration>, Error>,
    },
    RegistrationSearch {
        query: String,
        registrations: Vec<Registration>,
    },
    RegistrationLookup {
        plate: String,
        registration: Option<Registration>,
    },
    CarLookup {
        plate: String,
        car: Option<Car>,
    },
    CarDeleted {
        deleted: DeletedCar,
        snapshot: Result<Snapshot, Error>,
    },
    Status(Reconciliation),
}

pub fn render(outcome: &Outcome) {
    match outcome {
        Outcome::LoggedIn(session) => {
            println!("Logged in. Use this token for the following commands:");
            println!("export VEHIKULAR_TOKEN={}", session.token());
        }
        Outcome::Registered(email) => println!("Account {email} created. You can log in now."),
        Outcome::Cars(cars) => print_cars(cars, "No cars available."),
        Outcome::CarsChanged { message, listing } => {
            println!("{message}");
            match listing {
                Ok(cars) => print_cars(cars, "No cars available."),
                Err(error) => report_stale(error),
            }
        }
        Outcome::CarSearch { query, cars } => {
            print_cars(cars, &format!("No cars found for '{query}'."));
        }
        Outcome::Registrations(registrations) => {
            print_registrations(registrations, "No registrations available.");
        }
        Outcome::RegistrationsChanged { message, listing } => {
            println!("{message}");
            match listing {
                Ok(registrations) => {
                    print_registrations(registrations, "No registrations available.");
                }
                Err(error) => report_stale(error),
            }
        }
        Outcome::RegistrationSearch {
            query,
            registrations,
        } => print_registrations(
            registrations,
            &format!("No registrations found for '{query}'."),
        ),
        Outcome::RegistrationLookup {
            plate,
            registration: Some(registration),
        } => {
            println!("Registration found for {plate}:");
            print_registration(registration);
        }
        Outcome::RegistrationLookup {
            plate,
            registration: None,
        } => {
            println!("No registration found for {plate}. Add one with:");
            println!(
                "  registrations add --plate {plate} --owner-name <NAME> --owner-address <ADDRESS> --year <YEAR>"
            );
        }
        Outcome::CarLookup {
            plate,
            car: Some(car),
        } => {
            println!("Car found for {plate}:");
            print_car(car);
        }
        Outcome::CarLookup { plate, car: None } => {
            println!("No car with the plate {plate} was found.");
        }
        Outcome::CarDeleted { deleted, snapshot } => {
            match &deleted.registration {
                Some(_) => println!(
                    "Deleted car {} and its registration.",
                    deleted.license_plate
                ),
                None => println!(
                    "Deleted car {}. It had no registration.",
                    deleted.license_plate
                ),
            }
            match snapshot {
                Ok(snapshot) => {
                    println!();
                    print_cars(&snapshot.cars, "No cars available.");
                    println!();
                    print_registrations(&snapshot.registrations, "No registrations available.");
                }
                Err(error) => report_stale(error),
            }
        }
        Outcome::Status(report) => print_status(report),
    }
}

fn report_stale(error: &Error) {
    eprintln!("The change was applied, but the listing could not be refreshed: {error}");
    explain(error);
}

fn print_cars(cars: &[Car], empty: &str) {
    if cars.is_empty() {
        println!("{empty}");
    }
    for car in cars {
        print_car(car);
    }
}

fn print_car(car: &Car) {
    println!("{:<10} {} {}", car.license_plate, car.make, car.model);
}

fn print_registrations(registrations: &[Registration], empty: &str) {
    if registrations.is_empty() {
        println!("{empty}");
    }
    for registration in registrations {
        print_registration(registration);
    }
}

fn print_registration(registration: &Registration) {
    println!(
        "{:<10} {} ({}), {}",
        registration.license_plate,
        registration.owner_name,
        registration.year_of_manufacture,
        registration.owner_address
    );
}

fn print_status(report: &Reconciliation) {
    println!("{} car(s) with a registration.", report.paired.len());

    if !report.unregistered_cars.is_empty() {
        println!("\nCars without a registration:");
        for car in &report.unregistered_cars {
            print_car(car);
        }
    }
    if !report.orphan_registrations.is_empty() {
        println!("\nRegistrations without a car:");
        for registration in &report.orphan_registrations {
            print_registration(registration);
        }
    }
    if !report.duplicate_plates.is_empty() {
        println!(
            "\nPlates used more than once: {}",
            report.duplicate_plates.join(", ")
        );
    }
    if report.is_consistent() {
        println!("Every car has exactly one registration.");
    }
}

/// Prints what the user can do about a failure, on top of the error message itself.
pub fn explain(error: &Error) {
    for hint in hints(error) {
        eprintln!("  {hint}");
    }
}

fn hints(error: &Error) -> Vec<String> {
    match error {
        Error::Validation(errors) => errors
            .iter()
            .map(|field_error| {
                format!(
                    "{}: '{}' is invalid. Expected {}.",
                    field_error.field,
                    field_error.value,
                    field_error.field.rule()
                )
            })
            .collect(),
        error if error.requires_login() => {
            vec!["Log in with `login` and pass the token with --token or VEHIKULAR_TOKEN.".into()]
        }
        Error::AmbiguousLookup { plate, .. } => {
            vec![format!(
                "Several records share the plate {plate}. Fix them on the server first."
            )]
        }
        Error::CarDeletionFailed {
            plate,
            registration_deleted: true,
            source,
            ..
        } if source.is_not_found() => {
            vec![format!(
                "The registration of {plate} was deleted. The car was already gone."
            )]
        }
        Error::CarDeletionFailed {
            plate,
            registration_deleted: true,
            source,
            ..
        } => {
            let mut lines = vec![format!(
                "The registration of {plate} was already deleted but the car still exists."
            )];
            lines.extend(hints(source));
            lines
        }
        Error::CarDeletionFailed { source, .. } => hints(source),
        _ => Vec::new(),
    }
}
