use std::collections::HashMap;

use shared::data::{Car, Record, Registration};

/// How the two collections line up, plate by plate.
///
/// Unregistered cars and orphan registrations are ordinary states and are reported as such.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub paired: Vec<(Car, Registration)>,
    pub unregistered_cars: Vec<Car>,
    pub orphan_registrations: Vec<Registration>,
    /// Plates that occur more than once in either collection. Their records are left unpaired.
    pub duplicate_plates: Vec<String>,
}

impl Reconciliation {
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.unregistered_cars.is_empty()
            && self.orphan_registrations.is_empty()
            && self.duplicate_plates.is_empty()
    }
}

fn count_plates<R: Record>(records: &[R]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for record in records {
        *counts.entry(record.license_plate()).or_insert(0) += 1;
    }
    counts
}

/// Joins a car listing with a registration listing on exact plate equality.
///
/// Cars keep the order of the car listing, orphans the order of the registration listing.
#[must_use]
pub fn reconcile(cars: Vec<Car>, registrations: Vec<Registration>) -> Reconciliation {
    let mut duplicate_plates: Vec<String> = {
        let car_counts = count_plates(&cars);
        let registration_counts = count_plates(&registrations);
        car_counts
            .iter()
            .chain(registration_counts.iter())
            .filter(|(_, count)| **count > 1)
            .map(|(plate, _)| (*plate).to_string())
            .collect()
    };
    duplicate_plates.sort();
    duplicate_plates.dedup();

    let is_duplicate = |plate: &str| duplicate_plates.iter().any(|duplicate| duplicate == plate);

    let mut registrations_by_plate: HashMap<String, Registration> = registrations
        .iter()
        .filter(|registration| !is_duplicate(registration.license_plate()))
        .map(|registration| (registration.license_plate.clone(), registration.clone()))
        .collect();

    let mut paired = Vec::new();
    let mut unregistered_cars = Vec::new();
    for car in cars {
        if is_duplicate(car.license_plate()) {
            continue;
        }
        match registrations_by_plate.remove(car.license_plate()) {
            Some(registration) => paired.push((car, registration)),
            None => unregistered_cars.push(car),
        }
    }

    let orphan_registrations = registrations
        .into_iter()
        .filter(|registration| registrations_by_plate.contains_key(registration.license_plate()))
        .collect();

    Reconciliation {
        paired,
        unregistered_cars,
        orphan_registrations,
        duplicate_plates,
    }
}
