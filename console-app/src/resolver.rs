//! Finds the record in the other collection that shares a plate.

use log::debug;
use shared::data::{Car, Registration};

use crate::{
    api::{Api, CollectionClient, Resource},
    error::Error,
};

/// The outcome of looking up a counterpart.
///
/// [`Counterpart::NotFound`] is a definite answer: the counterpart does not exist and may be
/// created. [`Counterpart::LookupFailed`] means the answer is unknown, so nothing should be
/// offered on the back of it.
#[derive(Debug)]
pub enum Counterpart<R> {
    Found(R),
    NotFound,
    LookupFailed(Error),
}

impl<R> Counterpart<R> {
    /// Whether it is known for certain that no counterpart exists, so creating one is safe to offer.
    #[must_use]
    pub fn can_create(&self) -> bool {
        matches!(self, Counterpart::NotFound)
    }

    /// Turns the lookup into a plain result, keeping `NotFound` as `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns the failure if the lookup failed.
    pub fn into_result(self) -> Result<Option<R>, Error> {
        match self {
            Counterpart::Found(record) => Ok(Some(record)),
            Counterpart::NotFound => Ok(None),
            Counterpart::LookupFailed(error) => Err(error),
        }
    }
}

/// Searches `collection` for the one record whose plate is exactly `license_plate`.
///
/// Search matches substrings, so the search result is always filtered for exact equality. More
/// than one exact match is reported as [`Error::AmbiguousLookup`] instead of picking one.
pub async fn resolve<R: Resource>(
    collection: &CollectionClient<R>,
    license_plate: &str,
) -> Counterpart<R> {
    let candidates = match collection.search(license_plate).await {
        Ok(candidates) => candidates,
        Err(error) => return Counterpart::LookupFailed(error),
    };

    let mut matches: Vec<R> = candidates
        .into_iter()
        .filter(|record| record.license_plate() == license_plate)
        .collect();

    debug!(
        "Resolving {} {license_plate}: {} exact match(es)",
        R::NAME,
        matches.len()
    );

    match matches.len() {
        0 => Counterpart::NotFound,
        1 => matches.pop().map_or(Counterpart::NotFound, Counterpart::Found),
        count => Counterpart::LookupFailed(Error::AmbiguousLookup {
            plate: license_plate.into(),
            matches: count,
        }),
    }
}

/// Looks up counterparts in both directions.
#[derive(Debug, Clone)]
pub struct Resolver {
    cars: CollectionClient<Car>,
    registrations: CollectionClient<Registration>,
}

impl Resolver {
    #[must_use]
    pub fn new(api: &Api) -> Self {
        Self {
            cars: api.cars(),
            registrations: api.registrations(),
        }
    }

    /// Finds the registration of the car with the given plate.
    pub async fn registration_for_car(&self, license_plate: &str) -> Counterpart<Registration> {
        resolve(&self.registrations, license_plate).await
    }

    /// Finds the car a registration belongs to.
    pub async fn car_for_registration(&self, license_plate: &str) -> Counterpart<Car> {
        resolve(&self.cars, license_plate).await
    }

    /// # Errors
    ///
    /// Returns an error if it could not be determined whether the registration exists.
    pub async fn registration_exists(&self, license_plate: &str) -> Result<bool, Error> {
        Ok(self
            .registration_for_car(license_plate)
            .await
            .into_result()?
            .is_some())
    }

    /// # Errors
    ///
    /// Returns an error if it could not be determined whether the car exists.
    pub async fn car_exists(&self, license_plate: &str) -> Result<bool, Error> {
        Ok(self
            .car_for_registration(license_plate)
            .await
            .into_result()?
            .is_some())
    }
}
