//! Operations that keep the car and registration collections consistent with each other.
//!
//! The server does not cascade anything, so the ordering lives here. Every operation starts from
//! a fresh lookup and ends with a fresh listing; nothing fetched earlier is trusted for a decision.

use std::fmt::{self, Display};

use log::{debug, info, warn};
use shared::{
    data::{Car, Registration},
    forms::{CarChanges, CarDraft, RegistrationChanges, RegistrationDraft},
};

use crate::{
    api::{Api, CollectionClient, Resource},
    error::Error,
    reconcile::{reconcile, Reconciliation},
    resolver::{Counterpart, Resolver},
};

/// The step of a cascading car delete that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionStage {
    CheckingRegistration,
    DeletingRegistration,
    DeletingCar,
}

impl Display for DeletionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeletionStage::CheckingRegistration => "checking for a registration",
            DeletionStage::DeletingRegistration => "deleting the registration",
            DeletionStage::DeletingCar => "deleting the car",
        })
    }
}

/// Where a cascading car delete currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionState {
    Idle,
    CheckingRegistration,
    DeletingRegistration,
    DeletingCar,
    Done,
    Failed(DeletionStage),
}

/// The result of a completed cascading car delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedCar {
    pub license_plate: String,
    /// The registration that was removed along with the car, if there was one.
    pub registration: Option<Registration>,
    /// Every state the flow went through, starting at [`DeletionState::Idle`].
    pub history: Vec<DeletionState>,
}

/// Both collections as fetched right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub cars: Vec<Car>,
    pub registrations: Vec<Registration>,
}

/// A change the server has accepted, together with the listing fetched right after it.
///
/// The change stands even when the refresh failed. `listing` then holds the refresh error.
#[derive(Debug)]
pub struct Applied<R> {
    pub listing: Result<Vec<R>, Error>,
}

async fn refresh<R: Resource>(collection: &CollectionClient<R>) -> Applied<R> {
    let listing = collection.list().await;
    if let Err(error) = &listing {
        warn!(
            "The {} change was applied but the listing could not be refreshed: {error}",
            R::NAME
        );
    }
    Applied { listing }
}

/// Tracks one run of the delete-car-with-registration flow.
struct CarDeletion {
    license_plate: String,
    history: Vec<DeletionState>,
    registration_deleted: bool,
}

impl CarDeletion {
    fn new(license_plate: &str) -> Self {
        Self {
            license_plate: license_plate.into(),
            history: vec![DeletionState::Idle],
            registration_deleted: false,
        }
    }

    fn state(&self) -> DeletionState {
        self.history
            .last()
            .copied()
            .unwrap_or(DeletionState::Idle)
    }

    fn advance(&mut self, next: DeletionState) {
        debug!(
            "Deleting car {}: {:?} -> {next:?}",
            self.license_plate,
            self.state()
        );
        self.history.push(next);
    }

    /// Stops the flow. An expired session is passed through as is, anything else is wrapped
    /// together with how far the flow got and the states it went through.
    fn fail(mut self, stage: DeletionStage, error: Error) -> Error {
        self.advance(DeletionState::Failed(stage));
        match error {
            Error::AuthExpired => Error::AuthExpired,
            source => Error::CarDeletionFailed {
                plate: self.license_plate,
                stage,
                registration_deleted: self.registration_deleted,
                history: self.history,
                source: Box::new(source),
            },
        }
    }
}

/// Runs every user action against the two collections.
///
/// Each method is an independent flow. Two flows may run at the same time; the only state they
/// share is the server itself.
#[derive(Debug, Clone)]
pub struct Coordinator {
    cars: CollectionClient<Car>,
    registrations: CollectionClient<Registration>,
    resolver: Resolver,
}

impl Coordinator {
    #[must_use]
    pub fn new(api: &Api) -> Self {
        Self {
            cars: api.cars(),
            registrations: api.registrations(),
            resolver: Resolver::new(api),
        }
    }

    #[must_use]
    pub fn cars(&self) -> &CollectionClient<Car> {
        &self.cars
    }

    #[must_use]
    pub fn registrations(&self) -> &CollectionClient<Registration> {
        &self.registrations
    }

    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Validates and creates a car, then fetches the car listing again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without sending anything if a field is invalid, otherwise
    /// any error from creating. A failed refresh is reported in [`Applied::listing`].
    pub async fn add_car(&self, draft: &CarDraft) -> Result<Applied<Car>, Error> {
        let car = draft.validate()?;
        self.cars.create(&car).await?;
        info!("Added car {}", car.license_plate);
        Ok(refresh(&self.cars).await)
    }

    /// Validates and applies changes to a car, then fetches the car listing again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] or [`Error::NothingToUpdate`] without sending anything if
    /// the changes are unusable, otherwise any error from updating.
    pub async fn update_car(
        &self,
        license_plate: &str,
        changes: &CarChanges,
    ) -> Result<Applied<Car>, Error> {
        let update = changes.validate()?;
        if update.is_empty() {
            Err(Error::NothingToUpdate)?;
        }
        self.cars.update(license_plate, &update).await?;
        info!("Updated car {license_plate}");
        Ok(refresh(&self.cars).await)
    }

    /// Deletes a car together with its registration.
    ///
    /// The registration is looked up fresh and deleted first. If that fails the car is left
    /// untouched. If the car delete then fails, the error reports that the registration is
    /// already gone. Callers should refresh both collections afterwards, e.g. with
    /// [`Coordinator::snapshot`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthExpired`] unchanged whichever step hit it, otherwise
    /// [`Error::CarDeletionFailed`] naming the failed stage.
    pub async fn delete_car(&self, license_plate: &str) -> Result<DeletedCar, Error> {
        let mut flow = CarDeletion::new(license_plate);

        flow.advance(DeletionState::CheckingRegistration);
        let registration = match self.resolver.registration_for_car(license_plate).await {
            Counterpart::Found(registration) => Some(registration),
            Counterpart::NotFound => None,
            Counterpart::LookupFailed(error) => {
                return Err(flow.fail(DeletionStage::CheckingRegistration, error))
            }
        };

        if registration.is_some() {
            flow.advance(DeletionState::DeletingRegistration);
            if let Err(error) = self.registrations.delete(license_plate).await {
                return Err(flow.fail(DeletionStage::DeletingRegistration, error));
            }
            flow.registration_deleted = true;
        }

        flow.advance(DeletionState::DeletingCar);
        if let Err(error) = self.cars.delete(license_plate).await {
            return Err(flow.fail(DeletionStage::DeletingCar, error));
        }

        flow.advance(DeletionState::Done);
        info!(
            "Deleted car {license_plate}{}",
            if flow.registration_deleted {
                " and its registration"
            } else {
                ""
            }
        );

        Ok(DeletedCar {
            license_plate: flow.license_plate,
            registration,
            history: flow.history,
        })
    }

    /// Validates and creates a registration, then fetches the registration listing again.
    ///
    /// Whether a car with the plate exists is not checked: orphan registrations are allowed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without sending anything if a field is invalid, otherwise
    /// any error from creating.
    pub async fn add_registration(
        &self,
        draft: &RegistrationDraft,
    ) -> Result<Applied<Registration>, Error> {
        let registration = draft.validate()?;
        self.registrations.create(&registration).await?;
        info!("Added registration {}", registration.license_plate);
        Ok(refresh(&self.registrations).await)
    }

    /// Validates and applies changes to a registration, then fetches the listing again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] or [`Error::NothingToUpdate`] without sending anything if
    /// the changes are unusable, otherwise any error from updating.
    pub async fn update_registration(
        &self,
        license_plate: &str,
        changes: &RegistrationChanges,
    ) -> Result<Applied<Registration>, Error> {
        let update = changes.validate()?;
        if update.is_empty() {
            Err(Error::NothingToUpdate)?;
        }
        self.registrations.update(license_plate, &update).await?;
        info!("Updated registration {license_plate}");
        Ok(refresh(&self.registrations).await)
    }

    /// Deletes a single registration, leaving its car in place, then fetches the listing again.
    ///
    /// # Errors
    ///
    /// This function will return an error if the delete failed.
    pub async fn delete_registration(
        &self,
        license_plate: &str,
    ) -> Result<Applied<Registration>, Error> {
        self.registrations.delete(license_plate).await?;
        info!("Deleted registration {license_plate}");
        Ok(refresh(&self.registrations).await)
    }

    /// Fetches both collections.
    ///
    /// # Errors
    ///
    /// This function will return an error if either listing failed.
    pub async fn snapshot(&self) -> Result<Snapshot, Error> {
        Ok(Snapshot {
            cars: self.cars.list().await?,
            registrations: self.registrations.list().await?,
        })
    }

    /// Fetches both collections and reports how they line up.
    ///
    /// # Errors
    ///
    /// This function will return an error if either listing failed.
    pub async fn status(&self) -> Result<Reconciliation, Error> {
        let Snapshot {
            cars,
            registrations,
        } = self.snapshot().await?;
        Ok(reconcile(cars, registrations))
    }
}
