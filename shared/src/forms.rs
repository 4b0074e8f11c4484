//! Raw, unvalidated user input and its conversion into typed records.
//!
//! Every field of a draft is checked, so one failed conversion reports all bad fields at once
//! instead of stopping at the first.

use crate::{
    data::{Car, CarUpdate, Registration, RegistrationUpdate},
    validation::{current_year, parse_year, Field, FieldError, ValidationErrors},
};

/// Input for creating a new car.
#[derive(Debug, Clone, Default)]
pub struct CarDraft {
    pub make: String,
    pub model: String,
    pub license_plate: String,
}

/// Input for changing an existing car. `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct CarChanges {
    pub make: Option<String>,
    pub model: Option<String>,
}

/// Input for creating a new registration. The year is kept as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct RegistrationDraft {
    pub license_plate: String,
    pub owner_name: String,
    pub owner_address: String,
    pub year_of_manufacture: String,
}

/// Input for changing an existing registration. `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct RegistrationChanges {
    pub owner_name: Option<String>,
    pub owner_address: Option<String>,
    pub year_of_manufacture: Option<String>,
}

#[derive(Default)]
struct Checker {
    errors: ValidationErrors,
}

impl Checker {
    fn check(&mut self, field: Field, raw: &str) {
        if let Err(error) = field.validate(raw) {
            self.errors.push(error);
        }
    }

    fn check_optional(&mut self, field: Field, raw: Option<&String>) {
        if let Some(raw) = raw {
            self.check(field, raw);
        }
    }

    fn year(&mut self, raw: &str) -> Option<i32> {
        let year = parse_year(raw, current_year());
        if year.is_none() {
            self.errors
                .push(FieldError::new(Field::YearOfManufacture, raw));
        }
        year
    }

    fn finish<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self.errors)
        }
    }
}

impl CarDraft {
    /// Validates every field and builds the [`Car`] to send.
    ///
    /// # Errors
    ///
    /// Returns every field that violates its rule.
    pub fn validate(&self) -> Result<Car, ValidationErrors> {
        let mut checker = Checker::default();
        checker.check(Field::Make, &self.make);
        checker.check(Field::Model, &self.model);
        checker.check(Field::LicensePlate, &self.license_plate);

        checker.finish(Car {
            make: self.make.clone(),
            model: self.model.clone(),
            license_plate: self.license_plate.clone(),
        })
    }
}

impl CarChanges {
    /// Validates the fields that are set.
    ///
    /// # Errors
    ///
    /// Returns every set field that violates its rule.
    pub fn validate(&self) -> Result<CarUpdate, ValidationErrors> {
        let mut checker = Checker::default();
        checker.check_optional(Field::Make, self.make.as_ref());
        checker.check_optional(Field::Model, self.model.as_ref());

        checker.finish(CarUpdate {
            make: self.make.clone(),
            model: self.model.clone(),
        })
    }
}

impl RegistrationDraft {
    /// Validates every field and builds the [`Registration`] to send.
    ///
    /// # Errors
    ///
    /// Returns every field that violates its rule.
    pub fn validate(&self) -> Result<Registration, ValidationErrors> {
        let mut checker = Checker::default();
        checker.check(Field::LicensePlate, &self.license_plate);
        checker.check(Field::OwnerName, &self.owner_name);
        checker.check(Field::OwnerAddress, &self.owner_address);
        let year = checker.year(&self.year_of_manufacture);

        let registration = Registration {
            license_plate: self.license_plate.clone(),
            owner_name: self.owner_name.clone(),
            owner_address: self.owner_address.clone(),
            year_of_manufacture: year.unwrap_or_default(),
        };
        checker.finish(registration)
    }
}

impl RegistrationChanges {
    /// Validates the fields that are set.
    ///
    /// # Errors
    ///
    /// Returns every set field that violates its rule.
    pub fn validate(&self) -> Result<RegistrationUpdate, ValidationErrors> {
        let mut checker = Checker::default();
        checker.check_optional(Field::OwnerName, self.owner_name.as_ref());
        checker.check_optional(Field::OwnerAddress, self.owner_address.as_ref());
        let year = self
            .year_of_manufacture
            .as_deref()
            .and_then(|raw| checker.year(raw));

        checker.finish(RegistrationUpdate {
            owner_name: self.owner_name.clone(),
            owner_address: self.owner_address.clone(),
            year_of_manufacture: year,
        })
    }
}
