use serde::{Deserialize, Serialize};

/// Anything that is keyed by a licence plate.
///
/// Cars and registrations share the plate as their natural key, which is how a record in one
/// collection finds its counterpart in the other.
pub trait Record {
    fn license_plate(&self) -> &str;
}

/// A vehicle in the car collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    pub make: String,
    pub model: String,
    /// Unique across the car collection. Can not be changed after creation.
    pub license_plate: String,
}

/// The parts of a [`Car`] that may be changed after creation. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl CarUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.make.is_none() && self.model.is_none()
    }
}

/// An ownership registration in the registration collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Unique across the registration collection. Can not be changed after creation.
    pub license_plate: String,
    pub owner_name: String,
    pub owner_address: String,
    pub year_of_manufacture: i32,
}

/// The parts of a [`Registration`] that may be changed after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_of_manufacture: Option<i32>,
}

impl RegistrationUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owner_name.is_none() && self.owner_address.is_none() && self.year_of_manufacture.is_none()
    }
}

impl Record for Car {
    fn license_plate(&self) -> &str {
        &self.license_plate
    }
}

impl Record for Registration {
    fn license_plate(&self) -> &str {
        &self.license_plate
    }
}
