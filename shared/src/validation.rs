//! Field rules shared by every place a car or registration is edited.
//!
//! Validation is pure: nothing here performs I/O or touches state. A failing value is always
//! reported together with the [`Field`] it belongs to so callers can mark exactly which inputs are
//! wrong.

use std::fmt::{self, Display};

use chrono::{Datelike, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

const MAKE_PATTERN: &str = r"^[A-Za-zА-Яа-яЁё \-]{1,50}$";
const MODEL_PATTERN: &str = r"^[A-Za-zА-Яа-яЁё0-9 \-]{1,50}$";
const LICENSE_PLATE_PATTERN: &str = r"^[A-Z][0-9]{3}[A-Z]{2}[0-9]{2,3}$";
const OWNER_NAME_PATTERN: &str = r"^[A-Za-zА-Яа-яЁё \-]{1,50}$";
const OWNER_ADDRESS_PATTERN: &str = r"^[A-Za-zА-Яа-яЁё0-9 .,\-/]{1,100}$";
const YEAR_PATTERN: &str = r"^[0-9]{4}$";

/// The earliest accepted year of manufacture.
pub const FIRST_YEAR: i32 = 1900;

static MAKE: Lazy<Regex> = Lazy::new(|| compile(MAKE_PATTERN));
static MODEL: Lazy<Regex> = Lazy::new(|| compile(MODEL_PATTERN));
static LICENSE_PLATE: Lazy<Regex> = Lazy::new(|| compile(LICENSE_PLATE_PATTERN));
static OWNER_NAME: Lazy<Regex> = Lazy::new(|| compile(OWNER_NAME_PATTERN));
static OWNER_ADDRESS: Lazy<Regex> = Lazy::new(|| compile(OWNER_ADDRESS_PATTERN));
static YEAR: Lazy<Regex> = Lazy::new(|| compile(YEAR_PATTERN));

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("Field patterns are constant and known to compile")
}

/// Every user editable field of a car or a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Make,
    Model,
    LicensePlate,
    OwnerName,
    OwnerAddress,
    YearOfManufacture,
}

impl Field {
    /// The name of the field as it appears on the wire.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Field::Make => "make",
            Field::Model => "model",
            Field::LicensePlate => "license_plate",
            Field::OwnerName => "owner_name",
            Field::OwnerAddress => "owner_address",
            Field::YearOfManufacture => "year_of_manufacture",
        }
    }

    /// The regular expression a raw value has to match.
    ///
    /// For [`Field::YearOfManufacture`] matching the pattern is not enough, the value also has to
    /// lie between [`FIRST_YEAR`] and the current year.
    #[must_use]
    pub fn pattern(self) -> &'static str {
        match self {
            Field::Make => MAKE_PATTERN,
            Field::Model => MODEL_PATTERN,
            Field::LicensePlate => LICENSE_PLATE_PATTERN,
            Field::OwnerName => OWNER_NAME_PATTERN,
            Field::OwnerAddress => OWNER_ADDRESS_PATTERN,
            Field::YearOfManufacture => YEAR_PATTERN,
        }
    }

    /// A human readable description of the rule.
    #[must_use]
    pub fn rule(self) -> &'static str {
        match self {
            Field::Make => "1 to 50 letters, spaces or hyphens",
            Field::Model => "1 to 50 letters, digits, spaces or hyphens",
            Field::LicensePlate => {
                "one capital letter, 3 digits, two capital letters and 2 or 3 digits (e.g. A123BC45)"
            }
            Field::OwnerName => "1 to 50 letters, spaces or hyphens",
            Field::OwnerAddress => "letters, digits, spaces and the characters . , - /",
            Field::YearOfManufacture => "a four digit year between 1900 and the current year",
        }
    }

    fn regex(self) -> &'static Regex {
        match self {
            Field::Make => &*MAKE,
            Field::Model => &*MODEL,
            Field::LicensePlate => &*LICENSE_PLATE,
            Field::OwnerName => &*OWNER_NAME,
            Field::OwnerAddress => &*OWNER_ADDRESS,
            Field::YearOfManufacture => &*YEAR,
        }
    }

    /// Tests a raw value against this field's rule.
    #[must_use]
    pub fn is_valid(self, raw: &str) -> bool {
        match self {
            Field::YearOfManufacture => parse_year(raw, current_year()).is_some(),
            field => field.regex().is_match(raw),
        }
    }

    /// Like [`Field::is_valid`] but returns the failure as a [`FieldError`].
    ///
    /// # Errors
    ///
    /// Returns an error naming this field if the value violates its rule.
    pub fn validate(self, raw: &str) -> Result<(), FieldError> {
        if self.is_valid(raw) {
            Ok(())
        } else {
            Err(FieldError::new(self, raw))
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returns the year this code is running in, by the local clock.
#[must_use]
pub fn current_year() -> i32 {
    Local::now().year()
}

/// Parses a four digit year and checks it lies within `[FIRST_YEAR, current_year]`.
#[must_use]
pub fn parse_year(raw: &str, current_year: i32) -> Option<i32> {
    if !YEAR.is_match(raw) {
        return None;
    }
    raw.parse::<i32>()
        .ok()
        .filter(|year| (FIRST_YEAR..=current_year).contains(year))
}

/// A single value that failed its field's rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not a valid {field}. Expected {}.", .field.rule())]
pub struct FieldError {
    pub field: Field,
    pub value: String,
}

impl FieldError {
    #[must_use]
    pub fn new(field: Field, value: &str) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// All fields of a form that failed validation. Never empty when returned as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, field: Field) -> bool {
        self.0.iter().any(|error| error.field == field)
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.iter().map(|error| error.field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }
}

impl From<FieldError> for ValidationErrors {
    fn from(value: FieldError) -> Self {
        Self(vec![value])
    }
}

impl std::error::Error for ValidationErrors {}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self
            .fields()
            .map(Field::name)
            .collect::<Vec<&str>>()
            .join(", ");
        write!(f, "invalid value for {fields}")
    }
}
