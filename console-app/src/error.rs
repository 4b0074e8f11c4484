use reqwest::StatusCode;
use shared::validation::ValidationErrors;
use thiserror::Error;

use crate::coordinator::{DeletionStage, DeletionState};

/// Everything that can go wrong while talking to the car and registration collections.
#[derive(Debug, Error)]
pub enum Error {
    /// One or more fields failed their rule. Nothing was sent to the server.
    #[error("Some fields are invalid: {0}")]
    Validation(#[from] ValidationErrors),
    /// An update was requested without any field to change. Nothing was sent to the server.
    #[error("Nothing to update. Provide at least one field to change.")]
    NothingToUpdate,
    /// The server answered with 401. The session has to be renewed by logging in again.
    #[error("The session has expired. Please log in again.")]
    AuthExpired,
    /// No bearer token was supplied at all.
    #[error("You are not logged in. Log in first and supply the token.")]
    NotLoggedIn,
    #[error("Login failed: {0}")]
    LoginFailed(String),
    #[error("The passwords do not match.")]
    PasswordMismatch,
    /// Any other non-2xx answer. `detail` is the message the server sent, unchanged.
    #[error("The server rejected the request ({status}): {detail}")]
    RequestFailed { status: StatusCode, detail: String },
    /// More than one record carries exactly the same plate.
    #[error("Found {matches} records with the plate {plate}. Refusing to pick one.")]
    AmbiguousLookup { plate: String, matches: usize },
    #[error("The server sent a response that could not be read: {0}")]
    MalformedResponse(#[from] serde_json::Error),
    #[error("The server response did not contain a '{0}' list.")]
    MissingListing(&'static str),
    #[error("An error occured whilst talking to the server: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// A cascading car delete stopped part way. `registration_deleted` tells whether the
    /// registration was already gone when the flow stopped. `history` ends with the failed state.
    #[error(
        "Deleting car {plate} failed whilst {stage}. Registration deleted: {registration_deleted}. {source}"
    )]
    CarDeletionFailed {
        plate: String,
        stage: DeletionStage,
        registration_deleted: bool,
        history: Vec<DeletionState>,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Whether this is the "not found" class of failure, e.g. deleting a plate that is already gone.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::RequestFailed { status, .. } => *status == StatusCode::NOT_FOUND,
            Error::CarDeletionFailed { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Whether the user has to log in (again) before anything else can succeed.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        matches!(self, Error::AuthExpired | Error::NotLoggedIn)
    }
}
