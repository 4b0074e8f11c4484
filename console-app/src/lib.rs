pub mod api;
pub mod auth;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod reconcile;
pub mod resolver;

pub use error::Error;
