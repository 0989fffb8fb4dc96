// ABOUTME: Library module for fleet-records
// ABOUTME: Exports the data-access core for use in the binary and tests

pub mod config;
pub mod credentials;
pub mod error;
pub mod filters;
pub mod postgres;
pub mod repository;
pub mod utils;
pub mod validation;

pub use error::{AuthFailure, ConnectError, DataError};
