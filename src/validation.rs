// ABOUTME: Field validation for aircraft records
// ABOUTME: Collects every violated rule instead of stopping at the first

use crate::error::DataError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Aircraft IDs must be strictly below this value
pub const AIRCRAFT_ID_LIMIT: i64 = 1_000_000;

/// Longest accepted name, manufacturer or model, in characters
pub const MAX_TEXT_LENGTH: usize = 100;

static ICAO_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][0-9]{3}$").unwrap());
static REGISTRATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{2}-[A-Za-z0-9]{3}$").unwrap());

/// Aircraft fields as submitted by a caller, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AircraftInput {
    pub aircraft_id: String,
    pub icao_code: String,
    pub registration: String,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
}

/// A validated aircraft, ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aircraft {
    pub aircraft_id: i64,
    pub icao_code: String,
    pub registration: String,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
}

/// Parse an aircraft ID: a positive integer below [`AIRCRAFT_ID_LIMIT`]
pub fn parse_aircraft_id(raw: &str) -> Result<i64, String> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 && id < AIRCRAFT_ID_LIMIT => Ok(id),
        _ => Err(format!(
            "Aircraft ID must be a positive whole number less than {}",
            AIRCRAFT_ID_LIMIT
        )),
    }
}

pub fn is_valid_icao_code(code: &str) -> bool {
    ICAO_CODE.is_match(code)
}

pub fn is_valid_registration(registration: &str) -> bool {
    REGISTRATION.is_match(registration)
}

fn check_length(field: &str, value: &str, violations: &mut Vec<String>) {
    let length = value.chars().count();
    if length > MAX_TEXT_LENGTH {
        violations.push(format!(
            "{} must be at most {} characters (got {})",
            field, MAX_TEXT_LENGTH, length
        ));
    }
}

impl AircraftInput {
    /// Every violated rule, in field order; empty means valid
    pub fn violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        if let Err(message) = parse_aircraft_id(&self.aircraft_id) {
            violations.push(message);
        }
        if !is_valid_icao_code(&self.icao_code) {
            violations.push(
                "ICAO code must be one letter followed by three digits (e.g. B737)".to_string(),
            );
        }
        if !is_valid_registration(&self.registration) {
            violations.push(
                "Registration must be two letters, a hyphen and three letters or digits \
                 (e.g. VH-ABC)"
                    .to_string(),
            );
        }
        check_length("Name", &self.name, &mut violations);
        check_length("Manufacturer", &self.manufacturer, &mut violations);
        check_length("Model", &self.model, &mut violations);

        violations
    }

    /// Convert into a typed [`Aircraft`] if every rule holds
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Validation`] carrying all violations at once.
    pub fn validate(&self) -> Result<Aircraft, DataError> {
        let violations = self.violations();
        if !violations.is_empty() {
            return Err(DataError::Validation(violations));
        }

        let aircraft_id =
            parse_aircraft_id(&self.aircraft_id).map_err(|m| DataError::Validation(vec![m]))?;

        Ok(Aircraft {
            aircraft_id,
            icao_code: self.icao_code.clone(),
            registration: self.registration.clone(),
            name: self.name.clone(),
            manufacturer: self.manufacturer.clone(),
            model: self.model.clone(),
        })
    }
}
