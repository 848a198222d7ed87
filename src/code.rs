//! Human readable booking codes
//!
//! A code reads `{type}/{country}-{city}/{year}-{month initial}/{8 digits}`,
//! e.g. `K/I-J/2024-J/04718235`. The digits come from the operating system's
//! entropy source; uniqueness is probabilistic and is checked by the caller
//! against the code index.
use super::error::{BookingError, Result};
use chrono::{DateTime, Datelike, Utc};
use rand::{TryRngCore, rngs::OsRng};

pub const DIGITS: usize = 8;

const TABLE: [u8; 10] = *b"1234567890";

pub fn generate(code_type: &str, country: &str, city: &str) -> Result<String> {
    generate_at(code_type, country, city, Utc::now())
}

pub fn generate_at(
    code_type: &str,
    country: &str,
    city: &str,
    at: DateTime<Utc>,
) -> Result<String> {
    let digits = random_digits()?;
    let month = at.format("%B").to_string();
    let month_initial = &month[..1];

    Ok(format!(
        "{code_type}/{country}-{city}/{}-{month_initial}/{digits}",
        at.year()
    ))
}

fn random_digits() -> Result<String> {
    digits_from(&mut OsRng)
}

fn digits_from<R: TryRngCore>(rng: &mut R) -> Result<String> {
    let mut bytes = [0u8; DIGITS];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| BookingError::RandomSource(e.to_string()))?;

    Ok(bytes
        .iter()
        .map(|b| TABLE[usize::from(*b) % TABLE.len()] as char)
        .collect())
}
