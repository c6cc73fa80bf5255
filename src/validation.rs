//! RUT (Chilean national id) and phone helpers used by the reservation
//! forms. All functions are pure.

use crate::error::AppError;

const CHILE_COUNTRY_CODE: &str = "56";
const NATIONAL_PHONE_DIGITS: usize = 9;

/// Strips formatting from a RUT, keeping digits and an upper-cased `K`.
pub fn clean_rut(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_digit() || *c == 'k' || *c == 'K')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Formats a RUT as `12.345.678-5`.
pub fn format_rut(raw: &str) -> String {
    let clean = clean_rut(raw);
    if clean.len() < 2 {
        return clean;
    }

    let (body, dv) = clean.split_at(clean.len() - 1);
    let mut grouped = String::with_capacity(body.len() + body.len() / 3);
    for (i, c) in body.chars().enumerate() {
        if i > 0 && (body.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    format!("{}-{}", grouped, dv)
}

/// Modulo-11 check digit for a RUT body made only of digits.
pub fn rut_check_digit(body: &str) -> Option<char> {
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let sum: u32 = body
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .zip([2u32, 3, 4, 5, 6, 7].iter().cycle())
        .map(|(digit, factor)| digit * factor)
        .sum();

    match 11 - (sum % 11) {
        11 => Some('0'),
        10 => Some('K'),
        n => char::from_digit(n, 10),
    }
}

pub fn validate_rut(raw: &str) -> bool {
    let clean = clean_rut(raw);
    if clean.len() < 8 || clean.len() > 9 {
        return false;
    }

    let (body, dv) = clean.split_at(clean.len() - 1);
    match rut_check_digit(body) {
        Some(expected) => dv.starts_with(expected),
        None => false,
    }
}

/// Validates and formats a RUT, for form submission.
pub fn parse_rut(raw: &str) -> Result<String, AppError> {
    if validate_rut(raw) {
        Ok(format_rut(raw))
    } else {
        Err(AppError::Validation("El RUT ingresado no es válido.".to_string()))
    }
}

fn national_phone_digits(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.strip_prefix(CHILE_COUNTRY_CODE) {
        Some(rest) if rest.len() == NATIONAL_PHONE_DIGITS => rest.to_string(),
        _ => digits,
    }
}

/// Normalizes a phone number to `+56XXXXXXXXX`.
pub fn normalize_phone(raw: &str) -> String {
    format!("+{}{}", CHILE_COUNTRY_CODE, national_phone_digits(raw))
}

/// Mobile numbers only: nine national digits starting with 9.
pub fn validate_phone(raw: &str) -> bool {
    let national = national_phone_digits(raw);
    national.len() == NATIONAL_PHONE_DIGITS && national.starts_with('9')
}

pub fn parse_phone(raw: &str) -> Result<String, AppError> {
    if validate_phone(raw) {
        Ok(normalize_phone(raw))
    } else {
        Err(AppError::Validation(
            "El teléfono debe tener el formato +56 9 XXXX XXXX.".to_string(),
        ))
    }
}
