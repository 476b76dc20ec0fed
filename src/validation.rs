//! Field validators shared by the create/update DTOs.
//!
//! These run before any persistence call; failures surface as
//! `AppError::Validation` with one entry per offending field.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use url::Url;
use validator::ValidationError;

use crate::models::language::is_valid_code;

static ISBN_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d{9}[\dXx]|\d{13})$").expect("valid regex"));

/// Strip dashes and spaces from an ISBN. Applied before validation and
/// before the value is stored.
pub fn normalize_isbn(isbn: &str) -> String {
    isbn.chars().filter(|c| *c != '-' && *c != ' ').collect()
}

/// ISBN-10/13 validation including the check digit. The value is validated
/// in its normalized (dash-stripped) form.
pub fn validate_isbn(isbn: &str) -> Result<(), ValidationError> {
    let normalized = normalize_isbn(isbn);
    if !ISBN_SHAPE.is_match(&normalized) {
        return Err(ValidationError::new("isbn_format"));
    }
    let valid = match normalized.len() {
        10 => isbn10_checksum_ok(&normalized),
        13 => isbn13_checksum_ok(&normalized),
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("isbn_checksum"))
    }
}

fn isbn10_checksum_ok(isbn: &str) -> bool {
    let mut sum: u32 = 0;
    for (i, c) in isbn.chars().enumerate() {
        let value = if i == 9 && (c == 'X' || c == 'x') {
            10
        } else {
            match c.to_digit(10) {
                Some(d) => d,
                None => return false,
            }
        };
        sum += value * (10 - i as u32);
    }
    sum % 11 == 0
}

fn isbn13_checksum_ok(isbn: &str) -> bool {
    let mut sum: u32 = 0;
    for (i, c) in isbn.chars().enumerate() {
        let d = match c.to_digit(10) {
            Some(d) => d,
            None => return false,
        };
        sum += d * if i % 2 == 0 { 1 } else { 3 };
    }
    sum % 10 == 0
}

/// Prices must be non-negative.
pub fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        return Err(ValidationError::new("price_negative"));
    }
    Ok(())
}

/// Publication years are plain calendar years.
pub fn validate_year(year: impl std::borrow::Borrow<i32>) -> Result<(), ValidationError> {
    let year = *year.borrow();
    if (0..=9999).contains(&year) {
        Ok(())
    } else {
        Err(ValidationError::new("year_out_of_range"))
    }
}

/// Every language must be a known ISO 639-1 code (case-insensitive).
pub fn validate_language_codes(codes: &Vec<String>) -> Result<(), ValidationError> {
    for code in codes {
        if !is_valid_code(code) {
            let mut err = ValidationError::new("unknown_language_code");
            err.add_param("code".into(), code);
            return Err(err);
        }
    }
    Ok(())
}

/// Image values must at least parse as absolute URLs; they are otherwise
/// stored verbatim.
pub fn validate_image_urls(urls: &Vec<String>) -> Result<(), ValidationError> {
    for url in urls {
        if Url::parse(url).is_err() {
            let mut err = ValidationError::new("invalid_image_url");
            err.add_param("url".into(), url);
            return Err(err);
        }
    }
    Ok(())
}

/// Stock deltas accepted by add-stock: `[1, i32::MAX)`.
pub fn valid_stock_amount(amount: i32) -> bool {
    (1..i32::MAX).contains(&amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_isbn() {
        assert_eq!(normalize_isbn("978-84-376-0494-7"), "9788437604947");
        assert_eq!(normalize_isbn("0 19 852663 6"), "0198526636");
    }

    #[test]
    fn test_isbn10() {
        assert!(validate_isbn("0-19-852663-6").is_ok());
        assert!(validate_isbn("080442957X").is_ok());
        assert!(validate_isbn("0-19-852663-7").is_err());
        assert!(validate_isbn("080442957x").is_ok());
    }

    #[test]
    fn test_isbn13() {
        assert!(validate_isbn("978-84-376-0494-7").is_ok());
        assert!(validate_isbn("9780306406157").is_ok());
        assert!(validate_isbn("9780306406158").is_err());
    }

    #[test]
    fn test_isbn_shape() {
        assert!(validate_isbn("not-an-isbn").is_err());
        assert!(validate_isbn("12345").is_err());
        assert!(validate_isbn("").is_err());
    }

    #[test]
    fn test_price() {
        assert!(validate_price(&Decimal::ZERO).is_ok());
        assert!(validate_price(&Decimal::new(1999, 2)).is_ok());
        assert!(validate_price(&Decimal::new(-1, 0)).is_err());
    }

    #[test]
    fn test_year() {
        assert!(validate_year(&1605).is_ok());
        assert!(validate_year(&0).is_ok());
        assert!(validate_year(&-30).is_err());
        assert!(validate_year(&10000).is_err());
    }

    #[test]
    fn test_language_codes() {
        assert!(validate_language_codes(&vec!["es".into(), "EN".into()]).is_ok());
        assert!(validate_language_codes(&vec!["zz".into()]).is_err());
    }

    #[test]
    fn test_image_urls() {
        assert!(validate_image_urls(&vec!["https://example.com/cover.jpg".into()]).is_ok());
        assert!(validate_image_urls(&vec!["not a url".into()]).is_err());
    }

    #[test]
    fn test_stock_amount() {
        assert!(valid_stock_amount(1));
        assert!(valid_stock_amount(100));
        assert!(!valid_stock_amount(0));
        assert!(!valid_stock_amount(-5));
        assert!(!valid_stock_amount(i32::MAX));
    }
}
