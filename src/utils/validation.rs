//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! usadas por los DTOs de request.

use chrono::{Datelike, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use validator::ValidationError;

lazy_static! {
    /// Nombre de mecánico: letras (incluye umlauts), guiones y espacios
    pub static ref MECHANIKER_REGEX: Regex =
        Regex::new(r"^[A-ZÄÖÜa-zäöüß\- ]+$").unwrap();
}

/// Validar que un año de fabricación no esté en el futuro
pub fn validate_baujahr(value: i32) -> Result<(), ValidationError> {
    let max_year = Utc::now().year();
    if value > max_year {
        let mut error = ValidationError::new("baujahr");
        error.add_param("value".into(), &value);
        error.add_param("max".into(), &max_year);
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor decimal sea no negativo
pub fn validate_decimal_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_validate_baujahr() {
        assert!(validate_baujahr(2020).is_ok());
        assert!(validate_baujahr(Utc::now().year()).is_ok());
        assert!(validate_baujahr(Utc::now().year() + 1).is_err());
    }

    #[test]
    fn test_validate_decimal_non_negative() {
        assert!(validate_decimal_non_negative(&Decimal::ZERO).is_ok());
        assert!(validate_decimal_non_negative(&Decimal::from_str("49999.99").unwrap()).is_ok());
        assert!(validate_decimal_non_negative(&Decimal::from_str("-0.01").unwrap()).is_err());
    }

    #[test]
    fn test_mechaniker_regex() {
        assert!(MECHANIKER_REGEX.is_match("Hans"));
        assert!(MECHANIKER_REGEX.is_match("Jürgen Müller-Lüdenscheidt"));
        assert!(!MECHANIKER_REGEX.is_match("Hans123"));
        assert!(!MECHANIKER_REGEX.is_match("Hans!"));
        assert!(!MECHANIKER_REGEX.is_match(""));
    }
}
