//! Utilidades de validación
//!
//! Validadores de dominio usados tanto por `#[validate(custom = ...)]` en los
//! DTOs como por los controllers como segunda línea de defensa.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use validator::ValidationError;

lazy_static! {
    // ABC1234 (antigua) o ABC1D23 (Mercosur)
    static ref PLATE_RE: Regex = Regex::new(r"^[A-Z]{3}[0-9][A-Z0-9][0-9]{2}$").unwrap();
    static ref DIGITS_RE: Regex = Regex::new(r"^[0-9]+$").unwrap();
}

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar formato de teléfono (básico)
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let clean_phone = value.chars().filter(|c| c.is_ascii_digit()).collect::<String>();
    if clean_phone.len() < 10 || clean_phone.len() > 15 {
        let mut error = ValidationError::new("phone");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

fn validate_digits(value: &str, len: usize, code: &'static str) -> Result<(), ValidationError> {
    if value.len() != len || !DIGITS_RE.is_match(value) {
        let mut error = ValidationError::new(code);
        error.add_param("value".into(), &value.to_string());
        error.add_param("length".into(), &len);
        return Err(error);
    }
    Ok(())
}

/// CPF: 11 dígitos, sin puntuación
pub fn validate_cpf(value: &str) -> Result<(), ValidationError> {
    validate_digits(value, 11, "cpf")
}

/// CNPJ: 14 dígitos, sin puntuación
pub fn validate_cnpj(value: &str) -> Result<(), ValidationError> {
    validate_digits(value, 14, "cnpj")
}

/// Validar formato de placa de vehículo
pub fn validate_license_plate(value: &str) -> Result<(), ValidationError> {
    let clean_plate = normalize_plate(value);
    if !PLATE_RE.is_match(&clean_plate) {
        let mut error = ValidationError::new("license_plate");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"ABC1234 or ABC1D23".to_string());
        return Err(error);
    }
    Ok(())
}

/// Placa sin separadores y en mayúsculas
pub fn normalize_plate(value: &str) -> String {
    value.replace([' ', '-', '_'], "").to_uppercase()
}

/// Recorta y convierte cadenas vacías en None
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validar que un valor sea positivo
pub fn validate_positive<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value <= T::zero() {
        let mut error = ValidationError::new("positive");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor sea no negativo
pub fn validate_non_negative<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value < T::zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Decimales que admiten las columnas NUMERIC(_, 2) y NUMERIC(_, 3)
pub const MONEY_SCALE: u32 = 2;
pub const QUANTITY_SCALE: u32 = 3;

fn validate_scale(value: &Decimal, max_scale: u32) -> Result<(), ValidationError> {
    if value.normalize().scale() > max_scale {
        let mut error = ValidationError::new("scale");
        error.add_param("max_scale".into(), &max_scale);
        error.add_param("actual".into(), value);
        return Err(error);
    }
    Ok(())
}

/// Importe > 0 con a lo sumo dos decimales
pub fn validate_positive_decimal(value: &Decimal) -> Result<(), ValidationError> {
    validate_positive(*value)?;
    validate_scale(value, MONEY_SCALE)
}

pub fn validate_non_negative_decimal(value: &Decimal) -> Result<(), ValidationError> {
    validate_non_negative(*value)?;
    validate_scale(value, MONEY_SCALE)
}

/// Cantidad de un ítem: > 0 con a lo sumo tres decimales
pub fn validate_quantity(value: &Decimal) -> Result<(), ValidationError> {
    validate_positive(*value)?;
    validate_scale(value, QUANTITY_SCALE)
}

/// Porcentaje entre 0 y 100
pub fn validate_percent(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > Decimal::ONE_HUNDRED {
        let mut error = ValidationError::new("range");
        error.add_param("min".into(), &0);
        error.add_param("max".into(), &100);
        error.add_param("actual".into(), value);
        return Err(error);
    }
    validate_scale(value, MONEY_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_not_empty() {
        assert!(validate_not_empty("Fiat Uno 2010").is_ok());
        assert!(validate_not_empty("   ").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("(11) 98765-4321").is_ok());
        assert!(validate_phone("123").is_err());
        assert!(validate_phone("1234567890123456").is_err());
    }

    #[test]
    fn test_validate_cpf_and_cnpj() {
        assert!(validate_cpf("11122233344").is_ok());
        assert!(validate_cpf("111.222.333-44").is_err());
        assert!(validate_cpf("1112223334").is_err());
        assert!(validate_cnpj("12345678000199").is_ok());
        assert!(validate_cnpj("1234567800019").is_err());
    }

    #[test]
    fn test_validate_license_plate() {
        assert!(validate_license_plate("ABC1234").is_ok());
        assert!(validate_license_plate("abc-1d23").is_ok());
        assert!(validate_license_plate("A").is_err());
        assert!(validate_license_plate("1234ABC").is_err());
        assert_eq!(normalize_plate("abc-1d23"), "ABC1D23");
    }

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive(5).is_ok());
        assert!(validate_positive(0).is_err());
        assert!(validate_positive_decimal(&dec!(0.01)).is_ok());
        assert!(validate_positive_decimal(&dec!(0)).is_err());
        assert!(validate_non_negative_decimal(&dec!(0)).is_ok());
        assert!(validate_non_negative_decimal(&dec!(-1)).is_err());
    }

    #[test]
    fn test_validate_percent() {
        assert!(validate_percent(&dec!(0)).is_ok());
        assert!(validate_percent(&dec!(100)).is_ok());
        assert!(validate_percent(&dec!(100.5)).is_err());
        assert!(validate_percent(&dec!(-1)).is_err());
    }

    #[test]
    fn test_decimal_scale_matches_columns() {
        assert!(validate_positive_decimal(&dec!(10.25)).is_ok());
        assert!(validate_positive_decimal(&dec!(10.250)).is_ok());
        assert!(validate_positive_decimal(&dec!(0.005)).is_err());
        assert!(validate_non_negative_decimal(&dec!(1.999)).is_err());
        assert!(validate_quantity(&dec!(1.125)).is_ok());
        assert!(validate_quantity(&dec!(1.1255)).is_err());
        assert!(validate_quantity(&dec!(0)).is_err());
        assert!(validate_percent(&dec!(12.5)).is_ok());
        assert!(validate_percent(&dec!(12.555)).is_err());
    }
}
