use crate::utils::error::{Result, SimError};
use std::path::Path;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(SimError::invalid_value(field_name, path, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(SimError::invalid_value(field_name, path, "Path contains null bytes"));
    }

    Ok(())
}

pub fn validate_extension<'a>(
    field_name: &str,
    path: &'a Path,
    allowed_extensions: &[&str],
) -> Result<&'a str> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if allowed_extensions.contains(&ext) => Ok(ext),
        Some(ext) => Err(SimError::invalid_value(
            field_name,
            path.display(),
            format!(
                "Unsupported file extension: {}. Allowed extensions: {}",
                ext,
                allowed_extensions.join(", ")
            ),
        )),
        None => Err(SimError::invalid_value(
            field_name,
            path.display(),
            "File has no extension or invalid filename",
        )),
    }
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(SimError::invalid_value(
            field_name,
            value,
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

/// Finite and strictly greater than zero.
pub fn validate_positive(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SimError::invalid_value(
            field_name,
            value,
            "Value must be finite and strictly positive",
        ));
    }
    Ok(())
}

pub fn validate_non_negative(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(SimError::invalid_value(
            field_name,
            value,
            "Value must be finite and non-negative",
        ));
    }
    Ok(())
}

pub fn validate_finite(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(SimError::invalid_value(field_name, value, "Value must be finite"));
    }
    Ok(())
}

/// Both bounds finite and `min <= max`.
pub fn validate_interval(field_name: &str, min: f64, max: f64) -> Result<()> {
    validate_finite(&format!("{}.min", field_name), min)?;
    validate_finite(&format!("{}.max", field_name), max)?;
    if min > max {
        return Err(SimError::invalid_value(
            field_name,
            format!("[{}, {}]", min, max),
            "Lower bound must not exceed upper bound",
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(SimError::invalid_value(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive("probe.frequency", 5e6).is_ok());
        assert!(validate_positive("probe.frequency", 0.0).is_err());
        assert!(validate_positive("probe.frequency", -1.0).is_err());
        assert!(validate_positive("probe.frequency", f64::NAN).is_err());
        assert!(validate_positive("probe.frequency", f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative("block_material.density", 0.0).is_ok());
        assert!(validate_non_negative("block_material.density", -1e-9).is_err());
    }

    #[test]
    fn test_validate_interval() {
        assert!(validate_interval("grid.x", -1.0, 1.0).is_ok());
        assert!(validate_interval("grid.x", 1.0, 1.0).is_ok());
        let err = validate_interval("grid.x", 1.0, -1.0).unwrap_err();
        assert!(err.to_string().contains("grid.x"));
        assert!(validate_interval("grid.x", f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_validate_extension() {
        let allowed = ["yaml", "yml", "toml"];
        assert_eq!(
            validate_extension("config", Path::new("a/b.yml"), &allowed).unwrap(),
            "yml"
        );
        assert!(validate_extension("config", Path::new("a/b.json"), &allowed).is_err());
        assert!(validate_extension("config", Path::new("noext"), &allowed).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("probe.bandwidth", 0.5, 0.0, 2.0).is_ok());
        assert!(validate_range("probe.bandwidth", 2.5, 0.0, 2.0).is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("probe.numx", 64, 1).is_ok());
        assert!(validate_positive_number("probe.numx", 0, 1).is_err());
    }
}
