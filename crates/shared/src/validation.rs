//! Common validation utilities.

use validator::ValidationError;

use crate::crypto::MAX_EXIT_CODE_LENGTH;

/// Validates that a string contains something other than whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates a requested exit code length. Non-positive values are accepted
/// and later replaced by the default length.
pub fn validate_code_length(length: i32) -> Result<(), ValidationError> {
    if length <= MAX_EXIT_CODE_LENGTH as i32 {
        Ok(())
    } else {
        let mut err = ValidationError::new("code_length_range");
        err.message = Some(format!("Code length must not exceed {}", MAX_EXIT_CODE_LENGTH).into());
        Err(err)
    }
}

/// Validates an application version string reported by a device.
pub fn validate_app_version(version: &str) -> Result<(), ValidationError> {
    if version.len() <= 64 && !version.chars().any(char::is_control) {
        Ok(())
    } else {
        let mut err = ValidationError::new("app_version_format");
        err.message = Some("App version must be at most 64 printable characters".into());
        Err(err)
    }
}

/// Trims an optional string and treats blank as absent.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("ABC123").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   ").is_err());
    }

    #[test]
    fn test_validate_code_length() {
        assert!(validate_code_length(-1).is_ok());
        assert!(validate_code_length(0).is_ok());
        assert!(validate_code_length(32).is_ok());
        assert!(validate_code_length(33).is_err());
    }

    #[test]
    fn test_validate_code_length_error_message() {
        let err = validate_code_length(100).unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Code length must not exceed 32"
        );
    }

    #[test]
    fn test_validate_app_version() {
        assert!(validate_app_version("1.4.2").is_ok());
        assert!(validate_app_version("").is_ok());
        assert!(validate_app_version(&"9".repeat(65)).is_err());
        assert!(validate_app_version("1.0\n").is_err());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  x ")), Some("x"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
