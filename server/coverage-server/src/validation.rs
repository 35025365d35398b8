//! Request validation utilities for consistent validation across handlers.

use crate::error::ApiError;

/// Trait for validating request payloads
///
/// Implement this trait for all create/update request types so malformed
/// input is rejected before the store is touched.
pub trait RequestValidation {
    /// Validates the request and returns an error if validation fails
    fn validate(&self) -> Result<(), ApiError>;
}

/// Macro for validating fields with custom predicates
#[macro_export]
macro_rules! validate_field {
    ($field:expr, $predicate:expr, $message:expr) => {
        if !$predicate {
            return Err($crate::error::ApiError::validation($message));
        }
    };
}

/// Macro for validating required fields (non-empty strings)
#[macro_export]
macro_rules! validate_required {
    ($field:expr, $message:expr) => {
        validate_field!($field, !$field.trim().is_empty(), $message);
    };
}

/// Macro for validating string length
#[macro_export]
macro_rules! validate_length {
    ($field:expr, $min:expr, $max:expr, $message:expr) => {
        let len = $field.len();
        validate_field!($field, len >= $min && len <= $max, $message);
    };
}

/// Macro for validating monetary amounts (strictly positive)
#[macro_export]
macro_rules! validate_positive_amount {
    ($field:expr, $message:expr) => {
        validate_field!(
            $field,
            $field > rust_decimal::Decimal::ZERO,
            $message
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    struct TestRequest {
        name: String,
        code: String,
        amount: Decimal,
    }

    impl RequestValidation for TestRequest {
        fn validate(&self) -> Result<(), ApiError> {
            validate_required!(self.name, "Name is required");
            validate_length!(self.code, 1, 50, "Code must be between 1 and 50 characters");
            validate_positive_amount!(self.amount, "Amount must be positive");
            Ok(())
        }
    }

    #[test]
    fn test_validation_success() {
        let request = TestRequest {
            name: "Outpatient".to_string(),
            code: "OP-1".to_string(),
            amount: dec!(100),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_validation_empty_name() {
        let request = TestRequest {
            name: "   ".to_string(),
            code: "OP-1".to_string(),
            amount: dec!(100),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_amount() {
        let request = TestRequest {
            name: "Outpatient".to_string(),
            code: "OP-1".to_string(),
            amount: Decimal::ZERO,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_negative_amount() {
        let request = TestRequest {
            name: "Outpatient".to_string(),
            code: "OP-1".to_string(),
            amount: dec!(-5),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_validation_code_too_long() {
        let request = TestRequest {
            name: "Outpatient".to_string(),
            code: "X".repeat(51),
            amount: dec!(100),
        };
        assert!(request.validate().is_err());
    }
}
