//! Validation errors

use mgmt_model::ModelType;

/// Errors raised while validating or resolving a single value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Value is an expression but the attribute does not accept expressions
    #[error("'{parameter}' does not allow expressions")]
    ExpressionNotAllowed {
        /// Attribute or parameter name
        parameter: String,
    },

    /// Value is undefined but the attribute is required
    #[error("'{parameter}' may not be null")]
    NullNotAllowed {
        /// Attribute or parameter name
        parameter: String,
    },

    /// Value has the wrong type
    #[error("wrong type for '{parameter}': expected {expected}, was {actual}")]
    AttributeType {
        /// Attribute or parameter name
        parameter: String,
        /// Declared type
        expected: ModelType,
        /// Type of the supplied value
        actual: ModelType,
    },

    /// Integer outside the accepted range
    #[error("{value} is an invalid value for parameter '{parameter}': must be within [{min}, {max}]")]
    OutOfRange {
        /// Attribute or parameter name
        parameter: String,
        /// Rejected value
        value: i64,
        /// Inclusive lower bound
        min: i64,
        /// Inclusive upper bound
        max: i64,
    },

    /// String with an unacceptable length
    #[error("'{parameter}' has length {length}, must be within [{min}, {max}]")]
    InvalidLength {
        /// Attribute or parameter name
        parameter: String,
        /// Length of the rejected value
        length: usize,
        /// Inclusive lower bound
        min: usize,
        /// Inclusive upper bound
        max: usize,
    },

    /// Value outside an enumerated set
    #[error("'{value}' is an invalid value for parameter '{parameter}', allowed: {allowed:?}")]
    NotAllowedValue {
        /// Attribute or parameter name
        parameter: String,
        /// Rejected value
        value: String,
        /// Accepted values
        allowed: Vec<String>,
    },

    /// Expression could not be resolved
    #[error("cannot resolve expression '{expression}': {reason}")]
    ExpressionResolution {
        /// Raw expression text
        expression: String,
        /// Why resolution failed
        reason: String,
    },
}

impl ValidationError {
    /// Stable message key reported to callers
    #[must_use]
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::ExpressionNotAllowed { .. } => "expressionNotAllowed",
            Self::NullNotAllowed { .. } => "nullNotAllowed",
            Self::AttributeType { .. } => "attributeType",
            Self::OutOfRange { .. } | Self::InvalidLength { .. } | Self::NotAllowedValue { .. } => {
                "invalidParameter"
            }
            Self::ExpressionResolution { .. } => "expressionResolution",
        }
    }

    /// Parameter the error refers to, if any
    #[must_use]
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::ExpressionNotAllowed { parameter }
            | Self::NullNotAllowed { parameter }
            | Self::AttributeType { parameter, .. }
            | Self::OutOfRange { parameter, .. }
            | Self::InvalidLength { parameter, .. }
            | Self::NotAllowedValue { parameter, .. } => Some(parameter),
            Self::ExpressionResolution { .. } => None,
        }
    }

    /// Check if this is a delegate-level rejection of a well-typed value
    #[inline]
    #[must_use]
    pub fn is_invalid_parameter(&self) -> bool {
        self.message_key() == "invalidParameter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_keys_and_parameters() {
        let err = ValidationError::OutOfRange {
            parameter: "port".into(),
            value: 70000,
            min: 0,
            max: 65535,
        };
        assert_eq!(err.message_key(), "invalidParameter");
        assert_eq!(err.parameter(), Some("port"));
        assert!(err.to_string().contains("70000"));
    }
}
