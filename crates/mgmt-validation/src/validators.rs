//! Delegate validators
//!
//! Concrete validators placed behind a
//! [`NillableOrExpressionValidator`](crate::validator::NillableOrExpressionValidator).
//! Each one handles undefined values and expressions on its own as well, so it
//! can also be used stand-alone or behind a [`Nullability::Defer`] chain.
//!
//! [`Nullability::Defer`]: crate::validator::Nullability::Defer

use crate::error::ValidationError;
use crate::validator::ParameterValidator;
use mgmt_model::{ModelType, ModelValue};
use std::sync::Arc;

/// Checks the value's type
///
/// Unless strict, values convertible to the expected type are accepted
/// (numeric strings for `Int`, `"true"`/`"false"` for `Boolean`, scalars for
/// `String`).
#[derive(Debug, Clone)]
pub struct ModelTypeValidator {
    expected: ModelType,
    nullable: bool,
    allow_expressions: bool,
    strict: bool,
}

impl ModelTypeValidator {
    /// Validator for `expected`, rejecting undefined values and expressions
    #[must_use]
    pub fn new(expected: ModelType) -> Self {
        Self {
            expected,
            nullable: false,
            allow_expressions: false,
            strict: false,
        }
    }

    /// Accept undefined values
    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Accept expressions
    #[must_use]
    pub fn allow_expressions(mut self, allow: bool) -> Self {
        self.allow_expressions = allow;
        self
    }

    /// Require an exact type match
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Expected type
    #[inline]
    #[must_use]
    pub fn expected(&self) -> ModelType {
        self.expected
    }

    fn convertible(&self, value: &ModelValue) -> bool {
        match self.expected {
            ModelType::Int => value.as_int().is_some(),
            ModelType::Boolean => value.as_bool().is_some(),
            ModelType::String => matches!(value, ModelValue::Int(_) | ModelValue::Boolean(_)),
            _ => false,
        }
    }

    /// Returns `Ok(true)` when the value is concrete and of the right type,
    /// `Ok(false)` when it was accepted as undefined or expression
    fn check(&self, parameter: &str, value: &ModelValue) -> Result<bool, ValidationError> {
        match value {
            ModelValue::Undefined if self.nullable => Ok(false),
            ModelValue::Undefined => Err(ValidationError::NullNotAllowed {
                parameter: parameter.to_string(),
            }),
            ModelValue::Expression(_) if self.allow_expressions => Ok(false),
            ModelValue::Expression(_) => Err(ValidationError::ExpressionNotAllowed {
                parameter: parameter.to_string(),
            }),
            v if v.model_type() == self.expected => Ok(true),
            v if !self.strict && self.convertible(v) => Ok(true),
            v => Err(ValidationError::AttributeType {
                parameter: parameter.to_string(),
                expected: self.expected,
                actual: v.model_type(),
            }),
        }
    }
}

impl ParameterValidator for ModelTypeValidator {
    fn validate_parameter(
        &self,
        parameter: &str,
        value: &ModelValue,
    ) -> Result<(), ValidationError> {
        self.check(parameter, value).map(|_| ())
    }
}

/// Integer within an inclusive range
#[derive(Debug, Clone)]
pub struct IntRangeValidator {
    min: i64,
    max: i64,
    types: ModelTypeValidator,
}

impl IntRangeValidator {
    /// Range `[min, max]`, rejecting undefined values and expressions
    #[must_use]
    pub fn new(min: i64, max: i64) -> Self {
        Self {
            min,
            max,
            types: ModelTypeValidator::new(ModelType::Int),
        }
    }

    /// Valid TCP/UDP port, `[0, 65535]`
    #[must_use]
    pub fn port() -> Self {
        Self::new(0, 65535)
    }

    /// Accept undefined values
    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.types = self.types.nullable(nullable);
        self
    }

    /// Accept expressions
    #[must_use]
    pub fn allow_expressions(mut self, allow: bool) -> Self {
        self.types = self.types.allow_expressions(allow);
        self
    }
}

impl ParameterValidator for IntRangeValidator {
    fn validate_parameter(
        &self,
        parameter: &str,
        value: &ModelValue,
    ) -> Result<(), ValidationError> {
        if !self.types.check(parameter, value)? {
            return Ok(());
        }
        let Some(number) = value.as_int() else {
            return Err(ValidationError::AttributeType {
                parameter: parameter.to_string(),
                expected: ModelType::Int,
                actual: value.model_type(),
            });
        };
        if number < self.min || number > self.max {
            return Err(ValidationError::OutOfRange {
                parameter: parameter.to_string(),
                value: number,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    fn min(&self) -> Option<i64> {
        Some(self.min)
    }

    fn max(&self) -> Option<i64> {
        Some(self.max)
    }
}

/// String whose character count lies within an inclusive range
#[derive(Debug, Clone)]
pub struct StringLengthValidator {
    min: usize,
    max: usize,
    types: ModelTypeValidator,
}

impl StringLengthValidator {
    /// Length `[min, max]`
    #[must_use]
    pub fn new(min: usize, max: usize) -> Self {
        Self {
            min,
            max,
            types: ModelTypeValidator::new(ModelType::String),
        }
    }

    /// Non-empty string of any length
    #[must_use]
    pub fn non_empty() -> Self {
        Self::new(1, usize::MAX)
    }

    /// Accept undefined values
    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.types = self.types.nullable(nullable);
        self
    }

    /// Accept expressions
    #[must_use]
    pub fn allow_expressions(mut self, allow: bool) -> Self {
        self.types = self.types.allow_expressions(allow);
        self
    }
}

impl ParameterValidator for StringLengthValidator {
    fn validate_parameter(
        &self,
        parameter: &str,
        value: &ModelValue,
    ) -> Result<(), ValidationError> {
        if !self.types.check(parameter, value)? {
            return Ok(());
        }
        let length = value.to_string().chars().count();
        if length < self.min || length > self.max {
            return Err(ValidationError::InvalidLength {
                parameter: parameter.to_string(),
                length,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    fn min(&self) -> Option<i64> {
        i64::try_from(self.min).ok()
    }

    fn max(&self) -> Option<i64> {
        i64::try_from(self.max).ok()
    }
}

/// Value from an enumerated set, compared by string form
#[derive(Debug, Clone)]
pub struct AllowedValuesValidator {
    allowed: Vec<ModelValue>,
    types: ModelTypeValidator,
}

impl AllowedValuesValidator {
    /// Accept exactly the given strings
    #[must_use]
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed
                .into_iter()
                .map(|s| ModelValue::String(s.into()))
                .collect(),
            types: ModelTypeValidator::new(ModelType::String),
        }
    }

    /// Accept undefined values
    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.types = self.types.nullable(nullable);
        self
    }
}

impl ParameterValidator for AllowedValuesValidator {
    fn validate_parameter(
        &self,
        parameter: &str,
        value: &ModelValue,
    ) -> Result<(), ValidationError> {
        if !self.types.check(parameter, value)? {
            return Ok(());
        }
        let text = value.to_string();
        if self.allowed.iter().any(|a| a.to_string() == text) {
            Ok(())
        } else {
            Err(ValidationError::NotAllowedValue {
                parameter: parameter.to_string(),
                value: text,
                allowed: self.allowed.iter().map(ToString::to_string).collect(),
            })
        }
    }

    fn allowed_values(&self) -> Option<Vec<ModelValue>> {
        Some(self.allowed.clone())
    }
}

/// List whose elements each pass an element validator
#[derive(Debug, Clone)]
pub struct ListValidator {
    element: Arc<dyn ParameterValidator>,
    nullable: bool,
}

impl ListValidator {
    /// Validate every element with `element`
    #[must_use]
    pub fn new(element: Arc<dyn ParameterValidator>) -> Self {
        Self {
            element,
            nullable: false,
        }
    }

    /// Accept undefined values
    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    fn check(&self, parameter: &str, value: &ModelValue, resolved: bool) -> Result<(), ValidationError> {
        match value {
            ModelValue::Undefined if self.nullable => Ok(()),
            ModelValue::Undefined => Err(ValidationError::NullNotAllowed {
                parameter: parameter.to_string(),
            }),
            ModelValue::List(items) => items
                .iter()
                .try_for_each(|item| self.element.validate(parameter, item, resolved)),
            other => Err(ValidationError::AttributeType {
                parameter: parameter.to_string(),
                expected: ModelType::List,
                actual: other.model_type(),
            }),
        }
    }
}

impl ParameterValidator for ListValidator {
    fn validate_parameter(
        &self,
        parameter: &str,
        value: &ModelValue,
    ) -> Result<(), ValidationError> {
        self.check(parameter, value, false)
    }

    fn validate_resolved_parameter(
        &self,
        parameter: &str,
        value: &ModelValue,
    ) -> Result<(), ValidationError> {
        self.check(parameter, value, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_validator_converts_unless_strict() {
        let lenient = ModelTypeValidator::new(ModelType::Int);
        assert!(lenient
            .validate_parameter("p", &ModelValue::String("12".into()))
            .is_ok());

        let strict = ModelTypeValidator::new(ModelType::Int).strict();
        assert!(matches!(
            strict.validate_parameter("p", &ModelValue::String("12".into())),
            Err(ValidationError::AttributeType { .. })
        ));
    }

    #[test]
    fn type_validator_handles_undefined_and_expressions() {
        let v = ModelTypeValidator::new(ModelType::String);
        assert!(matches!(
            v.validate_parameter("p", &ModelValue::Undefined),
            Err(ValidationError::NullNotAllowed { .. })
        ));
        assert!(v.clone().nullable(true).validate_parameter("p", &ModelValue::Undefined).is_ok());
        assert!(v
            .allow_expressions(true)
            .validate_parameter("p", &ModelValue::expression("${x}"))
            .is_ok());
    }

    #[test]
    fn int_range_boundaries() {
        let v = IntRangeValidator::port();
        assert!(v.validate_parameter("port", &ModelValue::Int(0)).is_ok());
        assert!(v.validate_parameter("port", &ModelValue::Int(65535)).is_ok());
        assert!(v.validate_parameter("port", &ModelValue::Int(65536)).is_err());
        assert!(matches!(
            v.validate_parameter("port", &ModelValue::Boolean(true)),
            Err(ValidationError::AttributeType { .. })
        ));
    }

    #[test]
    fn string_length() {
        let v = StringLengthValidator::non_empty();
        assert!(v.validate_parameter("host", &ModelValue::from("a")).is_ok());
        assert!(matches!(
            v.validate_parameter("host", &ModelValue::from("")),
            Err(ValidationError::InvalidLength { length: 0, .. })
        ));
        assert_eq!(v.min(), Some(1));
    }

    #[test]
    fn allowed_values_reports_set() {
        let v = AllowedValuesValidator::new(["tcp", "udp"]);
        assert!(v.validate_parameter("protocol", &ModelValue::from("udp")).is_ok());
        assert!(v.validate_parameter("protocol", &ModelValue::from("sctp")).is_err());
        assert_eq!(v.allowed_values().map(|a| a.len()), Some(2));
        assert_eq!(v.min(), None);
    }

    #[test]
    fn list_validates_each_element() {
        let v = ListValidator::new(Arc::new(StringLengthValidator::non_empty())).nullable(true);
        assert!(v.validate_parameter("includes", &ModelValue::Undefined).is_ok());
        assert!(v
            .validate_parameter("includes", &ModelValue::from(vec!["a", "b"]))
            .is_ok());
        assert!(v
            .validate_parameter("includes", &ModelValue::from(vec!["a", ""]))
            .is_err());
        assert!(matches!(
            v.validate_parameter("includes", &ModelValue::from("a")),
            Err(ValidationError::AttributeType { .. })
        ));
    }
}
