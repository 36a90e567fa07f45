//! Validator trait and the nullability/expression chain
//!
//! Every attribute is validated through a [`NillableOrExpressionValidator`]
//! wrapping a type- or value-specific delegate. The wrapper handles the two
//! cross-cutting concerns (undefined values, unresolved expressions) so the
//! delegate only ever sees values it is meant to judge.

use crate::error::ValidationError;
use mgmt_model::ModelValue;
use std::fmt;
use std::sync::Arc;

/// Validates a single parameter value
///
/// `min`, `max` and `allowed_values` are optional introspection hooks used by
/// description tooling; the defaults report "no constraint".
pub trait ParameterValidator: fmt::Debug + Send + Sync {
    /// Validate a value as submitted, before expression resolution
    fn validate_parameter(&self, parameter: &str, value: &ModelValue)
        -> Result<(), ValidationError>;

    /// Validate a value after expressions have been resolved
    fn validate_resolved_parameter(
        &self,
        parameter: &str,
        value: &ModelValue,
    ) -> Result<(), ValidationError> {
        self.validate_parameter(parameter, value)
    }

    /// Lower bound, for validators that enforce one
    fn min(&self) -> Option<i64> {
        None
    }

    /// Upper bound, for validators that enforce one
    fn max(&self) -> Option<i64> {
        None
    }

    /// Enumerated allowed values, for validators that enforce one
    fn allowed_values(&self) -> Option<Vec<ModelValue>> {
        None
    }

    /// Dispatch to the unresolved or resolved form
    fn validate(
        &self,
        parameter: &str,
        value: &ModelValue,
        resolved: bool,
    ) -> Result<(), ValidationError> {
        if resolved {
            self.validate_resolved_parameter(parameter, value)
        } else {
            self.validate_parameter(parameter, value)
        }
    }
}

/// How a chain treats undefined values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Nullability {
    /// Undefined is accepted without consulting the delegate
    Allow,
    /// Undefined is rejected with [`ValidationError::NullNotAllowed`]
    Deny,
    /// Undefined is passed to the delegate
    #[default]
    Defer,
}

/// Chain entry handling undefined values and expressions before delegating
#[derive(Debug, Clone)]
pub struct NillableOrExpressionValidator {
    delegate: Arc<dyn ParameterValidator>,
    nullability: Nullability,
    allow_expression: bool,
}

impl NillableOrExpressionValidator {
    /// Wrap `delegate`
    #[must_use]
    pub fn new(
        delegate: Arc<dyn ParameterValidator>,
        nullability: Nullability,
        allow_expression: bool,
    ) -> Self {
        Self {
            delegate,
            nullability,
            allow_expression,
        }
    }

    /// Wrapped validator
    #[inline]
    #[must_use]
    pub fn delegate(&self) -> &Arc<dyn ParameterValidator> {
        &self.delegate
    }

    /// Undefined-value policy
    #[inline]
    #[must_use]
    pub fn nullability(&self) -> Nullability {
        self.nullability
    }

    /// Whether expressions are accepted
    #[inline]
    #[must_use]
    pub fn allows_expression(&self) -> bool {
        self.allow_expression
    }

    fn check(
        &self,
        parameter: &str,
        value: &ModelValue,
        resolved: bool,
    ) -> Result<(), ValidationError> {
        match value {
            ModelValue::Expression(_) => {
                if self.allow_expression {
                    Ok(())
                } else {
                    Err(ValidationError::ExpressionNotAllowed {
                        parameter: parameter.to_string(),
                    })
                }
            }
            ModelValue::Undefined if self.nullability == Nullability::Deny => {
                Err(ValidationError::NullNotAllowed {
                    parameter: parameter.to_string(),
                })
            }
            ModelValue::Undefined if self.nullability == Nullability::Allow => Ok(()),
            _ => self.delegate.validate(parameter, value, resolved),
        }
    }
}

impl ParameterValidator for NillableOrExpressionValidator {
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

    fn min(&self) -> Option<i64> {
        self.delegate.min()
    }

    fn max(&self) -> Option<i64> {
        self.delegate.max()
    }

    fn allowed_values(&self) -> Option<Vec<ModelValue>> {
        self.delegate.allowed_values()
    }
}
