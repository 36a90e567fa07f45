//! Parameter Validation
//!
//! Layered validation of operation parameters and attribute values.
//!
//! # Overview
//!
//! - **ParameterValidator**: validates one value, optionally after resolution
//! - **NillableOrExpressionValidator**: chain entry handling undefined values
//!   and expressions before consulting a delegate
//! - **Delegates**: type, integer range, string length, enumerated values, lists
//! - **AttributeDefinition**: per-attribute chain plus default and description
//! - **ExpressionResolver**: turns `${name:default}` placeholders into values
//!
//! # Example
//!
//! ```rust
//! use mgmt_model::ModelValue;
//! use mgmt_validation::{IntRangeValidator, NillableOrExpressionValidator, Nullability, ParameterValidator};
//! use std::sync::Arc;
//!
//! let chain = NillableOrExpressionValidator::new(
//!     Arc::new(IntRangeValidator::new(1, 10)),
//!     Nullability::Allow,
//!     false,
//! );
//! assert!(chain.validate_parameter("p", &ModelValue::Undefined).is_ok());
//! assert!(chain.validate_parameter("p", &ModelValue::Int(15)).is_err());
//! ```

#![warn(missing_docs)]

pub mod attribute;
pub mod error;
pub mod expression;
pub mod validator;
pub mod validators;

// Re-exports
pub use attribute::{AttributeDefinition, AttributeDefinitionBuilder};
pub use error::ValidationError;
pub use expression::{ExpressionResolver, PropertyResolver};
pub use validator::{NillableOrExpressionValidator, Nullability, ParameterValidator};
pub use validators::{
    AllowedValuesValidator, IntRangeValidator, ListValidator, ModelTypeValidator,
    StringLengthValidator,
};
