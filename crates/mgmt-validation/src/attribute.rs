//! Attribute definitions
//!
//! An [`AttributeDefinition`] is built once per resource type and carries the
//! validator chain for one attribute. It is used twice per operation: at the
//! model stage to validate the submitted value, and at the runtime stage to
//! resolve the stored value into a concrete one.

use crate::error::ValidationError;
use crate::expression::ExpressionResolver;
use crate::validator::{NillableOrExpressionValidator, Nullability, ParameterValidator};
use crate::validators::ModelTypeValidator;
use mgmt_model::{ModelType, ModelValue, OperationRequest};
use serde_json::{json, Map};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Definition of a single resource attribute
#[derive(Debug, Clone)]
pub struct AttributeDefinition {
    name: String,
    model_type: ModelType,
    required: bool,
    allow_expression: bool,
    default_value: Option<ModelValue>,
    validator: Arc<NillableOrExpressionValidator>,
    capability_reference: Option<String>,
    description: String,
}

impl AttributeDefinition {
    /// Attribute name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type
    #[inline]
    #[must_use]
    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    /// Whether a value must be supplied
    #[inline]
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether expressions are accepted
    #[inline]
    #[must_use]
    pub fn allows_expression(&self) -> bool {
        self.allow_expression
    }

    /// Value used when none is stored
    #[inline]
    #[must_use]
    pub fn default_value(&self) -> Option<&ModelValue> {
        self.default_value.as_ref()
    }

    /// Capability this attribute refers to, if any
    #[inline]
    #[must_use]
    pub fn capability_reference(&self) -> Option<&str> {
        self.capability_reference.as_deref()
    }

    /// Validator chain
    #[inline]
    #[must_use]
    pub fn validator(&self) -> &Arc<NillableOrExpressionValidator> {
        &self.validator
    }

    /// Validate the submitted value and copy it into `model`
    ///
    /// Undefined values are not copied, so optional attributes stay absent.
    ///
    /// # Errors
    /// Any validation error from the chain.
    pub fn validate_and_set(
        &self,
        operation: &OperationRequest,
        model: &mut BTreeMap<String, ModelValue>,
    ) -> Result<(), ValidationError> {
        let value = operation.param(&self.name);
        self.validator.validate_parameter(&self.name, value)?;
        if value.is_defined() {
            model.insert(self.name.clone(), value.clone());
        }
        Ok(())
    }

    /// Resolve this attribute of a stored resource model
    ///
    /// `model` is the resource's attribute object. Applies the default,
    /// resolves expressions, converts the result to the declared type and
    /// validates it in resolved form.
    ///
    /// # Errors
    /// Resolution or validation failures.
    pub fn resolve_model_attribute(
        &self,
        resolver: &dyn ExpressionResolver,
        model: &ModelValue,
    ) -> Result<ModelValue, ValidationError> {
        let value = match model.get(&self.name) {
            Some(v) if v.is_defined() => v.clone(),
            _ => self.default_value.clone().unwrap_or_default(),
        };
        let resolved = resolver.resolve_expressions(&value)?;
        let converted = convert(resolved, self.model_type);
        self.validator
            .validate_resolved_parameter(&self.name, &converted)?;
        Ok(converted)
    }

    /// JSON description including introspected constraints
    #[must_use]
    pub fn describe(&self) -> serde_json::Value {
        let mut fields = Map::new();
        fields.insert("type".into(), json!(self.model_type));
        fields.insert("description".into(), self.description.clone().into());
        fields.insert("required".into(), self.required.into());
        fields.insert("expressions-allowed".into(), self.allow_expression.into());
        if let Some(default) = &self.default_value {
            fields.insert("default".into(), default.to_json());
        }
        if let Some(min) = self.validator.min() {
            fields.insert("min".into(), min.into());
        }
        if let Some(max) = self.validator.max() {
            fields.insert("max".into(), max.into());
        }
        if let Some(allowed) = self.validator.allowed_values() {
            fields.insert(
                "allowed".into(),
                allowed.into_iter().map(|v| v.to_json()).collect(),
            );
        }
        if let Some(capability) = &self.capability_reference {
            fields.insert("capability-reference".into(), capability.clone().into());
        }
        serde_json::Value::Object(fields)
    }
}

fn convert(value: ModelValue, target: ModelType) -> ModelValue {
    match (target, &value) {
        (ModelType::Int, ModelValue::String(_)) => value.as_int().map_or(value, ModelValue::Int),
        (ModelType::Boolean, ModelValue::String(_)) => {
            value.as_bool().map_or(value, ModelValue::Boolean)
        }
        (ModelType::String, ModelValue::Int(_) | ModelValue::Boolean(_)) => {
            ModelValue::String(value.to_string())
        }
        _ => value,
    }
}

/// Builder for [`AttributeDefinition`]
///
/// ```rust
/// use mgmt_model::ModelType;
/// use mgmt_validation::{AttributeDefinitionBuilder, IntRangeValidator};
/// use std::sync::Arc;
///
/// let port = AttributeDefinitionBuilder::new("port", ModelType::Int)
///     .required(true)
///     .allow_expression(true)
///     .validator(Arc::new(IntRangeValidator::port()))
///     .build();
/// assert!(port.is_required());
/// ```
#[derive(Debug, Clone)]
pub struct AttributeDefinitionBuilder {
    name: String,
    model_type: ModelType,
    required: bool,
    allow_expression: bool,
    default_value: Option<ModelValue>,
    validator: Option<Arc<dyn ParameterValidator>>,
    capability_reference: Option<String>,
    description: String,
}

impl AttributeDefinitionBuilder {
    /// Optional attribute of the given type
    #[must_use]
    pub fn new(name: impl Into<String>, model_type: ModelType) -> Self {
        Self {
            name: name.into(),
            model_type,
            required: false,
            allow_expression: false,
            default_value: None,
            validator: None,
            capability_reference: None,
            description: String::new(),
        }
    }

    /// Require a value
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Accept expressions
    #[must_use]
    pub fn allow_expression(mut self, allow: bool) -> Self {
        self.allow_expression = allow;
        self
    }

    /// Value used when none is stored
    #[must_use]
    pub fn default_value(mut self, value: impl Into<ModelValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Delegate validator; defaults to a type check
    #[must_use]
    pub fn validator(mut self, validator: Arc<dyn ParameterValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Mark the attribute as a reference to a capability
    #[must_use]
    pub fn capability_reference(mut self, capability: impl Into<String>) -> Self {
        self.capability_reference = Some(capability.into());
        self
    }

    /// Human readable description
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Build the definition
    #[must_use]
    pub fn build(self) -> AttributeDefinition {
        let delegate = self.validator.unwrap_or_else(|| {
            Arc::new(
                ModelTypeValidator::new(self.model_type)
                    .nullable(!self.required)
                    .allow_expressions(self.allow_expression),
            )
        });
        let nullability = if self.required {
            Nullability::Deny
        } else {
            Nullability::Allow
        };
        AttributeDefinition {
            validator: Arc::new(NillableOrExpressionValidator::new(
                delegate,
                nullability,
                self.allow_expression,
            )),
            name: self.name,
            model_type: self.model_type,
            required: self.required,
            allow_expression: self.allow_expression,
            default_value: self.default_value,
            capability_reference: self.capability_reference,
            description: self.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::PropertyResolver;
    use crate::validators::IntRangeValidator;
    use mgmt_model::Address;
    use pretty_assertions::assert_eq;

    fn port() -> AttributeDefinition {
        AttributeDefinitionBuilder::new("port", ModelType::Int)
            .required(true)
            .allow_expression(true)
            .validator(Arc::new(IntRangeValidator::port()))
            .build()
    }

    fn stored(port: ModelValue) -> ModelValue {
        ModelValue::Object([("port".to_string(), port)].into_iter().collect())
    }

    #[test]
    fn validate_and_set_copies_value() {
        let op = OperationRequest::new(Address::root(), "add").with_param("port", 8080);
        let mut model = BTreeMap::new();
        port().validate_and_set(&op, &mut model).unwrap();
        assert_eq!(model.get("port"), Some(&ModelValue::Int(8080)));
    }

    #[test]
    fn optional_undefined_is_not_copied() {
        let op = OperationRequest::new(Address::root(), "add");
        let source_port = AttributeDefinitionBuilder::new("source-port", ModelType::Int).build();
        let mut model = BTreeMap::new();
        source_port.validate_and_set(&op, &mut model).unwrap();
        assert!(model.is_empty());
    }

    #[test]
    fn required_attribute_rejects_missing_value() {
        let op = OperationRequest::new(Address::root(), "add");
        assert!(matches!(
            port().validate_and_set(&op, &mut BTreeMap::new()),
            Err(ValidationError::NullNotAllowed { .. })
        ));
    }

    #[test]
    fn resolve_converts_expression_to_int() {
        let resolver = PropertyResolver::default().with_property("http.port", "8443");
        let model = stored(ModelValue::expression("${http.port}"));
        assert_eq!(
            port().resolve_model_attribute(&resolver, &model).unwrap(),
            ModelValue::Int(8443)
        );
    }

    #[test]
    fn resolve_validates_resolved_value() {
        let resolver = PropertyResolver::default().with_property("http.port", "99999");
        let model = stored(ModelValue::expression("${http.port}"));
        assert!(matches!(
            port().resolve_model_attribute(&resolver, &model),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn resolve_applies_default() {
        let fixed = AttributeDefinitionBuilder::new("fixed-source-port", ModelType::Boolean)
            .default_value(false)
            .build();
        assert_eq!(
            fixed
                .resolve_model_attribute(&PropertyResolver::default(), &ModelValue::Undefined)
                .unwrap(),
            ModelValue::Boolean(false)
        );
    }

    #[test]
    fn describe_reports_range() {
        let description = port().describe();
        assert_eq!(description["min"], 0);
        assert_eq!(description["max"], 65535);
        assert_eq!(description["required"], true);
    }
}
