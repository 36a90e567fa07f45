//! Expression resolution
//!
//! Expressions take the form `${name}` or `${name:default}`. Several
//! placeholders may appear in one string; they are resolved left to right.
//! Names prefixed with `env.` are read from the process environment only;
//! other names are looked up in the configured properties first and then in
//! the environment.

use crate::error::ValidationError;
use mgmt_model::ModelValue;
use std::collections::BTreeMap;

/// Turns expressions into concrete values
pub trait ExpressionResolver: Send + Sync {
    /// Resolve every expression inside `value`
    ///
    /// Non-expression values are returned unchanged; lists and objects are
    /// resolved element by element.
    fn resolve_expressions(&self, value: &ModelValue) -> Result<ModelValue, ValidationError>;
}

/// Resolver backed by a property map with environment fallback
#[derive(Debug, Clone, Default)]
pub struct PropertyResolver {
    properties: BTreeMap<String, String>,
}

impl PropertyResolver {
    /// Create a resolver over `properties`
    #[must_use]
    pub fn new(properties: BTreeMap<String, String>) -> Self {
        Self { properties }
    }

    /// Add a single property
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    fn lookup(&self, name: &str) -> Option<String> {
        if let Some(var) = name.strip_prefix("env.") {
            return std::env::var(var).ok();
        }
        self.properties
            .get(name)
            .cloned()
            .or_else(|| std::env::var(name).ok())
    }

    fn resolve_string(&self, raw: &str) -> Result<String, ValidationError> {
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find('}').ok_or_else(|| ValidationError::ExpressionResolution {
                expression: raw.to_string(),
                reason: "unterminated placeholder".to_string(),
            })?;
            let body = &after[..end];
            let (name, default) = match body.split_once(':') {
                Some((name, default)) => (name, Some(default)),
                None => (body, None),
            };
            let value = self
                .lookup(name)
                .or_else(|| default.map(str::to_string))
                .ok_or_else(|| ValidationError::ExpressionResolution {
                    expression: raw.to_string(),
                    reason: format!("no value for '{name}'"),
                })?;
            out.push_str(&value);
            rest = &after[end + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

impl ExpressionResolver for PropertyResolver {
    fn resolve_expressions(&self, value: &ModelValue) -> Result<ModelValue, ValidationError> {
        match value {
            ModelValue::Expression(raw) => self.resolve_string(raw).map(ModelValue::String),
            ModelValue::List(items) => items
                .iter()
                .map(|item| self.resolve_expressions(item))
                .collect::<Result<Vec<_>, _>>()
                .map(ModelValue::List),
            ModelValue::Object(fields) => fields
                .iter()
                .map(|(k, v)| self.resolve_expressions(v).map(|v| (k.clone(), v)))
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(ModelValue::Object),
            other => Ok(other.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> PropertyResolver {
        PropertyResolver::default().with_property("jboss.bind.address", "10.0.0.1")
    }

    #[test]
    fn resolves_property_and_default() {
        let r = resolver();
        assert_eq!(
            r.resolve_expressions(&ModelValue::expression("${jboss.bind.address}"))
                .unwrap(),
            ModelValue::String("10.0.0.1".into())
        );
        assert_eq!(
            r.resolve_expressions(&ModelValue::expression("${missing:8080}"))
                .unwrap(),
            ModelValue::String("8080".into())
        );
    }

    #[test]
    fn resolves_multiple_placeholders() {
        let r = resolver().with_property("port", "9990");
        assert_eq!(
            r.resolve_expressions(&ModelValue::expression("${jboss.bind.address}:${port}"))
                .unwrap(),
            ModelValue::String("10.0.0.1:9990".into())
        );
    }

    #[test]
    fn unresolvable_fails() {
        let err = resolver()
            .resolve_expressions(&ModelValue::expression("${nope}"))
            .unwrap_err();
        assert_eq!(err.message_key(), "expressionResolution");
    }

    #[test]
    fn plain_names_fall_back_to_environment() {
        std::env::set_var("MGMT_FALLBACK_SMTP_PORT", "2525");
        let r = resolver();
        assert_eq!(
            r.resolve_expressions(&ModelValue::expression("${MGMT_FALLBACK_SMTP_PORT}"))
                .unwrap(),
            ModelValue::String("2525".into())
        );
        assert_eq!(
            r.resolve_expressions(&ModelValue::expression("${env.MGMT_FALLBACK_SMTP_PORT}"))
                .unwrap(),
            ModelValue::String("2525".into())
        );

        let shadowed = r.with_property("MGMT_FALLBACK_SMTP_PORT", "25");
        assert_eq!(
            shadowed
                .resolve_expressions(&ModelValue::expression("${MGMT_FALLBACK_SMTP_PORT}"))
                .unwrap(),
            ModelValue::String("25".into())
        );
    }

    #[test]
    fn concrete_values_pass_through() {
        let value = ModelValue::Int(3);
        assert_eq!(resolver().resolve_expressions(&value).unwrap(), value);
    }
}
