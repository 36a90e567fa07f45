use mgmt_model::{ModelType, ModelValue};
use mgmt_validation::{
    ExpressionResolver, IntRangeValidator, ModelTypeValidator, NillableOrExpressionValidator,
    Nullability, ParameterValidator, PropertyResolver, ValidationError,
};
use proptest::prelude::*;
use std::sync::Arc;

fn nullability() -> impl Strategy<Value = Nullability> {
    prop_oneof![
        Just(Nullability::Allow),
        Just(Nullability::Deny),
        Just(Nullability::Defer),
    ]
}

fn chain(nullability: Nullability, allow_expression: bool) -> NillableOrExpressionValidator {
    NillableOrExpressionValidator::new(
        Arc::new(IntRangeValidator::new(1, 10)),
        nullability,
        allow_expression,
    )
}

#[test]
fn undefined_follows_nullability() {
    assert!(chain(Nullability::Allow, false)
        .validate_parameter("p", &ModelValue::Undefined)
        .is_ok());
    assert!(matches!(
        chain(Nullability::Deny, false).validate_parameter("p", &ModelValue::Undefined),
        Err(ValidationError::NullNotAllowed { .. })
    ));
    // range delegate does not accept undefined on its own
    assert!(matches!(
        chain(Nullability::Defer, false).validate_parameter("p", &ModelValue::Undefined),
        Err(ValidationError::NullNotAllowed { .. })
    ));
}

#[test]
fn deferred_undefined_reaches_nullable_delegate() {
    let lenient = NillableOrExpressionValidator::new(
        Arc::new(ModelTypeValidator::new(ModelType::String).nullable(true)),
        Nullability::Defer,
        false,
    );
    assert!(lenient.validate_parameter("p", &ModelValue::Undefined).is_ok());
}

proptest! {
    #[test]
    fn prop_disallowed_expressions_always_rejected(
        name in "[a-z][a-z.]{0,12}",
        nullability in nullability(),
        resolved in any::<bool>(),
    ) {
        let value = ModelValue::expression(format!("${{{name}}}"));
        let result = chain(nullability, false).validate("p", &value, resolved);
        let rejected = matches!(result, Err(ValidationError::ExpressionNotAllowed { .. }));
        prop_assert!(rejected, "unexpected {:?}", result);
    }

    #[test]
    fn prop_allowed_expressions_always_accepted(
        name in "[a-z][a-z.]{0,12}",
        nullability in nullability(),
        resolved in any::<bool>(),
    ) {
        let value = ModelValue::expression(format!("${{{name}:oops}}"));
        prop_assert!(chain(nullability, true).validate("p", &value, resolved).is_ok());
    }

    #[test]
    fn prop_range_decides_concrete_values(value in -100i64..100, nullability in nullability()) {
        let result = chain(nullability, false).validate_parameter("p", &ModelValue::Int(value));
        prop_assert_eq!(result.is_ok(), (1..=10).contains(&value));
    }

    #[test]
    fn prop_defaults_fill_missing_properties(name in "[a-z]{1,8}", default in "[a-z0-9]{1,8}") {
        let resolver = PropertyResolver::default();
        let value = ModelValue::expression(format!("${{{name}:{default}}}"));
        prop_assert_eq!(
            resolver.resolve_expressions(&value).unwrap(),
            ModelValue::String(default)
        );
    }
}
