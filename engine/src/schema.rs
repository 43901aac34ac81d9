//! Request schema definition and validation.
//!
//! A [`RequestSchema`] declares which parameters an operation accepts and
//! what kind of value each one must hold. Validation walks the fields in
//! declaration order and stops at the first failure.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

/// A flat parameter mapping, either a query string or a JSON body.
pub type Params = serde_json::Map<String, Value>;

/// Kinds of value a field may be declared to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    /// Any numeric-looking value, including numeric strings
    Int,
    /// Any numeric-looking value, including numeric strings
    Float,
    Bool,
    Email,
    /// Anything goes
    Any,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::String => write!(f, "string"),
            FieldKind::Int => write!(f, "int"),
            FieldKind::Float => write!(f, "float"),
            FieldKind::Bool => write!(f, "bool"),
            FieldKind::Email => write!(f, "email"),
            FieldKind::Any => write!(f, "any"),
        }
    }
}

impl FieldKind {
    /// Check whether a present value satisfies this kind.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Int | FieldKind::Float => as_number(value).is_some(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::Email => value.as_str().is_some_and(is_email),
            FieldKind::Any => true,
        }
    }
}

/// Where the parameters being validated came from.
///
/// Only the wording of error messages depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Query,
    Body,
}

impl Source {
    fn label(&self) -> &'static str {
        match self {
            Source::Query => "Parameter",
            Source::Body => "Field",
        }
    }
}

/// Definition of a single parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Parameter name
    pub name: String,
    /// Declared kind
    pub kind: FieldKind,
    /// Whether the parameter must be present
    pub required: bool,
}

impl FieldDef {
    /// Create a new required field definition.
    pub fn required(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
        }
    }

    /// Create a new optional field definition.
    pub fn optional(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }

    /// Validate a value against this field definition.
    ///
    /// `null` counts as absent.
    pub fn check(&self, value: Option<&Value>, source: Source) -> std::result::Result<(), String> {
        match value {
            None | Some(Value::Null) if self.required => {
                Err(format!("{} '{}' is required", source.label(), self.name))
            }
            None | Some(Value::Null) => Ok(()),
            Some(v) if self.kind.matches(v) => Ok(()),
            Some(_) => Err(format!(
                "{} '{}' must be of type '{}'",
                source.label(),
                self.name,
                self.kind
            )),
        }
    }
}

/// Ordered list of validation failures.
///
/// Validation currently short-circuits, so this holds a single message, but
/// callers treat it as a list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.join(", "))]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    pub fn messages(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

/// Schema for the parameters of one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSchema {
    source: Source,
    fields: Vec<FieldDef>,
}

impl RequestSchema {
    /// Schema for query-string parameters.
    pub fn query(fields: Vec<FieldDef>) -> Self {
        Self {
            source: Source::Query,
            fields,
        }
    }

    /// Schema for body parameters.
    pub fn body(fields: Vec<FieldDef>) -> Self {
        Self {
            source: Source::Body,
            fields,
        }
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Validate a parameter mapping, stopping at the first failing field.
    pub fn validate(&self, params: &Params) -> std::result::Result<(), ValidationErrors> {
        for field in &self.fields {
            if let Err(message) = field.check(params.get(&field.name), self.source) {
                return Err(ValidationErrors(vec![message]));
            }
        }
        Ok(())
    }
}

/// Interpret a value as a number if it is numeric-looking.
///
/// JSON numbers qualify, as do strings holding a decimal or exponent literal
/// with optional sign and surrounding whitespace. Literals that overflow to
/// infinity do not.
pub fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric(s),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn parse_numeric(s: &str) -> Option<f64> {
    let trimmed = s.trim_matches(|c: char| matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c'));
    let unsigned = trimmed
        .strip_prefix(|c: char| c == '+' || c == '-')
        .unwrap_or(trimmed);

    let (mantissa, exponent) = match unsigned.find(|c: char| c == 'e' || c == 'E') {
        Some(i) => (&unsigned[..i], Some(&unsigned[i + 1..])),
        None => (unsigned, None),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return None;
    }
    if let Some(exp) = exponent {
        let digits = exp.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(exp);
        if digits.is_empty() || !all_digits(digits) {
            return None;
        }
    }

    trimmed.parse::<f64>().ok()
}

fn is_email(candidate: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    let pattern = EMAIL.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
        )
        .expect("email pattern compiles")
    });
    candidate.len() <= 254 && pattern.is_match(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    fn create_schema() -> RequestSchema {
        RequestSchema::body(vec![
            FieldDef::required("name", FieldKind::String),
            FieldDef::required("price", FieldKind::Float),
            FieldDef::optional("description", FieldKind::String),
            FieldDef::optional("stock", FieldKind::Int),
        ])
    }

    #[test]
    fn validate_valid_params() {
        let schema = create_schema();

        assert!(schema
            .validate(&params(json!({"name": "Lamp", "price": 12.5})))
            .is_ok());
        assert!(schema
            .validate(&params(json!({"name": "Lamp", "price": "12.5", "stock": "3"})))
            .is_ok());
    }

    #[test]
    fn validate_missing_required_field() {
        let schema = create_schema();

        let err = schema.validate(&params(json!({"price": 10}))).unwrap_err();
        assert_eq!(err.messages(), ["Field 'name' is required"]);
        assert_eq!(err.to_string(), "Field 'name' is required");
    }

    #[test]
    fn query_source_uses_parameter_wording() {
        let schema = RequestSchema::query(vec![FieldDef::required("id", FieldKind::Int)]);

        let err = schema.validate(&Params::new()).unwrap_err();
        assert_eq!(err.messages(), ["Parameter 'id' is required"]);

        let err = schema.validate(&params(json!({"id": "abc"}))).unwrap_err();
        assert_eq!(err.messages(), ["Parameter 'id' must be of type 'int'"]);
    }

    #[test]
    fn validate_wrong_type() {
        let schema = create_schema();

        let err = schema
            .validate(&params(json!({"name": 42, "price": 1})))
            .unwrap_err();
        assert_eq!(err.messages(), ["Field 'name' must be of type 'string'"]);
    }

    #[test]
    fn stops_at_first_failure() {
        let schema = create_schema();

        // Both name and price are wrong; only name is reported.
        let err = schema
            .validate(&params(json!({"name": 1, "price": "free"})))
            .unwrap_err();
        assert_eq!(err.messages().len(), 1);
        assert!(err.messages()[0].contains("'name'"));
    }

    #[test]
    fn null_counts_as_absent() {
        let schema = create_schema();

        let err = schema
            .validate(&params(json!({"name": null, "price": 1})))
            .unwrap_err();
        assert_eq!(err.messages(), ["Field 'name' is required"]);

        // Optional null is skipped
        assert!(schema
            .validate(&params(json!({"name": "x", "price": 1, "stock": null})))
            .is_ok());
    }

    #[test]
    fn optional_absent_is_skipped() {
        let schema = create_schema();
        assert!(schema
            .validate(&params(json!({"name": "x", "price": 1})))
            .is_ok());
    }

    #[test]
    fn kind_rules() {
        assert!(FieldKind::Bool.matches(&json!(true)));
        assert!(!FieldKind::Bool.matches(&json!("true")));
        assert!(!FieldKind::Bool.matches(&json!(1)));

        assert!(FieldKind::Email.matches(&json!("ada@example.com")));
        assert!(!FieldKind::Email.matches(&json!("ada@")));
        assert!(!FieldKind::Email.matches(&json!("not an email")));
        assert!(!FieldKind::Email.matches(&json!(5)));

        assert!(FieldKind::Any.matches(&json!([1, 2])));
        assert!(FieldKind::Int.matches(&json!(" 42 ")));
        assert!(FieldKind::Float.matches(&json!("-1.5e3")));
        assert!(!FieldKind::Float.matches(&json!("1.2.3")));
        assert!(!FieldKind::Int.matches(&json!("inf")));
        assert!(!FieldKind::Int.matches(&json!(true)));
    }

    #[test]
    fn numeric_strings() {
        assert_eq!(as_number(&json!("10")), Some(10.0));
        assert_eq!(as_number(&json!(".5")), Some(0.5));
        assert_eq!(as_number(&json!("+7")), Some(7.0));
        assert_eq!(as_number(&json!("")), None);
        assert_eq!(as_number(&json!(".")), None);
        assert_eq!(as_number(&json!("1e")), None);
        assert_eq!(as_number(&json!("NaN")), None);
        assert_eq!(as_number(&json!("0x1A")), None);
    }

    #[test]
    fn overflowing_literals_are_not_numeric() {
        assert_eq!(as_number(&json!("1e400")), None);
        assert_eq!(as_number(&json!("-1e999")), None);
        assert_eq!(as_number(&json!("1e308")), Some(1e308));

        let err = create_schema()
            .validate(&params(json!({"name": "Lamp", "price": "1e400"})))
            .unwrap_err();
        assert_eq!(err.to_string(), "Field 'price' must be of type 'float'");
    }

    #[test]
    fn field_kind_display() {
        assert_eq!(FieldKind::String.to_string(), "string");
        assert_eq!(FieldKind::Float.to_string(), "float");
        assert_eq!(FieldKind::Any.to_string(), "any");
    }

    proptest! {
        #[test]
        fn integers_rendered_as_text_are_numeric(n in any::<i64>()) {
            prop_assert_eq!(as_number(&json!(n.to_string())), Some(n as f64));
        }

        #[test]
        fn alphabetic_text_is_never_numeric(s in "[a-df-zA-DF-Z]{1,12}") {
            prop_assert!(as_number(&json!(s)).is_none());
        }
    }
}
