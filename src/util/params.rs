//! Parameterized extraction from loosely-typed JSON maps.
//!
//! Pulls a declared set of parameters out of a request payload or query map,
//! coercing string values to target types. Coercion failures skip the key
//! rather than failing the caller.

use std::str::FromStr;

use serde_json::{Map, Value};

/// Target type for an extracted parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Str,
    Int,
    Float,
    Bool,
}

/// One parameter to extract: source key, output key, target type, default.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub from: &'static str,
    pub to: &'static str,
    pub ty: ParamType,
    /// Applied when the source key is absent or null. Without a default the
    /// key is omitted from the result.
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn new(name: &'static str, ty: ParamType) -> Self {
        Self {
            from: name,
            to: name,
            ty,
            default: None,
        }
    }

    /// Extract `from` but emit it under `to`.
    pub fn renamed(from: &'static str, to: &'static str, ty: ParamType) -> Self {
        Self {
            from,
            to,
            ty,
            default: None,
        }
    }

    pub fn default_value(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Extract the declared parameters from `source`.
///
/// String values are trimmed before coercion. A value that fails coercion is
/// skipped (logged at warn level); its default does not apply.
pub fn parse_params(source: &Map<String, Value>, specs: &[ParamSpec]) -> Map<String, Value> {
    let mut result = Map::new();

    for spec in specs {
        match source.get(spec.from) {
            Some(value) if !value.is_null() => match coerce(value, spec.ty) {
                Some(coerced) => {
                    result.insert(spec.to.to_string(), coerced);
                }
                None => {
                    tracing::warn!(
                        param = spec.from,
                        "Parameter failed type coercion, skipping"
                    );
                }
            },
            _ => {
                if let Some(default) = &spec.default {
                    result.insert(spec.to.to_string(), default.clone());
                }
            }
        }
    }

    result
}

fn coerce(value: &Value, ty: ParamType) -> Option<Value> {
    match ty {
        ParamType::Str => match value {
            Value::String(text) => Some(Value::String(text.trim().to_string())),
            other => Some(Value::String(other.to_string())),
        },
        ParamType::Int => match value {
            Value::Number(number) => number.as_i64().map(Value::from),
            Value::String(text) => text.trim().parse::<i64>().ok().map(Value::from),
            _ => None,
        },
        ParamType::Float => match value {
            Value::Number(number) => number.as_f64().map(Value::from),
            Value::String(text) => text.trim().parse::<f64>().ok().map(Value::from),
            _ => None,
        },
        ParamType::Bool => match value {
            Value::Bool(flag) => Some(Value::Bool(*flag)),
            Value::String(text) => match text.trim() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        },
    }
}

/// Split a comma-separated string into parsed values.
pub fn split_csv<T: FromStr>(input: &str) -> Result<Vec<T>, T::Err> {
    input.split(',').map(|item| item.trim().parse()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source() -> Map<String, Value> {
        json!({
            "store_id": " 17 ",
            "price": 9.5,
            "name": "  widget ",
            "active": "1",
            "bad_int": "seventeen",
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_coercion_and_renaming() {
        let specs = [
            ParamSpec::new("store_id", ParamType::Int),
            ParamSpec::renamed("price", "product_price", ParamType::Float),
            ParamSpec::new("name", ParamType::Str),
            ParamSpec::new("active", ParamType::Bool),
        ];
        let result = parse_params(&source(), &specs);
        assert_eq!(result["store_id"], json!(17));
        assert_eq!(result["product_price"], json!(9.5));
        assert_eq!(result["name"], json!("widget"));
        assert_eq!(result["active"], json!(true));
    }

    #[test]
    fn test_missing_key_uses_default_or_is_omitted() {
        let specs = [
            ParamSpec::new("missing", ParamType::Int).default_value(json!(0)),
            ParamSpec::new("also_missing", ParamType::Str),
        ];
        let result = parse_params(&source(), &specs);
        assert_eq!(result["missing"], json!(0));
        assert!(!result.contains_key("also_missing"));
    }

    #[test]
    fn test_coercion_failure_skips_key() {
        let specs = [ParamSpec::new("bad_int", ParamType::Int).default_value(json!(-1))];
        let result = parse_params(&source(), &specs);
        assert!(!result.contains_key("bad_int"));
    }

    #[test]
    fn test_split_csv() {
        let numbers: Vec<i64> = split_csv("1, 2,3").unwrap();
        assert_eq!(numbers, vec![1, 2, 3]);

        let words: Vec<String> = split_csv("a,b").unwrap();
        assert_eq!(words, vec!["a", "b"]);

        assert!(split_csv::<i64>("1,x").is_err());
    }
}
